//! Navigation controller.
//!
//! [`Router`] owns the route tree, the committed [`RouterState`] and the
//! subscription bus. Every navigation runs in two phases:
//!
//! 1. **Synchronously**, inside [`Router::navigate`] (or `submit`, a history
//!    pop, ...): a fresh [`NavigationId`] is minted, the previous navigation's
//!    signal is cancelled, the target is matched, loaders are started, the
//!    transition flips to `loading`/`submitting` and subscribers are notified.
//! 2. **Asynchronously**, when the returned [`Navigation`] is awaited: loader
//!    results are collected and committed, unless a newer navigation started
//!    in the meantime, in which case everything is discarded.
//!
//! ```
//! use data_navigator::{data, Route, Router, RouterOptions};
//! use serde_json::json;
//!
//! let router = Router::new(RouterOptions::new(vec![Route::new("/")
//!     .id("root")
//!     .loader(|_| async { data(json!({ "user": "ada" })) })
//!     .child(Route::new("about").id("about"))]))
//! .unwrap();
//!
//! let navigation = router.push("/about");
//! assert!(router.state().transition.is_loading());
//!
//! let result = pollster::block_on(navigation);
//! assert!(result.is_committed());
//!
//! let state = router.state();
//! assert_eq!(state.location.pathname, "/about");
//! assert_eq!(state.route_data.loader_data("root"), Some(&json!({ "user": "ada" })));
//! ```

#[cfg(feature = "cache")]
use crate::cache::{CacheStats, CachedMatch, MatchCache};
use crate::data::{HydrationData, RouteData, RouteResult};
use crate::error::{LoaderError, NavigationError, NavigationResult, RouteTreeError};
use crate::history::{History, HistoryAction, HistoryUpdate, MemoryHistory};
use crate::loader::{invoke, LoaderArgs, LoaderOutput, LoaderResult, Method, Request, Submission};
use crate::location::Location;
#[cfg(feature = "cache")]
use crate::matching::normalize_path;
use crate::params::QueryParams;
use crate::resolve::{resolve_matches, MatchedRoute};
use crate::route::{Route, RouteId, RouteTree};
use crate::state::{NavigationId, RouterState, TransitionState};
use crate::subscription::{Subscription, SubscriptionBus};
use crate::{debug_log, info_log, trace_log, warn_log};
use futures::channel::mpsc;
use futures::future::{self, BoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

/// Maximum length of a loader redirect chain
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

// ============================================================================
// Options
// ============================================================================

/// Router configuration.
///
/// ```
/// use data_navigator::{HydrationData, MemoryHistory, Route, RouterOptions};
/// use std::sync::Arc;
///
/// let options = RouterOptions::new(vec![Route::new("/")])
///     .history(Arc::new(MemoryHistory::new("/")))
///     .hydration(HydrationData::default())
///     .max_redirects(3);
/// # let _ = options;
/// ```
pub struct RouterOptions {
    routes: Vec<Route>,
    history: Option<Arc<dyn History>>,
    hydration: Option<HydrationData>,
    max_redirects: usize,
    #[cfg(feature = "cache")]
    cache_capacity: usize,
}

impl RouterOptions {
    pub fn new(routes: Vec<Route>) -> Self {
        Self {
            routes,
            history: None,
            hydration: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            #[cfg(feature = "cache")]
            cache_capacity: MatchCache::DEFAULT_CAPACITY,
        }
    }

    /// History source. Defaults to a [`MemoryHistory`] at `/`.
    pub fn history<H: History>(mut self, history: Arc<H>) -> Self {
        self.history = Some(history);
        self
    }

    /// Route data produced ahead of time; see [`Router::initialize`].
    pub fn hydration(mut self, hydration: HydrationData) -> Self {
        self.hydration = Some(hydration);
        self
    }

    /// Longest loader redirect chain before a navigation fails with
    /// [`NavigationError::TooManyRedirects`].
    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Number of pathnames whose match results are cached.
    #[cfg(feature = "cache")]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

impl fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterOptions")
            .field("routes", &self.routes)
            .field("hydration", &self.hydration)
            .field("max_redirects", &self.max_redirects)
            .finish_non_exhaustive()
    }
}

/// Options for [`Router::navigate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing
    pub replace: bool,
    /// State attached to the new location
    pub state: Option<Value>,
}

impl NavigateOptions {
    pub fn replace() -> Self {
        Self {
            replace: true,
            state: None,
        }
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }
}

// ============================================================================
// Navigation handle
// ============================================================================

/// A started navigation.
///
/// The transition is already visible in [`Router::state`] when this is
/// returned; awaiting it collects loader results and commits them. Dropping it
/// without awaiting abandons the results (the router stays in its in-flight
/// transition until another navigation starts).
#[must_use = "a navigation only commits when awaited"]
pub struct Navigation {
    id: NavigationId,
    fut: BoxFuture<'static, NavigationResult>,
}

impl Navigation {
    fn ready(id: NavigationId, result: NavigationResult) -> Self {
        Self {
            id,
            fut: future::ready(result).boxed(),
        }
    }

    /// Id minted for this navigation.
    pub fn id(&self) -> NavigationId {
        self.id
    }
}

impl Future for Navigation {
    type Output = NavigationResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.fut.poll_unpin(cx)
    }
}

impl fmt::Debug for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigation").field("id", &self.id).finish_non_exhaustive()
    }
}

// ============================================================================
// Internal request types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Push,
    Replace,
    /// History already moved; commit without touching it
    Pop,
    /// First load: only routes without seeded data run
    Initial,
    /// Every loader re-runs, history entry replaced
    Revalidate,
}

impl Intent {
    /// Intent of a navigation started by a redirect out of this one.
    fn after_redirect(self) -> Intent {
        match self {
            Intent::Push => Intent::Push,
            _ => Intent::Replace,
        }
    }
}

enum Target {
    /// Resolved against the committed location
    Relative(String),
    Exact(Location),
}

struct NavigationRequest {
    target: Target,
    intent: Intent,
    state: Option<Value>,
    submission: Option<Submission>,
    redirects: usize,
}

impl NavigationRequest {
    fn new(target: Target, intent: Intent) -> Self {
        Self {
            target,
            intent,
            state: None,
            submission: None,
            redirects: 0,
        }
    }
}

struct Commit {
    location: Location,
    matches: Vec<MatchedRoute>,
    loaded: HashMap<RouteId, RouteResult>,
    action: Option<(RouteId, RouteResult)>,
    intent: Intent,
}

type PendingLoads = FuturesUnordered<BoxFuture<'static, (RouteId, LoaderResult)>>;

// ============================================================================
// Router
// ============================================================================

struct RouterInner {
    tree: RouteTree,
    state: Mutex<RouterState>,
    /// Bumped by every navigation; only the latest id may commit
    navigation_id: AtomicU64,
    /// Signal handed to the loaders of the latest navigation
    active_signal: Mutex<Option<CancellationToken>>,
    bus: SubscriptionBus<RouterState>,
    history: Arc<dyn History>,
    history_listener: Mutex<Option<Subscription>>,
    pop_tx: mpsc::UnboundedSender<Navigation>,
    pop_rx: Mutex<Option<mpsc::UnboundedReceiver<Navigation>>>,
    max_redirects: usize,
    #[cfg(feature = "cache")]
    cache: Mutex<MatchCache>,
    disposed: AtomicBool,
}

/// Data router handle. Cheap to clone; clones share one router.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    /// Build the route tree and attach to the history source.
    ///
    /// The router starts uninitialized at the history's current location;
    /// call [`initialize`](Self::initialize) to load (or hydrate) it.
    pub fn new(options: RouterOptions) -> Result<Self, RouteTreeError> {
        let tree = RouteTree::new(options.routes)?;
        let history: Arc<dyn History> = match options.history {
            Some(history) => history,
            None => Arc::new(MemoryHistory::default()),
        };
        let route_data = options
            .hydration
            .as_ref()
            .map(RouteData::from_hydration)
            .unwrap_or_default();
        let (pop_tx, pop_rx) = mpsc::unbounded();

        let inner = Arc::new(RouterInner {
            tree,
            state: Mutex::new(RouterState::new(history.location(), route_data)),
            navigation_id: AtomicU64::new(0),
            active_signal: Mutex::new(None),
            bus: SubscriptionBus::new(),
            history: Arc::clone(&history),
            history_listener: Mutex::new(None),
            pop_tx,
            pop_rx: Mutex::new(Some(pop_rx)),
            max_redirects: options.max_redirects,
            #[cfg(feature = "cache")]
            cache: Mutex::new(MatchCache::with_capacity(options.cache_capacity)),
            disposed: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&inner);
        let listener = history.listen(Box::new(move |update: &HistoryUpdate| {
            if update.action != HistoryAction::Pop {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                inner.on_pop(update);
            }
        }));
        *inner.history_listener.lock() = Some(listener);

        Ok(Self { inner })
    }

    /// Load the initial location.
    ///
    /// Routes whose data or error was seeded through
    /// [`RouterOptions::hydration`] are not loaded. When every matched loader
    /// is seeded the router commits before this returns (the navigation is
    /// already settled); otherwise only the unseeded loaders run. History is
    /// not modified.
    pub fn initialize(&self) -> Navigation {
        let location = self.inner.history.location();
        debug_log!("Initializing router at '{}'", location);
        self.inner
            .begin(NavigationRequest::new(Target::Exact(location), Intent::Initial))
    }

    /// Navigate to `to` with options.
    pub fn navigate(&self, to: &str, options: NavigateOptions) -> Navigation {
        let intent = if options.replace {
            Intent::Replace
        } else {
            Intent::Push
        };
        let mut request = NavigationRequest::new(Target::Relative(to.to_string()), intent);
        request.state = options.state;
        self.inner.begin(request)
    }

    /// Navigate to `to`, pushing a history entry.
    pub fn push(&self, to: &str) -> Navigation {
        self.navigate(to, NavigateOptions::default())
    }

    /// Navigate to `to`, replacing the current history entry.
    pub fn replace(&self, to: &str) -> Navigation {
        self.navigate(to, NavigateOptions::replace())
    }

    /// Submit to `to`.
    ///
    /// `GET` submissions are plain loading navigations with the body's
    /// fields as the query string. Other methods run the action of the
    /// deepest matched route that has one, then re-run the branch's loaders.
    pub fn submit(&self, to: &str, submission: Submission) -> Navigation {
        if !submission.method.is_mutation() {
            return self.push(&with_query(to, &submission.body));
        }
        let mut request = NavigationRequest::new(Target::Relative(to.to_string()), Intent::Push);
        request.submission = Some(submission);
        self.inner.begin(request)
    }

    /// Re-run every loader of the current location.
    pub fn revalidate(&self) -> Navigation {
        let location = self.inner.state.lock().location.clone();
        self.inner
            .begin(NavigationRequest::new(Target::Exact(location), Intent::Revalidate))
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RouterState {
        self.inner.state.lock().clone()
    }

    /// Register a listener called with the new state after every change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&RouterState) + Send + Sync + 'static,
    {
        self.inner.bus.subscribe(listener)
    }

    /// Navigations started by history pops (back/forward).
    ///
    /// Each pop starts its navigation immediately; the host must await the
    /// yielded navigations for them to commit. Returns `None` after the first
    /// call.
    pub fn history_navigations(&self) -> Option<mpsc::UnboundedReceiver<Navigation>> {
        self.inner.pop_rx.lock().take()
    }

    /// Match a path without navigating.
    pub fn match_path(&self, path: &str) -> Option<Vec<MatchedRoute>> {
        self.inner.match_path(path)
    }

    /// The frozen route tree.
    pub fn routes(&self) -> &RouteTree {
        &self.inner.tree
    }

    /// The history source.
    pub fn history(&self) -> &Arc<dyn History> {
        &self.inner.history
    }

    /// Id of the latest navigation.
    pub fn navigation_id(&self) -> NavigationId {
        NavigationId(self.inner.navigation_id.load(Ordering::SeqCst))
    }

    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.lock().stats().clone()
    }

    /// Tear the router down.
    ///
    /// In-flight navigations are superseded and their signals cancelled,
    /// subscribers and the history listener are dropped, and later
    /// navigations resolve to [`NavigationError::Disposed`].
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let _state = self.inner.state.lock();
            self.inner.start_navigation();
            if let Some(signal) = self.inner.active_signal.lock().take() {
                signal.cancel();
            }
        }
        self.inner.bus.clear();
        let listener = self.inner.history_listener.lock().take();
        drop(listener);
        self.inner.pop_tx.close_channel();
        let pending_pops = self.inner.pop_rx.lock().take();
        drop(pending_pops);
        info_log!("Router disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.inner.tree.len())
            .field("navigation_id", &self.navigation_id())
            .field("subscribers", &self.inner.bus.len())
            .finish_non_exhaustive()
    }
}

impl RouterInner {
    /// Start a new navigation and return its id. Older navigations detect
    /// they are stale through [`is_navigation_current`](Self::is_navigation_current).
    fn start_navigation(&self) -> NavigationId {
        NavigationId(self.navigation_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn is_navigation_current(&self, id: NavigationId) -> bool {
        self.navigation_id.load(Ordering::SeqCst) == id.0
    }

    /// Install a fresh signal, cancelling the previous navigation's.
    fn replace_signal(&self) -> CancellationToken {
        let signal = CancellationToken::new();
        if let Some(previous) = self.active_signal.lock().replace(signal.clone()) {
            previous.cancel();
        }
        signal
    }

    #[cfg(feature = "cache")]
    fn match_path(&self, path: &str) -> Option<Vec<MatchedRoute>> {
        let key = normalize_path(path).into_owned();
        if let Some(cached) = self.cache.lock().get(&key) {
            return cached.map(|matches| matches.to_vec());
        }
        let resolved = resolve_matches(self.tree.roots(), &key);
        let entry: CachedMatch = resolved.as_deref().map(Arc::from);
        self.cache.lock().insert(key, entry);
        resolved
    }

    #[cfg(not(feature = "cache"))]
    fn match_path(&self, path: &str) -> Option<Vec<MatchedRoute>> {
        resolve_matches(self.tree.roots(), path)
    }

    fn on_pop(self: &Arc<Self>, update: &HistoryUpdate) {
        let navigation = self.begin(NavigationRequest::new(
            Target::Exact(update.location.clone()),
            Intent::Pop,
        ));
        if self.pop_tx.unbounded_send(navigation).is_err() {
            debug_log!("History pop to '{}' ignored: router disposed", update.location);
        }
    }

    /// Synchronous phase of a navigation.
    fn begin(self: &Arc<Self>, request: NavigationRequest) -> Navigation {
        if self.disposed.load(Ordering::SeqCst) {
            return Navigation::ready(
                NavigationId(self.navigation_id.load(Ordering::SeqCst)),
                NavigationError::Disposed.into_result(),
            );
        }

        let NavigationRequest {
            target,
            intent,
            state: location_state,
            submission,
            redirects,
        } = request;

        let mut state = self.state.lock();
        let id = self.start_navigation();
        let signal = self.replace_signal();

        let mut location = match target {
            Target::Relative(to) => state.location.resolve(&to),
            Target::Exact(location) => location,
        };
        if let Some(location_state) = location_state {
            location = location.with_state(location_state);
        }

        let Some(matches) = self.match_path(&location.pathname) else {
            info_log!("Navigation {} to '{}': no matching route", id, location);
            let path = location.pathname;
            state.transition = TransitionState::Idle;
            state.error = Some(NavigationError::RouteNotFound { path: path.clone() });
            let snapshot = state.clone();
            drop(state);
            self.bus.notify(&snapshot);
            return Navigation::ready(id, NavigationResult::NotFound { path });
        };

        // Deepest matched route with an action handles the submission
        let action_index = submission
            .as_ref()
            .and_then(|_| matches.iter().rposition(|m| m.route.has_action()));
        let forced_from = submission.as_ref().map(|_| action_index.unwrap_or(matches.len().saturating_sub(1)));

        let loads = plan_loads(&state, &matches, intent, forced_from);

        if loads.is_empty() && submission.is_none() {
            drop(state);
            debug_log!("Navigation {} to '{}': nothing to load", id, location);
            let result = self.commit(
                id,
                Commit {
                    location,
                    matches,
                    loaded: HashMap::new(),
                    action: None,
                    intent,
                },
            );
            return Navigation::ready(id, result);
        }

        info_log!(
            "Navigation {} to '{}' started ({} loaders{})",
            id,
            location,
            loads.len(),
            if submission.is_some() { ", submitting" } else { "" }
        );

        state.transition = match &submission {
            Some(submission) => TransitionState::Submitting {
                location: location.clone(),
                matches: matches.clone(),
                submission: submission.clone(),
            },
            None => TransitionState::Loading {
                location: location.clone(),
                matches: matches.clone(),
            },
        };
        let snapshot = state.clone();
        drop(state);

        // Handlers run unlocked: they may read router state synchronously.
        // Loaders of a submission start once its action has settled.
        let mut pending = if submission.is_none() {
            Some(start_loaders(&loads, &location, &signal))
        } else {
            None
        };

        let action = match (&submission, action_index) {
            (Some(submission), Some(index)) => {
                let target = &matches[index];
                target.route.action.as_ref().map(|handler| {
                    let args = LoaderArgs {
                        route_id: target.route.id.clone(),
                        params: target.params.clone(),
                        request: Request {
                            location: location.clone(),
                            method: submission.method,
                            body: Some(submission.body.clone()),
                        },
                        signal: signal.clone(),
                    };
                    (target.route.id.clone(), invoke(handler, args))
                })
            }
            _ => None,
        };

        if self.is_navigation_current(id) {
            self.bus.notify(&snapshot);
        }

        let inner = Arc::clone(self);
        let fut = async move {
            let mut action_result = None;

            if let Some(submission) = submission {
                match action {
                    Some((route_id, call)) => {
                        let result = call.await;
                        if !inner.is_navigation_current(id) {
                            debug_log!("Navigation {} superseded during its action", id);
                            return NavigationResult::Superseded;
                        }
                        match result {
                            Ok(LoaderOutput::Redirect(to)) => {
                                signal.cancel();
                                return inner.follow_redirect(id, &location, to, intent, redirects).await;
                            }
                            Ok(LoaderOutput::Data(value)) => {
                                action_result = Some((route_id, RouteResult::Success(value)));
                            }
                            Err(error) => {
                                warn_log!("Action for route '{}' failed: {}", route_id, error);
                                action_result = Some((route_id, RouteResult::Error(error)));
                            }
                        }
                    }
                    None => {
                        // matches is never empty
                        if let Some(leaf) = matches.last() {
                            let route_id = leaf.route.id.clone();
                            warn_log!("{} submission to '{}' has no action", submission.method, location);
                            let error = LoaderError::MethodNotAllowed {
                                method: submission.method,
                                route_id: route_id.to_string(),
                            };
                            action_result = Some((route_id, RouteResult::Error(error)));
                        }
                    }
                }
                pending = Some(start_loaders(&loads, &location, &signal));
            }

            let mut loaded = HashMap::with_capacity(loads.len());
            if let Some(mut pending) = pending {
                while let Some((route_id, result)) = pending.next().await {
                    match result {
                        Ok(LoaderOutput::Data(value)) => {
                            loaded.insert(route_id, RouteResult::Success(value));
                        }
                        Ok(LoaderOutput::Redirect(to)) => {
                            signal.cancel();
                            return inner.follow_redirect(id, &location, to, intent, redirects).await;
                        }
                        Err(error) => {
                            warn_log!("Loader for route '{}' failed: {}", route_id, error);
                            loaded.insert(route_id, RouteResult::Error(error));
                        }
                    }
                }
            }

            inner.commit(
                id,
                Commit {
                    location,
                    matches,
                    loaded,
                    action: action_result,
                    intent,
                },
            )
        };

        Navigation { id, fut: fut.boxed() }
    }

    /// Replace navigation `id` with one to `to`, if `id` is still current.
    async fn follow_redirect(
        self: &Arc<Self>,
        id: NavigationId,
        from: &Location,
        to: String,
        intent: Intent,
        redirects: usize,
    ) -> NavigationResult {
        if !self.is_navigation_current(id) {
            debug_log!("Navigation {} superseded; ignoring redirect to '{}'", id, to);
            return NavigationResult::Superseded;
        }

        let depth = redirects + 1;
        if depth > self.max_redirects {
            warn_log!("Navigation {}: redirect limit ({}) exceeded at '{}'", id, self.max_redirects, to);
            return self.fail(
                id,
                NavigationError::TooManyRedirects {
                    to,
                    limit: self.max_redirects,
                },
            );
        }

        info_log!("Navigation {} redirected from '{}' to '{}'", id, from, to);
        let mut request = NavigationRequest::new(Target::Exact(from.resolve(&to)), intent.after_redirect());
        request.redirects = depth;
        self.begin(request).await
    }

    /// Settle navigation `id` without committing.
    fn fail(&self, id: NavigationId, error: NavigationError) -> NavigationResult {
        let snapshot = {
            let mut state = self.state.lock();
            if !self.is_navigation_current(id) {
                return NavigationResult::Superseded;
            }
            state.transition = TransitionState::Idle;
            state.error = Some(error.clone());
            state.clone()
        };
        self.bus.notify(&snapshot);
        error.into_result()
    }

    /// Apply a navigation's results if it is still the latest one.
    fn commit(&self, id: NavigationId, commit: Commit) -> NavigationResult {
        let Commit {
            location,
            matches,
            loaded,
            action,
            intent,
        } = commit;

        let snapshot = {
            let mut state = self.state.lock();
            if !self.is_navigation_current(id) {
                debug_log!("Navigation {} superseded; discarding results for '{}'", id, location);
                return NavigationResult::Superseded;
            }

            let route_data = state.route_data.apply(&matches, loaded, action);
            state.route_data = route_data;
            state.location = location.clone();
            state.matches = matches;
            state.transition = TransitionState::Idle;
            state.error = None;
            state.initialized = true;

            // Under the state lock so history order follows commit order;
            // push/replace never notify history listeners.
            match intent {
                Intent::Push => self.history.push(location.clone()),
                Intent::Replace | Intent::Revalidate => self.history.replace(location.clone()),
                Intent::Pop | Intent::Initial => {}
            }
            state.clone()
        };

        info_log!("Navigation {} committed '{}'", id, location);
        self.bus.notify(&snapshot);
        NavigationResult::Committed { location }
    }
}

/// Matched routes whose loaders run for this navigation.
fn plan_loads(
    state: &RouterState,
    matches: &[MatchedRoute],
    intent: Intent,
    forced_from: Option<usize>,
) -> Vec<MatchedRoute> {
    matches
        .iter()
        .enumerate()
        .filter(|(_, m)| m.route.has_loader())
        .filter(|(index, m)| {
            let id = m.route.id.as_str();
            match intent {
                Intent::Initial => !state.route_data.contains(id),
                Intent::Revalidate => true,
                _ => {
                    if forced_from.is_some_and(|from| *index >= from) || m.route.revalidate {
                        return true;
                    }
                    let unchanged = state.matches.iter().any(|previous| previous.same_as(m));
                    let keep = unchanged && state.route_data.contains(id);
                    if keep {
                        trace_log!("Skipping loader for '{}': unchanged", id);
                    }
                    !keep
                }
            }
        })
        .map(|(_, m)| m.clone())
        .collect()
}

fn start_loaders(loads: &[MatchedRoute], location: &Location, signal: &CancellationToken) -> PendingLoads {
    loads
        .iter()
        .filter_map(|m| {
            let handler = m.route.loader.as_ref()?;
            let route_id = m.route.id.clone();
            let args = LoaderArgs {
                route_id: route_id.clone(),
                params: m.params.clone(),
                request: Request {
                    location: location.clone(),
                    method: Method::Get,
                    body: None,
                },
                signal: signal.clone(),
            };
            Some(invoke(handler, args).map(move |result| (route_id, result)).boxed())
        })
        .collect()
}

/// `to` with its query string replaced by the fields of a GET submission body.
fn with_query(to: &str, body: &Value) -> String {
    let (rest, hash) = match to.find('#') {
        Some(pos) => (&to[..pos], &to[pos..]),
        None => (to, ""),
    };
    let path = rest.find('?').map_or(rest, |pos| &rest[..pos]);

    let mut query = QueryParams::new();
    if let Value::Object(fields) = body {
        for (key, value) in fields {
            match value {
                Value::Array(items) => {
                    for item in items {
                        query.insert(key.as_str(), field_text(item));
                    }
                }
                other => query.insert(key.as_str(), field_text(other)),
            }
        }
    }

    if query.is_empty() {
        format!("{path}{hash}")
    } else {
        format!("{path}?{}{hash}", query.to_query_string())
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
