//! Test utilities for router tests
//!
//! Provides fixtures, deferred loaders and state recorders for the
//! integration tests.

#![allow(dead_code)]

use data_navigator::*;
use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Route logging to the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build a router over a fresh in-memory history at `/`.
pub fn router_with(routes: Vec<Route>) -> (Router, Arc<MemoryHistory>) {
    init_logging();
    let history = Arc::new(MemoryHistory::new("/"));
    let router = Router::new(RouterOptions::new(routes).history(Arc::clone(&history)))
        .expect("valid route tree");
    (router, history)
}

/// Loader whose invocations stay pending until the test resolves them.
///
/// Each call registers a pending result at call time (synchronously, while
/// the navigation is being started); [`resolve_next`](Self::resolve_next)
/// settles the oldest one.
#[derive(Clone, Default)]
pub struct Deferred {
    pending: Arc<Mutex<Vec<oneshot::Sender<LoaderResult>>>>,
    calls: Arc<AtomicUsize>,
}

impl Deferred {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loader(&self) -> impl Fn(LoaderArgs) -> BoxFuture<'static, LoaderResult> + Send + Sync + 'static {
        let pending = Arc::clone(&self.pending);
        let calls = Arc::clone(&self.calls);
        move |_args| {
            calls.fetch_add(1, Ordering::SeqCst);
            let (tx, rx) = oneshot::channel();
            pending.lock().push(tx);
            async move { rx.await.unwrap_or(Err(LoaderError::Cancelled)) }.boxed()
        }
    }

    /// Settle the oldest pending call.
    pub fn resolve_next(&self, result: LoaderResult) {
        let tx = {
            let mut pending = self.pending.lock();
            assert!(!pending.is_empty(), "no pending loader call to resolve");
            pending.remove(0)
        };
        let _ = tx.send(result);
    }

    /// Number of times the loader was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls still waiting for a result.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}

/// Loader resolving immediately with `value`, counting its calls.
pub fn counting(value: Value) -> (Arc<AtomicUsize>, impl Fn(LoaderArgs) -> BoxFuture<'static, LoaderResult> + Send + Sync + 'static) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let loader = move |_args: LoaderArgs| {
        counter.fetch_add(1, Ordering::SeqCst);
        let value = value.clone();
        async move { data(value) }.boxed()
    };
    (calls, loader)
}

pub fn count(calls: &AtomicUsize) -> usize {
    calls.load(Ordering::SeqCst)
}

/// Every state the router notifies, in order.
pub struct Recorder {
    states: Arc<Mutex<Vec<RouterState>>>,
    _subscription: Subscription,
}

impl Recorder {
    pub fn attach(router: &Router) -> Self {
        let states = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&states);
        let subscription = router.subscribe(move |state| sink.lock().push(state.clone()));
        Self {
            states,
            _subscription: subscription,
        }
    }

    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    pub fn states(&self) -> Vec<RouterState> {
        self.states.lock().clone()
    }

    /// Pathnames of the idle (committed or settled) notifications.
    pub fn idle_pathnames(&self) -> Vec<String> {
        self.states
            .lock()
            .iter()
            .filter(|s| s.is_idle())
            .map(|s| s.location.pathname.clone())
            .collect()
    }

    /// Short label per notification: `loading:/a`, `submitting:/a`, `idle:/a`.
    pub fn labels(&self) -> Vec<String> {
        self.states
            .lock()
            .iter()
            .map(|s| match &s.transition {
                TransitionState::Idle => format!("idle:{}", s.location.pathname),
                TransitionState::Loading { location, .. } => format!("loading:{}", location.pathname),
                TransitionState::Submitting { location, .. } => format!("submitting:{}", location.pathname),
            })
            .collect()
    }
}

/// Assert that route parameters contain expected key-value pair
pub fn assert_param_equals(params: &RouteParams, key: &str, expected: &str) {
    let value = params.get(key);
    assert!(value.is_some(), "Parameter '{}' not found in RouteParams", key);
    assert_eq!(value.unwrap(), expected, "Parameter '{}' has wrong value", key);
}
