//! # data-navigator
//!
//! A nested data router: match a URL against a tree of routes, run the
//! matched routes' async loaders concurrently, and commit their results
//! atomically. The most recent navigation always wins; results of superseded
//! navigations are discarded.
//!
//! ## Features
//!
//! - Nested routes with static, `:param`, optional `:param?` and splat `*`
//!   segments, index routes and pathless layouts
//! - Concurrent loaders with per-route errors, redirects and advisory
//!   cancellation signals
//! - Form-style submissions: the route action runs, then the branch
//!   revalidates
//! - Hydration from server-rendered data
//! - Synchronous subscription bus for rendering layers
//! - Pluggable history ([`MemoryHistory`] included)
//!
//! ## Quick start
//!
//! ```
//! use data_navigator::{data, redirect, LoaderArgs, Route, Router, RouterOptions};
//! use serde_json::json;
//!
//! let routes = vec![Route::new("/")
//!     .id("root")
//!     .loader(|_| async { data(json!({ "app": "demo" })) })
//!     .children(vec![
//!         Route::index().id("home"),
//!         Route::new("users/:id")
//!             .id("user")
//!             .loader(|args: LoaderArgs| async move {
//!                 match args.params.get("id") {
//!                     Some("me") => redirect("/users/1"),
//!                     Some(id) => data(json!({ "id": id })),
//!                     None => data(json!(null)),
//!                 }
//!             }),
//!     ])];
//!
//! let router = Router::new(RouterOptions::new(routes)).unwrap();
//! let _subscription = router.subscribe(|state| {
//!     println!("{} idle={}", state.location, state.is_idle());
//! });
//!
//! pollster::block_on(router.initialize());
//! let result = pollster::block_on(router.push("/users/me"));
//!
//! assert_eq!(result.location().map(|l| l.pathname.as_str()), Some("/users/1"));
//! assert_eq!(router.state().route_data.loader_data("user"), Some(&json!({ "id": "1" })));
//! ```
//!
//! ## Cargo features
//!
//! - `log` (default) / `tracing`: logging backend
//! - `cache` (default): LRU cache of match results

pub mod data;
pub mod error;
pub mod history;
pub mod loader;
pub mod location;
pub mod matching;
pub mod params;
pub mod resolve;
pub mod route;
pub mod router;
pub mod state;
pub mod subscription;

#[cfg(feature = "cache")]
pub mod cache;

mod logging;

pub use data::{DataStatus, HydrationData, RouteData, RouteResult};
pub use error::{LoaderError, NavigationError, NavigationResult, RouteTreeError};
pub use history::{History, HistoryAction, HistoryUpdate, MemoryHistory};
pub use loader::{data, redirect, LoaderArgs, LoaderOutput, LoaderResult, Method, Request, Submission};
pub use location::Location;
pub use matching::normalize_path;
pub use params::{QueryParams, RouteParams};
pub use resolve::{resolve_matches, MatchedRoute};
pub use route::{Route, RouteDefinition, RouteId, RouteTree};
pub use router::{NavigateOptions, Navigation, Router, RouterOptions, DEFAULT_MAX_REDIRECTS};
pub use state::{NavigationId, RouterState, TransitionState};
pub use subscription::{Subscription, SubscriptionBus};

#[cfg(feature = "cache")]
pub use cache::{CacheStats, MatchCache};
