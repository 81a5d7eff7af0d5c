//! Error and outcome types.
//!
//! - [`NavigationResult`]: what an awaited [`Navigation`](crate::Navigation)
//!   resolves to (`Committed`, `Superseded`, `NotFound`, `Error`).
//! - [`NavigationError`]: navigation-level failures that leave the router
//!   idle without a commit.
//! - [`LoaderError`]: per-route loader/action failures. These are stored in
//!   [`RouteData`](crate::RouteData) and never abort a navigation.
//! - [`RouteTreeError`]: invalid route trees rejected at construction.
//!
//! # Examples
//!
//! ```
//! use data_navigator::{Location, NavigationResult};
//!
//! let result = NavigationResult::Committed { location: Location::from_path("/home") };
//! assert!(result.is_committed());
//! assert_eq!(result.location().map(|l| l.pathname.as_str()), Some("/home"));
//! ```

use crate::location::Location;
use crate::loader::Method;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Navigation Result Types
// ============================================================================

/// Outcome of an awaited navigation.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationResult {
    /// Results were committed; `location` is the new current location.
    ///
    /// For redirected navigations this is the final target.
    Committed { location: Location },
    /// A newer navigation started before this one settled. Nothing was
    /// committed.
    Superseded,
    /// No route matched the target path.
    NotFound { path: String },
    /// Navigation failed without committing.
    Error(NavigationError),
}

impl NavigationResult {
    /// Check if the navigation committed
    pub fn is_committed(&self) -> bool {
        matches!(self, NavigationResult::Committed { .. })
    }

    /// Check if the navigation was superseded
    pub fn is_superseded(&self) -> bool {
        matches!(self, NavigationResult::Superseded)
    }

    /// Check if no route matched
    pub fn is_not_found(&self) -> bool {
        matches!(self, NavigationResult::NotFound { .. })
    }

    /// Check if there was an error
    pub fn is_error(&self) -> bool {
        matches!(self, NavigationResult::Error(_))
    }

    /// Committed location, if any
    pub fn location(&self) -> Option<&Location> {
        match self {
            NavigationResult::Committed { location } => Some(location),
            _ => None,
        }
    }
}

/// Navigation-level failures.
///
/// These are the only cases that return the router to idle without a commit.
/// The most recent one is also exposed as
/// [`RouterState::error`](crate::RouterState::error) until the next commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// No route matched the path
    #[error("Route not found: {path}")]
    RouteNotFound { path: String },

    /// A chain of loader redirects exceeded the configured limit
    #[error("Redirect limit ({limit}) exceeded while redirecting to '{to}'")]
    TooManyRedirects { to: String, limit: usize },

    /// The router was disposed
    #[error("Router has been disposed")]
    Disposed,
}

impl NavigationError {
    pub(crate) fn into_result(self) -> NavigationResult {
        match self {
            NavigationError::RouteNotFound { path } => NavigationResult::NotFound { path },
            other => NavigationResult::Error(other),
        }
    }
}

// ============================================================================
// Loader errors
// ============================================================================

/// Failure reported by a loader or action.
///
/// Recorded per route as an error-status [`RouteResult`](crate::RouteResult);
/// sibling loaders and the navigation itself continue.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoaderError {
    /// Loader failed with a message
    #[error("{message}")]
    Failed { message: String },

    /// Loader failed with structured error data (rendered by an error boundary)
    #[error("loader returned error data: {0}")]
    Data(Value),

    /// Submission reached a route branch with no action
    #[error("{method} is not allowed on route '{route_id}' (no action)")]
    MethodNotAllowed { method: Method, route_id: String },

    /// Loader observed its cancellation signal and gave up
    #[error("loader cancelled")]
    Cancelled,

    /// Loader panicked
    #[error("loader panicked: {message}")]
    Panicked { message: String },
}

impl LoaderError {
    /// Create a [`LoaderError::Failed`] from any message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Value an error boundary would render for this error.
    pub fn to_value(&self) -> Value {
        match self {
            LoaderError::Data(value) => value.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

// ============================================================================
// Route tree errors
// ============================================================================

/// Invalid route tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTreeError {
    /// Two routes share an id
    #[error("duplicate route id '{0}'")]
    DuplicateId(String),

    /// Index routes are leaves
    #[error("index route '{0}' cannot have children")]
    IndexWithChildren(String),

    /// A splat may only appear as the final pattern segment
    #[error("route '{id}' has a splat before the end of its path '{path}'")]
    SplatNotLast { id: String, path: String },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_navigation_result_committed() {
        let result = NavigationResult::Committed {
            location: Location::from_path("/home"),
        };
        assert!(result.is_committed());
        assert!(!result.is_superseded());
        assert!(!result.is_not_found());
        assert!(!result.is_error());
    }

    #[test]
    fn test_route_not_found_maps_to_not_found_result() {
        let result = NavigationError::RouteNotFound {
            path: "/missing".to_string(),
        }
        .into_result();
        assert!(result.is_not_found());
        assert!(result.location().is_none());

        let result = NavigationError::Disposed.into_result();
        assert_eq!(result, NavigationResult::Error(NavigationError::Disposed));
    }

    #[test]
    fn test_navigation_error_display() {
        let error = NavigationError::RouteNotFound {
            path: "/test".to_string(),
        };
        assert_eq!(error.to_string(), "Route not found: /test");

        let error = NavigationError::TooManyRedirects {
            to: "/loop".to_string(),
            limit: 5,
        };
        assert_eq!(
            error.to_string(),
            "Redirect limit (5) exceeded while redirecting to '/loop'"
        );
    }

    #[test]
    fn test_loader_error_value() {
        assert_eq!(LoaderError::failed("boom").to_value(), json!("boom"));
        assert_eq!(
            LoaderError::Data(json!({ "status": 404 })).to_value(),
            json!({ "status": 404 })
        );

        let err = LoaderError::MethodNotAllowed {
            method: Method::Post,
            route_id: "0-1".to_string(),
        };
        assert_eq!(err.to_string(), "POST is not allowed on route '0-1' (no action)");
    }
}
