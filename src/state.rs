//! Router state snapshot

use crate::data::RouteData;
use crate::error::NavigationError;
use crate::loader::Submission;
use crate::location::Location;
use crate::resolve::MatchedRoute;
use std::fmt;

/// Identifier minted for every navigation attempt.
///
/// Strictly increasing per router; only the latest one may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NavigationId(pub(crate) u64);

impl NavigationId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NavigationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// In-flight navigation, if any.
#[derive(Debug, Clone, Default)]
pub enum TransitionState {
    /// Nothing in flight
    #[default]
    Idle,
    /// Loaders of `location` are running
    Loading {
        location: Location,
        matches: Vec<MatchedRoute>,
    },
    /// A mutating submission to `location` is running
    Submitting {
        location: Location,
        matches: Vec<MatchedRoute>,
        submission: Submission,
    },
}

impl TransitionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, TransitionState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, TransitionState::Loading { .. })
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, TransitionState::Submitting { .. })
    }

    /// Target of the in-flight navigation.
    pub fn location(&self) -> Option<&Location> {
        match self {
            TransitionState::Idle => None,
            TransitionState::Loading { location, .. } | TransitionState::Submitting { location, .. } => {
                Some(location)
            }
        }
    }

    /// Submission being processed, if submitting.
    pub fn submission(&self) -> Option<&Submission> {
        match self {
            TransitionState::Submitting { submission, .. } => Some(submission),
            _ => None,
        }
    }
}

/// Everything a rendering layer needs: handed to subscribers on every change
/// and returned by [`Router::state`](crate::Router::state).
#[derive(Debug, Clone)]
pub struct RouterState {
    /// Committed location
    pub location: Location,
    /// Matched branch of the committed location
    pub matches: Vec<MatchedRoute>,
    pub transition: TransitionState,
    pub route_data: RouteData,
    /// Last navigation-level failure; cleared by the next commit
    pub error: Option<NavigationError>,
    /// Set once the first commit (navigation or hydration) has happened
    pub initialized: bool,
}

impl RouterState {
    pub(crate) fn new(location: Location, route_data: RouteData) -> Self {
        Self {
            location,
            matches: Vec::new(),
            transition: TransitionState::Idle,
            route_data,
            error: None,
            initialized: false,
        }
    }

    /// Whether nothing is in flight.
    pub fn is_idle(&self) -> bool {
        self.transition.is_idle()
    }

    /// Current pathname
    pub fn pathname(&self) -> &str {
        &self.location.pathname
    }

    /// Ids of the committed matches, outermost first.
    pub fn match_ids(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.route.id.as_str()).collect()
    }

    /// Params of the innermost committed match.
    pub fn params(&self) -> Option<&crate::RouteParams> {
        self.matches.last().map(|m| &m.params)
    }
}
