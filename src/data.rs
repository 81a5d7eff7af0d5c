//! Route data store.
//!
//! Loader results keyed by route id, plus the results of the latest
//! submission's action. Replaced as a whole on every commit.

use crate::error::LoaderError;
use crate::resolve::MatchedRoute;
use crate::route::RouteId;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Status of a stored result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataStatus {
    Success,
    Error,
}

/// One loader or action outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteResult {
    Success(Value),
    Error(LoaderError),
}

impl RouteResult {
    pub fn status(&self) -> DataStatus {
        match self {
            RouteResult::Success(_) => DataStatus::Success,
            RouteResult::Error(_) => DataStatus::Error,
        }
    }

    /// Data on success, or the error's renderable value.
    pub fn value(&self) -> Value {
        match self {
            RouteResult::Success(value) => value.clone(),
            RouteResult::Error(error) => error.to_value(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RouteResult::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RouteResult::Error(_))
    }
}

impl From<Result<Value, LoaderError>> for RouteResult {
    fn from(result: Result<Value, LoaderError>) -> Self {
        match result {
            Ok(value) => RouteResult::Success(value),
            Err(error) => RouteResult::Error(error),
        }
    }
}

/// Committed loader and action results.
///
/// ```
/// use data_navigator::{HydrationData, RouteData};
/// use serde_json::json;
///
/// let hydration: HydrationData = serde_json::from_value(json!({
///     "loaderData": { "root": { "user": "ada" } },
///     "errors": { "feed": "offline" }
/// }))
/// .unwrap();
///
/// let data = RouteData::from_hydration(&hydration);
/// assert_eq!(data.loader_data("root"), Some(&json!({ "user": "ada" })));
/// assert!(data.error("feed").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteData {
    loader: HashMap<RouteId, RouteResult>,
    action: HashMap<RouteId, RouteResult>,
}

impl RouteData {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded from server-rendered data. Errors win over data for the
    /// same route.
    pub fn from_hydration(hydration: &HydrationData) -> Self {
        let mut loader: HashMap<RouteId, RouteResult> = hydration
            .loader_data
            .iter()
            .map(|(id, value)| (RouteId::from(id.as_str()), RouteResult::Success(value.clone())))
            .collect();
        for (id, value) in &hydration.errors {
            loader.insert(
                RouteId::from(id.as_str()),
                RouteResult::Error(LoaderError::Data(value.clone())),
            );
        }
        let action = hydration
            .action_data
            .iter()
            .map(|(id, value)| (RouteId::from(id.as_str()), RouteResult::Success(value.clone())))
            .collect();

        Self { loader, action }
    }

    /// Loader result for a route.
    pub fn get(&self, route_id: &str) -> Option<&RouteResult> {
        self.loader.get(route_id)
    }

    /// Successful loader data for a route.
    pub fn loader_data(&self, route_id: &str) -> Option<&Value> {
        match self.loader.get(route_id) {
            Some(RouteResult::Success(value)) => Some(value),
            _ => None,
        }
    }

    /// Loader error for a route.
    pub fn error(&self, route_id: &str) -> Option<&LoaderError> {
        match self.loader.get(route_id) {
            Some(RouteResult::Error(error)) => Some(error),
            _ => None,
        }
    }

    /// Action result of the latest submission, for the route that handled it.
    pub fn action_data(&self, route_id: &str) -> Option<&RouteResult> {
        self.action.get(route_id)
    }

    /// Whether the last commit carried an action result.
    pub fn has_action_data(&self) -> bool {
        !self.action.is_empty()
    }

    pub fn contains(&self, route_id: &str) -> bool {
        self.loader.contains_key(route_id)
    }

    /// Loader results in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&RouteId, &RouteResult)> {
        self.loader.iter()
    }

    pub fn len(&self) -> usize {
        self.loader.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loader.is_empty()
    }

    /// Build the store committed after a navigation.
    ///
    /// Only matched routes keep entries: freshly `loaded` results overwrite,
    /// matched routes that were skipped retain their previous entry. `action`
    /// replaces the action map (cleared when `None`).
    pub(crate) fn apply(
        &self,
        matches: &[MatchedRoute],
        loaded: HashMap<RouteId, RouteResult>,
        action: Option<(RouteId, RouteResult)>,
    ) -> RouteData {
        let mut loaded = loaded;
        let mut next = HashMap::with_capacity(matches.len());

        for matched in matches {
            let id = &matched.route.id;
            if let Some(result) = loaded.remove(id) {
                next.insert(id.clone(), result);
            } else if let Some(previous) = self.loader.get(id) {
                next.insert(id.clone(), previous.clone());
            }
        }

        RouteData {
            loader: next,
            action: action.into_iter().collect(),
        }
    }
}

/// Data produced ahead of time (typically by a server render) and handed to
/// the router at construction.
///
/// Keys are route ids. Deserializes from the camelCase JSON shape
/// `{ "loaderData": {..}, "actionData": {..}, "errors": {..} }`; every field
/// is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HydrationData {
    pub loader_data: HashMap<String, Value>,
    pub action_data: HashMap<String, Value>,
    pub errors: HashMap<String, Value>,
}

impl HydrationData {
    /// Seed loader data for one route.
    pub fn loader_data(mut self, route_id: impl Into<String>, value: Value) -> Self {
        self.loader_data.insert(route_id.into(), value);
        self
    }

    /// Seed a loader error for one route.
    pub fn error(mut self, route_id: impl Into<String>, value: Value) -> Self {
        self.errors.insert(route_id.into(), value);
        self
    }

    /// Whether a route has seeded data or a seeded error.
    pub fn is_seeded(&self, route_id: &str) -> bool {
        self.loader_data.contains_key(route_id) || self.errors.contains_key(route_id)
    }
}
