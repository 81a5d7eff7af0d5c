//! Route tree definitions.
//!
//! Routes are declared with the [`Route`] builder and frozen into a
//! [`RouteTree`] of [`RouteDefinition`]s when the router is constructed.
//! Routes without an explicit id get one from their position in the tree:
//! `"0"`, `"0-1"`, `"0-1-2"`, ...
//!
//! ```
//! use data_navigator::{data, Route, RouteTree};
//! use serde_json::json;
//!
//! let tree = RouteTree::new(vec![Route::new("/")
//!     .loader(|_| async { data(json!("root")) })
//!     .children(vec![
//!         Route::index(),
//!         Route::new("users/:id").id("user"),
//!     ])])
//! .unwrap();
//!
//! assert!(tree.get("0").is_some());
//! assert!(tree.get("0-0").unwrap().index);
//! assert_eq!(tree.get("user").unwrap().path, "users/:id");
//! ```

use crate::error::RouteTreeError;
use crate::loader::{boxed_handler, Handler, LoaderArgs, LoaderResult};
use crate::matching::{parse_pattern, RouteScore, Segment};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Stable identifier of a route within its tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(Arc<str>);

impl RouteId {
    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RouteId {
    fn from(id: &str) -> Self {
        Self(Arc::from(id))
    }
}

impl From<String> for RouteId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl Borrow<str> for RouteId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Route builder
// ============================================================================

/// Route declaration.
pub struct Route {
    path: String,
    id: Option<String>,
    index: bool,
    loader: Option<Handler>,
    action: Option<Handler>,
    children: Vec<Route>,
    revalidate: bool,
    matchable: bool,
}

impl Route {
    /// Route matching `path`, relative to its parent.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            id: None,
            index: false,
            loader: None,
            action: None,
            children: Vec::new(),
            revalidate: true,
            matchable: false,
        }
    }

    /// Index route: matches when the parent's path is matched exactly.
    pub fn index() -> Self {
        Self {
            index: true,
            ..Self::new("")
        }
    }

    /// Pathless layout route wrapping its children.
    pub fn layout() -> Self {
        Self::new("")
    }

    /// Set an explicit id instead of the positional one.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the loader run on every navigation that matches this route.
    pub fn loader<F, Fut>(mut self, loader: F) -> Self
    where
        F: Fn(LoaderArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LoaderResult> + Send + 'static,
    {
        self.loader = Some(boxed_handler(loader));
        self
    }

    /// Set the action run by mutating submissions targeting this route.
    pub fn action<F, Fut>(mut self, action: F) -> Self
    where
        F: Fn(LoaderArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LoaderResult> + Send + 'static,
    {
        self.action = Some(boxed_handler(action));
        self
    }

    /// Append child routes.
    pub fn children(mut self, children: Vec<Route>) -> Self {
        self.children.extend(children);
        self
    }

    /// Append one child route.
    pub fn child(mut self, child: Route) -> Self {
        self.children.push(child);
        self
    }

    /// When `false`, the loader is skipped on navigations that keep this
    /// route matched with the same params.
    pub fn revalidate(mut self, revalidate: bool) -> Self {
        self.revalidate = revalidate;
        self
    }

    /// Allow a route with children and no index child to match its own
    /// exact path.
    pub fn matchable(mut self, matchable: bool) -> Self {
        self.matchable = matchable;
        self
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("id", &self.id)
            .field("index", &self.index)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Frozen definitions
// ============================================================================

/// Immutable route definition, shared by every match that references it.
pub struct RouteDefinition {
    pub id: RouteId,
    /// Pattern as declared
    pub path: String,
    pub index: bool,
    pub revalidate: bool,
    pub matchable: bool,
    pub children: Vec<Arc<RouteDefinition>>,
    pub(crate) segments: Vec<Segment>,
    pub(crate) score: RouteScore,
    pub(crate) loader: Option<Handler>,
    pub(crate) action: Option<Handler>,
}

impl RouteDefinition {
    /// Whether the route has a loader.
    pub fn has_loader(&self) -> bool {
        self.loader.is_some()
    }

    /// Whether the route has an action.
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Parsed pattern segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Rank among siblings.
    pub fn score(&self) -> &RouteScore {
        &self.score
    }

    /// Pathless layout: empty pattern wrapping children.
    pub fn is_layout(&self) -> bool {
        self.segments.is_empty() && !self.index && !self.children.is_empty()
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("index", &self.index)
            .field("has_loader", &self.has_loader())
            .field("has_action", &self.has_action())
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Validated, immutable route tree.
#[derive(Debug, Clone)]
pub struct RouteTree {
    roots: Vec<Arc<RouteDefinition>>,
    by_id: HashMap<RouteId, Arc<RouteDefinition>>,
}

impl RouteTree {
    /// Freeze and validate a list of top-level routes.
    pub fn new(routes: Vec<Route>) -> Result<Self, RouteTreeError> {
        let mut by_id = HashMap::new();
        let roots = freeze_level(routes, None, &mut by_id)?;
        crate::debug_log!(
            "Route tree built: {} top-level routes, {} total",
            roots.len(),
            by_id.len()
        );
        Ok(Self { roots, by_id })
    }

    /// Top-level routes in declaration order.
    pub fn roots(&self) -> &[Arc<RouteDefinition>] {
        &self.roots
    }

    /// Look up a route by id.
    pub fn get(&self, id: &str) -> Option<&Arc<RouteDefinition>> {
        self.by_id.get(id)
    }

    /// Total number of routes.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the tree has no routes.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

fn freeze_level(
    routes: Vec<Route>,
    parent_id: Option<&str>,
    by_id: &mut HashMap<RouteId, Arc<RouteDefinition>>,
) -> Result<Vec<Arc<RouteDefinition>>, RouteTreeError> {
    let mut frozen = Vec::with_capacity(routes.len());

    for (position, route) in routes.into_iter().enumerate() {
        let id = route.id.unwrap_or_else(|| match parent_id {
            Some(parent) => format!("{parent}-{position}"),
            None => position.to_string(),
        });

        if route.index && !route.children.is_empty() {
            return Err(RouteTreeError::IndexWithChildren(id));
        }

        let segments = parse_pattern(&route.path);
        let splat_not_last = segments
            .iter()
            .rev()
            .skip(1)
            .any(|s| matches!(s, Segment::Splat(_)));
        if splat_not_last {
            return Err(RouteTreeError::SplatNotLast {
                id,
                path: route.path,
            });
        }

        let children = freeze_level(route.children, Some(&id), by_id)?;
        let id = RouteId::from(id);
        let definition = Arc::new(RouteDefinition {
            id: id.clone(),
            path: route.path,
            index: route.index,
            revalidate: route.revalidate,
            matchable: route.matchable,
            children,
            score: RouteScore::of(&segments),
            segments,
            loader: route.loader,
            action: route.action,
        });

        if by_id.insert(id.clone(), Arc::clone(&definition)).is_some() {
            return Err(RouteTreeError::DuplicateId(id.to_string()));
        }
        frozen.push(definition);
    }

    Ok(frozen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::data;
    use serde_json::json;

    #[test]
    fn test_positional_ids() {
        let tree = RouteTree::new(vec![
            Route::new("/").children(vec![Route::new("a"), Route::new("b").child(Route::new("c"))]),
            Route::new("/other"),
        ])
        .unwrap();

        for id in ["0", "0-0", "0-1", "0-1-0", "1"] {
            assert!(tree.get(id).is_some(), "missing route id {id}");
        }
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.roots().len(), 2);
    }

    #[test]
    fn test_explicit_ids_feed_child_positions() {
        let tree = RouteTree::new(vec![Route::new("/").id("root").child(Route::new("a"))]).unwrap();
        assert!(tree.get("root-0").is_some());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = RouteTree::new(vec![Route::new("/a").id("x"), Route::new("/b").id("x")]).unwrap_err();
        assert_eq!(err, RouteTreeError::DuplicateId("x".to_string()));
    }

    #[test]
    fn test_index_with_children_rejected() {
        let err = RouteTree::new(vec![Route::index().child(Route::new("a"))]).unwrap_err();
        assert_eq!(err, RouteTreeError::IndexWithChildren("0".to_string()));
    }

    #[test]
    fn test_splat_must_be_last() {
        let err = RouteTree::new(vec![Route::new("/files/*/edit")]).unwrap_err();
        assert!(matches!(err, RouteTreeError::SplatNotLast { .. }));
        assert!(RouteTree::new(vec![Route::new("/files/*")]).is_ok());
    }

    #[test]
    fn test_definition_flags() {
        let tree = RouteTree::new(vec![Route::layout()
            .loader(|_| async { data(json!(1)) })
            .revalidate(false)
            .child(Route::index())])
        .unwrap();

        let layout = tree.get("0").unwrap();
        assert!(layout.is_layout());
        assert!(layout.has_loader());
        assert!(!layout.has_action());
        assert!(!layout.revalidate);
        assert!(!tree.get("0-0").unwrap().is_layout());
    }
}
