//! Route resolution: path → ordered branch of [`MatchedRoute`]s.
//!
//! # Example
//!
//! Given routes:
//! ```text
//! /              (root layout)
//!   ""           (index)
//!   users        (has children)
//!     new        (leaf)
//!     :id        (param leaf)
//!   *            (catch-all)
//! ```
//!
//! `/users/new` resolves to `[/, users, new]` (static beats param),
//! `/users/42` to `[/, users, :id]` with `id = "42"`, `/` to `[/, index]`, and
//! anything else to `[/, *]`.
//!
//! # Algorithm
//!
//! At every level the siblings are ranked by [`RouteScore`](crate::matching::RouteScore)
//! (declaration order breaks ties) and tried in that order. Pathless layouts
//! do not rank themselves: their children are ranked alongside the layout's
//! siblings, and the layout is entered when one of them matches. A candidate
//! matches when its pattern consumes a prefix of the remaining segments and
//! either nothing remains (leaf, index child, or a `matchable` parent) or one
//! of its children matches the rest. The first complete branch wins; failed
//! candidates are backtracked.

use crate::matching::{match_pattern, normalize_path, split_path};
use crate::route::RouteDefinition;
use crate::RouteParams;
use std::sync::Arc;

/// Maximum nesting depth to prevent runaway recursion
const MAX_DEPTH: usize = 32;

/// One level of a resolved branch.
#[derive(Debug, Clone)]
pub struct MatchedRoute {
    /// The matched route at this level
    pub route: Arc<RouteDefinition>,
    /// Accumulated params (parent params plus this level's)
    pub params: RouteParams,
    /// Path prefix consumed through this route, e.g. `/users/42`
    pub pathname: String,
}

impl MatchedRoute {
    /// Same route with the same params: the data it loaded is still valid
    /// unless it revalidates.
    pub fn same_as(&self, other: &MatchedRoute) -> bool {
        self.route.id == other.route.id && self.params == other.params
    }
}

/// Resolve `path` against the route tree.
///
/// Returns the branch ordered outermost to innermost, or `None` when no route
/// consumes the whole path. Pure; safe to call speculatively.
pub fn resolve_matches(routes: &[Arc<RouteDefinition>], path: &str) -> Option<Vec<MatchedRoute>> {
    let normalized = normalize_path(path);
    let segments = split_path(&normalized);

    let mut branch = Vec::new();
    let found = resolve_level(routes, &segments, 0, &RouteParams::new(), 0, &mut branch);

    if found {
        crate::trace_log!(
            "Resolved '{}' → [{}]",
            path,
            branch
                .iter()
                .map(|m| m.route.id.to_string())
                .collect::<Vec<_>>()
                .join(" → ")
        );
        Some(branch)
    } else {
        crate::debug_log!("No route matches '{}'", path);
        None
    }
}

/// A route reachable at one level, with the pathless layouts wrapping it.
struct Candidate<'a> {
    layouts: Vec<&'a Arc<RouteDefinition>>,
    route: &'a Arc<RouteDefinition>,
}

/// Siblings at one level, with pathless layouts made transparent: their
/// children compete with the layout's own siblings.
fn candidates<'a>(
    routes: &'a [Arc<RouteDefinition>],
    layouts: &mut Vec<&'a Arc<RouteDefinition>>,
    out: &mut Vec<Candidate<'a>>,
) {
    for route in routes {
        if !route.is_layout() {
            out.push(Candidate {
                layouts: layouts.clone(),
                route,
            });
            continue;
        }
        if route.matchable {
            out.push(Candidate {
                layouts: layouts.clone(),
                route,
            });
        }
        if layouts.len() >= MAX_DEPTH {
            continue;
        }
        layouts.push(route);
        candidates(&route.children, layouts, out);
        layouts.pop();
    }
}

fn resolve_level(
    routes: &[Arc<RouteDefinition>],
    segments: &[&str],
    consumed: usize,
    inherited: &RouteParams,
    depth: usize,
    branch: &mut Vec<MatchedRoute>,
) -> bool {
    if depth >= MAX_DEPTH {
        crate::warn_log!(
            "Maximum route nesting depth ({}) exceeded while resolving",
            MAX_DEPTH
        );
        return false;
    }

    let remaining = &segments[consumed..];
    let mut level = Vec::new();
    candidates(routes, &mut Vec::new(), &mut level);

    // Index routes own the parent's exact path, ahead of splats
    if remaining.is_empty() {
        if let Some(index) = level.iter().find(|c| c.route.index) {
            for layout in &index.layouts {
                branch.push(entry(layout, inherited.clone(), segments, consumed));
            }
            branch.push(entry(index.route, inherited.clone(), segments, consumed));
            return true;
        }
    }

    let mut ranked: Vec<&Candidate<'_>> = level.iter().filter(|c| !c.route.index).collect();
    // stable: equal scores keep declaration order
    ranked.sort_by(|a, b| b.route.score.cmp(&a.route.score));

    for candidate in ranked {
        let route = candidate.route;
        for found in match_pattern(&route.segments, remaining) {
            let start = branch.len();
            for layout in &candidate.layouts {
                branch.push(entry(layout, inherited.clone(), segments, consumed));
            }

            let params = RouteParams::merge(inherited, &found.params);
            let end = consumed + found.consumed;
            branch.push(entry(route, params.clone(), segments, end));

            if try_complete(route, segments, end, &params, depth, branch) {
                return true;
            }

            // backtrack
            branch.truncate(start);
        }
    }

    false
}

/// Decide whether `route`, having consumed `segments[..end]`, completes the
/// match (itself or through its children).
fn try_complete(
    route: &Arc<RouteDefinition>,
    segments: &[&str],
    end: usize,
    params: &RouteParams,
    depth: usize,
    branch: &mut Vec<MatchedRoute>,
) -> bool {
    if !route.children.is_empty()
        && resolve_level(&route.children, segments, end, params, depth + 1, branch)
    {
        return true;
    }

    if end < segments.len() {
        return false;
    }

    // Whole path consumed. Leaves always match; parents only when they opt in.
    route.children.is_empty() || route.matchable
}

fn entry(route: &Arc<RouteDefinition>, params: RouteParams, segments: &[&str], end: usize) -> MatchedRoute {
    MatchedRoute {
        route: Arc::clone(route),
        params,
        pathname: format!("/{}", segments[..end].join("/")),
    }
}

// Integration tests live in tests/resolve_tests.rs.
