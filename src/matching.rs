//! Segment-level pattern matching and ranking.
//!
//! Route patterns are split by `/` into [`Segment`]s:
//!
//! | Syntax     | Segment              | Binds                         |
//! |------------|----------------------|-------------------------------|
//! | `users`    | [`Segment::Static`]  | nothing                       |
//! | `:id`      | [`Segment::Param`]   | one path segment              |
//! | `:id?`     | [`Segment::Optional`]| one path segment, or nothing  |
//! | `*`/`*rest`| [`Segment::Splat`]   | the remaining path (maybe "") |
//!
//! Sibling routes are ranked by [`RouteScore`]; the tree walk lives in
//! [`resolve`](crate::resolve).

use crate::params::{decode_uri_component, RouteParams};
use std::borrow::Cow;

/// Param name a bare `*` splat binds to.
pub const SPLAT_PARAM: &str = "*";

/// One parsed segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text that must match exactly
    Static(String),
    /// `:name`: binds exactly one segment
    Param(String),
    /// `:name?`: binds one segment if present
    Optional(String),
    /// `*` or `*name`: binds the remainder
    Splat(String),
}

impl Segment {
    /// Parse a single pattern segment.
    pub fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix(':') {
            match name.strip_suffix('?') {
                Some(name) => Segment::Optional(name.to_string()),
                None => Segment::Param(name.to_string()),
            }
        } else if let Some(name) = raw.strip_prefix('*') {
            let name = if name.is_empty() { SPLAT_PARAM } else { name };
            Segment::Splat(name.to_string())
        } else {
            Segment::Static(raw.to_string())
        }
    }

    fn kind(&self) -> SegmentKind {
        match self {
            Segment::Static(_) => SegmentKind::Static,
            Segment::Param(_) => SegmentKind::Param,
            Segment::Optional(_) => SegmentKind::Optional,
            Segment::Splat(_) => SegmentKind::Splat,
        }
    }
}

/// Segment kinds ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SegmentKind {
    Splat,
    Optional,
    Param,
    Static,
}

/// Rank of a route pattern among its siblings. Higher wins.
///
/// Compared lexicographically by segment kind, so the first differing segment
/// decides (`static > param > optional > splat`); when one pattern is a
/// prefix of the other the longer one wins.
///
/// ```
/// use data_navigator::matching::{parse_pattern, RouteScore};
///
/// let score = |p: &str| RouteScore::of(&parse_pattern(p));
/// assert!(score("users/new") > score("users/:id"));
/// assert!(score("users/:id") > score("users"));
/// assert!(score("users/:id") > score("users/*"));
/// assert!(score("users") > score(""));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteScore(Vec<SegmentKind>);

impl RouteScore {
    /// Score a parsed pattern.
    pub fn of(segments: &[Segment]) -> Self {
        Self(segments.iter().map(Segment::kind).collect())
    }
}

/// One way a pattern can consume the front of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// Number of path segments consumed
    pub consumed: usize,
    /// Params bound by this pattern alone
    pub params: RouteParams,
}

/// Parse a route pattern into segments. Leading/trailing slashes are ignored.
pub fn parse_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(Segment::parse)
        .collect()
}

/// Match `pattern` against the front of `path`, listing every way it can.
///
/// Alternatives are ordered by more segments consumed first, so callers that
/// take the first workable alternative get greedy optional segments with
/// fallback.
///
/// ```
/// use data_navigator::matching::{match_pattern, parse_pattern};
///
/// let pattern = parse_pattern("users/:id");
/// let found = match_pattern(&pattern, &["users", "42", "posts"]);
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].consumed, 2);
/// assert_eq!(found[0].params.get("id"), Some("42"));
///
/// assert!(match_pattern(&pattern, &["posts", "42"]).is_empty());
/// ```
pub fn match_pattern(pattern: &[Segment], path: &[&str]) -> Vec<PatternMatch> {
    let mut out = Vec::new();
    match_from(pattern, path, 0, RouteParams::new(), &mut out);
    out.sort_by(|a, b| b.consumed.cmp(&a.consumed));
    out
}

fn match_from(
    pattern: &[Segment],
    path: &[&str],
    consumed: usize,
    params: RouteParams,
    out: &mut Vec<PatternMatch>,
) {
    let Some((first, rest)) = pattern.split_first() else {
        out.push(PatternMatch { consumed, params });
        return;
    };
    let remaining = &path[consumed..];

    match first {
        Segment::Static(text) => {
            if remaining.first() == Some(&text.as_str()) {
                match_from(rest, path, consumed + 1, params, out);
            }
        }
        Segment::Param(name) => {
            if let Some(value) = remaining.first() {
                let mut params = params;
                params.insert(name.clone(), decode_uri_component(value));
                match_from(rest, path, consumed + 1, params, out);
            }
        }
        Segment::Optional(name) => {
            if let Some(value) = remaining.first() {
                let mut with = params.clone();
                with.insert(name.clone(), decode_uri_component(value));
                match_from(rest, path, consumed + 1, with, out);
            }
            match_from(rest, path, consumed, params, out);
        }
        Segment::Splat(name) => {
            let mut params = params;
            let value: Vec<String> = remaining.iter().map(|s| decode_uri_component(s)).collect();
            params.insert(name.clone(), value.join("/"));
            out.push(PatternMatch {
                consumed: path.len(),
                params,
            });
        }
    }
}

/// Split a path into segments, filtering empty segments
///
/// ```
/// use data_navigator::matching::split_path;
///
/// assert_eq!(split_path("/users/123"), vec!["users", "123"]);
/// assert!(split_path("/").is_empty());
/// assert_eq!(split_path("//users//"), vec!["users"]);
/// ```
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Normalize a path for consistent comparison
///
/// Leading slash, no trailing slash (unless root), repeated slashes collapsed.
/// Borrows when the input is already normalized.
///
/// ```
/// use data_navigator::normalize_path;
///
/// assert_eq!(normalize_path("/dashboard"), "/dashboard");
/// assert_eq!(normalize_path("dashboard/"), "/dashboard");
/// assert_eq!(normalize_path("//a//b"), "/a/b");
/// assert_eq!(normalize_path(""), "/");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    let already = path.starts_with('/')
        && (path == "/" || !path.ends_with('/'))
        && !path.contains("//");
    if already {
        return Cow::Borrowed(path);
    }

    let segments = split_path(path);
    if segments.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", segments.join("/")))
    }
}
