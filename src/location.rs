//! Locations: the committed "where am I" value of the router.

use crate::matching::normalize_path;
use crate::params::QueryParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Key of the initial history entry.
pub const DEFAULT_KEY: &str = "default";

/// An immutable URL location plus navigation state.
///
/// Replaced wholesale on every commit; never mutated in place by the router.
///
/// ```
/// use data_navigator::Location;
///
/// let loc = Location::from_path("/users/42?tab=posts#top");
/// assert_eq!(loc.pathname, "/users/42");
/// assert_eq!(loc.search, "?tab=posts");
/// assert_eq!(loc.hash, "#top");
/// assert_eq!(loc.path(), "/users/42?tab=posts#top");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Normalized path, always starting with `/`
    pub pathname: String,
    /// Query string including the leading `?`, or empty
    pub search: String,
    /// Fragment including the leading `#`, or empty
    pub hash: String,
    /// Arbitrary state attached by the navigation that produced this location
    pub state: Option<Value>,
    /// Identifies the history entry
    pub key: String,
}

impl Location {
    /// Parse a path (`/a/b?x=1#frag`) into a location with the default key.
    pub fn from_path(path: &str) -> Self {
        let (rest, hash) = match path.find('#') {
            Some(pos) => (&path[..pos], &path[pos..]),
            None => (path, ""),
        };
        let (pathname, search) = match rest.find('?') {
            Some(pos) => (&rest[..pos], &rest[pos..]),
            None => (rest, ""),
        };

        Self {
            pathname: normalize_path(pathname).into_owned(),
            search: if search == "?" { String::new() } else { search.to_string() },
            hash: if hash == "#" { String::new() } else { hash.to_string() },
            state: None,
            key: DEFAULT_KEY.to_string(),
        }
    }

    /// Resolve `to` against this location, producing a new entry with a
    /// fresh key.
    ///
    /// - `/abs` paths are taken as-is.
    /// - `?query` and `#hash` keep the current pathname.
    /// - Anything else is relative to the current pathname; `.` and `..`
    ///   segments are applied.
    ///
    /// ```
    /// use data_navigator::Location;
    ///
    /// let here = Location::from_path("/users/42?tab=posts");
    /// assert_eq!(here.resolve("edit").pathname, "/users/42/edit");
    /// assert_eq!(here.resolve("../7").pathname, "/users/7");
    /// assert_eq!(here.resolve("?tab=likes").path(), "/users/42?tab=likes");
    /// assert_eq!(here.resolve("#bio").path(), "/users/42?tab=posts#bio");
    /// ```
    pub fn resolve(&self, to: &str) -> Location {
        let mut next = if to.starts_with('/') {
            Location::from_path(to)
        } else if to.starts_with('?') {
            let mut loc = Location::from_path(to);
            loc.pathname = self.pathname.clone();
            loc
        } else if to.starts_with('#') {
            Location {
                hash: to.to_string(),
                ..Location::from_path(&format!("{}{}", self.pathname, self.search))
            }
        } else {
            let joined = format!("{}/{}", self.pathname.trim_end_matches('/'), to);
            let mut loc = Location::from_path(&joined);
            loc.pathname = collapse_dot_segments(&loc.pathname);
            loc
        };
        next.key = create_key();
        next
    }

    /// Attach navigation state.
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    /// Full path: pathname, search and hash.
    pub fn path(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }

    /// Parsed query parameters.
    pub fn query(&self) -> QueryParams {
        QueryParams::from_query_string(&self.search)
    }

    /// Same pathname, search and hash (state and key ignored).
    pub fn same_path(&self, other: &Location) -> bool {
        self.pathname == other.pathname && self.search == other.search && self.hash == other.hash
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::from_path("/")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.pathname, self.search, self.hash)
    }
}

/// Short random key for a new history entry.
pub(crate) fn create_key() -> String {
    let mut key = uuid::Uuid::new_v4().simple().to_string();
    key.truncate(8);
    key
}

fn collapse_dot_segments(pathname: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in pathname.split('/').filter(|s| !s.is_empty()) {
        match segment {
            "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    format!("/{}", out.join("/"))
}
