//! History sources.
//!
//! The router treats history as an external collaborator: it reads the
//! initial location, pushes/replaces entries on commit, and listens for pops.
//! [`MemoryHistory`] is an in-process implementation suitable for tests and
//! non-browser hosts.

use crate::location::{create_key, Location};
use crate::subscription::{Subscription, SubscriptionBus};
use crate::{debug_log, trace_log};
use parking_lot::Mutex;

/// Kind of history change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryAction {
    /// New entry after the current one; forward entries are dropped
    Push,
    /// Current entry overwritten
    Replace,
    /// Moved within existing entries (back/forward)
    Pop,
}

/// Delivered to history listeners when the current entry moves.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryUpdate {
    pub action: HistoryAction,
    pub location: Location,
    /// Entries moved: negative for back, positive for forward
    pub delta: isize,
}

/// History capability consumed by the router.
///
/// Implementations notify listeners for pops only; pushes and replaces are
/// initiated by the router itself.
pub trait History: Send + Sync + 'static {
    /// Current entry.
    fn location(&self) -> Location;

    /// Append an entry after the current one.
    fn push(&self, location: Location);

    /// Overwrite the current entry.
    fn replace(&self, location: Location);

    /// Move `delta` entries (clamped). Listeners are notified when the
    /// current entry changes.
    fn go(&self, delta: isize);

    /// Register a pop listener.
    fn listen(&self, listener: Box<dyn Fn(&HistoryUpdate) + Send + Sync>) -> Subscription;
}

#[derive(Debug)]
struct Entries {
    stack: Vec<Location>,
    current: usize,
}

/// In-memory history stack.
///
/// ```
/// use data_navigator::{History, Location, MemoryHistory};
///
/// let history = MemoryHistory::new("/");
/// history.push(Location::from_path("/users"));
/// history.push(Location::from_path("/users/1"));
/// history.go(-1);
/// assert_eq!(history.location().pathname, "/users");
/// assert!(history.can_go_forward());
/// ```
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<Entries>,
    listeners: SubscriptionBus<HistoryUpdate>,
}

impl MemoryHistory {
    /// History with a single initial entry.
    pub fn new(initial: &str) -> Self {
        Self::with_entries(&[initial], 0)
    }

    /// History with the given entries; `index` (clamped) is current.
    /// An empty list starts at `/`.
    pub fn with_entries(paths: &[&str], index: usize) -> Self {
        let mut stack: Vec<Location> = paths
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let location = Location::from_path(path);
                if i == 0 {
                    location
                } else {
                    Location {
                        key: create_key(),
                        ..location
                    }
                }
            })
            .collect();
        if stack.is_empty() {
            stack.push(Location::default());
        }
        let current = index.min(stack.len() - 1);

        Self {
            entries: Mutex::new(Entries { stack, current }),
            listeners: SubscriptionBus::new(),
        }
    }

    /// Go back one entry.
    pub fn back(&self) {
        self.go(-1);
    }

    /// Go forward one entry.
    pub fn forward(&self) {
        self.go(1);
    }

    /// Check if can go back.
    pub fn can_go_back(&self) -> bool {
        self.entries.lock().current > 0
    }

    /// Check if can go forward.
    pub fn can_go_forward(&self) -> bool {
        let entries = self.entries.lock();
        entries.current + 1 < entries.stack.len()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().stack.len()
    }

    /// Always `false`: there is at least one entry.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Index of the current entry.
    pub fn index(&self) -> usize {
        self.entries.lock().current
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History for MemoryHistory {
    fn location(&self) -> Location {
        let entries = self.entries.lock();
        entries.stack[entries.current].clone()
    }

    fn push(&self, location: Location) {
        let mut entries = self.entries.lock();
        let keep = entries.current + 1;
        // Remove forward history when pushing
        entries.stack.truncate(keep);
        trace_log!("History push '{}' at index {}", location, keep);
        entries.stack.push(location);
        entries.current = keep;
    }

    fn replace(&self, location: Location) {
        let mut entries = self.entries.lock();
        let current = entries.current;
        trace_log!("History replace '{}' at index {}", location, current);
        entries.stack[current] = location;
    }

    fn go(&self, delta: isize) {
        let update = {
            let mut entries = self.entries.lock();
            let last = entries.stack.len() - 1;
            let target = entries
                .current
                .saturating_add_signed(delta)
                .min(last);
            if target == entries.current {
                return;
            }
            let moved = target as isize - entries.current as isize;
            entries.current = target;
            HistoryUpdate {
                action: HistoryAction::Pop,
                location: entries.stack[target].clone(),
                delta: moved,
            }
        };

        debug_log!("History pop to '{}' (delta {})", update.location, update.delta);
        self.listeners.notify(&update);
    }

    fn listen(&self, listener: Box<dyn Fn(&HistoryUpdate) + Send + Sync>) -> Subscription {
        self.listeners.subscribe(listener)
    }
}
