//! Subscription bus: ordered synchronous fan-out with scoped unsubscribe.
//!
//! ```
//! use data_navigator::SubscriptionBus;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let bus = SubscriptionBus::<u32>::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&seen);
//! let subscription = bus.subscribe(move |value| {
//!     counter.fetch_add(*value as usize, Ordering::SeqCst);
//! });
//!
//! bus.notify(&2);
//! drop(subscription);
//! bus.notify(&5);
//! assert_eq!(seen.load(Ordering::SeqCst), 2);
//! ```

use crate::error_log;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Listener callback.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct BusInner<T> {
    listeners: Mutex<Vec<(u64, Listener<T>)>>,
    next_id: AtomicU64,
    dispatch: Mutex<Dispatch<T>>,
}

/// Fan-out in progress and the values raised during it.
struct Dispatch<T> {
    active: bool,
    pending: VecDeque<T>,
}

/// Ordered set of listeners notified synchronously.
///
/// Cloning yields another handle to the same listener set.
pub struct SubscriptionBus<T> {
    inner: Arc<BusInner<T>>,
}

impl<T: 'static> SubscriptionBus<T> {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                dispatch: Mutex::new(Dispatch {
                    active: false,
                    pending: VecDeque::new(),
                }),
            }),
        }
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is dropped or released.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
        T: Send,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));

        let weak: Weak<BusInner<T>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.lock().retain(|(lid, _)| *lid != id);
            }
        })
    }

    /// Call every listener in subscription order.
    ///
    /// The listener list is snapshotted first, so listeners may subscribe,
    /// unsubscribe or trigger navigations re-entrantly. A value notified while
    /// a fan-out is running is queued and delivered once that fan-out ends, so
    /// every listener sees values in notification order. A panicking listener
    /// is logged and skipped.
    ///
    /// Returns how many listener calls completed normally, including those
    /// for queued values; a queued call itself returns 0.
    pub fn notify(&self, value: &T) -> usize
    where
        T: Clone,
    {
        {
            let mut dispatch = self.inner.dispatch.lock();
            if dispatch.active {
                dispatch.pending.push_back(value.clone());
                return 0;
            }
            dispatch.active = true;
        }

        let mut delivered = self.fan_out(value);
        loop {
            let next = {
                let mut dispatch = self.inner.dispatch.lock();
                match dispatch.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        dispatch.active = false;
                        break;
                    }
                }
            };
            delivered += self.fan_out(&next);
        }
        delivered
    }

    fn fan_out(&self, value: &T) -> usize {
        let snapshot: Vec<Listener<T>> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        let mut delivered = 0;
        for (position, listener) in snapshot.iter().enumerate() {
            match std::panic::catch_unwind(AssertUnwindSafe(|| listener(value))) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    error_log!("Listener #{} panicked during notification", position);
                }
            }
        }
        delivered
    }

    /// Remove every listener.
    pub fn clear(&self) {
        self.inner.listeners.lock().clear();
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for SubscriptionBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SubscriptionBus<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for SubscriptionBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionBus")
            .field("listeners", &self.inner.listeners.lock().len())
            .finish()
    }
}

/// Unsubscribe capability. Dropping it removes the listener.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Keep the listener registered for the lifetime of its bus.
    pub fn detach(mut self) {
        self.release = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
