//! Named-event publish/subscribe
//!
//! A minimal in-process bus used to signal across call stacks without the
//! emitter holding a reference to whoever listens (cancellation of an
//! outstanding request is the motivating case).
//!
//! - Handlers for one name run synchronously, in registration order.
//! - Emitting a name nobody listens to is a no-op.
//! - [`EventBus::subscribe`] returns a [`Subscription`] guard that removes its
//!   handler on drop, so per-call listeners never accumulate.
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! use rosterlink_common::events::EventBus;
//!
//! let bus: Arc<EventBus<u32>> = Arc::new(EventBus::new());
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&seen);
//! let subscription = bus.subscribe("tick", move |n| {
//!     counter.fetch_add(*n as usize, Ordering::SeqCst);
//! });
//!
//! bus.emit("tick", &2);
//! drop(subscription);
//! bus.emit("tick", &2);
//!
//! assert_eq!(seen.load(Ordering::SeqCst), 2);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

/// Shared handler callable from any thread
pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Identity of one registration, returned by [`EventBus::on`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Registry<T> = HashMap<String, Vec<(HandlerId, Handler<T>)>>;

/// Named-event bus carrying payloads of type `T`
pub struct EventBus<T> {
    handlers: Mutex<Registry<T>>,
    next_id: AtomicU64,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.lock();
        let mut names: Vec<(&str, usize)> =
            handlers.iter().map(|(name, list)| (name.as_str(), list.len())).collect();
        names.sort_unstable();
        f.debug_struct("EventBus").field("handlers", &names).finish()
    }
}

impl<T> EventBus<T> {
    /// Create an empty bus
    pub fn new() -> Self {
        Self { handlers: Mutex::new(HashMap::new()), next_id: AtomicU64::new(1) }
    }

    /// Register `handler` for `name`
    ///
    /// Multiple handlers per name are allowed. The returned id is the only
    /// way to remove this specific handler with [`EventBus::off`].
    pub fn on<F>(&self, name: &str, handler: F) -> HandlerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.lock().entry(name.to_string()).or_default().push((id, Arc::new(handler)));
        trace!(event = name, handler = id.0, "registered event handler");
        id
    }

    /// Invoke every handler registered for `name` with `data`
    ///
    /// Returns the number of handlers invoked; `0` when the name was never
    /// registered. The registry lock is released before handlers run, so a
    /// handler may register or remove handlers itself.
    pub fn emit(&self, name: &str, data: &T) -> usize {
        let snapshot: Vec<Handler<T>> = match self.handlers.lock().get(name) {
            Some(list) => list.iter().map(|(_, handler)| Arc::clone(handler)).collect(),
            None => Vec::new(),
        };

        trace!(event = name, handlers = snapshot.len(), "emitting event");

        for handler in &snapshot {
            handler(data);
        }
        snapshot.len()
    }

    /// Remove registrations
    ///
    /// - `off(None, None)` clears every registration.
    /// - `off(Some(name), None)` clears all handlers for `name`.
    /// - `off(Some(name), Some(id))` removes the first handler matching `id`.
    ///
    /// An id without a name removes nothing.
    pub fn off(&self, name: Option<&str>, handler: Option<HandlerId>) {
        let mut handlers = self.handlers.lock();

        let Some(name) = name else {
            if handler.is_none() {
                handlers.clear();
            }
            return;
        };

        match handler {
            None => {
                handlers.remove(name);
            }
            Some(id) => {
                let Some(list) = handlers.get_mut(name) else {
                    return;
                };
                if let Some(index) = list.iter().position(|(existing, _)| *existing == id) {
                    list.remove(index);
                }
                if list.is_empty() {
                    handlers.remove(name);
                }
            }
        }
    }

    /// Number of handlers currently registered for `name`
    pub fn handler_count(&self, name: &str) -> usize {
        self.handlers.lock().get(name).map_or(0, Vec::len)
    }

    /// `true` when no handler is registered under any name
    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }
}

impl<T: 'static> EventBus<T> {
    /// Register `handler` for as long as the returned guard lives
    pub fn subscribe<F>(self: &Arc<Self>, name: &str, handler: F) -> Subscription<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.on(name, handler);
        Subscription { bus: Arc::downgrade(self), name: name.to_string(), id }
    }
}

/// Scoped registration created by [`EventBus::subscribe`]
///
/// Dropping the guard unregisters the handler. The guard holds the bus
/// weakly and does nothing if the bus is already gone.
#[must_use = "dropping the subscription unregisters the handler immediately"]
pub struct Subscription<T: 'static> {
    bus: Weak<EventBus<T>>,
    name: String,
    id: HandlerId,
}

impl<T: 'static> Subscription<T> {
    /// Id of the underlying registration
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Event name this subscription listens to
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: 'static> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("name", &self.name).field("id", &self.id).finish()
    }
}

impl<T: 'static> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.off(Some(&self.name), Some(self.id));
        }
    }
}
