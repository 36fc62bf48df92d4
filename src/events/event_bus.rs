//! Synchronous event bus for passenger events.
//!
//! Handlers are keyed by event type and invoked on the publishing thread,
//! one after another in registration order, before `emit` returns. Each
//! handler receives the event mutably, so a later handler sees the cancelled
//! flag or recipient list left behind by an earlier one.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::events::base_event::BaseEvent;
use crate::events::types::passenger_events::{
    AddPassengerEvent, PassengerPacketEvent, RemovePassengerEvent,
};

// ---------------------------------------------------------------------------
// EventPublisher
// ---------------------------------------------------------------------------

/// Event delivery seam used by the mutation gateway and dispatch stage.
///
/// Implementations must invoke every observer before returning; the caller
/// inspects the cancelled flag (and recipient list) right after.
pub trait EventPublisher: Send + Sync {
    fn publish_add(&self, event: &mut AddPassengerEvent);

    fn publish_remove(&self, event: &mut RemovePassengerEvent);

    fn publish_packet(&self, event: &mut PassengerPacketEvent);
}

// ---------------------------------------------------------------------------
// Handler types
// ---------------------------------------------------------------------------

/// Type-erased handler stored in the bus.
type ErasedHandler = Arc<dyn Fn(&mut dyn Any) + Send + Sync>;

/// Identifies a registered handler so it can be removed again.
#[derive(Clone)]
pub struct HandlerId {
    /// Human-readable name.
    pub name: String,
    /// Unique numeric ID (monotonically increasing).
    id: u64,
}

impl fmt::Debug for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerId({}:{})", self.id, self.name)
    }
}

impl PartialEq for HandlerId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for HandlerId {}

static HANDLER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

impl HandlerId {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: HANDLER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }
}

#[derive(Clone)]
struct HandlerEntry {
    id: HandlerId,
    handler: ErasedHandler,
}

// ---------------------------------------------------------------------------
// PassengerEventBus
// ---------------------------------------------------------------------------

/// In-process, synchronous implementation of [`EventPublisher`].
///
/// A panicking handler is logged and skipped; the remaining handlers still
/// run and the event keeps whatever state the panicking handler left.
#[derive(Default)]
pub struct PassengerEventBus {
    /// Handlers keyed by event `TypeId`, in registration order.
    handlers: RwLock<HashMap<TypeId, Vec<HandlerEntry>>>,
}

impl fmt::Debug for PassengerEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read();
        f.debug_struct("PassengerEventBus")
            .field("event_types", &handlers.len())
            .field(
                "handlers",
                &handlers.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

impl PassengerEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Append a handler for the given event type `E`.
    ///
    /// Returns the [`HandlerId`] to pass to [`off`](Self::off).
    pub fn on<E: BaseEvent + 'static>(
        &self,
        name: impl Into<String>,
        handler: impl Fn(&mut E) + Send + Sync + 'static,
    ) -> HandlerId {
        let id = HandlerId::new(name);
        let erased: ErasedHandler = Arc::new(move |event: &mut dyn Any| {
            if let Some(event) = event.downcast_mut::<E>() {
                handler(event);
            }
        });
        self.handlers
            .write()
            .entry(TypeId::of::<E>())
            .or_default()
            .push(HandlerEntry {
                id: id.clone(),
                handler: erased,
            });
        id
    }

    /// Unregister a handler by its [`HandlerId`]. Returns `true` if it was present.
    pub fn off<E: BaseEvent + 'static>(&self, handler_id: &HandlerId) -> bool {
        let type_id = TypeId::of::<E>();
        let mut map = self.handlers.write();
        let Some(entries) = map.get_mut(&type_id) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != *handler_id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            map.remove(&type_id);
        }
        removed
    }

    /// Number of handlers registered for `E`.
    pub fn handler_count<E: BaseEvent + 'static>(&self) -> usize {
        self.handlers
            .read()
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    /// Remove every handler.
    pub fn clear(&self) {
        self.handlers.write().clear();
    }

    // -----------------------------------------------------------------------
    // Emission
    // -----------------------------------------------------------------------

    /// Deliver `event` to every handler registered for `E`, in registration
    /// order.
    ///
    /// Handlers run on the calling thread. The handler table is snapshotted
    /// first, so handlers may register or unregister handlers themselves.
    pub fn emit<E: BaseEvent + 'static>(&self, event: &mut E) {
        let entries: Vec<HandlerEntry> = {
            let map = self.handlers.read();
            match map.get(&TypeId::of::<E>()) {
                Some(v) if !v.is_empty() => v.clone(),
                _ => return,
            }
        };

        log::trace!(
            "[PassengerEventBus] Emitting {} ({}) to {} handler(s)",
            event.event_type(),
            event.event_id(),
            entries.len()
        );

        for entry in &entries {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                (entry.handler)(&mut *event as &mut dyn Any);
            }));
            if let Err(e) = result {
                log::error!(
                    "[PassengerEventBus] Handler {:?} panicked on {}: {:?}",
                    entry.id,
                    event.event_type(),
                    e
                );
            }
        }
    }
}

impl EventPublisher for PassengerEventBus {
    fn publish_add(&self, event: &mut AddPassengerEvent) {
        self.emit(event);
    }

    fn publish_remove(&self, event: &mut RemovePassengerEvent) {
        self.emit(event);
    }

    fn publish_packet(&self, event: &mut PassengerPacketEvent) {
        self.emit(event);
    }
}
