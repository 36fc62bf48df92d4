//! Passenger event system.
//!
//! Every registry mutation raises a cancellable intent event before it
//! commits, and every commit raises a cancellable packet event per affected
//! target before the consolidated passenger list is sent. Observers register
//! on a [`PassengerEventBus`] (or any other [`EventPublisher`]).

// ---------------------------------------------------------------------------
// Core infrastructure modules
// ---------------------------------------------------------------------------

/// Base event trait, cancellation trait and header data.
pub mod base_event;

/// Synchronous event bus and the publisher seam.
pub mod event_bus;

// ---------------------------------------------------------------------------
// Event type definitions
// ---------------------------------------------------------------------------

/// Domain-specific event type structs.
pub mod types;

// ---------------------------------------------------------------------------
// Convenience re-exports
// ---------------------------------------------------------------------------

pub use base_event::{BaseEvent, BaseEventData, Cancellable};
pub use event_bus::{EventPublisher, HandlerId, PassengerEventBus};
pub use types::passenger_events::{AddPassengerEvent, PassengerPacketEvent, RemovePassengerEvent};
