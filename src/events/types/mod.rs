//! Domain-specific event type definitions.
//!
//! Each sub-module defines the event structs for one concern.

/// Add/remove intent events and the outbound packet event.
pub mod passenger_events;
