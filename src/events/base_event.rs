//! Base event types for the passenger event system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// BaseEvent / Cancellable traits
// ---------------------------------------------------------------------------

/// Trait implemented by every event raised by the passenger registry.
///
/// Every event carries an auto-generated `event_id` (UUID v4), a UTC
/// `timestamp`, and an event `type` string.
pub trait BaseEvent: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this event instance.
    fn event_id(&self) -> &str;

    /// UTC timestamp when the event was created.
    fn timestamp(&self) -> DateTime<Utc>;

    /// Event type discriminator string (e.g. `"passenger_add"`).
    fn event_type(&self) -> &str;
}

/// An event observers may veto.
pub trait Cancellable {
    fn is_cancelled(&self) -> bool;

    fn set_cancelled(&mut self, cancelled: bool);
}

// ---------------------------------------------------------------------------
// BaseEventData
// ---------------------------------------------------------------------------

/// Common event header embedded by every concrete event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseEventData {
    /// Unique event identifier (UUID v4).
    pub event_id: String,

    /// UTC timestamp of event creation.
    pub timestamp: DateTime<Utc>,

    /// Event type discriminator.
    #[serde(rename = "type")]
    pub event_type: String,
}

impl BaseEventData {
    /// Create a new `BaseEventData` with the given event type.
    ///
    /// Generates a fresh UUID v4 and captures the current UTC time.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.into(),
        }
    }
}

impl BaseEvent for BaseEventData {
    fn event_id(&self) -> &str {
        &self.event_id
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
    fn event_type(&self) -> &str {
        &self.event_type
    }
}

// ---------------------------------------------------------------------------
// Helper macro
// ---------------------------------------------------------------------------

/// Implement [`BaseEvent`] and [`Cancellable`] for a struct that contains a
/// `base: BaseEventData` field and a `cancelled: bool` field.
///
/// Usage:
/// ```ignore
/// impl_base_event!(MyEvent);
/// ```
#[macro_export]
macro_rules! impl_base_event {
    ($ty:ty) => {
        impl $crate::events::base_event::BaseEvent for $ty {
            fn event_id(&self) -> &str {
                &self.base.event_id
            }
            fn timestamp(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.base.timestamp
            }
            fn event_type(&self) -> &str {
                &self.base.event_type
            }
        }

        impl $crate::events::base_event::Cancellable for $ty {
            fn is_cancelled(&self) -> bool {
                self.cancelled
            }
            fn set_cancelled(&mut self, cancelled: bool) {
                self.cancelled = cancelled;
            }
        }
    };
}
