//! Cancellable events raised around registry mutations and packet dispatch.
//!
//! [`AddPassengerEvent`] and [`RemovePassengerEvent`] are intent events:
//! they fire before the registry is touched and a cancelled intent leaves
//! the registry unchanged. [`PassengerPacketEvent`] fires after a commit,
//! once per affected target, and lets observers rewrite the recipient list.

use serde::{Deserialize, Serialize};

use crate::events::base_event::BaseEventData;
use crate::host::Recipient;
use crate::impl_base_event;
use crate::registry::{EntityId, PassengerSet};

// ---------------------------------------------------------------------------
// AddPassengerEvent
// ---------------------------------------------------------------------------

/// Raised before passengers are added to a target.
///
/// Only the cancelled flag is mutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPassengerEvent {
    #[serde(flatten)]
    base: BaseEventData,
    is_async: bool,
    target_entity: EntityId,
    passenger_ids: PassengerSet,
    owner: String,
    cancelled: bool,
}

impl AddPassengerEvent {
    pub fn new(
        is_async: bool,
        target_entity: EntityId,
        passenger_ids: PassengerSet,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            base: BaseEventData::new("passenger_add"),
            is_async,
            target_entity,
            passenger_ids,
            owner: owner.into(),
            cancelled: false,
        }
    }

    /// Whether the caller is running off the primary execution context.
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    pub fn target_entity(&self) -> EntityId {
        self.target_entity
    }

    pub fn passenger_ids(&self) -> &PassengerSet {
        &self.passenger_ids
    }

    /// Owner initiating the change.
    pub fn owner(&self) -> &str {
        &self.owner
    }
}

impl_base_event!(AddPassengerEvent);

// ---------------------------------------------------------------------------
// RemovePassengerEvent
// ---------------------------------------------------------------------------

/// Raised before passengers are removed.
///
/// `target_entity` is `None` for removals that span every target of an
/// owner (or of every owner).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovePassengerEvent {
    #[serde(flatten)]
    base: BaseEventData,
    is_async: bool,
    target_entity: Option<EntityId>,
    passenger_ids: PassengerSet,
    owner: String,
    cancelled: bool,
}

impl RemovePassengerEvent {
    pub fn new(
        is_async: bool,
        target_entity: Option<EntityId>,
        passenger_ids: PassengerSet,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            base: BaseEventData::new("passenger_remove"),
            is_async,
            target_entity,
            passenger_ids,
            owner: owner.into(),
            cancelled: false,
        }
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    pub fn target_entity(&self) -> Option<EntityId> {
        self.target_entity
    }

    pub fn passenger_ids(&self) -> &PassengerSet {
        &self.passenger_ids
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }
}

impl_base_event!(RemovePassengerEvent);

// ---------------------------------------------------------------------------
// PassengerPacketEvent
// ---------------------------------------------------------------------------

/// Raised before the consolidated passenger list of a target is sent.
///
/// Observers may filter, extend or replace the recipient list, or cancel
/// the send outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerPacketEvent {
    #[serde(flatten)]
    base: BaseEventData,
    is_async: bool,
    target_entity: EntityId,
    passengers: PassengerSet,
    receivers: Vec<Recipient>,
    cancelled: bool,
}

impl PassengerPacketEvent {
    pub fn new(
        is_async: bool,
        target_entity: EntityId,
        passengers: PassengerSet,
        receivers: Vec<Recipient>,
    ) -> Self {
        Self {
            base: BaseEventData::new("passenger_packet"),
            is_async,
            target_entity,
            passengers,
            receivers,
            cancelled: false,
        }
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    pub fn target_entity(&self) -> EntityId {
        self.target_entity
    }

    /// Union of every owner's passengers on the target.
    pub fn passengers(&self) -> &PassengerSet {
        &self.passengers
    }

    pub fn receivers(&self) -> &[Recipient] {
        &self.receivers
    }

    pub fn receivers_mut(&mut self) -> &mut Vec<Recipient> {
        &mut self.receivers
    }

    pub fn set_receivers(&mut self, receivers: Vec<Recipient>) {
        self.receivers = receivers;
    }

    /// Consume the event, yielding the final recipient list.
    pub fn into_receivers(self) -> Vec<Recipient> {
        self.receivers
    }
}

impl_base_event!(PassengerPacketEvent);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::base_event::{BaseEvent, Cancellable};

    #[test]
    fn events_start_uncancelled() {
        let mut event = AddPassengerEvent::new(false, 1, PassengerSet::from([2]), "owner");
        assert!(!event.is_cancelled());
        event.set_cancelled(true);
        assert!(event.is_cancelled());
        assert_eq!(event.event_type(), "passenger_add");
    }

    #[test]
    fn remove_event_serialises_flattened_header() {
        let event = RemovePassengerEvent::new(true, None, PassengerSet::from([4]), "owner");
        let json = serde_json::to_value(&event).expect("serialise");
        assert_eq!(json["type"], "passenger_remove");
        assert_eq!(json["is_async"], true);
        assert!(json["target_entity"].is_null());
        assert_eq!(json["owner"], "owner");
    }

    #[test]
    fn packet_event_receivers_are_mutable() {
        let alice = Recipient::new("alice");
        let bob = Recipient::new("bob");
        let mut event =
            PassengerPacketEvent::new(false, 3, PassengerSet::new(), vec![alice.clone(), bob]);
        event.receivers_mut().retain(|r| r.name == "alice");
        assert_eq!(event.receivers(), [alice.clone()].as_slice());

        let carol = Recipient::new("carol");
        event.set_receivers(vec![carol.clone()]);
        assert_eq!(event.into_receivers(), vec![carol]);
    }
}
