//! Host-environment collaborators: recipient enumeration and silent packet
//! sending.
//!
//! Packet encoding and transport belong to the host; this crate only hands
//! it a [`SetPassengersPacket`] per recipient.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::{EntityId, PassengerSet};

/// Error type returned by a [`PacketSender`].
pub type SendError = Box<dyn std::error::Error + Send + Sync>;

/// An observer that can receive passenger packets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient {
    pub id: Uuid,
    pub name: String,
}

impl Recipient {
    /// Create a recipient with a fresh random id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    pub fn with_id(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Full passenger-list assertion for one target entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPassengersPacket {
    pub target_entity: EntityId,
    /// Passenger ids in ascending order.
    pub passengers: Vec<EntityId>,
}

impl SetPassengersPacket {
    pub fn new(target_entity: EntityId, passengers: &PassengerSet) -> Self {
        let mut passengers: Vec<EntityId> = passengers.iter().copied().collect();
        passengers.sort_unstable();
        Self {
            target_entity,
            passengers,
        }
    }
}

/// Supplies the default recipients of every dispatched packet.
pub trait RecipientSource: Send + Sync {
    fn recipients(&self) -> Vec<Recipient>;
}

impl<F> RecipientSource for F
where
    F: Fn() -> Vec<Recipient> + Send + Sync,
{
    fn recipients(&self) -> Vec<Recipient> {
        self()
    }
}

/// Sends a packet to one recipient without re-triggering the host's general
/// packet hooks.
pub trait PacketSender: Send + Sync {
    fn send_silently(
        &self,
        recipient: &Recipient,
        packet: &SetPassengersPacket,
    ) -> Result<(), SendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_passengers_are_sorted() {
        let packet = SetPassengersPacket::new(4, &PassengerSet::from([9, 2, 5]));
        assert_eq!(packet.passengers, vec![2, 5, 9]);
        assert_eq!(packet.target_entity, 4);
    }

    #[test]
    fn closures_act_as_recipient_sources() {
        let alice = Recipient::new("alice");
        let expected = alice.clone();
        let source = move || vec![alice.clone()];
        assert_eq!(source.recipients(), vec![expected]);
    }
}
