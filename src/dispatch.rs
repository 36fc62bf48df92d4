//! View resolution and packet dispatch.
//!
//! After a mutation commits, the dispatch stage resolves the consolidated
//! view of each affected target (the union across every owner), lets
//! observers adjust or cancel the send through a [`PassengerPacketEvent`],
//! and hands one [`SetPassengersPacket`] per remaining recipient to the
//! host's [`PacketSender`].

use std::sync::Arc;

use crate::error::{PassengerError, Result};
use crate::events::base_event::Cancellable;
use crate::events::event_bus::EventPublisher;
use crate::events::types::passenger_events::PassengerPacketEvent;
use crate::host::{PacketSender, RecipientSource, SetPassengersPacket};
use crate::registry::{EntityId, PassengerRegistry, PassengerSet};

/// What happened to one target's consolidated view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The packet went to this many recipients.
    Sent { recipients: usize },
    /// An observer cancelled the packet event.
    Cancelled,
    /// The view was empty and empty views are not dispatched.
    Skipped,
}

pub struct DispatchStage {
    registry: Arc<PassengerRegistry>,
    publisher: Arc<dyn EventPublisher>,
    recipients: Arc<dyn RecipientSource>,
    sender: Arc<dyn PacketSender>,
    dispatch_empty_views: bool,
}

impl std::fmt::Debug for DispatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchStage")
            .field("dispatch_empty_views", &self.dispatch_empty_views)
            .finish_non_exhaustive()
    }
}

impl DispatchStage {
    pub fn new(
        registry: Arc<PassengerRegistry>,
        publisher: Arc<dyn EventPublisher>,
        recipients: Arc<dyn RecipientSource>,
        sender: Arc<dyn PacketSender>,
        dispatch_empty_views: bool,
    ) -> Self {
        Self {
            registry,
            publisher,
            recipients,
            sender,
            dispatch_empty_views,
        }
    }

    /// Union of every owner's passengers on `target`.
    pub fn resolve_view(&self, target: EntityId) -> PassengerSet {
        self.registry.global_snapshot(target)
    }

    /// Broadcast the consolidated view of `target`.
    ///
    /// The first send failure is returned as-is; recipients after it are not
    /// attempted.
    pub fn dispatch(&self, is_async: bool, target: EntityId) -> Result<DispatchOutcome> {
        let passengers = self.resolve_view(target);
        if passengers.is_empty() && !self.dispatch_empty_views {
            return Ok(DispatchOutcome::Skipped);
        }

        let packet = SetPassengersPacket::new(target, &passengers);
        let mut event =
            PassengerPacketEvent::new(is_async, target, passengers, self.recipients.recipients());
        self.publisher.publish_packet(&mut event);
        if event.is_cancelled() {
            log::debug!("[DispatchStage] Packet for entity {target} cancelled by an observer");
            return Ok(DispatchOutcome::Cancelled);
        }

        let receivers = event.into_receivers();
        for recipient in &receivers {
            self.sender
                .send_silently(recipient, &packet)
                .map_err(|source| PassengerError::Send {
                    recipient: recipient.to_string(),
                    target,
                    source,
                })?;
        }

        log::trace!(
            "[DispatchStage] Sent {} passenger(s) of entity {target} to {} recipient(s)",
            packet.passengers.len(),
            receivers.len()
        );
        Ok(DispatchOutcome::Sent {
            recipients: receivers.len(),
        })
    }

    /// Dispatch each target once, in iteration order.
    pub fn dispatch_many(
        &self,
        is_async: bool,
        targets: impl IntoIterator<Item = EntityId>,
    ) -> Result<Vec<(EntityId, DispatchOutcome)>> {
        targets
            .into_iter()
            .map(|target| Ok((target, self.dispatch(is_async, target)?)))
            .collect()
    }
}
