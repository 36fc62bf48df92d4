//! Mutation gateway: every registry change goes through here.
//!
//! Each operation publishes an intent event first. If an observer cancels
//! it, the call returns [`MutationOutcome::Cancelled`] with the registry
//! untouched and nothing dispatched. Otherwise the registry operation runs
//! exactly once and, unless dispatch is suppressed, each affected target is
//! re-broadcast once through the [`DispatchStage`].

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::dispatch::DispatchStage;
use crate::error::Result;
use crate::events::base_event::Cancellable;
use crate::events::event_bus::EventPublisher;
use crate::events::types::passenger_events::{AddPassengerEvent, RemovePassengerEvent};
use crate::registry::{EntityId, PassengerRegistry, PassengerSet};

/// Result of a gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The intent passed and the registry operation ran.
    Applied,
    /// An observer cancelled the intent event.
    Cancelled,
    /// Nothing to do (empty passenger input or nothing registered).
    Skipped,
}

impl MutationOutcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// Per-call switches shared by every gateway operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    /// Advisory hint: the caller is off the primary execution context.
    pub is_async: bool,
    /// Run the dispatch stage after committing.
    pub send_packets: bool,
}

impl Mutation {
    pub fn new(is_async: bool, send_packets: bool) -> Self {
        Self {
            is_async,
            send_packets,
        }
    }
}

pub struct MutationGateway {
    registry: Arc<PassengerRegistry>,
    publisher: Arc<dyn EventPublisher>,
    dispatch: DispatchStage,
}

impl std::fmt::Debug for MutationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationGateway")
            .field("registry", &self.registry)
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}

impl MutationGateway {
    pub fn new(
        registry: Arc<PassengerRegistry>,
        publisher: Arc<dyn EventPublisher>,
        dispatch: DispatchStage,
    ) -> Self {
        Self {
            registry,
            publisher,
            dispatch,
        }
    }

    pub fn registry(&self) -> &PassengerRegistry {
        &self.registry
    }

    pub fn dispatch_stage(&self) -> &DispatchStage {
        &self.dispatch
    }

    // -----------------------------------------------------------------------
    // Owner-scoped operations
    // -----------------------------------------------------------------------

    /// Add `passengers` to `(owner, target)`.
    pub fn add(
        &self,
        mutation: Mutation,
        owner: &str,
        target: EntityId,
        passengers: PassengerSet,
    ) -> Result<MutationOutcome> {
        if passengers.is_empty() {
            return Ok(MutationOutcome::Skipped);
        }
        let mut event = AddPassengerEvent::new(mutation.is_async, target, passengers, owner);
        self.publisher.publish_add(&mut event);
        if event.is_cancelled() {
            log::debug!("[MutationGateway] Add on entity {target} by {owner} cancelled");
            return Ok(MutationOutcome::Cancelled);
        }

        self.registry.add(owner, target, event.passenger_ids());
        log::debug!(
            "[MutationGateway] {owner} added {} passenger(s) to entity {target}",
            event.passenger_ids().len()
        );
        self.finish(mutation, [target])
    }

    /// Remove `passengers` from `(owner, target)`.
    pub fn remove(
        &self,
        mutation: Mutation,
        owner: &str,
        target: EntityId,
        passengers: PassengerSet,
    ) -> Result<MutationOutcome> {
        if passengers.is_empty() {
            return Ok(MutationOutcome::Skipped);
        }
        let Some(event) = self.intend_remove(mutation, owner, Some(target), passengers) else {
            return Ok(MutationOutcome::Cancelled);
        };

        self.registry.remove(owner, target, event.passenger_ids());
        log::debug!("[MutationGateway] {owner} removed passengers from entity {target}");
        self.finish(mutation, [target])
    }

    /// Drop every passenger `owner` holds on `target`.
    ///
    /// The intent event names the passengers registered there when it is
    /// raised, and only those are removed. Anything added while observers
    /// run stays.
    pub fn remove_all(
        &self,
        mutation: Mutation,
        owner: &str,
        target: EntityId,
    ) -> Result<MutationOutcome> {
        let current = self.registry.snapshot(owner, target);
        if current.is_empty() {
            return Ok(MutationOutcome::Skipped);
        }
        let Some(event) = self.intend_remove(mutation, owner, Some(target), current) else {
            return Ok(MutationOutcome::Cancelled);
        };

        self.registry.remove(owner, target, event.passenger_ids());
        log::debug!("[MutationGateway] {owner} cleared entity {target}");
        self.finish(mutation, [target])
    }

    /// Remove `passengers` from every target `owner` holds.
    pub fn remove_from_owner_targets(
        &self,
        mutation: Mutation,
        owner: &str,
        passengers: PassengerSet,
    ) -> Result<MutationOutcome> {
        if passengers.is_empty() {
            return Ok(MutationOutcome::Skipped);
        }
        let Some(event) = self.intend_remove(mutation, owner, None, passengers) else {
            return Ok(MutationOutcome::Cancelled);
        };

        let touched = self
            .registry
            .remove_from_owner_targets(owner, event.passenger_ids());
        log::debug!(
            "[MutationGateway] {owner} removed passengers from {} target(s)",
            touched.len()
        );
        self.finish(mutation, touched)
    }

    // -----------------------------------------------------------------------
    // Cross-owner operations
    // -----------------------------------------------------------------------

    /// Remove `passengers` from `target` under every owner.
    ///
    /// `initiator` is recorded on the intent event.
    pub fn remove_across_owners(
        &self,
        mutation: Mutation,
        initiator: &str,
        target: EntityId,
        passengers: PassengerSet,
    ) -> Result<MutationOutcome> {
        if passengers.is_empty() {
            return Ok(MutationOutcome::Skipped);
        }
        let Some(event) = self.intend_remove(mutation, initiator, Some(target), passengers) else {
            return Ok(MutationOutcome::Cancelled);
        };

        self.registry
            .remove_across_owners(target, event.passenger_ids());
        log::debug!("[MutationGateway] {initiator} removed passengers from entity {target} for all owners");
        self.finish(mutation, [target])
    }

    /// Drop `target` under every owner.
    ///
    /// Like [`remove_all`](Self::remove_all), commits only the passengers the
    /// intent event named.
    pub fn remove_all_across_owners(
        &self,
        mutation: Mutation,
        initiator: &str,
        target: EntityId,
    ) -> Result<MutationOutcome> {
        let current = self.registry.global_snapshot(target);
        if current.is_empty() {
            return Ok(MutationOutcome::Skipped);
        }
        let Some(event) = self.intend_remove(mutation, initiator, Some(target), current) else {
            return Ok(MutationOutcome::Cancelled);
        };

        self.registry
            .remove_across_owners(target, event.passenger_ids());
        log::debug!("[MutationGateway] {initiator} cleared entity {target} for all owners");
        self.finish(mutation, [target])
    }

    /// Remove `passengers` from every target of every owner.
    pub fn remove_everywhere(
        &self,
        mutation: Mutation,
        initiator: &str,
        passengers: PassengerSet,
    ) -> Result<MutationOutcome> {
        if passengers.is_empty() {
            return Ok(MutationOutcome::Skipped);
        }
        let Some(event) = self.intend_remove(mutation, initiator, None, passengers) else {
            return Ok(MutationOutcome::Cancelled);
        };

        let touched: BTreeSet<EntityId> = self.registry.remove_everywhere(event.passenger_ids());
        log::debug!(
            "[MutationGateway] {initiator} removed passengers from {} target(s) across all owners",
            touched.len()
        );
        self.finish(mutation, touched)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Publish a remove intent; `None` if an observer cancelled it.
    fn intend_remove(
        &self,
        mutation: Mutation,
        owner: &str,
        target: Option<EntityId>,
        passengers: PassengerSet,
    ) -> Option<RemovePassengerEvent> {
        let mut event = RemovePassengerEvent::new(mutation.is_async, target, passengers, owner);
        self.publisher.publish_remove(&mut event);
        if event.is_cancelled() {
            log::debug!("[MutationGateway] Remove by {owner} on {target:?} cancelled");
            return None;
        }
        Some(event)
    }

    fn finish(
        &self,
        mutation: Mutation,
        targets: impl IntoIterator<Item = EntityId>,
    ) -> Result<MutationOutcome> {
        if mutation.send_packets {
            self.dispatch.dispatch_many(mutation.is_async, targets)?;
        }
        Ok(MutationOutcome::Applied)
    }
}
