//! Owner sessions: the API a feature module uses to mount passengers.
//!
//! A session is bound to one owner name. Owner-scoped methods only touch
//! that owner's entries; the `*_global_*` methods act on every owner's
//! entries for a target. Every mutating method goes through the
//! [`MutationGateway`], so observers can veto it, and returns the
//! [`MutationOutcome`].

use std::sync::Arc;

use crate::error::Result;
use crate::gateway::{Mutation, MutationGateway, MutationOutcome};
use crate::registry::{EntityId, PassengerSet};

#[derive(Debug, Clone)]
pub struct OwnerSession {
    owner: Arc<str>,
    gateway: Arc<MutationGateway>,
    send_packets: bool,
}

impl OwnerSession {
    pub(crate) fn new(owner: impl Into<Arc<str>>, gateway: Arc<MutationGateway>) -> Self {
        Self {
            owner: owner.into(),
            gateway,
            send_packets: true,
        }
    }

    /// Owner name this session mutates under.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// A copy of this session whose mutations do (or do not) run the
    /// dispatch stage. Use `false` when batching, then call
    /// [`PassengerManager::refresh`](crate::manager::PassengerManager::refresh).
    pub fn with_dispatch(&self, send_packets: bool) -> Self {
        Self {
            send_packets,
            ..self.clone()
        }
    }

    fn mutation(&self, is_async: bool) -> Mutation {
        Mutation::new(is_async, self.send_packets)
    }

    // -----------------------------------------------------------------------
    // Add
    // -----------------------------------------------------------------------

    pub fn add_passenger(
        &self,
        is_async: bool,
        target: EntityId,
        passenger: EntityId,
    ) -> Result<MutationOutcome> {
        self.add_passengers(is_async, target, [passenger])
    }

    /// Accepts any collection of ids (set, slice, array, iterator).
    pub fn add_passengers(
        &self,
        is_async: bool,
        target: EntityId,
        passengers: impl IntoIterator<Item = EntityId>,
    ) -> Result<MutationOutcome> {
        self.gateway.add(
            self.mutation(is_async),
            &self.owner,
            target,
            passengers.into_iter().collect(),
        )
    }

    // -----------------------------------------------------------------------
    // Owner-scoped removal
    // -----------------------------------------------------------------------

    pub fn remove_passenger(
        &self,
        is_async: bool,
        target: EntityId,
        passenger: EntityId,
    ) -> Result<MutationOutcome> {
        self.remove_passengers(is_async, target, [passenger])
    }

    pub fn remove_passengers(
        &self,
        is_async: bool,
        target: EntityId,
        passengers: impl IntoIterator<Item = EntityId>,
    ) -> Result<MutationOutcome> {
        self.gateway.remove(
            self.mutation(is_async),
            &self.owner,
            target,
            passengers.into_iter().collect(),
        )
    }

    /// Remove `passenger` from every target this owner holds it on.
    pub fn remove_passenger_from_all(
        &self,
        is_async: bool,
        passenger: EntityId,
    ) -> Result<MutationOutcome> {
        self.remove_passengers_from_all(is_async, [passenger])
    }

    /// Remove `passengers` from every target this owner holds.
    pub fn remove_passengers_from_all(
        &self,
        is_async: bool,
        passengers: impl IntoIterator<Item = EntityId>,
    ) -> Result<MutationOutcome> {
        self.gateway.remove_from_owner_targets(
            self.mutation(is_async),
            &self.owner,
            passengers.into_iter().collect(),
        )
    }

    /// Remove everything this owner mounted on `target`.
    pub fn remove_all_passengers(&self, is_async: bool, target: EntityId) -> Result<MutationOutcome> {
        self.gateway
            .remove_all(self.mutation(is_async), &self.owner, target)
    }

    // -----------------------------------------------------------------------
    // Cross-owner removal
    // -----------------------------------------------------------------------

    /// Remove `passengers` from `target` under every owner.
    pub fn remove_global_passengers(
        &self,
        is_async: bool,
        target: EntityId,
        passengers: impl IntoIterator<Item = EntityId>,
    ) -> Result<MutationOutcome> {
        self.gateway.remove_across_owners(
            self.mutation(is_async),
            &self.owner,
            target,
            passengers.into_iter().collect(),
        )
    }

    /// Remove every passenger mounted on `target`, whoever mounted it.
    pub fn remove_all_global_passengers(
        &self,
        is_async: bool,
        target: EntityId,
    ) -> Result<MutationOutcome> {
        self.gateway
            .remove_all_across_owners(self.mutation(is_async), &self.owner, target)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// This owner's passengers on `target`.
    pub fn passengers(&self, target: EntityId) -> PassengerSet {
        self.gateway.registry().snapshot(&self.owner, target)
    }

    /// Every owner's passengers on `target`.
    pub fn global_passengers(&self, target: EntityId) -> PassengerSet {
        self.gateway.registry().global_snapshot(target)
    }

    /// Number of targets this owner currently holds entries for.
    pub fn target_count(&self) -> usize {
        self.gateway.registry().owner_target_count(&self.owner)
    }
}
