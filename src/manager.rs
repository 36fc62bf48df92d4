//! The passenger manager: owns the shared registry and hands out owner
//! sessions.
//!
//! ```ignore
//! let manager = PassengerManager::builder()
//!     .recipients(|| host.online_viewers())
//!     .sender(host_sender)
//!     .build()?;
//!
//! let mounts = manager.session("Mounts");
//! mounts.add_passenger(false, horse_id, rider_id)?;
//! ```

use std::sync::Arc;

use crate::config::PassengerConfig;
use crate::dispatch::{DispatchOutcome, DispatchStage};
use crate::error::{PassengerError, Result};
use crate::events::event_bus::{EventPublisher, PassengerEventBus};
use crate::gateway::{Mutation, MutationGateway, MutationOutcome};
use crate::host::{PacketSender, RecipientSource};
use crate::registry::{EntityId, PassengerRegistry};
use crate::session::OwnerSession;

#[derive(Debug)]
pub struct PassengerManager {
    config: PassengerConfig,
    registry: Arc<PassengerRegistry>,
    gateway: Arc<MutationGateway>,
}

impl PassengerManager {
    pub fn builder() -> PassengerManagerBuilder {
        PassengerManagerBuilder::default()
    }

    /// A session that mutates under `owner`.
    ///
    /// Sessions are cheap; creating two for the same name gives two handles
    /// onto the same entries.
    pub fn session(&self, owner: impl Into<Arc<str>>) -> OwnerSession {
        OwnerSession::new(owner, Arc::clone(&self.gateway))
    }

    pub fn config(&self) -> &PassengerConfig {
        &self.config
    }

    pub fn registry(&self) -> &PassengerRegistry {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Internal operations (attributed to the configured internal owner)
    // -----------------------------------------------------------------------

    /// Add `passengers` to `target` under the internal owner.
    pub fn add_passengers(
        &self,
        is_async: bool,
        target: EntityId,
        passengers: impl IntoIterator<Item = EntityId>,
        send_packets: bool,
    ) -> Result<MutationOutcome> {
        self.gateway.add(
            Mutation::new(is_async, send_packets),
            &self.config.internal_owner,
            target,
            passengers.into_iter().collect(),
        )
    }

    /// Remove `passenger` from `target` under every owner.
    pub fn remove_passenger(
        &self,
        is_async: bool,
        target: EntityId,
        passenger: EntityId,
        send_packets: bool,
    ) -> Result<MutationOutcome> {
        self.gateway.remove_across_owners(
            Mutation::new(is_async, send_packets),
            &self.config.internal_owner,
            target,
            [passenger].into(),
        )
    }

    /// Remove `passengers` from every target of every owner.
    pub fn remove_passengers(
        &self,
        is_async: bool,
        passengers: impl IntoIterator<Item = EntityId>,
        send_packets: bool,
    ) -> Result<MutationOutcome> {
        self.gateway.remove_everywhere(
            Mutation::new(is_async, send_packets),
            &self.config.internal_owner,
            passengers.into_iter().collect(),
        )
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Re-broadcast the consolidated view of `target`.
    pub fn refresh(&self, is_async: bool, target: EntityId) -> Result<DispatchOutcome> {
        self.gateway.dispatch_stage().dispatch(is_async, target)
    }

    /// Re-broadcast every target that currently has passengers.
    pub fn refresh_all(&self, is_async: bool) -> Result<Vec<(EntityId, DispatchOutcome)>> {
        let targets = self.registry.all_targets();
        log::debug!("[PassengerManager] Refreshing {} target(s)", targets.len());
        self.gateway
            .dispatch_stage()
            .dispatch_many(is_async, targets)
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    pub fn total_passenger_count(&self) -> usize {
        self.registry.total_passenger_count()
    }

    pub fn total_target_count(&self) -> usize {
        self.registry.total_target_count()
    }
}

/// Builder for [`PassengerManager`].
///
/// `recipients` and `sender` are required. Without a publisher a fresh
/// [`PassengerEventBus`] with no handlers is used.
#[derive(Default)]
pub struct PassengerManagerBuilder {
    config: Option<PassengerConfig>,
    publisher: Option<Arc<dyn EventPublisher>>,
    recipients: Option<Arc<dyn RecipientSource>>,
    sender: Option<Arc<dyn PacketSender>>,
}

impl PassengerManagerBuilder {
    pub fn config(mut self, config: PassengerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn recipients(mut self, recipients: impl RecipientSource + 'static) -> Self {
        self.recipients = Some(Arc::new(recipients));
        self
    }

    pub fn sender(mut self, sender: impl PacketSender + 'static) -> Self {
        self.sender = Some(Arc::new(sender));
        self
    }

    pub fn build(self) -> Result<PassengerManager> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let recipients = self
            .recipients
            .ok_or(PassengerError::MissingCollaborator("recipients"))?;
        let sender = self
            .sender
            .ok_or(PassengerError::MissingCollaborator("sender"))?;
        let publisher = self
            .publisher
            .unwrap_or_else(|| Arc::new(PassengerEventBus::new()));

        let registry = Arc::new(PassengerRegistry::new());
        let dispatch = DispatchStage::new(
            Arc::clone(&registry),
            Arc::clone(&publisher),
            recipients,
            sender,
            config.dispatch_empty_views,
        );
        let gateway = Arc::new(MutationGateway::new(
            Arc::clone(&registry),
            publisher,
            dispatch,
        ));

        log::debug!(
            "[PassengerManager] Ready (internal owner {:?})",
            config.internal_owner
        );
        Ok(PassengerManager {
            config,
            registry,
            gateway,
        })
    }
}
