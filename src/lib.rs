//! # Passenger Registry
//!
//! Multi-owner registry of passenger/mount relationships between entities.
//!
//! Several independent feature modules ("owners") may each attach
//! passengers to the same target entity. The registry keeps every owner's
//! contribution separate, and clients are always sent the union of all
//! owners' passengers for a target. Every mutation passes through a
//! cancellable intent event, and every outgoing packet through a
//! cancellable packet event whose recipient list observers may edit.
//!
//! Start from [`PassengerManager::builder`] and hand each feature module its
//! own [`OwnerSession`].

pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod gateway;
pub mod host;
pub mod manager;
pub mod registry;
pub mod session;

pub use config::PassengerConfig;
pub use dispatch::{DispatchOutcome, DispatchStage};
pub use error::{ConfigError, PassengerError, Result};
pub use events::{
    AddPassengerEvent, Cancellable, EventPublisher, PassengerEventBus, PassengerPacketEvent,
    RemovePassengerEvent,
};
pub use gateway::{Mutation, MutationGateway, MutationOutcome};
pub use host::{PacketSender, Recipient, RecipientSource, SendError, SetPassengersPacket};
pub use manager::{PassengerManager, PassengerManagerBuilder};
pub use registry::{EntityId, PassengerRegistry, PassengerSet, RegistryDump};
pub use session::OwnerSession;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
