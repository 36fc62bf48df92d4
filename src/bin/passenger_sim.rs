//! Passenger registry simulation binary.
//!
//! Wires a [`PassengerManager`] to a logging packet sender and a fixed set
//! of viewers, runs a few owner sessions against it and prints the final
//! registry as JSON.
//!
//! # Environment Variables
//!
//! - `PASSENGER_CONFIG`: optional YAML config file
//! - `PASSENGER_INTERNAL_OWNER`: owner name for internal operations
//! - `PASSENGER_DISPATCH_EMPTY`: dispatch empty views (default: true)
//! - `RUST_LOG`: tracing filter (default: "info,passenger_registry=debug")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin passenger_sim
//! ```

use std::sync::Arc;

use anyhow::Context;
use passenger_registry::{
    AddPassengerEvent, Cancellable, PacketSender, PassengerConfig, PassengerEventBus,
    PassengerManager, PassengerPacketEvent, Recipient, RemovePassengerEvent, SendError,
    SetPassengersPacket,
};

/// Logs every packet instead of writing it to a connection.
struct TracingSender;

impl PacketSender for TracingSender {
    fn send_silently(
        &self,
        recipient: &Recipient,
        packet: &SetPassengersPacket,
    ) -> Result<(), SendError> {
        tracing::info!(
            "-> {}: entity {} passengers {:?}",
            recipient.name,
            packet.target_entity,
            packet.passengers
        );
        Ok(())
    }
}

fn load_config() -> anyhow::Result<PassengerConfig> {
    let config = match std::env::var("PASSENGER_CONFIG") {
        Ok(path) => PassengerConfig::from_file(&path)
            .with_context(|| format!("loading config from {path}"))?,
        Err(_) => PassengerConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,passenger_registry=debug".into()),
        )
        .init();

    let config = load_config()?;

    let bus = Arc::new(PassengerEventBus::new());
    bus.on::<AddPassengerEvent>(
        "audit-add",
        |e| {
            tracing::info!(
                "{} mounts {:?} on entity {}",
                e.owner(),
                e.passenger_ids(),
                e.target_entity()
            )
        },
    );
    // Entity 0 is reserved; nobody may dismount from it.
    bus.on::<RemovePassengerEvent>(
        "lock-entity-zero",
        |e| {
            if e.target_entity() == Some(0) {
                tracing::warn!("{} tried to dismount from entity 0", e.owner());
                e.set_cancelled(true);
            }
        },
    );
    // Spectators never see passenger updates.
    bus.on::<PassengerPacketEvent>(
        "hide-from-spectators",
        |e| e.receivers_mut().retain(|r| !r.name.starts_with("spectator")),
    );

    let viewers = vec![
        Recipient::new("steve"),
        Recipient::new("alex"),
        Recipient::new("spectator-1"),
    ];
    let manager = PassengerManager::builder()
        .config(config)
        .publisher(bus)
        .recipients(move || viewers.clone())
        .sender(TracingSender)
        .build()?;

    tracing::info!("passenger_sim {} starting", passenger_registry::VERSION);

    let mounts = manager.session("Mounts");
    let stacker = manager.session("Stacker");

    mounts.add_passengers(false, 100, [1, 2])?;
    stacker.add_passengers(false, 100, [2, 3])?;
    stacker.remove_global_passengers(false, 100, [2])?;

    mounts.add_passenger(false, 7, 5)?;
    mounts.remove_all_passengers(false, 7)?;

    stacker.add_passenger(false, 0, 9)?;
    let outcome = stacker.remove_passenger(false, 0, 9)?;
    tracing::info!("dismount from entity 0: {outcome:?}");

    let batch = mounts.with_dispatch(false);
    for target in 200..203 {
        batch.add_passenger(true, target, target + 1000)?;
    }
    manager.refresh_all(false)?;

    manager.add_passengers(false, 300, [42], true)?;
    manager.remove_passengers(false, [42], true)?;

    tracing::info!(
        "{} passenger(s) across {} owner/target entries",
        manager.total_passenger_count(),
        manager.total_target_count()
    );
    println!("{}", serde_json::to_string_pretty(&manager.registry().dump())?);
    Ok(())
}
