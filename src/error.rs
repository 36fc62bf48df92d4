//! Error types for the passenger registry.

use std::path::PathBuf;

use thiserror::Error;

use crate::host::SendError;
use crate::registry::EntityId;

/// Errors surfaced by the registry's collaborators and setup.
///
/// Vetoes and absent entries are not errors; see
/// [`MutationOutcome`](crate::gateway::MutationOutcome).
#[derive(Debug, Error)]
pub enum PassengerError {
    /// The host's packet sender failed for one recipient.
    #[error("Failed to send passengers of entity {target} to {recipient}: {source}")]
    Send {
        recipient: String,
        target: EntityId,
        #[source]
        source: SendError,
    },

    /// A required collaborator was not supplied to the builder.
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors from loading a [`PassengerConfig`](crate::config::PassengerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid YAML for the expected shape.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A field holds a value the registry cannot work with.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T, E = PassengerError> = std::result::Result<T, E>;
