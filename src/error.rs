//! Error types for Draftr
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Draftr
#[derive(Debug, Error)]
pub enum DraftError {
    /// Configured participant could not be resolved in scope
    #[error("Participant not found: {0}")]
    ParticipantNotFound(String),

    /// Deadline/window computation rejected the inputs
    #[error("Schedule error: {0}")]
    Schedule(String),

    /// Invalid configuration value
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A draft is already running for this event
    #[error("Draft already running for event: {0}")]
    DuplicateSession(String),

    /// No draft running for this event
    #[error("No draft running for event: {0}")]
    SessionNotFound(String),

    /// Pick slot was already filled
    #[error("Pick already recorded for round {round}, seat {seat}")]
    SlotTaken { round: usize, seat: usize },

    /// Pick persistence error
    #[error("Store error: {0}")]
    Store(String),

    /// Notification surface error
    #[error("Notify error: {0}")]
    Notify(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Draftr operations
pub type Result<T> = std::result::Result<T, DraftError>;
