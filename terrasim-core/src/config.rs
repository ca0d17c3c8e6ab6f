use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Static balance tunables, read-only once a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Maximum number of concurrently active events.
    ///
    /// Supplied by the diplomacy balance tables; the scheduler only reads it
    /// at construction.
    pub event_slots: u32,

    /// Calendar days advanced per tick.
    pub date_multiplier: u32,

    /// Block activation of candidates whose gating conditions fail.
    ///
    /// Off by default: conditions are evaluated and logged but advisory.
    pub enforce_event_conditions: bool,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            event_slots: 3,
            date_multiplier: 1,
            enforce_event_conditions: false,
        }
    }
}

impl BalanceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.date_multiplier == 0 {
            return Err(ConfigError::InvalidDateMultiplier);
        }
        Ok(())
    }
}

/// Fatal problem with scenario data or engine wiring.
///
/// Raised at load or construction time; a session never starts with a
/// partially valid configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required collaborator: {0}")]
    MissingCollaborator(&'static str),
    #[error("Duplicate building code: {0}")]
    DuplicateBuilding(String),
    #[error("Duplicate event group: {0}")]
    DuplicateGroup(String),
    #[error("Duplicate event: {0}")]
    DuplicateEvent(String),
    #[error("Event group {0} has no candidate events")]
    EmptyGroup(String),
    #[error("Event group {group} has a non-finite trigger percentage")]
    InvalidPercentage { group: String },
    #[error("Event {event} has invalid duration range [{min}, {max}]")]
    InvalidDuration { event: String, min: u32, max: u32 },
    #[error("Event {event} references unknown building {code}")]
    UnknownBuilding { event: String, code: String },
    #[error("Event {event} has invalid effect magnitude {value}")]
    InvalidMagnitude { event: String, value: f64 },
    #[error("Date multiplier must be at least 1")]
    InvalidDateMultiplier,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
