//! Error types for the cabinet lobby

use thiserror::Error;

use crate::state::LobbyPhase;
use crate::trigger::Trigger;

/// Core error type
#[derive(Error, Debug)]
pub enum LobbyError {
    #[error("Trigger {trigger:?} is not valid in phase {phase:?}")]
    InvalidTransition { trigger: Trigger, phase: LobbyPhase },

    #[error("Re-entrant dispatch exceeded depth {depth}")]
    DispatchOverflow { depth: usize },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for LobbyError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type alias
pub type LobbyResult<T> = Result<T, LobbyError>;
