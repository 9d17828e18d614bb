//! Triggers: requests to move the lobby phase

use serde::{Deserialize, Serialize};

use crate::state::CashInKind;

/// Phase transition request
///
/// Which phases accept which trigger is defined by the transition table in
/// `lobby-state`; a trigger sent in any other phase is rejected and logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Boot finished with nothing to recover
    InitialChooser,
    /// Boot found a game that was mid-play
    StartupRecovery,
    /// Chooser idle long enough to start the idle text cycle
    IdleTextTimer,
    /// Start scrolling the idle text
    IdleTextScroll,
    /// Idle text finished scrolling
    IdleTextScrollComplete,
    /// Attract timer elapsed
    AttractTimer,
    /// Player touched the screen during attract
    AttractExit,
    /// Player picked a game
    GameSelected,
    /// Game runtime reported ready
    GameLoaded,
    /// Game runtime exited normally
    GameExited,
    /// Game runtime crashed or stopped responding
    GameFaulted,
    /// A lockup condition became active
    Disable,
    /// All lockup conditions cleared
    Enable,
    /// Operator requested a game replay
    LaunchDiagnostics,
    /// Player requested the helpline ticket
    PrintHelpline,
    /// Helpline ticket printed (or failed)
    PrintHelplineComplete,
}

impl Trigger {
    /// All triggers in declaration order
    pub const ALL: [Trigger; 16] = [
        Trigger::InitialChooser,
        Trigger::StartupRecovery,
        Trigger::IdleTextTimer,
        Trigger::IdleTextScroll,
        Trigger::IdleTextScrollComplete,
        Trigger::AttractTimer,
        Trigger::AttractExit,
        Trigger::GameSelected,
        Trigger::GameLoaded,
        Trigger::GameExited,
        Trigger::GameFaulted,
        Trigger::Disable,
        Trigger::Enable,
        Trigger::LaunchDiagnostics,
        Trigger::PrintHelpline,
        Trigger::PrintHelplineComplete,
    ];
}

/// Optional data attached to a trigger or flag change
///
/// Passed through unchanged to entry/exit callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TriggerPayload {
    /// Game selected or being recovered
    GameId(u32),
    /// Source of an incoming cash-in
    CashIn(CashInKind),
    /// Whether a payout succeeded
    CashOutSuccess(bool),
    /// Whether a disable must take effect immediately
    Immediate(bool),
    /// Free-form annotation
    Text(String),
}

impl TriggerPayload {
    /// Cash-in kind, if this payload carries one
    pub fn cash_in_kind(&self) -> Option<CashInKind> {
        match self {
            TriggerPayload::CashIn(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Payout result, if this payload carries one
    pub fn cash_out_success(&self) -> Option<bool> {
        match self {
            TriggerPayload::CashOutSuccess(success) => Some(*success),
            _ => None,
        }
    }
}
