//! Transition table
//!
//! `(Trigger, LobbyPhase, TransitionHistory) -> LobbyPhase`, written as one
//! exhaustive match so that a new trigger or phase fails to compile until it
//! is placed in the table.

use lobby_core::{LobbyError, LobbyPhase, LobbyResult, Trigger};

/// Facts about past transitions that some triggers depend on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionHistory {
    /// Phase that was active when the lobby was last disabled
    pub phase_before_disable: Option<LobbyPhase>,
}

impl TransitionHistory {
    /// Record a completed transition
    pub fn record(&mut self, trigger: Trigger, from: LobbyPhase) {
        if trigger == Trigger::Disable {
            self.phase_before_disable = Some(from);
        }
    }

    /// Where `Enable` returns to
    pub fn resume_target(&self) -> LobbyPhase {
        match self.phase_before_disable {
            Some(LobbyPhase::Game) => LobbyPhase::Game,
            Some(LobbyPhase::GameLoading) => LobbyPhase::GameLoading,
            Some(LobbyPhase::Recovery) | Some(LobbyPhase::RecoveryFromStartup) => {
                LobbyPhase::Recovery
            }
            _ => LobbyPhase::Chooser,
        }
    }
}

/// Next phase for `trigger` fired in `phase`
pub fn next_phase(
    trigger: Trigger,
    phase: LobbyPhase,
    history: &TransitionHistory,
) -> LobbyResult<LobbyPhase> {
    use LobbyPhase as P;

    let next = match (trigger, phase) {
        (Trigger::InitialChooser, P::Startup) => P::Chooser,
        (Trigger::StartupRecovery, P::Startup) => P::RecoveryFromStartup,

        (Trigger::IdleTextTimer, P::Chooser) => P::ChooserIdleTextTimer,
        (Trigger::IdleTextScroll, P::ChooserIdleTextTimer) => P::ChooserScrollingIdleText,
        (Trigger::IdleTextScrollComplete, P::ChooserScrollingIdleText) => {
            P::ChooserIdleTextTimer
        }

        (Trigger::AttractTimer, p) if p.is_chooser() => P::Attract,
        (Trigger::AttractExit, P::Attract) => P::Chooser,

        (Trigger::GameSelected, p) if p.is_chooser() || p == P::Attract => P::GameLoading,

        (Trigger::GameLoaded, P::GameLoading | P::Recovery | P::RecoveryFromStartup) => P::Game,
        (Trigger::GameLoaded, P::GameLoadingForDiagnostics) => P::GameDiagnostics,

        (Trigger::GameExited, P::Game | P::GameLoading | P::Recovery | P::RecoveryFromStartup) => {
            P::Chooser
        }
        (Trigger::GameExited, P::GameDiagnostics | P::GameLoadingForDiagnostics) => P::Disabled,

        (Trigger::GameFaulted, P::Game | P::GameLoading) => P::Recovery,

        (Trigger::Disable, p) if p != P::Disabled && !p.is_diagnostics() => P::Disabled,
        (Trigger::Enable, P::Disabled) => history.resume_target(),
        (Trigger::LaunchDiagnostics, P::Disabled) => P::GameLoadingForDiagnostics,

        (Trigger::PrintHelpline, p) if p.is_chooser() || p == P::Attract => P::PrintHelpline,
        (Trigger::PrintHelplineComplete, P::PrintHelpline) => P::Chooser,

        (trigger, phase) => return Err(LobbyError::InvalidTransition { trigger, phase }),
    };

    Ok(next)
}

/// Every valid `(trigger, from, to)` with an empty history, for diagnostics output
pub fn transition_table() -> Vec<(Trigger, LobbyPhase, LobbyPhase)> {
    let history = TransitionHistory::default();
    Trigger::ALL
        .iter()
        .flat_map(|&trigger| {
            LobbyPhase::ALL.iter().filter_map(move |&phase| {
                next_phase(trigger, phase, &history)
                    .ok()
                    .map(|next| (trigger, phase, next))
            })
        })
        .collect()
}
