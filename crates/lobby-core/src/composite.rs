//! Composite lobby state
//!
//! Plain data plus the primitive mutations the tracker builds on. Nothing here
//! fires callbacks; see `lobby-state` for the observable tracker.

use serde::{Deserialize, Serialize};

use crate::state::{LayeredDialog, LobbyPhase, LobbyState, OverlayFlag, OverlayFlagKind};

/// Phase + active overlay flags + layered dialog stack
///
/// Invariants:
/// - exactly one phase is active
/// - at most one flag per [`OverlayFlagKind`], kept in insertion order
/// - a dialog appears at most once in the stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeState {
    phase: LobbyPhase,
    #[serde(default)]
    flags: Vec<OverlayFlag>,
    #[serde(default)]
    dialogs: Vec<LayeredDialog>,
}

impl Default for CompositeState {
    fn default() -> Self {
        Self::new(LobbyPhase::Startup)
    }
}

impl CompositeState {
    /// Create with the given phase, no flags and an empty dialog stack
    pub fn new(phase: LobbyPhase) -> Self {
        Self {
            phase,
            flags: Vec::new(),
            dialogs: Vec::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// The active phase
    pub fn base_state(&self) -> LobbyPhase {
        self.phase
    }

    /// Effective-current value: dialog stack top, else newest flag, else phase
    pub fn current_state(&self) -> LobbyState {
        if let Some(dialog) = self.dialogs.last() {
            return LobbyState::Dialog(*dialog);
        }
        if let Some(flag) = self.flags.last() {
            return LobbyState::Flag(flag.kind());
        }
        LobbyState::Phase(self.phase)
    }

    /// True iff `state` is the effective-current value
    pub fn is_in_state(&self, state: impl Into<LobbyState>) -> bool {
        self.current_state() == state.into()
    }

    /// True if `state` is the phase, an active flag, or anywhere in the stack
    pub fn contains(&self, state: impl Into<LobbyState>) -> bool {
        match state.into() {
            LobbyState::Phase(phase) => self.phase == phase,
            LobbyState::Flag(kind) => self.has_flag(kind),
            LobbyState::Dialog(dialog) => self.dialogs.contains(&dialog),
        }
    }

    /// True if any of `states` is present in any layer, ignoring precedence
    pub fn contains_any_state(&self, states: &[LobbyState]) -> bool {
        states.iter().any(|s| self.contains(*s))
    }

    /// Active flags, oldest first
    pub fn flags(&self) -> &[OverlayFlag] {
        &self.flags
    }

    /// Active flag of the given kind
    pub fn flag(&self, kind: OverlayFlagKind) -> Option<&OverlayFlag> {
        self.flags.iter().find(|f| f.kind() == kind)
    }

    pub fn has_flag(&self, kind: OverlayFlagKind) -> bool {
        self.flag(kind).is_some()
    }

    /// Layered dialogs, bottom first
    pub fn dialogs(&self) -> &[LayeredDialog] {
        &self.dialogs
    }

    pub fn top_dialog(&self) -> Option<LayeredDialog> {
        self.dialogs.last().copied()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MUTATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Replace the phase. Flags and dialogs are untouched.
    ///
    /// Returns the previous phase.
    pub fn set_phase(&mut self, phase: LobbyPhase) -> LobbyPhase {
        std::mem::replace(&mut self.phase, phase)
    }

    /// Add a flag; no-op (returns false) if a flag of the same kind is active
    pub fn add_flag(&mut self, flag: OverlayFlag) -> bool {
        if self.has_flag(flag.kind()) {
            return false;
        }
        self.flags.push(flag);
        true
    }

    /// Remove the flag of the given kind, returning it if it was active
    pub fn remove_flag(&mut self, kind: OverlayFlagKind) -> Option<OverlayFlag> {
        let index = self.flags.iter().position(|f| f.kind() == kind)?;
        Some(self.flags.remove(index))
    }

    /// Push a dialog; no-op (returns false) if it is already in the stack
    pub fn push_dialog(&mut self, dialog: LayeredDialog) -> bool {
        if self.dialogs.contains(&dialog) {
            return false;
        }
        self.dialogs.push(dialog);
        true
    }

    /// Remove a dialog from anywhere in the stack
    pub fn remove_dialog(&mut self, dialog: LayeredDialog) -> bool {
        match self.dialogs.iter().position(|d| *d == dialog) {
            Some(index) => {
                self.dialogs.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CashInKind;

    #[test]
    fn test_effective_current_precedence() {
        let mut state = CompositeState::new(LobbyPhase::Game);
        assert!(state.is_in_state(LobbyPhase::Game));

        state.add_flag(OverlayFlag::CashIn {
            kind: CashInKind::Voucher,
        });
        assert!(state.is_in_state(OverlayFlagKind::CashIn));

        state.add_flag(OverlayFlag::CashOut { success: None });
        assert!(state.is_in_state(OverlayFlagKind::CashOut));

        state.push_dialog(LayeredDialog::ResponsibleGamingInfo);
        assert!(state.is_in_state(LayeredDialog::ResponsibleGamingInfo));
        assert!(!state.is_in_state(LobbyPhase::Game));

        state.set_phase(LobbyPhase::Disabled);
        assert!(state.is_in_state(LayeredDialog::ResponsibleGamingInfo));
    }

    #[test]
    fn test_add_flag_idempotent() {
        let mut state = CompositeState::new(LobbyPhase::Chooser);
        assert!(state.add_flag(OverlayFlag::CashOut { success: None }));
        let snapshot = state.clone();
        assert!(!state.add_flag(OverlayFlag::CashOut {
            success: Some(true)
        }));
        assert_eq!(state, snapshot);

        assert!(state.remove_flag(OverlayFlagKind::CashOut).is_some());
        assert!(state.remove_flag(OverlayFlagKind::CashOut).is_none());
        assert_eq!(state, CompositeState::new(LobbyPhase::Chooser));
    }

    #[test]
    fn test_remove_dialog_from_middle() {
        let mut state = CompositeState::new(LobbyPhase::Chooser);
        state.push_dialog(LayeredDialog::AgeWarningDialog);
        state.push_dialog(LayeredDialog::ResponsibleGamingInfo);
        state.push_dialog(LayeredDialog::ResponsibleGamingTimeLimitDialog);

        assert!(state.remove_dialog(LayeredDialog::ResponsibleGamingInfo));
        assert_eq!(
            state.dialogs(),
            &[
                LayeredDialog::AgeWarningDialog,
                LayeredDialog::ResponsibleGamingTimeLimitDialog
            ]
        );
        assert_eq!(
            state.top_dialog(),
            Some(LayeredDialog::ResponsibleGamingTimeLimitDialog)
        );
        assert!(!state.remove_dialog(LayeredDialog::ResponsibleGamingInfo));
    }

    #[test]
    fn test_contains_any_ignores_precedence() {
        let mut state = CompositeState::new(LobbyPhase::Disabled);
        state.add_flag(OverlayFlag::CashOutFailure);
        state.push_dialog(LayeredDialog::AgeWarningDialog);

        assert!(state.contains_any_state(&[LobbyPhase::Disabled.into()]));
        assert!(state.contains_any_state(&[
            LobbyPhase::Game.into(),
            OverlayFlagKind::CashOutFailure.into()
        ]));
        assert!(!state.contains_any_state(&[
            LobbyPhase::Game.into(),
            OverlayFlagKind::CashIn.into(),
            LayeredDialog::ResponsibleGamingInfo.into(),
        ]));
    }

    #[test]
    fn test_phase_change_keeps_flags_and_dialogs() {
        let mut state = CompositeState::new(LobbyPhase::Game);
        state.add_flag(OverlayFlag::MediaPlayerOverlay);
        state.push_dialog(LayeredDialog::AgeWarningDialog);

        let previous = state.set_phase(LobbyPhase::Disabled);
        assert_eq!(previous, LobbyPhase::Game);
        assert!(state.has_flag(OverlayFlagKind::MediaPlayerOverlay));
        assert_eq!(state.dialogs().len(), 1);
    }
}
