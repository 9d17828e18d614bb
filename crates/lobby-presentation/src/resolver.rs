//! Presentation resolution
//!
//! Maps the composite lobby state plus external signals to the single
//! presentation case the overlay should show. Two precedence lists apply,
//! one while the cabinet is locked up and one while it is enabled.
//!
//! ```text
//!   CompositeState ──┐
//!                    ├──► resolve() ──► PresentationState
//!   Signals ─────────┘
//! ```

use serde::{Deserialize, Serialize};

use lobby_core::{CompositeState, LobbyPhase, OverlayFlagKind};

use crate::signals::{CashOutState, DisableKey, PresentationSignals};

/// Overlay presentation case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationState {
    VoucherNotification,
    CashOut,
    PrintHelpline,
    CashOutFailure,
    CashIn,
    Diagnostics,
    Handpay,
    Disabled,
    ProgressiveGameDisabledNotification,
    /// Nothing to present
    None,
}

impl PresentationState {
    pub const ALL: [PresentationState; 10] = [
        PresentationState::VoucherNotification,
        PresentationState::CashOut,
        PresentationState::PrintHelpline,
        PresentationState::CashOutFailure,
        PresentationState::CashIn,
        PresentationState::Diagnostics,
        PresentationState::Handpay,
        PresentationState::Disabled,
        PresentationState::ProgressiveGameDisabledNotification,
        PresentationState::None,
    ];

    /// Image resource key the view layer loads for this case
    pub fn image_key(&self) -> Option<&'static str> {
        match self {
            PresentationState::VoucherNotification => Some("voucher_notification"),
            PresentationState::CashOut => Some("cash_out"),
            PresentationState::PrintHelpline => Some("print_helpline"),
            PresentationState::CashOutFailure => Some("cash_out_failure"),
            PresentationState::CashIn => Some("cash_in"),
            PresentationState::Diagnostics => Some("diagnostics"),
            PresentationState::Handpay => Some("handpay"),
            PresentationState::Disabled => Some("disabled"),
            PresentationState::ProgressiveGameDisabledNotification => {
                Some("progressive_disabled")
            }
            PresentationState::None => None,
        }
    }
}

/// True while the cabinet is locked up (disabled, or replaying a game from
/// the disabled state)
pub fn is_locked_up(composite: &CompositeState) -> bool {
    matches!(
        composite.base_state(),
        LobbyPhase::Disabled | LobbyPhase::GameLoadingForDiagnostics | LobbyPhase::GameDiagnostics
    )
}

/// Resolve the presentation case; pure
pub fn resolve(composite: &CompositeState, signals: &PresentationSignals) -> PresentationState {
    if is_locked_up(composite) {
        resolve_locked_up(composite, signals)
    } else {
        resolve_enabled(composite, signals)
    }
}

fn resolve_enabled(composite: &CompositeState, signals: &PresentationSignals) -> PresentationState {
    if signals.show_progressive_disabled_notification {
        PresentationState::ProgressiveGameDisabledNotification
    } else if composite.has_flag(OverlayFlagKind::CashOut) {
        PresentationState::CashOut
    } else if composite.has_flag(OverlayFlagKind::CashIn) {
        PresentationState::CashIn
    } else if composite.has_flag(OverlayFlagKind::CashOutFailure) {
        PresentationState::CashOutFailure
    } else if signals.show_voucher_notification {
        PresentationState::VoucherNotification
    } else if composite.base_state() == LobbyPhase::PrintHelpline {
        PresentationState::PrintHelpline
    } else {
        PresentationState::None
    }
}

fn resolve_locked_up(
    composite: &CompositeState,
    signals: &PresentationSignals,
) -> PresentationState {
    if composite.has_flag(OverlayFlagKind::CashOutFailure) {
        PresentationState::CashOutFailure
    } else if composite.base_state().is_diagnostics() {
        PresentationState::Diagnostics
    } else if is_handpay_pending(signals) {
        PresentationState::Handpay
    } else if shows_cash_out_while_disabled(composite, signals) {
        PresentationState::CashOut
    } else if signals.show_voucher_notification {
        PresentationState::VoucherNotification
    } else {
        PresentationState::Disabled
    }
}

fn is_handpay_pending(signals: &PresentationSignals) -> bool {
    signals.only_disable_key_is(DisableKey::HANDPAY_PENDING)
        && signals.hard_error_count == 1
        && !signals.handpay_strategy_is_basic
}

/// A payout in progress finishes presenting before the lockup takes over,
/// unless the lockup is immediate. An immediate live-authentication lockup
/// still lets a handpay show.
fn shows_cash_out_while_disabled(composite: &CompositeState, signals: &PresentationSignals) -> bool {
    if !composite.has_flag(OverlayFlagKind::CashOut)
        || signals.cash_out_state == CashOutState::Undefined
    {
        return false;
    }

    let only_live_authentication = signals
        .active_disable_keys
        .iter()
        .all(|key| *key == DisableKey::LIVE_AUTHENTICATION);

    !signals.disable_immediately
        || (only_live_authentication && signals.cash_out_state == CashOutState::HandPay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobby_core::OverlayFlag;

    fn composite(phase: LobbyPhase, flags: &[OverlayFlagKind]) -> CompositeState {
        let mut composite = CompositeState::new(phase);
        for kind in flags {
            composite.add_flag(kind.with_default_payload());
        }
        composite
    }

    #[test]
    fn test_enabled_precedence() {
        let mut signals = PresentationSignals::default();
        let all = composite(
            LobbyPhase::Chooser,
            &[OverlayFlagKind::CashIn, OverlayFlagKind::CashOut, OverlayFlagKind::CashOutFailure],
        );

        signals.show_progressive_disabled_notification = true;
        assert_eq!(
            resolve(&all, &signals),
            PresentationState::ProgressiveGameDisabledNotification
        );

        signals.show_progressive_disabled_notification = false;
        assert_eq!(resolve(&all, &signals), PresentationState::CashOut);

        let cash_in = composite(
            LobbyPhase::Game,
            &[OverlayFlagKind::CashIn, OverlayFlagKind::CashOutFailure],
        );
        assert_eq!(resolve(&cash_in, &signals), PresentationState::CashIn);

        let failure = composite(LobbyPhase::Game, &[OverlayFlagKind::CashOutFailure]);
        signals.show_voucher_notification = true;
        assert_eq!(resolve(&failure, &signals), PresentationState::CashOutFailure);

        let helpline = composite(LobbyPhase::PrintHelpline, &[]);
        assert_eq!(resolve(&helpline, &signals), PresentationState::VoucherNotification);

        signals.show_voucher_notification = false;
        assert_eq!(resolve(&helpline, &signals), PresentationState::PrintHelpline);
    }

    #[test]
    fn test_enabled_fallback_is_none() {
        let chooser = composite(LobbyPhase::Chooser, &[]);
        let state = resolve(&chooser, &PresentationSignals::default());
        assert_eq!(state, PresentationState::None);
        assert_eq!(state.image_key(), None);
    }

    #[test]
    fn test_cash_out_failure_wins_while_disabled() {
        let disabled = composite(
            LobbyPhase::Disabled,
            &[OverlayFlagKind::CashOutFailure, OverlayFlagKind::CashOut],
        );
        let signals = PresentationSignals {
            hard_error_count: 3,
            cash_out_state: CashOutState::Voucher,
            show_voucher_notification: true,
            ..Default::default()
        };
        assert_eq!(resolve(&disabled, &signals), PresentationState::CashOutFailure);
    }

    #[test]
    fn test_diagnostics_while_locked_up() {
        let replay = composite(LobbyPhase::GameDiagnostics, &[OverlayFlagKind::CashOut]);
        let signals = PresentationSignals {
            hard_error_count: 1,
            ..Default::default()
        };
        assert_eq!(resolve(&replay, &signals), PresentationState::Diagnostics);

        let loading = composite(LobbyPhase::GameLoadingForDiagnostics, &[]);
        assert_eq!(resolve(&loading, &signals), PresentationState::Diagnostics);
    }

    #[test]
    fn test_handpay_requires_single_key_and_secure_strategy() {
        let disabled = composite(LobbyPhase::Disabled, &[]);
        let mut signals = PresentationSignals {
            hard_error_count: 1,
            active_disable_keys: vec![DisableKey::HANDPAY_PENDING],
            ..Default::default()
        };
        assert_eq!(resolve(&disabled, &signals), PresentationState::Handpay);

        signals.handpay_strategy_is_basic = true;
        assert_eq!(resolve(&disabled, &signals), PresentationState::Disabled);

        signals.handpay_strategy_is_basic = false;
        signals.hard_error_count = 2;
        signals.active_disable_keys.push(DisableKey::new_random());
        assert_eq!(resolve(&disabled, &signals), PresentationState::Disabled);
    }

    #[test]
    fn test_cash_out_while_disabled() {
        let disabled = composite(LobbyPhase::Disabled, &[OverlayFlagKind::CashOut]);
        let mut signals = PresentationSignals {
            hard_error_count: 1,
            cash_out_state: CashOutState::Undefined,
            active_disable_keys: vec![DisableKey::new_random()],
            ..Default::default()
        };
        assert_eq!(resolve(&disabled, &signals), PresentationState::Disabled);

        signals.cash_out_state = CashOutState::Voucher;
        assert_eq!(resolve(&disabled, &signals), PresentationState::CashOut);

        signals.disable_immediately = true;
        assert_eq!(resolve(&disabled, &signals), PresentationState::Disabled);

        signals.active_disable_keys = vec![DisableKey::LIVE_AUTHENTICATION];
        signals.cash_out_state = CashOutState::HandPay;
        assert_eq!(resolve(&disabled, &signals), PresentationState::CashOut);

        signals.show_voucher_notification = true;
        signals.cash_out_state = CashOutState::Voucher;
        assert_eq!(resolve(&disabled, &signals), PresentationState::VoucherNotification);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let mut disabled = composite(LobbyPhase::Disabled, &[]);
        disabled.add_flag(OverlayFlag::CashOut { success: Some(true) });
        let signals = PresentationSignals {
            hard_error_count: 2,
            cash_out_state: CashOutState::Wat,
            ..Default::default()
        };

        let first = resolve(&disabled, &signals);
        let second = resolve(&disabled, &signals);
        assert_eq!(first, second);
        assert_eq!(first, PresentationState::CashOut);
    }

    #[test]
    fn test_every_state_but_none_has_image() {
        for state in PresentationState::ALL {
            assert_eq!(state.image_key().is_none(), state == PresentationState::None);
        }
    }
}
