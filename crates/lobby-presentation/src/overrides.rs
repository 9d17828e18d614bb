//! Game-drawn presentation overrides
//!
//! A game may register to draw some payout presentations itself. While such a
//! registration matches the current situation the lobby overlay stays hidden.
//! Each registrable override is one row of [`OVERRIDE_RULES`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::resolver::PresentationState;
use crate::signals::{
    CashOutState, DialogVisibility, HandpayType, PresentationContext, PresentationSignals,
};

/// Presentation a game can take over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationOverride {
    PrintingCashoutTicket,
    PrintingCashwinTicket,
    TransferringOutCredits,
    JackpotHandpay,
    BonusJackpotHandpay,
    CancelledCreditsHandpay,
    TransferringInCredits,
}

/// Overlay dialog a rule requires to be showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayDialog {
    Lockup,
    CashingOut,
    CashingIn,
}

impl OverlayDialog {
    pub fn is_visible(self, visibility: &DialogVisibility) -> bool {
        match self {
            OverlayDialog::Lockup => visibility.lockup,
            OverlayDialog::CashingOut => visibility.cashing_out,
            OverlayDialog::CashingIn => visibility.cashing_in,
        }
    }
}

/// Conditions under which a registered override applies
#[derive(Debug, Clone, Copy)]
pub struct OverrideRule {
    pub presentation: PresentationOverride,
    pub dialog: OverlayDialog,
    pub states: &'static [PresentationState],
    /// `None` matches any cash-out state
    pub cash_out_state: Option<CashOutState>,
    /// `None` matches any (or no) previous handpay
    pub handpay_type: Option<HandpayType>,
}

impl OverrideRule {
    pub fn matches(
        &self,
        state: PresentationState,
        signals: &PresentationSignals,
        context: &PresentationContext,
    ) -> bool {
        self.dialog.is_visible(&context.visibility)
            && self.states.contains(&state)
            && self
                .cash_out_state
                .is_none_or(|required| signals.cash_out_state == required)
            && self
                .handpay_type
                .is_none_or(|required| context.last_handpay_type == Some(required))
    }
}

pub static OVERRIDE_RULES: [OverrideRule; 7] = [
    OverrideRule {
        presentation: PresentationOverride::PrintingCashoutTicket,
        dialog: OverlayDialog::CashingOut,
        states: &[PresentationState::CashOut],
        cash_out_state: Some(CashOutState::Voucher),
        handpay_type: None,
    },
    OverrideRule {
        presentation: PresentationOverride::PrintingCashwinTicket,
        dialog: OverlayDialog::CashingOut,
        states: &[PresentationState::CashOut],
        cash_out_state: Some(CashOutState::WinVoucher),
        handpay_type: None,
    },
    OverrideRule {
        presentation: PresentationOverride::TransferringOutCredits,
        dialog: OverlayDialog::CashingOut,
        states: &[PresentationState::CashOut],
        cash_out_state: Some(CashOutState::Wat),
        handpay_type: None,
    },
    OverrideRule {
        presentation: PresentationOverride::JackpotHandpay,
        dialog: OverlayDialog::Lockup,
        states: &[PresentationState::Handpay],
        cash_out_state: None,
        handpay_type: Some(HandpayType::GameWin),
    },
    OverrideRule {
        presentation: PresentationOverride::BonusJackpotHandpay,
        dialog: OverlayDialog::Lockup,
        states: &[PresentationState::Handpay],
        cash_out_state: None,
        handpay_type: Some(HandpayType::BonusPay),
    },
    OverrideRule {
        presentation: PresentationOverride::CancelledCreditsHandpay,
        dialog: OverlayDialog::Lockup,
        states: &[PresentationState::Handpay],
        cash_out_state: None,
        handpay_type: Some(HandpayType::CancelCredit),
    },
    OverrideRule {
        presentation: PresentationOverride::TransferringInCredits,
        dialog: OverlayDialog::CashingIn,
        states: &[PresentationState::CashIn],
        cash_out_state: None,
        handpay_type: None,
    },
];

/// Rule for a given override
pub fn rule_for(presentation: PresentationOverride) -> &'static OverrideRule {
    let index = match presentation {
        PresentationOverride::PrintingCashoutTicket => 0,
        PresentationOverride::PrintingCashwinTicket => 1,
        PresentationOverride::TransferringOutCredits => 2,
        PresentationOverride::JackpotHandpay => 3,
        PresentationOverride::BonusJackpotHandpay => 4,
        PresentationOverride::CancelledCreditsHandpay => 5,
        PresentationOverride::TransferringInCredits => 6,
    };
    &OVERRIDE_RULES[index]
}

/// True when the game is drawing the current presentation itself
pub fn is_presentation_overridden(
    state: PresentationState,
    signals: &PresentationSignals,
    context: &PresentationContext,
    registered: &HashSet<PresentationOverride>,
) -> bool {
    if !signals.game_registered_override || context.force_rebuild {
        return false;
    }

    // Cash-out not yet classified: the game keeps its own screen up
    if context.visibility.cashing_out && signals.cash_out_state == CashOutState::Undefined {
        return true;
    }

    OVERRIDE_RULES
        .iter()
        .filter(|rule| registered.contains(&rule.presentation))
        .any(|rule| rule.matches(state, signals, context))
}
