//! Presenter: resolved state plus everything the view layer needs to draw it
//!
//! ```text
//!   CompositeState ─┐
//!   Signals ────────┼──► Presenter::evaluate() ──► PresentationView
//!   Context ────────┘        │
//!                            ├── resolve()
//!                            ├── is_presentation_overridden()
//!                            └── HardErrorMessages (lockup text)
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use lobby_core::{CashInKind, CompositeState, MessageCatalog, OverlayFlag, OverlayFlagKind};

use crate::hard_errors::HardErrorMessages;
use crate::overrides::{PresentationOverride, is_presentation_overridden};
use crate::resolver::{PresentationState, resolve};
use crate::signals::{CashOutState, DisableKey, PresentationContext, PresentationSignals};

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything the overlay needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationView {
    pub state: PresentationState,
    pub text: String,
    pub image_key: Option<String>,
    pub dialog_visible: bool,
    pub overridden: bool,
    pub hard_lockup: bool,
}

impl Default for PresentationView {
    fn default() -> Self {
        Self {
            state: PresentationState::None,
            text: String::new(),
            image_key: None,
            dialog_visible: false,
            overridden: false,
            hard_lockup: false,
        }
    }
}

/// True when the lockup needs an operator: more than one hard error, or a
/// single one that is not a player's machine reservation
pub fn has_hard_lockup(signals: &PresentationSignals) -> bool {
    signals.hard_error_count > 1
        || (signals.hard_error_count >= 1
            && !signals.only_disable_key_is(DisableKey::RESERVE_MACHINE))
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRESENTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds [`PresentationView`]s
pub struct Presenter {
    catalog: MessageCatalog,
    hard_errors: Arc<HardErrorMessages>,
    overrides: HashSet<PresentationOverride>,
}

impl Presenter {
    pub fn new(catalog: MessageCatalog) -> Self {
        Self::with_hard_errors(catalog, Arc::new(HardErrorMessages::new()))
    }

    /// Presenter reading a registry shared with hard-error producers
    pub fn with_hard_errors(catalog: MessageCatalog, hard_errors: Arc<HardErrorMessages>) -> Self {
        Self {
            catalog,
            hard_errors,
            overrides: HashSet::new(),
        }
    }

    pub fn hard_errors(&self) -> &Arc<HardErrorMessages> {
        &self.hard_errors
    }

    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }

    pub fn register_override(&mut self, presentation: PresentationOverride) -> bool {
        log::debug!("[Presentation] Game registered override {:?}", presentation);
        self.overrides.insert(presentation)
    }

    pub fn unregister_override(&mut self, presentation: PresentationOverride) -> bool {
        self.overrides.remove(&presentation)
    }

    /// Resolve and decorate the current presentation
    pub fn evaluate(
        &self,
        composite: &CompositeState,
        signals: &PresentationSignals,
        context: &PresentationContext,
    ) -> PresentationView {
        let state = resolve(composite, signals);
        let text = self.message_text(state, composite, signals);
        let overridden = is_presentation_overridden(state, signals, context, &self.overrides);
        let hard_lockup = has_hard_lockup(signals);

        let visibility = &context.visibility;
        let handpay_paid_banner = signals.cash_out_state == CashOutState::HandPay
            && state == PresentationState::CashOut
            && !text.is_empty();

        let dialog_visible = !overridden
            && ((visibility.lockup && hard_lockup)
                || handpay_paid_banner
                || visibility.cashing_out
                || visibility.cashing_in
                || visibility.non_cash_overlay
                || signals.show_progressive_disabled_notification
                || signals.show_voucher_notification);

        PresentationView {
            state,
            image_key: state.image_key().map(str::to_string),
            text,
            dialog_visible,
            overridden,
            hard_lockup,
        }
    }

    /// Fallback text for a presentation case
    pub fn message_text(
        &self,
        state: PresentationState,
        composite: &CompositeState,
        signals: &PresentationSignals,
    ) -> String {
        let catalog = &self.catalog;
        match state {
            PresentationState::VoucherNotification => catalog.voucher_notification.clone(),
            PresentationState::CashOut => match signals.cash_out_state {
                CashOutState::Voucher => catalog.cash_out_voucher.clone(),
                CashOutState::WinVoucher => catalog.cash_out_win_voucher.clone(),
                CashOutState::Wat => catalog.cash_out_transfer.clone(),
                CashOutState::HandPay => catalog.cash_out_handpay.clone(),
                CashOutState::Undefined => catalog.cash_out_pending.clone(),
            },
            PresentationState::CashIn => {
                let kind = match composite.flag(OverlayFlagKind::CashIn) {
                    Some(OverlayFlag::CashIn { kind }) => *kind,
                    _ => CashInKind::default(),
                };
                match kind {
                    CashInKind::Currency => catalog.cash_in_currency.clone(),
                    CashInKind::Voucher => catalog.cash_in_voucher.clone(),
                    CashInKind::Wat => catalog.cash_in_wat.clone(),
                }
            }
            PresentationState::CashOutFailure => catalog.cash_out_failure.clone(),
            PresentationState::PrintHelpline => catalog.print_helpline.clone(),
            PresentationState::Diagnostics => catalog.diagnostics.clone(),
            PresentationState::Handpay => catalog.handpay.clone(),
            PresentationState::ProgressiveGameDisabledNotification => {
                catalog.progressive_disabled.clone()
            }
            PresentationState::Disabled => {
                let text = self.hard_errors.build_text();
                if text.is_empty() {
                    catalog.disabled.clone()
                } else {
                    text
                }
            }
            PresentationState::None => String::new(),
        }
    }
}
