//! External signals the resolver reads
//!
//! Everything here is plain data supplied by the financial, hardware and game
//! subsystems. Missing signals are simply left at their `Default`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use lobby_core::{CompositeState, LobbyPhase, OverlayFlagKind};

use crate::resolver::is_locked_up;

// ═══════════════════════════════════════════════════════════════════════════════
// DISABLE KEYS
// ═══════════════════════════════════════════════════════════════════════════════

/// Identity of one active lockup reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisableKey(pub Uuid);

impl DisableKey {
    /// Handpay waiting for attendant key-off
    pub const HANDPAY_PENDING: DisableKey =
        DisableKey(Uuid::from_u128(0x6f1c_0a52_8c3e_4d5b_9a71_1e0f_4c2b_7d01));
    /// Waiting for a live player authentication
    pub const LIVE_AUTHENTICATION: DisableKey =
        DisableKey(Uuid::from_u128(0x6f1c_0a52_8c3e_4d5b_9a71_1e0f_4c2b_7d02));
    /// Machine reserved by a player
    pub const RESERVE_MACHINE: DisableKey =
        DisableKey(Uuid::from_u128(0x6f1c_0a52_8c3e_4d5b_9a71_1e0f_4c2b_7d03));

    const NAMED: [(&'static str, DisableKey); 3] = [
        ("handpay_pending", DisableKey::HANDPAY_PENDING),
        ("live_authentication", DisableKey::LIVE_AUTHENTICATION),
        ("reserve_machine", DisableKey::RESERVE_MACHINE),
    ];

    /// A fresh key for an ad-hoc lockup reason
    pub fn new_random() -> Self {
        DisableKey(Uuid::new_v4())
    }

    fn name(&self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(_, key)| key == self)
            .map(|(name, _)| *name)
    }
}

impl TryFrom<String> for DisableKey {
    type Error = uuid::Error;

    /// Accepts a well-known key name or a UUID
    fn try_from(value: String) -> Result<Self, Self::Error> {
        if let Some((_, key)) = Self::NAMED.iter().find(|(name, _)| *name == value) {
            return Ok(*key);
        }
        Uuid::parse_str(&value).map(DisableKey)
    }
}

impl From<DisableKey> for String {
    fn from(key: DisableKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for DisableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CASH-OUT / HANDPAY
// ═══════════════════════════════════════════════════════════════════════════════

/// How the current payout is being made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashOutState {
    /// Not known yet
    #[default]
    Undefined,
    /// Printing a cash-out voucher
    Voucher,
    /// Printing a voucher for a single large win
    WinVoucher,
    /// Electronic transfer out to a host
    Wat,
    /// Paid by an attendant
    HandPay,
}

/// What the most recent handpay was for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandpayType {
    /// Game win over the jackpot limit
    GameWin,
    /// Bonus award over the jackpot limit
    BonusPay,
    /// Player cashed out credits that could not be paid automatically
    CancelCredit,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIGNALS
// ═══════════════════════════════════════════════════════════════════════════════

/// Financial, hardware and game notifications feeding the resolver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationSignals {
    /// Number of active hard (player-irrecoverable) errors
    pub hard_error_count: usize,
    pub show_voucher_notification: bool,
    pub show_progressive_disabled_notification: bool,
    pub cash_out_state: CashOutState,
    /// The active lockup must take effect without waiting for the payout
    pub disable_immediately: bool,
    /// Active disable keys, in the order they became active
    pub active_disable_keys: Vec<DisableKey>,
    /// A game registered to draw some of these presentations itself
    pub game_registered_override: bool,
    pub handpay_strategy_is_basic: bool,
}

impl PresentationSignals {
    /// True iff the only active disable key is `key`
    pub fn only_disable_key_is(&self, key: DisableKey) -> bool {
        self.active_disable_keys.as_slice() == [key]
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW-SIDE CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Which overlay dialogs the view layer is currently showing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogVisibility {
    /// Disabled or in operator diagnostics; see [`is_locked_up`]
    pub lockup: bool,
    pub cashing_out: bool,
    pub cashing_in: bool,
    /// Any other overlay (cash-out failure, helpline printing, ...)
    pub non_cash_overlay: bool,
}

impl DialogVisibility {
    /// Visibility implied by the composite state alone
    pub fn from_composite(composite: &CompositeState) -> Self {
        Self {
            lockup: is_locked_up(composite),
            cashing_out: composite.has_flag(OverlayFlagKind::CashOut),
            cashing_in: composite.has_flag(OverlayFlagKind::CashIn),
            non_cash_overlay: composite.has_flag(OverlayFlagKind::CashOutFailure)
                || composite.base_state() == LobbyPhase::PrintHelpline,
        }
    }
}

/// Inputs to visibility and override decisions beyond the signals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationContext {
    pub visibility: DialogVisibility,
    /// Ignore game overrides and rebuild the lobby presentation
    pub force_rebuild: bool,
    pub last_handpay_type: Option<HandpayType>,
}
