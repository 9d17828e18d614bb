//! Lobby states: phases, overlay flags and layered dialogs
//!
//! The lobby is described by three orthogonal layers:
//! - exactly one [`LobbyPhase`] (the base mode of the cabinet UI)
//! - any subset of [`OverlayFlag`]s (conditions that coexist with any phase)
//! - a LIFO stack of [`LayeredDialog`]s (modal overlays)
//!
//! [`LobbyState`] unifies the three so that "what is showing right now"
//! queries can compare against a single value.

use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// LOBBY PHASE
// ═══════════════════════════════════════════════════════════════════════════════

/// Mutually exclusive base mode of the lobby
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LobbyPhase {
    /// Cabinet booting, nothing shown yet
    Startup,
    /// Game chooser, idle
    Chooser,
    /// Chooser with the idle text scrolling across the top
    ChooserScrollingIdleText,
    /// Chooser waiting for the next idle text scroll
    ChooserIdleTextTimer,
    /// Attract loop
    Attract,
    /// Game runtime launching
    GameLoading,
    /// Game running
    Game,
    /// Game running in operator diagnostics (replay)
    GameDiagnostics,
    /// Game runtime launching for diagnostics
    GameLoadingForDiagnostics,
    /// Relaunching a game after a crash
    Recovery,
    /// Relaunching a game found mid-play at boot
    RecoveryFromStartup,
    /// Operator or hardware lockup
    Disabled,
    /// Printing the responsible gaming helpline ticket
    PrintHelpline,
}

impl LobbyPhase {
    /// All phases in declaration order
    pub const ALL: [LobbyPhase; 13] = [
        LobbyPhase::Startup,
        LobbyPhase::Chooser,
        LobbyPhase::ChooserScrollingIdleText,
        LobbyPhase::ChooserIdleTextTimer,
        LobbyPhase::Attract,
        LobbyPhase::GameLoading,
        LobbyPhase::Game,
        LobbyPhase::GameDiagnostics,
        LobbyPhase::GameLoadingForDiagnostics,
        LobbyPhase::Recovery,
        LobbyPhase::RecoveryFromStartup,
        LobbyPhase::Disabled,
        LobbyPhase::PrintHelpline,
    ];

    /// Any of the chooser variants
    pub fn is_chooser(self) -> bool {
        matches!(
            self,
            LobbyPhase::Chooser
                | LobbyPhase::ChooserScrollingIdleText
                | LobbyPhase::ChooserIdleTextTimer
        )
    }

    /// Operator diagnostics phases
    pub fn is_diagnostics(self) -> bool {
        matches!(
            self,
            LobbyPhase::GameDiagnostics | LobbyPhase::GameLoadingForDiagnostics
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OVERLAY FLAGS
// ═══════════════════════════════════════════════════════════════════════════════

/// How credits are arriving during a cash-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashInKind {
    /// Bill acceptor
    #[default]
    Currency,
    /// Voucher (ticket-in)
    Voucher,
    /// Electronic transfer from a host
    Wat,
}

/// Overlay flag without its payload, used for identity and membership checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayFlagKind {
    CashIn,
    CashOut,
    CashOutFailure,
    MediaPlayerOverlay,
    MediaPlayerResizing,
}

/// Independent overlay condition, may coexist with any phase and any other flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayFlag {
    /// Credits are being inserted
    CashIn {
        #[serde(default)]
        kind: CashInKind,
    },
    /// Credits are being paid out; `success` is known once the payout finishes
    CashOut {
        #[serde(default)]
        success: Option<bool>,
    },
    /// The last payout failed
    CashOutFailure,
    /// A media player window is covering part of the lobby
    MediaPlayerOverlay,
    /// A media player window is being resized
    MediaPlayerResizing,
}

impl OverlayFlag {
    /// Payload-free identity of this flag
    pub fn kind(&self) -> OverlayFlagKind {
        match self {
            OverlayFlag::CashIn { .. } => OverlayFlagKind::CashIn,
            OverlayFlag::CashOut { .. } => OverlayFlagKind::CashOut,
            OverlayFlag::CashOutFailure => OverlayFlagKind::CashOutFailure,
            OverlayFlag::MediaPlayerOverlay => OverlayFlagKind::MediaPlayerOverlay,
            OverlayFlag::MediaPlayerResizing => OverlayFlagKind::MediaPlayerResizing,
        }
    }
}

impl OverlayFlagKind {
    /// Flag with a default payload
    pub fn with_default_payload(self) -> OverlayFlag {
        match self {
            OverlayFlagKind::CashIn => OverlayFlag::CashIn {
                kind: CashInKind::default(),
            },
            OverlayFlagKind::CashOut => OverlayFlag::CashOut { success: None },
            OverlayFlagKind::CashOutFailure => OverlayFlag::CashOutFailure,
            OverlayFlagKind::MediaPlayerOverlay => OverlayFlag::MediaPlayerOverlay,
            OverlayFlagKind::MediaPlayerResizing => OverlayFlag::MediaPlayerResizing,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LAYERED DIALOGS
// ═══════════════════════════════════════════════════════════════════════════════

/// Stackable modal overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayeredDialog {
    AgeWarningDialog,
    ResponsibleGamingInfo,
    ResponsibleGamingInfoLayeredLobby,
    ResponsibleGamingInfoLayeredGame,
    ResponsibleGamingTimeLimitDialog,
}

// ═══════════════════════════════════════════════════════════════════════════════
// UNIFIED STATE VALUE
// ═══════════════════════════════════════════════════════════════════════════════

/// Any one value of the three layers
///
/// Flags are compared by kind only, so `LobbyState::Flag(OverlayFlagKind::CashOut)`
/// matches a cash-out regardless of its success payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "layer", content = "value", rename_all = "snake_case")]
pub enum LobbyState {
    Phase(LobbyPhase),
    Flag(OverlayFlagKind),
    Dialog(LayeredDialog),
}

impl From<LobbyPhase> for LobbyState {
    fn from(phase: LobbyPhase) -> Self {
        LobbyState::Phase(phase)
    }
}

impl From<OverlayFlagKind> for LobbyState {
    fn from(kind: OverlayFlagKind) -> Self {
        LobbyState::Flag(kind)
    }
}

impl From<OverlayFlag> for LobbyState {
    fn from(flag: OverlayFlag) -> Self {
        LobbyState::Flag(flag.kind())
    }
}

impl From<LayeredDialog> for LobbyState {
    fn from(dialog: LayeredDialog) -> Self {
        LobbyState::Dialog(dialog)
    }
}

impl fmt::Display for LobbyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LobbyState::Phase(p) => write!(f, "{:?}", p),
            LobbyState::Flag(k) => write!(f, "{:?}", k),
            LobbyState::Dialog(d) => write!(f, "{:?}", d),
        }
    }
}
