//! Lobby configuration
//!
//! Persistent settings for the lobby presentation core:
//! - Dispatch limits for the state tracker
//! - Banner separator and default transient duration
//! - Handpay strategy and fallback message texts

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LobbyError, LobbyResult};

/// Lobby configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    /// State tracker settings
    pub state: StateConfig,
    /// Banner scheduler settings
    pub banner: BannerConfig,
    /// Presentation resolver settings
    pub presentation: PresentationConfig,
}

/// State tracker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Maximum depth of a re-entrant trigger chain
    pub max_dispatch_depth: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            max_dispatch_depth: 8,
        }
    }
}

/// Banner scheduler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerConfig {
    /// Joins the messages shown in one region
    pub separator: String,
    /// Duration used when a transient message does not specify one (ms)
    pub default_transient_ms: u64,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            separator: " | ".to_string(),
            default_transient_ms: 5000,
        }
    }
}

/// How handpays are keyed off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandpayStrategy {
    /// Attendant key-off only; no dedicated handpay screen
    Basic,
    /// Handpay screen with player-selectable key-off
    #[default]
    Secure,
}

/// Presentation resolver settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub handpay_strategy: HandpayStrategy,
    /// Fallback texts (localization is handled by the view layer)
    pub messages: MessageCatalog,
}

/// Fallback message texts per presentation case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageCatalog {
    pub voucher_notification: String,
    pub cash_out_voucher: String,
    pub cash_out_win_voucher: String,
    pub cash_out_transfer: String,
    pub cash_out_handpay: String,
    pub cash_out_pending: String,
    pub cash_in_currency: String,
    pub cash_in_voucher: String,
    pub cash_in_wat: String,
    pub cash_out_failure: String,
    pub print_helpline: String,
    pub diagnostics: String,
    pub handpay: String,
    pub progressive_disabled: String,
    pub disabled: String,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self {
            voucher_notification: "Voucher accepted".to_string(),
            cash_out_voucher: "Printing ticket".to_string(),
            cash_out_win_voucher: "Printing win ticket".to_string(),
            cash_out_transfer: "Transferring credits".to_string(),
            cash_out_handpay: "Handpay paid".to_string(),
            cash_out_pending: "Cashing out".to_string(),
            cash_in_currency: "Accepting bill".to_string(),
            cash_in_voucher: "Accepting voucher".to_string(),
            cash_in_wat: "Transferring credits in".to_string(),
            cash_out_failure: "Cash out failed, call attendant".to_string(),
            print_helpline: "Printing helpline ticket".to_string(),
            diagnostics: "Game replay".to_string(),
            handpay: "Handpay pending, call attendant".to_string(),
            progressive_disabled: "Progressive unavailable, game disabled".to_string(),
            disabled: "Machine disabled".to_string(),
        }
    }
}

impl LobbyConfig {
    /// Load configuration from the standard location
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load configuration from the specified path, falling back to defaults
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load_from(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "[Config] Using defaults, could not load {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Load configuration, reporting read and parse failures
    pub fn try_load_from<P: AsRef<Path>>(path: P) -> LobbyResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the components cannot run with
    pub fn validate(&self) -> LobbyResult<()> {
        if self.state.max_dispatch_depth == 0 {
            return Err(LobbyError::Config(
                "state.max_dispatch_depth must be at least 1".to_string(),
            ));
        }
        if self.banner.default_transient_ms == 0 {
            return Err(LobbyError::Config(
                "banner.default_transient_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to the specified path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> LobbyResult<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("cabinet-lobby"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lobby.json")
    }
}
