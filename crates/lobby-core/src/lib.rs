//! lobby-core: Shared vocabulary for the cabinet lobby
//!
//! This crate provides the types every lobby component agrees on: phases,
//! overlay flags, layered dialogs, the composite state built from them,
//! triggers, the error type and configuration.

pub mod composite;
pub mod config;
mod error;
pub mod state;
pub mod trigger;

pub use composite::CompositeState;
pub use config::{
    BannerConfig, HandpayStrategy, LobbyConfig, MessageCatalog, PresentationConfig, StateConfig,
};
pub use error::*;
pub use state::{
    CashInKind, LayeredDialog, LobbyPhase, LobbyState, OverlayFlag, OverlayFlagKind,
};
pub use trigger::{Trigger, TriggerPayload};
