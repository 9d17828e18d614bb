//! Cabinet Lobby Presentation
//!
//! Decides which overlay the lobby shows and whether it is visible:
//! - `resolve`: composite state + signals → [`PresentationState`]
//! - Game overrides as an explicit rule table
//! - Hard-error lockup text from a shared, thread-safe registry
//!
//! ## Architecture
//!
//! ```text
//! Financial / hardware / game events
//!         │
//!         ├──► HardErrorMessages (any thread)
//!         └──► PresentationSignals
//!                     │
//! CompositeState ─────┼──► Presenter::evaluate() ──► PresentationView ──► view layer
//!                     │
//! PresentationContext ┘
//! ```

pub mod hard_errors;
pub mod overrides;
pub mod resolver;
pub mod signals;
pub mod view;

pub use hard_errors::HardErrorMessages;
pub use overrides::{
    OVERRIDE_RULES, OverlayDialog, OverrideRule, PresentationOverride, is_presentation_overridden,
};
pub use resolver::{PresentationState, is_locked_up, resolve};
pub use signals::{
    CashOutState, DialogVisibility, DisableKey, HandpayType, PresentationContext,
    PresentationSignals,
};
pub use view::{PresentationView, Presenter, has_hard_lockup};
