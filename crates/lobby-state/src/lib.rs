//! Cabinet Lobby Composite State Tracker
//!
//! Tracks which lobby mode is active and tells the rest of the UI about it:
//! - Phase transitions driven by a total transition table
//! - Overlay flags and layered dialogs on top of the phase
//! - Exit/entry callbacks on every effective change
//! - Cross-thread request posting, drained on the UI thread
//!
//! ## Architecture
//!
//! ```text
//!   Any thread                          UI thread
//!   ┌──────────────────────┐           ┌──────────────────────────┐
//!   │ StateTrackerHandle   │           │ StateTracker             │
//!   │  .send_trigger()     │──Request──▶│  .pump()                │
//!   │  .add_flag()         │  Queue    │   apply → on_exit        │
//!   │  .add_layered()      │           │         → mutate         │
//!   └──────────────────────┘           │         → on_enter       │
//!                                      │   follow-ups depth-first │
//!                                      └──────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use lobby_core::{LobbyPhase, StateConfig, Trigger};
//! use lobby_state::create_state_tracker;
//!
//! let (handle, mut tracker) = create_state_tracker(&StateConfig::default());
//!
//! // From any thread
//! handle.send_trigger(Trigger::InitialChooser, None);
//!
//! // On the UI thread
//! tracker.pump();
//! assert_eq!(tracker.base_state(), LobbyPhase::Chooser);
//! ```

pub mod tracker;
pub mod transitions;

pub use tracker::{
    DispatchContext, LobbyRequest, LobbyStateObserver, StateTracker, StateTrackerHandle,
    create_state_tracker,
};
pub use transitions::{TransitionHistory, next_phase, transition_table};
