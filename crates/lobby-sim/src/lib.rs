//! Cabinet Lobby Simulator
//!
//! Wires the state tracker, banner and presenter into one UI-thread
//! [`Lobby`] and replays JSON [`Scenario`]s against it.

pub mod coordinator;
pub mod scenario;

pub use coordinator::{Lobby, RecordingSink, ViewSink};
pub use scenario::{Scenario, ScenarioStep, SignalUpdate};
