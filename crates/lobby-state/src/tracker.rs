//! Composite State Tracker
//!
//! Owns the [`CompositeState`] and applies every mutation to it. Handles:
//! - Phase transitions through the transition table
//! - Overlay flag and layered dialog add/remove
//! - Exit/entry callbacks on every effective change
//! - Re-entrant follow-up requests from inside callbacks
//!
//! ## Thread Safety Design
//!
//! The tracker is split into two parts, created together by
//! [`create_state_tracker`]:
//! - `StateTrackerHandle`: cloneable, `Send + Sync`, posts requests from any thread
//! - `StateTracker`: UI-thread owner; `pump()` drains posted requests FIFO
//!
//! Direct calls on the tracker drain the posted queue first, so external
//! requests apply in the order they were issued whichever side issued them.
//!
//! ## Re-entrancy
//!
//! Callbacks never get `&mut StateTracker`. They queue follow-ups through
//! [`DispatchContext::post`]; follow-ups run depth-first before the
//! originating call returns. A chain deeper than `max_dispatch_depth` is
//! truncated and logged. Each individual request is applied atomically, so a
//! truncated chain leaves the last fully applied state in place.

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};

use lobby_core::{
    CompositeState, LayeredDialog, LobbyError, LobbyPhase, LobbyState, OverlayFlag,
    OverlayFlagKind, StateConfig, Trigger, TriggerPayload,
};

use crate::transitions::{TransitionHistory, next_phase};

// ═══════════════════════════════════════════════════════════════════════════════
// REQUESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// A single mutation of the composite state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LobbyRequest {
    /// Run the transition table
    Trigger {
        trigger: Trigger,
        #[serde(default)]
        payload: Option<TriggerPayload>,
    },
    /// Activate an overlay flag
    AddFlag {
        flag: OverlayFlagKind,
        #[serde(default)]
        payload: Option<TriggerPayload>,
    },
    /// Deactivate an overlay flag
    RemoveFlag {
        flag: OverlayFlagKind,
        #[serde(default)]
        success: Option<bool>,
    },
    /// Push a layered dialog
    AddLayered { dialog: LayeredDialog },
    /// Remove a layered dialog from anywhere in the stack
    RemoveLayered { dialog: LayeredDialog },
}

impl LobbyRequest {
    pub fn trigger(trigger: Trigger) -> Self {
        LobbyRequest::Trigger {
            trigger,
            payload: None,
        }
    }

    pub fn trigger_with(trigger: Trigger, payload: TriggerPayload) -> Self {
        LobbyRequest::Trigger {
            trigger,
            payload: Some(payload),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALLBACKS
// ═══════════════════════════════════════════════════════════════════════════════

/// What a callback can see and do while a request is being applied
pub struct DispatchContext<'a> {
    request: &'a LobbyRequest,
    payload: Option<&'a TriggerPayload>,
    composite: &'a CompositeState,
    depth: usize,
    followups: &'a mut Vec<LobbyRequest>,
}

impl DispatchContext<'_> {
    /// The request being applied
    pub fn request(&self) -> &LobbyRequest {
        self.request
    }

    /// Trigger being applied, if the request is a phase transition
    pub fn trigger(&self) -> Option<Trigger> {
        match self.request {
            LobbyRequest::Trigger { trigger, .. } => Some(*trigger),
            _ => None,
        }
    }

    /// Payload attached to the request
    pub fn payload(&self) -> Option<&TriggerPayload> {
        self.payload
    }

    /// State before the mutation in `on_exit`, after it in `on_enter`
    pub fn composite(&self) -> &CompositeState {
        self.composite
    }

    /// How many follow-ups deep this request is (0 = external call)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Queue a follow-up, applied before the external call returns
    pub fn post(&mut self, request: LobbyRequest) {
        self.followups.push(request);
    }
}

/// Receives exit/entry callbacks and change notifications
///
/// All methods run on the tracker's thread, synchronously inside the
/// mutation that caused them.
pub trait LobbyStateObserver {
    /// Effective-current state is being left
    fn on_exit(&mut self, _state: LobbyState, _ctx: &mut DispatchContext<'_>) {}

    /// Effective-current state has been entered
    fn on_enter(&mut self, _state: LobbyState, _ctx: &mut DispatchContext<'_>) {}

    /// Composite state changed
    fn on_changed(&mut self, _composite: &CompositeState) {}
}

// ═══════════════════════════════════════════════════════════════════════════════
// HANDLE (Send + Sync, any thread)
// ═══════════════════════════════════════════════════════════════════════════════

/// Thread-safe handle for posting requests to the tracker
///
/// Requests are applied in posting order the next time the owning thread
/// calls [`StateTracker::pump`].
#[derive(Clone)]
pub struct StateTrackerHandle {
    request_tx: Sender<LobbyRequest>,
}

impl StateTrackerHandle {
    /// Post a request
    pub fn post(&self, request: LobbyRequest) {
        if self.request_tx.send(request).is_err() {
            log::warn!("[StateTracker] Request dropped, tracker is gone");
        }
    }

    pub fn send_trigger(&self, trigger: Trigger, payload: Option<TriggerPayload>) {
        self.post(LobbyRequest::Trigger { trigger, payload });
    }

    pub fn add_flag(&self, flag: OverlayFlagKind, payload: Option<TriggerPayload>) {
        self.post(LobbyRequest::AddFlag { flag, payload });
    }

    pub fn remove_flag(&self, flag: OverlayFlagKind, success: Option<bool>) {
        self.post(LobbyRequest::RemoveFlag { flag, success });
    }

    pub fn add_layered(&self, dialog: LayeredDialog) {
        self.post(LobbyRequest::AddLayered { dialog });
    }

    pub fn remove_layered(&self, dialog: LayeredDialog) {
        self.post(LobbyRequest::RemoveLayered { dialog });
    }

    /// Requests posted but not yet pumped
    pub fn pending(&self) -> usize {
        self.request_tx.len()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRACKER (UI thread)
// ═══════════════════════════════════════════════════════════════════════════════

/// UI-thread owner of the composite lobby state
pub struct StateTracker {
    composite: CompositeState,
    history: TransitionHistory,
    observers: Vec<Box<dyn LobbyStateObserver>>,
    request_tx: Sender<LobbyRequest>,
    request_rx: Receiver<LobbyRequest>,
    max_depth: usize,
    rejected_count: u64,
    overflow_count: u64,
}

/// Create a tracker in the `Startup` phase and its posting handle
pub fn create_state_tracker(config: &StateConfig) -> (StateTrackerHandle, StateTracker) {
    let (request_tx, request_rx) = unbounded();

    let handle = StateTrackerHandle {
        request_tx: request_tx.clone(),
    };

    let tracker = StateTracker {
        composite: CompositeState::default(),
        history: TransitionHistory::default(),
        observers: Vec::new(),
        request_tx,
        request_rx,
        max_depth: config.max_dispatch_depth,
        rejected_count: 0,
        overflow_count: 0,
    };

    (handle, tracker)
}

impl StateTracker {
    /// Another posting handle for this tracker
    pub fn handle(&self) -> StateTrackerHandle {
        StateTrackerHandle {
            request_tx: self.request_tx.clone(),
        }
    }

    /// Register an observer; observers are called in registration order
    pub fn add_observer(&mut self, observer: Box<dyn LobbyStateObserver>) {
        self.observers.push(observer);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn composite(&self) -> &CompositeState {
        &self.composite
    }

    /// Effective-current value (dialog > newest flag > phase)
    pub fn current_state(&self) -> LobbyState {
        self.composite.current_state()
    }

    /// Active phase
    pub fn base_state(&self) -> LobbyPhase {
        self.composite.base_state()
    }

    pub fn is_in_state(&self, state: impl Into<LobbyState>) -> bool {
        self.composite.is_in_state(state)
    }

    pub fn contains_any_state(&self, states: &[LobbyState]) -> bool {
        self.composite.contains_any_state(states)
    }

    /// Triggers rejected by the transition table so far
    pub fn rejected_count(&self) -> u64 {
        self.rejected_count
    }

    /// Re-entrant chains truncated so far
    pub fn overflow_count(&self) -> u64 {
        self.overflow_count
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MUTATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Run the transition table for `trigger`, including any re-entrant chain
    pub fn send_trigger(
        &mut self,
        trigger: Trigger,
        payload: Option<TriggerPayload>,
    ) -> CompositeState {
        self.dispatch(LobbyRequest::Trigger { trigger, payload });
        self.composite.clone()
    }

    pub fn add_flag(&mut self, flag: OverlayFlagKind, payload: Option<TriggerPayload>) {
        self.dispatch(LobbyRequest::AddFlag { flag, payload });
    }

    pub fn remove_flag(&mut self, flag: OverlayFlagKind, success: Option<bool>) {
        self.dispatch(LobbyRequest::RemoveFlag { flag, success });
    }

    pub fn add_layered(&mut self, dialog: LayeredDialog) {
        self.dispatch(LobbyRequest::AddLayered { dialog });
    }

    pub fn remove_layered(&mut self, dialog: LayeredDialog) {
        self.dispatch(LobbyRequest::RemoveLayered { dialog });
    }

    /// Apply every request posted through handles, oldest first
    ///
    /// Returns the number of requests drained.
    pub fn pump(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(request) = self.request_rx.try_recv() {
            self.dispatch_chain(request);
            drained += 1;
        }
        drained
    }

    /// Apply `request` and every follow-up it causes, depth-first
    ///
    /// Requests already posted through handles are applied before it.
    pub fn dispatch(&mut self, request: LobbyRequest) {
        let drained = self.pump();
        if drained > 0 {
            log::trace!("[StateTracker] Applied {} posted request(s) ahead of {:?}", drained, request);
        }
        self.dispatch_chain(request);
    }

    fn dispatch_chain(&mut self, request: LobbyRequest) {
        let mut pending = vec![(request, 0usize)];

        while let Some((request, depth)) = pending.pop() {
            if depth > self.max_depth {
                let dropped = pending.len() + 1;
                log::error!(
                    "[StateTracker] {} ({:?}), dropping {} queued request(s)",
                    LobbyError::DispatchOverflow {
                        depth: self.max_depth
                    },
                    request,
                    dropped
                );
                self.overflow_count += 1;
                break;
            }

            let followups = self.apply(&request, depth);
            pending.extend(followups.into_iter().rev().map(|r| (r, depth + 1)));
        }
    }

    /// Apply one request atomically and run its callbacks
    fn apply(&mut self, request: &LobbyRequest, depth: usize) -> Vec<LobbyRequest> {
        let mut next = self.composite.clone();
        let payload: Option<TriggerPayload>;

        match request {
            LobbyRequest::Trigger {
                trigger,
                payload: p,
            } => {
                let from = self.composite.base_state();
                match next_phase(*trigger, from, &self.history) {
                    Ok(phase) => {
                        next.set_phase(phase);
                        self.history.record(*trigger, from);
                        log::debug!("[StateTracker] {:?}: {:?} -> {:?}", trigger, from, phase);
                    }
                    Err(e) => {
                        self.rejected_count += 1;
                        log::warn!("[StateTracker] Ignored: {}", e);
                        return Vec::new();
                    }
                }
                payload = p.clone();
            }
            LobbyRequest::AddFlag { flag, payload: p } => {
                if !next.add_flag(flag_with_payload(*flag, p.as_ref())) {
                    log::debug!("[StateTracker] {:?} already active", flag);
                    return Vec::new();
                }
                payload = p.clone();
            }
            LobbyRequest::RemoveFlag { flag, success } => {
                if next.remove_flag(*flag).is_none() {
                    log::debug!("[StateTracker] {:?} not active", flag);
                    return Vec::new();
                }
                payload = match (flag, success) {
                    (_, Some(s)) => Some(TriggerPayload::CashOutSuccess(*s)),
                    (OverlayFlagKind::CashOut, None) => {
                        log::debug!("[StateTracker] CashOut removed without a result, assuming failure");
                        Some(TriggerPayload::CashOutSuccess(false))
                    }
                    _ => None,
                };
            }
            LobbyRequest::AddLayered { dialog } => {
                if !next.push_dialog(*dialog) {
                    log::debug!("[StateTracker] {:?} already layered", dialog);
                    return Vec::new();
                }
                payload = None;
            }
            LobbyRequest::RemoveLayered { dialog } => {
                if !next.remove_dialog(*dialog) {
                    log::debug!("[StateTracker] {:?} not layered", dialog);
                    return Vec::new();
                }
                payload = None;
            }
        }

        let old_state = self.composite.current_state();
        let new_state = next.current_state();
        let mut followups = Vec::new();

        for observer in self.observers.iter_mut() {
            let mut ctx = DispatchContext {
                request,
                payload: payload.as_ref(),
                composite: &self.composite,
                depth,
                followups: &mut followups,
            };
            observer.on_exit(old_state, &mut ctx);
        }

        self.composite = next;
        if old_state != new_state {
            log::debug!("[StateTracker] Current state {} -> {}", old_state, new_state);
        }

        for observer in self.observers.iter_mut() {
            let mut ctx = DispatchContext {
                request,
                payload: payload.as_ref(),
                composite: &self.composite,
                depth,
                followups: &mut followups,
            };
            observer.on_enter(new_state, &mut ctx);
        }

        for observer in self.observers.iter_mut() {
            observer.on_changed(&self.composite);
        }

        followups
    }
}

/// Build the flag for `kind`, taking its payload from the request
fn flag_with_payload(kind: OverlayFlagKind, payload: Option<&TriggerPayload>) -> OverlayFlag {
    match kind {
        OverlayFlagKind::CashIn => match payload.and_then(TriggerPayload::cash_in_kind) {
            Some(kind) => OverlayFlag::CashIn { kind },
            None => {
                log::debug!("[StateTracker] CashIn added without a kind, using default");
                kind.with_default_payload()
            }
        },
        OverlayFlagKind::CashOut => OverlayFlag::CashOut {
            success: payload.and_then(TriggerPayload::cash_out_success),
        },
        other => other.with_default_payload(),
    }
}
