//! Lobby coordinator
//!
//! Owns the state tracker, presenter and banner on the UI thread and keeps the
//! view in step with them.
//!
//! ```text
//! StateTrackerHandle ──► StateTracker ──┐
//! BannerScheduler ─── events ───────────┼──► Lobby::pump() ──► Presenter ──► ViewSink
//! HardErrorMessages / signals ──────────┘
//! ```

use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};

use lobby_banner::{BannerEvent, BannerScheduler};
use lobby_core::{CompositeState, HandpayStrategy, LobbyConfig, LobbyState};
use lobby_presentation::{
    DialogVisibility, DisableKey, HandpayType, HardErrorMessages, PresentationContext,
    PresentationOverride, PresentationSignals, PresentationView, Presenter,
};
use lobby_state::{
    DispatchContext, LobbyRequest, LobbyStateObserver, StateTracker, StateTrackerHandle,
    create_state_tracker,
};

// ═══════════════════════════════════════════════════════════════════════════════
// SINKS
// ═══════════════════════════════════════════════════════════════════════════════

/// Receives view updates
pub trait ViewSink {
    /// Called whenever the presentation view changes
    fn on_view(&mut self, view: &PresentationView);

    /// Called for every banner notification
    fn on_banner(&mut self, _event: &BannerEvent) {}
}

/// Sink that keeps every view it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub views: Vec<PresentationView>,
    pub banner_events: Vec<BannerEvent>,
}

impl ViewSink for RecordingSink {
    fn on_view(&mut self, view: &PresentationView) {
        self.views.push(view.clone());
    }

    fn on_banner(&mut self, event: &BannerEvent) {
        self.banner_events.push(event.clone());
    }
}

/// Logs effective state changes
struct TransitionLogger;

impl LobbyStateObserver for TransitionLogger {
    fn on_exit(&mut self, state: LobbyState, ctx: &mut DispatchContext<'_>) {
        log::trace!("[Lobby] exit {} (depth {})", state, ctx.depth());
    }

    fn on_enter(&mut self, state: LobbyState, ctx: &mut DispatchContext<'_>) {
        log::debug!("[Lobby] enter {} via {:?}", state, ctx.request());
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOBBY
// ═══════════════════════════════════════════════════════════════════════════════

/// UI-thread owner of the lobby components
pub struct Lobby<S: ViewSink> {
    tracker: StateTracker,
    presenter: Presenter,
    banner: BannerScheduler,
    banner_events: broadcast::Receiver<BannerEvent>,
    signals: PresentationSignals,
    force_rebuild: bool,
    last_handpay_type: Option<HandpayType>,
    on_banner_closed: Option<LobbyRequest>,
    view: Option<PresentationView>,
    sink: S,
}

impl<S: ViewSink> Lobby<S> {
    pub fn new(config: &LobbyConfig, sink: S) -> Self {
        let (_, mut tracker) = create_state_tracker(&config.state);
        tracker.add_observer(Box::new(TransitionLogger));

        let banner = BannerScheduler::new(&config.banner);
        let banner_events = banner.subscribe();

        let signals = PresentationSignals {
            handpay_strategy_is_basic: config.presentation.handpay_strategy
                == HandpayStrategy::Basic,
            ..Default::default()
        };

        Self {
            tracker,
            presenter: Presenter::new(config.presentation.messages.clone()),
            banner,
            banner_events,
            signals,
            force_rebuild: false,
            last_handpay_type: None,
            on_banner_closed: None,
            view: None,
            sink,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Posting handle for other threads
    pub fn handle(&self) -> StateTrackerHandle {
        self.tracker.handle()
    }

    pub fn tracker(&self) -> &StateTracker {
        &self.tracker
    }

    pub fn composite(&self) -> &CompositeState {
        self.tracker.composite()
    }

    pub fn banner(&self) -> &BannerScheduler {
        &self.banner
    }

    /// Registry shared with hard-error producers
    pub fn hard_errors(&self) -> Arc<HardErrorMessages> {
        self.presenter.hard_errors().clone()
    }

    pub fn signals(&self) -> &PresentationSignals {
        &self.signals
    }

    /// Last view forwarded to the sink
    pub fn view(&self) -> Option<&PresentationView> {
        self.view.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Request posted to the tracker whenever the banner closes
    pub fn set_on_banner_closed(&mut self, request: Option<LobbyRequest>) {
        self.on_banner_closed = request;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INPUTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Apply a request right away, including its re-entrant chain
    ///
    /// Pending banner events and posted requests are handled first.
    pub fn dispatch(&mut self, request: LobbyRequest) {
        self.drain_banner_events();
        self.tracker.dispatch(request);
        self.refresh();
    }

    /// Change external signals
    pub fn update_signals(&mut self, update: impl FnOnce(&mut PresentationSignals)) {
        update(&mut self.signals);
        self.refresh();
    }

    pub fn register_hard_error(&mut self, key: DisableKey, message: impl Into<String>) {
        self.presenter.hard_errors().register(key, message);
        self.refresh();
    }

    pub fn clear_hard_error(&mut self, key: DisableKey) {
        self.presenter.hard_errors().clear(key);
        self.refresh();
    }

    pub fn register_override(&mut self, presentation: PresentationOverride) {
        self.presenter.register_override(presentation);
        self.refresh();
    }

    pub fn unregister_override(&mut self, presentation: PresentationOverride) {
        self.presenter.unregister_override(presentation);
        self.refresh();
    }

    pub fn set_force_rebuild(&mut self, force_rebuild: bool) {
        self.force_rebuild = force_rebuild;
        self.refresh();
    }

    pub fn set_last_handpay_type(&mut self, handpay_type: Option<HandpayType>) {
        self.last_handpay_type = handpay_type;
        self.refresh();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // UI LOOP
    // ═══════════════════════════════════════════════════════════════════════════

    /// Drain banner events and posted requests, then refresh the view
    ///
    /// Returns the number of tracker requests applied.
    pub fn pump(&mut self) -> usize {
        self.drain_banner_events();
        let applied = self.tracker.pump();
        self.refresh();
        applied
    }

    /// Re-evaluate the view and forward it if it changed
    pub fn refresh(&mut self) -> bool {
        self.presenter.hard_errors().fill_signals(&mut self.signals);

        let composite = self.tracker.composite();
        let context = PresentationContext {
            visibility: DialogVisibility::from_composite(composite),
            force_rebuild: self.force_rebuild,
            last_handpay_type: self.last_handpay_type,
        };
        let view = self.presenter.evaluate(composite, &self.signals, &context);

        if self.view.as_ref() == Some(&view) {
            return false;
        }

        self.sink.on_view(&view);
        self.view = Some(view);
        true
    }

    fn drain_banner_events(&mut self) {
        loop {
            match self.banner_events.try_recv() {
                Ok(event) => self.handle_banner_event(event),
                Err(TryRecvError::Lagged(missed)) => {
                    log::warn!("[Lobby] Missed {} banner event(s)", missed);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    fn handle_banner_event(&mut self, event: BannerEvent) {
        self.sink.on_banner(&event);

        if event == BannerEvent::Closed {
            if let Some(request) = self.on_banner_closed.clone() {
                log::debug!("[Lobby] Banner closed, posting {:?}", request);
                self.tracker.handle().post(request);
            }
        }
    }
}
