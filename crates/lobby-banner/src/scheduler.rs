//! Transient Region Message Scheduler
//!
//! Places messages in banner regions and runs the timers of transient ones.
//!
//! ## Ordering
//!
//! All board state lives behind one mutex and is only touched inside short
//! synchronous sections, so every read and mutation is serialized. Timer
//! effects go through the same lock and are applied only if the timer's
//! generation still owns the message; a fire that lost a race to a newer
//! display or a clear is a no-op.
//!
//! A display for `(owner, region)` first cancels any running timer for that
//! key and waits until the timer has observed the cancellation, so two timers
//! for one key are never live together.
//!
//! Every display and clear takes the key's next generation when it is issued,
//! before any await. A display that resumes after a newer display or clear
//! for the same key was issued installs nothing.
//!
//! Futures returned by [`BannerScheduler::display_transient`] must be polled
//! to completion (or dropped); [`BannerScheduler::spawn_transient`] does this
//! for fire-and-forget callers.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use lobby_core::BannerConfig;

use crate::cancel::{CancelSource, CancelToken, either_cancelled};
use crate::region::{
    BannerBoard, BannerRegion, MessageKey, MessageStyle, RegionDisplay, RegionMessage, Rgba,
};

/// Event channel capacity
const EVENT_CAPACITY: usize = 256;

// ═══════════════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Banner notifications for the view layer
#[derive(Debug, Clone, PartialEq)]
pub enum BannerEvent {
    /// A region's aggregate changed
    RegionChanged {
        region: BannerRegion,
        display: RegionDisplay,
        background: Option<Rgba>,
    },
    /// The banner went from empty to showing something
    Opened,
    /// Every region is empty again; the banner owner should close it
    Closed,
    /// A transient message timed out and was removed
    MessageExpired { owner: String, region: BannerRegion },
}

/// How a transient display ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Duration elapsed and the message was removed
    Expired,
    /// Cancelled before the duration elapsed; the message was left in place
    Canceled,
    /// The message had already been cleared or replaced, or a newer display
    /// for the key was issued before this one could install
    Superseded,
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTERNAL STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// A running transient timer
struct TimerSlot {
    generation: u64,
    cancel: CancelSource,
    /// Flips to true once the timer future has finished
    finished: watch::Receiver<bool>,
}

/// Marks the timer finished however its future ends
struct FinishedGuard(watch::Sender<bool>);

impl Drop for FinishedGuard {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

struct BannerInner {
    board: BannerBoard,
    timers: HashMap<MessageKey, TimerSlot>,
    /// Generation of the latest display or clear issued per key
    issued: HashMap<MessageKey, u64>,
    next_generation: u64,
    open: bool,
}

struct Installed {
    timer: Option<(CancelToken, FinishedGuard)>,
}

enum Install {
    Done(Installed),
    /// A timer for the key appeared during the teardown wait
    Retry,
    /// A newer display or clear for the key was issued meanwhile
    Stale,
}

struct Shared {
    inner: Mutex<BannerInner>,
    events: broadcast::Sender<BannerEvent>,
    default_duration: Duration,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCHEDULER
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-(owner, region) banner message scheduler
///
/// Cheap to clone; clones share the same banner.
#[derive(Clone)]
pub struct BannerScheduler {
    shared: Arc<Shared>,
}

impl BannerScheduler {
    pub fn new(config: &BannerConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(BannerInner {
                    board: BannerBoard::new(config.separator.clone()),
                    timers: HashMap::new(),
                    issued: HashMap::new(),
                    next_generation: 1,
                    open: false,
                }),
                events,
                default_duration: Duration::from_millis(config.default_transient_ms),
            }),
        }
    }

    /// Subscribe to banner events
    pub fn subscribe(&self) -> broadcast::Receiver<BannerEvent> {
        self.shared.events.subscribe()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Aggregate shown in `region`
    pub fn display(&self, region: BannerRegion) -> RegionDisplay {
        self.shared.inner.lock().board.display(region)
    }

    /// Banner background color
    pub fn background(&self) -> Option<Rgba> {
        self.shared.inner.lock().board.background()
    }

    pub fn is_info_bar_empty(&self) -> bool {
        self.shared.inner.lock().board.is_info_bar_empty()
    }

    pub fn message(&self, owner: &str, region: BannerRegion) -> Option<RegionMessage> {
        self.shared.inner.lock().board.get(owner, region).cloned()
    }

    pub fn message_count(&self) -> usize {
        self.shared.inner.lock().board.len()
    }

    pub fn has_pending_timer(&self, owner: &str, region: BannerRegion) -> bool {
        self.shared
            .inner
            .lock()
            .timers
            .contains_key(&(owner.to_string(), region))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DISPLAY
    // ═══════════════════════════════════════════════════════════════════════════

    /// Show a message until it is cleared or replaced
    pub async fn display_static(
        &self,
        owner: &str,
        region: BannerRegion,
        text: &str,
        style: MessageStyle,
    ) {
        let generation = self.issue(owner, region);
        loop {
            self.cancel_transient(owner, region).await;
            match self.try_install(owner, region, text, style, None, generation) {
                Install::Retry => continue,
                Install::Done(_) | Install::Stale => return,
            }
        }
    }

    /// Show a message for `duration` (config default when `None`)
    ///
    /// Completes when the timer expires or is cancelled, through
    /// [`cancel_transient`](Self::cancel_transient), a newer display for the
    /// same key, or `external`. Returns [`TimerOutcome::Superseded`] without
    /// touching the board if a newer display or clear was issued first.
    pub async fn display_transient(
        &self,
        owner: &str,
        region: BannerRegion,
        text: &str,
        style: MessageStyle,
        duration: Option<Duration>,
        mut external: Option<CancelToken>,
    ) -> TimerOutcome {
        let duration = duration.unwrap_or(self.shared.default_duration);
        let generation = self.issue(owner, region);

        let installed = loop {
            self.cancel_transient(owner, region).await;
            match self.try_install(owner, region, text, style, Some(duration), generation) {
                Install::Done(installed) => break installed,
                Install::Retry => continue,
                Install::Stale => return TimerOutcome::Superseded,
            }
        };

        let Some((mut token, _finished)) = installed.timer else {
            return TimerOutcome::Canceled;
        };

        tokio::select! {
            biased;
            _ = either_cancelled(&mut token, external.as_mut()) => {
                log::debug!("[Banner] Timer for {}/{:?} cancelled", owner, region);
                self.release_slot(owner, region, generation);
                TimerOutcome::Canceled
            }
            _ = tokio::time::sleep(duration) => self.expire(owner, region, generation),
        }
    }

    /// Run [`display_transient`](Self::display_transient) on its own task
    pub fn spawn_transient(
        &self,
        owner: impl Into<String>,
        region: BannerRegion,
        text: impl Into<String>,
        style: MessageStyle,
        duration: Option<Duration>,
        external: Option<CancelToken>,
    ) -> JoinHandle<TimerOutcome> {
        let scheduler = self.clone();
        let owner = owner.into();
        let text = text.into();
        tokio::spawn(async move {
            scheduler
                .display_transient(&owner, region, &text, style, duration, external)
                .await
        })
    }

    /// Remove the message for `(owner, region)`
    ///
    /// A running timer for the key is left to fire as a no-op, and displays
    /// for the key still waiting on a teardown install nothing.
    pub fn clear_message(&self, owner: &str, region: BannerRegion) -> bool {
        let mut inner = self.shared.inner.lock();
        Self::issue_locked(&mut inner, owner, region);
        if inner.board.remove(owner, region).is_none() {
            return false;
        }
        self.publish(&mut inner, region);
        true
    }

    /// Cancel the running timer for `(owner, region)` and wait for it to stop
    ///
    /// The message itself stays. Returns false if no timer was running.
    pub async fn cancel_transient(&self, owner: &str, region: BannerRegion) -> bool {
        let slot = self
            .shared
            .inner
            .lock()
            .timers
            .remove(&(owner.to_string(), region));

        match slot {
            Some(mut slot) => {
                slot.cancel.cancel();
                // Err means the timer future is gone, which is just as final
                let _ = slot.finished.wait_for(|done| *done).await;
                true
            }
            None => false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNALS (all synchronous, lock held only inside)
    // ═══════════════════════════════════════════════════════════════════════════

    /// Take the next generation for `(owner, region)` and mark it latest
    fn issue(&self, owner: &str, region: BannerRegion) -> u64 {
        Self::issue_locked(&mut self.shared.inner.lock(), owner, region)
    }

    fn issue_locked(inner: &mut BannerInner, owner: &str, region: BannerRegion) -> u64 {
        let generation = inner.next_generation;
        inner.next_generation += 1;
        inner.issued.insert((owner.to_string(), region), generation);
        generation
    }

    /// Insert the message if `generation` is still the latest issued for the
    /// key and no timer for the key appeared meanwhile
    fn try_install(
        &self,
        owner: &str,
        region: BannerRegion,
        text: &str,
        style: MessageStyle,
        duration: Option<Duration>,
        generation: u64,
    ) -> Install {
        let key = (owner.to_string(), region);
        let mut inner = self.shared.inner.lock();

        if inner.issued.get(&key) != Some(&generation) {
            log::debug!("[Banner] Display for {}/{:?} overtaken, skipped", owner, region);
            return Install::Stale;
        }
        if inner.timers.contains_key(&key) {
            log::debug!("[Banner] Timer for {}/{:?} raced a display, retrying", owner, region);
            return Install::Retry;
        }

        inner.board.upsert(RegionMessage {
            owner: owner.to_string(),
            region,
            text: text.to_string(),
            style,
            duration,
            generation,
        });

        let timer = duration.map(|_| {
            let (cancel, token) = CancelSource::new();
            let (finished_tx, finished_rx) = watch::channel(false);
            inner.timers.insert(
                key,
                TimerSlot {
                    generation,
                    cancel,
                    finished: finished_rx,
                },
            );
            (token, FinishedGuard(finished_tx))
        });

        self.publish(&mut inner, region);
        Install::Done(Installed { timer })
    }

    /// Natural expiry: clear the message only if this generation still owns it
    fn expire(&self, owner: &str, region: BannerRegion, generation: u64) -> TimerOutcome {
        let key = (owner.to_string(), region);
        let mut inner = self.shared.inner.lock();

        let owns_timer = inner
            .timers
            .get(&key)
            .is_some_and(|slot| slot.generation == generation);
        if !owns_timer {
            log::debug!("[Banner] Stale timer for {}/{:?} ignored", owner, region);
            return TimerOutcome::Superseded;
        }
        inner.timers.remove(&key);

        let owns_message = inner
            .board
            .get(owner, region)
            .is_some_and(|message| message.generation == generation);
        if !owns_message {
            return TimerOutcome::Superseded;
        }

        inner.board.remove(owner, region);
        self.publish(&mut inner, region);
        let _ = self.shared.events.send(BannerEvent::MessageExpired {
            owner: owner.to_string(),
            region,
        });
        TimerOutcome::Expired
    }

    fn release_slot(&self, owner: &str, region: BannerRegion, generation: u64) {
        let key = (owner.to_string(), region);
        let mut inner = self.shared.inner.lock();
        if inner.timers.get(&key).is_some_and(|slot| slot.generation == generation) {
            inner.timers.remove(&key);
        }
    }

    /// Recompute `region` and announce open/close transitions of the banner
    fn publish(&self, inner: &mut BannerInner, region: BannerRegion) {
        let events = &self.shared.events;
        let _ = events.send(BannerEvent::RegionChanged {
            region,
            display: inner.board.display(region),
            background: inner.board.background(),
        });

        let empty = inner.board.is_info_bar_empty();
        if empty && inner.open {
            inner.open = false;
            log::debug!("[Banner] All regions empty, closing");
            let _ = events.send(BannerEvent::Closed);
        } else if !empty && !inner.open {
            inner.open = true;
            let _ = events.send(BannerEvent::Opened);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::{Pin, pin};
    use std::task::{Context, Waker};

    const FIVE_SECONDS: Duration = Duration::from_secs(5);

    fn scheduler() -> BannerScheduler {
        BannerScheduler::new(&BannerConfig::default())
    }

    fn drain(rx: &mut broadcast::Receiver<BannerEvent>) -> Vec<BannerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn count(events: &[BannerEvent], wanted: &BannerEvent) -> usize {
        events.iter().filter(|e| *e == wanted).count()
    }

    fn expired_count(events: &[BannerEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, BannerEvent::MessageExpired { .. }))
            .count()
    }

    async fn wait_for_timer(scheduler: &BannerScheduler, owner: &str, region: BannerRegion) {
        while !scheduler.has_pending_timer(owner, region) {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_static_display_opens_banner() {
        let scheduler = scheduler();
        let mut rx = scheduler.subscribe();

        scheduler
            .display_static("bank", BannerRegion::Left, "Credits: 100", MessageStyle::default())
            .await;

        let events = drain(&mut rx);
        assert_eq!(count(&events, &BannerEvent::Opened), 1);
        assert_eq!(scheduler.display(BannerRegion::Left).text, "Credits: 100");
        assert!(!scheduler.has_pending_timer("bank", BannerRegion::Left));
    }

    #[tokio::test(start_paused = true)]
    async fn test_region_aggregation_across_owners() {
        let scheduler = scheduler();
        scheduler
            .display_static("bank", BannerRegion::Left, "A", MessageStyle::text(Rgba::RED))
            .await;
        scheduler
            .display_static("game", BannerRegion::Left, "B", MessageStyle::text(Rgba::BLUE))
            .await;

        let display = scheduler.display(BannerRegion::Left);
        assert_eq!(display.text, "A | B");
        assert_eq!(display.text_color, Rgba::BLUE);
        assert!(!scheduler.is_info_bar_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_expires_and_closes() {
        let scheduler = scheduler();
        let mut rx = scheduler.subscribe();

        let outcome = scheduler
            .display_transient(
                "bank",
                BannerRegion::Center,
                "Bill accepted",
                MessageStyle::default(),
                Some(FIVE_SECONDS),
                None,
            )
            .await;

        assert_eq!(outcome, TimerOutcome::Expired);
        assert!(scheduler.message("bank", BannerRegion::Center).is_none());
        assert!(!scheduler.has_pending_timer("bank", BannerRegion::Center));

        let events = drain(&mut rx);
        assert_eq!(count(&events, &BannerEvent::Opened), 1);
        assert_eq!(count(&events, &BannerEvent::Closed), 1);
        assert_eq!(expired_count(&events), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_static_supersedes_pending_transient() {
        let scheduler = scheduler();
        let mut rx = scheduler.subscribe();

        let timer = scheduler.spawn_transient(
            "bank",
            BannerRegion::Left,
            "Printing ticket",
            MessageStyle::default(),
            Some(FIVE_SECONDS),
            None,
        );
        wait_for_timer(&scheduler, "bank", BannerRegion::Left).await;

        scheduler
            .display_static("bank", BannerRegion::Left, "Ticket printed", MessageStyle::default())
            .await;
        assert_eq!(timer.await.unwrap(), TimerOutcome::Canceled);

        tokio::time::sleep(FIVE_SECONDS * 2).await;

        assert_eq!(scheduler.message_count(), 1);
        assert_eq!(
            scheduler.message("bank", BannerRegion::Left).map(|m| m.text),
            Some("Ticket printed".to_string())
        );
        let events = drain(&mut rx);
        assert_eq!(expired_count(&events), 0);
        assert_eq!(count(&events, &BannerEvent::Closed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_replaces_transient() {
        let scheduler = scheduler();

        let first = scheduler.spawn_transient(
            "bank",
            BannerRegion::Right,
            "first",
            MessageStyle::default(),
            Some(FIVE_SECONDS),
            None,
        );
        wait_for_timer(&scheduler, "bank", BannerRegion::Right).await;
        tokio::time::sleep(Duration::from_secs(3)).await;

        let second = scheduler
            .display_transient(
                "bank",
                BannerRegion::Right,
                "second",
                MessageStyle::default(),
                Some(FIVE_SECONDS),
                None,
            )
            .await;

        assert_eq!(first.await.unwrap(), TimerOutcome::Canceled);
        assert_eq!(second, TimerOutcome::Expired);
        assert_eq!(scheduler.message_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_cancel_keeps_message() {
        let scheduler = scheduler();
        let (source, token) = CancelSource::new();

        let timer = scheduler.spawn_transient(
            "game",
            BannerRegion::Center,
            "Bonus!",
            MessageStyle::default(),
            Some(FIVE_SECONDS),
            Some(token),
        );
        wait_for_timer(&scheduler, "game", BannerRegion::Center).await;

        source.cancel();
        assert_eq!(timer.await.unwrap(), TimerOutcome::Canceled);
        assert!(!scheduler.has_pending_timer("game", BannerRegion::Center));
        assert_eq!(scheduler.display(BannerRegion::Center).text, "Bonus!");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_transient_waits_for_timer() {
        let scheduler = scheduler();
        assert!(!scheduler.cancel_transient("bank", BannerRegion::Left).await);

        let timer = scheduler.spawn_transient(
            "bank",
            BannerRegion::Left,
            "Cashing out",
            MessageStyle::default(),
            None,
            None,
        );
        wait_for_timer(&scheduler, "bank", BannerRegion::Left).await;

        assert!(scheduler.cancel_transient("bank", BannerRegion::Left).await);
        assert_eq!(timer.await.unwrap(), TimerOutcome::Canceled);
        assert!(scheduler.message("bank", BannerRegion::Left).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_before_expiry_is_superseded() {
        let scheduler = scheduler();
        let timer = scheduler.spawn_transient(
            "bank",
            BannerRegion::Left,
            "Bill accepted",
            MessageStyle::default(),
            Some(FIVE_SECONDS),
            None,
        );
        wait_for_timer(&scheduler, "bank", BannerRegion::Left).await;

        assert!(scheduler.clear_message("bank", BannerRegion::Left));
        assert_eq!(timer.await.unwrap(), TimerOutcome::Superseded);
        assert!(!scheduler.has_pending_timer("bank", BannerRegion::Left));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_last_message_closes_once() {
        let scheduler = scheduler();
        let mut rx = scheduler.subscribe();

        for (owner, region) in [
            ("a", BannerRegion::Left),
            ("b", BannerRegion::Center),
            ("c", BannerRegion::Right),
        ] {
            scheduler
                .display_static(owner, region, owner, MessageStyle::default())
                .await;
        }

        assert!(scheduler.clear_message("a", BannerRegion::Left));
        assert!(scheduler.clear_message("b", BannerRegion::Center));
        assert_eq!(count(&drain(&mut rx), &BannerEvent::Closed), 0);

        assert!(scheduler.clear_message("c", BannerRegion::Right));
        assert!(!scheduler.clear_message("c", BannerRegion::Right));

        let events = drain(&mut rx);
        assert_eq!(count(&events, &BannerEvent::Closed), 1);
        assert!(scheduler.is_info_bar_empty());
    }

    /// Parks a transient display on the teardown of `old`'s timer
    fn park_on_teardown<F: Future>(display: Pin<&mut F>) {
        let mut cx = Context::from_waker(Waker::noop());
        assert!(display.poll(&mut cx).is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_waiting_on_teardown_does_not_overwrite_newer() {
        let scheduler = scheduler();
        let old = scheduler.spawn_transient(
            "bank",
            BannerRegion::Left,
            "old",
            MessageStyle::default(),
            Some(FIVE_SECONDS),
            None,
        );
        wait_for_timer(&scheduler, "bank", BannerRegion::Left).await;

        let mut printing = pin!(scheduler.display_transient(
            "bank",
            BannerRegion::Left,
            "Printing ticket",
            MessageStyle::default(),
            Some(FIVE_SECONDS),
            None,
        ));
        park_on_teardown(printing.as_mut());

        scheduler
            .display_static("bank", BannerRegion::Left, "Ticket printed", MessageStyle::default())
            .await;

        assert_eq!(printing.await, TimerOutcome::Superseded);
        assert_eq!(old.await.unwrap(), TimerOutcome::Canceled);
        assert_eq!(
            scheduler.message("bank", BannerRegion::Left).map(|m| m.text),
            Some("Ticket printed".to_string())
        );
        assert!(!scheduler.has_pending_timer("bank", BannerRegion::Left));

        tokio::time::sleep(FIVE_SECONDS * 2).await;
        assert_eq!(scheduler.message_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_wins_over_display_waiting_on_teardown() {
        let scheduler = scheduler();
        let mut rx = scheduler.subscribe();
        let old = scheduler.spawn_transient(
            "bank",
            BannerRegion::Center,
            "old",
            MessageStyle::default(),
            Some(FIVE_SECONDS),
            None,
        );
        wait_for_timer(&scheduler, "bank", BannerRegion::Center).await;

        let mut printing = pin!(scheduler.display_transient(
            "bank",
            BannerRegion::Center,
            "Printing ticket",
            MessageStyle::default(),
            None,
            None,
        ));
        park_on_teardown(printing.as_mut());

        assert!(scheduler.clear_message("bank", BannerRegion::Center));
        assert_eq!(printing.await, TimerOutcome::Superseded);
        assert_eq!(old.await.unwrap(), TimerOutcome::Canceled);

        assert!(scheduler.message("bank", BannerRegion::Center).is_none());
        assert!(scheduler.is_info_bar_empty());
        assert_eq!(count(&drain(&mut rx), &BannerEvent::Closed), 1);
    }
}
