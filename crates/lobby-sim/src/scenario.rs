//! Scripted lobby scenarios
//!
//! A scenario is a JSON list of steps replayed against a [`Lobby`]: state
//! requests, signal changes, hard errors, game overrides, banner messages and
//! waits. Each step is followed by a pump so the view is current before the
//! next step runs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use lobby_banner::{BannerRegion, MessageStyle};
use lobby_core::LobbyResult;
use lobby_presentation::{CashOutState, DisableKey, HandpayType, PresentationOverride};
use lobby_state::LobbyRequest;

use crate::coordinator::{Lobby, ViewSink};

/// A scripted sequence of lobby inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Posted to the tracker whenever the banner closes
    #[serde(default)]
    pub on_banner_closed: Option<LobbyRequest>,
    pub steps: Vec<ScenarioStep>,
}

/// One scenario step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Apply a tracker request immediately
    Request { request: LobbyRequest },
    /// Post a tracker request through a handle; applied on the next pump
    Post { request: LobbyRequest },
    /// Change external signals
    Signals(SignalUpdate),
    HardError { key: DisableKey, message: String },
    ClearHardError { key: DisableKey },
    RegisterOverride { presentation: PresentationOverride },
    UnregisterOverride { presentation: PresentationOverride },
    ForceRebuild { enabled: bool },
    LastHandpay {
        #[serde(default)]
        handpay_type: Option<HandpayType>,
    },
    BannerStatic {
        owner: String,
        region: BannerRegion,
        text: String,
        #[serde(default)]
        style: Option<MessageStyle>,
    },
    BannerTransient {
        owner: String,
        region: BannerRegion,
        text: String,
        #[serde(default)]
        style: Option<MessageStyle>,
        /// Banner default when absent
        #[serde(default)]
        duration_ms: Option<u64>,
    },
    BannerClear { owner: String, region: BannerRegion },
    Wait { ms: u64 },
}

/// Partial change of the presentation signals; absent fields are untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalUpdate {
    pub show_voucher_notification: Option<bool>,
    pub show_progressive_disabled_notification: Option<bool>,
    pub cash_out_state: Option<CashOutState>,
    pub disable_immediately: Option<bool>,
    pub game_registered_override: Option<bool>,
}

impl Scenario {
    /// Load a scenario file
    pub fn load<P: AsRef<Path>>(path: P) -> LobbyResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Replay every step against `lobby`
    pub async fn run<S: ViewSink>(&self, lobby: &mut Lobby<S>) {
        log::info!("[Scenario] Running '{}' ({} steps)", self.name, self.steps.len());
        lobby.set_on_banner_closed(self.on_banner_closed.clone());
        lobby.refresh();

        for (index, step) in self.steps.iter().enumerate() {
            log::debug!("[Scenario] Step {}: {:?}", index, step);
            step.apply(lobby).await;
            lobby.pump();
        }
    }
}

impl ScenarioStep {
    async fn apply<S: ViewSink>(&self, lobby: &mut Lobby<S>) {
        match self {
            ScenarioStep::Request { request } => lobby.dispatch(request.clone()),
            ScenarioStep::Post { request } => lobby.handle().post(request.clone()),
            ScenarioStep::Signals(update) => lobby.update_signals(|signals| {
                if let Some(value) = update.show_voucher_notification {
                    signals.show_voucher_notification = value;
                }
                if let Some(value) = update.show_progressive_disabled_notification {
                    signals.show_progressive_disabled_notification = value;
                }
                if let Some(value) = update.cash_out_state {
                    signals.cash_out_state = value;
                }
                if let Some(value) = update.disable_immediately {
                    signals.disable_immediately = value;
                }
                if let Some(value) = update.game_registered_override {
                    signals.game_registered_override = value;
                }
            }),
            ScenarioStep::HardError { key, message } => {
                lobby.register_hard_error(*key, message.clone())
            }
            ScenarioStep::ClearHardError { key } => lobby.clear_hard_error(*key),
            ScenarioStep::RegisterOverride { presentation } => {
                lobby.register_override(*presentation)
            }
            ScenarioStep::UnregisterOverride { presentation } => {
                lobby.unregister_override(*presentation)
            }
            ScenarioStep::ForceRebuild { enabled } => lobby.set_force_rebuild(*enabled),
            ScenarioStep::LastHandpay { handpay_type } => lobby.set_last_handpay_type(*handpay_type),
            ScenarioStep::BannerStatic {
                owner,
                region,
                text,
                style,
            } => {
                let banner = lobby.banner().clone();
                banner
                    .display_static(owner, *region, text, style.unwrap_or_default())
                    .await;
            }
            ScenarioStep::BannerTransient {
                owner,
                region,
                text,
                style,
                duration_ms,
            } => {
                // Detached; a later display or clear supersedes it
                let _timer = lobby.banner().spawn_transient(
                    owner.clone(),
                    *region,
                    text.clone(),
                    style.unwrap_or_default(),
                    duration_ms.map(Duration::from_millis),
                    None,
                );
                tokio::task::yield_now().await;
            }
            ScenarioStep::BannerClear { owner, region } => {
                lobby.banner().clear_message(owner, *region);
            }
            ScenarioStep::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::RecordingSink;
    use lobby_banner::BannerEvent;
    use lobby_core::{LobbyConfig, LobbyPhase};
    use lobby_presentation::PresentationState;

    const CASH_OUT_SCENARIO: &str = r#"{
        "name": "voucher cash-out",
        "steps": [
            { "step": "request", "request": { "type": "trigger", "trigger": "initial_chooser" } },
            { "step": "request", "request": { "type": "add_flag", "flag": "cash_out" } },
            { "step": "signals", "cash_out_state": "voucher" },
            { "step": "request", "request": { "type": "remove_flag", "flag": "cash_out", "success": true } }
        ]
    }"#;

    #[test]
    fn test_parse_scenario() {
        let scenario: Scenario = serde_json::from_str(CASH_OUT_SCENARIO).unwrap();
        assert_eq!(scenario.steps.len(), 4);
        assert!(scenario.on_banner_closed.is_none());
        assert!(matches!(
            scenario.steps[2],
            ScenarioStep::Signals(SignalUpdate {
                cash_out_state: Some(CashOutState::Voucher),
                ..
            })
        ));
    }

    #[test]
    fn test_bundled_scenarios_parse() {
        for json in [
            include_str!("../scenarios/cash_out_voucher.json"),
            include_str!("../scenarios/lockup_handpay.json"),
        ] {
            let scenario: Scenario = serde_json::from_str(json).unwrap();
            assert!(!scenario.steps.is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_lockup_handpay_scenario() {
        let scenario: Scenario =
            serde_json::from_str(include_str!("../scenarios/lockup_handpay.json")).unwrap();
        let mut lobby = Lobby::new(&LobbyConfig::default(), RecordingSink::default());
        scenario.run(&mut lobby).await;

        let views = &lobby.sink().views;
        assert!(
            views
                .iter()
                .any(|v| v.state == PresentationState::Handpay && v.dialog_visible)
        );
        assert!(
            views
                .iter()
                .any(|v| v.state == PresentationState::Handpay && v.overridden && !v.dialog_visible)
        );
        assert!(
            views
                .iter()
                .any(|v| v.text == "Main door open\nPrinter paper low")
        );
        assert_eq!(lobby.composite().base_state(), LobbyPhase::Chooser);
        assert_eq!(lobby.tracker().rejected_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cash_out_scenario_views() {
        let scenario: Scenario = serde_json::from_str(CASH_OUT_SCENARIO).unwrap();
        let mut lobby = Lobby::new(&LobbyConfig::default(), RecordingSink::default());
        scenario.run(&mut lobby).await;

        let states: Vec<_> = lobby.sink().views.iter().map(|v| v.state).collect();
        assert_eq!(
            states,
            vec![
                PresentationState::None,
                PresentationState::CashOut,
                PresentationState::CashOut,
                PresentationState::None,
            ]
        );
        let texts: Vec<_> = lobby.sink().views.iter().map(|v| v.text.as_str()).collect();
        assert_eq!(texts[1], "Cashing out");
        assert_eq!(texts[2], "Printing ticket");
    }

    #[tokio::test(start_paused = true)]
    async fn test_banner_steps_and_close_request() {
        let scenario: Scenario = serde_json::from_str(
            r#"{
                "name": "banner",
                "on_banner_closed": { "type": "trigger", "trigger": "attract_timer" },
                "steps": [
                    { "step": "request", "request": { "type": "trigger", "trigger": "initial_chooser" } },
                    { "step": "banner_transient", "owner": "bank", "region": "center",
                      "text": "Bill accepted", "duration_ms": 1000 },
                    { "step": "banner_static", "owner": "bank", "region": "center", "text": "Credits 20" },
                    { "step": "wait", "ms": 2000 },
                    { "step": "banner_clear", "owner": "bank", "region": "center" }
                ]
            }"#,
        )
        .unwrap();

        let mut lobby = Lobby::new(&LobbyConfig::default(), RecordingSink::default());
        scenario.run(&mut lobby).await;

        let events = &lobby.sink().banner_events;
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, BannerEvent::MessageExpired { .. }))
        );
        assert_eq!(events.iter().filter(|e| **e == BannerEvent::Closed).count(), 1);
        assert_eq!(lobby.composite().base_state(), LobbyPhase::Attract);
    }

    #[tokio::test(start_paused = true)]
    async fn test_posted_request_and_hard_error() {
        let scenario: Scenario = serde_json::from_str(
            r#"{
                "name": "lockup",
                "steps": [
                    { "step": "post", "request": { "type": "trigger", "trigger": "initial_chooser" } },
                    { "step": "post", "request": { "type": "trigger", "trigger": "disable" } },
                    { "step": "hard_error", "key": "handpay_pending", "message": "Handpay" }
                ]
            }"#,
        )
        .unwrap();

        let mut lobby = Lobby::new(&LobbyConfig::default(), RecordingSink::default());
        scenario.run(&mut lobby).await;

        assert_eq!(lobby.composite().base_state(), LobbyPhase::Disabled);
        assert_eq!(lobby.view().map(|v| v.state), Some(PresentationState::Handpay));
    }
}
