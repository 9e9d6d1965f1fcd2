//! Scripted player sessions
//!
//! A scenario is a JSON document listing steps against named simulated players:
//!
//! ```json
//! {
//!   "config": { "player_software_name": "Kino Web" },
//!   "steps": [
//!     { "action": "set", "player": "main", "properties": { "duration": 60.0 } },
//!     { "action": "track", "player": "main", "metadata": { "video_id": "abc" } },
//!     { "action": "emit", "player": "main", "event": { "type": "play" } },
//!     { "action": "state" }
//!   ]
//! }
//! ```

use anyhow::{anyhow, Context};
use kino_tracker::{
    ChannelReporter, FrameSize, Metadata, PlayerEvent, PlayerEventKind, ReportRecord,
    SessionSnapshot, SimulatedPlayer, TrackerConfig, TrackingController,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

/// Built-in player swap scenario used by `demo`
pub const DEMO_SCENARIO: &str = include_str!("../scenarios/player_swap.json");

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: Option<TrackerConfig>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("parsing scenario {}", path.display()))
    }
}

/// Partial update of a simulated player's properties
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyUpdate {
    pub current_time: Option<f64>,
    pub duration: Option<f64>,
    pub video_width: Option<u32>,
    pub video_height: Option<u32>,
    pub frame_width: Option<f64>,
    pub frame_height: Option<f64>,
    pub paused: Option<bool>,
    pub advertised_bitrate: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Track {
        player: String,
        #[serde(default)]
        metadata: Metadata,
        #[serde(default)]
        automatic_error_tracking: bool,
    },
    Set {
        player: String,
        properties: PropertyUpdate,
    },
    Emit {
        player: String,
        event: PlayerEvent,
    },
    FailSubscriptions {
        player: String,
        kinds: Vec<PlayerEventKind>,
    },
    UpdateMetadata {
        metadata: Metadata,
    },
    Reset,
    Detach,
    State,
}

/// One line of replay output
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEntry {
    Record(ReportRecord),
    BindFailed {
        step: usize,
        player: String,
        error: String,
    },
    State {
        step: usize,
        session: SessionSnapshot,
        playback: Metadata,
    },
}

/// Drives a [`TrackingController`] through a scenario
pub struct Replay {
    controller: TrackingController,
    rx: UnboundedReceiver<ReportRecord>,
    players: HashMap<String, Rc<SimulatedPlayer>>,
    entries: Vec<ReplayEntry>,
}

impl Replay {
    pub fn new(config: TrackerConfig) -> anyhow::Result<Self> {
        let (reporter, rx) = ChannelReporter::new();
        let controller = TrackingController::with_config(Rc::new(reporter), config)?;
        Ok(Self {
            controller,
            rx,
            players: HashMap::new(),
            entries: Vec::new(),
        })
    }

    /// Run every step and return the collected output
    pub fn run(scenario: Scenario) -> anyhow::Result<Vec<ReplayEntry>> {
        let mut replay = Self::new(scenario.config.unwrap_or_default())?;
        for (index, step) in scenario.steps.into_iter().enumerate() {
            replay
                .apply(index + 1, step)
                .with_context(|| format!("step {}", index + 1))?;
        }
        replay.collect_records();
        info!(entries = replay.entries.len(), "Replay finished");
        Ok(replay.entries)
    }

    fn player(&mut self, name: &str) -> Rc<SimulatedPlayer> {
        self.players
            .entry(name.to_string())
            .or_insert_with(|| Rc::new(SimulatedPlayer::new()))
            .clone()
    }

    fn known_player(&self, name: &str) -> anyhow::Result<Rc<SimulatedPlayer>> {
        self.players
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("unknown player '{}'", name))
    }

    fn apply(&mut self, step_no: usize, step: Step) -> anyhow::Result<()> {
        match step {
            Step::Track {
                player,
                metadata,
                automatic_error_tracking,
            } => {
                let handle = self.player(&player);
                let result = self
                    .controller
                    .track_player(handle, metadata, automatic_error_tracking);
                self.collect_records();
                if let Err(e) = result {
                    warn!(step = step_no, player = %player, error = %e, "Bind failed");
                    self.entries.push(ReplayEntry::BindFailed {
                        step: step_no,
                        player,
                        error: e.to_string(),
                    });
                }
            }
            Step::Set { player, properties } => {
                let handle = self.player(&player);
                apply_properties(&handle, &properties);
            }
            Step::Emit { player, event } => {
                let handle = self.known_player(&player)?;
                handle.emit(event);
            }
            Step::FailSubscriptions { player, kinds } => {
                let handle = self.player(&player);
                for kind in kinds {
                    handle.fail_subscriptions_for(kind);
                }
            }
            Step::UpdateMetadata { metadata } => self.controller.update_video_metadata(metadata),
            Step::Reset => self.controller.reset_initialization(),
            Step::Detach => self.controller.detach(),
            Step::State => {
                self.collect_records();
                self.entries.push(ReplayEntry::State {
                    step: step_no,
                    session: self.controller.session_snapshot(),
                    playback: self.controller.current_playback_state(),
                });
            }
        }
        Ok(())
    }

    fn collect_records(&mut self) {
        while let Ok(record) = self.rx.try_recv() {
            self.entries.push(ReplayEntry::Record(record));
        }
    }
}

fn apply_properties(player: &SimulatedPlayer, update: &PropertyUpdate) {
    player.update(|p| {
        if let Some(t) = update.current_time {
            p.current_time = t;
        }
        if update.duration.is_some() {
            p.duration = update.duration;
        }
        if let Some(w) = update.video_width {
            p.video_width = w;
        }
        if let Some(h) = update.video_height {
            p.video_height = h;
        }
        if let Some(w) = update.frame_width {
            p.frame = FrameSize::new(w, p.frame.height);
        }
        if let Some(h) = update.frame_height {
            p.frame = FrameSize::new(p.frame.width, h);
        }
        if let Some(paused) = update.paused {
            p.paused = paused;
        }
        if update.advertised_bitrate.is_some() {
            p.advertised_bitrate = update.advertised_bitrate;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use kino_tracker::{AnalyticsEvent, Report};

    fn dispatched(entries: &[ReplayEntry]) -> Vec<(AnalyticsEvent, String)> {
        entries
            .iter()
            .filter_map(|e| match e {
                ReplayEntry::Record(ReportRecord {
                    report: Report::Dispatch { event, token, .. },
                    ..
                }) => Some((*event, token.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_demo_scenario_swaps_players() {
        let scenario = Scenario::from_json_str(DEMO_SCENARIO).unwrap();
        let entries = Replay::run(scenario).unwrap();
        let events = dispatched(&entries);

        let destroy = events
            .iter()
            .position(|(e, _)| *e == AnalyticsEvent::Destroy)
            .unwrap();
        assert_eq!(events[0].0, AnalyticsEvent::PlayerReady);
        assert_eq!(events[destroy].1, events[0].1);
        assert_eq!(events[destroy + 1].0, AnalyticsEvent::PlayerReady);
        assert_ne!(events[destroy + 1].1, events[0].1);
        assert!(entries.iter().any(|e| matches!(e, ReplayEntry::State { .. })));
    }

    #[test]
    fn test_bind_failure_is_reported() {
        let scenario = Scenario::from_json_str(
            r#"{
                "steps": [
                    { "action": "fail_subscriptions", "player": "p", "kinds": ["seeked"] },
                    { "action": "track", "player": "p" },
                    { "action": "state" }
                ]
            }"#,
        )
        .unwrap();

        let entries = Replay::run(scenario).unwrap();

        assert!(entries
            .iter()
            .any(|e| matches!(e, ReplayEntry::BindFailed { step: 2, .. })));
        assert!(dispatched(&entries).is_empty());
    }

    #[test]
    fn test_emit_to_unknown_player_fails() {
        let scenario = Scenario::from_json_str(
            r#"{ "steps": [ { "action": "emit", "player": "ghost", "event": { "type": "play" } } ] }"#,
        )
        .unwrap();
        let err = Replay::run(scenario).unwrap_err();
        assert!(format!("{:#}", err).contains("unknown player 'ghost'"));
    }

    #[test]
    fn test_partial_property_update() {
        let player = SimulatedPlayer::new();
        player.set_duration(Some(10.0));
        apply_properties(
            &player,
            &PropertyUpdate {
                frame_width: Some(320.0),
                paused: Some(false),
                ..Default::default()
            },
        );
        let props = player.properties();
        assert_eq!(props.duration, Some(10.0));
        assert_eq!(props.frame, FrameSize::new(320.0, 0.0));
        assert!(!props.paused);
    }
}
