//! Analytics reporting
//!
//! Defines the canonical event vocabulary and the collaborator that receives it:
//! - `configure` registers a session and its pull-based providers
//! - `dispatch` pushes one normalized event
//!
//! [`ChannelReporter`] forwards both onto a non-blocking channel so records can be
//! batched or shipped elsewhere without stalling the player's callback thread.

use crate::metadata::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Canonical analytics events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalyticsEvent {
    PlayerReady,
    Play,
    Playing,
    Pause,
    TimeUpdate,
    Seeking,
    Seeked,
    Error,
    ViewEnd,
    VideoChange,
    Destroy,
}

impl AnalyticsEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsEvent::PlayerReady => "playerReady",
            AnalyticsEvent::Play => "play",
            AnalyticsEvent::Playing => "playing",
            AnalyticsEvent::Pause => "pause",
            AnalyticsEvent::TimeUpdate => "timeUpdate",
            AnalyticsEvent::Seeking => "seeking",
            AnalyticsEvent::Seeked => "seeked",
            AnalyticsEvent::Error => "error",
            AnalyticsEvent::ViewEnd => "viewEnd",
            AnalyticsEvent::VideoChange => "videoChange",
            AnalyticsEvent::Destroy => "destroy",
        }
    }
}

impl std::fmt::Display for AnalyticsEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the playhead position in milliseconds
pub type TimeProvider = Box<dyn Fn() -> i64>;

/// Returns a snapshot of the playback state
pub type StateProvider = Box<dyn Fn() -> Metadata>;

/// Analytics collector receiving normalized events
///
/// Called synchronously from player callbacks; implementations must return quickly.
/// Providers may be invoked at any time, including from inside `dispatch`.
pub trait Reporter {
    /// Register a session together with its pull-based providers
    fn configure(
        &self,
        token: &str,
        metadata: &Metadata,
        current_time: TimeProvider,
        playback_state: StateProvider,
    );

    /// Push one event for the session identified by `token`
    fn dispatch(&self, token: &str, event: AnalyticsEvent, metadata: &Metadata);
}

/// Body of a [`ReportRecord`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    Configure {
        token: String,
        metadata: Metadata,
    },
    Dispatch {
        token: String,
        event: AnalyticsEvent,
        metadata: Metadata,
    },
}

impl Report {
    pub fn token(&self) -> &str {
        match self {
            Report::Configure { token, .. } | Report::Dispatch { token, .. } => token,
        }
    }

    /// The dispatched event, if this is a dispatch
    pub fn event(&self) -> Option<AnalyticsEvent> {
        match self {
            Report::Dispatch { event, .. } => Some(*event),
            Report::Configure { .. } => None,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Report::Configure { metadata, .. } | Report::Dispatch { metadata, .. } => metadata,
        }
    }
}

/// A report with delivery metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Unique record ID
    pub id: Uuid,
    /// Wall-clock time the record was produced
    pub timestamp: DateTime<Utc>,
    /// Sequence number, starting at 1
    pub sequence: u64,
    #[serde(flatten)]
    pub report: Report,
}

struct Providers {
    token: String,
    current_time: TimeProvider,
    playback_state: StateProvider,
}

/// Reporter that emits [`ReportRecord`]s on an unbounded channel
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<ReportRecord>,
    sequence: Cell<u64>,
    providers: RefCell<Option<Providers>>,
}

impl ChannelReporter {
    /// Create a reporter and the receiving end of its record channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReportRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let reporter = Self {
            tx,
            sequence: Cell::new(0),
            providers: RefCell::new(None),
        };
        (reporter, rx)
    }

    /// Token of the most recently configured session
    pub fn configured_token(&self) -> Option<String> {
        self.providers.borrow().as_ref().map(|p| p.token.clone())
    }

    /// Pull the playhead from the configured session
    pub fn sample_playhead(&self) -> Option<i64> {
        self.providers.borrow().as_ref().map(|p| (p.current_time)())
    }

    /// Pull the playback state from the configured session
    pub fn sample_state(&self) -> Option<Metadata> {
        self.providers.borrow().as_ref().map(|p| (p.playback_state)())
    }

    fn send(&self, report: Report) {
        let sequence = self.sequence.get() + 1;
        self.sequence.set(sequence);

        let record = ReportRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            sequence,
            report,
        };

        if self.tx.send(record).is_err() {
            debug!(sequence, "Report receiver dropped");
        }
    }
}

impl Reporter for ChannelReporter {
    fn configure(
        &self,
        token: &str,
        metadata: &Metadata,
        current_time: TimeProvider,
        playback_state: StateProvider,
    ) {
        *self.providers.borrow_mut() = Some(Providers {
            token: token.to_string(),
            current_time,
            playback_state,
        });
        self.send(Report::Configure {
            token: token.to_string(),
            metadata: metadata.clone(),
        });
    }

    fn dispatch(&self, token: &str, event: AnalyticsEvent, metadata: &Metadata) {
        self.send(Report::Dispatch {
            token: token.to_string(),
            event,
            metadata: metadata.clone(),
        });
    }
}
