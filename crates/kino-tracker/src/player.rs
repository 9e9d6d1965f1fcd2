//! Player collaborator interface
//!
//! The tracker never drives playback. It only needs a player that can:
//! - register and remove listeners per event kind
//! - report its playhead, duration, video and frame dimensions
//! - describe errors with a numeric code and a message

use crate::Result;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Native player event kinds the tracker subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerEventKind {
    Play,
    SourceChange,
    Playing,
    Pause,
    TimeUpdate,
    Seeking,
    Seeked,
    Error,
    Ended,
    PresentationModeChange,
}

impl PlayerEventKind {
    /// Every kind, in subscription order
    pub const ALL: [PlayerEventKind; 10] = [
        PlayerEventKind::Play,
        PlayerEventKind::SourceChange,
        PlayerEventKind::Playing,
        PlayerEventKind::Pause,
        PlayerEventKind::TimeUpdate,
        PlayerEventKind::Seeking,
        PlayerEventKind::Seeked,
        PlayerEventKind::Error,
        PlayerEventKind::Ended,
        PlayerEventKind::PresentationModeChange,
    ];

    /// Native event name as emitted by the player's event bus
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerEventKind::Play => "play",
            PlayerEventKind::SourceChange => "sourcechange",
            PlayerEventKind::Playing => "playing",
            PlayerEventKind::Pause => "pause",
            PlayerEventKind::TimeUpdate => "timeupdate",
            PlayerEventKind::Seeking => "seeking",
            PlayerEventKind::Seeked => "seeked",
            PlayerEventKind::Error => "error",
            PlayerEventKind::Ended => "ended",
            PlayerEventKind::PresentationModeChange => "presentationmodechange",
        }
    }
}

impl std::fmt::Display for PlayerEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation modes reported by `PresentationModeChange`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationMode {
    #[default]
    Inline,
    Fullscreen,
    PictureInPicture,
}

/// Error payload carried by a player `error` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl PlayerError {
    /// Sentinel code meaning "no code available"
    pub const NOT_FOUND: i64 = i64::MAX;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// A code worth reporting: non-zero and not the sentinel
    pub fn has_reportable_code(&self) -> bool {
        self.code != 0 && self.code != Self::NOT_FOUND
    }
}

/// Event delivered by the player to a registered listener
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    Play,
    SourceChange {
        #[serde(default)]
        source: Option<String>,
    },
    Playing,
    Pause,
    TimeUpdate {
        current_time: f64,
    },
    Seeking,
    Seeked,
    Error {
        #[serde(default)]
        error: Option<PlayerError>,
    },
    Ended,
    PresentationModeChange {
        #[serde(default)]
        mode: PresentationMode,
    },
}

impl PlayerEvent {
    pub fn kind(&self) -> PlayerEventKind {
        match self {
            PlayerEvent::Play => PlayerEventKind::Play,
            PlayerEvent::SourceChange { .. } => PlayerEventKind::SourceChange,
            PlayerEvent::Playing => PlayerEventKind::Playing,
            PlayerEvent::Pause => PlayerEventKind::Pause,
            PlayerEvent::TimeUpdate { .. } => PlayerEventKind::TimeUpdate,
            PlayerEvent::Seeking => PlayerEventKind::Seeking,
            PlayerEvent::Seeked => PlayerEventKind::Seeked,
            PlayerEvent::Error { .. } => PlayerEventKind::Error,
            PlayerEvent::Ended => PlayerEventKind::Ended,
            PlayerEvent::PresentationModeChange { .. } => PlayerEventKind::PresentationModeChange,
        }
    }
}

/// Opaque subscription handle issued by a player's event bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerHandle(pub u64);

/// Callback registered with a player
pub type Listener = Rc<dyn Fn(&PlayerEvent)>;

/// On-screen size of the player view, in points
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: f64,
    pub height: f64,
}

impl FrameSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Decoded video dimensions, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

impl VideoSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for VideoSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A media player whose events can be observed
///
/// Implementations deliver events on the thread that owns the player; the tracker
/// assumes single-threaded delivery and never calls back into the player from a
/// listener except through these accessors.
pub trait Player {
    /// Register `listener` for events of `kind`
    fn add_event_listener(&self, kind: PlayerEventKind, listener: Listener) -> Result<ListenerHandle>;

    /// Remove a listener previously returned by [`Player::add_event_listener`]
    fn remove_event_listener(&self, kind: PlayerEventKind, handle: ListenerHandle);

    /// Current playhead position in seconds
    fn current_time(&self) -> f64;

    /// Content duration in seconds, if known
    fn duration(&self) -> Option<f64>;

    fn video_width(&self) -> u32;

    fn video_height(&self) -> u32;

    fn frame_size(&self) -> FrameSize;

    fn paused(&self) -> bool;

    /// Bitrate of the active rendition as advertised by the manifest
    fn advertised_bitrate(&self) -> Option<u64> {
        None
    }
}
