//! Kino Tracker - Playback Analytics for Kino
//!
//! This crate observes a media player and reports its playback to an analytics
//! collector:
//! - Listener lifecycle across player swaps (all-or-nothing binds)
//! - Session identity and custom metadata
//! - Normalization of native player events into analytics events
//! - Pull-based playhead and playback-state queries
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Kino Tracker                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐   native events    ┌──────────────────────┐   │
//! │  │    Player    │ ─────────────────► │  TrackingController  │   │
//! │  │  (event bus) │ ◄───────────────── │  ListenerSet         │   │
//! │  └──────────────┘   subscribe/query  │  SessionState        │   │
//! │                                      └──────────┬───────────┘   │
//! │                                                 │               │
//! │                          configure / dispatch   │  providers    │
//! │                                                 ▼               │
//! │                                      ┌──────────────────────┐   │
//! │                                      │      Reporter        │   │
//! │                                      └──────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod listeners;
pub mod metadata;
pub mod player;
pub mod reporter;
pub mod session;
pub mod sim;
pub mod tracker;

pub use config::TrackerConfig;
pub use error::{Error, Result};
pub use listeners::ListenerSet;
pub use metadata::{Metadata, MetadataValue};
pub use player::{
    FrameSize, Listener, ListenerHandle, Player, PlayerError, PlayerEvent, PlayerEventKind,
    PresentationMode, VideoSize,
};
pub use reporter::{
    AnalyticsEvent, ChannelReporter, Report, ReportRecord, Reporter, StateProvider, TimeProvider,
};
pub use session::{SessionSnapshot, SessionState, SessionToken, TransitionState};
pub use sim::{PlaybackProperties, SimulatedPlayer};
pub use tracker::TrackingController;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version; call once at startup
pub fn init() {
    tracing::info!(version = VERSION, "Kino Tracker initialized");
}
