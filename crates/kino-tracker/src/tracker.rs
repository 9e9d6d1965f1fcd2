//! Tracking Controller - binds to a player and reports its playback
//!
//! Coordinates:
//! - Attaching and detaching listeners across player swaps
//! - Session identity and metadata
//! - Normalizing native player events into analytics events
//! - Pull-based playhead and playback-state queries
//!
//! Everything runs on the thread that delivers player callbacks. Listener closures
//! hold a weak reference to the controller plus the epoch of the bind that created
//! them; only the committed epoch may deliver events, so nothing from an old player
//! is processed once teardown begins and nothing from a new player before bind
//! completes.

use crate::{
    config::TrackerConfig,
    listeners::ListenerSet,
    metadata::{keys, Metadata, MetadataValue},
    player::{Listener, Player, PlayerEvent, VideoSize},
    reporter::{AnalyticsEvent, Reporter, StateProvider, TimeProvider},
    session::{SessionSnapshot, SessionState, SessionToken, TransitionState},
    Result,
};
use chrono::Utc;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, info, trace, warn};
use url::Url;

/// Player binding
enum Binding {
    Unbound,
    Bound {
        player: Rc<dyn Player>,
        listeners: ListenerSet,
    },
}

impl Binding {
    fn player(&self) -> Option<&Rc<dyn Player>> {
        match self {
            Binding::Bound { player, .. } => Some(player),
            Binding::Unbound => None,
        }
    }
}

struct TrackerState {
    binding: Binding,
    session: SessionState,
    automatic_error_tracking: bool,
    video_size: VideoSize,
    source_url: Option<Url>,
    /// Epoch allowed to deliver events, 0 when none is
    live_epoch: u64,
}

/// Event ready to hand to the reporter; `token` is empty when no session exists
struct Outbound {
    token: String,
    event: AnalyticsEvent,
    metadata: Metadata,
}

struct Shared {
    config: TrackerConfig,
    reporter: Rc<dyn Reporter>,
    state: RefCell<TrackerState>,
    next_epoch: Cell<u64>,
}

/// Tracks one player at a time and reports its events
pub struct TrackingController {
    shared: Rc<Shared>,
}

impl TrackingController {
    /// Create an unbound controller with the default configuration
    pub fn new(reporter: Rc<dyn Reporter>) -> Self {
        Self::build(reporter, TrackerConfig::default())
    }

    /// Create an unbound controller with a validated configuration
    pub fn with_config(reporter: Rc<dyn Reporter>, config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(reporter, config))
    }

    fn build(reporter: Rc<dyn Reporter>, config: TrackerConfig) -> Self {
        Self {
            shared: Rc::new(Shared {
                config,
                reporter,
                state: RefCell::new(TrackerState {
                    binding: Binding::Unbound,
                    session: SessionState::new(),
                    automatic_error_tracking: false,
                    video_size: VideoSize::default(),
                    source_url: None,
                    live_epoch: 0,
                }),
                next_epoch: Cell::new(0),
            }),
        }
    }

    /// Start or restart tracking `player`
    pub fn track_player(
        &self,
        player: Rc<dyn Player>,
        custom_metadata: Metadata,
        automatic_error_tracking: bool,
    ) -> Result<SessionToken> {
        self.initialize_tracking(player, custom_metadata, automatic_error_tracking)
    }

    /// Bind to `player`, tearing down any existing binding first
    ///
    /// If any subscription fails the controller is left unbound and the
    /// subscription error is returned. A previous binding is torn down
    /// (destroy reported, session reset) regardless.
    pub fn initialize_tracking(
        &self,
        player: Rc<dyn Player>,
        custom_metadata: Metadata,
        automatic_error_tracking: bool,
    ) -> Result<SessionToken> {
        let shared = &self.shared;

        let previous = {
            let mut state = shared.state.borrow_mut();
            state.live_epoch = 0;
            let token = state.session.token_key();
            match std::mem::replace(&mut state.binding, Binding::Unbound) {
                Binding::Bound { player, listeners } => Some((player, listeners, token)),
                Binding::Unbound => None,
            }
        };

        if let Some((old_player, listeners, token)) = previous {
            info!(token = %token, "Tearing down previous binding");
            shared.emit(Outbound {
                token,
                event: AnalyticsEvent::Destroy,
                metadata: Metadata::new(),
            });
            listeners.unsubscribe_all(old_player.as_ref());

            let mut state = shared.state.borrow_mut();
            state.session.reset();
            state.video_size = VideoSize::default();
            state.source_url = None;
        }

        let epoch = shared.next_epoch.get() + 1;
        shared.next_epoch.set(epoch);

        let weak = Rc::downgrade(shared);
        let listeners = match ListenerSet::subscribe_all(player.as_ref(), |_| listener(weak.clone(), epoch)) {
            Ok(listeners) => listeners,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "Bind failed, controller left unbound");
                return Err(e);
            }
        };

        let (token, configured) = {
            let mut state = shared.state.borrow_mut();
            let token = state.session.start(custom_metadata, &shared.config);
            state.video_size = VideoSize::new(player.video_width(), player.video_height());
            state.automatic_error_tracking = automatic_error_tracking;
            state.binding = Binding::Bound { player, listeners };
            state.live_epoch = epoch;
            (token, state.session.metadata().clone())
        };

        info!(token = %token, epoch, automatic_error_tracking, "Player bound");

        shared.reporter.configure(
            token.as_str(),
            &configured,
            time_provider(Rc::downgrade(shared)),
            state_provider(Rc::downgrade(shared)),
        );
        shared.emit(Outbound {
            token: token.to_string(),
            event: AnalyticsEvent::PlayerReady,
            metadata: Metadata::new(),
        });
        shared
            .state
            .borrow_mut()
            .session
            .set_transition_state(TransitionState::PlayerReady);

        Ok(token)
    }

    /// Remove all listeners and release the player
    ///
    /// The session token and metadata survive so late reports still correlate;
    /// call [`TrackingController::reset_initialization`] to clear them.
    pub fn detach(&self) {
        self.shared.detach();
    }

    /// Report new content metadata for the current session
    ///
    /// Session state is left untouched. With no session the event goes out
    /// under the empty token.
    pub fn update_video_metadata(&self, custom_metadata: Metadata) {
        let token = self.shared.state.borrow().session.token_key();
        self.shared.emit(Outbound {
            token,
            event: AnalyticsEvent::VideoChange,
            metadata: custom_metadata,
        });
    }

    /// Return the session to its zero state without touching listeners
    pub fn reset_initialization(&self) {
        let mut state = self.shared.state.borrow_mut();
        state.session.reset();
        debug!("Session reset");
    }

    /// Playback state snapshot; empty when unbound
    pub fn current_playback_state(&self) -> Metadata {
        self.shared.current_playback_state()
    }

    /// Playhead in milliseconds, 0 when unbound
    pub fn fetch_player_current_time(&self) -> i64 {
        self.shared.fetch_player_current_time()
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.shared.state.borrow().binding, Binding::Bound { .. })
    }

    /// Number of subscriptions held on the bound player
    pub fn active_listener_count(&self) -> usize {
        match &self.shared.state.borrow().binding {
            Binding::Bound { listeners, .. } => listeners.len(),
            Binding::Unbound => 0,
        }
    }

    pub fn session_snapshot(&self) -> SessionSnapshot {
        self.shared.state.borrow().session.snapshot()
    }

    pub fn automatic_error_tracking(&self) -> bool {
        self.shared.state.borrow().automatic_error_tracking
    }

    /// Video dimensions cached at bind, `playing` and presentation changes
    pub fn video_size(&self) -> VideoSize {
        self.shared.state.borrow().video_size
    }

    /// Source URL from the most recent source change
    pub fn source_url(&self) -> Option<Url> {
        self.shared.state.borrow().source_url.clone()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.shared.config
    }
}

impl Drop for TrackingController {
    fn drop(&mut self) {
        self.shared.detach();
    }
}

fn listener(weak: Weak<Shared>, epoch: u64) -> Listener {
    Rc::new(move |event: &PlayerEvent| {
        if let Some(shared) = weak.upgrade() {
            shared.handle_event(epoch, event);
        }
    })
}

fn time_provider(weak: Weak<Shared>) -> TimeProvider {
    Box::new(move || {
        weak.upgrade()
            .map(|shared| shared.fetch_player_current_time())
            .unwrap_or(0)
    })
}

fn state_provider(weak: Weak<Shared>) -> StateProvider {
    Box::new(move || {
        weak.upgrade()
            .map(|shared| shared.current_playback_state())
            .unwrap_or_default()
    })
}

fn viewer_timestamp() -> i64 {
    Utc::now().timestamp_millis()
}

impl Shared {
    fn handle_event(&self, epoch: u64, event: &PlayerEvent) {
        let outbound = {
            let Ok(mut state) = self.state.try_borrow_mut() else {
                trace!(kind = %event.kind(), "Controller mid-transition, event dropped");
                return;
            };
            if state.live_epoch != epoch {
                trace!(kind = %event.kind(), epoch, "Stale listener, event dropped");
                return;
            }
            state.normalize(event)
        };

        if let Some(outbound) = outbound {
            self.emit(outbound);
        }
    }

    fn emit(&self, outbound: Outbound) {
        debug!(event = %outbound.event, token = %outbound.token, "Dispatching");
        self.reporter
            .dispatch(&outbound.token, outbound.event, &outbound.metadata);
    }

    fn detach(&self) {
        let previous = {
            let Ok(mut state) = self.state.try_borrow_mut() else {
                warn!("Detach requested mid-transition, ignored");
                return;
            };
            state.live_epoch = 0;
            state.video_size = VideoSize::default();
            state.source_url = None;
            std::mem::replace(&mut state.binding, Binding::Unbound)
        };

        if let Binding::Bound { player, listeners } = previous {
            listeners.unsubscribe_all(player.as_ref());
            info!("Player detached");
        }
    }

    fn fetch_player_current_time(&self) -> i64 {
        let Ok(state) = self.state.try_borrow() else {
            return 0;
        };
        state
            .binding
            .player()
            .map(|player| (player.current_time() * 1000.0) as i64)
            .unwrap_or(0)
    }

    fn current_playback_state(&self) -> Metadata {
        let mut snapshot = Metadata::new();
        let Ok(state) = self.state.try_borrow() else {
            return snapshot;
        };
        let Some(player) = state.binding.player() else {
            return snapshot;
        };

        let frame = player.frame_size();
        let duration_ms = player.duration().map(|d| d * 1000.0).unwrap_or(0.0);

        snapshot.insert(keys::VIDEO_SOURCE_WIDTH.into(), state.video_size.width.into());
        snapshot.insert(keys::VIDEO_SOURCE_HEIGHT.into(), state.video_size.height.into());
        snapshot.insert(keys::PLAYER_WIDTH.into(), frame.width.into());
        snapshot.insert(keys::PLAYER_HEIGHT.into(), frame.height.into());
        snapshot.insert(keys::PLAYER_IS_PAUSED.into(), player.paused().into());
        // Always reported as on; the player exposes no autoplay setting.
        snapshot.insert(keys::PLAYER_AUTOPLAY_ON.into(), true.into());
        snapshot.insert(keys::VIDEO_SOURCE_DURATION.into(), duration_ms.into());

        if let Some(url) = &state.source_url {
            snapshot.insert(keys::VIDEO_SOURCE_URL.into(), url.as_str().into());
        }
        let bitrate = state.session.last_advertised_bitrate();
        if bitrate > 0 {
            snapshot.insert(
                keys::VIDEO_SOURCE_ADVERTISED_BITRATE.into(),
                MetadataValue::Int(i64::try_from(bitrate).unwrap_or(i64::MAX)),
            );
        }

        snapshot
    }
}

impl TrackerState {
    /// Map a native event to the analytics event it reports, if any
    fn normalize(&mut self, event: &PlayerEvent) -> Option<Outbound> {
        let player = self.binding.player()?.clone();

        if let PlayerEvent::SourceChange { source } = event {
            self.source_url = source.as_deref().and_then(|s| Url::parse(s).ok());
            debug!(source = ?self.source_url.as_ref().map(Url::as_str), "Source changed");
            return None;
        }

        let token = self.session.token_key();

        let mut metadata = Metadata::new();
        let event = match event {
            PlayerEvent::Play => {
                self.session.set_ended(false);
                AnalyticsEvent::Play
            }
            PlayerEvent::Playing => {
                self.refresh_video_size(player.as_ref());
                if let Some(bitrate) = player.advertised_bitrate() {
                    self.session.record_bitrate(bitrate);
                }
                AnalyticsEvent::Playing
            }
            PlayerEvent::Pause => {
                let time = player.current_time();
                match player.duration() {
                    Some(duration) if time < duration => AnalyticsEvent::Pause,
                    _ => {
                        debug!(time, "Pause at end of content suppressed");
                        return None;
                    }
                }
            }
            PlayerEvent::TimeUpdate { current_time } => {
                let time = *current_time;
                match player.duration() {
                    Some(duration) if time > 0.0 && time < duration => {}
                    _ => return None,
                }
                self.session.record_timestamp((time * 1000.0) as i64);
                metadata.insert(
                    keys::VIEWER_TIMESTAMP.into(),
                    MetadataValue::Int(viewer_timestamp()),
                );
                AnalyticsEvent::TimeUpdate
            }
            PlayerEvent::Seeking => {
                self.session.set_ended(false);
                AnalyticsEvent::Seeking
            }
            PlayerEvent::Seeked => AnalyticsEvent::Seeked,
            PlayerEvent::Error { error } => {
                let Some(error) = error.as_ref().filter(|e| e.has_reportable_code()) else {
                    debug!("Error without a reportable code suppressed");
                    return None;
                };
                metadata.insert(keys::PLAYER_ERROR_CODE.into(), error.code.to_string().into());
                if !error.message.is_empty() {
                    metadata.insert(keys::PLAYER_ERROR_MESSAGE.into(), error.message.as_str().into());
                }
                self.session.set_transition_state(TransitionState::Error);
                AnalyticsEvent::Error
            }
            PlayerEvent::Ended => {
                self.session.set_ended(true);
                AnalyticsEvent::ViewEnd
            }
            PlayerEvent::PresentationModeChange { mode } => {
                debug!(?mode, "Presentation mode changed");
                self.refresh_video_size(player.as_ref());
                metadata = self.session.custom_metadata().clone();
                AnalyticsEvent::TimeUpdate
            }
            PlayerEvent::SourceChange { .. } => return None,
        };

        Some(Outbound {
            token,
            event,
            metadata,
        })
    }

    fn refresh_video_size(&mut self, player: &dyn Player) {
        let size = VideoSize::new(player.video_width(), player.video_height());
        if size != self.video_size {
            debug!(from = %self.video_size, to = %size, "Video size changed");
            self.video_size = size;
        }
    }
}
