//! Simulated player with an in-process event bus
//!
//! Stands in for a real media player when replaying scripted sessions,
//! benchmarking and testing. Supports fault injection on subscription.

use crate::{
    player::{FrameSize, Listener, ListenerHandle, Player, PlayerEvent, PlayerEventKind},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use tracing::trace;

/// Observable playback properties of a [`SimulatedPlayer`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackProperties {
    pub current_time: f64,
    pub duration: Option<f64>,
    pub video_width: u32,
    pub video_height: u32,
    pub frame: FrameSize,
    pub paused: bool,
    pub advertised_bitrate: Option<u64>,
}

struct Registration {
    kind: PlayerEventKind,
    handle: ListenerHandle,
    listener: Listener,
}

/// In-memory [`Player`] implementation
pub struct SimulatedPlayer {
    registrations: RefCell<Vec<Registration>>,
    next_handle: Cell<u64>,
    failing: RefCell<HashSet<PlayerEventKind>>,
    properties: RefCell<PlaybackProperties>,
}

impl SimulatedPlayer {
    /// A paused player with no content loaded
    pub fn new() -> Self {
        Self {
            registrations: RefCell::new(Vec::new()),
            next_handle: Cell::new(0),
            failing: RefCell::new(HashSet::new()),
            properties: RefCell::new(PlaybackProperties {
                paused: true,
                ..Default::default()
            }),
        }
    }

    /// Snapshot of the current playback properties
    pub fn properties(&self) -> PlaybackProperties {
        self.properties.borrow().clone()
    }

    /// Mutate playback properties in place
    pub fn update(&self, f: impl FnOnce(&mut PlaybackProperties)) {
        f(&mut self.properties.borrow_mut());
    }

    pub fn set_current_time(&self, seconds: f64) {
        self.update(|p| p.current_time = seconds);
    }

    pub fn set_duration(&self, seconds: Option<f64>) {
        self.update(|p| p.duration = seconds);
    }

    pub fn set_video_size(&self, width: u32, height: u32) {
        self.update(|p| {
            p.video_width = width;
            p.video_height = height;
        });
    }

    pub fn set_frame_size(&self, frame: FrameSize) {
        self.update(|p| p.frame = frame);
    }

    pub fn set_paused(&self, paused: bool) {
        self.update(|p| p.paused = paused);
    }

    pub fn set_advertised_bitrate(&self, bitrate: Option<u64>) {
        self.update(|p| p.advertised_bitrate = bitrate);
    }

    /// Make every later subscription for `kind` fail
    pub fn fail_subscriptions_for(&self, kind: PlayerEventKind) {
        self.failing.borrow_mut().insert(kind);
    }

    pub fn clear_failures(&self) {
        self.failing.borrow_mut().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.registrations.borrow().len()
    }

    pub fn listener_count_for(&self, kind: PlayerEventKind) -> usize {
        self.registrations
            .borrow()
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }

    /// Deliver `event` to every listener of its kind, returning how many ran
    ///
    /// A `TimeUpdate` also moves the playhead. Listeners run with no internal
    /// borrow held, so they may add or remove listeners on this player.
    pub fn emit(&self, event: PlayerEvent) -> usize {
        if let PlayerEvent::TimeUpdate { current_time } = event {
            self.set_current_time(current_time);
        }

        let kind = event.kind();
        let listeners: Vec<Listener> = self
            .registrations
            .borrow()
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.listener.clone())
            .collect();

        trace!(kind = %kind, listeners = listeners.len(), "Emitting player event");
        for listener in &listeners {
            listener(&event);
        }
        listeners.len()
    }
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for SimulatedPlayer {
    fn add_event_listener(&self, kind: PlayerEventKind, listener: Listener) -> Result<ListenerHandle> {
        if self.failing.borrow().contains(&kind) {
            return Err(Error::subscribe(kind, "simulated subscription failure"));
        }

        let handle = ListenerHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);
        self.registrations.borrow_mut().push(Registration {
            kind,
            handle,
            listener,
        });
        Ok(handle)
    }

    fn remove_event_listener(&self, kind: PlayerEventKind, handle: ListenerHandle) {
        self.registrations
            .borrow_mut()
            .retain(|r| !(r.kind == kind && r.handle == handle));
    }

    fn current_time(&self) -> f64 {
        self.properties.borrow().current_time
    }

    fn duration(&self) -> Option<f64> {
        self.properties.borrow().duration
    }

    fn video_width(&self) -> u32 {
        self.properties.borrow().video_width
    }

    fn video_height(&self) -> u32 {
        self.properties.borrow().video_height
    }

    fn frame_size(&self) -> FrameSize {
        self.properties.borrow().frame
    }

    fn paused(&self) -> bool {
        self.properties.borrow().paused
    }

    fn advertised_bitrate(&self) -> Option<u64> {
        self.properties.borrow().advertised_bitrate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_emit_reaches_matching_kind_only() {
        let player = SimulatedPlayer::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        player
            .add_event_listener(PlayerEventKind::Play, Rc::new(move |_: &PlayerEvent| counter.set(counter.get() + 1)))
            .unwrap();

        assert_eq!(player.emit(PlayerEvent::Play), 1);
        assert_eq!(player.emit(PlayerEvent::Pause), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_time_update_moves_playhead() {
        let player = SimulatedPlayer::new();
        player.emit(PlayerEvent::TimeUpdate { current_time: 12.5 });
        assert_eq!(player.current_time(), 12.5);
    }

    #[test]
    fn test_handles_are_unique_and_removable() {
        let player = SimulatedPlayer::new();
        let a = player.add_event_listener(PlayerEventKind::Play, Rc::new(|_: &PlayerEvent| {})).unwrap();
        let b = player.add_event_listener(PlayerEventKind::Play, Rc::new(|_: &PlayerEvent| {})).unwrap();
        assert_ne!(a, b);

        player.remove_event_listener(PlayerEventKind::Play, a);
        assert_eq!(player.listener_count_for(PlayerEventKind::Play), 1);
    }

    #[test]
    fn test_fault_injection() {
        let player = SimulatedPlayer::new();
        player.fail_subscriptions_for(PlayerEventKind::Seeked);
        assert!(player.add_event_listener(PlayerEventKind::Seeked, Rc::new(|_: &PlayerEvent| {})).is_err());

        player.clear_failures();
        assert!(player.add_event_listener(PlayerEventKind::Seeked, Rc::new(|_: &PlayerEvent| {})).is_ok());
    }

    #[test]
    fn test_new_player_starts_paused() {
        assert!(SimulatedPlayer::new().paused());
    }
}
