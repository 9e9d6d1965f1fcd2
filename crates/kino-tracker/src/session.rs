//! Session State - identity and lifecycle data for one tracked viewing
//!
//! Holds:
//! - Session token shared by every reported event
//! - Custom metadata merged with the integration identity
//! - Transition state gating derived events
//! - Counters used for interim reporting

use crate::{
    config::TrackerConfig,
    metadata::{keys, Metadata, MetadataValue},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque per-session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a fresh random token
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse lifecycle marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionState {
    #[default]
    Uninitialized,
    PlayerReady,
    Error,
}

impl TransitionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionState::Uninitialized => "",
            TransitionState::PlayerReady => "playerready",
            TransitionState::Error => "error",
        }
    }
}

impl std::fmt::Display for TransitionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and counters for the current session
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    token: Option<SessionToken>,
    /// Caller metadata exactly as given to `start`
    custom_metadata: Metadata,
    metadata: Metadata,
    transition_state: TransitionState,
    /// Playhead (ms) of the most recent progress report
    last_reported_timestamp: i64,
    last_advertised_bitrate: u64,
    is_ended: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session, returning its token
    ///
    /// A token that already exists is kept; callers that want a fresh one
    /// call [`SessionState::reset`] first.
    pub fn start(&mut self, metadata: Metadata, config: &TrackerConfig) -> SessionToken {
        let token = self.token.get_or_insert_with(SessionToken::generate).clone();

        let mut merged = metadata.clone();
        merged.insert(
            keys::PLAYER_SOFTWARE_NAME.to_string(),
            MetadataValue::from(config.player_software_name.as_str()),
        );
        merged.insert(
            keys::PLAYER_SOFTWARE_VERSION.to_string(),
            MetadataValue::from(config.player_software_version.as_str()),
        );
        self.custom_metadata = metadata;
        self.metadata = merged;
        self.transition_state = TransitionState::PlayerReady;

        token
    }

    /// Return every field to its zero value
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Store the latest playhead-derived timestamp. Not monotonic: seeks move it back.
    pub fn record_timestamp(&mut self, timestamp_ms: i64) {
        self.last_reported_timestamp = timestamp_ms;
    }

    pub fn record_bitrate(&mut self, bitrate: u64) {
        self.last_advertised_bitrate = bitrate;
    }

    pub fn set_transition_state(&mut self, state: TransitionState) {
        self.transition_state = state;
    }

    pub fn set_ended(&mut self, ended: bool) {
        self.is_ended = ended;
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Token as reported to the collector, empty when no session exists
    pub fn token_key(&self) -> String {
        self.token.as_ref().map(|t| t.to_string()).unwrap_or_default()
    }

    /// Merged metadata: caller fields plus the integration identity
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn custom_metadata(&self) -> &Metadata {
        &self.custom_metadata
    }

    pub fn transition_state(&self) -> TransitionState {
        self.transition_state
    }

    pub fn last_reported_timestamp(&self) -> i64 {
        self.last_reported_timestamp
    }

    pub fn last_advertised_bitrate(&self) -> u64 {
        self.last_advertised_bitrate
    }

    pub fn is_ended(&self) -> bool {
        self.is_ended
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            token: self.token_key(),
            metadata: self.metadata.clone(),
            transition_state: self.transition_state,
            last_reported_timestamp: self.last_reported_timestamp,
            last_advertised_bitrate: self.last_advertised_bitrate,
            is_ended: self.is_ended,
        }
    }
}

/// Point-in-time copy of a [`SessionState`]; `token` is empty when no session exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub token: String,
    pub metadata: Metadata,
    pub transition_state: TransitionState,
    pub last_reported_timestamp: i64,
    pub last_advertised_bitrate: u64,
    pub is_ended: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(key: &str, value: i64) -> Metadata {
        let mut m = Metadata::new();
        m.insert(key.to_string(), MetadataValue::Int(value));
        m
    }

    #[test]
    fn test_start_generates_token_and_identity() {
        let config = TrackerConfig::default();
        let mut session = SessionState::new();
        assert!(session.token().is_none());

        let token = session.start(meta("a", 1), &config);

        assert!(!token.as_str().is_empty());
        assert_eq!(token.as_str(), token.as_str().to_lowercase());
        assert_eq!(session.token(), Some(&token));
        assert_eq!(session.transition_state(), TransitionState::PlayerReady);
        assert_eq!(session.metadata()["a"], MetadataValue::Int(1));
        assert_eq!(
            session.metadata()[keys::PLAYER_SOFTWARE_NAME],
            MetadataValue::from("Kino Player")
        );
        assert!(session.metadata().contains_key(keys::PLAYER_SOFTWARE_VERSION));
    }

    #[test]
    fn test_start_keeps_existing_token() {
        let config = TrackerConfig::default();
        let mut session = SessionState::new();
        let first = session.start(meta("a", 1), &config);
        let second = session.start(meta("b", 2), &config);

        assert_eq!(first, second);
        assert!(!session.metadata().contains_key("a"));
        assert!(session.metadata().contains_key("b"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let config = TrackerConfig::default();
        let mut session = SessionState::new();
        session.start(meta("a", 1), &config);
        session.record_timestamp(5_000);
        session.record_bitrate(2_500_000);
        session.set_ended(true);
        session.set_transition_state(TransitionState::Error);

        session.reset();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.token, "");
        assert!(snapshot.metadata.is_empty());
        assert_eq!(snapshot.transition_state, TransitionState::Uninitialized);
        assert_eq!(snapshot.last_reported_timestamp, 0);
        assert_eq!(snapshot.last_advertised_bitrate, 0);
        assert!(!snapshot.is_ended);
    }

    #[test]
    fn test_custom_metadata_kept_unmerged() {
        let mut session = SessionState::new();
        assert_eq!(session.token_key(), "");

        let token = session.start(meta("a", 1), &TrackerConfig::default());

        assert_eq!(session.token_key(), token.as_str());
        assert_eq!(session.custom_metadata(), &meta("a", 1));
        assert!(session.metadata().contains_key(keys::PLAYER_SOFTWARE_NAME));

        session.reset();
        assert!(session.custom_metadata().is_empty());
        assert_eq!(session.token_key(), "");
    }

    #[test]
    fn test_record_timestamp_allows_backwards() {
        let mut session = SessionState::new();
        session.record_timestamp(9_000);
        session.record_timestamp(1_000);
        assert_eq!(session.last_reported_timestamp(), 1_000);
    }

    #[test]
    fn test_fresh_token_after_reset() {
        let config = TrackerConfig::default();
        let mut session = SessionState::new();
        let first = session.start(Metadata::new(), &config);
        session.reset();
        let second = session.start(Metadata::new(), &config);
        assert_ne!(first, second);
    }

    #[test]
    fn test_transition_state_strings() {
        assert_eq!(TransitionState::Uninitialized.as_str(), "");
        assert_eq!(TransitionState::PlayerReady.to_string(), "playerready");
        assert_eq!(TransitionState::Error.to_string(), "error");
    }
}
