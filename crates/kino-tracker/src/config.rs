//! Tracker configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Integration identity reported alongside every session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Reported as `player_software_name`
    pub player_software_name: String,
    /// Reported as `player_software_version`
    pub player_software_version: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            player_software_name: "Kino Player".to_string(),
            player_software_version: crate::VERSION.to_string(),
        }
    }
}

impl TrackerConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TrackerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.player_software_name.trim().is_empty() {
            return Err(Error::InvalidConfig("player_software_name is empty".into()));
        }
        if self.player_software_version.trim().is_empty() {
            return Err(Error::InvalidConfig("player_software_version is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.player_software_name, "Kino Player");
        assert_eq!(config.player_software_version, crate::VERSION);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = TrackerConfig::from_json_str(r#"{"player_software_name": "Kiosk"}"#).unwrap();
        assert_eq!(config.player_software_name, "Kiosk");
        assert_eq!(config.player_software_version, crate::VERSION);
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = TrackerConfig::from_json_str(r#"{"player_software_name": " "}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
