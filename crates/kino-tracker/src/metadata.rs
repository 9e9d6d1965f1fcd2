//! Metadata maps attached to analytics events
//!
//! Keys are open-ended; values are restricted to JSON scalars.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// String-keyed metadata forwarded with every dispatched event
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A single metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl MetadataValue {
    /// Numeric view of the value, if it is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Int(v) => Some(*v as f64),
            MetadataValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataValue::Bool(v) => write!(f, "{}", v),
            MetadataValue::Int(v) => write!(f, "{}", v),
            MetadataValue::Float(v) => write!(f, "{}", v),
            MetadataValue::String(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Bool(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Int(v)
    }
}

impl From<u32> for MetadataValue {
    fn from(v: u32) -> Self {
        MetadataValue::Int(i64::from(v))
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::String(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::String(v.to_string())
    }
}

/// Well-known metadata keys
pub mod keys {
    pub const PLAYER_SOFTWARE_NAME: &str = "player_software_name";
    pub const PLAYER_SOFTWARE_VERSION: &str = "player_software_version";
    pub const VIEWER_TIMESTAMP: &str = "viewer_timestamp";
    pub const PLAYER_ERROR_CODE: &str = "player_error_code";
    pub const PLAYER_ERROR_MESSAGE: &str = "player_error_message";
    pub const VIDEO_SOURCE_WIDTH: &str = "video_source_width";
    pub const VIDEO_SOURCE_HEIGHT: &str = "video_source_height";
    pub const PLAYER_WIDTH: &str = "player_width";
    pub const PLAYER_HEIGHT: &str = "player_height";
    pub const PLAYER_IS_PAUSED: &str = "player_is_paused";
    pub const PLAYER_AUTOPLAY_ON: &str = "player_autoplay_on";
    pub const VIDEO_SOURCE_DURATION: &str = "video_source_duration";
    pub const VIDEO_SOURCE_URL: &str = "video_source_url";
    pub const VIDEO_SOURCE_ADVERTISED_BITRATE: &str = "video_source_advertised_bitrate";
}
