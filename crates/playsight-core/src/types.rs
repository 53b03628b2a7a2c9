//! Core types for playback state collection

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Sentinel for unknown times and positions, in milliseconds
pub const TIME_UNKNOWN: i64 = -1;

/// Unique identifier for a view (one continuous playback of one media item)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewId(pub Uuid);

impl ViewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ViewId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Playback state as tracked for QoE metrics.
///
/// A player's own state model may differ from this one; the collector maps
/// player callbacks onto these states. Exactly one state is current at a time,
/// and only collector methods drive transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Init,
    Play,
    Playing,
    Paused,
    Buffering,
    Rebuffering,
    Seeking,
    Seeked,
    PlayingAds,
    FinishedPlayingAds,
    Error,
    Ended,
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PlayerState::Init => "init",
            PlayerState::Play => "play",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Buffering => "buffering",
            PlayerState::Rebuffering => "rebuffering",
            PlayerState::Seeking => "seeking",
            PlayerState::Seeked => "seeked",
            PlayerState::PlayingAds => "playing_ads",
            PlayerState::FinishedPlayingAds => "finished_playing_ads",
            PlayerState::Error => "error",
            PlayerState::Ended => "ended",
        };
        write!(f, "{name}")
    }
}

/// Descriptive metadata for the media item being watched.
///
/// Supplied by the integrating app on `video_change`/`program_change`. The
/// collector treats this as opaque; it is forwarded with beacons downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoData {
    /// Title of the media item, if known
    pub title: Option<String>,
    /// Source URL of the media item, if known
    pub source_url: Option<String>,
    /// Duration of the media item in milliseconds, if known
    pub duration_ms: Option<i64>,
}

/// Configuration for a [`StateCollector`](crate::StateCollector)
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Whether first-frame render times are tracked for startup latency
    pub track_first_frame_rendered: bool,
    /// Settle time after the first frame renders before it counts as rendered.
    /// Player frameworks can report a rendered frame slightly before the
    /// surface actually shows it.
    pub first_frame_wait: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            track_first_frame_rendered: true,
            first_frame_wait: Duration::from_millis(50),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_ids_are_unique() {
        assert_ne!(ViewId::new(), ViewId::new());
    }

    #[test]
    fn player_state_serializes_snake_case() {
        let json = serde_json::to_string(&PlayerState::FinishedPlayingAds).unwrap();
        assert_eq!(json, "\"finished_playing_ads\"");
    }

    #[test]
    fn collector_config_defaults() {
        let config = CollectorConfig::default();
        assert!(config.track_first_frame_rendered);
        assert_eq!(config.first_frame_wait, Duration::from_millis(50));
    }
}
