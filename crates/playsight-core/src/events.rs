//! Playback lifecycle events
//!
//! The collector reduces raw player callbacks into this canonical event
//! stream. Events are handed to an [`EventDispatcher`], which owns batching
//! and delivery; dispatch failures are never surfaced back to the collector.

use serde::{Deserialize, Serialize};

/// A canonical playback lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// Intent to play (user pressed play, autoplay fired)
    Play,

    /// Playback actually progressing
    Playing,

    /// Playback paused
    Pause,

    /// Seek started
    Seeking,

    /// Seek resolved
    Seeked,

    /// Buffering began after playback had already started
    RebufferStart,

    /// Post-playback buffering ended
    RebufferEnd,

    /// End of the media was reached
    Ended,

    /// Generic progress/bookkeeping update with no dedicated event
    TimeUpdate,

    /// The active rendition changed (ABR switch or manual selection)
    RenditionChange {
        bitrate: u64,
        frame_rate: f32,
        width: u32,
        height: u32,
    },

    /// A player-reported error, forwarded as telemetry
    InternalError { code: i32, message: String },
}

impl PlaybackEvent {
    /// Stable type tag, used for logging and per-type counting
    pub fn event_type(&self) -> &'static str {
        match self {
            PlaybackEvent::Play => "play",
            PlaybackEvent::Playing => "playing",
            PlaybackEvent::Pause => "pause",
            PlaybackEvent::Seeking => "seeking",
            PlaybackEvent::Seeked => "seeked",
            PlaybackEvent::RebufferStart => "rebufferstart",
            PlaybackEvent::RebufferEnd => "rebufferend",
            PlaybackEvent::Ended => "ended",
            PlaybackEvent::TimeUpdate => "timeupdate",
            PlaybackEvent::RenditionChange { .. } => "renditionchange",
            PlaybackEvent::InternalError { .. } => "internalerror",
        }
    }
}

/// Receives events emitted by a [`StateCollector`](crate::StateCollector).
///
/// Implementations batch events into beacons and forward them to the delivery
/// layer. `dispatch` must not block the caller: the collector runs on the
/// player's callback thread.
pub trait EventDispatcher: Send + Sync {
    fn dispatch(&self, event: PlaybackEvent);
}

/// Receives aggregate stats that aren't lifecycle events
pub trait StatsSink: Send + Sync {
    /// Called with the new running total whenever dropped frames accumulate,
    /// and with 0 when the counter resets
    fn set_dropped_frames(&self, total: u64);
}

/// A [`StatsSink`] that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStatsSink;

impl StatsSink for NoopStatsSink {
    fn set_dropped_frames(&self, _total: u64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_string(&PlaybackEvent::Play).unwrap();
        assert_eq!(json, r#"{"event":"play"}"#);

        let json = serde_json::to_string(&PlaybackEvent::RenditionChange {
            bitrate: 2_500_000,
            frame_rate: 29.97,
            width: 1280,
            height: 720,
        })
        .unwrap();
        assert!(json.contains(r#""event":"rendition_change""#));
        assert!(json.contains(r#""bitrate":2500000"#));
    }

    #[test]
    fn event_type_tags() {
        assert_eq!(PlaybackEvent::RebufferStart.event_type(), "rebufferstart");
        assert_eq!(
            PlaybackEvent::InternalError {
                code: -1,
                message: "?".into()
            }
            .event_type(),
            "internalerror"
        );
    }
}
