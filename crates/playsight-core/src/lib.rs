//! Playsight Core - playback state collection for QoE analytics
//!
//! This crate provides the player-facing half of the Playsight SDK:
//! - Canonical playback state tracking from raw player callbacks
//! - Ordered lifecycle event emission through an injected dispatcher
//! - Per-view event counters and dropped-frame accounting
//! - Background playback-position polling with weak player references
//!
//! Player adapters call [`StateCollector`] methods as the player reports
//! state changes; the collector absorbs out-of-order and duplicate callbacks
//! and emits a well-formed [`PlaybackEvent`] stream. Event batching and
//! delivery live in `playsight-net`.

pub mod collector;
pub mod error;
pub mod events;
pub mod types;
pub mod watcher;

pub use collector::StateCollector;
pub use error::{PlayerError, ERROR_DRM, ERROR_IO, ERROR_UNKNOWN};
pub use events::{EventDispatcher, NoopStatsSink, PlaybackEvent, StatsSink};
pub use types::{CollectorConfig, PlayerState, VideoData, ViewId, TIME_UNKNOWN};
pub use watcher::{PlayerWatcher, WatcherGuard};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
