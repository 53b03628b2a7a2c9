//! Playback state collection
//!
//! Player frameworks deliver callbacks out of order, twice, or in
//! contradictory sequences, especially around startup and seeks. The
//! [`StateCollector`] absorbs those quirks: every public method is total, and
//! anomalous call sequences are suppressed as no-ops rather than surfaced as
//! errors. A telemetry layer must never crash the host app; the worst
//! acceptable outcome is a slightly inaccurate metric.
//!
//! The collector runs synchronously on whichever thread the player invokes it
//! from and performs no I/O. It is not internally synchronized: a single
//! logical callback thread is assumed, except for the dropped-frames counter
//! and the playback position, which are written from background threads and
//! use atomics.

use crate::{
    error::PlayerError,
    events::{EventDispatcher, PlaybackEvent, StatsSink},
    types::{CollectorConfig, PlayerState, VideoData, ViewId, TIME_UNKNOWN},
    watcher::WatcherGuard,
};
use std::sync::{
    atomic::{AtomicI64, AtomicU64, Ordering},
    Arc,
};
use tracing::debug;

/// Collects state-change callbacks from a player binding and reduces them to
/// a canonical stream of [`PlaybackEvent`]s.
///
/// One collector is created per player binding and lives until [`release`]
/// is called. Adapter code calls the transition methods (`play`, `pause`,
/// `buffering`, ...) as the player reports changes; the collector tracks the
/// canonical [`PlayerState`] and emits ordered lifecycle events through the
/// injected [`EventDispatcher`].
///
/// [`release`]: StateCollector::release
pub struct StateCollector {
    dispatcher: Arc<dyn EventDispatcher>,
    stats: Arc<dyn StatsSink>,
    config: CollectorConfig,

    state: PlayerState,
    view_id: ViewId,
    video: VideoData,

    mime_type: Option<String>,
    source_duration_ms: i64,
    position_ms: Arc<AtomicI64>,
    source_advertised_bitrate: u64,
    source_advertised_frame_rate: f32,
    source_width: u32,
    source_height: u32,
    dropped_frames: AtomicU64,

    first_frame_rendered_at: Option<i64>,
    first_frame_received: bool,
    seeking_in_progress: bool,

    play_events_sent: u64,
    pause_events_sent: u64,
    seeking_events_sent: u64,
    seeked_events_sent: u64,
    total_events_sent: u64,

    watcher: Option<WatcherGuard>,
    dead: bool,
}

impl StateCollector {
    /// Create a collector with the default [`CollectorConfig`]
    pub fn new(dispatcher: Arc<dyn EventDispatcher>, stats: Arc<dyn StatsSink>) -> Self {
        Self::with_config(dispatcher, stats, CollectorConfig::default())
    }

    pub fn with_config(
        dispatcher: Arc<dyn EventDispatcher>,
        stats: Arc<dyn StatsSink>,
        config: CollectorConfig,
    ) -> Self {
        Self {
            dispatcher,
            stats,
            config,
            state: PlayerState::Init,
            view_id: ViewId::new(),
            video: VideoData::default(),
            mime_type: None,
            source_duration_ms: TIME_UNKNOWN,
            position_ms: Arc::new(AtomicI64::new(TIME_UNKNOWN)),
            source_advertised_bitrate: 0,
            source_advertised_frame_rate: 0.0,
            source_width: 0,
            source_height: 0,
            dropped_frames: AtomicU64::new(0),
            first_frame_rendered_at: None,
            first_frame_received: false,
            seeking_in_progress: false,
            play_events_sent: 0,
            pause_events_sent: 0,
            seeking_events_sent: 0,
            seeked_events_sent: 0,
            total_events_sent: 0,
            watcher: None,
            dead: false,
        }
    }

    /// Call when the player starts buffering. Buffering after playback began
    /// is reported as rebuffering instead.
    pub fn buffering(&mut self) {
        // Re-entrant: already buffering, rebuffering, settled after a seek,
        // or mid-seek
        let reentrant = matches!(
            self.state,
            PlayerState::Buffering | PlayerState::Rebuffering | PlayerState::Seeked
        );
        if reentrant || self.seeking_in_progress {
            return;
        }

        if self.state == PlayerState::Playing {
            self.rebuffering_started();
        } else {
            self.set_state(PlayerState::Buffering);
            self.dispatch(PlaybackEvent::TimeUpdate);
        }
    }

    /// Call when the caller intends for the video to play, during
    /// initialization and buffering. Distinct from [`playing`], which reports
    /// that playback actually progressed.
    ///
    /// The very first play of a view is always recorded. After that, intent
    /// signals received while the player is recovering from a seek or a
    /// rebuffer are redundant and suppressed.
    ///
    /// [`playing`]: StateCollector::playing
    pub fn play(&mut self) {
        let recovering = self.seeking_in_progress
            || matches!(self.state, PlayerState::Rebuffering | PlayerState::Seeked);
        if self.play_events_sent == 0 || !recovering {
            self.set_state(PlayerState::Play);
            self.dispatch(PlaybackEvent::Play);
        }
    }

    /// Call when playback actually begins or resumes progressing
    pub fn playing(&mut self) {
        if self.seeking_in_progress {
            // The eventual seeked() call resolves this
            debug!("ignoring playing(), seek in progress");
            return;
        }
        if matches!(
            self.state,
            PlayerState::Paused | PlayerState::FinishedPlayingAds
        ) {
            self.play();
        } else if self.state == PlayerState::Rebuffering {
            self.rebuffering_ended();
        } else if self.state == PlayerState::Playing {
            return;
        }
        self.set_state(PlayerState::Playing);
        self.dispatch(PlaybackEvent::Playing);
    }

    /// Call when the player becomes paused.
    ///
    /// Seeked is the state of being paused after a seek, so a pause arriving
    /// in Seeked is suppressed unless it is the view's first. A pause arriving
    /// mid-seek means the caller requested a pause while the player was still
    /// syncing; that resolves the seek instead.
    pub fn pause(&mut self) {
        if self.state == PlayerState::Seeked && self.pause_events_sent > 0 {
            return;
        }
        if self.state == PlayerState::Rebuffering {
            self.rebuffering_ended();
        }
        if self.seeking_in_progress {
            self.seeked();
            return;
        }
        self.set_state(PlayerState::Paused);
        self.dispatch(PlaybackEvent::Pause);
    }

    /// Call when the player starts seeking, or encounters a position
    /// discontinuity. A seek that interrupts playback implicitly pauses, so a
    /// `Pause` is emitted first in that case.
    pub fn seeking(&mut self) {
        if self.play_events_sent == 0 {
            // Some player frameworks report a seek before playback has ever
            // started; those are spurious and would corrupt downstream state
            // handling, so drop them
            debug!("ignoring seeking() before first play");
            return;
        }
        if self.state == PlayerState::Playing {
            self.dispatch(PlaybackEvent::Pause);
        }
        self.set_state(PlayerState::Seeking);
        self.seeking_in_progress = true;
        self.first_frame_rendered_at = None;
        self.dispatch(PlaybackEvent::Seeking);
        self.first_frame_received = false;
    }

    /// Call when the player has stopped seeking. Usually driven by the player
    /// binding, but also called internally when another transition resolves a
    /// pending seek.
    pub fn seeked(&mut self) {
        if self.seeking_in_progress {
            self.dispatch(PlaybackEvent::Seeked);
            self.seeking_in_progress = false;
            self.set_state(PlayerState::Seeked);
        }

        if self.seeking_events_sent == 0 {
            // Out-of-order seeked() with no seeking on record; make sure the
            // flag can't stay wedged
            self.seeking_in_progress = false;
        }
    }

    /// Call when the end of playback was reached
    pub fn ended(&mut self) {
        self.dispatch(PlaybackEvent::Pause);
        self.dispatch(PlaybackEvent::Ended);
        self.set_state(PlayerState::Ended);
    }

    /// Call when an ad begins playing. Bookkeeping only; no event is emitted.
    pub fn playing_ads(&mut self) {
        self.set_state(PlayerState::PlayingAds);
    }

    /// Call when all ads finished playing. Bookkeeping only; a seek that is
    /// still pending stays pending and resolves on the next [`seeked`] or
    /// [`pause`] call.
    ///
    /// [`seeked`]: StateCollector::seeked
    /// [`pause`]: StateCollector::pause
    pub fn finished_playing_ads(&mut self) {
        self.set_state(PlayerState::FinishedPlayingAds);
    }

    /// Call when the active rendition changes (ABR switch or manual selection)
    pub fn rendition_change(&mut self, bitrate: u64, frame_rate: f32, width: u32, height: u32) {
        self.source_advertised_bitrate = bitrate;
        self.source_advertised_frame_rate = frame_rate;
        self.source_width = width;
        self.source_height = height;

        self.dispatch(PlaybackEvent::RenditionChange {
            bitrate,
            frame_rate,
            width,
            height,
        });
    }

    /// Forward a player-reported error as telemetry. Does not change playback
    /// state.
    pub fn internal_error(&mut self, error: &PlayerError) {
        self.dispatch(PlaybackEvent::InternalError {
            code: error.code(),
            message: error.to_string(),
        });
    }

    /// Add `count` to the running dropped-frame total and report the new total
    /// to the stats sink. Safe to call from a background timer thread.
    pub fn increment_dropped_frames(&self, count: u64) {
        let total = self.dropped_frames.fetch_add(count, Ordering::AcqRel) + count;
        self.stats.set_dropped_frames(total);
    }

    /// Call when the player rendered its first video frame
    pub fn on_first_frame_rendered(&mut self) {
        self.first_frame_rendered_at = Some(chrono::Utc::now().timestamp_millis());
        self.first_frame_received = true;
    }

    /// True if the first frame has rendered and settled, or if first-frame
    /// tracking is disabled
    pub fn first_frame_rendered(&self) -> bool {
        if !self.config.track_first_frame_rendered {
            return true;
        }
        let wait_ms = self.config.first_frame_wait.as_millis() as i64;
        self.first_frame_received
            && self
                .first_frame_rendered_at
                .map(|at| chrono::Utc::now().timestamp_millis() - at >= wait_ms)
                .unwrap_or(false)
    }

    /// Call when the media stream (by URL) was changed. Starts a new view.
    pub fn video_change(&mut self, video: VideoData) {
        self.set_state(PlayerState::Init);
        self.reset();
        self.video = video;
    }

    /// Call when the content changed within the same stream (e.g. a program
    /// boundary in a live stream). Starts a new view without reinitializing
    /// playback state.
    pub fn program_change(&mut self, video: VideoData) {
        self.reset();
        self.video = video;
    }

    /// Reset all per-view counters and transient flags, and begin a new view
    pub fn reset(&mut self) {
        self.mime_type = None;
        self.play_events_sent = 0;
        self.pause_events_sent = 0;
        self.seeking_events_sent = 0;
        self.seeked_events_sent = 0;
        self.total_events_sent = 0;
        self.seeking_in_progress = false;
        self.first_frame_received = false;
        self.first_frame_rendered_at = None;
        self.dropped_frames.store(0, Ordering::Release);
        self.stats.set_dropped_frames(0);
        self.view_id = ViewId::new();
        debug!(view_id = %self.view_id, "started new view");
    }

    /// Kill this collector. The position watcher stops, and no further
    /// metrics should be reported. Callers are expected to drop their
    /// references afterward; post-release calls are not hard-rejected.
    pub fn release(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.stop("collector released");
        }
        self.dead = true;
    }

    /// Install a position watcher, stopping any previous one
    pub fn set_watcher(&mut self, watcher: WatcherGuard) {
        if let Some(old) = self.watcher.replace(watcher) {
            old.stop("watcher replaced");
        }
    }

    /// Handle the position watcher writes sampled positions through
    pub fn position_handle(&self) -> Arc<AtomicI64> {
        Arc::clone(&self.position_ms)
    }

    /// True if the player is in a paused-like state
    pub fn is_paused(&self) -> bool {
        matches!(
            self.state,
            PlayerState::Paused | PlayerState::Ended | PlayerState::Error | PlayerState::Init
        )
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn view_id(&self) -> ViewId {
        self.view_id
    }

    pub fn video(&self) -> &VideoData {
        &self.video
    }

    pub fn is_released(&self) -> bool {
        self.dead
    }

    /// Most recent sampled playback position, or [`TIME_UNKNOWN`]
    pub fn playback_position_ms(&self) -> i64 {
        self.position_ms.load(Ordering::Acquire)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Acquire)
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn set_mime_type(&mut self, mime_type: impl Into<String>) {
        self.mime_type = Some(mime_type.into());
    }

    pub fn source_duration_ms(&self) -> i64 {
        self.source_duration_ms
    }

    pub fn set_source_duration_ms(&mut self, duration_ms: i64) {
        self.source_duration_ms = duration_ms;
    }

    pub fn source_advertised_bitrate(&self) -> u64 {
        self.source_advertised_bitrate
    }

    pub fn source_advertised_frame_rate(&self) -> f32 {
        self.source_advertised_frame_rate
    }

    pub fn source_size(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    pub fn play_events_sent(&self) -> u64 {
        self.play_events_sent
    }

    pub fn pause_events_sent(&self) -> u64 {
        self.pause_events_sent
    }

    pub fn seeking_events_sent(&self) -> u64 {
        self.seeking_events_sent
    }

    pub fn seeked_events_sent(&self) -> u64 {
        self.seeked_events_sent
    }

    pub fn total_events_sent(&self) -> u64 {
        self.total_events_sent
    }

    fn rebuffering_started(&mut self) {
        self.set_state(PlayerState::Rebuffering);
        self.dispatch(PlaybackEvent::RebufferStart);
    }

    // Callers are responsible for setting the next state
    fn rebuffering_ended(&mut self) {
        self.dispatch(PlaybackEvent::RebufferEnd);
    }

    fn set_state(&mut self, state: PlayerState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "state transition");
        }
        self.state = state;
    }

    /// All events leave through here so the per-view counters stay accurate
    fn dispatch(&mut self, event: PlaybackEvent) {
        self.total_events_sent += 1;
        match event {
            PlaybackEvent::Play => self.play_events_sent += 1,
            PlaybackEvent::Pause => self.pause_events_sent += 1,
            PlaybackEvent::Seeking => self.seeking_events_sent += 1,
            PlaybackEvent::Seeked => self.seeked_events_sent += 1,
            _ => {}
        }
        self.dispatcher.dispatch(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopStatsSink;
    use std::sync::Mutex;
    use std::time::Duration;

    struct NullDispatcher;

    impl EventDispatcher for NullDispatcher {
        fn dispatch(&self, _event: PlaybackEvent) {}
    }

    struct RecordingSink {
        totals: Mutex<Vec<u64>>,
    }

    impl StatsSink for RecordingSink {
        fn set_dropped_frames(&self, total: u64) {
            self.totals.lock().unwrap().push(total);
        }
    }

    fn collector() -> StateCollector {
        StateCollector::new(Arc::new(NullDispatcher), Arc::new(NoopStatsSink))
    }

    #[test]
    fn starts_in_init() {
        let collector = collector();
        assert_eq!(collector.state(), PlayerState::Init);
        assert!(collector.is_paused());
        assert_eq!(collector.playback_position_ms(), TIME_UNKNOWN);
    }

    #[test]
    fn dropped_frames_accumulate_and_reset() {
        let sink = Arc::new(RecordingSink {
            totals: Mutex::new(Vec::new()),
        });
        let mut collector = StateCollector::new(Arc::new(NullDispatcher), sink.clone());

        collector.increment_dropped_frames(7);
        collector.increment_dropped_frames(5);
        assert_eq!(collector.dropped_frames(), 12);

        collector.reset();
        assert_eq!(collector.dropped_frames(), 0);
        assert_eq!(*sink.totals.lock().unwrap(), vec![7, 12, 0]);
    }

    #[test]
    fn first_frame_tracking_disabled_always_rendered() {
        let config = CollectorConfig {
            track_first_frame_rendered: false,
            ..CollectorConfig::default()
        };
        let collector =
            StateCollector::with_config(Arc::new(NullDispatcher), Arc::new(NoopStatsSink), config);
        assert!(collector.first_frame_rendered());
    }

    #[test]
    fn first_frame_rendered_after_settle() {
        let config = CollectorConfig {
            first_frame_wait: Duration::ZERO,
            ..CollectorConfig::default()
        };
        let mut collector =
            StateCollector::with_config(Arc::new(NullDispatcher), Arc::new(NoopStatsSink), config);

        assert!(!collector.first_frame_rendered());
        collector.on_first_frame_rendered();
        assert!(collector.first_frame_rendered());
    }

    #[test]
    fn seek_clears_first_frame_tracking() {
        let mut collector = collector();
        collector.play();
        collector.on_first_frame_rendered();
        collector.seeking();
        assert!(!collector.first_frame_rendered());
    }

    #[test]
    fn video_change_starts_new_view() {
        let mut collector = collector();
        collector.play();
        collector.playing();
        let old_view = collector.view_id();

        collector.video_change(VideoData {
            title: Some("next".into()),
            ..VideoData::default()
        });

        assert_eq!(collector.state(), PlayerState::Init);
        assert_ne!(collector.view_id(), old_view);
        assert_eq!(collector.play_events_sent(), 0);
        assert_eq!(collector.total_events_sent(), 0);
        assert_eq!(collector.video().title.as_deref(), Some("next"));
    }

    #[test]
    fn release_marks_dead() {
        let mut collector = collector();
        collector.release();
        assert!(collector.is_released());
    }
}
