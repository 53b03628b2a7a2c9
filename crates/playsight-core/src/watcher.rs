//! Background playback-position polling
//!
//! Telemetry needs the playback position more often than players report it,
//! so a [`PlayerWatcher`] samples it on a repeating interval from a background
//! task. The watcher holds only a weak reference to the player: if the
//! integrating app drops the player without releasing the SDK, the watcher
//! notices the reference is gone and stops itself instead of pinning the
//! player in memory or erroring.

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc, Weak,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Polls a player for its playback position on a fixed interval.
///
/// The sampled position is written through the shared atomic handle obtained
/// from [`StateCollector::position_handle`], which is the collector's only
/// write path that crosses threads.
///
/// The poll closure returns the player's current position in milliseconds, or
/// `None` if position info is no longer available; returning `None` stops
/// the watcher, on the assumption that the caller has torn the player down.
///
/// [`StateCollector::position_handle`]: crate::StateCollector::position_handle
pub struct PlayerWatcher<P: Send + Sync + 'static> {
    interval: Duration,
    player: Weak<P>,
    position: Arc<AtomicI64>,
    check_position: Box<dyn Fn(&P) -> Option<i64> + Send + Sync>,
}

impl<P: Send + Sync + 'static> PlayerWatcher<P> {
    pub fn new(
        interval: Duration,
        player: &Arc<P>,
        position: Arc<AtomicI64>,
        check_position: impl Fn(&P) -> Option<i64> + Send + Sync + 'static,
    ) -> Self {
        Self {
            interval,
            player: Arc::downgrade(player),
            position,
            check_position: Box::new(check_position),
        }
    }

    /// Spawn the polling task. The returned guard stops it.
    pub fn start(self) -> WatcherGuard {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                let Some(player) = self.player.upgrade() else {
                    // Player was dropped; the caller cleaned up without
                    // releasing us
                    debug!("position watcher: player lost, stopping");
                    break;
                };
                match (self.check_position)(&player) {
                    Some(position) => self.position.store(position, Ordering::Release),
                    None => {
                        debug!("position watcher: position unavailable, stopping");
                        break;
                    }
                }
            }
        });
        WatcherGuard { task }
    }
}

/// Handle to a running [`PlayerWatcher`] task
pub struct WatcherGuard {
    task: JoinHandle<()>,
}

impl WatcherGuard {
    /// Stop the watcher. Idempotent; safe to call after the task stopped
    /// itself.
    pub fn stop(&self, reason: &str) {
        debug!(reason, "stopping position watcher");
        self.task.abort();
    }

    /// True once the polling task has exited, whether stopped or self-stopped
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakePlayer {
        position: Mutex<i64>,
    }

    impl FakePlayer {
        fn position(&self) -> i64 {
            *self.position.lock().unwrap()
        }
    }

    #[tokio::test]
    async fn samples_position_on_interval() {
        let player = Arc::new(FakePlayer {
            position: Mutex::new(1234),
        });
        let position = Arc::new(AtomicI64::new(-1));

        let watcher = PlayerWatcher::new(
            Duration::from_millis(5),
            &player,
            Arc::clone(&position),
            |p| Some(p.position()),
        );
        let guard = watcher.start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(position.load(Ordering::Acquire), 1234);

        *player.position.lock().unwrap() = 5678;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(position.load(Ordering::Acquire), 5678);

        guard.stop("test over");
    }

    #[tokio::test]
    async fn stops_when_player_dropped() {
        let player = Arc::new(FakePlayer {
            position: Mutex::new(0),
        });
        let position = Arc::new(AtomicI64::new(-1));

        let watcher = PlayerWatcher::new(
            Duration::from_millis(5),
            &player,
            Arc::clone(&position),
            |p| Some(p.position()),
        );
        let guard = watcher.start();

        drop(player);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(guard.is_finished());
    }

    #[tokio::test]
    async fn stops_when_position_unavailable() {
        let player = Arc::new(FakePlayer {
            position: Mutex::new(0),
        });
        let position = Arc::new(AtomicI64::new(-1));

        let watcher = PlayerWatcher::new(
            Duration::from_millis(5),
            &player,
            Arc::clone(&position),
            |_| None,
        );
        let guard = watcher.start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(guard.is_finished());
        // keep the player alive for the whole test
        drop(player);
    }
}
