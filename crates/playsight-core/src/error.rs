//! Error types for playsight-core

use thiserror::Error;

/// Error code reported when a player error has no more specific category
pub const ERROR_UNKNOWN: i32 = -1;
/// Error code for DRM and license failures
pub const ERROR_DRM: i32 = -2;
/// Error code for I/O failures reported by the player
pub const ERROR_IO: i32 = -3;

/// A fatal or non-fatal error reported by the player framework.
///
/// These are not errors raised by the collector itself; the collector never
/// errors. They are forwarded through
/// [`StateCollector::internal_error`](crate::StateCollector::internal_error)
/// as [`PlaybackEvent::InternalError`](crate::PlaybackEvent::InternalError)
/// and do not change playback state.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// An error with a player-assigned code
    #[error("player error {code}: {message}")]
    Player { code: i32, message: String },

    /// DRM or license acquisition failure
    #[error("drm error: {0}")]
    Drm(String),

    /// I/O failure during playback (source read, network, etc)
    #[error("io error: {0}")]
    Io(String),

    /// Anything the player reported that doesn't fit another category
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl PlayerError {
    /// The numeric error code sent to the backend
    pub fn code(&self) -> i32 {
        match self {
            PlayerError::Player { code, .. } => *code,
            PlayerError::Drm(_) => ERROR_DRM,
            PlayerError::Io(_) => ERROR_IO,
            PlayerError::Unknown(_) => ERROR_UNKNOWN,
        }
    }
}

impl From<std::io::Error> for PlayerError {
    fn from(e: std::io::Error) -> Self {
        PlayerError::Io(e.to_string())
    }
}
