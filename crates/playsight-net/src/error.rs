//! Error types for playsight-net

use thiserror::Error;

/// Failures inside the delivery client.
///
/// These never cross [`HttpClient::call`](crate::HttpClient::call) as a
/// `Result`: the final attempt's error is carried inside the returned
/// [`CallResult`](crate::CallResult) instead. Telemetry delivery is
/// best-effort and must not raise into the host application.
#[derive(Error, Debug, Clone)]
pub enum NetError {
    /// Connection, TLS, read, or write failure during an attempt
    #[error("transport error: {0}")]
    Transport(String),

    /// The attempt exceeded its connect or read timeout
    #[error("request timed out")]
    Timeout,

    /// Request body compression or response body decompression failed
    #[error("codec error: {0}")]
    Codec(String),
}
