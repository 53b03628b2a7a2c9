//! Playsight Net - resilient beacon delivery
//!
//! This crate provides the delivery half of the Playsight SDK:
//! - Abstract Request/Response/CallResult values
//! - A retrying HTTP client with jittered exponential backoff
//! - An offline short-circuit driven by an injected connectivity oracle
//! - Gzip request/response body handling
//! - Beacon endpoint routing and fire-and-forget background delivery
//!
//! Failures never cross the client's boundary as errors: every call resolves
//! to a [`CallResult`] describing what happened, and the caller decides what
//! a failed delivery means (usually nothing; telemetry is best-effort).

pub mod beacon;
pub mod client;
pub mod error;
pub mod gzip;
pub mod transport;
pub mod types;

pub use beacon::{BeaconClient, Completion, BEACON_PATH};
pub use client::{
    AlwaysOnline, ConnectivityOracle, HttpClient, HttpClientConfig, CONNECT_TIMEOUT,
    MAX_REQUEST_RETRIES, READ_TIMEOUT, RETRY_DELAY_BASE,
};
pub use error::NetError;
pub use gzip::{gzip, un_gzip};
pub use transport::{HttpTransport, ReqwestTransport};
pub use types::{beacon_authority, CallResult, Headers, Method, Request, Response, StatusLine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
