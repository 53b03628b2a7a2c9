//! Retrying HTTP client
//!
//! Executes one logical request with resilience to transient failure:
//! bounded jittered exponential backoff, a fixed retry budget, and an
//! offline short-circuit that skips I/O entirely while the device has no
//! connectivity. The final outcome (success, rejection, offline, or error)
//! is always encoded in the returned [`CallResult`]; `call` never raises.

use crate::error::NetError;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{CallResult, Request};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry attempts after the first, for a maximum of 5 total attempts
pub const MAX_REQUEST_RETRIES: u32 = 4;

/// Default base for the jittered backoff envelope
pub const RETRY_DELAY_BASE: Duration = Duration::from_secs(5);

/// Default connect timeout per attempt
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default read timeout per attempt
pub const READ_TIMEOUT: Duration = Duration::from_secs(20);

/// Answers whether the device currently has network connectivity. Consulted
/// before every attempt; must be cheap and must not itself do network I/O.
pub trait ConnectivityOracle: Send + Sync {
    fn is_online(&self) -> bool;
}

/// A [`ConnectivityOracle`] that always reports online, for hosts without
/// connectivity signals
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysOnline;

impl ConnectivityOracle for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Configuration for [`HttpClient`]
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Retry attempts allowed after the first
    pub max_retries: u32,
    /// Base delay for the backoff envelope; production default is 5 s,
    /// tests override it to keep runs fast
    pub backoff_base: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_REQUEST_RETRIES,
            backoff_base: RETRY_DELAY_BASE,
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
        }
    }
}

/// Small HTTP client with gzip request bodies, per-request jittered
/// exponential backoff, and an offline short-circuit.
///
/// `call` may sleep through backoff and block on socket I/O, so it runs on
/// the async runtime; callers on a latency-sensitive thread should spawn it
/// (see [`BeaconClient`](crate::BeaconClient)).
pub struct HttpClient {
    transport: Arc<dyn HttpTransport>,
    connectivity: Arc<dyn ConnectivityOracle>,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a client backed by a real network transport
    pub fn new(
        connectivity: Arc<dyn ConnectivityOracle>,
        config: HttpClientConfig,
    ) -> Result<Self, NetError> {
        let transport = Arc::new(ReqwestTransport::new(
            config.connect_timeout,
            config.read_timeout,
        )?);
        Ok(Self::with_transport(transport, connectivity, config))
    }

    /// Create a client with an injected transport
    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        connectivity: Arc<dyn ConnectivityOracle>,
        config: HttpClientConfig,
    ) -> Self {
        Self {
            transport,
            connectivity,
            config,
        }
    }

    /// Send the request, suspending for I/O and backoff as needed.
    ///
    /// Retryable outcomes are: the device was offline for the attempt, the
    /// attempt failed in transport, or the response status was 5xx. Anything
    /// else, including 4xx rejections, is terminal and returned
    /// immediately. `retries` on the result counts the retry attempts
    /// consumed: 0 when the first attempt was final.
    pub async fn call(&self, request: &Request) -> CallResult {
        let mut retries: u32 = 0;
        loop {
            if retries > 0 {
                let delay = self.backoff_delay(retries);
                debug!(retries, delay_ms = delay.as_millis() as u64, "backing off");
                tokio::time::sleep(delay).await;
            }

            let result = if !self.connectivity.is_online() {
                debug!(retries, "device offline, skipping attempt");
                CallResult {
                    offline_for_call: true,
                    retries,
                    ..CallResult::default()
                }
            } else {
                match self.transport.perform(request).await {
                    Ok(response) => CallResult {
                        response: Some(response),
                        retries,
                        ..CallResult::default()
                    },
                    Err(error) => CallResult {
                        error: Some(error),
                        retries,
                        ..CallResult::default()
                    },
                }
            };

            let retryable = result.offline_for_call
                || result.error.is_some()
                || result
                    .response
                    .as_ref()
                    .map(|r| (500..=599).contains(&r.status.code))
                    .unwrap_or(false);

            if !retryable || retries >= self.config.max_retries {
                if !result.successful() {
                    warn!(
                        url = %request.url,
                        retries = result.retries,
                        offline = result.offline_for_call,
                        status = result.response.as_ref().map(|r| r.status.code),
                        "request did not succeed"
                    );
                }
                return result;
            }
            retries += 1;
        }
    }

    /// Random delay within an envelope that doubles per retry:
    /// `base * (1 + U(0,1) * 2^(retries-1))`
    fn backoff_delay(&self, retries: u32) -> Duration {
        let factor = 2f64.powi(retries as i32 - 1) * rand::random::<f64>();
        self.config.backoff_base.mul_f64(1.0 + factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_constants() {
        let config = HttpClientConfig::default();
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.backoff_base, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.read_timeout, Duration::from_secs(20));
    }

    #[test]
    fn backoff_envelope_grows_with_retries() {
        let client = HttpClient::with_transport(
            Arc::new(NeverTransport),
            Arc::new(AlwaysOnline),
            HttpClientConfig {
                backoff_base: Duration::from_millis(100),
                ..HttpClientConfig::default()
            },
        );

        for retries in 1..=4 {
            let envelope_max =
                Duration::from_millis(100).mul_f64(1.0 + 2f64.powi(retries as i32 - 1));
            for _ in 0..50 {
                let delay = client.backoff_delay(retries);
                assert!(delay >= Duration::from_millis(100));
                assert!(delay <= envelope_max);
            }
        }
    }

    struct NeverTransport;

    #[async_trait::async_trait]
    impl HttpTransport for NeverTransport {
        async fn perform(&self, _request: &Request) -> Result<crate::Response, NetError> {
            unreachable!("not used by these tests")
        }
    }
}
