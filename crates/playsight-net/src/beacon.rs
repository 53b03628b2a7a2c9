//! Beacon delivery
//!
//! The dispatcher layer hands finished beacon payloads to a [`BeaconClient`],
//! which runs each delivery as a background task so the caller's thread never
//! waits on backoff or socket I/O. Delivery is best-effort: a beacon that
//! exhausts its retry budget is dropped, and only the completion callback
//! (when requested) learns about it.

use crate::client::HttpClient;
use crate::types::{beacon_authority, Headers, Request};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

/// Fixed path beacons are POSTed to, for backend compatibility
pub const BEACON_PATH: &str = "android";

/// Completion callback for [`BeaconClient::post_with_completion`]: receives
/// whether the delivery succeeded and the response headers, if any
pub type Completion = Box<dyn FnOnce(bool, Option<Headers>) + Send>;

/// Ships beacons through an [`HttpClient`] on background tasks
pub struct BeaconClient {
    http: Arc<HttpClient>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl BeaconClient {
    /// Must be created within a tokio runtime; deliveries spawn onto it
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Fire-and-forget GET
    pub fn get(&self, url: Url) {
        let http = Arc::clone(&self.http);
        self.spawn(async move {
            http.call(&Request::get(url, Headers::new())).await;
        });
    }

    /// Fire-and-forget JSON POST
    pub fn post(&self, url: Url, body: serde_json::Value, headers: Headers) {
        let http = Arc::clone(&self.http);
        self.spawn(async move {
            http.call(&Request::post_json(url, headers, &body)).await;
        });
    }

    /// POST a beacon payload to the per-customer endpoint and report the
    /// outcome through `completion` once delivery resolves.
    ///
    /// The endpoint is `https://{authority}/android`, where the authority
    /// comes from [`beacon_authority`]. A missing env key completes
    /// `(false, None)` without any I/O.
    pub fn post_with_completion(
        &self,
        domain: &str,
        env_key: Option<&str>,
        body: String,
        headers: Headers,
        completion: Completion,
    ) {
        let Some(env_key) = env_key else {
            warn!("no env key supplied, dropping beacon");
            completion(false, None);
            return;
        };

        let authority = beacon_authority(env_key, domain);
        let url = match Url::parse(&format!("https://{authority}/{BEACON_PATH}")) {
            Ok(url) => url,
            Err(e) => {
                warn!(authority, error = %e, "could not build beacon url");
                completion(false, None);
                return;
            }
        };

        let request = Request::post_string(url, headers, &body);
        let http = Arc::clone(&self.http);
        self.spawn(async move {
            let result = http.call(&request).await;
            debug!(
                successful = result.successful(),
                retries = result.retries,
                "beacon delivery resolved"
            );
            let successful = result.successful();
            let headers = result.response.map(|r| r.headers);
            completion(successful, headers);
        });
    }

    /// Abort all outstanding deliveries, unwinding pending backoff sleeps and
    /// in-flight requests. Not needed in normal operation.
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().expect("beacon task list poisoned");
        debug!(outstanding = tasks.len(), "shutting down beacon client");
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    fn spawn(&self, delivery: impl std::future::Future<Output = ()> + Send + 'static) {
        let mut tasks = self.tasks.lock().expect("beacon task list poisoned");
        tasks.retain(|task| !task.is_finished());
        tasks.push(tokio::spawn(delivery));
    }
}
