//! HTTP transport seam
//!
//! [`HttpClient`](crate::HttpClient) talks to the network through the
//! [`HttpTransport`] trait so retry behavior can be tested against scripted
//! transports. Production uses [`ReqwestTransport`].

use crate::error::NetError;
use crate::types::{Headers, Method, Request, Response, StatusLine};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Executes a single HTTP attempt. Implementations own the connection for
/// exactly that attempt and release it on every exit path; connections are
/// never reused across retries of the same logical call.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn perform(&self, request: &Request) -> Result<Response, NetError>;
}

/// [`HttpTransport`] backed by a reqwest client with explicit connect and
/// read timeouts
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Result<Self, NetError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()
            .map_err(|e| NetError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn perform(&self, request: &Request) -> Result<Response, NetError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post => self.client.post(request.url.clone()),
        };

        for (name, values) in &request.headers {
            for value in values {
                builder = builder.header(name, value);
            }
        }
        if let Some(content_type) = &request.content_type {
            if !content_type.is_empty() {
                builder = builder.header("Content-Type", content_type);
            }
        }
        if let Some(body) = request.encoded_body()? {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = StatusLine {
            code: response.status().as_u16(),
            message: response
                .status()
                .canonical_reason()
                .unwrap_or_default()
                .to_string(),
        };
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        debug!(
            method = %request.method,
            url = %request.url,
            status = status.code,
            bytes = body.len(),
            "http attempt completed"
        );

        Ok(Response {
            status,
            headers,
            body: (!body.is_empty()).then_some(body),
        })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> NetError {
    if error.is_timeout() {
        NetError::Timeout
    } else {
        NetError::Transport(error.to_string())
    }
}
