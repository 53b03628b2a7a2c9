//! Request, response, and call-result values
//!
//! These are the abstract HTTP values the delivery client works in terms of.
//! The client does not know what is inside a beacon payload, and callers do
//! not see transport details beyond the final [`CallResult`].

use crate::error::NetError;
use crate::gzip::{gzip, un_gzip};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Header multimap. HTTP allows repeated header names, so values are ordered
/// lists.
pub type Headers = HashMap<String, Vec<String>>;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// An HTTP request, owned by the caller and consumed by the client.
///
/// Use the constructors for the common shapes: [`get`], raw-bytes [`post`],
/// [`post_string`], [`post_json`], and URL-encoded [`post_form`].
///
/// [`get`]: Request::get
/// [`post`]: Request::post
/// [`post_string`]: Request::post_string
/// [`post_json`]: Request::post_json
/// [`post_form`]: Request::post_form
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: url::Url,
    pub headers: Headers,
    pub content_type: Option<String>,
    pub body: Option<Bytes>,
}

impl Request {
    pub fn get(url: url::Url, headers: Headers) -> Self {
        Self {
            method: Method::Get,
            url,
            headers,
            content_type: None,
            body: None,
        }
    }

    pub fn post(
        url: url::Url,
        headers: Headers,
        content_type: Option<String>,
        body: Option<Bytes>,
    ) -> Self {
        Self {
            method: Method::Post,
            url,
            headers,
            content_type,
            body,
        }
    }

    /// POST a UTF-8 string body. The default content type is JSON, matching
    /// how beacon payloads are sent.
    pub fn post_string(url: url::Url, headers: Headers, body: &str) -> Self {
        Self::post(
            url,
            headers,
            Some("application/json".to_string()),
            Some(Bytes::copy_from_slice(body.as_bytes())),
        )
    }

    /// POST a JSON value
    pub fn post_json(url: url::Url, headers: Headers, body: &serde_json::Value) -> Self {
        Self::post(
            url,
            headers,
            Some("application/json".to_string()),
            Some(Bytes::from(body.to_string())),
        )
    }

    /// POST URL-encoded form params in the given order
    pub fn post_form(url: url::Url, headers: Headers, params: &[(&str, &str)]) -> Self {
        let body = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        Self::post(
            url,
            headers,
            Some("application/x-www-form-urlencoded".to_string()),
            Some(Bytes::from(body)),
        )
    }

    /// True if the request headers declare a gzip body encoding
    pub fn content_encoding_is_gzip(&self) -> bool {
        self.headers
            .get("Content-Encoding")
            .and_then(|values| values.last())
            .map(|value| value == "gzip")
            .unwrap_or(false)
    }

    /// The body bytes to put on the wire: gzip-compressed when the headers
    /// declare `Content-Encoding: gzip`, otherwise the body as-is. Computed
    /// fresh from the original body on every call, so retries never see a
    /// doubly-encoded body.
    pub fn encoded_body(&self) -> Result<Option<Bytes>, NetError> {
        match &self.body {
            Some(body) if self.content_encoding_is_gzip() => {
                let zipped = gzip(body).map_err(|e| NetError::Codec(e.to_string()))?;
                Ok(Some(Bytes::from(zipped)))
            }
            other => Ok(other.clone()),
        }
    }
}

/// HTTP status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub code: u16,
    pub message: String,
}

/// A response from an HTTP attempt
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusLine,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

impl Response {
    /// True if the status code is 2xx
    pub fn successful(&self) -> bool {
        (200..=299).contains(&self.status.code)
    }

    fn content_encoding(&self) -> Option<&str> {
        self.headers
            .get("Content-Encoding")
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Decode the body as a string: gunzip first if the response declares
    /// gzip encoding, then decode as UTF-8. Encoding names that aren't
    /// charsets (like `gzip` itself) fall back to UTF-8.
    pub fn body_as_string(&self) -> Result<Option<String>, NetError> {
        let Some(body) = &self.body else {
            return Ok(None);
        };
        let expanded = if self.content_encoding() == Some("gzip") {
            un_gzip(body).map_err(|e| NetError::Codec(e.to_string()))?
        } else {
            body.to_vec()
        };
        Ok(Some(String::from_utf8_lossy(&expanded).into_owned()))
    }

    /// Parse the body as JSON. Doesn't care whether the response has a JSON
    /// MIME type.
    pub fn body_as_json(&self) -> Result<Option<serde_json::Value>, NetError> {
        self.body_as_string()?
            .map(|text| serde_json::from_str(&text).map_err(|e| NetError::Codec(e.to_string())))
            .transpose()
    }
}

/// The final outcome of one logical [`call`](crate::HttpClient::call):
/// produced once, after all internal retries are exhausted or a terminal
/// outcome occurs.
///
/// Exactly one of `response`, `error`, or `offline_for_call` explains the
/// outcome.
#[derive(Debug, Clone, Default)]
pub struct CallResult {
    /// The response from the final attempt, if one completed
    pub response: Option<Response>,
    /// The error from the final attempt, if it failed in transport
    pub error: Option<NetError>,
    /// True if the device was offline for the final attempt
    pub offline_for_call: bool,
    /// Retry attempts consumed; 0 if the first attempt was final
    pub retries: u32,
}

impl CallResult {
    /// True iff no error occurred, the device was online, and the response
    /// status is 2xx
    pub fn successful(&self) -> bool {
        self.error.is_none()
            && !self.offline_for_call
            && self.response.as_ref().map(Response::successful).unwrap_or(false)
    }
}

/// Authority for POSTing beacons to the backend, routing to per-customer
/// subdomains. Must match the backend's expectations exactly.
///
/// A domain that doesn't start with `.` is used as-is. Otherwise the env key
/// is prepended when it looks like a key (lowercase alphanumeric), and the
/// generic `img` subdomain is used when it doesn't.
pub fn beacon_authority(env_key: &str, domain: &str) -> String {
    if !domain.starts_with('.') {
        domain.to_string()
    } else if !env_key.is_empty()
        && env_key
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    {
        format!("{env_key}{domain}")
    } else {
        format!("img{domain}")
    }
}
