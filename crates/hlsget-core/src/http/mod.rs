//! HTTP plumbing: request construction and transport, both pluggable.
//!
//! `RequestBuilder` decides *what* is sent (URL, headers); `HttpClient`
//! decides *how* (libcurl by default). Sites with anti-crawler checks usually
//! only need a different builder.

mod client;
mod request;

pub use client::{CurlClient, CurlOptions};
pub use request::{BrowserRequestBuilder, RequestBuilder, DEFAULT_USER_AGENT};

use crate::error::FetchError;

/// A GET request ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    /// Header name/value pairs, sent in order.
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u32,
    pub body: Vec<u8>,
}

/// Performs one GET and buffers the body. Implementations must be shareable
/// across worker threads.
pub trait HttpClient: Send + Sync {
    fn get(&self, request: &Request) -> Result<Response, FetchError>;
}

/// Builds the request for `url`, sends it, and returns the body if the
/// status is exactly 200.
pub fn fetch_ok(
    client: &dyn HttpClient,
    requests: &dyn RequestBuilder,
    url: &str,
) -> Result<Vec<u8>, FetchError> {
    let request = requests.build(url)?;
    let response = client.get(&request)?;
    if response.status != 200 {
        return Err(FetchError::Http(response.status));
    }
    Ok(response.body)
}
