//! Request construction strategies.

use super::Request;
use crate::error::FetchError;

/// Browser-like user agent; some origins refuse obvious non-browser clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

/// Builds the GET request for a URL.
pub trait RequestBuilder: Send + Sync {
    fn build(&self, url: &str) -> Result<Request, FetchError>;
}

impl<F> RequestBuilder for F
where
    F: Fn(&str) -> Result<Request, FetchError> + Send + Sync,
{
    fn build(&self, url: &str) -> Result<Request, FetchError> {
        self(url)
    }
}

/// Default builder: browser user agent, plus `origin`/`referer`/`host`
/// pointing at the target's own `scheme://host` when `origin_headers` is on.
#[derive(Debug, Clone)]
pub struct BrowserRequestBuilder {
    pub user_agent: String,
    pub origin_headers: bool,
    /// Sent after the generated headers (e.g. cookies, tokens).
    pub extra_headers: Vec<(String, String)>,
}

impl Default for BrowserRequestBuilder {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            origin_headers: true,
            extra_headers: Vec::new(),
        }
    }
}

impl RequestBuilder for BrowserRequestBuilder {
    fn build(&self, url: &str) -> Result<Request, FetchError> {
        let parsed =
            url::Url::parse(url).map_err(|e| FetchError::InvalidRequest(format!("{url}: {e}")))?;
        let mut request = Request::get(url);

        if self.origin_headers {
            let host = parsed
                .host_str()
                .ok_or_else(|| FetchError::InvalidRequest(format!("{url}: missing host")))?;
            let authority = match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            let origin = format!("{}://{}", parsed.scheme(), authority);
            request.headers.push(("Origin".into(), origin.clone()));
            request.headers.push(("Referer".into(), origin));
            request.headers.push(("Host".into(), authority));
        }
        request
            .headers
            .push(("User-Agent".into(), self.user_agent.clone()));
        request.headers.extend(self.extra_headers.iter().cloned());
        Ok(request)
    }
}
