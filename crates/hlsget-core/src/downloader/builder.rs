//! Construction of a [`Downloader`] with validated settings.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::pool::WorkerPool;
use super::Downloader;
use crate::config::HlsgetConfig;
use crate::control::AbortToken;
use crate::error::DownloadError;
use crate::http::{BrowserRequestBuilder, CurlClient, HttpClient, RequestBuilder};
use crate::playlist::{NonCommentLines, SegmentSelector};
use crate::progress::{NoopProgress, ProgressSink};
use crate::retry::{RetryPolicy, DEFAULT_MANIFEST_BACKOFF, DEFAULT_MAX_RETRY};
use crate::segment::{SegmentNaming, DEFAULT_EXTENSION, DEFAULT_INDEX_WIDTH};
use crate::url_model::{default_save_name, sanitize_save_name, DirectoryResolver, UrlResolver};

pub const DEFAULT_THREADS: usize = 16;

/// Every setting has a default except the manifest URL.
pub struct DownloaderBuilder {
    source_url: String,
    save_name: Option<String>,
    download_root: PathBuf,
    output_dir: PathBuf,
    threads: usize,
    max_retry: u32,
    manifest_backoff: Duration,
    clear_debris: bool,
    index_width: usize,
    extension: String,
    selector: Arc<dyn SegmentSelector>,
    resolver: Arc<dyn UrlResolver>,
    requests: Arc<dyn RequestBuilder>,
    client: Arc<dyn HttpClient>,
    progress: Arc<dyn ProgressSink>,
    abort: AbortToken,
}

impl DownloaderBuilder {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into().trim().to_string(),
            save_name: None,
            download_root: PathBuf::from("./Download"),
            output_dir: PathBuf::from("./Complete"),
            threads: DEFAULT_THREADS,
            max_retry: DEFAULT_MAX_RETRY,
            manifest_backoff: DEFAULT_MANIFEST_BACKOFF,
            clear_debris: true,
            index_width: DEFAULT_INDEX_WIDTH,
            extension: DEFAULT_EXTENSION.to_string(),
            selector: Arc::new(NonCommentLines),
            resolver: Arc::new(DirectoryResolver),
            requests: Arc::new(BrowserRequestBuilder::default()),
            client: Arc::new(CurlClient::default()),
            progress: Arc::new(NoopProgress),
            abort: AbortToken::new(),
        }
    }

    /// Applies every setting carried by `cfg`. Later setters still override.
    pub fn config(mut self, cfg: &HlsgetConfig) -> Self {
        let http = cfg.http_or_default();
        let naming = cfg.naming_or_default();
        self.download_root = cfg.download_dir.clone();
        self.output_dir = cfg.output_dir.clone();
        self.threads = cfg.threads;
        self.max_retry = cfg.max_retry;
        self.manifest_backoff = cfg.manifest_backoff();
        self.clear_debris = cfg.clear_debris;
        self.index_width = naming.width;
        self.extension = naming.extension;
        self.selector = cfg.selection.selector();
        self.resolver = cfg.resolution.resolver();
        self.requests = Arc::new(http.request_builder());
        self.client = Arc::new(CurlClient::new(http.curl_options()));
        self
    }

    /// File name of the merged output and of the segment directory.
    pub fn save_name(mut self, name: impl Into<String>) -> Self {
        self.save_name = Some(name.into());
        self
    }

    pub fn download_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_root = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry;
        self
    }

    pub fn manifest_backoff(mut self, backoff: Duration) -> Self {
        self.manifest_backoff = backoff;
        self
    }

    pub fn clear_debris(mut self, clear: bool) -> Self {
        self.clear_debris = clear;
        self
    }

    pub fn naming(mut self, width: usize, extension: impl Into<String>) -> Self {
        self.index_width = width;
        self.extension = extension.into();
        self
    }

    pub fn selector(mut self, selector: impl SegmentSelector + 'static) -> Self {
        self.selector = Arc::new(selector);
        self
    }

    pub fn resolver(mut self, resolver: impl UrlResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn request_builder(mut self, requests: impl RequestBuilder + 'static) -> Self {
        self.requests = Arc::new(requests);
        self
    }

    pub fn http_client(mut self, client: impl HttpClient + 'static) -> Self {
        self.client = Arc::new(client);
        self
    }

    /// Shared client, e.g. one the caller also inspects.
    pub fn http_client_arc(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = client;
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn abort_token(mut self, abort: AbortToken) -> Self {
        self.abort = abort;
        self
    }

    pub fn build(self) -> Result<Downloader, DownloadError> {
        if self.source_url.is_empty() {
            return Err(DownloadError::InvalidConfig("manifest url is empty".into()));
        }
        let pool = WorkerPool::new(self.threads)?;
        let naming = SegmentNaming::new(self.index_width, self.extension)?;
        let save_name = match self.save_name {
            Some(name) => {
                let clean = sanitize_save_name(&name);
                if clean.is_empty() {
                    return Err(DownloadError::InvalidConfig(format!(
                        "save name {name:?} is empty after sanitizing"
                    )));
                }
                clean
            }
            None => default_save_name(&self.source_url, naming.extension()),
        };
        let download_dir = self.download_root.join(&save_name);
        let output_path = self.output_dir.join(&save_name);

        Ok(Downloader {
            source_url: self.source_url,
            save_name,
            download_dir,
            output_dir: self.output_dir,
            output_path,
            pool,
            manifest_retry: RetryPolicy::new(self.max_retry, self.manifest_backoff),
            clear_debris: self.clear_debris,
            naming,
            selector: self.selector,
            resolver: self.resolver,
            requests: self.requests,
            client: self.client,
            progress: self.progress,
            abort: self.abort,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn defaults_follow_manifest_name() {
        let d = DownloaderBuilder::new("https://cdn.example.com/m3u8/569128.m3u8?sign=x")
            .build()
            .unwrap();
        assert_eq!(d.save_name(), "569128.m3u8.ts");
        assert_eq!(d.download_dir(), Path::new("./Download/569128.m3u8.ts"));
        assert_eq!(d.output_path(), Path::new("./Complete/569128.m3u8.ts"));
        assert_eq!(d.max_attempts(), 6);
        assert_eq!(d.concurrency_limit(), 16);
    }

    #[test]
    fn explicit_name_is_sanitized() {
        let d = DownloaderBuilder::new("https://cdn.example.com/index.m3u8")
            .save_name("../show/ep1.ts")
            .download_root("/tmp/dl")
            .build()
            .unwrap();
        assert!(!d.save_name().contains('/'));
        assert!(d.download_dir().starts_with("/tmp/dl"));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let url = "https://cdn.example.com/index.m3u8";
        assert!(matches!(
            DownloaderBuilder::new(url).threads(0).build(),
            Err(DownloadError::InvalidConfig(_))
        ));
        assert!(matches!(
            DownloaderBuilder::new(url).naming(0, "ts").build(),
            Err(DownloadError::InvalidConfig(_))
        ));
        assert!(matches!(
            DownloaderBuilder::new(url).naming(5, "").build(),
            Err(DownloadError::InvalidConfig(_))
        ));
        assert!(matches!(
            DownloaderBuilder::new("  ").build(),
            Err(DownloadError::InvalidConfig(_))
        ));
        assert!(matches!(
            DownloaderBuilder::new(url).save_name("///").build(),
            Err(DownloadError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_then_override() {
        let mut cfg = HlsgetConfig::default();
        cfg.threads = 3;
        cfg.max_retry = 1;
        cfg.download_dir = PathBuf::from("/var/tmp/segments");
        let d = DownloaderBuilder::new("https://cdn.example.com/a/b.m3u8")
            .config(&cfg)
            .threads(7)
            .build()
            .unwrap();
        assert_eq!(d.concurrency_limit(), 7);
        assert_eq!(d.max_attempts(), 2);
        assert_eq!(d.download_dir(), Path::new("/var/tmp/segments/b.m3u8.ts"));
    }
}
