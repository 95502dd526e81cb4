//! Fetch-and-write of one segment.

use std::sync::Arc;

use crate::error::{DownloadError, FetchError};
use crate::http::{fetch_ok, HttpClient, RequestBuilder};
use crate::progress::ProgressSink;
use crate::segment::Segment;
use crate::storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// File already on disk with content; no request issued.
    Skipped,
    Fetched { bytes: u64 },
}

/// Shared by every worker of an attempt.
#[derive(Clone)]
pub struct SegmentFetcher {
    client: Arc<dyn HttpClient>,
    requests: Arc<dyn RequestBuilder>,
    progress: Arc<dyn ProgressSink>,
}

impl SegmentFetcher {
    pub fn new(
        client: Arc<dyn HttpClient>,
        requests: Arc<dyn RequestBuilder>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            client,
            requests,
            progress,
        }
    }

    /// Downloads `segment` unless its file is already complete. On failure the
    /// target path is left as it was.
    pub fn fetch(&self, segment: &Segment) -> Result<FetchOutcome, DownloadError> {
        if storage::is_complete(&segment.local_path) {
            return Ok(FetchOutcome::Skipped);
        }
        let fail = |source: FetchError| DownloadError::SegmentFetchFailed {
            index: segment.index,
            url: segment.resolved_url.clone(),
            source,
        };
        let body = fetch_ok(self.client.as_ref(), self.requests.as_ref(), &segment.resolved_url)
            .map_err(fail)?;
        if body.is_empty() {
            return Err(fail(FetchError::EmptyBody));
        }
        storage::write_segment(&segment.local_path, &body)
            .map_err(|e| fail(FetchError::Storage(e)))?;
        let bytes = body.len() as u64;
        tracing::trace!(index = segment.index, bytes, "segment written");
        self.progress.on_segment_completed(bytes);
        Ok(FetchOutcome::Fetched { bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{BrowserRequestBuilder, Request, Response};
    use crate::progress::ProgressCounters;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        status: u32,
        empty: bool,
        calls: AtomicUsize,
    }

    impl HttpClient for Fixed {
        fn get(&self, request: &Request) -> Result<Response, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = if self.empty {
                Vec::new()
            } else {
                request.url.as_bytes().to_vec()
            };
            Ok(Response {
                status: self.status,
                body,
            })
        }
    }

    fn setup(status: u32) -> (Arc<Fixed>, Arc<ProgressCounters>, SegmentFetcher) {
        setup_with(status, false)
    }

    fn setup_with(
        status: u32,
        empty: bool,
    ) -> (Arc<Fixed>, Arc<ProgressCounters>, SegmentFetcher) {
        let client = Arc::new(Fixed {
            status,
            empty,
            calls: AtomicUsize::new(0),
        });
        let progress = Arc::new(ProgressCounters::new());
        let fetcher = SegmentFetcher::new(
            client.clone(),
            Arc::new(BrowserRequestBuilder::default()),
            progress.clone(),
        );
        (client, progress, fetcher)
    }

    fn segment(dir: &std::path::Path, index: usize) -> Segment {
        Segment {
            index,
            reference: format!("{index:03}.ts"),
            resolved_url: format!("http://cdn.example.com/v/{index:03}.ts"),
            local_path: dir.join(format!("{index:05}.ts")),
        }
    }

    #[test]
    fn fetches_and_reports_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let (client, progress, fetcher) = setup(200);
        let seg = segment(dir.path(), 4);
        let outcome = fetcher.fetch(&seg).unwrap();
        let expected = seg.resolved_url.len() as u64;
        assert_eq!(outcome, FetchOutcome::Fetched { bytes: expected });
        assert_eq!(std::fs::read(&seg.local_path).unwrap(), seg.resolved_url.as_bytes());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(progress.snapshot().bytes_done, expected);
    }

    #[test]
    fn existing_file_skips_request() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _, fetcher) = setup(200);
        let seg = segment(dir.path(), 0);
        std::fs::write(&seg.local_path, b"already").unwrap();
        assert_eq!(fetcher.fetch(&seg).unwrap(), FetchOutcome::Skipped);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read(&seg.local_path).unwrap(), b"already");
    }

    #[test]
    fn empty_file_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _, fetcher) = setup(200);
        let seg = segment(dir.path(), 0);
        std::fs::write(&seg.local_path, b"").unwrap();
        assert!(matches!(fetcher.fetch(&seg).unwrap(), FetchOutcome::Fetched { .. }));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_200_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let (_, progress, fetcher) = setup(404);
        let seg = segment(dir.path(), 2);
        match fetcher.fetch(&seg) {
            Err(DownloadError::SegmentFetchFailed { index, url, source }) => {
                assert_eq!(index, 2);
                assert_eq!(url, seg.resolved_url);
                assert!(matches!(source, FetchError::Http(404)));
            }
            other => panic!("expected SegmentFetchFailed, got {other:?}"),
        }
        assert!(!seg.local_path.exists());
        assert_eq!(progress.snapshot().bytes_done, 0);
    }

    #[test]
    fn empty_200_body_is_failure_not_completion() {
        let dir = tempfile::tempdir().unwrap();
        let (client, progress, fetcher) = setup_with(200, true);
        progress.on_baseline_set(0, 2);
        let seg = segment(dir.path(), 1);
        match fetcher.fetch(&seg) {
            Err(DownloadError::SegmentFetchFailed { index, source, .. }) => {
                assert_eq!(index, 1);
                assert!(matches!(source, FetchError::EmptyBody));
            }
            other => panic!("expected SegmentFetchFailed, got {other:?}"),
        }
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert!(!seg.local_path.exists());
        assert_eq!(progress.snapshot().segments_done, 0);
    }

    #[test]
    fn write_failure_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let (_, _, fetcher) = setup(200);
        let seg = segment(&dir.path().join("gone"), 1);
        assert!(matches!(
            fetcher.fetch(&seg),
            Err(DownloadError::SegmentFetchFailed {
                source: FetchError::Storage(_),
                ..
            })
        ));
    }
}
