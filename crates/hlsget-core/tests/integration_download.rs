//! Integration tests: full runs through libcurl against a local HTTP server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::segment_server::SegmentServer;
use hlsget_core::progress::ProgressCounters;
use hlsget_core::{DownloadError, DownloaderBuilder};
use tempfile::tempdir;

fn segment_body(i: usize) -> Vec<u8> {
    // Distinct, non-trivial payloads so ordering mistakes show up in the output.
    (0..1024u32).map(|b| (b as usize * 7 + i) as u8).collect()
}

/// Publishes a VOD playlist at `/v/index.m3u8` whose entries are relative
/// `seg<i>.ts` references.
fn publish(server: &SegmentServer, count: usize) -> Vec<u8> {
    let mut manifest = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:4\n");
    let mut expected = Vec::new();
    for i in 0..count {
        manifest.push_str(&format!("#EXTINF:4.000,\nseg{i}.ts\n"));
        let body = segment_body(i);
        expected.extend_from_slice(&body);
        server.route(&format!("/v/seg{i}.ts"), body);
    }
    manifest.push_str("#EXT-X-ENDLIST\n");
    server.route("/v/index.m3u8", manifest);
    expected
}

#[test]
fn download_completes_and_output_matches() {
    let server = SegmentServer::start();
    let expected = publish(&server, 12);
    let root = tempdir().unwrap();
    let progress = Arc::new(ProgressCounters::new());

    let report = DownloaderBuilder::new(server.url("/v/index.m3u8?token=abc"))
        .download_root(root.path().join("Download"))
        .output_dir(root.path().join("Complete"))
        .threads(4)
        .progress(progress.clone())
        .build()
        .unwrap()
        .run()
        .expect("run");

    assert_eq!(report.save_name, "index.m3u8.ts");
    assert_eq!(report.total_segments, 12);
    assert_eq!(report.fetched, 12);
    let content = std::fs::read(root.path().join("Complete").join("index.m3u8.ts")).unwrap();
    assert_eq!(content, expected, "output must be segments in playlist order");
    assert!(!root.path().join("Download").join("index.m3u8.ts").exists());
    assert_eq!(progress.snapshot().segments_done, 12);
    assert_eq!(server.hits("/v/index.m3u8"), 1);
    for i in 0..12 {
        assert_eq!(server.hits(&format!("/v/seg{i}.ts")), 1);
    }
}

#[test]
fn default_headers_point_at_the_target_host() {
    let server = SegmentServer::start();
    publish(&server, 1);
    let root = tempdir().unwrap();

    DownloaderBuilder::new(server.url("/v/index.m3u8"))
        .download_root(root.path().join("Download"))
        .output_dir(root.path().join("Complete"))
        .build()
        .unwrap()
        .run()
        .expect("run");

    let origin = server.url("");
    for request in server.requests() {
        assert_eq!(request.headers.get("origin"), Some(&origin));
        assert_eq!(request.headers.get("referer"), Some(&origin));
        let ua = request.headers.get("user-agent").expect("user-agent");
        assert!(ua.contains("Mozilla/5.0"), "browser-like UA, got {ua}");
    }
}

#[test]
fn missing_segment_exhausts_then_resume_finishes() {
    let server = SegmentServer::start();
    let expected = publish(&server, 5);
    server.unroute("/v/seg3.ts");
    let root = tempdir().unwrap();
    let build = || {
        DownloaderBuilder::new(server.url("/v/index.m3u8"))
            .save_name("episode.ts")
            .download_root(root.path().join("Download"))
            .output_dir(root.path().join("Complete"))
            .threads(2)
            .max_retry(1)
            .manifest_backoff(Duration::ZERO)
            .build()
            .unwrap()
    };

    match build().run() {
        Err(DownloadError::RetryExhausted { attempts, missing }) => {
            assert_eq!(attempts, 2);
            assert_eq!(missing, 1);
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
    assert_eq!(server.hits("/v/seg3.ts"), 2);
    assert!(!root.path().join("Complete").join("episode.ts").exists());

    server.route("/v/seg3.ts", segment_body(3));
    let report = build().run().expect("resume");
    assert_eq!(report.reused, 4);
    assert_eq!(report.fetched, 1);
    for i in [0, 1, 2, 4] {
        assert_eq!(server.hits(&format!("/v/seg{i}.ts")), 1, "seg{i} fetched once overall");
    }
    let content = std::fs::read(root.path().join("Complete").join("episode.ts")).unwrap();
    assert_eq!(content, expected);
}

#[test]
fn unreachable_manifest_fails_after_retries() {
    let server = SegmentServer::start();
    let root = tempdir().unwrap();
    let err = DownloaderBuilder::new(server.url("/nowhere/index.m3u8"))
        .download_root(root.path().join("Download"))
        .output_dir(root.path().join("Complete"))
        .max_retry(2)
        .manifest_backoff(Duration::from_millis(10))
        .build()
        .unwrap()
        .run()
        .unwrap_err();
    match err {
        DownloadError::ManifestFetchFailed { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected ManifestFetchFailed, got {other:?}"),
    }
    assert_eq!(server.hits("/nowhere/index.m3u8"), 3);
}
