//! Progress line: polls the shared counters and redraws stderr.

use hlsget_core::progress::{ProgressCounters, ProgressStats};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Redraws until the run signals finish, then ends the line.
pub fn spawn_ticker(counters: Arc<ProgressCounters>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PROGRESS_INTERVAL);
        loop {
            interval.tick().await;
            let stats = counters.snapshot();
            if stats.segment_count > 0 {
                let mut err = std::io::stderr().lock();
                let _ = write!(err, "\r{}", render(&stats));
                let _ = err.flush();
            }
            if stats.finished {
                break;
            }
        }
        eprintln!();
    })
}

pub fn render(stats: &ProgressStats) -> String {
    let eta = stats
        .eta_secs()
        .map(format_secs)
        .unwrap_or_else(|| "?".to_string());
    format!(
        "  {}/{} segments ({:.1}%)  {:.1} MiB  {:.2} MiB/s  ETA {}  attempt {}  ",
        stats.segments_done,
        stats.segment_count,
        stats.fraction() * 100.0,
        stats.bytes_done as f64 / 1_048_576.0,
        stats.bytes_per_sec() / 1_048_576.0,
        eta,
        stats.attempts.max(1)
    )
}

fn format_secs(secs: f64) -> String {
    let secs = secs.round() as u64;
    if secs >= 3600 {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}
