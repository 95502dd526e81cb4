//! `hlsget batch` – download a list of playlists sequentially.

use anyhow::{Context, Result};
use hlsget_core::config::HlsgetConfig;
use std::path::Path;

use super::{download_one, is_aborted, print_report};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub url: String,
    pub name: Option<String>,
}

/// One entry per line: URL, then an optional name (rest of the line).
pub fn parse_batch(text: &str) -> Vec<BatchEntry> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut parts = line.splitn(2, char::is_whitespace);
            let url = parts.next()?.to_string();
            let name = parts
                .next()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string);
            Some(BatchEntry { url, name })
        })
        .collect()
}

pub async fn run_batch(cfg: &HlsgetConfig, file: &Path, show_progress: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let entries = parse_batch(&text);
    if entries.is_empty() {
        println!("No playlists in {}.", file.display());
        return Ok(());
    }

    let total = entries.len();
    let mut failed = 0usize;
    for (n, entry) in entries.into_iter().enumerate() {
        println!("[{}/{}] {}", n + 1, total, entry.url);
        match download_one(cfg, &entry.url, entry.name, show_progress).await {
            Ok(report) => print_report(&report),
            Err(err) if is_aborted(&err) => {
                tracing::warn!("batch interrupted at entry {}", n + 1);
                return Err(err);
            }
            Err(err) => {
                failed += 1;
                tracing::error!(url = %entry.url, "batch entry failed: {:#}", err);
                eprintln!("  failed: {:#}", err);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {total} download(s) failed");
    }
    Ok(())
}
