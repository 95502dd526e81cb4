//! CLI for the hlsget playlist downloader.

mod commands;
mod progress;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use hlsget_core::config::{self, HlsgetConfig};
use hlsget_core::playlist::SelectionMode;
use hlsget_core::url_model::ResolutionMode;
use std::path::PathBuf;

use commands::{run_batch, run_get, run_show_config};

/// Top-level CLI for hlsget.
#[derive(Debug, Parser)]
#[command(name = "hlsget")]
#[command(about = "hlsget: resumable segmented HLS playlist downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one playlist and merge its segments into a single file.
    Get {
        /// Playlist (m3u8) URL.
        url: String,

        /// Output file name (default: playlist file name + ".ts").
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        #[command(flatten)]
        opts: DownloadArgs,
    },

    /// Download every playlist listed in a file, one after another.
    ///
    /// One URL per line, optionally followed by whitespace and an output
    /// name. Blank lines and lines starting with '#' are ignored.
    Batch {
        /// Path to the list file.
        file: PathBuf,

        #[command(flatten)]
        opts: DownloadArgs,
    },

    /// Show the config file path and the effective configuration.
    Config,
}

/// Per-run overrides of config.toml.
#[derive(Debug, Clone, Default, Args)]
pub struct DownloadArgs {
    /// Root directory for segment files.
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Directory for merged output files.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Concurrent segment downloads.
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Extra attempts after the first.
    #[arg(long, value_name = "N")]
    pub max_retry: Option<u32>,

    /// Keep segment files after a successful merge.
    #[arg(long)]
    pub keep_debris: bool,

    /// Only lines starting with "http" are segments.
    #[arg(long)]
    pub http_only: bool,

    /// Resolve relative segment references with standard URL joining
    /// (handles "/abs/path.ts" and "../x.ts").
    #[arg(long)]
    pub join_urls: bool,

    /// Do not send origin/referer/host derived from the request URL.
    #[arg(long)]
    pub no_origin_headers: bool,

    /// Extra request header, e.g. "Cookie: a=b" (repeatable).
    #[arg(long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Do not draw the progress line.
    #[arg(long)]
    pub no_progress: bool,
}

impl DownloadArgs {
    /// `cfg` with these flags applied on top.
    pub fn apply(&self, cfg: &HlsgetConfig) -> HlsgetConfig {
        let mut out = cfg.clone();
        if let Some(dir) = &self.download_dir {
            out.download_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            out.output_dir = dir.clone();
        }
        if let Some(threads) = self.threads {
            out.threads = threads;
        }
        if let Some(max_retry) = self.max_retry {
            out.max_retry = max_retry;
        }
        if self.keep_debris {
            out.clear_debris = false;
        }
        if self.http_only {
            out.selection = SelectionMode::Http;
        }
        if self.join_urls {
            out.resolution = ResolutionMode::Join;
        }
        if self.no_origin_headers || !self.headers.is_empty() {
            let mut http = out.http_or_default();
            if self.no_origin_headers {
                http.origin_headers = false;
            }
            http.headers.extend(self.headers.iter().cloned());
            out.http = Some(http);
        }
        out
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected \"NAME: VALUE\", got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(format!("invalid header name in {raw:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get { url, name, opts } => {
                run_get(&opts.apply(&cfg), url, name, !opts.no_progress).await?
            }
            CliCommand::Batch { file, opts } => {
                run_batch(&opts.apply(&cfg), &file, !opts.no_progress).await?
            }
            CliCommand::Config => run_show_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
