//! `hlsget get` – download one playlist.

use anyhow::Result;
use hlsget_core::config::HlsgetConfig;

use super::{download_one, print_report};

pub async fn run_get(
    cfg: &HlsgetConfig,
    url: String,
    name: Option<String>,
    show_progress: bool,
) -> Result<()> {
    let report = download_one(cfg, &url, name, show_progress).await?;
    print_report(&report);
    Ok(())
}
