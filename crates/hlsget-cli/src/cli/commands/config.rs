//! `hlsget config` – show where config lives and what is in effect.

use anyhow::Result;
use hlsget_core::config::{self, HlsgetConfig};
use hlsget_core::logging;

pub fn run_show_config(cfg: &HlsgetConfig) -> Result<()> {
    println!("config: {}", config::config_path()?.display());
    if let Ok(log) = logging::log_file_path() {
        println!("log:    {}", log.display());
    }
    println!();
    print!("{}", cfg.to_toml()?);
    Ok(())
}
