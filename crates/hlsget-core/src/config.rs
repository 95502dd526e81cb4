use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::http::{BrowserRequestBuilder, CurlOptions, DEFAULT_USER_AGENT};
use crate::playlist::SelectionMode;
use crate::segment::{DEFAULT_EXTENSION, DEFAULT_INDEX_WIDTH};
use crate::url_model::ResolutionMode;

/// Request and transfer settings (optional `[http]` table in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Overrides the built-in browser user agent.
    pub user_agent: Option<String>,
    /// Send `origin`/`referer`/`host` derived from each request URL.
    pub origin_headers: bool,
    pub connect_timeout_secs: u64,
    /// Abort a transfer slower than this many bytes/s for `low_speed_time_secs`.
    pub low_speed_limit_bytes: u32,
    pub low_speed_time_secs: u64,
    pub timeout_secs: u64,
    /// Extra headers sent with every request (cookies, tokens).
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let curl = CurlOptions::default();
        Self {
            user_agent: None,
            origin_headers: true,
            connect_timeout_secs: curl.connect_timeout.as_secs(),
            low_speed_limit_bytes: curl.low_speed_limit,
            low_speed_time_secs: curl.low_speed_time.as_secs(),
            timeout_secs: curl.timeout.as_secs(),
            headers: BTreeMap::new(),
        }
    }
}

impl HttpConfig {
    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            low_speed_limit: self.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(self.low_speed_time_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            ..CurlOptions::default()
        }
    }

    pub fn request_builder(&self) -> BrowserRequestBuilder {
        BrowserRequestBuilder {
            user_agent: self
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            origin_headers: self.origin_headers,
            extra_headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Segment file naming (optional `[naming]` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Zero-padded index digits; caps a playlist at `10^width - 1` segments.
    pub width: usize,
    pub extension: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_INDEX_WIDTH,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/hlsget/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HlsgetConfig {
    /// Concurrent segment downloads.
    pub threads: usize,
    /// Extra attempts after the first, for the manifest and for the segment loop.
    pub max_retry: u32,
    /// Segment files live in `<download_dir>/<save name>/`.
    pub download_dir: PathBuf,
    /// Merged output goes to `<output_dir>/<save name>`.
    pub output_dir: PathBuf,
    /// Remove the segment directory after a successful merge.
    pub clear_debris: bool,
    pub manifest_backoff_secs: u64,
    /// Which manifest lines are segments: "non-comment" or "http".
    pub selection: SelectionMode,
    /// How relative segment references become URLs: "directory" or "join".
    pub resolution: ResolutionMode,
    // Tables must come after plain values for TOML serialization.
    pub http: Option<HttpConfig>,
    pub naming: Option<NamingConfig>,
}

impl Default for HlsgetConfig {
    fn default() -> Self {
        Self {
            threads: 16,
            max_retry: crate::retry::DEFAULT_MAX_RETRY,
            download_dir: PathBuf::from("./Download"),
            output_dir: PathBuf::from("./Complete"),
            clear_debris: true,
            manifest_backoff_secs: crate::retry::DEFAULT_MANIFEST_BACKOFF.as_secs(),
            selection: SelectionMode::default(),
            resolution: ResolutionMode::default(),
            http: None,
            naming: None,
        }
    }
}

impl HlsgetConfig {
    pub fn manifest_backoff(&self) -> Duration {
        Duration::from_secs(self.manifest_backoff_secs)
    }

    /// `[http]` table or its defaults.
    pub fn http_or_default(&self) -> HttpConfig {
        self.http.clone().unwrap_or_default()
    }

    pub fn naming_or_default(&self) -> NamingConfig {
        self.naming.clone().unwrap_or_default()
    }

    /// Pretty TOML, as written to a fresh config file.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hlsget")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HlsgetConfig> {
    load_or_init_at(&config_path()?)
}

/// Same as [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<HlsgetConfig> {
    if !path.exists() {
        let default_cfg = HlsgetConfig::default();
        let toml = default_cfg.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(path, toml).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let cfg: HlsgetConfig =
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}
