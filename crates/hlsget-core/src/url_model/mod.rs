//! URL handling: source validation, segment URL resolution, save names.

mod path;
mod sanitize;

pub use path::{default_save_name, last_path_segment};
pub use sanitize::sanitize_save_name;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::DownloadError;

/// Turns a manifest reference into a fetchable absolute URL.
///
/// Some sites do not follow the playlist format strictly; a custom resolver
/// (or a closure `Fn(&str, &str) -> String`) repairs their references.
pub trait UrlResolver: Send + Sync {
    /// `reference` is the raw manifest line, `manifest_url` the playlist URL.
    fn resolve(&self, reference: &str, manifest_url: &str) -> String;
}

impl<F> UrlResolver for F
where
    F: Fn(&str, &str) -> String + Send + Sync,
{
    fn resolve(&self, reference: &str, manifest_url: &str) -> String {
        self(reference, manifest_url)
    }
}

/// Resolves relative references against the manifest's directory: drop the
/// last path component of the manifest URL and join with `/`. References
/// that already start with `http` pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryResolver;

impl UrlResolver for DirectoryResolver {
    fn resolve(&self, reference: &str, manifest_url: &str) -> String {
        if reference.starts_with("http") {
            return reference.to_string();
        }
        match url::Url::parse(manifest_url) {
            Ok(mut base) => {
                base.set_query(None);
                base.set_fragment(None);
                let path = base.path();
                let dir = match path.rfind('/') {
                    Some(slash) => &path[..slash],
                    None => "",
                };
                let dir = dir.to_string();
                base.set_path(&format!("{dir}/"));
                format!("{}{reference}", base.as_str())
            }
            // Not a URL: plain string surgery.
            Err(_) => {
                let base = match manifest_url.rfind('/') {
                    Some(slash) => &manifest_url[..slash],
                    None => manifest_url,
                };
                format!("{base}/{reference}")
            }
        }
    }
}

/// RFC 3986 reference resolution (`url::Url::join`). Handles host-relative
/// (`/a/b.ts`) and parent (`../b.ts`) references and drops the manifest's
/// query string. Falls back to [`DirectoryResolver`] when the manifest URL
/// does not parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinResolver;

impl UrlResolver for JoinResolver {
    fn resolve(&self, reference: &str, manifest_url: &str) -> String {
        match url::Url::parse(manifest_url).and_then(|base| base.join(reference)) {
            Ok(joined) => joined.into(),
            Err(_) => DirectoryResolver.resolve(reference, manifest_url),
        }
    }
}

/// Built-in resolver choice, as written in config.toml.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMode {
    #[default]
    Directory,
    Join,
}

impl ResolutionMode {
    pub fn resolver(self) -> Arc<dyn UrlResolver> {
        match self {
            ResolutionMode::Directory => Arc::new(DirectoryResolver),
            ResolutionMode::Join => Arc::new(JoinResolver),
        }
    }
}

/// Basic scheme check on the manifest URL: must be `http`/`https` with a host.
pub fn validate_source(source_url: &str) -> Result<url::Url, DownloadError> {
    let invalid = |reason: String| DownloadError::InvalidSource {
        url: source_url.to_string(),
        reason,
    };
    if !source_url.starts_with("http") {
        return Err(invalid("scheme must be http or https".into()));
    }
    let parsed = url::Url::parse(source_url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", parsed.scheme())));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".into()));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://cdn.example.com/v/index.m3u8";

    #[test]
    fn relative_reference_resolves_against_manifest_directory() {
        assert_eq!(
            DirectoryResolver.resolve("001.ts", BASE),
            "http://cdn.example.com/v/001.ts"
        );
        assert_eq!(
            DirectoryResolver.resolve("hd/001.ts", BASE),
            "http://cdn.example.com/v/hd/001.ts"
        );
    }

    #[test]
    fn absolute_reference_unchanged() {
        assert_eq!(
            DirectoryResolver.resolve("http://other.example.com/x.ts", BASE),
            "http://other.example.com/x.ts"
        );
        assert_eq!(
            DirectoryResolver.resolve("https://other.example.com/x.ts?t=1", BASE),
            "https://other.example.com/x.ts?t=1"
        );
    }

    #[test]
    fn signed_manifest_url_keeps_directory() {
        let signed = "https://b.example.com/m3u8/569128.m3u8?sign=4d5618ae";
        assert_eq!(
            DirectoryResolver.resolve("seg-1.ts", signed),
            "https://b.example.com/m3u8/seg-1.ts"
        );
    }

    #[test]
    fn manifest_without_path_keeps_host() {
        assert_eq!(
            DirectoryResolver.resolve("a.ts", "http://cdn.example.com"),
            "http://cdn.example.com/a.ts"
        );
        assert_eq!(
            DirectoryResolver.resolve("a.ts", "http://cdn.example.com:8080/"),
            "http://cdn.example.com:8080/a.ts"
        );
    }

    #[test]
    fn slash_in_query_does_not_move_directory() {
        assert_eq!(
            DirectoryResolver.resolve("a.ts", "http://cdn.example.com/v/index.m3u8?next=/x/y#frag"),
            "http://cdn.example.com/v/a.ts"
        );
    }

    #[test]
    fn join_resolver_handles_host_relative_and_parent() {
        assert_eq!(
            JoinResolver.resolve("/media/001.ts", BASE),
            "http://cdn.example.com/media/001.ts"
        );
        assert_eq!(
            JoinResolver.resolve("../a/001.ts", BASE),
            "http://cdn.example.com/a/001.ts"
        );
        assert_eq!(
            JoinResolver.resolve("001.ts", BASE),
            "http://cdn.example.com/v/001.ts"
        );
    }

    #[test]
    fn closure_resolver() {
        let cdn = |reference: &str, _: &str| format!("https://mirror.example.com/{reference}");
        assert_eq!(cdn.resolve("7.ts", BASE), "https://mirror.example.com/7.ts");
    }

    #[test]
    fn source_validation() {
        assert!(validate_source(BASE).is_ok());
        assert!(validate_source("https://cdn.example.com/a.m3u8").is_ok());
        assert!(matches!(
            validate_source("ftp://cdn.example.com/a.m3u8"),
            Err(DownloadError::InvalidSource { .. })
        ));
        assert!(validate_source("index.m3u8").is_err());
        assert!(validate_source("httpx://cdn.example.com/a.m3u8").is_err());
        assert!(validate_source("http://").is_err());
    }
}
