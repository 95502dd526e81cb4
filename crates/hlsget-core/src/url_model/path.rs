//! Default save name from the manifest URL.

use super::sanitize::sanitize_save_name;

/// Fallback when the manifest URL has no usable last path segment.
const FALLBACK_STEM: &str = "download";

/// Last non-empty path segment of `url`, ignoring query and fragment.
/// `None` if the URL does not parse or its path is root.
pub fn last_path_segment(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

/// Save name used when the caller gives none: the manifest's file name with
/// `.<extension>` appended (`index.m3u8` → `index.m3u8.ts`).
pub fn default_save_name(manifest_url: &str, extension: &str) -> String {
    let stem = last_path_segment(manifest_url)
        .map(|s| sanitize_save_name(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string());
    format!("{stem}.{extension}")
}
