//! Save-name sanitization.

// Linux NAME_MAX; leaves room for the `.part` suffix used while writing.
const MAX_NAME_BYTES: usize = 250;

/// Makes a caller- or URL-supplied name safe as a single path component.
///
/// Percent-escapes are decoded first, then path separators, control
/// characters and whitespace runs collapse into one `_`. Leading and trailing
/// dots, spaces and underscores are stripped so the result can never be `.`,
/// `..` or hidden. May return an empty string; callers pick a fallback.
pub fn sanitize_save_name(raw: &str) -> String {
    let decoded = percent_decode(raw);

    let mut out = String::with_capacity(decoded.len());
    for c in decoded.chars() {
        let unsafe_char = matches!(c, '/' | '\\' | '\0') || c.is_control() || c.is_whitespace();
        if unsafe_char {
            if !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.push(c);
        }
    }

    let mut name = out
        .trim_matches(|c: char| c == '.' || c == '_' || c == ' ')
        .to_string();
    if name.len() > MAX_NAME_BYTES {
        let mut cut = MAX_NAME_BYTES;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    name
}

/// Decodes `%XX` escapes only; `+` and `&` stay literal.
fn percent_decode(raw: &str) -> String {
    let escaped = raw.replace('+', "%2B").replace('&', "%26");
    url::form_urlencoded::parse(format!("n={escaped}").as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| raw.to_string())
}
