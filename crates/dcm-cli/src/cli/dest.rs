//! Destination filename resolution for downloaded URLs.

const FALLBACK_NAME: &str = "download.bin";

/// Best-effort filename for a URL: the last path segment, sanitized for use
/// on Linux, or `download.bin` when the URL has no usable path.
pub fn filename_for_url(url: &str) -> String {
    let segment = url::Url::parse(url).ok().and_then(|parsed| {
        parsed
            .path_segments()?
            .filter(|s| !s.is_empty())
            .last()
            .map(str::to_string)
    });
    match segment.as_deref() {
        Some(".") | Some("..") | None => FALLBACK_NAME.to_string(),
        Some(name) => {
            let sanitized = sanitize(name);
            if sanitized.is_empty() {
                FALLBACK_NAME.to_string()
            } else {
                sanitized
            }
        }
    }
}

/// Replaces NUL, separators, and control characters with `_`, trims leading
/// and trailing dots/spaces, and caps the length at NAME_MAX bytes.
fn sanitize(name: &str) -> String {
    const NAME_MAX: usize = 255;

    let cleaned: String = name
        .chars()
        .map(|c| {
            if c == '\0' || c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == ' ' || c == '.');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}
