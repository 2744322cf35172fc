//! URL Sanitization
//!
//! Accepts safe schemes, relative URLs, and a narrow set of media data URLs.

/// Schemes that may appear in bound URLs
const SAFE_SCHEMES: &[&str] = &["http:", "https:", "mailto:", "ftp:", "tel:", "file:"];

/// Media types allowed in base64 `data:` URLs
const SAFE_DATA_TYPES: &[&str] = &[
    "image/bmp", "image/gif", "image/jpeg", "image/jpg", "image/png", "image/tiff", "image/webp",
    "video/mpeg", "video/mp4", "video/ogg", "video/webm",
    "audio/mp3", "audio/oga", "audio/ogg", "audio/opus",
];

/// Check whether a URL is safe to bind
pub fn is_safe_url(url: &str) -> bool {
    is_safe_scheme_or_relative(url) || is_safe_data_url(url)
}

fn is_safe_scheme_or_relative(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    if SAFE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return true;
    }
    // Relative URL: no scheme before the first path, query, or fragment delimiter
    match url.find(['&', ':', '/', '?', '#']) {
        None => true,
        Some(pos) => matches!(url.as_bytes()[pos], b'/' | b'?' | b'#'),
    }
}

fn is_safe_data_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    let Some(rest) = lower.strip_prefix("data:") else {
        return false;
    };
    let Some((media_type, payload)) = rest.split_once(";base64,") else {
        return false;
    };
    if !SAFE_DATA_TYPES.contains(&media_type) {
        return false;
    }
    let data = payload.trim_end_matches('=');
    !data.is_empty()
        && data
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

/// Sanitize a URL, prefixing unsafe values so they cannot execute
pub fn sanitize_url(url: &str, unsafe_prefix: &str) -> String {
    if is_safe_url(url) {
        url.to_string()
    } else {
        tracing::warn!("sanitizing unsafe URL value {}", url);
        format!("{}{}", unsafe_prefix, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_urls() {
        assert!(is_safe_url("https://example.com/a?b#c"));
        assert!(is_safe_url("MAILTO:me@example.com"));
        assert!(is_safe_url("/relative/path"));
        assert!(is_safe_url("page.html?x=1"));
        assert!(is_safe_url("#anchor"));
        assert!(is_safe_url("data:image/png;base64,iVBORw0KGgo="));
    }

    #[test]
    fn test_unsafe_urls() {
        assert!(!is_safe_url("javascript:alert(1)"));
        assert!(!is_safe_url("data:text/html;base64,PHNjcmlwdD4="));
        assert!(!is_safe_url("a&b:c"));
        assert_eq!(sanitize_url("javascript:x", "unsafe:"), "unsafe:javascript:x");
    }
}
