//! Endpoint URL resolution.

use percent_encoding::utf8_percent_encode;

use crate::query::COMPONENT;

/// Join `host` and `path` with exactly one `/` between them.
pub fn resolve_url(host: &str, path: &str) -> String {
    let host = host.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return host.to_string();
    }
    format!("{host}/{path}")
}

/// Percent-encode every segment of `path`, keeping the `/` separators.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, COMPONENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_with_single_separator() {
        assert_eq!(
            resolve_url("https://api-v3.findify.io", "/autocomplete"),
            "https://api-v3.findify.io/autocomplete"
        );
        assert_eq!(
            resolve_url("https://api-v3.findify.io/", "autocomplete"),
            "https://api-v3.findify.io/autocomplete"
        );
        assert_eq!(
            resolve_url("https://api-v3.findify.io//", "//autocomplete"),
            "https://api-v3.findify.io/autocomplete"
        );
    }

    #[test]
    fn keeps_host_path_prefix() {
        assert_eq!(
            resolve_url("http://localhost:3000/v3/", "/search"),
            "http://localhost:3000/v3/search"
        );
    }

    #[test]
    fn encode_path_escapes_segments_only() {
        assert_eq!(encode_path("summer sale"), "summer%20sale");
        assert_eq!(encode_path("collections/été"), "collections/%C3%A9t%C3%A9");
        assert_eq!(encode_path("a?b#c"), "a%3Fb%23c");
    }

    #[test]
    fn empty_path_returns_host() {
        assert_eq!(resolve_url("http://localhost:3000/", ""), "http://localhost:3000");
    }
}
