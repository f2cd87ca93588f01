//! Small URL helpers shared by the RPC clients and the scraper

use std::borrow::Cow;

/// Prefix `http://` when `host` carries no scheme
///
/// ```
/// use tvlinker::utils::ensure_scheme;
///
/// assert_eq!(ensure_scheme("localhost"), "http://localhost");
/// assert_eq!(ensure_scheme("https://nas.local"), "https://nas.local");
/// ```
pub fn ensure_scheme(host: &str) -> Cow<'_, str> {
    if host.contains("://") {
        Cow::Borrowed(host)
    } else {
        Cow::Owned(format!("http://{host}"))
    }
}

/// Resolve `href` against `base`, leaving it untouched when either cannot be parsed
pub fn absolutize(base: &str, href: &str) -> String {
    url::Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolutize_joins_relative_and_keeps_absolute() {
        assert_eq!(
            absolutize("https://tv.example/page/2", "/show-s01e01"),
            "https://tv.example/show-s01e01"
        );
        assert_eq!(
            absolutize("https://tv.example/page/2", "https://other.example/x"),
            "https://other.example/x"
        );
        assert_eq!(absolutize("not-a-base", "/x"), "/x");
    }
}
