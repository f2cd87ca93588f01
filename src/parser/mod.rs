//! Listing and detail page parsing
//!
//! Parsing runs through an ordered chain of [`ParseStrategy`] implementations.
//! The default chain tries the HTML5 tree builder first ([`DomStrategy`]) and
//! falls back to a byte-level markup scan ([`MarkupScanStrategy`]) for pages
//! the tree builder cannot take, such as bodies that are not valid UTF-8.
//! Both strategies read the same structural markers, so a page that parses
//! with either yields the same rows.
//!
//! # Listing markers
//!
//! Every `<table class="posts_table">` is one release. The cells of its first
//! row hold, in order: the format anchor (`TV-720p`), the title anchor whose
//! `href` is the detail page, and the publication date.
//!
//! # Detail markers
//!
//! Download options are `<h2 style="text-align: center;">` blocks inside
//! `div.post`; every anchor with an `href` inside a block is one hoster link.

mod dom;
mod markup_scan;

pub use dom::DomStrategy;
pub use markup_scan::MarkupScanStrategy;

use crate::error::ParseError;
use crate::types::ListingRow;
use tracing::debug;

/// Why a strategy could not produce a result
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StrategyError {
    /// The strategy cannot handle this input at all
    Unsupported(String),
    /// The input was readable but lacks the expected markers
    StructureChanged(String),
}

impl std::fmt::Display for StrategyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyError::Unsupported(msg) => write!(f, "unsupported input: {msg}"),
            StrategyError::StructureChanged(msg) => f.write_str(msg),
        }
    }
}

/// One way of extracting listing rows and hoster links from raw markup
pub trait ParseStrategy: Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Extract listing rows in document order
    ///
    /// `detail_url` is the raw `href`; callers resolve it against the page URL.
    fn listing(&self, html: &[u8]) -> Result<Vec<ListingRow>, StrategyError>;

    /// Extract hoster hrefs from a detail page in document order
    ///
    /// A page without download blocks is `Ok(vec![])`, not an error.
    fn hoster_hrefs(&self, html: &[u8]) -> Result<Vec<String>, StrategyError>;
}

/// Ordered list of strategies tried until one succeeds
pub struct ParserChain {
    strategies: Vec<Box<dyn ParseStrategy>>,
}

impl Default for ParserChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(DomStrategy::new()),
            Box::new(MarkupScanStrategy::new()),
        ])
    }
}

impl std::fmt::Debug for ParserChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.name()))
            .finish()
    }
}

impl ParserChain {
    /// Chain trying `strategies` in the given order
    pub fn new(strategies: Vec<Box<dyn ParseStrategy>>) -> Self {
        Self { strategies }
    }

    /// Parse a listing page into rows
    pub fn parse_listing(&self, html: &[u8]) -> Result<Vec<ListingRow>, ParseError> {
        self.run(|strategy| strategy.listing(html))
    }

    /// Parse a detail page into hoster hrefs
    pub fn parse_hoster_hrefs(&self, html: &[u8]) -> Result<Vec<String>, ParseError> {
        self.run(|strategy| strategy.hoster_hrefs(html))
    }

    fn run<T>(
        &self,
        attempt: impl Fn(&dyn ParseStrategy) -> Result<T, StrategyError>,
    ) -> Result<T, ParseError> {
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            match attempt(strategy.as_ref()) {
                Ok(result) => return Ok(result),
                Err(e) => {
                    debug!(strategy = strategy.name(), error = %e, "parse strategy gave up");
                    failures.push(format!("{}: {}", strategy.name(), e));
                }
            }
        }

        if failures.is_empty() {
            failures.push("no parse strategy configured".to_string());
        }
        Err(ParseError::StructureChanged(failures.join("; ")))
    }
}

/// Parse a listing page with the default strategy chain
///
/// # Examples
///
/// ```
/// let html = br#"<table class="posts_table"><tr>
///   <td><a href="/c/720p">TV-720p</a></td>
///   <td><a href="https://tv.example/show-s01e01">Show S01E01</a></td>
///   <td>2024-03-01</td>
/// </tr></table>"#;
///
/// let rows = tvlinker::parser::parse_page(html).unwrap();
/// assert_eq!(rows[0].title, "Show S01E01");
/// assert_eq!(rows[0].size_or_format, "720p");
/// ```
pub fn parse_page(html: &[u8]) -> Result<Vec<ListingRow>, ParseError> {
    ParserChain::default().parse_listing(html)
}

/// Collapse a text node the way both strategies present field values
pub(crate) fn clean_text(text: &str) -> String {
    text.replace(['\n', '\r'], "").trim().to_string()
}

/// Format tag with the site's `TV-` prefix removed
pub(crate) fn clean_format(text: &str) -> String {
    clean_text(&text.replace("TV-", ""))
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub(crate) const LISTING: &str = r#"<!DOCTYPE html>
<html><body><div id="content">
<table class="posts_table"><tr>
  <td class="cat"><a href="/category/720p">TV-720p</a></td>
  <td class="title"><a href="https://tv.example/show-one-s01e01">Show One
    S01E01</a></td>
  <td class="date">2024-03-01</td>
</tr></table>
<table class="posts_table"><tr>
  <td class="cat"><a href="/category/1080p">TV-1080p</a></td>
  <td class="title"><a href="/show-two-s02e05">Show Two &amp; Friends S02E05</a></td>
  <td class="date"><span>2024-03-02</span></td>
</tr></table>
<table class="posts_table"><tr>
  <td class="cat"><a href="/category/x264">TV-x264</a></td>
  <td class="title"><a href="https://tv.example/show-three">Show Three</a></td>
  <td class="date">2024-03-03</td>
</tr></table>
</div></body></html>"#;

    pub(crate) const DETAIL: &str = r#"<html><body>
<div class="post">
  <p style="text-align: center;">Show One S01E01 720p</p>
  <h2 style="text-align: center;">
    <a href="https://rapidgator.net/file/abc">Rapidgator</a>
    <a href="http://ul.to/xyz">Uploaded</a>
  </h2>
  <h2>Comments</h2>
  <h2 style="text-align: center;"><a href="/go/nitro">NitroFlare</a><a name="anchor">x</a></h2>
</div>
<h2 style="text-align: center;"><a href="https://outside.example/ad">Ad</a></h2>
</body></html>"#;
}
