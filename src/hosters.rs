//! Hoster resolution for release detail pages

use crate::error::ResolveError;
use crate::fetcher::PageFetcher;
use crate::parser::ParserChain;
use crate::types::HosterLink;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Hosters that publish under a short domain, mapped to their usual name
const HOST_ALIASES: &[(&str, &str)] = &[
    ("ul.to", "uploaded"),
    ("rg.to", "rapidgator"),
    ("nitro.download", "nitroflare"),
    ("ddl.to", "ddownload"),
    ("tb.to", "turbobit"),
    ("turbo.to", "turbobit"),
];

const STRIPPED_SUFFIXES: &[&str] = &[".com", ".net", ".org", ".co"];

/// Short, stable hoster name for a link or bare host
///
/// The host is lowercased, a leading `www.` and trailing generic TLDs are
/// removed, and known short domains are mapped to the hoster's name. Applying
/// it to its own output returns the same label.
///
/// ```
/// use tvlinker::hosters::host_label;
///
/// assert_eq!(host_label("https://www.RapidGator.net/file/abc"), "rapidgator");
/// assert_eq!(host_label("www.Example.com"), host_label("Example.com"));
/// assert_eq!(host_label("http://ul.to/xyz"), "uploaded");
/// ```
pub fn host_label(url_or_host: &str) -> String {
    let trimmed = url_or_host.trim();
    let host = Url::parse(trimmed)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .or_else(|| {
            Url::parse(&format!("http://{trimmed}"))
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
        })
        .unwrap_or_else(|| trimmed.to_string())
        .to_ascii_lowercase();

    let mut label = host.as_str();
    while let Some(shorter) = label.strip_prefix("www.").filter(|s| !s.is_empty()) {
        label = shorter;
    }
    while let Some(shorter) = STRIPPED_SUFFIXES
        .iter()
        .find_map(|suffix| label.strip_suffix(suffix))
        .filter(|s| !s.is_empty())
    {
        label = shorter;
    }

    HOST_ALIASES
        .iter()
        .find(|(domain, _)| *domain == label)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| label.to_string())
}

/// Fetches a release's detail page and lists its hoster links
#[derive(Clone)]
pub struct HosterResolver {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<ParserChain>,
}

impl std::fmt::Debug for HosterResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HosterResolver")
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}

impl HosterResolver {
    /// Create a resolver over the given fetcher and parser chain
    pub fn new(fetcher: Arc<dyn PageFetcher>, parser: Arc<ParserChain>) -> Self {
        Self { fetcher, parser }
    }

    /// Resolve the hoster links of a release
    ///
    /// Links are returned in document order. A reachable page without any
    /// download block is [`ResolveError::NoLinksYet`]: the release is
    /// usually posted before its links.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidDetailUrl`] if `detail_url` is not an absolute http(s) URL
    /// - [`ResolveError::Fetch`] if the page cannot be fetched
    /// - [`ResolveError::Parse`] if no parse strategy can read the page
    /// - [`ResolveError::NoLinksYet`] if the page has no hoster links
    pub async fn resolve(&self, detail_url: &str) -> Result<Vec<HosterLink>, ResolveError> {
        let base = Url::parse(detail_url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| ResolveError::InvalidDetailUrl {
                detail_url: detail_url.to_string(),
            })?;

        debug!(url = %detail_url, "resolving hosters");
        let html = self.fetcher.fetch(detail_url).await?;
        let hrefs = self.parser.parse_hoster_hrefs(&html)?;

        let links: Vec<HosterLink> = hrefs
            .iter()
            .filter_map(|href| match base.join(href) {
                Ok(url) => Some(HosterLink {
                    host_label: host_label(url.as_str()),
                    url: url.to_string(),
                }),
                Err(e) => {
                    warn!(
                        url = %detail_url,
                        href = %href,
                        error = %e,
                        "skipping unusable hoster link"
                    );
                    None
                }
            })
            .collect();

        if links.is_empty() {
            info!(url = %detail_url, "no hoster links posted yet");
            return Err(ResolveError::NoLinksYet {
                detail_url: detail_url.to_string(),
            });
        }

        info!(url = %detail_url, count = links.len(), "resolved hoster links");
        Ok(links)
    }
}
