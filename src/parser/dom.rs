//! HTML5 tree strategy built on `scraper`

use super::{ParseStrategy, StrategyError, clean_format, clean_text};
use crate::types::ListingRow;
use scraper::{ElementRef, Html, Selector};

/// Parses pages with an HTML5 tree builder
///
/// Only accepts UTF-8 input; anything else is [`StrategyError::Unsupported`]
/// so the chain can move on to a more tolerant strategy.
#[derive(Clone, Copy, Debug, Default)]
pub struct DomStrategy;

impl DomStrategy {
    /// Create the strategy
    pub fn new() -> Self {
        Self
    }

    fn document(html: &[u8]) -> Result<Html, StrategyError> {
        let text = std::str::from_utf8(html).map_err(|e| {
            StrategyError::Unsupported(format!("tree builder needs UTF-8 input ({e})"))
        })?;
        Ok(Html::parse_document(text))
    }
}

fn selector(css: &str) -> Result<Selector, StrategyError> {
    Selector::parse(css)
        .map_err(|e| StrategyError::Unsupported(format!("selector {css:?} rejected: {e}")))
}

fn text_of(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

impl ParseStrategy for DomStrategy {
    fn name(&self) -> &'static str {
        "dom"
    }

    fn listing(&self, html: &[u8]) -> Result<Vec<ListingRow>, StrategyError> {
        let document = Self::document(html)?;
        let tables = selector("table.posts_table")?;
        let first_row = selector("tr")?;
        let anchor = selector("a[href]")?;

        let mut rows = Vec::new();
        for (index, table) in document.select(&tables).enumerate() {
            let tr = table.select(&first_row).next().ok_or_else(|| {
                StrategyError::StructureChanged(format!("listing block {index} has no rows"))
            })?;

            let cells: Vec<ElementRef<'_>> = tr
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|el| el.value().name() == "td")
                .collect();
            if cells.len() < 3 {
                return Err(StrategyError::StructureChanged(format!(
                    "listing block {index} has {} cells, expected 3",
                    cells.len()
                )));
            }

            let format_anchor = cells[0].select(&anchor).next().ok_or_else(|| {
                StrategyError::StructureChanged(format!("listing block {index} has no format link"))
            })?;
            let title_anchor = cells[1].select(&anchor).next().ok_or_else(|| {
                StrategyError::StructureChanged(format!("listing block {index} has no title link"))
            })?;

            rows.push(ListingRow {
                published_at: text_of(cells[2]),
                detail_url: clean_text(title_anchor.value().attr("href").unwrap_or_default()),
                title: text_of(title_anchor),
                size_or_format: clean_format(&format_anchor.text().collect::<String>()),
            });
        }

        if rows.is_empty() {
            return Err(StrategyError::StructureChanged(
                "no posts_table blocks on listing page".to_string(),
            ));
        }
        Ok(rows)
    }

    fn hoster_hrefs(&self, html: &[u8]) -> Result<Vec<String>, StrategyError> {
        let document = Self::document(html)?;
        let blocks = selector(r#"div.post h2[style="text-align: center;"]"#)?;
        let anchor = selector("a[href]")?;

        Ok(document
            .select(&blocks)
            .flat_map(|block| block.select(&anchor).collect::<Vec<_>>())
            .filter_map(|a| a.value().attr("href"))
            .map(clean_text)
            .filter(|href| !href.is_empty())
            .collect())
    }
}
