//! Byte-level markup scan
//!
//! Works on raw bytes with `regex::bytes`, so pages in legacy encodings or
//! with stray invalid sequences still parse. Field values are decoded
//! lossily after extraction.

use super::{ParseStrategy, StrategyError, clean_format, clean_text};
use crate::types::ListingRow;
use html_escape::decode_html_entities;
use regex::bytes::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Scans markup for the structural markers without building a tree
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkupScanStrategy;

impl MarkupScanStrategy {
    /// Create the strategy
    pub fn new() -> Self {
        Self
    }
}

type Cached = OnceLock<Option<Regex>>;

fn cached(cell: &'static Cached, pattern: &str) -> Result<&'static Regex, StrategyError> {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .ok_or_else(|| StrategyError::Unsupported(format!("pattern {pattern:?} failed to compile")))
}

fn re_table() -> Result<&'static Regex, StrategyError> {
    static R: Cached = OnceLock::new();
    cached(&R, r"(?is-u)<table\b([^>]*)>(.*?)</table\s*>")
}

fn re_row() -> Result<&'static Regex, StrategyError> {
    static R: Cached = OnceLock::new();
    cached(&R, r"(?is-u)<tr\b[^>]*>(.*?)(?:</tr\s*>|$)")
}

fn re_cell() -> Result<&'static Regex, StrategyError> {
    static R: Cached = OnceLock::new();
    cached(&R, r"(?is-u)<td\b[^>]*>(.*?)</td\s*>")
}

fn re_anchor() -> Result<&'static Regex, StrategyError> {
    static R: Cached = OnceLock::new();
    cached(&R, r"(?is-u)<a\b([^>]*)>(.*?)</a\s*>")
}

fn re_href() -> Result<&'static Regex, StrategyError> {
    static R: Cached = OnceLock::new();
    cached(&R, r#"(?is-u)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
}

fn re_class() -> Result<&'static Regex, StrategyError> {
    static R: Cached = OnceLock::new();
    cached(&R, r#"(?is-u)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
}

fn re_style() -> Result<&'static Regex, StrategyError> {
    static R: Cached = OnceLock::new();
    cached(&R, r#"(?is-u)\bstyle\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
}

fn re_div_tag() -> Result<&'static Regex, StrategyError> {
    static R: Cached = OnceLock::new();
    cached(&R, r"(?is-u)<(/?)div\b([^>]*)>")
}

fn re_h2() -> Result<&'static Regex, StrategyError> {
    static R: Cached = OnceLock::new();
    cached(&R, r"(?is-u)<h2\b([^>]*)>(.*?)</h2\s*>")
}

fn re_tag() -> Result<&'static Regex, StrategyError> {
    static R: Cached = OnceLock::new();
    cached(&R, r"(?s-u)<[^>]*>")
}

/// Value of an attribute matched by `re` within a tag's attribute bytes
fn attr<'a>(re: &Regex, attrs: &'a [u8]) -> Option<Cow<'a, str>> {
    let caps = re.captures(attrs)?;
    let value = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
    Some(String::from_utf8_lossy(value.as_bytes()))
}

fn has_class(attrs: &[u8], class: &str) -> Result<bool, StrategyError> {
    Ok(attr(re_class()?, attrs)
        .map(|value| value.split_whitespace().any(|c| c == class))
        .unwrap_or(false))
}

/// Text content of a fragment: tags removed, entities decoded
fn text_content(fragment: &[u8]) -> Result<String, StrategyError> {
    let stripped = re_tag()?.replace_all(fragment, &b""[..]);
    Ok(decode_html_entities(&String::from_utf8_lossy(&stripped)).into_owned())
}

fn first_href(anchor_attrs: &[u8]) -> Result<Option<String>, StrategyError> {
    Ok(attr(re_href()?, anchor_attrs).map(|href| clean_text(&decode_html_entities(&href))))
}

impl ParseStrategy for MarkupScanStrategy {
    fn name(&self) -> &'static str {
        "markup-scan"
    }

    fn listing(&self, html: &[u8]) -> Result<Vec<ListingRow>, StrategyError> {
        let mut rows = Vec::new();

        for (index, table) in re_table()?.captures_iter(html).enumerate() {
            let (attrs, body) = (&table[1], &table[2]);
            if !has_class(attrs, "posts_table")? {
                continue;
            }

            let row = re_row()?.captures(body).ok_or_else(|| {
                StrategyError::StructureChanged(format!("listing block {index} has no rows"))
            })?;
            let cells: Vec<&[u8]> = re_cell()?
                .captures_iter(&row[1])
                .filter_map(|c| c.get(1).map(|m| m.as_bytes()))
                .collect();
            if cells.len() < 3 {
                return Err(StrategyError::StructureChanged(format!(
                    "listing block {index} has {} cells, expected 3",
                    cells.len()
                )));
            }

            let format = linked_anchor(cells[0])?.ok_or_else(|| {
                StrategyError::StructureChanged(format!("listing block {index} has no format link"))
            })?;
            let title = linked_anchor(cells[1])?.ok_or_else(|| {
                StrategyError::StructureChanged(format!("listing block {index} has no title link"))
            })?;

            rows.push(ListingRow {
                published_at: clean_text(&text_content(cells[2])?),
                detail_url: title.href,
                title: clean_text(&title.text),
                size_or_format: clean_format(&format.text),
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
        let mut hrefs = Vec::new();

        for region in post_regions(html)? {
            for h2 in re_h2()?.captures_iter(region) {
                let centered = attr(re_style()?, &h2[1])
                    .is_some_and(|style| style == "text-align: center;");
                if !centered {
                    continue;
                }
                for anchor in re_anchor()?.captures_iter(&h2[2]) {
                    if let Some(href) = first_href(&anchor[1])?
                        && !href.is_empty()
                    {
                        hrefs.push(href);
                    }
                }
            }
        }

        Ok(hrefs)
    }
}

struct Anchor {
    href: String,
    text: String,
}

/// First anchor carrying an `href` in a cell
fn linked_anchor(cell: &[u8]) -> Result<Option<Anchor>, StrategyError> {
    for anchor in re_anchor()?.captures_iter(cell) {
        if let Some(href) = first_href(&anchor[1])? {
            return Ok(Some(Anchor {
                href,
                text: text_content(&anchor[2])?,
            }));
        }
    }
    Ok(None)
}

/// Byte ranges of every `div.post`, matched against its closing tag by depth
fn post_regions(html: &[u8]) -> Result<Vec<&[u8]>, StrategyError> {
    let mut regions = Vec::new();
    let mut open: Option<(usize, usize)> = None;

    for tag in re_div_tag()?.captures_iter(html) {
        let Some(whole) = tag.get(0) else { continue };
        let closing = !tag[1].is_empty();

        match open {
            None => {
                if !closing && has_class(&tag[2], "post")? {
                    open = Some((whole.end(), 1));
                }
            }
            Some((start, depth)) => {
                let depth = if closing { depth - 1 } else { depth + 1 };
                if depth == 0 {
                    regions.push(&html[start..whole.start()]);
                    open = None;
                } else {
                    open = Some((start, depth));
                }
            }
        }
    }

    // Unterminated post runs to the end of the document
    if let Some((start, _)) = open {
        regions.push(&html[start..]);
    }
    Ok(regions)
}
