//! Scrape a listing and print every row, then resolve the first release
//!
//! ```bash
//! cargo run --example scrape_listing -- "https://tv.example/category/tv-shows/page/{page}" 2
//! ```
//!
//! Install a `tracing` subscriber in a real front-end to see the pipeline logs.

use tvlinker::{Config, ScrapeEvent, TvLinker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let mut config = Config::default();
    if let Some(source_url) = args.next() {
        config.scrape.source_url = source_url;
    }
    if let Some(pages) = args.next() {
        config.scrape.pages = pages.parse()?;
    }

    let linker = TvLinker::new(config)?;
    let mut scrape = linker.start_scraping();
    let mut first_release = None;

    while let Some(event) = scrape.next_event().await {
        match event {
            ScrapeEvent::Started { pages, expected_rows } => {
                println!("scraping {pages} pages (~{expected_rows} releases)");
            }
            ScrapeEvent::Row { page, row } => {
                println!(
                    "[{page:>2}] {:<12} {:<10} {}",
                    row.published_at, row.size_or_format, row.title
                );
                first_release.get_or_insert(row.detail_url);
            }
            ScrapeEvent::PageFailed { page, error } => eprintln!("page {page} failed: {error}"),
            ScrapeEvent::Finished { pages_scraped, rows }
            | ScrapeEvent::Cancelled { pages_scraped, rows } => {
                println!("{rows} releases from {pages_scraped} pages");
            }
        }
    }

    if let Some(detail_url) = first_release {
        match linker.resolve_hosters(&detail_url).join().await {
            Ok(links) => {
                for link in links {
                    println!("{:<12} {}", link.host_label, link.url);
                }
            }
            Err(e) if e.is_recoverable() => println!("no links yet for {detail_url}"),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
