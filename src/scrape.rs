//! Paginated listing scrape
//!
//! Pages `1..=pages` are fetched strictly in order. Rows of a page are
//! emitted before the next page is requested, and cancellation is honoured
//! between pages only.

use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::fetcher::PageFetcher;
use crate::parser::ParserChain;
use crate::types::{ListingRow, ScrapeEvent};
use crate::utils::absolutize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Capacity of the scrape event channel
const SCRAPE_CHANNEL_BUFFER: usize = 256;

/// Scrapes the configured listing source
#[derive(Clone)]
pub struct ListingScraper {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<ParserChain>,
    config: ScrapeConfig,
}

impl std::fmt::Debug for ListingScraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingScraper")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ListingScraper {
    /// Create a scraper for `config.source_url`
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<ParserChain>,
        config: ScrapeConfig,
    ) -> Self {
        Self {
            fetcher,
            parser,
            config,
        }
    }

    /// Fetch and parse a single 1-based page
    ///
    /// Relative detail links are resolved against the page URL.
    pub async fn scrape_page(&self, page: u32) -> Result<Vec<ListingRow>> {
        let url = self.config.page_url(page);
        debug!(page, url = %url, "fetching listing page");

        let html = self.fetcher.fetch(&url).await?;
        let mut rows = self.parser.parse_listing(&html)?;
        for row in &mut rows {
            row.detail_url = absolutize(&url, &row.detail_url);
        }
        Ok(rows)
    }

    /// Run the page loop, emitting events on `events`
    ///
    /// Returns the terminal event, which is also the last one sent. A failed
    /// page is reported as [`ScrapeEvent::PageFailed`] and the loop moves on.
    /// Dropping the receiver stops the loop at the next send.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        events: &mpsc::Sender<ScrapeEvent>,
    ) -> ScrapeEvent {
        let pages = self.config.pages;
        let mut pages_scraped = 0u32;
        let mut rows = 0usize;

        info!(pages, source = %self.config.source_url, "scrape started");
        let started = ScrapeEvent::Started {
            pages,
            expected_rows: pages.saturating_mul(self.config.links_per_page),
        };
        if events.send(started).await.is_err() {
            return ScrapeEvent::Cancelled { pages_scraped, rows };
        }

        for page in 1..=pages {
            if cancel.is_cancelled() {
                info!(page, pages_scraped, rows, "scrape cancelled");
                let terminal = ScrapeEvent::Cancelled { pages_scraped, rows };
                let _ = events.send(terminal.clone()).await;
                return terminal;
            }

            match self.scrape_page(page).await {
                Ok(page_rows) => {
                    pages_scraped += 1;
                    debug!(page, count = page_rows.len(), "listing page parsed");
                    for row in page_rows {
                        if events.send(ScrapeEvent::Row { page, row }).await.is_err() {
                            debug!(page, "scrape receiver dropped");
                            return ScrapeEvent::Cancelled { pages_scraped, rows };
                        }
                        rows += 1;
                    }
                }
                Err(e) => {
                    warn!(page, error = %e, "listing page failed");
                    let failed = ScrapeEvent::PageFailed {
                        page,
                        error: e.to_string(),
                    };
                    if events.send(failed).await.is_err() {
                        return ScrapeEvent::Cancelled { pages_scraped, rows };
                    }
                }
            }
        }

        info!(pages_scraped, rows, "scrape finished");
        let terminal = ScrapeEvent::Finished { pages_scraped, rows };
        let _ = events.send(terminal.clone()).await;
        terminal
    }

    /// Run the page loop on its own task
    pub fn spawn(&self) -> ScrapeHandle {
        let (tx, rx) = mpsc::channel(SCRAPE_CHANNEL_BUFFER);
        let cancel = CancellationToken::new();

        let scraper = self.clone();
        let token = cancel.clone();
        let join = tokio::spawn(async move { scraper.run(&token, &tx).await });

        ScrapeHandle {
            events: rx,
            cancel,
            join,
        }
    }
}

/// Handle to a running scrape
#[derive(Debug)]
pub struct ScrapeHandle {
    events: mpsc::Receiver<ScrapeEvent>,
    cancel: CancellationToken,
    join: tokio::task::JoinHandle<ScrapeEvent>,
}

impl ScrapeHandle {
    /// Stop before the next page; the page in flight finishes
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The token observed by the scrape loop
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Next event, or `None` after the terminal event was read
    pub async fn next_event(&mut self) -> Option<ScrapeEvent> {
        self.events.recv().await
    }

    /// Events as a stream
    pub fn into_stream(self) -> ReceiverStream<ScrapeEvent> {
        ReceiverStream::new(self.events)
    }

    /// Read events until the scrape ends, collecting the rows
    pub async fn collect_rows(mut self) -> Result<(Vec<ListingRow>, ScrapeEvent)> {
        let mut rows = Vec::new();
        while let Some(event) = self.events.recv().await {
            if let ScrapeEvent::Row { row, .. } = event {
                rows.push(row);
            }
        }
        let terminal = crate::task::join_task(self.join).await?;
        Ok((rows, terminal))
    }

    /// Wait for the scrape to end, discarding unread events
    pub async fn join(self) -> Result<ScrapeEvent> {
        drop(self.events);
        crate::task::join_task(self.join).await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::parser::fixtures::LISTING;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves LISTING for every page except those listed as failing
    struct PagedFetcher {
        failing: Vec<u32>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageFetcher for PagedFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            let page: u32 = url.rsplit('/').next().unwrap().parse().unwrap();
            if self.failing.contains(&page) {
                return Err(FetchError::HttpStatus {
                    status: 500,
                    url: url.to_string(),
                });
            }
            Ok(LISTING.as_bytes().to_vec())
        }
    }

    fn scraper(pages: u32, failing: Vec<u32>) -> (ListingScraper, Arc<PagedFetcher>) {
        let fetcher = Arc::new(PagedFetcher {
            failing,
            requested: Mutex::new(Vec::new()),
        });
        let config = ScrapeConfig {
            source_url: "https://tv.example/page/{page}".to_string(),
            pages,
            links_per_page: 3,
        };
        (
            ListingScraper::new(fetcher.clone(), Arc::new(ParserChain::default()), config),
            fetcher,
        )
    }

    #[tokio::test]
    async fn scrape_page_absolutizes_detail_urls() {
        let (scraper, _) = scraper(1, vec![]);
        let rows = scraper.scrape_page(1).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].detail_url, "https://tv.example/show-two-s02e05");
    }

    #[tokio::test]
    async fn pages_are_emitted_in_order_and_failures_do_not_stop_the_loop() {
        let (scraper, fetcher) = scraper(3, vec![2]);
        let mut handle = scraper.spawn();
        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }

        assert_eq!(
            events.first(),
            Some(&ScrapeEvent::Started {
                pages: 3,
                expected_rows: 9
            })
        );
        let pages: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                ScrapeEvent::Row { page, .. } => Some(*page),
                _ => None,
            })
            .collect();
        assert_eq!(pages, vec![1, 1, 1, 3, 3, 3]);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, ScrapeEvent::PageFailed { page: 2, .. }))
        );
        assert_eq!(
            events.last(),
            Some(&ScrapeEvent::Finished {
                pages_scraped: 2,
                rows: 6
            })
        );
        assert_eq!(
            *fetcher.requested.lock().unwrap(),
            vec![
                "https://tv.example/page/1",
                "https://tv.example/page/2",
                "https://tv.example/page/3"
            ]
        );
    }

    #[tokio::test]
    async fn cancelled_before_start_fetches_nothing() {
        let (scraper, fetcher) = scraper(5, vec![]);
        let (tx, mut rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let terminal = scraper.run(&cancel, &tx).await;
        assert_eq!(
            terminal,
            ScrapeEvent::Cancelled {
                pages_scraped: 0,
                rows: 0
            }
        );
        assert!(matches!(rx.recv().await, Some(ScrapeEvent::Started { .. })));
        assert!(fetcher.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancel_takes_effect_at_the_next_page_boundary() {
        let (scraper, fetcher) = scraper(20, vec![]);
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let task = {
            let cancel = cancel.clone();
            tokio::spawn(async move { scraper.run(&cancel, &tx).await })
        };

        // Started, then the first row of page 1
        rx.recv().await.unwrap();
        assert!(matches!(
            rx.recv().await.unwrap(),
            ScrapeEvent::Row { page: 1, .. }
        ));
        cancel.cancel();
        while rx.recv().await.is_some() {}

        let ScrapeEvent::Cancelled { pages_scraped, .. } = task.await.unwrap() else {
            panic!("expected cancellation");
        };
        assert!(pages_scraped < 20);
        assert_eq!(
            fetcher.requested.lock().unwrap().len(),
            pages_scraped as usize
        );
    }

    #[tokio::test]
    async fn dropped_receiver_counts_only_delivered_rows() {
        let (scraper, _) = scraper(3, vec![]);
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(async move { scraper.run(&cancel, &tx).await });

        assert!(matches!(rx.recv().await, Some(ScrapeEvent::Started { .. })));
        assert!(matches!(rx.recv().await, Some(ScrapeEvent::Row { page: 1, .. })));
        drop(rx);

        let ScrapeEvent::Cancelled { rows, .. } = task.await.unwrap() else {
            panic!("expected cancellation");
        };
        // One row was read; at most one more sat in the channel when it closed
        assert!(rows <= 2, "counted {rows} rows");
    }

    #[tokio::test]
    async fn collect_rows_gathers_every_row() {
        let (scraper, _) = scraper(2, vec![]);
        let (rows, terminal) = scraper.spawn().collect_rows().await.unwrap();
        assert_eq!(rows.len(), 6);
        assert!(terminal.is_terminal());
    }
}
