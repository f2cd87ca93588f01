//! # tvlinker
//!
//! Backend library for a TV-release link finder.
//!
//! The pipeline has four stages:
//! - **Scrape** - walk the paginated release listing and emit one row per release
//! - **Resolve** - open a release's detail page and list its hoster links
//! - **Unrestrict** - optionally turn a hoster link into a direct URL via Real-Debrid
//! - **Dispatch** - hand the final URL to a download manager, or download it directly
//!
//! Every stage runs on its own tokio task. Front-ends start an action through
//! [`TvLinker`] and receive a handle they can await, stream or cancel.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tvlinker::{Config, ScrapeEvent, TvLinker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.scrape.source_url = "https://tv.example/page/{page}".to_string();
//!     config.scrape.pages = 2;
//!
//!     let linker = TvLinker::new(config)?;
//!
//!     let mut scrape = linker.start_scraping();
//!     while let Some(event) = scrape.next_event().await {
//!         if let ScrapeEvent::Row { row, .. } = event {
//!             println!("{} {} {}", row.published_at, row.title, row.detail_url);
//!         }
//!     }
//!
//!     let hosters = linker
//!         .resolve_hosters("https://tv.example/show-s01e01")
//!         .join()
//!         .await?;
//!     if let Some(link) = hosters.first() {
//!         let outcome = linker.download_link(&link.url, None).join().await?;
//!         println!("accepted: {}", outcome.is_accepted());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Real-Debrid client
pub mod debrid;
/// Built-in HTTP downloader
pub mod direct_download;
/// Download manager dispatch
pub mod dispatch;
/// Error types
pub mod error;
/// Page fetching
pub mod fetcher;
/// Hoster link resolution
pub mod hosters;
/// The pipeline facade
pub mod linker;
/// Listing and detail page parsing
pub mod parser;
/// Paginated listing scrape
pub mod scrape;
/// Cancellable background tasks
pub mod task;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, DownloadManagerConfig, ManagerKind};
pub use direct_download::DownloadHandle;
pub use dispatch::DispatchOutcome;
pub use error::{
    ConfigError, DispatchError, DownloadError, Error, FetchError, ParseError, ProcessFailure,
    ResolveError, Result, UnrestrictError,
};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use linker::TvLinker;
pub use scrape::ScrapeHandle;
pub use task::TaskHandle;
pub use types::{
    DownloadEvent, DownloadProgress, HostInfo, HostStatus, HosterLink, ListingRow,
    ResolvedDownload, ScrapeEvent,
};
