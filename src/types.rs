//! Core types for tvlinker

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One release entry from a listing page
///
/// Rows are produced in document order and never deduplicated; a release
/// that appears on two pages yields two rows.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingRow {
    /// Publication date exactly as the site shows it
    pub published_at: String,
    /// Absolute URL of the release's detail page
    pub detail_url: String,
    /// Release title
    pub title: String,
    /// Size or format tag (e.g. "720p", "1080p-WEB")
    pub size_or_format: String,
}

/// One hoster option from a detail page
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HosterLink {
    /// Short hoster name, see [`host_label`](crate::hosters::host_label)
    pub host_label: String,
    /// Absolute link to the file on the hoster
    pub url: String,
}

/// A hoster link after the optional unrestrict step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDownload {
    /// The hoster link the user picked
    pub original_url: String,
    /// The URL handed to the download manager
    pub final_url: String,
}

impl ResolvedDownload {
    /// A download that was not unrestricted
    pub fn passthrough(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            original_url: url.clone(),
            final_url: url,
        }
    }

    /// Whether the final URL differs from the original
    pub fn was_unrestricted(&self) -> bool {
        self.final_url != self.original_url
    }
}

/// Built-in downloader progress sample
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// Bytes written so far
    pub bytes_done: u64,
    /// Content-Length reported by the server
    pub bytes_total: u64,
    /// Average bytes per second since the transfer started
    pub instantaneous_rate: f64,
}

impl DownloadProgress {
    /// Completed fraction in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.bytes_total == 0 {
            return 0.0;
        }
        (self.bytes_done as f64 / self.bytes_total as f64).min(1.0)
    }

    /// Completed percentage in `0..=100`
    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0).round() as u8
    }
}

/// Events emitted by the built-in downloader
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadEvent {
    /// A chunk was written
    Progress(DownloadProgress),

    /// Every byte announced by Content-Length was written
    Complete {
        /// Destination file
        path: PathBuf,
        /// Bytes written
        bytes_done: u64,
    },

    /// The transfer was cancelled; the partial file is kept
    Cancelled {
        /// Destination file
        path: PathBuf,
        /// Bytes written before cancellation
        bytes_done: u64,
    },

    /// The transfer stopped on an error
    Failed {
        /// Error message
        reason: String,
    },
}

impl DownloadEvent {
    /// Whether no further events follow this one
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DownloadEvent::Progress(_))
    }
}

/// Events emitted by a listing scrape
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScrapeEvent {
    /// The scrape loop started
    Started {
        /// Pages that will be fetched
        pages: u32,
        /// Estimated row count, for progress bars
        expected_rows: u32,
    },

    /// A row was parsed
    Row {
        /// 1-based page the row came from
        page: u32,
        /// The row
        row: ListingRow,
    },

    /// A page could not be fetched or parsed; the loop moves on
    PageFailed {
        /// 1-based page number
        page: u32,
        /// Error message
        error: String,
    },

    /// Every page was attempted
    Finished {
        /// Pages fetched and parsed successfully
        pages_scraped: u32,
        /// Rows emitted
        rows: usize,
    },

    /// Cancelled at a page boundary
    Cancelled {
        /// Pages fetched and parsed successfully
        pages_scraped: u32,
        /// Rows emitted
        rows: usize,
    },
}

impl ScrapeEvent {
    /// Whether no further events follow this one
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScrapeEvent::Finished { .. } | ScrapeEvent::Cancelled { .. }
        )
    }
}

/// A hoster supported by the debrid service (`GET /hosts`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    /// Host identifier (e.g. "rapidgator.net")
    #[serde(default)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Icon URL
    #[serde(default)]
    pub image: String,
}

/// Live status of a supported hoster (`GET /hosts/status`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStatus {
    /// Host identifier
    #[serde(default)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// "up", "down" or "unsupported"
    #[serde(default)]
    pub status: String,
    /// When the status was last checked
    #[serde(default)]
    pub check_time: String,
}

impl HostStatus {
    /// Whether the service currently reports the host as working
    pub fn is_up(&self) -> bool {
        self.status.eq_ignore_ascii_case("up")
    }
}
