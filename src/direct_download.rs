//! Built-in chunked HTTP downloader
//!
//! Streams a single URL to disk in fixed-size chunks, reporting progress
//! after every chunk and checking for cancellation before each write. There
//! is no resume: a cancelled or failed transfer leaves its partial file in
//! place and the next attempt starts over.

use crate::error::{DownloadError, FetchError};
use crate::types::{DownloadEvent, DownloadProgress};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Bytes written per chunk (the final chunk may be shorter)
pub const CHUNK_SIZE: usize = 8 * 1024;

/// File name used when the URL path has no usable last segment
const FALLBACK_FILE_NAME: &str = "download";

/// Destination for `url` inside `download_dir`, named after the URL's last path segment
///
/// ```
/// use std::path::Path;
/// use tvlinker::direct_download::default_destination;
///
/// let url = "https://dl.example/d/X1/Show%20S01E01.mkv?t=1";
/// let dest = default_destination(url, Path::new("/tmp"));
/// assert_eq!(dest, Path::new("/tmp/Show S01E01.mkv"));
/// ```
pub fn default_destination(url: &str, download_dir: &Path) -> PathBuf {
    let name = url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .map(|segment| {
            urlencoding::decode(&segment)
                .map(|s| s.into_owned())
                .unwrap_or(segment)
        })
        .map(|name| name.replace(['/', '\\'], "_"))
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
    download_dir.join(name)
}

/// Streams URLs to local files
#[derive(Clone, Debug)]
pub struct DirectDownloader {
    client: reqwest::Client,
    event_buffer: usize,
}

impl DirectDownloader {
    /// Create a downloader using `client` for requests
    ///
    /// `event_buffer` bounds the event channel of spawned downloads; a full
    /// channel pauses the transfer until the consumer catches up.
    pub fn new(client: reqwest::Client, event_buffer: usize) -> Self {
        Self {
            client,
            event_buffer: event_buffer.max(1),
        }
    }

    /// Download `url` to `dest` on a new task
    pub fn spawn(&self, url: &str, dest: PathBuf) -> DownloadHandle {
        let (tx, rx) = mpsc::channel(self.event_buffer);
        let cancel = CancellationToken::new();

        let downloader = self.clone();
        let url_owned = url.to_string();
        let path = dest.clone();
        let token = cancel.clone();
        let join = tokio::spawn(async move {
            downloader.download(&url_owned, &dest, &token, &tx).await
        });

        DownloadHandle {
            url: url.to_string(),
            path,
            events: rx,
            cancel,
            join,
        }
    }

    /// Download `url` to `dest`, emitting events on `events`
    ///
    /// Exactly one terminal event ([`DownloadEvent::Complete`],
    /// [`DownloadEvent::Cancelled`] or [`DownloadEvent::Failed`]) is sent
    /// last. The returned value repeats the terminal event on success. Events
    /// are dropped silently once the receiver is gone; the transfer goes on.
    pub async fn download(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancellationToken,
        events: &mpsc::Sender<DownloadEvent>,
    ) -> Result<DownloadEvent, DownloadError> {
        match self.transfer(url, dest, cancel, events).await {
            Ok(terminal) => {
                let _ = events.send(terminal.clone()).await;
                Ok(terminal)
            }
            Err(e) => {
                warn!(url = %url, path = %dest.display(), error = %e, "download failed");
                let _ = events
                    .send(DownloadEvent::Failed {
                        reason: e.to_string(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    async fn transfer(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancellationToken,
        events: &mpsc::Sender<DownloadEvent>,
    ) -> Result<DownloadEvent, DownloadError> {
        let io_err = |source: std::io::Error| DownloadError::Io {
            path: dest.to_path_buf(),
            source,
        };

        debug!(url = %url, path = %dest.display(), "starting download");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into());
        }

        let bytes_total = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .ok_or_else(|| DownloadError::NoContentLength {
                url: url.to_string(),
            })?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let mut file = tokio::fs::File::create(dest).await.map_err(io_err)?;

        let started = Instant::now();
        let mut stream = response.bytes_stream();
        let mut pending: Vec<u8> = Vec::with_capacity(CHUNK_SIZE * 2);
        let mut bytes_done: u64 = 0;
        let mut stream_done = false;

        loop {
            if pending.len() < CHUNK_SIZE && !stream_done {
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        pending.extend_from_slice(&bytes);
                        continue;
                    }
                    Some(Err(e)) => {
                        // Whatever arrived is kept; the length check below reports the gap
                        warn!(url = %url, bytes_done, error = %e, "download stream broke off");
                        stream_done = true;
                    }
                    None => stream_done = true,
                }
            }

            if pending.is_empty() {
                break;
            }

            if cancel.is_cancelled() {
                file.flush().await.map_err(io_err)?;
                info!(url = %url, bytes_done, bytes_total, "download cancelled");
                return Ok(DownloadEvent::Cancelled {
                    path: dest.to_path_buf(),
                    bytes_done,
                });
            }

            let take = pending.len().min(CHUNK_SIZE);
            file.write_all(&pending[..take]).await.map_err(io_err)?;
            pending.drain(..take);
            bytes_done += take as u64;

            let elapsed = started.elapsed().as_secs_f64().max(f64::EPSILON);
            let _ = events
                .send(DownloadEvent::Progress(DownloadProgress {
                    bytes_done,
                    bytes_total,
                    instantaneous_rate: bytes_done as f64 / elapsed,
                }))
                .await;
        }

        file.flush().await.map_err(io_err)?;

        if bytes_done < bytes_total {
            return Err(DownloadError::Truncated {
                expected: bytes_total,
                received: bytes_done,
            });
        }

        info!(url = %url, path = %dest.display(), bytes_done, "download complete");
        Ok(DownloadEvent::Complete {
            path: dest.to_path_buf(),
            bytes_done,
        })
    }
}

/// Handle to a built-in download running on its own task
#[derive(Debug)]
pub struct DownloadHandle {
    url: String,
    path: PathBuf,
    events: mpsc::Receiver<DownloadEvent>,
    cancel: CancellationToken,
    join: tokio::task::JoinHandle<Result<DownloadEvent, DownloadError>>,
}

impl DownloadHandle {
    /// The URL being downloaded
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Destination file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop the transfer before its next chunk; the partial file is kept
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The token observed by the transfer
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Next event, or `None` once the transfer has ended and all events were read
    pub async fn next_event(&mut self) -> Option<DownloadEvent> {
        self.events.recv().await
    }

    /// Events as a stream; the transfer keeps running detached
    pub fn into_stream(self) -> ReceiverStream<DownloadEvent> {
        ReceiverStream::new(self.events)
    }

    /// Wait for the transfer to end and return its terminal event
    ///
    /// Unread events are discarded.
    pub async fn join(self) -> crate::Result<DownloadEvent> {
        drop(self.events);
        Ok(crate::task::join_task(self.join).await??)
    }
}
