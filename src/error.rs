//! Error types for tvlinker
//!
//! Every pipeline stage has its own error enum so callers can tell the
//! stages apart:
//! - [`FetchError`] - transport and HTTP status failures
//! - [`ParseError`] - listing/detail markup no longer matches the expected structure
//! - [`ResolveError`] - hoster resolution, including the recoverable "no links yet" case
//! - [`UnrestrictError`] - debrid API failures
//! - [`DispatchError`] - download manager hand-off failures
//! - [`DownloadError`] - built-in downloader failures
//!
//! [`Error`] wraps all of them for the [`TvLinker`](crate::TvLinker) facade.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tvlinker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tvlinker
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Page fetch failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Page markup could not be parsed
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Hoster resolution failed
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Link unrestriction failed
    #[error("unrestrict error: {0}")]
    Unrestrict(#[from] UnrestrictError),

    /// Dispatch to a download manager failed
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Built-in download failed
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// The action was cancelled through its handle
    #[error("cancelled")]
    Cancelled,

    /// Background task panicked or was aborted
    #[error("background task failed: {0}")]
    Task(String),
}

impl Error {
    /// Machine-readable error code, stable across releases
    ///
    /// Front-ends use this to pick a message without matching on the error
    /// tree themselves.
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::Fetch(FetchError::HttpStatus { .. }) => "http_status",
            Error::Fetch(_) => "network_error",
            Error::Parse(_) => "structure_changed",
            Error::Resolve(e) => match e {
                ResolveError::NoLinksYet { .. } => "no_links_yet",
                ResolveError::InvalidDetailUrl { .. } => "invalid_detail_url",
                ResolveError::Fetch(_) => "network_error",
                ResolveError::Parse(_) => "structure_changed",
            },
            Error::Unrestrict(_) => "unrestrict_failed",
            Error::Dispatch(e) => match e {
                DispatchError::EmptyUrl => "empty_url",
                DispatchError::ProcessFailed { .. } => "process_failed",
                DispatchError::RpcRejected(_) => "rpc_rejected",
                DispatchError::ApiRejected(_) => "api_rejected",
                DispatchError::InvalidCommand(_) => "invalid_command",
            },
            Error::Download(e) => match e {
                DownloadError::NoContentLength { .. } => "no_content_length",
                DownloadError::Truncated { .. } => "truncated",
                DownloadError::Io { .. } => "io_error",
                DownloadError::Fetch(_) => "network_error",
            },
            Error::Cancelled => "cancelled",
            Error::Task(_) => "task_failed",
        }
    }

    /// Whether the failure is a "try again later" condition rather than a fault
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Resolve(ResolveError::NoLinksYet { .. }))
    }
}

/// Invalid configuration values
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value is missing or empty
    #[error("missing value for {key}")]
    Missing {
        /// The configuration key (e.g. "aria2_rpc_host")
        key: String,
    },

    /// A value is present but unusable
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// The configuration key
        key: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The HTTP client could not be built from the configuration
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// HTML fetch errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, TLS, proxy or timeout failure
    #[error("network failure: {0}")]
    Network(String),

    /// The server answered with a non-2xx status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Response status code
        status: u16,
        /// The requested URL
        url: String,
    },

    /// The URL could not be parsed
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Parser message
        reason: String,
    },
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => FetchError::HttpStatus {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None => FetchError::Network(e.to_string()),
        }
    }
}

/// Markup parsing errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The page no longer has the structural markers the parser relies on
    #[error("page structure changed: {0}")]
    StructureChanged(String),
}

/// Hoster resolution errors
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The detail page exists but exposes no download blocks yet
    #[error("no hoster links available yet for {detail_url}")]
    NoLinksYet {
        /// The detail page that was checked
        detail_url: String,
    },

    /// Detail URL is not absolute
    #[error("detail URL is not absolute: {detail_url}")]
    InvalidDetailUrl {
        /// The rejected URL
        detail_url: String,
    },

    /// Detail page could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Detail page could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Debrid API errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UnrestrictError {
    /// No API token is configured
    #[error("no debrid API token configured")]
    MissingToken,

    /// The API call failed or returned an unusable response
    #[error("debrid API error: {0}")]
    ApiError(String),
}

/// How an external download manager process failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProcessFailure {
    /// The process could not be started (missing binary, permissions)
    #[error("failed to start: {0}")]
    FailedToStart(String),

    /// The process was terminated by a signal
    #[error("crashed (signal {signal:?})")]
    Crashed {
        /// Terminating signal, when the platform reports one
        signal: Option<i32>,
    },

    /// The process did not finish within the configured timeout
    #[error("timed out after {millis}ms")]
    TimedOut {
        /// Timeout that elapsed, in milliseconds
        millis: u64,
    },

    /// Waiting on the process or reading its output failed
    #[error("I/O error: {0}")]
    Io(String),

    /// The process exited normally with a non-zero code
    #[error("exited with code {0}")]
    ExitCode(i32),
}

/// Dispatch errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Refused to dispatch an empty URL
    #[error("refusing to dispatch an empty URL")]
    EmptyUrl,

    /// External download manager process failed
    #[error("{manager} process failed: {failure}")]
    ProcessFailed {
        /// Manager name (e.g. "idm")
        manager: String,
        /// Failure classification
        failure: ProcessFailure,
    },

    /// aria2 rejected the JSON-RPC call or was unreachable
    #[error("aria2 RPC rejected: {0}")]
    RpcRejected(String),

    /// pyLoad rejected the API call or was unreachable
    #[error("pyLoad API rejected: {0}")]
    ApiRejected(String),

    /// The configured command template could not be turned into a command line
    #[error("invalid command template: {0}")]
    InvalidCommand(String),
}

/// Built-in downloader errors
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The server did not report a usable Content-Length
    #[error("no Content-Length in response from {url}")]
    NoContentLength {
        /// The requested URL
        url: String,
    },

    /// The body ended before Content-Length bytes arrived
    #[error("transfer ended after {received} of {expected} bytes")]
    Truncated {
        /// Announced Content-Length
        expected: u64,
        /// Bytes actually received
        received: u64,
    },

    /// Writing the destination file failed
    #[error("I/O failure at {path}: {source}")]
    Io {
        /// Destination path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Opening the stream failed
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
