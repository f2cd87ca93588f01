//! Hand-off of final URLs to a download manager
//!
//! [`Dispatcher::dispatch`] routes a URL to exactly one manager, chosen by the
//! [`DownloadManagerConfig`] variant:
//!
//! | Manager | Outcome |
//! |---------|---------|
//! | built-in | [`DispatchOutcome::Started`] with a [`DownloadHandle`] |
//! | aria2, pyLoad | [`DispatchOutcome::Confirmation`], `accepted: false` on any failure |
//! | IDM, KGet, Persepolis | [`DispatchOutcome::Launched`], or [`DispatchError::ProcessFailed`] |

mod aria2;
mod process;
mod pyload;

pub use aria2::Aria2Client;
pub use process::{ManagerCommand, tokenize};
pub use pyload::PyloadClient;

use crate::config::{DispatchConfig, DownloadManagerConfig, ManagerKind};
use crate::direct_download::{DirectDownloader, DownloadHandle, default_destination};
use crate::error::DispatchError;
use std::path::PathBuf;
use tracing::{info, warn};

/// Result of a successful dispatch
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The built-in downloader started; follow it through the handle
    Started(DownloadHandle),

    /// A network manager answered
    Confirmation {
        /// Manager that was called
        manager: ManagerKind,
        /// Whether the manager took the link
        accepted: bool,
        /// GID, package id, or the rejection reason
        detail: String,
    },

    /// An external manager process ran and exited cleanly
    Launched {
        /// Manager that was launched
        manager: ManagerKind,
    },
}

impl DispatchOutcome {
    /// Whether the link was handed off successfully
    pub fn is_accepted(&self) -> bool {
        match self {
            DispatchOutcome::Started(_) | DispatchOutcome::Launched { .. } => true,
            DispatchOutcome::Confirmation { accepted, .. } => *accepted,
        }
    }
}

/// Routes final URLs to the configured download manager
#[derive(Clone, Debug)]
pub struct Dispatcher {
    manager: DownloadManagerConfig,
    settings: DispatchConfig,
    client: reqwest::Client,
    downloader: DirectDownloader,
}

impl Dispatcher {
    /// Create a dispatcher
    ///
    /// `client` is used for aria2 and pyLoad calls; `downloader` serves the
    /// built-in manager.
    pub fn new(
        manager: DownloadManagerConfig,
        settings: DispatchConfig,
        client: reqwest::Client,
        downloader: DirectDownloader,
    ) -> Self {
        Self {
            manager,
            settings,
            client,
            downloader,
        }
    }

    /// The configured manager kind
    pub fn manager_kind(&self) -> ManagerKind {
        self.manager.kind()
    }

    /// Hand `url` to the configured manager
    ///
    /// `dest` only applies to the built-in downloader; without it the file is
    /// named after the URL's last path segment inside the download directory.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::EmptyUrl`] for a blank URL, before anything else happens
    /// - [`DispatchError::InvalidCommand`] for an unusable process template
    /// - [`DispatchError::ProcessFailed`] when a manager process fails
    pub async fn dispatch(
        &self,
        url: &str,
        dest: Option<PathBuf>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DispatchError::EmptyUrl);
        }
        let kind = self.manager.kind();
        info!(manager = %kind, url = %url, "dispatching download");

        match &self.manager {
            DownloadManagerConfig::Builtin { download_dir } => {
                let dest = dest.unwrap_or_else(|| default_destination(url, download_dir));
                Ok(DispatchOutcome::Started(self.downloader.spawn(url, dest)))
            }
            DownloadManagerConfig::Aria2(config) => {
                let rpc = Aria2Client::new(self.client.clone(), config);
                Ok(confirmation(kind, rpc.add_uri(url).await))
            }
            DownloadManagerConfig::Pyload(config) => {
                let api = PyloadClient::new(self.client.clone(), config);
                let result = api
                    .add_package(&self.settings.package_name, &[url])
                    .await
                    .map(|package| package.to_string());
                Ok(confirmation(kind, result))
            }
            DownloadManagerConfig::Idm { .. }
            | DownloadManagerConfig::Kget { .. }
            | DownloadManagerConfig::Persepolis { .. } => {
                let command = ManagerCommand::for_config(&self.manager, url)?.ok_or_else(|| {
                    DispatchError::InvalidCommand(format!("{kind} has no command template"))
                })?;
                command
                    .run(self.settings.process_timeout)
                    .await
                    .map_err(|failure| DispatchError::ProcessFailed {
                        manager: kind.to_string(),
                        failure,
                    })?;
                Ok(DispatchOutcome::Launched { manager: kind })
            }
        }
    }
}

fn confirmation(manager: ManagerKind, result: Result<String, DispatchError>) -> DispatchOutcome {
    match result {
        Ok(detail) => DispatchOutcome::Confirmation {
            manager,
            accepted: true,
            detail,
        },
        Err(e) => {
            warn!(manager = %manager, error = %e, "download manager rejected link");
            DispatchOutcome::Confirmation {
                manager,
                accepted: false,
                detail: e.to_string(),
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Aria2Config;
    use crate::types::DownloadEvent;

    fn dispatcher(manager: DownloadManagerConfig) -> Dispatcher {
        let client = reqwest::Client::new();
        Dispatcher::new(
            manager,
            DispatchConfig::default(),
            client.clone(),
            DirectDownloader::new(client, 8),
        )
    }

    #[tokio::test]
    async fn blank_url_is_rejected_for_every_manager() {
        for manager in [
            DownloadManagerConfig::default(),
            DownloadManagerConfig::Aria2(Aria2Config::default()),
            DownloadManagerConfig::Kget {
                command: "kget".into(),
            },
        ] {
            let err = dispatcher(manager).dispatch("  ", None).await.unwrap_err();
            assert_eq!(err, DispatchError::EmptyUrl);
        }
    }

    #[tokio::test]
    async fn unreachable_aria2_is_a_false_confirmation() {
        let outcome = dispatcher(DownloadManagerConfig::Aria2(Aria2Config {
            host: "http://127.0.0.1".into(),
            port: 1,
            ..Default::default()
        }))
        .dispatch("https://dl.example/f.mkv", None)
        .await
        .unwrap();

        assert!(!outcome.is_accepted());
        assert!(matches!(
            outcome,
            DispatchOutcome::Confirmation {
                manager: ManagerKind::Aria2,
                accepted: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn builtin_derives_destination_from_url() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 10]))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();

        let outcome = dispatcher(DownloadManagerConfig::Builtin {
            download_dir: dir.path().to_path_buf(),
        })
        .dispatch(&format!("{}/d/abc/episode.mkv", server.uri()), None)
        .await
        .unwrap();

        let DispatchOutcome::Started(handle) = outcome else {
            panic!("expected built-in download");
        };
        assert_eq!(handle.path(), dir.path().join("episode.mkv"));
        assert!(matches!(
            handle.join().await.unwrap(),
            DownloadEvent::Complete { bytes_done: 10, .. }
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_process_is_process_failed() {
        let err = dispatcher(DownloadManagerConfig::Persepolis {
            command: "false".into(),
        })
        .dispatch("https://dl.example/f.mkv", None)
        .await
        .unwrap_err();

        assert_eq!(
            err,
            DispatchError::ProcessFailed {
                manager: "persepolis".into(),
                failure: crate::error::ProcessFailure::ExitCode(1),
            }
        );
    }
}
