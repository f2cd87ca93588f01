//! Test configuration helpers pointing the pipeline at a mock server

use std::path::Path;
use tvlinker::Config;
use tvlinker::config::{Aria2Config, DownloadManagerConfig, PyloadConfig};
use wiremock::MockServer;

/// Listing page path template on the mock server
pub const LISTING_PATH: &str = "/category/tv-shows/page";

/// Config that scrapes `pages` listing pages from `server`
///
/// Real-Debrid points at `/rest/1.0` on the same server with no token, and
/// the built-in downloader writes into `download_dir`.
pub fn mock_config(server: &MockServer, pages: u32, download_dir: &Path) -> Config {
    let mut config = Config::default();
    config.scrape.source_url = format!("{}{}/{{page}}", server.uri(), LISTING_PATH);
    config.scrape.pages = pages;
    config.scrape.links_per_page = 3;
    config.realdebrid.api_url = format!("{}/rest/1.0", server.uri());
    config.realdebrid.api_token = String::new();
    config.download_manager = DownloadManagerConfig::Builtin {
        download_dir: download_dir.to_path_buf(),
    };
    config
}

/// aria2 settings for the RPC endpoint of `server`
pub fn aria2_for(server: &MockServer, secret: &str) -> DownloadManagerConfig {
    DownloadManagerConfig::Aria2(Aria2Config {
        host: "http://127.0.0.1".to_string(),
        port: server.address().port(),
        secret: secret.to_string(),
        ..Default::default()
    })
}

/// pyLoad settings for the API of `server`
pub fn pyload_for(server: &MockServer) -> DownloadManagerConfig {
    DownloadManagerConfig::Pyload(PyloadConfig {
        host: server.uri(),
        username: "admin".to_string(),
        password: "hunter2".to_string(),
    })
}
