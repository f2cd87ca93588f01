//! The [`TvLinker`] facade

use crate::config::Config;
use crate::debrid::RealDebridClient;
use crate::direct_download::DirectDownloader;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::error::Result;
use crate::fetcher::{HttpFetcher, PageFetcher, build_client};
use crate::hosters::HosterResolver;
use crate::parser::ParserChain;
use crate::scrape::{ListingScraper, ScrapeHandle};
use crate::task::TaskHandle;
use crate::types::{HostInfo, HostStatus, HosterLink, ResolvedDownload};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Entry point for front-ends
///
/// Owns one instance of every pipeline component, each holding its own
/// snapshot of the configuration given to [`TvLinker::new`]. Every action
/// spawns its own task and returns a handle immediately; the caller decides
/// whether to await, poll or cancel it. Nothing stops the caller from
/// starting the same action twice.
#[derive(Clone, Debug)]
pub struct TvLinker {
    config: Config,
    scraper: ListingScraper,
    resolver: HosterResolver,
    debrid: RealDebridClient,
    dispatcher: Dispatcher,
}

impl TvLinker {
    /// Validate `config` and build the pipeline
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) when validation fails
    /// or an HTTP client cannot be built (e.g. an unusable proxy URL).
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher = HttpFetcher::new(&config.http)?;
        let downloader =
            DirectDownloader::new(fetcher.client().clone(), config.dispatch.event_buffer);
        Self::assemble(config, Arc::new(fetcher), downloader)
    }

    /// Build the pipeline around a custom page fetcher
    ///
    /// Downloads, debrid and RPC calls still use reqwest.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        config.validate()?;
        let client = build_client(&config.http, true)?;
        let downloader = DirectDownloader::new(client, config.dispatch.event_buffer);
        Self::assemble(config, fetcher, downloader)
    }

    fn assemble(
        config: Config,
        fetcher: Arc<dyn PageFetcher>,
        downloader: DirectDownloader,
    ) -> Result<Self> {
        let parser = Arc::new(ParserChain::default());
        let scraper = ListingScraper::new(fetcher.clone(), parser.clone(), config.scrape.clone());
        let resolver = HosterResolver::new(fetcher, parser);
        let debrid = RealDebridClient::new(&config.realdebrid, &config.http)?;

        // aria2 and pyLoad run locally; never route them through the proxy
        let rpc_client = build_client(&config.http, false)?;
        let dispatcher = Dispatcher::new(
            config.download_manager.clone(),
            config.dispatch.clone(),
            rpc_client,
            downloader,
        );

        info!(
            manager = %config.download_manager.kind(),
            debrid = config.realdebrid.is_enabled(),
            proxy = config.http.proxy.is_some(),
            "tvlinker ready"
        );

        Ok(Self {
            config,
            scraper,
            resolver,
            debrid,
            dispatcher,
        })
    }

    /// The configuration snapshot this instance was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scrape every configured listing page
    pub fn start_scraping(&self) -> ScrapeHandle {
        self.scraper.spawn()
    }

    /// List the hoster links of a release
    pub fn resolve_hosters(&self, detail_url: &str) -> TaskHandle<Vec<HosterLink>> {
        let resolver = self.resolver.clone();
        let detail_url = detail_url.to_string();
        TaskHandle::spawn(async move { Ok(resolver.resolve(&detail_url).await?) })
    }

    /// Unrestrict `link` when a debrid token is configured
    pub fn prepare_download(&self, link: &str) -> TaskHandle<ResolvedDownload> {
        let debrid = self.debrid.clone();
        let link = link.to_string();
        TaskHandle::spawn(async move { Ok(debrid.prepare(&link).await?) })
    }

    /// Unrestrict `link` if possible and hand it to the configured manager
    ///
    /// An unrestrict failure aborts before anything is dispatched. `dest`
    /// applies to the built-in downloader only.
    pub fn download_link(&self, link: &str, dest: Option<PathBuf>) -> TaskHandle<DispatchOutcome> {
        let debrid = self.debrid.clone();
        let dispatcher = self.dispatcher.clone();
        let link = link.to_string();
        TaskHandle::spawn(async move {
            let download = debrid.prepare(&link).await?;
            Ok(dispatcher.dispatch(&download.final_url, dest).await?)
        })
    }

    /// The URL a front-end should put on the clipboard for `link`
    ///
    /// Same as [`prepare_download`](Self::prepare_download) but yields only
    /// the final URL.
    pub fn copy_link(&self, link: &str) -> TaskHandle<String> {
        let debrid = self.debrid.clone();
        let link = link.to_string();
        TaskHandle::spawn(async move { Ok(debrid.prepare(&link).await?.final_url) })
    }

    /// Hosters the debrid service supports
    pub fn supported_hosts(&self) -> TaskHandle<HashMap<String, HostInfo>> {
        let debrid = self.debrid.clone();
        TaskHandle::spawn(async move { Ok(debrid.supported_hosts().await?) })
    }

    /// Up/down status of the debrid service's hosters
    pub fn host_status(&self) -> TaskHandle<HashMap<String, HostStatus>> {
        let debrid = self.debrid.clone();
        TaskHandle::spawn(async move { Ok(debrid.host_status().await?) })
    }
}
