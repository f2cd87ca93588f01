//! Configuration types for tvlinker
//!
//! The library never reads or writes configuration files. A front-end loads
//! its persisted settings however it likes and hands a [`Config`] to
//! [`TvLinker::new`](crate::TvLinker::new); each component keeps its own
//! snapshot from then on.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Placeholder substituted with the page number in [`ScrapeConfig::source_url`]
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Older placeholder forms, in the order they are looked for, and whether
/// every occurrence is replaced
const LEGACY_PLACEHOLDERS: &[(&str, bool)] =
    &[("{0}", true), ("{}", false), ("%s", false), ("%d", false)];

/// Main configuration for [`TvLinker`](crate::TvLinker)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listing source and pagination
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// HTTP client settings shared by every outbound request
    #[serde(default)]
    pub http: HttpConfig,

    /// Debrid service used to unrestrict hoster links
    #[serde(default)]
    pub realdebrid: RealDebridConfig,

    /// Selected download manager and its connection settings
    #[serde(default)]
    pub download_manager: DownloadManagerConfig,

    /// Dispatch and built-in downloader tuning
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl Config {
    /// Check the configuration for values that would fail at first use
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scrape.validate()?;
        if let Some(proxy) = &self.http.proxy {
            proxy.to_reqwest()?;
        }
        self.download_manager.validate()
    }

    /// Build a configuration from the flat key/value pairs of the persisted
    /// settings file
    ///
    /// Keys that are absent keep their defaults. `download_manager` selects
    /// which manager variant is built; unknown names fall back to the
    /// built-in downloader.
    ///
    /// # Examples
    ///
    /// ```
    /// use tvlinker::config::{Config, DownloadManagerConfig};
    ///
    /// let config = Config::from_settings([
    ///     ("source_url", "https://tv.example/page/{page}"),
    ///     ("dl_pagecount", "5"),
    ///     ("download_manager", "aria2"),
    ///     ("aria2_rpc_host", "http://localhost"),
    ///     ("aria2_rpc_port", "6800"),
    ///     ("aria2_rpc_secret", "s3cret"),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(config.scrape.pages, 5);
    /// assert!(matches!(config.download_manager, DownloadManagerConfig::Aria2(_)));
    /// ```
    pub fn from_settings<I, K, V>(settings: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = settings
            .into_iter()
            .map(|(k, v)| (k.into(), v.into().trim().to_string()))
            .collect();
        let get = |key: &str| map.get(key).cloned().unwrap_or_default();

        let mut config = Config::default();

        if let Some(source_url) = map.get("source_url").filter(|v| !v.is_empty()) {
            config.scrape.source_url = source_url.clone();
        }
        if let Some(pages) = map.get("dl_pagecount").filter(|v| !v.is_empty()) {
            config.scrape.pages = pages.parse().map_err(|_| ConfigError::Invalid {
                key: "dl_pagecount".to_string(),
                reason: format!("{pages:?} is not a page count"),
            })?;
        }
        if let Some(user_agent) = map.get("user_agent").filter(|v| !v.is_empty()) {
            config.http.user_agent = user_agent.clone();
        }

        config.realdebrid.api_token = get("realdebrid_apitoken");
        config.realdebrid.use_proxy = parse_bool(&get("realdebrid_apiproxy"));

        let kind: ManagerKind = get("download_manager").parse().unwrap_or_default();
        config.download_manager = match kind {
            ManagerKind::Builtin => DownloadManagerConfig::Builtin {
                download_dir: default_download_dir(),
            },
            ManagerKind::Aria2 => {
                let port = get("aria2_rpc_port");
                DownloadManagerConfig::Aria2(Aria2Config {
                    host: non_empty_or(get("aria2_rpc_host"), default_aria2_host),
                    port: if port.is_empty() {
                        default_aria2_port()
                    } else {
                        port.parse().map_err(|_| ConfigError::Invalid {
                            key: "aria2_rpc_port".to_string(),
                            reason: format!("{port:?} is not a port number"),
                        })?
                    },
                    secret: get("aria2_rpc_secret"),
                    username: get("aria2_rpc_username"),
                    password: get("aria2_rpc_password"),
                })
            }
            ManagerKind::Pyload => DownloadManagerConfig::Pyload(PyloadConfig {
                host: non_empty_or(get("pyload_host"), default_pyload_host),
                username: get("pyload_username"),
                password: get("pyload_password"),
            }),
            ManagerKind::Idm => DownloadManagerConfig::Idm {
                exe_path: PathBuf::from(non_empty_or(get("idm_exe_path"), default_idm_exe_path)),
            },
            ManagerKind::Kget => DownloadManagerConfig::Kget {
                command: non_empty_or(get("kget_cmd"), default_kget_cmd),
            },
            ManagerKind::Persepolis => DownloadManagerConfig::Persepolis {
                command: non_empty_or(get("persepolis_cmd"), default_persepolis_cmd),
            },
        };

        config.validate()?;
        Ok(config)
    }
}

/// Listing source configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Listing URL template; `{page}` (or the legacy `{0}`, `{}`, `%s` and
    /// `%d`) is replaced by the 1-based page number
    #[serde(default = "default_source_url")]
    pub source_url: String,

    /// Number of pages fetched per scrape (default: 20)
    #[serde(default = "default_pages")]
    pub pages: u32,

    /// Rows the source publishes per page, used only for progress estimates (default: 20)
    #[serde(default = "default_links_per_page")]
    pub links_per_page: u32,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            pages: default_pages(),
            links_per_page: default_links_per_page(),
        }
    }
}

impl ScrapeConfig {
    /// URL of the given 1-based listing page
    pub fn page_url(&self, page: u32) -> String {
        let page = page.to_string();
        if self.source_url.contains(PAGE_PLACEHOLDER) {
            return self.source_url.replace(PAGE_PLACEHOLDER, &page);
        }
        match LEGACY_PLACEHOLDERS
            .iter()
            .find(|(p, _)| self.source_url.contains(p))
        {
            Some((p, true)) => self.source_url.replace(p, &page),
            Some((p, false)) => self.source_url.replacen(p, &page, 1),
            None => self.source_url.clone(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.source_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "source_url".to_string(),
            });
        }
        let has_placeholder = self.source_url.contains(PAGE_PLACEHOLDER)
            || LEGACY_PLACEHOLDERS
                .iter()
                .any(|(p, _)| self.source_url.contains(p));
        if !has_placeholder {
            return Err(ConfigError::Invalid {
                key: "source_url".to_string(),
                reason: "no page placeholder ({page}, {0}, {}, %s or %d)".to_string(),
            });
        }
        if self.pages == 0 {
            return Err(ConfigError::Invalid {
                key: "dl_pagecount".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// HTTP client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every page request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional proxy for page fetches and direct downloads
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,

    /// Per-request timeout (default: 30 seconds)
    ///
    /// Applies to page fetches and API calls. Direct downloads are not
    /// bounded by it.
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            proxy: None,
            request_timeout: default_request_timeout(),
        }
    }
}

/// Proxy configuration
///
/// SOCKS5 is the only proxy kind the listing sites have needed, but any URL
/// reqwest accepts (`socks5://`, `socks5h://`, `http://`) works.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy URL, e.g. `socks5://127.0.0.1:1080`
    pub url: String,
}

impl ProxyConfig {
    /// SOCKS5 proxy at the given host and port
    pub fn socks5(host: &str, port: u16) -> Self {
        Self {
            url: format!("socks5://{host}:{port}"),
        }
    }

    /// The default local ShadowSocks client endpoint
    pub fn shadowsocks_local() -> Self {
        Self::socks5("127.0.0.1", 1080)
    }

    pub(crate) fn to_reqwest(&self) -> Result<reqwest::Proxy, ConfigError> {
        reqwest::Proxy::all(&self.url).map_err(|e| ConfigError::Invalid {
            key: "proxy".to_string(),
            reason: e.to_string(),
        })
    }
}

/// Real-Debrid style unrestrict API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RealDebridConfig {
    /// REST API base URL (default: `https://api.real-debrid.com/rest/1.0`)
    #[serde(default = "default_realdebrid_api_url")]
    pub api_url: String,

    /// API token; empty disables unrestriction
    #[serde(default)]
    pub api_token: String,

    /// Route API calls through [`HttpConfig::proxy`] (default: false)
    #[serde(default)]
    pub use_proxy: bool,
}

impl Default for RealDebridConfig {
    fn default() -> Self {
        Self {
            api_url: default_realdebrid_api_url(),
            api_token: String::new(),
            use_proxy: false,
        }
    }
}

impl RealDebridConfig {
    /// Whether a token is configured
    pub fn is_enabled(&self) -> bool {
        !self.api_token.trim().is_empty()
    }
}

/// Download manager selection, one variant per manager kind
///
/// Serialized with a `kind` tag:
///
/// ```json
/// { "kind": "aria2", "host": "http://localhost", "port": 6800, "secret": "s3cret" }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DownloadManagerConfig {
    /// Built-in chunked HTTP downloader
    Builtin {
        /// Directory used when no explicit destination is given
        #[serde(default = "default_download_dir")]
        download_dir: PathBuf,
    },
    /// aria2 JSON-RPC daemon
    Aria2(Aria2Config),
    /// pyLoad HTTP API
    Pyload(PyloadConfig),
    /// Internet Download Manager (Windows)
    Idm {
        /// Path to `IDMan.exe`
        #[serde(default = "default_idm_exe_path_buf")]
        exe_path: PathBuf,
    },
    /// KGet (KDE)
    Kget {
        /// Command used to launch KGet
        #[serde(default = "default_kget_cmd")]
        command: String,
    },
    /// Persepolis
    Persepolis {
        /// Command used to launch Persepolis
        #[serde(default = "default_persepolis_cmd")]
        command: String,
    },
}

impl Default for DownloadManagerConfig {
    fn default() -> Self {
        DownloadManagerConfig::Builtin {
            download_dir: default_download_dir(),
        }
    }
}

impl DownloadManagerConfig {
    /// The manager kind of this configuration
    pub fn kind(&self) -> ManagerKind {
        match self {
            DownloadManagerConfig::Builtin { .. } => ManagerKind::Builtin,
            DownloadManagerConfig::Aria2(_) => ManagerKind::Aria2,
            DownloadManagerConfig::Pyload(_) => ManagerKind::Pyload,
            DownloadManagerConfig::Idm { .. } => ManagerKind::Idm,
            DownloadManagerConfig::Kget { .. } => ManagerKind::Kget,
            DownloadManagerConfig::Persepolis { .. } => ManagerKind::Persepolis,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let missing = |key: &str| {
            Err(ConfigError::Missing {
                key: key.to_string(),
            })
        };
        match self {
            DownloadManagerConfig::Builtin { .. } => Ok(()),
            DownloadManagerConfig::Aria2(aria2) if aria2.host.trim().is_empty() => {
                missing("aria2_rpc_host")
            }
            DownloadManagerConfig::Aria2(_) => Ok(()),
            DownloadManagerConfig::Pyload(pyload) if pyload.host.trim().is_empty() => {
                missing("pyload_host")
            }
            DownloadManagerConfig::Pyload(_) => Ok(()),
            DownloadManagerConfig::Idm { exe_path } if exe_path.as_os_str().is_empty() => {
                missing("idm_exe_path")
            }
            DownloadManagerConfig::Idm { .. } => Ok(()),
            DownloadManagerConfig::Kget { command } if command.trim().is_empty() => {
                missing("kget_cmd")
            }
            DownloadManagerConfig::Kget { .. } => Ok(()),
            DownloadManagerConfig::Persepolis { command } if command.trim().is_empty() => {
                missing("persepolis_cmd")
            }
            DownloadManagerConfig::Persepolis { .. } => Ok(()),
        }
    }
}

/// aria2 RPC connection settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aria2Config {
    /// RPC host, with or without scheme (default: `http://localhost`)
    #[serde(default = "default_aria2_host")]
    pub host: String,

    /// RPC port (default: 6800)
    #[serde(default = "default_aria2_port")]
    pub port: u16,

    /// `--rpc-secret` token
    #[serde(default)]
    pub secret: String,

    /// Legacy `--rpc-user`; takes precedence over the secret when both
    /// username and password are set
    #[serde(default)]
    pub username: String,

    /// Legacy `--rpc-passwd`
    #[serde(default)]
    pub password: String,
}

impl Default for Aria2Config {
    fn default() -> Self {
        Self {
            host: default_aria2_host(),
            port: default_aria2_port(),
            secret: String::new(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// pyLoad API connection settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PyloadConfig {
    /// pyLoad web interface, with or without scheme (default: `http://localhost:8000`)
    #[serde(default = "default_pyload_host")]
    pub host: String,

    /// Login name
    #[serde(default)]
    pub username: String,

    /// Login password
    #[serde(default)]
    pub password: String,
}

impl Default for PyloadConfig {
    fn default() -> Self {
        Self {
            host: default_pyload_host(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Download manager kind
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerKind {
    /// Built-in downloader (default)
    #[default]
    Builtin,
    /// aria2 RPC
    Aria2,
    /// pyLoad
    Pyload,
    /// Internet Download Manager
    Idm,
    /// KGet
    Kget,
    /// Persepolis
    Persepolis,
}

impl ManagerKind {
    /// Lowercase name as stored in the persisted settings
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagerKind::Builtin => "built-in",
            ManagerKind::Aria2 => "aria2",
            ManagerKind::Pyload => "pyload",
            ManagerKind::Idm => "idm",
            ManagerKind::Kget => "kget",
            ManagerKind::Persepolis => "persepolis",
        }
    }
}

impl fmt::Display for ManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManagerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "built-in" | "builtin" => Ok(ManagerKind::Builtin),
            "aria2" => Ok(ManagerKind::Aria2),
            "pyload" => Ok(ManagerKind::Pyload),
            "idm" => Ok(ManagerKind::Idm),
            "kget" => Ok(ManagerKind::Kget),
            "persepolis" => Ok(ManagerKind::Persepolis),
            other => Err(ConfigError::Invalid {
                key: "download_manager".to_string(),
                reason: format!("unknown download manager {other:?}"),
            }),
        }
    }
}

/// Dispatch and built-in downloader tuning
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Package name used when adding links to pyLoad (default: "TVLinker")
    #[serde(default = "default_package_name")]
    pub package_name: String,

    /// Give up waiting on an external manager process after this long
    /// (default: wait indefinitely)
    ///
    /// The process itself is left running when the timeout elapses.
    #[serde(default, with = "optional_duration_serde")]
    pub process_timeout: Option<Duration>,

    /// Capacity of the built-in downloader's event channel (default: 64)
    ///
    /// A full channel pauses the transfer until the consumer catches up.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            package_name: default_package_name(),
            process_timeout: None,
            event_buffer: default_event_buffer(),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn non_empty_or(value: String, default: fn() -> String) -> String {
    if value.is_empty() { default() } else { value }
}

fn default_source_url() -> String {
    "https://tvrelease.example/category/tv-shows/page/{page}".to_string()
}

fn default_pages() -> u32 {
    20
}

fn default_links_per_page() -> u32 {
    20
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
        .to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_realdebrid_api_url() -> String {
    "https://api.real-debrid.com/rest/1.0".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_aria2_host() -> String {
    "http://localhost".to_string()
}

fn default_aria2_port() -> u16 {
    6800
}

fn default_pyload_host() -> String {
    "http://localhost:8000".to_string()
}

fn default_idm_exe_path() -> String {
    r"C:\Program Files (x86)\Internet Download Manager\IDMan.exe".to_string()
}

fn default_idm_exe_path_buf() -> PathBuf {
    PathBuf::from(default_idm_exe_path())
}

fn default_kget_cmd() -> String {
    "kget".to_string()
}

fn default_persepolis_cmd() -> String {
    "persepolis".to_string()
}

fn default_package_name() -> String {
    "TVLinker".to_string()
}

fn default_event_buffer() -> usize {
    64
}

// Duration serialization helper (as seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_substitutes_every_placeholder_style() {
        let mut scrape = ScrapeConfig {
            source_url: "https://tv.example/page/{page}".to_string(),
            ..Default::default()
        };
        assert_eq!(scrape.page_url(3), "https://tv.example/page/3");

        scrape.source_url = "https://tv.example/?paged=%s".to_string();
        assert_eq!(scrape.page_url(12), "https://tv.example/?paged=12");

        scrape.source_url = "https://tv.example/%d/".to_string();
        assert_eq!(scrape.page_url(1), "https://tv.example/1/");

        scrape.source_url = "https://tv.example/?p={}".to_string();
        assert_eq!(scrape.page_url(4), "https://tv.example/?p=4");
    }

    #[test]
    fn from_settings_accepts_positional_format_placeholder() {
        let config = Config::from_settings([(
            "source_url",
            "http://scene-rls.net/releases/index.php?p={0}&cat=TV%20Shows",
        )])
        .unwrap();
        assert_eq!(
            config.scrape.page_url(2),
            "http://scene-rls.net/releases/index.php?p=2&cat=TV%20Shows"
        );
    }

    #[test]
    fn validate_rejects_source_url_without_placeholder() {
        let config = Config {
            scrape: ScrapeConfig {
                source_url: "https://tv.example/latest".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "source_url"));
    }

    #[test]
    fn validate_rejects_zero_pages() {
        let config = Config {
            scrape: ScrapeConfig {
                pages: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_config_is_valid_and_uses_builtin_downloader() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.download_manager.kind(), ManagerKind::Builtin);
        assert!(!config.realdebrid.is_enabled());
    }

    #[test]
    fn from_settings_builds_aria2_variant() {
        let config = Config::from_settings([
            ("source_url", "https://tv.example/page/%s"),
            ("user_agent", "TestAgent/1.0"),
            ("dl_pagecount", "7"),
            ("realdebrid_apitoken", "tok"),
            ("realdebrid_apiproxy", "true"),
            ("download_manager", "aria2"),
            ("aria2_rpc_host", "http://nas.local"),
            ("aria2_rpc_port", "6801"),
            ("aria2_rpc_secret", "s3cret"),
            ("aria2_rpc_username", ""),
            ("aria2_rpc_password", ""),
        ])
        .unwrap();

        assert_eq!(config.scrape.pages, 7);
        assert_eq!(config.http.user_agent, "TestAgent/1.0");
        assert!(config.realdebrid.is_enabled());
        assert!(config.realdebrid.use_proxy);
        assert_eq!(
            config.download_manager,
            DownloadManagerConfig::Aria2(Aria2Config {
                host: "http://nas.local".to_string(),
                port: 6801,
                secret: "s3cret".to_string(),
                username: String::new(),
                password: String::new(),
            })
        );
    }

    #[test]
    fn from_settings_falls_back_to_builtin_for_unknown_manager() {
        let config = Config::from_settings([("download_manager", "flashget")]).unwrap();
        assert_eq!(config.download_manager.kind(), ManagerKind::Builtin);
    }

    #[test]
    fn from_settings_rejects_bad_page_count() {
        let err = Config::from_settings([("dl_pagecount", "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "dl_pagecount"));
    }

    #[test]
    fn from_settings_fills_process_manager_defaults() {
        let config = Config::from_settings([("download_manager", "KGet")]).unwrap();
        assert_eq!(
            config.download_manager,
            DownloadManagerConfig::Kget {
                command: "kget".to_string()
            }
        );

        let config = Config::from_settings([
            ("download_manager", "persepolis"),
            ("persepolis_cmd", "/opt/persepolis/bin/persepolis"),
        ])
        .unwrap();
        assert_eq!(
            config.download_manager,
            DownloadManagerConfig::Persepolis {
                command: "/opt/persepolis/bin/persepolis".to_string()
            }
        );
    }

    #[test]
    fn manager_config_deserializes_from_kind_tag() {
        let json = r#"{"kind":"pyload","host":"http://nas:8000","username":"u","password":"p"}"#;
        let manager: DownloadManagerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(manager.kind(), ManagerKind::Pyload);

        let json = r#"{"kind":"builtin"}"#;
        let manager: DownloadManagerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            manager,
            DownloadManagerConfig::Builtin {
                download_dir: PathBuf::from("downloads")
            }
        );
    }

    #[test]
    fn manager_kind_parses_persisted_names() {
        assert_eq!("built-in".parse::<ManagerKind>().unwrap(), ManagerKind::Builtin);
        assert_eq!("pyLoad".parse::<ManagerKind>().unwrap(), ManagerKind::Pyload);
        assert_eq!("IDM".parse::<ManagerKind>().unwrap(), ManagerKind::Idm);
        assert!("wget".parse::<ManagerKind>().is_err());
    }

    #[test]
    fn proxy_helpers_produce_socks5_urls() {
        assert_eq!(
            ProxyConfig::shadowsocks_local().url,
            "socks5://127.0.0.1:1080"
        );
        ProxyConfig::socks5("proxy.local", 9050).to_reqwest().unwrap();
    }

    #[test]
    fn request_timeout_serializes_as_seconds() {
        let http = HttpConfig::default();
        let json = serde_json::to_value(&http).unwrap();
        assert_eq!(json["request_timeout"], 30);
    }
}
