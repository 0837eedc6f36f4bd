use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reconnoiter_core::TrackerConfig;
use reconnoiter_engine::{ApiSettings, ChannelSettings, DEFAULT_CHANNEL};
use reconnoiter_logging::recon_info;
use ron::extensions::Extensions;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::cli::Cli;

pub const DEFAULT_CONFIG_FILE: &str = "reconnoiter.ron";

pub const ENV_API_URL: &str = "RECONNOITER_API_URL";
pub const ENV_WS_URL: &str = "RECONNOITER_WS_URL";
pub const ENV_SITE_URL: &str = "RECONNOITER_SITE_URL";
pub const ENV_API_KEY: &str = "RECONNOITER_API_KEY";
pub const ENV_TOKEN: &str = "RECONNOITER_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("{name} is not a valid url: {value:?} ({source})")]
    InvalidUrl {
        name: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Settings for one run of the binary.
///
/// Layered: built-in defaults, the RON file, `RECONNOITER_*` environment
/// variables, then command line flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub api_url: String,
    pub ws_url: String,
    pub site_url: String,
    pub channel: String,
    pub api_key: Option<String>,
    pub user_token: Option<String>,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub navigation_delay_ms: u64,
    pub max_query_len: usize,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let tracker = TrackerConfig::default();
        Self {
            api_url: "http://localhost:3001/api".to_string(),
            ws_url: "ws://localhost:3001/cable".to_string(),
            site_url: "http://localhost:3001".to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            api_key: None,
            user_token: None,
            poll_interval_ms: tracker.poll_interval.as_millis() as u64,
            connect_timeout_ms: tracker.connect_timeout.as_millis() as u64,
            navigation_delay_ms: tracker.navigation_delay.as_millis() as u64,
            max_query_len: tracker.max_query_len,
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        recon_info!("loaded settings from {:?}", path);
        Ok(config)
    }

    /// Optional fields may be written without `Some(..)`.
    pub fn parse(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(text)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(value) = lookup(ENV_API_URL) {
            self.api_url = value;
        }
        if let Some(value) = lookup(ENV_WS_URL) {
            self.ws_url = value;
        }
        if let Some(value) = lookup(ENV_SITE_URL) {
            self.site_url = value;
        }
        if let Some(value) = lookup(ENV_API_KEY) {
            self.api_key = Some(value);
        }
        if let Some(value) = lookup(ENV_TOKEN) {
            self.user_token = Some(value);
        }
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(value) = &cli.api_url {
            self.api_url = value.clone();
        }
        if let Some(value) = &cli.ws_url {
            self.ws_url = value.clone();
        }
        if let Some(value) = &cli.site_url {
            self.site_url = value.clone();
        }
        if let Some(value) = &cli.api_key {
            self.api_key = Some(value.clone());
        }
        if let Some(value) = &cli.token {
            self.user_token = Some(value.clone());
        }
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            navigation_delay: Duration::from_millis(self.navigation_delay_ms),
            max_query_len: self.max_query_len,
        }
    }

    pub fn api_settings(&self) -> Result<ApiSettings, ConfigError> {
        let mut settings = ApiSettings::new(parse_url("api_url", &self.api_url)?);
        settings.api_key = self.api_key.clone();
        settings.user_token = self.user_token.clone();
        settings.request_timeout = Duration::from_secs(self.request_timeout_secs);
        Ok(settings)
    }

    pub fn channel_settings(&self) -> Result<ChannelSettings, ConfigError> {
        let mut settings = ChannelSettings::new(parse_url("ws_url", &self.ws_url)?);
        settings.channel = self.channel.clone();
        Ok(settings)
    }

    pub fn site_url(&self) -> Result<Url, ConfigError> {
        parse_url("site_url", &self.site_url)
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
        source,
    })
}
