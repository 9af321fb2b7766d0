use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use panel_core::ApiError;
use panel_engine::{ClientSettings, DEFAULT_API_PREFIX, DEFAULT_BASE_URL};
use serde::Deserialize;
use thiserror::Error;

use super::logging::LogDestination;

/// Looked up in the working directory when no `--config` is given.
pub const CONFIG_FILENAME: &str = "arxiv_panel.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub base_url: String,
    pub api_prefix: String,
    pub reports_dir: PathBuf,
    pub log_destination: LogDestination,
    pub log_level: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: Option<u64>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            reports_dir: PathBuf::from("reports"),
            log_destination: LogDestination::File,
            log_level: "info".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: None,
        }
    }
}

impl PanelConfig {
    /// Reads `explicit`, or `arxiv_panel.ron` when it exists.
    ///
    /// A missing default file yields the defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(CONFIG_FILENAME);
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|message| ConfigError::Parse { path, message })
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        ron::from_str(content).map_err(|err| err.to_string())
    }

    pub fn level(&self) -> LevelFilter {
        panel_logging::parse_level(&self.log_level)
    }

    pub fn client_settings(&self) -> Result<ClientSettings, ApiError> {
        let mut settings = ClientSettings::new(&self.base_url)?;
        settings.api_prefix = self.api_prefix.clone();
        settings.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        settings.request_timeout = self.request_timeout_secs.map(Duration::from_secs);
        Ok(settings)
    }
}
