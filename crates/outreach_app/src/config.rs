use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use outreach_core::MIN_QUERY_LEN;
use outreach_engine::{
    LookupSettings, StreamSettings, DEFAULT_LOOKUP_ENDPOINT, DEFAULT_STREAM_ENDPOINT,
};
use outreach_logging::{outreach_info, outreach_warn};
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "outreach.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub endpoint: String,
    pub connect_timeout_secs: u64,
    /// `None` or `Some(0)` waits for the next event forever.
    pub idle_timeout_secs: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_STREAM_ENDPOINT.to_string(),
            connect_timeout_secs: 10,
            idle_timeout_secs: Some(120),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub debounce_ms: u64,
    pub min_query_len: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LOOKUP_ENDPOINT.to_string(),
            request_timeout_secs: 10,
            debounce_ms: 300,
            min_query_len: MIN_QUERY_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub stream: StreamConfig,
    pub lookup: LookupConfig,
}

impl AppConfig {
    /// Loads `explicit` if given, otherwise `outreach.ron` from the working
    /// directory. Only the implicit file may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::read(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                match Self::read(path) {
                    Err(ConfigError::Read { source, .. })
                        if source.kind() == io::ErrorKind::NotFound =>
                    {
                        Ok(Self::default())
                    }
                    other => other,
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ron::from_str(&content).map_err(|err| {
            outreach_warn!("Failed to parse config from {:?}: {}", path, err);
            ConfigError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
        })?;
        outreach_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            endpoint: self.stream.endpoint.clone(),
            connect_timeout: Duration::from_secs(self.stream.connect_timeout_secs),
            idle_timeout: self
                .stream
                .idle_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            ..StreamSettings::default()
        }
    }

    pub fn lookup_settings(&self) -> LookupSettings {
        LookupSettings {
            endpoint: self.lookup.endpoint.clone(),
            request_timeout: Duration::from_secs(self.lookup.request_timeout_secs),
            debounce: Duration::from_millis(self.lookup.debounce_ms),
            min_query_len: self.lookup.min_query_len,
        }
    }
}
