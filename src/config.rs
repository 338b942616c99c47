// Configuration loading.
// Reads an optional YAML file layered over built-in defaults for host, cache, and datasets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::api::client::DEFAULT_TIMEOUT;
use crate::cache::default_cache_dir;
use crate::error::{AcquireError, Result};

/// Default API host.
pub const DEFAULT_HOST: &str = "https://python.zgulde.net/";

/// Environment variable overriding the configured host.
pub const HOST_ENV: &str = "ACQUIRE_HOST";

/// How a dataset is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DatasetSource {
    /// A paginated JSON endpoint under the configured host.
    Api {
        endpoint: String,
        records_field: String,
    },
    /// A single CSV document at an absolute URL.
    Csv { url: String },
}

impl DatasetSource {
    fn api(endpoint: &str, records_field: &str) -> Self {
        DatasetSource::Api {
            endpoint: endpoint.to_string(),
            records_field: records_field.to_string(),
        }
    }

    /// Short human description for listings.
    pub fn describe(&self) -> String {
        match self {
            DatasetSource::Api {
                endpoint,
                records_field,
            } => format!("api {} [{}]", endpoint, records_field),
            DatasetSource::Csv { url } => format!("csv {}", url),
        }
    }
}

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    /// Explicit cache directory; `None` uses the platform cache directory.
    pub cache_dir: Option<PathBuf>,
    pub timeout_secs: u64,
    pub datasets: BTreeMap<String, DatasetSource>,
}

impl Default for Config {
    fn default() -> Self {
        let mut datasets = BTreeMap::new();
        datasets.insert("items".to_string(), DatasetSource::api("api/v1/items", "items"));
        datasets.insert("stores".to_string(), DatasetSource::api("api/v1/stores", "stores"));
        datasets.insert("sales".to_string(), DatasetSource::api("api/v1/sales", "sales"));
        datasets.insert(
            "opsd".to_string(),
            DatasetSource::Csv {
                url: "https://raw.githubusercontent.com/jenfly/opsd/master/opsd_germany_daily.csv"
                    .to_string(),
            },
        );

        Self {
            host: DEFAULT_HOST.to_string(),
            cache_dir: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            datasets,
        }
    }
}

/// On-disk shape: every field optional, datasets merge over the built-ins.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    host: Option<String>,
    cache_dir: Option<PathBuf>,
    timeout_secs: Option<u64>,
    #[serde(default)]
    datasets: BTreeMap<String, DatasetSource>,
}

impl Config {
    /// Load configuration.
    ///
    /// Search order:
    /// 1. Explicit path if provided (must exist)
    /// 2. ./acquire.yaml (current directory)
    /// 3. $XDG_CONFIG_HOME/acquire/config.yaml
    ///
    /// With no file found the built-in defaults are used. `ACQUIRE_HOST`
    /// overrides the host either way.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = match explicit_path {
            Some(p) if p.exists() => Some(p.to_path_buf()),
            Some(p) => {
                return Err(AcquireError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            None => Self::find_config_file(),
        };

        let mut config = match path {
            Some(p) => Self::load_from_path(&p)?,
            None => Config::default(),
        };

        if let Ok(host) = std::env::var(HOST_ENV) {
            config.host = host;
        }

        config.validate()?;
        Ok(config)
    }

    fn find_config_file() -> Option<PathBuf> {
        // Check current directory
        let local = PathBuf::from("acquire.yaml");
        if local.exists() {
            return Some(local);
        }

        // Check XDG config directory
        if let Some(dirs) = directories::BaseDirs::new() {
            let xdg_path = dirs.config_dir().join("acquire").join("config.yaml");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        None
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AcquireError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_yaml(&contents).map_err(|e| {
            AcquireError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Parse YAML and layer it over the defaults.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Self::parse_yaml(contents)
            .map_err(|e| AcquireError::Config(format!("failed to parse config: {}", e)))
    }

    fn parse_yaml(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // An empty file is a valid "use the defaults" config.
        let file: FileConfig = if contents.trim().is_empty() {
            FileConfig::default()
        } else {
            serde_yaml::from_str(contents)?
        };

        let mut config = Config::default();
        if let Some(host) = file.host {
            config.host = host;
        }
        if file.cache_dir.is_some() {
            config.cache_dir = file.cache_dir;
        }
        if let Some(timeout_secs) = file.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        config.datasets.extend(file.datasets);

        Ok(config)
    }

    /// Check values that can only be validated after merging.
    pub fn validate(&self) -> Result<()> {
        self.host_url()?;

        if self.timeout_secs == 0 {
            return Err(AcquireError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        for (name, source) in &self.datasets {
            match source {
                DatasetSource::Api { records_field, .. } if records_field.is_empty() => {
                    return Err(AcquireError::Config(format!(
                        "dataset {} has an empty records_field",
                        name
                    )));
                }
                DatasetSource::Csv { url } => {
                    Url::parse(url).map_err(|e| {
                        AcquireError::Config(format!("dataset {} has invalid url: {}", name, e))
                    })?;
                }
                DatasetSource::Api { .. } => {}
            }
        }

        Ok(())
    }

    /// The API host as a URL.
    pub fn host_url(&self) -> Result<Url> {
        Url::parse(&self.host)
            .map_err(|e| AcquireError::Config(format!("invalid host {:?}: {}", self.host, e)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Directory holding cache files: configured, platform default, or the working directory.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .or_else(default_cache_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
