use std::{fs, path::PathBuf};

use object_store::{ObjectStoreConfig, RetryConfig};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "replica";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STORE_DIR_NAME: &str = "store";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where replicas are written
    #[serde(default)]
    pub store: ObjectStoreConfig,
    /// Retry bound and backoff for uploads
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.replica)
    pub replica_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.replica)
    pub fn replica_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory.
    ///
    /// Without an explicit config, replicas go to a local store under the
    /// state directory.
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let replica_dir = Self::replica_dir(custom_path)?;
        let config_path = replica_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&replica_dir)?;

        let config = config.unwrap_or_else(|| AppConfig {
            store: ObjectStoreConfig::Local {
                path: replica_dir.join(STORE_DIR_NAME),
            },
            retry: RetryConfig::default(),
        });
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            replica_dir,
            config_path,
            config,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let replica_dir = Self::replica_dir(custom_path)?;

        if !replica_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = replica_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            replica_dir,
            config_path,
            config,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("replica directory not initialized. Run 'replica init' first")]
    NotInitialized,

    #[error("replica directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
