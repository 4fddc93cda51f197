//! Configuration loading and store factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use pillarscore_core::recorder::{RecorderConfig, DEFAULT_MAX_TOKEN_ATTEMPTS};
use pillarscore_core::traits::ResponseStore;

use crate::file::FileStore;
use crate::memory::MemoryStore;
use crate::rest::RestStore;

/// Which persistence backend to use.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Memory,
    File {
        #[serde(default = "default_store_dir")]
        path: PathBuf,
    },
    Rest {
        base_url: String,
        #[serde(default)]
        api_key: String,
    },
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Memory => f.debug_struct("Memory").finish(),
            StoreConfig::File { path } => f.debug_struct("File").field("path", path).finish(),
            StoreConfig::Rest {
                base_url,
                api_key: _,
            } => f
                .debug_struct("Rest")
                .field("base_url", base_url)
                .field("api_key", &"***")
                .finish(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            path: default_store_dir(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("./pillarscore-data")
}

/// Top-level pillarscore configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PillarscoreConfig {
    /// Where responses and diagnostics are recorded.
    #[serde(default)]
    pub store: StoreConfig,
    /// Share-token draws before recording gives up.
    #[serde(default = "default_max_token_attempts")]
    pub max_token_attempts: u32,
    /// Base of the public share link.
    #[serde(default = "default_share_base_url")]
    pub share_base_url: String,
    /// Form used when a command is not given `--form`.
    #[serde(default)]
    pub default_form: Option<PathBuf>,
}

fn default_max_token_attempts() -> u32 {
    DEFAULT_MAX_TOKEN_ATTEMPTS
}
fn default_share_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for PillarscoreConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            max_token_attempts: default_max_token_attempts(),
            share_base_url: default_share_base_url(),
            default_form: None,
        }
    }
}

impl PillarscoreConfig {
    pub fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig {
            max_token_attempts: self.max_token_attempts,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are inserted verbatim; references inside them are not
/// expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut cursor = 0;
    while let Some(offset) = result[cursor..].find("${") {
        let start = cursor + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        cursor = start + value.len();
    }
    result
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Memory => StoreConfig::Memory,
        StoreConfig::File { path } => StoreConfig::File {
            path: PathBuf::from(resolve_env_vars(&path.to_string_lossy())),
        },
        StoreConfig::Rest { base_url, api_key } => StoreConfig::Rest {
            base_url: resolve_env_vars(base_url),
            api_key: resolve_env_vars(api_key),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `pillarscore.toml` in the current directory
/// 2. `~/.config/pillarscore/config.toml`
///
/// Environment variable overrides: `PILLARSCORE_API_KEY`, `PILLARSCORE_STORE_DIR`.
pub fn load_config() -> Result<PillarscoreConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PillarscoreConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("pillarscore.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => PillarscoreConfig::default(),
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

fn parse_config(content: &str) -> Result<PillarscoreConfig> {
    let mut config: PillarscoreConfig = toml::from_str(content)?;
    config.store = resolve_store_config(&config.store);
    config.share_base_url = resolve_env_vars(&config.share_base_url);
    if config.max_token_attempts == 0 {
        anyhow::bail!("max_token_attempts must be at least 1");
    }
    Ok(config)
}

fn apply_env_overrides(config: &mut PillarscoreConfig) {
    if let Ok(key) = std::env::var("PILLARSCORE_API_KEY") {
        if let StoreConfig::Rest { api_key, .. } = &mut config.store {
            *api_key = key;
        }
    }

    if let Ok(dir) = std::env::var("PILLARSCORE_STORE_DIR") {
        match &mut config.store {
            StoreConfig::File { path } => *path = PathBuf::from(dir),
            StoreConfig::Memory => {
                config.store = StoreConfig::File {
                    path: PathBuf::from(dir),
                }
            }
            StoreConfig::Rest { .. } => {
                tracing::warn!("PILLARSCORE_STORE_DIR ignored: store is configured as rest");
            }
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("pillarscore"))
}

/// Create a store instance from its configuration.
pub fn create_store(config: &StoreConfig) -> Result<Box<dyn ResponseStore>> {
    match config {
        StoreConfig::Memory => Ok(Box::new(MemoryStore::new())),
        StoreConfig::File { path } => Ok(Box::new(FileStore::new(path))),
        StoreConfig::Rest { base_url, api_key } => {
            if api_key.is_empty() {
                anyhow::bail!("rest store requires an api_key (or PILLARSCORE_API_KEY)");
            }
            Ok(Box::new(RestStore::new(base_url, api_key)?))
        }
    }
}
