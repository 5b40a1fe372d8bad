use chat_markdown_engine::{
    Options,
    context::{DEFAULT_EMOJI_BASE_URL, DEFAULT_MAX_DEPTH},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides the config file location. Shell variables and `~` are expanded.
pub const CONFIG_PATH_ENV: &str = "CHAT_MARKDOWN_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Render settings that can live in a file. Missing keys take the engine defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub escape_html: bool,
    pub entities_only: bool,
    pub emoji_base_url: String,
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            escape_html: true,
            entities_only: false,
            emoji_base_url: DEFAULT_EMOJI_BASE_URL.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            log::debug!("no config file at {}", config_path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        log::debug!("loaded config from {}: {config:?}", config_path.display());
        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        if let Ok(custom) = std::env::var(CONFIG_PATH_ENV)
            && let Some(expanded) = Self::expand_path(Path::new(&custom))
        {
            return expanded;
        }
        let config_dir = shellexpand::tilde("~/.config/chat-markdown");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Engine options for these settings. Resolvers and the code-class hook
    /// are code, so they stay at their defaults.
    pub fn to_options(&self) -> Options {
        Options {
            escape_html: self.escape_html,
            entities_only: self.entities_only,
            emoji_base_url: self.emoji_base_url.clone(),
            max_depth: self.max_depth,
            ..Options::default()
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
