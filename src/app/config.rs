use anyhow::{Context, Result};
use clap::ValueEnum;
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::{
    CONFIG_ENV_PREFIX, DEFAULT_API_BASE_URL, HTTP_REQUEST_TIMEOUT_SECS, LOCAL_CONFIG_PATH,
    TOKEN_FILE_NAME,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Chat behaviour
    #[serde(default)]
    pub chat: ChatConfig,

    /// Credential cache
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint is appended to
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: HTTP_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Display language sent along with every chat message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Chat behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub language: Language,
    /// Whether new sessions start visible to the professional
    pub default_visibility: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            language: Language::En,
            default_visibility: true,
        }
    }
}

/// Credential cache settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Override for the token cache location
    pub token_file: Option<PathBuf>,
}

impl Config {
    /// Resolve where the token cache lives
    pub fn token_file(&self) -> Result<PathBuf> {
        match &self.auth.token_file {
            Some(path) => Ok(path.clone()),
            None => Ok(get_config_dir()?.join(TOKEN_FILE_NAME)),
        }
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    let global_config = get_config_dir()?.join("config.toml");
    let local_config = PathBuf::from(LOCAL_CONFIG_PATH);
    load_config_from(&[global_config, local_config])
}

/// Layer defaults, the given TOML files (later wins), then `HAMO_` env vars
pub fn load_config_from(files: &[PathBuf]) -> Result<Config> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    for file in files {
        if file.exists() {
            figment = figment.merge(Toml::file(file));
        }
    }

    // HAMO_API__BASE_URL -> api.base_url
    figment = figment.merge(Env::prefixed(CONFIG_ENV_PREFIX).split("__"));

    figment.extract().context("Failed to load configuration")
}

/// Load a single TOML file given on the command line
pub fn load_config_file(path: &Path) -> Result<Config> {
    let toml_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    toml::from_str(&toml_str).with_context(|| format!("Invalid config in {}", path.display()))
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "hamo") {
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    } else {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let config_dir = PathBuf::from(home).join(".config").join("hamo");
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<PathBuf> {
    let config_file = get_config_dir()?.join("config.toml");

    if !config_file.exists() {
        save_config(&Config::default(), Some(config_file.clone()))?;
    }

    Ok(config_file)
}
