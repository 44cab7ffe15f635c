//! Configuration file management for vidya.
//!
//! Provides a TOML-based config file at `~/.config/vidya/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use vidya_core::config::{GeminiConfig, ModelConfig, PipelineConfig};

/// Env vars checked for the Gemini API key, in priority order.
///
/// `gemini_api_key` is the lower-case name older `.env` files use.
pub const API_KEY_ENV_VARS: [&str; 3] = ["VIDYA_GEMINI_API_KEY", "GEMINI_API_KEY", "gemini_api_key"];

pub const BASE_URL_ENV: &str = "VIDYA_GEMINI_BASE_URL";
pub const BIND_ENV: &str = "VIDYA_BIND";
pub const PORT_ENV: &str = "VIDYA_PORT";

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub gemini: GeminiSection,
    pub models: ModelsSection,
    pub server: ServerSection,
    pub pipeline: PipelineSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub researcher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesizer: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis_attempts: Option<u32>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the vidya config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/vidya` or `~/.config/vidya`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("vidya");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("vidya")
}

/// Return the path to the vidya config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load the config file at `path`. A missing file is `Ok(None)`; a file
/// that exists but does not parse is an error.
pub fn load_config_from(path: &Path) -> Result<Option<ConfigFile>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read config file at {}", path.display()));
        }
    };
    let config = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // The file may hold the API key.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(path)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Server settings for `vidya serve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub request_timeout: Duration,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct VidyaConfig {
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
}

/// Flags that override everything else.
#[derive(Debug, Default)]
pub struct CliOverrides<'a> {
    pub bind: Option<&'a str>,
    pub port: Option<u16>,
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl VidyaConfig {
    /// Resolve from the default config path.
    pub fn resolve(cli: &CliOverrides<'_>) -> Result<Self> {
        let file = load_config_from(&config_path())?.unwrap_or_default();
        Self::resolve_with(cli, file)
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - API key: `VIDYA_GEMINI_API_KEY` > `GEMINI_API_KEY` > `gemini_api_key` > `[gemini].api_key`.
    ///   A missing key is not an error here.
    /// - Base URL: `VIDYA_GEMINI_BASE_URL` > `[gemini].base_url` > Gemini default
    /// - Bind/port: flag > `VIDYA_BIND`/`VIDYA_PORT` > `[server]` > `127.0.0.1:8000`
    pub fn resolve_with(cli: &CliOverrides<'_>, file: ConfigFile) -> Result<Self> {
        let api_key = API_KEY_ENV_VARS
            .iter()
            .find_map(|name| env_value(name))
            .or(file.gemini.api_key);

        let mut gemini = GeminiConfig::new(api_key);
        if let Some(url) = env_value(BASE_URL_ENV).or(file.gemini.base_url) {
            gemini = gemini.with_base_url(url);
        }
        if let Some(secs) = file.gemini.timeout_secs {
            gemini.timeout_secs = secs;
        }

        let defaults = ModelConfig::default();
        let models = ModelConfig {
            planner: file.models.planner.unwrap_or(defaults.planner),
            researcher: file.models.researcher.unwrap_or(defaults.researcher),
            synthesizer: file.models.synthesizer.unwrap_or(defaults.synthesizer),
        };

        let mut pipeline = PipelineConfig::new(gemini);
        pipeline.models = models;
        if let Some(attempts) = file.pipeline.synthesis_attempts {
            pipeline.synthesis_attempts = attempts;
        }

        let bind = match cli.bind {
            Some(b) => b.to_string(),
            None => env_value(BIND_ENV)
                .or(file.server.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
        };
        let port = match (cli.port, env_value(PORT_ENV)) {
            (Some(p), _) => p,
            (None, Some(raw)) => raw
                .trim()
                .parse()
                .with_context(|| format!("{PORT_ENV} is not a valid port: {raw}"))?,
            (None, None) => file.server.port.unwrap_or(DEFAULT_PORT),
        };
        let request_timeout = Duration::from_secs(
            file.server
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );

        Ok(Self {
            pipeline,
            server: ServerConfig {
                bind,
                port,
                request_timeout,
            },
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
