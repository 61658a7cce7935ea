//! Configuration: a TOML file with serde-level defaults for every field,
//! resolved from `$DIORAMA_CONFIG` or the platform config directory.
//! API keys can always be supplied through the environment instead.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub director: DirectorConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorConfig {
    /// Overridden by GEMINI_API_KEY when set.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_director_base_url")]
    pub base_url: String,

    /// Scene planning models, tried in order until one answers.
    #[serde(default = "default_compose_models")]
    pub compose_models: Vec<String>,

    /// Fast model for per-click annotations.
    #[serde(default = "default_annotate_model")]
    pub annotate_model: String,

    #[serde(default = "default_validate_model")]
    pub validate_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// "tiered" | "live" | "builtin"
    #[serde(default = "default_catalog_backend")]
    pub backend: String,

    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,

    /// Overridden by POLY_PIZZA_API_KEY when set.
    #[serde(default)]
    pub api_key: String,

    /// Candidates fetched per element for resolver scoring.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Hosts the model proxy is allowed to fetch from.
    #[serde(default = "default_proxy_allow_hosts")]
    pub proxy_allow_hosts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_director_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_compose_models() -> Vec<String> {
    vec!["gemini-2.0-flash".to_string(), "gemini-1.5-flash".to_string()]
}

fn default_annotate_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_validate_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_catalog_backend() -> String {
    "tiered".to_string()
}

fn default_catalog_base_url() -> String {
    "https://api.poly.pizza/v1.1".to_string()
}

fn default_candidate_limit() -> usize {
    8
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_proxy_allow_hosts() -> Vec<String> {
    vec![
        "static.poly.pizza".to_string(),
        "raw.githubusercontent.com".to_string(),
        "github.com".to_string(),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_director_base_url(),
            compose_models: default_compose_models(),
            annotate_model: default_annotate_model(),
            validate_model: default_validate_model(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: default_catalog_backend(),
            base_url: default_catalog_base_url(),
            api_key: String::new(),
            candidate_limit: default_candidate_limit(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            proxy_allow_hosts: default_proxy_allow_hosts(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Resolved config file location: `$DIORAMA_CONFIG` wins, otherwise the
    /// platform config directory.
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("DIORAMA_CONFIG")
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }
        let dirs = directories::ProjectDirs::from("", "", "diorama")
            .context("could not resolve a config directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    /// Load with an explicit path override (the CLI `--config` flag).
    pub fn load_with(path_override: Option<&str>) -> Result<Self> {
        let path = match path_override {
            Some(path) => PathBuf::from(path),
            None => Self::config_path()?,
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY")
            && !key.is_empty()
        {
            self.director.api_key = key;
        }
        if let Ok(key) = std::env::var("POLY_PIZZA_API_KEY")
            && !key.is_empty()
        {
            self.catalog.api_key = key;
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("failed to write config: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_full_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.catalog.backend, "tiered");
        assert_eq!(config.catalog.candidate_limit, 8);
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.director.compose_models.len(), 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_defaults_for_the_rest() {
        let config: Config = toml::from_str(
            r#"
            [catalog]
            backend = "builtin"

            [server]
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.catalog.backend, "builtin");
        assert_eq!(config.catalog.candidate_limit, 8);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn save_and_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.catalog.backend = "builtin".to_string();
        config.server.port = 4000;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.catalog.backend, "builtin");
        assert_eq!(loaded.server.port, 4000);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(loaded.catalog.backend, "tiered");
    }
}
