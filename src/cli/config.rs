// ABOUTME: Configuration management for the replacement application
// ABOUTME: Handles loading configuration from files and environment variables and seeding meta

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::PathBuf;

use crate::engine::Meta;
use crate::template::EOL_KEY;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Meta values every template starts with
    #[serde(default)]
    pub meta: IndexMap<String, Value>,

    #[serde(default)]
    pub eol: Option<String>,

    #[serde(default)]
    pub allow_host: bool,

    #[serde(default = "default_shell")]
    pub shell: String,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_shell() -> String {
    "sh".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: IndexMap::new(),
            eol: None,
            allow_host: false,
            shell: default_shell(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) if p.exists() => Some(p),
            Some(p) => bail!("Config file '{}' not found", p.display()),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config '{}'", path.display()))?;
                serde_yaml::from_str(&contents)
                    .with_context(|| format!("Failed to parse config '{}'", path.display()))?
            }
            None => Config::default(),
        };

        config.merge_env()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let local = [
            PathBuf::from(".replacement.yaml"),
            PathBuf::from(".replacement.yml"),
        ];

        if let Some(path) = local.into_iter().find(|path| path.exists()) {
            return Some(path);
        }

        dirs::home_dir()
            .map(|home| home.join(".replacement").join("config.yaml"))
            .filter(|path| path.exists())
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) -> Result<()> {
        if let Ok(level) = std::env::var("REPLACEMENT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("REPLACEMENT_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(allow) = std::env::var("REPLACEMENT_ALLOW_HOST") {
            self.allow_host = parse_flag(&allow)
                .with_context(|| format!("Invalid REPLACEMENT_ALLOW_HOST '{}'", allow))?;
        }
        if let Ok(eol) = std::env::var("REPLACEMENT_EOL") {
            self.eol = Some(unescape(&eol));
        }

        Ok(())
    }

    /// Initial meta for one evaluation.
    ///
    /// Configured meta comes first, then the configured line terminator, then
    /// `pairs`; later values replace earlier ones.
    pub fn seed_meta(&self, pairs: &[(String, String)]) -> Meta {
        let mut values = Mapping::new();
        for (key, value) in &self.meta {
            values.insert(Value::String(key.clone()), value.clone());
        }
        if let Some(eol) = &self.eol {
            values.insert(Value::from(EOL_KEY), Value::String(eol.clone()));
        }

        let mut meta = Meta::from_mapping(values);
        for (key, value) in pairs {
            meta.set(key.as_str(), value.as_str());
        }
        meta
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, found '{}'", other),
    }
}

/// Turn `\n`, `\r` and `\t` escapes typed on a shell into the characters
fn unescape(value: &str) -> String {
    value
        .replace("\\r", "\r")
        .replace("\\n", "\n")
        .replace("\\t", "\t")
}
