use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

/// Errors that make startup impossible. Everything else in the config layer
/// degrades to a documented default and logs instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Key=value configuration loaded once at startup and passed by reference to
/// whatever needs it. There is no global config state.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Parses `key=value` lines. Blank lines and lines starting with `#` or
    /// `!` are ignored; keys and values are trimmed. A later duplicate key
    /// wins, matching last-writer-wins property-file behavior.
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                warn!(line, "config line has no '=' separator; skipped");
                continue;
            };
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
        Self { values }
    }

    /// Looks up a raw value. A missing key is a usage problem on the caller's
    /// side, not an error: it is logged and `None` is returned.
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = self.values.get(key).map(String::as_str);
        if value.is_none() {
            info!(key, "requested config key has no value");
        }
        value
    }

    /// Like [`get`](Self::get) but without the missing-key log, for callers
    /// that treat absence as an ordinary case.
    pub fn get_opt(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_opt(key).unwrap_or(default)
    }

    /// Parses a numeric value, falling back on absence or a parse failure.
    pub fn get_u32_or(&self, key: &str, default: u32) -> u32 {
        match self.get_opt(key) {
            None => default,
            Some(raw) => match raw.parse::<u32>() {
                Ok(value) => value,
                Err(_) => {
                    warn!(key, value = raw, default, "config value is not numeric; using default");
                    default
                }
            },
        }
    }
}
