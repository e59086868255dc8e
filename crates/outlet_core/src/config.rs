//! Router configuration.
//!
//! # Responsibility
//! - Load router settings from JSON (string or file).
//! - Validate values and build the configured reuse strategy.
//!
//! # Invariants
//! - A loaded `RouterConfig` always holds a supported log level and valid
//!   detach path patterns.

use crate::logging::{default_log_level, LogLevels, LoggingError};
use crate::model::route::RouteConfig;
use crate::reuse::caching::{CachingReuseStrategy, DEFAULT_CACHE_CAPACITY};
use crate::reuse::strategy::{DefaultReuseStrategy, RouteReuseStrategy};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Configuration loading and validation errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Input is not valid JSON for the config schema.
    Parse(serde_json::Error),
    /// `log_level` is not a valid `default[,subsystem=level]*` spec.
    InvalidLogLevel(LoggingError),
    /// A detach path is not a valid route path pattern.
    InvalidDetachPath { path: String, detail: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid router config: {err}"),
            Self::InvalidLogLevel(err) => write!(f, "invalid log_level: {err}"),
            Self::InvalidDetachPath { path, detail } => {
                write!(f, "detach path `{path}` is invalid: {detail}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidLogLevel(err) => Some(err),
            Self::InvalidDetachPath { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Reuse strategy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReuseConfig {
    /// Route config paths whose subtrees are detached instead of destroyed.
    pub detach_paths: Vec<String>,
    /// Maximum number of detached subtrees kept alive.
    pub capacity: usize,
}

impl Default for ReuseConfig {
    fn default() -> Self {
        Self {
            detach_paths: Vec::new(),
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Top-level router settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Level spec such as `info` or `info,reuse=debug`.
    pub log_level: String,
    pub reuse: ReuseConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            reuse: ReuseConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Parses and validates a JSON document.
    ///
    /// Missing fields take their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let mut config: RouterConfig = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Normalized log level, accepted by `init_logging`.
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Strategy described by `reuse`: caching when any path is listed.
    pub fn build_strategy(&self) -> Box<dyn RouteReuseStrategy> {
        if self.reuse.detach_paths.is_empty() {
            return Box::new(DefaultReuseStrategy::new());
        }
        Box::new(CachingReuseStrategy::new(
            self.reuse.detach_paths.iter().cloned(),
            self.reuse.capacity,
        ))
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        self.log_level = LogLevels::parse(&self.log_level)
            .map_err(ConfigError::InvalidLogLevel)?
            .to_string();
        for path in &self.reuse.detach_paths {
            RouteConfig::new(path).map_err(|err| ConfigError::InvalidDetachPath {
                path: path.clone(),
                detail: err.to_string(),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, RouterConfig};
    use crate::reuse::caching::DEFAULT_CACHE_CAPACITY;

    #[test]
    fn empty_document_uses_defaults() {
        let config = RouterConfig::from_json_str("{}").expect("empty object should parse");
        assert!(config.reuse.detach_paths.is_empty());
        assert_eq!(config.reuse.capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn normalizes_log_level() {
        let config = RouterConfig::from_json_str(r#"{"log_level":" WARN "}"#)
            .expect("warn should normalize");
        assert_eq!(config.log_level(), "warn");

        let config = RouterConfig::from_json_str(r#"{"log_level":"info, Reuse=DEBUG"}"#)
            .expect("subsystem override should normalize");
        assert_eq!(config.log_level(), "info,reuse=debug");
    }

    #[test]
    fn rejects_unknown_fields_and_bad_values() {
        let unknown = RouterConfig::from_json_str(r#"{"verbose":true}"#)
            .expect_err("unknown field must fail");
        assert!(matches!(unknown, ConfigError::Parse(_)));

        let level = RouterConfig::from_json_str(r#"{"log_level":"loud"}"#)
            .expect_err("unsupported level must fail");
        assert!(matches!(level, ConfigError::InvalidLogLevel(_)));
        assert!(std::error::Error::source(&level).is_some());

        let subsystem = RouterConfig::from_json_str(r#"{"log_level":"info,cache=debug"}"#)
            .expect_err("unknown subsystem must fail");
        assert!(subsystem.to_string().contains("cache"));

        let path = RouterConfig::from_json_str(r#"{"reuse":{"detach_paths":["a b"]}}"#)
            .expect_err("invalid path must fail");
        assert!(matches!(path, ConfigError::InvalidDetachPath { .. }));
    }
}
