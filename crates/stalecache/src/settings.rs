//! File and environment settings.
//!
//! Settings are read from an optional TOML file and overridden by
//! `STALECACHE__*` environment variables, with `__` separating nested keys:
//!
//! ```toml
//! [memory]
//! gc_interval = "30s"
//!
//! [propagation]
//! subject = "stalecache.invalidations"
//! nats_url = "nats://127.0.0.1:4222"
//!
//! [caches.orders]
//! expire = "1s"
//! lifetime = "3s"
//! tags = ["orders"]
//! codec = "msgpack"
//! ```
//!
//! `STALECACHE__MEMORY__GC_INTERVAL=10s` overrides the GC interval above.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use stalecache_core::CacheError;
use stalecache_memory::MemoryConfig;
use thiserror::Error;
use tracing::info;

use crate::config::CacheConfig;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "STALECACHE";

/// Default subject for invalidation events.
pub const DEFAULT_SUBJECT: &str = "stalecache.invalidations";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid settings for cache '{cache}': {source}")]
    InvalidCache {
        cache: String,
        #[source]
        source: CacheError,
    },
}

/// In-memory store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    #[serde(with = "humantime_serde")]
    pub gc_interval: Duration,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            gc_interval: MemoryConfig::default().gc_interval,
        }
    }
}

impl MemorySettings {
    pub fn to_memory_config(&self) -> MemoryConfig {
        MemoryConfig::with_gc_interval(self.gc_interval)
    }
}

/// Invalidation propagation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationSettings {
    /// Subject invalidation events are published on.
    pub subject: String,

    /// NATS server to connect to. In-process propagation is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nats_url: Option<String>,
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            nats_url: None,
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub memory: MemorySettings,
    pub propagation: PropagationSettings,
    /// Cache configurations by cache name.
    pub caches: HashMap<String, CacheConfig>,
}

impl Settings {
    /// Loads settings from a TOML file, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed, or if a cache
    /// configuration is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let settings = Self::build(
            Config::builder().add_source(File::from(path).required(true)),
            environment(),
        )?;

        info!(path = %path.display(), caches = settings.caches.len(), "Settings loaded");
        Ok(settings)
    }

    /// Builds settings from defaults and environment variables only.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::build(Config::builder(), environment())
    }

    /// Parses settings from a TOML string, ignoring the environment.
    pub fn from_toml_str(toml: &str) -> Result<Self, SettingsError> {
        Self::build(
            Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
            environment().source(Some(HashMap::new())),
        )
    }

    fn build(
        builder: ConfigBuilder<DefaultState>,
        env: Environment,
    ) -> Result<Self, SettingsError> {
        let settings: Settings = builder.add_source(env).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks every cache configuration.
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (name, config) in &self.caches {
            config
                .validate()
                .map_err(|source| SettingsError::InvalidCache {
                    cache: name.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Returns the configuration for `name`, if any.
    pub fn cache(&self, name: &str) -> Option<&CacheConfig> {
        self.caches.get(name)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
