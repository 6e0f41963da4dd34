//! Configuration for the option cache engine

use crate::error::{OptionError, Result};
use crate::scope::ScopeId;
use serde::{Deserialize, Serialize};

/// Configuration for the option cache engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scope that `null`, `false`, `0` and `"0"` resolve to.
    /// Must not be zero, since zero itself means "current".
    pub current_scope: ScopeId,

    /// Autoload flag used by `add` and by the implicit add inside `update`
    pub default_autoload: bool,

    /// Remember names confirmed absent from the store
    pub enable_negative_cache: bool,

    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            current_scope: ScopeId(1),
            default_autoload: false,
            enable_negative_cache: true,
            enable_metrics: true,
        }
    }
}

impl EngineConfig {
    /// Create a new builder for engine configuration
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.current_scope.get() == 0 {
            return Err(OptionError::Config(
                "current_scope must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Load overrides from the environment (and a `.env` file if present).
    ///
    /// Reads `OPTSTORE_CURRENT_SCOPE`, `OPTSTORE_DEFAULT_AUTOLOAD` and
    /// `OPTSTORE_NEGATIVE_CACHE`; unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Self::default();

        if let Ok(raw) = std::env::var("OPTSTORE_CURRENT_SCOPE") {
            let id = raw.trim().parse::<i64>().map_err(|e| {
                OptionError::Config(format!("OPTSTORE_CURRENT_SCOPE '{}': {}", raw, e))
            })?;
            config.current_scope = ScopeId(id);
        }
        if let Ok(raw) = std::env::var("OPTSTORE_DEFAULT_AUTOLOAD") {
            config.default_autoload = parse_flag("OPTSTORE_DEFAULT_AUTOLOAD", &raw)?;
        }
        if let Ok(raw) = std::env::var("OPTSTORE_NEGATIVE_CACHE") {
            config.enable_negative_cache = parse_flag("OPTSTORE_NEGATIVE_CACHE", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_flag(var: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(OptionError::Config(format!(
            "{} must be a boolean, got '{}'",
            var, other
        ))),
    }
}

/// Builder for engine configuration
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    current_scope: Option<ScopeId>,
    default_autoload: Option<bool>,
    enable_negative_cache: Option<bool>,
    enable_metrics: Option<bool>,
}

impl EngineConfigBuilder {
    /// Set the scope that the "current" aliases resolve to
    pub fn current_scope(mut self, scope: impl Into<ScopeId>) -> Self {
        self.current_scope = Some(scope.into());
        self
    }

    /// Set the autoload flag for adds that don't specify one
    pub fn default_autoload(mut self, autoload: bool) -> Self {
        self.default_autoload = Some(autoload);
        self
    }

    /// Enable or disable the not-found cache
    pub fn enable_negative_cache(mut self, enable: bool) -> Self {
        self.enable_negative_cache = Some(enable);
        self
    }

    /// Enable or disable metrics collection
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    /// Build the engine configuration
    pub fn build(self) -> EngineConfig {
        let defaults = EngineConfig::default();

        EngineConfig {
            current_scope: self.current_scope.unwrap_or(defaults.current_scope),
            default_autoload: self.default_autoload.unwrap_or(defaults.default_autoload),
            enable_negative_cache: self
                .enable_negative_cache
                .unwrap_or(defaults.enable_negative_cache),
            enable_metrics: self.enable_metrics.unwrap_or(defaults.enable_metrics),
        }
    }
}

/// Preset configurations for common deployments
impl EngineConfig {
    /// Per-site options: new options are autoloaded unless told otherwise
    pub fn site() -> Self {
        Self {
            default_autoload: true,
            ..Default::default()
        }
    }

    /// Network-wide options: never autoloaded by default
    pub fn network() -> Self {
        Self {
            default_autoload: false,
            ..Default::default()
        }
    }
}
