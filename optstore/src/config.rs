use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use optstore_cache::EngineConfig;
use serde::{Deserialize, Serialize};

/// Name of the config file looked up in the data directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Settings read from the optional YAML config file
///
/// ```yaml
/// data_dir: /var/lib/optstore
/// engine:
///   current_scope: 1
///   default_autoload: true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl CliConfig {
    /// Read a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: CliConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Load the explicit config file, or `config.yaml` in `data_dir` if it
    /// exists, or fall back to defaults
    pub fn load(explicit: Option<&Path>, data_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let implicit = data_dir.join(CONFIG_FILE_NAME);
        if implicit.exists() {
            tracing::debug!("Using config file {:?}", implicit);
            return Self::from_file(&implicit);
        }

        Ok(Self::default())
    }

    /// Write the config as YAML
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Get the default data directory (~/.optstore)
pub fn default_data_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not find home directory"))?;
    Ok(home.join(".optstore"))
}

/// Pick the data directory: command line first, then the config file, then
/// the default
pub fn resolve_data_dir(cli: Option<&Path>, config: &CliConfig) -> Result<PathBuf> {
    if let Some(dir) = cli {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = &config.data_dir {
        return Ok(dir.clone());
    }
    default_data_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use optstore_cache::ScopeId;
    use tempfile::TempDir;

    #[test]
    fn test_load_without_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = CliConfig::load(None, tmp.path()).unwrap();

        assert!(config.data_dir.is_none());
        assert_eq!(config.engine.current_scope, ScopeId(1));
    }

    #[test]
    fn test_partial_yaml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.yaml");
        fs::write(&path, "engine:\n  default_autoload: true\n").unwrap();

        let config = CliConfig::load(Some(&path), tmp.path()).unwrap();
        assert!(config.engine.default_autoload);
        assert!(config.engine.enable_negative_cache);
    }

    #[test]
    fn test_implicit_config_in_data_dir() {
        let tmp = TempDir::new().unwrap();
        let config = CliConfig {
            data_dir: None,
            engine: EngineConfig::builder().current_scope(ScopeId(3)).build(),
        };
        config.save(&tmp.path().join(CONFIG_FILE_NAME)).unwrap();

        let loaded = CliConfig::load(None, tmp.path()).unwrap();
        assert_eq!(loaded.engine.current_scope, ScopeId(3));
    }

    #[test]
    fn test_invalid_engine_section_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.yaml");
        fs::write(&path, "engine:\n  current_scope: 0\n").unwrap();

        assert!(CliConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_data_dir_precedence() {
        let config = CliConfig {
            data_dir: Some(PathBuf::from("/from/config")),
            ..Default::default()
        };

        let dir = resolve_data_dir(Some(Path::new("/from/cli")), &config).unwrap();
        assert_eq!(dir, PathBuf::from("/from/cli"));

        let dir = resolve_data_dir(None, &config).unwrap();
        assert_eq!(dir, PathBuf::from("/from/config"));
    }
}
