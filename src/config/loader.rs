use super::EngineConfig;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};

impl EngineConfig {
    /// `~/.chatweave/engine.toml`, if a home directory can be found.
    pub fn default_path() -> Option<PathBuf> {
        UserDirs::new().map(|u| u.home_dir().join(".chatweave").join("engine.toml"))
    }

    /// Load and validate a config file. A leading `~` is expanded.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = path.as_ref().to_string_lossy();
        let expanded = PathBuf::from(shellexpand::tilde(&raw).to_string());

        let contents = fs::read_to_string(&expanded)
            .map_err(ConfigError::Io)
            .with_context(|| format!("failed to read config at {}", expanded.display()))?;
        let mut config: EngineConfig = toml::from_str(&contents)
            .map_err(|err| ConfigError::Load(err.to_string()))
            .with_context(|| format!("failed to parse config at {}", expanded.display()))?;
        config.config_path = expanded;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load the config at [`EngineConfig::default_path`], falling back to
    /// defaults (plus env overrides) when the file does not exist.
    pub fn load_or_default() -> Result<Self> {
        if let Some(path) = Self::default_path()
            && path.exists()
        {
            return Self::load_from_path(path);
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(ConfigError::Io)
                .context("Failed to create config directory")?;
        }
        fs::write(&self.config_path, toml_str)
            .map_err(ConfigError::Io)
            .context("Failed to write config file")?;
        Ok(())
    }
}
