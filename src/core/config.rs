use crate::core::currency::CurrencyCode;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_VATCOMPLY_URL: &str = "https://api.vatcomply.com";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VatComplyProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub vatcomply: Option<VatComplyProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            vatcomply: Some(VatComplyProviderConfig {
                base_url: DEFAULT_VATCOMPLY_URL.to_string(),
            }),
        }
    }
}

impl ProvidersConfig {
    pub fn vatcomply_url(&self) -> &str {
        self.vatcomply
            .as_ref()
            .map_or(DEFAULT_VATCOMPLY_URL, |p| &p.base_url)
    }
}

fn default_source_currency() -> CurrencyCode {
    CurrencyCode::known("EUR")
}

fn default_target_currency() -> CurrencyCode {
    CurrencyCode::known("USD")
}

fn default_amount() -> f64 {
    1.0
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_source_currency")]
    pub source_currency: CurrencyCode,
    #[serde(default = "default_target_currency")]
    pub target_currency: CurrencyCode,
    #[serde(default = "default_amount")]
    pub amount: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            source_currency: default_source_currency(),
            target_currency: default_target_currency(),
            amount: default_amount(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no config file has been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "tukar", "tukar")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            bail!("Default amount must be a non-negative number, got {}", self.amount);
        }
        Ok(())
    }
}
