//! Engine preferences and their on-disk persistence.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    errors::{EngineError, Result},
    ledger::{CurrencyCode, RepeatType},
    utils::persistence::replace_file,
};

const DEFAULT_DIR_NAME: &str = ".moneyguru_core";
const HOME_ENV: &str = "MONEYGURU_CORE_HOME";
const CONFIG_FILE: &str = "config.json";

/// Defaults applied by the editing sessions and the logging setup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "Config::default_currency_value")]
    pub default_currency: String,
    #[serde(default)]
    pub default_repeat_type: RepeatType,
    #[serde(default = "Config::default_repeat_every_value")]
    pub default_repeat_every: u32,
    /// Extra `tracing` filter directive, e.g. `moneyguru_core=debug`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_currency: Self::default_currency_value(),
            default_repeat_type: RepeatType::default(),
            default_repeat_every: Self::default_repeat_every_value(),
            log_filter: None,
        }
    }
}

impl Config {
    pub fn default_currency_value() -> String {
        "USD".into()
    }

    pub fn default_repeat_every_value() -> u32 {
        1
    }

    pub fn currency(&self) -> CurrencyCode {
        CurrencyCode::new(&self.default_currency)
    }
}

/// Handles loading and saving [`Config`] as JSON.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Manager rooted at `~/.moneyguru_core`, or `$MONEYGURU_CORE_HOME` when set.
    pub fn from_default_location() -> Result<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base)?;
        Ok(Self::new(base.join(CONFIG_FILE)))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Loads the stored config, falling back to defaults when no file exists yet.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.config_path)?;
        let config: Config =
            serde_json::from_str(&data).map_err(|err| EngineError::Config(err.to_string()))?;
        if config.default_repeat_every < 1 {
            return Err(EngineError::Config(
                "default_repeat_every must be at least 1".into(),
            ));
        }
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|err| EngineError::Config(err.to_string()))?;
        replace_file(&self.config_path, &json)?;
        Ok(())
    }
}

/// Returns the application data directory, defaulting to `~/.moneyguru_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}
