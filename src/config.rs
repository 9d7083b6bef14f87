//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings.
    pub api: ApiCfg,
    /// Local application settings.
    pub app: AppCfg,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCfg {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

/// Local application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppCfg {
    /// File the tracing subscriber writes to.
    pub log_file: String,
    /// Input poll interval of the event loop.
    pub tick_ms: u64,
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiCfg {
                base_url: "http://10.12.3.9:5018/api".into(),
                timeout_secs: 15,
            },
            app: AppCfg {
                log_file: "coleta_tui.log".into(),
                tick_ms: 50,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&s).unwrap();
        assert_eq!(back.api.base_url, "http://10.12.3.9:5018/api");
        assert_eq!(back.app.tick_ms, 50);
    }

    #[test]
    fn partial_file_is_rejected() {
        assert!(toml::from_str::<Config>("[api]\nbase_url = \"x\"\n").is_err());
    }
}
