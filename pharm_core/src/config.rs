//! Configuration file support for PharmQuest.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/pharmquest/config.toml`.
//! Every field has a default, so a partial file only overrides what it names.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,

    #[serde(default)]
    pub rewards: RewardsConfig,
}

/// Session defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_year")]
    pub default_year: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_year: default_year(),
        }
    }
}

/// A score/points pair granted for one correct action
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reward {
    pub score: i64,
    pub rx_points: i64,
}

impl Reward {
    pub const fn new(score: i64, rx_points: i64) -> Self {
        Self { score, rx_points }
    }
}

/// Fixed rewards for the stage mini-games
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Both receiving check-ins done
    #[serde(default = "default_check_in")]
    pub check_in: i64,

    /// First inspection of each prescription field
    #[serde(default = "default_field_check")]
    pub field_check: i64,

    /// Correct valid call on an unscripted prescription
    #[serde(default = "default_validation_verdict")]
    pub validation_verdict: Reward,

    /// Correct invalid call naming the right reason
    #[serde(default = "default_validation_reason")]
    pub validation_reason: Reward,

    #[serde(default = "default_label")]
    pub label: Reward,

    /// Partial credit for catching a wrong label when the patient queries it
    #[serde(default = "default_label_recheck")]
    pub label_recheck: i64,

    #[serde(default = "default_picking")]
    pub picking: Reward,

    #[serde(default = "default_counseling")]
    pub counseling: Reward,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            check_in: default_check_in(),
            field_check: default_field_check(),
            validation_verdict: default_validation_verdict(),
            validation_reason: default_validation_reason(),
            label: default_label(),
            label_recheck: default_label_recheck(),
            picking: default_picking(),
            counseling: default_counseling(),
        }
    }
}

// Default value functions
fn default_year() -> u8 {
    1
}

fn default_check_in() -> i64 {
    10
}

fn default_field_check() -> i64 {
    5
}

fn default_validation_verdict() -> Reward {
    Reward::new(50, 30)
}

fn default_validation_reason() -> Reward {
    Reward::new(80, 40)
}

fn default_label() -> Reward {
    Reward::new(60, 25)
}

fn default_label_recheck() -> i64 {
    30
}

fn default_picking() -> Reward {
    Reward::new(70, 30)
}

fn default_counseling() -> Reward {
    Reward::new(40, 15)
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(config_path) if config_path.exists() => Self::load_from(&config_path),
            Some(config_path) => {
                tracing::info!(
                    "No config file found at {:?}, using defaults",
                    config_path
                );
                Ok(Self::default())
            }
            None => {
                tracing::info!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("pharmquest").join("config.toml"))
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(1..=3).contains(&self.game.default_year) {
            return Err(Error::Config(format!(
                "default_year must be 1, 2 or 3 (got {})",
                self.game.default_year
            )));
        }
        let r = &self.rewards;
        // Only the specific-reason call may outrank the plain verdict
        if r.validation_reason.score < r.validation_verdict.score {
            return Err(Error::Config(
                "validation_reason must award at least validation_verdict".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.game.default_year, 1);
        assert_eq!(config.rewards.validation_verdict, Reward::new(50, 30));
        assert!(config.rewards.validation_reason.score > config.rewards.validation_verdict.score);
        assert_eq!(config.rewards.picking, Reward::new(70, 30));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.rewards.label, parsed.rewards.label);
        assert_eq!(config.game.default_year, parsed.game.default_year);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[rewards]
field_check = 7

[rewards.picking]
score = 100
rx_points = 45
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.rewards.field_check, 7);
        assert_eq!(config.rewards.picking, Reward::new(100, 45));
        assert_eq!(config.rewards.check_in, 10); // default
        assert_eq!(config.game.default_year, 1); // default
    }

    #[test]
    fn test_save_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.game.default_year = 3;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.game.default_year, 3);
    }

    #[test]
    fn test_load_rejects_bad_year() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[game]\ndefault_year = 7\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
