//! Teleop configuration
//!
//! Stored as TOML under the user's config directory. Missing files are
//! replaced by defaults on startup, so the robot can always be driven with a
//! fresh install. Every section falls back to its defaults field by field.
//!
//! ```toml
//! [drive]
//! max_speed = 4.73
//! max_angular_rate = 4.71238898038469
//! request_deadband = 0.1
//! drive_request_type = "open_loop_voltage"
//!
//! [shaping]
//! deadband = 0.1
//! ramp_divisor = 6
//! normalization = 0.4375
//! deadband_mode = "magnitude"
//! ramp_policy = "advance"
//!
//! [scheduler]
//! tick_period_ms = 20
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::controller::GamepadSettings;
use crate::drivetrain::DriveRequestType;
use crate::scheduler::SchedulerSettings;
use crate::shaping::{ShapingSettings, SpeedLimits};

const APP_DIR: &str = "swerve-teleop";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No user config directory available on this platform")]
    NoConfigDir,

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Drivetrain limits, fixed for the whole session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveSettings {
    /// Meters per second at full stick.
    pub max_speed: f64,
    /// Radians per second at full stick.
    pub max_angular_rate: f64,
    /// Fraction of the max speed/rate below which the drivetrain ignores a
    /// field-centric request.
    pub request_deadband: f64,
    pub drive_request_type: DriveRequestType,
}

impl Default for DriveSettings {
    fn default() -> Self {
        let limits = SpeedLimits::default();
        Self {
            max_speed: limits.max_speed,
            max_angular_rate: limits.max_angular_rate,
            request_deadband: 0.1,
            drive_request_type: DriveRequestType::OpenLoopVoltage,
        }
    }
}

impl DriveSettings {
    pub fn limits(&self) -> SpeedLimits {
        SpeedLimits {
            max_speed: self.max_speed,
            max_angular_rate: self.max_angular_rate,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleopConfig {
    pub drive: DriveSettings,
    pub shaping: ShapingSettings,
    pub controller: GamepadSettings,
    pub scheduler: SchedulerSettings,
}

impl TeleopConfig {
    /// `<config dir>/swerve-teleop/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: TeleopConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )))
            }
        };
        let fraction = |name: &str, value: f64| {
            if (0.0..1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!(
                    "{} must be within [0, 1), got {}",
                    name, value
                )))
            }
        };

        positive("drive.max_speed", self.drive.max_speed)?;
        positive("drive.max_angular_rate", self.drive.max_angular_rate)?;
        fraction("drive.request_deadband", self.drive.request_deadband)?;
        fraction("shaping.deadband", self.shaping.deadband)?;
        positive("shaping.normalization", self.shaping.normalization)?;
        if self.scheduler.tick_period_ms == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.tick_period_ms must be at least 1".to_string(),
            ));
        }
        if self.scheduler.stats_interval().is_none() {
            return Err(ConfigError::Invalid(format!(
                "scheduler.stats_interval_secs must be a positive number of seconds, got {}",
                self.scheduler.stats_interval_secs
            )));
        }
        Ok(())
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(path, self.to_toml_string()?)
            .await
            .map_err(io_error)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Writes the default config if nothing exists at `path` yet.
    pub async fn ensure_default_config(path: &Path) -> Result<(), ConfigError> {
        match tokio::fs::try_exists(path).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!("No config at {}, writing defaults", path.display());
                Self::default().save(path).await
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaping::{DeadbandMode, RampPolicy};

    #[test]
    fn empty_file_yields_defaults() {
        let config = TeleopConfig::from_toml_str("").unwrap();
        assert_eq!(config, TeleopConfig::default());
        assert_eq!(config.scheduler.tick_period_ms, 20);
        assert_eq!(config.shaping.ramp_divisor.get(), 6);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = TeleopConfig::from_toml_str(
            r#"
            [drive]
            max_speed = 3.5

            [shaping]
            deadband_mode = "signed"
            ramp_policy = "hold"
            "#,
        )
        .unwrap();

        assert_eq!(config.drive.max_speed, 3.5);
        assert_eq!(config.drive.request_deadband, 0.1);
        assert_eq!(config.shaping.deadband_mode, DeadbandMode::Signed);
        assert_eq!(config.shaping.ramp_policy, RampPolicy::Hold);
        assert_eq!(config.shaping.deadband, 0.1);
    }

    #[test]
    fn defaults_survive_a_toml_round_trip() {
        let text = TeleopConfig::default().to_toml_string().unwrap();
        assert_eq!(TeleopConfig::from_toml_str(&text).unwrap(), TeleopConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            TeleopConfig::from_toml_str("[drive]\nmax_speed = -1.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TeleopConfig::from_toml_str("[shaping]\ndeadband = 1.5"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TeleopConfig::from_toml_str("[shaping]\nramp_divisor = 0"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            TeleopConfig::from_toml_str("[scheduler]\nstats_interval_secs = 9223372036854775807"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TeleopConfig::from_toml_str("[scheduler]\nstats_interval_secs = -1"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn drive_request_type_is_configurable() {
        let config =
            TeleopConfig::from_toml_str("[drive]\ndrive_request_type = \"velocity\"").unwrap();
        assert_eq!(config.drive.drive_request_type, DriveRequestType::Velocity);
        assert_eq!(
            TeleopConfig::default().drive.drive_request_type,
            DriveRequestType::OpenLoopVoltage
        );
    }

    #[tokio::test]
    async fn ensure_default_config_writes_once() {
        let dir = std::env::temp_dir().join(format!("swerve-teleop-test-{}", std::process::id()));
        let path = dir.join(CONFIG_FILE);
        let _ = tokio::fs::remove_dir_all(&dir).await;

        TeleopConfig::ensure_default_config(&path).await.unwrap();
        let mut config = TeleopConfig::load(&path).await.unwrap();
        assert_eq!(config, TeleopConfig::default());

        config.drive.max_speed = 2.0;
        config.save(&path).await.unwrap();
        TeleopConfig::ensure_default_config(&path).await.unwrap();
        assert_eq!(TeleopConfig::load(&path).await.unwrap().drive.max_speed, 2.0);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
