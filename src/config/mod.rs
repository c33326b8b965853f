//! Configuration management for Mouse Bridge
//!
//! Settings come from an optional YAML file, then command-line/environment
//! overrides are layered on top. Everything is fixed once the bridge starts.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::buttons::TriggerPolicy;
use crate::motion::MotionRounding;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub pointer: PointerConfig,
}

/// Serial transport configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SerialConfig {
    /// Device path (`/dev/ttyACM0`, `COM5`, ...)
    #[serde(default)]
    pub port: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Delay after opening the port before the first read
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

/// Pointer behaviour configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PointerConfig {
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub trigger: TriggerPolicy,
    #[serde(default)]
    pub rounding: MotionRounding,
}

/// Values supplied on the command line (or via environment) that take
/// precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub scale: Option<f64>,
    pub trigger: Option<TriggerPolicy>,
    pub rounding: Option<MotionRounding>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud: default_baud(),
            read_timeout_ms: default_read_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            trigger: TriggerPolicy::default(),
            rounding: MotionRounding::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file (without validation; overrides may still
    /// fill in missing values)
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        Ok(config)
    }

    /// Layer command-line overrides on top of the loaded values
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(port) = overrides.port {
            self.serial.port = port;
        }
        if let Some(baud) = overrides.baud {
            self.serial.baud = baud;
        }
        if let Some(scale) = overrides.scale {
            self.pointer.scale = scale;
        }
        if let Some(trigger) = overrides.trigger {
            self.pointer.trigger = trigger;
        }
        if let Some(rounding) = overrides.rounding {
            self.pointer.rounding = rounding;
        }
    }

    /// Validate configuration for correctness
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.trim().is_empty() {
            anyhow::bail!("Serial port is not set (use --port or serial.port in the config file)");
        }
        if self.serial.baud == 0 {
            anyhow::bail!("Serial baud rate must be greater than 0");
        }
        if self.serial.read_timeout_ms == 0 {
            anyhow::bail!("serial.read_timeout_ms must be greater than 0");
        }
        if !self.pointer.scale.is_finite() {
            anyhow::bail!("pointer.scale must be a finite number (got {})", self.pointer.scale);
        }

        Ok(())
    }
}

// Default value functions
fn default_baud() -> u32 { 9600 }
fn default_read_timeout_ms() -> u64 { 1000 }
fn default_settle_delay_ms() -> u64 { 2000 }
fn default_scale() -> f64 { 1.0 }

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.serial.baud, 9600);
        assert_eq!(config.serial.read_timeout(), Duration::from_secs(1));
        assert_eq!(config.serial.settle_delay(), Duration::from_secs(2));
        assert_eq!(config.pointer.scale, 1.0);
        assert_eq!(config.pointer.trigger, TriggerPolicy::EdgeClick);
        assert_eq!(config.pointer.rounding, MotionRounding::Truncate);
    }

    #[tokio::test]
    async fn test_load_full_config() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_config(
            &dir,
            r#"
serial:
  port: "/dev/ttyACM0"
  baud: 115200
  read_timeout_ms: 250
  settle_delay_ms: 0
pointer:
  scale: 1.5
  trigger: press_hold
  rounding: nearest
"#,
        );

        let config = AppConfig::load(&path).await?;
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.baud, 115200);
        assert_eq!(config.serial.read_timeout_ms, 250);
        assert_eq!(config.serial.settle_delay_ms, 0);
        assert_eq!(config.pointer.scale, 1.5);
        assert_eq!(config.pointer.trigger, TriggerPolicy::PressHold);
        assert_eq!(config.pointer.rounding, MotionRounding::Nearest);
        config.validate()?;

        Ok(())
    }

    #[tokio::test]
    async fn test_load_partial_config_uses_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_config(&dir, "serial:\n  port: COM5\n");

        let config = AppConfig::load(&path).await?;
        assert_eq!(config.serial.port, "COM5");
        assert_eq!(config.serial.baud, 9600);
        assert_eq!(config.pointer, PointerConfig::default());

        Ok(())
    }

    #[tokio::test]
    async fn test_load_rejects_unknown_trigger() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "pointer:\n  trigger: double_click\n");

        assert!(AppConfig::load(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = AppConfig::load(dir.path().join("nope.yaml")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = AppConfig::default();
        config.serial.port = "/dev/ttyUSB0".to_string();

        config.apply_overrides(ConfigOverrides {
            port: Some("/dev/ttyACM1".to_string()),
            baud: None,
            scale: Some(2.0),
            trigger: Some(TriggerPolicy::PressHold),
            rounding: None,
        });

        assert_eq!(config.serial.port, "/dev/ttyACM1");
        assert_eq!(config.serial.baud, 9600);
        assert_eq!(config.pointer.scale, 2.0);
        assert_eq!(config.pointer.trigger, TriggerPolicy::PressHold);
        assert_eq!(config.pointer.rounding, MotionRounding::Truncate);
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_err(), "missing port must be rejected");

        config.serial.port = "COM5".to_string();
        assert!(config.validate().is_ok());

        config.serial.baud = 0;
        assert!(config.validate().is_err());
        config.serial.baud = 9600;

        config.serial.read_timeout_ms = 0;
        assert!(config.validate().is_err());
        config.serial.read_timeout_ms = 1000;

        config.pointer.scale = f64::NAN;
        assert!(config.validate().is_err());
        config.pointer.scale = f64::INFINITY;
        assert!(config.validate().is_err());
    }
}
