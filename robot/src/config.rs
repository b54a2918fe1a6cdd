//! Robot configuration loading.
//!
//! Every field is optional; anything missing falls back to the defaults
//! below, and an empty file yields the default configuration.
//!
//! The expected YAML structure is:
//! ```yaml
//! cycle:
//!   period_ms: 20
//! intake:
//!   intake_voltage: 10.0
//!   pass_voltage: 10.0
//!   raw_scale: 5.0
//! shooter:
//!   max_voltage: 12.0
//! climber:
//!   lift_voltage: 8.0
//!   hang_voltage: -6.0
//!   raw_scale: 6.0
//! arm:
//!   max_voltage: 6.0
//! drivebase:
//!   max_voltage: 12.0
//!   deadband: 0.05
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

// ── Sections ──────────────────────────────────────────────────────────────────

/// Control-loop pacing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Period of one control cycle in milliseconds.
    pub period_ms: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self { period_ms: 20 }
    }
}

impl CycleConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// Intake voltages (volts) and operator raw-control scaling.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IntakeSettings {
    pub intake_voltage: f64,
    pub pass_voltage: f64,
    /// Volts per unit of left-stick deflection in raw mode.
    pub raw_scale: f64,
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self {
            intake_voltage: 10.0,
            pass_voltage: 10.0,
            raw_scale: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShooterSettings {
    /// Voltage at full trigger.
    pub max_voltage: f64,
}

impl Default for ShooterSettings {
    fn default() -> Self {
        Self { max_voltage: 12.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClimberSettings {
    pub lift_voltage: f64,
    pub hang_voltage: f64,
    pub raw_scale: f64,
}

impl Default for ClimberSettings {
    fn default() -> Self {
        Self {
            lift_voltage: 8.0,
            hang_voltage: -6.0,
            raw_scale: 6.0,
        }
    }
}

/// Arm pivot voltage at full stick deflection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArmSettings {
    pub max_voltage: f64,
}

impl Default for ArmSettings {
    fn default() -> Self {
        Self { max_voltage: 6.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DrivebaseSettings {
    /// Voltage at full stick deflection on any axis.
    pub max_voltage: f64,
    /// Stick deflection below which an axis reads as zero.
    pub deadband: f64,
}

impl Default for DrivebaseSettings {
    fn default() -> Self {
        Self {
            max_voltage: 12.0,
            deadband: 0.05,
        }
    }
}

// ── RobotConfig ───────────────────────────────────────────────────────────────

/// Full robot configuration, one section per concern.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub cycle: CycleConfig,
    pub intake: IntakeSettings,
    pub shooter: ShooterSettings,
    pub climber: ClimberSettings,
    pub arm: ArmSettings,
    pub drivebase: DrivebaseSettings,
}

impl RobotConfig {
    /// Parses `path` into a configuration.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, the YAML is structurally
    /// invalid, or a value is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading robot configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        info!(
            period_ms = config.cycle.period_ms,
            intake_v = config.intake.intake_voltage,
            shooter_max_v = config.shooter.max_voltage,
            "Robot configuration loaded"
        );
        Ok(config)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            warn!("Configuration is empty, using default robot configuration");
            return Ok(Self::default());
        }

        let config: RobotConfig = serde_yaml::from_str(content)?;
        debug!(?config, "parsed robot configuration");
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.cycle.period_ms > 0, "cycle.period_ms must be positive");
        ensure!(
            self.shooter.max_voltage >= 0.0,
            "shooter.max_voltage must not be negative (got {})",
            self.shooter.max_voltage
        );
        ensure!(
            self.arm.max_voltage >= 0.0,
            "arm.max_voltage must not be negative (got {})",
            self.arm.max_voltage
        );
        ensure!(
            self.drivebase.max_voltage >= 0.0,
            "drivebase.max_voltage must not be negative (got {})",
            self.drivebase.max_voltage
        );
        ensure!(
            (0.0..1.0).contains(&self.drivebase.deadband),
            "drivebase.deadband must be in [0, 1) (got {})",
            self.drivebase.deadband
        );
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
