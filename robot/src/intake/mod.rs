/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Intake subsystem: rollers that pick up a game piece and pass it to the
//! shooter.

pub mod behaviour;

pub use behaviour::{IntakeAutoControl, IntakeManualControl};

use std::fmt;
use std::time::Duration;

use tracing::debug;
use wombat::{HasBehaviour, Subsystem, SubsystemId};

use crate::config::IntakeSettings;
use crate::io::DigitalInput;

/// Roller mode commanded by the active behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntakeState {
    #[default]
    Idle,
    /// Operator drives the rollers directly.
    Raw,
    /// Pulling a piece in.
    Intake,
    /// Feeding the stored piece to the shooter.
    Pass,
}

impl fmt::Display for IntakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntakeState::Idle => "idle",
            IntakeState::Raw => "raw",
            IntakeState::Intake => "intake",
            IntakeState::Pass => "pass",
        };
        f.write_str(s)
    }
}

/// Voltages plus the three beam-break sensors along the piece path.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub settings: IntakeSettings,
    /// Piece at the mouth of the intake.
    pub intake_sensor: DigitalInput,
    /// Piece stored in the magazine.
    pub mag_sensor: DigitalInput,
    /// Piece reached the shooter.
    pub shooter_sensor: DigitalInput,
}

pub struct Intake {
    id: SubsystemId,
    config: IntakeConfig,
    state: IntakeState,
    raw_voltage: f64,
    voltage: f64,
}

impl Intake {
    pub fn new(config: IntakeConfig) -> Self {
        Self {
            id: SubsystemId::allocate(),
            config,
            state: IntakeState::Idle,
            raw_voltage: 0.0,
            voltage: 0.0,
        }
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    pub fn state(&self) -> IntakeState {
        self.state
    }

    pub fn set_state(&mut self, state: IntakeState) {
        if state != self.state {
            debug!(from = %self.state, to = %state, "intake state");
        }
        self.state = state;
    }

    /// Voltage used while in [`IntakeState::Raw`].
    pub fn set_raw(&mut self, volts: f64) {
        self.raw_voltage = volts;
    }

    /// Voltage applied on the last `on_update`.
    pub fn voltage(&self) -> f64 {
        self.voltage
    }

    /// A piece is somewhere between the mouth and the magazine.
    pub fn has_piece(&self) -> bool {
        self.config.intake_sensor.get() || self.config.mag_sensor.get()
    }
}

impl HasBehaviour for Intake {
    fn subsystem_id(&self) -> SubsystemId {
        self.id
    }

    fn subsystem_name(&self) -> &str {
        "intake"
    }
}

impl Subsystem for Intake {
    fn on_update(&mut self, _dt: Duration) {
        self.voltage = match self.state {
            IntakeState::Idle => 0.0,
            IntakeState::Raw => self.raw_voltage,
            IntakeState::Intake => self.config.settings.intake_voltage,
            IntakeState::Pass => self.config.settings.pass_voltage,
        };
    }

    fn neutral(&mut self) {
        self.set_state(IntakeState::Idle);
        self.raw_voltage = 0.0;
    }
}

#[cfg(test)]
pub(crate) fn test_intake() -> Intake {
    Intake::new(IntakeConfig {
        settings: IntakeSettings::default(),
        intake_sensor: DigitalInput::new(0),
        mag_sensor: DigitalInput::new(1),
        shooter_sensor: DigitalInput::new(2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CYCLE: Duration = Duration::from_millis(20);

    #[test]
    fn voltage_follows_state() {
        let mut intake = test_intake();
        intake.on_update(CYCLE);
        assert_eq!(intake.voltage(), 0.0);

        intake.set_state(IntakeState::Intake);
        intake.on_update(CYCLE);
        assert_eq!(intake.voltage(), 10.0);

        intake.set_state(IntakeState::Pass);
        intake.on_update(CYCLE);
        assert_eq!(intake.voltage(), 10.0);

        intake.set_state(IntakeState::Raw);
        intake.set_raw(-2.5);
        intake.on_update(CYCLE);
        assert_eq!(intake.voltage(), -2.5);
    }

    #[test]
    fn intaking_holds_until_commanded_otherwise() {
        let mut intake = test_intake();
        intake.set_state(IntakeState::Intake);
        intake.config().mag_sensor.set(true);
        intake.on_update(CYCLE);
        assert_eq!(intake.state(), IntakeState::Intake, "sensors never change the state");
        assert_eq!(intake.voltage(), 10.0);
    }

    #[test]
    fn neutral_drops_output_to_zero() {
        let mut intake = test_intake();
        intake.set_state(IntakeState::Raw);
        intake.set_raw(4.0);
        intake.on_update(CYCLE);
        assert_eq!(intake.voltage(), 4.0);

        intake.neutral();
        intake.on_update(CYCLE);
        assert_eq!(intake.state(), IntakeState::Idle);
        assert_eq!(intake.voltage(), 0.0);

        intake.set_state(IntakeState::Raw);
        intake.on_update(CYCLE);
        assert_eq!(intake.voltage(), 0.0, "stale raw voltage cleared");
    }

    #[test]
    fn has_piece_reads_intake_and_magazine_sensors() {
        let intake = test_intake();
        assert!(!intake.has_piece());
        intake.config().intake_sensor.set(true);
        assert!(intake.has_piece());
        intake.config().intake_sensor.set(false);
        intake.config().mag_sensor.set(true);
        assert!(intake.has_piece());
    }

    #[test]
    fn subsystem_identity_is_stable() {
        let intake = test_intake();
        assert_eq!(intake.subsystem_id(), intake.subsystem_id());
        assert_eq!(intake.subsystem_name(), "intake");
    }
}
