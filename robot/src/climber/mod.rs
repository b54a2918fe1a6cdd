/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Climber subsystem: lifts the hook to the chain, then hangs the robot.

pub mod behaviour;

pub use behaviour::{ClimberHold, ClimberManualControl};

use std::fmt;
use std::time::Duration;

use tracing::debug;
use wombat::{HasBehaviour, Subsystem, SubsystemId};

use crate::config::ClimberSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClimberState {
    #[default]
    Idle,
    Lift,
    Hang,
    Raw,
}

impl fmt::Display for ClimberState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClimberState::Idle => "idle",
            ClimberState::Lift => "lift",
            ClimberState::Hang => "hang",
            ClimberState::Raw => "raw",
        };
        f.write_str(s)
    }
}

pub struct Climber {
    id: SubsystemId,
    settings: ClimberSettings,
    state: ClimberState,
    raw_voltage: f64,
    voltage: f64,
}

impl Climber {
    pub fn new(settings: ClimberSettings) -> Self {
        Self {
            id: SubsystemId::allocate(),
            settings,
            state: ClimberState::Idle,
            raw_voltage: 0.0,
            voltage: 0.0,
        }
    }

    pub fn settings(&self) -> &ClimberSettings {
        &self.settings
    }

    pub fn state(&self) -> ClimberState {
        self.state
    }

    pub fn set_state(&mut self, state: ClimberState) {
        if state != self.state {
            debug!(from = %self.state, to = %state, "climber state");
        }
        self.state = state;
    }

    pub fn set_raw(&mut self, volts: f64) {
        self.raw_voltage = volts;
    }

    pub fn voltage(&self) -> f64 {
        self.voltage
    }
}

impl HasBehaviour for Climber {
    fn subsystem_id(&self) -> SubsystemId {
        self.id
    }

    fn subsystem_name(&self) -> &str {
        "climber"
    }
}

impl Subsystem for Climber {
    fn on_update(&mut self, _dt: Duration) {
        self.voltage = match self.state {
            ClimberState::Idle => 0.0,
            ClimberState::Lift => self.settings.lift_voltage,
            ClimberState::Hang => self.settings.hang_voltage,
            ClimberState::Raw => self.raw_voltage,
        };
    }

    fn neutral(&mut self) {
        self.set_state(ClimberState::Idle);
        self.raw_voltage = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CYCLE: Duration = Duration::from_millis(20);

    #[test]
    fn voltage_follows_state() {
        let mut climber = Climber::new(ClimberSettings::default());
        let cases = [
            (ClimberState::Idle, 0.0),
            (ClimberState::Lift, 8.0),
            (ClimberState::Hang, -6.0),
        ];
        for (state, volts) in cases {
            climber.set_state(state);
            climber.on_update(CYCLE);
            assert_eq!(climber.voltage(), volts, "state {state}");
        }

        climber.set_state(ClimberState::Raw);
        climber.set_raw(1.5);
        climber.on_update(CYCLE);
        assert_eq!(climber.voltage(), 1.5);
    }

    #[test]
    fn neutral_idles_the_winch() {
        let mut climber = Climber::new(ClimberSettings::default());
        climber.set_state(ClimberState::Hang);
        climber.neutral();
        climber.on_update(CYCLE);
        assert_eq!(climber.state(), ClimberState::Idle);
        assert_eq!(climber.voltage(), 0.0);
    }
}
