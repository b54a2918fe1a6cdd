/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Drivebase subsystem.
//!
//! Module kinematics are not modelled: the drivebase holds a chassis-level
//! voltage demand (forward, strafe, rotation) and applies it on update.

use std::time::Duration;

use tracing::debug;
use wombat::{Behaviour, HasBehaviour, Subsystem, SubsystemId};

use crate::config::DrivebaseSettings;
use crate::io::{Shared, XboxController};

/// Chassis-level voltage demand.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveSignal {
    pub forward: f64,
    pub strafe: f64,
    pub rotation: f64,
}

impl DriveSignal {
    pub const STOP: DriveSignal = DriveSignal {
        forward: 0.0,
        strafe: 0.0,
        rotation: 0.0,
    };

    fn clamped(self, max: f64) -> Self {
        Self {
            forward: self.forward.clamp(-max, max),
            strafe: self.strafe.clamp(-max, max),
            rotation: self.rotation.clamp(-max, max),
        }
    }
}

pub struct Drivebase {
    id: SubsystemId,
    settings: DrivebaseSettings,
    target: DriveSignal,
    output: DriveSignal,
}

impl Drivebase {
    pub fn new(settings: DrivebaseSettings) -> Self {
        Self {
            id: SubsystemId::allocate(),
            settings,
            target: DriveSignal::STOP,
            output: DriveSignal::STOP,
        }
    }

    pub fn settings(&self) -> &DrivebaseSettings {
        &self.settings
    }

    /// Commanded demand, each axis clamped to `±max_voltage`.
    pub fn set_signal(&mut self, signal: DriveSignal) {
        self.target = signal.clamped(self.settings.max_voltage);
    }

    /// Demand applied on the last `on_update`.
    pub fn output(&self) -> DriveSignal {
        self.output
    }
}

impl HasBehaviour for Drivebase {
    fn subsystem_id(&self) -> SubsystemId {
        self.id
    }

    fn subsystem_name(&self) -> &str {
        "drivebase"
    }
}

impl Subsystem for Drivebase {
    fn on_update(&mut self, _dt: Duration) {
        self.output = self.target;
    }

    fn neutral(&mut self) {
        self.target = DriveSignal::STOP;
    }
}

/// Default teleop behaviour on the driver controller.
///
/// Left stick translates, right stick X rotates.  Deflection inside the
/// configured deadband reads as zero.
pub struct ManualDrivebase {
    drivebase: Shared<Drivebase>,
    driver: Shared<XboxController>,
    subsystem: SubsystemId,
}

impl ManualDrivebase {
    pub fn new(drivebase: Shared<Drivebase>, driver: Shared<XboxController>) -> Self {
        let subsystem = drivebase.borrow().subsystem_id();
        Self {
            drivebase,
            driver,
            subsystem,
        }
    }
}

fn apply_deadband(value: f64, deadband: f64) -> f64 {
    if value.abs() < deadband {
        0.0
    } else {
        value
    }
}

impl Behaviour for ManualDrivebase {
    fn controls(&self) -> SubsystemId {
        self.subsystem
    }

    fn on_tick(&mut self, _dt: Duration) {
        let driver = self.driver.borrow();
        let mut drivebase = self.drivebase.borrow_mut();
        let DrivebaseSettings {
            max_voltage,
            deadband,
        } = *drivebase.settings();

        let signal = DriveSignal {
            forward: apply_deadband(driver.left_y(), deadband) * max_voltage,
            strafe: apply_deadband(driver.left_x(), deadband) * max_voltage,
            rotation: apply_deadband(driver.right_x(), deadband) * max_voltage,
        };
        if signal != drivebase.target {
            debug!(?signal, "drive demand");
        }
        drivebase.set_signal(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::shared;

    const CYCLE: Duration = Duration::from_millis(20);

    fn rig() -> (Shared<Drivebase>, Shared<XboxController>, ManualDrivebase) {
        let drivebase = shared(Drivebase::new(DrivebaseSettings::default()));
        let pad = shared(XboxController::new(0));
        let b = ManualDrivebase::new(drivebase.clone(), pad.clone());
        (drivebase, pad, b)
    }

    #[test]
    fn sticks_map_to_scaled_demand() {
        let (drivebase, pad, mut b) = rig();
        {
            let mut p = pad.borrow_mut();
            p.set_left_y(0.5);
            p.set_left_x(-0.25);
            p.set_right_x(1.0);
        }
        b.on_tick(CYCLE);
        drivebase.borrow_mut().on_update(CYCLE);
        assert_eq!(
            drivebase.borrow().output(),
            DriveSignal {
                forward: 6.0,
                strafe: -3.0,
                rotation: 12.0,
            }
        );
    }

    #[test]
    fn deflection_inside_deadband_is_ignored() {
        let (drivebase, pad, mut b) = rig();
        pad.borrow_mut().set_left_y(0.04);
        b.on_tick(CYCLE);
        drivebase.borrow_mut().on_update(CYCLE);
        assert_eq!(drivebase.borrow().output(), DriveSignal::STOP);
    }

    #[test]
    fn neutral_stops_the_chassis() {
        let (drivebase, pad, mut b) = rig();
        pad.borrow_mut().set_left_y(1.0);
        b.on_tick(CYCLE);
        let mut base = drivebase.borrow_mut();
        base.neutral();
        base.on_update(CYCLE);
        assert_eq!(base.output(), DriveSignal::STOP);
    }
}
