//! Arm subsystem: the pivot that angles the intake and shooter.

use std::time::Duration;

use wombat::{Behaviour, HasBehaviour, Subsystem, SubsystemId};

use crate::config::ArmSettings;
use crate::io::{Shared, XboxController};

pub struct Arm {
    id: SubsystemId,
    settings: ArmSettings,
    target: f64,
    voltage: f64,
}

impl Arm {
    pub fn new(settings: ArmSettings) -> Self {
        Self {
            id: SubsystemId::allocate(),
            settings,
            target: 0.0,
            voltage: 0.0,
        }
    }

    pub fn settings(&self) -> &ArmSettings {
        &self.settings
    }

    /// Commanded pivot voltage, clamped to `±max_voltage`.
    pub fn set_voltage(&mut self, volts: f64) {
        let max = self.settings.max_voltage;
        self.target = volts.clamp(-max, max);
    }

    pub fn voltage(&self) -> f64 {
        self.voltage
    }
}

impl HasBehaviour for Arm {
    fn subsystem_id(&self) -> SubsystemId {
        self.id
    }

    fn subsystem_name(&self) -> &str {
        "arm"
    }
}

impl Subsystem for Arm {
    fn on_update(&mut self, _dt: Duration) {
        self.voltage = self.target;
    }

    fn neutral(&mut self) {
        self.target = 0.0;
    }
}

/// Default teleop behaviour: the co-driver's right stick drives the pivot.
pub struct ArmManualControl {
    arm: Shared<Arm>,
    codriver: Shared<XboxController>,
    subsystem: SubsystemId,
}

impl ArmManualControl {
    pub fn new(arm: Shared<Arm>, codriver: Shared<XboxController>) -> Self {
        let subsystem = arm.borrow().subsystem_id();
        Self {
            arm,
            codriver,
            subsystem,
        }
    }
}

impl Behaviour for ArmManualControl {
    fn controls(&self) -> SubsystemId {
        self.subsystem
    }

    fn on_tick(&mut self, _dt: Duration) {
        let stick = self.codriver.borrow().right_y();
        let mut arm = self.arm.borrow_mut();
        let volts = stick * arm.settings().max_voltage;
        arm.set_voltage(volts);
    }
}
