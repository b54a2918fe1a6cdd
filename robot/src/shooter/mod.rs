//! Shooter subsystem and its trigger-driven manual control.

use std::time::Duration;

use wombat::{Behaviour, HasBehaviour, Subsystem, SubsystemId};

use crate::config::ShooterSettings;
use crate::io::{Shared, XboxController};

pub struct Shooter {
    id: SubsystemId,
    settings: ShooterSettings,
    target: f64,
    voltage: f64,
}

impl Shooter {
    pub fn new(settings: ShooterSettings) -> Self {
        Self {
            id: SubsystemId::allocate(),
            settings,
            target: 0.0,
            voltage: 0.0,
        }
    }

    pub fn settings(&self) -> &ShooterSettings {
        &self.settings
    }

    /// Commanded flywheel voltage, clamped to `±max_voltage`.
    pub fn set_voltage(&mut self, volts: f64) {
        let max = self.settings.max_voltage;
        self.target = volts.clamp(-max, max);
    }

    pub fn voltage(&self) -> f64 {
        self.voltage
    }
}

impl HasBehaviour for Shooter {
    fn subsystem_id(&self) -> SubsystemId {
        self.id
    }

    fn subsystem_name(&self) -> &str {
        "shooter"
    }
}

impl Subsystem for Shooter {
    fn on_update(&mut self, _dt: Duration) {
        self.voltage = self.target;
    }

    fn neutral(&mut self) {
        self.target = 0.0;
    }
}

/// Spins the flywheel proportionally to the co-driver's right trigger.
pub struct ShooterManualControl {
    shooter: Shared<Shooter>,
    codriver: Shared<XboxController>,
    subsystem: SubsystemId,
}

impl ShooterManualControl {
    pub fn new(shooter: Shared<Shooter>, codriver: Shared<XboxController>) -> Self {
        let subsystem = shooter.borrow().subsystem_id();
        Self {
            shooter,
            codriver,
            subsystem,
        }
    }
}

impl Behaviour for ShooterManualControl {
    fn controls(&self) -> SubsystemId {
        self.subsystem
    }

    fn on_tick(&mut self, _dt: Duration) {
        let trigger = self.codriver.borrow().right_trigger();
        let mut shooter = self.shooter.borrow_mut();
        let volts = trigger * shooter.settings().max_voltage;
        shooter.set_voltage(volts);
    }
}
