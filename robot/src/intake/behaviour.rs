/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Intake behaviours: operator control and sensor-driven automatic control.

use std::time::Duration;

use tracing::{debug, warn};
use wombat::{Behaviour, HasBehaviour, SubsystemId};

use super::{Intake, IntakeState};
use crate::io::{Button, Shared, XboxController};

// ── IntakeManualControl ───────────────────────────────────────────────────────

/// Default teleop behaviour on the co-driver controller.
///
/// * B toggles raw mode (left stick drives the rollers directly).
/// * Otherwise Y starts intaking and A passes to the shooter.
pub struct IntakeManualControl {
    intake: Shared<Intake>,
    codriver: Shared<XboxController>,
    subsystem: SubsystemId,
    raw_control: bool,
}

impl IntakeManualControl {
    pub fn new(intake: Shared<Intake>, codriver: Shared<XboxController>) -> Self {
        let subsystem = intake.borrow().subsystem_id();
        Self {
            intake,
            codriver,
            subsystem,
            raw_control: false,
        }
    }

    pub fn is_raw(&self) -> bool {
        self.raw_control
    }
}

impl Behaviour for IntakeManualControl {
    fn controls(&self) -> SubsystemId {
        self.subsystem
    }

    fn on_tick(&mut self, _dt: Duration) {
        let mut codriver = self.codriver.borrow_mut();
        let mut intake = self.intake.borrow_mut();

        if codriver.get_button_pressed(Button::B) {
            self.raw_control = !self.raw_control;
            debug!(raw = self.raw_control, "intake raw control toggled");
        }

        if self.raw_control {
            let volts = codriver.left_y() * intake.config().settings.raw_scale;
            intake.set_state(IntakeState::Raw);
            intake.set_raw(volts);
        } else {
            if codriver.get_button_pressed(Button::Y) {
                intake.set_state(IntakeState::Intake);
            }
            if codriver.get_button_pressed(Button::A) {
                intake.set_state(IntakeState::Pass);
            }
        }
    }
}

// ── IntakeAutoControl ─────────────────────────────────────────────────────────

/// Passes a piece as soon as the intake sensor sees it, idles once the
/// magazine is empty.
///
/// Finishes on the cycle it returns to idle after having passed at least
/// once, or as soon as the shooter sensor confirms a passed piece arrived.
pub struct IntakeAutoControl {
    intake: Shared<Intake>,
    subsystem: SubsystemId,
    passed: bool,
    finished: bool,
}

impl IntakeAutoControl {
    pub fn new(intake: Shared<Intake>) -> Self {
        let subsystem = intake.borrow().subsystem_id();
        Self {
            intake,
            subsystem,
            passed: false,
            finished: false,
        }
    }
}

impl Behaviour for IntakeAutoControl {
    fn controls(&self) -> SubsystemId {
        self.subsystem
    }

    fn on_tick(&mut self, _dt: Duration) {
        let mut intake = self.intake.borrow_mut();
        let piece_at_mouth = intake.config().intake_sensor.get();
        let piece_in_magazine = intake.config().mag_sensor.get();
        let piece_at_shooter = intake.config().shooter_sensor.get();

        if piece_at_mouth {
            intake.set_state(IntakeState::Pass);
            self.passed = true;
        } else if self.passed && piece_at_shooter {
            debug!("piece reached the shooter");
            intake.set_state(IntakeState::Idle);
            self.finished = true;
        } else if !piece_in_magazine {
            intake.set_state(IntakeState::Idle);
            self.finished = self.passed;
        } else if intake.state() == IntakeState::Raw {
            // Raw voltage left over from manual control is never safe here.
            warn!("intake left in raw mode under auto control, idling");
            intake.set_state(IntakeState::Idle);
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
