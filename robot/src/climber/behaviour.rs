//! Climber behaviours.

use std::time::Duration;

use tracing::debug;
use wombat::{Behaviour, HasBehaviour, SubsystemId};

use super::{Climber, ClimberState};
use crate::io::{Button, Shared, XboxController};

/// Default teleop behaviour on the driver controller.
///
/// X lifts, Y hangs, B idles.  A toggles raw mode, where the left stick
/// drives the winch directly.
pub struct ClimberManualControl {
    climber: Shared<Climber>,
    driver: Shared<XboxController>,
    subsystem: SubsystemId,
    raw_control: bool,
}

impl ClimberManualControl {
    pub fn new(climber: Shared<Climber>, driver: Shared<XboxController>) -> Self {
        let subsystem = climber.borrow().subsystem_id();
        Self {
            climber,
            driver,
            subsystem,
            raw_control: false,
        }
    }
}

impl Behaviour for ClimberManualControl {
    fn controls(&self) -> SubsystemId {
        self.subsystem
    }

    fn on_tick(&mut self, _dt: Duration) {
        let mut driver = self.driver.borrow_mut();
        let mut climber = self.climber.borrow_mut();

        if driver.get_button_pressed(Button::A) {
            self.raw_control = !self.raw_control;
            debug!(raw = self.raw_control, "climber raw control toggled");
            if !self.raw_control {
                climber.set_state(ClimberState::Idle);
            }
        }

        if self.raw_control {
            let volts = driver.left_y() * climber.settings().raw_scale;
            climber.set_state(ClimberState::Raw);
            climber.set_raw(volts);
            return;
        }

        if driver.get_button_pressed(Button::X) {
            climber.set_state(ClimberState::Lift);
        }
        if driver.get_button_pressed(Button::Y) {
            climber.set_state(ClimberState::Hang);
        }
        if driver.get_button_pressed(Button::B) {
            climber.set_state(ClimberState::Idle);
        }
    }
}

/// Commands a fixed climber state every cycle.  Never finishes on its own;
/// autonomous routines bound it with `WithTimeout`.
pub struct ClimberHold {
    climber: Shared<Climber>,
    subsystem: SubsystemId,
    state: ClimberState,
}

impl ClimberHold {
    pub fn new(climber: Shared<Climber>, state: ClimberState) -> Self {
        let subsystem = climber.borrow().subsystem_id();
        Self {
            climber,
            subsystem,
            state,
        }
    }
}

impl Behaviour for ClimberHold {
    fn controls(&self) -> SubsystemId {
        self.subsystem
    }

    fn on_tick(&mut self, _dt: Duration) {
        self.climber.borrow_mut().set_state(self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::ClimberSettings;
    use crate::io::shared;

    const CYCLE: Duration = Duration::from_millis(20);

    fn rig() -> (Shared<Climber>, Shared<XboxController>) {
        (
            shared(Climber::new(ClimberSettings::default())),
            shared(XboxController::new(0)),
        )
    }

    #[test]
    fn buttons_select_states() {
        let (climber, pad) = rig();
        let mut b = ClimberManualControl::new(climber.clone(), pad.clone());

        pad.borrow_mut().tap(Button::X);
        b.on_tick(CYCLE);
        assert_eq!(climber.borrow().state(), ClimberState::Lift);

        pad.borrow_mut().tap(Button::Y);
        b.on_tick(CYCLE);
        assert_eq!(climber.borrow().state(), ClimberState::Hang);

        pad.borrow_mut().tap(Button::B);
        b.on_tick(CYCLE);
        assert_eq!(climber.borrow().state(), ClimberState::Idle);
    }

    #[test]
    fn raw_mode_drives_winch_from_stick_and_exits_to_idle() {
        let (climber, pad) = rig();
        let mut b = ClimberManualControl::new(climber.clone(), pad.clone());

        {
            let mut p = pad.borrow_mut();
            p.tap(Button::A);
            p.set_left_y(-0.5);
        }
        b.on_tick(CYCLE);
        assert_eq!(climber.borrow().state(), ClimberState::Raw);

        pad.borrow_mut().tap(Button::A);
        b.on_tick(CYCLE);
        assert_eq!(climber.borrow().state(), ClimberState::Idle);
    }

    #[test]
    fn hold_commands_its_state_every_tick() {
        let (climber, _) = rig();
        let mut b = ClimberHold::new(climber.clone(), ClimberState::Lift);
        b.on_tick(CYCLE);
        assert_eq!(climber.borrow().state(), ClimberState::Lift);

        climber.borrow_mut().set_state(ClimberState::Idle);
        b.on_tick(CYCLE);
        assert_eq!(climber.borrow().state(), ClimberState::Lift);
        assert!(!b.is_finished());
    }
}
