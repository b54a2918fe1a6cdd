//! Autonomous routines.
//!
//! Each routine yields at most one top-level behaviour per subsystem it
//! drives; `Robot::autonomous_init` schedules them after interrupting
//! everything.

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use wombat::behaviour::{Sequence, WaitTime, WithTimeout};
use wombat::{Behaviour, BehaviourError, HasBehaviour};

use crate::climber::{Climber, ClimberHold, ClimberState};
use crate::intake::{Intake, IntakeAutoControl};
use crate::io::Shared;

/// How long the intake waits for a piece before giving up.
pub const COLLECT_TIMEOUT: Duration = Duration::from_secs(3);
/// Settle time after collecting before the intake returns to its default.
pub const COLLECT_SETTLE: Duration = Duration::from_millis(500);
pub const CLIMB_LIFT_TIME: Duration = Duration::from_millis(1500);
pub const CLIMB_HANG_TIME: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AutoRoutine {
    /// Leave every subsystem on its default behaviour.
    #[default]
    None,
    /// Run the intake on its sensors until a piece has been passed.
    Collect,
    /// Lift the climber, then hang.
    Climb,
}

impl fmt::Display for AutoRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AutoRoutine::None => "none",
            AutoRoutine::Collect => "collect",
            AutoRoutine::Climb => "climb",
        };
        f.write_str(s)
    }
}

/// Intake: automatic control bounded by [`COLLECT_TIMEOUT`], then a short
/// settle wait.
pub fn collect(intake: &Shared<Intake>) -> Result<Box<dyn Behaviour>, BehaviourError> {
    let id = intake.borrow().subsystem_id();
    let auto = WithTimeout::new(
        Box::new(IntakeAutoControl::new(intake.clone())),
        COLLECT_TIMEOUT,
    );
    let seq = Sequence::new(Box::new(auto)).then(Box::new(WaitTime::new(id, COLLECT_SETTLE)))?;
    Ok(Box::new(seq))
}

/// Climber: lift for [`CLIMB_LIFT_TIME`], then hang for [`CLIMB_HANG_TIME`].
pub fn climb(climber: &Shared<Climber>) -> Result<Box<dyn Behaviour>, BehaviourError> {
    let lift = WithTimeout::new(
        Box::new(ClimberHold::new(climber.clone(), ClimberState::Lift)),
        CLIMB_LIFT_TIME,
    );
    let hang = WithTimeout::new(
        Box::new(ClimberHold::new(climber.clone(), ClimberState::Hang)),
        CLIMB_HANG_TIME,
    );
    let seq = Sequence::new(Box::new(lift)).then(Box::new(hang))?;
    Ok(Box::new(seq))
}
