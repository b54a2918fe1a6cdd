/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The outer periodic loop: subsystem construction, per-cycle update and
//! operating-mode transitions.
//!
//! ```text
//! robot_init ──► [ autonomous_init ──► robot_periodic × N ]
//!            ──► [ teleop_init     ──► robot_periodic × M ]
//!            ──► disabled_init
//! ```
//!
//! `robot_periodic` ticks the scheduler first (behaviours set targets), then
//! runs every subsystem's own update (targets become outputs).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use wombat::{
    Behaviour, BehaviourError, BehaviourScheduler, HasBehaviour, SharedScheduler, Subsystem,
    SubsystemId,
};

use crate::arm::{Arm, ArmManualControl};
use crate::autos::{self, AutoRoutine};
use crate::climber::{Climber, ClimberManualControl};
use crate::config::RobotConfig;
use crate::drivebase::{Drivebase, ManualDrivebase};
use crate::intake::{Intake, IntakeConfig, IntakeManualControl};
use crate::io::{shared, DigitalInput, Shared, XboxController};
use crate::shooter::{Shooter, ShooterManualControl};

// ── Mode ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Disabled,
    Autonomous,
    Teleop,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Disabled => "disabled",
            Mode::Autonomous => "autonomous",
            Mode::Teleop => "teleop",
        };
        f.write_str(s)
    }
}

// ── LoopTimer ─────────────────────────────────────────────────────────────────

/// Derives the per-cycle `dt` from successive timestamps.
#[derive(Debug, Clone, Copy)]
pub struct LoopTimer {
    last: Instant,
}

impl LoopTimer {
    pub fn start() -> Self {
        Self::start_at(Instant::now())
    }

    pub fn start_at(now: Instant) -> Self {
        Self { last: now }
    }

    /// Time since the previous lap (or start).
    pub fn lap(&mut self) -> Duration {
        self.lap_at(Instant::now())
    }

    pub fn lap_at(&mut self, now: Instant) -> Duration {
        let dt = now.saturating_duration_since(self.last);
        self.last = now;
        dt
    }
}

// ── Robot ─────────────────────────────────────────────────────────────────────

/// Beam-break sensors along the piece path, shared with the intake.
#[derive(Debug, Clone)]
pub struct IntakeSensors {
    pub intake: DigitalInput,
    pub magazine: DigitalInput,
    pub shooter: DigitalInput,
}

pub struct Robot {
    config: RobotConfig,
    scheduler: SharedScheduler,
    mode: Mode,

    driver: Shared<XboxController>,
    codriver: Shared<XboxController>,
    sensors: IntakeSensors,

    shooter: Shared<Shooter>,
    drivebase: Shared<Drivebase>,
    arm: Shared<Arm>,
    intake: Shared<Intake>,
    climber: Shared<Climber>,

    /// Every subsystem, in creation order, for the per-cycle update.
    subsystems: Vec<Rc<RefCell<dyn Subsystem>>>,
}

impl Robot {
    /// Build every subsystem, register it with `scheduler` and install its
    /// default behaviour and neutral output.
    ///
    /// # Errors
    /// Only if a hook is installed for a subsystem that failed to register,
    /// which would be a bug in this function.
    pub fn robot_init(config: RobotConfig, scheduler: SharedScheduler) -> Result<Self, BehaviourError> {
        let driver = shared(XboxController::new(0));
        let codriver = shared(XboxController::new(1));
        let sensors = IntakeSensors {
            intake: DigitalInput::new(0),
            magazine: DigitalInput::new(1),
            shooter: DigitalInput::new(2),
        };
        info!(
            driver_port = driver.borrow().port(),
            codriver_port = codriver.borrow().port(),
            intake_dio = sensors.intake.channel(),
            magazine_dio = sensors.magazine.channel(),
            shooter_dio = sensors.shooter.channel(),
            "inputs"
        );

        let shooter = shared(Shooter::new(config.shooter.clone()));
        let drivebase = shared(Drivebase::new(config.drivebase.clone()));
        let arm = shared(Arm::new(config.arm.clone()));
        let intake = shared(Intake::new(IntakeConfig {
            settings: config.intake.clone(),
            intake_sensor: sensors.intake.clone(),
            mag_sensor: sensors.magazine.clone(),
            shooter_sensor: sensors.shooter.clone(),
        }));
        let climber = shared(Climber::new(config.climber.clone()));

        {
            let mut sched = scheduler.borrow_mut();

            let (s, pad) = (shooter.clone(), codriver.clone());
            install(&mut sched, &shooter, move || {
                Box::new(ShooterManualControl::new(s.clone(), pad.clone()))
            })?;

            let (d, pad) = (drivebase.clone(), driver.clone());
            install(&mut sched, &drivebase, move || {
                Box::new(ManualDrivebase::new(d.clone(), pad.clone()))
            })?;

            let (a, pad) = (arm.clone(), codriver.clone());
            install(&mut sched, &arm, move || {
                Box::new(ArmManualControl::new(a.clone(), pad.clone()))
            })?;

            let (i, pad) = (intake.clone(), codriver.clone());
            install(&mut sched, &intake, move || {
                Box::new(IntakeManualControl::new(i.clone(), pad.clone()))
            })?;

            let (c, pad) = (climber.clone(), driver.clone());
            install(&mut sched, &climber, move || {
                Box::new(ClimberManualControl::new(c.clone(), pad.clone()))
            })?;
        }

        let mut subsystems: Vec<Rc<RefCell<dyn Subsystem>>> = Vec::with_capacity(5);
        subsystems.push(shooter.clone());
        subsystems.push(drivebase.clone());
        subsystems.push(arm.clone());
        subsystems.push(intake.clone());
        subsystems.push(climber.clone());

        info!(subsystems = subsystems.len(), "robot initialised");

        Ok(Self {
            config,
            scheduler,
            mode: Mode::Disabled,
            driver,
            codriver,
            sensors,
            shooter,
            drivebase,
            arm,
            intake,
            climber,
            subsystems,
        })
    }

    /// One control cycle.
    pub fn robot_periodic(&mut self, dt: Duration) {
        self.scheduler.borrow_mut().tick(dt);
        for subsystem in &self.subsystems {
            subsystem.borrow_mut().on_update(dt);
        }
    }

    /// Enter autonomous: drop whatever teleop left running, then hand each
    /// subsystem the routine selects to its autonomous behaviour.
    pub fn autonomous_init(&mut self, routine: AutoRoutine) -> Result<(), BehaviourError> {
        self.enter(Mode::Autonomous);
        info!(%routine, "Auto selected");

        let mut sched = self.scheduler.borrow_mut();
        match routine {
            AutoRoutine::None => {}
            AutoRoutine::Collect => sched.schedule(autos::collect(&self.intake)?)?,
            AutoRoutine::Climb => sched.schedule(autos::climb(&self.climber)?)?,
        }
        Ok(())
    }

    /// Enter teleop: every subsystem falls back to manual control on the next
    /// cycle.
    pub fn teleop_init(&mut self) {
        self.enter(Mode::Teleop);
    }

    /// Enter disabled: every active behaviour is interrupted.
    pub fn disabled_init(&mut self) {
        self.enter(Mode::Disabled);
    }

    /// Interrupt everything and clear the targets the previous mode latched,
    /// so nothing it commanded reaches an actuator after the transition.
    fn enter(&mut self, mode: Mode) {
        info!(from = %self.mode, to = %mode, "mode transition");
        self.mode = mode;
        self.scheduler.borrow_mut().interrupt_all();
        for subsystem in &self.subsystems {
            subsystem.borrow_mut().neutral();
        }
    }

    /// Log every subsystem's active behaviour and output.
    pub fn log_status(&self) {
        let sched = self.scheduler.borrow();
        for subsystem in &self.subsystems {
            let subsystem = subsystem.borrow();
            let id = subsystem.subsystem_id();
            match sched.active_behaviour_name(id) {
                Some(behaviour) => info!(
                    subsystem = subsystem.subsystem_name(),
                    behaviour,
                    "status"
                ),
                None => warn!(subsystem = subsystem.subsystem_name(), "status: no active behaviour"),
            }
        }

        let intake = self.intake.borrow();
        let climber = self.climber.borrow();
        info!(
            mode = %self.mode,
            cycles = sched.cycle_count(),
            drive = ?self.drivebase.borrow().output(),
            arm_v = self.arm.borrow().voltage(),
            shooter_v = self.shooter.borrow().voltage(),
            intake_state = %intake.state(),
            intake_v = intake.voltage(),
            has_piece = intake.has_piece(),
            climber_state = %climber.state(),
            climber_v = climber.voltage(),
            "outputs"
        );
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn scheduler(&self) -> &SharedScheduler {
        &self.scheduler
    }

    pub fn driver(&self) -> &Shared<XboxController> {
        &self.driver
    }

    pub fn codriver(&self) -> &Shared<XboxController> {
        &self.codriver
    }

    pub fn sensors(&self) -> &IntakeSensors {
        &self.sensors
    }

    pub fn shooter(&self) -> &Shared<Shooter> {
        &self.shooter
    }

    pub fn drivebase(&self) -> &Shared<Drivebase> {
        &self.drivebase
    }

    pub fn arm(&self) -> &Shared<Arm> {
        &self.arm
    }

    pub fn intake(&self) -> &Shared<Intake> {
        &self.intake
    }

    pub fn climber(&self) -> &Shared<Climber> {
        &self.climber
    }
}

/// Register `subsystem`, give it `default` and route contained faults to its
/// neutral output.
fn install<S, F>(
    sched: &mut BehaviourScheduler,
    subsystem: &Shared<S>,
    default: F,
) -> Result<SubsystemId, BehaviourError>
where
    S: Subsystem + 'static,
    F: Fn() -> Box<dyn Behaviour> + 'static,
{
    let id = {
        let s = subsystem.borrow();
        sched.register(&*s);
        s.subsystem_id()
    };
    sched.set_default_behaviour(id, default)?;

    let handle = Rc::clone(subsystem);
    sched.set_neutral_output(id, move || match handle.try_borrow_mut() {
        Ok(mut s) => s.neutral(),
        Err(_) => warn!(id = %id, "subsystem busy, neutral output skipped"),
    })?;
    Ok(id)
}

fn subsystem_id<S: HasBehaviour>(subsystem: &Shared<S>) -> SubsystemId {
    subsystem.borrow().subsystem_id()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use wombat::SlotState;

    use crate::climber::ClimberState;
    use crate::drivebase::DriveSignal;
    use crate::intake::IntakeState;
    use crate::io::Button;

    const CYCLE: Duration = Duration::from_millis(20);

    fn robot() -> Robot {
        Robot::robot_init(RobotConfig::default(), BehaviourScheduler::shared()).unwrap()
    }

    fn ids(robot: &Robot) -> [SubsystemId; 5] {
        [
            subsystem_id(robot.shooter()),
            subsystem_id(robot.drivebase()),
            subsystem_id(robot.arm()),
            subsystem_id(robot.intake()),
            subsystem_id(robot.climber()),
        ]
    }

    /// Commands `Pass` on the intake, then panics mid-tick.
    struct PassThenPanic {
        intake: Shared<Intake>,
        subsystem: SubsystemId,
    }

    impl Behaviour for PassThenPanic {
        fn controls(&self) -> SubsystemId {
            self.subsystem
        }

        fn on_tick(&mut self, _dt: Duration) {
            self.intake.borrow_mut().set_state(IntakeState::Pass);
            panic!("intake behaviour faulted");
        }
    }

    #[test]
    fn init_registers_every_subsystem_with_a_default() {
        let robot = robot();
        let sched = robot.scheduler().borrow();
        assert_eq!(sched.len(), 5);
        for id in ids(&robot) {
            assert!(sched.has_default(id));
            assert_eq!(sched.slot_state(id), Some(SlotState::Empty));
        }
        assert_eq!(sched.subsystems().collect::<Vec<_>>(), ids(&robot).to_vec());
        assert_eq!(robot.mode(), Mode::Disabled);
    }

    #[test]
    fn first_periodic_installs_manual_control_everywhere() {
        let mut robot = robot();
        robot.robot_periodic(CYCLE);

        let sched = robot.scheduler().borrow();
        let names: Vec<_> = ids(&robot)
            .into_iter()
            .map(|id| sched.active_behaviour_name(id))
            .collect();
        assert_eq!(
            names,
            vec![
                Some("ShooterManualControl"),
                Some("ManualDrivebase"),
                Some("ArmManualControl"),
                Some("IntakeManualControl"),
                Some("ClimberManualControl"),
            ]
        );
    }

    #[test]
    fn teleop_codriver_input_reaches_outputs_in_the_same_cycle() {
        let mut robot = robot();
        robot.teleop_init();
        {
            let mut pad = robot.codriver().borrow_mut();
            pad.tap(Button::Y);
            pad.set_right_trigger(0.5);
            pad.set_right_y(1.0);
        }
        robot.robot_periodic(CYCLE);

        assert_eq!(robot.intake().borrow().state(), IntakeState::Intake);
        assert_eq!(robot.intake().borrow().voltage(), 10.0);
        assert_eq!(robot.shooter().borrow().voltage(), 6.0);
        assert_eq!(robot.arm().borrow().voltage(), 6.0);
    }

    #[test]
    fn teleop_driver_input_drives_base_and_climber() {
        let mut robot = robot();
        robot.teleop_init();
        {
            let mut pad = robot.driver().borrow_mut();
            pad.tap(Button::X);
            pad.set_left_y(0.5);
        }
        robot.robot_periodic(CYCLE);

        assert_eq!(robot.climber().borrow().state(), ClimberState::Lift);
        assert_eq!(robot.climber().borrow().voltage(), 8.0);
        assert_eq!(robot.drivebase().borrow().output().forward, 6.0);
    }

    #[test]
    fn faulted_behaviour_leaves_subsystem_neutral() {
        let mut robot = robot();
        robot.teleop_init();
        robot.robot_periodic(CYCLE);
        let intake = subsystem_id(robot.intake());

        robot
            .scheduler()
            .borrow_mut()
            .schedule(Box::new(PassThenPanic {
                intake: robot.intake().clone(),
                subsystem: intake,
            }))
            .unwrap();
        robot.robot_periodic(CYCLE);
        assert_eq!(robot.scheduler().borrow().slot_state(intake), Some(SlotState::Empty));
        assert_eq!(robot.intake().borrow().state(), IntakeState::Idle);
        assert_eq!(robot.intake().borrow().voltage(), 0.0);

        for _ in 0..50 {
            robot.robot_periodic(CYCLE);
        }
        assert_eq!(
            robot.scheduler().borrow().slot_state(intake),
            Some(SlotState::ActiveDefault)
        );
        assert_eq!(robot.intake().borrow().voltage(), 0.0);
    }

    #[test]
    fn autonomous_collect_then_teleop_falls_back_to_defaults() {
        let mut robot = robot();
        robot.robot_periodic(CYCLE);

        robot.autonomous_init(AutoRoutine::Collect).unwrap();
        let [shooter, _, _, intake, _] = ids(&robot);
        {
            let sched = robot.scheduler().borrow();
            assert_eq!(sched.slot_state(intake), Some(SlotState::ActiveExplicit));
            assert_eq!(sched.slot_state(shooter), Some(SlotState::Empty));
        }

        robot.sensors().intake.set(true);
        robot.robot_periodic(CYCLE);
        assert_eq!(robot.intake().borrow().state(), IntakeState::Pass);
        assert_eq!(robot.intake().borrow().voltage(), 10.0);
        {
            let sched = robot.scheduler().borrow();
            assert_eq!(sched.slot_state(intake), Some(SlotState::ActiveExplicit));
            assert_eq!(sched.slot_state(shooter), Some(SlotState::ActiveDefault));
        }

        robot.teleop_init();
        assert_eq!(
            robot.scheduler().borrow().slot_state(intake),
            Some(SlotState::Empty)
        );
        robot.sensors().intake.set(false);
        for _ in 0..10 {
            robot.robot_periodic(CYCLE);
        }
        assert_eq!(
            robot.scheduler().borrow().active_behaviour_name(intake),
            Some("IntakeManualControl")
        );
        assert_eq!(robot.intake().borrow().state(), IntakeState::Idle);
        assert_eq!(robot.intake().borrow().voltage(), 0.0, "auto output not carried into teleop");
    }

    #[test]
    fn mode_transition_clears_every_latched_target() {
        let mut robot = robot();
        robot.teleop_init();
        {
            let mut pad = robot.driver().borrow_mut();
            pad.tap(Button::Y);
            pad.set_left_y(1.0);
        }
        robot.codriver().borrow_mut().set_right_y(-1.0);
        robot.robot_periodic(CYCLE);
        assert_eq!(robot.climber().borrow().state(), ClimberState::Hang);

        robot.disabled_init();
        for subsystem in &robot.subsystems {
            subsystem.borrow_mut().on_update(CYCLE);
        }
        assert_eq!(robot.climber().borrow().voltage(), 0.0);
        assert_eq!(robot.arm().borrow().voltage(), 0.0);
        assert_eq!(robot.drivebase().borrow().output(), DriveSignal::STOP);
    }

    #[test]
    fn autonomous_climb_runs_to_completion_then_manual_control() {
        let mut robot = robot();
        robot.autonomous_init(AutoRoutine::Climb).unwrap();
        let climber = subsystem_id(robot.climber());

        robot.robot_periodic(CYCLE);
        assert_eq!(robot.climber().borrow().state(), ClimberState::Lift);
        assert_eq!(robot.climber().borrow().voltage(), 8.0);

        // 1.5 s lift + 2 s hang at 20 ms per cycle.
        for _ in 1..175 {
            robot.robot_periodic(CYCLE);
        }
        assert_eq!(
            robot.scheduler().borrow().slot_state(climber),
            Some(SlotState::ActiveDefault)
        );
    }

    #[test]
    fn autonomous_none_leaves_defaults() {
        let mut robot = robot();
        robot.autonomous_init(AutoRoutine::None).unwrap();
        robot.robot_periodic(CYCLE);
        let sched = robot.scheduler().borrow();
        for id in ids(&robot) {
            assert_eq!(sched.slot_state(id), Some(SlotState::ActiveDefault));
        }
    }

    #[test]
    fn disabled_interrupts_the_autonomous_routine() {
        let mut robot = robot();
        robot.autonomous_init(AutoRoutine::Climb).unwrap();
        robot.disabled_init();
        assert_eq!(robot.mode(), Mode::Disabled);
        let climber = subsystem_id(robot.climber());
        assert_eq!(
            robot.scheduler().borrow().slot_state(climber),
            Some(SlotState::Empty)
        );
    }

    #[test]
    fn loop_timer_measures_between_laps() {
        let t0 = Instant::now();
        let mut timer = LoopTimer::start_at(t0);
        assert_eq!(timer.lap_at(t0 + Duration::from_millis(20)), Duration::from_millis(20));
        assert_eq!(timer.lap_at(t0 + Duration::from_millis(45)), Duration::from_millis(25));
        // Clock going backwards never yields a negative dt.
        assert_eq!(timer.lap_at(t0), Duration::ZERO);
    }
}
