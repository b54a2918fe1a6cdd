/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use robot::autos::AutoRoutine;
use robot::config::RobotConfig;
use robot::robot::{LoopTimer, Robot};
use wombat::BehaviourScheduler;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Simulated robot: runs an autonomous phase, then teleop, then disables.
///
/// Example:
///   robot-sim --config robot.yaml --auto collect --auto-cycles 250
#[derive(Debug, Parser)]
#[command(
    name = "robot-sim",
    about = "Robot control loop on the wombat behaviour scheduler",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML robot configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Override the control-cycle period from the configuration (ms).
    #[arg(short = 'p', long = "period-ms")]
    period_ms: Option<u64>,

    /// Autonomous routine to run.
    #[arg(short = 'a', long = "auto", value_enum, default_value_t = AutoRoutine::None)]
    auto: AutoRoutine,

    /// Number of control cycles spent in autonomous.
    #[arg(long = "auto-cycles", default_value_t = 250)]
    auto_cycles: u64,

    /// Number of control cycles spent in teleop.
    #[arg(long = "teleop-cycles", default_value_t = 500)]
    teleop_cycles: u64,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(
        config        = ?cli.config,
        period_ms     = ?cli.period_ms,
        auto          = %cli.auto,
        auto_cycles   = cli.auto_cycles,
        teleop_cycles = cli.teleop_cycles,
        "Configuration"
    );

    if let Err(e) = run(cli).await {
        error!("robot-sim failed: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => RobotConfig::load_from_file(path)?,
        None => {
            warn!("No configuration file provided, using default robot configuration");
            RobotConfig::default()
        }
    };
    if let Some(period_ms) = cli.period_ms {
        ensure!(period_ms > 0, "--period-ms must be positive");
        config.cycle.period_ms = period_ms;
    }

    let mut robot = Robot::robot_init(config, BehaviourScheduler::shared())
        .context("robot initialisation failed")?;
    let period = robot.config().cycle.period();

    robot
        .autonomous_init(cli.auto)
        .with_context(|| format!("cannot start autonomous routine '{}'", cli.auto))?;
    let completed = run_phase(&mut robot, period, cli.auto_cycles).await;
    robot.log_status();

    if completed {
        robot.teleop_init();
        run_phase(&mut robot, period, cli.teleop_cycles).await;
        robot.log_status();
    }

    robot.disabled_init();
    info!(
        cycles = robot.scheduler().borrow().cycle_count(),
        "robot-sim finished"
    );
    Ok(())
}

/// Drive `robot_periodic` at `period` for `cycles` cycles.
///
/// Returns `false` if interrupted by Ctrl-C.
async fn run_phase(robot: &mut Robot, period: Duration, cycles: u64) -> bool {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut timer = LoopTimer::start();

    info!(mode = %robot.mode(), cycles, period = ?period, "phase started");
    for _ in 0..cycles {
        tokio::select! {
            _ = interval.tick() => {
                let dt = timer.lap();
                robot.robot_periodic(dt);
            }
            _ = tokio::signal::ctrl_c() => {
                warn!(mode = %robot.mode(), "Ctrl-C received, stopping");
                return false;
            }
        }
    }
    true
}
