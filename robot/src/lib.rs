/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Robot program built on the wombat behaviour scheduler
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── io          – simulated Xbox controllers and beam-break inputs
//! ├── config      – YAML robot configuration
//! ├── shooter/    – flywheel subsystem + trigger control
//! ├── drivebase/  – chassis demand + manual drive
//! ├── arm/        – pivot subsystem + stick control
//! ├── intake/     – intake subsystem + manual / automatic control
//! ├── climber/    – climber subsystem + manual control / hold
//! ├── autos       – autonomous routines
//! └── robot       – Robot outer loop, operating modes, LoopTimer
//! ```

pub mod arm;
pub mod autos;
pub mod climber;
pub mod config;
pub mod drivebase;
pub mod intake;
pub mod io;
pub mod robot;
pub mod shooter;
