/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Wombat – behaviour scheduling core
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── behaviour/      – Behaviour contract, subsystem identity, factories
//! │   └── composite   – Sequence / WaitTime / WithTimeout
//! └── scheduler/      – BehaviourScheduler + structured errors
//! ```
//!
//! Everything runs on the single control thread.  The outer loop owns a
//! [`SharedScheduler`] handle, registers every subsystem once at start-up and
//! calls [`BehaviourScheduler::tick`] once per control cycle.

pub mod behaviour;
pub mod scheduler;

pub use behaviour::{Behaviour, BehaviourFactory, HasBehaviour, Subsystem, SubsystemId};
pub use scheduler::{BehaviourError, BehaviourScheduler, NeutralOutput, SharedScheduler, SlotState};
