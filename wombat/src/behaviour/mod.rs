/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core behaviour data structures for the Wombat scheduler.
//!
//! Two sides meet here:
//!
//! ```text
//! Subsystem  ──(SubsystemId)──►  BehaviourScheduler  ◄──(Box<dyn Behaviour>)──  factory / schedule()
//!    ↑ long-lived, registered once                      ↑ transient, owned by exactly one slot
//! ```
//!
//! # Ownership model
//! A `Box<dyn Behaviour>` is **moved** into the scheduler by
//! [`BehaviourScheduler::schedule`](crate::BehaviourScheduler::schedule) or
//! produced by a subsystem's default factory.  The scheduler slot keyed by
//! [`Behaviour::controls`] is then its only owner; replacing or interrupting
//! it simply drops the box.  Behaviours that hold resources release them in
//! `Drop`; there is no separate teardown call.

pub mod composite;

pub use composite::{Sequence, WaitTime, WithTimeout};

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

// ── Subsystem identity ────────────────────────────────────────────────────────

/// Source of fresh [`SubsystemId`]s.  Starts at 1 so `0` never names a
/// subsystem.
static NEXT_SUBSYSTEM_ID: AtomicU32 = AtomicU32::new(1);

/// Stable identity of one physical subsystem.
///
/// Ids are handed out monotonically, so ordering by id is ordering by
/// creation.  The scheduler iterates its registry in this order, which keeps
/// every tick deterministic within a process run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubsystemId(u32);

impl SubsystemId {
    /// Allocate a new, never-before-used id.
    pub fn allocate() -> Self {
        SubsystemId(NEXT_SUBSYSTEM_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for logging and telemetry keys.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Behaviour contract ────────────────────────────────────────────────────────

/// A unit of control logic bound to exactly one subsystem.
///
/// Implementations read operator inputs and the bound subsystem's sensors,
/// and write the subsystem's commanded state.  They never touch the
/// scheduler: ownership changes go through `schedule()` / `interrupt_all()`
/// only.
///
/// `on_tick` must not fail.  A behaviour that reaches a state it cannot handle
/// commands a safe, non-actuating output for that cycle instead.
pub trait Behaviour {
    /// Human-readable name used in logs.  Defaults to the type name.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// The subsystem this behaviour controls for its whole lifetime.
    fn controls(&self) -> SubsystemId;

    /// Advance by one control cycle.  `dt` is the time since the previous
    /// cycle.
    fn on_tick(&mut self, dt: Duration);

    /// `true` once the behaviour should be retired.  Manual-control style
    /// behaviours never finish.
    fn is_finished(&self) -> bool {
        false
    }
}

/// Lazily constructs a fresh default behaviour for one subsystem.
///
/// Invoked only on the Empty → ActiveDefault transition.  The closure
/// captures whatever subsystem and input handles the behaviour needs.
pub type BehaviourFactory = Box<dyn Fn() -> Box<dyn Behaviour>>;

// ── Subsystem side ────────────────────────────────────────────────────────────

/// Capability every schedulable subsystem exposes: a stable identity and a
/// name for diagnostics.
pub trait HasBehaviour {
    fn subsystem_id(&self) -> SubsystemId;

    fn subsystem_name(&self) -> &str;
}

/// A physical mechanism with its own per-cycle update.
///
/// `on_update` is called by the outer loop independently of behaviour
/// advancement; it applies whatever target the active behaviour last set.
pub trait Subsystem: HasBehaviour {
    fn on_update(&mut self, dt: Duration);

    /// Drop every actuation target to its safe, non-actuating value.  The
    /// next `on_update` then outputs nothing until a behaviour commands
    /// again.
    fn neutral(&mut self);
}

/// `"wombat::behaviour::composite::Sequence"` → `"Sequence"`.
///
/// Generic parameters are left alone (`"Foo<bar::Baz>"` keeps its path inside
/// the angle brackets).
fn short_type_name(full: &str) -> &str {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
