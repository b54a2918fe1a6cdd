/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Composite behaviours used to build autonomous routines.
//!
//! All of them stay bound to a single subsystem, like every other behaviour.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::debug;

use super::{Behaviour, SubsystemId};
use crate::scheduler::BehaviourError;

// ── Sequence ──────────────────────────────────────────────────────────────────

/// Runs its steps one after another, each until it reports completion.
///
/// A step that finishes during its `on_tick` is dropped immediately; the next
/// step gets its first tick on the following cycle.
pub struct Sequence {
    subsystem: SubsystemId,
    steps: VecDeque<Box<dyn Behaviour>>,
}

impl Sequence {
    pub fn new(first: Box<dyn Behaviour>) -> Self {
        let subsystem = first.controls();
        let mut steps = VecDeque::new();
        steps.push_back(first);
        Self { subsystem, steps }
    }

    /// Append a step.
    ///
    /// # Errors
    /// [`BehaviourError::MixedSubsystems`] if `next` controls a different
    /// subsystem than the sequence.
    pub fn then(mut self, next: Box<dyn Behaviour>) -> Result<Self, BehaviourError> {
        if next.controls() != self.subsystem {
            return Err(BehaviourError::MixedSubsystems {
                behaviour: next.name().to_string(),
                expected: self.subsystem,
                actual: next.controls(),
            });
        }
        self.steps.push_back(next);
        Ok(self)
    }

    fn drop_finished_head(&mut self) {
        while self.steps.front().is_some_and(|s| s.is_finished()) {
            if let Some(done) = self.steps.pop_front() {
                debug!(
                    step = done.name(),
                    remaining = self.steps.len(),
                    "sequence step finished"
                );
            }
        }
    }
}

impl Behaviour for Sequence {
    fn controls(&self) -> SubsystemId {
        self.subsystem
    }

    fn on_tick(&mut self, dt: Duration) {
        self.drop_finished_head();
        if let Some(step) = self.steps.front_mut() {
            step.on_tick(dt);
        }
        self.drop_finished_head();
    }

    fn is_finished(&self) -> bool {
        self.steps.is_empty()
    }
}

// ── WaitTime ──────────────────────────────────────────────────────────────────

/// Holds the subsystem without commanding it until `duration` has elapsed.
pub struct WaitTime {
    subsystem: SubsystemId,
    duration: Duration,
    elapsed: Duration,
}

impl WaitTime {
    pub fn new(subsystem: SubsystemId, duration: Duration) -> Self {
        Self {
            subsystem,
            duration,
            elapsed: Duration::ZERO,
        }
    }
}

impl Behaviour for WaitTime {
    fn controls(&self) -> SubsystemId {
        self.subsystem
    }

    fn on_tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

// ── WithTimeout ───────────────────────────────────────────────────────────────

/// Wraps a behaviour and retires it after `limit`, whether or not it finished
/// on its own.
///
/// The scheduler has no per-behaviour timeout; routines that need one opt in
/// by wrapping.
pub struct WithTimeout {
    inner: Box<dyn Behaviour>,
    limit: Duration,
    elapsed: Duration,
}

impl WithTimeout {
    pub fn new(inner: Box<dyn Behaviour>, limit: Duration) -> Self {
        Self {
            inner,
            limit,
            elapsed: Duration::ZERO,
        }
    }

    pub fn timed_out(&self) -> bool {
        self.elapsed >= self.limit
    }
}

impl Behaviour for WithTimeout {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn controls(&self) -> SubsystemId {
        self.inner.controls()
    }

    fn on_tick(&mut self, dt: Duration) {
        if self.timed_out() {
            return;
        }
        self.inner.on_tick(dt);
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_finished(&self) -> bool {
        self.timed_out() || self.inner.is_finished()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;
    use std::rc::Rc;

    const CYCLE: Duration = Duration::from_millis(20);

    /// Counts its ticks and finishes after `finish_after` of them.
    struct Counted {
        subsystem: SubsystemId,
        ticks: Rc<Cell<u32>>,
        finish_after: u32,
    }

    impl Behaviour for Counted {
        fn controls(&self) -> SubsystemId {
            self.subsystem
        }

        fn on_tick(&mut self, _dt: Duration) {
            self.ticks.set(self.ticks.get() + 1);
        }

        fn is_finished(&self) -> bool {
            self.ticks.get() >= self.finish_after
        }
    }

    fn counted(subsystem: SubsystemId, finish_after: u32) -> (Box<dyn Behaviour>, Rc<Cell<u32>>) {
        let ticks = Rc::new(Cell::new(0));
        let b = Counted {
            subsystem,
            ticks: Rc::clone(&ticks),
            finish_after,
        };
        (Box::new(b), ticks)
    }

    // ── Sequence ──────────────────────────────────────────────────────────────

    #[test]
    fn sequence_runs_steps_in_order() {
        let id = SubsystemId::allocate();
        let (first, first_ticks) = counted(id, 2);
        let (second, second_ticks) = counted(id, 1);
        let mut seq = Sequence::new(first).then(second).unwrap();

        seq.on_tick(CYCLE);
        assert_eq!((first_ticks.get(), second_ticks.get()), (1, 0));

        seq.on_tick(CYCLE);
        assert_eq!((first_ticks.get(), second_ticks.get()), (2, 0));
        assert_eq!(seq.steps.len(), 1, "finished first step is dropped");
        assert!(!seq.is_finished());

        seq.on_tick(CYCLE);
        assert_eq!(second_ticks.get(), 1);
        assert!(seq.is_finished());
    }

    #[test]
    fn sequence_rejects_step_for_other_subsystem() {
        let a = SubsystemId::allocate();
        let b = SubsystemId::allocate();
        let (first, _) = counted(a, 1);
        let (other, _) = counted(b, 1);

        let err = Sequence::new(first).then(other).err().unwrap();
        assert!(matches!(
            err,
            BehaviourError::MixedSubsystems { expected, actual, .. } if expected == a && actual == b
        ));
    }

    #[test]
    fn sequence_skips_steps_that_are_already_finished() {
        let id = SubsystemId::allocate();
        let (done, done_ticks) = counted(id, 0);
        let (next, next_ticks) = counted(id, 5);
        let mut seq = Sequence::new(done).then(next).unwrap();

        seq.on_tick(CYCLE);
        assert_eq!(done_ticks.get(), 0, "finished step is never advanced");
        assert_eq!(next_ticks.get(), 1);
    }

    #[test]
    fn sequence_controls_its_first_steps_subsystem() {
        let id = SubsystemId::allocate();
        let (first, _) = counted(id, 1);
        assert_eq!(Sequence::new(first).controls(), id);
    }

    // ── WaitTime ──────────────────────────────────────────────────────────────

    #[test]
    fn wait_time_finishes_after_duration() {
        let mut wait = WaitTime::new(SubsystemId::allocate(), Duration::from_millis(50));
        wait.on_tick(CYCLE);
        wait.on_tick(CYCLE);
        assert!(!wait.is_finished(), "40 ms < 50 ms");
        wait.on_tick(CYCLE);
        assert!(wait.is_finished());
    }

    #[test]
    fn zero_wait_is_finished_immediately() {
        let wait = WaitTime::new(SubsystemId::allocate(), Duration::ZERO);
        assert!(wait.is_finished());
    }

    // ── WithTimeout ───────────────────────────────────────────────────────────

    #[test]
    fn with_timeout_retires_never_finishing_behaviour() {
        let id = SubsystemId::allocate();
        let (inner, ticks) = counted(id, u32::MAX);
        let mut b = WithTimeout::new(inner, Duration::from_millis(40));

        b.on_tick(CYCLE);
        assert!(!b.is_finished());
        b.on_tick(CYCLE);
        assert!(b.is_finished());
        assert!(b.timed_out());

        b.on_tick(CYCLE);
        assert_eq!(ticks.get(), 2, "inner is not advanced past the limit");
    }

    #[test]
    fn with_timeout_finishes_with_inner() {
        let id = SubsystemId::allocate();
        let (inner, _) = counted(id, 1);
        let mut b = WithTimeout::new(inner, Duration::from_secs(10));
        b.on_tick(CYCLE);
        assert!(b.is_finished());
        assert!(!b.timed_out());
    }

    #[test]
    fn with_timeout_reports_inner_name_and_subsystem() {
        let id = SubsystemId::allocate();
        let (inner, _) = counted(id, 1);
        let b = WithTimeout::new(inner, Duration::from_secs(1));
        assert_eq!(b.name(), "Counted");
        assert_eq!(b.controls(), id);
    }
}
