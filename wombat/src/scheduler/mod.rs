//! Behaviour scheduler for Wombat.
//!
//! [`BehaviourScheduler`] tracks, for every registered subsystem, at most one
//! active [`Behaviour`] and an optional default-behaviour factory.  Once per
//! control cycle the outer loop calls [`tick`](BehaviourScheduler::tick),
//! which advances every active behaviour by one step and swaps in the default
//! wherever a subsystem is idle.
//!
//! # Slot state machine
//!
//! | From | Event | To |
//! |---|---|---|
//! | `Empty` | `tick()` with a default factory | `ActiveDefault` |
//! | `Empty` | `schedule()` | `ActiveExplicit` |
//! | `ActiveExplicit` / `ActiveDefault` | `schedule()` | `ActiveExplicit` |
//! | `ActiveExplicit` / `ActiveDefault` | finished during `tick()`, `interrupt_all()` | `Empty` |
//!
//! There is no terminal state; a slot cycles for the whole process lifetime.
//!
//! # Design decisions
//!
//! | Topic | Choice |
//! |---|---|
//! | Reachability | Explicit [`SharedScheduler`] handle instead of a process global |
//! | Iteration order | `BTreeMap` keyed by [`SubsystemId`], creation order, deterministic |
//! | Replace / interrupt | Previous behaviour is dropped; no completion logic runs |
//! | Completion → default | Default is instantiated in the same `tick()`, first advanced on the next |
//! | Behaviour panics | Caught per subsystem; the slot is cleared, the neutral-output hook runs, other subsystems still advance |
//!
//! # Example
//! ```rust,ignore
//! let sched = BehaviourScheduler::shared();
//! sched.borrow_mut().register(&*intake.borrow());
//! sched.borrow_mut().set_default_behaviour(intake_id, move || Box::new(IntakeManualControl::new(..)))?;
//! loop {
//!     sched.borrow_mut().tick(dt);
//! }
//! ```

pub mod error;

pub use error::BehaviourError;

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::behaviour::{Behaviour, BehaviourFactory, HasBehaviour, SubsystemId};

/// The process-scoped handle passed to every subsystem and to the outer loop.
pub type SharedScheduler = Rc<RefCell<BehaviourScheduler>>;

/// Hook that puts a subsystem into its safe, non-actuating state.
pub type NeutralOutput = Box<dyn Fn()>;

// ── Slot bookkeeping ──────────────────────────────────────────────────────────

/// Observable state of one subsystem's behaviour slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No active behaviour.
    Empty,
    /// Running a behaviour passed to `schedule()`.
    ActiveExplicit,
    /// Running a behaviour produced by the default factory.
    ActiveDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Explicit,
    Default,
}

struct Active {
    behaviour: Box<dyn Behaviour>,
    origin: Origin,
}

/// One registry entry per registered subsystem.
struct Entry {
    name: String,
    active: Option<Active>,
    default: Option<BehaviourFactory>,
    /// Drives the subsystem to a safe, non-actuating target.
    neutral: Option<NeutralOutput>,
}

impl Entry {
    fn slot_state(&self) -> SlotState {
        match &self.active {
            None => SlotState::Empty,
            Some(Active {
                origin: Origin::Explicit,
                ..
            }) => SlotState::ActiveExplicit,
            Some(Active {
                origin: Origin::Default,
                ..
            }) => SlotState::ActiveDefault,
        }
    }

    /// Fill an empty slot from the default factory, if there is one.
    ///
    /// A factory that panics or produces a behaviour for another subsystem
    /// leaves the slot empty for this cycle.
    fn spawn_default(&mut self, id: SubsystemId) {
        let Some(factory) = &self.default else {
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| factory())) {
            Ok(behaviour) if behaviour.controls() == id => {
                debug!(
                    subsystem = %self.name,
                    behaviour = behaviour.name(),
                    "default behaviour instantiated"
                );
                self.active = Some(Active {
                    behaviour,
                    origin: Origin::Default,
                });
            }
            Ok(behaviour) => {
                warn!(
                    subsystem = %self.name,
                    behaviour = behaviour.name(),
                    expected = %id,
                    actual = %behaviour.controls(),
                    "default factory produced a behaviour for another subsystem, discarded"
                );
            }
            Err(payload) => {
                error!(
                    subsystem = %self.name,
                    cause = panic_message(payload.as_ref()),
                    "default factory faulted, subsystem idle this cycle"
                );
                self.neutralise();
            }
        }
    }

    /// Run the neutral-output hook after a contained fault.
    fn neutralise(&self) {
        let Some(neutral) = &self.neutral else {
            return;
        };
        match panic::catch_unwind(AssertUnwindSafe(|| neutral())) {
            Ok(()) => debug!(subsystem = %self.name, "neutral output applied"),
            Err(payload) => error!(
                subsystem = %self.name,
                cause = panic_message(payload.as_ref()),
                "neutral output hook faulted"
            ),
        }
    }

    /// Drop an active behaviour that already reports completion (e.g. one
    /// scheduled in a finished state).  Returns `true` if the slot was
    /// emptied and may be refilled from the default this cycle.
    ///
    /// A completion query that panics counts as a fault: the behaviour is
    /// discarded but `false` is returned, so the subsystem idles this cycle.
    fn retire_if_finished(&mut self) -> bool {
        let finished = match &self.active {
            None => return false,
            Some(active) => {
                panic::catch_unwind(AssertUnwindSafe(|| active.behaviour.is_finished()))
            }
        };

        match finished {
            Ok(false) => false,
            Ok(true) => {
                if let Some(done) = self.active.take() {
                    debug!(
                        subsystem = %self.name,
                        behaviour = done.behaviour.name(),
                        "behaviour finished before advancing, retired"
                    );
                }
                true
            }
            Err(payload) => {
                if let Some(faulted) = self.active.take() {
                    error!(
                        subsystem = %self.name,
                        behaviour = faulted.behaviour.name(),
                        cause = panic_message(payload.as_ref()),
                        "behaviour faulted; discarded, subsystem idle this cycle"
                    );
                }
                self.neutralise();
                false
            }
        }
    }

    /// Advance the active behaviour once.  Returns `false` if the slot is
    /// (still) empty and nothing was advanced.
    fn advance(&mut self, id: SubsystemId, dt: Duration) -> bool {
        let outcome = {
            let Some(active) = self.active.as_mut() else {
                return false;
            };
            panic::catch_unwind(AssertUnwindSafe(|| {
                active.behaviour.on_tick(dt);
                active.behaviour.is_finished()
            }))
        };

        match outcome {
            Ok(false) => {}
            Ok(true) => {
                if let Some(done) = self.active.take() {
                    debug!(
                        subsystem = %self.name,
                        behaviour = done.behaviour.name(),
                        "behaviour finished, retired"
                    );
                }
                self.spawn_default(id);
            }
            Err(payload) => {
                if let Some(faulted) = self.active.take() {
                    error!(
                        subsystem = %self.name,
                        behaviour = faulted.behaviour.name(),
                        cause = panic_message(payload.as_ref()),
                        "behaviour faulted; discarded, subsystem idle this cycle"
                    );
                }
                self.neutralise();
            }
        }
        true
    }
}

/// Best-effort text of a caught panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

// ── BehaviourScheduler ────────────────────────────────────────────────────────

/// Single-owner behaviour arbitration for a set of subsystems.
///
/// All operations run on the control thread; the type is deliberately not
/// `Send` (behaviours hold `Rc` handles to their subsystems).
#[derive(Default)]
pub struct BehaviourScheduler {
    /// subsystem → (active slot, default factory).  `BTreeMap` so every tick
    /// visits subsystems in creation order.
    entries: BTreeMap<SubsystemId, Entry>,

    /// Number of completed `tick()` calls.
    cycles: u64,
}

impl BehaviourScheduler {
    /// Create an empty scheduler.  Tests build one per case.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the process-scoped shared handle.
    pub fn shared() -> SharedScheduler {
        Rc::new(RefCell::new(Self::new()))
    }

    // ── Registration ──────────────────────────────────────────────────────────

    /// Add `subsystem` with an empty slot and no default factory.
    ///
    /// Registering the same subsystem again is a no-op: its slot and factory
    /// are kept.
    pub fn register<S: HasBehaviour + ?Sized>(&mut self, subsystem: &S) {
        let id = subsystem.subsystem_id();
        if let Some(entry) = self.entries.get(&id) {
            debug!(subsystem = %entry.name, id = %id, "already registered, ignoring");
            return;
        }

        info!(subsystem = subsystem.subsystem_name(), id = %id, "registered");
        self.entries.insert(
            id,
            Entry {
                name: subsystem.subsystem_name().to_string(),
                active: None,
                default: None,
                neutral: None,
            },
        );
    }

    /// Set (or replace) the default-behaviour factory of a registered
    /// subsystem.
    ///
    /// The factory is not invoked here.  A replacement takes effect at the
    /// next idle transition; a currently active default keeps running.
    ///
    /// # Errors
    /// [`BehaviourError::NotRegistered`] if `subsystem` was never registered.
    pub fn set_default_behaviour<F>(
        &mut self,
        subsystem: SubsystemId,
        factory: F,
    ) -> Result<(), BehaviourError>
    where
        F: Fn() -> Box<dyn Behaviour> + 'static,
    {
        let Some(entry) = self.entries.get_mut(&subsystem) else {
            warn!(id = %subsystem, "default behaviour for unregistered subsystem rejected");
            return Err(BehaviourError::NotRegistered {
                behaviour: String::from("default behaviour factory"),
                subsystem,
            });
        };

        let replaced = entry.default.replace(Box::new(factory)).is_some();
        debug!(subsystem = %entry.name, replaced, "default behaviour factory set");
        Ok(())
    }

    /// Set the hook run whenever a fault is contained on `subsystem`: a
    /// behaviour panicking while advanced or queried, or its default factory
    /// panicking.  The subsystem then applies a neutral output that cycle
    /// instead of the faulted behaviour's last target.
    ///
    /// # Errors
    /// [`BehaviourError::NotRegistered`] if `subsystem` was never registered.
    pub fn set_neutral_output<F>(&mut self, subsystem: SubsystemId, hook: F) -> Result<(), BehaviourError>
    where
        F: Fn() + 'static,
    {
        let Some(entry) = self.entries.get_mut(&subsystem) else {
            warn!(id = %subsystem, "neutral output for unregistered subsystem rejected");
            return Err(BehaviourError::NotRegistered {
                behaviour: String::from("neutral output hook"),
                subsystem,
            });
        };

        entry.neutral = Some(Box::new(hook));
        debug!(subsystem = %entry.name, "neutral output hook set");
        Ok(())
    }

    // ── Ownership transfer ────────────────────────────────────────────────────

    /// Make `behaviour` the active behaviour of the subsystem it controls.
    ///
    /// Whatever was active is dropped without further advancement.
    ///
    /// # Errors
    /// [`BehaviourError::NotRegistered`] if the bound subsystem was never
    /// registered.  The registry is unchanged and `behaviour` is dropped.
    pub fn schedule(&mut self, behaviour: Box<dyn Behaviour>) -> Result<(), BehaviourError> {
        let id = behaviour.controls();
        let Some(entry) = self.entries.get_mut(&id) else {
            warn!(
                behaviour = behaviour.name(),
                id = %id,
                "schedule() on unregistered subsystem rejected"
            );
            return Err(BehaviourError::NotRegistered {
                behaviour: behaviour.name().to_string(),
                subsystem: id,
            });
        };

        debug!(subsystem = %entry.name, behaviour = behaviour.name(), "scheduled");
        let previous = entry.active.replace(Active {
            behaviour,
            origin: Origin::Explicit,
        });
        if let Some(previous) = previous {
            debug!(
                subsystem = %entry.name,
                behaviour = previous.behaviour.name(),
                "previous behaviour interrupted"
            );
        }
        Ok(())
    }

    /// Clear every active slot unconditionally.
    ///
    /// Used at operating-mode transitions; the next `tick()` falls back to the
    /// defaults.
    pub fn interrupt_all(&mut self) {
        let mut interrupted = 0usize;
        for entry in self.entries.values_mut() {
            if let Some(active) = entry.active.take() {
                debug!(
                    subsystem = %entry.name,
                    behaviour = active.behaviour.name(),
                    "interrupted"
                );
                interrupted += 1;
            }
        }
        info!(interrupted, "interrupt_all()");
    }

    // ── Per-cycle advancement ─────────────────────────────────────────────────

    /// Advance every registered subsystem by one control cycle.
    ///
    /// Per subsystem, in creation order:
    /// 1. A behaviour that already reports completion is retired unadvanced.
    /// 2. An empty slot is filled from the default factory, if any.
    /// 3. The active behaviour, if any, is advanced exactly once.
    /// 4. If it now reports completion it is retired and the default is
    ///    instantiated straight away, to be first advanced next cycle.
    ///
    /// A subsystem with neither an active behaviour nor a default stays idle.
    pub fn tick(&mut self, dt: Duration) {
        let mut advanced = 0usize;

        for (&id, entry) in self.entries.iter_mut() {
            let was_empty = entry.active.is_none();
            if was_empty || entry.retire_if_finished() {
                entry.spawn_default(id);
            }

            if entry.advance(id, dt) {
                advanced += 1;
            }
        }

        self.cycles += 1;
        debug!(cycle = self.cycles, advanced, "tick complete");
    }

    // ── Introspection ─────────────────────────────────────────────────────────

    /// Slot state of `subsystem`, or `None` if it is not registered.
    pub fn slot_state(&self, subsystem: SubsystemId) -> Option<SlotState> {
        self.entries.get(&subsystem).map(Entry::slot_state)
    }

    /// Name of the behaviour currently active on `subsystem`.
    pub fn active_behaviour_name(&self, subsystem: SubsystemId) -> Option<&str> {
        self.entries
            .get(&subsystem)
            .and_then(|e| e.active.as_ref())
            .map(|a| a.behaviour.name())
    }

    pub fn is_registered(&self, subsystem: SubsystemId) -> bool {
        self.entries.contains_key(&subsystem)
    }

    pub fn has_default(&self, subsystem: SubsystemId) -> bool {
        self.entries
            .get(&subsystem)
            .is_some_and(|e| e.default.is_some())
    }

    /// Registered subsystem ids in tick order.
    pub fn subsystems(&self) -> impl Iterator<Item = SubsystemId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of `tick()` calls so far.
    pub fn cycle_count(&self) -> u64 {
        self.cycles
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
