/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the Wombat behaviour scheduler.
//!
//! Only call-site ordering mistakes are errors.  `tick()` and
//! `interrupt_all()` are total over the registry and never fail; faults
//! inside a behaviour are contained per subsystem and logged, not returned.
//!
//! Every variant carries the subsystem ids involved so the caller can log
//! them without further lookups.

use thiserror::Error;

use crate::behaviour::SubsystemId;

/// Error type returned by the fallible
/// [`BehaviourScheduler`](super::BehaviourScheduler) operations and by
/// composite behaviour construction.
///
/// | Variant | Raised by |
/// |---|---|
/// | `NotRegistered` | `schedule()`, `set_default_behaviour()` |
/// | `MixedSubsystems` | `Sequence::then()` |
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BehaviourError {
    /// The target subsystem was never passed to `register()`.
    ///
    /// Indicates a start-up sequencing bug; the registry is left untouched.
    #[error("behaviour '{behaviour}' targets subsystem {subsystem}, which is not registered")]
    NotRegistered {
        behaviour: String,
        subsystem: SubsystemId,
    },

    /// A composite behaviour was assembled from behaviours bound to
    /// different subsystems.
    #[error(
        "behaviour '{behaviour}' controls subsystem {actual} but the composite controls {expected}"
    )]
    MixedSubsystems {
        behaviour: String,
        expected: SubsystemId,
        actual: SubsystemId,
    },
}
