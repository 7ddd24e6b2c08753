//! Loop exit signals (spec.md §4.2 "Dispatcher": "the dispatch loop body
//! returns an `ExecuteState` after every instruction").
//!
//! Mirrors the teacher's `ExecuteState`/`ProgramState` split
//! (`state.rs`): `ExecuteState` is the per-instruction result the
//! dispatcher's inner loop checks every iteration (`should_continue`),
//! `ProgramState` is the terminal outcome surfaced to the embedder once
//! the loop actually stops.

use crate::register::Register;

/// Result of executing a single instruction; determines whether the
/// dispatch loop's `for`/`loop` keeps going.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecuteState {
    /// Proceed to the next instruction.
    Proceed,
    /// The outermost frame returned; the run is over.
    Return(Register),
    /// A breakpoint or single-step event was reached (spec.md §4.3
    /// "debug" hooks referenced via `interpreter/debug.rs`).
    DebugEvent(DebugEval),
}

impl ExecuteState {
    pub const fn should_continue(&self) -> bool {
        matches!(self, Self::Proceed | Self::DebugEvent(DebugEval::Continue))
    }
}

impl Default for ExecuteState {
    fn default() -> Self {
        Self::Proceed
    }
}

/// What a debug event asked the loop to do next, mirroring the teacher's
/// `DebugEval` (`state/debug.rs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum DebugEval {
    Continue,
    Breakpoint(u32),
    Step,
}

impl From<DebugEval> for ExecuteState {
    fn from(d: DebugEval) -> Self {
        Self::DebugEvent(d)
    }
}

/// Terminal program state returned once a whole run finishes, mirroring
/// the teacher's `ProgramState`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum ProgramState {
    Return(Register),
    RunProgram(DebugEval),
}
