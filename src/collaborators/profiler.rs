//! The profiler contract (spec.md §1 Non-goals: "the profiler's actual
//! sampling and report generation"; spec.md §4.3 "Profiling hooks").
//!
//! Grounded on the teacher's own profiler seam: `profiler.rs` compiles to
//! a placeholder no-op `Profiler` behind `#[cfg(not(feature =
//! "profile-any"))]` and only pulls in the real coverage/gas-tracking
//! implementation when the `profile-any` feature is enabled. corevm keeps
//! the same shape as a trait instead of a cfg-gated type swap, so the
//! dispatch loop is generic over `Profiler` rather than compiled twice.

/// Where a profiling event occurred: the static frame plus bytecode
/// offset, mirroring the teacher's `InstructionLocation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProfileLocation {
    pub frame_id: u32,
    pub offset: u32,
}

pub trait Profiler {
    /// Called on entering a frame (`prof_enter`).
    fn enter(&mut self, frame_id: u32);

    /// Called on leaving a frame (`prof_exit`).
    fn exit(&mut self, frame_id: u32);

    /// Records an allocation at the given location (`prof_allocated`).
    fn allocated(&mut self, at: ProfileLocation, bytes: u64);

    /// Records that a specialized version replaced the general one at
    /// the given location (`prof_replaced`).
    fn replaced(&mut self, at: ProfileLocation);
}

/// Default no-op profiler, used when no profiling is requested. Mirrors
/// the teacher's placeholder `Profiler` under `#[cfg(not(feature =
/// "profile-any"))]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProfiler;

impl Profiler for NullProfiler {
    fn enter(&mut self, _frame_id: u32) {}
    fn exit(&mut self, _frame_id: u32) {}
    fn allocated(&mut self, _at: ProfileLocation, _bytes: u64) {}
    fn replaced(&mut self, _at: ProfileLocation) {}
}
