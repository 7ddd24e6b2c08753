//! `corevm`: THE CORE interpreter dispatch loop of a register-based
//! virtual machine for a high-level dynamic language (spec.md §0
//! Overview).
//!
//! What lives here is the decode/dispatch/handler loop and the ~850
//! opcodes' runtime semantics; everything spec.md §1 names as out of
//! scope (the bytecode loader/verifier, the object/metaobject subsystem,
//! the GC, the string engine, big-integer arithmetic, the serialization
//! wire format, JIT compilation, the profiler's sampling internals, the
//! native-call ABI, I/O/net/fs/process/thread/timer/signal subsystems,
//! and the cross-thread write-guard) is represented by the traits in
//! [`collaborators`], with [`collaborators::arena::ArenaHeap`] as the one
//! concrete reference implementation shipped here.
//!
//! Mirrors the teacher's top-level module layout (`lib.rs`): one module
//! per major subsystem, a `prelude` re-exporting the types an embedder
//! needs to drive a run, `thiserror`-derived errors, and `tracing` spans
//! on the hot path gated behind a config flag rather than a Cargo feature.

#![deny(unsafe_code)]
#![deny(unused_must_use)]

pub mod callsite;
pub mod collaborators;
pub mod consts;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod instance;
pub mod interpreter;
pub mod opcode;
pub mod register;
pub mod state;
pub mod thread;

/// Re-exports the handful of types an embedder needs to construct an
/// [`Interpreter`], push a frame, and run it to completion.
pub mod prelude {
    pub use crate::collaborators::arena::ArenaHeap;
    pub use crate::collaborators::Collaborators;
    pub use crate::error::{InterpreterError, RuntimeError, VmPanic};
    pub use crate::frame::StaticFrame;
    pub use crate::instance::Instance;
    pub use crate::interpreter::Interpreter;
    pub use crate::opcode::Opcode;
    pub use crate::register::Register;
    pub use crate::state::{DebugEval, ExecuteState, ProgramState};
    pub use crate::thread::VmConfig;
}
