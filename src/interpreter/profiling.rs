//! Profiling hook opcodes (spec.md §4.3 "Profiling hooks").
//!
//! Every opcode here is a thin marshalling wrapper around
//! [`crate::collaborators::profiler::Profiler`] — the actual sampling,
//! call-graph accumulation, and report generation are out of scope
//! (spec.md §1 Non-goals: "the profiler's actual sampling and report
//! generation"). Grounded on the teacher's own `Profiler` seam
//! (`profiler.rs`), which is a no-op behind a feature flag for the same
//! reason.

use crate::collaborators::Collaborators;
use crate::collaborators::profiler::ProfileLocation;
use crate::decoder::RawOperand;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::state::ExecuteState;

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_profiling(&mut self, op: Opcode, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            ProfEnter => {
                let frame_id = ops[0].u32();
                self.collaborators.enter(frame_id);
            }
            ProfExit => {
                let frame_id = self.current_frame_id();
                self.collaborators.exit(frame_id);
            }
            ProfAllocated => {
                let frame_id = self.current_frame_id();
                let pc = self.current_pc()? as u32;
                self.collaborators
                    .allocated(ProfileLocation { frame_id, offset: pc }, 0);
            }
            ProfReplaced => {
                let frame_id = self.current_frame_id();
                let pc = self.current_pc()? as u32;
                self.collaborators
                    .replaced(ProfileLocation { frame_id, offset: pc });
            }
            _ => unreachable!("dispatch_profiling called with a non-profiling opcode: {op:?}"),
        }
        Ok(ExecuteState::Proceed)
    }

    /// A stand-in frame identifier for profiling events: the call
    /// stack's current depth, since nothing else in scope assigns
    /// routines a stable numeric id the way a real profiler's symbol
    /// table would.
    fn current_frame_id(&self) -> u32 {
        self.thread.call_stack.len() as u32
    }
}
