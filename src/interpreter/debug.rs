//! Breakpoint and single-step debugging (spec.md §4.3 "debug" hooks,
//! referenced from [`crate::state::ExecuteState::DebugEvent`]).
//!
//! Grounded on the teacher's `Debugger`/`Breakpoint` pair
//! (`state/debug.rs`): a small set of PCs the dispatch loop checks
//! against before running an instruction, plus an optional
//! single-stepping mode that treats every instruction as a breakpoint.
//! Scoped down from the teacher's contract-qualified `Breakpoint` (which
//! also names a contract id) to a plain bytecode offset, since this VM
//! has no contract-call boundary of its own.

use std::collections::HashSet;

use crate::collaborators::Collaborators;
use crate::interpreter::Interpreter;
use crate::state::{DebugEval, ProgramState};

/// One breakpoint: a byte offset into the current frame's bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Breakpoint {
    pub pc: u32,
}

impl Breakpoint {
    pub const fn new(pc: u32) -> Self {
        Breakpoint { pc }
    }
}

/// Per-interpreter debugging state, mirroring the teacher's `Debugger`.
#[derive(Debug, Default)]
pub struct Debugger {
    single_stepping: bool,
    breakpoints: HashSet<u32>,
    last_state: Option<ProgramState>,
}

impl Debugger {
    fn eval_state(&mut self, pc: u32) -> DebugEval {
        if self.single_stepping {
            DebugEval::Step
        } else if self.breakpoints.contains(&pc) {
            DebugEval::Breakpoint(pc)
        } else {
            DebugEval::Continue
        }
    }
}

impl<C: Collaborators> Interpreter<C> {
    /// Get single-stepping mode.
    pub fn single_stepping(&self) -> bool {
        self.debugger.single_stepping
    }

    /// Set single-stepping mode: every instruction becomes a breakpoint
    /// until disabled.
    pub fn set_single_stepping(&mut self, single_stepping: bool) {
        self.debugger.single_stepping = single_stepping;
    }

    /// Registers a breakpoint at the given bytecode offset.
    pub fn set_breakpoint(&mut self, breakpoint: Breakpoint) {
        self.debugger.breakpoints.insert(breakpoint.pc);
    }

    /// Removes a previously set breakpoint.
    pub fn remove_breakpoint(&mut self, breakpoint: &Breakpoint) {
        self.debugger.breakpoints.remove(&breakpoint.pc);
    }

    /// Checked by the dispatch loop before executing the instruction at
    /// the current PC (`interpreter/executors/instruction.rs::step`).
    pub(crate) fn eval_debugger_state(&mut self) -> Result<DebugEval, crate::error::VmPanic> {
        let pc = self.current_pc()? as u32;
        Ok(self.debugger.eval_state(pc))
    }

    pub(crate) fn debugger_set_last_state(&mut self, state: ProgramState) {
        self.debugger.last_state = Some(state);
    }

    pub(crate) fn debugger_last_state(&self) -> &Option<ProgramState> {
        &self.debugger.last_state
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::collaborators::arena::ArenaHeap;
    use crate::frame::StaticFrame;
    use crate::instance::Instance;
    use crate::register::RegKind;
    use crate::thread::VmConfig;

    fn new_interpreter(bytecode: Vec<u8>, reg_count: usize) -> Interpreter<ArenaHeap> {
        let instance = Rc::new(Instance::default());
        let mut interp = Interpreter::new(VmConfig::default(), instance, ArenaHeap::new(), 0);
        let static_frame = Rc::new(StaticFrame {
            name: "test".into(),
            bytecode,
            lexical_count: 0,
            lexical_names: Vec::new(),
            register_kinds: vec![RegKind::Int; reg_count],
        });
        interp.thread.push_frame(crate::frame::Frame::new(static_frame, None));
        interp
    }

    #[test]
    fn breakpoint_fires_at_registered_pc() {
        let mut interp = new_interpreter(vec![0u8; 16], 4);
        interp.set_breakpoint(Breakpoint::new(0));
        let eval = interp.eval_debugger_state().unwrap();
        assert_eq!(eval, DebugEval::Breakpoint(0));
    }

    #[test]
    fn no_breakpoint_continues() {
        let interp = new_interpreter(vec![0u8; 16], 4);
        let mut interp = interp;
        let eval = interp.eval_debugger_state().unwrap();
        assert_eq!(eval, DebugEval::Continue);
    }

    #[test]
    fn single_stepping_overrides_breakpoints() {
        let mut interp = new_interpreter(vec![0u8; 16], 4);
        interp.set_single_stepping(true);
        let eval = interp.eval_debugger_state().unwrap();
        assert_eq!(eval, DebugEval::Step);
    }

    #[test]
    fn removed_breakpoint_no_longer_fires() {
        let mut interp = new_interpreter(vec![0u8; 16], 4);
        let bp = Breakpoint::new(0);
        interp.set_breakpoint(bp);
        interp.remove_breakpoint(&bp);
        let eval = interp.eval_debugger_state().unwrap();
        assert_eq!(eval, DebugEval::Continue);
    }
}
