//! Control-flow opcodes (spec.md §4.3 "Control flow", §5 "GC
//! safe-points": "run at every backward branch").
//!
//! Grounded on the teacher's `jump`/`jump_not_equal_imm` pair
//! (`interpreter/flow.rs`): a branch opcode just overwrites the frame's
//! PC; the one addition here is the safepoint poll spec.md §5 requires
//! unconditionally on every branch handler, taken or discarded.

use crate::collaborators::Collaborators;
use crate::decoder::RawOperand;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::state::ExecuteState;

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_control_flow(
        &mut self,
        op: Opcode,
        ops: &[RawOperand],
        fallthrough_pc: usize,
    ) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            Goto => {
                let target = ops[0].branch_target() as usize;
                self.branch_to(target, fallthrough_pc)?;
            }
            IfI => self.branch_if(ops, fallthrough_pc, |v| v.as_i64() != 0)?,
            UnlessI => self.branch_if(ops, fallthrough_pc, |v| v.as_i64() == 0)?,
            IfN => self.branch_if(ops, fallthrough_pc, |v| v.as_f64() != 0.0)?,
            UnlessN => self.branch_if(ops, fallthrough_pc, |v| v.as_f64() == 0.0)?,
            IfS => self.branch_if(ops, fallthrough_pc, |v| !v.as_str_ref().is_null())?,
            UnlessS => self.branch_if(ops, fallthrough_pc, |v| v.as_str_ref().is_null())?,
            IfO => self.branch_if(ops, fallthrough_pc, |v| !v.as_obj_ref().is_null())?,
            UnlessO => self.branch_if(ops, fallthrough_pc, |v| v.as_obj_ref().is_null())?,
            IfNonnull => self.branch_if(ops, fallthrough_pc, |v| !v.as_obj_ref().is_null())?,
            Jumplist => self.jumplist(ops, fallthrough_pc)?,
            _ => unreachable!("dispatch_control_flow called with a non-branch opcode: {op:?}"),
        }
        // spec.md §4.3/§5: every branch handler safe-points after taking
        // *or* discarding the branch, unconditionally — not just on
        // backward edges.
        self.gc_safepoint();
        Ok(ExecuteState::Proceed)
    }

    fn branch_if(
        &mut self,
        ops: &[RawOperand],
        fallthrough_pc: usize,
        test: impl Fn(crate::register::Register) -> bool,
    ) -> Result<(), RuntimeError> {
        let reg = ops[0].reg();
        let target = ops[1].branch_target() as usize;
        if test(self.reg(reg)?) {
            self.branch_to(target, fallthrough_pc)?;
        }
        Ok(())
    }

    /// `jumplist`: a bounds-checked computed jump table (spec.md §8
    /// "jumplist bounds" property). Out-of-range indices fall through to
    /// the instruction after the table rather than panicking, matching
    /// the original's practice of treating the last table entry as a
    /// catch-all "otherwise" branch.
    fn jumplist(&mut self, ops: &[RawOperand], fallthrough_pc: usize) -> Result<(), RuntimeError> {
        let index_reg = ops[0].reg();
        let table_len = ops[1].u32() as i64;
        let index = self.reg(index_reg)?.as_i64();
        if index < 0 || index >= table_len {
            return Ok(());
        }
        let frame = self.thread.current_frame().ok_or(crate::error::VmPanic::FrameStackUnderflow)?;
        let table_base = frame.pc;
        let mut decoder = self.decoder_at(table_base)?;
        for _ in 0..index {
            decoder.read_branch_target()?;
        }
        let target = decoder.read_branch_target()? as usize;
        self.branch_to(target, fallthrough_pc)?;
        Ok(())
    }

    fn branch_to(&mut self, target: usize, fallthrough_pc: usize) -> Result<(), RuntimeError> {
        if target < fallthrough_pc {
            self.thread.note_backward_branch();
        }
        self.set_pc(target)?;
        Ok(())
    }
}
