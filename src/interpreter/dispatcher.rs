//! Dispatcher hand-off opcodes (spec.md §3 "current-dispatcher" /
//! "current-dispatcher-for").
//!
//! `setdispatcher`/`takedispatcher`/`setdispatcherfor` let one frame
//! install a dispatch-plan object for whichever frame it's about to call
//! into to pick up, a narrow piece of inter-frame handoff state that
//! lives on [`crate::thread::ThreadContext`] alongside the active
//! exception and handler-result fields. Grounded on
//! `original_source/src/core/interp.c`'s `OP(setdispatcher)`/
//! `OP(takedispatcher)`/`OP(setdispatcherfor)`: `cur_dispatcher`/
//! `cur_dispatcher_for` are read and cleared exactly the way
//! `active_exception`/`handler_result` already are here.

use crate::collaborators::Collaborators;
use crate::collaborators::object_model::ObjRef;
use crate::decoder::RawOperand;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::register::Register;
use crate::state::ExecuteState;

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_dispatcher(&mut self, op: Opcode, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            Setdispatcher => {
                let disp = self.reg(ops[0].reg())?.as_obj_ref();
                self.thread.current_dispatcher = Some(disp);
                self.thread.current_dispatcher_for = None;
            }
            Takedispatcher => {
                let ra = ops[0].reg();
                // original_source narrows this to "for the calling
                // frame's own coderef"; this VM's `Frame` carries no
                // coderef identity to compare against, so a pending
                // dispatcher is handed to whichever frame asks first,
                // same as the unscoped `current_dispatcher_for: None` case.
                let taken = self.thread.current_dispatcher.take();
                self.thread.current_dispatcher_for = None;
                self.set_reg(ra, Register::from_obj_ref(taken.unwrap_or(ObjRef::NULL)))?;
            }
            Setdispatcherfor => {
                let (disp, disp_for) = (ops[0].reg(), ops[1].reg());
                self.thread.current_dispatcher = Some(self.reg(disp)?.as_obj_ref());
                self.thread.current_dispatcher_for = Some(self.reg(disp_for)?.as_obj_ref());
            }
            _ => unreachable!("dispatch_dispatcher called with a non-dispatcher opcode: {op:?}"),
        }
        Ok(ExecuteState::Proceed)
    }
}
