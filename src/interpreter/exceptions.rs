//! Exception opcodes (spec.md §4.3 "Exceptions", §4.5 "Exception Bridge
//! and Re-entrant Collaborators").
//!
//! A throw here only ever constructs an [`ExceptionThrow`] and hands it to
//! [`crate::error::Unwind`] via `RuntimeError`; finding the handler and
//! transferring control is [`crate::interpreter::executors::instruction`]'s
//! job (it owns `find_handler`/`pending_unwind`), the same boundary
//! spec.md §4.5 draws between "raise" and "dispatch the unwind".

use crate::collaborators::Collaborators;
use crate::collaborators::object_model::TypeRef;
use crate::decoder::RawOperand;
use crate::error::{AdhocError, ExceptionThrow, RuntimeError, ThrowKind};
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::register::Register;
use crate::state::ExecuteState;

const EXC_CATEGORY_ATTR: &str = "$!category";

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_exceptions(&mut self, op: Opcode, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            Throwdyn => self.do_throw(ThrowKind::Dynamic, ops),
            Throwlex => self.do_throw(ThrowKind::Lexical, ops),
            Throwlexotic => self.do_throw(ThrowKind::Lexotic, ops),
            Throwpayloadlex => self.do_throw(ThrowKind::LexCaller, ops),
            Rethrow => self.do_throw(ThrowKind::Dynamic, ops),
            Throwcatdyn => {
                let category = ops[1].u32();
                let resume_pc = self.current_pc()?;
                Err(ExceptionThrow {
                    kind: ThrowKind::Dynamic,
                    category,
                    payload: None,
                    message: None,
                    resume_pc,
                }
                .into())
            }
            Die => {
                let msg_idx = ops[1].str_idx();
                let message = self.resolve_string_operand(msg_idx)?;
                Err(AdhocError::new(message).into())
            }
            Resume => {
                let ra = ops[0].reg();
                let value = self.thread.handler_result.take().unwrap_or(Register::ZERO);
                self.set_reg(ra, value)?;
                // spec.md Testable Scenario D: resume returns control to
                // the instruction after the original throw, not wherever
                // the handler block's own PC has wandered to.
                if let Some(resume_pc) = self.thread.active_exception.take().map(|e| e.resume_pc) {
                    self.set_pc(resume_pc)?;
                }
                Ok(ExecuteState::Proceed)
            }
            Exception => {
                let ra = ops[0].reg();
                let payload = self
                    .thread
                    .active_exception
                    .as_ref()
                    .and_then(|e| e.payload)
                    .unwrap_or_default();
                self.set_reg(ra, Register::from_obj_ref(payload))?;
                Ok(ExecuteState::Proceed)
            }
            Takehandlerresult => {
                let ra = ops[0].reg();
                let value = self.thread.handler_result.take().unwrap_or(Register::ZERO);
                self.set_reg(ra, value)?;
                Ok(ExecuteState::Proceed)
            }
            Newexception => {
                let ra = ops[0].reg();
                let ty = self.instance.boot_type("Exception").unwrap_or(TypeRef::NULL);
                let obj = self.collaborators.create(ty)?;
                self.set_reg(ra, Register::from_obj_ref(obj))?;
                Ok(ExecuteState::Proceed)
            }
            Bindexcategory => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let obj = self.reg(ra)?.as_obj_ref();
                let category = self.reg(rb)?.as_i64();
                self.collaborators.bind_attr_int(obj, EXC_CATEGORY_ATTR, category)?;
                Ok(ExecuteState::Proceed)
            }
            Getexcategory => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let obj = self.reg(rb)?.as_obj_ref();
                let category = self.collaborators.get_attr_int(obj, EXC_CATEGORY_ATTR)?;
                self.set_reg(ra, Register::from_i64(category))?;
                Ok(ExecuteState::Proceed)
            }
            _ => unreachable!("dispatch_exceptions called with a non-exception opcode: {op:?}"),
        }
    }

    fn do_throw(&mut self, kind: ThrowKind, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let rb = ops[1].reg();
        let payload = self.reg(rb)?.as_obj_ref();
        let category = self.collaborators.get_attr_int(payload, EXC_CATEGORY_ATTR).unwrap_or(0);
        let resume_pc = self.current_pc()?;
        Err(ExceptionThrow {
            kind,
            category: category as u32,
            payload: Some(payload),
            message: None,
            resume_pc,
        }
        .into())
    }
}
