//! Call protocol opcodes (spec.md §4.3 "Call Protocol", "Native call
//! bridge"), housed in one module because both families revolve around
//! the same [`Callsite`] assembly/consumption and both cross an
//! invocation boundary (SPEC_FULL.md §D).
//!
//! `prepargs`/`arg_*`/`argconst_*` build up the current frame's
//! [`Callsite`]; an `invoke_*` hands that callsite to a freshly pushed
//! [`crate::frame::Frame`] and remembers, via `Frame::return_dest`, which
//! register in the *caller* the eventual `return_*` should land in — the
//! single register each `invoke_*` opcode decodes serves double duty,
//! read as the callee reference before the call and overwritten with the
//! result after. Grounded on the teacher's `call`/`ret` pair
//! (`interpreter/flow.rs`), generalized from a fixed instruction-pointer
//! jump to a real pushed/popped `Frame`.

use crate::callsite::Callsite;
use crate::collaborators::Collaborators;
use crate::collaborators::object_model::TypeRef;
use crate::decoder::RawOperand;
use crate::error::{AdhocError, RuntimeError, VmPanic};
use crate::frame::Frame;
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::register::Register;
use crate::state::ExecuteState;

const ROUTINE_ID_ATTR: &str = "$!routine_id";

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_call_protocol(&mut self, op: Opcode, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            Prepargs => {
                self.thread
                    .current_frame_mut()
                    .ok_or(VmPanic::FrameStackUnderflow)?
                    .pending_callsite
                    .clear();
                Ok(ExecuteState::Proceed)
            }
            ArgI | ArgN | ArgS | ArgO => {
                let value = self.reg(ops[0].reg())?;
                self.thread
                    .current_frame_mut()
                    .ok_or(VmPanic::FrameStackUnderflow)?
                    .pending_callsite
                    .push_positional(value);
                Ok(ExecuteState::Proceed)
            }
            ArgconstI => {
                let value = Register::from_i64(ops[0].i64());
                self.thread
                    .current_frame_mut()
                    .ok_or(VmPanic::FrameStackUnderflow)?
                    .pending_callsite
                    .push_positional(value);
                Ok(ExecuteState::Proceed)
            }
            InvokeV | InvokeI | InvokeN | InvokeS | InvokeO | Invokewithcapture => self.do_invoke(ops[0].reg()),
            Return => self.do_return(None),
            ReturnI | ReturnN | ReturnS | ReturnO => self.do_return(Some(ops[0].reg())),
            Checkarity => self.do_checkarity(ops[0].u16(), ops[1].u16()),
            ParamRpI | ParamRpN | ParamRpS | ParamRpO => self.param_required_positional(ops),
            ParamOpI => self.param_optional_positional(ops),
            ParamRnO => self.param_required_named(ops),
            ParamOnO => self.param_optional_named(ops),
            ParamRn2I | ParamRn2N | ParamRn2S | ParamRn2O => self.param_required_named_fallback(ops),
            ParamOn2I | ParamOn2N | ParamOn2S | ParamOn2O => self.param_optional_named_fallback(ops),
            ParamSp => self.param_slurpy_positional(ops),
            ParamSn => self.param_slurpy_named(ops),
            Paramnamesused => Ok(ExecuteState::Proceed),
            Nativecallbuild => self.native_call_build(ops),
            Nativecallinvoke | NativeinvokeV => self.native_call_invoke(ops),
            Nativecallrefresh => self.native_call_refresh(ops),
            _ => unreachable!("dispatch_call_protocol called with a non-call opcode: {op:?}"),
        }
    }

    fn do_invoke(&mut self, callee_reg: u16) -> Result<ExecuteState, RuntimeError> {
        let callee = self.reg(callee_reg)?.as_obj_ref();
        let routine_id = self.collaborators.get_attr_int(callee, ROUTINE_ID_ATTR)? as u64;
        let static_frame = self
            .instance
            .routine(routine_id)
            .ok_or_else(|| AdhocError::new(format!("object is not an invocable routine (id {routine_id})")))?;
        let callsite = std::mem::take(
            &mut self
                .thread
                .current_frame_mut()
                .ok_or(VmPanic::FrameStackUnderflow)?
                .pending_callsite,
        );
        let mut new_frame = Frame::new(static_frame, None);
        new_frame.pending_callsite = callsite;
        new_frame.return_dest = Some(callee_reg);
        self.thread.push_frame(new_frame);
        // Every invocation is a GC safe-point (spec.md §5).
        self.gc_safepoint();
        Ok(ExecuteState::Proceed)
    }

    fn do_return(&mut self, value_reg: Option<u16>) -> Result<ExecuteState, RuntimeError> {
        let value = match value_reg {
            Some(r) => self.reg(r)?,
            None => Register::ZERO,
        };
        let popped = self.thread.pop_frame().ok_or(VmPanic::FrameStackUnderflow)?;
        match (self.thread.current_frame_mut(), popped.return_dest) {
            (Some(caller), Some(dest)) => {
                caller.set_register(dest, value);
                Ok(ExecuteState::Proceed)
            }
            _ => Ok(ExecuteState::Return(value)),
        }
    }

    fn do_checkarity(&mut self, min: u16, max: u16) -> Result<ExecuteState, RuntimeError> {
        let frame = self.thread.current_frame_mut().ok_or(VmPanic::FrameStackUnderflow)?;
        let n = frame.pending_callsite.positional_count();
        if n < min as usize || (max != u16::MAX && n > max as usize) {
            return Err(AdhocError::new(format!("arity mismatch: got {n}, expected {min}..={max}")).into());
        }
        frame.effective_callsite = Some(frame.pending_callsite.clone());
        Ok(ExecuteState::Proceed)
    }

    fn effective_callsite(&self) -> Result<&Callsite, RuntimeError> {
        self.thread
            .current_frame()
            .ok_or(VmPanic::FrameStackUnderflow)?
            .effective_callsite
            .as_ref()
            .ok_or_else(|| AdhocError::new("param_* used before checkarity").into())
    }

    fn param_required_positional(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, idx) = (ops[0].reg(), ops[1].u16());
        let value = self
            .effective_callsite()?
            .positional_at(idx as usize)
            .ok_or_else(|| AdhocError::new(format!("missing required positional parameter {idx}")))?;
        self.set_reg(ra, value)?;
        Ok(ExecuteState::Proceed)
    }

    /// `param_op_i`: optional *positional* parameter. Branches to the
    /// already-bound-value path when the argument IS present (the
    /// opposite polarity from the optional-named family below); falls
    /// through so the caller's own default-setting code runs when it's
    /// absent.
    fn param_optional_positional(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, idx, target) = (ops[0].reg(), ops[1].u16(), ops[2].branch_target());
        if let Some(value) = self.effective_callsite()?.positional_at(idx as usize) {
            self.set_reg(ra, value)?;
            self.set_pc(target as usize)?;
        }
        Ok(ExecuteState::Proceed)
    }

    /// `param_rn_o`: required named parameter. No branch target — a miss
    /// is a hard failure, mirroring `param_required_positional`.
    fn param_required_named(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, name) = (ops[0].reg(), ops[1].str_idx());
        let value = self
            .effective_callsite()?
            .named(name)
            .ok_or_else(|| AdhocError::new(format!("missing required named parameter {name}")))?;
        self.set_reg(ra, value)?;
        Ok(ExecuteState::Proceed)
    }

    /// `param_on_o`: optional named parameter. Branches to the
    /// default-setting code when the name is absent.
    fn param_optional_named(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, name, target) = (ops[0].reg(), ops[1].str_idx(), ops[2].branch_target());
        match self.effective_callsite()?.named(name) {
            Some(value) => {
                self.set_reg(ra, value)?;
                Ok(ExecuteState::Proceed)
            }
            None => {
                self.set_pc(target as usize)?;
                Ok(ExecuteState::Proceed)
            }
        }
    }

    /// `param_rn2_*`: required named, trying `name` then `fallback_name`
    /// before hard-failing (spec.md §4.4).
    fn param_required_named_fallback(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, name, fallback_name) = (ops[0].reg(), ops[1].str_idx(), ops[2].str_idx());
        let value = self
            .effective_callsite()?
            .named_fallback(name, fallback_name)
            .ok_or_else(|| AdhocError::new(format!("missing required named parameter {name}/{fallback_name}")))?;
        self.set_reg(ra, value)?;
        Ok(ExecuteState::Proceed)
    }

    /// `param_on2_*`: optional named, trying `name` then `fallback_name`
    /// before branching to the default-setting code.
    fn param_optional_named_fallback(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, name, fallback_name, target) =
            (ops[0].reg(), ops[1].str_idx(), ops[2].str_idx(), ops[3].branch_target());
        match self.effective_callsite()?.named_fallback(name, fallback_name) {
            Some(value) => {
                self.set_reg(ra, value)?;
                Ok(ExecuteState::Proceed)
            }
            None => {
                self.set_pc(target as usize)?;
                Ok(ExecuteState::Proceed)
            }
        }
    }

    fn param_slurpy_positional(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let ra = ops[0].reg();
        let values: Vec<Register> = self.effective_callsite()?.values().to_vec();
        let ty = self.instance.boot_type("Array").unwrap_or(TypeRef::NULL);
        let arr = self.collaborators.create(ty)?;
        for (i, v) in values.into_iter().enumerate() {
            self.collaborators.bind_pos(arr, i as i64, v.as_obj_ref())?;
        }
        self.set_reg(ra, Register::from_obj_ref(arr))?;
        Ok(ExecuteState::Proceed)
    }

    fn param_slurpy_named(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let ra = ops[0].reg();
        let ty = self.instance.boot_type("Hash").unwrap_or(TypeRef::NULL);
        let hash = self.collaborators.create(ty)?;
        let callsite = self.effective_callsite()?.clone();
        for (flag, value) in callsite.flags().iter().zip(callsite.values().iter()) {
            if let crate::callsite::ArgFlag::Named(name_idx) = flag {
                let key_ty = self.instance.boot_type("Str").unwrap_or(TypeRef::NULL);
                let key = self.collaborators.create(key_ty)?;
                self.collaborators.bind_attr_str(key, "$!value", Some(*name_idx))?;
                self.collaborators.bind_key(hash, key, value.as_obj_ref())?;
            }
        }
        self.set_reg(ra, Register::from_obj_ref(hash))?;
        Ok(ExecuteState::Proceed)
    }

    /// `nativecallbuild`'s five registers: destination, library name,
    /// symbol/signature string, argument-type-flags object, and
    /// return-type-flag object. The reference bridge folds all but the
    /// destination into one opaque signature string — a real bridge
    /// would decode the flag objects into an actual calling convention.
    fn native_call_build(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, rlib, rsym, rargs, rret) = (ops[0].reg(), ops[1].reg(), ops[2].reg(), ops[3].reg(), ops[4].reg());
        let lib = self.reg(rlib)?.as_str_ref();
        let sym = self.reg(rsym)?.as_str_ref();
        let arg_flags = self.reg(rargs)?.as_obj_ref();
        let ret_flag = self.reg(rret)?.as_obj_ref();
        let signature = format!("{lib:?}::{sym:?}({arg_flags:?}) -> {ret_flag:?}");
        let site = self.collaborators.build_site(&signature)?;
        self.set_reg(ra, Register::from_i64(site as i64))?;
        Ok(ExecuteState::Proceed)
    }

    fn native_call_invoke(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
        let site = self.reg(rb)?.as_i64() as u32;
        let args_obj = self.reg(rc)?.as_obj_ref();
        let mut args = Vec::new();
        let mut i = 0i64;
        loop {
            let item = self.collaborators.at_pos(args_obj, i)?;
            if item.is_null() {
                break;
            }
            args.push(Register::from_obj_ref(item));
            i += 1;
        }
        let result = self.collaborators.invoke(site, &args)?;
        self.set_reg(ra, result)?;
        Ok(ExecuteState::Proceed)
    }

    fn native_call_refresh(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let site = self.reg(ops[0].reg())?.as_i64() as u32;
        self.collaborators.refresh_site(site)?;
        Ok(ExecuteState::Proceed)
    }
}
