//! Speculation/inline-cache opcodes (spec.md §4.3 "Speculation",
//! §4.6 "Boxing/Speculative Execution": `sp_*`, `speshreg`/`speshresolve`).
//!
//! A JIT's real specializer lives outside scope (spec.md §1 Non-goals:
//! "the JIT compiler itself"); what's in scope is the dispatch loop's
//! side of the contract — executing a specialized opcode's fast path,
//! and falling back to the general path via [`Interpreter::deopt_one`]/
//! [`Interpreter::deopt_all`] when a speculation's precondition no
//! longer holds. Grounded on the teacher's `PredicateId`/receipt-replay
//! machinery (`interpreter/executors/predicates.rs`): a predicate check
//! that either lets a fast path proceed or forces a fallback, the same
//! shape as a guard failing here and deoptimizing.

use crate::collaborators::Collaborators;
use crate::collaborators::object_model::TypeRef;
use crate::decoder::RawOperand;
use crate::error::{RuntimeError, Unwind};
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::register::Register;
use crate::state::ExecuteState;

const BOXED_VALUE_ATTR: &str = "$!value";

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_speculation(&mut self, op: Opcode, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            SpGuardconc => self.sp_guard(ops, |this, obj, expected| {
                let ty = this.collaborators.type_of(obj)?;
                Ok(ty == TypeRef::from_bits(expected as u64))
            }),
            SpGuardtype => self.sp_guard(ops, |this, obj, expected| {
                let ty = this.collaborators.what_of(obj)?;
                Ok(ty == TypeRef::from_bits(expected as u64))
            }),
            SpGuardrepr => self.sp_guard(ops, |this, obj, expected| {
                let ty = this.collaborators.what_of(obj)?;
                Ok(ty == TypeRef::from_bits(expected as u64))
            }),
            SpFastcreate => {
                let (ra, type_slot, _repr_hint) = (ops[0].reg(), ops[1].u32(), ops[2].u32());
                let ty = TypeRef::from_bits(type_slot as u64);
                let obj = self.collaborators.create(ty)?;
                self.set_reg(ra, Register::from_obj_ref(obj))?;
                Ok(ExecuteState::Proceed)
            }
            SpP6ogetO => {
                let (ra, rb, _hint, rc) = (ops[0].reg(), ops[1].reg(), ops[2].u16(), ops[3].reg());
                let obj = self.reg(rb)?.as_obj_ref();
                let name = format!("{:?}", self.reg(rc)?.as_str_ref());
                let value = self.collaborators.get_attr_obj(obj, &name)?;
                self.set_reg(ra, Register::from_obj_ref(value))?;
                Ok(ExecuteState::Proceed)
            }
            SpP6obindO => {
                let (ra, rb, _hint, rc) = (ops[0].reg(), ops[1].reg(), ops[2].u16(), ops[3].reg());
                let obj = self.reg(ra)?.as_obj_ref();
                let name = format!("{:?}", self.reg(rb)?.as_str_ref());
                let value = self.reg(rc)?.as_obj_ref();
                self.collaborators.bind_attr_obj(obj, &name, value)?;
                Ok(ExecuteState::Proceed)
            }
            SpFastboxIIc => {
                let (ra, rb, _cache_slot) = (ops[0].reg(), ops[1].reg(), ops[2].u16());
                let v = self.reg(rb)?.as_i64();
                let boxed = self.box_int(v)?;
                self.set_reg(ra, Register::from_obj_ref(boxed))?;
                Ok(ExecuteState::Proceed)
            }
            SpFastboxBiIc => {
                let (ra, rb, _cache_slot) = (ops[0].reg(), ops[1].reg(), ops[2].u16());
                // No dedicated bigint boot type is tracked here; falls
                // back to the same small-int-cache path as a plain boxed
                // Int (spec.md §8 property #10 applies the same way).
                let v = self.reg(rb)?.as_i64();
                let boxed = self.box_int(v)?;
                self.set_reg(ra, Register::from_obj_ref(boxed))?;
                Ok(ExecuteState::Proceed)
            }
            SpAddI => self.sp_bin_i(ops, i64::wrapping_add),
            SpSubI => self.sp_bin_i(ops, i64::wrapping_sub),
            SpMulI => self.sp_bin_i(ops, i64::wrapping_mul),
            SpGetspeshslot => {
                let (ra, slot) = (ops[0].reg(), ops[1].u16());
                let value = self.collaborators.speshslot(slot)?;
                self.set_reg(ra, value)?;
                Ok(ExecuteState::Proceed)
            }
            SpFindmeth => {
                let (ra, rb, name, _hint) = (ops[0].reg(), ops[1].reg(), ops[2].str_idx(), ops[3].u16());
                let name = self.resolve_string_operand(name)?;
                let obj = self.reg(rb)?.as_obj_ref();
                let meth = self.collaborators.find_method(obj, &name)?;
                self.set_reg(ra, Register::from_obj_ref(meth))?;
                Ok(ExecuteState::Proceed)
            }
            SpGetlex => {
                let (ra, slot) = (ops[0].reg(), ops[1].u16());
                let value = self
                    .thread
                    .current_frame()
                    .ok_or(crate::error::VmPanic::FrameStackUnderflow)?
                    .env
                    .get(slot);
                self.set_reg(ra, value)?;
                Ok(ExecuteState::Proceed)
            }
            SpBindlex => {
                let (ra, slot) = (ops[0].reg(), ops[1].u16());
                let value = self.reg(ra)?;
                self.thread
                    .current_frame()
                    .ok_or(crate::error::VmPanic::FrameStackUnderflow)?
                    .env
                    .set(slot, value);
                Ok(ExecuteState::Proceed)
            }
            SpBoolifyIterArr => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let iter = self.reg(rb)?.as_obj_ref();
                let source = self.collaborators.get_attr_obj(iter, "$!source")?;
                let pos = self.collaborators.get_attr_int(iter, "$!pos").unwrap_or(0);
                let has_more = !self.collaborators.at_pos(source, pos)?.is_null();
                self.set_reg(ra, Register::from_bool(has_more))?;
                Ok(ExecuteState::Proceed)
            }
            SpJitEnter => {
                // No real JIT behind this reference loop; entering one
                // is always declined, so execution just continues in
                // the interpreter.
                Ok(ExecuteState::Proceed)
            }
            Speshreg => {
                let (ra, slot) = (ops[0].reg(), ops[1].u16());
                let value = self.reg(ra)?;
                self.collaborators.set_speshslot(slot, value)?;
                Ok(ExecuteState::Proceed)
            }
            Speshresolve => {
                let _slot = ops[0].u16();
                // Re-resolving a specialization plan is entirely the
                // (out-of-scope) JIT's business; the dispatch loop has
                // nothing further to do.
                Ok(ExecuteState::Proceed)
            }
            _ => unreachable!("dispatch_speculation called with a non-speculation opcode: {op:?}"),
        }
    }

    fn sp_guard(
        &mut self,
        ops: &[RawOperand],
        check: impl Fn(&mut Self, crate::collaborators::object_model::ObjRef, u32) -> Result<bool, RuntimeError>,
    ) -> Result<ExecuteState, RuntimeError> {
        let (rb, expected, deopt_target) = (ops[0].reg(), ops[1].u32(), ops[2].u32());
        let obj = self.reg(rb)?.as_obj_ref();
        if check(self, obj, expected)? {
            Ok(ExecuteState::Proceed)
        } else {
            self.deopt_one(deopt_target)?;
            Ok(ExecuteState::Proceed)
        }
    }

    fn sp_bin_i(&mut self, ops: &[RawOperand], f: impl Fn(i64, i64) -> i64) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
        let result = f(self.reg(rb)?.as_i64(), self.reg(rc)?.as_i64());
        self.set_reg(ra, Register::from_i64(result))?;
        Ok(ExecuteState::Proceed)
    }

    /// Rewinds the current frame's PC to an equivalent unoptimized
    /// bytecode position, abandoning a single specialization (spec.md
    /// §4.6: a guard failure deopts only the code path that guessed
    /// wrong, not the whole run).
    pub(crate) fn deopt_one(&mut self, unoptimized_pc: u32) -> Result<(), RuntimeError> {
        self.set_pc(unoptimized_pc as usize)?;
        Ok(())
    }

    /// Invalidates every outstanding specialization process-wide, the
    /// one trigger spec.md §4.6 names explicitly: a `rebless` changing
    /// an object's type out from under every guard that assumed it
    /// fixed (`interpreter/object_ops.rs`). Modeled as a full unwind
    /// back to the dispatcher rather than an in-place table scan, since
    /// which specializations exist is the (out-of-scope) JIT's state,
    /// not the dispatch loop's.
    pub(crate) fn deopt_all(&mut self) -> Result<(), RuntimeError> {
        self.thread.begin_unwind(Unwind::Deopt(0));
        Ok(())
    }
}
