//! Boxing/unboxing opcodes (spec.md §4.3 "Boxing/unboxing", §4.6 "Tagged
//! small integers", §8 testable property #10: "two `box_i` calls with the
//! same in-cache-range value return object-identical results").
//!
//! Grounded on the same `ObjectModel`-through-a-trait boundary as
//! [`crate::interpreter::object_ops`]: boxing is just `create` +
//! `bind_attr_*` under a conventional attribute name, plus the
//! small-integer cache fast path spec.md §4.6 calls out by name.

use crate::collaborators::Collaborators;
use crate::decoder::RawOperand;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::register::Register;
use crate::state::ExecuteState;

/// The conventional attribute name every boxed scalar stores its unboxed
/// value under, analogous to the original's `$!value` representation
/// attribute.
const BOXED_VALUE_ATTR: &str = "$!value";

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_boxing(&mut self, op: Opcode, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            BoxI => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let v = self.reg(rb)?.as_i64();
                let obj = self.box_int(v)?;
                self.set_reg(ra, Register::from_obj_ref(obj))?;
            }
            BoxN => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let v = self.reg(rb)?.as_f64();
                let ty = self.boot_type_or_null("Num");
                let obj = self.collaborators.create(ty)?;
                self.collaborators.bind_attr_num(obj, BOXED_VALUE_ATTR, v)?;
                self.set_reg(ra, Register::from_obj_ref(obj))?;
            }
            BoxS => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let s = self.reg(rb)?.as_str_ref();
                let ty = self.boot_type_or_null("Str");
                let obj = self.collaborators.create(ty)?;
                self.collaborators.bind_attr_str(obj, BOXED_VALUE_ATTR, Some(s.to_bits() as u32))?;
                self.set_reg(ra, Register::from_obj_ref(obj))?;
            }
            UnboxI => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let obj = self.reg(rb)?.as_obj_ref();
                let v = self.collaborators.get_attr_int(obj, BOXED_VALUE_ATTR)?;
                self.set_reg(ra, Register::from_i64(v))?;
            }
            UnboxN => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let obj = self.reg(rb)?.as_obj_ref();
                let v = self.collaborators.get_attr_num(obj, BOXED_VALUE_ATTR)?;
                self.set_reg(ra, Register::from_f64(v))?;
            }
            UnboxS => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let obj = self.reg(rb)?.as_obj_ref();
                let v = self.collaborators.get_attr_str(obj, BOXED_VALUE_ATTR)?;
                let bits = v.map(u64::from).unwrap_or(0);
                self.set_reg(ra, Register::from_str_ref(crate::collaborators::strings::StrRef::from_bits(bits)))?;
            }
            SmrtIntify => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let obj = self.reg(rb)?.as_obj_ref();
                let v = self.collaborators.get_attr_int(obj, BOXED_VALUE_ATTR)?;
                self.set_reg(ra, Register::from_i64(v))?;
            }
            SmrtNumify => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let obj = self.reg(rb)?.as_obj_ref();
                let v = self.collaborators.get_attr_num(obj, BOXED_VALUE_ATTR)?;
                self.set_reg(ra, Register::from_f64(v))?;
            }
            SmrtStrify => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let obj = self.reg(rb)?.as_obj_ref();
                let v = self.collaborators.get_attr_str(obj, BOXED_VALUE_ATTR)?;
                let bits = v.map(u64::from).unwrap_or(0);
                self.set_reg(ra, Register::from_str_ref(crate::collaborators::strings::StrRef::from_bits(bits)))?;
            }
            _ => unreachable!("dispatch_boxing called with a non-boxing opcode: {op:?}"),
        }
        Ok(ExecuteState::Proceed)
    }

    fn boot_type_or_null(&self, name: &str) -> crate::collaborators::object_model::TypeRef {
        self.instance.boot_type(name).unwrap_or(crate::collaborators::object_model::TypeRef::NULL)
    }

    /// `box_i`: serves the small-integer cache for in-range values, so
    /// repeated boxing of the same small value returns an identical
    /// `ObjRef` (spec.md §8 property #10) instead of allocating afresh
    /// every time.
    pub(crate) fn box_int(&mut self, v: i64) -> Result<crate::collaborators::object_model::ObjRef, RuntimeError> {
        let lo = self.thread.config.small_int_cache_lo;
        let hi = self.thread.config.small_int_cache_hi;
        let in_range = v >= lo && v <= hi;
        let idx = (v - lo) as usize;
        if in_range {
            if let Ok(cache) = self.instance.small_int_cache.lock() {
                if let Some(cached) = cache.get(idx) {
                    if !cached.is_null() {
                        return Ok(*cached);
                    }
                }
            }
        }
        let ty = self.boot_type_or_null("Int");
        let obj = self.collaborators.create(ty)?;
        self.collaborators.bind_attr_int(obj, BOXED_VALUE_ATTR, v)?;
        if in_range {
            if let Ok(mut cache) = self.instance.small_int_cache.lock() {
                if let Some(slot) = cache.get_mut(idx) {
                    *slot = obj;
                }
            }
        }
        Ok(obj)
    }
}
