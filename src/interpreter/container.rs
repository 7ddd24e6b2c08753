//! Container protocol opcodes (spec.md §4.3 "Container protocol").
//!
//! A container is an ordinary object holding its contents under a
//! conventional attribute, the same representation pattern as boxed
//! scalars (`crate::interpreter::boxing`) and iterators
//! (`crate::interpreter::iteration`) — built entirely out of
//! [`crate::collaborators::object_model::ObjectModel`], no dedicated
//! container representation.

use crate::collaborators::Collaborators;
use crate::decoder::RawOperand;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::register::Register;
use crate::state::ExecuteState;

const CONTENTS_ATTR: &str = "$!contents";
const IS_CONTAINER_ATTR: &str = "$!is_container";
const BOXED_VALUE_ATTR: &str = "$!value";

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_container(&mut self, op: Opcode, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            Assign => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let container = self.reg(ra)?.as_obj_ref();
                let value = self.reg(rb)?.as_obj_ref();
                self.collaborators.write_barrier(container, value);
                self.collaborators.bind_attr_obj(container, CONTENTS_ATTR, value)?;
                self.collaborators.bind_attr_int(container, IS_CONTAINER_ATTR, 1)?;
            }
            Decont => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let container = self.reg(rb)?.as_obj_ref();
                let is_container = self.collaborators.get_attr_int(container, IS_CONTAINER_ATTR).unwrap_or(0);
                let value = if is_container == 1 {
                    self.collaborators.get_attr_obj(container, CONTENTS_ATTR)?
                } else {
                    container
                };
                self.set_reg(ra, Register::from_obj_ref(value))?;
            }
            Iscont => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let obj = self.reg(rb)?.as_obj_ref();
                let is_container = self.collaborators.get_attr_int(obj, IS_CONTAINER_ATTR).unwrap_or(0) == 1;
                self.set_reg(ra, Register::from_bool(is_container))?;
            }
            DecontI => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let value = self.decont_obj(rb)?;
                let unboxed = self.collaborators.get_attr_int(value, BOXED_VALUE_ATTR).unwrap_or(0);
                self.set_reg(ra, Register::from_i64(unboxed))?;
            }
            DecontN => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let value = self.decont_obj(rb)?;
                let unboxed = self.collaborators.get_attr_num(value, BOXED_VALUE_ATTR).unwrap_or(0.0);
                self.set_reg(ra, Register::from_f64(unboxed))?;
            }
            DecontS => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let value = self.decont_obj(rb)?;
                let bits = self
                    .collaborators
                    .get_attr_str(value, BOXED_VALUE_ATTR)
                    .ok()
                    .flatten()
                    .map(u64::from)
                    .unwrap_or(0);
                self.set_reg(ra, Register::from_str_ref(crate::collaborators::strings::StrRef::from_bits(bits)))?;
            }
            CasO => {
                let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
                let cell = self.reg(rb)?.as_obj_ref();
                let new_value = self.reg(rc)?.as_obj_ref();
                let old = self
                    .collaborators
                    .get_attr_obj(cell, CONTENTS_ATTR)
                    .unwrap_or_default();
                self.collaborators.write_barrier(cell, new_value);
                self.collaborators.bind_attr_obj(cell, CONTENTS_ATTR, new_value)?;
                self.set_reg(ra, Register::from_obj_ref(old))?;
            }
            _ => unreachable!("dispatch_container called with a non-container opcode: {op:?}"),
        }
        Ok(ExecuteState::Proceed)
    }

    fn decont_obj(&mut self, reg: u16) -> Result<crate::collaborators::object_model::ObjRef, RuntimeError> {
        let container = self.reg(reg)?.as_obj_ref();
        let is_container = self.collaborators.get_attr_int(container, IS_CONTAINER_ATTR).unwrap_or(0);
        if is_container == 1 {
            self.collaborators.get_attr_obj(container, CONTENTS_ATTR)
        } else {
            Ok(container)
        }
    }
}
