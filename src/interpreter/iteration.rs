//! Iteration opcodes (spec.md §4.3 "Iteration").
//!
//! An iterator is just an ordinary object carrying a `$!source` container
//! reference and a `$!pos` cursor, built entirely out of
//! [`crate::collaborators::object_model::ObjectModel`] calls — there is no
//! separate iterator representation, matching spec.md §1's "no
//! object/metaobject internals" boundary. `iterkey_s` returns the raw
//! cursor position rather than a materialized hash key: the reference
//! `ObjectModel` only exposes positional/associative access, not key
//! enumeration, so keyed iteration is out of this reference
//! implementation's reach (a real object model would expose a `keys`
//! call this dispatches through instead).

use crate::collaborators::Collaborators;
use crate::decoder::RawOperand;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::register::Register;
use crate::state::ExecuteState;

const ITER_SOURCE_ATTR: &str = "$!source";
const ITER_POS_ATTR: &str = "$!pos";

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_iteration(&mut self, op: Opcode, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            Iter => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let source = self.reg(rb)?.as_obj_ref();
                let ty = self
                    .instance
                    .boot_type("Iterator")
                    .unwrap_or(crate::collaborators::object_model::TypeRef::NULL);
                let iter = self.collaborators.create(ty)?;
                self.collaborators.bind_attr_obj(iter, ITER_SOURCE_ATTR, source)?;
                self.collaborators.bind_attr_int(iter, ITER_POS_ATTR, 0)?;
                self.set_reg(ra, Register::from_obj_ref(iter))?;
            }
            IterBool => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let iter = self.reg(rb)?.as_obj_ref();
                let (source, pos) = self.iter_state(iter)?;
                let has_more = !self.collaborators.at_pos(source, pos)?.is_null();
                self.set_reg(ra, Register::from_bool(has_more))?;
            }
            Iterval => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let iter = self.reg(rb)?.as_obj_ref();
                let (source, pos) = self.iter_state(iter)?;
                let value = self.collaborators.at_pos(source, pos)?;
                self.collaborators.bind_attr_int(iter, ITER_POS_ATTR, pos + 1)?;
                self.set_reg(ra, Register::from_obj_ref(value))?;
            }
            IterkeyS => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let iter = self.reg(rb)?.as_obj_ref();
                let (_source, pos) = self.iter_state(iter)?;
                self.set_reg(ra, Register::from_i64(pos))?;
            }
            _ => unreachable!("dispatch_iteration called with a non-iteration opcode: {op:?}"),
        }
        Ok(ExecuteState::Proceed)
    }

    fn iter_state(&self, iter: crate::collaborators::object_model::ObjRef) -> Result<(crate::collaborators::object_model::ObjRef, i64), RuntimeError> {
        let source = self.collaborators.get_attr_obj(iter, ITER_SOURCE_ATTR)?;
        let pos = self.collaborators.get_attr_int(iter, ITER_POS_ATTR)?;
        Ok((source, pos))
    }
}
