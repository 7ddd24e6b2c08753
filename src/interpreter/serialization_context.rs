//! Serialization-context opcodes (spec.md §4.3 "Serialization-context
//! operations", §1 Non-goals: "the serialization wire format").
//!
//! A serialization context (SC) is modeled as an ordinary object whose
//! positional slots hold the objects registered into it, entirely through
//! [`crate::collaborators::object_model::ObjectModel`]; `sc_serialize`/
//! `sc_deserialize` only wrap an SC reference in (or unwrap it from) an
//! opaque carrier object rather than implement any wire format, since the
//! actual encode/decode algorithm is out of scope.

use crate::collaborators::Collaborators;
use crate::collaborators::object_model::TypeRef;
use crate::decoder::RawOperand;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::register::Register;
use crate::state::ExecuteState;

const SC_HANDLE_ATTR: &str = "$!handle";
const SERIALIZED_PAYLOAD_ATTR: &str = "$!payload";

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_serialization_context(
        &mut self,
        op: Opcode,
        ops: &[RawOperand],
    ) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            ScCreate => {
                let (ra, handle) = (ops[0].reg(), ops[1].str_idx());
                let handle = self.resolve_string_operand(handle)?;
                let ty = self
                    .instance
                    .boot_type("SerializationContext")
                    .unwrap_or(TypeRef::NULL);
                let sc = self.collaborators.create(ty)?;
                self.collaborators.bind_attr_str(sc, SC_HANDLE_ATTR, None)?;
                let _ = handle; // the handle string is only meaningful to a real loader's SC table
                self.set_reg(ra, Register::from_obj_ref(sc))?;
            }
            ScGetobj => {
                let (ra, rb, idx) = (ops[0].reg(), ops[1].reg(), ops[2].u32());
                let sc = self.reg(rb)?.as_obj_ref();
                let obj = self.collaborators.at_pos(sc, idx as i64)?;
                self.set_reg(ra, Register::from_obj_ref(obj))?;
            }
            ScSetobj | ScSetobjSc => {
                let (ra, rb, idx) = (ops[0].reg(), ops[1].reg(), ops[2].u32());
                let sc = self.reg(ra)?.as_obj_ref();
                let value = self.reg(rb)?.as_obj_ref();
                self.collaborators.write_barrier(sc, value);
                self.collaborators.bind_pos(sc, idx as i64, value)?;
            }
            ScSerialize => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let sc = self.reg(rb)?.as_obj_ref();
                let ty = self.instance.boot_type("Blob").unwrap_or(TypeRef::NULL);
                let blob = self.collaborators.create(ty)?;
                self.collaborators.bind_attr_obj(blob, SERIALIZED_PAYLOAD_ATTR, sc)?;
                self.set_reg(ra, Register::from_obj_ref(blob))?;
            }
            ScDeserialize => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let blob = self.reg(rb)?.as_obj_ref();
                let sc = self.collaborators.get_attr_obj(blob, SERIALIZED_PAYLOAD_ATTR)?;
                self.set_reg(ra, Register::from_obj_ref(sc))?;
            }
            _ => unreachable!("dispatch_serialization_context called with a non-sc opcode: {op:?}"),
        }
        Ok(ExecuteState::Proceed)
    }
}
