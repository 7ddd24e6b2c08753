//! Lexical access opcodes (spec.md §4.3 "Lexical access").
//!
//! `getlex`/`bindlex` address a slot by numeric index in the current
//! frame's own [`crate::frame::LexicalEnv`] (depth 0); the `_ni`/`_nn`/
//! `_ns`/`_no` family instead resolves a slot by name, walking the
//! *lexical* chain outward (closures see their defining scope). `getdynlex`/
//! `binddynlex` walk the *call stack* instead — a dynamic-variable lookup
//! that finds whichever caller most recently declared the name, which is
//! deliberately a different search order than the lexical family (spec.md
//! GLOSSARY "Lexical environment" vs. "dynamic" lookup). Grounded on the
//! teacher's `InterpreterStorage::contract_state`-style two-tier lookup
//! (check local, fall back to an outer scope) generalized to an arbitrary
//! chain depth.

use std::rc::Rc;

use crate::collaborators::Collaborators;
use crate::collaborators::object_model::ObjRef;
use crate::decoder::RawOperand;
use crate::error::{RuntimeError, VmPanic};
use crate::frame::LexicalEnv;
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::register::Register;
use crate::state::ExecuteState;

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_lexical(&mut self, op: Opcode, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            Getlex => {
                let (ra, idx) = (ops[0].reg(), ops[1].u16());
                let env = self.current_env()?;
                self.set_reg(ra, env.get(idx))?;
            }
            Bindlex => {
                let (rv, idx) = (ops[0].reg(), ops[1].u16());
                let env = self.current_env()?;
                let value = self.reg(rv)?;
                // spec.md §5: a lexical bind can write an object reference
                // into an outer frame's environment that outlives this
                // frame, so it needs the write barrier the same as an
                // attribute/container bind does.
                self.collaborators.write_barrier(ObjRef::NULL, value.as_obj_ref());
                env.set(idx, value);
            }
            GetlexNi | GetlexNn | GetlexNs | GetlexNo => {
                let (ra, name_idx) = (ops[0].reg(), ops[1].str_idx());
                let name = self.resolve_string_operand(name_idx)?;
                let env = self.find_lexical_by_name(&name)?;
                let slot = self.lexical_slot_index(&env, &name)?;
                self.set_reg(ra, env.get(slot))?;
            }
            BindlexNi | BindlexNn | BindlexNs | BindlexNo => {
                let (rv, name_idx) = (ops[0].reg(), ops[1].str_idx());
                let name = self.resolve_string_operand(name_idx)?;
                let env = self.find_lexical_by_name(&name)?;
                let slot = self.lexical_slot_index(&env, &name)?;
                let value = self.reg(rv)?;
                self.collaborators.write_barrier(ObjRef::NULL, value.as_obj_ref());
                env.set(slot, value);
            }
            Getdynlex => {
                let (ra, name_idx) = (ops[0].reg(), ops[1].str_idx());
                let name = self.resolve_string_operand(name_idx)?;
                let value = self.find_dynamic(&name)?;
                self.set_reg(ra, value)?;
            }
            Binddynlex => {
                let (rv, name_idx) = (ops[0].reg(), ops[1].str_idx());
                let name = self.resolve_string_operand(name_idx)?;
                let value = self.reg(rv)?;
                self.collaborators.write_barrier(ObjRef::NULL, value.as_obj_ref());
                self.bind_dynamic(&name, value)?;
            }
            _ => unreachable!("dispatch_lexical called with a non-lexical opcode: {op:?}"),
        }
        Ok(ExecuteState::Proceed)
    }

    fn current_env(&self) -> Result<Rc<LexicalEnv>, VmPanic> {
        Ok(self.thread.current_frame().ok_or(VmPanic::FrameStackUnderflow)?.env.clone())
    }

    /// Walks the current frame's lexical chain outward for the innermost
    /// environment whose owning frame declared `name`.
    fn find_lexical_by_name(&self, name: &str) -> Result<Rc<LexicalEnv>, RuntimeError> {
        let frame = self.thread.current_frame().ok_or(VmPanic::FrameStackUnderflow)?;
        let mut depth = 0u16;
        loop {
            let env = match frame.env.at_depth(depth) {
                Some(env) => env,
                None => return Err(crate::error::AdhocError::new(format!("lexical '{name}' not found")).into()),
            };
            if self.env_declares(&env, name) {
                return Ok(env);
            }
            depth += 1;
        }
    }

    /// Whether `env`'s owning static frame declares `name`. Matched by
    /// scanning every still-live frame that shares this `env` pointer,
    /// since `LexicalEnv` itself does not carry its declaring frame's
    /// name table.
    fn env_declares(&self, env: &Rc<LexicalEnv>, name: &str) -> bool {
        self.thread
            .call_stack_frames()
            .any(|f| Rc::ptr_eq(&f.env, env) && f.static_info.lexical_names.iter().any(|n| n == name))
    }

    fn lexical_slot_index(&self, env: &Rc<LexicalEnv>, name: &str) -> Result<u16, RuntimeError> {
        self.thread
            .call_stack_frames()
            .find(|f| Rc::ptr_eq(&f.env, env))
            .and_then(|f| f.static_info.lexical_names.iter().position(|n| n == name))
            .map(|i| i as u16)
            .ok_or_else(|| crate::error::AdhocError::new(format!("lexical '{name}' not found")).into())
    }

    /// `getdynlex`: searches the *call stack*, innermost caller first,
    /// rather than the lexical chain.
    fn find_dynamic(&self, name: &str) -> Result<Register, RuntimeError> {
        for frame in self.thread.call_stack_frames_rev() {
            if let Some(idx) = frame.static_info.lexical_names.iter().position(|n| n == name) {
                return Ok(frame.env.get(idx as u16));
            }
        }
        Err(crate::error::AdhocError::new(format!("dynamic lexical '{name}' not found")).into())
    }

    fn bind_dynamic(&mut self, name: &str, value: Register) -> Result<(), RuntimeError> {
        let slot = self
            .thread
            .call_stack_frames_rev()
            .find_map(|f| {
                f.static_info
                    .lexical_names
                    .iter()
                    .position(|n| n == name)
                    .map(|idx| (f.env.clone(), idx as u16))
            })
            .ok_or_else(|| crate::error::AdhocError::new(format!("dynamic lexical '{name}' not found")))?;
        slot.0.set(slot.1, value);
        Ok(())
    }
}
