//! String opcodes (spec.md §4.3 "String operations"). Every opcode here
//! decodes its registers, reads the operand `StrRef`s, and calls through
//! [`crate::collaborators::strings::StringEngine`] — no string algorithm
//! is implemented in the dispatch loop itself (spec.md §1 Non-goals).

use crate::collaborators::Collaborators;
use crate::decoder::RawOperand;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::register::Register;
use crate::state::ExecuteState;

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_strings(&mut self, op: Opcode, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            StrEq => {
                let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
                let eq = self
                    .collaborators
                    .eq(self.reg(rb)?.as_str_ref(), self.reg(rc)?.as_str_ref())?;
                self.set_reg(ra, Register::from_bool(eq))?;
            }
            StrCmp => {
                let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
                let ord = self
                    .collaborators
                    .cmp(self.reg(rb)?.as_str_ref(), self.reg(rc)?.as_str_ref())?;
                let result = match ord {
                    std::cmp::Ordering::Less => -1,
                    std::cmp::Ordering::Equal => 0,
                    std::cmp::Ordering::Greater => 1,
                };
                self.set_reg(ra, Register::from_i64(result))?;
            }
            StrConcat => {
                let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
                let result = self
                    .collaborators
                    .concat(self.reg(rb)?.as_str_ref(), self.reg(rc)?.as_str_ref())?;
                self.set_reg(ra, Register::from_str_ref(result))?;
            }
            StrRepeat => {
                let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
                let result = self
                    .collaborators
                    .repeat(self.reg(rb)?.as_str_ref(), self.reg(rc)?.as_i64())?;
                self.set_reg(ra, Register::from_str_ref(result))?;
            }
            StrSubstr => {
                let (ra, rb, rc, rd) = (ops[0].reg(), ops[1].reg(), ops[2].reg(), ops[3].reg());
                let result = self.collaborators.substr(
                    self.reg(rb)?.as_str_ref(),
                    self.reg(rc)?.as_i64(),
                    self.reg(rd)?.as_i64(),
                )?;
                self.set_reg(ra, Register::from_str_ref(result))?;
            }
            StrIndex => {
                let (ra, rb, rc, rd) = (ops[0].reg(), ops[1].reg(), ops[2].reg(), ops[3].reg());
                let result = self.collaborators.index(
                    self.reg(rb)?.as_str_ref(),
                    self.reg(rc)?.as_str_ref(),
                    self.reg(rd)?.as_i64(),
                )?;
                self.set_reg(ra, Register::from_i64(result))?;
            }
            StrRindex => {
                let (ra, rb, rc, rd) = (ops[0].reg(), ops[1].reg(), ops[2].reg(), ops[3].reg());
                let result = self.collaborators.rindex(
                    self.reg(rb)?.as_str_ref(),
                    self.reg(rc)?.as_str_ref(),
                    self.reg(rd)?.as_i64(),
                )?;
                self.set_reg(ra, Register::from_i64(result))?;
            }
            StrUc => self.str_transform(ops, |c, s| c.uc(s))?,
            StrLc => self.str_transform(ops, |c, s| c.lc(s))?,
            StrTc => self.str_transform(ops, |c, s| c.tc(s))?,
            StrFlip => self.str_transform(ops, |c, s| c.flip(s))?,
            StrGraphs => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let count = self.collaborators.graphs(self.reg(rb)?.as_str_ref())?;
                self.set_reg(ra, Register::from_i64(count))?;
            }
            StrGraphAt => {
                let (ra, rb, rc, _rd) = (ops[0].reg(), ops[1].reg(), ops[2].reg(), ops[3].reg());
                let result = self
                    .collaborators
                    .graph_at(self.reg(rb)?.as_str_ref(), self.reg(rc)?.as_i64())?;
                self.set_reg(ra, Register::from_str_ref(result))?;
            }
            _ => unreachable!("dispatch_strings called with a non-string opcode: {op:?}"),
        }
        Ok(ExecuteState::Proceed)
    }

    fn str_transform(
        &mut self,
        ops: &[RawOperand],
        f: impl Fn(&mut C, crate::collaborators::strings::StrRef) -> Result<crate::collaborators::strings::StrRef, RuntimeError>,
    ) -> Result<(), RuntimeError> {
        let (ra, rb) = (ops[0].reg(), ops[1].reg());
        let result = f(&mut self.collaborators, self.reg(rb)?.as_str_ref())?;
        self.set_reg(ra, Register::from_str_ref(result))?;
        Ok(())
    }
}
