//! Numeric arithmetic and comparison opcodes (spec.md §4.3 "Numeric
//! arithmetic").
//!
//! Grounded on the teacher's `alu_overflow`/`alu_set`/`alu_clear` helper
//! family (`interpreter/alu.rs`) and its giant `match` arms for
//! `ADD`/`SUB`/`MUL`/`DIV`/... in `executors/instruction.rs`: each
//! opcode here is a tiny function computing one result and writing it to
//! the destination register, the arithmetic itself delegated to the
//! machine's native integer/float ops rather than any collaborator (this
//! family, unlike big-integer arithmetic, is squarely in scope).

use std::cmp::Ordering;

use num_integer::Integer;

use crate::collaborators::Collaborators;
use crate::decoder::RawOperand;
use crate::error::{AdhocError, RuntimeError};
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::register::Register;
use crate::state::ExecuteState;

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_alu(&mut self, op: Opcode, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            AddI => self.bin_i(ops, i64::wrapping_add),
            SubI => self.bin_i(ops, i64::wrapping_sub),
            MulI => self.bin_i(ops, i64::wrapping_mul),
            DivI => self.div_i(ops),
            ModI => self.mod_i(ops),
            PowI => self.pow_i(ops),
            GcdI => self.bin_i(ops, |a, b| a.gcd(&b)),
            LcmI => self.bin_i(ops, |a, b| a.lcm(&b)),
            NegI => self.un_i(ops, i64::wrapping_neg),
            EqI => self.cmp_i_bool(ops, |o| o == Ordering::Equal),
            LtI => self.cmp_i_bool(ops, |o| o == Ordering::Less),
            LeI => self.cmp_i_bool(ops, |o| o != Ordering::Greater),
            CmpI => self.cmp_i_tristate(ops),
            CoerceIN => self.coerce_i_n(ops),
            CoerceNI => self.coerce_n_i(ops),
            AddN => self.bin_n(ops, |a, b| a + b),
            SubN => self.bin_n(ops, |a, b| a - b),
            MulN => self.bin_n(ops, |a, b| a * b),
            DivN => self.div_n(ops),
            EqN => self.cmp_n_bool(ops, |o| o == Some(Ordering::Equal)),
            LtN => self.cmp_n_bool(ops, |o| o == Some(Ordering::Less)),
            _ => unreachable!("dispatch_alu called with a non-ALU opcode: {op:?}"),
        }
    }

    fn bin_i(&mut self, ops: &[RawOperand], f: impl Fn(i64, i64) -> i64) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
        let result = f(self.reg(rb)?.as_i64(), self.reg(rc)?.as_i64());
        self.set_reg(ra, Register::from_i64(result))?;
        Ok(ExecuteState::Proceed)
    }

    fn un_i(&mut self, ops: &[RawOperand], f: impl Fn(i64) -> i64) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb) = (ops[0].reg(), ops[1].reg());
        let result = f(self.reg(rb)?.as_i64());
        self.set_reg(ra, Register::from_i64(result))?;
        Ok(ExecuteState::Proceed)
    }

    /// `div_i`: floors towards negative infinity rather than truncating
    /// towards zero (spec.md §8's quantified `div_i` flooring property),
    /// matching the original HLL's integer division semantics rather
    /// than Rust's native truncating `/`.
    fn div_i(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
        let (a, b) = (self.reg(rb)?.as_i64(), self.reg(rc)?.as_i64());
        if b == 0 {
            return Err(AdhocError::new("Division by zero").into());
        }
        self.set_reg(ra, Register::from_i64(a.div_floor(&b)))?;
        Ok(ExecuteState::Proceed)
    }

    /// `mod_i`: the C-language truncated remainder (sign follows the
    /// dividend), i.e. Rust's native `%` — not a floored modulo — per
    /// spec.md §4.3 ("`mod_i` yields the C-language remainder").
    fn mod_i(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
        let (a, b) = (self.reg(rb)?.as_i64(), self.reg(rc)?.as_i64());
        if b == 0 {
            return Err(AdhocError::new("Modulation by zero").into());
        }
        self.set_reg(ra, Register::from_i64(a % b))?;
        Ok(ExecuteState::Proceed)
    }

    /// `pow_i`: negative exponents return 0 (spec.md §4.3, Testable
    /// Property 7: `pow_i(2, -1) = 0`). Overflow wraps, consistent with
    /// the rest of this family's wrapping arithmetic.
    fn pow_i(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
        let (base, exp) = (self.reg(rb)?.as_i64(), self.reg(rc)?.as_i64());
        let result = match u32::try_from(exp) {
            Ok(exp_u32) => base.wrapping_pow(exp_u32),
            Err(_) => 0,
        };
        self.set_reg(ra, Register::from_i64(result))?;
        Ok(ExecuteState::Proceed)
    }

    fn cmp_i_bool(&mut self, ops: &[RawOperand], f: impl Fn(Ordering) -> bool) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
        let result = f(self.reg(rb)?.as_i64().cmp(&self.reg(rc)?.as_i64()));
        self.set_reg(ra, Register::from_bool(result))?;
        Ok(ExecuteState::Proceed)
    }

    fn cmp_i_tristate(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
        let result = match self.reg(rb)?.as_i64().cmp(&self.reg(rc)?.as_i64()) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        };
        self.set_reg(ra, Register::from_i64(result))?;
        Ok(ExecuteState::Proceed)
    }

    fn coerce_i_n(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb) = (ops[0].reg(), ops[1].reg());
        let v = self.reg(rb)?.as_i64() as f64;
        self.set_reg(ra, Register::from_f64(v))?;
        Ok(ExecuteState::Proceed)
    }

    fn coerce_n_i(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb) = (ops[0].reg(), ops[1].reg());
        let v = self.reg(rb)?.as_f64() as i64;
        self.set_reg(ra, Register::from_i64(v))?;
        Ok(ExecuteState::Proceed)
    }

    fn bin_n(&mut self, ops: &[RawOperand], f: impl Fn(f64, f64) -> f64) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
        let result = f(self.reg(rb)?.as_f64(), self.reg(rc)?.as_f64());
        self.set_reg(ra, Register::from_f64(result))?;
        Ok(ExecuteState::Proceed)
    }

    fn div_n(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        // IEEE-754 division is total (divide-by-zero yields +-inf or NaN),
        // so unlike div_i this never raises an adhoc error.
        self.bin_n(ops, |a, b| a / b)
    }

    fn cmp_n_bool(&mut self, ops: &[RawOperand], f: impl Fn(Option<Ordering>) -> bool) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
        let result = f(self.reg(rb)?.as_f64().partial_cmp(&self.reg(rc)?.as_f64()));
        self.set_reg(ra, Register::from_bool(result))?;
        Ok(ExecuteState::Proceed)
    }
}
