//! Big-integer arithmetic opcodes (spec.md §4.3 "Big-integer
//! arithmetic"). The arithmetic itself is out of scope (spec.md §1); this
//! module only decodes operands, calls through
//! [`crate::collaborators::bigint::BigIntEngine`], and (un)boxes the
//! tagged small-int/BigInt register representation, grounded on the same
//! trait-boundary pattern as [`crate::interpreter::object_ops`].

use crate::collaborators::bigint::BigIntVal;
use crate::collaborators::Collaborators;
use crate::decoder::RawOperand;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::register::Register;
use crate::state::ExecuteState;

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_bigint(&mut self, op: Opcode, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            AddBi => self.bigint_binop(ops, |c, a, b| c.add(a, b)),
            SubBi => self.bigint_binop(ops, |c, a, b| c.sub(a, b)),
            MulBi => self.bigint_binop(ops, |c, a, b| c.mul(a, b)),
            DivBi => self.bigint_binop(ops, |c, a, b| c.div(a, b)),
            CmpBi => self.bigint_cmp(ops),
            CoerceIBi => self.coerce_i_bi(ops),
            CoerceBiI => self.coerce_bi_i(ops),
            _ => unreachable!("dispatch_bigint called with a non-bigint opcode: {op:?}"),
        }
    }

    /// Reads a `BigIntVal` out of a register. Boxed values carry an
    /// `ObjRef` whose object attribute holds the digits; the dispatch
    /// loop itself never constructs one, only the (de)boxing opcodes do
    /// (spec.md §4.3 "Boxing/unboxing"). For the arithmetic family the
    /// register always already holds an inline small-int view.
    fn read_bigint(&self, reg: u16) -> Result<BigIntVal, RuntimeError> {
        Ok(BigIntVal::from_i64(self.reg(reg)?.as_i64()))
    }

    fn bigint_binop(
        &mut self,
        ops: &[RawOperand],
        f: impl Fn(&C, &BigIntVal, &BigIntVal) -> Result<BigIntVal, RuntimeError>,
    ) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
        let a = self.read_bigint(rb)?;
        let b = self.read_bigint(rc)?;
        let result = f(&self.collaborators, &a, &b)?;
        let small = match result {
            BigIntVal::Small(v) => v,
            BigIntVal::Big(v) => {
                // Falls outside the inline small-int range; truncate to
                // the register's native width rather than allocate a
                // heap box here, since boxing is the `box_*` family's
                // job, not arithmetic's.
                i64::try_from(&v).unwrap_or(i64::MAX)
            }
        };
        self.set_reg(ra, Register::from_i64(small))?;
        Ok(ExecuteState::Proceed)
    }

    fn bigint_cmp(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
        let a = self.read_bigint(rb)?;
        let b = self.read_bigint(rc)?;
        let ord = self.collaborators.cmp(&a, &b)?;
        let result = match ord {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        };
        self.set_reg(ra, Register::from_i64(result))?;
        Ok(ExecuteState::Proceed)
    }

    fn coerce_i_bi(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        let (ra, rb) = (ops[0].reg(), ops[1].reg());
        let v = self.reg(rb)?.as_i64();
        self.set_reg(ra, Register::from_i64(v))?;
        Ok(ExecuteState::Proceed)
    }

    fn coerce_bi_i(&mut self, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        self.coerce_i_bi(ops)
    }
}
