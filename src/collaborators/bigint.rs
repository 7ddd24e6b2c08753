//! The big-integer library contract (spec.md §1 Non-goals: "the
//! big-integer arithmetic algorithms themselves"; spec.md §4.3
//! "Big-integer arithmetic").
//!
//! The tagged small-int/BigInt sum type itself (`BigIntVal`) is concrete,
//! not a trait: spec.md §3 fixes its two-variant shape (an inline small
//! integer, or a heap-boxed arbitrary-precision value) as part of the
//! register-boxing contract, the same way the teacher keeps `Word` a
//! concrete type rather than an abstracted numeric trait. Only the
//! arbitrary-precision *arithmetic* is pushed behind a trait, backed here
//! by `num-bigint` the way the other example repos in the retrieval pack
//! reach for it for exactly this purpose.

use num_bigint::BigInt;

use crate::error::RuntimeError;

/// A big-integer register value: either an inline small integer (the
/// common case, spec.md §4.6 "tagged small integers") or a heap-boxed
/// arbitrary-precision value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BigIntVal {
    Small(i64),
    Big(BigInt),
}

impl BigIntVal {
    pub fn from_i64(v: i64) -> Self {
        BigIntVal::Small(v)
    }

    pub fn to_big(&self) -> BigInt {
        match self {
            BigIntVal::Small(v) => BigInt::from(*v),
            BigIntVal::Big(b) => b.clone(),
        }
    }

    /// Normalizes a `BigInt` result back down to `Small` when it fits,
    /// matching the original's practice of demoting bigints that no
    /// longer need arbitrary precision.
    pub fn normalize(v: BigInt) -> Self {
        match i64::try_from(&v) {
            Ok(small) => BigIntVal::Small(small),
            Err(_) => BigIntVal::Big(v),
        }
    }
}

/// The trait every opcode in `interpreter/bigint_ops.rs` dispatches
/// through for the arithmetic itself.
pub trait BigIntEngine {
    fn add(&self, a: &BigIntVal, b: &BigIntVal) -> Result<BigIntVal, RuntimeError>;
    fn sub(&self, a: &BigIntVal, b: &BigIntVal) -> Result<BigIntVal, RuntimeError>;
    fn mul(&self, a: &BigIntVal, b: &BigIntVal) -> Result<BigIntVal, RuntimeError>;
    fn div(&self, a: &BigIntVal, b: &BigIntVal) -> Result<BigIntVal, RuntimeError>;
    fn cmp(&self, a: &BigIntVal, b: &BigIntVal) -> Result<std::cmp::Ordering, RuntimeError>;
}

/// Reference `BigIntEngine` backed directly by `num-bigint`, used by
/// [`crate::collaborators::arena::ArenaHeap`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBigIntEngine;

impl BigIntEngine for DefaultBigIntEngine {
    fn add(&self, a: &BigIntVal, b: &BigIntVal) -> Result<BigIntVal, RuntimeError> {
        Ok(BigIntVal::normalize(a.to_big() + b.to_big()))
    }

    fn sub(&self, a: &BigIntVal, b: &BigIntVal) -> Result<BigIntVal, RuntimeError> {
        Ok(BigIntVal::normalize(a.to_big() - b.to_big()))
    }

    fn mul(&self, a: &BigIntVal, b: &BigIntVal) -> Result<BigIntVal, RuntimeError> {
        Ok(BigIntVal::normalize(a.to_big() * b.to_big()))
    }

    fn div(&self, a: &BigIntVal, b: &BigIntVal) -> Result<BigIntVal, RuntimeError> {
        let divisor = b.to_big();
        if divisor == BigInt::from(0) {
            return Err(crate::error::AdhocError::new("division by zero").into());
        }
        use num_integer::Integer;
        let (q, _) = a.to_big().div_mod_floor(&divisor);
        Ok(BigIntVal::normalize(q))
    }

    fn cmp(&self, a: &BigIntVal, b: &BigIntVal) -> Result<std::cmp::Ordering, RuntimeError> {
        Ok(a.to_big().cmp(&b.to_big()))
    }
}
