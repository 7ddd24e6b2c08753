//! The tagged-free register slot (spec.md §3, "Register").
//!
//! A [`Register`] is a 64-bit slot with no intrinsic type tag: the opcode
//! being executed determines which view of the bits is active. This is
//! deliberately a plain `u64` newtype rather than a C-style union — every
//! view (`i64`, `u64`, `f64`, a string handle, an object handle) fits in
//! 64 bits and round-trips through `to_bits`/`from_bits`-style conversions
//! without needing `unsafe`, so there is no reason to reach for one.

use std::fmt;

use crate::collaborators::object_model::ObjRef;
use crate::collaborators::strings::StrRef;

/// One register slot. Copy, cheap, and meaningless without a `RegKind`
/// telling you which view to read.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Register(u64);

impl Register {
    pub const ZERO: Register = Register(0);

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Register(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn from_i64(v: i64) -> Self {
        Register(v as u64)
    }

    #[inline]
    pub fn as_i64(self) -> i64 {
        self.0 as i64
    }

    #[inline]
    pub fn from_u64(v: u64) -> Self {
        Register(v)
    }

    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn from_f64(v: f64) -> Self {
        Register(v.to_bits())
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        f64::from_bits(self.0)
    }

    #[inline]
    pub fn from_f32(v: f32) -> Self {
        Register(v.to_bits() as u64)
    }

    #[inline]
    pub fn as_f32(self) -> f32 {
        f32::from_bits(self.0 as u32)
    }

    #[inline]
    pub fn from_bool(v: bool) -> Self {
        Register(v as u64)
    }

    #[inline]
    pub fn as_bool(self) -> bool {
        self.0 != 0
    }

    #[inline]
    pub fn from_str_ref(r: StrRef) -> Self {
        Register(r.to_bits())
    }

    #[inline]
    pub fn as_str_ref(self) -> StrRef {
        StrRef::from_bits(self.0)
    }

    #[inline]
    pub fn from_obj_ref(r: ObjRef) -> Self {
        Register(r.to_bits())
    }

    #[inline]
    pub fn as_obj_ref(self) -> ObjRef {
        ObjRef::from_bits(self.0)
    }
}

impl fmt::Debug for Register {
    /// There is no way to print a tagged-free slot meaningfully without
    /// knowing the active view, so this just prints the raw bit pattern.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Register(0x{:016x})", self.0)
    }
}

/// Declared kind of a register access, tracked per-local so debug builds
/// can assert every access matches the kind the verifier would have
/// assigned (spec.md §3 invariant 1, §8 property 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum RegKind {
    Int,
    Uint,
    Num32,
    Num64,
    Str,
    Obj,
}

impl fmt::Display for RegKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
