//! The string engine contract (spec.md §1 Non-goals: "the string engine's
//! internal rope/strand representation"; spec.md §4.3 "String
//! operations").
//!
//! Grounded on the same trait-boundary pattern as
//! [`crate::collaborators::object_model::ObjectModel`]: the dispatch loop
//! never concatenates, slices, or case-folds a string itself, it calls
//! through `StringEngine`.

use crate::error::RuntimeError;

/// An opaque handle to an interned or heap-allocated string value, as
/// seen by the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct StrRef(u64);

impl StrRef {
    pub const NULL: StrRef = StrRef(0);

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        StrRef(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// The trait every opcode in `interpreter/strings_ops.rs` dispatches
/// through. Indices and lengths are in grapheme units, matching the
/// original's NFG (normal form graphemes) string model referenced in
/// spec.md's GLOSSARY.
pub trait StringEngine {
    fn eq(&self, a: StrRef, b: StrRef) -> Result<bool, RuntimeError>;
    fn cmp(&self, a: StrRef, b: StrRef) -> Result<std::cmp::Ordering, RuntimeError>;
    fn concat(&mut self, a: StrRef, b: StrRef) -> Result<StrRef, RuntimeError>;
    fn repeat(&mut self, s: StrRef, count: i64) -> Result<StrRef, RuntimeError>;
    fn substr(&mut self, s: StrRef, start: i64, len: i64) -> Result<StrRef, RuntimeError>;
    fn index(&self, haystack: StrRef, needle: StrRef, start: i64) -> Result<i64, RuntimeError>;
    fn rindex(&self, haystack: StrRef, needle: StrRef, start: i64) -> Result<i64, RuntimeError>;
    fn uc(&mut self, s: StrRef) -> Result<StrRef, RuntimeError>;
    fn lc(&mut self, s: StrRef) -> Result<StrRef, RuntimeError>;
    fn tc(&mut self, s: StrRef) -> Result<StrRef, RuntimeError>;
    fn flip(&mut self, s: StrRef) -> Result<StrRef, RuntimeError>;
    fn graphs(&self, s: StrRef) -> Result<i64, RuntimeError>;
    fn graph_at(&mut self, s: StrRef, index: i64) -> Result<StrRef, RuntimeError>;

    /// Resolves a compilation unit's string-table index to a runtime
    /// handle (used by `const_s` and every `_s`-suffixed lexical/
    /// exception opcode).
    fn from_table(&mut self, table_index: u32) -> Result<StrRef, RuntimeError>;
}
