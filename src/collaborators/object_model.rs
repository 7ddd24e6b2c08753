//! The object/metaobject subsystem contract (spec.md §1 Non-goals:
//! "the object/metaobject subsystem's internal representations"; spec.md
//! §4.3 "Object operations").
//!
//! `ObjectModel` is the trait boundary the dispatch loop calls through
//! for `create`, `clone`, attribute access, `rebless`, and `typeof`;
//! spec.md §6 fixes its contract, not its implementation. Grounded on the
//! teacher's `InterpreterStorage` trait (`storage/interpreter.rs`), which
//! plays the identical role for contract/state access.

use crate::error::{RuntimeError, VmPanic};

/// An opaque handle to a heap object, as seen by the dispatch loop. The
/// bit pattern is meaningful only to the [`ObjectModel`] implementation
/// that produced it; the loop never inspects it beyond null-checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjRef(u64);

impl ObjRef {
    pub const NULL: ObjRef = ObjRef(0);

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        ObjRef(bits)
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

/// An opaque handle to a type object (what `typeof`/`whatof` return, and
/// what `istype`/`findmeth` consult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeRef(u64);

impl TypeRef {
    pub const NULL: TypeRef = TypeRef(0);

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        TypeRef(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

// `ObjRef` and `TypeRef` are both opaque `u64` handles into the same
// collaborator's heap; type objects are ordinary objects from the
// dispatch loop's point of view, so the two freely reinterpret each
// other's bits when an opcode's register holds "an object that happens
// to be a type" (`create`'s argument, `typeof`'s/`whatof`'s result).
impl From<ObjRef> for TypeRef {
    fn from(r: ObjRef) -> Self {
        TypeRef(r.to_bits())
    }
}

impl From<TypeRef> for ObjRef {
    fn from(r: TypeRef) -> Self {
        ObjRef(r.to_bits())
    }
}

/// The trait every `create`/`clone`/attribute/`rebless`/`typeof` handler
/// in `interpreter/object_ops.rs` dispatches through. Attribute names are
/// resolved string-table indices, consistent with the `strings` operand
/// width on those opcodes (spec.md §4.3 "Object operations").
pub trait ObjectModel {
    /// Allocates a fresh, attribute-default instance of `ty`
    /// (`create`, spec.md §4.3).
    fn create(&mut self, ty: TypeRef) -> Result<ObjRef, RuntimeError>;

    /// Shallow-copies `obj`, including its STables entry (`clone`).
    fn clone_obj(&mut self, obj: ObjRef) -> Result<ObjRef, RuntimeError>;

    /// Returns `obj`'s current type (`typeof`).
    fn type_of(&self, obj: ObjRef) -> Result<TypeRef, VmPanic>;

    /// Returns `obj`'s "what" (the type used for dispatch, which may
    /// differ from `type_of` for mixins/roles) (`whatof`).
    fn what_of(&self, obj: ObjRef) -> Result<TypeRef, VmPanic>;

    /// Tests whether `obj` is of type `ty` or a subtype (`istype`).
    fn is_type(&self, obj: ObjRef, ty: TypeRef) -> Result<bool, VmPanic>;

    /// Swaps `obj`'s STable in place for `new_type`'s, preserving
    /// identity — the single opcode spec.md §4.6 names as triggering
    /// `deopt_all` (`rebless`).
    fn rebless(&mut self, obj: ObjRef, new_type: TypeRef) -> Result<(), RuntimeError>;

    fn get_attr_int(&self, obj: ObjRef, name: &str) -> Result<i64, RuntimeError>;
    fn get_attr_num(&self, obj: ObjRef, name: &str) -> Result<f64, RuntimeError>;
    fn get_attr_str(&self, obj: ObjRef, name: &str) -> Result<Option<u32>, RuntimeError>;
    fn get_attr_obj(&self, obj: ObjRef, name: &str) -> Result<ObjRef, RuntimeError>;

    fn bind_attr_int(&mut self, obj: ObjRef, name: &str, v: i64) -> Result<(), RuntimeError>;
    fn bind_attr_num(&mut self, obj: ObjRef, name: &str, v: f64) -> Result<(), RuntimeError>;
    fn bind_attr_str(&mut self, obj: ObjRef, name: &str, v: Option<u32>) -> Result<(), RuntimeError>;
    fn bind_attr_obj(&mut self, obj: ObjRef, name: &str, v: ObjRef) -> Result<(), RuntimeError>;

    /// Positional container access (`atpos`/`bindpos`).
    fn at_pos(&self, obj: ObjRef, index: i64) -> Result<ObjRef, RuntimeError>;
    fn bind_pos(&mut self, obj: ObjRef, index: i64, v: ObjRef) -> Result<(), RuntimeError>;

    /// Associative container access (`atkey`/`bindkey`), keyed by an
    /// already-decontainerized string-boxed object.
    fn at_key(&self, obj: ObjRef, key: ObjRef) -> Result<ObjRef, RuntimeError>;
    fn bind_key(&mut self, obj: ObjRef, key: ObjRef, v: ObjRef) -> Result<(), RuntimeError>;

    /// Looks up a method by name starting at `obj`'s type
    /// (`findmeth`/`sp_findmeth`). Returns `ObjRef::NULL` if absent so
    /// `can` can test presence without a separate call.
    fn find_method(&self, obj: ObjRef, name: &str) -> Result<ObjRef, VmPanic>;
}
