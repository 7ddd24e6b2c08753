//! The garbage collector contract (spec.md §1 Non-goals: "the garbage
//! collector's mark/copy/compact algorithms"; spec.md §5 "GC safe-points",
//! "write barrier", "from-space assertions", "temporary rooting").
//!
//! The dispatch loop never marks, copies, or sweeps; it calls through
//! `Gc` at the specific points spec.md §5 names, the same way the
//! teacher's interpreter never implements consensus rules itself but
//! calls through `InterpreterStorage`.

use crate::collaborators::object_model::ObjRef;
use crate::error::RuntimeError;
use crate::register::Register;

/// An opaque token proving a temporary root was pushed; dropping it
/// (via [`Gc::unroot_temp`]) is the caller's responsibility, mirroring
/// the original's explicit push/pop discipline rather than an RAII guard
/// (spec.md §5 names specific call sites, not a blanket policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempRootToken(pub(crate) usize);

/// The trait every GC-integration touchpoint in the dispatch loop calls
/// through. Implementors are free to make any of these true no-ops (as
/// [`crate::collaborators::arena::ArenaHeap`] does, since it never
/// actually moves or reclaims memory), but the call sites themselves are
/// mandatory per spec.md §5.
pub trait Gc {
    /// Polls for a pending collection request and blocks until it is safe
    /// to resume, run at every backward branch and `invoke_*` (spec.md §5
    /// "GC safe-points").
    fn safepoint(&mut self);

    /// Records that `holder` now references `referent`, required before
    /// any store of an object reference into another object's attribute
    /// slot, a lexical environment, or a register destined to outlive the
    /// current safepoint (spec.md §5 "write barrier").
    fn write_barrier(&mut self, holder: ObjRef, referent: ObjRef);

    /// In debug builds, asserts `obj` has not been relocated to a
    /// from-space the current safepoint generation has already retired
    /// (spec.md §5 "from-space assertions"). A no-op in release builds
    /// and in any implementation that never moves objects.
    fn assert_not_from_space(&self, obj: ObjRef);

    /// Temporarily roots `obj` so a GC triggered mid-handler cannot
    /// reclaim it before the handler finishes using it (spec.md §5
    /// "temporary rooting", naming `invoke_*` while logging, `clone`,
    /// `setmethcache`, `freshcoderef`, `invokewithcapture`,
    /// `bindcurhllsym`, and `pushcompsc` as the call sites that need it).
    fn root_temp(&mut self, obj: ObjRef) -> TempRootToken;

    /// Releases a temporary root. Handlers must call this once per
    /// `root_temp` token once the rooted value is no longer needed
    /// un-rooted, typically once it has been stored somewhere the normal
    /// root set already covers.
    fn unroot_temp(&mut self, token: TempRootToken);

    /// Reads a specialization's per-frame GC-rooted slot
    /// (`sp_getspeshslot`). Owned by the same collaborator as the rest of
    /// the root set, since a spesh slot is exactly a root table entry the
    /// (out-of-scope) JIT populated ahead of time.
    fn speshslot(&self, slot: u16) -> Result<Register, RuntimeError>;

    /// Populates a specialization's GC-rooted slot (`speshreg`).
    fn set_speshslot(&mut self, slot: u16, value: Register) -> Result<(), RuntimeError>;
}
