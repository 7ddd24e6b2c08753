//! VM/thread bootstrap (spec.md §6 "Initial invocation").
//!
//! The dispatch loop itself is entered through [`Interpreter::run`]
//! (`interpreter.rs`), which already satisfies spec.md's contract: push
//! an initial frame, run to completion, return immediately if the
//! pushed frame's op cursor is null. What's left here is everything
//! that has to happen *before* that first `run` call — constructing a
//! fresh [`ThreadContext`]-backed [`Interpreter`] and wiring it to a
//! process-wide [`Instance`], plus (for the reference collaborators
//! only) registering the handful of boot types the opcode handlers
//! assume exist (`Int`, `Num`, `Str`, `Array`, `Hash`).
//!
//! Grounded on the teacher's `Interpreter::init_predicate`/`init_script`
//! pair (the original `constructors.rs`/`initialization.rs`): a generic
//! constructor taking every collaborator dependency explicitly, plus a
//! convenience constructor that builds a ready-to-run interpreter
//! against the teacher's own in-memory reference storage. Boot-type
//! registration is necessarily specific to [`ArenaHeap`] rather than
//! generic over `C: Collaborators`, since `ObjectModel` exposes no
//! "define a fresh type" operation — object-model internals past
//! `create`/`type_of`/attribute access are out of scope (spec.md §1).

use std::rc::Rc;

use crate::collaborators::Collaborators;
use crate::collaborators::arena::ArenaHeap;
use crate::instance::Instance;
use crate::interpreter::Interpreter;
use crate::thread::VmConfig;

/// Names of the boot types the reference dispatch loop itself reaches
/// for by name (boxing helpers in `boxing.rs`/`speculation.rs`, slurpy
/// parameter gathering in `call_protocol.rs`). Anything beyond this
/// short list is the embedder's own bootstrap sequence, not the
/// dispatch loop's concern.
const BOOT_TYPE_NAMES: &[&str] = &["Int", "Num", "Str", "Array", "Hash"];

impl<C: Collaborators> Interpreter<C> {
    /// Builds a fresh interpreter for a new thread against an already
    /// bootstrapped, shared [`Instance`] — the generic constructor every
    /// embedder-specific convenience constructor bottoms out in.
    pub fn for_thread(config: VmConfig, instance: Rc<Instance>, collaborators: C, thread_id: u64) -> Self {
        Interpreter::new(config, instance, collaborators, thread_id)
    }
}

impl Interpreter<ArenaHeap> {
    /// Convenience constructor for the reference collaborators: builds a
    /// fresh [`Instance`], registers the boot types the dispatch loop's
    /// own handlers assume exist, and returns an interpreter ready for
    /// [`Interpreter::run`]. Mirrors the teacher's in-memory test/demo
    /// constructor.
    pub fn bootstrap(config: VmConfig, thread_id: u64) -> Self {
        let mut heap = ArenaHeap::new();
        let mut instance = Instance::new(config.small_int_cache_lo, config.small_int_cache_hi);
        for name in BOOT_TYPE_NAMES {
            let ty = heap.define_type();
            instance.register_boot_type(*name, ty);
        }
        Interpreter::new(config, Rc::new(instance), heap, thread_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_registers_boot_types() {
        let interp = Interpreter::bootstrap(VmConfig::default(), 0);
        for name in BOOT_TYPE_NAMES {
            assert!(interp.instance.boot_type(name).is_some(), "missing boot type {name}");
        }
    }

    #[test]
    fn bootstrap_starts_with_empty_call_stack() {
        let interp = Interpreter::bootstrap(VmConfig::default(), 7);
        assert_eq!(interp.call_depth(), 0);
    }
}
