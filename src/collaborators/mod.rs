//! Traits for the subsystems spec.md §1 names as out-of-scope
//! collaborators with contracts fixed by spec.md §6: the object/metaobject
//! subsystem, the GC, the string engine, the big-integer library, the
//! native-call bridge, and the profiler.
//!
//! This mirrors the role the teacher's `InterpreterStorage` trait plays
//! for contract/state storage (`storage.rs`): the dispatch loop is
//! generic over an implementation of each trait, and ships exactly one
//! concrete, in-process implementation (`arena`) so the loop can run
//! end to end without a production GC, object model, or string engine
//! behind it.

pub mod arena;
pub mod bigint;
pub mod gc;
pub mod native;
pub mod object_model;
pub mod profiler;
pub mod strings;

pub use bigint::BigIntEngine;
pub use gc::Gc;
pub use native::NativeCallBridge;
pub use object_model::ObjectModel;
pub use profiler::Profiler;
pub use strings::StringEngine;

/// Bundles the collaborator traits the interpreter is generic over, the
/// same way the teacher's `Interpreter<S>` is generic over a single
/// `S: InterpreterStorage`. One type implementing all six supertraits
/// lets `Interpreter<C>` take a single type parameter instead of six.
pub trait Collaborators: Gc + ObjectModel + StringEngine + BigIntEngine + NativeCallBridge + Profiler {}

impl<T> Collaborators for T where T: Gc + ObjectModel + StringEngine + BigIntEngine + NativeCallBridge + Profiler {}
