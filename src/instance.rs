//! The process-global singleton (spec.md §3 "Instance").
//!
//! Grounded on the Design Notes' §9 "global mutable state" discussion:
//! a small number of process-wide tables (boot types, the HLL symbol
//! table, the compiler registry, the tiny-integer box cache) are shared
//! by every thread and therefore need interior synchronization, the way
//! the teacher's `Interpreter` instead takes a shared `S: Clone +
//! InterpreterStorage` for cross-call persistent state. `Instance` plays
//! that role for the handful of fields spec.md §3 calls out as
//! process-global rather than per-thread.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Mutex;

use crate::collaborators::object_model::{ObjRef, TypeRef};
use crate::frame::StaticFrame;
use crate::register::Register;

/// One pending event-loop subscription, queued by a concurrency
/// primitive handler and drained by the embedder's own event loop
/// (spec.md §1 Non-goals: "the event loop's own implementation";
/// §4.3 "Concurrency primitives" only enqueues work, never runs it).
#[derive(Debug, Clone, Copy)]
pub struct EventLoopSubscription {
    pub thread_id: u64,
    pub token: u64,
}

/// Process-wide state shared across every [`crate::interpreter::Interpreter`]
/// instance, analogous in role to the teacher's shared, clonable storage
/// handle.
pub struct Instance {
    /// Boot-time type objects (e.g. the boot `Int`, `Str`, `Array`
    /// types), keyed by name, resolved once at startup and read-only
    /// thereafter.
    pub boot_types: HashMap<String, TypeRef>,
    /// The sentinel "null" object every uninitialized object register
    /// reads as.
    pub null_sentinel: ObjRef,
    /// High-level-language symbol table, keyed by HLL name then symbol
    /// name (`bindcurhllsym`/`getcurhllsym`-style access; mutex-guarded
    /// since multiple threads may bind symbols concurrently).
    pub hll_symbols: Mutex<HashMap<String, HashMap<String, Register>>>,
    /// Registered compilers, keyed by name (`compilerregistry` opcodes
    /// referenced in spec.md §4.3's object-operations family).
    pub compiler_registry: Mutex<HashMap<String, ObjRef>>,
    /// Cached boxed representations of the small-integer range
    /// (spec.md §4.6, testable property #10), indexed by `value -
    /// small_int_cache_lo`. Mutex-guarded since `box_i` populates it
    /// lazily on first use rather than pre-filling it at startup.
    pub small_int_cache: Mutex<Vec<ObjRef>>,
    /// Work enqueued by concurrency-primitive handlers for the
    /// embedder's event loop to pick up.
    pub event_loop_queue: Mutex<Vec<EventLoopSubscription>>,
    /// Invocable routines, keyed by the id a code object's `$!routine_id`
    /// attribute carries. Stands in for the (out-of-scope, spec.md §1)
    /// bytecode loader's normal job of resolving a code object straight
    /// to its `StaticFrame`.
    pub routines: Mutex<HashMap<u64, Rc<StaticFrame>>>,
}

impl Instance {
    pub fn new(small_int_cache_lo: i64, small_int_cache_hi: i64) -> Self {
        let len = (small_int_cache_hi - small_int_cache_lo + 1).max(0) as usize;
        Instance {
            boot_types: HashMap::new(),
            null_sentinel: ObjRef::NULL,
            hll_symbols: Mutex::new(HashMap::new()),
            compiler_registry: Mutex::new(HashMap::new()),
            small_int_cache: Mutex::new(vec![ObjRef::NULL; len]),
            event_loop_queue: Mutex::new(Vec::new()),
            routines: Mutex::new(HashMap::new()),
        }
    }

    pub fn register_routine(&self, id: u64, frame: Rc<StaticFrame>) {
        if let Ok(mut routines) = self.routines.lock() {
            routines.insert(id, frame);
        }
    }

    pub fn routine(&self, id: u64) -> Option<Rc<StaticFrame>> {
        self.routines.lock().ok().and_then(|r| r.get(&id).cloned())
    }

    pub fn register_boot_type(&mut self, name: impl Into<String>, ty: TypeRef) {
        self.boot_types.insert(name.into(), ty);
    }

    pub fn boot_type(&self, name: &str) -> Option<TypeRef> {
        self.boot_types.get(name).copied()
    }

    pub fn enqueue_event(&self, sub: EventLoopSubscription) {
        if let Ok(mut queue) = self.event_loop_queue.lock() {
            queue.push(sub);
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new(crate::consts::SMALL_INT_CACHE_LO, crate::consts::SMALL_INT_CACHE_HI)
    }
}
