//! The activation record (spec.md §3 "Frame").
//!
//! Grounded on the teacher's `CallFrame` (`call.rs`, constructed by
//! `interpreter/frame.rs::call_frame`): a small, owned struct pushed onto
//! a `Vec` call stack rather than a linked structure, since spec.md §3
//! describes frame lookup purely by "current" and "caller" with no need
//! for arbitrary traversal beyond the outer-lexical chain.

use std::cell::RefCell;
use std::rc::Rc;

use crate::callsite::Callsite;
use crate::register::Register;

/// Bytecode and metadata shared by every frame of the same static
/// routine; never mutated once loaded (spec.md §1 Non-goals: "the
/// bytecode loader/verifier" owns producing this, not the dispatch loop).
#[derive(Debug)]
pub struct StaticFrame {
    pub name: String,
    pub bytecode: Vec<u8>,
    /// Number of lexical slots this routine's environment vector holds.
    pub lexical_count: u16,
    /// Declared name of each lexical slot, empty string where the
    /// compiler did not assign one. Backs the name-based lexical lookups
    /// (`getlex_ni`/`_nn`/`_ns`/`_no`, `getdynlex`/`binddynlex`); plain
    /// `getlex`/`bindlex` address slots by index and never consult this.
    pub lexical_names: Vec<String>,
    /// Declared register kinds, used by debug-build assertions
    /// (spec.md §3 invariant 1, §8 property 2).
    pub register_kinds: Vec<crate::register::RegKind>,
}

/// A routine's lexical environment vector, shared via `Rc` so a closure
/// created inside one activation can keep it alive (and keep observing
/// writes to it) after that activation returns (spec.md §4.3 "Lexical
/// access", GLOSSARY "Frame": closures may outlive the frame that made
/// them). `RefCell` gives interior mutability for `bindlex`/`binddynlex`
/// writes made after the environment has already been captured.
#[derive(Debug)]
pub struct LexicalEnv {
    pub slots: RefCell<Vec<Register>>,
    pub outer: Option<Rc<LexicalEnv>>,
}

impl LexicalEnv {
    pub fn new(slot_count: u16, outer: Option<Rc<LexicalEnv>>) -> Rc<Self> {
        Rc::new(LexicalEnv {
            slots: RefCell::new(vec![Register::ZERO; slot_count as usize]),
            outer,
        })
    }

    /// Walks `depth` environments up the outer chain; depth 0 is this
    /// environment itself (`LEXICAL_DEPTH_SELF`).
    pub fn at_depth(self: &Rc<Self>, depth: u16) -> Option<Rc<LexicalEnv>> {
        if depth == crate::consts::LEXICAL_DEPTH_SELF {
            return Some(self.clone());
        }
        let mut cur = self.outer.clone();
        for _ in 1..depth {
            cur = cur?.outer.clone();
        }
        cur
    }

    pub fn get(&self, index: u16) -> Register {
        self.slots
            .borrow()
            .get(index as usize)
            .copied()
            .unwrap_or(Register::ZERO)
    }

    pub fn set(&self, index: u16, value: Register) {
        if let Some(slot) = self.slots.borrow_mut().get_mut(index as usize) {
            *slot = value;
        }
    }
}

/// One routine activation.
#[derive(Debug)]
pub struct Frame {
    pub static_info: Rc<StaticFrame>,
    pub registers: Vec<Register>,
    pub env: Rc<LexicalEnv>,
    /// Current program counter, a byte offset into `static_info.bytecode`.
    pub pc: usize,
    /// The in-flight call site being assembled by `prepargs`/`arg_*`
    /// before the next `invoke_*` (spec.md §4.4 "Call Protocol").
    pub pending_callsite: Callsite,
    /// Set by `checkarity`/`param_*` so later opcodes in the same frame
    /// know how many positional/named arguments were actually supplied.
    pub effective_callsite: Option<Callsite>,
    /// Active exception handlers registered in this frame, innermost
    /// last (spec.md §4.5).
    pub handlers: Vec<crate::thread::HandlerEntry>,
    /// The caller's register this frame's return value should land in,
    /// `None` for the outermost (entry) frame. Set when the frame is
    /// pushed by an `invoke_*` handler (spec.md §4.4 "Call Protocol").
    pub return_dest: Option<u16>,
}

impl Frame {
    pub fn new(static_info: Rc<StaticFrame>, outer: Option<Rc<LexicalEnv>>) -> Self {
        let reg_count = static_info.register_kinds.len();
        let env = LexicalEnv::new(static_info.lexical_count, outer);
        Frame {
            registers: vec![Register::ZERO; reg_count],
            env,
            pc: 0,
            pending_callsite: Callsite::new(),
            effective_callsite: None,
            handlers: Vec::new(),
            return_dest: None,
            static_info,
        }
    }

    pub fn register(&self, index: u16) -> Register {
        self.registers
            .get(index as usize)
            .copied()
            .unwrap_or(Register::ZERO)
    }

    pub fn set_register(&mut self, index: u16, value: Register) {
        if let Some(slot) = self.registers.get_mut(index as usize) {
            *slot = value;
        }
    }
}
