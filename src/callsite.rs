//! Callsite descriptor (spec.md §3 "Callsite").
//!
//! Built by the `prepargs`/`arg_*`/`argconst_*` handler family
//! (`interpreter/call_protocol.rs`) before an `invoke_*`, and consumed by
//! the callee's `checkarity`/`param_*` handlers. Grounded on the
//! teacher's practice of building up a small, explicit descriptor before
//! crossing a call boundary (`interpreter/flow.rs::call`, which gathers
//! the would-be frame's inputs before pushing it).

use crate::register::Register;

/// Per-argument role, determined by which `arg_*`/`argconst_*` opcode
/// supplied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgFlag {
    Positional,
    /// A named argument; the name is a string-table index resolved by
    /// the collaborator string engine.
    Named(u32),
}

/// One fully-prepared call's argument list, assembled across a
/// `prepargs` .. `invoke_*` span.
#[derive(Debug, Clone, Default)]
pub struct Callsite {
    values: Vec<Register>,
    flags: Vec<ArgFlag>,
}

impl Callsite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_positional(&mut self, value: Register) {
        self.values.push(value);
        self.flags.push(ArgFlag::Positional);
    }

    pub fn push_named(&mut self, name: u32, value: Register) {
        self.values.push(value);
        self.flags.push(ArgFlag::Named(name));
    }

    pub fn positional_count(&self) -> usize {
        self.flags
            .iter()
            .filter(|f| matches!(f, ArgFlag::Positional))
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[Register] {
        &self.values
    }

    pub fn flags(&self) -> &[ArgFlag] {
        &self.flags
    }

    pub fn positional_at(&self, index: usize) -> Option<Register> {
        let mut seen = 0usize;
        for (flag, value) in self.flags.iter().zip(self.values.iter()) {
            if matches!(flag, ArgFlag::Positional) {
                if seen == index {
                    return Some(*value);
                }
                seen += 1;
            }
        }
        None
    }

    pub fn named(&self, name: u32) -> Option<Register> {
        self.flags
            .iter()
            .zip(self.values.iter())
            .find_map(|(flag, value)| match flag {
                ArgFlag::Named(n) if *n == name => Some(*value),
                _ => None,
            })
    }

    /// Looks up `primary`, falling back to `secondary` on a miss
    /// (`param_rn2_*`/`param_on2_*`, spec.md §4.4: "try first name, then
    /// second").
    pub fn named_fallback(&self, primary: u32, secondary: u32) -> Option<Register> {
        self.named(primary).or_else(|| self.named(secondary))
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.flags.clear();
    }
}
