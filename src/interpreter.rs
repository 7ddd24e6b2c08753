//! [`Interpreter`] implementation: the struct the entire dispatch loop
//! hangs off of.
//!
//! Mirrors the shape of the teacher's `Interpreter<S, Ecal, Tx>`
//! (generic over its storage backend and extension-call handler), here
//! generalized to a single `C: Collaborators` type parameter bundling
//! every out-of-scope subsystem (spec.md §1) behind one set of trait
//! calls.

use std::rc::Rc;

use crate::collaborators::Collaborators;
use crate::error::InterpreterError;
use crate::frame::{Frame, StaticFrame};
use crate::instance::Instance;
use crate::state::ExecuteState;
use crate::thread::{ThreadContext, VmConfig};

mod alu;
mod bigint_ops;
mod boxing;
mod call_protocol;
mod concurrency;
mod container;
mod control_flow;
mod debug;
mod dispatcher;
pub mod executors;
mod exceptions;
mod initialization;
mod internal;
mod iteration;
mod lexical;
mod object_ops;
mod profiling;
mod serialization_context;
mod speculation;
mod strings_ops;

/// The VM interpreter: one dispatch loop, a thread context, a reference
/// to the process-wide [`Instance`], and a handle to the collaborator
/// bundle plugged in for this run.
///
/// The internal state isn't exposed directly; callers observe execution
/// through the [`ExecuteState`] the loop entry point returns, the same
/// way the teacher's `Interpreter` keeps its fields private and exposes
/// receipts/state through narrow accessors.
pub struct Interpreter<C: Collaborators> {
    pub(crate) thread: ThreadContext,
    pub(crate) instance: Rc<Instance>,
    pub(crate) collaborators: C,
    pub(crate) debugger: debug::Debugger,
}

impl<C: Collaborators> Interpreter<C> {
    pub fn new(config: VmConfig, instance: Rc<Instance>, collaborators: C, thread_id: u64) -> Self {
        Interpreter {
            thread: ThreadContext::new(config, thread_id),
            instance,
            collaborators,
            debugger: debug::Debugger::default(),
        }
    }

    pub fn thread(&self) -> &ThreadContext {
        &self.thread
    }

    pub fn thread_mut(&mut self) -> &mut ThreadContext {
        &mut self.thread
    }

    pub fn collaborators(&self) -> &C {
        &self.collaborators
    }

    pub fn collaborators_mut(&mut self) -> &mut C {
        &mut self.collaborators
    }

    pub fn call_depth(&self) -> usize {
        self.thread.call_stack.len()
    }

    /// Pushes the initial frame and runs the dispatch loop to
    /// completion, matching the teacher's top-level `run`-style entry
    /// point. Returns the terminal [`ExecuteState`] or the
    /// [`InterpreterError`] that ended the run (spec.md §6 "Initial
    /// invocation", "Exit").
    pub fn run(&mut self, entry: Rc<StaticFrame>) -> Result<ExecuteState, InterpreterError> {
        self.thread.push_frame(Frame::new(entry, None));
        self.run_to_completion()
    }

    fn run_to_completion(&mut self) -> Result<ExecuteState, InterpreterError> {
        loop {
            match self.step() {
                Ok(state) if state.should_continue() => continue,
                Ok(state) => return Ok(state),
                Err(err) => return Err(err),
            }
        }
    }
}
