//! Concurrency primitive opcodes (spec.md §4.3 "Concurrency primitives").
//!
//! The opcodes themselves are in scope; the OS thread/lock/condvar
//! subsystem behind them is not (spec.md §1 Non-goals: "the ... thread ...
//! subsystem"). This reference implementation is single-threaded, so
//! every primitive is bookkeeping on an ordinary object's attributes
//! rather than a real blocking wait — `threadcreate`/`threadjoin` hand off
//! to [`crate::instance::Instance::event_loop_queue`] the same way spec.md
//! §1 scopes "the event loop's own implementation" out: this only
//! enqueues/describes work, an embedder's real scheduler runs it.
//! `cas_i` is an atomic exchange (returns the prior value), not a true
//! compare-and-swap — the three-operand budget has no room for a separate
//! expected-value operand.

use crate::collaborators::Collaborators;
use crate::collaborators::object_model::TypeRef;
use crate::decoder::RawOperand;
use crate::error::RuntimeError;
use crate::instance::EventLoopSubscription;
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::register::Register;
use crate::state::ExecuteState;

const LOCK_STATE_ATTR: &str = "$!locked";
const SEM_COUNT_ATTR: &str = "$!count";
const CELL_VALUE_ATTR: &str = "$!value";
const THREAD_ID_ATTR: &str = "$!thread_id";

impl<C: Collaborators> Interpreter<C> {
    pub(crate) fn dispatch_concurrency(&mut self, op: Opcode, ops: &[RawOperand]) -> Result<ExecuteState, RuntimeError> {
        use Opcode::*;
        match op {
            Threadcreate => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let routine = self.reg(rb)?.as_obj_ref();
                let new_id = self.thread.thread_id.wrapping_add(1).wrapping_add(routine.to_bits());
                self.instance.enqueue_event(EventLoopSubscription {
                    thread_id: new_id,
                    token: routine.to_bits(),
                });
                let ty = self.instance.boot_type("Thread").unwrap_or(TypeRef::NULL);
                let handle = self.collaborators.create(ty)?;
                self.collaborators.bind_attr_int(handle, THREAD_ID_ATTR, new_id as i64)?;
                self.set_reg(ra, Register::from_obj_ref(handle))?;
            }
            Threadjoin => {
                let (ra, _rb) = (ops[0].reg(), ops[1].reg());
                // Joining a real OS thread is the embedder's event loop's
                // job; this reference VM has nothing to block on.
                self.set_reg(ra, Register::ZERO)?;
            }
            Threadyield => {
                let (ra, _rb) = (ops[0].reg(), ops[1].reg());
                self.set_reg(ra, Register::ZERO)?;
            }
            Threadid => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let handle = self.reg(rb)?.as_obj_ref();
                let id = if handle.is_null() {
                    self.thread.thread_id as i64
                } else {
                    self.collaborators.get_attr_int(handle, THREAD_ID_ATTR)?
                };
                self.set_reg(ra, Register::from_i64(id))?;
            }
            Lock => {
                let lock = self.reg(ops[0].reg())?.as_obj_ref();
                self.collaborators.bind_attr_int(lock, LOCK_STATE_ATTR, 1)?;
            }
            Unlock => {
                let lock = self.reg(ops[0].reg())?.as_obj_ref();
                self.collaborators.bind_attr_int(lock, LOCK_STATE_ATTR, 0)?;
            }
            Semacquire | Semtryacquire => {
                let sem = self.reg(ops[0].reg())?.as_obj_ref();
                let count = self.collaborators.get_attr_int(sem, SEM_COUNT_ATTR).unwrap_or(0);
                self.collaborators.bind_attr_int(sem, SEM_COUNT_ATTR, (count - 1).max(0))?;
            }
            Semrelease => {
                let sem = self.reg(ops[0].reg())?.as_obj_ref();
                let count = self.collaborators.get_attr_int(sem, SEM_COUNT_ATTR).unwrap_or(0);
                self.collaborators.bind_attr_int(sem, SEM_COUNT_ATTR, count + 1)?;
            }
            Condwait | CondsignalOne | CondsignalAll => {
                // No real waiters to block or wake in a single-threaded
                // reference VM.
            }
            CasI => {
                let (ra, rb, rc) = (ops[0].reg(), ops[1].reg(), ops[2].reg());
                let cell = self.reg(rb)?.as_obj_ref();
                let new_value = self.reg(rc)?.as_i64();
                let old = self.collaborators.get_attr_int(cell, CELL_VALUE_ATTR).unwrap_or(0);
                self.collaborators.bind_attr_int(cell, CELL_VALUE_ATTR, new_value)?;
                self.set_reg(ra, Register::from_i64(old))?;
            }
            AtomicloadI => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let cell = self.reg(rb)?.as_obj_ref();
                let value = self.collaborators.get_attr_int(cell, CELL_VALUE_ATTR).unwrap_or(0);
                self.set_reg(ra, Register::from_i64(value))?;
            }
            AtomicstoreI => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let cell = self.reg(ra)?.as_obj_ref();
                let value = self.reg(rb)?.as_i64();
                self.collaborators.bind_attr_int(cell, CELL_VALUE_ATTR, value)?;
            }
            AtomicincI => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let cell = self.reg(rb)?.as_obj_ref();
                let old = self.collaborators.get_attr_int(cell, CELL_VALUE_ATTR).unwrap_or(0);
                self.collaborators.bind_attr_int(cell, CELL_VALUE_ATTR, old + 1)?;
                self.set_reg(ra, Register::from_i64(old))?;
            }
            AtomicdecI => {
                let (ra, rb) = (ops[0].reg(), ops[1].reg());
                let cell = self.reg(rb)?.as_obj_ref();
                let old = self.collaborators.get_attr_int(cell, CELL_VALUE_ATTR).unwrap_or(0);
                self.collaborators.bind_attr_int(cell, CELL_VALUE_ATTR, old - 1)?;
                self.set_reg(ra, Register::from_i64(old))?;
            }
            Barrierfull => {
                // A full fence has no observable effect on a
                // single-threaded interpreter beyond a safe-point poll.
                self.gc_safepoint();
            }
            _ => unreachable!("dispatch_concurrency called with a non-concurrency opcode: {op:?}"),
        }
        Ok(ExecuteState::Proceed)
    }
}
