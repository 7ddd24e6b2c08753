//! Small helper methods shared across every handler family, mirroring
//! the teacher's own `interpreter/internal.rs` grab-bag of one-liners
//! (`inc_pc`, `is_register_writable`, ...) that every other
//! `interpreter/*.rs` module calls into rather than duplicating.

use crate::collaborators::Collaborators;
use crate::decoder::Decoder;
use crate::error::{RuntimeError, VmPanic};
use crate::interpreter::Interpreter;
use crate::opcode::Opcode;
use crate::register::{RegKind, Register};

impl<C: Collaborators> Interpreter<C> {
    /// Borrows a [`Decoder`] positioned at `pos` in the current frame's
    /// bytecode. Panics the VM (via `VmPanic`) if there is no current
    /// frame; callers are only ever invoked from within `step`, which
    /// already guarantees one exists.
    pub(crate) fn decoder_at(&self, pos: usize) -> Result<Decoder<'_>, VmPanic> {
        let frame = self.thread.current_frame().ok_or(VmPanic::FrameStackUnderflow)?;
        Ok(Decoder::new(&frame.static_info.bytecode, pos))
    }

    pub(crate) fn current_pc(&self) -> Result<usize, VmPanic> {
        Ok(self.thread.current_frame().ok_or(VmPanic::FrameStackUnderflow)?.pc)
    }

    pub(crate) fn set_pc(&mut self, pc: usize) -> Result<(), VmPanic> {
        self.thread
            .current_frame_mut()
            .ok_or(VmPanic::FrameStackUnderflow)?
            .pc = pc;
        Ok(())
    }

    pub(crate) fn reg(&self, index: u16) -> Result<Register, VmPanic> {
        Ok(self
            .thread
            .current_frame()
            .ok_or(VmPanic::FrameStackUnderflow)?
            .register(index))
    }

    pub(crate) fn set_reg(&mut self, index: u16, value: Register) -> Result<(), VmPanic> {
        self.thread
            .current_frame_mut()
            .ok_or(VmPanic::FrameStackUnderflow)?
            .set_register(index, value);
        Ok(())
    }

    /// Debug-build-only check that a register access matches the static
    /// kind the (out-of-scope) verifier assigned it (spec.md §3
    /// invariant 1, §8 property 2). A no-op unless
    /// `config.assert_register_kinds` is set.
    pub(crate) fn assert_register_kind(&self, index: u16, expected: RegKind) -> Result<(), VmPanic> {
        if !self.thread.config.assert_register_kinds {
            return Ok(());
        }
        let frame = self.thread.current_frame().ok_or(VmPanic::FrameStackUnderflow)?;
        match frame.static_info.register_kinds.get(index as usize) {
            Some(kind) if *kind == expected => Ok(()),
            Some(_) => Err(VmPanic::MalformedOperand),
            None => Err(VmPanic::RegisterOutOfBounds(index)),
        }
    }

    /// Runs a GC safe-point poll (spec.md §5), the single reusable call
    /// site the Design Notes' supplemented `GC_SYNC_POINT` equivalent
    /// requires (SPEC_FULL.md §D) instead of inlining the check at every
    /// caller.
    pub(crate) fn gc_safepoint(&mut self) {
        self.collaborators.safepoint();
    }

    /// Reads the opcode at the frame's current PC without consuming any
    /// operands, used by the debugger's step/breakpoint evaluation
    /// (`interpreter/debug.rs`) to inspect what is about to run.
    pub(crate) fn peek_opcode(&self) -> Result<Opcode, RuntimeError> {
        let pc = self.current_pc()?;
        let mut decoder = self.decoder_at(pc)?;
        Ok(decoder.read_opcode()?)
    }
}
