//! Bytecode cursor and operand decoding (spec.md §4.1 "Decoder").
//!
//! Mirrors the shape of the teacher's `Instruction::parse_word` +
//! `chunks_exact` cursor walk in
//! `interpreter/executors/instruction.rs::execute`, generalized from the
//! teacher's fixed hi/lo-word instruction format to this VM's
//! variable-length opcode + operand stream.

use crate::error::VmPanic;
use crate::opcode::{Opcode, OperandWidth};

/// A read-only cursor over one frame's bytecode segment. Does not own the
/// bytes; a frame's static info owns the `Vec<u8>` and hands out a
/// `Decoder` borrowing it.
pub struct Decoder<'b> {
    bytecode: &'b [u8],
    pos: usize,
}

impl<'b> Decoder<'b> {
    pub fn new(bytecode: &'b [u8], pos: usize) -> Self {
        Decoder { bytecode, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn len(&self) -> usize {
        self.bytecode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytecode.is_empty()
    }

    fn take(&mut self, n: usize) -> Result<&'b [u8], VmPanic> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&e| e <= self.bytecode.len())
            .ok_or(VmPanic::BytecodeOverflow)?;
        let slice = &self.bytecode[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Reads the 16-bit opcode header at the current position and advances
    /// past it, without yet decoding its operands.
    pub fn read_opcode(&mut self) -> Result<Opcode, VmPanic> {
        let raw = self.read_u16()?;
        Opcode::from_repr(raw).ok_or(VmPanic::InvalidOpcode(raw))
    }

    pub fn read_i8(&mut self) -> Result<i8, VmPanic> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_u8(&mut self) -> Result<u8, VmPanic> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i16(&mut self) -> Result<i16, VmPanic> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u16(&mut self) -> Result<u16, VmPanic> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, VmPanic> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, VmPanic> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i64(&mut self) -> Result<i64, VmPanic> {
        let b = self.take(8)?;
        Ok(i64::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn read_n32(&mut self) -> Result<f32, VmPanic> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_n64(&mut self) -> Result<f64, VmPanic> {
        let b = self.take(8)?;
        Ok(f64::from_le_bytes(b.try_into().unwrap()))
    }

    /// Reads a 16-bit register-file index operand.
    pub fn read_reg(&mut self) -> Result<u16, VmPanic> {
        self.read_u16()
    }

    /// Reads a 32-bit string-table index operand.
    pub fn read_str_idx(&mut self) -> Result<u32, VmPanic> {
        self.read_u32()
    }

    /// Reads a 32-bit absolute branch target (an offset from the frame's
    /// bytecode base, per spec.md §4.1 "Branch targets").
    pub fn read_branch_target(&mut self) -> Result<u32, VmPanic> {
        self.read_u32()
    }

    /// Reads one operand of the given width as a raw, width-tagged value,
    /// without interpreting it. Used by generic handlers (e.g. the
    /// disassembler, `sp_*` table construction) that need to walk an
    /// opcode's whole operand list without knowing each field's specific
    /// role.
    pub fn read_operand(&mut self, width: OperandWidth) -> Result<RawOperand, VmPanic> {
        use OperandWidth::*;
        Ok(match width {
            I8 => RawOperand::I8(self.read_i8()?),
            U8 => RawOperand::U8(self.read_u8()?),
            I16 => RawOperand::I16(self.read_i16()?),
            U16 => RawOperand::U16(self.read_u16()?),
            I32 => RawOperand::I32(self.read_i32()?),
            U32 => RawOperand::U32(self.read_u32()?),
            I64 => RawOperand::I64(self.read_i64()?),
            N32 => RawOperand::N32(self.read_n32()?),
            N64 => RawOperand::N64(self.read_n64()?),
            Reg => RawOperand::Reg(self.read_reg()?),
            StrIdx => RawOperand::StrIdx(self.read_str_idx()?),
            BranchTarget => RawOperand::BranchTarget(self.read_branch_target()?),
        })
    }

    /// Skips an opcode's entire operand list in one call, advancing the
    /// cursor by exactly [`Opcode::operand_byte_len`] bytes, validating the
    /// bound without materializing each field. Used by the dispatcher's
    /// fallthrough path for opcodes whose handler reads operands lazily
    /// via its own `Decoder` calls but needs to know where the *next*
    /// instruction starts up front (spec.md §4.1, "the decoder ... must
    /// expose both forms").
    pub fn skip_operands(&mut self, op: Opcode) -> Result<(), VmPanic> {
        self.take(op.operand_byte_len())?;
        Ok(())
    }
}

/// A decoded operand value, tagged with the width it was read as.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawOperand {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    N32(f32),
    N64(f64),
    Reg(u16),
    StrIdx(u32),
    BranchTarget(u32),
}

impl RawOperand {
    /// Extracts the register index from a `Reg` operand. Every call site
    /// only ever invokes this on an operand its opcode's
    /// [`Opcode::operand_layout`] declared as `Reg`, so a mismatch here
    /// means the layout table itself is wrong, not malformed input.
    pub fn reg(self) -> u16 {
        match self {
            RawOperand::Reg(v) => v,
            _ => unreachable!("operand_layout declared a non-Reg slot as Reg"),
        }
    }

    pub fn i64(self) -> i64 {
        match self {
            RawOperand::I64(v) => v,
            _ => unreachable!("operand_layout declared a non-I64 slot as I64"),
        }
    }

    pub fn n64(self) -> f64 {
        match self {
            RawOperand::N64(v) => v,
            _ => unreachable!("operand_layout declared a non-N64 slot as N64"),
        }
    }

    pub fn u32(self) -> u32 {
        match self {
            RawOperand::U32(v) => v,
            _ => unreachable!("operand_layout declared a non-U32 slot as U32"),
        }
    }

    pub fn u16(self) -> u16 {
        match self {
            RawOperand::U16(v) => v,
            _ => unreachable!("operand_layout declared a non-U16 slot as U16"),
        }
    }

    pub fn str_idx(self) -> u32 {
        match self {
            RawOperand::StrIdx(v) => v,
            _ => unreachable!("operand_layout declared a non-StrIdx slot as StrIdx"),
        }
    }

    pub fn branch_target(self) -> u32 {
        match self {
            RawOperand::BranchTarget(v) => v,
            _ => unreachable!("operand_layout declared a non-BranchTarget slot as BranchTarget"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_le_primitives_in_sequence() {
        let bytes = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
        let mut d = Decoder::new(&bytes, 0);
        assert_eq!(d.read_u16().unwrap(), 1);
        assert_eq!(d.read_u32().unwrap(), 2);
        assert_eq!(d.position(), 6);
    }

    #[test]
    fn overflow_past_end_panics() {
        let bytes = [0x00u8];
        let mut d = Decoder::new(&bytes, 0);
        assert_eq!(d.read_u16(), Err(VmPanic::BytecodeOverflow));
    }

    #[test]
    fn unknown_opcode_reports_value() {
        let bytes = [0xff, 0xff];
        let mut d = Decoder::new(&bytes, 0);
        assert_eq!(d.read_opcode(), Err(VmPanic::InvalidOpcode(0xffff)));
    }
}
