//! The native-call bridge and per-compilation-unit extension opcode table
//! (spec.md §1 Non-goals: "the native-call ABI marshalling itself"; §6
//! "opcodes numbered at or above a reserved extension base ... dispatch
//! through a per-compilation-unit table of callbacks instead of the
//! built-in handler table").
//!
//! Grounded directly on the teacher's `EcalFn` mechanism
//! (`interpreter/ecal.rs`): `pub type EcalFn = fn(&mut dyn EcalAccess,
//! RegId, RegId, RegId, RegId) -> SimpleResult<()>` plus
//! `Interpreter::set_ecal`/`external_call`, generalized here from the
//! teacher's fixed four-register-operand shape into a table of
//! `(callback, operand_byte_count)` pairs indexed by
//! `opcode - EXTENSION_OP_BASE` (spec.md §6, and SPEC_FULL.md §D).

use crate::error::RuntimeError;
use crate::register::Register;

/// The subset of interpreter state an extension callback or a
/// native-call marshaller is allowed to touch, mirroring the teacher's
/// `EcalAccess` trait (`interpreter/ecal.rs`) — a narrow capability
/// interface rather than hand the callback the whole `Interpreter`.
pub trait NativeAccess {
    fn register(&self, index: u16) -> Register;
    fn set_register(&mut self, index: u16, value: Register);
}

/// A per-compilation-unit extension opcode callback. Takes up to four
/// decoded register operands, mirroring the teacher's four-`RegId` `EcalFn`
/// signature.
pub type ExtensionFn =
    fn(&mut dyn NativeAccess, u16, u16, u16, u16) -> Result<(), RuntimeError>;

/// One entry in the extension table: the callback plus how many operand
/// bytes the decoder must skip past it (spec.md §6).
#[derive(Clone, Copy)]
pub struct ExtensionEntry {
    pub callback: ExtensionFn,
    pub operand_byte_len: usize,
}

fn noop_extension(_a: &mut dyn NativeAccess, _r0: u16, _r1: u16, _r2: u16, _r3: u16) -> Result<(), RuntimeError> {
    Ok(())
}

/// The native-call bridge contract (spec.md §4.3 "Native call bridge":
/// `nativecallbuild`/`nativecallinvoke`/`nativeinvoke_v`/
/// `nativecallrefresh`) plus the extension opcode table (spec.md §6).
pub trait NativeCallBridge {
    /// Builds a native-call site descriptor from a signature string and
    /// argument/return type flags (`nativecallbuild`).
    fn build_site(&mut self, signature: &str) -> Result<u32, RuntimeError>;

    /// Invokes a previously built native-call site (`nativecallinvoke`,
    /// `nativeinvoke_v`).
    fn invoke(&mut self, site: u32, args: &[Register]) -> Result<Register, RuntimeError>;

    /// Re-resolves a native-call site after the underlying library may
    /// have been reloaded (`nativecallrefresh`).
    fn refresh_site(&mut self, site: u32) -> Result<(), RuntimeError>;

    /// Looks up an extension table entry by opcode-relative index
    /// (`opcode - EXTENSION_OP_BASE`). Returns the no-op entry for
    /// unregistered slots rather than failing, matching the teacher's
    /// `noop_ecall` default.
    fn extension_entry(&self, index: u16) -> ExtensionEntry;
}

/// A minimal reference bridge: every native-call site fails with an
/// adhoc error (there is no real FFI to call), and the extension table is
/// entirely the no-op default. Sufficient to exercise the dispatch shape
/// without a real native ABI behind it.
#[derive(Debug, Default)]
pub struct NullNativeBridge;

impl NativeCallBridge for NullNativeBridge {
    fn build_site(&mut self, _signature: &str) -> Result<u32, RuntimeError> {
        Err(crate::error::AdhocError::new("no native library loaded").into())
    }

    fn invoke(&mut self, _site: u32, _args: &[Register]) -> Result<Register, RuntimeError> {
        Err(crate::error::AdhocError::new("no native library loaded").into())
    }

    fn refresh_site(&mut self, _site: u32) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn extension_entry(&self, _index: u16) -> ExtensionEntry {
        ExtensionEntry {
            callback: noop_extension,
            operand_byte_len: 8,
        }
    }
}
