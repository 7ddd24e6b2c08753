//! VM-wide constants.
//!
//! Mirrors the role of the teacher's `consts.rs`: register indices and
//! memory-shape constants live here so handler code never hard-codes a
//! magic number inline.

/// Width, in bytes, of an opcode header.
pub const OPCODE_WIDTH: usize = 2;

/// First opcode number that dispatches through the per-compilation-unit
/// extension table (spec.md §6) instead of the built-in handler table.
pub const EXTENSION_OP_BASE: u16 = 0xF000;

/// Inclusive range of values the small-integer box cache covers
/// (spec.md §4.6, testable property #10).
pub const SMALL_INT_CACHE_LO: i64 = -1;
pub const SMALL_INT_CACHE_HI: i64 = 14;

/// Number of slots in the small-integer box cache.
pub const SMALL_INT_CACHE_LEN: usize = (SMALL_INT_CACHE_HI - SMALL_INT_CACHE_LO + 1) as usize;

/// Default initial capacity of a freshly allocated frame's register file.
/// Frames whose static metadata calls for more grow to fit; this is just
/// the allocator's starting guess.
pub const DEFAULT_REGISTER_FILE_CAPACITY: usize = 16;

/// Sentinel outer-chain depth meaning "this lexical lives in the current
/// frame's own environment vector".
pub const LEXICAL_DEPTH_SELF: u16 = 0;

static_assertions::const_assert!(SMALL_INT_CACHE_HI > SMALL_INT_CACHE_LO);
