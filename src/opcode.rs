//! The opcode table (spec.md §1 Non-goals: "how opcodes are assigned
//! numbers... belongs to a separate operation table"; spec.md §4.1
//! Decoder).
//!
//! Numbering itself is out of scope per spec.md, so `Opcode` assigns its
//! own discriminants via `strum`'s `FromRepr`, grounded on the teacher's
//! `OpcodeRepr`/`Instruction` split (`fuel-asm/src/opcode.rs`): one enum
//! names every opcode, a side table (`operand_layout`) describes how many
//! operands of which width each one decodes.

use strum::{EnumIter, FromRepr};

/// Width of a single operand, as laid out by the decoder contract
/// (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandWidth {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    N32,
    N64,
    /// A 16-bit register-file index.
    Reg,
    /// A 32-bit index into the compilation unit's string table.
    StrIdx,
    /// A 32-bit absolute branch target, relative to the frame's bytecode
    /// base (spec.md §4.1 "Branch targets").
    BranchTarget,
}

impl OperandWidth {
    pub const fn byte_len(self) -> usize {
        use OperandWidth::*;
        match self {
            I8 | U8 => 1,
            I16 | U16 | Reg => 2,
            I32 | U32 | StrIdx | BranchTarget => 4,
            I64 | N32 | N64 => 8,
        }
    }
}

/// Every opcode the core dispatch table recognizes. This is a
/// representative cross-section of each family spec.md §4.3 names, not
/// an exhaustive 850-entry table (spec.md §1 leaves opcode-numbering
/// scale to the implementer); the dispatch and handler *mechanism* is
/// identical regardless of table size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, EnumIter)]
#[repr(u16)]
pub enum Opcode {
    // --- Constants and moves ---
    ConstI64 = 0x0000,
    ConstN64 = 0x0001,
    ConstS = 0x0002,
    Set = 0x0003,
    Null = 0x0004,
    NullS = 0x0005,

    // --- Numeric arithmetic ---
    AddI = 0x0010,
    SubI = 0x0011,
    MulI = 0x0012,
    DivI = 0x0013,
    ModI = 0x0014,
    PowI = 0x0015,
    GcdI = 0x0016,
    LcmI = 0x0017,
    NegI = 0x0018,
    EqI = 0x0019,
    LtI = 0x001a,
    LeI = 0x001b,
    CmpI = 0x001c,
    CoerceIN = 0x001d,
    CoerceNI = 0x001e,
    AddN = 0x001f,
    SubN = 0x0020,
    MulN = 0x0021,
    DivN = 0x0022,
    EqN = 0x0023,
    LtN = 0x0024,

    // --- Big-integer arithmetic ---
    AddBi = 0x0030,
    SubBi = 0x0031,
    MulBi = 0x0032,
    DivBi = 0x0033,
    CmpBi = 0x0034,
    CoerceIBi = 0x0035,
    CoerceBiI = 0x0036,

    // --- String operations ---
    StrEq = 0x0040,
    StrCmp = 0x0041,
    StrConcat = 0x0042,
    StrRepeat = 0x0043,
    StrSubstr = 0x0044,
    StrIndex = 0x0045,
    StrRindex = 0x0046,
    StrUc = 0x0047,
    StrLc = 0x0048,
    StrTc = 0x0049,
    StrFlip = 0x004a,
    StrGraphs = 0x004b,
    StrGraphAt = 0x004c,

    // --- Control flow ---
    Goto = 0x0050,
    IfI = 0x0051,
    UnlessI = 0x0052,
    IfN = 0x0053,
    UnlessN = 0x0054,
    IfS = 0x0055,
    UnlessS = 0x0056,
    IfO = 0x0057,
    UnlessO = 0x0058,
    Jumplist = 0x0059,
    IfNonnull = 0x005a,

    // --- Lexical access ---
    Getlex = 0x0060,
    Bindlex = 0x0061,
    GetlexNi = 0x0062,
    GetlexNn = 0x0063,
    GetlexNs = 0x0064,
    GetlexNo = 0x0065,
    BindlexNi = 0x0066,
    BindlexNn = 0x0067,
    BindlexNs = 0x0068,
    BindlexNo = 0x0069,
    Getdynlex = 0x006a,
    Binddynlex = 0x006b,

    // --- Object operations ---
    Create = 0x0070,
    Clone = 0x0071,
    Typeof = 0x0072,
    Whatof = 0x0073,
    Who = 0x0074,
    SetWho = 0x0075,
    Istype = 0x0076,
    Rebless = 0x0077,
    GetattrI = 0x0078,
    GetattrN = 0x0079,
    GetattrS = 0x007a,
    GetattrO = 0x007b,
    BindattrI = 0x007c,
    BindattrN = 0x007d,
    BindattrS = 0x007e,
    BindattrO = 0x007f,
    GetattrSI = 0x0080,
    BindattrSO = 0x0081,
    Atpos = 0x0082,
    Bindpos = 0x0083,
    Atkey = 0x0084,
    Bindkey = 0x0085,

    // --- Boxing / unboxing ---
    BoxI = 0x0090,
    BoxN = 0x0091,
    BoxS = 0x0092,
    UnboxI = 0x0093,
    UnboxN = 0x0094,
    UnboxS = 0x0095,
    SmrtIntify = 0x0096,
    SmrtNumify = 0x0097,
    SmrtStrify = 0x0098,

    // --- Iteration ---
    Iter = 0x00a0,
    IterkeyS = 0x00a1,
    Iterval = 0x00a2,
    IterBool = 0x00a3,

    // --- Exceptions ---
    Throwdyn = 0x00b0,
    Throwlex = 0x00b1,
    Throwlexotic = 0x00b2,
    Throwcatdyn = 0x00b3,
    Throwpayloadlex = 0x00b4,
    Die = 0x00b5,
    Rethrow = 0x00b6,
    Resume = 0x00b7,
    Exception = 0x00b8,
    Takehandlerresult = 0x00b9,
    Newexception = 0x00ba,
    Bindexcategory = 0x00bb,
    Getexcategory = 0x00bc,

    // --- Serialization-context operations ---
    ScCreate = 0x00c0,
    ScGetobj = 0x00c1,
    ScSetobj = 0x00c2,
    ScSetobjSc = 0x00c3,
    ScSerialize = 0x00c4,
    ScDeserialize = 0x00c5,

    // --- I/O and system operations (forward to the I/O collaborator) ---
    Exit = 0x00d0,

    // --- Concurrency primitives ---
    Threadcreate = 0x00e0,
    Threadjoin = 0x00e1,
    Threadyield = 0x00e2,
    Threadid = 0x00e3,
    Lock = 0x00e4,
    Unlock = 0x00e5,
    Semacquire = 0x00e6,
    Semtryacquire = 0x00e7,
    Semrelease = 0x00e8,
    Condwait = 0x00e9,
    CondsignalOne = 0x00ea,
    CondsignalAll = 0x00eb,
    CasI = 0x00ec,
    AtomicloadI = 0x00ed,
    AtomicstoreI = 0x00ee,
    AtomicincI = 0x00ef,
    AtomicdecI = 0x00f0,
    Barrierfull = 0x00f1,

    // --- Container protocol ---
    Assign = 0x0100,
    Decont = 0x0101,
    Iscont = 0x0102,
    DecontI = 0x0103,
    DecontN = 0x0104,
    DecontS = 0x0105,
    CasO = 0x0106,

    // --- Native call bridge ---
    Nativecallbuild = 0x0110,
    Nativecallinvoke = 0x0111,
    NativeinvokeV = 0x0112,
    Nativecallrefresh = 0x0113,

    // --- Call protocol ---
    Prepargs = 0x0120,
    ArgI = 0x0121,
    ArgN = 0x0122,
    ArgS = 0x0123,
    ArgO = 0x0124,
    ArgconstI = 0x0125,
    InvokeV = 0x0126,
    InvokeI = 0x0127,
    InvokeN = 0x0128,
    InvokeS = 0x0129,
    InvokeO = 0x012a,
    Invokewithcapture = 0x012b,
    Return = 0x012c,
    ReturnI = 0x012d,
    ReturnN = 0x012e,
    ReturnS = 0x012f,
    ReturnO = 0x0130,
    Checkarity = 0x0131,
    ParamRpI = 0x0132,
    ParamRpN = 0x0133,
    ParamRpS = 0x0134,
    ParamRpO = 0x0135,
    ParamOpI = 0x0136,
    ParamRnO = 0x0137,
    ParamOnO = 0x0138,
    ParamSp = 0x0139,
    ParamSn = 0x013a,
    Paramnamesused = 0x013b,

    // --- Call protocol: two-name-fallback named params ("try first name,
    // then second", spec.md §4.4) ---
    ParamRn2I = 0x0180,
    ParamRn2N = 0x0181,
    ParamRn2S = 0x0182,
    ParamRn2O = 0x0183,
    ParamOn2I = 0x0184,
    ParamOn2N = 0x0185,
    ParamOn2S = 0x0186,
    ParamOn2O = 0x0187,

    // --- Specialized (`sp_*`) opcodes ---
    SpGuardconc = 0x0140,
    SpGuardtype = 0x0141,
    SpGuardrepr = 0x0142,
    SpFastcreate = 0x0143,
    SpP6ogetO = 0x0144,
    SpP6obindO = 0x0145,
    SpFastboxIIc = 0x0146,
    SpFastboxBiIc = 0x0147,
    SpAddI = 0x0148,
    SpSubI = 0x0149,
    SpMulI = 0x014a,
    SpGetspeshslot = 0x014b,
    SpFindmeth = 0x014c,
    SpGetlex = 0x014d,
    SpBindlex = 0x014e,
    SpBoolifyIterArr = 0x014f,
    SpJitEnter = 0x0150,

    // --- Speculation plugin ---
    Speshreg = 0x0160,
    Speshresolve = 0x0161,

    // --- Profiling hooks ---
    ProfEnter = 0x0170,
    ProfExit = 0x0171,
    ProfAllocated = 0x0172,
    ProfReplaced = 0x0173,

    // --- Dispatcher (MOP dispatch-plan handoff) ---
    Setdispatcher = 0x0190,
    Takedispatcher = 0x0191,
    Setdispatcherfor = 0x0192,

    // --- NYI opcodes (spec.md Design Notes, open question (a)) ---
    NyiContinuation = 0x01f0,
}

impl Opcode {
    /// The operand layout for this opcode, in decode order. The decoder
    /// (spec.md §4.1) reads these in sequence starting one opcode-word
    /// past the opcode header.
    pub fn operand_layout(self) -> &'static [OperandWidth] {
        use Opcode::*;
        use OperandWidth::*;
        match self {
            ConstI64 => &[Reg, I64],
            ConstN64 => &[Reg, N64],
            ConstS => &[Reg, StrIdx],
            Set | Typeof | Whatof | Who | Clone | IterkeyS | Iterval | IterBool | Decont
            | DecontI | DecontN | DecontS | Iscont | UnboxI | UnboxN | UnboxS | NegI => {
                &[Reg, Reg]
            }
            Null | NullS => &[Reg],
            AddI | SubI | MulI | DivI | ModI | PowI | GcdI | LcmI | EqI | LtI | LeI | CmpI
            | AddN | SubN | MulN | DivN | EqN | LtN | AddBi | SubBi | MulBi | DivBi | CmpBi
            | StrEq | StrCmp | StrConcat | StrRepeat | Atpos | Atkey | CasI | CasO => {
                &[Reg, Reg, Reg]
            }
            CoerceIN | CoerceNI | CoerceIBi | CoerceBiI | StrUc | StrLc | StrTc | StrFlip
            | StrGraphs | BoxI | BoxN | BoxS | SmrtIntify | SmrtNumify | SmrtStrify | Istype
            | Iter | Assign => &[Reg, Reg],
            StrSubstr | StrGraphAt | Bindpos | Bindkey => &[Reg, Reg, Reg, Reg],
            StrIndex | StrRindex => &[Reg, Reg, Reg, Reg],
            Goto => &[BranchTarget],
            IfI | UnlessI | IfN | UnlessN | IfS | UnlessS | IfO | UnlessO | IfNonnull => {
                &[Reg, BranchTarget]
            }
            Jumplist => &[Reg, U32],
            Getlex | Bindlex => &[Reg, U16],
            GetlexNi | GetlexNn | GetlexNs | GetlexNo | BindlexNi | BindlexNn | BindlexNs
            | BindlexNo | Getdynlex | Binddynlex => &[Reg, StrIdx],
            Create => &[Reg, Reg],
            SetWho => &[Reg, Reg],
            Rebless => &[Reg, Reg, Reg],
            GetattrI | GetattrN | GetattrS | GetattrO | GetattrSI => &[Reg, Reg, Reg, StrIdx],
            BindattrI | BindattrN | BindattrS | BindattrO | BindattrSO => {
                &[Reg, Reg, Reg, StrIdx, Reg]
            }
            Throwdyn | Throwlex | Throwlexotic | Throwpayloadlex | Rethrow => &[Reg, Reg],
            Throwcatdyn => &[Reg, U32],
            Die => &[Reg, StrIdx],
            Resume | Exception | Takehandlerresult => &[Reg],
            Newexception => &[Reg],
            Bindexcategory | Getexcategory => &[Reg, Reg],
            ScCreate => &[Reg, StrIdx],
            ScGetobj | ScSetobj | ScSetobjSc => &[Reg, Reg, U32],
            ScSerialize | ScDeserialize => &[Reg, Reg],
            Exit => &[Reg],
            Threadcreate | Threadjoin | Threadyield | Threadid => &[Reg, Reg],
            Lock | Unlock | Semacquire | Semtryacquire | Semrelease | Condwait
            | CondsignalOne | CondsignalAll => &[Reg],
            AtomicloadI | AtomicstoreI | AtomicincI | AtomicdecI => &[Reg, Reg],
            Barrierfull => &[],
            Nativecallbuild => &[Reg, Reg, Reg, Reg, Reg],
            Nativecallinvoke | NativeinvokeV => &[Reg, Reg, Reg],
            Nativecallrefresh => &[Reg],
            Prepargs => &[U16],
            ArgI | ArgN | ArgS | ArgO => &[Reg],
            ArgconstI => &[I64],
            InvokeV | InvokeI | InvokeN | InvokeS | InvokeO | Invokewithcapture => &[Reg],
            Return => &[],
            ReturnI | ReturnN | ReturnS | ReturnO => &[Reg],
            Checkarity => &[U16, U16],
            ParamRpI | ParamRpN | ParamRpS | ParamRpO => &[Reg, U16],
            // `param_op_i`: optional *positional* — indexes the callsite's
            // positional arguments the same way param_rp_i does, and
            // branches to the already-bound-value path when the argument
            // IS present, falling through so the caller's own default-set
            // code runs when it's absent.
            ParamOpI => &[Reg, U16, BranchTarget],
            // `param_rn_o`: required named — no branch target. A miss is a
            // hard failure, not a branch, matching param_rp_*'s shape.
            ParamRnO => &[Reg, StrIdx],
            // `param_on_o`: optional named — branches (to the
            // default-setting code) when the name is absent.
            ParamOnO => &[Reg, StrIdx, BranchTarget],
            ParamRn2I | ParamRn2N | ParamRn2S | ParamRn2O => &[Reg, StrIdx, StrIdx],
            ParamOn2I | ParamOn2N | ParamOn2S | ParamOn2O => {
                &[Reg, StrIdx, StrIdx, BranchTarget]
            }
            ParamSp | ParamSn => &[Reg],
            Paramnamesused => &[],
            SpGuardconc | SpGuardtype | SpGuardrepr => &[Reg, U32, U32],
            SpFastcreate => &[Reg, U32, U32],
            SpP6ogetO | SpP6obindO => &[Reg, Reg, U16, Reg],
            SpFastboxIIc | SpFastboxBiIc => &[Reg, Reg, U16],
            SpAddI | SpSubI | SpMulI => &[Reg, Reg, Reg],
            SpGetspeshslot => &[Reg, U16],
            SpFindmeth => &[Reg, Reg, StrIdx, U16],
            SpGetlex | SpBindlex => &[Reg, U16],
            SpBoolifyIterArr => &[Reg, Reg],
            SpJitEnter => &[],
            Speshreg => &[Reg, U16],
            Speshresolve => &[U16],
            ProfEnter => &[U32],
            ProfExit | ProfAllocated | ProfReplaced => &[],
            Setdispatcher => &[Reg],
            Takedispatcher => &[Reg],
            Setdispatcherfor => &[Reg, Reg],
            NyiContinuation => &[],
        }
    }

    /// Total operand byte length, used by [`crate::decoder::Decoder`] to
    /// advance the cursor past a non-branching instruction.
    pub fn operand_byte_len(self) -> usize {
        self.operand_layout().iter().map(|w| w.byte_len()).sum()
    }
}
