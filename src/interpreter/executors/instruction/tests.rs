//! End-to-end dispatch-loop tests (spec.md §8 seed scenarios): each test
//! assembles a tiny raw bytecode buffer by hand and drives it through
//! [`Interpreter::run`], the same "build bytes, run, assert on the
//! terminal state" shape as the teacher's own `executors/instruction`
//! integration tests.

use std::rc::Rc;

use super::*;
use crate::collaborators::arena::ArenaHeap;
use crate::error::{InterpreterError, ThrowKind};
use crate::frame::StaticFrame;
use crate::instance::Instance;
use crate::register::RegKind;
use crate::state::ExecuteState;
use crate::thread::{HandlerEntry, VmConfig};

/// A tiny little-endian bytecode assembler, just enough to hand-encode
/// the operand widths [`Opcode::operand_layout`] declares.
#[derive(Default)]
struct Asm {
    bytes: Vec<u8>,
}

impl Asm {
    fn op(&mut self, op: Opcode) -> &mut Self {
        self.bytes.extend_from_slice(&(op as u16).to_le_bytes());
        self
    }

    fn reg(&mut self, r: u16) -> &mut Self {
        self.bytes.extend_from_slice(&r.to_le_bytes());
        self
    }

    fn u16(&mut self, v: u16) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn u32(&mut self, v: u32) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn i64(&mut self, v: i64) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn n64(&mut self, v: f64) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn pos(&self) -> usize {
        self.bytes.len()
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

fn run_frame(bytecode: Vec<u8>, reg_count: usize) -> Result<ExecuteState, InterpreterError> {
    let static_frame = Rc::new(StaticFrame {
        name: "test".into(),
        bytecode,
        lexical_count: 0,
        lexical_names: Vec::new(),
        register_kinds: vec![RegKind::Int; reg_count],
    });
    let mut interp = Interpreter::bootstrap(VmConfig::default(), 0);
    interp.run(static_frame)
}

#[test]
fn add_i_computes_sum() {
    let mut asm = Asm::default();
    asm.op(Opcode::ConstI64).reg(0).i64(5);
    asm.op(Opcode::ConstI64).reg(1).i64(7);
    asm.op(Opcode::AddI).reg(2).reg(0).reg(1);
    asm.op(Opcode::ReturnI).reg(2);
    let state = run_frame(asm.finish(), 3).unwrap();
    assert_eq!(state, ExecuteState::Return(Register::from_i64(12)));
}

#[test]
fn div_i_floors_towards_negative_infinity() {
    let mut asm = Asm::default();
    asm.op(Opcode::ConstI64).reg(0).i64(-7);
    asm.op(Opcode::ConstI64).reg(1).i64(2);
    asm.op(Opcode::DivI).reg(2).reg(0).reg(1);
    asm.op(Opcode::ReturnI).reg(2);
    let state = run_frame(asm.finish(), 3).unwrap();
    assert_eq!(state, ExecuteState::Return(Register::from_i64(-4)));
}

#[test]
fn div_i_by_zero_is_an_uncaught_adhoc_error() {
    let mut asm = Asm::default();
    asm.op(Opcode::ConstI64).reg(0).i64(1);
    asm.op(Opcode::ConstI64).reg(1).i64(0);
    asm.op(Opcode::DivI).reg(2).reg(0).reg(1);
    asm.op(Opcode::ReturnI).reg(2);
    let err = run_frame(asm.finish(), 3).unwrap_err();
    assert!(matches!(err, InterpreterError::UncaughtAdhoc(_)));
}

#[test]
fn set_copies_a_register_and_null_writes_the_sentinel() {
    let mut asm = Asm::default();
    asm.op(Opcode::ConstI64).reg(0).i64(42);
    asm.op(Opcode::Set).reg(1).reg(0);
    asm.op(Opcode::Null).reg(2);
    asm.op(Opcode::ReturnO).reg(2);
    let state = run_frame(asm.finish(), 3).unwrap();
    let ExecuteState::Return(value) = state else {
        panic!("expected a Return state, got {state:?}");
    };
    assert_eq!(value.as_obj_ref(), crate::collaborators::object_model::ObjRef::NULL);
}

#[test]
fn exit_ends_the_run_with_the_exit_code_register() {
    let mut asm = Asm::default();
    asm.op(Opcode::ConstI64).reg(0).i64(5);
    asm.op(Opcode::Exit).reg(0);
    let state = run_frame(asm.finish(), 1).unwrap();
    assert_eq!(state, ExecuteState::Return(Register::from_i64(5)));
}

#[test]
fn nyi_continuation_raises_an_adhoc_error() {
    let mut asm = Asm::default();
    asm.op(Opcode::NyiContinuation);
    let err = run_frame(asm.finish(), 0).unwrap_err();
    assert!(matches!(err, InterpreterError::UncaughtAdhoc(_)));
}

#[test]
fn two_frame_call_chain_returns_the_callee_value() {
    let instance = Rc::new(Instance::default());

    let mut callee_asm = Asm::default();
    callee_asm.op(Opcode::ConstI64).reg(0).i64(42);
    callee_asm.op(Opcode::ReturnI).reg(0);
    let callee_frame = Rc::new(StaticFrame {
        name: "callee".into(),
        bytecode: callee_asm.finish(),
        lexical_count: 0,
        lexical_names: Vec::new(),
        register_kinds: vec![RegKind::Int; 1],
    });
    instance.register_routine(7, callee_frame);

    let mut interp = Interpreter::for_thread(VmConfig::default(), instance, ArenaHeap::new(), 0);
    let ty = interp.collaborators_mut().define_type();
    let callee_obj = interp.collaborators_mut().create(ty).unwrap();
    interp.collaborators_mut().bind_attr_int(callee_obj, "$!routine_id", 7).unwrap();

    let mut caller_asm = Asm::default();
    caller_asm.op(Opcode::ConstI64).reg(0).i64(callee_obj.to_bits() as i64);
    caller_asm.op(Opcode::Prepargs).u16(0);
    caller_asm.op(Opcode::InvokeV).reg(0);
    caller_asm.op(Opcode::ReturnI).reg(0);
    let caller_frame = Rc::new(StaticFrame {
        name: "caller".into(),
        bytecode: caller_asm.finish(),
        lexical_count: 0,
        lexical_names: Vec::new(),
        register_kinds: vec![RegKind::Int; 1],
    });

    let state = interp.run(caller_frame).unwrap();
    assert_eq!(state, ExecuteState::Return(Register::from_i64(42)));
}

#[test]
fn dynamic_throw_unwinds_into_a_registered_handler() {
    let mut asm = Asm::default();
    let throw_at = asm.pos();
    asm.op(Opcode::Throwcatdyn).reg(0).u32(1);
    let handler_block = asm.pos();
    asm.op(Opcode::ConstI64).reg(1).i64(99);
    asm.op(Opcode::ReturnI).reg(1);
    assert_eq!(throw_at, 0);

    let static_frame = Rc::new(StaticFrame {
        name: "test".into(),
        bytecode: asm.finish(),
        lexical_count: 0,
        lexical_names: Vec::new(),
        register_kinds: vec![RegKind::Int; 2],
    });
    let mut interp = Interpreter::bootstrap(VmConfig::default(), 0);
    interp.thread.push_frame(crate::frame::Frame::new(static_frame, None));
    interp.thread.push_handler(HandlerEntry {
        kind: ThrowKind::Dynamic,
        category: 1,
        handler_block: handler_block as u32,
    });

    let state = loop {
        let state = interp.step().unwrap();
        if !state.should_continue() {
            break state;
        }
    };
    assert_eq!(state, ExecuteState::Return(Register::from_i64(99)));
}

#[test]
fn sp_guardtype_mismatch_deopts_to_the_unoptimized_target() {
    let mut interp = Interpreter::bootstrap(VmConfig::default(), 0);
    let actual_ty = interp.collaborators_mut().define_type();
    let obj = interp.collaborators_mut().create(actual_ty).unwrap();

    let mut asm = Asm::default();
    asm.op(Opcode::ConstI64).reg(0).i64(obj.to_bits() as i64);
    let guard_at = asm.pos();
    asm.op(Opcode::SpGuardtype).reg(0).u32(999).u32(0); // target patched below
    asm.op(Opcode::ConstI64).reg(1).i64(111);
    asm.op(Opcode::ReturnI).reg(1);
    let deopt_target = asm.pos();
    asm.op(Opcode::ConstI64).reg(1).i64(222);
    asm.op(Opcode::ReturnI).reg(1);

    let mut bytecode = asm.finish();
    // Patch the guard's deopt-target operand (its last U32, at byte offset
    // opcode(2) + reg(2) + expected-u32(4) = 8 past the guard instruction's
    // start) now that the unoptimized path's offset is known.
    let patch_at = guard_at + 8;
    bytecode[patch_at..patch_at + 4].copy_from_slice(&(deopt_target as u32).to_le_bytes());

    let static_frame = Rc::new(StaticFrame {
        name: "test".into(),
        bytecode,
        lexical_count: 0,
        lexical_names: Vec::new(),
        register_kinds: vec![RegKind::Int; 2],
    });
    let state = interp.run(static_frame).unwrap();
    assert_eq!(state, ExecuteState::Return(Register::from_i64(222)));
}

#[test]
fn iterval_yields_elements_then_iterbool_reports_exhaustion() {
    let mut interp = Interpreter::bootstrap(VmConfig::default(), 0);
    let array_ty = interp.instance.boot_type("Array").unwrap();
    let array = interp.collaborators_mut().create(array_ty).unwrap();
    let element_ty = interp.collaborators_mut().define_type();
    let element = interp.collaborators_mut().create(element_ty).unwrap();
    interp.collaborators_mut().bind_pos(array, 0, element).unwrap();

    let mut asm = Asm::default();
    asm.op(Opcode::ConstI64).reg(0).i64(array.to_bits() as i64);
    asm.op(Opcode::Iter).reg(1).reg(0);
    asm.op(Opcode::IterBool).reg(2).reg(1);
    asm.op(Opcode::Iterval).reg(3).reg(1);
    asm.op(Opcode::IterBool).reg(2).reg(1);
    asm.op(Opcode::ReturnI).reg(2);

    let static_frame = Rc::new(StaticFrame {
        name: "test".into(),
        bytecode: asm.finish(),
        lexical_count: 0,
        lexical_names: Vec::new(),
        register_kinds: vec![RegKind::Int; 4],
    });
    let state = interp.run(static_frame).unwrap();
    // After consuming the single element, a second `iterbool` reports
    // exhaustion (false == 0).
    assert_eq!(state, ExecuteState::Return(Register::from_i64(0)));
}

#[test]
fn pow_i_with_a_negative_exponent_is_zero() {
    let mut asm = Asm::default();
    asm.op(Opcode::ConstI64).reg(0).i64(2);
    asm.op(Opcode::ConstI64).reg(1).i64(-1);
    asm.op(Opcode::PowI).reg(2).reg(0).reg(1);
    asm.op(Opcode::ReturnI).reg(2);
    let state = run_frame(asm.finish(), 3).unwrap();
    assert_eq!(state, ExecuteState::Return(Register::from_i64(0)));
}

#[test]
fn mod_i_follows_the_dividend_sign_like_c_truncated_remainder() {
    let mut asm = Asm::default();
    asm.op(Opcode::ConstI64).reg(0).i64(-7);
    asm.op(Opcode::ConstI64).reg(1).i64(2);
    asm.op(Opcode::ModI).reg(2).reg(0).reg(1);
    asm.op(Opcode::ReturnI).reg(2);
    let state = run_frame(asm.finish(), 3).unwrap();
    assert_eq!(state, ExecuteState::Return(Register::from_i64(-1)));
}

#[test]
fn resume_returns_control_to_the_instruction_after_the_throw() {
    let mut asm = Asm::default();
    asm.op(Opcode::Throwcatdyn).reg(0).u32(1);
    let after_throw = asm.pos();
    asm.op(Opcode::ConstI64).reg(1).i64(123);
    asm.op(Opcode::ReturnI).reg(1);
    let handler_block = asm.pos();
    asm.op(Opcode::Resume).reg(2);
    // Only reached if `resume` wrongly fell through into the handler
    // block's own continuation instead of restoring the throw-site PC.
    asm.op(Opcode::ConstI64).reg(1).i64(999);
    asm.op(Opcode::ReturnI).reg(1);
    assert!(after_throw > 0);

    let static_frame = Rc::new(StaticFrame {
        name: "test".into(),
        bytecode: asm.finish(),
        lexical_count: 0,
        lexical_names: Vec::new(),
        register_kinds: vec![RegKind::Int; 3],
    });
    let mut interp = Interpreter::bootstrap(VmConfig::default(), 0);
    interp.thread.push_frame(crate::frame::Frame::new(static_frame, None));
    interp.thread.push_handler(HandlerEntry {
        kind: ThrowKind::Dynamic,
        category: 1,
        handler_block: handler_block as u32,
    });

    let state = loop {
        let state = interp.step().unwrap();
        if !state.should_continue() {
            break state;
        }
    };
    assert_eq!(state, ExecuteState::Return(Register::from_i64(123)));
}

#[test]
fn param_op_i_branches_when_the_optional_positional_is_present() {
    let instance = Rc::new(Instance::default());

    let mut callee_asm = Asm::default();
    callee_asm.op(Opcode::Checkarity).u16(0).u16(u16::MAX);
    let param_at = callee_asm.pos();
    callee_asm.op(Opcode::ParamOpI).reg(0).u16(0).u32(0); // target patched below
    callee_asm.op(Opcode::ConstI64).reg(0).i64(-1); // default, taken only if absent
    callee_asm.op(Opcode::ReturnI).reg(0);
    let present_target = callee_asm.pos();
    callee_asm.op(Opcode::ReturnI).reg(0);

    let mut callee_bytecode = callee_asm.finish();
    let patch_at = param_at + 2 + 2 + 2; // opcode + reg + u16 index, then the branch target
    callee_bytecode[patch_at..patch_at + 4].copy_from_slice(&(present_target as u32).to_le_bytes());

    let callee_frame = Rc::new(StaticFrame {
        name: "callee".into(),
        bytecode: callee_bytecode,
        lexical_count: 0,
        lexical_names: Vec::new(),
        register_kinds: vec![RegKind::Int; 1],
    });
    instance.register_routine(9, callee_frame);

    let mut interp = Interpreter::for_thread(VmConfig::default(), instance, ArenaHeap::new(), 0);
    let ty = interp.collaborators_mut().define_type();
    let callee_obj = interp.collaborators_mut().create(ty).unwrap();
    interp.collaborators_mut().bind_attr_int(callee_obj, "$!routine_id", 9).unwrap();

    let mut caller_asm = Asm::default();
    caller_asm.op(Opcode::ConstI64).reg(0).i64(callee_obj.to_bits() as i64);
    caller_asm.op(Opcode::ConstI64).reg(1).i64(77);
    caller_asm.op(Opcode::Prepargs).u16(0);
    caller_asm.op(Opcode::ArgI).reg(1);
    caller_asm.op(Opcode::InvokeV).reg(0);
    caller_asm.op(Opcode::ReturnI).reg(0);
    let caller_frame = Rc::new(StaticFrame {
        name: "caller".into(),
        bytecode: caller_asm.finish(),
        lexical_count: 0,
        lexical_names: Vec::new(),
        register_kinds: vec![RegKind::Int; 2],
    });

    let state = interp.run(caller_frame).unwrap();
    assert_eq!(state, ExecuteState::Return(Register::from_i64(77)));
}
