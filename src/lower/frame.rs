//! Prelude and conclusion — stack frame setup and teardown.
//!
//! Wraps the patched instruction body with function entry code that saves
//! the caller's frame pointer, establishes a new one, and reserves the
//! program's `stack_space`, and exit code that is its exact inverse.
//! `stack_space` is already 16-byte aligned when this pass runs, so the
//! stack pointer stays aligned across the calls the body makes.

use crate::x86::{Arg, Instr, Program, FRAME_PTR, STACK_PTR};

/// Produce the final instruction sequence: prelude, body, conclusion.
/// Performs no operand rewriting.
pub fn add_prelude_and_conclusion(program: Program) -> Program {
    let stack_space = program.stack_space;
    let mut instrs = Vec::with_capacity(program.instrs.len() + 6);

    instrs.push(Instr::Pushq {
        src: Arg::Reg(FRAME_PTR),
    });
    instrs.push(Instr::Movq {
        src: Arg::Reg(STACK_PTR),
        dst: Arg::Reg(FRAME_PTR),
    });
    instrs.push(Instr::Subq {
        src: Arg::Imm(stack_space as i64),
        dst: Arg::Reg(STACK_PTR),
    });

    instrs.extend(program.instrs);

    instrs.push(Instr::Addq {
        src: Arg::Imm(stack_space as i64),
        dst: Arg::Reg(STACK_PTR),
    });
    instrs.push(Instr::Popq {
        dst: Arg::Reg(FRAME_PTR),
    });
    instrs.push(Instr::Retq);

    Program {
        instrs,
        stack_space,
    }
}
