//! Home assignment — stack-slot allocation.
//!
//! Replaces every symbolic `Arg::Var` operand with a memory reference
//! into the current frame. One linear scan over the instruction stream:
//! the first occurrence of a name allocates the next 8-byte slot below
//! the frame pointer, later occurrences reuse it. Slots are never
//! reclaimed; fine for straight-line programs, not a register allocator.

use std::collections::HashMap;

use crate::x86::{Arg, Instr, Program, FRAME_PTR};

/// Resolve all symbolic operands and set the program's `stack_space`,
/// rounded up to the 16-byte stack alignment the calling convention
/// requires.
pub fn assign_homes(program: Program) -> Program {
    let mut homes = Homes::default();
    let instrs = program
        .instrs
        .into_iter()
        .map(|instr| assign_instr(instr, &mut homes))
        .collect();
    Program {
        instrs,
        stack_space: homes.stack_space(),
    }
}

/// The home mapping: grows monotonically in first-occurrence order and
/// never reassigns a mapped name.
#[derive(Default)]
struct Homes {
    /// Slot owners in allocation order; slot `i` lives at `-8 * (i + 1)`.
    slots: Vec<String>,
    offsets: HashMap<String, i64>,
}

impl Homes {
    fn home(&mut self, name: &str) -> Arg {
        let offset = match self.offsets.get(name) {
            Some(&offset) => offset,
            None => {
                self.slots.push(name.to_string());
                let offset = -8 * self.slots.len() as i64;
                self.offsets.insert(name.to_string(), offset);
                offset
            }
        };
        Arg::Deref(FRAME_PTR, offset)
    }

    fn stack_space(&self) -> u64 {
        let raw = 8 * self.slots.len() as u64;
        if self.slots.len() % 2 == 1 {
            raw + 8
        } else {
            raw
        }
    }
}

fn assign_arg(arg: Arg, homes: &mut Homes) -> Arg {
    match arg {
        Arg::Var(name) => homes.home(&name),
        other => other,
    }
}

/// Source operands are visited before destinations, so slot order follows
/// operand order within each instruction.
fn assign_instr(instr: Instr, homes: &mut Homes) -> Instr {
    match instr {
        Instr::Movq { src, dst } => Instr::Movq {
            src: assign_arg(src, homes),
            dst: assign_arg(dst, homes),
        },
        Instr::Addq { src, dst } => Instr::Addq {
            src: assign_arg(src, homes),
            dst: assign_arg(dst, homes),
        },
        Instr::Subq { src, dst } => Instr::Subq {
            src: assign_arg(src, homes),
            dst: assign_arg(dst, homes),
        },
        Instr::Negq { dst } => Instr::Negq {
            dst: assign_arg(dst, homes),
        },
        Instr::Pushq { src } => Instr::Pushq {
            src: assign_arg(src, homes),
        },
        Instr::Popq { dst } => Instr::Popq {
            dst: assign_arg(dst, homes),
        },
        other @ (Instr::Callq { .. } | Instr::Jmp { .. } | Instr::Retq) => other,
    }
}
