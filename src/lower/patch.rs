//! Instruction patching — addressing-mode legality.
//!
//! x86-64 admits at most one memory operand per instruction, and a
//! memory-destination form cannot carry an immediate outside the 16-bit
//! signed range. Offending instructions are expanded into a move through
//! the reserved scratch register followed by the original operator. The
//! pass preserves instruction order, never introduces variables, and
//! never consults the home mapping.

use crate::x86::{Arg, Instr, Program, SCRATCH};

/// Rewrite every illegal instruction into a legal two-instruction
/// sequence; legal instructions pass through unchanged.
pub fn patch_instructions(program: Program) -> Program {
    let mut instrs = Vec::with_capacity(program.instrs.len());
    for instr in program.instrs {
        patch_instr(instr, &mut instrs);
    }
    Program {
        instrs,
        stack_space: program.stack_space,
    }
}

fn patch_instr(instr: Instr, out: &mut Vec<Instr>) {
    match instr {
        Instr::Movq { src, dst } => patch_binary(src, dst, |src, dst| Instr::Movq { src, dst }, out),
        Instr::Addq { src, dst } => patch_binary(src, dst, |src, dst| Instr::Addq { src, dst }, out),
        Instr::Subq { src, dst } => patch_binary(src, dst, |src, dst| Instr::Subq { src, dst }, out),
        other => out.push(other),
    }
}

fn patch_binary(src: Arg, dst: Arg, build: impl Fn(Arg, Arg) -> Instr, out: &mut Vec<Instr>) {
    let oversized = matches!(&src, Arg::Imm(n) if !fits_imm16(*n));
    if dst.is_mem() && (src.is_mem() || oversized) {
        out.push(Instr::Movq {
            src,
            dst: Arg::Reg(SCRATCH),
        });
        out.push(build(Arg::Reg(SCRATCH), dst));
    } else {
        out.push(build(src, dst));
    }
}

fn fits_imm16(n: i64) -> bool {
    i64::from(i16::MIN) <= n && n <= i64::from(i16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::x86::Reg;

    fn mem(offset: i64) -> Arg {
        Arg::Deref(Reg::Rbp, offset)
    }

    fn patched(instrs: Vec<Instr>) -> Vec<Instr> {
        patch_instructions(Program::new(instrs)).instrs
    }

    /// No two-memory-operand instruction and no oversized immediate into
    /// a memory destination.
    fn assert_legal(instrs: &[Instr]) {
        for instr in instrs {
            if let Instr::Movq { src, dst } | Instr::Addq { src, dst } | Instr::Subq { src, dst } =
                instr
            {
                assert!(
                    !(src.is_mem() && dst.is_mem()),
                    "two memory operands: {}",
                    instr
                );
                if let Arg::Imm(n) = src {
                    assert!(
                        !dst.is_mem() || fits_imm16(*n),
                        "oversized immediate into memory: {}",
                        instr
                    );
                }
            }
        }
    }

    #[test]
    fn test_memory_to_memory_move_expands_to_two() {
        let instrs = patched(vec![Instr::Movq {
            src: mem(-8),
            dst: mem(-16),
        }]);
        assert_eq!(
            instrs,
            vec![
                Instr::Movq {
                    src: mem(-8),
                    dst: Arg::Reg(Reg::R11),
                },
                Instr::Movq {
                    src: Arg::Reg(Reg::R11),
                    dst: mem(-16),
                },
            ]
        );
        assert_legal(&instrs);
    }

    #[test]
    fn test_memory_to_memory_add_keeps_operator() {
        let instrs = patched(vec![Instr::Addq {
            src: mem(-8),
            dst: mem(-16),
        }]);
        assert_eq!(
            instrs,
            vec![
                Instr::Movq {
                    src: mem(-8),
                    dst: Arg::Reg(Reg::R11),
                },
                Instr::Addq {
                    src: Arg::Reg(Reg::R11),
                    dst: mem(-16),
                },
            ]
        );
    }

    #[test]
    fn test_oversized_immediate_into_memory_goes_through_scratch() {
        let instrs = patched(vec![Instr::Movq {
            src: Arg::Imm(1 << 20),
            dst: mem(-8),
        }]);
        assert_eq!(
            instrs,
            vec![
                Instr::Movq {
                    src: Arg::Imm(1 << 20),
                    dst: Arg::Reg(Reg::R11),
                },
                Instr::Movq {
                    src: Arg::Reg(Reg::R11),
                    dst: mem(-8),
                },
            ]
        );
        assert_legal(&instrs);
    }

    #[test]
    fn test_oversized_immediate_into_register_is_legal() {
        let original = vec![Instr::Movq {
            src: Arg::Imm(1 << 20),
            dst: Arg::Reg(Reg::Rax),
        }];
        assert_eq!(patched(original.clone()), original);
    }

    #[test]
    fn test_small_immediate_into_memory_passes_through() {
        let original = vec![Instr::Subq {
            src: Arg::Imm(i64::from(i16::MAX)),
            dst: mem(-8),
        }];
        assert_eq!(patched(original.clone()), original);
    }

    #[test]
    fn test_negative_boundary_immediates() {
        let min_ok = vec![Instr::Movq {
            src: Arg::Imm(i64::from(i16::MIN)),
            dst: mem(-8),
        }];
        assert_eq!(patched(min_ok.clone()), min_ok);

        let below = patched(vec![Instr::Movq {
            src: Arg::Imm(i64::from(i16::MIN) - 1),
            dst: mem(-8),
        }]);
        assert_eq!(below.len(), 2);
        assert_legal(&below);
    }

    #[test]
    fn test_non_binary_instructions_pass_through() {
        let original = vec![
            Instr::Negq { dst: mem(-8) },
            Instr::Callq {
                label: "print_int".to_string(),
                arity: 1,
            },
            Instr::Retq,
        ];
        assert_eq!(patched(original.clone()), original);
    }

    #[test]
    fn test_stack_space_untouched() {
        let mut program = Program::new(vec![Instr::Movq {
            src: mem(-8),
            dst: mem(-16),
        }]);
        program.stack_space = 32;
        assert_eq!(patch_instructions(program).stack_space, 32);
    }
}
