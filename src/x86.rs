//! x86-64 instruction model — the target of the lowering pipeline.
//!
//! The backend only needs a five-register surface: the argument and
//! return registers of the calling convention, the frame and stack
//! pointers, and one scratch register reserved for instruction patching.
//! Variables live in stack slots, never in registers.
//!
//! `Display` renders AT&T syntax; writing the final assembly file (label,
//! directives, linking) is a thin external step over these types.

use std::fmt;

// ─── Registers ────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reg {
    Rax,
    Rdi,
    Rbp,
    Rsp,
    R11,
}

/// Return-value register of the System V calling convention.
pub const RETURN_REG: Reg = Reg::Rax;

/// First-argument register of the System V calling convention.
pub const ARG_REG: Reg = Reg::Rdi;

/// Frame pointer; stack slots are addressed relative to it.
pub const FRAME_PTR: Reg = Reg::Rbp;

/// Stack pointer.
pub const STACK_PTR: Reg = Reg::Rsp;

/// Reserved for the instruction patcher's rewrites. Never holds a
/// variable, so patching cannot clobber live data.
pub const SCRATCH: Reg = Reg::R11;

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg::Rax => "rax",
            Reg::Rdi => "rdi",
            Reg::Rbp => "rbp",
            Reg::Rsp => "rsp",
            Reg::R11 => "r11",
        };
        write!(f, "%{}", name)
    }
}

// ─── Operands ─────────────────────────────────────────────────────

/// An instruction operand.
///
/// `Var` is a pre-allocation placeholder naming a source-level or
/// temporary variable; the home assigner replaces every `Var` with a
/// `Deref` into the stack frame, and none survive past that pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Arg {
    Imm(i64),
    Reg(Reg),
    /// Memory reference `offset(base)`.
    Deref(Reg, i64),
    Var(String),
}

impl Arg {
    /// True for memory-reference operands. x86-64 admits at most one per
    /// instruction.
    pub fn is_mem(&self) -> bool {
        matches!(self, Arg::Deref(..))
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Imm(n) => write!(f, "${}", n),
            Arg::Reg(r) => write!(f, "{}", r),
            Arg::Deref(base, offset) => write!(f, "{}({})", offset, base),
            Arg::Var(x) => write!(f, "{}", x),
        }
    }
}

// ─── Instructions ─────────────────────────────────────────────────

/// An x86-64 instruction.
///
/// `Jmp` is reserved for a future language with control flow; the
/// straight-line pipeline never emits it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instr {
    Movq { src: Arg, dst: Arg },
    Addq { src: Arg, dst: Arg },
    Subq { src: Arg, dst: Arg },
    Negq { dst: Arg },
    Callq { label: String, arity: u32 },
    Pushq { src: Arg },
    Popq { dst: Arg },
    Jmp { label: String },
    Retq,
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Movq { src, dst } => write!(f, "movq {}, {}", src, dst),
            Instr::Addq { src, dst } => write!(f, "addq {}, {}", src, dst),
            Instr::Subq { src, dst } => write!(f, "subq {}, {}", src, dst),
            Instr::Negq { dst } => write!(f, "negq {}", dst),
            Instr::Callq { label, .. } => write!(f, "callq {}", label),
            Instr::Pushq { src } => write!(f, "pushq {}", src),
            Instr::Popq { dst } => write!(f, "popq {}", dst),
            Instr::Jmp { label } => write!(f, "jmp {}", label),
            Instr::Retq => write!(f, "retq"),
        }
    }
}

// ─── Program ──────────────────────────────────────────────────────

/// An instruction sequence plus the frame bytes it needs.
///
/// `stack_space` is zero until the home assigner runs; afterwards it is
/// always a multiple of 16 (calling-convention stack alignment).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub instrs: Vec<Instr>,
    pub stack_space: u64,
}

impl Program {
    pub fn new(instrs: Vec<Instr>) -> Self {
        Self {
            instrs,
            stack_space: 0,
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.instrs {
            writeln!(f, "    {}", instr)?;
        }
        Ok(())
    }
}
