//! rill — a nanopass backend lowering a straight-line integer language
//! to x86-64.
//!
//! The crate consumes a ready-made AST (parsing is external) and produces
//! an x86-64 instruction-sequence value ready for textual rendering via
//! `Display`; assembling and linking are external steps. The source
//! language has integer constants, variables, unary negation, add and
//! subtract, assignment, and the `read_int`/`print_int` runtime calls.
//! No control flow, no user functions, no type checker.

pub mod ast;
pub mod diagnostic;
pub mod lower;
pub mod names;
pub mod span;
pub mod x86;

pub use diagnostic::Diagnostic;
pub use names::NameGen;
pub use span::{Span, Spanned};

/// Compile a source program to its final x86-64 instruction sequence.
///
/// The single failure mode is an unsupported construct: an input shape
/// outside the grammar a pass admits. Compilation then aborts with a
/// diagnostic; there is no partial output.
pub fn compile(program: &ast::Program) -> Result<x86::Program, Diagnostic> {
    lower::lower_program(program)
}
