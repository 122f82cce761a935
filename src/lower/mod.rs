//! The lowering pipeline.
//!
//! Five passes run in a fixed order, each consuming the whole output of
//! the previous one:
//!
//! ```text
//! AST (Program)
//!     │
//!     ▼ rco        remove complex operands
//! AST, operands atomic
//!     │
//!     ▼ select     instruction selection
//! x86 with symbolic operands
//!     │
//!     ▼ homes      stack-slot allocation
//! x86, stack_space set
//!     │
//!     ▼ patch      addressing-mode legality
//! x86, legal operand forms
//!     │
//!     ▼ frame      prelude and conclusion
//! x86 (final)
//! ```
//!
//! Every pass is a pure function over its input program; the only state
//! is the fresh-name counter owned by one `lower_program` call, so
//! independent compilations never interact.

pub mod frame;
pub mod homes;
pub mod patch;
pub mod rco;
pub mod select;

use crate::ast;
use crate::diagnostic::Diagnostic;
use crate::names::NameGen;
use crate::x86;

pub use frame::add_prelude_and_conclusion;
pub use homes::assign_homes;
pub use patch::patch_instructions;
pub use rco::remove_complex_operands;
pub use select::select_instructions;

/// Run the full pipeline on a source program.
pub fn lower_program(program: &ast::Program) -> Result<x86::Program, Diagnostic> {
    let mut names = NameGen::new();
    let normalized = remove_complex_operands(program, &mut names)?;
    let selected = select_instructions(&normalized)?;
    let homed = assign_homes(selected);
    let patched = patch_instructions(homed);
    Ok(add_prelude_and_conclusion(patched))
}
