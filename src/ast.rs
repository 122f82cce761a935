//! Source AST for the straight-line integer language.
//!
//! Produced by an external parser; this crate only consumes it. The
//! grammar is deliberately small: integer constants, variables, unary
//! negation, add/subtract, assignment, and calls to the two runtime
//! built-ins. Anything else a parser might hand us is rejected by the
//! passes with an unsupported-construct diagnostic.

use std::fmt;

use crate::span::Spanned;

/// Name of the built-in that reads an integer from standard input.
pub const READ_INT: &str = "read_int";

/// Name of the built-in that prints an integer. Only valid as a
/// statement-level call with exactly one argument.
pub const PRINT: &str = "print";

// ─── Expressions ──────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
}

/// An expression. `Int` and `Var` are the *atomic* expressions; after
/// operand normalization they are the only shapes operators and call
/// arguments receive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Int(i64),
    Var(String),
    Neg(Box<Spanned<Expr>>),
    Bin {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    /// A call by name. The only call admitted in expression position is
    /// the zero-argument `read_int`; `print` appears as a statement-level
    /// call only.
    Call {
        func: String,
        args: Vec<Spanned<Expr>>,
    },
}

impl Expr {
    /// Atomic expressions need no further evaluation: a constant or a
    /// direct variable reference.
    pub fn is_atomic(&self) -> bool {
        matches!(self, Expr::Int(_) | Expr::Var(_))
    }

    /// True for the zero-argument `read_int` built-in call.
    pub fn is_read_int(&self) -> bool {
        matches!(self, Expr::Call { func, args } if func == READ_INT && args.is_empty())
    }
}

// ─── Statements ───────────────────────────────────────────────────

/// A statement. A `print(e)` statement is an expression statement whose
/// expression is a call to `print`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    Expr(Spanned<Expr>),
    Assign {
        name: String,
        value: Spanned<Expr>,
    },
}

/// A program is an ordered sequence of statements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub stmts: Vec<Spanned<Stmt>>,
}

// ─── Display ──────────────────────────────────────────────────────

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(n) => write!(f, "{}", n),
            Expr::Var(x) => write!(f, "{}", x),
            Expr::Neg(e) => write!(f, "-{}", e.node),
            Expr::Bin { op, lhs, rhs } => {
                write!(f, "({} {} {})", lhs.node, op, rhs.node)
            }
            Expr::Call { func, args } => {
                write!(f, "{}(", func)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg.node)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expr(e) => write!(f, "{}", e.node),
            Stmt::Assign { name, value } => write!(f, "{} = {}", name, value.node),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.stmts {
            writeln!(f, "{}", stmt.node)?;
        }
        Ok(())
    }
}
