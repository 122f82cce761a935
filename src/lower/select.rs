//! Instruction selection.
//!
//! Maps each normalized statement to a short x86-64 instruction sequence,
//! leaving variables as symbolic `Arg::Var` operands for the home
//! assigner. Two operand-reuse folds avoid redundant moves:
//!
//!   - `x = -x` negates in place;
//!   - `x = x + a` / `x = a + x` / `x = x - a` add or subtract in place
//!     (addition folds on either side because it commutes; subtraction
//!     only when the left operand aliases the destination);
//!   - `x = a - x` negates in place and adds `a`, since moving `a` into
//!     the destination first would clobber the right operand.
//!
//! For the general cases the move ordering differs by operator: addition
//! moves the right operand first and adds the left, subtraction moves the
//! left first and subtracts the right. The distinction is deliberate and
//! pinned by tests; do not unify the two cases.

use crate::ast::{BinOp, Expr, Program, Stmt, PRINT, READ_INT};
use crate::diagnostic::Diagnostic;
use crate::span::Spanned;
use crate::x86::{self, Arg, Instr, ARG_REG, RETURN_REG};

/// Runtime label that prints the integer passed in the argument register.
pub const PRINT_INT_LABEL: &str = "print_int";

/// Runtime label that reads an integer into the return register.
pub const READ_INT_LABEL: &str = "read_int";

/// Select instructions for every statement of a normalized program.
pub fn select_instructions(program: &Program) -> Result<x86::Program, Diagnostic> {
    let mut instrs = Vec::new();
    for stmt in &program.stmts {
        select_stmt(stmt, &mut instrs)?;
    }
    Ok(x86::Program::new(instrs))
}

/// Map an atomic expression to an operand.
///
/// The operand normalizer guarantees only constants and variable
/// references reach this point; anything else is a defect upstream.
fn select_arg(expr: &Expr) -> Arg {
    match expr {
        Expr::Int(n) => Arg::Imm(*n),
        Expr::Var(x) => Arg::Var(x.clone()),
        other => unreachable!("non-atomic operand after normalization: {}", other),
    }
}

fn select_stmt(stmt: &Spanned<Stmt>, out: &mut Vec<Instr>) -> Result<(), Diagnostic> {
    match &stmt.node {
        Stmt::Expr(e) => select_expr_stmt(e, out),
        Stmt::Assign { name, value } => select_assign(name, value, out),
    }
}

/// Statement-level calls: `print(atom)` and a bare `read_int()` whose
/// result is discarded. Every other expression statement is rejected.
fn select_expr_stmt(expr: &Spanned<Expr>, out: &mut Vec<Instr>) -> Result<(), Diagnostic> {
    match &expr.node {
        Expr::Call { func, args } if func == PRINT && args.len() == 1 => {
            out.push(Instr::Movq {
                src: select_arg(&args[0].node),
                dst: Arg::Reg(ARG_REG),
            });
            out.push(Instr::Callq {
                label: PRINT_INT_LABEL.to_string(),
                arity: 1,
            });
            Ok(())
        }
        Expr::Call { func, args } if func == READ_INT && args.is_empty() => {
            out.push(Instr::Callq {
                label: READ_INT_LABEL.to_string(),
                arity: 0,
            });
            Ok(())
        }
        other => Err(Diagnostic::unsupported(
            format!("expression statement `{}`", other),
            expr.span,
        )),
    }
}

fn select_assign(
    name: &str,
    value: &Spanned<Expr>,
    out: &mut Vec<Instr>,
) -> Result<(), Diagnostic> {
    let dst = Arg::Var(name.to_string());
    match &value.node {
        Expr::Int(_) | Expr::Var(_) => {
            out.push(Instr::Movq {
                src: select_arg(&value.node),
                dst,
            });
            Ok(())
        }

        Expr::Call { .. } if value.node.is_read_int() => {
            out.push(Instr::Callq {
                label: READ_INT_LABEL.to_string(),
                arity: 0,
            });
            out.push(Instr::Movq {
                src: Arg::Reg(RETURN_REG),
                dst,
            });
            Ok(())
        }

        Expr::Neg(sub) => {
            // The destination already holds the operand: negate in place.
            if let Expr::Var(v) = &sub.node {
                if v == name {
                    out.push(Instr::Negq { dst });
                    return Ok(());
                }
            }
            out.push(Instr::Movq {
                src: select_arg(&sub.node),
                dst: dst.clone(),
            });
            out.push(Instr::Negq { dst });
            Ok(())
        }

        Expr::Bin { op, lhs, rhs } => {
            select_bin(name, *op, &lhs.node, &rhs.node, out);
            Ok(())
        }

        other => Err(Diagnostic::unsupported(
            format!("assignment of `{}`", other),
            value.span,
        )),
    }
}

fn select_bin(name: &str, op: BinOp, lhs: &Expr, rhs: &Expr, out: &mut Vec<Instr>) {
    let dst = Arg::Var(name.to_string());
    let aliases = |e: &Expr| matches!(e, Expr::Var(v) if v == name);

    let build = |src: Arg, dst: Arg| match op {
        BinOp::Add => Instr::Addq { src, dst },
        BinOp::Sub => Instr::Subq { src, dst },
    };

    if aliases(lhs) {
        // x = x op a: the destination already holds the left operand.
        out.push(build(select_arg(rhs), dst));
    } else if op == BinOp::Add && aliases(rhs) {
        // x = a + x: commutes, fold on the right operand too.
        out.push(build(select_arg(lhs), dst));
    } else if op == BinOp::Sub && aliases(rhs) {
        // x = a - x: a move would clobber the right operand, so negate in
        // place and add: -x + a = a - x.
        out.push(Instr::Negq { dst: dst.clone() });
        out.push(Instr::Addq {
            src: select_arg(lhs),
            dst,
        });
    } else {
        match op {
            BinOp::Add => {
                out.push(Instr::Movq {
                    src: select_arg(rhs),
                    dst: dst.clone(),
                });
                out.push(build(select_arg(lhs), dst));
            }
            BinOp::Sub => {
                out.push(Instr::Movq {
                    src: select_arg(lhs),
                    dst: dst.clone(),
                });
                out.push(build(select_arg(rhs), dst));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::x86::Reg;

    fn int(n: i64) -> Spanned<Expr> {
        Spanned::dummy(Expr::Int(n))
    }

    fn var(x: &str) -> Spanned<Expr> {
        Spanned::dummy(Expr::Var(x.to_string()))
    }

    fn bin(op: BinOp, lhs: Spanned<Expr>, rhs: Spanned<Expr>) -> Spanned<Expr> {
        Spanned::dummy(Expr::Bin {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn assign(name: &str, value: Spanned<Expr>) -> Spanned<Stmt> {
        Spanned::dummy(Stmt::Assign {
            name: name.to_string(),
            value,
        })
    }

    fn select(stmts: Vec<Spanned<Stmt>>) -> Vec<Instr> {
        select_instructions(&Program { stmts })
            .expect("selection should succeed")
            .instrs
    }

    fn render(instrs: &[Instr]) -> Vec<String> {
        instrs.iter().map(|i| format!("{}", i)).collect()
    }

    #[test]
    fn test_constant_assignment() {
        let instrs = select(vec![assign("x", int(5))]);
        assert_eq!(render(&instrs), ["movq $5, x"]);
    }

    #[test]
    fn test_add_moves_right_operand_first() {
        // x = 1 + 2 selects movq $2, x; addq $1, x.
        let instrs = select(vec![assign("x", bin(BinOp::Add, int(1), int(2)))]);
        assert_eq!(render(&instrs), ["movq $2, x", "addq $1, x"]);
    }

    #[test]
    fn test_sub_moves_left_operand_first() {
        let instrs = select(vec![assign("x", bin(BinOp::Sub, var("a"), int(3)))]);
        assert_eq!(render(&instrs), ["movq a, x", "subq $3, x"]);
    }

    #[test]
    fn test_sub_folds_when_left_aliases_destination() {
        // x = 10; x = x - 3 is two instructions total.
        let instrs = select(vec![
            assign("x", int(10)),
            assign("x", bin(BinOp::Sub, var("x"), int(3))),
        ]);
        assert_eq!(render(&instrs), ["movq $10, x", "subq $3, x"]);
    }

    #[test]
    fn test_sub_with_right_operand_aliasing_destination() {
        // x = 3 - x: a move of 3 into x would clobber the right operand,
        // so the selector negates in place and adds.
        let instrs = select(vec![assign("x", bin(BinOp::Sub, int(3), var("x")))]);
        assert_eq!(render(&instrs), ["negq x", "addq $3, x"]);
    }

    /// Evaluate a symbolic instruction sequence over variable state.
    /// Enough of an interpreter to check arithmetic selections.
    fn run(instrs: &[Instr]) -> std::collections::HashMap<String, i64> {
        let mut vars: std::collections::HashMap<String, i64> = Default::default();
        let read = |vars: &std::collections::HashMap<String, i64>, arg: &Arg| match arg {
            Arg::Imm(n) => *n,
            Arg::Var(x) => vars[x.as_str()],
            other => panic!("unexpected operand {}", other),
        };
        for instr in instrs {
            match instr {
                Instr::Movq {
                    src,
                    dst: Arg::Var(x),
                } => {
                    let v = read(&vars, src);
                    vars.insert(x.clone(), v);
                }
                Instr::Addq {
                    src,
                    dst: Arg::Var(x),
                } => {
                    let v = vars[x.as_str()] + read(&vars, src);
                    vars.insert(x.clone(), v);
                }
                Instr::Subq {
                    src,
                    dst: Arg::Var(x),
                } => {
                    let v = vars[x.as_str()] - read(&vars, src);
                    vars.insert(x.clone(), v);
                }
                Instr::Negq { dst: Arg::Var(x) } => {
                    let v = -vars[x.as_str()];
                    vars.insert(x.clone(), v);
                }
                other => panic!("unexpected instruction {}", other),
            }
        }
        vars
    }

    #[test]
    fn test_sub_right_alias_preserves_meaning() {
        // x = 7; x = 3 - x must leave -4 in x.
        let instrs = select(vec![
            assign("x", int(7)),
            assign("x", bin(BinOp::Sub, int(3), var("x"))),
        ]);
        assert_eq!(run(&instrs)["x"], -4);
    }

    #[test]
    fn test_fold_cases_preserve_meaning() {
        let instrs = select(vec![
            assign("x", int(10)),
            assign("x", bin(BinOp::Sub, var("x"), int(3))),
            assign("x", bin(BinOp::Add, int(5), var("x"))),
            assign("x", Spanned::dummy(Expr::Neg(Box::new(var("x"))))),
        ]);
        assert_eq!(run(&instrs)["x"], -12);
    }

    #[test]
    fn test_add_folds_on_either_operand() {
        let left = select(vec![assign("x", bin(BinOp::Add, var("x"), int(1)))]);
        assert_eq!(render(&left), ["addq $1, x"]);

        let right = select(vec![assign("x", bin(BinOp::Add, int(1), var("x")))]);
        assert_eq!(render(&right), ["addq $1, x"]);
    }

    #[test]
    fn test_neg_folds_in_place() {
        let instrs = select(vec![assign("x", Spanned::dummy(Expr::Neg(Box::new(var("x")))))]);
        assert_eq!(render(&instrs), ["negq x"]);
    }

    #[test]
    fn test_neg_general_case() {
        let instrs = select(vec![assign("y", Spanned::dummy(Expr::Neg(Box::new(var("x")))))]);
        assert_eq!(render(&instrs), ["movq x, y", "negq y"]);
    }

    #[test]
    fn test_assign_read_int_moves_return_register() {
        let instrs = select(vec![assign(
            "x",
            Spanned::dummy(Expr::Call {
                func: READ_INT.to_string(),
                args: vec![],
            }),
        )]);
        assert_eq!(render(&instrs), ["callq read_int", "movq %rax, x"]);
        assert_eq!(
            instrs[0],
            Instr::Callq {
                label: READ_INT_LABEL.to_string(),
                arity: 0,
            }
        );
    }

    #[test]
    fn test_bare_read_int_discards_result() {
        let instrs = select(vec![Spanned::dummy(Stmt::Expr(Spanned::dummy(
            Expr::Call {
                func: READ_INT.to_string(),
                args: vec![],
            },
        )))]);
        assert_eq!(render(&instrs), ["callq read_int"]);
    }

    #[test]
    fn test_print_uses_argument_register() {
        let instrs = select(vec![Spanned::dummy(Stmt::Expr(Spanned::dummy(
            Expr::Call {
                func: PRINT.to_string(),
                args: vec![var("y")],
            },
        )))]);
        assert_eq!(render(&instrs), ["movq y, %rdi", "callq print_int"]);
        assert_eq!(
            instrs[0],
            Instr::Movq {
                src: Arg::Var("y".to_string()),
                dst: Arg::Reg(Reg::Rdi),
            }
        );
    }

    #[test]
    fn test_straight_line_example() {
        // x = 5; y = -x; print(y)
        let instrs = select(vec![
            assign("x", int(5)),
            assign("y", Spanned::dummy(Expr::Neg(Box::new(var("x"))))),
            Spanned::dummy(Stmt::Expr(Spanned::dummy(Expr::Call {
                func: PRINT.to_string(),
                args: vec![var("y")],
            }))),
        ]);
        assert_eq!(
            render(&instrs),
            [
                "movq $5, x",
                "movq x, y",
                "negq y",
                "movq y, %rdi",
                "callq print_int",
            ]
        );
    }

    #[test]
    fn test_bare_value_statement_rejected() {
        let err = select_instructions(&Program {
            stmts: vec![Spanned::dummy(Stmt::Expr(int(5)))],
        })
        .unwrap_err();
        assert!(err.message.starts_with("unsupported construct"));
    }
}
