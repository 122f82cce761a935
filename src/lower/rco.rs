//! Remove complex operands.
//!
//! Rewrites the source AST so every operator and call argument receives
//! an atomic expression (a constant or a variable reference). Compound
//! subexpressions are bound to fresh temporaries by `Assign` statements
//! emitted immediately before the statement that needed them, in
//! evaluation order: left operand bindings first, then right, then the
//! binding for the enclosing expression itself.

use crate::ast::{Expr, Program, Stmt, PRINT};
use crate::diagnostic::Diagnostic;
use crate::names::NameGen;
use crate::span::Spanned;

/// A fresh temporary paired with its initializing expression.
type Binding = (String, Spanned<Expr>);

/// Normalize every statement of `program`, preserving statement order.
pub fn remove_complex_operands(
    program: &Program,
    names: &mut NameGen,
) -> Result<Program, Diagnostic> {
    let mut stmts = Vec::with_capacity(program.stmts.len());
    for stmt in &program.stmts {
        stmts.extend(rco_stmt(stmt, names)?);
    }
    Ok(Program { stmts })
}

/// Normalize one statement into the binding statements it needs plus the
/// rewritten statement itself.
fn rco_stmt(stmt: &Spanned<Stmt>, names: &mut NameGen) -> Result<Vec<Spanned<Stmt>>, Diagnostic> {
    let (bindings, rewritten) = match &stmt.node {
        Stmt::Expr(e) => {
            // print(e) forces an atomic argument; the call itself stays a
            // statement and is never bound to a temporary.
            if let Expr::Call { func, args } = &e.node {
                if func == PRINT && args.len() == 1 {
                    let (arg, bindings) = rco_expr(&args[0], true, names)?;
                    let call = Spanned::new(
                        Expr::Call {
                            func: PRINT.to_string(),
                            args: vec![arg],
                        },
                        e.span,
                    );
                    return Ok(finish(bindings, Stmt::Expr(call), stmt));
                }
            }
            let (e, bindings) = rco_expr(e, false, names)?;
            (bindings, Stmt::Expr(e))
        }
        Stmt::Assign { name, value } => {
            let (value, bindings) = rco_expr(value, false, names)?;
            (
                bindings,
                Stmt::Assign {
                    name: name.clone(),
                    value,
                },
            )
        }
    };
    Ok(finish(bindings, rewritten, stmt))
}

/// Lower the collected bindings into `Assign` statements preceding the
/// rewritten statement.
fn finish(bindings: Vec<Binding>, rewritten: Stmt, original: &Spanned<Stmt>) -> Vec<Spanned<Stmt>> {
    let mut out = Vec::with_capacity(bindings.len() + 1);
    for (name, value) in bindings {
        let span = value.span;
        out.push(Spanned::new(Stmt::Assign { name, value }, span));
    }
    out.push(Spanned::new(rewritten, original.span));
    out
}

/// Normalize one expression.
///
/// Returns the (possibly rewritten) expression and the temporary bindings
/// it requires, in evaluation order. With `need_atomic` the result is
/// guaranteed atomic: compound results are bound to a fresh temporary and
/// the temporary reference is returned instead.
fn rco_expr(
    expr: &Spanned<Expr>,
    need_atomic: bool,
    names: &mut NameGen,
) -> Result<(Spanned<Expr>, Vec<Binding>), Diagnostic> {
    match &expr.node {
        Expr::Int(_) | Expr::Var(_) => Ok((expr.clone(), Vec::new())),

        Expr::Call { .. } if expr.node.is_read_int() => {
            // read_int has a side effect that must happen exactly once at
            // this point in the sequence, so an atomic context binds it.
            if need_atomic {
                let mut bindings = Vec::new();
                let atom = bind(expr.clone(), &mut bindings, names);
                Ok((atom, bindings))
            } else {
                Ok((expr.clone(), Vec::new()))
            }
        }
        Expr::Call { func, .. } => Err(Diagnostic::unsupported(
            format!("call to `{}` in expression position", func),
            expr.span,
        )),

        Expr::Neg(sub) => {
            // Operators never take compound operands.
            let (sub, mut bindings) = rco_expr(sub, true, names)?;
            let neg = Spanned::new(Expr::Neg(Box::new(sub)), expr.span);
            if need_atomic {
                let atom = bind(neg, &mut bindings, names);
                Ok((atom, bindings))
            } else {
                Ok((neg, bindings))
            }
        }

        Expr::Bin { op, lhs, rhs } => {
            let (lhs, mut bindings) = rco_expr(lhs, true, names)?;
            let (rhs, rhs_bindings) = rco_expr(rhs, true, names)?;
            bindings.extend(rhs_bindings);
            let bin = Spanned::new(
                Expr::Bin {
                    op: *op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                expr.span,
            );
            if need_atomic {
                let atom = bind(bin, &mut bindings, names);
                Ok((atom, bindings))
            } else {
                Ok((bin, bindings))
            }
        }
    }
}

/// Bind `expr` to a fresh temporary, record the binding, and return a
/// reference to the temporary.
fn bind(expr: Spanned<Expr>, bindings: &mut Vec<Binding>, names: &mut NameGen) -> Spanned<Expr> {
    let tmp = names.fresh();
    let span = expr.span;
    bindings.push((tmp.clone(), expr));
    Spanned::new(Expr::Var(tmp), span)
}
