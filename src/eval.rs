//! Tree evaluation and constant folding.

use crate::types::{Closure, Expr, Function};
use crate::Real;

/// Evaluates a compiled tree.
///
/// Bound cells are re-read on every call, so repeated evaluations of
/// one tree observe updated bindings. Arguments are evaluated first to
/// last; that order is observable through impure closures and is part
/// of the contract.
///
/// Runtime anomalies never fail: they come back as NaN or infinity.
/// A hand-built node whose child count does not match its declared
/// arity evaluates to NaN.
pub fn eval(expr: &Expr) -> Real {
    match expr {
        Expr::Constant(value) => *value,
        Expr::Variable(cell) => cell.get(),
        Expr::Function { fun, args, .. } => {
            if args.len() != fun.arity() {
                return Real::NAN;
            }
            match *fun {
                Function::F0(f) => f(),
                Function::F1(f) => f(eval(&args[0])),
                Function::F2(f) => f(eval(&args[0]), eval(&args[1])),
                Function::F3(f) => f(eval(&args[0]), eval(&args[1]), eval(&args[2])),
                Function::F4(f) => f(
                    eval(&args[0]),
                    eval(&args[1]),
                    eval(&args[2]),
                    eval(&args[3]),
                ),
                Function::F5(f) => f(
                    eval(&args[0]),
                    eval(&args[1]),
                    eval(&args[2]),
                    eval(&args[3]),
                    eval(&args[4]),
                ),
                Function::F6(f) => f(
                    eval(&args[0]),
                    eval(&args[1]),
                    eval(&args[2]),
                    eval(&args[3]),
                    eval(&args[4]),
                    eval(&args[5]),
                ),
                Function::F7(f) => f(
                    eval(&args[0]),
                    eval(&args[1]),
                    eval(&args[2]),
                    eval(&args[3]),
                    eval(&args[4]),
                    eval(&args[5]),
                    eval(&args[6]),
                ),
            }
        }
        Expr::Closure {
            fun, args, context, ..
        } => {
            if args.len() != fun.arity() {
                return Real::NAN;
            }
            let ctx = context.as_ref();
            match *fun {
                Closure::C0(f) => f(ctx),
                Closure::C1(f) => f(ctx, eval(&args[0])),
                Closure::C2(f) => f(ctx, eval(&args[0]), eval(&args[1])),
                Closure::C3(f) => f(ctx, eval(&args[0]), eval(&args[1]), eval(&args[2])),
                Closure::C4(f) => f(
                    ctx,
                    eval(&args[0]),
                    eval(&args[1]),
                    eval(&args[2]),
                    eval(&args[3]),
                ),
                Closure::C5(f) => f(
                    ctx,
                    eval(&args[0]),
                    eval(&args[1]),
                    eval(&args[2]),
                    eval(&args[3]),
                    eval(&args[4]),
                ),
                Closure::C6(f) => f(
                    ctx,
                    eval(&args[0]),
                    eval(&args[1]),
                    eval(&args[2]),
                    eval(&args[3]),
                    eval(&args[4]),
                    eval(&args[5]),
                ),
                Closure::C7(f) => f(
                    ctx,
                    eval(&args[0]),
                    eval(&args[1]),
                    eval(&args[2]),
                    eval(&args[3]),
                    eval(&args[4]),
                    eval(&args[5]),
                    eval(&args[6]),
                ),
            }
        }
    }
}

/// Constant folding: collapses, in place, every pure call whose
/// children all reduced to constants.
///
/// Impure calls are never folded (they may depend on external state),
/// but their children still are, so after this pass no pure node
/// anywhere in the tree has all-constant children. Folding only
/// pre-computes work the evaluator would do anyway; results are
/// bitwise identical with or without it.
pub(crate) fn fold(expr: &mut Expr) {
    let collapsible = match expr {
        Expr::Constant(_) | Expr::Variable(_) => false,
        Expr::Function { pure, args, .. } | Expr::Closure { pure, args, .. } => {
            for arg in args.iter_mut() {
                fold(arg);
            }
            *pure && args.iter().all(|arg| matches!(arg, Expr::Constant(_)))
        }
    };
    if collapsible {
        *expr = Expr::Constant(eval(expr));
    }
}
