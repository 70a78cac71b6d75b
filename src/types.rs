//! Core data structures: the expression tree, the arity-indexed
//! callable sums, and caller-supplied bindings.

use alloc::borrow::Cow;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::Cell;
use core::fmt;

use crate::Real;

/// Opaque context handed to a closure as its leading argument.
///
/// The engine never looks inside; the closure downcasts it back to
/// whatever concrete type the caller registered.
pub type ClosureContext = Rc<dyn Any>;

/// A host function, one variant per arity.
///
/// Encoding the arity in the type means the evaluator dispatches on
/// the variant and every invocation is a plain, correctly typed call.
#[derive(Clone, Copy)]
pub enum Function {
    F0(fn() -> Real),
    F1(fn(Real) -> Real),
    F2(fn(Real, Real) -> Real),
    F3(fn(Real, Real, Real) -> Real),
    F4(fn(Real, Real, Real, Real) -> Real),
    F5(fn(Real, Real, Real, Real, Real) -> Real),
    F6(fn(Real, Real, Real, Real, Real, Real) -> Real),
    F7(fn(Real, Real, Real, Real, Real, Real, Real) -> Real),
}

impl Function {
    /// Number of numeric arguments the function expects.
    pub fn arity(&self) -> usize {
        match self {
            Function::F0(_) => 0,
            Function::F1(_) => 1,
            Function::F2(_) => 2,
            Function::F3(_) => 3,
            Function::F4(_) => 4,
            Function::F5(_) => 5,
            Function::F6(_) => 6,
            Function::F7(_) => 7,
        }
    }
}

/// A host closure: like [`Function`], but the invocation receives the
/// registered [`ClosureContext`] ahead of the numeric arguments.
#[derive(Clone, Copy)]
pub enum Closure {
    C0(fn(&dyn Any) -> Real),
    C1(fn(&dyn Any, Real) -> Real),
    C2(fn(&dyn Any, Real, Real) -> Real),
    C3(fn(&dyn Any, Real, Real, Real) -> Real),
    C4(fn(&dyn Any, Real, Real, Real, Real) -> Real),
    C5(fn(&dyn Any, Real, Real, Real, Real, Real) -> Real),
    C6(fn(&dyn Any, Real, Real, Real, Real, Real, Real) -> Real),
    C7(fn(&dyn Any, Real, Real, Real, Real, Real, Real, Real) -> Real),
}

impl Closure {
    /// Number of numeric arguments, not counting the context.
    pub fn arity(&self) -> usize {
        match self {
            Closure::C0(_) => 0,
            Closure::C1(_) => 1,
            Closure::C2(_) => 2,
            Closure::C3(_) => 3,
            Closure::C4(_) => 4,
            Closure::C5(_) => 5,
            Closure::C6(_) => 6,
            Closure::C7(_) => 7,
        }
    }
}

/// A compiled expression tree node.
///
/// Trees are built by [`compile`](crate::compile), possibly rewritten
/// in place by constant folding, and released by `Drop`. Children are
/// owned, so the whole tree is freed depth-first when the root goes
/// out of scope.
#[derive(Clone)]
pub enum Expr {
    /// A literal or folded numeric value.
    Constant(Real),

    /// A bound variable: a live cell owned by the caller, re-read on
    /// every evaluation. The engine never writes through it.
    Variable(Rc<Cell<Real>>),

    /// A call to a host function. `pure` marks it safe to constant-fold.
    Function {
        fun: Function,
        pure: bool,
        args: Vec<Expr>,
    },

    /// A call to a host closure, with the context captured at compile
    /// time from the binding.
    Closure {
        fun: Closure,
        pure: bool,
        args: Vec<Expr>,
        context: ClosureContext,
    },
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(value) => write!(f, "{value:?}"),
            Expr::Variable(cell) => write!(f, "bound({:?})", cell.get()),
            Expr::Function { fun, args, .. } => write_call(f, 'f', fun.arity(), args),
            Expr::Closure { fun, args, .. } => write_call(f, 'c', fun.arity(), args),
        }
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, tag: char, arity: usize, args: &[Expr]) -> fmt::Result {
    write!(f, "{tag}{arity}(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg:?}")?;
    }
    write!(f, ")")
}

/// Associativity of the `^` operator, chosen per compilation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PowAssoc {
    /// `a^b^c` parses as `(a^b)^c` and `-a^b` as `(-a)^b`.
    #[default]
    Left,
    /// `a^b^c` parses as `a^(b^c)` and `-a^b` as `-(a^b)`.
    Right,
}

/// What a bound name resolves to.
#[derive(Clone)]
pub enum VarKind {
    /// A numeric cell; the tree reads its current value at each eval.
    Cell(Rc<Cell<Real>>),
    /// A host function of fixed arity.
    Function { fun: Function, pure: bool },
    /// A host closure of fixed arity plus its context.
    Closure {
        fun: Closure,
        pure: bool,
        context: ClosureContext,
    },
}

/// A caller-supplied binding of a name to a cell, function, or closure.
///
/// Bindings are consulted before the built-in table, so a binding can
/// shadow any builtin. The engine borrows them for the duration of
/// `compile` and never mutates them.
#[derive(Clone)]
pub struct Variable {
    pub name: Cow<'static, str>,
    pub kind: VarKind,
}

impl Variable {
    /// Binds `name` to a shared numeric cell.
    pub fn cell(name: impl Into<Cow<'static, str>>, cell: Rc<Cell<Real>>) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Cell(cell),
        }
    }

    /// Binds `name` to a function that may depend on external state.
    /// Impure functions are never constant-folded.
    pub fn function(name: impl Into<Cow<'static, str>>, fun: Function) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Function { fun, pure: false },
        }
    }

    /// Binds `name` to a pure function, eligible for constant folding.
    pub fn pure_function(name: impl Into<Cow<'static, str>>, fun: Function) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Function { fun, pure: true },
        }
    }

    /// Binds `name` to a closure and its context.
    pub fn closure(
        name: impl Into<Cow<'static, str>>,
        fun: Closure,
        context: ClosureContext,
    ) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Closure {
                fun,
                pure: false,
                context,
            },
        }
    }

    /// Binds `name` to a closure whose result depends only on its
    /// numeric arguments and (immutable) context.
    ///
    /// The purity flag is advisory: registering a closure as pure
    /// asserts that folding it over constant arguments is sound.
    pub fn pure_closure(
        name: impl Into<Cow<'static, str>>,
        fun: Closure,
        context: ClosureContext,
    ) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Closure {
                fun,
                pure: true,
                context,
            },
        }
    }
}
