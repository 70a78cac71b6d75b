#![cfg_attr(not(test), no_std)]
#![doc = r#"
# texpr

A minimal, embeddable math expression compiler and evaluator for Rust.

texpr turns a textual arithmetic expression into an owned expression
tree, constant-folds every pure subtree, and evaluates the tree on
demand. Names in the expression can be bound to live numeric cells,
host functions of up to seven arguments, or closures carrying an
opaque context; bound cells are re-read on every evaluation, so one
compiled tree can be evaluated many times against changing inputs.

The crate is `no_std` (with `alloc`) and uses [`libm`] for all
built-in math, so it works unchanged on embedded targets.

## Quick start

```rust
let value = texpr::interp("sqrt 100 + 7").unwrap();
assert_eq!(value, 17.0);

// Compile errors carry a single 1-based byte offset.
let err = texpr::interp("1+*2").unwrap_err();
assert_eq!(err.position(), 3);
```

## Variables

Bound variables are shared `Cell`s. The tree holds a reference to the
cell, not a snapshot of its value:

```rust
use std::cell::Cell;
use std::rc::Rc;
use texpr::{compile, eval, Variable};

let x = Rc::new(Cell::new(3.0));
let y = Rc::new(Cell::new(4.0));
let vars = [
    Variable::cell("x", Rc::clone(&x)),
    Variable::cell("y", Rc::clone(&y)),
];

let tree = compile("x*(2+y)", &vars).unwrap();
assert_eq!(eval(&tree), 18.0);

x.set(5.0);
assert_eq!(eval(&tree), 30.0);
```

## Custom functions

Host functions are plain `fn` pointers, one callable variant per arity
(0 through 7). Functions registered as pure participate in constant
folding:

```rust
use texpr::{compile, eval, Function, Variable};

fn halve(a: f64) -> f64 {
    a / 2.0
}

let vars = [Variable::pure_function("halve", Function::F1(halve))];
assert_eq!(eval(&compile("halve(10) + 1", &vars).unwrap()), 6.0);
```

## Closures

A closure is a host function that additionally receives a
caller-supplied opaque context as its leading argument:

```rust
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;
use texpr::{compile, eval, Closure, Real, Variable};

fn scaled(ctx: &dyn Any, a: Real) -> Real {
    ctx.downcast_ref::<Cell<Real>>()
        .map_or(Real::NAN, |gain| gain.get() * a)
}

let gain = Rc::new(Cell::new(2.0));
let vars = [Variable::closure("scaled", Closure::C1(scaled), gain.clone())];

let tree = compile("scaled(21)", &vars).unwrap();
assert_eq!(eval(&tree), 42.0);

gain.set(0.5);
assert_eq!(eval(&tree), 10.5);
```

## Power associativity

`^` is left-associative by default; right associativity (with the
conventional `-a^b == -(a^b)` sign handling) is a parser option:

```rust
use texpr::{compile_with, eval, interp, CompileOptions, PowAssoc};

assert_eq!(interp("-3^2").unwrap(), 9.0);

let right = CompileOptions {
    pow_assoc: PowAssoc::Right,
    ..CompileOptions::default()
};
assert_eq!(eval(&compile_with("-3^2", &[], right).unwrap()), -9.0);
```

## Grammar

```text
list   = expr   {"," expr}
expr   = term   {("+"|"-") term}
term   = factor {("*"|"/"|"%") factor}
factor = {"+"|"-"} base {"^" ...}
base   = number | variable | function
       | "(" list ")"
```

Unary-argument functions bind without parentheses and tighter than
multiplication: `2 * sin x * 3` is `(2 * sin(x)) * 3`. The comma is a
sequencing operator whose value is its right operand: `(1,2,3)` is `3`.

Built-in functions (all pure): `abs`, `acos`, `asin`, `atan`, `atan2`,
`ceil`, `cos`, `cosh`, `e`, `exp`, `fac`, `floor`, `ln`, `log`,
`log10`, `ncr`, `npr`, `pi`, `pow`, `sin`, `sinh`, `sqrt`, `tan`,
`tanh`. `log` means base-10 unless the `nat-log` feature is enabled.

Runtime anomalies are never errors: division by zero, domain errors
and overflow follow IEEE-754 and the combinatorial builtins report
overflow as infinity. Only compilation can fail.
"#]

extern crate alloc;

pub mod engine;
pub mod error;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod types;

pub use engine::{compile, compile_with, interp, CompileOptions};
pub use error::{CompileError, Result};
pub use eval::eval;
pub use functions::*;
pub use types::*;

/// The numeric type of the engine: every value is an IEEE-754 double.
pub type Real = f64;

pub mod constants {
    use super::Real;

    pub const PI: Real = core::f64::consts::PI;
    pub const E: Real = core::f64::consts::E;
    pub const TEST_PRECISION: Real = 1e-10;
}

/// Asserts that two floating point values are approximately equal.
///
/// NaN compares equal to NaN and same-signed infinities compare equal,
/// which is what expression tests want.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr $(,)?) => {
        $crate::assert_approx_eq!($left, $right, $crate::constants::TEST_PRECISION)
    };
    ($left:expr, $right:expr, $epsilon:expr $(,)?) => {{
        let left_val: $crate::Real = $left;
        let right_val: $crate::Real = $right;
        if left_val.is_nan() && right_val.is_nan() {
            // NaN == NaN for our purposes
        } else if left_val.is_infinite()
            && right_val.is_infinite()
            && left_val.is_sign_positive() == right_val.is_sign_positive()
        {
            // Same-signed infinities are equal
        } else {
            assert!(
                (left_val - right_val).abs() < $epsilon,
                "assertion failed: `(left ≈ right)` (left: `{}`, right: `{}`, epsilon: `{}`)",
                left_val,
                right_val,
                $epsilon
            );
        }
    }};
}
