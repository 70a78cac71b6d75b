//! Built-in numeric intrinsics.
//!
//! Everything here is a plain `fn` so it can sit directly in an
//! expression tree node. Math goes through the `libm` crate, which
//! keeps the whole builtin set available without `std`. Division,
//! domain errors and overflow follow IEEE-754: anomalies come back as
//! NaN or infinity, never as an error.

use crate::types::Function;
use crate::Real;

// Operator intrinsics. The parser wires these to `+ - * / %` and to
// the unary sign and sequencing productions.

pub fn add(a: Real, b: Real) -> Real {
    a + b
}

pub fn sub(a: Real, b: Real) -> Real {
    a - b
}

pub fn mul(a: Real, b: Real) -> Real {
    a * b
}

pub fn div(a: Real, b: Real) -> Real {
    a / b
}

/// `%` has C `fmod` semantics: the result keeps the sign of `a`.
pub fn fmod(a: Real, b: Real) -> Real {
    a % b
}

pub fn neg(a: Real) -> Real {
    -a
}

/// The sequencing operator: evaluates both sides, yields the right.
pub fn comma(_: Real, b: Real) -> Real {
    b
}

// libm-backed builtins.

pub fn abs(a: Real) -> Real {
    libm::fabs(a)
}

pub fn acos(a: Real) -> Real {
    libm::acos(a)
}

pub fn asin(a: Real) -> Real {
    libm::asin(a)
}

pub fn atan(a: Real) -> Real {
    libm::atan(a)
}

pub fn atan2(y: Real, x: Real) -> Real {
    libm::atan2(y, x)
}

pub fn ceil(a: Real) -> Real {
    libm::ceil(a)
}

pub fn cos(a: Real) -> Real {
    libm::cos(a)
}

pub fn cosh(a: Real) -> Real {
    libm::cosh(a)
}

pub fn exp(a: Real) -> Real {
    libm::exp(a)
}

pub fn floor(a: Real) -> Real {
    libm::floor(a)
}

/// Natural logarithm.
pub fn ln(a: Real) -> Real {
    libm::log(a)
}

/// `log` is base-10 by default; the `nat-log` feature makes it natural.
#[cfg(feature = "nat-log")]
pub fn log(a: Real) -> Real {
    libm::log(a)
}

#[cfg(not(feature = "nat-log"))]
pub fn log(a: Real) -> Real {
    libm::log10(a)
}

pub fn log10(a: Real) -> Real {
    libm::log10(a)
}

pub fn pow(a: Real, b: Real) -> Real {
    libm::pow(a, b)
}

pub fn sin(a: Real) -> Real {
    libm::sin(a)
}

pub fn sinh(a: Real) -> Real {
    libm::sinh(a)
}

pub fn sqrt(a: Real) -> Real {
    libm::sqrt(a)
}

pub fn tan(a: Real) -> Real {
    libm::tan(a)
}

pub fn tanh(a: Real) -> Real {
    libm::tanh(a)
}

pub fn pi() -> Real {
    crate::constants::PI
}

pub fn e() -> Real {
    crate::constants::E
}

/// Factorial of `⌊a⌋`.
///
/// NaN for negative or NaN input, infinity once the integer product
/// overflows.
pub fn fac(a: Real) -> Real {
    if a.is_nan() || a < 0.0 {
        return Real::NAN;
    }
    if a > u32::MAX as Real {
        return Real::INFINITY;
    }
    let ua = a as u64;
    let mut result: u64 = 1;
    for i in 1..=ua {
        if i > u64::MAX / result {
            return Real::INFINITY;
        }
        result *= i;
    }
    result as Real
}

/// Binomial coefficient `C(n, r)` over the truncated arguments.
///
/// NaN when either argument is negative (or NaN) or `r > n`; infinity
/// on overflow of the iterative product. Uses the `r <-> n-r` symmetry
/// to keep the loop short.
pub fn ncr(n: Real, r: Real) -> Real {
    if n.is_nan() || r.is_nan() || n < 0.0 || r < 0.0 || n < r {
        return Real::NAN;
    }
    if n > u32::MAX as Real || r > u32::MAX as Real {
        return Real::INFINITY;
    }
    let un = n as u64;
    let mut ur = r as u64;
    if ur > un / 2 {
        ur = un - ur;
    }
    let mut result: u64 = 1;
    for i in 1..=ur {
        if result > u64::MAX / (un - ur + i) {
            return Real::INFINITY;
        }
        result *= un - ur + i;
        result /= i;
    }
    result as Real
}

/// Permutations: `P(n, r) = C(n, r) * r!`.
pub fn npr(n: Real, r: Real) -> Real {
    ncr(n, r) * fac(r)
}

/// The built-in table, in ascending name order for binary search.
/// Every entry is pure.
static BUILTINS: &[(&str, Function)] = &[
    ("abs", Function::F1(abs)),
    ("acos", Function::F1(acos)),
    ("asin", Function::F1(asin)),
    ("atan", Function::F1(atan)),
    ("atan2", Function::F2(atan2)),
    ("ceil", Function::F1(ceil)),
    ("cos", Function::F1(cos)),
    ("cosh", Function::F1(cosh)),
    ("e", Function::F0(e)),
    ("exp", Function::F1(exp)),
    ("fac", Function::F1(fac)),
    ("floor", Function::F1(floor)),
    ("ln", Function::F1(ln)),
    ("log", Function::F1(log)),
    ("log10", Function::F1(log10)),
    ("ncr", Function::F2(ncr)),
    ("npr", Function::F2(npr)),
    ("pi", Function::F0(pi)),
    ("pow", Function::F2(pow)),
    ("sin", Function::F1(sin)),
    ("sinh", Function::F1(sinh)),
    ("sqrt", Function::F1(sqrt)),
    ("tan", Function::F1(tan)),
    ("tanh", Function::F1(tanh)),
];

/// Looks up a builtin by its full name. A prefix of a stored name is
/// not a match.
pub(crate) fn find_builtin(name: &str) -> Option<Function> {
    BUILTINS
        .binary_search_by(|(probe, _)| (*probe).cmp(name))
        .ok()
        .map(|i| BUILTINS[i].1)
}
