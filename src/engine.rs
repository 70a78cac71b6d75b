//! The expression compiler: a recursive-descent parser over the token
//! stream, plus the public entry points.
//!
//! Grammar, highest precedence innermost:
//!
//! ```text
//! list   = expr   {"," expr}
//! expr   = term   {("+"|"-") term}
//! term   = factor {("*"|"/"|"%") factor}
//! factor = power-chain with "^" (associativity per CompileOptions)
//! power  = {"+"|"-"} base
//! base   = NUMBER | VARIABLE | FUNCTION0 ["(" ")"] | FUNCTION1 factor
//!        | FUNCTION(n>=2) "(" expr {"," expr} ")" | CLOSURE(n) likewise
//!        | "(" list ")"
//! ```
//!
//! A unary-argument function takes a whole `factor` as its argument,
//! so it binds tighter than `*` but looser than `^`: `2 * sin x * 3`
//! is `(2 * sin(x)) * 3` and `sin x^2` is `sin(x^2)`.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::{CompileError, Result};
use crate::eval::{eval, fold};
use crate::functions;
use crate::lexer::{BinaryOp, Lexer, Token};
use crate::types::{Closure, ClosureContext, Expr, Function, PowAssoc, Variable};
use crate::Real;

/// Per-compilation parser options.
#[derive(Clone, Copy, Debug)]
pub struct CompileOptions {
    /// Associativity of the `^` operator.
    pub pow_assoc: PowAssoc,
    /// Collapse pure all-constant subtrees after parsing. On by
    /// default; turning it off changes nothing but evaluation cost.
    pub constant_folding: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            pow_assoc: PowAssoc::Left,
            constant_folding: true,
        }
    }
}

/// Compiles `expression` against the given bindings, with default
/// options (left-associative `^`, constant folding on).
///
/// Bindings are scanned in order and the first exact name match wins;
/// unmatched names fall back to the builtin table, so a binding can
/// shadow any builtin. On failure the error carries a 1-based byte
/// offset near the point the parser gave up.
pub fn compile(expression: &str, variables: &[Variable]) -> Result<Expr> {
    compile_with(expression, variables, CompileOptions::default())
}

/// Compiles `expression` with explicit [`CompileOptions`].
pub fn compile_with(
    expression: &str,
    variables: &[Variable],
    options: CompileOptions,
) -> Result<Expr> {
    let mut parser = Parser::new(expression, variables, options);
    let mut root = parser.list()?;
    if !matches!(parser.token, Token::End) {
        return Err(parser.error());
    }
    if options.constant_folding {
        fold(&mut root);
    }
    Ok(root)
}

/// One-shot convenience: compile without bindings, evaluate, drop.
pub fn interp(expression: &str) -> Result<Real> {
    let root = compile(expression, &[])?;
    Ok(eval(&root))
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    token: Token,
    options: CompileOptions,
}

/// What an identifier token is about to call.
enum Callee {
    Function(Function),
    Closure(Closure, ClosureContext),
}

impl Callee {
    fn arity(&self) -> usize {
        match self {
            Callee::Function(fun) => fun.arity(),
            Callee::Closure(fun, _) => fun.arity(),
        }
    }

    fn into_expr(self, pure: bool, args: Vec<Expr>) -> Expr {
        match self {
            Callee::Function(fun) => Expr::Function { fun, pure, args },
            Callee::Closure(fun, context) => Expr::Closure {
                fun,
                pure,
                args,
                context,
            },
        }
    }
}

fn negate(arg: Expr) -> Expr {
    Expr::Function {
        fun: Function::F1(functions::neg),
        pure: true,
        args: vec![arg],
    }
}

fn binary(fun: fn(Real, Real) -> Real, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Function {
        fun: Function::F2(fun),
        pure: true,
        args: vec![lhs, rhs],
    }
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str, variables: &'a [Variable], options: CompileOptions) -> Self {
        let mut lexer = Lexer::new(expression, variables);
        let token = lexer.next_token();
        Self {
            lexer,
            token,
            options,
        }
    }

    fn advance(&mut self) {
        self.token = self.lexer.next_token();
    }

    /// The error offset is the lexer cursor, i.e. just past the token
    /// the parser was looking at when it gave up.
    fn error(&self) -> CompileError {
        CompileError::at(self.lexer.pos)
    }

    /// `list = expr {"," expr}`, the sequencing operator. Each comma
    /// chains another expression through the pure `comma` intrinsic,
    /// whose value is its right operand.
    fn list(&mut self) -> Result<Expr> {
        let mut ret = self.expr()?;
        while matches!(self.token, Token::Sep) {
            self.advance();
            let rhs = self.expr()?;
            ret = binary(functions::comma, ret, rhs);
        }
        Ok(ret)
    }

    /// `expr = term {("+"|"-") term}`
    fn expr(&mut self) -> Result<Expr> {
        let mut ret = self.term()?;
        loop {
            let fun: fn(Real, Real) -> Real = match &self.token {
                Token::Infix(BinaryOp::Add) => functions::add,
                Token::Infix(BinaryOp::Sub) => functions::sub,
                _ => break,
            };
            self.advance();
            let rhs = self.term()?;
            ret = binary(fun, ret, rhs);
        }
        Ok(ret)
    }

    /// `term = factor {("*"|"/"|"%") factor}`
    fn term(&mut self) -> Result<Expr> {
        let mut ret = self.factor()?;
        loop {
            let fun: fn(Real, Real) -> Real = match &self.token {
                Token::Infix(BinaryOp::Mul) => functions::mul,
                Token::Infix(BinaryOp::Div) => functions::div,
                Token::Infix(BinaryOp::Mod) => functions::fmod,
                _ => break,
            };
            self.advance();
            let rhs = self.factor()?;
            ret = binary(fun, ret, rhs);
        }
        Ok(ret)
    }

    /// The `^` chain. Left mode is the classic left-leaning loop over
    /// `power` operands. Right mode folds the chain up right-to-left,
    /// and pulls the leading sign of the whole chain outside it, so
    /// `-a^b` is `-(a^b)` while an embedded signed operand stays
    /// local: `a^-b^c` is `a^((-b)^c)`.
    fn factor(&mut self) -> Result<Expr> {
        match self.options.pow_assoc {
            PowAssoc::Left => {
                let mut ret = self.power()?;
                while matches!(self.token, Token::Infix(BinaryOp::Pow)) {
                    self.advance();
                    let rhs = self.power()?;
                    ret = binary(functions::pow, ret, rhs);
                }
                Ok(ret)
            }
            PowAssoc::Right => {
                let mut sign = 1;
                while let Token::Infix(op) = &self.token {
                    match op {
                        BinaryOp::Add => {}
                        BinaryOp::Sub => sign = -sign,
                        _ => break,
                    }
                    self.advance();
                }
                let mut ret = self.base()?;
                let mut chain = Vec::new();
                // A pow() call heading a chain contributes its own
                // exponent: pow(a,b)^c groups as a^(b^c).
                if matches!(self.token, Token::Infix(BinaryOp::Pow)) {
                    ret = match ret {
                        Expr::Function {
                            fun: Function::F2(f),
                            pure: true,
                            args,
                        } if core::ptr::fn_addr_eq(f, functions::pow as fn(Real, Real) -> Real) => {
                            match <[Expr; 2]>::try_from(args) {
                                Ok([head, exponent]) => {
                                    chain.push(exponent);
                                    head
                                }
                                Err(args) => Expr::Function {
                                    fun: Function::F2(f),
                                    pure: true,
                                    args,
                                },
                            }
                        }
                        other => other,
                    };
                }
                while matches!(self.token, Token::Infix(BinaryOp::Pow)) {
                    self.advance();
                    chain.push(self.power()?);
                }
                if let Some(mut rhs) = chain.pop() {
                    while let Some(lhs) = chain.pop() {
                        rhs = binary(functions::pow, lhs, rhs);
                    }
                    ret = binary(functions::pow, ret, rhs);
                }
                if sign < 0 {
                    ret = negate(ret);
                }
                Ok(ret)
            }
        }
    }

    /// `power = {"+"|"-"} base`. Any run of signs collapses to its
    /// parity; a net minus wraps the operand in pure unary negation.
    fn power(&mut self) -> Result<Expr> {
        let mut sign = 1;
        while let Token::Infix(op) = &self.token {
            match op {
                BinaryOp::Add => {}
                BinaryOp::Sub => sign = -sign,
                _ => break,
            }
            self.advance();
        }
        let base = self.base()?;
        Ok(if sign < 0 { negate(base) } else { base })
    }

    fn base(&mut self) -> Result<Expr> {
        match self.token.clone() {
            Token::Number(value) => {
                self.advance();
                Ok(Expr::Constant(value))
            }
            Token::Cell(cell) => {
                self.advance();
                Ok(Expr::Variable(cell))
            }
            Token::Function { fun, pure } => self.call(Callee::Function(fun), pure),
            Token::Closure { fun, pure, context } => {
                self.call(Callee::Closure(fun, context), pure)
            }
            Token::Open => {
                self.advance();
                let inner = self.list()?;
                if !matches!(self.token, Token::Close) {
                    return Err(self.error());
                }
                self.advance();
                Ok(inner)
            }
            _ => Err(self.error()),
        }
    }

    /// Argument shapes by arity: nullary calls take optional empty
    /// parens; unary calls take a bare `factor`; everything else
    /// requires parens around exactly `arity` comma-separated
    /// expressions.
    fn call(&mut self, callee: Callee, pure: bool) -> Result<Expr> {
        let arity = callee.arity();
        self.advance();
        let mut args = Vec::with_capacity(arity);
        match arity {
            0 => {
                if matches!(self.token, Token::Open) {
                    self.advance();
                    if !matches!(self.token, Token::Close) {
                        return Err(self.error());
                    }
                    self.advance();
                }
            }
            1 => {
                args.push(self.factor()?);
            }
            _ => {
                if !matches!(self.token, Token::Open) {
                    return Err(self.error());
                }
                self.advance();
                args.push(self.expr()?);
                for _ in 1..arity {
                    if !matches!(self.token, Token::Sep) {
                        return Err(self.error());
                    }
                    self.advance();
                    args.push(self.expr()?);
                }
                if !matches!(self.token, Token::Close) {
                    return Err(self.error());
                }
                self.advance();
            }
        }
        Ok(callee.into_expr(pure, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;
    use alloc::rc::Rc;
    use core::cell::Cell;

    fn interp_right(expression: &str) -> Result<Real> {
        let options = CompileOptions {
            pow_assoc: PowAssoc::Right,
            ..CompileOptions::default()
        };
        Ok(eval(&compile_with(expression, &[], options)?))
    }

    #[test]
    fn test_precedence() {
        for (expression, expected) in [
            ("1+2*3", 7.0),
            ("2*3+1", 7.0),
            ("(1+2)*3", 9.0),
            ("2-3-4", -5.0),
            ("12/3/2", 2.0),
            ("2+3%2", 3.0),
            ("2^3*2", 16.0),
            ("2*3^2", 18.0),
            ("1+1/2", 1.5),
            ("(1+2)^2", 9.0),
        ] {
            assert_eq!(interp(expression).unwrap(), expected, "{expression}");
        }
    }

    #[test]
    fn test_unary_signs() {
        for (expression, expected) in [
            ("-5", -5.0),
            ("+5", 5.0),
            ("--5", 5.0),
            ("+-+-5", 5.0),
            ("-+--+5", -5.0),
            ("2-+-3", 5.0),
            ("2--3", 5.0),
        ] {
            assert_eq!(interp(expression).unwrap(), expected, "{expression}");
            assert_eq!(interp_right(expression).unwrap(), expected, "{expression}");
        }
    }

    #[test]
    fn test_power_left_associative_by_default() {
        assert_eq!(interp("2^3^2").unwrap(), 64.0); // (2^3)^2
        assert_eq!(interp("-3^2").unwrap(), 9.0); // (-3)^2
        assert_eq!(interp("pow(2,3)^2").unwrap(), 64.0);
        assert_eq!(interp("2^-2").unwrap(), 0.25);
    }

    #[test]
    fn test_power_right_associative_mode() {
        assert_eq!(interp_right("2^3^2").unwrap(), 512.0); // 2^(3^2)
        assert_eq!(interp_right("-3^2").unwrap(), -9.0); // -(3^2)
        assert_eq!(interp_right("pow(2,3)^2").unwrap(), 512.0);
        assert_eq!(interp_right("2^-3^2").unwrap(), 512.0); // 2^((-3)^2)
        assert_eq!(interp_right("-(3)^2").unwrap(), -9.0);
        assert_eq!(interp_right("(-3)^2").unwrap(), 9.0);
        assert_eq!(interp_right("2^-2").unwrap(), 0.25);
    }

    #[test]
    fn test_unary_function_binds_tighter_than_mul() {
        assert_eq!(interp("sin 0 * 2").unwrap(), 0.0);
        assert_eq!(interp("2 * sqrt 4 * 3").unwrap(), 12.0);
        assert_eq!(interp("sqrt 100 + 7").unwrap(), 17.0);
        // The bare argument stops at `+`, so this is sqrt(-4) + 6.
        assert!(interp("sqrt -4 + 6").unwrap().is_nan());
    }

    #[test]
    fn test_unary_function_takes_a_power_chain() {
        // The bare argument is a whole factor, so `^` binds inside it.
        assert_eq!(interp("sqrt 2^2").unwrap(), 2.0); // sqrt(4)
        assert_eq!(interp("sqrt -2^2").unwrap(), 2.0); // sqrt((-2)^2)
        assert_approx_eq!(interp_right("sin -2^2").unwrap(), functions::sin(-4.0));
        assert_approx_eq!(interp("sin -2^2").unwrap(), functions::sin(4.0));
    }

    #[test]
    fn test_nullary_function_parens_optional() {
        assert_approx_eq!(interp("pi").unwrap(), crate::constants::PI);
        assert_approx_eq!(interp("pi()").unwrap(), crate::constants::PI);
        assert_approx_eq!(interp("e^1").unwrap(), crate::constants::E);
        assert!(interp("pi(3)").is_err());
    }

    #[test]
    fn test_nary_function_calls() {
        assert_eq!(interp("pow(2,10)").unwrap(), 1024.0);
        assert_approx_eq!(interp("atan2(1,1)").unwrap(), crate::constants::PI / 4.0);
        assert_eq!(interp("ncr(5,2)").unwrap(), 10.0);
        assert_eq!(interp("npr(5,2)").unwrap(), 20.0);
        assert_eq!(interp("pow(2, 1+2)").unwrap(), 8.0);
    }

    #[test]
    fn test_nary_arity_is_mandatory() {
        assert!(interp("pow(2)").is_err());
        assert!(interp("pow(2,3,4)").is_err());
        assert!(interp("pow 2,3").is_err());
        assert!(interp("atan2(1)").is_err());
    }

    #[test]
    fn test_sequencing() {
        assert_eq!(interp("(1,2,3)").unwrap(), 3.0);
        assert_eq!(interp("pow(2, (1,3))").unwrap(), 8.0);
        assert_eq!(interp("1,2+3").unwrap(), 5.0);
        assert_eq!(interp("(1+1,2*3)").unwrap(), 6.0);
    }

    #[test]
    fn test_error_offsets() {
        // 1-based offset of the offending token's end.
        assert_eq!(interp("1+*2").unwrap_err().position(), 3);
        let err = interp("1+").unwrap_err();
        assert!(err.position() >= 2, "got {}", err.position());
        assert_eq!(interp("").unwrap_err().position(), 1);
        assert_eq!(interp(")").unwrap_err().position(), 1);
        assert_eq!(interp("(1+2").unwrap_err().position(), 4);
        assert!(interp("nosuch + 1").is_err());
        assert!(interp("1 $ 2").is_err());
    }

    #[test]
    fn test_failed_compile_returns_no_tree() {
        assert!(compile("1+", &[]).is_err());
        assert!(compile("2 3", &[]).is_err()); // two expressions in a row
    }

    #[test]
    fn test_compile_folds_constants() {
        let tree = compile("2+3*4", &[]).unwrap();
        assert!(matches!(tree, Expr::Constant(value) if value == 14.0));

        let tree = compile("sqrt(4)+pi", &[]).unwrap();
        assert!(matches!(tree, Expr::Constant(_)));
    }

    #[test]
    fn test_folding_can_be_disabled() {
        let options = CompileOptions {
            constant_folding: false,
            ..CompileOptions::default()
        };
        let tree = compile_with("2+3", &[], options).unwrap();
        assert!(matches!(&tree, Expr::Function { args, .. } if args.len() == 2));
        assert_eq!(eval(&tree), 5.0);
    }

    #[test]
    fn test_variables_are_not_folded() {
        let x = Rc::new(Cell::new(3.0));
        let vars = [Variable::cell("x", Rc::clone(&x))];
        let tree = compile("x*(2+2)", &vars).unwrap();
        assert!(!matches!(tree, Expr::Constant(_)));
        assert_eq!(eval(&tree), 12.0);
        x.set(10.0);
        assert_eq!(eval(&tree), 40.0);
    }

    #[test]
    fn test_binding_shadows_builtin() {
        let cell = Rc::new(Cell::new(0.5));
        let vars = [Variable::cell("sin", cell)];
        assert_eq!(eval(&compile("sin*2", &vars).unwrap()), 1.0);
    }

    #[test]
    fn test_nested_grouping() {
        assert_eq!(interp("((((5))))").unwrap(), 5.0);
        assert_eq!(interp("(5+(5))").unwrap(), 10.0);
    }
}
