//! Spectral index formula language
//!
//! Catalog formulas are plain arithmetic over named parameters:
//!
//! - `"(N - R)/(N + R)"` → NDVI
//! - `"g * (N - R) / (N + C1 * R - C2 * B + L)"` → EVI
//! - `"0.5 * (2.0 * N + 1 - (((2 * N + 1) ** 2) - 8 * (N - R)) ** 0.5)"` → MSAVI
//!
//! Supported: numbers (with optional exponent), identifiers, `+ - * /`,
//! `**` (right-associative, binds tighter than unary minus) and parentheses.

use gishn_core::{Error, Result};

/// A token in the parsed expression
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char), // +, -, *, /
    Pow,
    LParen,
    RParen,
}

/// A node in the expression AST
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Num(f64),
    Var(String),
    BinOp {
        op: char,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Pow(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
}

/// Tokenize a formula string
fn tokenize(formula: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = formula.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => {
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 2;
            }
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Op(chars[i]));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent: e.g. 1e-4, 2.5E3
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let num_str: String = chars[start..i].iter().collect();
                let num = num_str
                    .parse::<f64>()
                    .map_err(|_| Error::Formula(format!("invalid number: {}", num_str)))?;
                tokens.push(Token::Number(num));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            c => {
                return Err(Error::Formula(format!(
                    "unexpected character '{}' in formula",
                    c
                )));
            }
        }
    }

    Ok(tokens)
}

/// Recursive descent parser for arithmetic expressions
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    /// Parse a complete formula, rejecting trailing tokens.
    fn parse(mut self) -> Result<Expr> {
        let expr = self.parse_expr()?;
        match self.peek() {
            None => Ok(expr),
            Some(t) => Err(Error::Formula(format!("unexpected trailing token: {:?}", t))),
        }
    }

    /// Parse: expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;

        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            let op = *op;
            self.advance();
            let right = self.parse_term()?;
            left = Expr::BinOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse: term = unary (('*' | '/') unary)*
    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            let op = *op;
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::BinOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse: unary = ('-' | '+') unary | power
    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Op('+')) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    /// Parse: power = primary ('**' unary)?
    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;
        if let Some(Token::Pow) = self.peek() {
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(Expr::Pow(Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    /// Parse: primary = number | ident | '(' expr ')'
    fn parse_primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Num(n)),
            Some(Token::Ident(name)) => Ok(Expr::Var(name)),
            Some(Token::LParen) => {
                let expr = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(expr),
                    _ => Err(Error::Formula("expected closing parenthesis".into())),
                }
            }
            other => Err(Error::Formula(format!(
                "unexpected token in formula: {:?}",
                other
            ))),
        }
    }
}

/// Collect all identifiers referenced in an expression, first occurrence order
fn collect_idents(expr: &Expr, names: &mut Vec<String>) {
    match expr {
        Expr::Var(name) => {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        Expr::BinOp { left, right, .. } | Expr::Pow(left, right) => {
            collect_idents(left, names);
            collect_idents(right, names);
        }
        Expr::Neg(inner) => collect_idents(inner, names),
        Expr::Num(_) => {}
    }
}

fn apply(op: char, l: f64, r: f64) -> f64 {
    match op {
        '+' => l + r,
        '-' => l - r,
        '*' => l * r,
        '/' => {
            if r.abs() < 1e-10 {
                f64::NAN
            } else {
                l / r
            }
        }
        _ => f64::NAN,
    }
}

/// A parsed catalog formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
    idents: Vec<String>,
}

impl Formula {
    /// Parse a formula string.
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        let expr = Parser::new(tokens).parse()?;
        let mut idents = Vec::new();
        collect_idents(&expr, &mut idents);
        Ok(Self {
            source: source.to_string(),
            expr,
            idents,
        })
    }

    /// The original formula text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Identifiers referenced by the formula, in order of first use.
    pub fn identifiers(&self) -> &[String] {
        &self.idents
    }

    /// Bind identifiers to positions in `names`, producing an evaluator
    /// that reads values from a slice in the same order.
    pub fn bind(&self, names: &[String]) -> Result<BoundFormula> {
        fn lower(expr: &Expr, names: &[String]) -> Result<Slot> {
            Ok(match expr {
                Expr::Num(n) => Slot::Num(*n),
                Expr::Var(name) => {
                    let idx = names.iter().position(|n| n == name).ok_or_else(|| {
                        Error::Formula(format!("no value for '{}'", name))
                    })?;
                    Slot::Var(idx)
                }
                Expr::BinOp { op, left, right } => Slot::BinOp {
                    op: *op,
                    left: Box::new(lower(left, names)?),
                    right: Box::new(lower(right, names)?),
                },
                Expr::Pow(base, exp) => Slot::Pow(
                    Box::new(lower(base, names)?),
                    Box::new(lower(exp, names)?),
                ),
                Expr::Neg(inner) => Slot::Neg(Box::new(lower(inner, names)?)),
            })
        }

        Ok(BoundFormula {
            root: lower(&self.expr, names)?,
            arity: names.len(),
        })
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Num(f64),
    Var(usize),
    BinOp {
        op: char,
        left: Box<Slot>,
        right: Box<Slot>,
    },
    Pow(Box<Slot>, Box<Slot>),
    Neg(Box<Slot>),
}

fn eval_slot(slot: &Slot, values: &[f64]) -> f64 {
    match slot {
        Slot::Num(n) => *n,
        Slot::Var(i) => values.get(*i).copied().unwrap_or(f64::NAN),
        Slot::BinOp { op, left, right } => {
            apply(*op, eval_slot(left, values), eval_slot(right, values))
        }
        Slot::Pow(base, exp) => eval_slot(base, values).powf(eval_slot(exp, values)),
        Slot::Neg(inner) => -eval_slot(inner, values),
    }
}

/// A formula whose identifiers have been resolved to value positions.
#[derive(Debug, Clone)]
pub struct BoundFormula {
    root: Slot,
    arity: usize,
}

impl BoundFormula {
    /// Number of values expected by [`BoundFormula::eval`].
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Evaluate with values in binding order. Division by ~0 yields NaN.
    pub fn eval(&self, values: &[f64]) -> f64 {
        eval_slot(&self.root, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(formula: &str, names: &[&str], values: &[f64]) -> f64 {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        Formula::parse(formula)
            .unwrap()
            .bind(&names)
            .unwrap()
            .eval(values)
    }

    #[test]
    fn test_ndvi_formula() {
        let v = eval("(N - R)/(N + R)", &["N", "R"], &[0.8, 0.2]);
        assert!((v - 0.6).abs() < 1e-9, "NDVI should be 0.6, got {}", v);
    }

    #[test]
    fn test_evi_formula() {
        let v = eval(
            "g * (N - R) / (N + C1 * R - C2 * B + L)",
            &["g", "N", "R", "C1", "C2", "B", "L"],
            &[2.5, 0.8, 0.2, 6.0, 7.5, 0.1, 1.0],
        );
        let expected = 2.5 * 0.6 / (0.8 + 1.2 - 0.75 + 1.0);
        assert!((v - expected).abs() < 1e-9, "EVI should be {}, got {}", expected, v);
    }

    #[test]
    fn test_power_binds_tighter_than_unary_minus() {
        assert!((eval("-2 ** 2", &[], &[]) + 4.0).abs() < 1e-12);
        assert!((eval("2 ** -1", &[], &[]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_power_is_right_associative() {
        // 2 ** (3 ** 2) = 512, not (2 ** 3) ** 2 = 64
        assert!((eval("2 ** 3 ** 2", &[], &[]) - 512.0).abs() < 1e-9);
    }

    #[test]
    fn test_msavi_formula() {
        let (n, r) = (0.5_f64, 0.1_f64);
        let expected = 0.5 * (2.0 * n + 1.0 - ((2.0 * n + 1.0).powi(2) - 8.0 * (n - r)).sqrt());
        let v = eval(
            "0.5 * (2.0 * N + 1 - (((2 * N + 1) ** 2) - 8 * (N - R)) ** 0.5)",
            &["N", "R"],
            &[n, r],
        );
        assert!((v - expected).abs() < 1e-9);
    }

    #[test]
    fn test_scientific_notation() {
        assert!((eval("1e-3 * 2E2", &[], &[]) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_identifiers_in_first_use_order() {
        let f = Formula::parse("g * (N - R) / (N + C1 * R)").unwrap();
        assert_eq!(f.identifiers(), &["g", "N", "R", "C1"]);
    }

    #[test]
    fn test_division_by_zero_returns_nan() {
        assert!(eval("A / B", &["A", "B"], &[1.0, 0.0]).is_nan());
    }

    #[test]
    fn test_nan_propagates() {
        assert!(eval("A + 1", &["A"], &[f64::NAN]).is_nan());
    }

    #[test]
    fn test_invalid_formula_error() {
        assert!(matches!(Formula::parse("(N - "), Err(Error::Formula(_))));
        assert!(matches!(Formula::parse("N R"), Err(Error::Formula(_))));
        assert!(matches!(Formula::parse("N % R"), Err(Error::Formula(_))));
    }

    #[test]
    fn test_bind_missing_name_error() {
        let f = Formula::parse("N + R").unwrap();
        assert!(f.bind(&["N".to_string()]).is_err());
    }
}
