//! Arithmetic evaluator behind the calculator tool.
//!
//! Supports `+ - * / // **`, unary signs and parentheses. Integers stay
//! integral (128-bit) until true division, a negative exponent or an
//! integer overflow makes them floats, and floats print the way a REPL
//! would (`2.0`, `3.5`, `1e+16`).

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("malformed number '{0}'")]
    BadNumber(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token {0}")]
    UnexpectedToken(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("numeric overflow")]
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(v) => f.write_str(&format_float(v)),
        }
    }
}

fn format_float(v: f64) -> String {
    let magnitude = v.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        // 1.5e17 -> 1.5e+17, 1e-5 -> 1e-05
        let formatted = format!("{:e}", v);
        let Some((mantissa, exponent)) = formatted.split_once('e') else {
            return formatted;
        };
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        return format!("{}e{}{:0>2}", mantissa, sign, digits);
    }
    if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    DoubleStar,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{}", n),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::Slash => f.write_str("'/'"),
            Token::DoubleSlash => f.write_str("'//'"),
            Token::DoubleStar => f.write_str("'**'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if next == Some('*') => {
                tokens.push(Token::DoubleStar);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' if next == Some('/') => {
                tokens.push(Token::DoubleSlash);
                i += 2;
            }
            '/' => {
                tokens.push(Token::Slash);
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
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i < chars.len() && chars[i] == '.' {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(parse_number(&literal)?));
            }
            other => return Err(CalcError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

fn parse_number(literal: &str) -> Result<Number, CalcError> {
    let bad = || CalcError::BadNumber(literal.to_string());

    if literal.contains('.') {
        if literal == "." {
            return Err(bad());
        }
        return literal.parse::<f64>().map(Number::Float).map_err(|_| bad());
    }

    // Leading zeros are only allowed on zero itself.
    if literal.len() > 1 && literal.starts_with('0') && literal.bytes().any(|b| b != b'0') {
        return Err(bad());
    }
    match literal.parse::<i128>() {
        Ok(value) => Ok(Number::Int(value)),
        Err(_) => finite(literal.parse::<f64>().map_err(|_| bad())?),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Number, CalcError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value = add(value, self.term()?)?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value = sub(value, self.term()?)?;
                }
                _ => return Ok(value),
            }
        }
    }

    // term := factor (('*' | '/' | '//') factor)*
    fn term(&mut self) -> Result<Number, CalcError> {
        let mut value = self.factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value = mul(value, self.factor()?)?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    value = div(value, self.factor()?)?;
                }
                Some(Token::DoubleSlash) => {
                    self.advance();
                    value = floor_div(value, self.factor()?)?;
                }
                _ => return Ok(value),
            }
        }
    }

    // factor := ('+' | '-') factor | power
    fn factor(&mut self) -> Result<Number, CalcError> {
        match self.peek() {
            Some(Token::Plus) => {
                self.advance();
                self.factor()
            }
            Some(Token::Minus) => {
                self.advance();
                negate(self.factor()?)
            }
            _ => self.power(),
        }
    }

    // power := atom ('**' factor)?
    fn power(&mut self) -> Result<Number, CalcError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::DoubleStar) {
            self.advance();
            let exponent = self.factor()?;
            return pow(base, exponent);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Number, CalcError> {
        match self.advance() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    Some(other) => Err(CalcError::UnexpectedToken(other.to_string())),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(other) => Err(CalcError::UnexpectedToken(other.to_string())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

fn finite(v: f64) -> Result<Number, CalcError> {
    if v.is_finite() {
        Ok(Number::Float(v))
    } else {
        Err(CalcError::Overflow)
    }
}

/// Integer result, or the float rendition when it does not fit.
fn int_or_float(exact: Option<i128>, approx: impl FnOnce() -> f64) -> Result<Number, CalcError> {
    match exact {
        Some(value) => Ok(Number::Int(value)),
        None => finite(approx()),
    }
}

fn add(a: Number, b: Number) -> Result<Number, CalcError> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => int_or_float(x.checked_add(y), || x as f64 + y as f64),
        _ => finite(a.as_f64() + b.as_f64()),
    }
}

fn sub(a: Number, b: Number) -> Result<Number, CalcError> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => int_or_float(x.checked_sub(y), || x as f64 - y as f64),
        _ => finite(a.as_f64() - b.as_f64()),
    }
}

fn mul(a: Number, b: Number) -> Result<Number, CalcError> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => int_or_float(x.checked_mul(y), || x as f64 * y as f64),
        _ => finite(a.as_f64() * b.as_f64()),
    }
}

fn div(a: Number, b: Number) -> Result<Number, CalcError> {
    if b.is_zero() {
        return Err(CalcError::DivisionByZero);
    }
    finite(a.as_f64() / b.as_f64())
}

fn floor_div(a: Number, b: Number) -> Result<Number, CalcError> {
    if b.is_zero() {
        return Err(CalcError::DivisionByZero);
    }
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => {
            let exact = x.checked_div(y).map(|q| {
                let adjust = x % y != 0 && ((x < 0) != (y < 0));
                if adjust {
                    q - 1
                } else {
                    q
                }
            });
            int_or_float(exact, || (x as f64 / y as f64).floor())
        }
        _ => finite((a.as_f64() / b.as_f64()).floor()),
    }
}

fn negate(a: Number) -> Result<Number, CalcError> {
    match a {
        Number::Int(x) => int_or_float(x.checked_neg(), || -(x as f64)),
        Number::Float(f) => Ok(Number::Float(-f)),
    }
}

fn pow(base: Number, exponent: Number) -> Result<Number, CalcError> {
    if base.is_zero() && exponent.as_f64() < 0.0 {
        return Err(CalcError::DivisionByZero);
    }
    match (base, exponent) {
        (Number::Int(b), Number::Int(e)) if e >= 0 => {
            let exact = u32::try_from(e).ok().and_then(|e| b.checked_pow(e));
            int_or_float(exact, || (b as f64).powf(e as f64))
        }
        _ => finite(base.as_f64().powf(exponent.as_f64())),
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<Number, CalcError> {
    let mut parser = Parser {
        tokens: tokenize(expression)?,
        pos: 0,
    };
    let value = parser.expr()?;
    match parser.advance() {
        None => Ok(value),
        Some(extra) => Err(CalcError::UnexpectedToken(extra.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str) -> String {
        evaluate(expr).map(|n| n.to_string()).unwrap_or_else(|e| format!("error: {e}"))
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(eval("2 + 3 * 4"), "14");
        assert_eq!(eval("(2 + 3) * 4"), "20");
        assert_eq!(eval("10 - 4 - 3"), "3");
        assert_eq!(eval("2 ** 3 ** 2"), "512");
        assert_eq!(eval("-2 ** 2"), "-4");
    }

    #[test]
    fn test_division_produces_floats() {
        assert_eq!(eval("7 / 2"), "3.5");
        assert_eq!(eval("4 / 2"), "2.0");
        assert_eq!(eval("7 // 2"), "3");
        assert_eq!(eval("-7 // 2"), "-4");
        assert_eq!(eval("7.5 // 2"), "3.0");
        assert_eq!(eval("2 ** -1"), "0.5");
        assert_eq!(eval("0.1 + 0.2"), "0.30000000000000004");
    }

    #[test]
    fn test_float_literals() {
        assert_eq!(eval(".5 + 5."), "5.5");
        assert_eq!(eval("1.25 * 4"), "5.0");
        assert_eq!(eval("10000000000000000.0"), "1e+16");
        assert_eq!(eval("1 / 100000"), "1e-05");
    }

    #[test]
    fn test_large_integers_stay_exact() {
        assert_eq!(eval("9223372036854775807 + 1"), "9223372036854775808");
        assert_eq!(eval("2 ** 100"), "1267650600228229401496703205376");
        assert_eq!(eval("99999999999 * 99999999999"), "9999999999800000000001");
        assert_eq!(eval("-(2 ** 100) // 3"), "-422550200076076467165567735126");
    }

    #[test]
    fn test_integers_beyond_128_bits_become_floats() {
        assert_eq!(eval("2 ** 200"), "1.6069380442589903e+60");
        assert_eq!(eval("2 ** 127 * 2"), "3.402823669209385e+38");
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval("1 / 0"), "error: division by zero");
        assert_eq!(eval("0 ** -1"), "error: division by zero");
        assert_eq!(eval("2 3"), "error: unexpected token 3");
        assert_eq!(eval("(1 + 2"), "error: unexpected end of expression");
        assert_eq!(eval("007"), "error: malformed number '007'");
        assert_eq!(eval("10 ** 400"), "error: numeric overflow");
        assert!(eval("1..2").starts_with("error"));
        assert!(eval("").starts_with("error"));
    }
}
