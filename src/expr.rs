//! A small, sandboxed filter-expression matcher.
//!
//! The local backend evaluates textual filters such as `id == 2` or
//! `height > 3.5 and name != 'depot'` directly against feature properties.
//! The grammar is a fixed operator set: comparisons, boolean connectives,
//! parentheses, literals, and bare property names. Nothing else is
//! evaluated.

use crate::{Error, Result};
use serde_json::{Map, Value};
use std::{cmp::Ordering, str::FromStr};

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal(Value),

    /// A property lookup by name.
    Property(String),

    /// Logical negation.
    Not(Box<Expr>),

    /// Logical conjunction.
    And(Box<Expr>, Box<Expr>),

    /// Logical disjunction.
    Or(Box<Expr>, Box<Expr>),

    /// A comparison between two sub-expressions.
    Comparison {
        /// The comparison operator.
        op: ComparisonOp,

        /// The left-hand side.
        lhs: Box<Expr>,

        /// The right-hand side.
        rhs: Box<Expr>,
    },
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComparisonOp {
    /// `==`
    Eq,

    /// `!=`
    Ne,

    /// `<`
    Lt,

    /// `<=`
    Le,

    /// `>`
    Gt,

    /// `>=`
    Ge,
}

impl Expr {
    /// Evaluates this expression against a scope and reports whether the
    /// result is truthy.
    ///
    /// # Examples
    ///
    /// ```
    /// use geodb::Expr;
    /// use serde_json::Map;
    ///
    /// let expr: Expr = "id == 2".parse().unwrap();
    /// let mut scope = Map::new();
    /// let _ = scope.insert("id".to_string(), 2.into());
    /// assert!(expr.matches(&scope).unwrap());
    /// ```
    pub fn matches(&self, scope: &Map<String, Value>) -> Result<bool> {
        Ok(truthy(&self.evaluate(scope)?))
    }

    fn evaluate(&self, scope: &Map<String, Value>) -> Result<Value> {
        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Property(name) => scope.get(name).cloned().ok_or_else(|| {
                Error::FilterEvaluation(format!("property \"{name}\" is not defined"))
            }),
            Expr::Not(inner) => Ok(Value::Bool(!truthy(&inner.evaluate(scope)?))),
            Expr::And(lhs, rhs) => {
                if truthy(&lhs.evaluate(scope)?) {
                    Ok(Value::Bool(truthy(&rhs.evaluate(scope)?)))
                } else {
                    Ok(Value::Bool(false))
                }
            }
            Expr::Or(lhs, rhs) => {
                if truthy(&lhs.evaluate(scope)?) {
                    Ok(Value::Bool(true))
                } else {
                    Ok(Value::Bool(truthy(&rhs.evaluate(scope)?)))
                }
            }
            Expr::Comparison { op, lhs, rhs } => {
                let lhs = lhs.evaluate(scope)?;
                let rhs = rhs.evaluate(scope)?;
                compare(*op, &lhs, &rhs).map(Value::Bool)
            }
        }
    }
}

impl FromStr for Expr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Expr> {
        let tokens = tokenize(s)?;
        let mut parser = Parser {
            tokens,
            position: 0,
        };
        let expr = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            return Err(Error::InvalidFilter(format!(
                "unexpected trailing token: {token:?}"
            )));
        }
        Ok(expr)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn compare(op: ComparisonOp, lhs: &Value, rhs: &Value) -> Result<bool> {
    use ComparisonOp::*;

    let ordering = match (lhs, rhs) {
        (Value::Number(lhs), Value::Number(rhs)) => {
            match (lhs.as_f64(), rhs.as_f64()) {
                (Some(lhs), Some(rhs)) => lhs.partial_cmp(&rhs),
                _ => None,
            }
        }
        (Value::String(lhs), Value::String(rhs)) => Some(lhs.cmp(rhs)),
        (Value::Bool(lhs), Value::Bool(rhs)) => Some(lhs.cmp(rhs)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    };
    match ordering {
        Some(ordering) => Ok(match op {
            Eq => ordering == Ordering::Equal,
            Ne => ordering != Ordering::Equal,
            Lt => ordering == Ordering::Less,
            Le => ordering != Ordering::Greater,
            Gt => ordering == Ordering::Greater,
            Ge => ordering != Ordering::Less,
        }),
        // Equality across mismatched types is well-defined, ordering is not.
        None => match op {
            Eq => Ok(false),
            Ne => Ok(true),
            _ => Err(Error::FilterEvaluation(format!(
                "cannot order {lhs} and {rhs}"
            ))),
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    True,
    False,
    Null,
    LeftParen,
    RightParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                let _ = chars.next();
            }
            '(' => {
                let _ = chars.next();
                tokens.push(Token::LeftParen);
            }
            ')' => {
                let _ = chars.next();
                tokens.push(Token::RightParen);
            }
            '=' => {
                let _ = chars.next();
                if chars.peek() == Some(&'=') {
                    let _ = chars.next();
                }
                tokens.push(Token::Eq);
            }
            '!' => {
                let _ = chars.next();
                if chars.peek() == Some(&'=') {
                    let _ = chars.next();
                    tokens.push(Token::Ne);
                } else {
                    tokens.push(Token::Not);
                }
            }
            '<' => {
                let _ = chars.next();
                if chars.peek() == Some(&'=') {
                    let _ = chars.next();
                    tokens.push(Token::Le);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                let _ = chars.next();
                if chars.peek() == Some(&'=') {
                    let _ = chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '&' => {
                let _ = chars.next();
                if chars.next() != Some('&') {
                    return Err(Error::InvalidFilter("expected && operator".to_string()));
                }
                tokens.push(Token::And);
            }
            '|' => {
                let _ = chars.next();
                if chars.next() != Some('|') {
                    return Err(Error::InvalidFilter("expected || operator".to_string()));
                }
                tokens.push(Token::Or);
            }
            '\'' | '"' => {
                let quote = c;
                let _ = chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == quote => break,
                        Some(c) => s.push(c),
                        None => {
                            return Err(Error::InvalidFilter(
                                "unterminated string literal".to_string(),
                            ));
                        }
                    }
                }
                tokens.push(Token::Str(s));
            }
            '-' | '0'..='9' => {
                let mut s = String::new();
                s.push(c);
                let _ = chars.next();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        s.push(c);
                        let _ = chars.next();
                    } else {
                        break;
                    }
                }
                let number = s
                    .parse()
                    .map_err(|_| Error::InvalidFilter(format!("invalid number: {s}")))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut s = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        s.push(c);
                        let _ = chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(match s.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" | "none" => Token::Null,
                    _ => Token::Ident(s),
                });
            }
            c => {
                return Err(Error::InvalidFilter(format!("unexpected character: {c}")));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut expr = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            let _ = self.advance();
            let rhs = self.parse_and()?;
            expr = Expr::Or(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut expr = self.parse_not()?;
        while self.peek() == Some(&Token::And) {
            let _ = self.advance();
            let rhs = self.parse_not()?;
            expr = Expr::And(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.peek() == Some(&Token::Not) {
            let _ = self.advance();
            let inner = self.parse_not()?;
            Ok(Expr::Not(Box::new(inner)))
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let lhs = self.parse_primary()?;
        let op = match self.peek() {
            Some(Token::Eq) => ComparisonOp::Eq,
            Some(Token::Ne) => ComparisonOp::Ne,
            Some(Token::Lt) => ComparisonOp::Lt,
            Some(Token::Le) => ComparisonOp::Le,
            Some(Token::Gt) => ComparisonOp::Gt,
            Some(Token::Ge) => ComparisonOp::Ge,
            _ => return Ok(lhs),
        };
        let _ = self.advance();
        let rhs = self.parse_primary()?;
        Ok(Expr::Comparison {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(Expr::Property(name)),
            Some(Token::Number(n)) => {
                let number = serde_json::Number::from_f64(n)
                    .ok_or_else(|| Error::InvalidFilter(format!("invalid number: {n}")))?;
                Ok(Expr::Literal(Value::Number(number)))
            }
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Token::Null) => Ok(Expr::Literal(Value::Null)),
            Some(Token::LeftParen) => {
                let expr = self.parse_or()?;
                if self.advance() != Some(Token::RightParen) {
                    return Err(Error::InvalidFilter(
                        "expected closing parenthesis".to_string(),
                    ));
                }
                Ok(expr)
            }
            token => Err(Error::InvalidFilter(format!(
                "expected a value, got {token:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Expr;
    use crate::Error;
    use serde_json::{Map, Value, json};

    fn scope(pairs: &[(&str, Value)]) -> Map<String, Value> {
        let mut scope = Map::new();
        for (name, value) in pairs {
            let _ = scope.insert(name.to_string(), value.clone());
        }
        scope
    }

    #[test]
    fn compare_by_id() {
        let expr: Expr = "id == 2".parse().unwrap();
        assert!(expr.matches(&scope(&[("id", json!(2))])).unwrap());
        assert!(!expr.matches(&scope(&[("id", json!(3))])).unwrap());
    }

    #[test]
    fn string_literals_either_quote() {
        let expr: Expr = "name == 'park'".parse().unwrap();
        assert!(expr.matches(&scope(&[("name", json!("park"))])).unwrap());
        let expr: Expr = "name != \"park\"".parse().unwrap();
        assert!(expr.matches(&scope(&[("name", json!("depot"))])).unwrap());
    }

    #[test]
    fn boolean_connectives() {
        let expr: Expr = "height > 3.5 and name != 'depot'".parse().unwrap();
        let matching = scope(&[("height", json!(4.0)), ("name", json!("park"))]);
        let too_low = scope(&[("height", json!(2.0)), ("name", json!("park"))]);
        assert!(expr.matches(&matching).unwrap());
        assert!(!expr.matches(&too_low).unwrap());

        let expr: Expr = "height > 3.5 || name == 'park'".parse().unwrap();
        assert!(expr.matches(&too_low).unwrap());
    }

    #[test]
    fn negation_and_parentheses() {
        let expr: Expr = "not (id == 1 or id == 2)".parse().unwrap();
        assert!(expr.matches(&scope(&[("id", json!(3))])).unwrap());
        assert!(!expr.matches(&scope(&[("id", json!(2))])).unwrap());
    }

    #[test]
    fn single_equals_is_equality() {
        let expr: Expr = "id = 2".parse().unwrap();
        assert!(expr.matches(&scope(&[("id", json!(2))])).unwrap());
    }

    #[test]
    fn bare_property_is_truthy() {
        let expr: Expr = "active".parse().unwrap();
        assert!(expr.matches(&scope(&[("active", json!(true))])).unwrap());
        assert!(!expr.matches(&scope(&[("active", json!(""))])).unwrap());
    }

    #[test]
    fn null_comparison() {
        let expr: Expr = "owner == null".parse().unwrap();
        assert!(expr.matches(&scope(&[("owner", json!(null))])).unwrap());
        assert!(!expr.matches(&scope(&[("owner", json!("city"))])).unwrap());
    }

    #[test]
    fn negative_numbers() {
        let expr: Expr = "elevation < -10.5".parse().unwrap();
        assert!(expr.matches(&scope(&[("elevation", json!(-20))])).unwrap());
    }

    #[test]
    fn missing_property_is_an_error() {
        let expr: Expr = "missing == 1".parse().unwrap();
        assert!(matches!(
            expr.matches(&Map::new()).unwrap_err(),
            Error::FilterEvaluation(_)
        ));
    }

    #[test]
    fn mismatched_equality_is_false() {
        let expr: Expr = "id == '2'".parse().unwrap();
        assert!(!expr.matches(&scope(&[("id", json!(2))])).unwrap());
        let expr: Expr = "id != '2'".parse().unwrap();
        assert!(expr.matches(&scope(&[("id", json!(2))])).unwrap());
    }

    #[test]
    fn mismatched_ordering_is_an_error() {
        let expr: Expr = "id < 'abc'".parse().unwrap();
        assert!(matches!(
            expr.matches(&scope(&[("id", json!(2))])).unwrap_err(),
            Error::FilterEvaluation(_)
        ));
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            "name == 'unterminated".parse::<Expr>().unwrap_err(),
            Error::InvalidFilter(_)
        ));
        assert!(matches!(
            "id ==".parse::<Expr>().unwrap_err(),
            Error::InvalidFilter(_)
        ));
        assert!(matches!(
            "(id == 1".parse::<Expr>().unwrap_err(),
            Error::InvalidFilter(_)
        ));
        assert!(matches!(
            "id == 1 garbage ~".parse::<Expr>().unwrap_err(),
            Error::InvalidFilter(_)
        ));
    }
}
