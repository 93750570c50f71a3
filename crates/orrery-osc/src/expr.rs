//! Payload expression language
//!
//! Templated messages carry their payload as small arithmetic expressions
//! over named measurement inputs plus the reserved name `t`. Expressions
//! are parsed once into an [`Expr`] tree and evaluated once per dispatch
//! against a [`Bindings`] environment; evaluation has no side effects.
//!
//! Grammar: numeric literals, single- or double-quoted string literals,
//! named variables, `+ - * /`, unary minus, parentheses.

use std::collections::BTreeMap;

use orrery_core::{OrreryError, OrreryResult};

/// A value produced by expression evaluation
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Num(f64),
    Str(String),
}

impl Value {
    /// Numeric view, if this is a number
    #[inline]
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(v) => Some(*v),
            Value::Str(_) => None,
        }
    }
}

/// Name → value environment an expression evaluates against
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    values: BTreeMap<String, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Bindings::default()
    }

    /// Bind a name; rebinding replaces the previous value
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Bind a numeric value
    pub fn bind_num(&mut self, name: impl Into<String>, value: f64) {
        self.bind(name, Value::Num(value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// Binary operators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// A parsed payload expression
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Num(f64),
    Str(String),
    Var(String),
    Neg(Box<Expr>),
    Bin(BinOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parse `src` into an expression tree
    pub fn parse(src: &str) -> OrreryResult<Expr> {
        let tokens = tokenize(src)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expr()?;
        if parser.pos != parser.tokens.len() {
            return Err(OrreryError::ExprSyntax(format!(
                "trailing input after expression in {src:?}"
            )));
        }
        Ok(expr)
    }

    /// Evaluate against `env`. References to names absent from `env` fail
    /// with [`OrreryError::UnboundName`].
    pub fn eval(&self, env: &Bindings) -> OrreryResult<Value> {
        match self {
            Expr::Num(v) => Ok(Value::Num(*v)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Var(name) => env
                .get(name)
                .cloned()
                .ok_or_else(|| OrreryError::UnboundName(name.clone())),
            Expr::Neg(inner) => match inner.eval(env)? {
                Value::Num(v) => Ok(Value::Num(-v)),
                Value::Str(_) => Err(OrreryError::TypeMismatch(
                    "cannot negate a string".to_string(),
                )),
            },
            Expr::Bin(op, lhs, rhs) => {
                let l = lhs.eval(env)?;
                let r = rhs.eval(env)?;
                match (*op, l, r) {
                    (BinOp::Add, Value::Num(a), Value::Num(b)) => Ok(Value::Num(a + b)),
                    (BinOp::Sub, Value::Num(a), Value::Num(b)) => Ok(Value::Num(a - b)),
                    (BinOp::Mul, Value::Num(a), Value::Num(b)) => Ok(Value::Num(a * b)),
                    (BinOp::Div, Value::Num(a), Value::Num(b)) => Ok(Value::Num(a / b)),
                    (BinOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                    (op, _, _) => Err(OrreryError::TypeMismatch(format!(
                        "operator {op:?} needs numeric operands"
                    ))),
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Num(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(src: &str) -> OrreryResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
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
            '\'' | '"' => {
                let quote = c;
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != quote {
                    end += 1;
                }
                if end == chars.len() {
                    return Err(OrreryError::ExprSyntax(format!(
                        "unterminated string literal in {src:?}"
                    )));
                }
                tokens.push(Token::Str(chars[start..end].iter().collect()));
                i = end + 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text.parse::<f64>().map_err(|_| {
                    OrreryError::ExprSyntax(format!("bad numeric literal {text:?}"))
                })?;
                tokens.push(Token::Num(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(OrreryError::ExprSyntax(format!(
                    "unexpected character {other:?} in {src:?}"
                )))
            }
        }
    }
    Ok(tokens)
}

/// Recursive-descent parser over the token stream
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expr(&mut self) -> OrreryResult<Expr> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.term()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> OrreryResult<Expr> {
        let mut lhs = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.bump();
            let rhs = self.factor()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> OrreryResult<Expr> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.bump();
            return Ok(Expr::Neg(Box::new(self.factor()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> OrreryResult<Expr> {
        match self.bump() {
            Some(Token::Num(v)) => Ok(Expr::Num(v)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Ident(name)) => Ok(Expr::Var(name)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(OrreryError::ExprSyntax(
                        "expected closing parenthesis".to_string(),
                    )),
                }
            }
            other => Err(OrreryError::ExprSyntax(format!(
                "expected a value, found {other:?}"
            ))),
        }
    }
}
