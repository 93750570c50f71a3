//! Outbound message templates
//!
//! Two kinds of sendable message: a literal one whose address and payload
//! never change, and a templated one whose payload is a list of expression
//! strings parsed once and evaluated against a binding environment on every
//! dispatch. Re-parsing happens exactly when the payload list is replaced.

use orrery_core::OrreryResult;

use crate::expr::{Bindings, Expr, Value};

/// A fixed address with a fixed payload, constant in `t`
#[derive(Clone, Debug)]
pub struct LiteralMessage {
    path: Vec<u8>,
    data: Vec<Value>,
}

impl LiteralMessage {
    pub fn new(path: impl Into<Vec<u8>>, data: Vec<Value>) -> Self {
        LiteralMessage {
            path: path.into(),
            data,
        }
    }

    pub fn path(&self) -> &[u8] {
        &self.path
    }

    pub fn data(&self) -> &[Value] {
        &self.data
    }

    pub fn set_data(&mut self, data: Vec<Value>) {
        self.data = data;
    }
}

/// A fixed address with payload expressions evaluated per dispatch
#[derive(Clone, Debug)]
pub struct TemplatedMessage {
    path: Vec<u8>,
    /// Expression strings, in payload order
    sources: Vec<String>,
    /// Parse results cached at construction / replacement time
    parsed: Vec<Expr>,
}

impl TemplatedMessage {
    /// Parse `exprs` once and keep the trees for evaluation
    pub fn new(path: impl Into<Vec<u8>>, exprs: Vec<String>) -> OrreryResult<Self> {
        let parsed = exprs
            .iter()
            .map(|src| Expr::parse(src))
            .collect::<OrreryResult<Vec<_>>>()?;
        Ok(TemplatedMessage {
            path: path.into(),
            sources: exprs,
            parsed,
        })
    }

    pub fn path(&self) -> &[u8] {
        &self.path
    }

    /// The expression strings backing the payload
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Replace the payload expressions; this is the only point where
    /// re-parsing happens
    pub fn set_data(&mut self, exprs: Vec<String>) -> OrreryResult<()> {
        let parsed = exprs
            .iter()
            .map(|src| Expr::parse(src))
            .collect::<OrreryResult<Vec<_>>>()?;
        self.sources = exprs;
        self.parsed = parsed;
        Ok(())
    }

    /// Evaluate the payload against `env`, in registration order
    pub fn data(&self, env: &Bindings) -> OrreryResult<Vec<Value>> {
        self.parsed.iter().map(|e| e.eval(env)).collect()
    }
}

/// Something sendable
#[derive(Clone, Debug)]
pub enum Message {
    Literal(LiteralMessage),
    Templated(TemplatedMessage),
}

impl Message {
    /// The outbound address; fixed for both kinds
    pub fn path(&self) -> &[u8] {
        match self {
            Message::Literal(m) => m.path(),
            Message::Templated(m) => m.path(),
        }
    }

    /// Payload values at the environment's time
    pub fn data(&self, env: &Bindings) -> OrreryResult<Vec<Value>> {
        match self {
            Message::Literal(m) => Ok(m.data().to_vec()),
            Message::Templated(m) => m.data(env),
        }
    }
}
