//! Orrery OSC - The outbound message layer
//!
//! This crate turns live measurement values into dispatched packets:
//! - A small arithmetic expression language for payload templates
//! - Literal and templated message kinds (parse once, evaluate per dispatch)
//! - OSC 1.0 wire encoding
//! - A fire-and-forget UDP sink

pub mod expr;
pub mod message;
pub mod sink;
pub mod wire;

pub use expr::*;
pub use message::*;
pub use sink::*;
pub use wire::*;
