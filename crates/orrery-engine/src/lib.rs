//! Orrery Engine - The real-time tick loop
//!
//! A dedicated worker thread advances an idealized logical clock at a fixed
//! rate and evaluates the scene's trigger entities on every tick:
//! - Logical position advances by exactly one period per tick; scheduling
//!   jitter shifts when a tick fires, never the value it produces
//! - Next-tick deadlines are absolute, so jitter cannot accumulate drift
//! - At most one tick is ever outstanding

pub mod config;
pub mod engine;
pub mod sched;

pub use config::*;
pub use engine::*;
pub use sched::*;
