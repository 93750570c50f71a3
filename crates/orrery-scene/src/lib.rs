//! Orrery Scene - The scene registry
//!
//! A scene owns every entity of one kinetic diagram:
//! - Sequential per-class identifier assignment
//! - Rank validation on registration, rank tightening in the factory
//! - Lookup by identifier, class and rank
//! - Loading from pre-parsed descriptor documents

pub mod loader;
pub mod registry;

pub use loader::*;
pub use registry::*;
