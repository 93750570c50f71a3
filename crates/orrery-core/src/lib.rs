//! Orrery Core - Fundamental types and primitives
//!
//! This crate defines the substrate the rest of the workspace builds on:
//! - The error taxonomy and result alias
//! - Planar geometry: points, polylines, segment intersection
//! - Unit-interval helpers for perimeter fractions and revolutions

pub mod error;
pub mod geom;

pub use error::*;
pub use geom::*;
