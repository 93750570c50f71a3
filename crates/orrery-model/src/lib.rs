//! Orrery Model - The entity dependency model
//!
//! A kinetic diagram is a DAG of entities whose positions and values are
//! pure functions of logical time `t`:
//! - Position sources: anchors, intersections, sliders, bumpers
//! - Geometry sources: lines, circles
//! - Value sources: distances, angles
//! - Emitters: controls (every tick) and bumpers (on boundary crossing)
//!
//! Entities live in an [`EntityArena`]; every cross-entity reference is a
//! non-owning arena index, with typed capability handles minted only by
//! validation.

pub mod arena;
pub mod entity;
pub mod index;

pub use arena::*;
pub use entity::*;
pub use index::*;
