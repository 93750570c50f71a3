//! Entity variants of the kinetic diagram
//!
//! Each variant's evaluation is stateless: every query recomputes fully
//! from `t`. Combined capabilities are expressed by composition — a bumper
//! holds a [`SliderMotion`] and an [`Emitter`] as named fields rather than
//! inheriting either.

use std::collections::BTreeMap;

use orrery_core::{clamp_unit, Point2};
use orrery_osc::TemplatedMessage;

use crate::index::{EntityIx, LineIx, MeasureIx, PointIx, ShapeIx};

/// Number of equal chords approximating a circle boundary
pub const CIRCLE_SEGMENTS: usize = 256;

/// A static point dependent on nothing else; invariant over `t`
#[derive(Clone, Debug)]
pub struct Anchor {
    pub pos: Point2,
}

/// A line segment between two distinct points
#[derive(Clone, Debug)]
pub struct Line {
    pub endpoints: (PointIx, PointIx),
    /// Fallback velocity inherited by sliders that opt in
    pub default_velocity: f64,
}

/// A circle around a centre point
///
/// The boundary is a fixed-resolution ring; the "zero" point of its
/// perimeter parametrization is the east point rotated clockwise by
/// `orientation` revolutions.
#[derive(Clone, Debug)]
pub struct Circle {
    pub centre: PointIx,
    pub radius: f64,
    /// Zero-point rotation in revolutions, clamped into the unit interval
    pub orientation: f64,
    /// Fallback velocity inherited by sliders that opt in
    pub default_velocity: f64,
}

/// The first proper crossing of two shape boundaries
///
/// Where the boundaries do not properly cross at `t` the point falls back
/// to the first shape's start — never an error.
#[derive(Clone, Debug)]
pub struct Intersection {
    pub parents: (ShapeIx, ShapeIx),
}

/// Motion state shared by sliders and bumpers
#[derive(Clone, Debug)]
pub struct SliderMotion {
    pub parent: ShapeIx,
    /// Start position as a perimeter fraction; input outside [0, 1] is
    /// silently clamped
    position: f64,
    /// Perimeter fractions per second
    pub velocity: f64,
    /// Wrap past the perimeter end instead of clamping
    pub looping: bool,
    /// Take velocity from the parent shape's default child velocity
    pub inherit_velocity: bool,
}

impl SliderMotion {
    pub fn new(
        parent: ShapeIx,
        position: f64,
        velocity: f64,
        looping: bool,
        inherit_velocity: bool,
    ) -> Self {
        SliderMotion {
            parent,
            position: clamp_unit(position),
            velocity,
            looping,
            inherit_velocity,
        }
    }

    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Set the start position, silently clamping into [0, 1]
    pub fn set_position(&mut self, position: f64) {
        self.position = clamp_unit(position);
    }
}

/// A point riding its parent shape's perimeter
#[derive(Clone, Debug)]
pub struct Slider {
    pub motion: SliderMotion,
}

/// Euclidean distance between two points
#[derive(Clone, Debug)]
pub struct Distance {
    pub parents: (PointIx, PointIx),
}

/// Signed angular difference between two lines, in revolutions mod 1,
/// positive anticlockwise from the first parent to the second
#[derive(Clone, Debug)]
pub struct Angle {
    pub parents: (LineIx, LineIx),
}

/// Message-emitting state shared by controls and bumpers
#[derive(Clone, Debug)]
pub struct Emitter {
    pub message: TemplatedMessage,
    /// Named measurement inputs bound into the payload environment
    pub inputs: BTreeMap<String, MeasureIx>,
}

/// A presentational emitter dispatching its message every tick
#[derive(Clone, Debug)]
pub struct Control {
    /// Display coordinates on the canvas
    pub pos: Point2,
    pub emitter: Emitter,
}

/// A sliding emitter dispatching only when it crosses a boundary
#[derive(Clone, Debug)]
pub struct Bumper {
    pub motion: SliderMotion,
    pub emitter: Emitter,
    /// The shape whose boundary triggers the message; never the parent
    pub collides_with: ShapeIx,
}

/// Closed set of entity kinds
#[derive(Clone, Debug)]
pub enum EntityKind {
    Anchor(Anchor),
    Line(Line),
    Circle(Circle),
    Intersection(Intersection),
    Slider(Slider),
    Distance(Distance),
    Angle(Angle),
    Control(Control),
    Bumper(Bumper),
}

impl EntityKind {
    /// Class name used in identifiers and class queries
    pub fn class_name(&self) -> &'static str {
        match self {
            EntityKind::Anchor(_) => "anchor",
            EntityKind::Line(_) => "line",
            EntityKind::Circle(_) => "circle",
            EntityKind::Intersection(_) => "intersection",
            EntityKind::Slider(_) => "slider",
            EntityKind::Distance(_) => "distance",
            EntityKind::Angle(_) => "angle",
            EntityKind::Control(_) => "control",
            EntityKind::Bumper(_) => "bumper",
        }
    }
}

/// An entity registered in a scene
#[derive(Clone, Debug)]
pub struct Entity {
    pub id: String,
    /// Topological layer; always exceeds every dependency's rank
    pub rank: i32,
    pub kind: EntityKind,
}

impl Entity {
    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Entities this one depends on: referenced, never owned
    pub fn dependencies(&self) -> Vec<EntityIx> {
        match &self.kind {
            EntityKind::Anchor(_) => Vec::new(),
            EntityKind::Line(l) => vec![l.endpoints.0.entity(), l.endpoints.1.entity()],
            EntityKind::Circle(c) => vec![c.centre.entity()],
            EntityKind::Intersection(i) => {
                vec![i.parents.0.entity(), i.parents.1.entity()]
            }
            EntityKind::Slider(s) => vec![s.motion.parent.entity()],
            EntityKind::Distance(d) => vec![d.parents.0.entity(), d.parents.1.entity()],
            EntityKind::Angle(a) => vec![a.parents.0.entity(), a.parents.1.entity()],
            EntityKind::Control(c) => {
                c.emitter.inputs.values().map(|m| m.entity()).collect()
            }
            EntityKind::Bumper(b) => {
                let mut deps = vec![b.motion.parent.entity(), b.collides_with.entity()];
                deps.extend(b.emitter.inputs.values().map(|m| m.entity()));
                deps
            }
        }
    }
}
