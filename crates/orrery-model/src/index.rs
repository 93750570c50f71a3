//! Arena indices and typed capability handles
//!
//! An [`EntityIx`] names any entity in the arena. The capability handles
//! wrap one and certify what the entity can do; they are minted only by the
//! arena's `as_point` / `as_shape` / `as_line` / `as_measure` validators,
//! so holding one proves the capability check already happened.

/// Index of an entity inside its arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityIx(pub(crate) u32);

impl EntityIx {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a position source (anchor, intersection, slider, bumper)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointIx(pub(crate) EntityIx);

/// Handle to a geometry source (line, circle)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShapeIx(pub(crate) EntityIx);

/// Handle to a line specifically (angle parents have a direction)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LineIx(pub(crate) EntityIx);

/// Handle to a value source (distance, angle)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeasureIx(pub(crate) EntityIx);

impl PointIx {
    #[inline]
    pub fn entity(self) -> EntityIx {
        self.0
    }
}

impl ShapeIx {
    #[inline]
    pub fn entity(self) -> EntityIx {
        self.0
    }
}

impl LineIx {
    #[inline]
    pub fn entity(self) -> EntityIx {
        self.0
    }
}

impl MeasureIx {
    #[inline]
    pub fn entity(self) -> EntityIx {
        self.0
    }
}

impl From<LineIx> for ShapeIx {
    /// Every line is a shape
    #[inline]
    fn from(l: LineIx) -> ShapeIx {
        ShapeIx(l.0)
    }
}
