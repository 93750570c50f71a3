//! Entity arena - storage, validation and evaluation
//!
//! The arena is the sole owner of every entity; the rest of the system
//! holds indices. Construction validation is all-or-nothing: a failing
//! insert registers nothing. Evaluation is total for the capabilities the
//! typed handles certify, and recomputes everything from `t` on each call.

use std::f64::consts::TAU;

use orrery_core::{clamp_unit, wrap_unit, OrreryError, OrreryResult, Point2, Polyline};
use orrery_osc::{Bindings, TemplatedMessage, Value};

use crate::entity::{
    Anchor, Angle, Bumper, Circle, Control, Distance, Emitter, Entity, EntityKind, Intersection,
    Line, Slider, SliderMotion, CIRCLE_SEGMENTS,
};
use crate::index::{EntityIx, LineIx, MeasureIx, PointIx, ShapeIx};

/// Owner of every entity in a scene
#[derive(Debug, Default)]
pub struct EntityArena {
    entities: Vec<Entity>,
}

impl EntityArena {
    pub fn new() -> Self {
        EntityArena::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, ix: EntityIx) -> &Entity {
        &self.entities[ix.as_usize()]
    }

    /// Iterate all entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (EntityIx, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityIx(i as u32), e))
    }

    // ── Capability validation ───────────────────────────────────────────

    /// Certify `ix` as a position source
    pub fn as_point(&self, ix: EntityIx) -> OrreryResult<PointIx> {
        match &self.get(ix).kind {
            EntityKind::Anchor(_)
            | EntityKind::Intersection(_)
            | EntityKind::Slider(_)
            | EntityKind::Bumper(_) => Ok(PointIx(ix)),
            _ => Err(OrreryError::NotAPoint {
                id: self.get(ix).id.clone(),
            }),
        }
    }

    /// Certify `ix` as a geometry source
    pub fn as_shape(&self, ix: EntityIx) -> OrreryResult<ShapeIx> {
        match &self.get(ix).kind {
            EntityKind::Line(_) | EntityKind::Circle(_) => Ok(ShapeIx(ix)),
            _ => Err(OrreryError::NotAShape {
                id: self.get(ix).id.clone(),
            }),
        }
    }

    /// Certify `ix` as a line
    pub fn as_line(&self, ix: EntityIx) -> OrreryResult<LineIx> {
        match &self.get(ix).kind {
            EntityKind::Line(_) => Ok(LineIx(ix)),
            _ => Err(OrreryError::NotALine {
                id: self.get(ix).id.clone(),
            }),
        }
    }

    /// Certify `ix` as a value source
    pub fn as_measure(&self, ix: EntityIx) -> OrreryResult<MeasureIx> {
        match &self.get(ix).kind {
            EntityKind::Distance(_) | EntityKind::Angle(_) => Ok(MeasureIx(ix)),
            _ => Err(OrreryError::NotAMeasurement {
                id: self.get(ix).id.clone(),
            }),
        }
    }

    // ── Construction ────────────────────────────────────────────────────

    fn max_dependency_rank(&self, deps: &[EntityIx]) -> i32 {
        // the implicit root has rank 0
        deps.iter().map(|d| self.get(*d).rank).max().unwrap_or(0)
    }

    fn check_rank(&self, rank: i32, deps: &[EntityIx]) -> OrreryResult<()> {
        let dependency_rank = self.max_dependency_rank(deps);
        if rank <= dependency_rank {
            return Err(OrreryError::RankViolation {
                rank,
                dependency_rank,
            });
        }
        Ok(())
    }

    fn push(&mut self, id: String, rank: i32, kind: EntityKind) -> EntityIx {
        let ix = EntityIx(self.entities.len() as u32);
        self.entities.push(Entity { id, rank, kind });
        ix
    }

    pub fn insert_anchor(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        pos: Point2,
    ) -> OrreryResult<EntityIx> {
        self.check_rank(rank, &[])?;
        Ok(self.push(id.into(), rank, EntityKind::Anchor(Anchor { pos })))
    }

    pub fn insert_line(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        a: EntityIx,
        b: EntityIx,
    ) -> OrreryResult<EntityIx> {
        let pa = self.as_point(a)?;
        let pb = self.as_point(b)?;
        if a == b {
            return Err(OrreryError::ImpossibleGeometry(
                "line endpoints are the same point".to_string(),
            ));
        }
        self.check_rank(rank, &[a, b])?;
        Ok(self.push(
            id.into(),
            rank,
            EntityKind::Line(Line {
                endpoints: (pa, pb),
                default_velocity: 0.0,
            }),
        ))
    }

    pub fn insert_circle(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        centre: EntityIx,
        radius: f64,
        orientation: f64,
    ) -> OrreryResult<EntityIx> {
        let c = self.as_point(centre)?;
        if radius <= 0.0 {
            return Err(OrreryError::ImpossibleGeometry(
                "circle radius must be positive".to_string(),
            ));
        }
        self.check_rank(rank, &[centre])?;
        Ok(self.push(
            id.into(),
            rank,
            EntityKind::Circle(Circle {
                centre: c,
                radius,
                orientation: clamp_unit(orientation),
                default_velocity: 0.0,
            }),
        ))
    }

    pub fn insert_intersection(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        a: EntityIx,
        b: EntityIx,
    ) -> OrreryResult<EntityIx> {
        let sa = self.as_shape(a)?;
        let sb = self.as_shape(b)?;
        self.check_rank(rank, &[a, b])?;
        Ok(self.push(
            id.into(),
            rank,
            EntityKind::Intersection(Intersection { parents: (sa, sb) }),
        ))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert_slider(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        parent: EntityIx,
        position: f64,
        velocity: f64,
        looping: bool,
        inherit_velocity: bool,
    ) -> OrreryResult<EntityIx> {
        let shape = self.as_shape(parent)?;
        self.check_rank(rank, &[parent])?;
        let motion = SliderMotion::new(shape, position, velocity, looping, inherit_velocity);
        Ok(self.push(id.into(), rank, EntityKind::Slider(Slider { motion })))
    }

    pub fn insert_distance(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        a: EntityIx,
        b: EntityIx,
    ) -> OrreryResult<EntityIx> {
        let pa = self.as_point(a)?;
        let pb = self.as_point(b)?;
        self.check_rank(rank, &[a, b])?;
        Ok(self.push(
            id.into(),
            rank,
            EntityKind::Distance(Distance { parents: (pa, pb) }),
        ))
    }

    pub fn insert_angle(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        a: EntityIx,
        b: EntityIx,
    ) -> OrreryResult<EntityIx> {
        let la = self.as_line(a)?;
        let lb = self.as_line(b)?;
        self.check_rank(rank, &[a, b])?;
        Ok(self.push(
            id.into(),
            rank,
            EntityKind::Angle(Angle { parents: (la, lb) }),
        ))
    }

    pub fn insert_control(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        pos: Point2,
        path: impl Into<Vec<u8>>,
    ) -> OrreryResult<EntityIx> {
        self.check_rank(rank, &[])?;
        let emitter = Emitter {
            message: TemplatedMessage::new(path, Vec::new())?,
            inputs: Default::default(),
        };
        Ok(self.push(
            id.into(),
            rank,
            EntityKind::Control(Control { pos, emitter }),
        ))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert_bumper(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        parent: EntityIx,
        position: f64,
        velocity: f64,
        collides_with: EntityIx,
        path: impl Into<Vec<u8>>,
        looping: bool,
        inherit_velocity: bool,
    ) -> OrreryResult<EntityIx> {
        let shape = self.as_shape(parent)?;
        let target = self.as_shape(collides_with)?;
        if parent == collides_with {
            return Err(OrreryError::ImpossibleGeometry(
                "bumper cannot collide with its own parent".to_string(),
            ));
        }
        self.check_rank(rank, &[parent, collides_with])?;
        let motion = SliderMotion::new(shape, position, velocity, looping, inherit_velocity);
        let emitter = Emitter {
            message: TemplatedMessage::new(path, Vec::new())?,
            inputs: Default::default(),
        };
        Ok(self.push(
            id.into(),
            rank,
            EntityKind::Bumper(Bumper {
                motion,
                emitter,
                collides_with: target,
            }),
        ))
    }

    /// Minimal legal rank for `ix`: one above its highest dependency
    pub fn minimal_rank(&self, ix: EntityIx) -> i32 {
        self.max_dependency_rank(&self.get(ix).dependencies()) + 1
    }

    /// Tighten an optimistically high rank down to the minimal legal one
    pub fn tighten_rank(&mut self, ix: EntityIx) {
        let rank = self.minimal_rank(ix);
        self.entities[ix.as_usize()].rank = rank;
    }

    // ── Motion-parameter access ─────────────────────────────────────────

    /// Mutable motion state of a slider or bumper
    pub fn slider_motion_mut(&mut self, ix: EntityIx) -> Option<&mut SliderMotion> {
        match &mut self.entities[ix.as_usize()].kind {
            EntityKind::Slider(s) => Some(&mut s.motion),
            EntityKind::Bumper(b) => Some(&mut b.motion),
            _ => None,
        }
    }

    /// Set a shape's default child velocity
    pub fn set_default_child_velocity(&mut self, shape: ShapeIx, velocity: f64) {
        match &mut self.entities[shape.entity().as_usize()].kind {
            EntityKind::Line(l) => l.default_velocity = velocity,
            EntityKind::Circle(c) => c.default_velocity = velocity,
            _ => debug_assert!(false, "shape handle to a non-shape entity"),
        }
    }

    /// Emitter state of a control or bumper
    pub fn emitter(&self, ix: EntityIx) -> Option<&Emitter> {
        match &self.get(ix).kind {
            EntityKind::Control(c) => Some(&c.emitter),
            EntityKind::Bumper(b) => Some(&b.emitter),
            _ => None,
        }
    }

    /// Mutable emitter state of a control or bumper
    pub fn emitter_mut(&mut self, ix: EntityIx) -> Option<&mut Emitter> {
        match &mut self.entities[ix.as_usize()].kind {
            EntityKind::Control(c) => Some(&mut c.emitter),
            EntityKind::Bumper(b) => Some(&mut b.emitter),
            _ => None,
        }
    }

    /// Bind a named measurement input on a control or bumper. The owner's
    /// rank is raised if the new dependency demands it, keeping the rank
    /// invariant intact.
    pub fn add_emitter_input(
        &mut self,
        ix: EntityIx,
        name: impl Into<String>,
        measure: MeasureIx,
    ) -> OrreryResult<()> {
        let measure_rank = self.get(measure.entity()).rank;
        let entity = &mut self.entities[ix.as_usize()];
        let emitter = match &mut entity.kind {
            EntityKind::Control(c) => &mut c.emitter,
            EntityKind::Bumper(b) => &mut b.emitter,
            _ => {
                return Err(OrreryError::ImpossibleGeometry(format!(
                    "entity {} cannot take measurement inputs",
                    entity.id
                )))
            }
        };
        emitter.inputs.insert(name.into(), measure);
        entity.rank = entity.rank.max(measure_rank + 1);
        Ok(())
    }

    // ── Evaluation ──────────────────────────────────────────────────────

    /// Position of a point source at time `t`
    pub fn coords(&self, p: PointIx, t: f64) -> Point2 {
        match &self.get(p.entity()).kind {
            EntityKind::Anchor(a) => a.pos,
            EntityKind::Intersection(i) => self.intersection_coords(i, t),
            EntityKind::Slider(s) => self.motion_coords(&s.motion, t),
            EntityKind::Bumper(b) => self.motion_coords(&b.motion, t),
            _ => {
                debug_assert!(false, "point handle to a non-point entity");
                Point2::ORIGIN
            }
        }
    }

    /// Boundary chain of a shape at time `t`
    pub fn boundary(&self, s: ShapeIx, t: f64) -> Polyline {
        match &self.get(s.entity()).kind {
            EntityKind::Line(l) => Polyline::open(vec![
                self.coords(l.endpoints.0, t),
                self.coords(l.endpoints.1, t),
            ]),
            EntityKind::Circle(c) => {
                Polyline::circle(self.coords(c.centre, t), c.radius, CIRCLE_SEGMENTS)
            }
            _ => {
                debug_assert!(false, "shape handle to a non-shape entity");
                Polyline::open(vec![Point2::ORIGIN])
            }
        }
    }

    /// Point on a shape's perimeter at fraction `f` of its length, measured
    /// from the shape's zero point
    pub fn shape_position(&self, s: ShapeIx, t: f64, f: f64) -> Point2 {
        match &self.get(s.entity()).kind {
            EntityKind::Circle(c) => self.boundary(s, t).interpolate(wrap_unit(f + c.orientation)),
            _ => self.boundary(s, t).interpolate(f),
        }
    }

    /// A shape's fallback velocity for inheriting sliders
    pub fn default_child_velocity(&self, s: ShapeIx) -> f64 {
        match &self.get(s.entity()).kind {
            EntityKind::Line(l) => l.default_velocity,
            EntityKind::Circle(c) => c.default_velocity,
            _ => 0.0,
        }
    }

    /// Perimeter fraction of a slider/bumper motion at time `t`
    pub fn motion_fraction(&self, motion: &SliderMotion, t: f64) -> f64 {
        let velocity = if motion.inherit_velocity {
            self.default_child_velocity(motion.parent)
        } else {
            motion.velocity
        };
        let raw = motion.position() + velocity * t;
        if motion.looping {
            wrap_unit(raw)
        } else {
            clamp_unit(raw)
        }
    }

    fn motion_coords(&self, motion: &SliderMotion, t: f64) -> Point2 {
        self.shape_position(motion.parent, t, self.motion_fraction(motion, t))
    }

    fn intersection_coords(&self, i: &Intersection, t: f64) -> Point2 {
        let a = self.boundary(i.parents.0, t);
        let b = self.boundary(i.parents.1, t);
        a.first_crossing(&b)
            .unwrap_or_else(|| self.shape_position(i.parents.0, t, 0.0))
    }

    /// Direction angle of a line in revolutions (may be negative)
    fn line_angle(&self, l: LineIx, t: f64) -> f64 {
        match &self.get(l.entity()).kind {
            EntityKind::Line(line) => {
                let a = self.coords(line.endpoints.0, t);
                let b = self.coords(line.endpoints.1, t);
                (b.y - a.y).atan2(b.x - a.x) / TAU
            }
            _ => {
                debug_assert!(false, "line handle to a non-line entity");
                0.0
            }
        }
    }

    /// Value of a measurement at time `t`
    pub fn value(&self, m: MeasureIx, t: f64) -> f64 {
        match &self.get(m.entity()).kind {
            EntityKind::Distance(d) => self
                .coords(d.parents.0, t)
                .distance(self.coords(d.parents.1, t)),
            EntityKind::Angle(a) => {
                wrap_unit(self.line_angle(a.parents.1, t) - self.line_angle(a.parents.0, t))
            }
            _ => {
                debug_assert!(false, "measure handle to a non-measurement entity");
                0.0
            }
        }
    }

    /// Collision test over the half-open window `[t, t_next)`: the movement
    /// segment of `motion` against `target`'s boundary evaluated at `t`.
    /// The target's own motion inside the window is deliberately ignored.
    pub fn collision(&self, motion: &SliderMotion, target: ShapeIx, t: f64, t_next: f64) -> bool {
        let from = self.motion_coords(motion, t);
        let to = self.motion_coords(motion, t_next);
        self.boundary(target, t).crossed_by_movement(from, to)
    }

    /// Collision test for a bumper entity; `false` for anything else
    pub fn bumper_collision(&self, ix: EntityIx, t: f64, t_next: f64) -> bool {
        match &self.get(ix).kind {
            EntityKind::Bumper(b) => self.collision(&b.motion, b.collides_with, t, t_next),
            _ => false,
        }
    }

    /// Binding environment for an emitter at time `t`: every named input
    /// resolved to its value, then the reserved name `t`
    pub fn emitter_bindings(&self, emitter: &Emitter, t: f64) -> Bindings {
        let mut env = Bindings::new();
        for (name, measure) in &emitter.inputs {
            env.bind_num(name.clone(), self.value(*measure, t));
        }
        env.bind_num("t", t);
        env
    }

    /// Assemble an emitter's outbound message at time `t`
    pub fn emitter_message(
        &self,
        emitter: &Emitter,
        t: f64,
    ) -> OrreryResult<(Vec<u8>, Vec<Value>)> {
        let env = self.emitter_bindings(emitter, t);
        let data = emitter.message.data(&env)?;
        Ok((emitter.message.path().to_vec(), data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f64 = 1.0 / 48.0;

    fn approx(p: Point2, x: f64, y: f64) -> bool {
        p.approx_eq(Point2::new(x, y), 1e-9)
    }

    #[test]
    fn test_anchor_invariant() {
        let mut arena = EntityArena::new();
        let ix = arena
            .insert_anchor("p1", 1, Point2::new(0.5, 0.25))
            .unwrap();
        let p = arena.as_point(ix).unwrap();
        for k in 0..=10 {
            assert!(approx(arena.coords(p, k as f64 / 10.0), 0.5, 0.25));
        }
    }

    #[test]
    fn test_anchored_line_interpolation() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(2.0, 2.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        let shape = arena.as_shape(l1).unwrap();
        for k in 0..=10 {
            let t = k as f64 / 10.0;
            assert!(approx(arena.shape_position(shape, t, 0.0), 0.0, 0.0));
            assert!(approx(arena.shape_position(shape, t, 0.5), 1.0, 1.0));
            assert!(approx(arena.shape_position(shape, t, 1.0), 2.0, 2.0));
        }
    }

    #[test]
    fn test_anchored_circle_positions() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(1.0, 1.0)).unwrap();
        let c1 = arena.insert_circle("c1", 2, p1, 1.0, 0.0).unwrap();
        let shape = arena.as_shape(c1).unwrap();
        for k in 0..=10 {
            let t = k as f64 / 10.0;
            assert!(approx(arena.shape_position(shape, t, 0.0), 2.0, 1.0));
            assert!(approx(arena.shape_position(shape, t, 1.0), 2.0, 1.0));
            assert!(approx(arena.shape_position(shape, t, 0.5), 0.0, 1.0));
        }
    }

    #[test]
    fn test_circle_orientation_rotates_zero_point() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let c1 = arena.insert_circle("c1", 2, p1, 1.0, 0.25).unwrap();
        let shape = arena.as_shape(c1).unwrap();
        // zero point is east rotated a quarter revolution clockwise
        assert!(approx(arena.shape_position(shape, 0.0, 0.0), 0.0, -1.0));
        assert!(approx(arena.shape_position(shape, 0.0, 0.75), 1.0, 0.0));
    }

    #[test]
    fn test_static_line_intersection() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 1.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(2.0, 1.0)).unwrap();
        let p3 = arena.insert_anchor("p3", 1, Point2::new(1.0, 0.0)).unwrap();
        let p4 = arena.insert_anchor("p4", 1, Point2::new(1.0, 2.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        let l2 = arena.insert_line("l2", 2, p3, p4).unwrap();
        let i5 = arena.insert_intersection("i5", 3, l1, l2).unwrap();
        let p = arena.as_point(i5).unwrap();
        for k in 0..=10 {
            assert!(approx(arena.coords(p, k as f64 / 10.0), 1.0, 1.0));
        }
    }

    #[test]
    fn test_no_intersection_falls_back_to_start() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 1.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(2.0, 1.0)).unwrap();
        let p3 = arena.insert_anchor("p3", 1, Point2::new(1.0, 2.0)).unwrap();
        let p4 = arena.insert_anchor("p4", 1, Point2::new(1.0, 4.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        let l2 = arena.insert_line("l2", 2, p3, p4).unwrap();
        let i5 = arena.insert_intersection("i5", 3, l1, l2).unwrap();
        let p = arena.as_point(i5).unwrap();
        for k in 0..=10 {
            assert!(approx(arena.coords(p, k as f64 / 10.0), 0.0, 1.0));
        }
    }

    #[test]
    fn test_line_circle_intersection() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 1.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(2.0, 1.0)).unwrap();
        let p3 = arena.insert_anchor("p3", 1, Point2::new(2.0, 1.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        let c1 = arena.insert_circle("c1", 2, p3, 1.0, 0.0).unwrap();
        let i5 = arena.insert_intersection("i5", 3, l1, c1).unwrap();
        let p = arena.as_point(i5).unwrap();
        for k in 0..=10 {
            let got = arena.coords(p, k as f64 / 10.0);
            assert!(got.approx_eq(Point2::new(1.0, 1.0), 1e-6), "{got:?}");
        }
    }

    #[test]
    fn test_slider_unlooped_clamps() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(2.0, 2.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        let s1 = arena
            .insert_slider("s1", 3, l1, 0.0, 1.0, false, false)
            .unwrap();
        let p = arena.as_point(s1).unwrap();
        assert!(approx(arena.coords(p, 0.0), 0.0, 0.0));
        assert!(approx(arena.coords(p, 0.5), 1.0, 1.0));
        assert!(approx(arena.coords(p, 1.0), 2.0, 2.0));
        // clamped at the end for all later times
        assert!(approx(arena.coords(p, 1.5), 2.0, 2.0));
    }

    #[test]
    fn test_slider_looped_wraps() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(2.0, 2.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        let s1 = arena
            .insert_slider("s1", 3, l1, 0.0, 1.0, true, false)
            .unwrap();
        let p = arena.as_point(s1).unwrap();
        assert!(approx(arena.coords(p, 0.0), 0.0, 0.0));
        assert!(approx(arena.coords(p, 0.5), 1.0, 1.0));
        assert!(approx(arena.coords(p, 0.9), 1.8, 1.8));
        // wraps exactly back to the start
        assert!(approx(arena.coords(p, 1.0), 0.0, 0.0));
    }

    #[test]
    fn test_line_on_slider_changes_length() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(1.0, 0.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        let p3 = arena.insert_anchor("p3", 2, Point2::new(0.0, 1.0)).unwrap();
        let s1 = arena
            .insert_slider("s1", 3, l1, 0.0, 1.0, false, false)
            .unwrap();
        let l2 = arena.insert_line("l2", 4, s1, p3).unwrap();
        let shape = arena.as_shape(l2).unwrap();
        assert!((arena.boundary(shape, 0.0).length() - 1.0).abs() < 1e-9);
        assert!((arena.boundary(shape, 1.0).length() - 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_moving_intersection_tracks_slider() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(1.0, 0.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();

        let p3 = arena.insert_anchor("p3", 1, Point2::new(0.0, 2.0)).unwrap();
        let p4 = arena.insert_anchor("p4", 1, Point2::new(1.0, 2.0)).unwrap();
        let l2 = arena.insert_line("l2", 2, p3, p4).unwrap();

        // extended past the unit span so the crossing stays interior
        let p5 = arena
            .insert_anchor("p5", 1, Point2::new(-0.1, 1.0))
            .unwrap();
        let p6 = arena.insert_anchor("p6", 1, Point2::new(1.1, 1.0)).unwrap();
        let l3 = arena.insert_line("l3", 2, p5, p6).unwrap();

        let s1 = arena
            .insert_slider("s1", 3, l1, 0.0, 1.0, false, false)
            .unwrap();
        let s2 = arena
            .insert_slider("s2", 3, l2, 0.0, 1.0, false, false)
            .unwrap();
        let l4 = arena.insert_line("l4", 4, s1, s2).unwrap();
        let i1 = arena.insert_intersection("i1", 5, l3, l4).unwrap();
        let p = arena.as_point(i1).unwrap();

        for k in 0..=10 {
            let t = k as f64 / 10.0;
            let got = arena.coords(p, t);
            assert!(got.approx_eq(Point2::new(t, 1.0), 1e-9), "t={t}: {got:?}");
        }
    }

    #[test]
    fn test_circle_slider_cardinal_points() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let c1 = arena.insert_circle("c1", 2, p1, 1.0, 0.0).unwrap();
        let s1 = arena
            .insert_slider("s1", 3, c1, 0.0, 1.0, false, false)
            .unwrap();
        let p = arena.as_point(s1).unwrap();

        // always on the unit circle
        let centre = Point2::ORIGIN;
        for k in 0..=10 {
            let t = k as f64 / 10.0;
            let d = arena.coords(p, t).distance(centre);
            assert!((d - 1.0).abs() < 1e-3, "t={t}: off boundary by {d}");
        }

        assert!(arena.coords(p, 0.0).approx_eq(Point2::new(1.0, 0.0), 1e-6));
        assert!(arena.coords(p, 1.0).approx_eq(Point2::new(1.0, 0.0), 1e-6));
        assert!(arena.coords(p, 0.5).approx_eq(Point2::new(-1.0, 0.0), 1e-6));
        assert!(arena.coords(p, 0.25).approx_eq(Point2::new(0.0, -1.0), 1e-6));
        assert!(arena.coords(p, 0.75).approx_eq(Point2::new(0.0, 1.0), 1e-6));
    }

    #[test]
    fn test_slider_inherits_parent_velocity() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(1.0, 0.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        let shape = arena.as_shape(l1).unwrap();
        arena.set_default_child_velocity(shape, 0.5);

        let s1 = arena
            .insert_slider("s1", 3, l1, 0.0, 2.0, false, true)
            .unwrap();
        let p = arena.as_point(s1).unwrap();
        // parent's 0.5/s wins over the slider's own 2.0/s
        assert!(approx(arena.coords(p, 1.0), 0.5, 0.0));
    }

    #[test]
    fn test_slider_position_setter_clamps() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(1.0, 0.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        let s1 = arena
            .insert_slider("s1", 3, l1, 1.7, 0.0, false, false)
            .unwrap();
        let motion = arena.slider_motion_mut(s1).unwrap();
        assert_eq!(motion.position(), 1.0);
        motion.set_position(-0.5);
        assert_eq!(motion.position(), 0.0);
        motion.set_position(0.25);
        assert_eq!(motion.position(), 0.25);
    }

    #[test]
    fn test_distance() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(1.0, 1.0)).unwrap();
        let d1 = arena.insert_distance("d1", 2, p1, p2).unwrap();
        let m = arena.as_measure(d1).unwrap();
        assert!((arena.value(m, 0.0) - 2f64.sqrt()).abs() < 1e-12);
        assert!((arena.value(m, 5.0) - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_angle_quarter_revolution() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(0.0, 1.0)).unwrap();
        let p3 = arena.insert_anchor("p3", 1, Point2::new(1.0, 0.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        let l2 = arena.insert_line("l2", 2, p1, p3).unwrap();
        // anticlockwise from the horizontal to the vertical is +90°
        let a1 = arena.insert_angle("a1", 3, l2, l1).unwrap();
        let m = arena.as_measure(a1).unwrap();
        assert!((arena.value(m, 0.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_control_message_with_one_input() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(1.0, 0.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        let p3 = arena.insert_anchor("p3", 2, Point2::new(0.0, 1.0)).unwrap();
        let s1 = arena
            .insert_slider("s1", 3, l1, 0.0, 1.0, false, false)
            .unwrap();
        let d1 = arena.insert_distance("d1", 4, p3, s1).unwrap();
        let m = arena.as_measure(d1).unwrap();

        let c1 = arena
            .insert_control("c1", 5, Point2::ORIGIN, b"/bums".to_vec())
            .unwrap();
        arena.add_emitter_input(c1, "in_1", m).unwrap();
        arena
            .emitter_mut(c1)
            .unwrap()
            .message
            .set_data(vec!["in_1 * 2".to_string()])
            .unwrap();

        let emitter = arena.emitter(c1).unwrap().clone();
        let (path, data) = arena.emitter_message(&emitter, 0.0).unwrap();
        assert_eq!(path, b"/bums");
        assert_eq!(data, vec![Value::Num(2.0)]);

        let (_, data) = arena.emitter_message(&emitter, 1.0).unwrap();
        match &data[0] {
            Value::Num(v) => assert!((v - 2.0 * 2f64.sqrt()).abs() < 1e-12),
            other => panic!("expected a number, got {other:?}"),
        }
    }

    #[test]
    fn test_control_message_compound_inputs() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(1.0, 0.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        let p3 = arena.insert_anchor("p3", 2, Point2::new(0.0, 1.0)).unwrap();
        let s1 = arena
            .insert_slider("s1", 3, l1, 0.0, 1.0, false, false)
            .unwrap();
        let l2 = arena.insert_line("l2", 3, p3, p1).unwrap();
        let l3 = arena.insert_line("l3", 4, p3, s1).unwrap();
        let d1 = arena.insert_distance("d1", 4, p3, s1).unwrap();
        let a1 = arena.insert_angle("a1", 5, l2, l3).unwrap();

        let c1 = arena
            .insert_control("c1", 6, Point2::ORIGIN, b"/bums".to_vec())
            .unwrap();
        arena
            .add_emitter_input(c1, "in_1", arena.as_measure(d1).unwrap())
            .unwrap();
        arena
            .add_emitter_input(c1, "in_2", arena.as_measure(a1).unwrap())
            .unwrap();
        arena
            .emitter_mut(c1)
            .unwrap()
            .message
            .set_data(vec!["in_1 * 2".to_string(), "in_2".to_string()])
            .unwrap();

        let emitter = arena.emitter(c1).unwrap().clone();
        let (_, data) = arena.emitter_message(&emitter, 0.0).unwrap();
        assert_eq!(data, vec![Value::Num(2.0), Value::Num(0.0)]);

        let (_, data) = arena.emitter_message(&emitter, 1.0).unwrap();
        match (&data[0], &data[1]) {
            (Value::Num(d), Value::Num(a)) => {
                assert!((d - 2.0 * 2f64.sqrt()).abs() < 1e-12);
                assert!((a - 0.125).abs() < 1e-12);
            }
            other => panic!("expected numbers, got {other:?}"),
        }
    }

    #[test]
    fn test_unbound_input_fails_evaluation() {
        let mut arena = EntityArena::new();
        let c1 = arena
            .insert_control("c1", 1, Point2::ORIGIN, b"/bums".to_vec())
            .unwrap();
        arena
            .emitter_mut(c1)
            .unwrap()
            .message
            .set_data(vec!["in_9 * 2".to_string()])
            .unwrap();
        let emitter = arena.emitter(c1).unwrap().clone();
        assert!(matches!(
            arena.emitter_message(&emitter, 0.0),
            Err(OrreryError::UnboundName(_))
        ));
    }

    #[test]
    fn test_reserved_t_binding() {
        let mut arena = EntityArena::new();
        let c1 = arena
            .insert_control("c1", 1, Point2::ORIGIN, b"/clock".to_vec())
            .unwrap();
        arena
            .emitter_mut(c1)
            .unwrap()
            .message
            .set_data(vec!["t * 10".to_string()])
            .unwrap();
        let emitter = arena.emitter(c1).unwrap().clone();
        let (_, data) = arena.emitter_message(&emitter, 0.5).unwrap();
        assert_eq!(data, vec![Value::Num(5.0)]);
    }

    #[test]
    fn test_bumper_collision_windows() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(1.0, 0.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        let p3 = arena.insert_anchor("p3", 1, Point2::new(0.5, 1.0)).unwrap();
        let p4 = arena
            .insert_anchor("p4", 1, Point2::new(0.5, -1.0))
            .unwrap();
        let l2 = arena.insert_line("l2", 2, p3, p4).unwrap();

        let b1 = arena
            .insert_bumper("b1", 3, l1, 0.0, 1.0, l2, b"/bump".to_vec(), false, false)
            .unwrap();

        assert!(arena.bumper_collision(b1, 0.0, 1.0));
        assert!(!arena.bumper_collision(b1, 0.0, FRAME));
        // the crossing lands exactly on a window edge: reported by the
        // window that starts there and by no other
        assert!(!arena.bumper_collision(b1, 0.5 - 2.0 * FRAME, 0.5 - FRAME));
        assert!(!arena.bumper_collision(b1, 0.5 - FRAME, 0.5));
        assert!(arena.bumper_collision(b1, 0.5, 0.5 + FRAME));
        assert!(arena.bumper_collision(b1, 0.5 - FRAME / 2.0, 0.5 + FRAME / 2.0));
        assert!(!arena.bumper_collision(b1, 0.5 + FRAME, 0.5 + 2.0 * FRAME));
        assert!(!arena.bumper_collision(b1, 1.0, 1.0 + FRAME));
    }

    #[test]
    fn test_line_needs_distinct_endpoints() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        assert!(matches!(
            arena.insert_line("l1", 2, p1, p1),
            Err(OrreryError::ImpossibleGeometry(_))
        ));
        // nothing was registered by the failed construction
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_circle_needs_positive_radius() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        assert!(matches!(
            arena.insert_circle("c1", 2, p1, 0.0, 0.0),
            Err(OrreryError::ImpossibleGeometry(_))
        ));
        assert!(matches!(
            arena.insert_circle("c1", 2, p1, -1.0, 0.0),
            Err(OrreryError::ImpossibleGeometry(_))
        ));
    }

    #[test]
    fn test_bumper_rejects_own_parent_as_target() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(1.0, 0.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        assert!(matches!(
            arena.insert_bumper("b1", 3, l1, 0.0, 1.0, l1, b"/bump".to_vec(), false, false),
            Err(OrreryError::ImpossibleGeometry(_))
        ));
    }

    #[test]
    fn test_rank_must_exceed_dependencies() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 3, Point2::new(1.0, 0.0)).unwrap();
        assert!(matches!(
            arena.insert_line("l1", 3, p1, p2),
            Err(OrreryError::RankViolation {
                rank: 3,
                dependency_rank: 3
            })
        ));
        // anchors must clear the implicit rank-0 root as well
        assert!(matches!(
            arena.insert_anchor("p3", 0, Point2::ORIGIN),
            Err(OrreryError::RankViolation { .. })
        ));
    }

    #[test]
    fn test_capability_mismatches() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(1.0, 0.0)).unwrap();
        let l1 = arena.insert_line("l1", 2, p1, p2).unwrap();
        let c1 = arena.insert_circle("c1", 2, p1, 1.0, 0.0).unwrap();

        // a slider needs a shape, not a point
        assert!(matches!(
            arena.insert_slider("s1", 3, p1, 0.0, 0.0, false, false),
            Err(OrreryError::NotAShape { .. })
        ));
        // a distance needs points, not shapes
        assert!(matches!(
            arena.insert_distance("d1", 3, l1, c1),
            Err(OrreryError::NotAPoint { .. })
        ));
        // an angle needs lines specifically
        assert!(matches!(
            arena.insert_angle("a1", 3, l1, c1),
            Err(OrreryError::NotALine { .. })
        ));
        // measurements are the only value sources
        assert!(matches!(
            arena.as_measure(p1),
            Err(OrreryError::NotAMeasurement { .. })
        ));
    }

    #[test]
    fn test_add_input_raises_owner_rank() {
        let mut arena = EntityArena::new();
        let p1 = arena.insert_anchor("p1", 1, Point2::new(0.0, 0.0)).unwrap();
        let p2 = arena.insert_anchor("p2", 1, Point2::new(1.0, 1.0)).unwrap();
        let d1 = arena.insert_distance("d1", 2, p1, p2).unwrap();
        let c1 = arena
            .insert_control("c1", 1, Point2::ORIGIN, b"/bums".to_vec())
            .unwrap();
        arena
            .add_emitter_input(c1, "in_1", arena.as_measure(d1).unwrap())
            .unwrap();
        assert_eq!(arena.get(c1).rank, 3);
    }
}
