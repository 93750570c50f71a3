//! Scene registry
//!
//! Owns the entity arena for one diagram, hands out identifiers, and keeps
//! the id → index map the rest of the system looks entities up through.
//! Registration is keyed by identifier; re-registering an identifier makes
//! the last write win, the registry does not police duplicates beyond the
//! map key.

use std::collections::HashMap;

use orrery_core::{OrreryError, OrreryResult, Point2};
use orrery_model::{Entity, EntityArena, EntityIx};

/// The single scene of a session
#[derive(Debug, Default)]
pub struct Scene {
    arena: EntityArena,
    index: HashMap<String, EntityIx>,
    /// Per-class identifier sequences, starting at 1, never reset
    sequences: HashMap<String, u64>,
}

impl Scene {
    pub fn new() -> Self {
        Scene::default()
    }

    /// Read access to the entity arena
    pub fn arena(&self) -> &EntityArena {
        &self.arena
    }

    /// Mutable access to the arena, for motion-parameter and emitter setters
    pub fn arena_mut(&mut self) -> &mut EntityArena {
        &mut self.arena
    }

    /// Number of registered identifiers
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Next identifier for a class, e.g. `anchor-000001`. Values past
    /// 999999 stay unique but lose fixed-width ordering.
    pub fn next_id(&mut self, classname: &str) -> String {
        let seq = self.sequences.entry(classname.to_string()).or_insert(1);
        let id = format!("{classname}-{:06}", *seq);
        *seq += 1;
        id
    }

    fn register(&mut self, ix: EntityIx) {
        let id = self.arena.get(ix).id.clone();
        self.index.insert(id, ix);
    }

    /// Fetch a registered entity by identifier
    pub fn get_by_id(&self, id: &str) -> OrreryResult<EntityIx> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| OrreryError::UnknownEntity(id.to_string()))
    }

    /// Entity payload behind an index
    pub fn entity(&self, ix: EntityIx) -> &Entity {
        self.arena.get(ix)
    }

    /// All registered entities of a class
    pub fn list_by_class(&self, classname: &str) -> Vec<EntityIx> {
        self.index
            .values()
            .copied()
            .filter(|&ix| self.arena.get(ix).class_name() == classname)
            .collect()
    }

    /// All registered entities of a rank
    pub fn list_by_rank(&self, rank: i32) -> Vec<EntityIx> {
        self.index
            .values()
            .copied()
            .filter(|&ix| self.arena.get(ix).rank == rank)
            .collect()
    }

    /// All registered entities, ascending by rank; ties are unordered
    pub fn sort_by_rank(&self) -> Vec<EntityIx> {
        let mut all: Vec<EntityIx> = self.index.values().copied().collect();
        all.sort_unstable_by_key(|&ix| self.arena.get(ix).rank);
        all
    }

    /// Optimistic rank for a new entity: one above everything registered.
    /// The factory tightens it back down after construction validates the
    /// actual dependencies; this trades a too-high first guess for never
    /// searching for a minimal slot.
    fn optimistic_rank(&self) -> i32 {
        self.arena.iter().map(|(_, e)| e.rank).max().unwrap_or(0) + 1
    }

    // ── Explicit-id registration (the loader's path) ────────────────────

    pub fn add_anchor(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        pos: Point2,
    ) -> OrreryResult<EntityIx> {
        let ix = self.arena.insert_anchor(id, rank, pos)?;
        self.register(ix);
        Ok(ix)
    }

    pub fn add_line(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        a: EntityIx,
        b: EntityIx,
    ) -> OrreryResult<EntityIx> {
        let ix = self.arena.insert_line(id, rank, a, b)?;
        self.register(ix);
        Ok(ix)
    }

    pub fn add_circle(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        centre: EntityIx,
        radius: f64,
        orientation: f64,
    ) -> OrreryResult<EntityIx> {
        let ix = self.arena.insert_circle(id, rank, centre, radius, orientation)?;
        self.register(ix);
        Ok(ix)
    }

    pub fn add_intersection(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        a: EntityIx,
        b: EntityIx,
    ) -> OrreryResult<EntityIx> {
        let ix = self.arena.insert_intersection(id, rank, a, b)?;
        self.register(ix);
        Ok(ix)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_slider(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        parent: EntityIx,
        position: f64,
        velocity: f64,
        looping: bool,
        inherit_velocity: bool,
    ) -> OrreryResult<EntityIx> {
        let ix = self.arena.insert_slider(
            id,
            rank,
            parent,
            position,
            velocity,
            looping,
            inherit_velocity,
        )?;
        self.register(ix);
        Ok(ix)
    }

    pub fn add_distance(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        a: EntityIx,
        b: EntityIx,
    ) -> OrreryResult<EntityIx> {
        let ix = self.arena.insert_distance(id, rank, a, b)?;
        self.register(ix);
        Ok(ix)
    }

    pub fn add_angle(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        a: EntityIx,
        b: EntityIx,
    ) -> OrreryResult<EntityIx> {
        let ix = self.arena.insert_angle(id, rank, a, b)?;
        self.register(ix);
        Ok(ix)
    }

    pub fn add_control(
        &mut self,
        id: impl Into<String>,
        rank: i32,
        pos: Point2,
        path: impl Into<Vec<u8>>,
    ) -> OrreryResult<EntityIx> {
        let ix = self.arena.insert_control(id, rank, pos, path)?;
        self.register(ix);
        Ok(ix)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_bumper(
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
        let ix = self.arena.insert_bumper(
            id,
            rank,
            parent,
            position,
            velocity,
            collides_with,
            path,
            looping,
            inherit_velocity,
        )?;
        self.register(ix);
        Ok(ix)
    }

    // ── Factory: sequential ids, optimistic-then-tightened ranks ────────

    pub fn create_anchor(&mut self, pos: Point2) -> OrreryResult<EntityIx> {
        let id = self.next_id("anchor");
        let rank = self.optimistic_rank();
        let ix = self.arena.insert_anchor(id, rank, pos)?;
        self.arena.tighten_rank(ix);
        self.register(ix);
        Ok(ix)
    }

    pub fn create_line(&mut self, a: EntityIx, b: EntityIx) -> OrreryResult<EntityIx> {
        let id = self.next_id("line");
        let rank = self.optimistic_rank();
        let ix = self.arena.insert_line(id, rank, a, b)?;
        self.arena.tighten_rank(ix);
        self.register(ix);
        Ok(ix)
    }

    pub fn create_circle(
        &mut self,
        centre: EntityIx,
        radius: f64,
        orientation: f64,
    ) -> OrreryResult<EntityIx> {
        let id = self.next_id("circle");
        let rank = self.optimistic_rank();
        let ix = self.arena.insert_circle(id, rank, centre, radius, orientation)?;
        self.arena.tighten_rank(ix);
        self.register(ix);
        Ok(ix)
    }

    pub fn create_intersection(&mut self, a: EntityIx, b: EntityIx) -> OrreryResult<EntityIx> {
        let id = self.next_id("intersection");
        let rank = self.optimistic_rank();
        let ix = self.arena.insert_intersection(id, rank, a, b)?;
        self.arena.tighten_rank(ix);
        self.register(ix);
        Ok(ix)
    }

    pub fn create_slider(
        &mut self,
        parent: EntityIx,
        position: f64,
        velocity: f64,
        looping: bool,
        inherit_velocity: bool,
    ) -> OrreryResult<EntityIx> {
        let id = self.next_id("slider");
        let rank = self.optimistic_rank();
        let ix = self.arena.insert_slider(
            id,
            rank,
            parent,
            position,
            velocity,
            looping,
            inherit_velocity,
        )?;
        self.arena.tighten_rank(ix);
        self.register(ix);
        Ok(ix)
    }

    pub fn create_distance(&mut self, a: EntityIx, b: EntityIx) -> OrreryResult<EntityIx> {
        let id = self.next_id("distance");
        let rank = self.optimistic_rank();
        let ix = self.arena.insert_distance(id, rank, a, b)?;
        self.arena.tighten_rank(ix);
        self.register(ix);
        Ok(ix)
    }

    pub fn create_angle(&mut self, a: EntityIx, b: EntityIx) -> OrreryResult<EntityIx> {
        let id = self.next_id("angle");
        let rank = self.optimistic_rank();
        let ix = self.arena.insert_angle(id, rank, a, b)?;
        self.arena.tighten_rank(ix);
        self.register(ix);
        Ok(ix)
    }

    pub fn create_control(
        &mut self,
        pos: Point2,
        path: impl Into<Vec<u8>>,
    ) -> OrreryResult<EntityIx> {
        let id = self.next_id("control");
        let rank = self.optimistic_rank();
        let ix = self.arena.insert_control(id, rank, pos, path)?;
        self.arena.tighten_rank(ix);
        self.register(ix);
        Ok(ix)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_bumper(
        &mut self,
        parent: EntityIx,
        position: f64,
        velocity: f64,
        collides_with: EntityIx,
        path: impl Into<Vec<u8>>,
        looping: bool,
        inherit_velocity: bool,
    ) -> OrreryResult<EntityIx> {
        let id = self.next_id("bumper");
        let rank = self.optimistic_rank();
        let ix = self.arena.insert_bumper(
            id,
            rank,
            parent,
            position,
            velocity,
            collides_with,
            path,
            looping,
            inherit_velocity,
        )?;
        self.arena.tighten_rank(ix);
        self.register(ix);
        Ok(ix)
    }
}
