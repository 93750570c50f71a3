//! Scene descriptor loading
//!
//! A scene document is an ordered sequence of layers, each carrying a rank
//! and typed entity descriptors that reference previously-registered
//! parents by identifier. Parsing the on-disk format is a front-end
//! concern; this module consumes already-deserialized values and turns
//! them into construction calls. Any error aborts the whole load.

use std::collections::BTreeMap;

use serde::Deserialize;

use orrery_core::{OrreryError, OrreryResult, Point2};
use orrery_model::EntityIx;

use crate::registry::Scene;

/// A full scene document: layers in rank order
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SceneDoc {
    pub layers: Vec<LayerDoc>,
}

/// One topological layer of descriptors
#[derive(Clone, Debug, Deserialize)]
pub struct LayerDoc {
    pub rank: i32,
    #[serde(default)]
    pub children: Vec<EntityDoc>,
}

/// One entity descriptor; carries the union of per-kind fields, with the
/// motion parameters defaulted the way interactive construction defaults
/// them
#[derive(Clone, Debug, Deserialize)]
pub struct EntityDoc {
    /// Kind name: point, line, circle, slider, intersection, distance,
    /// angle, control, bumper
    pub entity: String,
    pub id: String,
    #[serde(default)]
    pub coords: Option<[f64; 2]>,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub centre: Option<String>,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub orientation: Option<f64>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub velocity: f64,
    #[serde(default, rename = "loop")]
    pub looping: bool,
    #[serde(default)]
    pub inherit_velocity: bool,
    #[serde(default)]
    pub collides_with: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    /// Payload expression strings, in dispatch order
    #[serde(default)]
    pub data: Vec<String>,
    /// Named measurement inputs: binding name → measurement identifier
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
}

fn missing(kind: &str, field: &'static str) -> OrreryError {
    OrreryError::MissingField {
        kind: kind.to_string(),
        field,
    }
}

impl Scene {
    fn parent_pair(&self, d: &EntityDoc) -> OrreryResult<(EntityIx, EntityIx)> {
        if d.parents.len() != 2 {
            return Err(OrreryError::ImpossibleGeometry(format!(
                "{} {} needs exactly 2 parents, got {}",
                d.entity,
                d.id,
                d.parents.len()
            )));
        }
        Ok((self.get_by_id(&d.parents[0])?, self.get_by_id(&d.parents[1])?))
    }

    fn wire_emitter(&mut self, ix: EntityIx, d: &EntityDoc) -> OrreryResult<()> {
        for (name, measure_id) in &d.inputs {
            let m_ix = self.get_by_id(measure_id)?;
            let measure = self.arena().as_measure(m_ix)?;
            self.arena_mut().add_emitter_input(ix, name.clone(), measure)?;
        }
        if !d.data.is_empty() {
            if let Some(emitter) = self.arena_mut().emitter_mut(ix) {
                emitter.message.set_data(d.data.clone())?;
            }
        }
        Ok(())
    }

    /// Build this scene up from a descriptor document. The first error
    /// aborts the load; already-registered descriptors stay registered
    /// (a failing load is not transactional).
    pub fn load(&mut self, doc: &SceneDoc) -> OrreryResult<()> {
        for layer in &doc.layers {
            for d in &layer.children {
                match d.entity.as_str() {
                    "point" => {
                        let [x, y] = d.coords.ok_or_else(|| missing(&d.entity, "coords"))?;
                        self.add_anchor(d.id.clone(), layer.rank, Point2::new(x, y))?;
                    }
                    "line" => {
                        let (a, b) = self.parent_pair(d)?;
                        self.add_line(d.id.clone(), layer.rank, a, b)?;
                    }
                    "circle" => {
                        let centre_id =
                            d.centre.as_ref().ok_or_else(|| missing(&d.entity, "centre"))?;
                        let centre = self.get_by_id(centre_id)?;
                        let radius = d.radius.ok_or_else(|| missing(&d.entity, "radius"))?;
                        let orientation = d
                            .orientation
                            .ok_or_else(|| missing(&d.entity, "orientation"))?;
                        self.add_circle(d.id.clone(), layer.rank, centre, radius, orientation)?;
                    }
                    "slider" => {
                        let parent_id =
                            d.parent.as_ref().ok_or_else(|| missing(&d.entity, "parent"))?;
                        let parent = self.get_by_id(parent_id)?;
                        self.add_slider(
                            d.id.clone(),
                            layer.rank,
                            parent,
                            d.position,
                            d.velocity,
                            d.looping,
                            d.inherit_velocity,
                        )?;
                    }
                    "intersection" => {
                        let (a, b) = self.parent_pair(d)?;
                        self.add_intersection(d.id.clone(), layer.rank, a, b)?;
                    }
                    "distance" => {
                        let (a, b) = self.parent_pair(d)?;
                        self.add_distance(d.id.clone(), layer.rank, a, b)?;
                    }
                    "angle" => {
                        let (a, b) = self.parent_pair(d)?;
                        self.add_angle(d.id.clone(), layer.rank, a, b)?;
                    }
                    "control" => {
                        let [x, y] = d.coords.ok_or_else(|| missing(&d.entity, "coords"))?;
                        let path = d.path.as_ref().ok_or_else(|| missing(&d.entity, "path"))?;
                        let ix = self.add_control(
                            d.id.clone(),
                            layer.rank,
                            Point2::new(x, y),
                            path.clone().into_bytes(),
                        )?;
                        self.wire_emitter(ix, d)?;
                    }
                    "bumper" => {
                        let parent_id =
                            d.parent.as_ref().ok_or_else(|| missing(&d.entity, "parent"))?;
                        let parent = self.get_by_id(parent_id)?;
                        let target_id = d
                            .collides_with
                            .as_ref()
                            .ok_or_else(|| missing(&d.entity, "collides_with"))?;
                        let target = self.get_by_id(target_id)?;
                        let path = d.path.as_ref().ok_or_else(|| missing(&d.entity, "path"))?;
                        let ix = self.add_bumper(
                            d.id.clone(),
                            layer.rank,
                            parent,
                            d.position,
                            d.velocity,
                            target,
                            path.clone().into_bytes(),
                            d.looping,
                            d.inherit_velocity,
                        )?;
                        self.wire_emitter(ix, d)?;
                    }
                    other => return Err(OrreryError::UnknownKind(other.to_string())),
                }
            }
        }
        Ok(())
    }
}
