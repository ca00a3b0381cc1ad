use serde_json::{Map, Value};

use crate::math::Vec3;

/// An entity as reported by the host's spatial query.
///
/// This is raw host data; the perception component derives classification,
/// stable identity and relative geometry from it on every scan.
#[derive(Debug, Clone)]
pub struct WorldEntity {
    /// Explicit entity id, if the host assigns one.
    pub id: Option<String>,
    pub name: String,
    /// Category tags (e.g. "npc", "light_source", "terrain").
    pub categories: Vec<String>,
    pub position: Vec3,
    pub velocity: Vec3,
    pub properties: Map<String, Value>,
}

/// Read-only spatial access supplied by the host engine.
///
/// The core does not discover collaborators at runtime; perception takes a
/// `WorldQuery` reference at construction and nothing else.
pub trait WorldQuery {
    /// All entities within `radius` of `center`, in any order.
    fn entities_within(&self, center: Vec3, radius: f32) -> Vec<WorldEntity>;

    /// First entity id hit on the segment from `from` to `to`, if any.
    ///
    /// Secondary query shape; hosts without line-of-sight support may leave
    /// the default.
    fn ray_hit(&self, from: Vec3, to: Vec3) -> Option<String> {
        let _ = (from, to);
        None
    }
}

/// Movement collaborator supplied by the host engine.
///
/// The execution component decides velocity; the host integrates it and
/// resolves collisions. Physics semantics are entirely the host's concern.
pub trait Mover {
    fn position(&self) -> Vec3;

    /// Apply `velocity` for `dt_seconds` and return the resolved position.
    fn apply_velocity(&mut self, velocity: Vec3, dt_seconds: f32) -> Vec3;

    fn set_facing(&mut self, direction: Vec3);
}
