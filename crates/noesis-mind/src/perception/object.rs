use noesis_core::{Vec3, WorldEntity};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// A perceived entity, recomputed wholesale on every scan.
///
/// No identity is persisted across ticks; the stable id exists so that two
/// scans of the same world entity agree on a name, not so the component can
/// track it.
#[derive(Debug, Clone, Serialize)]
pub struct PerceivedObject {
    pub id: String,
    pub kind: String,
    pub position: Vec3,
    pub relative_position: Vec3,
    pub distance: f32,
    pub direction: Vec3,
    pub velocity: Vec3,
    pub is_moving: bool,
    pub seen_at_tick: u64,
    pub properties: Map<String, Value>,
}

const MOVING_SPEED_EPSILON: f32 = 0.05;

/// Category tags recognized directly, in priority order.
const KNOWN_CATEGORIES: &[&str] = &[
    "player",
    "npc",
    "animal",
    "light_source",
    "door",
    "container",
    "item",
];

/// Name-substring fallbacks, checked when no category tag matches.
const NAME_HEURISTICS: &[(&str, &str)] = &[
    ("player", "player"),
    ("npc", "npc"),
    ("villager", "npc"),
    ("guard", "npc"),
    ("horse", "animal"),
    ("dog", "animal"),
    ("cat", "animal"),
    ("lamp", "light_source"),
    ("torch", "light_source"),
    ("lantern", "light_source"),
    ("light", "light_source"),
    ("door", "door"),
    ("gate", "door"),
    ("chest", "container"),
    ("crate", "container"),
    ("barrel", "container"),
];

/// Classification priority: explicit category tags, then name-substring
/// heuristics, else "unknown".
pub fn classify(entity: &WorldEntity) -> String {
    for known in KNOWN_CATEGORIES {
        if entity.categories.iter().any(|c| c == known) {
            return (*known).to_string();
        }
    }

    let name = entity.name.to_lowercase();
    for (needle, kind) in NAME_HEURISTICS {
        if name.contains(needle) {
            return (*kind).to_string();
        }
    }

    "unknown".to_string()
}

/// Stable identifier: explicit id > normalized name > instance fallback.
pub fn stable_id(entity: &WorldEntity) -> String {
    if let Some(id) = &entity.id {
        if !id.is_empty() {
            return id.clone();
        }
    }

    let normalized: String = entity
        .name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if !normalized.is_empty() {
        return normalized;
    }

    format!("obj-{}", Uuid::new_v4())
}

pub fn perceive(entity: &WorldEntity, observer: Vec3, tick: u64) -> PerceivedObject {
    let relative = entity.position - observer;
    let distance = relative.length();
    PerceivedObject {
        id: stable_id(entity),
        kind: classify(entity),
        position: entity.position,
        relative_position: relative,
        distance,
        direction: relative.normalized_or_zero(),
        velocity: entity.velocity,
        is_moving: entity.velocity.length() > MOVING_SPEED_EPSILON,
        seen_at_tick: tick,
        properties: entity.properties.clone(),
    }
}
