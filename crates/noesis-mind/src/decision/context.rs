//! Decision context assembly and normalization.
//!
//! The context bundle is built fresh per request from perception/execution
//! resources plus agent identity, then normalized and hashed for cache
//! lookup. Normalization strips volatile timestamp-like fields and sorts
//! unordered arrays so that two semantically equal contexts hash alike.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use noesis_core::{read_resource, CapabilityProvider, EventSink};
use serde::Serialize;
use serde_json::{json, Value};

use crate::mind::AgentIdentity;

#[derive(Debug, Clone, Serialize)]
pub struct DecisionContext {
    pub agent_id: String,
    pub agent_name: String,
    pub available_actions: Vec<String>,
    pub current_needs: String,
    pub nearby_objects: Vec<Value>,
    pub current_goals: String,
    pub emotional_state: String,
    pub time_of_day: String,
    pub execution_status: String,
    pub queued_actions: u64,
}

/// Keys stripped during normalization. Anything carrying a tick or wall
/// timestamp is volatile by definition.
const VOLATILE_KEYS: &[&str] = &[
    "timestamp",
    "queued_at_tick",
    "seen_at_tick",
    "completed_at_tick",
    "interrupted_at_tick",
    "last_scan_tick",
];

/// Array-valued fields whose element order is not significant.
const UNORDERED_KEYS: &[&str] = &["nearby_objects", "available_actions"];

impl DecisionContext {
    /// Gather the bundle through the capability registry; no direct
    /// component coupling.
    pub fn build(
        identity: &AgentIdentity,
        needs: &str,
        goals: &str,
        emotion: &str,
        perception: &dyn CapabilityProvider,
        execution: &dyn CapabilityProvider,
        tick: u64,
        sink: &mut dyn EventSink,
    ) -> Self {
        let temporal = read_resource(perception, "temporal", tick, sink).unwrap_or(Value::Null);
        let objects = read_resource(perception, "objects", tick, sink).unwrap_or(Value::Null);
        let state =
            read_resource(execution, "execution_state", tick, sink).unwrap_or(Value::Null);

        let nearby_objects = objects
            .as_array()
            .map(|objects| {
                objects
                    .iter()
                    .map(|o| {
                        json!({
                            "id": o.get("id").cloned().unwrap_or(Value::Null),
                            "type": o.get("kind").cloned().unwrap_or(Value::Null),
                            "distance": o.get("distance").cloned().unwrap_or(Value::Null),
                            "is_moving": o.get("is_moving").cloned().unwrap_or(Value::Null),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            agent_id: identity.id.clone(),
            agent_name: identity.name.clone(),
            available_actions: execution.registry().tool_names(),
            current_needs: needs.to_string(),
            nearby_objects,
            current_goals: goals.to_string(),
            emotional_state: emotion.to_string(),
            time_of_day: temporal
                .get("time_of_day")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            execution_status: state
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("idle")
                .to_string(),
            queued_actions: state
                .get("queue_length")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        }
    }

    /// Normalized hash for cache lookup.
    pub fn context_hash(&self) -> u64 {
        let value = serde_json::to_value(self).unwrap_or(Value::Null);
        let normalized = normalize(value);
        let canonical = normalized.to_string();
        let mut hasher = DefaultHasher::new();
        canonical.hash(&mut hasher);
        hasher.finish()
    }
}

/// Strip volatile keys and order-normalize unordered arrays, recursively.
pub fn normalize(value: Value) -> Value {
    normalize_inner(value, None)
}

fn normalize_inner(value: Value, key: Option<&str>) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                if VOLATILE_KEYS.contains(&k.as_str()) {
                    continue;
                }
                let normalized = normalize_inner(v, Some(&k));
                out.insert(k, normalized);
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            let mut normalized: Vec<Value> = items
                .into_iter()
                .map(|v| normalize_inner(v, None))
                .collect();
            if key.map_or(false, |k| UNORDERED_KEYS.contains(&k)) {
                normalized.sort_by_key(|v| v.to_string());
            }
            Value::Array(normalized)
        }
        other => other,
    }
}
