use noesis_core::Vec3;
use serde::Serialize;
use serde_json::{Map, Value};

/// Known action kinds.
///
/// Actions are queued with their kind as a raw string; unknown kinds survive
/// until dispatch, where they fail cleanly instead of crashing the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Move,
    Wait,
    Face,
    Interact,
}

impl ActionKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "move" => Some(Self::Move),
            "wait" => Some(Self::Wait),
            "face" => Some(Self::Face),
            "interact" => Some(Self::Interact),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Wait => "wait",
            Self::Face => "face",
            Self::Interact => "interact",
        }
    }
}

pub const PRIORITY_LOW: i32 = 0;
pub const PRIORITY_NORMAL: i32 = 1;
pub const PRIORITY_HIGH: i32 = 2;

/// Parse a priority argument: integer level or one of "low"/"normal"/"high".
pub fn parse_priority(value: Option<&Value>) -> i32 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(PRIORITY_NORMAL as i64) as i32,
        Some(Value::String(s)) => match s.to_lowercase().as_str() {
            "low" => PRIORITY_LOW,
            "high" => PRIORITY_HIGH,
            _ => PRIORITY_NORMAL,
        },
        _ => PRIORITY_NORMAL,
    }
}

/// A queued action request. Owned exclusively by the execution component
/// once enqueued.
#[derive(Debug, Clone, Serialize)]
pub struct QueuedAction {
    pub kind: String,
    pub params: Map<String, Value>,
    pub priority: i32,
    pub queued_at_tick: u64,
    /// Arrival order, used to break priority ties (stable dispatch).
    pub seq: u64,
}

/// Type-specific state of the action currently executing.
#[derive(Debug, Clone)]
pub enum ActiveState {
    Moving { target: Vec3 },
    Waiting { duration: f32 },
    Turning { direction: Vec3 },
    Interacting { target: Option<String>, duration: f32 },
}

#[derive(Debug, Clone)]
pub struct ActiveAction {
    pub request: QueuedAction,
    pub state: ActiveState,
    pub elapsed: f32,
}

/// Overall execution status derived from the active action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Idle,
    Moving,
    Waiting,
    Turning,
    Interacting,
}

impl ActiveState {
    pub fn status(&self) -> ExecutionStatus {
        match self {
            Self::Moving { .. } => ExecutionStatus::Moving,
            Self::Waiting { .. } => ExecutionStatus::Waiting,
            Self::Turning { .. } => ExecutionStatus::Turning,
            Self::Interacting { .. } => ExecutionStatus::Interacting,
        }
    }
}

/// Completed-action history entry.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedAction {
    pub kind: String,
    pub success: bool,
    pub result: Value,
    pub completed_at_tick: u64,
}

/// Interruption history entry.
#[derive(Debug, Clone, Serialize)]
pub struct InterruptedAction {
    pub kind: String,
    pub reason: String,
    pub interrupted_at_tick: u64,
}

/// Read a target position from action params: either `{x, y, z}` or
/// `[x, y, z]`.
pub fn parse_target(value: &Value) -> Option<Vec3> {
    match value {
        Value::Object(map) => {
            let x = map.get("x")?.as_f64()? as f32;
            let y = map.get("y")?.as_f64()? as f32;
            let z = map.get("z")?.as_f64()? as f32;
            Some(Vec3::new(x, y, z))
        }
        Value::Array(items) if items.len() == 3 => {
            let x = items[0].as_f64()? as f32;
            let y = items[1].as_f64()? as f32;
            let z = items[2].as_f64()? as f32;
            Some(Vec3::new(x, y, z))
        }
        _ => None,
    }
}

/// Read a facing direction: a target position, a direction vector, or a
/// cardinal name.
pub fn parse_direction(params: &Map<String, Value>, from: Vec3) -> Option<Vec3> {
    if let Some(target) = params.get("target").and_then(parse_target) {
        return Some((target - from).normalized_or_zero());
    }
    if let Some(direction) = params.get("direction") {
        if let Some(v) = parse_target(direction) {
            return Some(v.normalized_or_zero());
        }
        if let Some(name) = direction.as_str() {
            return cardinal(name);
        }
    }
    None
}

fn cardinal(name: &str) -> Option<Vec3> {
    match name.to_lowercase().as_str() {
        "north" => Some(Vec3::new(0.0, 0.0, -1.0)),
        "south" => Some(Vec3::new(0.0, 0.0, 1.0)),
        "east" => Some(Vec3::new(1.0, 0.0, 0.0)),
        "west" => Some(Vec3::new(-1.0, 0.0, 0.0)),
        _ => None,
    }
}
