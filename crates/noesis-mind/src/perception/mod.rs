//! Perception component: periodic scans of nearby entities plus
//! environmental synthesis, exposed through the capability registry.

mod environment;
mod grid;
mod object;

use std::collections::BTreeMap;

use noesis_core::{
    CapabilityError, CapabilityProvider, CapabilityRegistry, ParamKind, ParamSpec,
    ResourceDescriptor, TickContext, ToolArgs, ToolDescriptor, Vec3, WorldQuery,
};
use serde_json::{json, Value};

use crate::config::PerceptionConfig;

pub use environment::{time_period, Environment};
pub use grid::{Cluster, GridSummary, SpatialGrid};
pub use object::{classify, stable_id, PerceivedObject};

/// Scan state machine: idle → scanning → idle, driven by accumulated tick
/// time rather than wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
}

pub struct PerceptionComponent {
    config: PerceptionConfig,
    registry: CapabilityRegistry,
    agent_id: String,
    active: bool,
    state: ScanState,
    accumulated: f32,
    objects: Vec<PerceivedObject>,
    grid: SpatialGrid,
    environment: Environment,
    day: u32,
    hour: u32,
    minute: u32,
    last_scan_tick: u64,
    context_changed: bool,
    last_signature: String,
}

/// Category tags never reported by a scan.
const EXCLUDED_CATEGORIES: &[&str] = &["terrain", "structural"];

impl PerceptionComponent {
    pub fn new(agent_id: impl Into<String>, config: PerceptionConfig) -> Self {
        let environment = Environment::default();
        let last_signature = environment.signature();
        Self {
            config,
            registry: build_registry(),
            agent_id: agent_id.into(),
            active: true,
            state: ScanState::Idle,
            accumulated: 0.0,
            objects: Vec::new(),
            grid: SpatialGrid::default(),
            environment,
            day: 0,
            hour: 12,
            minute: 0,
            last_scan_tick: 0,
            context_changed: false,
            last_signature,
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn objects(&self) -> &[PerceivedObject] {
        &self.objects
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Day/night notifier push; no polling.
    pub fn notify_time(&mut self, day: u32, hour: u32, minute: u32) {
        self.day = day;
        self.hour = hour;
        self.minute = minute;
        self.environment =
            environment::synthesize(&self.config, day, hour, minute, &self.objects);
    }

    /// Accumulate tick time and scan when the interval elapses.
    pub fn tick(&mut self, ctx: &TickContext, world: &dyn WorldQuery, observer: Vec3) {
        self.accumulated += ctx.dt_seconds;
        if self.accumulated < self.config.scan_interval {
            return;
        }
        self.accumulated = 0.0;
        self.scan(ctx.tick, world, observer);
    }

    /// One full scan: query, perceive, bucket, synthesize.
    pub fn scan(&mut self, tick: u64, world: &dyn WorldQuery, observer: Vec3) {
        self.state = ScanState::Scanning;
        let radius = self.config.effective_vision_radius();

        let previous_count = self.objects.len();

        let mut objects: Vec<PerceivedObject> = world
            .entities_within(observer, radius)
            .iter()
            .filter(|e| {
                !e.categories
                    .iter()
                    .any(|c| EXCLUDED_CATEGORIES.contains(&c.as_str()))
            })
            .map(|e| object::perceive(e, observer, tick))
            .filter(|o| o.id != self.agent_id && o.distance <= radius)
            .collect();

        // Distance-ascending with id tiebreak keeps scans deterministic.
        objects.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        self.objects = objects;
        self.grid = SpatialGrid::build(self.config.grid_cell_size, &self.objects);
        self.environment = environment::synthesize(
            &self.config,
            self.day,
            self.hour,
            self.minute,
            &self.objects,
        );
        self.last_scan_tick = tick;

        let signature = self.environment.signature();
        if signature != self.last_signature || self.objects.len() != previous_count {
            self.context_changed = true;
            self.last_signature = signature;
        }

        tracing::debug!(
            agent_id = %self.agent_id,
            objects = self.objects.len(),
            environment = %self.environment.signature(),
            "perception scan complete"
        );
        self.state = ScanState::Idle;
    }

    /// Whether a significant context change happened since the last call.
    /// Consumed by the inflection component.
    pub fn take_context_changed(&mut self) -> bool {
        std::mem::take(&mut self.context_changed)
    }

    pub fn environment_signature(&self) -> String {
        self.environment.signature()
    }

    fn nearby_objects(&self, filter_type: Option<&str>, max_distance: Option<f32>) -> Value {
        let selected: Vec<&PerceivedObject> = self
            .objects
            .iter()
            .filter(|o| filter_type.map_or(true, |t| o.kind == t))
            .filter(|o| max_distance.map_or(true, |d| o.distance <= d))
            .collect();

        json!({
            "objects": selected,
            "summary": self.summarize(&selected),
        })
    }

    fn summarize(&self, objects: &[&PerceivedObject]) -> Value {
        let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
        let mut moving = 0usize;
        for object in objects {
            *by_type.entry(object.kind.as_str()).or_default() += 1;
            if object.is_moving {
                moving += 1;
            }
        }

        // Objects are stored distance-ascending, so the bounds are the ends.
        let closest = objects.first().map(|o| o.distance);
        let furthest = objects.last().map(|o| o.distance);

        json!({
            "total": objects.len(),
            "by_type": by_type,
            "moving": moving,
            "stationary": objects.len() - moving,
            "closest_distance": closest,
            "furthest_distance": furthest,
        })
    }

    fn find_object(&self, id: Option<&str>, kind: Option<&str>) -> Value {
        let found = self.objects.iter().find(|o| {
            id.map_or(true, |id| o.id == id) && kind.map_or(true, |k| o.kind == k)
        });
        match found {
            Some(object) => json!({ "found": true, "object": object }),
            None => json!({ "found": false }),
        }
    }

    fn spatial_analysis(&self) -> Value {
        let radius = self.config.effective_vision_radius();
        let near_limit = radius * 0.3;
        let medium_limit = radius * 0.7;

        let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
        let (mut near, mut medium, mut far) = (0usize, 0usize, 0usize);
        let mut moving = 0usize;

        for object in &self.objects {
            *by_type.entry(object.kind.as_str()).or_default() += 1;
            if object.distance < near_limit {
                near += 1;
            } else if object.distance < medium_limit {
                medium += 1;
            } else {
                far += 1;
            }
            if object.is_moving {
                moving += 1;
            }
        }

        let clusters = grid::cluster(&self.objects, self.config.clustering_radius);

        json!({
            "total": self.objects.len(),
            "by_type": by_type,
            "by_distance": { "near": near, "medium": medium, "far": far },
            "by_movement": { "moving": moving, "stationary": self.objects.len() - moving },
            "clusters": clusters,
        })
    }

    fn snapshot(&self) -> Value {
        json!({
            "agent_id": self.agent_id,
            "state": match self.state {
                ScanState::Idle => "idle",
                ScanState::Scanning => "scanning",
            },
            "vision_radius": self.config.effective_vision_radius(),
            "last_scan_tick": self.last_scan_tick,
            "objects": self.objects,
            "environment": self.environment,
        })
    }

    fn temporal(&self) -> Value {
        json!({
            "day": self.day,
            "hour": self.hour,
            "minute": self.minute,
            "time_of_day": self.environment.time_of_day,
        })
    }
}

fn build_registry() -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();

    registry.register_tool(
        ToolDescriptor::new(
            "get_nearby_objects",
            "List perceived objects sorted by distance, with a summary",
        )
        .with_param(
            "type",
            ParamSpec::new(ParamKind::String, "Only objects of this classification"),
            false,
        )
        .with_param(
            "max_distance",
            ParamSpec::new(ParamKind::Number, "Only objects within this distance"),
            false,
        ),
    );
    registry.register_tool(
        ToolDescriptor::new("find_object", "Find one object by id and/or type")
            .with_param(
                "id",
                ParamSpec::new(ParamKind::String, "Stable object id"),
                false,
            )
            .with_param(
                "type",
                ParamSpec::new(ParamKind::String, "Classification tag"),
                false,
            ),
    );
    registry.register_tool(ToolDescriptor::new(
        "get_spatial_analysis",
        "Counts by type, distance band and movement, plus clustering",
    ));

    registry.register_resource(ResourceDescriptor::new(
        "snapshot",
        "Full perception snapshot: objects, environment, scan state",
    ));
    registry.register_resource(ResourceDescriptor::new(
        "environment",
        "Synthesized environmental conditions",
    ));
    registry.register_resource(ResourceDescriptor::new(
        "temporal",
        "Injected world time and derived period",
    ));
    registry.register_resource(ResourceDescriptor::new(
        "objects",
        "Raw perceived object list",
    ));
    registry.register_resource(ResourceDescriptor::new(
        "spatial_grid",
        "Occupied grid cells and their object counts",
    ));

    registry
}

impl CapabilityProvider for PerceptionComponent {
    fn subsystem_name(&self) -> &str {
        "perception"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    fn handle_tool(&mut self, name: &str, args: &ToolArgs) -> Result<Value, CapabilityError> {
        match name {
            "get_nearby_objects" => {
                let filter = args.get("type").and_then(Value::as_str);
                let max_distance = args
                    .get("max_distance")
                    .and_then(Value::as_f64)
                    .map(|d| d as f32);
                Ok(self.nearby_objects(filter, max_distance))
            }
            "find_object" => {
                let id = args.get("id").and_then(Value::as_str);
                let kind = args.get("type").and_then(Value::as_str);
                if id.is_none() && kind.is_none() {
                    return Err(CapabilityError::InvalidArgument {
                        name: name.to_string(),
                        reason: "at least one of `id` or `type` is required".to_string(),
                    });
                }
                Ok(self.find_object(id, kind))
            }
            "get_spatial_analysis" => Ok(self.spatial_analysis()),
            other => Err(CapabilityError::ToolNotFound(other.to_string())),
        }
    }

    fn handle_resource(&self, name: &str) -> Result<Value, CapabilityError> {
        match name {
            "snapshot" => Ok(self.snapshot()),
            "environment" => Ok(serde_json::to_value(&self.environment)
                .unwrap_or(Value::Null)),
            "temporal" => Ok(self.temporal()),
            "objects" => Ok(json!(self.objects)),
            "spatial_grid" => Ok(serde_json::to_value(self.grid.summary())
                .unwrap_or(Value::Null)),
            other => Err(CapabilityError::ResourceNotFound(other.to_string())),
        }
    }
}
