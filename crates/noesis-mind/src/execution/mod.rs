//! Execution component: a priority queue of pending actions and a single
//! active action advanced per tick through a type-specific state machine.

mod action;

use std::collections::{BTreeMap, VecDeque};

use noesis_core::{
    CapabilityError, CapabilityProvider, CapabilityRegistry, EventSink, MindEvent, Mover,
    ParamKind, ParamSpec, ResourceDescriptor, TickContext, ToolArgs, ToolDescriptor, Vec3,
};
use serde_json::{json, Map, Value};

use crate::config::ExecutionConfig;

pub use action::{
    parse_priority, ActionKind, ActiveAction, ActiveState, CompletedAction, ExecutionStatus,
    InterruptedAction, QueuedAction, PRIORITY_HIGH, PRIORITY_LOW, PRIORITY_NORMAL,
};

/// Floor applied to the movement speed, from configuration and the
/// `set_movement_speed` tool alike. Zero speed would stall every move.
const MIN_MOVEMENT_SPEED: f32 = 0.1;

pub struct ExecutionComponent {
    config: ExecutionConfig,
    registry: CapabilityRegistry,
    agent_id: String,
    active_subsystem: bool,
    queue: Vec<QueuedAction>,
    active: Option<ActiveAction>,
    completed: VecDeque<CompletedAction>,
    interrupted: VecDeque<InterruptedAction>,
    movement_speed: f32,
    velocity: Vec3,
    facing: Vec3,
    last_position: Vec3,
    next_seq: u64,
    current_tick: u64,
    /// Events produced outside a tick (e.g. tool handlers); flushed to the
    /// host sink on the next tick.
    pending_events: Vec<MindEvent>,
}

impl ExecutionComponent {
    pub fn new(agent_id: impl Into<String>, config: ExecutionConfig) -> Self {
        let movement_speed = config.movement_speed.max(MIN_MOVEMENT_SPEED);
        Self {
            config,
            registry: build_registry(),
            agent_id: agent_id.into(),
            active_subsystem: true,
            queue: Vec::new(),
            active: None,
            completed: VecDeque::new(),
            interrupted: VecDeque::new(),
            movement_speed,
            velocity: Vec3::ZERO,
            facing: Vec3::new(0.0, 0.0, 1.0),
            last_position: Vec3::ZERO,
            next_seq: 0,
            current_tick: 0,
            pending_events: Vec::new(),
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active_subsystem = active;
    }

    pub fn status(&self) -> ExecutionStatus {
        self.active
            .as_ref()
            .map(|a| a.state.status())
            .unwrap_or(ExecutionStatus::Idle)
    }

    /// Idle means nothing running and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn completed_history(&self) -> impl Iterator<Item = &CompletedAction> {
        self.completed.iter()
    }

    pub fn interruptions(&self) -> impl Iterator<Item = &InterruptedAction> {
        self.interrupted.iter()
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Enqueue an action request. Unknown kinds are accepted here and fail
    /// at dispatch.
    pub fn queue_action(
        &mut self,
        kind: impl Into<String>,
        params: Map<String, Value>,
        priority: i32,
    ) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(QueuedAction {
            kind: kind.into(),
            params,
            priority,
            queued_at_tick: self.current_tick,
            seq,
        });
        seq
    }

    /// Force-complete the active action as failed and record the
    /// interruption.
    pub fn interrupt_current_action(&mut self, reason: &str) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };

        self.push_interrupted(InterruptedAction {
            kind: active.request.kind.clone(),
            reason: reason.to_string(),
            interrupted_at_tick: self.current_tick,
        });
        self.velocity = Vec3::ZERO;

        tracing::info!(
            agent_id = %self.agent_id,
            kind = %active.request.kind,
            reason,
            "action interrupted"
        );
        self.pending_events.push(
            MindEvent::new(self.current_tick, "execution", "action_interrupted").with_payload(
                json!({
                    "kind": active.request.kind,
                    "reason": reason,
                }),
            ),
        );
        true
    }

    /// Drop all pending entries; optionally interrupt the active action too.
    pub fn clear_action_queue(&mut self, keep_current: bool) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        if !keep_current {
            self.interrupt_current_action("queue_cleared");
        }
        dropped
    }

    pub fn set_movement_speed(&mut self, speed: f32) {
        self.movement_speed = speed.max(MIN_MOVEMENT_SPEED);
    }

    /// Advance the active action, dispatching from the queue when idle.
    pub fn tick(&mut self, ctx: &TickContext, mover: &mut dyn Mover, sink: &mut dyn EventSink) {
        self.current_tick = ctx.tick;
        self.last_position = mover.position();

        for event in self.pending_events.drain(..) {
            sink.emit(event);
        }

        if self.active.is_none() {
            self.dispatch_next(mover, sink);
        }

        self.run_active(ctx, mover, sink);

        if self.active.is_none() && self.queue.is_empty() {
            self.velocity = Vec3::ZERO;
        }
    }

    /// Pop the highest-priority entry (ties broken by arrival order) and
    /// initialize its type-specific state. Entries that fail initialization
    /// are recorded as unsuccessful and the next candidate is tried.
    fn dispatch_next(&mut self, mover: &mut dyn Mover, sink: &mut dyn EventSink) {
        while self.active.is_none() {
            let Some(best) = self.take_best() else {
                return;
            };

            match self.init_action(&best, mover) {
                Ok(state) => {
                    sink.emit(
                        MindEvent::new(self.current_tick, "execution", "action_started")
                            .with_payload(json!({
                                "kind": best.kind,
                                "priority": best.priority,
                                "queued_at_tick": best.queued_at_tick,
                            })),
                    );
                    self.active = Some(ActiveAction {
                        request: best,
                        state,
                        elapsed: 0.0,
                    });
                }
                Err(reason) => {
                    tracing::warn!(
                        agent_id = %self.agent_id,
                        kind = %best.kind,
                        reason,
                        "action dispatch failed"
                    );
                    let kind = best.kind.clone();
                    self.record_completed(
                        kind,
                        false,
                        json!({ "error": reason }),
                        sink,
                    );
                }
            }
        }
    }

    fn take_best(&mut self) -> Option<QueuedAction> {
        let mut best: Option<usize> = None;
        for (index, entry) in self.queue.iter().enumerate() {
            let better = match best {
                None => true,
                Some(current) => {
                    let cur = &self.queue[current];
                    entry.priority > cur.priority
                        || (entry.priority == cur.priority && entry.seq < cur.seq)
                }
            };
            if better {
                best = Some(index);
            }
        }
        best.map(|index| self.queue.remove(index))
    }

    fn init_action(
        &self,
        request: &QueuedAction,
        mover: &mut dyn Mover,
    ) -> Result<ActiveState, String> {
        let kind = ActionKind::from_name(&request.kind)
            .ok_or_else(|| format!("unknown action type `{}`", request.kind))?;

        match kind {
            ActionKind::Move => {
                let target = request
                    .params
                    .get("target")
                    .and_then(action::parse_target)
                    .ok_or_else(|| "move requires a `target` position".to_string())?;
                Ok(ActiveState::Moving { target })
            }
            ActionKind::Wait => {
                let duration = request
                    .params
                    .get("duration")
                    .and_then(Value::as_f64)
                    .map(|d| d as f32)
                    .unwrap_or(self.config.default_wait_duration);
                Ok(ActiveState::Waiting { duration })
            }
            ActionKind::Face => {
                let direction = action::parse_direction(&request.params, mover.position())
                    .ok_or_else(|| "face requires a `target` or `direction`".to_string())?;
                Ok(ActiveState::Turning { direction })
            }
            ActionKind::Interact => {
                let target = request
                    .params
                    .get("target")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let duration = request
                    .params
                    .get("duration")
                    .and_then(Value::as_f64)
                    .map(|d| d as f32)
                    .unwrap_or(self.config.default_interact_duration);
                Ok(ActiveState::Interacting { target, duration })
            }
        }
    }

    fn run_active(&mut self, ctx: &TickContext, mover: &mut dyn Mover, sink: &mut dyn EventSink) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.elapsed += ctx.dt_seconds;

        let done: Option<(bool, Value)> = match active.state.clone() {
            ActiveState::Moving { target } => {
                let position = mover.position();
                let to_target = target - position;
                let distance = to_target.length();
                if distance <= self.config.arrival_threshold {
                    self.velocity = Vec3::ZERO;
                    Some((true, json!({ "arrived": true, "position": position })))
                } else {
                    // Clamp the step to the remaining distance; a full step
                    // past the target would oscillate instead of arriving.
                    let max_step = self.movement_speed * ctx.dt_seconds;
                    let speed = if ctx.dt_seconds > 0.0 && max_step > distance {
                        distance / ctx.dt_seconds
                    } else {
                        self.movement_speed
                    };
                    self.velocity = to_target.normalized_or_zero() * speed;
                    let resolved = mover.apply_velocity(self.velocity, ctx.dt_seconds);
                    self.last_position = resolved;
                    if target.distance(resolved) <= self.config.arrival_threshold {
                        self.velocity = Vec3::ZERO;
                        Some((true, json!({ "arrived": true, "position": resolved })))
                    } else {
                        None
                    }
                }
            }
            ActiveState::Waiting { duration } => {
                if active.elapsed >= duration {
                    Some((true, json!({ "waited": duration })))
                } else {
                    None
                }
            }
            ActiveState::Turning { direction } => {
                mover.set_facing(direction);
                self.facing = direction;
                Some((true, json!({ "facing": direction })))
            }
            ActiveState::Interacting { target, duration } => {
                if active.elapsed >= duration {
                    Some((true, json!({ "interacted_with": target })))
                } else {
                    None
                }
            }
        };

        if let Some((success, result)) = done {
            let finished = self.active.take().map(|a| a.request.kind);
            if let Some(kind) = finished {
                self.record_completed(kind, success, result, sink);
            }
        }
    }

    fn record_completed(
        &mut self,
        kind: String,
        success: bool,
        result: Value,
        sink: &mut dyn EventSink,
    ) {
        sink.emit(
            MindEvent::new(self.current_tick, "execution", "action_completed").with_payload(
                json!({
                    "kind": kind,
                    "success": success,
                    "result": result,
                }),
            ),
        );
        if self.completed.len() == self.config.history_capacity {
            self.completed.pop_front();
        }
        self.completed.push_back(CompletedAction {
            kind,
            success,
            result,
            completed_at_tick: self.current_tick,
        });
    }

    fn push_interrupted(&mut self, entry: InterruptedAction) {
        if self.interrupted.len() == self.config.interruption_capacity {
            self.interrupted.pop_front();
        }
        self.interrupted.push_back(entry);
    }

    fn estimate_duration(&self, entry: &QueuedAction) -> f32 {
        match ActionKind::from_name(&entry.kind) {
            Some(ActionKind::Move) => entry
                .params
                .get("target")
                .and_then(action::parse_target)
                .map(|target| target.distance(self.last_position) / self.movement_speed)
                .unwrap_or(0.0),
            Some(ActionKind::Wait) => entry
                .params
                .get("duration")
                .and_then(Value::as_f64)
                .map(|d| d as f32)
                .unwrap_or(self.config.default_wait_duration),
            Some(ActionKind::Interact) => entry
                .params
                .get("duration")
                .and_then(Value::as_f64)
                .map(|d| d as f32)
                .unwrap_or(self.config.default_interact_duration),
            Some(ActionKind::Face) | None => 0.0,
        }
    }

    fn queue_stats(&self) -> Value {
        let mut by_priority: BTreeMap<i32, usize> = BTreeMap::new();
        let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
        let mut drain = 0.0f32;

        for entry in &self.queue {
            *by_priority.entry(entry.priority).or_default() += 1;
            *by_kind.entry(entry.kind.as_str()).or_default() += 1;
            drain += self.estimate_duration(entry);
        }

        json!({
            "pending": self.queue.len(),
            "by_priority": by_priority
                .iter()
                .map(|(p, c)| (p.to_string(), *c))
                .collect::<BTreeMap<String, usize>>(),
            "by_kind": by_kind,
            "estimated_drain_seconds": drain,
        })
    }

    fn execution_state(&self) -> Value {
        json!({
            "agent_id": self.agent_id,
            "status": self.status(),
            "is_idle": self.is_idle(),
            "active": self.active.as_ref().map(|a| json!({
                "kind": a.request.kind,
                "priority": a.request.priority,
                "elapsed": a.elapsed,
            })),
            "queue_length": self.queue.len(),
            "queue": self.queue,
        })
    }
}

fn build_registry() -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();

    registry.register_tool(
        ToolDescriptor::new(
            "queue_action",
            "Queue an action (move, wait, face, interact) with a priority",
        )
        .with_param(
            "type",
            ParamSpec::new(ParamKind::String, "Action type"),
            true,
        )
        .with_param(
            "priority",
            ParamSpec::new(ParamKind::Number, "Priority level (higher runs first)"),
            false,
        )
        .with_param(
            "target",
            ParamSpec::new(ParamKind::Object, "Target position or entity id"),
            false,
        )
        .with_param(
            "duration",
            ParamSpec::new(ParamKind::Number, "Duration in seconds for wait/interact"),
            false,
        ),
    );
    registry.register_tool(
        ToolDescriptor::new(
            "interrupt_current_action",
            "Force-fail the active action and record the interruption",
        )
        .with_param(
            "reason",
            ParamSpec::new(ParamKind::String, "Why the action was interrupted"),
            false,
        ),
    );
    registry.register_tool(
        ToolDescriptor::new("clear_action_queue", "Drop all pending actions").with_param(
            "keep_current",
            ParamSpec::new(ParamKind::Bool, "Keep the active action running"),
            false,
        ),
    );
    registry.register_tool(
        ToolDescriptor::new("set_movement_speed", "Change movement speed").with_param(
            "speed",
            ParamSpec::new(ParamKind::Number, "World units per second"),
            true,
        ),
    );

    registry.register_resource(ResourceDescriptor::new(
        "execution_state",
        "Status, active action and pending queue",
    ));
    registry.register_resource(ResourceDescriptor::new(
        "movement",
        "Velocity, facing, speed and last resolved position",
    ));
    registry.register_resource(ResourceDescriptor::new(
        "action_history",
        "Bounded completed and interrupted action history",
    ));
    registry.register_resource(ResourceDescriptor::new(
        "queue_stats",
        "Counts by priority/type and estimated time to drain",
    ));

    registry
}

impl CapabilityProvider for ExecutionComponent {
    fn subsystem_name(&self) -> &str {
        "execution"
    }

    fn is_active(&self) -> bool {
        self.active_subsystem
    }

    fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    fn handle_tool(&mut self, name: &str, args: &ToolArgs) -> Result<Value, CapabilityError> {
        match name {
            "queue_action" => {
                let kind = args
                    .get("type")
                    .and_then(Value::as_str)
                    .ok_or_else(|| CapabilityError::InvalidArgument {
                        name: name.to_string(),
                        reason: "`type` must be a string".to_string(),
                    })?
                    .to_string();
                let priority = action::parse_priority(args.get("priority"));
                let mut params = args.clone();
                params.remove("type");
                params.remove("priority");
                let seq = self.queue_action(kind, params, priority);
                Ok(json!({ "queued": true, "seq": seq, "pending": self.queue.len() }))
            }
            "interrupt_current_action" => {
                let reason = args
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or("unspecified")
                    .to_string();
                let interrupted = self.interrupt_current_action(&reason);
                Ok(json!({ "interrupted": interrupted, "reason": reason }))
            }
            "clear_action_queue" => {
                let keep_current = args
                    .get("keep_current")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let dropped = self.clear_action_queue(keep_current);
                Ok(json!({ "dropped": dropped, "kept_current": keep_current }))
            }
            "set_movement_speed" => {
                let speed = args
                    .get("speed")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| CapabilityError::InvalidArgument {
                        name: name.to_string(),
                        reason: "`speed` must be a number".to_string(),
                    })?;
                self.set_movement_speed(speed as f32);
                Ok(json!({ "speed": self.movement_speed }))
            }
            other => Err(CapabilityError::ToolNotFound(other.to_string())),
        }
    }

    fn handle_resource(&self, name: &str) -> Result<Value, CapabilityError> {
        match name {
            "execution_state" => Ok(self.execution_state()),
            "movement" => Ok(json!({
                "velocity": self.velocity,
                "facing": self.facing,
                "speed": self.movement_speed,
                "position": self.last_position,
            })),
            "action_history" => Ok(json!({
                "completed": self.completed,
                "interrupted": self.interrupted,
            })),
            "queue_stats" => Ok(self.queue_stats()),
            other => Err(CapabilityError::ResourceNotFound(other.to_string())),
        }
    }
}
