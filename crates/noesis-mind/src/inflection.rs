//! Inflection component: decides *when* a new decision should be requested.
//!
//! A cooldown gates everything; once past it, independent trigger predicates
//! are evaluated and a decision check fires when at least one holds.

use noesis_core::{EventSink, MindEvent};
use serde_json::json;

use crate::config::InflectionConfig;

/// Inputs sampled from the other components each check.
#[derive(Debug, Clone)]
pub struct InflectionInputs<'a> {
    /// No active action and an empty queue.
    pub agent_idle: bool,
    /// Compact environment signature from perception.
    pub environment_signature: &'a str,
    /// Perception reported a significant context change since last check.
    pub perception_changed: bool,
    /// Compact goal/need signature from the state modules.
    pub goal_signature: &'a str,
}

pub struct InflectionComponent {
    config: InflectionConfig,
    /// Accumulated simulation seconds.
    now: f32,
    last_decision_at: f32,
    last_environment: Option<String>,
    last_goal: Option<String>,
}

impl InflectionComponent {
    pub fn new(config: InflectionConfig) -> Self {
        Self {
            config,
            now: 0.0,
            last_decision_at: 0.0,
            last_environment: None,
            last_goal: None,
        }
    }

    pub fn tick(&mut self, dt_seconds: f32) {
        self.now += dt_seconds;
    }

    pub fn seconds_since_last_decision(&self) -> f32 {
        self.now - self.last_decision_at
    }

    /// Evaluate the gate and trigger predicates. Returns the active trigger
    /// names when the check fires, resetting the cooldown timer.
    pub fn should_make_decision(
        &mut self,
        inputs: &InflectionInputs<'_>,
        tick: u64,
        sink: &mut dyn EventSink,
    ) -> Option<Vec<&'static str>> {
        if self.seconds_since_last_decision() < self.config.decision_cooldown {
            return None;
        }

        let mut triggers = Vec::new();

        if self.seconds_since_last_decision() >= self.config.routine_interval {
            triggers.push("routine_check");
        }

        let environment_changed = self
            .last_environment
            .as_deref()
            .map(|prev| prev != inputs.environment_signature)
            .unwrap_or(false);
        self.last_environment = Some(inputs.environment_signature.to_string());
        if environment_changed {
            triggers.push("environment_changed");
        }

        if inputs.agent_idle {
            triggers.push("agent_idle");
        }

        if inputs.perception_changed {
            triggers.push("context_change");
        }

        let goal_changed = self
            .last_goal
            .as_deref()
            .map(|prev| prev != inputs.goal_signature)
            .unwrap_or(false);
        self.last_goal = Some(inputs.goal_signature.to_string());
        if goal_changed {
            triggers.push("goal_changed");
        }

        if triggers.is_empty() {
            return None;
        }

        tracing::debug!(?triggers, "decision check triggered");
        sink.emit(
            MindEvent::new(tick, "inflection", "triggered")
                .with_payload(json!({ "triggers": triggers })),
        );
        self.last_decision_at = self.now;
        Some(triggers)
    }

    /// Attempt a check ignoring the cooldown; the prior timestamp is
    /// restored if nothing fires.
    pub fn force_decision_check(
        &mut self,
        inputs: &InflectionInputs<'_>,
        tick: u64,
        sink: &mut dyn EventSink,
    ) -> Option<Vec<&'static str>> {
        let saved = self.last_decision_at;
        self.last_decision_at = self.now - self.config.decision_cooldown;
        let fired = self.should_make_decision(inputs, tick, sink);
        if fired.is_none() {
            self.last_decision_at = saved;
        }
        fired
    }
}
