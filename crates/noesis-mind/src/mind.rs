//! Agent assembly: one `Mind` owns the four components plus the stub state
//! modules and drives them from a single `tick`.

use std::sync::Arc;

use noesis_core::{EventLog, MindEvent, Mover, StateModule, StubModule, TickContext, WorldQuery};

use crate::config::MindConfig;
use crate::decision::{
    DecisionContext, DecisionOrchestrator, DecisionOutcome, OracleClient,
};
use crate::execution::{ExecutionComponent, PRIORITY_HIGH, PRIORITY_NORMAL};
use crate::inflection::{InflectionComponent, InflectionInputs};
use crate::perception::PerceptionComponent;

#[derive(Debug, Clone)]
pub struct AgentIdentity {
    pub id: String,
    pub name: String,
    /// Free-form persona text rendered into the prompt.
    pub persona: String,
}

impl AgentIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            persona: String::new(),
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }
}

/// The empty-shell subsystems every agent carries. They hold state but run
/// no logic of their own.
const STUB_MODULES: &[&str] = &[
    "needs",
    "emotion",
    "goals",
    "memory",
    "social",
    "identity",
    "reputation",
    "resource",
    "theory_of_mind",
];

pub struct Mind {
    pub identity: AgentIdentity,
    pub perception: PerceptionComponent,
    pub execution: ExecutionComponent,
    pub inflection: InflectionComponent,
    pub orchestrator: DecisionOrchestrator,
    modules: Vec<Box<dyn StateModule>>,
    events: EventLog,
    active: bool,
}

impl Mind {
    pub fn new(identity: AgentIdentity, config: MindConfig, client: Arc<dyn OracleClient>) -> Self {
        let perception = PerceptionComponent::new(identity.id.clone(), config.perception.clone());
        let execution = ExecutionComponent::new(identity.id.clone(), config.execution.clone());
        let inflection = InflectionComponent::new(config.inflection.clone());
        let orchestrator =
            DecisionOrchestrator::new(config.decision.clone(), config.oracle.clone(), client);

        let mut modules: Vec<Box<dyn StateModule>> = STUB_MODULES
            .iter()
            .map(|name| Box::new(StubModule::new(*name)) as Box<dyn StateModule>)
            .collect();
        for module in &mut modules {
            module.initialize();
        }

        Self {
            identity,
            perception,
            execution,
            inflection,
            orchestrator,
            modules,
            events: EventLog::new(config.event_log_capacity),
            active: true,
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.perception.set_active(active);
        self.execution.set_active(active);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn module(&self, name: &str) -> Option<&dyn StateModule> {
        self.modules
            .iter()
            .find(|m| m.name() == name)
            .map(|m| m.as_ref())
    }

    pub fn set_module_state(&mut self, name: &str, state: serde_json::Value) {
        // Stub modules are plain state holders; unknown names are added on
        // the fly so hosts can carry extra shells.
        match self.modules.iter().position(|m| m.name() == name) {
            Some(index) => {
                self.modules[index] = Box::new(StubModule::new(name).with_state(state));
            }
            None => self
                .modules
                .push(Box::new(StubModule::new(name).with_state(state))),
        }
    }

    fn module_summary(&self, name: &str) -> String {
        self.module(name)
            .filter(|m| m.is_active())
            .map(|m| m.summary())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "none".to_string())
    }

    fn goal_signature(&self) -> String {
        format!(
            "{}|{}",
            self.module_summary("goals"),
            self.module_summary("needs")
        )
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn recent_events(&self, limit: usize) -> Vec<&MindEvent> {
        self.events.recent(limit)
    }

    /// Day/night notifier passthrough.
    pub fn notify_time(&mut self, day: u32, hour: u32, minute: u32) {
        self.perception.notify_time(day, hour, minute);
    }

    /// One cooperative frame: perception scan, execution tick, inflection
    /// gate, decision request/poll. A deactivated mind is a no-op, so late
    /// oracle responses for it are never processed.
    pub fn tick(&mut self, ctx: &TickContext, world: &dyn WorldQuery, mover: &mut dyn Mover) {
        if !self.active {
            return;
        }

        self.perception.tick(ctx, world, mover.position());
        self.execution.tick(ctx, mover, &mut self.events);
        self.inflection.tick(ctx.dt_seconds);
        self.orchestrator.tick(ctx.tick, ctx.dt_seconds);

        let environment_signature = self.perception.environment_signature();
        let perception_changed = self.perception.take_context_changed();
        let goal_signature = self.goal_signature();
        let inputs = InflectionInputs {
            agent_idle: self.execution.is_idle(),
            environment_signature: &environment_signature,
            perception_changed,
            goal_signature: &goal_signature,
        };

        if let Some(triggers) =
            self.inflection
                .should_make_decision(&inputs, ctx.tick, &mut self.events)
        {
            self.request_decision(ctx, &triggers);
        }

        let _ = self
            .orchestrator
            .poll_responses(&mut self.execution, &mut self.events);
    }

    /// Attempt a decision check ignoring the cooldown.
    pub fn force_decision_check(
        &mut self,
        ctx: &TickContext,
        world: &dyn WorldQuery,
        mover: &mut dyn Mover,
    ) -> Option<DecisionOutcome> {
        if !self.active {
            return None;
        }
        self.perception.scan(ctx.tick, world, mover.position());

        let environment_signature = self.perception.environment_signature();
        let perception_changed = self.perception.take_context_changed();
        let goal_signature = self.goal_signature();
        let inputs = InflectionInputs {
            agent_idle: self.execution.is_idle(),
            environment_signature: &environment_signature,
            perception_changed,
            goal_signature: &goal_signature,
        };

        let triggers =
            self.inflection
                .force_decision_check(&inputs, ctx.tick, &mut self.events)?;
        Some(self.request_decision(ctx, &triggers))
    }

    fn request_decision(&mut self, ctx: &TickContext, triggers: &[&'static str]) -> DecisionOutcome {
        let context = DecisionContext::build(
            &self.identity,
            &self.module_summary("needs"),
            &self.module_summary("goals"),
            &self.module_summary("emotion"),
            &self.perception,
            &self.execution,
            ctx.tick,
            &mut self.events,
        );

        let priority = if triggers.contains(&"goal_changed") {
            PRIORITY_HIGH
        } else {
            PRIORITY_NORMAL
        };

        let outcome = self.orchestrator.request_decision(
            context,
            &self.identity.persona,
            priority,
            &mut self.execution,
            &mut self.events,
        );
        tracing::debug!(agent_id = %self.identity.id, ?triggers, "decision requested");
        outcome
    }
}
