//! Decision orchestrator: gathers context, consults the external oracle,
//! validates the response and dispatches the chosen tool through the
//! capability registry.
//!
//! The oracle request is the only asynchronous operation in the core and is
//! serialized to at most one outstanding call at any time. Responses return
//! through an mpsc channel and are handled on the tick path.

pub mod cache;
pub mod context;
pub mod oracle;
pub mod parse;
pub mod prompt;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use noesis_core::{invoke_tool, CapabilityError, CapabilityProvider, EventSink, MindEvent};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::{DecisionConfig, OracleConfig};

pub use cache::DecisionCache;
pub use context::DecisionContext;
pub use oracle::{HttpOracleClient, OracleClient, OracleRequest};
pub use parse::{extract_balanced_object, parse_decision, validate_decision, Decision};

/// Subsystems a decision may dispatch to.
const ALLOWED_SERVERS: &[&str] = &["execution"];

#[derive(Debug, Clone, Error)]
pub enum DecisionError {
    #[error("oracle transport failure: {0}")]
    Transport(String),

    #[error("oracle response parse failure: {0}")]
    Parse(String),

    #[error("decision validation failure: {0}")]
    Validation(String),

    #[error("decision dispatch failed: {0}")]
    Dispatch(#[from] CapabilityError),
}

/// Outcome of a decision request or response poll.
#[derive(Debug, Clone)]
pub enum DecisionOutcome {
    /// A decision was validated and dispatched.
    Delivered { decision: Decision, cached: bool },
    /// A request went out to the oracle.
    Sent,
    /// Nothing was sent; the reason says why (in flight, cooldown).
    NotSent(&'static str),
    /// A response arrived for a superseded or timed-out pending record.
    Stale,
    /// Transport, parse, validation or dispatch failed.
    Failed(DecisionError),
}

/// Tracks the single in-flight request until its response arrives.
#[derive(Debug, Clone)]
pub struct PendingDecision {
    pub agent_id: String,
    pub context_hash: u64,
    pub requested_at: f64,
    pub requested_wall: DateTime<Utc>,
}

struct QueuedRequest {
    context: DecisionContext,
    persona: String,
    priority: i32,
    context_hash: u64,
}

struct Arrival {
    agent_id: String,
    context_hash: u64,
    result: Result<String, DecisionError>,
}

pub struct DecisionOrchestrator {
    config: DecisionConfig,
    oracle_config: OracleConfig,
    client: Arc<dyn OracleClient>,
    cache: DecisionCache,
    in_flight: bool,
    pending: Option<PendingDecision>,
    retries: Vec<QueuedRequest>,
    tx: mpsc::UnboundedSender<Arrival>,
    rx: mpsc::UnboundedReceiver<Arrival>,
    /// Accumulated simulation seconds.
    now: f64,
    current_tick: u64,
    last_request_at: HashMap<String, f64>,
}

impl DecisionOrchestrator {
    pub fn new(
        config: DecisionConfig,
        oracle_config: OracleConfig,
        client: Arc<dyn OracleClient>,
    ) -> Self {
        let cache = DecisionCache::new(config.cache_capacity, config.cache_expiry);
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            config,
            oracle_config,
            client,
            cache,
            in_flight: false,
            pending: None,
            retries: Vec::new(),
            tx,
            rx,
            now: 0.0,
            current_tick: 0,
            last_request_at: HashMap::new(),
        }
    }

    pub fn tick(&mut self, tick: u64, dt_seconds: f32) {
        self.current_tick = tick;
        self.now += dt_seconds as f64;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn pending(&self) -> Option<&PendingDecision> {
        self.pending.as_ref()
    }

    /// Handle a trigger: cache lookup, throttling, then at most one async
    /// request to the oracle.
    pub fn request_decision(
        &mut self,
        context: DecisionContext,
        persona: &str,
        priority: i32,
        execution: &mut dyn CapabilityProvider,
        sink: &mut dyn EventSink,
    ) -> DecisionOutcome {
        let hash = context.context_hash();

        if let Some(decision) = self.cache.get(hash, self.now) {
            tracing::debug!(agent_id = %context.agent_id, "decision served from cache");
            return match self.dispatch(&decision, execution, sink) {
                Ok(()) => DecisionOutcome::Delivered {
                    decision,
                    cached: true,
                },
                Err(err) => DecisionOutcome::Failed(err),
            };
        }

        if self.in_flight {
            self.enqueue_retry(context, persona, priority, hash);
            return DecisionOutcome::NotSent("request_in_flight");
        }

        let last = self
            .last_request_at
            .get(&context.agent_id)
            .copied()
            .unwrap_or(f64::NEG_INFINITY);
        if self.now - last < self.config.request_cooldown as f64 {
            self.enqueue_retry(context, persona, priority, hash);
            return DecisionOutcome::NotSent("cooldown");
        }

        let prompt = prompt::render_prompt(&context, persona, &execution.registry().list_tools());
        self.send(context, prompt, hash, sink);
        DecisionOutcome::Sent
    }

    fn send(
        &mut self,
        context: DecisionContext,
        prompt: String,
        hash: u64,
        sink: &mut dyn EventSink,
    ) {
        let tools: Vec<String> = context.available_actions.clone();
        let request = OracleRequest {
            model: self.oracle_config.model.clone(),
            prompt,
            stream: false,
        };

        let agent_id = context.agent_id.clone();
        let requested_wall = Utc::now();
        self.in_flight = true;
        self.pending = Some(PendingDecision {
            agent_id: agent_id.clone(),
            context_hash: hash,
            requested_at: self.now,
            requested_wall,
        });
        self.last_request_at.insert(agent_id.clone(), self.now);

        sink.emit(
            MindEvent::new(self.current_tick, "decision", "request_sent").with_payload(json!({
                "agent_id": agent_id,
                "context_hash": hash.to_string(),
                "requested_at": requested_wall.to_rfc3339(),
                "tools": tools,
            })),
        );

        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.complete(request).await;
            // The orchestrator may already be gone on shutdown.
            let _ = tx.send(Arrival {
                agent_id,
                context_hash: hash,
                result,
            });
        });
    }

    /// Drain arrived responses. Called on the tick path; each arrival is
    /// matched against the pending record and tolerates the agent having
    /// moved on.
    pub fn poll_responses(
        &mut self,
        execution: &mut dyn CapabilityProvider,
        sink: &mut dyn EventSink,
    ) -> Vec<DecisionOutcome> {
        let mut outcomes = Vec::new();

        while let Ok(arrival) = self.rx.try_recv() {
            self.in_flight = false;
            let pending = self.pending.take();

            let matched = pending.as_ref().map_or(false, |p| {
                p.agent_id == arrival.agent_id && p.context_hash == arrival.context_hash
            });
            let fresh = pending.as_ref().map_or(false, |p| {
                self.now - p.requested_at <= self.config.pending_timeout as f64
            });

            if !matched || !fresh {
                tracing::debug!(agent_id = %arrival.agent_id, "stale oracle response ignored");
                sink.emit(
                    MindEvent::new(self.current_tick, "decision", "stale_response")
                        .with_payload(json!({
                            "agent_id": arrival.agent_id,
                            "requested_at": pending
                                .as_ref()
                                .map(|p| p.requested_wall.to_rfc3339()),
                        })),
                );
                outcomes.push(DecisionOutcome::Stale);
                continue;
            }

            outcomes.push(self.handle_response(arrival, execution, sink));
        }

        self.pump_retries(execution, sink, &mut outcomes);
        outcomes
    }

    fn handle_response(
        &mut self,
        arrival: Arrival,
        execution: &mut dyn CapabilityProvider,
        sink: &mut dyn EventSink,
    ) -> DecisionOutcome {
        let decision = match arrival.result.and_then(|text| parse_decision(&text)) {
            Ok(decision) => decision,
            Err(err) => {
                tracing::warn!(agent_id = %arrival.agent_id, error = %err, "decision failed");
                sink.emit(
                    MindEvent::new(self.current_tick, "decision", "decision_failed")
                        .with_payload(json!({
                            "agent_id": arrival.agent_id,
                            "error": err.to_string(),
                        })),
                );
                return DecisionOutcome::Failed(err);
            }
        };

        match self.dispatch(&decision, execution, sink) {
            Ok(()) => {
                self.cache
                    .insert(arrival.context_hash, decision.clone(), self.now);
                sink.emit(
                    MindEvent::new(self.current_tick, "decision", "decision_made").with_payload(
                        json!({
                            "agent_id": arrival.agent_id,
                            "tool": decision.tool,
                            "reason": decision.reason,
                        }),
                    ),
                );
                DecisionOutcome::Delivered {
                    decision,
                    cached: false,
                }
            }
            Err(err) => {
                sink.emit(
                    MindEvent::new(self.current_tick, "decision", "decision_failed")
                        .with_payload(json!({
                            "agent_id": arrival.agent_id,
                            "error": err.to_string(),
                        })),
                );
                DecisionOutcome::Failed(err)
            }
        }
    }

    /// Validate against the allowed tool/server sets, then invoke through
    /// the registry. Never coerces unrecognized names.
    fn dispatch(
        &mut self,
        decision: &Decision,
        execution: &mut dyn CapabilityProvider,
        sink: &mut dyn EventSink,
    ) -> Result<(), DecisionError> {
        let allowed_tools = execution.registry().tool_names();
        validate_decision(decision, ALLOWED_SERVERS, &allowed_tools)?;

        let args = decision.args.clone().unwrap_or(Value::Object(Default::default()));
        invoke_tool(execution, &decision.tool, &args, self.current_tick, sink)?;
        Ok(())
    }

    fn enqueue_retry(
        &mut self,
        context: DecisionContext,
        persona: &str,
        priority: i32,
        hash: u64,
    ) {
        if self.retries.iter().any(|r| r.context_hash == hash) {
            return;
        }
        self.retries.push(QueuedRequest {
            context,
            persona: persona.to_string(),
            priority,
            context_hash: hash,
        });
        // Priority-sorted, highest first; overflow drops the tail.
        self.retries.sort_by(|a, b| b.priority.cmp(&a.priority));
        self.retries.truncate(self.config.retry_capacity);
    }

    fn pump_retries(
        &mut self,
        execution: &mut dyn CapabilityProvider,
        sink: &mut dyn EventSink,
        outcomes: &mut Vec<DecisionOutcome>,
    ) {
        if self.in_flight || self.retries.is_empty() {
            return;
        }

        let candidate = self.retries.remove(0);
        let last = self
            .last_request_at
            .get(&candidate.context.agent_id)
            .copied()
            .unwrap_or(f64::NEG_INFINITY);
        if self.now - last < self.config.request_cooldown as f64 {
            // Still throttled; keep it queued for a later tick.
            self.retries.insert(0, candidate);
            return;
        }

        let outcome = self.request_decision(
            candidate.context,
            &candidate.persona,
            candidate.priority,
            execution,
            sink,
        );
        outcomes.push(outcome);
    }
}
