use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use noesis_core::{Mover, TickContext, Vec3, WorldEntity, WorldQuery};
use noesis_mind::config::MindConfig;
use noesis_mind::decision::{DecisionError, DecisionOutcome, OracleClient, OracleRequest};
use noesis_mind::execution::ExecutionStatus;
use noesis_mind::{AgentIdentity, Mind};
use serde_json::Map;

const WAIT_DECISION: &str = r#"{"tool": "queue_action", "server": "execution", "reason": "nothing pressing", "args": {"type": "wait", "duration": 5.0}}"#;

struct ScriptedOracle {
    reply: String,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OracleClient for ScriptedOracle {
    async fn complete(&self, _request: OracleRequest) -> Result<String, DecisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

struct StaticWorld {
    entities: Vec<WorldEntity>,
}

impl WorldQuery for StaticWorld {
    fn entities_within(&self, center: Vec3, radius: f32) -> Vec<WorldEntity> {
        self.entities
            .iter()
            .filter(|e| e.position.distance(center) <= radius)
            .cloned()
            .collect()
    }
}

struct TestMover {
    position: Vec3,
    facing: Vec3,
}

impl Mover for TestMover {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn apply_velocity(&mut self, velocity: Vec3, dt_seconds: f32) -> Vec3 {
        self.position = self.position + velocity * dt_seconds;
        self.position
    }

    fn set_facing(&mut self, direction: Vec3) {
        self.facing = direction;
    }
}

fn village() -> StaticWorld {
    StaticWorld {
        entities: vec![WorldEntity {
            id: None,
            name: "guard".to_string(),
            categories: vec!["npc".to_string()],
            position: Vec3::new(10.0, 0.0, 0.0),
            velocity: Vec3::ZERO,
            properties: Map::new(),
        }],
    }
}

fn mover() -> TestMover {
    TestMover {
        position: Vec3::ZERO,
        facing: Vec3::new(0.0, 0.0, 1.0),
    }
}

fn fast_config() -> MindConfig {
    let mut config = MindConfig::default();
    config.decision.request_cooldown = 0.0;
    config
}

#[tokio::test]
async fn forced_decision_flows_from_oracle_to_running_action() {
    let oracle = ScriptedOracle::replying(WAIT_DECISION);
    let identity = AgentIdentity::new("anna", "Anna").with_persona("A calm villager.");
    let mut mind = Mind::new(identity, fast_config(), oracle.clone());
    let world = village();
    let mut mover = mover();

    mind.notify_time(1, 9, 0);
    let outcome = mind.force_decision_check(&TickContext::new(0, 0.5), &world, &mut mover);
    assert!(matches!(outcome, Some(DecisionOutcome::Sent)));

    tokio::time::sleep(Duration::from_millis(20)).await;
    // The response lands on this frame; the queued action starts on the next.
    mind.tick(&TickContext::new(1, 0.5), &world, &mut mover);
    mind.tick(&TickContext::new(2, 0.5), &world, &mut mover);

    assert_eq!(mind.execution.status(), ExecutionStatus::Waiting);
    assert_eq!(oracle.calls(), 1);

    for kind in ["triggered", "request_sent", "decision_made", "action_started"] {
        assert!(
            mind.events().iter().any(|e| e.kind == kind),
            "missing event {kind}"
        );
    }
}

#[tokio::test]
async fn deactivated_mind_is_inert() {
    let oracle = ScriptedOracle::replying(WAIT_DECISION);
    let mut mind = Mind::new(AgentIdentity::new("anna", "Anna"), fast_config(), oracle.clone());
    let world = village();
    let mut mover = mover();

    mind.set_active(false);
    assert!(!mind.is_active());

    mind.tick(&TickContext::new(0, 0.5), &world, &mut mover);
    assert!(mind
        .force_decision_check(&TickContext::new(1, 0.5), &world, &mut mover)
        .is_none());

    assert_eq!(oracle.calls(), 0);
    assert_eq!(mind.events().iter().count(), 0);
}

#[tokio::test]
async fn module_state_is_upserted_and_drives_goal_triggers() {
    let oracle = ScriptedOracle::replying(WAIT_DECISION);
    let mut mind = Mind::new(AgentIdentity::new("anna", "Anna"), fast_config(), oracle);

    assert!(mind.module("needs").is_some());
    assert!(mind.module("quests").is_none());

    mind.set_module_state("goals", serde_json::json!("find food"));
    mind.set_module_state("quests", serde_json::json!({ "active": 1 }));

    assert_eq!(mind.module("goals").unwrap().summary(), "find food");
    assert!(mind.module("quests").is_some());
}
