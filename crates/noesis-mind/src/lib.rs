//! Noesis Mind - autonomous NPC cognition core.
//!
//! Each agent perceives its surroundings, decides what to do by consulting an
//! external decision oracle (a language-model service), and executes the
//! resulting action through a priority-ordered scheduler. Components only
//! talk to each other through the capability registry defined in
//! `noesis-core`.

#![forbid(unsafe_code)]

pub mod config;
pub mod decision;
pub mod execution;
pub mod inflection;
pub mod mind;
pub mod perception;

pub use config::MindConfig;
pub use decision::{DecisionError, DecisionOrchestrator, DecisionOutcome, OracleClient};
pub use execution::ExecutionComponent;
pub use inflection::InflectionComponent;
pub use mind::{AgentIdentity, Mind};
pub use perception::PerceptionComponent;
