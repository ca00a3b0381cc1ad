//! Cognition configuration loading and management.
//!
//! Every tuned threshold in the core lives here. The numeric defaults are
//! starting points, not invariants; hosts are expected to override them from
//! `.noesis/config.yaml`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main cognition configuration, loaded from .noesis/config.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MindConfig {
    /// Config version
    pub version: Option<String>,

    #[serde(default)]
    pub perception: PerceptionConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub inflection: InflectionConfig,

    #[serde(default)]
    pub decision: DecisionConfig,

    #[serde(default)]
    pub oracle: OracleConfig,

    /// Capacity of the in-memory observability event log
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
}

/// Hard floor for the vision radius; configuration cannot go below it.
pub const MIN_VISION_RADIUS: f32 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Vision radius in world units
    #[serde(default = "default_vision_radius")]
    pub vision_radius: f32,

    /// Seconds of accumulated tick time between scans
    #[serde(default = "default_scan_interval")]
    pub scan_interval: f32,

    /// Spatial grid cell size in world units
    #[serde(default = "default_grid_cell_size")]
    pub grid_cell_size: f32,

    /// Single-link clustering radius for spatial analysis
    #[serde(default = "default_clustering_radius")]
    pub clustering_radius: f32,

    /// Moving-object count at which noise becomes "loud"
    #[serde(default = "default_noise_threshold")]
    pub noise_threshold: usize,

    /// NPC count at which crowd density becomes "crowded"
    #[serde(default = "default_crowd_threshold")]
    pub crowd_threshold: usize,
}

impl PerceptionConfig {
    /// Vision radius with the floor enforced.
    pub fn effective_vision_radius(&self) -> f32 {
        self.vision_radius.max(MIN_VISION_RADIUS)
    }
}

fn default_vision_radius() -> f32 {
    80.0
}
fn default_scan_interval() -> f32 {
    0.5
}
fn default_grid_cell_size() -> f32 {
    10.0
}
fn default_clustering_radius() -> f32 {
    15.0
}
fn default_noise_threshold() -> usize {
    4
}
fn default_crowd_threshold() -> usize {
    5
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            vision_radius: default_vision_radius(),
            scan_interval: default_scan_interval(),
            grid_cell_size: default_grid_cell_size(),
            clustering_radius: default_clustering_radius(),
            noise_threshold: default_noise_threshold(),
            crowd_threshold: default_crowd_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Movement speed in world units per second
    #[serde(default = "default_movement_speed")]
    pub movement_speed: f32,

    /// Distance at which a move action counts as arrived
    #[serde(default = "default_arrival_threshold")]
    pub arrival_threshold: f32,

    /// Default duration for wait actions without an explicit duration
    #[serde(default = "default_wait_duration")]
    pub default_wait_duration: f32,

    /// Default duration for interact actions without an explicit duration
    #[serde(default = "default_interact_duration")]
    pub default_interact_duration: f32,

    /// Completed-action history capacity
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Interruption history capacity
    #[serde(default = "default_interruption_capacity")]
    pub interruption_capacity: usize,
}

fn default_movement_speed() -> f32 {
    3.0
}
fn default_arrival_threshold() -> f32 {
    0.5
}
fn default_wait_duration() -> f32 {
    2.0
}
fn default_interact_duration() -> f32 {
    1.5
}
fn default_history_capacity() -> usize {
    20
}
fn default_interruption_capacity() -> usize {
    10
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            movement_speed: default_movement_speed(),
            arrival_threshold: default_arrival_threshold(),
            default_wait_duration: default_wait_duration(),
            default_interact_duration: default_interact_duration(),
            history_capacity: default_history_capacity(),
            interruption_capacity: default_interruption_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InflectionConfig {
    /// Minimum seconds between accepted decisions
    #[serde(default = "default_decision_cooldown")]
    pub decision_cooldown: f32,

    /// Seconds after which a routine check fires regardless of other triggers
    #[serde(default = "default_routine_interval")]
    pub routine_interval: f32,
}

fn default_decision_cooldown() -> f32 {
    10.0
}
fn default_routine_interval() -> f32 {
    30.0
}

impl Default for InflectionConfig {
    fn default() -> Self {
        Self {
            decision_cooldown: default_decision_cooldown(),
            routine_interval: default_routine_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Seconds a cached decision stays valid
    #[serde(default = "default_cache_expiry")]
    pub cache_expiry: f32,

    /// Maximum cached decisions (oldest evicted first)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Seconds between outgoing requests for the same agent
    #[serde(default = "default_request_cooldown")]
    pub request_cooldown: f32,

    /// Maximum queued retry requests
    #[serde(default = "default_retry_capacity")]
    pub retry_capacity: usize,

    /// Seconds after which a pending request no longer matches its response
    #[serde(default = "default_pending_timeout")]
    pub pending_timeout: f32,
}

fn default_cache_expiry() -> f32 {
    300.0
}
fn default_cache_capacity() -> usize {
    64
}
fn default_request_cooldown() -> f32 {
    5.0
}
fn default_retry_capacity() -> usize {
    8
}
fn default_pending_timeout() -> f32 {
    60.0
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            cache_expiry: default_cache_expiry(),
            cache_capacity: default_cache_capacity(),
            request_cooldown: default_request_cooldown(),
            retry_capacity: default_retry_capacity(),
            pending_timeout: default_pending_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Decision oracle endpoint (Ollama-style generate API)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Transport timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:11434/api/generate".to_string()
}
fn default_model() -> String {
    "llama3.1".to_string()
}
fn default_request_timeout() -> u64 {
    30
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_event_log_capacity() -> usize {
    256
}

impl Default for MindConfig {
    fn default() -> Self {
        Self {
            version: None,
            perception: PerceptionConfig::default(),
            execution: ExecutionConfig::default(),
            inflection: InflectionConfig::default(),
            decision: DecisionConfig::default(),
            oracle: OracleConfig::default(),
            event_log_capacity: default_event_log_capacity(),
        }
    }
}

impl MindConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load from project root (looks for .noesis/config.yaml)
    pub fn load_from_project(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".noesis/config.yaml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }
}
