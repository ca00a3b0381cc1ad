use serde::Serialize;

use crate::config::PerceptionConfig;
use crate::perception::object::PerceivedObject;

/// Synthesized environmental conditions, recomputed on every scan.
#[derive(Debug, Clone, Serialize)]
pub struct Environment {
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub time_of_day: String,
    pub lighting: String,
    pub noise_level: String,
    pub crowd_density: String,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            day: 0,
            hour: 12,
            minute: 0,
            time_of_day: time_period(12).to_string(),
            lighting: "bright".to_string(),
            noise_level: "quiet".to_string(),
            crowd_density: "empty".to_string(),
        }
    }
}

impl Environment {
    /// Compact signature used by the inflection component to detect
    /// environmental change. Excludes the minute so the signature only moves
    /// when conditions meaningfully change.
    pub fn signature(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.time_of_day, self.lighting, self.noise_level, self.crowd_density
        )
    }
}

pub fn time_period(hour: u32) -> &'static str {
    match hour {
        5..=11 => "morning",
        12..=16 => "afternoon",
        17..=20 => "evening",
        _ => "night",
    }
}

fn is_daytime(hour: u32) -> bool {
    (6..=18).contains(&hour)
}

/// Recompute the environment from injected time and the current scan.
pub fn synthesize(
    config: &PerceptionConfig,
    day: u32,
    hour: u32,
    minute: u32,
    objects: &[PerceivedObject],
) -> Environment {
    let light_sources = objects.iter().filter(|o| o.kind == "light_source").count();
    let lighting = if is_daytime(hour) {
        "bright"
    } else if light_sources >= 1 {
        "artificial"
    } else {
        "dim"
    };

    let moving = objects.iter().filter(|o| o.is_moving).count();
    let noise_level = if moving == 0 {
        "quiet"
    } else if moving < config.noise_threshold {
        "moderate"
    } else {
        "loud"
    };

    let npcs = objects
        .iter()
        .filter(|o| o.kind == "npc" || o.kind == "player")
        .count();
    let crowd_density = if npcs == 0 {
        "empty"
    } else if npcs < config.crowd_threshold {
        "sparse"
    } else {
        "crowded"
    };

    Environment {
        day,
        hour,
        minute,
        time_of_day: time_period(hour).to_string(),
        lighting: lighting.to_string(),
        noise_level: noise_level.to_string(),
        crowd_density: crowd_density.to_string(),
    }
}
