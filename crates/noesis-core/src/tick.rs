/// Per-frame tick context shared by all components.
///
/// All cooldowns and intervals in the core accumulate `dt_seconds`; wall
/// clock time is never consulted for simulation decisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
}

impl TickContext {
    pub fn new(tick: u64, dt_seconds: f32) -> Self {
        Self { tick, dt_seconds }
    }
}
