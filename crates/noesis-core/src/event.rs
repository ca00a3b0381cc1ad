use std::borrow::Cow;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// A small, allocation-friendly observability event.
///
/// Intentionally "dumb data": subsystems record what happened (tool executed,
/// action started, decision triggered) and tooling renders it later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindEvent {
    pub tick: u64,
    pub subsystem: Cow<'static, str>,
    pub kind: Cow<'static, str>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl MindEvent {
    pub fn new(
        tick: u64,
        subsystem: impl Into<Cow<'static, str>>,
        kind: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            tick,
            subsystem: subsystem.into(),
            kind: kind.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

pub trait EventSink {
    fn emit(&mut self, event: MindEvent);
}

#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&mut self, _event: MindEvent) {}
}

#[derive(Debug, Default)]
pub struct VecEventSink {
    pub events: Vec<MindEvent>,
}

impl EventSink for VecEventSink {
    fn emit(&mut self, event: MindEvent) {
        self.events.push(event);
    }
}

/// Bounded in-memory event log. Oldest entries are dropped once capacity is
/// reached.
#[derive(Debug)]
pub struct EventLog {
    events: VecDeque<MindEvent>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The last `limit` events, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<&MindEvent> {
        let skip = self.events.len().saturating_sub(limit);
        self.events.iter().skip(skip).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MindEvent> {
        self.events.iter()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: MindEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}
