use serde_json::Value;

/// Minimal interface for agent state modules (needs, emotion, goals, memory,
/// social, identity, reputation, resource, theory-of-mind).
///
/// Most hosts ship these as simple state holders; context building treats
/// them uniformly and never special-cases their absence.
pub trait StateModule {
    fn name(&self) -> &str;

    fn initialize(&mut self) {}

    fn is_active(&self) -> bool {
        true
    }

    /// Current state snapshot as JSON.
    fn state(&self) -> Value;

    /// One-line summary used when rendering decision context.
    fn summary(&self) -> String {
        match self.state() {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Default no-logic state holder.
#[derive(Debug, Clone)]
pub struct StubModule {
    name: String,
    state: Value,
    active: bool,
}

impl StubModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Value::Null,
            active: true,
        }
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    pub fn set_state(&mut self, state: Value) {
        self.state = state;
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl StateModule for StubModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn state(&self) -> Value {
        self.state.clone()
    }
}

/// An optional collaborator, resolved once at initialization.
///
/// Replaces per-call duck-typed probing: a component asks for the capability
/// at construction and holds `Present` or `Absent` from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability<T> {
    Present(T),
    Absent,
}

impl<T> Capability<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Present(v),
            None => Self::Absent,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Present(v) => Some(v),
            Self::Absent => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Present(v) => Some(v),
            Self::Absent => None,
        }
    }
}
