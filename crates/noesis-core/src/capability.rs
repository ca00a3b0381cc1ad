//! Capability registry: named tools and resources exposed by subsystems.
//!
//! This is the only channel through which the decision orchestrator (or any
//! external caller) manipulates a subsystem. Subsystems register immutable
//! descriptors; callers discover them with `list_tools`/`list_resources` and
//! invoke them by name.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::CapabilityError;
use crate::event::{EventSink, MindEvent};

/// Arguments passed to a tool handler, always a JSON object.
pub type ToolArgs = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Number,
    Bool,
    Object,
    Array,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub description: String,
}

impl ParamSpec {
    pub fn new(kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }
}

/// Descriptor of an invocable operation. Immutable after registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: BTreeMap<String, ParamSpec>,
    pub required: BTreeSet<String>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: BTreeMap::new(),
            required: BTreeSet::new(),
        }
    }

    pub fn with_param(
        mut self,
        name: impl Into<String>,
        spec: ParamSpec,
        required: bool,
    ) -> Self {
        let name = name.into();
        if required {
            self.required.insert(name.clone());
        }
        self.parameters.insert(name, spec);
        self
    }
}

/// Descriptor of a readable state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub name: String,
    pub description: String,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Per-subsystem descriptor tables.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    tools: BTreeMap<String, ToolDescriptor>,
    resources: BTreeMap<String, ResourceDescriptor>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent upsert.
    pub fn register_tool(&mut self, descriptor: ToolDescriptor) {
        self.tools.insert(descriptor.name.clone(), descriptor);
    }

    /// Idempotent upsert.
    pub fn register_resource(&mut self, descriptor: ResourceDescriptor) {
        self.resources
            .insert(descriptor.name.clone(), descriptor);
    }

    pub fn tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.resources.get(name)
    }

    pub fn list_tools(&self) -> Vec<&ToolDescriptor> {
        self.tools.values().collect()
    }

    pub fn list_resources(&self) -> Vec<&ResourceDescriptor> {
        self.resources.values().collect()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}

/// A subsystem that exposes capabilities.
///
/// Handlers are reached only through [`invoke_tool`]/[`read_resource`], which
/// perform the activity, existence and argument checks first.
pub trait CapabilityProvider {
    fn subsystem_name(&self) -> &str;

    fn is_active(&self) -> bool {
        true
    }

    fn registry(&self) -> &CapabilityRegistry;

    fn handle_tool(&mut self, name: &str, args: &ToolArgs) -> Result<Value, CapabilityError>;

    fn handle_resource(&self, name: &str) -> Result<Value, CapabilityError>;
}

/// Invoke a named tool on a subsystem.
///
/// Checks, in order: subsystem activity, tool existence, argument shape,
/// required parameters. Emits a `tool_executed` event on success and a
/// `tool_error` event on every failure path so repeated misuse stays
/// observable.
pub fn invoke_tool(
    provider: &mut dyn CapabilityProvider,
    name: &str,
    args: &Value,
    tick: u64,
    sink: &mut dyn EventSink,
) -> Result<Value, CapabilityError> {
    let subsystem = provider.subsystem_name().to_string();

    let checked = check_tool_call(provider, name, args);
    match checked {
        Ok(args) => {
            let result = provider.handle_tool(name, &args);
            match &result {
                Ok(value) => {
                    sink.emit(
                        MindEvent::new(tick, subsystem.clone(), "tool_executed").with_payload(
                            json!({
                                "tool": name,
                                "args": Value::Object(args.clone()),
                                "result": value,
                            }),
                        ),
                    );
                }
                Err(err) => emit_tool_error(sink, tick, &subsystem, name, err),
            }
            result
        }
        Err(err) => {
            emit_tool_error(sink, tick, &subsystem, name, &err);
            Err(err)
        }
    }
}

fn check_tool_call(
    provider: &dyn CapabilityProvider,
    name: &str,
    args: &Value,
) -> Result<ToolArgs, CapabilityError> {
    if !provider.is_active() {
        return Err(CapabilityError::NotActive(
            provider.subsystem_name().to_string(),
        ));
    }

    let descriptor = provider
        .registry()
        .tool(name)
        .ok_or_else(|| CapabilityError::ToolNotFound(name.to_string()))?;

    let args = match args {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            return Err(CapabilityError::InvalidArgument {
                name: name.to_string(),
                reason: format!("expected object arguments, got {}", kind_of(other)),
            })
        }
    };

    for param in &descriptor.required {
        if !args.contains_key(param) {
            return Err(CapabilityError::MissingParameter {
                tool: name.to_string(),
                param: param.clone(),
            });
        }
    }

    Ok(args)
}

fn emit_tool_error(
    sink: &mut dyn EventSink,
    tick: u64,
    subsystem: &str,
    name: &str,
    err: &CapabilityError,
) {
    tracing::warn!(subsystem, tool = name, error = %err, "tool invocation failed");
    sink.emit(
        MindEvent::new(tick, subsystem.to_string(), "tool_error").with_payload(json!({
            "tool": name,
            "error": err.tag(),
            "message": err.to_string(),
        })),
    );
}

/// Read a named resource from a subsystem.
///
/// Same activity/existence checks as [`invoke_tool`]; emits a
/// `resource_accessed` event on success.
pub fn read_resource(
    provider: &dyn CapabilityProvider,
    name: &str,
    tick: u64,
    sink: &mut dyn EventSink,
) -> Result<Value, CapabilityError> {
    let subsystem = provider.subsystem_name().to_string();

    if !provider.is_active() {
        let err = CapabilityError::NotActive(subsystem.clone());
        emit_resource_error(sink, tick, &subsystem, name, &err);
        return Err(err);
    }

    if provider.registry().resource(name).is_none() {
        let err = CapabilityError::ResourceNotFound(name.to_string());
        emit_resource_error(sink, tick, &subsystem, name, &err);
        return Err(err);
    }

    let result = provider.handle_resource(name);
    match &result {
        Ok(_) => {
            sink.emit(
                MindEvent::new(tick, subsystem, "resource_accessed")
                    .with_payload(json!({ "resource": name })),
            );
        }
        Err(err) => emit_resource_error(sink, tick, &subsystem, name, err),
    }
    result
}

fn emit_resource_error(
    sink: &mut dyn EventSink,
    tick: u64,
    subsystem: &str,
    name: &str,
    err: &CapabilityError,
) {
    tracing::warn!(subsystem, resource = name, error = %err, "resource read failed");
    sink.emit(
        MindEvent::new(tick, subsystem.to_string(), "resource_error").with_payload(json!({
            "resource": name,
            "error": err.tag(),
            "message": err.to_string(),
        })),
    );
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
