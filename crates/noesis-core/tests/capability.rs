use noesis_core::{
    invoke_tool, read_resource, CapabilityError, CapabilityProvider, CapabilityRegistry,
    ParamKind, ParamSpec, ResourceDescriptor, ToolArgs, ToolDescriptor, VecEventSink,
};
use serde_json::{json, Value};

struct Counter {
    registry: CapabilityRegistry,
    active: bool,
    count: i64,
}

impl Counter {
    fn new() -> Self {
        let mut registry = CapabilityRegistry::new();
        registry.register_tool(
            ToolDescriptor::new("add", "Add an amount to the counter").with_param(
                "amount",
                ParamSpec::new(ParamKind::Number, "Amount to add"),
                true,
            ),
        );
        registry.register_resource(ResourceDescriptor::new("count", "Current counter value"));
        Self {
            registry,
            active: true,
            count: 0,
        }
    }
}

impl CapabilityProvider for Counter {
    fn subsystem_name(&self) -> &str {
        "counter"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    fn handle_tool(&mut self, name: &str, args: &ToolArgs) -> Result<Value, CapabilityError> {
        match name {
            "add" => {
                let amount = args
                    .get("amount")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| CapabilityError::InvalidArgument {
                        name: "add".into(),
                        reason: "amount must be an integer".into(),
                    })?;
                self.count += amount;
                Ok(json!({ "count": self.count }))
            }
            other => Err(CapabilityError::ToolNotFound(other.to_string())),
        }
    }

    fn handle_resource(&self, name: &str) -> Result<Value, CapabilityError> {
        match name {
            "count" => Ok(json!(self.count)),
            other => Err(CapabilityError::ResourceNotFound(other.to_string())),
        }
    }
}

#[test]
fn invoke_dispatches_and_emits_event() {
    let mut counter = Counter::new();
    let mut sink = VecEventSink::default();

    let result = invoke_tool(&mut counter, "add", &json!({ "amount": 3 }), 7, &mut sink)
        .expect("tool call should succeed");
    assert_eq!(result, json!({ "count": 3 }));

    assert_eq!(sink.events.len(), 1);
    let event = &sink.events[0];
    assert_eq!(event.kind, "tool_executed");
    assert_eq!(event.tick, 7);
    assert_eq!(event.payload["tool"], "add");
    assert_eq!(event.payload["result"]["count"], 3);
}

#[test]
fn unknown_tool_is_rejected() {
    let mut counter = Counter::new();
    let mut sink = VecEventSink::default();

    let err = invoke_tool(&mut counter, "subtract", &json!({}), 0, &mut sink).unwrap_err();
    assert_eq!(err, CapabilityError::ToolNotFound("subtract".into()));
    assert_eq!(sink.events[0].kind, "tool_error");
}

#[test]
fn missing_required_parameter_is_rejected() {
    let mut counter = Counter::new();
    let mut sink = VecEventSink::default();

    let err = invoke_tool(&mut counter, "add", &json!({}), 0, &mut sink).unwrap_err();
    assert_eq!(
        err,
        CapabilityError::MissingParameter {
            tool: "add".into(),
            param: "amount".into(),
        }
    );
    assert_eq!(counter.count, 0, "handler must not run");
}

#[test]
fn non_object_args_are_rejected() {
    let mut counter = Counter::new();
    let mut sink = VecEventSink::default();

    let err = invoke_tool(&mut counter, "add", &json!([1, 2]), 0, &mut sink).unwrap_err();
    assert!(matches!(err, CapabilityError::InvalidArgument { .. }));
}

#[test]
fn inactive_subsystem_is_rejected_and_observable() {
    let mut counter = Counter::new();
    counter.active = false;
    let mut sink = VecEventSink::default();

    for _ in 0..3 {
        let err = invoke_tool(&mut counter, "add", &json!({ "amount": 1 }), 0, &mut sink)
            .unwrap_err();
        assert_eq!(err, CapabilityError::NotActive("counter".into()));
    }
    // Every rejection leaves an error event for diagnostics.
    assert_eq!(sink.events.len(), 3);
    assert!(sink.events.iter().all(|e| e.kind == "tool_error"));

    let err = read_resource(&counter, "count", 0, &mut sink).unwrap_err();
    assert_eq!(err, CapabilityError::NotActive("counter".into()));
}

#[test]
fn resource_read_round_trip() {
    let mut counter = Counter::new();
    let mut sink = VecEventSink::default();

    invoke_tool(&mut counter, "add", &json!({ "amount": 5 }), 1, &mut sink).unwrap();
    let value = read_resource(&counter, "count", 2, &mut sink).unwrap();
    assert_eq!(value, json!(5));

    let err = read_resource(&counter, "missing", 2, &mut sink).unwrap_err();
    assert_eq!(err, CapabilityError::ResourceNotFound("missing".into()));
}

#[test]
fn registration_is_idempotent_upsert() {
    let mut registry = CapabilityRegistry::new();
    registry.register_tool(ToolDescriptor::new("ping", "first"));
    registry.register_tool(ToolDescriptor::new("ping", "second"));

    assert_eq!(registry.list_tools().len(), 1);
    assert_eq!(registry.tool("ping").unwrap().description, "second");
}
