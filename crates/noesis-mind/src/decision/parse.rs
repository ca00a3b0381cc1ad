//! Decision payload extraction and validation.
//!
//! Oracle responses often wrap the structured payload in prose; the first
//! balanced `{...}` substring is extracted (string- and escape-aware) and
//! parsed. Validation rejects malformed payloads before any dispatch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decision::DecisionError;

/// The structured decision returned by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub tool: String,
    pub server: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

/// First balanced top-level JSON object in `text`, if any.
pub fn extract_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the embedded payload out of a raw oracle response.
pub fn parse_decision(text: &str) -> Result<Decision, DecisionError> {
    let object = extract_balanced_object(text)
        .ok_or_else(|| DecisionError::Parse("no balanced JSON object found".to_string()))?;

    let value: Value = serde_json::from_str(object)
        .map_err(|e| DecisionError::Parse(format!("malformed JSON object: {e}")))?;

    let tool = required_string(&value, "tool")?;
    let server = required_string(&value, "server")?;
    let reason = required_string(&value, "reason")?;

    let args = match value.get("args") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(Value::Object(map.clone())),
        Some(other) => {
            return Err(DecisionError::Validation(format!(
                "`args` must be an object, got {other}"
            )))
        }
    };

    Ok(Decision {
        tool,
        server,
        reason,
        args,
    })
}

/// Reject decisions referencing tools or servers outside the allowed sets.
/// Unrecognized names are never silently coerced.
pub fn validate_decision(
    decision: &Decision,
    allowed_servers: &[&str],
    allowed_tools: &[String],
) -> Result<(), DecisionError> {
    if !allowed_servers.contains(&decision.server.as_str()) {
        return Err(DecisionError::Validation(format!(
            "unknown server `{}`",
            decision.server
        )));
    }
    if !allowed_tools.iter().any(|t| t == &decision.tool) {
        return Err(DecisionError::Validation(format!(
            "unknown tool `{}`",
            decision.tool
        )));
    }
    Ok(())
}

fn required_string(value: &Value, field: &str) -> Result<String, DecisionError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            DecisionError::Validation(format!("missing required field `{field}`"))
        })
}
