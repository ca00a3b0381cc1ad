//! Prompt rendering for the decision oracle.

use std::fmt::Write as _;

use noesis_core::ToolDescriptor;

use crate::decision::context::DecisionContext;

/// Render the structured natural-language prompt: agent identity, needs,
/// world time, perception and execution summaries, and the fixed menu of
/// invocable tools.
pub fn render_prompt(
    context: &DecisionContext,
    persona: &str,
    tools: &[&ToolDescriptor],
) -> String {
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are {name} ({id}), an NPC in a living world.",
        name = context.agent_name,
        id = context.agent_id
    );
    if !persona.is_empty() {
        let _ = writeln!(prompt, "{persona}");
    }
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Time of day: {}", context.time_of_day);
    let _ = writeln!(prompt, "Current needs: {}", context.current_needs);
    let _ = writeln!(prompt, "Current goals: {}", context.current_goals);
    let _ = writeln!(prompt, "Emotional state: {}", context.emotional_state);
    let _ = writeln!(prompt);

    if context.nearby_objects.is_empty() {
        let _ = writeln!(prompt, "You see nothing of interest nearby.");
    } else {
        let _ = writeln!(prompt, "Nearby ({} objects):", context.nearby_objects.len());
        for object in &context.nearby_objects {
            let _ = writeln!(
                prompt,
                "- {} ({}), distance {:.1}{}",
                object.get("id").and_then(|v| v.as_str()).unwrap_or("?"),
                object.get("type").and_then(|v| v.as_str()).unwrap_or("?"),
                object.get("distance").and_then(|v| v.as_f64()).unwrap_or(0.0),
                if object
                    .get("is_moving")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false)
                {
                    ", moving"
                } else {
                    ""
                },
            );
        }
    }
    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "You are currently {} with {} queued actions.",
        context.execution_status, context.queued_actions
    );
    let _ = writeln!(prompt);

    let _ = writeln!(prompt, "Available tools on server `execution`:");
    for tool in tools {
        let _ = writeln!(prompt, "- {}: {}", tool.name, tool.description);
        for (param, spec) in &tool.parameters {
            let required = if tool.required.contains(param) {
                " (required)"
            } else {
                ""
            };
            let _ = writeln!(prompt, "    {param}{required}: {}", spec.description);
        }
    }
    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Reply with a single JSON object: {{\"tool\": <tool name>, \"server\": \"execution\", \"reason\": <short reason>, \"args\": {{...}}}}."
    );

    prompt
}
