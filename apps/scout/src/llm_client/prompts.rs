// Shared prompt fragments used by every structured generation call.
// Stage-specific instructions live in pipeline/prompts.rs.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies. \
    Use exactly the keys of the requested schema: no extra keys, none missing.";

/// Agent persona system prompt. Replace: {role}, {goal}, {backstory}
pub const AGENT_SYSTEM_TEMPLATE: &str = "You are acting as: {role}.
Your goal: {goal}
Background: {backstory}";

/// Added to the system prompt when retrieval tools are available.
pub const TOOL_USE_SYSTEM: &str = "You may call the provided tools to search the web or read \
    job posting pages before answering. When you have enough information, stop calling tools \
    and return the final JSON object.";

/// Builds the full system prompt for an agent.
pub fn agent_system_prompt(role: &str, goal: &str, backstory: &str, with_tools: bool) -> String {
    let mut system = AGENT_SYSTEM_TEMPLATE
        .replace("{role}", role)
        .replace("{goal}", goal)
        .replace("{backstory}", backstory);
    if with_tools {
        system.push_str("\n\n");
        system.push_str(TOOL_USE_SYSTEM);
    }
    system.push_str("\n\n");
    system.push_str(JSON_ONLY_SYSTEM);
    system
}
