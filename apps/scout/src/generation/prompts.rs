// Prompt fragments owned by the structured generation adapter.

/// Appended to every task prompt. Replace: {schema_name}, {field_guide}, {skeleton}
pub const OUTPUT_FORMAT_TEMPLATE: &str = r#"OUTPUT FORMAT
Return a single JSON object conforming to the {schema_name} schema.

Fields:
{field_guide}

Shape:
{skeleton}

Return ONLY the JSON object: no prose, no code fences, no extra keys."#;

/// Appended on a retry after invalid output. Replace: {attempt}, {max_attempts}, {violations}
pub const RETRY_FEEDBACK_TEMPLATE: &str = r#"PREVIOUS ATTEMPT REJECTED (attempt {attempt} of {max_attempts})
Your previous response did not match the required schema:
{violations}

Correct every problem listed above and return the complete JSON object again."#;

/// Tool result sent once the tool budget is spent.
pub const TOOL_BUDGET_EXHAUSTED: &str =
    "Tool budget exhausted. Do not call any more tools; return the final JSON object now.";
