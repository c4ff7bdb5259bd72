//! StructuredGenerator, the production `Generator`.
//!
//! Flow per attempt: inference call → [tool calls → retrieval →
//! tool results → inference call]* → strip fences → parse JSON → validate
//! against the schema. Invalid output is re-prompted with the violations listed,
//! up to `max_retries` times. Backend errors and timeouts are terminal.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::generation::prompts::{
    OUTPUT_FORMAT_TEMPLATE, RETRY_FEEDBACK_TEMPLATE, TOOL_BUDGET_EXHAUSTED,
};
use crate::generation::{GenerationError, GenerationRequest, GenerationSettings, Generator};
use crate::llm_client::prompts::agent_system_prompt;
use crate::llm_client::{
    strip_json_fences, CompletionRequest, ContentBlock, InferenceBackend, LlmResponse, Message,
    Role,
};
use crate::retrieval::Retriever;
use crate::schema::{validate, SchemaDescriptor, SchemaViolation};

pub struct StructuredGenerator {
    backend: Arc<dyn InferenceBackend>,
    retriever: Option<Arc<Retriever>>,
    settings: GenerationSettings,
}

impl StructuredGenerator {
    pub fn new(backend: Arc<dyn InferenceBackend>, settings: GenerationSettings) -> Self {
        Self {
            backend,
            retriever: None,
            settings,
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// One inference call, bounded by the request timeout.
    async fn call_backend(&self, request: &CompletionRequest) -> Result<LlmResponse, GenerationError> {
        let timeout = self.settings.request_timeout;
        match tokio::time::timeout(timeout, self.backend.complete(request)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(GenerationError::Timeout(timeout)),
        }
    }

    /// Runs one attempt's conversation, including the tool-use sub-loop.
    /// Returns the final text, if the model produced any.
    async fn converse(&self, mut request: CompletionRequest) -> Result<Option<String>, GenerationError> {
        let mut rounds = 0;
        loop {
            let response = self.call_backend(&request).await?;
            let calls = response.tool_calls();

            let retriever = match &self.retriever {
                Some(r) if !calls.is_empty() && !request.tools.is_empty() => r,
                _ => return Ok(response.text()),
            };

            let budget_spent = rounds >= self.settings.max_tool_rounds;
            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                let content = if budget_spent {
                    TOOL_BUDGET_EXHAUSTED.to_string()
                } else {
                    retriever.execute(call).await
                };
                results.push(ContentBlock::ToolResult {
                    tool_use_id: call.id.clone(),
                    content,
                });
            }

            if budget_spent {
                debug!("Tool budget of {} rounds spent", self.settings.max_tool_rounds);
                if rounds > self.settings.max_tool_rounds {
                    // The model ignored the budget notice; keep whatever text it produced.
                    return Ok(response.text());
                }
            }

            request.messages.push(response.into_assistant_message());
            request.messages.push(Message {
                role: Role::User,
                content: results,
            });
            rounds += 1;
        }
    }
}

#[async_trait]
impl Generator for StructuredGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, GenerationError> {
        if request.prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let with_tools = request.use_retrieval && self.retriever.is_some();
        let system = agent_system_prompt(
            &request.agent.role,
            &request.agent.goal,
            &request.agent.backstory,
            with_tools,
        );
        let tools = match (&self.retriever, with_tools) {
            (Some(r), true) => r.tool_specs(),
            _ => Vec::new(),
        };
        let base_prompt = format!("{}\n\n{}", request.prompt.trim_end(), output_format(request.schema));

        let max_attempts = self.settings.max_retries + 1;
        let mut violations: Vec<SchemaViolation> = Vec::new();

        for attempt in 1..=max_attempts {
            let prompt = if violations.is_empty() {
                base_prompt.clone()
            } else {
                format!("{base_prompt}\n\n{}", retry_feedback(attempt, max_attempts, &violations))
            };

            let completion = CompletionRequest {
                system: system.clone(),
                messages: vec![Message::user_text(prompt)],
                tools: tools.clone(),
            };

            let text = self.converse(completion).await?;
            match parse_and_validate(text.as_deref(), request.schema) {
                Ok(value) => {
                    info!(
                        "Generated valid {} on attempt {}/{}",
                        request.schema.name, attempt, max_attempts
                    );
                    return Ok(value);
                }
                Err(found) => {
                    warn!(
                        "Attempt {}/{}: output failed {} validation with {} violation(s)",
                        attempt,
                        max_attempts,
                        request.schema.name,
                        found.len()
                    );
                    violations = found;
                }
            }
        }

        Err(GenerationError::SchemaValidation {
            schema: request.schema.name,
            attempts: max_attempts,
            violations,
        })
    }
}

fn output_format(schema: &SchemaDescriptor) -> String {
    let skeleton = serde_json::to_string_pretty(&schema.prompt_skeleton())
        .unwrap_or_else(|_| schema.prompt_skeleton().to_string());
    OUTPUT_FORMAT_TEMPLATE
        .replace("{schema_name}", schema.name)
        .replace("{field_guide}", &schema.field_guide())
        .replace("{skeleton}", &skeleton)
}

fn retry_feedback(attempt: u32, max_attempts: u32, violations: &[SchemaViolation]) -> String {
    let listed = violations
        .iter()
        .map(|v| format!("- {v}"))
        .collect::<Vec<_>>()
        .join("\n");
    RETRY_FEEDBACK_TEMPLATE
        .replace("{attempt}", &attempt.to_string())
        .replace("{max_attempts}", &max_attempts.to_string())
        .replace("{violations}", &listed)
}

/// Strict decode: fences are stripped, nothing else is coerced.
fn parse_and_validate(
    text: Option<&str>,
    schema: &SchemaDescriptor,
) -> Result<Value, Vec<SchemaViolation>> {
    let root_violation = |problem: String| {
        vec![SchemaViolation {
            path: String::new(),
            problem,
        }]
    };

    let text = match text.map(strip_json_fences) {
        Some(t) if !t.is_empty() => t,
        _ => return Err(root_violation("response contained no JSON text".to_string())),
    };
    let value: Value = serde_json::from_str(text)
        .map_err(|e| root_violation(format!("response is not valid JSON: {e}")))?;
    validate(schema, &value)?;
    Ok(value)
}
