// Structured Generation Adapter.
// A prompt plus a target schema in; a schema-conformant JSON value or a typed failure out.
// All model calls go through llm_client; no direct HTTP here.

pub mod adapter;
pub mod prompts;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::schema::{SchemaDescriptor, SchemaViolation};

pub use adapter::StructuredGenerator;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 4;

/// Persona of the agent that performs a stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentProfile {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl AgentProfile {
    pub fn new(role: &str, goal: &str, backstory: &str) -> Self {
        Self {
            role: role.to_string(),
            goal: goal.to_string(),
            backstory: backstory.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub agent: AgentProfile,
    /// Fully built task prompt, including any embedded prior-stage output.
    pub prompt: String,
    pub schema: &'static SchemaDescriptor,
    /// Whether the model may call the retrieval tools.
    pub use_retrieval: bool,
}

/// Classification of a terminal stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    GenerationFailure,
    SchemaValidationFailure,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::GenerationFailure => f.write_str("GenerationFailure"),
            FailureKind::SchemaValidationFailure => f.write_str("SchemaValidationFailure"),
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Prompt must not be empty")]
    EmptyPrompt,

    #[error("Inference backend error: {0}")]
    Backend(#[from] LlmError),

    #[error("Inference call exceeded {0:?}")]
    Timeout(Duration),

    #[error("Output did not match schema {schema} after {attempts} attempt(s): {}", summarize(.violations))]
    SchemaValidation {
        schema: &'static str,
        attempts: u32,
        violations: Vec<SchemaViolation>,
    },
}

impl GenerationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GenerationError::SchemaValidation { .. } => FailureKind::SchemaValidationFailure,
            GenerationError::EmptyPrompt
            | GenerationError::Backend(_)
            | GenerationError::Timeout(_) => FailureKind::GenerationFailure,
        }
    }
}

fn summarize(violations: &[SchemaViolation]) -> String {
    const SHOWN: usize = 3;
    let mut parts: Vec<String> = violations.iter().take(SHOWN).map(|v| v.to_string()).collect();
    if violations.len() > SHOWN {
        parts.push(format!("and {} more", violations.len() - SHOWN));
    }
    parts.join("; ")
}

/// Bounds applied by the structured generation adapter.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// Re-prompts after schema-invalid output. Total attempts = 1 + max_retries.
    pub max_retries: u32,
    /// Upper bound on each inference call.
    pub request_timeout: Duration,
    /// Maximum tool-call rounds within one attempt.
    pub max_tool_rounds: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }
}

/// The orchestrator's view of generation: succeeds with schema-conformant
/// output, or fails.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, GenerationError>;
}
