//! Scripted test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::generation::{GenerationError, GenerationRequest, Generator};
use crate::llm_client::{
    CompletionRequest, ContentBlock, InferenceBackend, LlmError, LlmResponse, Usage,
};
use crate::retrieval::{RetrievalBackend, RetrievalError, SearchHit};

pub(crate) fn text_response(text: &str) -> LlmResponse {
    LlmResponse {
        content: vec![ContentBlock::Text {
            text: text.to_string(),
        }],
        stop_reason: Some("end_turn".to_string()),
        usage: Usage::default(),
    }
}

pub(crate) fn tool_use_response(id: &str, name: &str, input: Value) -> LlmResponse {
    LlmResponse {
        content: vec![ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }],
        stop_reason: Some("tool_use".to_string()),
        usage: Usage::default(),
    }
}

fn script_exhausted() -> LlmError {
    LlmError::Api {
        status: 500,
        message: "script exhausted".to_string(),
    }
}

// ── Inference ───────────────────────────────────────────────────────────────

/// Replays canned responses in order and records every request.
pub(crate) struct ScriptedBackend {
    script: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub(crate) fn new(script: Vec<Result<LlmResponse, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(script_exhausted()))
    }
}

/// Never answers within any reasonable timeout.
pub(crate) struct SlowBackend {
    pub delay: Duration,
}

#[async_trait]
impl InferenceBackend for SlowBackend {
    async fn complete(&self, _request: &CompletionRequest) -> Result<LlmResponse, LlmError> {
        tokio::time::sleep(self.delay).await;
        Ok(text_response("{}"))
    }
}

// ── Generation ──────────────────────────────────────────────────────────────

/// Orchestrator-level double: returns scripted stage outputs in call order.
pub(crate) struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<Value, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub(crate) fn new(script: Vec<Result<Value, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Schema names requested, in call order.
    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.schema.name)
            .collect()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Backend(script_exhausted())))
    }
}

// ── Retrieval ───────────────────────────────────────────────────────────────

/// Fixed search hits and page text.
pub(crate) struct StaticRetrieval {
    pub hits: Vec<SearchHit>,
    pub page: String,
}

impl Default for StaticRetrieval {
    fn default() -> Self {
        Self {
            hits: vec![
                SearchHit {
                    title: "Backend Engineer (Go)".to_string(),
                    url: "https://jobs.example.com/1".to_string(),
                    snippet: "Go, PostgreSQL, remote. Apply: jobs@acme.io".to_string(),
                },
                SearchHit {
                    title: "Platform Engineer".to_string(),
                    url: "https://jobs.example.com/2".to_string(),
                    snippet: "Kubernetes, Go, hybrid in Lisbon".to_string(),
                },
            ],
            page: "Backend Engineer (Go) at Acme. Requirements: Go, PostgreSQL.".to_string(),
        }
    }
}

#[async_trait]
impl RetrievalBackend for StaticRetrieval {
    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, RetrievalError> {
        Ok(self.hits.clone())
    }

    async fn scrape(&self, _url: &str) -> Result<String, RetrievalError> {
        Ok(self.page.clone())
    }
}

/// Every call fails like an unreachable search API.
pub(crate) struct FailingRetrieval;

#[async_trait]
impl RetrievalBackend for FailingRetrieval {
    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, RetrievalError> {
        Err(RetrievalError::Api {
            status: 503,
            message: "search unavailable".to_string(),
        })
    }

    async fn scrape(&self, _url: &str) -> Result<String, RetrievalError> {
        Err(RetrievalError::Api {
            status: 503,
            message: "scrape unavailable".to_string(),
        })
    }
}
