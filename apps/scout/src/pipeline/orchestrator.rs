//! Stage Orchestrator.
//!
//! Runs stage definitions strictly in declaration order. Each stage's prompt
//! embeds the validated output of the stages it declares as dependencies; the
//! first failing stage aborts the run and later stages never execute.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::ScoutError;
use crate::generation::{FailureKind, GenerationError, GenerationRequest, Generator};
use crate::models::{JobApplicationEmails, JobListings};
use crate::pipeline::prompts::{CONTEXT_HEADER, CONTEXT_SECTION_TEMPLATE};
use crate::pipeline::result::{PipelineResult, StageOutput, StageRecord};
use crate::pipeline::stages::{StageDefinition, StageKind};
use crate::pipeline::state::{RunState, RunTracker};
use crate::schema::{schema_for, SchemaViolation};

pub struct Pipeline {
    stages: Vec<StageDefinition>,
    generator: Arc<dyn Generator>,
}

impl Pipeline {
    /// Builds a pipeline after checking the dependency declarations:
    /// at least one stage, unique stage kinds, and every dependency declared earlier.
    pub fn new(stages: Vec<StageDefinition>, generator: Arc<dyn Generator>) -> Result<Self, ScoutError> {
        validate_stages(&stages)?;
        Ok(Self { stages, generator })
    }

    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    pub async fn run(&self, resume_text: &str) -> Result<PipelineResult, ScoutError> {
        self.execute(resume_text, None).await
    }

    /// Same as [`Pipeline::run`], publishing every state transition to `progress`.
    pub async fn run_with_progress(
        &self,
        resume_text: &str,
        progress: &watch::Sender<RunState>,
    ) -> Result<PipelineResult, ScoutError> {
        self.execute(resume_text, Some(progress)).await
    }

    async fn execute(
        &self,
        resume_text: &str,
        progress: Option<&watch::Sender<RunState>>,
    ) -> Result<PipelineResult, ScoutError> {
        if resume_text.trim().is_empty() {
            return Err(ScoutError::ExtractionInput(
                "resume text is empty".to_string(),
            ));
        }

        let run_id = Uuid::new_v4();
        info!(%run_id, "Starting pipeline with {} stage(s)", self.stages.len());

        let mut tracker = RunTracker::new(progress);
        let mut result = PipelineResult::new(run_id);

        for (index, stage) in self.stages.iter().enumerate() {
            let position = index + 1;
            tracker.advance(RunState::Running {
                position,
                stage: stage.kind,
            });
            let started_at = Utc::now();

            let output = match self.run_stage(stage, position, resume_text, &result).await {
                Ok(output) => output,
                Err(e) => {
                    // Only a missing dependency output is unclassified here.
                    let reason = e.failure_kind().unwrap_or(FailureKind::SchemaValidationFailure);
                    tracker.advance(RunState::Failed {
                        position,
                        stage: stage.kind,
                        reason,
                    });
                    warn!(%run_id, "Aborting pipeline; {} later stage(s) skipped", self.stages.len() - position);
                    return Err(e);
                }
            };

            result.push(StageRecord {
                stage: stage.kind,
                position,
                output,
                started_at,
                finished_at: Utc::now(),
            });
        }

        tracker.advance(RunState::Completed);
        info!(%run_id, state = ?tracker.state(), "Pipeline finished");
        Ok(result)
    }

    async fn run_stage(
        &self,
        stage: &StageDefinition,
        position: usize,
        resume_text: &str,
        completed: &PipelineResult,
    ) -> Result<StageOutput, ScoutError> {
        let dependencies = stage
            .depends_on
            .iter()
            .map(|kind| {
                completed
                    .get(*kind)
                    .map(|output| context_view(stage.kind, output))
                    .ok_or_else(|| anyhow!("output of {kind} is missing before stage {}", stage.kind))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Emails can only go to listings with a contact; with none, there is nothing to draft.
        let contactable = dependencies.iter().find_map(|output| match output {
            StageOutput::Jobs(jobs) if stage.kind == StageKind::ApplicationEmails => Some(jobs.clone()),
            _ => None,
        });
        if let Some(jobs) = &contactable {
            if jobs.is_empty() {
                info!("No listing has a contact email; skipping {}", stage.kind);
                return Ok(StageOutput::Emails(JobApplicationEmails::default()));
            }
        }

        let request = GenerationRequest {
            agent: stage.agent.clone(),
            prompt: build_prompt(stage, resume_text, &render_context(&dependencies)),
            schema: stage.schema(),
            use_retrieval: stage.uses_retrieval,
        };

        let value = self
            .generator
            .generate(&request)
            .await
            .map_err(|source| ScoutError::StageFailed {
                stage: stage.kind,
                position,
                source,
            })?;

        let mut output = StageOutput::decode(stage.kind, value).map_err(|e| ScoutError::StageFailed {
            stage: stage.kind,
            position,
            source: GenerationError::SchemaValidation {
                schema: schema_for(stage.kind).name,
                attempts: 1,
                violations: vec![SchemaViolation {
                    path: String::new(),
                    problem: format!("output could not be decoded: {e}"),
                }],
            },
        })?;

        if let (StageOutput::Emails(emails), Some(jobs)) = (&mut output, &contactable) {
            let dropped = emails.retain_addressed_to(jobs);
            if dropped > 0 {
                warn!("Dropped {} email(s) not addressed to a listed contact", dropped);
            }
        }

        Ok(output)
    }
}

/// Stage-specific view of a dependency's output.
fn context_view(stage: StageKind, output: &StageOutput) -> StageOutput {
    match (stage, output) {
        (StageKind::ApplicationEmails, StageOutput::Jobs(jobs)) => StageOutput::Jobs(jobs.contactable()),
        _ => output.clone(),
    }
}

fn render_context(dependencies: &[StageOutput]) -> String {
    if dependencies.is_empty() {
        return String::new();
    }
    let sections: Vec<String> = dependencies
        .iter()
        .map(|output| {
            let json = serde_json::to_string_pretty(output).unwrap_or_else(|_| output.to_json().to_string());
            CONTEXT_SECTION_TEMPLATE
                .replace("{stage}", output.kind().as_str())
                .replace("{schema}", schema_for(output.kind()).name)
                .replace("{json}", &json)
        })
        .collect();
    format!("{CONTEXT_HEADER}\n\n{}", sections.join("\n\n"))
}

/// Fills `{resume_text}` and `{context}` in one pass, so neither value is re-scanned
/// for placeholders. Context is appended when the template has no slot for it.
fn build_prompt(stage: &StageDefinition, resume_text: &str, context: &str) -> String {
    let template = &stage.instructions;
    let mut prompt = String::with_capacity(template.len() + resume_text.len() + context.len());
    let mut context_placed = false;
    let mut rest = template.as_str();

    while let Some(start) = rest.find('{') {
        prompt.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{resume_text}") {
            prompt.push_str(resume_text);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{context}") {
            prompt.push_str(context);
            context_placed = true;
            rest = after;
        } else {
            prompt.push('{');
            rest = &tail[1..];
        }
    }
    prompt.push_str(rest);

    if !context_placed && !context.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(context);
    }
    prompt
}

fn validate_stages(stages: &[StageDefinition]) -> Result<(), ScoutError> {
    if stages.is_empty() {
        return Err(ScoutError::InvalidPipeline("pipeline has no stages".to_string()));
    }

    let mut declared: HashSet<StageKind> = HashSet::new();
    for stage in stages {
        if declared.contains(&stage.kind) {
            return Err(ScoutError::InvalidPipeline(format!(
                "stage {} is declared more than once",
                stage.kind
            )));
        }
        for dependency in &stage.depends_on {
            if *dependency == stage.kind {
                return Err(ScoutError::InvalidPipeline(format!(
                    "stage {} depends on itself",
                    stage.kind
                )));
            }
            if !declared.contains(dependency) {
                return Err(ScoutError::InvalidPipeline(format!(
                    "stage {} depends on {}, which is not declared before it",
                    stage.kind, dependency
                )));
            }
        }
        declared.insert(stage.kind);
    }
    Ok(())
}

/// Listings the emails stage may address, for callers holding a finished result.
pub fn contactable_listings(result: &PipelineResult) -> JobListings {
    result
        .job_listings()
        .map(JobListings::contactable)
        .unwrap_or_default()
}
