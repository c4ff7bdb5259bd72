//! Stage definitions and the two standard pipeline variants.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::generation::AgentProfile;
use crate::pipeline::prompts::{
    ANALYSIS_BACKSTORY, ANALYSIS_GOAL, ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_ROLE, EMAILS_BACKSTORY,
    EMAILS_GOAL, EMAILS_PROMPT_TEMPLATE, EMAILS_ROLE, SEARCH_BACKSTORY, SEARCH_GOAL,
    SEARCH_PROMPT_TEMPLATE, SEARCH_ROLE,
};
use crate::schema::{schema_for, SchemaDescriptor};

/// Identity of a stage; also the key its output is recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    ResumeAnalysis,
    JobSearch,
    ApplicationEmails,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::ResumeAnalysis => "resume_analysis",
            StageKind::JobSearch => "job_search",
            StageKind::ApplicationEmails => "application_emails",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which standard pipeline to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PipelineVariant {
    /// Resume analysis → job search.
    Search,
    /// Resume analysis → job search → application emails.
    #[default]
    Apply,
}

impl FromStr for PipelineVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search" => Ok(PipelineVariant::Search),
            "apply" => Ok(PipelineVariant::Apply),
            other => Err(format!("unknown pipeline variant '{other}' (expected 'search' or 'apply')")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageDefinition {
    pub kind: StageKind,
    pub agent: AgentProfile,
    /// Instruction template. `{resume_text}` and `{context}` are filled by the orchestrator.
    pub instructions: String,
    /// Earlier stages whose validated output is embedded in this stage's prompt.
    pub depends_on: Vec<StageKind>,
    pub uses_retrieval: bool,
}

impl StageDefinition {
    pub fn schema(&self) -> &'static SchemaDescriptor {
        schema_for(self.kind)
    }
}

pub fn resume_analysis_stage() -> StageDefinition {
    StageDefinition {
        kind: StageKind::ResumeAnalysis,
        agent: AgentProfile::new(ANALYSIS_ROLE, ANALYSIS_GOAL, ANALYSIS_BACKSTORY),
        instructions: ANALYSIS_PROMPT_TEMPLATE.to_string(),
        depends_on: vec![],
        uses_retrieval: false,
    }
}

pub fn job_search_stage() -> StageDefinition {
    StageDefinition {
        kind: StageKind::JobSearch,
        agent: AgentProfile::new(SEARCH_ROLE, SEARCH_GOAL, SEARCH_BACKSTORY),
        instructions: SEARCH_PROMPT_TEMPLATE.to_string(),
        depends_on: vec![StageKind::ResumeAnalysis],
        uses_retrieval: true,
    }
}

pub fn application_emails_stage() -> StageDefinition {
    StageDefinition {
        kind: StageKind::ApplicationEmails,
        agent: AgentProfile::new(EMAILS_ROLE, EMAILS_GOAL, EMAILS_BACKSTORY),
        instructions: EMAILS_PROMPT_TEMPLATE.to_string(),
        depends_on: vec![StageKind::ResumeAnalysis, StageKind::JobSearch],
        uses_retrieval: false,
    }
}

pub fn standard_stages(variant: PipelineVariant) -> Vec<StageDefinition> {
    let mut stages = vec![resume_analysis_stage(), job_search_stage()];
    if variant == PipelineVariant::Apply {
        stages.push(application_emails_stage());
    }
    stages
}
