//! Result Aggregator: per-stage validated outputs addressable by stage or position.
//! Values are stored exactly as the stage produced them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::{JobApplicationEmails, JobListings, ResumeAnalysis};
use crate::pipeline::stages::StageKind;

/// Typed output of one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StageOutput {
    Analysis(ResumeAnalysis),
    Jobs(JobListings),
    Emails(JobApplicationEmails),
}

impl StageOutput {
    /// Decodes an already schema-validated value into the stage's typed output.
    pub fn decode(kind: StageKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            StageKind::ResumeAnalysis => StageOutput::Analysis(serde_json::from_value(value)?),
            StageKind::JobSearch => StageOutput::Jobs(serde_json::from_value(value)?),
            StageKind::ApplicationEmails => StageOutput::Emails(serde_json::from_value(value)?),
        })
    }

    pub fn kind(&self) -> StageKind {
        match self {
            StageOutput::Analysis(_) => StageKind::ResumeAnalysis,
            StageOutput::Jobs(_) => StageKind::JobSearch,
            StageOutput::Emails(_) => StageKind::ApplicationEmails,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: StageKind,
    /// 1-based position in the pipeline.
    pub position: usize,
    pub output: StageOutput,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Outputs of a completed run, in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub records: Vec<StageRecord>,
}

impl PipelineResult {
    pub(crate) fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            records: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, record: StageRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, stage: StageKind) -> Option<&StageOutput> {
        self.records.iter().find(|r| r.stage == stage).map(|r| &r.output)
    }

    /// Output at a 1-based position.
    pub fn at(&self, position: usize) -> Option<&StageOutput> {
        self.records
            .iter()
            .find(|r| r.position == position)
            .map(|r| &r.output)
    }

    /// Output of the last stage.
    pub fn final_output(&self) -> Option<&StageOutput> {
        self.records.last().map(|r| &r.output)
    }

    pub fn resume_analysis(&self) -> Option<&ResumeAnalysis> {
        match self.get(StageKind::ResumeAnalysis)? {
            StageOutput::Analysis(a) => Some(a),
            _ => None,
        }
    }

    pub fn job_listings(&self) -> Option<&JobListings> {
        match self.get(StageKind::JobSearch)? {
            StageOutput::Jobs(j) => Some(j),
            _ => None,
        }
    }

    pub fn application_emails(&self) -> Option<&JobApplicationEmails> {
        match self.get(StageKind::ApplicationEmails)? {
            StageOutput::Emails(e) => Some(e),
            _ => None,
        }
    }

    /// Stage outputs keyed by stage name, in execution order.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for record in &self.records {
            map.insert(record.stage.as_str().to_string(), record.output.to_json());
        }
        Value::Object(map)
    }
}
