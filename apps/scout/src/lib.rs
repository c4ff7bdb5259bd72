pub mod config;
pub mod errors;
pub mod extract;
pub mod generation;
pub mod llm_client;
pub mod models;
pub mod pipeline;
pub mod rate_limit;
pub mod render;
pub mod retrieval;
pub mod schema;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use errors::ScoutError;
pub use pipeline::{Pipeline, PipelineResult, PipelineVariant, RunState, StageKind};
