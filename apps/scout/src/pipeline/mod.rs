// Stage Orchestrator, run state and result aggregation.

pub mod orchestrator;
pub mod prompts;
pub mod result;
pub mod stages;
pub mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::generation::StructuredGenerator;
use crate::llm_client::LlmClient;
use crate::rate_limit::RequestThrottle;
use crate::retrieval::{PageScraper, Retriever, SerperSearch, WebRetrieval};

pub use orchestrator::{contactable_listings, Pipeline};
pub use result::{PipelineResult, StageOutput, StageRecord};
pub use stages::{standard_stages, PipelineVariant, StageDefinition, StageKind};
pub use state::RunState;

impl Pipeline {
    /// Wires the production collaborators from configuration: the LLM client, the
    /// shared request throttle and, when a search key is configured, web retrieval.
    pub fn from_config(config: &Config, variant: PipelineVariant) -> Result<Self> {
        let throttle = RequestThrottle::per_minute(config.max_rpm).map(Arc::new);
        match &throttle {
            Some(t) => info!("Request throttle: {} per minute", t.ceiling()),
            None => info!("Request throttle disabled"),
        }

        let mut llm = LlmClient::new(config.llm_settings()).context("Failed to build LLM client")?;
        if let Some(throttle) = &throttle {
            llm = llm.with_throttle(throttle.clone());
        }
        info!("LLM client initialized (model: {})", llm.model());

        let mut generator = StructuredGenerator::new(Arc::new(llm), config.generation_settings());

        match &config.serper_api_key {
            Some(key) => {
                let search = SerperSearch::new(key.clone(), config.llm_timeout)
                    .context("Failed to build search client")?;
                let scraper = PageScraper::new(config.llm_timeout)
                    .context("Failed to build page scraper")?;
                let mut retriever = Retriever::new(Arc::new(WebRetrieval::new(search, scraper)));
                if let Some(throttle) = &throttle {
                    retriever = retriever.with_throttle(throttle.clone());
                }
                generator = generator.with_retriever(Arc::new(retriever));
                info!("Web retrieval enabled");
            }
            None => warn!("SERPER_API_KEY not set; job search runs without web retrieval"),
        }

        Ok(Pipeline::new(standard_stages(variant), Arc::new(generator))?)
    }
}
