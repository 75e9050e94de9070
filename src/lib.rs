pub mod analysis;
pub mod config;
pub mod db;
pub mod dedupe;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod llm;
pub mod logging;
pub mod normalizer;
pub mod orchestrator;
pub mod parser;
pub mod progress;
pub mod prompt;
pub mod ranker;
pub mod types;

use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;

pub const TARGET_LLM_REQUEST: &str = "llm_request";
pub const TARGET_PIPELINE: &str = "pipeline";
pub const TARGET_DB: &str = "db_query";

#[derive(Clone, Debug)]
pub enum LLMClient {
    Ollama(Ollama),
    OpenAI(OpenAIClient<OpenAIConfig>),
}

/// Everything one completion call needs: which client, which model,
/// and the sampling knobs.
#[derive(Clone)]
pub struct LLMParams {
    pub llm_client: LLMClient,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}
