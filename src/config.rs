//! Environment-driven configuration for the binary.

use std::env;

const DEFAULT_LLM_URL: &str = "http://localhost:8000";
const DEFAULT_LLM_MODEL: &str = "meta-llama/Llama-3.1-8B-Instruct";
const DEFAULT_RERANK_URL: &str = "http://localhost:8080";
const DEFAULT_ARXIV_URL: &str = "http://export.arxiv.org";

/// Endpoints and model id for the three external capabilities.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub rerank_url: String,
    pub arxiv_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Variables (all optional):
    /// - `PAPER_SCOUT_LLM_URL`: OpenAI-compatible endpoint
    /// - `PAPER_SCOUT_LLM_MODEL`: model id
    /// - `PAPER_SCOUT_LLM_API_KEY`: bearer token, omitted when unset
    /// - `PAPER_SCOUT_RERANK_URL`: cross-encoder endpoint
    /// - `PAPER_SCOUT_ARXIV_URL`: arXiv API base
    pub fn from_env() -> Self {
        Self {
            llm_url: env::var("PAPER_SCOUT_LLM_URL")
                .unwrap_or_else(|_| DEFAULT_LLM_URL.to_string()),
            llm_model: env::var("PAPER_SCOUT_LLM_MODEL")
                .unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            llm_api_key: env::var("PAPER_SCOUT_LLM_API_KEY").ok(),
            rerank_url: env::var("PAPER_SCOUT_RERANK_URL")
                .unwrap_or_else(|_| DEFAULT_RERANK_URL.to_string()),
            arxiv_url: env::var("PAPER_SCOUT_ARXIV_URL")
                .unwrap_or_else(|_| DEFAULT_ARXIV_URL.to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
