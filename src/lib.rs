//! `paper-scout` - a single-session conversational research assistant.
//!
//! The assistant accepts free-text user turns and asks a language model to
//! either answer directly or emit a structured tool call. When the model
//! requests a literature search, the retrieval pipeline fetches candidate
//! papers from arXiv, re-ranks them against the user's original question
//! with a cross-encoder, and synthesizes a natural-language summary of the
//! top results.
//!
//! The external capabilities (completion, paper fetch, relevance scoring)
//! are traits ([`LanguageModel`], [`PaperSource`], [`RelevanceRanker`])
//! with HTTP implementations, so the orchestration logic is testable
//! without a network.

pub mod arxiv;
pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod paper;
pub mod pipeline;
pub mod prompts;
pub mod rerank;
pub mod router;
pub mod session;

pub use arxiv::{ArxivClient, FetchOutcome, PaperSource};
pub use config::Config;
pub use error::AssistantError;
pub use llm::{CompletionError, CompletionOptions, LanguageModel, OpenAiCompatClient};
pub use orchestrator::ResearchAssistant;
pub use paper::{Paper, PaperLink};
pub use pipeline::{ScoredPaper, SearchPipeline};
pub use rerank::{CrossEncoderClient, RankError, RelevanceRanker};
pub use router::{RoutedAction, route};
pub use session::{Role, Session, Turn};
