//! Fatal errors for a conversation turn.
//!
//! Only three things abort a turn: a failed completion call (either call
//! site), a failed ranking call, or a prompt that cannot be rendered.
//! Everything else (empty search results, unknown tool names, malformed
//! model output, fetch transport failures) is reported to the user as
//! ordinary text and never surfaces here.

use thiserror::Error;

use crate::llm::CompletionError;
use crate::rerank::RankError;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("language model call failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("relevance ranking failed: {0}")]
    Ranking(#[from] RankError),

    #[error("failed to render prompt: {0}")]
    Prompt(String),
}
