//! The conversation orchestrator.
//!
//! [`ResearchAssistant::respond`] drives one turn: render the prospective
//! history into a routing call, classify the completion, dispatch a tool
//! call through the retrieval pipeline when asked, and only then commit
//! the exchange to the session. The raw completion is what enters history,
//! not the routed or synthesized result; routing side effects are derived,
//! never canonical.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::arxiv::PaperSource;
use crate::error::AssistantError;
use crate::llm::{CompletionOptions, LanguageModel};
use crate::pipeline::SearchPipeline;
use crate::prompts::SYSTEM_PROMPT;
use crate::rerank::RelevanceRanker;
use crate::router::{RoutedAction, route};
use crate::session::{Session, Turn};

/// A single-session research assistant over three external capabilities.
pub struct ResearchAssistant {
    llm: Arc<dyn LanguageModel>,
    pipeline: SearchPipeline,
}

impl ResearchAssistant {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        source: Arc<dyn PaperSource>,
        ranker: Arc<dyn RelevanceRanker>,
    ) -> Self {
        let pipeline = SearchPipeline::new(source, ranker, Arc::clone(&llm));
        Self { llm, pipeline }
    }

    /// Answers one user turn.
    ///
    /// On success the session gains exactly one user turn and one assistant
    /// turn (plus the system turn, once, on the session's first exchange).
    /// On a fatal error the session is untouched: nothing is committed
    /// until the routed or synthesized result exists.
    pub async fn respond(
        &self,
        session: &mut Session,
        user_text: &str,
    ) -> Result<String, AssistantError> {
        let mut turns = Vec::with_capacity(session.turns().len() + 2);
        if session.is_empty() {
            turns.push(Turn::system(SYSTEM_PROMPT));
        }
        turns.extend_from_slice(session.turns());
        turns.push(Turn::user(user_text));

        let completion = self
            .llm
            .complete(&turns, &CompletionOptions::routing())
            .await?;

        let action = route(&completion);
        info!(action = action.kind(), "routed model output");

        let reply = self.dispatch(action, user_text).await?;

        session.commit_exchange(SYSTEM_PROMPT, user_text, &completion);
        Ok(reply)
    }

    /// Turns a routed action into the user-facing reply.
    async fn dispatch(
        &self,
        action: RoutedAction,
        question: &str,
    ) -> Result<String, AssistantError> {
        match action {
            RoutedAction::PlainText(text) => Ok(text),
            RoutedAction::NoOp => Ok(String::new()),
            RoutedAction::ToolCall { name, arguments } if name == "search_arxiv" => {
                // A missing or non-string query passes through as empty;
                // the fetch endpoint owns empty-query semantics.
                let query = arguments
                    .get("query")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                self.pipeline.search(query, question).await
            }
            RoutedAction::ToolCall { name, .. } => {
                Ok(format!("Error: Unknown function '{name}'"))
            }
        }
    }
}
