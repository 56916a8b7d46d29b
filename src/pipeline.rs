//! The fetch → rerank → select → synthesize retrieval pipeline.
//!
//! One call per dispatched `search_arxiv` action. The pipeline fetches a
//! capped candidate set for the expanded query, scores every candidate
//! summary against the question the user originally asked, keeps the top
//! three by score, and asks the model to narrate them in a fresh
//! single-turn prompt outside the session history. The pipeline never
//! touches the session; history is the orchestrator's alone.

use std::sync::Arc;

use tracing::debug;

use crate::arxiv::{FetchOutcome, PaperSource};
use crate::error::AssistantError;
use crate::llm::{CompletionOptions, LanguageModel};
use crate::paper::Paper;
use crate::prompts;
use crate::rerank::{RankError, RelevanceRanker};
use crate::session::Turn;

/// Candidate cap for one fetch.
pub const MAX_FETCH_RESULTS: usize = 50;
/// Papers kept after re-ranking.
pub const TOP_K: usize = 3;

/// A paper paired with its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPaper {
    pub paper: Paper,
    pub score: f32,
}

/// Composed retrieval stage: paper source, ranker, and the model used for
/// synthesis.
pub struct SearchPipeline {
    source: Arc<dyn PaperSource>,
    ranker: Arc<dyn RelevanceRanker>,
    llm: Arc<dyn LanguageModel>,
}

impl SearchPipeline {
    pub fn new(
        source: Arc<dyn PaperSource>,
        ranker: Arc<dyn RelevanceRanker>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self { source, ranker, llm }
    }

    /// Runs the full pipeline for one search.
    ///
    /// `query` is the expanded search string the model emitted; `question`
    /// is the user's original question and is what candidates are scored
    /// against. Ranking and synthesis failures are fatal; an empty or
    /// failed fetch is reported as ordinary text.
    pub async fn search(&self, query: &str, question: &str) -> Result<String, AssistantError> {
        let papers = match self.source.fetch(query, MAX_FETCH_RESULTS).await {
            FetchOutcome::Fetched(papers) if !papers.is_empty() => papers,
            FetchOutcome::Fetched(_) => return Ok(no_papers_found(query)),
            FetchOutcome::Failed(reason) => {
                debug!(query, reason, "fetch failure absorbed into empty result");
                return Ok(no_papers_found(query));
            }
        };
        debug!(query, candidates = papers.len(), "fetched candidates");

        let summaries: Vec<String> = papers.iter().map(|paper| paper.summary.clone()).collect();
        let scores = self.ranker.score(question, &summaries).await?;
        if scores.len() != papers.len() {
            return Err(RankError::Misaligned(format!(
                "expected {} scores, got {}",
                papers.len(),
                scores.len()
            ))
            .into());
        }

        let mut ranked: Vec<ScoredPaper> = papers
            .into_iter()
            .zip(scores)
            .map(|(paper, score)| ScoredPaper { paper, score })
            .collect();
        // Stable sort: equal scores keep their fetch order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(TOP_K);
        debug!(selected = ranked.len(), "selected top candidates");

        let prompt = prompts::render_synthesis(&ranked)?;
        let summary = self
            .llm
            .complete(&[Turn::user(prompt)], &CompletionOptions::synthesis())
            .await?;
        Ok(summary)
    }
}

fn no_papers_found(query: &str) -> String {
    format!("No papers found for query: {query}")
}
