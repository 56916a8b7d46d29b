//! Relevance scoring of retrieved candidates against the user's question.
//!
//! The ranker is a thin adapter over a cross-encoder served behind a
//! `text-embeddings-inference` style `/rerank` endpoint. Unlike the fetch
//! boundary, ranking failures are not absorbed: a turn whose candidates
//! cannot be scored has no defensible answer, so errors propagate.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from the ranking capability. All of them are fatal to the turn.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("rerank request failed: {0}")]
    Transport(String),

    #[error("rerank endpoint returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("rerank response did not align with candidates: {0}")]
    Misaligned(String),
}

/// Scores candidate texts against a question.
///
/// The returned scores match `candidates` in length and order.
#[async_trait]
pub trait RelevanceRanker: Send + Sync {
    async fn score(&self, question: &str, candidates: &[String]) -> Result<Vec<f32>, RankError>;
}

/// HTTP client for a cross-encoder `/rerank` endpoint.
#[derive(Clone)]
pub struct CrossEncoderClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for CrossEncoderClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossEncoderClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [String],
}

#[derive(Debug, Deserialize)]
struct RankedText {
    index: usize,
    #[serde(alias = "relevance_score")]
    score: f32,
}

#[async_trait]
impl RelevanceRanker for CrossEncoderClient {
    async fn score(&self, question: &str, candidates: &[String]) -> Result<Vec<f32>, RankError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/rerank", self.base_url))
            .json(&RerankRequest {
                query: question,
                texts: candidates,
            })
            .send()
            .await
            .map_err(|err| RankError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(RankError::Api { status, message });
        }

        let ranked: Vec<RankedText> = response
            .json()
            .await
            .map_err(|err| RankError::Transport(err.to_string()))?;

        debug!(candidates = candidates.len(), "scored candidates");
        align_scores(candidates.len(), ranked)
    }
}

/// Restores input order: the endpoint answers sorted by score, each item
/// tagged with the index of the candidate it scored.
fn align_scores(count: usize, ranked: Vec<RankedText>) -> Result<Vec<f32>, RankError> {
    let mut scores: Vec<Option<f32>> = vec![None; count];
    for item in ranked {
        let slot = scores.get_mut(item.index).ok_or_else(|| {
            RankError::Misaligned(format!(
                "response referenced candidate {} of {}",
                item.index, count
            ))
        })?;
        *slot = Some(item.score);
    }

    scores
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| {
                RankError::Misaligned(format!("candidate {index} was never scored"))
            })
        })
        .collect()
}
