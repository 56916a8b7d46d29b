//! Prompt construction for the two model call sites.

use minijinja::{Environment, context};
use serde::Serialize;

use crate::error::AssistantError;
use crate::pipeline::ScoredPaper;

/// System prompt for the routing call: turn a research question into an
/// arXiv query, emitted as a tool-call envelope.
pub const SYSTEM_PROMPT: &str = r#"You are a search query engineer. Your goal is to transform a user's research question into a precise arXiv API query string.

Rules:
Use field prefixes: ti: (title), au: (author), abs: (abstract), cat: (category).
Use Boolean operators: AND, OR, ANDNOT (must be capitalized).
Group terms using parentheses.
If the user mentions a specific field (e.g., "find papers by Hinton"), use au:.
If a user is looking for a specific concept, you should use Title(ti:) or Abstract(abs:).
Query Expansion: Include synonyms (e.g., "LLM" OR "Large Language Model").

[FUNCTION_SCHEMA]
{"function": "search_arxiv", "arguments": {"query": "string"}}

[EXAMPLES]
User: "Search for quantum computing."
Assistant: {"function": "search_arxiv", "arguments": {"query": "all:quantum AND all:computing"}}

User: "Find papers by Einstein."
Assistant: {"function": "search_arxiv", "arguments": {"query": "au:Einstein"}}"#;

const SYNTHESIS_TEMPLATE: &str = r#"You are a research assistant summarizing academic papers. Create natural, engaging summaries of the following papers that include all key information in a conversational tone.
{% for paper in papers %}
Title: {{ paper.title }}
Abstract: {{ paper.summary }}
PDF URL: {{ paper.pdf_url }}
{% endfor %}
For each paper, write a comprehensive summary that covers:
1. What the paper is about (based on title and abstract)
2. Links to access the full paper

Make it sound natural and informative, like you're explaining it to someone interested in the field. Organize the response clearly with titles."#;

#[derive(Serialize)]
struct SynthesisPaper<'a> {
    title: &'a str,
    summary: &'a str,
    pdf_url: String,
}

/// Renders the single-turn synthesis prompt for the selected papers.
pub fn render_synthesis(papers: &[ScoredPaper]) -> Result<String, AssistantError> {
    let papers: Vec<SynthesisPaper<'_>> = papers
        .iter()
        .map(|scored| SynthesisPaper {
            title: &scored.paper.title,
            summary: &scored.paper.summary,
            pdf_url: scored
                .paper
                .pdf_url()
                .map(|url| url.to_string())
                .or_else(|| scored.paper.abstract_url())
                .unwrap_or_default(),
        })
        .collect();

    let env = Environment::new();
    let template = env
        .template_from_str(SYNTHESIS_TEMPLATE)
        .map_err(|err| AssistantError::Prompt(err.to_string()))?;
    template
        .render(context! { papers })
        .map_err(|err| AssistantError::Prompt(err.to_string()))
}
