//! Conversation state: role-tagged turns and the append-only session.
//!
//! A [`Session`] owns the ordered turn history for one conversation plus a
//! cached copy of the most recent user question. The cached question exists
//! because re-ranking scores candidates against the question the user
//! actually asked, not against the expanded search query the model emits.
//!
//! The public surface is read-only. History mutation happens in one place,
//! the orchestrator's commit step, which runs only after a turn has fully
//! succeeded. This keeps two invariants in a single code path: the system
//! turn is inserted at most once and always first, and a failed turn leaves
//! the history exactly as it was.

use serde::Serialize;

/// The speaker of a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire-format name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One role-tagged message in a conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only history for one conversation.
///
/// Sessions are caller-owned and passed into every orchestrator call, so
/// independent conversations never share state. Turns within one session
/// must be externally serialized; append order carries meaning.
#[derive(Debug, Default)]
pub struct Session {
    turns: Vec<Turn>,
    last_question: String,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full turn history, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent committed user question, or the empty string before
    /// the first successful turn.
    pub fn last_question(&self) -> &str {
        &self.last_question
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Records one completed exchange.
    ///
    /// Inserts the system turn if and only if the session is still empty,
    /// then appends the user turn and the raw assistant completion, and
    /// caches the question. Called by the orchestrator strictly after the
    /// routed or synthesized result is in hand.
    pub(crate) fn commit_exchange(
        &mut self,
        system_prompt: &str,
        user_text: &str,
        raw_completion: &str,
    ) {
        if self.turns.is_empty() {
            self.turns.push(Turn::system(system_prompt));
        }
        self.turns.push(Turn::user(user_text));
        self.turns.push(Turn::assistant(raw_completion));
        self.last_question = user_text.to_string();
    }
}
