//! Persisted conversation state

use crate::llm::messages::{Message, Usage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Counters and timestamps of a session, stored on their own in `header.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHeader {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Prompt tokens of the last turn
    #[serde(default)]
    pub input_tokens: u64,
    /// Completion tokens of the last turn
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub input_tokens_accum: u64,
    #[serde(default)]
    pub output_tokens_accum: u64,
}

impl SessionHeader {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            created_at: now,
            updated_at: now,
            input_tokens: 0,
            output_tokens: 0,
            input_tokens_accum: 0,
            output_tokens_accum: 0,
        }
    }

    /// Overwrite last-turn counts and add them to the running totals
    pub fn record_turn(&mut self, usage: &Usage) {
        self.input_tokens = usage.prompt_tokens;
        self.output_tokens = usage.completion_tokens;
        self.input_tokens_accum = self.input_tokens_accum.saturating_add(usage.prompt_tokens);
        self.output_tokens_accum = self
            .output_tokens_accum
            .saturating_add(usage.completion_tokens);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum EntryKind {
    Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    #[serde(rename = "type")]
    kind: EntryKind,
    pub message: Message,
}

/// One element of a session's history.
///
/// Only `message` entries are produced here; anything else found on disk is
/// kept as raw JSON and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryEntry {
    Message(MessageEntry),
    Other(Value),
}

impl HistoryEntry {
    pub fn message(message: Message) -> Self {
        HistoryEntry::Message(MessageEntry {
            kind: EntryKind::Message,
            message,
        })
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            HistoryEntry::Message(entry) => Some(&entry.message),
            HistoryEntry::Other(_) => None,
        }
    }
}

/// Header plus ordered history, stored in `state.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(flatten)]
    pub header: SessionHeader,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub history: Vec<HistoryEntry>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<HistoryEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<HistoryEntry>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl SessionState {
    /// Fresh, not yet stored session
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            header: SessionHeader::new(session_id),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.header.session_id
    }

    pub fn add_message(&mut self, message: Message) {
        self.history.push(HistoryEntry::message(message));
    }

    /// Messages in order, skipping other entry kinds
    pub fn message_history(&self) -> Vec<Message> {
        self.history
            .iter()
            .filter_map(HistoryEntry::as_message)
            .cloned()
            .collect()
    }
}
