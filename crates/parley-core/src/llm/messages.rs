//! Message types exchanged with LLM providers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name shared by the OpenAI and Anthropic APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversational message
///
/// The persisted field names are `SourceType` and `Content`; lower-case
/// `role`/`content` are accepted when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "SourceType", alias = "role")]
    pub role: Role,
    #[serde(rename = "Content", alias = "content")]
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Full conversation sent to a provider: stored history plus the new turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Question {
    pub messages: Vec<Message>,
}

impl Question {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Single user message question, used for one-shot prompts
    pub fn single(content: impl Into<String>) -> Self {
        Self::new(vec![Message::user(content)])
    }
}

/// One role-tagged text delta
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub index: usize,
    pub message: Message,
}

impl Choice {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            index: 0,
            message: Message::new(role, content),
        }
    }
}

/// Token accounting reported by a vendor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// A partial or aggregated provider response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub choices: Vec<Choice>,
    /// Only set on chunks where the vendor reported usage
    pub usage: Option<Usage>,
}

impl Response {
    /// Chunk carrying one text delta
    pub fn delta(role: Role, text: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice::new(role, text)],
            usage: None,
        }
    }

    /// Zero-choice chunk carrying a usage snapshot
    pub fn usage_only(usage: Usage) -> Self {
        Self {
            choices: Vec::new(),
            usage: Some(usage),
        }
    }

    /// Concatenated text of all choices
    pub fn text(&self) -> String {
        self.choices
            .iter()
            .map(|c| c.message.content.as_str())
            .collect()
    }
}
