//! Core library for parley
//!
//! Terminal-scoped conversation sessions on disk, and one streaming contract
//! over several LLM vendors.

pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod session;

pub use config::{ConfigOverrides, ProviderConfig, ProviderKind, StoredConfig};
pub use conversation::{TurnOutcome, ask, compose_question, prep};
pub use error::{ParleyError, ParleyResult};
pub use llm::{Message, Provider, ProviderInstance, Question, Response, ResponseStream, Role, Usage};
pub use session::{SessionLookup, SessionManager, SessionState, SessionStore, TerminalIdentity};
