//! Terminal-scoped sessions
//!
//! A terminal finds its session implicitly: [`identity`] names the terminal,
//! [`lookup`] maps it to a session id, [`store`] persists the conversation and
//! [`manager`] combines them for lifecycle operations.

pub mod identity;
pub mod lookup;
pub mod manager;
pub mod store;
pub mod types;

pub use identity::TerminalIdentity;
pub use lookup::SessionLookup;
pub use manager::{SessionManager, is_allowed_name_char, is_uuid, is_valid_session_name};
pub use store::SessionStore;
pub use types::{HistoryEntry, SessionHeader, SessionState};
