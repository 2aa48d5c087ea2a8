//! Error types for parley
//!
//! Every fallible operation in the core returns [`ParleyResult`]. All variants
//! carry a human-readable message plus optional context; [`UnifiedError`]
//! exposes a stable code for programmatic handling.

mod constructors;
mod conversions;
mod types;
mod unified_error;

pub use types::{ParleyError, ParleyResult, UnifiedError};
