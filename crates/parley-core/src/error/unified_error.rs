//! UnifiedError implementation for ParleyError

use super::types::{ParleyError, UnifiedError};

impl UnifiedError for ParleyError {
    fn error_code(&self) -> &str {
        match self {
            Self::Config { .. } => "PARLEY_CONFIG",
            Self::Llm { .. } => "PARLEY_LLM",
            Self::Http { .. } => "PARLEY_HTTP",
            Self::Io { .. } => "PARLEY_IO",
            Self::Json { .. } => "PARLEY_JSON",
            Self::Session { .. } => "PARLEY_SESSION",
            Self::InvalidInput { .. } => "PARLEY_INVALID_INPUT",
            Self::NotFound { .. } => "PARLEY_NOT_FOUND",
            Self::Cancelled => "PARLEY_CANCELLED",
            Self::Other { .. } => "PARLEY_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Config { message, .. } => message,
            Self::Llm { message, .. } => message,
            Self::Http { message, .. } => message,
            Self::Io { message, .. } => message,
            Self::Json { message, .. } => message,
            Self::Session { message, .. } => message,
            Self::InvalidInput { message, .. } => message,
            Self::NotFound { message, .. } => message,
            Self::Cancelled => "Stream was cancelled",
            Self::Other { message, .. } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Config { context, .. }
            | Self::Llm { context, .. }
            | Self::Http { context, .. }
            | Self::Io { context, .. }
            | Self::Json { context, .. }
            | Self::Session { context, .. }
            | Self::InvalidInput { context, .. }
            | Self::NotFound { context, .. }
            | Self::Other { context, .. } => context.as_deref(),
            Self::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ParleyError::config("x").error_code(), "PARLEY_CONFIG");
        assert_eq!(ParleyError::Cancelled.error_code(), "PARLEY_CANCELLED");
        assert_eq!(
            ParleyError::session("exists", "abc").error_code(),
            "PARLEY_SESSION"
        );
    }

    #[test]
    fn test_context_is_reported() {
        let err = ParleyError::Io {
            message: "disk full".into(),
            path: None,
            context: Some("writing state.json".into()),
        };
        assert_eq!(err.message(), "disk full");
        assert_eq!(err.context(), Some("writing state.json"));
        assert_eq!(err.to_string(), "IO error: disk full");
    }
}
