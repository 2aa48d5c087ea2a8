//! CLI console utilities

use colored::*;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Password};
use parley_core::error::{ParleyError, ParleyResult};
use std::io::{self, Write};

/// CLI console for formatted output.
///
/// Diagnostics go to stderr so that stdout carries only command output and
/// streamed answers.
pub struct CliConsole {
    verbose: bool,
}

impl CliConsole {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Print an info message (verbose only)
    pub fn info(&self, message: &str) {
        if self.verbose {
            eprintln!("{} {}", "ℹ".blue().bold(), message);
        }
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message.green());
    }

    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }

    /// Report a failed command; verbose mode adds the error code and context
    pub fn report(&self, error: &ParleyError) {
        self.error(&format::error_report(error, self.verbose));
    }

    /// Write a piece of a streamed answer without a trailing newline
    pub fn print_delta(&self, delta: &str) {
        let mut stdout = io::stdout().lock();
        // A closed stdout (e.g. `| head`) must not abort the turn
        let _ = stdout.write_all(delta.as_bytes());
        let _ = stdout.flush();
    }

    /// Ask for a yes/no answer, defaulting to no
    pub fn confirm(&self, message: &str) -> ParleyResult<bool> {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(message)
            .default(false)
            .interact()
            .map_err(|e| ParleyError::io(format!("Failed to read answer: {}", e)))
    }

    /// Read a secret without echoing it
    pub fn password(&self, prompt: &str) -> ParleyResult<String> {
        Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| ParleyError::io(format!("Failed to read input: {}", e)))
    }
}

/// Utility functions for console formatting
pub mod format {
    use chrono::{DateTime, Local, Utc};
    use parley_core::error::{ParleyError, UnifiedError};
    use parley_core::session::SessionHeader;

    /// One-line description of a failure
    pub fn error_report(error: &ParleyError, verbose: bool) -> String {
        if !verbose {
            return error.to_string();
        }
        match error.context() {
            Some(context) => format!("{} ({}) [{}]", error, context, error.error_code()),
            None => format!("{} [{}]", error, error.error_code()),
        }
    }

    /// `i=<last>/<total>, o=<last>/<total>, created <local time>`
    pub fn counters(header: &SessionHeader) -> String {
        format!(
            "i={}/{}, o={}/{}, created {}",
            header.input_tokens,
            header.input_tokens_accum,
            header.output_tokens,
            header.output_tokens_accum,
            timestamp(header.created_at)
        )
    }

    fn timestamp(at: DateTime<Utc>) -> String {
        at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Suffix marking the terminal's current session in listings
    pub fn current_marker(id: &str, current: Option<&str>) -> &'static str {
        if current == Some(id) {
            " [ *current* ]"
        } else {
            ""
        }
    }
}

#[cfg(test)]
mod tests {
    use super::format;
    use parley_core::error::ParleyError;
    use parley_core::llm::Usage;
    use parley_core::session::SessionHeader;

    #[test]
    fn test_counters() {
        let mut header = SessionHeader::new("abc");
        header.record_turn(&Usage::new(10, 4));
        header.record_turn(&Usage::new(20, 6));

        let text = format::counters(&header);
        assert!(text.starts_with("i=20/30, o=6/10, created "));
    }

    #[test]
    fn test_error_report() {
        let err = ParleyError::Json {
            message: "bad map".into(),
            context: Some("YAML".into()),
        };
        assert_eq!(format::error_report(&err, false), "JSON error: bad map");
        assert_eq!(
            format::error_report(&err, true),
            "JSON error: bad map (YAML) [PARLEY_JSON]"
        );
        assert_eq!(
            format::error_report(&ParleyError::config("no key"), true),
            "Configuration error: no key [PARLEY_CONFIG]"
        );
    }

    #[test]
    fn test_current_marker() {
        assert_eq!(format::current_marker("a", Some("a")), " [ *current* ]");
        assert_eq!(format::current_marker("a", Some("b")), "");
        assert_eq!(format::current_marker("a", None), "");
    }
}
