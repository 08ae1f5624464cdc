//! Diagnostic types and the shared reporter that owns the error flags.

use crate::token::{Token, TokenType};
use thiserror::Error;

/// A dynamic failure raised during evaluation. Carries the token nearest
/// the failure so the driver can report a source line.
#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
    pub token: Token,
}

impl RuntimeError {
    pub fn new(token: &Token, message: impl Into<String>) -> Self {
        RuntimeError {
            message: message.into(),
            token: token.clone(),
        }
    }

    pub fn undefined_variable(name: &Token) -> Self {
        RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
    }
}

/// Owns the two sticky flags that record whether a compile-time or
/// runtime error occurred during the current run. Passed by shared
/// reference into the scanner and parser rather than kept as process-wide
/// mutable statics, and reset between REPL lines.
#[derive(Default)]
pub struct Reporter {
    had_error: std::cell::Cell<bool>,
    had_runtime_error: std::cell::Cell<bool>,
}

impl Reporter {
    pub fn new() -> Self {
        Reporter::default()
    }

    pub fn had_error(&self) -> bool {
        self.had_error.get()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error.get()
    }

    pub fn reset(&self) {
        self.had_error.set(false);
        self.had_runtime_error.set(false);
    }

    /// Reports a scanner-level error at a raw line number.
    pub fn error(&self, line: usize, message: &str) {
        self.report(line, "", message);
    }

    /// Reports a parser-level error anchored to a specific token.
    pub fn error_at_token(&self, token: &Token, message: &str) {
        if token.kind == TokenType::Eof {
            self.report(token.line, " at end", message);
        } else {
            self.report(token.line, &format!(" at '{}'", token.lexeme), message);
        }
    }

    fn report(&self, line: usize, location: &str, message: &str) {
        eprintln!("[line {}] Error{}: {}", line, location, message);
        self.had_error.set(true);
    }

    pub fn runtime_error(&self, error: &RuntimeError) {
        eprintln!("{}\n[line {}]", error.message, error.token.line);
        self.had_runtime_error.set(true);
    }
}
