//! Centralised error hierarchy for the **slug** front end and evaluator.
//!
//! Every stage (scanner, parser, resolver, interpreter, CLI) converts its
//! failure modes into one of the variants defined here, so the whole crate
//! shares a single `Result<T>` alias and still interoperates with `anyhow`
//! at the binary boundary.
//!
//! All errors are fatal to the stage that raised them: nothing is recovered
//! inside scanning, parsing or evaluation.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::debug;

/// Canonical error type used throughout the crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SlugError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error at a specific token.
    #[error("[line {line}] Error at '{lexeme}': {message}")]
    Parse {
        message: String,
        lexeme: String,
        line: usize,
    },

    /// Runtime evaluation error (undefined variable, bad operand, …).
    #[error("[line {line}] Runtime error: {message}")]
    Runtime { message: String, line: usize },

    /// Broken evaluator invariant, e.g. a resolved distance that walks off
    /// the end of the scope chain.  `line` is `None` when no source
    /// position is involved, as when leaving a block that was never entered.
    #[error("{}Internal error: {message}", located(.line))]
    Internal {
        message: String,
        line: Option<usize>,
    },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl SlugError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        SlugError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(lexeme: &str, line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!(
            "Creating Parse error: line={}, at='{}', msg={}",
            line, lexeme, message
        );

        SlugError::Parse {
            message,
            lexeme: lexeme.to_owned(),
            line,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Runtime error: line={}, msg={}", line, message);

        SlugError::Runtime { message, line }
    }

    /// Helper constructor for invariant violations.
    pub fn internal<S: Into<String>>(line: Option<usize>, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Internal error: line={:?}, msg={}", line, message);

        SlugError::Internal { message, line }
    }

    /// Source line the error points at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            SlugError::Lex { line, .. }
            | SlugError::Parse { line, .. }
            | SlugError::Runtime { line, .. } => Some(*line),
            SlugError::Internal { line, .. } => *line,
            SlugError::Io(_) | SlugError::Utf8(_) => None,
        }
    }
}

fn located(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!("[line {}] ", line),
        None => String::new(),
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, SlugError>;
