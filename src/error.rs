use std::fmt;
use std::result;

use thiserror::Error;

use crate::scanner::{Token, TokenType};

pub type GenericResult<T> = result::Result<T, Box<dyn std::error::Error>>;

// exit statuses used by the command line driver
pub const EXIT_USAGE: u8 = 64;
pub const EXIT_SOURCE_ERROR: u8 = 65;
pub const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPhase {
    Lexical,
    Syntax,
}

/// Where on a line a source error points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Line,
    AtEnd,
    AtLexeme(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line => Ok(()),
            Self::AtEnd => write!(f, " at end"),
            Self::AtLexeme(lexeme) => write!(f, " at '{lexeme}'"),
        }
    }
}

/// A lexical or syntax error. These never stop scanning or parsing; they are
/// collected and reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct SourceError {
    pub phase: ErrorPhase,
    pub line: u32,
    pub location: Location,
    pub message: String,
}

impl SourceError {
    pub fn lexical(line: u32, message: &str) -> SourceError {
        SourceError {
            phase: ErrorPhase::Lexical,
            line,
            location: Location::Line,
            message: message.to_string(),
        }
    }

    pub fn at_token(token: &Token, message: &str) -> SourceError {
        let location = match token.token_type {
            TokenType::EOF => Location::AtEnd,
            _ => Location::AtLexeme(token.lexeme.clone()),
        };
        SourceError {
            phase: ErrorPhase::Syntax,
            line: token.line,
            location,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TypeMismatch {
    #[error("Operand must be a number.")]
    NumberOperand,
    #[error("Operands must be numbers.")]
    NumberOperands,
    #[error("Operands must be two numbers or two strings.")]
    AdditionOperands,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeErrorKind {
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),
    #[error("Division by 0 not allowed.")]
    DivisionByZero,
    #[error("Can only call functions and classes.")]
    NotCallable,
    #[error("Unsupported operator '{0}'.")]
    UnsupportedOperator(String),
    #[error("Failed to write program output ({0}).")]
    Output(String),
}

/// Unwinds an `interpret` call. Carries the token the failure is attributed to.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}\n [line {}]", .token.line)]
pub struct RuntimeError {
    pub token: Token,
    pub kind: RuntimeErrorKind,
}

impl RuntimeError {
    pub fn new(token: &Token, kind: impl Into<RuntimeErrorKind>) -> RuntimeError {
        RuntimeError {
            token: token.clone(),
            kind: kind.into(),
        }
    }

    pub fn line(&self) -> u32 {
        self.token.line
    }
}

/// Failure of a whole pipeline run, returned by [`crate::execute`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("{}", join_lines(.0))]
    Source(Vec<SourceError>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

fn join_lines(errors: &[SourceError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Error state for one top-level submission (a file, or one REPL line).
///
/// Reset it before each submission and inspect it afterwards.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<SourceError>,
    runtime_error: Option<RuntimeError>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn report(&mut self, error: SourceError) {
        tracing::debug!(%error, "source error reported");
        self.errors.push(error);
    }

    pub fn report_runtime(&mut self, error: RuntimeError) {
        tracing::debug!(%error, "runtime error reported");
        self.runtime_error = Some(error);
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.runtime_error.is_some()
    }

    pub fn errors(&self) -> &[SourceError] {
        &self.errors
    }

    pub fn runtime_error(&self) -> Option<&RuntimeError> {
        self.runtime_error.as_ref()
    }

    pub fn reset(&mut self) {
        self.errors.clear();
        self.runtime_error = None;
    }

    /// Process exit status implied by the recorded errors, `None` on success.
    pub fn exit_code(&self) -> Option<u8> {
        if self.had_error() {
            Some(EXIT_SOURCE_ERROR)
        } else if self.had_runtime_error() {
            Some(EXIT_RUNTIME_ERROR)
        } else {
            None
        }
    }

    pub fn into_result(self) -> result::Result<(), ExecutionError> {
        if !self.errors.is_empty() {
            return Err(ExecutionError::Source(self.errors));
        }
        match self.runtime_error {
            Some(error) => Err(ExecutionError::Runtime(error)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(token_type: TokenType, lexeme: &str, line: u32) -> Token {
        Token {
            token_type,
            lexeme: lexeme.to_string(),
            literal: None,
            line,
        }
    }

    #[test]
    fn source_error_formats() {
        assert_eq!(
            "[line 3] Error: Unexpected character.",
            SourceError::lexical(3, "Unexpected character.").to_string()
        );
        assert_eq!(
            "[line 1] Error at end: Expect expression.",
            SourceError::at_token(&token(TokenType::EOF, "", 1), "Expect expression.").to_string()
        );
        assert_eq!(
            "[line 2] Error at 'foo': Expect ';' after value.",
            SourceError::at_token(&token(TokenType::Identifier, "foo", 2), "Expect ';' after value.").to_string()
        );
    }

    #[test]
    fn runtime_error_format() {
        let error = RuntimeError::new(&token(TokenType::Slash, "/", 4), RuntimeErrorKind::DivisionByZero);
        assert_eq!("Division by 0 not allowed.\n [line 4]", error.to_string());

        let error = RuntimeError::new(&token(TokenType::Minus, "-", 1), TypeMismatch::NumberOperand);
        assert_eq!("Operand must be a number.\n [line 1]", error.to_string());
    }

    #[test]
    fn diagnostics_reset_and_exit_codes() {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(None, diagnostics.exit_code());

        diagnostics.report_runtime(RuntimeError::new(
            &token(TokenType::Identifier, "x", 1),
            RuntimeErrorKind::UndefinedVariable("x".to_string()),
        ));
        assert_eq!(Some(EXIT_RUNTIME_ERROR), diagnostics.exit_code());

        diagnostics.report(SourceError::lexical(1, "Unterminated string."));
        assert_eq!(Some(EXIT_SOURCE_ERROR), diagnostics.exit_code());

        diagnostics.reset();
        assert!(!diagnostics.had_error());
        assert!(!diagnostics.had_runtime_error());
        assert!(diagnostics.into_result().is_ok());
    }
}
