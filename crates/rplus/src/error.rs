//! The crate's error type.
//!
//! Mirrors the three-plus-one taxonomic levels of spec.md §7: lex errors
//! never reach here (they surface as `Error` tokens the parser rejects),
//! parse errors, compile errors, and runtime errors each get their own
//! variant family so callers can match on phase without string-sniffing.

use thiserror::Error as ThisError;

/// Everything that can go wrong compiling or running an R+ program.
#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum Error {
    /// Raised by the parser when it encounters a lexer `Error` token.
    #[error("Unexpected token at line {line}: {lexeme:?}")]
    UnexpectedToken { line: usize, lexeme: String },

    /// A parse-time syntax error: "Expected X", "Invalid assignment
    /// target", "Unexpected end of input", etc.
    #[error("{message} at line {line}")]
    Parse { message: String, line: usize },

    /// A compile-time error: undefined symbol, bad operator, register
    /// overflow, unresolved label.
    #[error("{message} at line {line}")]
    Compile { message: String, line: usize },

    /// A runtime error raised by either VM backend.
    #[error("{message} (pc={pc})")]
    Runtime { message: String, pc: usize },
}

impl Error {
    pub fn unexpected_token(line: usize, lexeme: impl Into<String>) -> Self {
        Error::UnexpectedToken {
            line,
            lexeme: lexeme.into(),
        }
    }

    pub fn parse(message: impl Into<String>, line: usize) -> Self {
        Error::Parse {
            message: message.into(),
            line,
        }
    }

    pub fn compile(message: impl Into<String>, line: usize) -> Self {
        Error::Compile {
            message: message.into(),
            line,
        }
    }

    pub fn runtime(message: impl Into<String>, pc: usize) -> Self {
        Error::Runtime {
            message: message.into(),
            pc,
        }
    }

    /// The line number this error points at, if any (runtime errors report
    /// a program counter instead).
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::UnexpectedToken { line, .. }
            | Error::Parse { line, .. }
            | Error::Compile { line, .. } => Some(*line),
            Error::Runtime { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
