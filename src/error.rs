//! Error types shared by every stage of the pipeline.

use std::{fmt, io, path::PathBuf};

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Source,
    Lexer,
    Parser,
    Vm,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Source => "source",
            Stage::Lexer => "lexer",
            Stage::Parser => "parser",
            Stage::Vm => "vm",
        };
        f.write_str(name)
    }
}

/// Every failure is fatal: nothing in the compiler or the VM recovers locally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("source file not found: {}", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read source file {}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("lexical error at {line}:{col}: {message}")]
    Lexical {
        line: usize,
        col: usize,
        message: String,
    },

    #[error("syntax error at {line}:{col}: expected {expected}, found {found}")]
    Syntax {
        line: usize,
        col: usize,
        expected: String,
        found: String,
    },

    #[error("code overflow: program exceeds {capacity} words")]
    CodeOverflow { capacity: usize },

    #[error("illegal instruction at address {ip}: {reason}")]
    IllegalInstruction { ip: usize, reason: String },

    #[error("division by zero at address {ip}")]
    DivisionByZero { ip: usize },

    #[error("stack overflow at address {ip}: capacity of {capacity} slots exceeded")]
    StackOverflow { ip: usize, capacity: usize },

    #[error("stack underflow at address {ip}")]
    StackUnderflow { ip: usize },
}

impl Error {
    /// The stage that raised this error.
    pub fn stage(&self) -> Stage {
        match self {
            Error::SourceNotFound { .. } | Error::SourceRead { .. } => Stage::Source,
            Error::Lexical { .. } => Stage::Lexer,
            Error::Syntax { .. } | Error::CodeOverflow { .. } => Stage::Parser,
            Error::IllegalInstruction { .. }
            | Error::DivisionByZero { .. }
            | Error::StackOverflow { .. }
            | Error::StackUnderflow { .. } => Stage::Vm,
        }
    }

    pub(crate) fn illegal(ip: usize, reason: impl Into<String>) -> Self {
        Error::IllegalInstruction {
            ip,
            reason: reason.into(),
        }
    }
}
