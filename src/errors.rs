//! Compile error types
//!
//! Every stage of the pipeline reports failures through [`CompileError`].
//! Errors are fatal: the first one aborts compilation and is printed by the
//! driver as a single diagnostic line, so each variant carries the source
//! location and (for syntax and semantic errors) the text of the offending
//! token.

use crate::parser::ast::SourceLocation;
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

/// Errors raised while lexing, parsing or generating code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Unrecognised character or malformed literal
    #[error("Lexer error at line {}, column {}: {message}", location.line, location.column)]
    Lex {
        message: String,
        location: SourceLocation,
    },

    /// Token mismatch, unterminated statement or block, missing delimiter
    #[error("Syntax error at line {}, column {}: {message} \"{token}\"", location.line, location.column)]
    Syntax {
        message: String,
        token: String,
        location: SourceLocation,
    },

    /// Unknown identifier, invalid lvalue, unsupported pointer arithmetic,
    /// malformed member reference and friends
    #[error("Semantic error at line {}, column {}: {message} \"{token}\"", location.line, location.column)]
    Semantic {
        message: String,
        token: String,
        location: SourceLocation,
    },
}

impl CompileError {
    pub fn lex(message: impl Into<String>, location: SourceLocation) -> Self {
        CompileError::Lex {
            message: message.into(),
            location,
        }
    }

    pub fn syntax(
        message: impl Into<String>,
        token: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        CompileError::Syntax {
            message: message.into(),
            token: token.into(),
            location,
        }
    }

    pub fn semantic(
        message: impl Into<String>,
        token: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        CompileError::Semantic {
            message: message.into(),
            token: token.into(),
            location,
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            CompileError::Lex { location, .. }
            | CompileError::Syntax { location, .. }
            | CompileError::Semantic { location, .. } => *location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_one_line_with_token() {
        let err = CompileError::syntax(
            "A statement not terminated with ';'.",
            "}",
            SourceLocation::new(3, 14),
        );
        let text = err.to_string();
        assert_eq!(
            text,
            "Syntax error at line 3, column 14: A statement not terminated with ';'. \"}\""
        );
        assert!(!text.contains('\n'));
    }

    #[test]
    fn test_location_accessor() {
        let err = CompileError::lex("Unexpected character: '$'", SourceLocation::new(2, 5));
        assert_eq!(err.location(), SourceLocation::new(2, 5));
    }
}
