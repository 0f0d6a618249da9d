//! Compiler error types.
//!
//! Every error is fatal: the driver prints the structured diagnostic and
//! exits with status 1. There is no recovery or multi-error reporting.

use crate::lexer::Token;

/// Closed set of diagnostic tags.
///
/// The tag names the failure class; the accompanying message carries the
/// specifics. Tags render in SCREAMING_SNAKE form in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IncludeNotFound,
    RecursiveInclude,
    UnterminatedString,
    MalformedFunction,
    MissingMainFunction,
    RecursiveFunction,
    UnknownWord,
    AmbiguousDo,
    AmbiguousDone,
    AmbiguousElif,
    AmbiguousElse,
    AmbiguousEndif,
    AmbiguousBreak,
    AmbiguousContinue,
    PopFromEmptyStack,
    TypeMismatch,
    BranchShapeMismatch,
    DivisionByZero,
    NotImplemented,
    UnknownError,
}

impl ErrorKind {
    pub fn tag(self) -> &'static str {
        match self {
            ErrorKind::IncludeNotFound => "INCLUDE_NOT_FOUND",
            ErrorKind::RecursiveInclude => "RECURSIVE_INCLUDE",
            ErrorKind::UnterminatedString => "UNTERMINATED_STRING",
            ErrorKind::MalformedFunction => "MALFORMED_FUNCTION",
            ErrorKind::MissingMainFunction => "MISSING_MAIN_FUNCTION",
            ErrorKind::RecursiveFunction => "RECURSIVE_FUNCTION",
            ErrorKind::UnknownWord => "UNKNOWN_WORD",
            ErrorKind::AmbiguousDo => "AMBIGUOUS_DO",
            ErrorKind::AmbiguousDone => "AMBIGUOUS_DONE",
            ErrorKind::AmbiguousElif => "AMBIGUOUS_ELIF",
            ErrorKind::AmbiguousElse => "AMBIGUOUS_ELSE",
            ErrorKind::AmbiguousEndif => "AMBIGUOUS_ENDIF",
            ErrorKind::AmbiguousBreak => "AMBIGUOUS_BREAK",
            ErrorKind::AmbiguousContinue => "AMBIGUOUS_CONTINUE",
            ErrorKind::PopFromEmptyStack => "POP_FROM_EMPTY_STACK",
            ErrorKind::TypeMismatch => "TYPE_MISMATCH",
            ErrorKind::BranchShapeMismatch => "BRANCH_SHAPE_MISMATCH",
            ErrorKind::DivisionByZero => "DIVISION_BY_ZERO",
            ErrorKind::NotImplemented => "NOT_IMPLEMENTED",
            ErrorKind::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

/// A fatal compiler diagnostic.
///
/// Carries the offending token when one exists so the rendered diagnostic
/// can point at the source location.
#[derive(Debug, Clone)]
pub struct CompilerError {
    pub kind: ErrorKind,
    pub message: String,
    pub token: Option<Token>,
}

impl CompilerError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        CompilerError {
            kind,
            message: message.into(),
            token: None,
        }
    }

    pub fn at_token(kind: ErrorKind, message: impl Into<String>, token: &Token) -> Self {
        CompilerError {
            kind,
            message: message.into(),
            token: Some(token.clone()),
        }
    }
}

impl std::fmt::Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Compiler error {}:\n{}", self.kind.tag(), self.message)?;
        if let Some(token) = &self.token {
            write!(
                f,
                "\n\nOperand: {}\nFile: {}\nRow: {}, Column: {}",
                token.value, token.location.file, token.location.row, token.location.col
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for CompilerError {}

impl From<std::fmt::Error> for CompilerError {
    fn from(e: std::fmt::Error) -> Self {
        CompilerError::new(ErrorKind::UnknownError, format!("assembly write error: {}", e))
    }
}

pub type CompileResult<T> = Result<T, CompilerError>;
