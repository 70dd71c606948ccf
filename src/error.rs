use thiserror::Error;

/// Bracket-matching failures raised while compiling a program.
///
/// Indices point into the instruction stream that was being resolved, i.e.
/// after comments were dropped and the optimization passes ran. The
/// reference interpreter reuses this type with raw source offsets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("unmatched closing bracket at {0}")]
    UnmatchedClosingBracket(usize),

    #[error("unmatched opening bracket at {0:?}")]
    UnmatchedOpeningBracket(Vec<usize>),
}

pub type Result<T> = std::result::Result<T, CompileError>;
