use thiserror::Error;

use crate::diagnostics::{Diagnostic, DiagnosticKind};

/// Public error type of the compilation pipeline, carrying the first
/// diagnostic the run produced.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Lex(Diagnostic),
    #[error("{0}")]
    Parse(Diagnostic),
    #[error("{0}")]
    Semantic(Diagnostic),
}

impl From<Diagnostic> for CoreError {
    fn from(diagnostic: Diagnostic) -> Self {
        match diagnostic.kind {
            DiagnosticKind::Lexical => CoreError::Lex(diagnostic),
            DiagnosticKind::Syntax => CoreError::Parse(diagnostic),
            DiagnosticKind::Semantic => CoreError::Semantic(diagnostic),
        }
    }
}
