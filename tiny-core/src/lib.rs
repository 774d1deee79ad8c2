//! Core pipeline for the tiny → C++ source-to-source translator.
//!
//! The pipeline is:
//!
//!   source .tiny
//!     -> lexer        (lazy two-token stream)
//!     -> parser       (program arena + scope symbols)
//!     -> codegen_cpp  (C++ source text)
//!
//! Driver tools (the CLI) should depend on this crate rather than
//! reimplementing the pipeline. File loading and output writing are the
//! driver's job; this crate works on in-memory buffers only.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod diagnostics;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod parser;
pub mod program;

// ---------------------------------------------------------------------
// Back-end: code generation and compiler orchestration
// ---------------------------------------------------------------------

pub mod codegen_cpp;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{CompilationArtifact, compile, compile_cpp, token_trace};
pub use error::CoreError;
