//! cw-core: shared infrastructure for the callsite wrapper tools.
//!
//! Spans and the source map, diagnostics, the error type, environment switches and the closed
//! AST model the rewriting and specialization passes consume.

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod source_map;
pub mod span;

// Re-export commonly used items for convenience
pub use tracing;

pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
