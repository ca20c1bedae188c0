//! callsite-wrapper command-line tool
//!
//! Rewrites every call to a function annotated with `callsite_wrapped_by` in the given
//! translation units and prints the rewritten sources.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod tool;

// CLI-specific error handling
pub mod error {
    use cw_clang::ClangError;
    use cw_rewrite::{EditError, RewriteError};
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum CliError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error(transparent)]
        Core(#[from] cw_core::Error),

        #[error(transparent)]
        Clang(#[from] ClangError),

        #[error(transparent)]
        Rewrite(#[from] RewriteError),

        #[error(transparent)]
        Edit(#[from] EditError),

        #[error("Invalid input: {0}")]
        InvalidInput(String),
    }

    pub type Result<T> = std::result::Result<T, CliError>;
}

pub use error::{CliError, Result};
