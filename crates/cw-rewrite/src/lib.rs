//! Source-to-source rewriting of calls to functions annotated with `callsite_wrapped_by`.
//!
//! The pass is split the way it runs: [`matcher`] finds wrapped calls, [`engine`] turns each one
//! into a replacement plus an insertion, [`edits`] collects them per file and [`emit`] applies the
//! batch once traversal is done.

pub mod edits;
pub mod emit;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod pass;

pub use edits::{Edit, EditCollector, FileEdits};
pub use emit::{apply_edits, Emitted, Emitter};
pub use engine::{normalize_line_breaks, CallRewrite, CallRewriteEngine, RewriteOutcome, SkipReason};
pub use error::{EditError, Result, RewriteError};
pub use matcher::{collect_call_sites, find_wrapped_by, match_call, CallsiteMatch};
pub use pass::{contract_diagnostic, rewrite_translation_unit, ContractPolicy, RewriteOptions, RewriteStats};
