use cw_core::ast::DeclId;
use cw_core::span::Span;
use std::path::PathBuf;
use thiserror::Error;

/// A wrapped call whose annotation or tag does not have the expected shape.
///
/// These are contract violations of the annotated source, not I/O failures: the per-call-site
/// handler decides whether they abort the translation unit or only skip the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error("callsite_wrapped_by annotation on `{function}` takes 2 arguments, found {found}")]
    MalformedAnnotation {
        function: String,
        found: usize,
        span: Span,
    },

    #[error("callsite tag of `{function}` does not name a function")]
    UnresolvedTag { function: String, span: Span },

    #[error("callsite tag `{tag}` has no compound body")]
    NonCompoundBody { tag: String, decl: DeclId, span: Span },

    #[error(transparent)]
    Edit(#[from] EditError),
}

impl RewriteError {
    pub fn span(&self) -> Span {
        match self {
            RewriteError::MalformedAnnotation { span, .. }
            | RewriteError::UnresolvedTag { span, .. }
            | RewriteError::NonCompoundBody { span, .. } => *span,
            RewriteError::Edit(_) => Span::null(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RewriteError::MalformedAnnotation { .. } => "callsite::malformed-annotation",
            RewriteError::UnresolvedTag { .. } => "callsite::unresolved-tag",
            RewriteError::NonCompoundBody { .. } => "callsite::non-compound-body",
            RewriteError::Edit(_) => "callsite::edit",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("{path}: edit at {first_lo}..{first_hi} overlaps edit at {second_lo}..{second_hi}")]
    Overlap {
        path: PathBuf,
        first_lo: u32,
        first_hi: u32,
        second_lo: u32,
        second_hi: u32,
    },

    #[error("{path}: edit at {lo}..{hi} is outside the buffer or splits a character")]
    OutOfBounds { path: PathBuf, lo: u32, hi: u32 },

    #[error("no source registered for {0}")]
    UnknownFile(String),
}

pub type Result<T> = std::result::Result<T, RewriteError>;
