use cw_core::ast::DeclId;
use cw_core::diagnostics::Diagnostic;
use cw_core::span::Span;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemaError {
    #[error("callsite wrapper `{wrapper}` is expanded inside its own specialization")]
    RecursiveWrapper { wrapper: String, span: Span },

    #[error("callsite wrapper `{wrapper}` is invalid and cannot be specialized")]
    InvalidWrapper { wrapper: String, span: Span },

    #[error("declaration {0} is not known to semantic analysis")]
    UnknownDecl(DeclId),
}

impl SemaError {
    pub fn span(&self) -> Span {
        match self {
            SemaError::RecursiveWrapper { span, .. } | SemaError::InvalidWrapper { span, .. } => *span,
            SemaError::UnknownDecl(_) => Span::null(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SemaError::RecursiveWrapper { .. } => "callsite::recursive-wrapper",
            SemaError::InvalidWrapper { .. } => "callsite::invalid-wrapper",
            SemaError::UnknownDecl(_) => "callsite::unknown-decl",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string())
            .with_span(self.span())
            .with_code(self.code())
    }
}

pub type Result<T> = std::result::Result<T, SemaError>;
