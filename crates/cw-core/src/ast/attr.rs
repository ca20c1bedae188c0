use crate::ast::Expr;
use crate::span::Span;

/// Annotation marking a function whose calls are rewritten through a wrapper and tag:
/// `annotate("callsite_wrapped_by", Wrapper, Tag)`.
pub const CALLSITE_WRAPPED_BY: &str = "callsite_wrapped_by";

/// Annotation marking a wrapper function that is cloned and instantiated per call site.
pub const CALLSITE_WRAPPER: &str = "callsite_wrapper";

#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    Annotate(AnnotateAttr),
    Other(OtherAttr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotateAttr {
    pub range: Span,
    pub annotation: String,
    pub args: Vec<Expr>,
    /// Attribute copied onto a redeclaration from an earlier one.
    pub inherited: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OtherAttr {
    pub kind: String,
    pub range: Span,
}

impl Attr {
    pub fn range(&self) -> Span {
        match self {
            Attr::Annotate(annotate) => annotate.range,
            Attr::Other(other) => other.range,
        }
    }

    pub fn as_annotation(&self, name: &str) -> Option<&AnnotateAttr> {
        match self {
            Attr::Annotate(annotate) if annotate.annotation == name => Some(annotate),
            _ => None,
        }
    }
}
