//! Textual rewrite of one wrapped call.
//!
//! `f(a, b)` becomes `({<tag body statements><wrapper>(a, b, f, &Tag);})`: the callee is replaced
//! by the opening of a statement expression followed by the wrapper, and the original callee and
//! tag are appended as trailing arguments before the closing parenthesis.

use crate::edits::EditCollector;
use crate::error::{Result, RewriteError};
use crate::matcher::CallsiteMatch;
use cw_core::ast::{Expr, TranslationUnit};
use cw_core::source_map::SourceMap;
use cw_core::span::Span;
use std::fmt::{Display, Formatter};

/// Replaces every line break with a single space, one character for one character.
pub fn normalize_line_breaks(text: &str) -> String {
    text.chars()
        .map(|ch| if matches!(ch, '\n' | '\r') { ' ' } else { ch })
        .collect()
}

/// Why a call site produced no edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The named part has no usable source range (synthesized or expanded from a macro).
    InvalidRange(&'static str),
    /// The named part has a range whose text could not be read from its buffer.
    UnreadableText(&'static str),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InvalidRange(part) => write!(f, "{part} has no valid source range"),
            SkipReason::UnreadableText(part) => write!(f, "source text of {part} is unavailable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    Rewritten(CallRewrite),
    Skipped { reason: SkipReason, call: Span },
    /// The same source call was already rewritten, as happens when a template body is visited
    /// once per instantiation.
    AlreadyRewritten { call: Span },
}

/// The two edits produced for one call site, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRewrite {
    /// Range of the whole call expression.
    pub call: Span,
    pub callee: Span,
    pub replacement: String,
    pub insertion_point: Span,
    pub insertion: String,
}

pub struct CallRewriteEngine<'a> {
    tu: &'a TranslationUnit,
    source_map: &'a SourceMap,
}

impl<'a> CallRewriteEngine<'a> {
    pub fn new(tu: &'a TranslationUnit, source_map: &'a SourceMap) -> Self {
        Self { tu, source_map }
    }

    /// Computes the rewrite for `site` and records it in `edits`.
    pub fn rewrite(&self, site: &CallsiteMatch<'_>, edits: &mut EditCollector) -> Result<RewriteOutcome> {
        let outcome = self.plan(site)?;
        if let RewriteOutcome::Rewritten(rewrite) = &outcome {
            let replaced = edits.add_replacement(
                self.source_map,
                rewrite.callee,
                rewrite.replacement.as_str(),
                rewrite.call,
            )?;
            let inserted = edits.add_insertion(
                self.source_map,
                rewrite.insertion_point,
                rewrite.insertion.as_str(),
                rewrite.call,
            )?;
            if !replaced && !inserted {
                return Ok(RewriteOutcome::AlreadyRewritten { call: rewrite.call });
            }
        }
        Ok(outcome)
    }

    /// Computes the rewrite for `site` without recording anything.
    pub fn plan(&self, site: &CallsiteMatch<'_>) -> Result<RewriteOutcome> {
        let call = site.call;
        let (wrapper, tag) = match site.annotation.args.as_slice() {
            [wrapper, tag] => (wrapper, tag),
            args => {
                return Err(RewriteError::MalformedAnnotation {
                    function: site.callee.name.clone(),
                    found: args.len(),
                    span: site.annotation.range,
                })
            }
        };

        let skip = |reason| RewriteOutcome::Skipped {
            reason,
            call: call.range,
        };
        let callee_range = call.callee.range();
        for (part, range) in [("callee", callee_range), ("closing parenthesis", call.rparen), ("tag", tag.range())] {
            if !range.is_valid() {
                return Ok(skip(SkipReason::InvalidRange(part)));
            }
        }

        let tag_body = self.tag_body(site, tag)?;

        let mut replacement = String::from("({");
        for stmt in tag_body {
            match self.source_map.snippet(stmt.range()) {
                Some(text) => replacement.push_str(&text),
                None => return Ok(skip(SkipReason::UnreadableText("tag body statement"))),
            }
        }
        let Some(wrapper_text) = self.source_map.snippet(wrapper.range()) else {
            return Ok(skip(SkipReason::UnreadableText("wrapper")));
        };
        replacement.push_str(&wrapper_text);

        let (Some(callee_text), Some(tag_text)) = (
            self.source_map.snippet(callee_range),
            self.source_map.snippet(tag.range()),
        ) else {
            return Ok(skip(SkipReason::UnreadableText("callee or tag")));
        };
        let separator = if call.num_args() > 0 { ", " } else { "" };
        let insertion = format!("{separator}{callee_text}, &{tag_text});}}");

        Ok(RewriteOutcome::Rewritten(CallRewrite {
            call: call.range,
            callee: callee_range,
            replacement: normalize_line_breaks(&replacement),
            insertion_point: call.rparen.shrink_to_lo(),
            insertion: normalize_line_breaks(&insertion),
        }))
    }

    fn tag_body(&self, site: &CallsiteMatch<'_>, tag: &Expr) -> Result<&'a [cw_core::ast::Stmt]> {
        let unresolved = || RewriteError::UnresolvedTag {
            function: site.callee.name.clone(),
            span: tag.range(),
        };
        let tag_ref = tag.as_decl_ref().ok_or_else(unresolved)?;
        if self.tu.function(tag_ref.decl).is_none() {
            return Err(unresolved());
        }
        self.tu
            .definition(tag_ref.decl)
            .and_then(|definition| definition.body.as_ref())
            .and_then(|body| body.as_compound())
            .map(|compound| compound.body.as_slice())
            .ok_or_else(|| RewriteError::NonCompoundBody {
                tag: tag_ref.name.clone(),
                decl: tag_ref.decl,
                span: tag.range(),
            })
    }
}
