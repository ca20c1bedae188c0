use crate::edits::EditCollector;
use crate::engine::{CallRewriteEngine, RewriteOutcome};
use crate::error::{Result, RewriteError};
use crate::matcher::collect_call_sites;
use cw_core::ast::TranslationUnit;
use cw_core::diagnostics::{Diagnostic, DiagnosticManager};
use cw_core::source_map::SourceMap;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// What to do when an annotated call violates the annotation contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractPolicy {
    /// Stop processing the translation unit; it is reported as failed.
    #[default]
    Abort,
    /// Report a warning and leave the call site untouched.
    Skip,
}

impl FromStr for ContractPolicy {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "abort" => Ok(ContractPolicy::Abort),
            "skip" => Ok(ContractPolicy::Skip),
            other => Err(format!("unknown contract policy `{other}` (expected abort or skip)")),
        }
    }
}

impl Display for ContractPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractPolicy::Abort => write!(f, "abort"),
            ContractPolicy::Skip => write!(f, "skip"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteOptions {
    pub policy: ContractPolicy,
    /// Report call sites skipped for unusable ranges as warnings, not just debug logs.
    pub report_skipped: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub matched: usize,
    pub rewritten: usize,
    pub skipped: usize,
    /// Calls whose edits were already recorded from the same source call.
    pub duplicates: usize,
    pub violations: usize,
}

/// Runs the matcher and the rewrite engine over a whole translation unit.
///
/// Edits are only collected here; nothing is applied until the caller hands the collector to an
/// [`Emitter`](crate::emit::Emitter).
pub fn rewrite_translation_unit(
    tu: &TranslationUnit,
    source_map: &SourceMap,
    options: RewriteOptions,
    diagnostics: &DiagnosticManager,
) -> Result<(EditCollector, RewriteStats)> {
    let engine = CallRewriteEngine::new(tu, source_map);
    let mut edits = EditCollector::new();
    let mut stats = RewriteStats::default();

    for site in collect_call_sites(tu) {
        stats.matched += 1;
        match engine.rewrite(&site, &mut edits) {
            Ok(RewriteOutcome::Rewritten(_)) => stats.rewritten += 1,
            Ok(RewriteOutcome::AlreadyRewritten { call }) => {
                stats.duplicates += 1;
                debug!("call to `{}` at {} was already rewritten", site.callee.name, call);
            }
            Ok(RewriteOutcome::Skipped { reason, call }) => {
                stats.skipped += 1;
                debug!("skipping call to `{}` at {}: {}", site.callee.name, call, reason);
                if options.report_skipped {
                    diagnostics.add_diagnostic(
                        Diagnostic::warning(format!(
                            "call to `{}` was not rewritten: {}",
                            site.callee.name, reason
                        ))
                        .with_span(call)
                        .with_code("callsite::skipped"),
                    );
                }
            }
            Err(err @ RewriteError::Edit(_)) => return Err(err),
            Err(err) => {
                stats.violations += 1;
                match options.policy {
                    ContractPolicy::Abort => return Err(err),
                    ContractPolicy::Skip => {
                        warn!("{}", err);
                        diagnostics.add_diagnostic(contract_diagnostic(&err, false));
                    }
                }
            }
        }
    }

    info!(
        "{}: {} wrapped calls, {} rewritten, {} skipped, {} violations",
        tu.path().display(),
        stats.matched,
        stats.rewritten,
        stats.skipped,
        stats.violations
    );
    Ok((edits, stats))
}

/// Diagnostic for a contract violation; `fatal` selects error over warning level.
pub fn contract_diagnostic(err: &RewriteError, fatal: bool) -> Diagnostic {
    let diagnostic = if fatal {
        Diagnostic::error(err.to_string())
    } else {
        Diagnostic::warning(err.to_string())
    };
    let diagnostic = diagnostic.with_span(err.span()).with_code(err.code());
    match err {
        RewriteError::MalformedAnnotation { .. } => diagnostic
            .with_suggestion("write it as annotate(\"callsite_wrapped_by\", Wrapper, Tag)"),
        RewriteError::NonCompoundBody { .. } => {
            diagnostic.with_suggestion("the tag must be a function defined in this translation unit")
        }
        _ => diagnostic,
    }
}
