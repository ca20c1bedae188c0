use cw_core::ast::visit::{walk_call, Visit};
use cw_core::ast::{AnnotateAttr, CallExpr, FunctionDecl, TranslationUnit, CALLSITE_WRAPPED_BY};

/// A call whose statically resolved callee carries `callsite_wrapped_by`.
#[derive(Debug, Clone, Copy)]
pub struct CallsiteMatch<'tu> {
    pub call: &'tu CallExpr,
    pub callee: &'tu FunctionDecl,
    pub annotation: &'tu AnnotateAttr,
}

/// The `callsite_wrapped_by` annotation of `decl`. Only the literal annotation name counts.
pub fn find_wrapped_by(decl: &FunctionDecl) -> Option<&AnnotateAttr> {
    decl.annotation(CALLSITE_WRAPPED_BY)
}

/// Decides whether `call` targets a wrapped function. Calls without a directly named callee
/// (function pointers, calls through objects) never match.
pub fn match_call<'tu>(tu: &'tu TranslationUnit, call: &'tu CallExpr) -> Option<CallsiteMatch<'tu>> {
    let callee = tu.function(call.callee_decl()?)?;
    let annotation = find_wrapped_by(callee)?;
    Some(CallsiteMatch {
        call,
        callee,
        annotation,
    })
}

/// Every matching call in the translation unit in source order; an outer call comes before the
/// calls nested in its arguments.
pub fn collect_call_sites(tu: &TranslationUnit) -> Vec<CallsiteMatch<'_>> {
    let mut collector = CallsiteCollector {
        tu,
        matches: Vec::new(),
    };
    for decl in tu.decls() {
        collector.visit_decl(decl);
    }
    collector.matches
}

struct CallsiteCollector<'tu> {
    tu: &'tu TranslationUnit,
    matches: Vec<CallsiteMatch<'tu>>,
}

impl<'tu> Visit<'tu> for CallsiteCollector<'tu> {
    fn visit_call(&mut self, call: &'tu CallExpr) {
        if let Some(found) = match_call(self.tu, call) {
            self.matches.push(found);
        }
        walk_call(self, call);
    }
}
