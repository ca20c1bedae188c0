//! Per-call-site specialization of `callsite_wrapper` functions.
//!
//! Every reference to a wrapper template is resolved to a fresh clone of the wrapper that lives
//! next to the template and remembers where it was instantiated. The clone's body is instantiated
//! immediately so references to other wrappers inside it are specialized under the attribution
//! of the outermost call site.

use crate::error::SemaError;
use crate::scope::{ScopeFrame, ScopeStack};
use cw_core::ast::{DeclId, DeclRefExpr, Expr, FunctionDecl};
use cw_core::span::Span;
use std::fmt::{Display, Formatter};
use tracing::debug;

/// A declaration context: the translation unit, a namespace or a function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclContextId(pub u32);

impl Display for DeclContextId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Attribution recorded on a wrapper clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecializationInfo {
    /// The wrapper template the clone was made from.
    pub template: DeclId,
    /// The user call site the clone is attributed to.
    pub point_of_instantiation: Span,
    /// The context that contains that call site.
    pub callee_context: DeclContextId,
}

/// Services the host compiler provides to the specialization builder.
pub trait SemaHost {
    fn function(&self, decl: DeclId) -> Option<&FunctionDecl>;

    /// Context the declaration is a member of.
    fn decl_context(&self, decl: DeclId) -> Option<DeclContextId>;

    /// Context semantic analysis is currently in.
    fn current_context(&self) -> DeclContextId;

    fn specialization_info(&self, decl: DeclId) -> Option<SpecializationInfo>;

    /// Clones `template` into `context` with an empty template argument list. `None` when the
    /// template cannot be cloned.
    fn subst_decl(&mut self, template: DeclId, context: DeclContextId) -> Option<DeclId>;

    fn add_decl(&mut self, context: DeclContextId, decl: DeclId);

    fn set_specialization_info(&mut self, decl: DeclId, info: SpecializationInfo);

    /// Instantiates the body of `decl` now, with `scope` active while its body is analyzed.
    fn instantiate_function_definition(
        &mut self,
        point_of_instantiation: Span,
        decl: DeclId,
        scope: ScopeStack<'_>,
    );

    fn build_decl_ref(&mut self, decl: DeclId, reference: &DeclRefExpr) -> Expr;

    fn recovery_expr(&mut self, reference: &DeclRefExpr) -> Expr;

    fn report(&mut self, error: SemaError);
}

pub struct SpecializationBuilder<'h, H: SemaHost + ?Sized> {
    host: &'h mut H,
}

impl<'h, H: SemaHost + ?Sized> SpecializationBuilder<'h, H> {
    pub fn new(host: &'h mut H) -> Self {
        Self { host }
    }

    /// Resolves `reference` to `wrapper` through a new specialization and returns the
    /// expression that replaces the reference.
    pub fn build(&mut self, wrapper: DeclId, reference: &DeclRefExpr, scope: ScopeStack<'_>) -> Expr {
        let Some(template) = self.host.function(wrapper) else {
            self.host.report(SemaError::UnknownDecl(wrapper));
            return self.host.recovery_expr(reference);
        };
        let name = template.name.clone();

        if self.is_expanding(wrapper, scope) {
            self.host.report(SemaError::RecursiveWrapper {
                wrapper: name,
                span: reference.range,
            });
            return self.host.recovery_expr(reference);
        }

        let (point_of_instantiation, callee_context) = self.attribution(reference, scope);

        let Some(context) = self.host.decl_context(wrapper) else {
            self.host.report(SemaError::UnknownDecl(wrapper));
            return self.host.recovery_expr(reference);
        };
        let Some(clone) = self.host.subst_decl(wrapper, context) else {
            self.host.report(SemaError::InvalidWrapper {
                wrapper: name,
                span: reference.range,
            });
            return self.host.recovery_expr(reference);
        };
        self.host.add_decl(context, clone);
        self.host.set_specialization_info(
            clone,
            SpecializationInfo {
                template: wrapper,
                point_of_instantiation,
                callee_context,
            },
        );
        debug!(
            "specialized `{}` as {} for {} in {}",
            name, clone, reference.id, callee_context
        );

        let guard = scope.push(ScopeFrame {
            wrapper: clone,
            callsite: reference.id,
        });
        self.host
            .instantiate_function_definition(point_of_instantiation, clone, guard.scope());
        drop(guard);

        self.host.build_decl_ref(clone, reference)
    }

    /// Inherits the attribution of the specialization being expanded; a reference outside any
    /// wrapper is attributed to itself.
    fn attribution(&self, reference: &DeclRefExpr, scope: ScopeStack<'_>) -> (Span, DeclContextId) {
        match scope
            .current()
            .and_then(|frame| self.host.specialization_info(frame.wrapper))
        {
            Some(info) => (info.point_of_instantiation, info.callee_context),
            None => (reference.range, self.host.current_context()),
        }
    }

    fn is_expanding(&self, template: DeclId, scope: ScopeStack<'_>) -> bool {
        scope.frames().any(|frame| {
            self.host
                .specialization_info(frame.wrapper)
                .is_some_and(|info| info.template == template)
        })
    }
}
