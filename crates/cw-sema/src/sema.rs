use crate::error::SemaError;
use crate::scope::ScopeStack;
use crate::specialize::{DeclContextId, SemaHost, SpecializationBuilder, SpecializationInfo};
use cw_core::ast::visit::{walk_expr_mut, VisitMut};
use cw_core::ast::{
    Decl, DeclId, DeclRefExpr, Expr, FunctionDecl, NamespaceDecl, NodeId, RecoveryExpr,
    TranslationUnit, VarDecl, CALLSITE_WRAPPER,
};
use cw_core::diagnostics::{Diagnostic, DiagnosticManager};
use cw_core::span::Span;
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclContextKind {
    TranslationUnit,
    Namespace(Option<String>),
    Function(DeclId),
}

#[derive(Debug, Clone)]
pub struct DeclContext {
    pub kind: DeclContextKind,
    pub parent: Option<DeclContextId>,
    /// Declarations added to this context by analysis, in order.
    pub added: Vec<DeclId>,
}

/// Position of a declaration in the lowered tree, kept so the tree can be rebuilt around the
/// analyzed functions.
#[derive(Debug, Clone)]
enum Slot {
    Function(DeclId),
    Var(VarDecl),
    Namespace {
        name: Option<String>,
        range: Span,
        context: DeclContextId,
        slots: Vec<Slot>,
    },
    Other,
}

/// An in-memory semantic analysis host over a lowered translation unit.
///
/// [`Sema::analyze`] walks every ordinary function body and replaces each reference to a
/// `callsite_wrapper` template with a reference to a per-call-site specialization.
#[derive(Debug)]
pub struct Sema {
    path: PathBuf,
    slots: Vec<Slot>,
    functions: BTreeMap<DeclId, FunctionDecl>,
    contexts: Vec<DeclContext>,
    decl_contexts: HashMap<DeclId, DeclContextId>,
    specializations: BTreeMap<DeclId, SpecializationInfo>,
    context_stack: Vec<DeclContextId>,
    next_decl: u64,
    next_node: u64,
    diagnostics: DiagnosticManager,
}

const TU_CONTEXT: DeclContextId = DeclContextId(0);

impl Sema {
    pub fn new(tu: TranslationUnit) -> Self {
        let path = tu.path().to_path_buf();
        let mut sema = Self {
            path,
            slots: Vec::new(),
            functions: BTreeMap::new(),
            contexts: vec![DeclContext {
                kind: DeclContextKind::TranslationUnit,
                parent: None,
                added: Vec::new(),
            }],
            decl_contexts: HashMap::new(),
            specializations: BTreeMap::new(),
            context_stack: vec![TU_CONTEXT],
            next_decl: 0,
            next_node: 0,
            diagnostics: DiagnosticManager::new(),
        };
        let decls = tu.into_decls();
        sema.slots = sema.register(decls, TU_CONTEXT);
        sema.next_decl = sema.functions.keys().map(|id| id.0).max().unwrap_or(0) + 1;
        sema
    }

    fn register(&mut self, decls: Vec<Decl>, context: DeclContextId) -> Vec<Slot> {
        decls
            .into_iter()
            .map(|decl| match decl {
                Decl::Function(function) => {
                    let id = function.id;
                    self.decl_contexts.insert(id, context);
                    self.functions.insert(id, function);
                    Slot::Function(id)
                }
                Decl::Var(var) => Slot::Var(var),
                Decl::Namespace(NamespaceDecl { name, range, decls }) => {
                    let inner = self.new_context(DeclContextKind::Namespace(name.clone()), context);
                    let slots = self.register(decls, inner);
                    Slot::Namespace {
                        name,
                        range,
                        context: inner,
                        slots,
                    }
                }
                Decl::Other => Slot::Other,
            })
            .collect()
    }

    fn new_context(&mut self, kind: DeclContextKind, parent: DeclContextId) -> DeclContextId {
        let id = DeclContextId(self.contexts.len() as u32);
        self.contexts.push(DeclContext {
            kind,
            parent: Some(parent),
            added: Vec::new(),
        });
        id
    }

    /// A wrapper template: annotated `callsite_wrapper` and not itself a specialization.
    pub fn is_wrapper_template(&self, decl: DeclId) -> bool {
        !self.specializations.contains_key(&decl)
            && self
                .functions
                .get(&decl)
                .is_some_and(|function| function.has_annotation(CALLSITE_WRAPPER))
    }

    /// Specializes wrapper references in every function that is neither a wrapper template nor
    /// a specialization.
    pub fn analyze(&mut self) {
        let roots = self
            .functions
            .values()
            .filter(|function| function.body.is_some())
            .map(|function| function.id)
            .filter(|id| !self.is_wrapper_template(*id) && !self.specializations.contains_key(id))
            .collect_vec();
        for id in roots {
            let parent = self.decl_contexts.get(&id).copied().unwrap_or(TU_CONTEXT);
            let context = self.new_context(DeclContextKind::Function(id), parent);
            self.instantiate_body(id, context, ScopeStack::empty());
        }
        info!(
            "{}: {} wrapper specializations",
            self.path.display(),
            self.specializations.len()
        );
    }

    fn instantiate_body(&mut self, id: DeclId, context: DeclContextId, scope: ScopeStack<'_>) {
        let Some(mut body) = self.functions.get_mut(&id).and_then(|f| f.body.take()) else {
            return;
        };
        self.context_stack.push(context);
        BodyInstantiator { sema: self, scope }.visit_stmt_mut(&mut body);
        self.context_stack.pop();
        if let Some(function) = self.functions.get_mut(&id) {
            function.body = Some(body);
        }
    }

    pub fn function(&self, id: DeclId) -> Option<&FunctionDecl> {
        self.functions.get(&id)
    }

    /// The declaration of `id`'s entity that carries the body, or `id` itself when none does.
    fn definition(&self, id: DeclId) -> Option<&FunctionDecl> {
        let declared = self.functions.get(&id)?;
        if declared.body.is_some() {
            return Some(declared);
        }
        let found = self.functions.values().find(|candidate| {
            candidate.body.is_some()
                && std::iter::successors(Some(candidate.id), |current| {
                    self.functions.get(current).and_then(|f| f.previous)
                })
                .take(self.functions.len())
                .any(|previous| previous == id)
        });
        Some(found.unwrap_or(declared))
    }

    pub fn specializations(&self) -> impl Iterator<Item = (DeclId, &SpecializationInfo)> {
        self.specializations.iter().map(|(id, info)| (*id, info))
    }

    pub fn context(&self, id: DeclContextId) -> Option<&DeclContext> {
        self.contexts.get(id.0 as usize)
    }

    pub fn diagnostics(&self) -> &DiagnosticManager {
        &self.diagnostics
    }

    /// Rebuilds the translation unit; specializations follow the original declarations of the
    /// context they were added to.
    pub fn into_translation_unit(mut self) -> TranslationUnit {
        let slots = std::mem::take(&mut self.slots);
        let decls = self.rebuild(slots, TU_CONTEXT);
        TranslationUnit::new(self.path.clone(), decls)
    }

    fn rebuild(&mut self, slots: Vec<Slot>, context: DeclContextId) -> Vec<Decl> {
        let mut decls = Vec::with_capacity(slots.len());
        for slot in slots {
            let decl = match slot {
                Slot::Function(id) => match self.functions.remove(&id) {
                    Some(function) => Decl::Function(function),
                    None => continue,
                },
                Slot::Var(var) => Decl::Var(var),
                Slot::Namespace {
                    name,
                    range,
                    context,
                    slots,
                } => Decl::Namespace(NamespaceDecl {
                    name,
                    range,
                    decls: self.rebuild(slots, context),
                }),
                Slot::Other => Decl::Other,
            };
            decls.push(decl);
        }
        let added = self
            .contexts
            .get(context.0 as usize)
            .map(|ctx| ctx.added.clone())
            .unwrap_or_default();
        for id in added {
            if let Some(function) = self.functions.remove(&id) {
                decls.push(Decl::Function(function));
            }
        }
        decls
    }

    fn fresh_node(&mut self) -> NodeId {
        self.next_node += 1;
        // Synthesized nodes are numbered down from the top of the id space.
        NodeId(u64::MAX - self.next_node)
    }
}

impl SemaHost for Sema {
    fn function(&self, decl: DeclId) -> Option<&FunctionDecl> {
        self.functions.get(&decl)
    }

    fn decl_context(&self, decl: DeclId) -> Option<DeclContextId> {
        self.decl_contexts.get(&decl).copied()
    }

    fn current_context(&self) -> DeclContextId {
        self.context_stack.last().copied().unwrap_or(TU_CONTEXT)
    }

    fn specialization_info(&self, decl: DeclId) -> Option<SpecializationInfo> {
        self.specializations.get(&decl).copied()
    }

    fn subst_decl(&mut self, template: DeclId, context: DeclContextId) -> Option<DeclId> {
        let original = self.definition(template)?;
        if original.invalid {
            return None;
        }
        let mut clone = original.clone();
        clone.id = DeclId(self.next_decl);
        clone.previous = None;
        self.next_decl += 1;
        let id = clone.id;
        self.functions.insert(id, clone);
        self.decl_contexts.insert(id, context);
        Some(id)
    }

    fn add_decl(&mut self, context: DeclContextId, decl: DeclId) {
        if let Some(ctx) = self.contexts.get_mut(context.0 as usize) {
            ctx.added.push(decl);
        }
    }

    fn set_specialization_info(&mut self, decl: DeclId, info: SpecializationInfo) {
        self.specializations.insert(decl, info);
    }

    fn instantiate_function_definition(
        &mut self,
        point_of_instantiation: Span,
        decl: DeclId,
        scope: ScopeStack<'_>,
    ) {
        debug!("instantiating {} at {}", decl, point_of_instantiation);
        let parent = self.decl_contexts.get(&decl).copied().unwrap_or(TU_CONTEXT);
        let context = self.new_context(DeclContextKind::Function(decl), parent);
        self.instantiate_body(decl, context, scope);
    }

    fn build_decl_ref(&mut self, decl: DeclId, reference: &DeclRefExpr) -> Expr {
        let name = self
            .functions
            .get(&decl)
            .map(|function| function.name.clone())
            .unwrap_or_else(|| reference.name.clone());
        Expr::DeclRef(DeclRefExpr {
            id: self.fresh_node(),
            range: reference.range,
            decl,
            name,
        })
    }

    fn recovery_expr(&mut self, reference: &DeclRefExpr) -> Expr {
        Expr::Recovery(RecoveryExpr {
            range: reference.range,
            children: vec![Expr::DeclRef(reference.clone())],
        })
    }

    fn report(&mut self, error: SemaError) {
        let diagnostic: Diagnostic = error.to_diagnostic();
        self.diagnostics.add_diagnostic(diagnostic);
    }
}

/// Replaces wrapper references in one function body.
struct BodyInstantiator<'s, 'a> {
    sema: &'s mut Sema,
    scope: ScopeStack<'a>,
}

impl VisitMut for BodyInstantiator<'_, '_> {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if let Expr::DeclRef(reference) = expr {
            if self.sema.is_wrapper_template(reference.decl) {
                let reference = reference.clone();
                *expr = SpecializationBuilder::new(&mut *self.sema).build(
                    reference.decl,
                    &reference,
                    self.scope,
                );
            }
            return;
        }
        walk_expr_mut(self, expr);
    }
}
