//! Lowering of Clang's JSON AST into the closed AST model.
//!
//! Only the node kinds the callsite passes look at are decoded in detail; every other node is
//! kept as an `Other` node with its kind name, range and children. Source ranges become spans
//! into the shared [`SourceMap`]; files are registered the first time a location names them.

use crate::compile_db::normalize_path;
use crate::error::{ClangError, Result};
use clang_ast::{BareSourceLocation, Id, Node, SourceLocation, SourceRange};
use cw_core::ast::{
    AnnotateAttr, Attr, CallExpr, CompoundStmt, ConstantExpr, Decl, DeclId, DeclRefExpr, DeclStmt,
    Expr, FunctionDecl as CwFunction, ImplicitCastExpr, NamespaceDecl as CwNamespace,
    NodeId, OtherAttr, OtherExpr, OtherStmt, ParenExpr, RecoveryExpr, Stmt, TranslationUnit,
    VarDecl as CwVar,
};
use cw_core::source_map::SourceMap;
use cw_core::span::{FileId, Span};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Lowers the JSON produced by `clang -Xclang -ast-dump=json` for `main_file`.
///
/// Relative file names in locations are resolved against `compile_dir`, the directory clang
/// ran in.
pub fn lower_translation_unit_from_json(
    json: &str,
    main_file: &Path,
    compile_dir: &Path,
    source_map: &SourceMap,
) -> Result<TranslationUnit> {
    let root: Node<Clang> = serde_json::from_str(json)
        .map_err(|err| ClangError::ParseError(format!("failed to deserialize clang AST: {err}")))?;

    let Node { kind, inner, .. } = root;
    match kind {
        Clang::TranslationUnitDecl => {
            let mut ctx = LoweringContext::new(source_map, compile_dir);
            let mut decls = Vec::new();
            for child in &inner {
                ctx.lower_decl(child, &mut decls);
            }
            debug!(
                "lowered {} top-level declarations from {}",
                decls.len(),
                main_file.display()
            );
            Ok(TranslationUnit::new(normalize_path(main_file), decls))
        }
        _ => Err(ClangError::ParseError(
            "expected TranslationUnitDecl as AST root".to_string(),
        )),
    }
}

struct LoweringContext<'a> {
    source_map: &'a SourceMap,
    compile_dir: PathBuf,
    files: HashMap<Arc<str>, Option<FileId>>,
    decl_ids: HashMap<Id, DeclId>,
    next_node: u64,
}

impl<'a> LoweringContext<'a> {
    fn new(source_map: &'a SourceMap, compile_dir: &Path) -> Self {
        Self {
            source_map,
            compile_dir: compile_dir.to_path_buf(),
            files: HashMap::new(),
            decl_ids: HashMap::new(),
            next_node: 0,
        }
    }

    fn lower_decl(&mut self, node: &Node<Clang>, out: &mut Vec<Decl>) {
        match &node.kind {
            Clang::FunctionDecl(function) | Clang::CXXMethodDecl(function) => {
                if function.is_implicit.unwrap_or(false) {
                    return;
                }
                let lowered = self.lower_function(node, function);
                out.push(Decl::Function(lowered));
            }
            Clang::VarDecl(var) => {
                let lowered = self.lower_var(node, var);
                out.push(Decl::Var(lowered));
            }
            Clang::NamespaceDecl(namespace) => {
                let mut decls = Vec::new();
                for child in &node.inner {
                    self.lower_decl(child, &mut decls);
                }
                out.push(Decl::Namespace(CwNamespace {
                    name: namespace.name.clone(),
                    range: self.span(namespace.range.as_ref()),
                    decls,
                }));
            }
            // Members of these are lowered in place of their parent.
            Clang::FunctionTemplateDecl
            | Clang::LinkageSpecDecl
            | Clang::CXXRecordDecl
            | Clang::ClassTemplateDecl => {
                for child in &node.inner {
                    self.lower_decl(child, out);
                }
            }
            _ => out.push(Decl::Other),
        }
    }

    fn lower_function(&mut self, node: &Node<Clang>, function: &FunctionDecl) -> CwFunction {
        let mut attrs = Vec::new();
        let mut body = None;
        for child in &node.inner {
            match &child.kind {
                Clang::AnnotateAttr(attr) => attrs.push(Attr::Annotate(self.lower_annotate(child, attr))),
                Clang::Other { kind, range } if kind_name(kind).ends_with("Attr") => {
                    attrs.push(Attr::Other(OtherAttr {
                        kind: kind_name(kind),
                        range: self.span(range.as_ref()),
                    }));
                }
                Clang::CompoundStmt(_) => body = Some(self.lower_stmt(child)),
                _ => {}
            }
        }

        CwFunction {
            id: self.decl_id(node.id),
            name: function.name.clone().unwrap_or_default(),
            range: self.span(function.range.as_ref()),
            name_range: function
                .loc
                .as_ref()
                .map(|loc| self.token_span(loc))
                .unwrap_or_default(),
            attrs,
            body,
            previous: function.previous_decl.map(|id| self.decl_id(id)),
            invalid: function.is_invalid.unwrap_or(false),
        }
    }

    fn lower_annotate(&mut self, node: &Node<Clang>, attr: &AnnotateAttrData) -> AnnotateAttr {
        let annotation = self
            .spelling_text(attr.range.as_ref())
            .and_then(|text| first_string_literal(&text))
            .unwrap_or_default();
        trace!("annotate attribute `{}`", annotation);
        let args = node.inner.iter().map(|arg| self.lower_expr(arg)).collect();
        AnnotateAttr {
            range: self.span(attr.range.as_ref()),
            annotation,
            args,
            inherited: attr.inherited.unwrap_or(false),
        }
    }

    fn lower_var(&mut self, node: &Node<Clang>, var: &VarDecl) -> CwVar {
        let init = node
            .inner
            .iter()
            .rev()
            .find(|child| is_expression(&child.kind))
            .map(|child| self.lower_expr(child));
        CwVar {
            name: var.name.clone(),
            range: self.span(var.range.as_ref()),
            init,
        }
    }

    fn lower_stmt(&mut self, node: &Node<Clang>) -> Stmt {
        match &node.kind {
            Clang::CompoundStmt(data) => {
                let mut body: Vec<Stmt> = node.inner.iter().map(|child| self.lower_stmt(child)).collect();
                self.extend_over_semicolons(&mut body);
                Stmt::Compound(CompoundStmt {
                    range: self.span(data.range.as_ref()),
                    body,
                })
            }
            Clang::DeclStmt(data) => {
                let mut vars = Vec::new();
                for child in &node.inner {
                    if let Clang::VarDecl(var) = &child.kind {
                        vars.push(self.lower_var(child, var));
                    }
                }
                Stmt::Decl(DeclStmt {
                    range: self.span(data.range.as_ref()),
                    vars,
                })
            }
            Clang::Other { kind, range } if !is_expression(&node.kind) => Stmt::Other(OtherStmt {
                kind: kind_name(kind),
                range: self.span(range.as_ref()),
                children: node.inner.iter().map(|child| self.lower_stmt(child)).collect(),
            }),
            _ => Stmt::expr(self.lower_expr(node)),
        }
    }

    fn lower_expr(&mut self, node: &Node<Clang>) -> Expr {
        match (&node.kind, node.inner.as_slice()) {
            (Clang::CallExpr(data), [callee, args @ ..]) => {
                let callee = Box::new(self.lower_expr(callee));
                let args = args.iter().map(|arg| self.lower_expr(arg)).collect();
                Expr::Call(CallExpr {
                    id: self.node_id(),
                    range: self.span(data.range.as_ref()),
                    callee,
                    args,
                    rparen: data
                        .range
                        .as_ref()
                        .map(|range| self.token_span(&range.end))
                        .unwrap_or_default(),
                })
            }
            (
                Clang::DeclRefExpr(DeclRefExprData {
                    range,
                    referenced_decl: Some(referenced),
                }),
                _,
            ) => Expr::DeclRef(DeclRefExpr {
                id: self.node_id(),
                range: self.span(range.as_ref()),
                decl: self.decl_id(referenced.id),
                name: referenced.name.clone().unwrap_or_default(),
            }),
            (Clang::ImplicitCastExpr(data), [sub]) => Expr::ImplicitCast(ImplicitCastExpr {
                range: self.span(data.range.as_ref()),
                cast_kind: data.cast_kind.clone(),
                sub: Box::new(self.lower_expr(sub)),
            }),
            (Clang::ConstantExpr(data), [sub]) => Expr::Constant(ConstantExpr {
                range: self.span(data.range.as_ref()),
                sub: Box::new(self.lower_expr(sub)),
            }),
            (Clang::ParenExpr(data), [sub]) => Expr::Paren(ParenExpr {
                range: self.span(data.range.as_ref()),
                sub: Box::new(self.lower_expr(sub)),
            }),
            (Clang::RecoveryExpr(data), children) => Expr::Recovery(RecoveryExpr {
                range: self.span(data.range.as_ref()),
                children: children.iter().map(|child| self.lower_expr(child)).collect(),
            }),
            (kind, children) => Expr::Other(OtherExpr {
                kind: kind.name(),
                range: self.span(kind.range()),
                children: children.iter().map(|child| self.lower_stmt(child)).collect(),
            }),
        }
    }

    /// Clang's range of an expression statement (and of `return`, `break` and the like) stops
    /// before the terminating `;`. Statements directly followed by one are widened over it,
    /// unless the `;` is the next statement itself.
    fn extend_over_semicolons(&self, body: &mut [Stmt]) {
        for idx in 0..body.len() {
            let range = body[idx].range();
            if !range.is_valid() {
                continue;
            }
            let Some(file) = self.source_map.file(range.file) else {
                continue;
            };
            let rest = file.source.get(range.hi as usize..).unwrap_or_default();
            let skipped = rest.len() - rest.trim_start().len();
            if !rest[skipped..].starts_with(';') {
                continue;
            }
            let semicolon = range.hi + skipped as u32;
            let next_starts_there = body
                .get(idx + 1)
                .map(|next| next.range())
                .is_some_and(|next| next.file == range.file && next.lo == semicolon);
            if next_starts_there {
                continue;
            }
            set_stmt_range(&mut body[idx], Span::new(range.file, range.lo, semicolon + 1));
        }
    }

    fn decl_id(&mut self, id: Id) -> DeclId {
        let next = DeclId(self.decl_ids.len() as u64 + 1);
        *self.decl_ids.entry(id).or_insert(next)
    }

    fn node_id(&mut self) -> NodeId {
        self.next_node += 1;
        NodeId(self.next_node)
    }

    /// Span of a token range, or the null span when either end comes from a macro body or a
    /// file that cannot be read.
    fn span(&mut self, range: Option<&SourceRange>) -> Span {
        let Some(range) = range else {
            return Span::null();
        };
        let (Some(begin), Some(end)) = (file_location(&range.begin), file_location(&range.end)) else {
            return Span::null();
        };
        self.span_between(begin, end)
    }

    fn token_span(&mut self, loc: &SourceLocation) -> Span {
        match file_location(loc) {
            Some(bare) => self.span_between(bare, bare),
            None => Span::null(),
        }
    }

    fn span_between(&mut self, begin: &BareSourceLocation, end: &BareSourceLocation) -> Span {
        if begin.file != end.file {
            return Span::null();
        }
        let Some(file) = self.file_id(&begin.file) else {
            return Span::null();
        };
        let lo = begin.offset as u32;
        let hi = (end.offset + end.tok_len) as u32;
        if lo > hi {
            return Span::null();
        }
        Span::new(file, lo, hi)
    }

    /// Text of a range as spelled, following macro expansions back to where the tokens are
    /// written.
    fn spelling_text(&mut self, range: Option<&SourceRange>) -> Option<String> {
        let range = range?;
        let begin = spelling_location(&range.begin)?;
        let end = spelling_location(&range.end)?;
        let span = self.span_between(begin, end);
        self.source_map.snippet(span)
    }

    fn file_id(&mut self, file: &Arc<str>) -> Option<FileId> {
        if let Some(id) = self.files.get(file) {
            return *id;
        }
        let path = Path::new(file.as_ref());
        let path = if path.is_relative() {
            self.compile_dir.join(path)
        } else {
            path.to_path_buf()
        };
        let path = normalize_path(&path);
        let id = match self.source_map.file_id(&path) {
            Some(id) => Some(id),
            None => match fs::read_to_string(&path) {
                Ok(source) => Some(self.source_map.register_source(path, &source)),
                Err(err) => {
                    debug!("cannot read {}: {}", path.display(), err);
                    None
                }
            },
        };
        self.files.insert(file.clone(), id);
        id
    }
}

/// Where a location's token is written in a file: the location itself, or the macro argument
/// it was expanded from. Tokens that come from a macro body have no such place.
fn file_location(loc: &SourceLocation) -> Option<&BareSourceLocation> {
    match (&loc.spelling_loc, &loc.expansion_loc) {
        (Some(spelling), Some(expansion)) => {
            let same = spelling.offset == expansion.offset && spelling.file == expansion.file;
            (same || expansion.is_macro_arg_expansion).then_some(spelling)
        }
        (Some(bare), None) | (None, Some(bare)) => Some(bare),
        (None, None) => None,
    }
}

fn spelling_location(loc: &SourceLocation) -> Option<&BareSourceLocation> {
    loc.spelling_loc.as_ref().or(loc.expansion_loc.as_ref())
}

fn set_stmt_range(stmt: &mut Stmt, range: Span) {
    match stmt {
        Stmt::Compound(compound) => compound.range = range,
        Stmt::Decl(decl) => decl.range = range,
        Stmt::Expr(expr) => expr.range = range,
        Stmt::Other(other) => other.range = range,
    }
}

/// The contents of the first `"..."` literal in `text`.
fn first_string_literal(text: &str) -> Option<String> {
    let start = text.find('"')? + 1;
    let mut out = String::new();
    let mut chars = text[start..].chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => return Some(out),
            '\\' => out.push(chars.next()?),
            _ => out.push(ch),
        }
    }
    None
}

fn kind_name(kind: &clang_ast::Kind) -> String {
    format!("{kind:?}")
}

fn is_expression(kind: &Clang) -> bool {
    match kind {
        Clang::CallExpr(_)
        | Clang::DeclRefExpr(_)
        | Clang::ImplicitCastExpr(_)
        | Clang::ConstantExpr(_)
        | Clang::ParenExpr(_)
        | Clang::RecoveryExpr(_) => true,
        Clang::Other { kind, .. } => {
            let name = kind_name(kind);
            name.contains("Expr") || name.ends_with("Operator") || name.ends_with("Literal")
        }
        _ => false,
    }
}

#[derive(Debug, Deserialize)]
pub enum Clang {
    TranslationUnitDecl,
    FunctionDecl(FunctionDecl),
    CXXMethodDecl(FunctionDecl),
    FunctionTemplateDecl,
    VarDecl(VarDecl),
    NamespaceDecl(NamespaceDecl),
    LinkageSpecDecl,
    CXXRecordDecl,
    ClassTemplateDecl,
    AnnotateAttr(AnnotateAttrData),
    CompoundStmt(Ranged),
    DeclStmt(Ranged),
    CallExpr(Ranged),
    DeclRefExpr(DeclRefExprData),
    ImplicitCastExpr(ImplicitCastExprData),
    ConstantExpr(Ranged),
    ParenExpr(Ranged),
    RecoveryExpr(Ranged),
    Other {
        kind: clang_ast::Kind,
        #[serde(default)]
        range: Option<SourceRange>,
    },
}

impl Clang {
    fn name(&self) -> String {
        match self {
            Clang::Other { kind, .. } => kind_name(kind),
            known => {
                let debug = format!("{known:?}");
                debug
                    .split(|ch: char| !ch.is_alphanumeric())
                    .next()
                    .unwrap_or_default()
                    .to_string()
            }
        }
    }

    fn range(&self) -> Option<&SourceRange> {
        match self {
            Clang::FunctionDecl(function) | Clang::CXXMethodDecl(function) => function.range.as_ref(),
            Clang::VarDecl(var) => var.range.as_ref(),
            Clang::NamespaceDecl(namespace) => namespace.range.as_ref(),
            Clang::AnnotateAttr(attr) => attr.range.as_ref(),
            Clang::CompoundStmt(data)
            | Clang::DeclStmt(data)
            | Clang::CallExpr(data)
            | Clang::ConstantExpr(data)
            | Clang::ParenExpr(data)
            | Clang::RecoveryExpr(data) => data.range.as_ref(),
            Clang::DeclRefExpr(data) => data.range.as_ref(),
            Clang::ImplicitCastExpr(data) => data.range.as_ref(),
            Clang::Other { range, .. } => range.as_ref(),
            Clang::TranslationUnitDecl
            | Clang::FunctionTemplateDecl
            | Clang::LinkageSpecDecl
            | Clang::CXXRecordDecl
            | Clang::ClassTemplateDecl => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Ranged {
    #[serde(default)]
    pub range: Option<SourceRange>,
}

#[derive(Debug, Deserialize)]
pub struct FunctionDecl {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub loc: Option<SourceLocation>,
    #[serde(default)]
    pub range: Option<SourceRange>,
    #[serde(rename = "previousDecl", default)]
    pub previous_decl: Option<Id>,
    #[serde(rename = "isImplicit", default)]
    pub is_implicit: Option<bool>,
    #[serde(rename = "isInvalid", default)]
    pub is_invalid: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct VarDecl {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub range: Option<SourceRange>,
}

#[derive(Debug, Deserialize)]
pub struct NamespaceDecl {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub range: Option<SourceRange>,
}

#[derive(Debug, Deserialize)]
pub struct AnnotateAttrData {
    #[serde(default)]
    pub range: Option<SourceRange>,
    #[serde(default)]
    pub inherited: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DeclRefExprData {
    #[serde(default)]
    pub range: Option<SourceRange>,
    #[serde(rename = "referencedDecl", default)]
    pub referenced_decl: Option<BareDecl>,
}

#[derive(Debug, Deserialize)]
pub struct BareDecl {
    pub id: Id,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImplicitCastExprData {
    #[serde(default)]
    pub range: Option<SourceRange>,
    #[serde(rename = "castKind", default)]
    pub cast_kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_annotation_name() {
        assert_eq!(
            first_string_literal(r#"annotate("callsite_wrapped_by", LogCall, MyTag)"#).as_deref(),
            Some("callsite_wrapped_by")
        );
        assert_eq!(first_string_literal(r#"annotate("a\"b")"#).as_deref(), Some("a\"b"));
        assert_eq!(first_string_literal("annotate(x)"), None);
    }
}
