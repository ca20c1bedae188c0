#![allow(dead_code)]

use cw_core::ast::{
    AnnotateAttr, Attr, CallExpr, CompoundStmt, Decl, DeclId, DeclRefExpr, Expr, FunctionDecl,
    NodeId, Stmt, CALLSITE_WRAPPER,
};
use cw_core::span::Span;

pub const FILE: u64 = 1;

pub fn span(lo: u32) -> Span {
    Span::new(FILE, lo, lo + 2)
}

/// A call statement whose callee reference has id `node` and sits at `lo`.
pub fn call_stmt(node: u64, decl: u64, lo: u32) -> Stmt {
    Stmt::expr(Expr::Call(CallExpr {
        id: NodeId(node + 1),
        range: Span::new(FILE, lo, lo + 4),
        callee: Box::new(Expr::DeclRef(DeclRefExpr {
            id: NodeId(node),
            range: span(lo),
            decl: DeclId(decl),
            name: format!("fn{decl}"),
        })),
        args: vec![],
        rparen: Span::new(FILE, lo + 3, lo + 4),
    }))
}

pub fn function(id: u64, name: &str, wrapper: bool, body: Vec<Stmt>) -> FunctionDecl {
    let attrs = if wrapper {
        vec![Attr::Annotate(AnnotateAttr {
            range: Span::null(),
            annotation: CALLSITE_WRAPPER.to_string(),
            args: vec![],
            inherited: false,
        })]
    } else {
        vec![]
    };
    FunctionDecl {
        id: DeclId(id),
        name: name.to_string(),
        range: Span::null(),
        name_range: Span::null(),
        attrs,
        body: Some(Stmt::Compound(CompoundStmt {
            range: Span::null(),
            body,
        })),
        previous: None,
        invalid: false,
    }
}

pub fn decl(function: FunctionDecl) -> Decl {
    Decl::Function(function)
}

/// Targets of every name reference in `function`'s body, in source order.
pub fn referenced(function: &FunctionDecl) -> Vec<Expr> {
    let mut out = Vec::new();
    if let Some(Stmt::Compound(body)) = &function.body {
        for stmt in &body.body {
            if let Stmt::Expr(stmt) = stmt {
                if let Expr::Call(call) = &stmt.expr {
                    out.push(call.callee.as_ref().clone());
                }
            }
        }
    }
    out
}

pub fn referenced_decls(function: &FunctionDecl) -> Vec<DeclId> {
    referenced(function)
        .iter()
        .filter_map(|expr| expr.as_decl_ref().map(|r| r.decl))
        .collect()
}
