//! Builds lowered translation units over real source text so rewrite output can be compared as
//! text. Spans are located by searching the source, the way a frontend would have reported them.

#![allow(dead_code)]

use cw_core::ast::{
    AnnotateAttr, Attr, CallExpr, CompoundStmt, Decl, DeclId, DeclRefExpr, DeclStmt, Expr,
    FunctionDecl, ImplicitCastExpr, NodeId, Stmt, TranslationUnit, VarDecl, CALLSITE_WRAPPED_BY,
};
use cw_core::source_map::SourceMap;
use cw_core::span::{FileId, Span};
use std::cell::Cell;
use std::path::PathBuf;

pub const PATH: &str = "main.cpp";

pub struct Fixture {
    pub map: SourceMap,
    pub file: FileId,
    pub source: String,
    next_node: Cell<u64>,
}

impl Fixture {
    pub fn new(source: &str) -> Self {
        let map = SourceMap::new();
        let file = map.register_source(PathBuf::from(PATH), source);
        Self {
            map,
            file,
            source: source.to_string(),
            next_node: Cell::new(1),
        }
    }

    /// Span of the first occurrence of `needle` at or after the first occurrence of `anchor`.
    pub fn find_after(&self, anchor: &str, needle: &str) -> Span {
        let start = self
            .source
            .find(anchor)
            .unwrap_or_else(|| panic!("anchor `{anchor}` not in fixture"));
        let offset = self.source[start..]
            .find(needle)
            .unwrap_or_else(|| panic!("`{needle}` not found after `{anchor}`"))
            + start;
        Span::new(self.file, offset as u32, (offset + needle.len()) as u32)
    }

    pub fn find(&self, needle: &str) -> Span {
        self.find_after(needle, needle)
    }

    /// Span of the `)` closing the call whose text starts at `call`.
    pub fn rparen_of(&self, call: Span) -> Span {
        let bytes = self.source.as_bytes();
        let mut depth = 0i32;
        for idx in call.lo as usize..bytes.len() {
            match bytes[idx] {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Span::new(self.file, idx as u32, idx as u32 + 1);
                    }
                }
                _ => {}
            }
        }
        panic!("unbalanced call at {call}");
    }

    pub fn node(&self) -> NodeId {
        let id = self.next_node.get();
        self.next_node.set(id + 1);
        NodeId(id)
    }

    pub fn decl_ref(&self, span: Span, decl: u64) -> Expr {
        Expr::DeclRef(DeclRefExpr {
            id: self.node(),
            range: span,
            decl: DeclId(decl),
            name: self.map.snippet(span).unwrap_or_default(),
        })
    }

    /// A call to `decl` whose callee token is `callee`; the call extends to its matching `)`.
    pub fn call(&self, callee: Span, decl: u64, args: Vec<Expr>) -> Expr {
        let rparen = self.rparen_of(callee);
        Expr::Call(CallExpr {
            id: self.node(),
            range: callee.to(rparen),
            callee: Box::new(Expr::ImplicitCast(ImplicitCastExpr {
                range: callee,
                cast_kind: Some("FunctionToPointerDecay".to_string()),
                sub: Box::new(self.decl_ref(callee, decl)),
            })),
            args,
            rparen,
        })
    }

    pub fn var_stmt(&self, span: Span, name: &str, init: Option<Expr>) -> Stmt {
        Stmt::Decl(DeclStmt {
            range: span,
            vars: vec![VarDecl {
                name: Some(name.to_string()),
                range: span,
                init,
            }],
        })
    }

    pub fn translation_unit(&self, decls: Vec<Decl>) -> TranslationUnit {
        TranslationUnit::new(PathBuf::from(PATH), decls)
    }
}

pub fn compound(range: Span, body: Vec<Stmt>) -> Stmt {
    Stmt::Compound(CompoundStmt { range, body })
}

pub fn function(id: u64, name: &str, attrs: Vec<Attr>, body: Option<Stmt>) -> Decl {
    Decl::Function(FunctionDecl {
        id: DeclId(id),
        name: name.to_string(),
        range: Span::null(),
        name_range: Span::null(),
        attrs,
        body,
        previous: None,
        invalid: false,
    })
}

pub fn wrapped_by(args: Vec<Expr>) -> Attr {
    Attr::Annotate(AnnotateAttr {
        range: Span::null(),
        annotation: CALLSITE_WRAPPED_BY.to_string(),
        args,
        inherited: false,
    })
}
