use crate::ast::{Expr, VarDecl};
use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Compound(CompoundStmt),
    Decl(DeclStmt),
    Expr(ExprStmt),
    Other(OtherStmt),
}

/// An expression used as a statement. `range` extends over the terminating `;` when the
/// frontend could locate it, while `expr` keeps the expression's own range.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub range: Span,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundStmt {
    pub range: Span,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclStmt {
    pub range: Span,
    pub vars: Vec<VarDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OtherStmt {
    pub kind: String,
    pub range: Span,
    pub children: Vec<Stmt>,
}

impl Stmt {
    pub fn range(&self) -> Span {
        match self {
            Stmt::Compound(compound) => compound.range,
            Stmt::Decl(decl) => decl.range,
            Stmt::Expr(stmt) => stmt.range,
            Stmt::Other(other) => other.range,
        }
    }

    pub fn expr(expr: Expr) -> Stmt {
        let range = expr.range();
        Stmt::Expr(ExprStmt { range, expr })
    }

    pub fn as_compound(&self) -> Option<&CompoundStmt> {
        match self {
            Stmt::Compound(compound) => Some(compound),
            _ => None,
        }
    }
}
