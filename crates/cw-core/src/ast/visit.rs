//! Depth-first traversal over the AST in source order.
//!
//! Implementors override the hooks they care about and call the matching `walk_*` function to
//! keep descending.

use crate::ast::{CallExpr, Decl, Expr, FunctionDecl, Stmt, VarDecl};

pub trait Visit<'ast> {
    fn visit_decl(&mut self, decl: &'ast Decl) {
        walk_decl(self, decl);
    }

    fn visit_function(&mut self, function: &'ast FunctionDecl) {
        walk_function(self, function);
    }

    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_call(&mut self, call: &'ast CallExpr) {
        walk_call(self, call);
    }
}

pub fn walk_decl<'ast, V: Visit<'ast> + ?Sized>(visitor: &mut V, decl: &'ast Decl) {
    match decl {
        Decl::Function(function) => visitor.visit_function(function),
        Decl::Var(var) => walk_var(visitor, var),
        Decl::Namespace(namespace) => {
            for decl in &namespace.decls {
                visitor.visit_decl(decl);
            }
        }
        Decl::Other => {}
    }
}

/// Visits the function body. Attribute arguments are not traversed: they are references, not
/// evaluated calls.
pub fn walk_function<'ast, V: Visit<'ast> + ?Sized>(visitor: &mut V, function: &'ast FunctionDecl) {
    if let Some(body) = &function.body {
        visitor.visit_stmt(body);
    }
}

fn walk_var<'ast, V: Visit<'ast> + ?Sized>(visitor: &mut V, var: &'ast VarDecl) {
    if let Some(init) = &var.init {
        visitor.visit_expr(init);
    }
}

pub fn walk_stmt<'ast, V: Visit<'ast> + ?Sized>(visitor: &mut V, stmt: &'ast Stmt) {
    match stmt {
        Stmt::Compound(compound) => {
            for stmt in &compound.body {
                visitor.visit_stmt(stmt);
            }
        }
        Stmt::Decl(decl) => {
            for var in &decl.vars {
                walk_var(visitor, var);
            }
        }
        Stmt::Expr(stmt) => visitor.visit_expr(&stmt.expr),
        Stmt::Other(other) => {
            for child in &other.children {
                visitor.visit_stmt(child);
            }
        }
    }
}

pub fn walk_expr<'ast, V: Visit<'ast> + ?Sized>(visitor: &mut V, expr: &'ast Expr) {
    match expr {
        Expr::Call(call) => visitor.visit_call(call),
        Expr::ImplicitCast(cast) => visitor.visit_expr(&cast.sub),
        Expr::Constant(constant) => visitor.visit_expr(&constant.sub),
        Expr::Paren(paren) => visitor.visit_expr(&paren.sub),
        Expr::Recovery(recovery) => {
            for child in &recovery.children {
                visitor.visit_expr(child);
            }
        }
        Expr::Other(other) => {
            for child in &other.children {
                visitor.visit_stmt(child);
            }
        }
        Expr::DeclRef(_) => {}
    }
}

pub fn walk_call<'ast, V: Visit<'ast> + ?Sized>(visitor: &mut V, call: &'ast CallExpr) {
    visitor.visit_expr(&call.callee);
    for arg in &call.args {
        visitor.visit_expr(arg);
    }
}

/// Mutable counterpart of [`Visit`], used by passes that replace expressions in place.
pub trait VisitMut {
    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }
}

pub fn walk_stmt_mut<V: VisitMut + ?Sized>(visitor: &mut V, stmt: &mut Stmt) {
    match stmt {
        Stmt::Compound(compound) => {
            for stmt in &mut compound.body {
                visitor.visit_stmt_mut(stmt);
            }
        }
        Stmt::Decl(decl) => {
            for var in &mut decl.vars {
                if let Some(init) = var.init.as_mut() {
                    visitor.visit_expr_mut(init);
                }
            }
        }
        Stmt::Expr(stmt) => visitor.visit_expr_mut(&mut stmt.expr),
        Stmt::Other(other) => {
            for child in &mut other.children {
                visitor.visit_stmt_mut(child);
            }
        }
    }
}

pub fn walk_expr_mut<V: VisitMut + ?Sized>(visitor: &mut V, expr: &mut Expr) {
    match expr {
        Expr::Call(call) => {
            visitor.visit_expr_mut(call.callee.as_mut());
            for arg in &mut call.args {
                visitor.visit_expr_mut(arg);
            }
        }
        Expr::ImplicitCast(cast) => visitor.visit_expr_mut(cast.sub.as_mut()),
        Expr::Constant(constant) => visitor.visit_expr_mut(constant.sub.as_mut()),
        Expr::Paren(paren) => visitor.visit_expr_mut(paren.sub.as_mut()),
        Expr::Recovery(recovery) => {
            for child in &mut recovery.children {
                visitor.visit_expr_mut(child);
            }
        }
        Expr::Other(other) => {
            for child in &mut other.children {
                visitor.visit_stmt_mut(child);
            }
        }
        Expr::DeclRef(_) => {}
    }
}

