use crate::ast::{DeclId, NodeId, Stmt};
use crate::span::Span;

/// Expression kinds the callsite machinery inspects. Everything else is kept as [`OtherExpr`]
/// so traversal still reaches calls nested inside it.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Call(CallExpr),
    DeclRef(DeclRefExpr),
    ImplicitCast(ImplicitCastExpr),
    Constant(ConstantExpr),
    Paren(ParenExpr),
    Recovery(RecoveryExpr),
    Other(OtherExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub id: NodeId,
    pub range: Span,
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    /// The closing parenthesis token.
    pub rparen: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclRefExpr {
    pub id: NodeId,
    pub range: Span,
    pub decl: DeclId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImplicitCastExpr {
    pub range: Span,
    pub cast_kind: Option<String>,
    pub sub: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpr {
    pub range: Span,
    pub sub: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenExpr {
    pub range: Span,
    pub sub: Box<Expr>,
}

/// Placeholder standing in for an expression that failed to build.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryExpr {
    pub range: Span,
    pub children: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OtherExpr {
    pub kind: String,
    pub range: Span,
    pub children: Vec<Stmt>,
}

impl Expr {
    pub fn range(&self) -> Span {
        match self {
            Expr::Call(call) => call.range,
            Expr::DeclRef(decl_ref) => decl_ref.range,
            Expr::ImplicitCast(cast) => cast.range,
            Expr::Constant(constant) => constant.range,
            Expr::Paren(paren) => paren.range,
            Expr::Recovery(recovery) => recovery.range,
            Expr::Other(other) => other.range,
        }
    }

    /// Strips implicit casts, constant-expression wrappers and parentheses.
    pub fn ignore_wrappers(&self) -> &Expr {
        let mut expr = self;
        loop {
            expr = match expr {
                Expr::ImplicitCast(cast) => &cast.sub,
                Expr::Constant(constant) => &constant.sub,
                Expr::Paren(paren) => &paren.sub,
                _ => return expr,
            };
        }
    }

    pub fn as_decl_ref(&self) -> Option<&DeclRefExpr> {
        match self.ignore_wrappers() {
            Expr::DeclRef(decl_ref) => Some(decl_ref),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&CallExpr> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn is_recovery(&self) -> bool {
        matches!(self, Expr::Recovery(_))
    }
}

impl CallExpr {
    /// Declaration the callee statically resolves to, if it names one directly.
    pub fn callee_decl(&self) -> Option<DeclId> {
        self.callee.as_decl_ref().map(|decl_ref| decl_ref.decl)
    }

    pub fn num_args(&self) -> usize {
        self.args.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl_ref(decl: u64) -> Expr {
        Expr::DeclRef(DeclRefExpr {
            id: NodeId(decl + 100),
            range: Span::new(1, 0, 7),
            decl: DeclId(decl),
            name: "compute".to_string(),
        })
    }

    #[test]
    fn callee_decl_looks_through_casts_and_parens() {
        let callee = Expr::ImplicitCast(ImplicitCastExpr {
            range: Span::new(1, 0, 9),
            cast_kind: Some("FunctionToPointerDecay".to_string()),
            sub: Box::new(Expr::Paren(ParenExpr {
                range: Span::new(1, 0, 9),
                sub: Box::new(decl_ref(7)),
            })),
        });
        let call = CallExpr {
            id: NodeId(1),
            range: Span::new(1, 0, 11),
            callee: Box::new(callee),
            args: vec![],
            rparen: Span::new(1, 10, 11),
        };
        assert_eq!(call.callee_decl(), Some(DeclId(7)));
    }

    #[test]
    fn indirect_callee_has_no_declaration() {
        let call = CallExpr {
            id: NodeId(1),
            range: Span::new(1, 0, 11),
            callee: Box::new(Expr::Other(OtherExpr {
                kind: "MemberExpr".to_string(),
                range: Span::new(1, 0, 9),
                children: vec![],
            })),
            args: vec![],
            rparen: Span::new(1, 10, 11),
        };
        assert_eq!(call.callee_decl(), None);
    }
}
