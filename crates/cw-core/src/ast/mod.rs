//! Closed AST model consumed by the callsite rewriting passes.
//!
//! Only the node kinds the rewrite and specialization logic inspect get their own variants;
//! everything else is preserved as an `Other` node with its children so traversal stays complete.

mod attr;
mod decl;
mod expr;
mod stmt;
pub mod visit;

pub use attr::*;
pub use decl::*;
pub use expr::*;
pub use stmt::*;

use std::fmt::{Display, Formatter};

/// Identity of an expression node (a call site or a name reference).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Identity of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u64);

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Display for DeclId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "decl#{}", self.0)
    }
}
