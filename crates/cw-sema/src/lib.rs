//! Compiler-internal realization of callsite wrappers: each reference to a `callsite_wrapper`
//! function is resolved to a clone of the wrapper specialized for that call site.

pub mod error;
pub mod scope;
pub mod sema;
pub mod specialize;

pub use error::{Result, SemaError};
pub use scope::{ScopeFrame, ScopeGuard, ScopeStack};
pub use sema::{DeclContext, DeclContextKind, Sema};
pub use specialize::{DeclContextId, SemaHost, SpecializationBuilder, SpecializationInfo};
