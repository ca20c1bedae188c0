//! cw-clang: clang frontend for the callsite wrapper tool
//!
//! Locates a translation unit's compile command, runs clang to dump its AST as JSON and lowers
//! the dump into the `cw-core` AST, registering every source file it references.

pub mod compile_db;
pub mod error;
mod lowering;
pub mod parser;

pub use compile_db::{CompilationDatabase, CompileCommand};
pub use error::{ClangError, Result};
pub use lowering::lower_translation_unit_from_json;
pub use parser::ClangParser;
