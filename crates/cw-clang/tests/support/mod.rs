#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A source file on disk plus helpers for building clang's JSON locations into it.
pub struct Source {
    pub dir: TempDir,
    pub path: PathBuf,
    pub text: &'static str,
    next_id: std::cell::Cell<u64>,
}

impl Source {
    pub fn new(name: &str, text: &'static str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        Self {
            dir,
            path,
            text,
            next_id: std::cell::Cell::new(0x1000),
        }
    }

    pub fn find(&self, needle: &str) -> usize {
        self.text
            .find(needle)
            .unwrap_or_else(|| panic!("`{needle}` not in source"))
    }

    pub fn find_after(&self, anchor: &str, needle: &str) -> usize {
        let start = self.find(anchor);
        start
            + self.text[start..]
                .find(needle)
                .unwrap_or_else(|| panic!("`{needle}` not after `{anchor}`"))
    }

    /// Location of a token of `len` bytes at `offset`.
    pub fn tok(&self, offset: usize, len: usize) -> Value {
        let before = &self.text[..offset];
        let line = before.matches('\n').count() + 1;
        let col = offset - before.rfind('\n').map(|idx| idx + 1).unwrap_or(0) + 1;
        json!({
            "offset": offset,
            "file": self.path.to_string_lossy(),
            "line": line,
            "col": col,
            "tokLen": len,
        })
    }

    /// Location of a token written at `spelling` and expanded from a macro use at `expansion`.
    pub fn macro_tok(&self, spelling: (usize, usize), expansion: (usize, usize), macro_arg: bool) -> Value {
        let mut expansion = self.tok(expansion.0, expansion.1);
        if macro_arg {
            expansion["isMacroArgExpansion"] = json!(true);
        }
        json!({ "spellingLoc": self.tok(spelling.0, spelling.1), "expansionLoc": expansion })
    }

    pub fn range(&self, begin: (usize, usize), end: (usize, usize)) -> Value {
        json!({ "begin": self.tok(begin.0, begin.1), "end": self.tok(end.0, end.1) })
    }

    /// Range of a single token.
    pub fn token(&self, offset: usize, len: usize) -> Value {
        self.range((offset, len), (offset, len))
    }

    pub fn id(&self) -> String {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        format!("{id:#x}")
    }

    pub fn function(&self, id: &str, name: &str, name_at: usize, end: usize, inner: Vec<Value>) -> Value {
        json!({
            "id": id,
            "kind": "FunctionDecl",
            "loc": self.tok(name_at, name.len()),
            "range": self.range((name_at, name.len()), (end, 1)),
            "name": name,
            "inner": inner,
        })
    }

    pub fn decl_ref(&self, at: usize, name: &str, target: &str) -> Value {
        json!({
            "id": self.id(),
            "kind": "DeclRefExpr",
            "range": self.token(at, name.len()),
            "referencedDecl": { "id": target, "kind": "FunctionDecl", "name": name },
        })
    }

    pub fn decay(&self, inner: Value) -> Value {
        let range = inner["range"].clone();
        json!({
            "id": self.id(),
            "kind": "ImplicitCastExpr",
            "range": range,
            "castKind": "FunctionToPointerDecay",
            "inner": [inner],
        })
    }

    pub fn compound(&self, open: usize, close: usize, inner: Vec<Value>) -> Value {
        json!({
            "id": self.id(),
            "kind": "CompoundStmt",
            "range": self.range((open, 1), (close, 1)),
            "inner": inner,
        })
    }
}

pub fn translation_unit(inner: Vec<Value>) -> String {
    json!({ "id": "0x1", "kind": "TranslationUnitDecl", "inner": inner }).to_string()
}

pub fn write_compile_commands(dir: &Path, commands: Value) -> PathBuf {
    let path = dir.join("compile_commands.json");
    fs::write(&path, serde_json::to_string_pretty(&commands).unwrap()).unwrap();
    path
}
