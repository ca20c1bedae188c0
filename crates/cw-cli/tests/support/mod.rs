#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Builds the pieces of a clang JSON AST that point into one source file.
pub struct AstBuilder<'a> {
    pub path: &'a Path,
    pub text: &'a str,
}

impl<'a> AstBuilder<'a> {
    pub fn find(&self, needle: &str) -> usize {
        self.text
            .find(needle)
            .unwrap_or_else(|| panic!("`{needle}` not in source"))
    }

    pub fn find_after(&self, anchor: &str, needle: &str) -> usize {
        let start = self.find(anchor);
        start + self.text[start..].find(needle).unwrap()
    }

    pub fn tok(&self, offset: usize, len: usize) -> Value {
        json!({ "offset": offset, "file": self.path, "col": 1, "tokLen": len })
    }

    pub fn range(&self, begin: usize, begin_len: usize, end: usize, end_len: usize) -> Value {
        json!({ "begin": self.tok(begin, begin_len), "end": self.tok(end, end_len) })
    }

    pub fn decl_ref(&self, id: &str, at: usize, name: &str, target: &str) -> Value {
        json!({
            "id": id,
            "kind": "DeclRefExpr",
            "range": self.range(at, name.len(), at, name.len()),
            "referencedDecl": { "id": target, "kind": "FunctionDecl", "name": name },
        })
    }

    pub fn function(&self, id: &str, name: &str, inner: Vec<Value>) -> Value {
        let at = self.find(&format!("{name}("));
        json!({
            "id": id,
            "kind": "FunctionDecl",
            "loc": self.tok(at, name.len()),
            "range": self.range(at, name.len(), at, name.len()),
            "name": name,
            "inner": inner,
        })
    }
}

/// A fake clang that prints `json` whatever it is asked.
pub fn fake_clang(dir: &Path, json: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let dump = dir.join("ast.json");
    fs::write(&dump, json).unwrap();
    let script = dir.join("fake-clang");
    fs::write(&script, format!("#!/bin/sh\ncat '{}'\n", dump.display())).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

pub fn write_compile_commands(build: &Path, files: &[&Path]) {
    let commands: Vec<Value> = files
        .iter()
        .map(|file| {
            json!({
                "directory": build,
                "file": file,
                "arguments": ["clang++", "-std=c++17", "-c", file],
            })
        })
        .collect();
    fs::create_dir_all(build).unwrap();
    fs::write(
        build.join("compile_commands.json"),
        serde_json::to_string_pretty(&commands).unwrap(),
    )
    .unwrap();
}
