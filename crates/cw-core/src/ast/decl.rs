use crate::ast::{AnnotateAttr, Attr, DeclId, Expr, Stmt};
use crate::span::Span;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Function(FunctionDecl),
    Var(VarDecl),
    Namespace(NamespaceDecl),
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub id: DeclId,
    pub name: String,
    pub range: Span,
    /// Location of the declared name.
    pub name_range: Span,
    pub attrs: Vec<Attr>,
    pub body: Option<Stmt>,
    /// Earlier declaration of the same entity.
    pub previous: Option<DeclId>,
    pub invalid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: Option<String>,
    pub range: Span,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    pub name: Option<String>,
    pub range: Span,
    pub decls: Vec<Decl>,
}

impl FunctionDecl {
    pub fn annotation(&self, name: &str) -> Option<&AnnotateAttr> {
        self.attrs.iter().find_map(|attr| attr.as_annotation(name))
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotation(name).is_some()
    }
}

/// A lowered translation unit plus an index from declaration id to function.
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    path: PathBuf,
    decls: Vec<Decl>,
    index: HashMap<DeclId, Vec<usize>>,
}

impl TranslationUnit {
    pub fn new(path: PathBuf, decls: Vec<Decl>) -> Self {
        let mut index = HashMap::new();
        let mut trail = Vec::new();
        index_decls(&decls, &mut trail, &mut index);
        Self { path, decls, index }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn decls(&self) -> &[Decl] {
        &self.decls
    }

    pub fn into_decls(self) -> Vec<Decl> {
        self.decls
    }

    pub fn function(&self, id: DeclId) -> Option<&FunctionDecl> {
        let trail = self.index.get(&id)?;
        let (last, parents) = trail.split_last()?;
        let mut decls = &self.decls;
        for idx in parents {
            match decls.get(*idx)? {
                Decl::Namespace(namespace) => decls = &namespace.decls,
                _ => return None,
            }
        }
        match decls.get(*last)? {
            Decl::Function(function) => Some(function),
            _ => None,
        }
    }

    /// The declaration in `id`'s redeclaration chain that carries a body.
    pub fn definition(&self, id: DeclId) -> Option<&FunctionDecl> {
        let function = self.function(id)?;
        if function.body.is_some() {
            return Some(function);
        }
        let root = self.first_declaration(id);
        self.functions()
            .find(|candidate| candidate.body.is_some() && self.first_declaration(candidate.id) == root)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        let mut out = Vec::new();
        collect_functions(&self.decls, &mut out);
        out.into_iter()
    }

    fn first_declaration(&self, id: DeclId) -> DeclId {
        let mut current = id;
        // Chains are acyclic in well-formed input; the bound guards against malformed dumps.
        for _ in 0..self.index.len() {
            match self.function(current).and_then(|f| f.previous) {
                Some(previous) if previous != current => current = previous,
                _ => break,
            }
        }
        current
    }
}

fn index_decls(decls: &[Decl], trail: &mut Vec<usize>, index: &mut HashMap<DeclId, Vec<usize>>) {
    for (idx, decl) in decls.iter().enumerate() {
        trail.push(idx);
        match decl {
            Decl::Function(function) => {
                index.entry(function.id).or_insert_with(|| trail.clone());
            }
            Decl::Namespace(namespace) => index_decls(&namespace.decls, trail, index),
            Decl::Var(_) | Decl::Other => {}
        }
        trail.pop();
    }
}

fn collect_functions<'a>(decls: &'a [Decl], out: &mut Vec<&'a FunctionDecl>) {
    for decl in decls {
        match decl {
            Decl::Function(function) => out.push(function),
            Decl::Namespace(namespace) => collect_functions(&namespace.decls, out),
            Decl::Var(_) | Decl::Other => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::CompoundStmt;

    fn function(id: u64, name: &str, body: bool, previous: Option<u64>) -> FunctionDecl {
        FunctionDecl {
            id: DeclId(id),
            name: name.to_string(),
            range: Span::null(),
            name_range: Span::null(),
            attrs: vec![],
            body: body.then(|| {
                Stmt::Compound(CompoundStmt {
                    range: Span::null(),
                    body: vec![],
                })
            }),
            previous: previous.map(DeclId),
            invalid: false,
        }
    }

    #[test]
    fn finds_functions_inside_namespaces() {
        let tu = TranslationUnit::new(
            PathBuf::from("a.cpp"),
            vec![
                Decl::Other,
                Decl::Namespace(NamespaceDecl {
                    name: Some("tracing".to_string()),
                    range: Span::null(),
                    decls: vec![Decl::Function(function(3, "MyTag", true, None))],
                }),
            ],
        );
        assert_eq!(tu.function(DeclId(3)).map(|f| f.name.as_str()), Some("MyTag"));
        assert!(tu.function(DeclId(4)).is_none());
    }

    #[test]
    fn definition_follows_the_redeclaration_chain() {
        let tu = TranslationUnit::new(
            PathBuf::from("a.cpp"),
            vec![
                Decl::Function(function(1, "MyTag", false, None)),
                Decl::Function(function(2, "MyTag", true, Some(1))),
            ],
        );
        assert_eq!(tu.definition(DeclId(1)).map(|f| f.id), Some(DeclId(2)));
    }
}
