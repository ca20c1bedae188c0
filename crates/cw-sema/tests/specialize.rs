mod support;

use cw_core::ast::{Decl, DeclId, Expr, NamespaceDecl, TranslationUnit};
use cw_core::span::Span;
use cw_sema::{DeclContextKind, Sema, SpecializationInfo};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use support::{call_stmt, decl, function, referenced, referenced_decls, span};

fn analyzed(decls: Vec<Decl>) -> Sema {
    let mut sema = Sema::new(TranslationUnit::new(PathBuf::from("main.cpp"), decls));
    sema.analyze();
    sema
}

fn info(sema: &Sema, id: DeclId) -> SpecializationInfo {
    *sema
        .specializations()
        .find(|(decl, _)| *decl == id)
        .map(|(_, info)| info)
        .unwrap_or_else(|| panic!("{id} is not a specialization"))
}

#[test]
fn every_reference_gets_its_own_specialization() {
    let sema = analyzed(vec![
        decl(function(1, "LogCall", true, vec![])),
        decl(function(3, "main", false, vec![call_stmt(10, 1, 10), call_stmt(20, 1, 20)])),
    ]);

    let main = sema.function(DeclId(3)).unwrap();
    let targets = referenced_decls(main);
    assert_eq!(targets.len(), 2);
    assert_ne!(targets[0], targets[1]);
    for (target, lo) in targets.iter().zip([10, 20]) {
        let clone = sema.function(*target).unwrap();
        assert_eq!(clone.name, "LogCall");
        let info = info(&sema, *target);
        assert_eq!(info.template, DeclId(1));
        assert_eq!(info.point_of_instantiation, span(lo));
        assert_eq!(
            sema.context(info.callee_context).map(|ctx| ctx.kind.clone()),
            Some(DeclContextKind::Function(DeclId(3)))
        );
    }
    assert!(!sema.diagnostics().has_errors());
}

#[test]
fn nested_wrappers_inherit_the_outer_call_site() {
    let sema = analyzed(vec![
        decl(function(1, "Inner", true, vec![])),
        decl(function(2, "Outer", true, vec![call_stmt(100, 1, 100)])),
        decl(function(3, "main", false, vec![call_stmt(10, 2, 10), call_stmt(20, 2, 20)])),
    ]);

    let main = sema.function(DeclId(3)).unwrap();
    for (outer, lo) in referenced_decls(main).into_iter().zip([10, 20]) {
        let outer_info = info(&sema, outer);
        let inner = referenced_decls(sema.function(outer).unwrap());
        assert_eq!(inner.len(), 1);
        let inner_info = info(&sema, inner[0]);
        assert_eq!(inner_info.template, DeclId(1));
        assert_eq!(inner_info.point_of_instantiation, span(lo));
        assert_eq!(inner_info.point_of_instantiation, outer_info.point_of_instantiation);
        assert_eq!(inner_info.callee_context, outer_info.callee_context);
    }
    assert_eq!(sema.specializations().count(), 4);

    // Templates keep referring to templates.
    assert_eq!(referenced_decls(sema.function(DeclId(2)).unwrap()), vec![DeclId(1)]);
}

#[test]
fn self_referencing_wrapper_is_diagnosed() {
    let sema = analyzed(vec![
        decl(function(1, "Loop", true, vec![call_stmt(100, 1, 100)])),
        decl(function(3, "main", false, vec![call_stmt(10, 1, 10)])),
    ]);

    let main = sema.function(DeclId(3)).unwrap();
    let clone = referenced_decls(main)[0];
    let inside = referenced(sema.function(clone).unwrap());
    assert!(inside[0].is_recovery());

    let diagnostics = sema.diagnostics().get_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code.as_deref(), Some("callsite::recursive-wrapper"));
    assert_eq!(diagnostics[0].span, Some(span(100)));
}

#[test]
fn invalid_wrapper_becomes_a_recovery_expression() {
    let mut broken = function(1, "Broken", true, vec![]);
    broken.invalid = true;
    let sema = analyzed(vec![
        decl(broken),
        decl(function(3, "main", false, vec![call_stmt(10, 1, 10)])),
    ]);

    let main = sema.function(DeclId(3)).unwrap();
    match &referenced(main)[0] {
        Expr::Recovery(recovery) => assert_eq!(recovery.range, span(10)),
        other => panic!("expected recovery expression, found {other:?}"),
    }
    assert!(sema.diagnostics().has_errors());
    assert_eq!(sema.specializations().count(), 0);
}

#[test]
fn specializations_are_placed_next_to_their_template() {
    let sema = analyzed(vec![
        Decl::Namespace(NamespaceDecl {
            name: Some("tracing".to_string()),
            range: Span::null(),
            decls: vec![decl(function(1, "LogCall", true, vec![]))],
        }),
        decl(function(3, "main", false, vec![call_stmt(10, 1, 10)])),
    ]);

    let tu = sema.into_translation_unit();
    let Decl::Namespace(namespace) = &tu.decls()[0] else {
        panic!("namespace moved");
    };
    let names: Vec<_> = namespace
        .decls
        .iter()
        .filter_map(|decl| match decl {
            Decl::Function(function) => Some((function.id, function.name.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(names.len(), 2);
    assert_eq!(names[0], (DeclId(1), "LogCall"));
    assert_eq!(names[1].1, "LogCall");
    assert_eq!(tu.decls().len(), 2);
}
