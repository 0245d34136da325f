use pretty_assertions::assert_eq;

use super::*;
use crate::demangler::{demangle_symbol, demangle_type};

fn ident(text: &str) -> Node {
    Node::with_text(NodeKind::Identifier, text)
}

fn module(text: &str) -> Node {
    Node::with_text(NodeKind::Module, text)
}

fn main_foo() -> Node {
    Node::ty(Node::with_children(
        NodeKind::Structure,
        vec![module("main"), ident("Foo")],
    ))
}

#[track_caller]
fn assert_type_round_trip(mangled: &str) {
    let tree = demangle_type(mangled).unwrap();
    assert_eq!(mangle(&tree), mangled);
}

#[track_caller]
fn assert_symbol_round_trip(mangled: &str) {
    let tree = demangle_symbol(mangled).unwrap();
    assert_eq!(mangle(&tree), mangled);
}

// ── Types ───────────────────────────────────────────────────────

#[test]
fn standard_types() {
    for name in ["Si", "SS", "Sq", "SQ"] {
        assert_type_round_trip(name);
    }
}

#[test]
fn nominal_and_bound_generic_types() {
    assert_type_round_trip("4main3FooV");
    assert_type_round_trip("SaySiG");
    assert_type_round_trip("SiSg");
}

#[test]
fn builtin_integer() {
    assert_type_round_trip("Bi64_");
}

#[test]
fn tuples_reuse_substitutions() {
    assert_type_round_trip("Si_SSt");
    assert_type_round_trip("4main3FooV_ACt");
    assert_type_round_trip("4main3FooV_A2Ct");
}

#[test]
fn identifier_word_substitutions() {
    assert_type_round_trip("4main6FooBarV03BazC0V");
    assert_type_round_trip("04foo_A0");
}

#[test]
fn hand_built_tree_uses_standard_substitution() {
    let int = Node::ty(Node::with_children(
        NodeKind::Structure,
        vec![module("Swift"), ident("Int")],
    ));
    assert_eq!(mangle(&int), "Si");

    let pair = Node::ty(Node::with_children(
        NodeKind::Tuple,
        vec![
            Node::with_child(NodeKind::TupleElement, main_foo()),
            Node::with_child(NodeKind::TupleElement, main_foo()),
        ],
    ));
    assert_eq!(mangle(&pair), "4main3FooV_ACt");
}

// ── Symbols ─────────────────────────────────────────────────────

#[test]
fn functions() {
    assert_symbol_round_trip("$s4main3fooyyF");
    assert_symbol_round_trip("$s4main3add1a1bS2i_SitF");
    assert_symbol_round_trip("$s4main2idyxxlF");
    assert_symbol_round_trip("$s4main1poiyyF");
}

#[test]
fn metadata_and_witnesses() {
    assert_symbol_round_trip("$s4main3FooV");
    assert_symbol_round_trip("$s4main3FooVN");
    assert_symbol_round_trip("$s4main3FooVMa");
    assert_symbol_round_trip("$s4main3FooVwxx");
    assert_symbol_round_trip("$s4main3FooVAA1PAAMc");
}

#[test]
fn thunks_and_suffixes() {
    assert_symbol_round_trip("$s4main3fooyyFTo");
    assert_symbol_round_trip("$s4main3fooyyFTA");
    assert_symbol_round_trip("$s4main3fooyyF.cold");
}

// ── Symbolic references ─────────────────────────────────────────

#[test]
fn symbolic_reference_is_expanded_by_resolver() {
    let mut seen = Vec::new();
    let mut resolver = |kind: SymbolicReferenceKind, reference: u64| -> Node {
        seen.push((kind, reference));
        main_foo()
    };
    let node = Node::with_index(NodeKind::TypeSymbolicReference, 7);
    assert_eq!(mangle_with_resolver(&node, &mut resolver), "4main3FooV");
    assert_eq!(seen, vec![(SymbolicReferenceKind::Context, 7)]);
}

#[test]
#[should_panic(expected = "without a resolver")]
fn symbolic_reference_without_resolver_is_fatal() {
    mangle(&Node::with_index(NodeKind::TypeSymbolicReference, 7));
}

#[test]
#[should_panic(expected = "mangled by its parent")]
fn inline_only_kind_is_fatal() {
    mangle(&Node::with_index(NodeKind::Index, 0));
}
