use pretty_assertions::assert_eq;

use super::*;
use crate::demangler::demangle_type;
use crate::error::DemangleError;

fn symbol_text(symbol: &str, options: PrintOptions) -> String {
    print_node(&demangle_symbol(symbol).unwrap(), options).unwrap()
}

fn type_text(mangled: &str, options: PrintOptions) -> String {
    print_node(&demangle_type(mangled).unwrap(), options).unwrap()
}

fn param(depth: u64, index: u64) -> Node {
    Node::ty(Node::with_children(
        NodeKind::DependentGenericParamType,
        vec![
            Node::with_index(NodeKind::Index, depth),
            Node::with_index(NodeKind::Index, index),
        ],
    ))
}

fn protocol(module: &str, name: &str) -> Node {
    Node::ty(Node::with_children(
        NodeKind::Protocol,
        vec![
            Node::with_text(NodeKind::Module, module),
            Node::with_text(NodeKind::Identifier, name),
        ],
    ))
}

// ── Functions ───────────────────────────────────────────────────

#[test]
fn labelled_function() {
    assert_eq!(
        symbol_text("$s4main3add1a1bS2i_SitF", PrintOptions::default()),
        "main.add(a: Swift.Int, b: Swift.Int) -> Swift.Int"
    );
}

#[test]
fn simplified_function_drops_types_and_modules() {
    assert_eq!(
        symbol_text("$s4main3add1a1bS2i_SitF", PrintOptions::SIMPLIFIED),
        "add(a:b:)"
    );
}

#[test]
fn void_function() {
    assert_eq!(
        symbol_text("$s4main3fooyyF", PrintOptions::default()),
        "main.foo() -> ()"
    );
}

#[test]
fn generic_function_prints_signature() {
    assert_eq!(
        symbol_text("$s4main2idyxxlF", PrintOptions::default()),
        "main.id<A>(A) -> A"
    );
}

#[test]
fn attributes_and_suffixes() {
    assert_eq!(
        symbol_text("$s4main3fooyyFTo", PrintOptions::default()),
        "@objc main.foo() -> ()"
    );
    assert_eq!(
        symbol_text("$s4main3fooyyF.cold", PrintOptions::default()),
        "main.foo() -> () with unmangled suffix \".cold\""
    );
    let without_suffix = PrintOptions::default() - PrintOptions::DISPLAY_UNMANGLED_SUFFIX;
    assert_eq!(
        symbol_text("$s4main3fooyyF.cold", without_suffix),
        "main.foo() -> ()"
    );
}

#[test]
fn partial_apply_forwarder() {
    assert_eq!(
        symbol_text("$s4main3fooyyFTA", PrintOptions::default()),
        "partial apply forwarder for main.foo() -> ()"
    );
    assert_eq!(
        symbol_text("$s4main3fooyyFTA", PrintOptions::SIMPLIFIED),
        "partial apply for foo()"
    );
}

// ── Runtime records ─────────────────────────────────────────────

#[test]
fn metadata_symbols() {
    assert_eq!(
        symbol_text("$s4main3FooVN", PrintOptions::default()),
        "type metadata for main.Foo"
    );
    assert_eq!(
        symbol_text("$s4main3FooVMa", PrintOptions::default()),
        "type metadata accessor for main.Foo"
    );
}

#[test]
fn value_witness() {
    assert_eq!(
        symbol_text("$s4main3FooVwxx", PrintOptions::default()),
        "destroy value witness for main.Foo"
    );
    assert_eq!(
        symbol_text("$s4main3FooVwxx", PrintOptions::SIMPLIFIED),
        "destroy for Foo"
    );
}

#[test]
fn conformance_descriptor() {
    assert_eq!(
        symbol_text("$s4main3FooVAA1PAAMc", PrintOptions::default()),
        "protocol conformance descriptor for main.Foo : main.P in main"
    );
}

// ── Types ───────────────────────────────────────────────────────

#[test]
fn nominal_and_builtin_types() {
    assert_eq!(type_text("Si", PrintOptions::default()), "Swift.Int");
    assert_eq!(type_text("Bi64_", PrintOptions::default()), "Builtin.Int64");
    assert_eq!(
        type_text("Si_SSt", PrintOptions::default()),
        "(Swift.Int, Swift.String)"
    );
}

#[test]
fn bound_generics_without_sugar() {
    assert_eq!(
        type_text("SaySiG", PrintOptions::default()),
        "Swift.Array<Swift.Int>"
    );
    assert_eq!(
        type_text("SiSg", PrintOptions::default()),
        "Swift.Optional<Swift.Int>"
    );
}

#[test]
fn bound_generics_with_sugar() {
    let sugared = PrintOptions::default() | PrintOptions::SYNTHESIZE_SUGAR_ON_TYPES;
    assert_eq!(type_text("SaySiG", sugared), "[Swift.Int]");
    assert_eq!(type_text("SiSg", sugared), "Swift.Int?");
    assert_eq!(type_text("SaySiG", PrintOptions::SIMPLIFIED), "[Int]");
}

#[test]
fn metatypes() {
    let int = demangle_type("Si").unwrap();
    let metatype = Node::with_child(NodeKind::Metatype, int);
    assert_eq!(
        metatype.to_text(PrintOptions::default()).unwrap(),
        "Swift.Int.Type"
    );

    let existential = Node::ty(Node::with_child(
        NodeKind::ProtocolList,
        Node::with_child(NodeKind::TypeList, protocol("main", "P")),
    ));
    let metatype = Node::with_child(NodeKind::Metatype, existential);
    assert_eq!(
        metatype.to_text(PrintOptions::default()).unwrap(),
        "main.P.Protocol"
    );
}

#[test]
fn empty_protocol_list_is_any() {
    let any = Node::with_child(NodeKind::ProtocolList, Node::new(NodeKind::TypeList));
    assert_eq!(any.to_text(PrintOptions::default()).unwrap(), "Any");
}

// ── Generic signatures ──────────────────────────────────────────

#[test]
fn generic_signature_with_requirements() {
    let requirement = Node::with_children(
        NodeKind::DependentGenericConformanceRequirement,
        vec![param(0, 0), protocol("Swift", "Equatable")],
    );
    let layout = Node::with_children(
        NodeKind::DependentGenericLayoutRequirement,
        vec![param(1, 0), Node::with_text(NodeKind::Identifier, "C")],
    );
    let signature = Node::with_children(
        NodeKind::DependentGenericSignature,
        vec![
            Node::with_index(NodeKind::DependentGenericParamCount, 2),
            Node::with_index(NodeKind::DependentGenericParamCount, 1),
            requirement,
            layout,
        ],
    );
    assert_eq!(
        signature.to_text(PrintOptions::default()).unwrap(),
        "<A, B><A1 where A: Swift.Equatable, A1: AnyObject>"
    );
    let no_where = PrintOptions::default() - PrintOptions::DISPLAY_WHERE_CLAUSES;
    assert_eq!(signature.to_text(no_where).unwrap(), "<A, B><A1>");
}

// ── Malformed trees ─────────────────────────────────────────────

#[test]
fn missing_children_are_rejected() {
    let err = print_node(&Node::new(NodeKind::Function), PrintOptions::default()).unwrap_err();
    assert!(matches!(err, DemangleError::Unexpected(_)), "{err}");

    let metatype = Node::new(NodeKind::Metatype);
    assert!(metatype.to_text(PrintOptions::default()).is_err());
}

#[test]
fn nested_failures_reject_the_whole_tree() {
    let global = Node::with_children(
        NodeKind::Global,
        vec![
            Node::new(NodeKind::ObjCAttribute),
            Node::with_child(NodeKind::TypeMetadata, Node::new(NodeKind::Structure)),
        ],
    );
    assert!(print_node(&global, PrintOptions::default()).is_err());
}
