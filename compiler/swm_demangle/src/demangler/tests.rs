use pretty_assertions::assert_eq;

use super::*;
use crate::node::{Directness, ValueWitnessKind};

fn ident(text: &str) -> Node {
    Node::with_text(NodeKind::Identifier, text)
}

fn module(text: &str) -> Node {
    Node::with_text(NodeKind::Module, text)
}

fn nominal(kind: NodeKind, context: Node, name: &str) -> Node {
    Node::with_children(kind, vec![context, ident(name)])
}

fn swift_struct(name: &str) -> Node {
    Node::ty(nominal(NodeKind::Structure, module("Swift"), name))
}

fn main_foo() -> Node {
    nominal(NodeKind::Structure, module("main"), "Foo")
}

fn empty_tuple() -> Node {
    Node::ty(Node::new(NodeKind::Tuple))
}

fn void_function_type() -> Node {
    Node::ty(Node::with_children(
        NodeKind::FunctionType,
        vec![
            Node::with_child(NodeKind::ArgumentTuple, empty_tuple()),
            Node::with_child(NodeKind::ReturnType, empty_tuple()),
        ],
    ))
}

fn main_foo_function() -> Node {
    Node::with_children(
        NodeKind::Function,
        vec![module("main"), ident("foo"), void_function_type()],
    )
}

fn tuple(elements: Vec<Node>) -> Node {
    Node::ty(Node::with_children(
        NodeKind::Tuple,
        elements
            .into_iter()
            .map(|ty| Node::with_child(NodeKind::TupleElement, ty))
            .collect(),
    ))
}

fn generic_param(depth: u64, index: u64) -> Node {
    Node::ty(dependent_generic_param_type(depth, index))
}

// ── Types ───────────────────────────────────────────────────────

#[test]
fn standard_substitution() {
    assert_eq!(demangle_type("Si").unwrap(), swift_struct("Int"));
    assert_eq!(
        demangle_type("Sq").unwrap(),
        Node::ty(nominal(NodeKind::Enum, module("Swift"), "Optional"))
    );
    assert_eq!(
        demangle_type("SQ").unwrap(),
        Node::ty(nominal(NodeKind::Protocol, module("Swift"), "Equatable"))
    );
}

#[test]
fn nominal_type_in_module() {
    assert_eq!(demangle_type("4main3FooV").unwrap(), Node::ty(main_foo()));
}

#[test]
fn bound_generic_array() {
    let expected = Node::ty(Node::with_children(
        NodeKind::BoundGenericStructure,
        vec![
            swift_struct("Array"),
            Node::with_child(NodeKind::TypeList, swift_struct("Int")),
        ],
    ));
    assert_eq!(demangle_type("SaySiG").unwrap(), expected);
}

#[test]
fn optional_sugar_substitution() {
    let expected = Node::ty(Node::with_children(
        NodeKind::BoundGenericEnum,
        vec![
            Node::ty(nominal(NodeKind::Enum, module("Swift"), "Optional")),
            Node::with_child(NodeKind::TypeList, swift_struct("Int")),
        ],
    ));
    assert_eq!(demangle_type("SiSg").unwrap(), expected);
}

#[test]
fn builtin_types() {
    assert_eq!(
        demangle_type("Bi64_").unwrap(),
        Node::ty(Node::with_text(NodeKind::BuiltinTypeName, "Builtin.Int64"))
    );
    assert_eq!(
        demangle_type("Bw").unwrap(),
        Node::ty(Node::with_text(NodeKind::BuiltinTypeName, "Builtin.Word"))
    );
    assert_eq!(
        demangle_type("Bi32_Bv4_").unwrap(),
        Node::ty(Node::with_text(
            NodeKind::BuiltinTypeName,
            "Builtin.Vec4xInt32"
        ))
    );
}

#[test]
fn builtin_size_zero_is_rejected() {
    assert!(demangle_type("Bi0_").is_err());
}

#[test]
fn tuple_elements_keep_order() {
    assert_eq!(
        demangle_type("Si_SSt").unwrap(),
        tuple(vec![swift_struct("Int"), swift_struct("String")])
    );
}

#[test]
fn substitution_reference() {
    // Substitutions: 0 `main`, 1 `Foo`, 2 `main.Foo`.
    let foo = Node::ty(main_foo());
    assert_eq!(
        demangle_type("4main3FooV_ACt").unwrap(),
        tuple(vec![foo.clone(), foo])
    );
}

#[test]
fn repeated_substitution_pushes_copies() {
    let foo = Node::ty(main_foo());
    assert_eq!(
        demangle_type("4main3FooV_A2Ct").unwrap(),
        tuple(vec![foo.clone(), foo.clone(), foo])
    );
}

#[test]
fn word_substitution_in_identifier() {
    // `BazBar` reuses the word "Bar" recorded from `FooBar`.
    let outer = nominal(NodeKind::Structure, module("main"), "FooBar");
    let expected = Node::ty(nominal(NodeKind::Structure, outer, "BazBar"));
    assert_eq!(demangle_type("4main6FooBarV03BazC0V").unwrap(), expected);
}

#[test]
fn word_substitution_inside_identifier() {
    assert_eq!(
        demangle_type("04foo_A0").unwrap(),
        ident("foo_foo")
    );
}

#[test]
fn empty_type_input_is_suffix() {
    assert_eq!(
        demangle_type("").unwrap(),
        Node::with_text(NodeKind::Suffix, "")
    );
}

// ── Symbols ─────────────────────────────────────────────────────

#[test]
fn plain_function_symbol() {
    let expected = Node::with_child(NodeKind::Global, main_foo_function());
    assert_eq!(demangle_symbol("$s4main3fooyyF").unwrap(), expected);
}

#[test]
fn all_prefixes_are_accepted() {
    let expected = demangle_symbol("$s4main3fooyyF").unwrap();
    for prefix in ["_T0", "$S", "_$S", "_$s"] {
        let symbol = format!("{prefix}4main3fooyyF");
        assert_eq!(demangle_symbol(&symbol).unwrap(), expected, "{symbol}");
    }
}

#[test]
fn argument_labels() {
    let int = swift_struct("Int");
    let params = tuple(vec![int.clone(), int.clone()]);
    let mut arguments = Node::with_index(NodeKind::ArgumentTuple, 2);
    arguments.add_child(params);
    let function_type = Node::ty(Node::with_children(
        NodeKind::FunctionType,
        vec![arguments, Node::with_child(NodeKind::ReturnType, int)],
    ));
    let expected = Node::with_child(
        NodeKind::Global,
        Node::with_children(
            NodeKind::Function,
            vec![
                module("main"),
                ident("add"),
                Node::with_children(NodeKind::LabelList, vec![ident("a"), ident("b")]),
                function_type,
            ],
        ),
    );
    assert_eq!(demangle_symbol("$s4main3add1a1bS2i_SitF").unwrap(), expected);
}

#[test]
fn generic_function() {
    let x = generic_param(0, 0);
    let mut arguments = Node::with_index(NodeKind::ArgumentTuple, 1);
    arguments.add_child(x.clone());
    let function_type = Node::ty(Node::with_children(
        NodeKind::FunctionType,
        vec![arguments, Node::with_child(NodeKind::ReturnType, x)],
    ));
    let signature = Node::with_child(
        NodeKind::DependentGenericSignature,
        Node::with_index(NodeKind::DependentGenericParamCount, 1),
    );
    let expected = Node::with_child(
        NodeKind::Global,
        Node::with_children(
            NodeKind::Function,
            vec![
                module("main"),
                ident("id"),
                Node::new(NodeKind::LabelList),
                Node::ty(Node::with_children(
                    NodeKind::DependentGenericType,
                    vec![signature, function_type],
                )),
            ],
        ),
    );
    assert_eq!(demangle_symbol("$s4main2idyxxlF").unwrap(), expected);
}

#[test]
fn operator_function() {
    let symbol = demangle_symbol("$s4main1poiyyF").unwrap();
    assert_eq!(
        symbol.children[0].children[1],
        Node::with_text(NodeKind::InfixOperator, "+")
    );
}

#[test]
fn protocol_conformance_descriptor() {
    let protocol = Node::ty(nominal(NodeKind::Protocol, module("main"), "P"));
    let expected = Node::with_child(
        NodeKind::Global,
        Node::with_child(
            NodeKind::ProtocolConformanceDescriptor,
            Node::with_children(
                NodeKind::ProtocolConformance,
                vec![Node::ty(main_foo()), protocol, module("main")],
            ),
        ),
    );
    assert_eq!(demangle_symbol("$s4main3FooVAA1PAAMc").unwrap(), expected);
}

#[test]
fn metadata_symbols() {
    let foo = Node::ty(main_foo());
    assert_eq!(
        demangle_symbol("$s4main3FooVN").unwrap(),
        Node::with_child(
            NodeKind::Global,
            Node::with_child(NodeKind::TypeMetadata, foo.clone())
        )
    );
    assert_eq!(
        demangle_symbol("$s4main3FooVMa").unwrap(),
        Node::with_child(
            NodeKind::Global,
            Node::with_child(NodeKind::TypeMetadataAccessFunction, foo.clone())
        )
    );
    assert_eq!(
        demangle_symbol("$s4main3FooVwxx").unwrap(),
        Node::with_child(
            NodeKind::Global,
            Node::with_children(
                NodeKind::ValueWitness,
                vec![
                    Node::with_index(
                        NodeKind::Index,
                        ValueWitnessKind::Destroy as u64
                    ),
                    foo
                ],
            )
        )
    );
}

#[test]
fn nominal_symbol_unwraps_type() {
    assert_eq!(
        demangle_symbol("$s4main3FooV").unwrap(),
        Node::with_child(NodeKind::Global, main_foo())
    );
}

#[test]
fn function_attributes_are_hoisted() {
    assert_eq!(
        demangle_symbol("$s4main3fooyyFTo").unwrap(),
        Node::with_children(
            NodeKind::Global,
            vec![Node::new(NodeKind::ObjCAttribute), main_foo_function()],
        )
    );
}

#[test]
fn partial_apply_forwarder_nests_entity() {
    assert_eq!(
        demangle_symbol("$s4main3fooyyFTA").unwrap(),
        Node::with_child(
            NodeKind::Global,
            Node::with_child(NodeKind::PartialApplyForwarder, main_foo_function()),
        )
    );
}

#[test]
fn trailing_suffix() {
    assert_eq!(
        demangle_symbol("$s4main3fooyyF.cold").unwrap(),
        Node::with_children(
            NodeKind::Global,
            vec![
                main_foo_function(),
                Node::with_text(NodeKind::Suffix, ".cold")
            ],
        )
    );
}

// ── Failures ────────────────────────────────────────────────────

#[test]
fn unknown_prefix_is_rejected() {
    assert!(matches!(
        demangle_symbol("main"),
        Err(DemangleError::Unexpected(_))
    ));
    assert!(matches!(
        demangle_symbol(""),
        Err(DemangleError::Unexpected(_))
    ));
}

#[test]
fn old_manglings_are_not_implemented() {
    assert!(matches!(
        demangle_symbol("_TtC4main3Foo"),
        Err(DemangleError::NotImplemented(_))
    ));
    assert!(matches!(
        demangle_symbol("_TF4main3fooFT_T_"),
        Err(DemangleError::NotImplemented(_))
    ));
}

#[test]
fn prefix_without_entities_is_rejected() {
    assert!(demangle_symbol("$s").is_err());
}

#[test]
fn truncated_input_is_rejected() {
    assert!(demangle_symbol("$s4mai").is_err());
    assert!(demangle_symbol("$s4main3FooVAZ").is_err());
    assert!(demangle_type("SaySi").is_err());
}

#[test]
fn leftover_type_operands_are_rejected() {
    assert!(matches!(
        demangle_type("SiSi"),
        Err(DemangleError::Unexpected(_))
    ));
    assert!(demangle_type("Si_").is_err());
    assert!(demangle_type("ySi").is_err());
}

#[test]
fn leftover_symbol_operands_are_rejected() {
    assert!(demangle_symbol("$s4main3fooyyF4main3FooV").is_err());
    assert!(demangle_symbol("$s4main3fooyyFy").is_err());
    assert!(demangle_symbol("$s3foo").is_err());
    assert!(demangle_symbol("$s.cold").is_err());
    assert!(demangle_symbol("$s4main3fooyyF.cold").is_ok());
}

#[test]
fn overflowing_indices_are_rejected() {
    let max = usize::MAX - 1;
    for input in [
        format!("q{max}_"),
        format!("qd{max}__"),
        format!("x_q{max}_"),
        format!("ySir{max}_l"),
    ] {
        assert!(
            matches!(demangle_type(&input), Err(DemangleError::Unexpected(_))),
            "{input}"
        );
    }
    let far = usize::MAX - 5;
    assert!(matches!(
        demangle_symbol(format!("$s4main3FooVA{far}_")),
        Err(DemangleError::Unexpected(_))
    ));
}

#[test]
fn missing_operand_is_rejected() {
    assert!(demangle_symbol("$sZ").is_err());
    assert!(demangle_type("G").is_err());
}

// ── Symbolic references ─────────────────────────────────────────

#[test]
fn symbolic_reference_uses_resolver() {
    let mut seen = Vec::new();
    let mut resolver = |reference: &SymbolicReference| {
        seen.push(*reference);
        Some(Node::ty(main_foo()))
    };
    let input = [0x01, 0x10, 0x00, 0x00, 0x00];
    let node = demangle_type_with_resolver(input, &mut resolver).unwrap();
    assert_eq!(node, Node::ty(main_foo()));
    assert_eq!(
        seen,
        vec![SymbolicReference {
            kind: SymbolicReferenceKind::Context,
            directness: Directness::Direct,
            position: 0,
            offset: 16,
        }]
    );
}

#[test]
fn context_reference_becomes_substitution() {
    let mut resolver = |_: &SymbolicReference| Some(Node::ty(main_foo()));
    let input = [0x02, 0xFC, 0xFF, 0xFF, 0xFF, b'_', b'A', b'A', b't'];
    let node = demangle_type_with_resolver(input, &mut resolver).unwrap();
    let foo = Node::ty(main_foo());
    assert_eq!(node, tuple(vec![foo.clone(), foo]));
}

#[test]
fn symbolic_reference_without_resolver_fails() {
    assert!(matches!(
        demangle_type([0x01, 0, 0, 0, 0]),
        Err(DemangleError::NotImplemented(_))
    ));
}

#[test]
fn unresolved_symbolic_reference_fails() {
    let mut resolver = |_: &SymbolicReference| -> Option<Node> { None };
    assert!(demangle_type_with_resolver([0x01, 0, 0, 0, 0], &mut resolver).is_err());
}

#[test]
fn unknown_symbolic_reference_kind_fails() {
    let mut resolver = |_: &SymbolicReference| Some(Node::ty(main_foo()));
    assert!(demangle_type_with_resolver([0x05, 0, 0, 0, 0], &mut resolver).is_err());
}

// ── Options ─────────────────────────────────────────────────────

#[test]
fn repeat_count_limit_is_enforced() {
    let options = DemangleOptions {
        max_repeat_count: 2,
        ..DemangleOptions::default()
    };
    let result = Demangler::new(b"$s4main3add1a1bS3i_SitF")
        .with_options(options)
        .demangle_symbol();
    assert!(result.is_err());
    let result = Demangler::new(b"$s4main3add1a1bS2i_SitF")
        .with_options(options)
        .demangle_symbol();
    assert!(result.is_ok());
}
