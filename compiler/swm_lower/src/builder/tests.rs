use pretty_assertions::assert_eq;

use super::*;
use crate::error::LoweringError;
use crate::metadata::{CompositeLayout, FieldLayout, StaticMetadata};
use crate::types::BuiltinType;

fn ident(text: &str) -> Node {
    Node::with_text(NodeKind::Identifier, text)
}

fn module(text: &str) -> Node {
    Node::with_text(NodeKind::Module, text)
}

fn nominal(kind: NodeKind, context: Node, name: &str) -> Node {
    Node::with_children(kind, vec![context, ident(name)])
}

fn convention(text: &str) -> Node {
    Node::with_text(NodeKind::ImplConvention, text)
}

fn metadata() -> (StaticMetadata, AType) {
    let mut metadata = StaticMetadata::new();
    let int = metadata.add_struct(
        STDLIB,
        "Int",
        CompositeLayout {
            size: 8,
            alignment: 8,
            fields: vec![FieldLayout::field(AType::Builtin(BuiltinType::Integer(64)), 0)],
        },
    );
    (metadata, int)
}

const STDLIB: &str = swm_demangle::mangling::STDLIB_NAME;

fn builder(metadata: &StaticMetadata) -> TypeBuilder<'_> {
    TypeBuilder::new(metadata, BuiltinTable::shared())
}

// ── Types ───────────────────────────────────────────────────────────

#[test]
fn builtins_are_found_by_name() {
    let (metadata, _) = metadata();
    assert_eq!(
        builder(&metadata).build_mangled_type("Bi64_").unwrap(),
        AType::Builtin(BuiltinType::Integer(64))
    );
}

#[test]
fn nominal_types_carry_their_metadata() {
    let (metadata, int) = metadata();
    let built = builder(&metadata).build_mangled_type("Si").unwrap();
    assert_eq!(built, int);
    let AType::Nominal(nominal) = built else {
        panic!("expected a nominal type");
    };
    assert_eq!(nominal.decl.name, "Int");
}

#[test]
fn unknown_nominals_are_missing_metadata() {
    let metadata = StaticMetadata::new();
    assert!(matches!(
        builder(&metadata).build_mangled_type("Si"),
        Err(LoweringError::MissingMetadata(_))
    ));
}

#[test]
fn tuples_keep_element_order() {
    let (metadata, int) = metadata();
    let mut metadata = metadata;
    let string = metadata.add_struct(
        STDLIB,
        "String",
        CompositeLayout {
            size: 16,
            alignment: 8,
            fields: Vec::new(),
        },
    );
    assert_eq!(
        builder(&metadata).build_mangled_type("Si_SSt").unwrap(),
        AType::Tuple(vec![int, string])
    );
}

#[test]
fn bound_generics_keep_their_arguments() {
    let (metadata, int) = metadata();
    let built = builder(&metadata).build_mangled_type("SaySiG").unwrap();
    assert_eq!(
        built,
        AType::BoundGeneric(BoundGenericType {
            decl: NominalDecl::new(NominalKind::Struct, STDLIB, "Array"),
            args: vec![int.clone()],
        })
    );
    let optional = builder(&metadata).build_mangled_type("SiSg").unwrap();
    assert_eq!(optional.optional_object_type(), Some(&int));
}

#[test]
fn nested_nominals_use_dotted_names() {
    let mut metadata = StaticMetadata::new();
    let inner = metadata.add_class("main", "Outer.Inner");
    let node = Node::ty(nominal(
        NodeKind::Class,
        nominal(NodeKind::Structure, module("main"), "Outer"),
        "Inner",
    ));
    assert_eq!(builder(&metadata).build_type(&node).unwrap(), inner);
}

#[test]
fn protocols_become_existentials() {
    let mut metadata = StaticMetadata::new();
    metadata.add_protocol(ProtocolDecl::new("main", "P"));
    let node = Node::ty(nominal(NodeKind::Protocol, module("main"), "P"));
    let built = builder(&metadata).build_type(&node).unwrap();
    let AType::Existential(existential) = &built else {
        panic!("expected an existential, got {built:?}");
    };
    assert!(existential.is_single_protocol());
    assert_eq!(existential.protocols, vec![ProtocolDecl::new("main", "P")]);
}

#[test]
fn metatypes_keep_an_explicit_representation() {
    let (metadata, int) = metadata();
    let node = Node::ty(Node::with_children(
        NodeKind::Metatype,
        vec![
            Node::with_text(NodeKind::MetatypeRepresentation, "@thick"),
            Node::ty(nominal(NodeKind::Structure, module(STDLIB), "Int")),
        ],
    ));
    assert_eq!(
        builder(&metadata).build_type(&node).unwrap(),
        AType::Metatype(MetatypeType {
            instance: Box::new(int),
            representation: Some(MetatypeRepresentation::Thick),
        })
    );
}

#[test]
fn weak_references_wrap_their_referent() {
    let mut metadata = StaticMetadata::new();
    let class = metadata.add_class("main", "C");
    let node = Node::ty(Node::with_child(
        NodeKind::Weak,
        Node::ty(nominal(NodeKind::Class, module("main"), "C")),
    ));
    assert_eq!(
        builder(&metadata).build_type(&node).unwrap(),
        AType::ReferenceStorage(ReferenceOwnership::Weak, Box::new(class))
    );
}

#[test]
fn unknown_builtins_are_not_implemented() {
    let metadata = StaticMetadata::new();
    let node = Node::ty(Node::with_text(NodeKind::BuiltinTypeName, "Builtin.Nonsense"));
    assert!(matches!(
        builder(&metadata).build_type(&node),
        Err(LoweringError::NotImplemented(_))
    ));
}

#[test]
fn empty_type_wrappers_are_malformed() {
    let metadata = StaticMetadata::new();
    assert!(matches!(
        builder(&metadata).build_type(&Node::new(NodeKind::Type)),
        Err(LoweringError::MalformedTree(_))
    ));
}

// ── SIL function types ──────────────────────────────────────────────

#[test]
fn impl_function_types_read_their_conventions() {
    let (metadata, int) = metadata();
    let int_node = || Node::ty(nominal(NodeKind::Structure, module(STDLIB), "Int"));
    let node = Node::ty(Node::with_children(
        NodeKind::ImplFunctionType,
        vec![
            Node::new(NodeKind::ImplEscaping),
            convention("@callee_guaranteed"),
            Node::with_children(
                NodeKind::ImplParameter,
                vec![convention("@in_guaranteed"), int_node()],
            ),
            Node::with_children(NodeKind::ImplResult, vec![convention("@unowned"), int_node()]),
        ],
    ));
    let AType::SilFunction(function) = builder(&metadata).build_type(&node).unwrap() else {
        panic!("expected a SIL function type");
    };
    assert_eq!(function.representation, SilFunctionTypeRepresentation::Thick);
    assert_eq!(function.callee_convention, ParameterConvention::DirectGuaranteed);
    assert!(!function.is_noescape);
    assert_eq!(
        function.params,
        vec![SilParameterInfo::new(int.clone(), ParameterConvention::IndirectInGuaranteed)]
    );
    assert_eq!(function.results, vec![SilResultInfo::new(int, ResultConvention::Unowned)]);
}

#[test]
fn thin_impl_functions_take_the_convention_attribute() {
    let metadata = StaticMetadata::new();
    let node = Node::ty(Node::with_children(
        NodeKind::ImplFunctionType,
        vec![
            convention("@callee_guaranteed"),
            Node::with_text(NodeKind::ImplFunctionAttribute, "@convention(witness_method)"),
        ],
    ));
    let AType::SilFunction(function) = builder(&metadata).build_type(&node).unwrap() else {
        panic!("expected a SIL function type");
    };
    assert_eq!(function.representation, SilFunctionTypeRepresentation::WitnessMethod);
    assert!(!function.is_noescape);
}

#[test]
fn unknown_parameter_conventions_are_not_implemented() {
    let (metadata, _) = metadata();
    let node = Node::ty(Node::with_children(
        NodeKind::ImplFunctionType,
        vec![
            convention("@callee_guaranteed"),
            Node::with_children(
                NodeKind::ImplParameter,
                vec![
                    convention("@pack_owned"),
                    Node::ty(nominal(NodeKind::Structure, module(STDLIB), "Int")),
                ],
            ),
        ],
    ));
    assert!(matches!(
        builder(&metadata).build_type(&node),
        Err(LoweringError::NotImplemented(_))
    ));
}

// ── Symbols ─────────────────────────────────────────────────────────

#[test]
fn free_functions_are_thin() {
    let metadata = StaticMetadata::new();
    let symbol = builder(&metadata)
        .build_mangled_function("$s4main3fooyyF")
        .unwrap();
    assert_eq!(symbol.name, "foo");
    assert_eq!(symbol.self_type, None);
    assert!(symbol.function.params.is_empty());
    assert!(symbol.function.result.is_void());
    assert_eq!(
        symbol.function.ext.representation,
        SilFunctionTypeRepresentation::Thin
    );
}

#[test]
fn argument_labels_are_applied() {
    let (metadata, int) = metadata();
    let symbol = builder(&metadata)
        .build_mangled_function("$s4main3add1a1bS2i_SitF")
        .unwrap();
    let labels: Vec<_> = symbol
        .function
        .params
        .iter()
        .map(|param| param.label.as_deref())
        .collect();
    assert_eq!(labels, vec![Some("a"), Some("b")]);
    assert!(symbol.function.params.iter().all(|param| param.ty == int));
    assert_eq!(symbol.function.result, int);
}

#[test]
fn generic_functions_keep_their_signature() {
    let metadata = StaticMetadata::new();
    let symbol = builder(&metadata)
        .build_mangled_function("$s4main2idyxxlF")
        .unwrap();
    let t = AType::GenericParam(GenericParam::new(0, 0));
    assert_eq!(symbol.function.params, vec![FunctionParam::new(t.clone())]);
    assert_eq!(symbol.function.result, t);
    assert_eq!(
        symbol.function.generic_signature,
        Some(GenericSignature {
            params: vec![GenericParam::new(0, 0)],
            requirements: Vec::new(),
        })
    );
}

#[test]
fn methods_take_self_last() {
    let (mut metadata, int) = metadata();
    let counter = metadata.add_class("main", "Counter");
    let int_node = Node::ty(nominal(NodeKind::Structure, module(STDLIB), "Int"));
    let function_type = Node::ty(Node::with_children(
        NodeKind::FunctionType,
        vec![
            Node::with_child(NodeKind::ArgumentTuple, int_node.clone()),
            Node::with_child(NodeKind::ReturnType, int_node),
        ],
    ));
    let method = |wrap_static: bool| {
        let function = Node::with_children(
            NodeKind::Function,
            vec![
                nominal(NodeKind::Class, module("main"), "Counter"),
                ident("bump"),
                function_type.clone(),
            ],
        );
        let entity = if wrap_static {
            Node::with_child(NodeKind::Static, function)
        } else {
            function
        };
        Node::with_child(NodeKind::Global, entity)
    };

    let symbol = builder(&metadata).build_function_symbol(&method(false)).unwrap();
    assert_eq!(symbol.self_type.as_ref(), Some(&counter));
    assert_eq!(
        symbol.function.params,
        vec![FunctionParam::new(int), FunctionParam::new(counter.clone())]
    );
    assert_eq!(
        symbol.function.ext.representation,
        SilFunctionTypeRepresentation::Method
    );

    let symbol = builder(&metadata).build_function_symbol(&method(true)).unwrap();
    assert_eq!(
        symbol.self_type,
        Some(AType::Metatype(MetatypeType {
            instance: Box::new(counter),
            representation: None,
        }))
    );
}

#[test]
fn accessors_are_not_implemented() {
    let metadata = StaticMetadata::new();
    let node = Node::with_child(NodeKind::Global, Node::new(NodeKind::Getter));
    assert!(matches!(
        builder(&metadata).build_function_symbol(&node),
        Err(LoweringError::NotImplemented(_))
    ));
}
