use pretty_assertions::assert_eq;

use super::*;

fn ident(text: &str) -> Node {
    Node::with_text(NodeKind::Identifier, text)
}

fn structure(module: &str, name: &str) -> Node {
    Node::with_children(
        NodeKind::Structure,
        vec![Node::with_text(NodeKind::Module, module), ident(name)],
    )
}

fn bound_array_of_int() -> Node {
    Node::with_children(
        NodeKind::BoundGenericStructure,
        vec![
            Node::ty(structure("Swift", "Array")),
            Node::with_child(NodeKind::TypeList, Node::ty(structure("Swift", "Int"))),
        ],
    )
}

// ── Payloads ────────────────────────────────────────────────────

#[test]
fn payload_accessors() {
    let text = ident("foo");
    assert!(text.has_text());
    assert!(!text.has_index());
    assert_eq!(text.text(), "foo");
    assert_eq!(text.index(), None);

    let index = Node::with_index(NodeKind::Index, 7);
    assert_eq!(index.index(), Some(7));
    assert_eq!(index.text(), "");
}

#[test]
fn structural_equality() {
    assert_eq!(structure("main", "Foo"), structure("main", "Foo"));
    assert_ne!(structure("main", "Foo"), structure("main", "Bar"));
    assert_ne!(
        Node::with_text(NodeKind::Identifier, "x"),
        Node::with_text(NodeKind::Module, "x")
    );
}

#[test]
fn changing_kind_keeps_children() {
    let node = structure("main", "Foo").changing_kind(NodeKind::Class);
    assert_eq!(node.kind, NodeKind::Class);
    assert_eq!(node.num_children(), 2);
    assert_eq!(node.children[1].text(), "Foo");
}

#[test]
fn reverse_children_suffix() {
    let mut node = Node::with_children(
        NodeKind::TypeList,
        vec![ident("a"), ident("b"), ident("c")],
    );
    node.reverse_children_from(1);
    let texts: Vec<_> = node.children.iter().map(Node::text).collect();
    assert_eq!(texts, ["a", "c", "b"]);

    node.reverse_children_from(10);
    assert_eq!(node.num_children(), 3);
}

#[test]
fn unwrap_type_strips_one_layer() {
    let inner = structure("main", "Foo");
    let wrapped = Node::ty(Node::ty(inner.clone()));
    assert_eq!(wrapped.unwrap_type(), &Node::ty(inner.clone()));
    assert_eq!(inner.unwrap_type(), &inner);
}

// ── Specialization ──────────────────────────────────────────────

#[test]
fn bound_generic_is_specialized() {
    assert!(bound_array_of_int().is_specialized());
    assert!(!structure("Swift", "Array").is_specialized());
}

#[test]
fn nested_in_specialized_context() {
    let nested = Node::with_children(
        NodeKind::Structure,
        vec![bound_array_of_int(), ident("Index")],
    );
    assert!(nested.is_specialized());
    let unspecialized = nested.unspecialized().unwrap();
    assert_eq!(
        unspecialized,
        Node::with_children(
            NodeKind::Structure,
            vec![structure("Swift", "Array"), ident("Index")]
        )
    );
}

#[test]
fn unspecialized_bound_generic() {
    assert_eq!(
        bound_array_of_int().unspecialized(),
        Some(structure("Swift", "Array"))
    );
    assert_eq!(ident("x").unspecialized(), None);
}

// ── Traversal and display ───────────────────────────────────────

#[test]
fn descendants_are_preorder() {
    let tree = structure("main", "Foo");
    let kinds: Vec<_> = tree.descendants().map(|node| node.kind).collect();
    assert_eq!(
        kinds,
        [NodeKind::Structure, NodeKind::Module, NodeKind::Identifier]
    );
}

#[test]
fn display_tree_dump() {
    let tree = Node::with_children(
        NodeKind::Global,
        vec![
            Node::ty(structure("main", "Foo")),
            Node::with_index(NodeKind::Index, 3),
        ],
    );
    let expected = "\
kind=Global
  kind=Type
    kind=Structure
      kind=Module, text=\"main\"
      kind=Identifier, text=\"Foo\"
  kind=Index, index=\"3\"";
    assert_eq!(tree.to_string(), expected);
}

// ── Auxiliary enums ─────────────────────────────────────────────

#[test]
fn value_witness_codes_round_trip() {
    for kind in ValueWitnessKind::ALL {
        assert_eq!(ValueWitnessKind::from_code(kind.code()), Some(kind));
        assert_eq!(ValueWitnessKind::from_raw(kind as u64), Some(kind));
    }
    assert_eq!(ValueWitnessKind::from_code("zz"), None);
    assert_eq!(ValueWitnessKind::from_raw(24), None);
}

#[test]
fn param_kind_flags() {
    use FunctionSigSpecializationParamKind as K;
    assert_eq!(K(K::CLOSURE_PROP).exclusive_kind(), Some(K::CLOSURE_PROP));
    let flags = K(K::DEAD | K::SROA);
    assert_eq!(flags.exclusive_kind(), None);
    assert!(flags.contains(K::DEAD));
    assert!(!flags.contains(K::OWNED_TO_GUARANTEED));
}

#[test]
fn metadata_state_ordering() {
    assert!(MetadataState::Complete.is_at_least(MetadataState::LayoutComplete));
    assert!(MetadataState::LayoutComplete.is_at_least(MetadataState::Abstract));
    assert!(!MetadataState::Abstract.is_at_least(MetadataState::Complete));
}

#[test]
fn kind_names_are_unique() {
    let mut names: Vec<_> = NodeKind::ALL.iter().map(|kind| kind.name()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), NodeKind::ALL.len());
    for (ordinal, kind) in NodeKind::ALL.iter().enumerate() {
        assert_eq!(usize::from(kind.ordinal()), ordinal);
    }
}

#[cfg(feature = "cache")]
#[test]
fn cache_encoding_round_trips() {
    let tree = Node::ty(bound_array_of_int());
    let bytes = tree.to_bytes().unwrap();
    assert_eq!(Node::from_bytes(&bytes).unwrap(), tree);
}
