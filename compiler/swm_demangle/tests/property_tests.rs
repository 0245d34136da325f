//! Property-based tests for the demangler and remangler.
//!
//! Generated inputs check that arbitrary text never panics the demangler
//! and that hand-built nominal type trees survive a mangle/demangle trip.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use proptest::prelude::*;
use swm_demangle::{classify, demangle_symbol, demangle_type, mangle, Node, NodeKind};

/// Mangling-shaped text: digits, letters and the punctuation the grammar uses.
fn mangling_like() -> impl Strategy<Value = String> {
    prop::string::string_regex("(\\$s)?[0-9A-Za-z_.]{0,24}").expect("valid regex")
}

fn identifier() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][a-z0-9]{0,10}").expect("valid regex")
}

fn nominal_kind() -> impl Strategy<Value = NodeKind> {
    prop_oneof![
        Just(NodeKind::Structure),
        Just(NodeKind::Class),
        Just(NodeKind::Enum),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn demangling_never_panics(text in mangling_like()) {
        let _ = demangle_symbol(&text);
        let _ = demangle_type(&text);
    }

    #[test]
    fn classification_is_deterministic(text in mangling_like()) {
        prop_assert_eq!(classify::is_struct(&text), classify::is_struct(&text));
        prop_assert_eq!(classify::is_thunk_symbol(&text), classify::is_thunk_symbol(&text));
        prop_assert_eq!(classify::module_name(&text), classify::module_name(&text));
    }

    #[test]
    fn nominal_types_round_trip(
        module in identifier(),
        outer in identifier(),
        inner in identifier(),
        outer_kind in nominal_kind(),
        inner_kind in nominal_kind(),
    ) {
        let outer = Node::with_children(
            outer_kind,
            vec![
                Node::with_text(NodeKind::Module, module),
                Node::with_text(NodeKind::Identifier, outer),
            ],
        );
        let tree = Node::ty(Node::with_children(
            inner_kind,
            vec![outer, Node::with_text(NodeKind::Identifier, inner)],
        ));
        let mangled = mangle(&tree);
        prop_assert_eq!(demangle_type(&mangled).unwrap(), tree);
    }
}
