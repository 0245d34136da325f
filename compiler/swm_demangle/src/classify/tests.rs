use super::*;

// ── Type classifiers ────────────────────────────────────────────

#[test]
fn nominal_kinds() {
    assert!(is_struct("Si"));
    assert!(is_struct("SaySiG"));
    assert!(is_enum("Sq"));
    assert!(is_enum("SiSg"));
    assert!(is_protocol("SQ"));
    assert!(is_class("4main3FooC"));
    assert!(is_alias("4main1Ta"));

    assert!(!is_class("Si"));
    assert!(!is_struct("4main3FooC"));
    assert!(!is_enum("SQ"));
}

#[test]
fn malformed_types_are_unclassified() {
    for name in ["", "G", "4mai", "Bi0_"] {
        assert!(!is_struct(name), "{name}");
        assert!(!is_class(name), "{name}");
        assert!(!is_enum(name), "{name}");
        assert!(!is_protocol(name), "{name}");
        assert!(!is_alias(name), "{name}");
    }
}

#[test]
fn unconsumed_operands_are_unclassified() {
    assert!(is_struct("Si"));
    assert!(!is_struct("SaySi"));
    assert!(!is_struct("SiSi"));
}

#[test]
fn overflowing_indices_are_unclassified() {
    let max = usize::MAX - 1;
    for name in [
        format!("q{max}_"),
        format!("qd{max}__"),
        format!("x_q{max}_"),
        format!("ySir{max}_l"),
        format!("4main3FooVA{}_", usize::MAX - 5),
    ] {
        assert!(!is_struct(&name), "{name}");
    }
}

#[test]
fn node_predicates_look_through_type() {
    let class = Node::with_children(
        NodeKind::Class,
        vec![
            Node::with_text(NodeKind::Module, "main"),
            Node::with_text(NodeKind::Identifier, "C"),
        ],
    );
    assert!(class.is_class_node());
    assert!(Node::ty(class.clone()).is_class_node());
    assert!(Node::ty(Node::ty(class.clone())).is_class_node());
    assert!(!Node::ty(Node::ty(class)).is_struct_node());
    assert!(!Node::new(NodeKind::Type).is_class_node());
    assert!(Node::new(NodeKind::ProtocolSymbolicReference).is_protocol_node());
}

// ── Symbol classifiers ──────────────────────────────────────────

#[test]
fn mangled_name_prefixes() {
    assert!(is_mangled_name("$s4main3fooyyF"));
    assert!(is_mangled_name("_T0abc"));
    assert!(!is_mangled_name("_Tabc"));
    assert!(!is_mangled_name("main"));
}

#[test]
fn objc_symbols() {
    assert!(is_objc_symbol("$sSo8NSObjectC"));
    assert!(is_objc_symbol("SC7CGPointV"));
    assert!(!is_objc_symbol("$s4main3FooV"));
}

#[test]
fn thunk_symbols() {
    assert!(is_thunk_symbol("$s4main3fooyyFTA"));
    assert!(is_thunk_symbol("$s4main3fooyyFTo"));
    assert!(is_thunk_symbol("$sSiSSTR"));
    assert!(is_thunk_symbol("$s4main3FooVACycfC"));

    assert!(!is_thunk_symbol("$s4main3fooyyF"));
    assert!(!is_thunk_symbol("somethingTA"));
    // Suffix matches but the symbol does not parse.
    assert!(!is_thunk_symbol("$sZTA"));
}

#[test]
fn legacy_thunk_prefixes() {
    assert!(is_thunk_symbol("_TToFC4main3Foo3barfT_T_"));
    assert!(is_thunk_symbol("_TPA__TFC4main3Foo3barfT_T_"));
    assert!(!is_thunk_symbol("_TF4main3barFT_T_"));
}

#[test]
fn thunk_targets() {
    assert_eq!(
        thunk_target("$s4main3fooyyFTA").as_deref(),
        Some("$s4main3fooyyF")
    );
    assert_eq!(
        thunk_target("$s4main3FooVACycfC").as_deref(),
        Some("$s4main3FooVACycfc")
    );
    assert_eq!(thunk_target("$sSiSSTR"), None);
    assert_eq!(thunk_target("$s4main3fooyyF"), None);
    assert_eq!(thunk_target("_TToFC4main3Foo3barfT_T_"), None);
}

#[test]
fn swift_calling_convention() {
    assert!(has_swift_calling_convention("$s4main3fooyyF"));
    assert!(has_swift_calling_convention("$s4main3fooyyFTA"));
    assert!(!has_swift_calling_convention("$s4main3FooVMa"));
    assert!(!has_swift_calling_convention("$s4main3FooVwxx"));
    assert!(!has_swift_calling_convention("$s4main3fooyyFTo"));
    assert!(!has_swift_calling_convention("not a symbol"));
}

#[test]
fn module_names() {
    assert_eq!(module_name("$s4main3fooyyF"), "main");
    assert_eq!(module_name("$s4main3fooyyFTo"), "main");
    assert_eq!(module_name("$s5Other3FooV"), "Other");
    assert_eq!(module_name("$s4main3FooVMa"), "");
    assert_eq!(module_name("garbage"), "");
}
