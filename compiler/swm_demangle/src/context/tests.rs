use pretty_assertions::assert_eq;

use super::*;
use crate::remangler::mangle;

fn module(name: &str) -> ContextComponent {
    ContextComponent::Module {
        name: name.to_owned(),
    }
}

fn nominal(kind: NominalContextKind, name: &str, generic_params: usize) -> ContextComponent {
    ContextComponent::Nominal {
        kind,
        name: name.to_owned(),
        generic_params,
    }
}

fn int() -> Node {
    demangle_type("Si").unwrap()
}

// ── Name length ─────────────────────────────────────────────────

#[test]
fn plain_name_length() {
    assert_eq!(mangled_name_length(b"4main3FooV\0junk", 8), 10);
    assert_eq!(mangled_name_length(b"Si", 8), 2);
    assert_eq!(mangled_name_length(b"\0", 8), 0);
}

#[test]
fn relative_reference_skips_offset() {
    // The offset bytes contain a zero that must not end the name.
    let bytes = [0x01, 0x00, 0x10, 0x00, 0x00, b'S', b'g', 0x00];
    assert_eq!(mangled_name_length(&bytes, 8), 7);
}

#[test]
fn absolute_reference_skips_pointer() {
    let mut bytes = vec![0x18];
    bytes.extend_from_slice(&[0; 8]);
    bytes.extend_from_slice(b"Sg\0");
    assert_eq!(mangled_name_length(&bytes, 8), 11);
    assert_eq!(mangled_name_length(&bytes, 4), 5);
}

// ── Context paths ───────────────────────────────────────────────

#[test]
fn nominal_in_module() {
    let tree = build_demangling_for_context(
        &[module("main"), nominal(NominalContextKind::Struct, "Foo", 0)],
        &[],
    )
    .unwrap();
    assert_eq!(tree, demangle_type("4main3FooV").unwrap());
    assert_eq!(mangle(&tree), "4main3FooV");
}

#[test]
fn nested_nominals() {
    let tree = build_demangling_for_context(
        &[
            module("main"),
            nominal(NominalContextKind::Class, "Outer", 0),
            nominal(NominalContextKind::Enum, "Inner", 0),
        ],
        &[],
    )
    .unwrap();
    assert_eq!(mangle(&tree), "4main5OuterC5InnerO");
}

#[test]
fn generic_arguments_are_distributed() {
    let tree = build_demangling_for_context(
        &[module("main"), nominal(NominalContextKind::Struct, "Box", 1)],
        &[int()],
    )
    .unwrap();
    assert_eq!(mangle(&tree), "4main3BoxVySiG");
}

#[test]
fn protocol_ends_path() {
    let tree = build_demangling_for_context(
        &[
            module("main"),
            ContextComponent::Protocol {
                name: "P".to_owned(),
            },
            nominal(NominalContextKind::Struct, "Ignored", 0),
        ],
        &[],
    )
    .unwrap();
    assert_eq!(mangle(&tree), "4main1PP");
}

#[test]
fn extension_of_nominal() {
    let tree = build_demangling_for_context(
        &[
            module("other"),
            ContextComponent::Extension {
                extended_type: "4main3FooV".to_owned(),
                generic_params: 0,
            },
        ],
        &[],
    )
    .unwrap();
    let expected = Node::ty(Node::with_children(
        NodeKind::Extension,
        vec![
            Node::with_text(NodeKind::Module, "other"),
            demangle_type("4main3FooV").unwrap().unwrap_type().clone(),
        ],
    ));
    assert_eq!(tree, expected);
}

#[test]
fn extension_drops_unbound_generic_arguments() {
    let tree = build_demangling_for_context(
        &[
            module("main"),
            ContextComponent::Extension {
                extended_type: "SaySiG".to_owned(),
                generic_params: 0,
            },
        ],
        &[],
    )
    .unwrap();
    assert_eq!(tree.children[0].children[1], demangle_type("Sa").unwrap().children[0]);
}

#[test]
fn anonymous_context() {
    let tree = build_demangling_for_context(
        &[
            module("main"),
            ContextComponent::Anonymous {
                address: 0xbeef,
                generic_params: 0,
            },
        ],
        &[],
    )
    .unwrap();
    let anonymous = tree.unwrap_type();
    assert_eq!(anonymous.kind, NodeKind::AnonymousContext);
    assert_eq!(anonymous.children[0].text(), "$beef");
    assert_eq!(anonymous.children[2], Node::new(NodeKind::TypeList));
}

#[test]
fn malformed_paths_are_rejected() {
    assert!(build_demangling_for_context(&[], &[]).is_err());
    assert!(build_demangling_for_context(&[module("a"), module("b")], &[]).is_err());
    assert!(
        build_demangling_for_context(&[nominal(NominalContextKind::Struct, "Foo", 0)], &[])
            .is_err()
    );
}
