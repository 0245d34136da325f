//! End-to-end demangle and remangle tests through the public API.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use swm_demangle::{classify, demangle_symbol, demangle_type, mangle, NodeKind};

const SYMBOLS: &[&str] = &[
    "$s4main3fooyyF",
    "$s4main3add1a1bS2i_SitF",
    "$s4main2idyxxlF",
    "$s4main1poiyyF",
    "$s4main3FooV",
    "$s4main3FooVN",
    "$s4main3FooVMa",
    "$s4main3FooVwxx",
    "$s4main3FooVAA1PAAMc",
    "$s4main3fooyyFTo",
    "$s4main3fooyyFTA",
    "$s4main3fooyyF.cold",
];

const TYPES: &[&str] = &[
    "Si",
    "SaySiG",
    "SiSg",
    "Bi64_",
    "Si_SSt",
    "4main3FooV_A2Ct",
    "4main6FooBarV03BazC0V",
];

#[test]
fn symbols_round_trip() {
    for &symbol in SYMBOLS {
        let tree = demangle_symbol(symbol).unwrap();
        assert_eq!(mangle(&tree), symbol);
    }
}

#[test]
fn types_round_trip() {
    for &ty in TYPES {
        let tree = demangle_type(ty).unwrap();
        assert_eq!(mangle(&tree), ty);
    }
}

#[test]
fn remangled_tree_demangles_identically() {
    for &symbol in SYMBOLS {
        let tree = demangle_symbol(symbol).unwrap();
        assert_eq!(demangle_symbol(mangle(&tree)).unwrap(), tree, "{symbol}");
    }
}

#[test]
fn alternate_prefixes_remangle_to_canonical() {
    let tree = demangle_symbol("_T04main3fooyyF").unwrap();
    assert_eq!(mangle(&tree), "$s4main3fooyyF");
}

#[test]
fn thunk_classification_matches_tree() {
    for &symbol in SYMBOLS {
        let tree = demangle_symbol(symbol).unwrap();
        let first = tree.children[0].kind;
        let is_thunk_kind = matches!(
            first,
            NodeKind::ObjCAttribute | NodeKind::PartialApplyForwarder
        );
        assert_eq!(classify::is_thunk_symbol(symbol), is_thunk_kind, "{symbol}");
    }
}

#[test]
fn reabstraction_thunk_has_no_target() {
    assert!(classify::is_thunk_symbol("$sSiSSTR"));
    assert_eq!(classify::thunk_target("$sSiSSTR"), None);
}
