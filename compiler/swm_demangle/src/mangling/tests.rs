use pretty_assertions::assert_eq;

use super::*;

fn mangle_all(idents: &[&str]) -> String {
    let mut buffer = String::new();
    let mut words = Vec::new();
    for ident in idents {
        mangle_identifier(ident, &mut buffer, &mut words, 26);
    }
    buffer
}

// ── Identifiers ─────────────────────────────────────────────────

#[test]
fn plain_identifier_is_length_prefixed() {
    assert_eq!(mangle_all(&["foo"]), "3foo");
}

#[test]
fn repeated_word_is_substituted() {
    // "Foo" is recorded from the first identifier and referenced by the last
    // replacement letter, followed by `0` since it ends the identifier.
    assert_eq!(mangle_all(&["Foo", "BarFoo"]), "3Foo03BarA0");
}

#[test]
fn words_inside_one_identifier_are_reused() {
    assert_eq!(mangle_all(&["foo_foo"]), "04foo_A0");
}

#[test]
fn non_symbol_identifier_uses_punycode() {
    let mangled = mangle_all(&["café"]);
    assert!(mangled.starts_with("00"), "{mangled}");
}

#[test]
fn word_boundaries() {
    assert!(is_word_start(b'a'));
    assert!(!is_word_start(b'1'));
    assert!(!is_word_start(b'_'));
    assert!(is_word_end(b'B', b'a'));
    assert!(!is_word_end(b'B', b'A'));
    assert!(is_word_end(b'_', b'a'));
}

// ── Operators ───────────────────────────────────────────────────

#[test]
fn operator_translation_round_trips() {
    for op in "&@/=><*!|+?%-~^.".chars() {
        let letter = translate_operator_char(op);
        assert_eq!(operator_char_for_letter(letter), Some(op));
    }
    assert_eq!(translate_operator("+="), "pe");
    assert_eq!(operator_char_for_letter('b'), None);
}

// ── Standard substitutions ──────────────────────────────────────

#[test]
fn standard_substitution_table() {
    assert_eq!(standard_type_substitution("Int"), Some(b'i'));
    assert_eq!(standard_type_substitution("Nope"), None);
    assert_eq!(
        standard_type_for_letter(b'q'),
        Some(("Optional", NodeKind::Enum))
    );
    assert_eq!(
        standard_type_for_letter(b'Q'),
        Some(("Equatable", NodeKind::Protocol))
    );
    assert_eq!(standard_type_for_letter(b'g'), None);
}

#[test]
fn merging_same_and_different_substitutions() {
    let mut merging = SubstitutionMerging::default();
    let mut buffer = String::from("x");

    assert!(!merging.try_merge(b'B', false, &mut buffer));
    buffer.push_str("AB");
    assert!(merging.try_merge(b'B', false, &mut buffer));
    assert_eq!(buffer, "xA2B");
    assert!(merging.try_merge(b'B', false, &mut buffer));
    assert_eq!(buffer, "xA3B");

    let mut merging = SubstitutionMerging::default();
    let mut buffer = String::from("x");
    assert!(!merging.try_merge(b'B', false, &mut buffer));
    buffer.push_str("AB");
    assert!(merging.try_merge(b'C', false, &mut buffer));
    assert_eq!(buffer, "xAbC");
}

#[test]
fn standard_substitutions_only_merge_when_equal() {
    let mut merging = SubstitutionMerging::default();
    let mut buffer = String::from("x");
    assert!(!merging.try_merge(b'i', true, &mut buffer));
    buffer.push_str("Si");
    assert!(!merging.try_merge(b'S', true, &mut buffer));
}

// ── Misc ────────────────────────────────────────────────────────

#[test]
fn prefixes() {
    assert_eq!(mangling_prefix_length(b"$s3foo"), 2);
    assert_eq!(mangling_prefix_length(b"_$s3foo"), 3);
    assert_eq!(mangling_prefix_length(b"_T03foo"), 3);
    assert_eq!(mangling_prefix_length(b"foo"), 0);
}

#[test]
fn generic_parameter_names() {
    assert_eq!(generic_parameter_name(0, 0), "A");
    assert_eq!(generic_parameter_name(0, 1), "B");
    assert_eq!(generic_parameter_name(1, 0), "A1");
    assert_eq!(generic_parameter_name(0, 26), "AB");
}

#[test]
fn closures_do_not_consume_generic_args() {
    assert!(node_consumes_generic_args(NodeKind::Function));
    assert!(!node_consumes_generic_args(NodeKind::ExplicitClosure));
}
