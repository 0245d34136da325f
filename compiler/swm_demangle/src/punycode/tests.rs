use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

#[test]
fn symbol_chars() {
    assert!(!needs_punycode("Hello_world$2"));
    assert!(needs_punycode("a+b"));
    assert!(needs_punycode("café"));
}

#[test]
fn encodes_mixed_scripts() {
    let input = "Привіт! 这样啊！那吃鱼吧。鱼可是你伯母的拿手菜 😄 الى اللقاء";
    let expected = "rAaCbrFamDjrDlmbaaABawabaGetHAGgrAsegzarHEdnlagzGDrCmBgosdBGzeomosxosCeqEGdgfvdIdfcxEicaHBCADcsaadnGECJJabDIEe";
    let encoded = encode(input, true);
    assert_eq!(encoded.as_deref(), Some(expected));
    assert_eq!(decode(expected).as_deref(), Some(input));
}

#[test]
fn basic_prefix_is_kept_before_delimiter() {
    let encoded = encode("abé", true).unwrap_or_default();
    assert!(encoded.starts_with("ab_"), "{encoded}");
    assert_eq!(decode(&encoded).as_deref(), Some("abé"));
}

#[test]
fn unmapped_ascii_is_copied() {
    let encoded = encode("a+", false);
    assert_eq!(encoded.as_deref(), Some("a+_"));
}

#[test]
fn rejects_invalid_digits() {
    assert_eq!(decode("a_9"), None);
    assert_eq!(decode("Z"), None);
}

#[test]
fn rejects_non_basic_prefix() {
    assert_eq!(decode("é_a"), None);
}

proptest! {
    #[test]
    fn round_trips_any_string(input in "\\PC{0,24}") {
        let encoded = encode(&input, true);
        prop_assert!(encoded.is_some());
        let encoded = encoded.unwrap_or_default();
        prop_assert!(encoded.chars().all(is_valid_symbol_char));
        prop_assert_eq!(decode(&encoded), Some(input));
    }
}
