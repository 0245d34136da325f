use pretty_assertions::assert_eq;

use super::*;
use crate::types::{BoundGenericType, BuiltinType, GenericParam, NominalDecl, NominalKind};

struct TypeParameters;

impl InterestingKeys for TypeParameters {
    fn is_interesting_type(&self, ty: &AType) -> bool {
        is_interesting_type_for_fulfillments(ty)
    }

    fn superclass_bound(&self, _ty: &AType) -> Option<AType> {
        None
    }
}

fn t() -> AType {
    AType::GenericParam(GenericParam::new(0, 0))
}

fn path_of_cost(loads: usize) -> MetadataPath {
    let mut path = MetadataPath::new();
    for index in 0..loads {
        path.add_nominal_type_argument(index);
    }
    path
}

// ── add_fulfillment ─────────────────────────────────────────────────

#[test]
fn first_fulfillment_is_recorded() {
    let mut map = FulfillmentMap::new();
    assert!(map.add_fulfillment(
        FulfillmentKey::metadata(t()),
        0,
        MetadataPath::new(),
        MetadataState::Complete
    ));
    assert_eq!(map.len(), 1);
    assert_eq!(map.type_metadata(&t()).map(|f| f.source), Some(0));
}

#[test]
fn cheaper_path_replaces_at_same_state() {
    let mut map = FulfillmentMap::new();
    let key = FulfillmentKey::metadata(t());
    assert!(map.add_fulfillment(key.clone(), 0, path_of_cost(2), MetadataState::Complete));
    assert!(map.add_fulfillment(key.clone(), 1, path_of_cost(1), MetadataState::Complete));
    assert!(!map.add_fulfillment(key, 2, path_of_cost(1), MetadataState::Complete));

    let fulfillment = map.type_metadata(&t()).unwrap();
    assert_eq!(fulfillment.source, 1);
    assert_eq!(fulfillment.path.cost(), 3);
}

#[test]
fn less_complete_state_never_replaces() {
    let mut map = FulfillmentMap::new();
    let key = FulfillmentKey::metadata(t());
    map.add_fulfillment(key.clone(), 0, path_of_cost(3), MetadataState::Complete);
    assert!(!map.add_fulfillment(key, 1, MetadataPath::new(), MetadataState::Abstract));
    assert_eq!(map.type_metadata(&t()).unwrap().source, 0);
}

#[test]
fn more_complete_state_replaces_and_is_kept() {
    let mut map = FulfillmentMap::new();
    let key = FulfillmentKey::metadata(t());
    map.add_fulfillment(key.clone(), 0, MetadataPath::new(), MetadataState::LayoutComplete);
    assert!(map.add_fulfillment(key, 1, path_of_cost(4), MetadataState::Complete));

    let fulfillment = map.type_metadata(&t()).unwrap();
    assert_eq!(fulfillment.source, 1);
    assert_eq!(fulfillment.state, MetadataState::Complete);
}

#[test]
fn witness_tables_are_keyed_by_protocol() {
    let mut map = FulfillmentMap::new();
    let hashable = ProtocolDecl::new("Swift", "Hashable");
    map.add_fulfillment(
        FulfillmentKey::witness_table(t(), hashable.clone()),
        0,
        MetadataPath::new(),
        MetadataState::Complete,
    );
    assert!(map.witness_table(&t(), &hashable).is_some());
    assert!(map.witness_table(&t(), &ProtocolDecl::new("Swift", "Equatable")).is_none());
    assert!(map.type_metadata(&t()).is_none());
}

// ── search_type_metadata ────────────────────────────────────────────

#[test]
fn exact_type_parameter_is_fulfilled() {
    let mut map = FulfillmentMap::new();
    let found = map.search_type_metadata(
        &t(),
        true,
        MetadataState::Complete,
        0,
        &MetadataPath::new(),
        &TypeParameters,
    );
    assert!(found);
    assert!(map.type_metadata(&t()).unwrap().path.is_empty());
}

#[test]
fn inexact_metadata_fulfills_nothing() {
    let mut map = FulfillmentMap::new();
    let found = map.search_type_metadata(
        &t(),
        false,
        MetadataState::Complete,
        0,
        &MetadataPath::new(),
        &TypeParameters,
    );
    assert!(!found);
    assert!(map.is_empty());
}

#[test]
fn concrete_types_are_not_interesting() {
    let mut map = FulfillmentMap::new();
    let int = AType::Builtin(BuiltinType::Integer(64));
    assert!(!map.search_type_metadata(
        &int,
        true,
        MetadataState::Complete,
        0,
        &MetadataPath::new(),
        &TypeParameters
    ));
    assert!(map.is_empty());
}

#[test]
fn exact_bound_generic_records_itself() {
    let mut map = FulfillmentMap::new();
    let array_of_t = AType::BoundGeneric(BoundGenericType {
        decl: NominalDecl::new(NominalKind::Struct, "Swift", "Array"),
        args: vec![t()],
    });
    assert!(map.search_type_metadata(
        &array_of_t,
        true,
        MetadataState::Complete,
        3,
        &MetadataPath::new(),
        &TypeParameters
    ));
    assert_eq!(map.type_metadata(&array_of_t).map(|f| f.source), Some(3));
    assert!(map.type_metadata(&t()).is_none());
}

// ── Leaf metadata ───────────────────────────────────────────────────

#[test]
fn leaf_types() {
    assert!(is_leaf_type_metadata(&t()));
    assert!(is_leaf_type_metadata(&AType::void()));
    assert!(is_leaf_type_metadata(&AType::Builtin(BuiltinType::RawPointer)));
    assert!(!is_leaf_type_metadata(&AType::Tuple(vec![t(), t()])));
    assert!(!is_leaf_type_metadata(&AType::BoundGeneric(BoundGenericType {
        decl: NominalDecl::new(NominalKind::Enum, "Swift", "Optional"),
        args: vec![t()],
    })));
}

#[test]
#[should_panic(expected = "no metadata to search")]
fn module_types_have_no_metadata() {
    is_leaf_type_metadata(&AType::Module("Swift".to_owned()));
}
