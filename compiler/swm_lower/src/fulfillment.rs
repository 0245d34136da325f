//! Which generic requirements the caller's arguments already satisfy.
//!
//! A polymorphic function needs metadata for its type parameters and
//! witness tables for their conformances. Some of these can be recovered
//! from values the caller passes anyway, such as the metadata of `self`.
//! A [`FulfillmentMap`] records, per requirement, the cheapest known way
//! to recover it so the signature only carries the rest.
//!
//! # References
//!
//! - Swift `lib/IRGen/Fulfillment.cpp` (`FulfillmentMap`)

use rustc_hash::FxHashMap;
use swm_demangle::MetadataState;

use crate::error::fatal;
use crate::metadata_path::MetadataPath;
use crate::types::{AType, ProtocolConformanceRef, ProtocolDecl, TypeKind};

/// A requirement: metadata for `ty`, or its witness table for `protocol`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FulfillmentKey {
    pub ty: AType,
    pub protocol: Option<ProtocolDecl>,
}

impl FulfillmentKey {
    pub fn metadata(ty: AType) -> Self {
        FulfillmentKey { ty, protocol: None }
    }

    pub fn witness_table(ty: AType, protocol: ProtocolDecl) -> Self {
        FulfillmentKey {
            ty,
            protocol: Some(protocol),
        }
    }
}

/// How to recover one requirement from a metadata source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fulfillment {
    /// Index of the source in the convention's source list.
    pub source: usize,
    pub path: MetadataPath,
    /// How initialized the recovered metadata is guaranteed to be.
    pub state: MetadataState,
}

/// What a search is looking for.
pub trait InterestingKeys {
    /// Whether metadata for `ty` is worth recording.
    fn is_interesting_type(&self, ty: &AType) -> bool;

    /// The class bound of a type parameter, if it has one.
    fn superclass_bound(&self, ty: &AType) -> Option<AType>;
}

/// Fulfillments found so far, at most one per key.
#[derive(Clone, Debug, Default)]
pub struct FulfillmentMap {
    fulfillments: FxHashMap<FulfillmentKey, Fulfillment>,
}

impl FulfillmentMap {
    pub fn new() -> Self {
        FulfillmentMap::default()
    }

    pub fn len(&self) -> usize {
        self.fulfillments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fulfillments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FulfillmentKey, &Fulfillment)> {
        self.fulfillments.iter()
    }

    pub fn type_metadata(&self, ty: &AType) -> Option<&Fulfillment> {
        self.fulfillments.get(&FulfillmentKey::metadata(ty.clone()))
    }

    pub fn witness_table(&self, ty: &AType, protocol: &ProtocolDecl) -> Option<&Fulfillment> {
        self.fulfillments
            .get(&FulfillmentKey::witness_table(ty.clone(), protocol.clone()))
    }

    /// Records a way to recover `key`. An existing entry is replaced only
    /// by a more complete state, or by a cheaper path at the same state.
    /// Returns whether the map changed.
    pub fn add_fulfillment(
        &mut self,
        key: FulfillmentKey,
        source: usize,
        path: MetadataPath,
        state: MetadataState,
    ) -> bool {
        if let Some(existing) = self.fulfillments.get_mut(&key) {
            if !state.is_at_least(existing.state) {
                return false;
            }
            if state == existing.state && path.cost() >= existing.path.cost() {
                return false;
            }
            tracing::trace!(ty = %key.ty, source, path = %path, "replaced fulfillment");
            *existing = Fulfillment {
                source,
                path,
                state,
            };
            return true;
        }
        tracing::trace!(ty = %key.ty, source, path = %path, "new fulfillment");
        self.fulfillments.insert(
            key,
            Fulfillment {
                source,
                path,
                state,
            },
        );
        true
    }

    /// Records everything recoverable from metadata for `ty` reached by
    /// `path`. `is_exact` says the metadata is for `ty` itself rather than
    /// possibly a subclass. Returns whether anything was recorded.
    pub fn search_type_metadata(
        &mut self,
        ty: &AType,
        is_exact: bool,
        state: MetadataState,
        source: usize,
        path: &MetadataPath,
        keys: &dyn InterestingKeys,
    ) -> bool {
        let interesting = keys.is_interesting_type(ty);
        if is_exact && interesting {
            let mut found = false;
            if !is_leaf_type_metadata(ty) {
                found |= self.search_type_metadata(ty, false, state, source, path, keys);
            }
            if state == MetadataState::Complete {
                if let Some(superclass) = keys.superclass_bound(ty) {
                    found |=
                        self.search_nominal_type_metadata(&superclass, state, source, path, keys);
                }
            }
            found |= self.add_fulfillment(
                FulfillmentKey::metadata(ty.clone()),
                source,
                path.clone(),
                state,
            );
            return found;
        }

        if state == MetadataState::Complete && interesting {
            if let Some(superclass) = keys.superclass_bound(ty) {
                return self.search_nominal_type_metadata(&superclass, state, source, path, keys);
            }
        }

        match ty {
            AType::Nominal(_) | AType::BoundGeneric(_) => {
                self.search_nominal_type_metadata(ty, state, source, path, keys)
            }
            _ => false,
        }
    }

    /// Looks through the generic arguments of a nominal type's metadata.
    /// Argument layouts are not read yet, so nothing is ever found.
    #[allow(clippy::unused_self, reason = "argument walk not read from metadata yet")]
    pub fn search_nominal_type_metadata(
        &mut self,
        ty: &AType,
        _state: MetadataState,
        _source: usize,
        _path: &MetadataPath,
        _keys: &dyn InterestingKeys,
    ) -> bool {
        tracing::trace!(ty = %ty, "nominal metadata search skipped");
        false
    }

    /// Looks through the associated conformances of a witness table.
    /// Like nominal search, this finds nothing yet.
    #[allow(clippy::unused_self, reason = "witness table walk not read from metadata yet")]
    pub fn search_conformance(
        &mut self,
        conformance: &ProtocolConformanceRef,
        _source: usize,
        _path: &MetadataPath,
        _keys: &dyn InterestingKeys,
    ) -> bool {
        tracing::trace!(protocol = %conformance.protocol, "conformance search skipped");
        false
    }
}

/// Whether metadata for `ty` could ever fulfill a requirement.
pub fn is_interesting_type_for_fulfillments(ty: &AType) -> bool {
    ty.has_type_parameter()
}

/// Whether metadata for `ty` has no structure worth searching below it.
pub fn is_leaf_type_metadata(ty: &AType) -> bool {
    match ty {
        AType::Tuple(elements) => return elements.is_empty(),
        AType::GenericParam(_) | AType::DependentMember(_) | AType::Builtin(_) => return true,
        _ => {}
    }
    match ty.kind() {
        TypeKind::Struct | TypeKind::Enum | TypeKind::Class | TypeKind::Protocol => true,
        TypeKind::BoundGenericStruct
        | TypeKind::BoundGenericEnum
        | TypeKind::BoundGenericClass
        | TypeKind::Function
        | TypeKind::GenericFunction
        | TypeKind::ProtocolComposition
        | TypeKind::Metatype
        | TypeKind::ExistentialMetatype => false,
        kind => fatal(&format!("{kind:?} types have no metadata to search")),
    }
}

#[cfg(test)]
mod tests;
