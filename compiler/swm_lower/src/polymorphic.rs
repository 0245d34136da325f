//! Generic context passed to polymorphic functions.
//!
//! A polymorphic function receives metadata and witness tables for its
//! generic requirements as trailing arguments. Before listing them,
//! [`PolymorphicConvention`] looks at the other parameters for metadata
//! sources (the class of `self`, a thick metatype argument, the `Self`
//! of a witness method) and drops every requirement those already
//! fulfill.
//!
//! # References
//!
//! - Swift `lib/IRGen/GenProto.cpp` (`PolymorphicConvention`,
//!   `ExpandPolymorphicSignature`)

use swm_demangle::MetadataState;

use crate::error::{fatal, not_implemented, Result};
use crate::fulfillment::{
    is_interesting_type_for_fulfillments, FulfillmentKey, FulfillmentMap, InterestingKeys,
};
use crate::machine::MachineType;
use crate::metadata_path::MetadataPath;
use crate::types::{
    enumerate_generic_requirements, AType, GenericRequirement, GenericSignature,
    MetatypeRepresentation, ParameterConvention, SilFunctionType, SilFunctionTypeRepresentation,
};

/// Where a metadata source comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetadataSourceKind {
    /// The isa pointer of a class instance parameter.
    ClassPointer,
    /// A thick metatype parameter.
    Metadata,
    /// Metadata passed alongside an indirect `self`, as an extra argument.
    GenericLValueMetadata,
    /// `Self` metadata trailing a witness method.
    SelfMetadata,
    /// `Self` witness table trailing a witness method.
    SelfWitnessTable,
}

impl MetadataSourceKind {
    /// Sources read from a formal parameter know which one.
    pub fn requires_source_index(self) -> bool {
        matches!(
            self,
            MetadataSourceKind::ClassPointer
                | MetadataSourceKind::Metadata
                | MetadataSourceKind::GenericLValueMetadata
        )
    }
}

/// A value the callee can recover generic context from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataSource {
    pub kind: MetadataSourceKind,
    /// Formal parameter the source is read from.
    pub index: Option<usize>,
    /// The type whose metadata the source provides.
    pub ty: AType,
}

impl MetadataSource {
    pub fn new(kind: MetadataSourceKind, index: Option<usize>, ty: AType) -> Self {
        if kind.requires_source_index() && index.is_none() {
            fatal(&format!("{kind:?} metadata source needs a parameter index"));
        }
        MetadataSource { kind, index, ty }
    }
}

struct SignatureKeys<'a> {
    generics: Option<&'a GenericSignature>,
}

impl InterestingKeys for SignatureKeys<'_> {
    fn is_interesting_type(&self, ty: &AType) -> bool {
        is_interesting_type_for_fulfillments(ty)
    }

    fn superclass_bound(&self, ty: &AType) -> Option<AType> {
        self.generics?.superclass_bound(ty).cloned()
    }
}

/// Metadata sources of one polymorphic function and the requirements
/// they fulfill.
pub struct PolymorphicConvention<'a> {
    function: &'a SilFunctionType,
    sources: Vec<MetadataSource>,
    fulfillments: FulfillmentMap,
}

impl<'a> PolymorphicConvention<'a> {
    pub fn new(function: &'a SilFunctionType) -> Result<Self> {
        if function.is_pseudogeneric {
            return Err(not_implemented!("pseudogeneric functions"));
        }
        let mut convention = PolymorphicConvention {
            function,
            sources: Vec::new(),
            fulfillments: FulfillmentMap::new(),
        };
        if function.representation == SilFunctionTypeRepresentation::WitnessMethod {
            convention.consider_witness_self();
        } else {
            let params = &function.params;
            if function.has_self_param() && !params.is_empty() {
                convention.consider_parameter(params.len() - 1, true);
                for index in 0..params.len() - 1 {
                    convention.consider_parameter(index, false);
                }
            } else {
                for index in 0..params.len() {
                    convention.consider_parameter(index, false);
                }
            }
        }
        tracing::trace!(
            sources = convention.sources.len(),
            fulfilled = convention.fulfillments.len(),
            "polymorphic convention"
        );
        Ok(convention)
    }

    pub fn sources(&self) -> &[MetadataSource] {
        &self.sources
    }

    pub fn fulfillments(&self) -> &FulfillmentMap {
        &self.fulfillments
    }

    /// Every generic requirement of the function, in argument order.
    pub fn requirements(&self) -> Vec<GenericRequirement> {
        enumerate_generic_requirements(self.function.generic_signature.as_ref())
    }

    /// Requirements no metadata source fulfills; each is passed as its
    /// own argument.
    pub fn unfulfilled_requirements(&self) -> Vec<GenericRequirement> {
        self.requirements()
            .into_iter()
            .filter(|requirement| {
                let fulfilled = match &requirement.protocol {
                    Some(protocol) => self
                        .fulfillments
                        .witness_table(&requirement.type_parameter, protocol)
                        .is_some(),
                    None => self
                        .fulfillments
                        .type_metadata(&requirement.type_parameter)
                        .is_some(),
                };
                !fulfilled
            })
            .collect()
    }

    fn keys(&self) -> SignatureKeys<'a> {
        SignatureKeys {
            generics: self.function.generic_signature.as_ref(),
        }
    }

    fn consider_witness_self(&mut self) {
        let Some(self_type) = self.function.self_instance_type().cloned() else {
            fatal("witness method without a self parameter");
        };
        let Some(conformance) = self.function.witness_method_conformance.clone() else {
            fatal("witness method without a conformance");
        };

        self.sources.push(MetadataSource::new(
            MetadataSourceKind::SelfMetadata,
            None,
            self_type.clone(),
        ));
        let source = self.sources.len() - 1;
        if matches!(self_type, AType::GenericParam(_)) {
            self.fulfillments.add_fulfillment(
                FulfillmentKey::metadata(self_type.clone()),
                source,
                MetadataPath::new(),
                MetadataState::Complete,
            );
        }
        self.consider_type(&self_type, false, source, &MetadataPath::new());

        self.sources.push(MetadataSource::new(
            MetadataSourceKind::SelfWitnessTable,
            None,
            self_type.clone(),
        ));
        let source = self.sources.len() - 1;
        self.fulfillments.add_fulfillment(
            FulfillmentKey::witness_table(self_type, conformance.protocol.clone()),
            source,
            MetadataPath::new(),
            MetadataState::Complete,
        );
        if conformance.is_concrete() {
            let keys = self.keys();
            self.fulfillments
                .search_conformance(&conformance, source, &MetadataPath::new(), &keys);
        }
    }

    fn consider_parameter(&mut self, index: usize, is_self: bool) {
        let function = self.function;
        let param = &function.params[index];
        let ty = param.ty.clone();
        match param.convention {
            ParameterConvention::IndirectIn
            | ParameterConvention::IndirectInConstant
            | ParameterConvention::IndirectInGuaranteed
            | ParameterConvention::IndirectInout
            | ParameterConvention::IndirectInoutAliasable => {
                if is_self && matches!(ty, AType::Nominal(_) | AType::BoundGeneric(_)) {
                    self.consider_new_type_source(
                        MetadataSourceKind::GenericLValueMetadata,
                        index,
                        ty,
                        true,
                    );
                }
            }
            ParameterConvention::DirectOwned
            | ParameterConvention::DirectUnowned
            | ParameterConvention::DirectGuaranteed => {
                if ty.is_class_or_bound_generic_class() {
                    self.consider_new_type_source(
                        MetadataSourceKind::ClassPointer,
                        index,
                        ty,
                        false,
                    );
                    return;
                }
                if matches!(ty, AType::GenericParam(_)) {
                    if let Some(superclass) = self.keys().superclass_bound(&ty) {
                        self.consider_new_type_source(
                            MetadataSourceKind::ClassPointer,
                            index,
                            superclass,
                            false,
                        );
                    }
                    return;
                }
                if let AType::Metatype(metatype) = &ty {
                    if metatype.representation == Some(MetatypeRepresentation::Thick)
                        && metatype.instance.is_class_or_bound_generic_class()
                    {
                        self.consider_new_type_source(
                            MetadataSourceKind::Metadata,
                            index,
                            (*metatype.instance).clone(),
                            false,
                        );
                    }
                }
            }
        }
    }

    /// Adds a source for `ty` if it fulfills anything; otherwise leaves
    /// the source list untouched.
    fn consider_new_type_source(
        &mut self,
        kind: MetadataSourceKind,
        index: usize,
        ty: AType,
        is_exact: bool,
    ) {
        if !is_interesting_type_for_fulfillments(&ty) {
            return;
        }
        self.sources.push(MetadataSource::new(kind, Some(index), ty.clone()));
        let source = self.sources.len() - 1;
        if !self.consider_type(&ty, is_exact, source, &MetadataPath::new()) {
            self.sources.pop();
        }
    }

    fn consider_type(
        &mut self,
        ty: &AType,
        is_exact: bool,
        source: usize,
        path: &MetadataPath,
    ) -> bool {
        let keys = self.keys();
        self.fulfillments
            .search_type_metadata(ty, is_exact, MetadataState::Complete, source, path, &keys)
    }
}

/// The extra pointer arguments of a polymorphic function: metadata for
/// each indirect generic `self`, then one per unfulfilled requirement.
pub fn expand_polymorphic_signature(function: &SilFunctionType) -> Result<Vec<MachineType>> {
    let convention = PolymorphicConvention::new(function)?;
    let lvalue_sources = convention
        .sources()
        .iter()
        .filter(|source| source.kind == MetadataSourceKind::GenericLValueMetadata)
        .count();
    let unfulfilled = convention.unfulfilled_requirements().len();
    Ok(vec![MachineType::Pointer; lvalue_sources + unfulfilled])
}

#[cfg(test)]
mod tests;
