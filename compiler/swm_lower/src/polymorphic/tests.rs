use pretty_assertions::assert_eq;

use super::*;
use crate::error::LoweringError;
use crate::types::{
    BoundGenericType, GenericParam, NominalDecl, NominalKind, ProtocolConformanceRef,
    ProtocolDecl, Requirement, SilParameterInfo,
};

fn t() -> AType {
    AType::GenericParam(GenericParam::new(0, 0))
}

fn p() -> ProtocolDecl {
    ProtocolDecl::new("main", "P")
}

fn signature_t_p() -> GenericSignature {
    GenericSignature {
        params: vec![GenericParam::new(0, 0)],
        requirements: vec![Requirement::Conformance {
            subject: t(),
            protocol: p(),
        }],
    }
}

fn generic_function(
    representation: SilFunctionTypeRepresentation,
    params: Vec<SilParameterInfo>,
) -> SilFunctionType {
    SilFunctionType {
        generic_signature: Some(signature_t_p()),
        ..SilFunctionType::new(representation, params, Vec::new())
    }
}

// ── Sources ─────────────────────────────────────────────────────────

#[test]
fn free_function_passes_every_requirement() {
    let function = generic_function(
        SilFunctionTypeRepresentation::Thin,
        vec![SilParameterInfo::new(t(), ParameterConvention::IndirectInGuaranteed)],
    );
    let convention = PolymorphicConvention::new(&function).unwrap();

    assert!(convention.sources().is_empty());
    assert_eq!(
        convention.unfulfilled_requirements(),
        vec![
            GenericRequirement {
                type_parameter: t(),
                protocol: None,
            },
            GenericRequirement {
                type_parameter: t(),
                protocol: Some(p()),
            },
        ]
    );
    assert_eq!(expand_polymorphic_signature(&function).unwrap().len(), 2);
}

#[test]
fn indirect_generic_self_is_an_lvalue_source() {
    let array_of_t = AType::BoundGeneric(BoundGenericType {
        decl: NominalDecl::new(NominalKind::Struct, "Swift", "Array"),
        args: vec![t()],
    });
    let function = generic_function(
        SilFunctionTypeRepresentation::Method,
        vec![SilParameterInfo::new(array_of_t.clone(), ParameterConvention::IndirectInout)],
    );
    let convention = PolymorphicConvention::new(&function).unwrap();

    assert_eq!(
        convention.sources(),
        &[MetadataSource::new(
            MetadataSourceKind::GenericLValueMetadata,
            Some(0),
            array_of_t,
        )]
    );
    // The source itself, then T and its conformance.
    assert_eq!(
        expand_polymorphic_signature(&function).unwrap(),
        vec![MachineType::Pointer; 3]
    );
}

#[test]
fn concrete_class_parameters_are_not_sources() {
    let class = AType::Nominal(crate::types::NominalType {
        decl: NominalDecl::new(NominalKind::Class, "main", "C"),
        metadata: crate::types::MetadataId(7),
        case_count: None,
    });
    let function = generic_function(
        SilFunctionTypeRepresentation::Thin,
        vec![
            SilParameterInfo::new(class, ParameterConvention::DirectGuaranteed),
            SilParameterInfo::new(t(), ParameterConvention::IndirectIn),
        ],
    );
    let convention = PolymorphicConvention::new(&function).unwrap();
    assert!(convention.sources().is_empty());
    assert_eq!(convention.unfulfilled_requirements().len(), 2);
}

#[test]
fn witness_self_fulfills_its_own_requirements() {
    let function = SilFunctionType {
        witness_method_conformance: Some(ProtocolConformanceRef {
            protocol: p(),
            conforming_type: None,
        }),
        ..generic_function(
            SilFunctionTypeRepresentation::WitnessMethod,
            vec![SilParameterInfo::new(t(), ParameterConvention::IndirectInGuaranteed)],
        )
    };
    let convention = PolymorphicConvention::new(&function).unwrap();

    let kinds: Vec<_> = convention.sources().iter().map(|source| source.kind).collect();
    assert_eq!(
        kinds,
        vec![MetadataSourceKind::SelfMetadata, MetadataSourceKind::SelfWitnessTable]
    );
    assert_eq!(convention.fulfillments().len(), 2);
    assert!(convention.unfulfilled_requirements().is_empty());
    assert!(expand_polymorphic_signature(&function).unwrap().is_empty());
}

#[test]
#[should_panic(expected = "without a conformance")]
fn witness_method_needs_a_conformance() {
    let function = generic_function(
        SilFunctionTypeRepresentation::WitnessMethod,
        vec![SilParameterInfo::new(t(), ParameterConvention::IndirectInGuaranteed)],
    );
    let _ = PolymorphicConvention::new(&function);
}

#[test]
fn pseudogeneric_functions_are_not_supported() {
    let function = SilFunctionType {
        is_pseudogeneric: true,
        ..generic_function(SilFunctionTypeRepresentation::Thin, Vec::new())
    };
    assert!(matches!(
        expand_polymorphic_signature(&function),
        Err(LoweringError::NotImplemented(_))
    ));
}

#[test]
#[should_panic(expected = "needs a parameter index")]
fn parameter_sources_need_an_index() {
    let _ = MetadataSource::new(MetadataSourceKind::ClassPointer, None, t());
}
