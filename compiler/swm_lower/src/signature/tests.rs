use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::*;
use crate::config::TargetConfig;
use crate::error::LoweringError;
use crate::machine::ParamAttrs;
use crate::metadata::{MetadataReader, StaticMetadata};
use crate::types::{
    AType, BuiltinType, CoroutineKind, ExistentialType, GenericParam, GenericSignature,
    ParameterConvention, ProtocolConformanceRef, ProtocolDecl, Requirement, ResultConvention,
    SilFunctionTypeRepresentation, SilParameterInfo, SilResultInfo,
};

fn int() -> AType {
    AType::Builtin(BuiltinType::Integer(64))
}

fn t() -> AType {
    AType::GenericParam(GenericParam::new(0, 0))
}

fn direct(ty: AType) -> SilParameterInfo {
    SilParameterInfo::new(ty, ParameterConvention::DirectUnowned)
}

fn unowned(ty: AType) -> SilResultInfo {
    SilResultInfo::new(ty, ResultConvention::Unowned)
}

fn thin(params: Vec<SilParameterInfo>, results: Vec<SilResultInfo>) -> SilFunctionType {
    SilFunctionType::new(SilFunctionTypeRepresentation::Thin, params, results)
}

fn expand(metadata: &StaticMetadata, function: &SilFunctionType) -> Rc<IrSignature> {
    IrTypeConverter::new(metadata, TargetConfig::default())
        .signature(function)
        .unwrap()
}

fn ranges(signature: &IrSignature) -> Vec<Range<usize>> {
    signature
        .mappings()
        .iter()
        .map(|mapping| mapping.range.clone())
        .collect()
}

// ── Direct values ───────────────────────────────────────────────────

#[test]
fn scalars_are_passed_and_returned_directly() {
    let metadata = StaticMetadata::new();
    let function = thin(vec![direct(int()), direct(int())], vec![unowned(int())]);
    let signature = expand(&metadata, &function);

    assert_eq!(signature.function_type.to_string(), "i64 (i64, i64)");
    assert_eq!(signature.calling_conv, CallingConv::Swift);
    assert_eq!(ranges(&signature), vec![0..1, 1..2]);
    assert_eq!(signature.result_mapping().ranges, vec![0..1]);
    assert!(!signature.uses_sret());
    assert!(!signature.requires_indirect(0));
}

#[test]
fn tuples_explode_into_their_scalars() {
    let metadata = StaticMetadata::new();
    let pair = AType::Tuple(vec![int(), AType::Builtin(BuiltinType::Float(64))]);
    let function = thin(vec![direct(pair.clone())], vec![unowned(pair)]);
    let signature = expand(&metadata, &function);

    assert_eq!(
        signature.function_type.result,
        MachineType::Struct(vec![MachineType::I64, MachineType::Double])
    );
    assert_eq!(
        signature.function_type.params,
        vec![MachineType::I64, MachineType::Double]
    );
    assert_eq!(signature.range_of_ir_parameters(0), 0..2);
}

// ── Indirect results ────────────────────────────────────────────────

#[test]
fn large_results_use_sret() {
    let metadata = StaticMetadata::new();
    let large = AType::Tuple(vec![int(); 5]);
    let function = thin(vec![direct(int())], vec![unowned(large)]);
    let signature = expand(&metadata, &function);

    assert_eq!(signature.function_type.result, MachineType::Void);
    assert_eq!(
        signature.function_type.params,
        vec![MachineType::Pointer, MachineType::I64]
    );
    assert!(signature.uses_sret());
    assert!(signature.requires_indirect_result());
    assert_eq!(ranges(&signature), vec![1..2]);
}

#[test]
fn only_a_single_indirect_result_is_sret() {
    let metadata = StaticMetadata::new();
    let indirect = |ty| SilResultInfo::new(ty, ResultConvention::Indirect);
    let one = thin(Vec::new(), vec![indirect(t())]);
    let two = thin(Vec::new(), vec![indirect(t()), indirect(t())]);

    assert!(expand(&metadata, &one).uses_sret());
    let signature = expand(&metadata, &two);
    assert!(!signature.uses_sret());
    assert_eq!(signature.function_type.params.len(), 2);
}

#[test]
fn direct_results_disable_sret() {
    let metadata = StaticMetadata::new();
    let function = thin(
        Vec::new(),
        vec![SilResultInfo::new(t(), ResultConvention::Indirect), unowned(int())],
    );
    let signature = expand(&metadata, &function);
    assert!(!signature.uses_sret());
    assert_eq!(signature.function_type.result, MachineType::I64);
    assert_eq!(signature.function_type.params, vec![MachineType::Pointer]);
}

// ── Context, self and errors ────────────────────────────────────────

#[test]
fn thick_functions_take_their_context_last() {
    let metadata = StaticMetadata::new();
    let function = SilFunctionType::new(
        SilFunctionTypeRepresentation::Thick,
        vec![direct(int())],
        Vec::new(),
    );
    let signature = expand(&metadata, &function);

    assert_eq!(
        signature.function_type.params,
        vec![MachineType::I64, MachineType::Pointer]
    );
    assert_eq!(signature.attributes.find(ParamAttrs::SWIFT_SELF), Some(1));
    assert_eq!(signature.attributes.find(ParamAttrs::SWIFT_ERROR), None);
}

#[test]
fn error_slot_follows_the_context() {
    let metadata = StaticMetadata::new();
    let function = SilFunctionType {
        error_result: Some(SilResultInfo::new(
            AType::Builtin(BuiltinType::NativeObject),
            ResultConvention::Owned,
        )),
        ..thin(vec![direct(int())], vec![unowned(int())])
    };
    let signature = expand(&metadata, &function);

    assert_eq!(signature.function_type.params.len(), 3);
    assert_eq!(signature.attributes.find(ParamAttrs::SWIFT_SELF), Some(1));
    assert_eq!(signature.attributes.find(ParamAttrs::SWIFT_ERROR), Some(2));
    assert_eq!(signature.mappings().len(), 1);
}

#[test]
fn class_self_is_the_context() {
    let mut metadata = StaticMetadata::new();
    let class = metadata.add_class("main", "C");
    let function = SilFunctionType::new(
        SilFunctionTypeRepresentation::Method,
        vec![
            direct(int()),
            SilParameterInfo::new(class, ParameterConvention::DirectGuaranteed),
        ],
        Vec::new(),
    );
    let signature = expand(&metadata, &function);

    assert_eq!(
        signature.function_type.params,
        vec![MachineType::I64, MachineType::Pointer]
    );
    assert_eq!(signature.attributes.param(1), ParamAttrs::SWIFT_SELF);
    assert_eq!(ranges(&signature), vec![0..1, 1..2]);
}

#[test]
fn trivial_self_is_an_ordinary_parameter() {
    let metadata = StaticMetadata::new();
    let function = SilFunctionType::new(
        SilFunctionTypeRepresentation::Method,
        vec![direct(int()), direct(int())],
        Vec::new(),
    );
    let signature = expand(&metadata, &function);
    assert_eq!(signature.attributes.find(ParamAttrs::SWIFT_SELF), None);
    assert_eq!(ranges(&signature), vec![0..1, 1..2]);
}

#[test]
fn address_only_direct_parameters_go_indirect() {
    let mut metadata = StaticMetadata::new();
    let protocol = ProtocolDecl::new("main", "P");
    metadata.add_protocol(protocol.clone());
    let protocols = vec![protocol];
    let any_p = AType::Existential(ExistentialType {
        metadata: metadata.existential(&protocols, None, false).unwrap(),
        protocols,
        superclass: None,
        has_explicit_any_object: false,
    });
    let function = thin(
        vec![SilParameterInfo::new(any_p, ParameterConvention::DirectGuaranteed)],
        Vec::new(),
    );
    let signature = expand(&metadata, &function);
    assert!(signature.requires_indirect(0));
    assert_eq!(signature.function_type.params, vec![MachineType::Pointer]);
}

// ── Generic functions ───────────────────────────────────────────────

fn signature_t_p() -> GenericSignature {
    GenericSignature {
        params: vec![GenericParam::new(0, 0)],
        requirements: vec![Requirement::Conformance {
            subject: t(),
            protocol: ProtocolDecl::new("main", "P"),
        }],
    }
}

#[test]
fn generic_requirements_trail_the_formal_parameters() {
    let metadata = StaticMetadata::new();
    let function = SilFunctionType {
        generic_signature: Some(signature_t_p()),
        ..thin(
            vec![SilParameterInfo::new(t(), ParameterConvention::IndirectInGuaranteed)],
            Vec::new(),
        )
    };
    let mut converter = IrTypeConverter::new(&metadata, TargetConfig::default());
    let signature = converter.signature(&function).unwrap();

    assert_eq!(signature.function_type.params, vec![MachineType::Pointer; 3]);
    assert_eq!(ranges(&signature), vec![0..1]);
    assert!(converter.current_generic_context().is_none());
}

#[test]
fn witness_methods_end_with_self_metadata_and_witness_table() {
    let metadata = StaticMetadata::new();
    let function = SilFunctionType {
        generic_signature: Some(signature_t_p()),
        witness_method_conformance: Some(ProtocolConformanceRef {
            protocol: ProtocolDecl::new("main", "P"),
            conforming_type: None,
        }),
        ..SilFunctionType::new(
            SilFunctionTypeRepresentation::WitnessMethod,
            vec![
                direct(int()),
                SilParameterInfo::new(t(), ParameterConvention::IndirectInGuaranteed),
            ],
            Vec::new(),
        )
    };
    let signature = expand(&metadata, &function);

    assert_eq!(
        signature.function_type.params,
        vec![
            MachineType::I64,
            MachineType::Pointer,
            MachineType::Pointer,
            MachineType::Pointer
        ]
    );
    assert_eq!(signature.attributes.find(ParamAttrs::SWIFT_SELF), Some(1));
    assert_eq!(ranges(&signature), vec![0..1, 1..2]);
}

// ── Coroutines ──────────────────────────────────────────────────────

#[test]
fn coroutine_yields_spill_into_an_overflow_struct() {
    let metadata = StaticMetadata::new();
    let function = SilFunctionType {
        coroutine_kind: CoroutineKind::YieldOnce,
        yields: (0..5).map(|_| direct(int())).collect(),
        ..thin(vec![direct(int())], Vec::new())
    };
    let signature = expand(&metadata, &function);

    assert_eq!(
        signature.function_type.result,
        MachineType::Struct(vec![
            MachineType::Pointer,
            MachineType::I64,
            MachineType::I64,
            MachineType::Pointer,
        ])
    );
    assert_eq!(
        signature.coroutine_overflow(),
        Some(&MachineType::Struct(vec![MachineType::I64; 3]))
    );
    assert_eq!(
        signature.function_type.params,
        vec![MachineType::Pointer, MachineType::I64]
    );
    assert_eq!(ranges(&signature), vec![1..2]);
}

#[test]
fn small_coroutine_yields_stay_direct() {
    let metadata = StaticMetadata::new();
    let function = SilFunctionType {
        coroutine_kind: CoroutineKind::YieldOnce,
        yields: vec![direct(int())],
        ..thin(Vec::new(), Vec::new())
    };
    let signature = expand(&metadata, &function);
    assert_eq!(
        signature.function_type.result,
        MachineType::Struct(vec![MachineType::Pointer, MachineType::I64])
    );
    assert_eq!(signature.coroutine_overflow(), None);
}

// ── Caching and unsupported conventions ─────────────────────────────

#[test]
fn signatures_are_expanded_once() {
    let metadata = StaticMetadata::new();
    let mut converter = IrTypeConverter::new(&metadata, TargetConfig::default());
    let function = thin(vec![direct(int())], Vec::new());
    let first = converter.signature(&function).unwrap();
    let second = converter.signature(&function).unwrap();
    assert!(Rc::ptr_eq(&first, &second));
}

#[test]
fn foreign_conventions_are_not_implemented() {
    let metadata = StaticMetadata::new();
    let mut converter = IrTypeConverter::new(&metadata, TargetConfig::default());
    let function = SilFunctionType::new(
        SilFunctionTypeRepresentation::CFunctionPointer,
        Vec::new(),
        Vec::new(),
    );
    assert!(matches!(
        converter.signature(&function),
        Err(LoweringError::NotImplemented(_))
    ));
}
