use pretty_assertions::assert_eq;

use super::*;
use crate::metadata::{CompositeLayout, FieldLayout, StaticMetadata};
use crate::types::{FunctionExtInfo, FunctionParam, GenericParam, ProtocolDecl, Requirement};

fn int() -> AType {
    AType::Builtin(BuiltinType::Integer(64))
}

fn object() -> AType {
    AType::Builtin(BuiltinType::NativeObject)
}

fn function(params: Vec<AType>, result: AType) -> FunctionType {
    FunctionType {
        params: params.into_iter().map(FunctionParam::new).collect(),
        result,
        ext: FunctionExtInfo::default(),
        generic_signature: None,
    }
}

fn any_p(metadata: &StaticMetadata) -> AType {
    let protocols = vec![ProtocolDecl::new("main", "P")];
    let id = metadata.existential(&protocols, None, false).unwrap();
    AType::Existential(ExistentialType {
        metadata: id,
        protocols,
        superclass: None,
        has_explicit_any_object: false,
    })
}

// ── Lowered types ───────────────────────────────────────────────────

#[test]
fn metatypes_gain_a_representation() {
    let mut metadata = StaticMetadata::new();
    let class = metadata.add_class("main", "C");
    let lowering = SilTypeLowering::new(&metadata);

    let thin = lowering
        .lowered_type(&AType::Metatype(MetatypeType {
            instance: Box::new(int()),
            representation: None,
        }))
        .unwrap();
    let thick = lowering
        .lowered_type(&AType::Metatype(MetatypeType {
            instance: Box::new(class),
            representation: None,
        }))
        .unwrap();

    assert!(matches!(
        thin,
        AType::Metatype(MetatypeType { representation: Some(MetatypeRepresentation::Thin), .. })
    ));
    assert!(matches!(
        thick,
        AType::Metatype(MetatypeType { representation: Some(MetatypeRepresentation::Thick), .. })
    ));
}

#[test]
fn nested_function_types_are_lowered() {
    let metadata = StaticMetadata::new();
    let lowering = SilTypeLowering::new(&metadata);
    let callback = AType::Function(Box::new(function(vec![int()], AType::void())));

    let lowered = lowering.lowered_type(&AType::Tuple(vec![callback])).unwrap();

    let AType::Tuple(elements) = lowered else {
        panic!("expected a tuple");
    };
    assert!(matches!(elements[0], AType::SilFunction(_)));
}

// ── Classification ──────────────────────────────────────────────────

#[test]
fn classification_takes_the_most_demanding_part() {
    let mut metadata = StaticMetadata::new();
    let any = any_p(&metadata);
    let plain = metadata.add_struct(
        "main",
        "Plain",
        CompositeLayout {
            size: 16,
            alignment: 8,
            fields: vec![FieldLayout::field(int(), 0), FieldLayout::field(int(), 8)],
        },
    );
    let holder = metadata.add_struct(
        "main",
        "Holder",
        CompositeLayout {
            size: 16,
            alignment: 8,
            fields: vec![FieldLayout::field(int(), 0), FieldLayout::field(object(), 8)],
        },
    );
    let boxed = metadata.add_struct(
        "main",
        "Boxed",
        CompositeLayout {
            size: 40,
            alignment: 8,
            fields: vec![FieldLayout::field(any.clone(), 0)],
        },
    );
    let lowering = SilTypeLowering::new(&metadata);

    assert_eq!(lowering.classify(&plain, None).unwrap(), TypeClass::Trivial);
    assert_eq!(lowering.classify(&holder, None).unwrap(), TypeClass::Reference);
    assert_eq!(lowering.classify(&boxed, None).unwrap(), TypeClass::AddressOnly);
    assert_eq!(
        lowering.classify(&AType::Tuple(vec![int(), any]), None).unwrap(),
        TypeClass::AddressOnly
    );
}

#[test]
fn indirect_cases_are_never_looked_through() {
    let mut metadata = StaticMetadata::new();
    let any = any_p(&metadata);
    let list = metadata.add_enum(
        "main",
        "List",
        CompositeLayout {
            size: 8,
            alignment: 8,
            fields: vec![FieldLayout::case(None), FieldLayout::indirect_case(any)],
        },
    );
    let lowering = SilTypeLowering::new(&metadata);
    assert_eq!(lowering.classify(&list, None).unwrap(), TypeClass::Reference);
}

#[test]
fn class_bound_type_parameters_are_references() {
    let metadata = StaticMetadata::new();
    let lowering = SilTypeLowering::new(&metadata);
    let t = AType::GenericParam(GenericParam::new(0, 0));
    let mut signature = GenericSignature {
        params: vec![GenericParam::new(0, 0)],
        requirements: Vec::new(),
    };
    assert_eq!(lowering.classify(&t, Some(&signature)).unwrap(), TypeClass::AddressOnly);

    signature.requirements.push(Requirement::Layout {
        subject: t.clone(),
        constraint: "C".to_owned(),
    });
    assert_eq!(lowering.classify(&t, Some(&signature)).unwrap(), TypeClass::Reference);
}

#[test]
fn missing_layout_is_an_error() {
    let metadata = StaticMetadata::new();
    let mut other = StaticMetadata::new();
    let unknown = other.add_struct(
        "main",
        "Unknown",
        CompositeLayout {
            size: 0,
            alignment: 1,
            fields: Vec::new(),
        },
    );
    let lowering = SilTypeLowering::new(&metadata);
    assert!(matches!(
        lowering.classify(&unknown, None),
        Err(crate::error::LoweringError::MissingMetadata(_))
    ));
}

// ── Function lowering ───────────────────────────────────────────────

#[test]
fn native_conventions() {
    let metadata = StaticMetadata::new();
    let lowering = SilTypeLowering::new(&metadata);
    let any = any_p(&metadata);
    let mut formal = function(vec![int(), object(), any], int());
    formal.params.push(FunctionParam {
        ty: int(),
        label: None,
        is_inout: true,
    });

    let lowered = lowering.lower_function(&formal).unwrap();

    let conventions: Vec<ParameterConvention> =
        lowered.params.iter().map(|param| param.convention).collect();
    assert_eq!(
        conventions,
        vec![
            ParameterConvention::DirectUnowned,
            ParameterConvention::DirectGuaranteed,
            ParameterConvention::IndirectInGuaranteed,
            ParameterConvention::IndirectInout,
        ]
    );
    assert_eq!(
        lowered.results,
        vec![SilResultInfo::new(int(), ResultConvention::Unowned)]
    );
    assert_eq!(lowered.callee_convention, ParameterConvention::DirectGuaranteed);
    assert_eq!(lowered.error_result, None);
}

#[test]
fn tuples_are_destructured() {
    let metadata = StaticMetadata::new();
    let lowering = SilTypeLowering::new(&metadata);
    let any = any_p(&metadata);
    let formal = function(
        vec![AType::Tuple(vec![int(), int()])],
        AType::Tuple(vec![object(), any.clone()]),
    );

    let lowered = lowering.lower_function(&formal).unwrap();

    assert_eq!(lowered.params.len(), 2);
    assert_eq!(
        lowered.results,
        vec![
            SilResultInfo::new(object(), ResultConvention::Owned),
            SilResultInfo::new(any, ResultConvention::Indirect),
        ]
    );
}

#[test]
fn void_result_has_no_results() {
    let metadata = StaticMetadata::new();
    let lowering = SilTypeLowering::new(&metadata);
    let lowered = lowering.lower_function(&function(Vec::new(), AType::void())).unwrap();
    assert!(lowered.results.is_empty());
}

#[test]
fn throwing_functions_return_an_owned_error() {
    let metadata = StaticMetadata::new();
    let lowering = SilTypeLowering::new(&metadata);
    let mut formal = function(Vec::new(), AType::void());
    formal.ext.throws = true;
    formal.ext.representation = SilFunctionTypeRepresentation::Thin;

    let lowered = lowering.lower_function(&formal).unwrap();

    let error = lowered.error_result.unwrap();
    assert_eq!(error.convention, ResultConvention::Owned);
    assert_eq!(error.ty, lowering.error_existential().unwrap());
    assert_eq!(
        error.ty.existential_layout().unwrap().kind,
        ExistentialLayoutKind::Error
    );
    assert_eq!(lowered.callee_convention, ParameterConvention::DirectUnowned);
}
