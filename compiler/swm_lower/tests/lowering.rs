//! End-to-end lowering: mangled symbols through the type builder, type
//! lowering and signature expansion.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use swm_demangle::mangling::STDLIB_NAME;
use swm_lower::types::BuiltinType;
use swm_lower::{
    AType, BuiltinTable, CompositeLayout, FieldLayout, IrTypeConverter, LoweringError,
    MachineType, ParamAttrs, SilTypeLowering, StaticMetadata, TargetConfig, TypeBuilder,
};

fn metadata() -> StaticMetadata {
    swm_lower::init_tracing();
    let mut metadata = StaticMetadata::new();
    metadata.add_struct(
        STDLIB_NAME,
        "Int",
        CompositeLayout {
            size: 8,
            alignment: 8,
            fields: vec![FieldLayout::field(
                AType::Builtin(BuiltinType::Integer(64)),
                0,
            )],
        },
    );
    metadata
}

fn machine_signature(metadata: &StaticMetadata, symbol: &str) -> swm_lower::IrSignature {
    let symbol = TypeBuilder::new(metadata, BuiltinTable::shared())
        .build_mangled_function(symbol)
        .unwrap();
    let lowered = SilTypeLowering::new(metadata)
        .lower_function(&symbol.function)
        .unwrap();
    let signature = IrTypeConverter::new(metadata, TargetConfig::default())
        .signature(&lowered)
        .unwrap();
    (*signature).clone()
}

#[test]
fn integer_functions_take_registers() {
    let metadata = metadata();
    let signature = machine_signature(&metadata, "$s4main3add1a1bS2i_SitF");
    assert_eq!(signature.function_type.to_string(), "i64 (i64, i64)");
    assert!(!signature.uses_sret());
    assert!(!signature.requires_indirect_result());
}

#[test]
fn generic_values_travel_by_address_with_their_metadata() {
    let metadata = metadata();
    let signature = machine_signature(&metadata, "$s4main2idyxxlF");
    // sret result, the argument's address, then the metadata for T.
    assert_eq!(signature.function_type.to_string(), "void (ptr, ptr, ptr)");
    assert!(signature.uses_sret());
    assert_eq!(signature.mappings().len(), 1);
    assert_eq!(signature.range_of_ir_parameters(0), 1..2);
}

#[test]
fn throwing_functions_get_context_and_error_registers() {
    let metadata = metadata();
    let signature = machine_signature(&metadata, "$s4main3fooyyKF");
    assert_eq!(signature.function_type.to_string(), "void (ptr, ptr)");
    assert_eq!(signature.attributes.param(0), ParamAttrs::SWIFT_SELF);
    assert_eq!(signature.attributes.param(1), ParamAttrs::SWIFT_ERROR);
}

#[test]
fn standalone_types_convert_to_storage() {
    let metadata = metadata();
    let builder = TypeBuilder::new(&metadata, BuiltinTable::shared());
    let mut converter = IrTypeConverter::new(&metadata, TargetConfig::default());

    let word = converter
        .convert_type(&builder.build_mangled_type("Bi64_").unwrap())
        .unwrap();
    assert_eq!(word.storage_type(), &MachineType::I64);

    let int = converter
        .convert_type(&builder.build_mangled_type("Si").unwrap())
        .unwrap();
    assert_eq!(int.size(), 8);
    assert_eq!(int.alignment(), 8);
}

#[test]
fn unregistered_nominals_stop_the_pipeline() {
    let metadata = StaticMetadata::new();
    let err = TypeBuilder::new(&metadata, BuiltinTable::shared())
        .build_mangled_type("Si")
        .unwrap_err();
    assert!(matches!(err, LoweringError::MissingMetadata(_)), "{err}");
}
