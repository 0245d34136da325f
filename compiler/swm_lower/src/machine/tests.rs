use pretty_assertions::assert_eq;

use super::*;

// ── Layout ──────────────────────────────────────────────────────────

#[test]
fn struct_fields_are_naturally_aligned() {
    let ty = MachineType::Struct(vec![MachineType::I8, MachineType::I32, MachineType::I16]);
    assert_eq!(ty.size(), 10);
    assert_eq!(ty.alignment(), 4);
}

#[test]
fn empty_structs_have_byte_alignment() {
    let ty = MachineType::Struct(Vec::new());
    assert_eq!(ty.size(), 0);
    assert_eq!(ty.alignment(), 1);
}

#[test]
fn byte_arrays_are_unaligned() {
    let bytes = MachineType::bytes(3);
    assert_eq!(bytes.size(), 3);
    assert_eq!(bytes.alignment(), 1);
}

#[test]
fn only_standard_integer_widths_exist() {
    assert_eq!(MachineType::integer(16).unwrap(), MachineType::I16);
    assert!(MachineType::integer(24).is_err());
}

#[test]
fn flatten_splits_structs_and_drops_void() {
    assert!(MachineType::Void.flatten().is_empty());
    assert_eq!(MachineType::I64.flatten().as_slice(), &[MachineType::I64]);
    let pair = MachineType::Struct(vec![MachineType::Pointer, MachineType::Double]);
    assert_eq!(
        pair.flatten().as_slice(),
        &[MachineType::Pointer, MachineType::Double]
    );
}

#[test]
#[should_panic(expected = "x86_fp80")]
fn x87_floats_have_no_layout() {
    let _ = MachineType::X86Fp80.size();
}

// ── Display ─────────────────────────────────────────────────────────

#[test]
fn display_matches_ir_spelling() {
    let ty = MachineType::Struct(vec![
        MachineType::I64,
        MachineType::Pointer,
        MachineType::Array(Box::new(MachineType::I8), 3),
    ]);
    assert_eq!(ty.to_string(), "{ i64, ptr, [3 x i8] }");
    assert_eq!(MachineType::Struct(Vec::new()).to_string(), "{}");

    let function = MachineFunctionType {
        result: MachineType::Void,
        params: vec![MachineType::Pointer, MachineType::Float],
        is_var_args: true,
    };
    assert_eq!(function.to_string(), "void (ptr, float, ...)");
}

// ── Attributes ──────────────────────────────────────────────────────

#[test]
fn attributes_accumulate_per_parameter() {
    let mut attributes = AttributeList::default();
    attributes.add(2, ParamAttrs::SWIFT_SELF);
    attributes.add(2, ParamAttrs::SWIFT_ERROR);
    attributes.add(0, ParamAttrs::SRET);

    assert_eq!(
        attributes.param(2),
        ParamAttrs::SWIFT_SELF | ParamAttrs::SWIFT_ERROR
    );
    assert_eq!(attributes.param(1), ParamAttrs::empty());
    assert_eq!(attributes.find(ParamAttrs::SWIFT_ERROR), Some(2));
    assert!(attributes.uses_sret());
}

#[test]
fn sret_only_counts_on_the_first_parameter() {
    let mut attributes = AttributeList::default();
    attributes.add(1, ParamAttrs::SRET);
    assert!(!attributes.uses_sret());
}

// ── ABI oracle ──────────────────────────────────────────────────────

#[test]
fn four_scalars_fit_in_registers() {
    let abi = SwiftAbiInfo::new(&TargetConfig::default());
    let four = [
        MachineType::I64,
        MachineType::Double,
        MachineType::Pointer,
        MachineType::I8,
    ];
    assert!(!abi.should_pass_indirectly(&four, false));
    assert!(!abi.should_pass_indirectly(&four, true));

    let five = vec![MachineType::I32; 5];
    assert!(abi.should_pass_indirectly(&five, false));
    assert!(abi.should_pass_indirectly(&five, true));
}

#[test]
fn void_components_are_free() {
    let abi = SwiftAbiInfo::new(&TargetConfig::default());
    let mut components = vec![MachineType::Void; 8];
    components.push(MachineType::I64);
    assert!(!abi.should_pass_indirectly(&components, false));
}

#[test]
#[should_panic(expected = "aggregate component")]
fn aggregates_must_be_split_first() {
    let abi = SwiftAbiInfo::new(&TargetConfig::default());
    abi.should_pass_indirectly(&[MachineType::Struct(Vec::new())], false);
}
