//! Property-based tests for aggregate lowering, enum layout and signature
//! expansion.
//!
//! Inputs are generated well-formed: aggregate data is aligned and never
//! overlaps, and function types use only native conventions.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use proptest::prelude::*;
use swm_lower::metadata::{CompositeLayout, FieldLayout};
use swm_lower::types::{
    BuiltinType, ParameterConvention, SilFunctionTypeRepresentation, SilParameterInfo,
};
use swm_lower::{
    AType, IrTypeConverter, MachineType, SilFunctionType, StaticMetadata, SwiftAggLowering,
    TargetConfig,
};

fn scalar() -> impl Strategy<Value = MachineType> {
    prop_oneof![
        Just(MachineType::I8),
        Just(MachineType::I16),
        Just(MachineType::I32),
        Just(MachineType::I64),
        Just(MachineType::Pointer),
        Just(MachineType::Float),
        Just(MachineType::Double),
    ]
}

/// Aligned, non-overlapping typed data: each scalar is placed at the next
/// suitably aligned offset after an optional gap.
fn layout() -> impl Strategy<Value = Vec<(MachineType, usize)>> {
    prop::collection::vec((scalar(), 0usize..6), 0..10).prop_map(|slots| {
        let mut cursor = 0;
        slots
            .into_iter()
            .map(|(ty, gap)| {
                let alignment = ty.alignment();
                let offset = (cursor + gap).div_ceil(alignment) * alignment;
                cursor = offset + ty.size();
                (ty, offset)
            })
            .collect()
    })
}

fn direct_param() -> impl Strategy<Value = AType> {
    let int = AType::Builtin(BuiltinType::Integer(64));
    let double = AType::Builtin(BuiltinType::Float(64));
    prop_oneof![
        Just(int.clone()),
        Just(double),
        Just(AType::Tuple(vec![int.clone(); 2])),
        Just(AType::Tuple(vec![int; 5])),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn components_are_ordered_and_disjoint(data in layout()) {
        let mut lowering = SwiftAggLowering::new(&TargetConfig::default());
        for (ty, offset) in &data {
            lowering.add_typed_data(ty.clone(), *offset);
        }
        let finished = lowering.finish();
        let components: Vec<_> = finished.components().collect();

        for pair in components.windows(2) {
            prop_assert!(pair[0].0.end <= pair[1].0.start, "{:?}", components);
        }
        for (range, ty) in &components {
            prop_assert_eq!(range.len(), ty.size());
            prop_assert_eq!(range.start % ty.alignment(), 0);
            prop_assert_eq!(range.start / 8, (range.end - 1) / 8, "crosses a chunk");
        }
    }

    #[test]
    fn every_byte_stays_covered(data in layout()) {
        let mut lowering = SwiftAggLowering::new(&TargetConfig::default());
        for (ty, offset) in &data {
            lowering.add_typed_data(ty.clone(), *offset);
        }
        let finished = lowering.finish();
        for (ty, offset) in &data {
            for byte in *offset..offset + ty.size() {
                prop_assert!(
                    finished.components().any(|(range, _)| range.contains(&byte)),
                    "byte {} of {} lost",
                    byte,
                    ty
                );
            }
        }
    }

    #[test]
    fn floating_point_data_is_never_merged(data in layout()) {
        let mut lowering = SwiftAggLowering::new(&TargetConfig::default());
        for (ty, offset) in &data {
            lowering.add_typed_data(ty.clone(), *offset);
        }
        let finished = lowering.finish();
        for (ty, offset) in data.iter().filter(|(ty, _)| ty.is_floating_point()) {
            prop_assert!(finished
                .components()
                .any(|(range, component)| range.start == *offset && component == ty));
        }
    }

    #[test]
    fn no_payload_tags_number_every_case(cases in 2usize..5_000) {
        let mut metadata = StaticMetadata::new();
        let ty = metadata.add_enum(
            "main",
            "E",
            CompositeLayout {
                size: 0,
                alignment: 1,
                fields: (0..cases).map(|_| FieldLayout::case(None)).collect(),
            },
        );
        let info = IrTypeConverter::new(&metadata, TargetConfig::default())
            .convert_type(&ty)
            .unwrap();
        let is_bit = info.storage_type() == &MachineType::Struct(vec![MachineType::I1]);
        let bits = if is_bit { 1 } else { info.size() * 8 };
        prop_assert!(info.size().is_power_of_two());
        prop_assert!(cases - 1 < 1usize << bits);
        prop_assert_eq!(info.alignment(), info.size());
    }

    #[test]
    fn every_formal_parameter_gets_a_mapping(
        params in prop::collection::vec(direct_param(), 0..8),
    ) {
        let metadata = StaticMetadata::new();
        let function = SilFunctionType::new(
            SilFunctionTypeRepresentation::Thin,
            params
                .into_iter()
                .map(|ty| SilParameterInfo::new(ty, ParameterConvention::DirectGuaranteed))
                .collect(),
            Vec::new(),
        );
        let signature = IrTypeConverter::new(&metadata, TargetConfig::default())
            .signature(&function)
            .unwrap();

        prop_assert_eq!(signature.mappings().len(), function.params.len());
        let mut next = 0;
        for mapping in signature.mappings() {
            prop_assert_eq!(mapping.range.start, next);
            prop_assert!(!mapping.range.is_empty());
            next = mapping.range.end;
        }
        prop_assert_eq!(next, signature.function_type.params.len());
    }
}
