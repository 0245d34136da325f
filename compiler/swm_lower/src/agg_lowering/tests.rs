use pretty_assertions::assert_eq;

use super::*;

fn lowering() -> SwiftAggLowering {
    SwiftAggLowering::new(&TargetConfig::default())
}

fn components(finished: &FinishedAggLowering) -> Vec<(Range<usize>, MachineType)> {
    finished
        .components()
        .map(|(range, ty)| (range, ty.clone()))
        .collect()
}

// ── Merging ─────────────────────────────────────────────────────

#[test]
fn adjacent_ints_in_one_chunk_merge() {
    let mut agg = lowering();
    agg.add_typed_data(MachineType::I32, 0);
    agg.add_typed_data(MachineType::I32, 4);
    let finished = agg.finish();
    assert_eq!(components(&finished), vec![(0..8, MachineType::I64)]);
}

#[test]
fn float_and_int_stay_separate() {
    let mut agg = lowering();
    agg.add_typed_data(MachineType::Float, 0);
    agg.add_typed_data(MachineType::I32, 4);
    let finished = agg.finish();
    assert_eq!(
        components(&finished),
        vec![(0..4, MachineType::Float), (4..8, MachineType::I32)]
    );
}

#[test]
fn entries_in_different_chunks_are_untouched() {
    let mut agg = lowering();
    agg.add_typed_data(MachineType::I8, 0);
    agg.add_typed_data(MachineType::Double, 8);
    agg.add_typed_data(MachineType::Pointer, 16);
    let finished = agg.finish();
    assert_eq!(
        components(&finished),
        vec![
            (0..1, MachineType::I8),
            (8..16, MachineType::Double),
            (16..24, MachineType::Pointer),
        ]
    );
}

#[test]
fn two_bytes_merge_into_i16() {
    let mut agg = lowering();
    agg.add_typed_data(MachineType::I8, 0);
    agg.add_typed_data(MachineType::I8, 1);
    let finished = agg.finish();
    assert_eq!(components(&finished), vec![(0..2, MachineType::I16)]);
}

// ── Opaque data ─────────────────────────────────────────────────

#[test]
fn misaligned_data_becomes_opaque() {
    let mut agg = lowering();
    agg.add_typed_data(MachineType::I32, 2);
    let finished = agg.finish();
    assert_eq!(components(&finished), vec![(0..8, MachineType::I64)]);
}

#[test]
fn opaque_run_is_split_per_chunk() {
    let mut agg = lowering();
    agg.add_opaque_data(0, 12);
    let finished = agg.finish();
    assert_eq!(
        components(&finished),
        vec![(0..8, MachineType::I64), (8..12, MachineType::I32)]
    );
}

#[test]
fn contiguous_opaque_entries_coalesce() {
    let mut agg = lowering();
    agg.add_opaque_data(0, 1);
    agg.add_opaque_data(1, 3);
    let finished = agg.finish();
    assert_eq!(components(&finished), vec![(0..4, MachineType::I32)]);
}

#[test]
fn zero_sized_data_is_ignored() {
    let mut agg = lowering();
    agg.add_typed_data(MachineType::Void, 0);
    agg.add_opaque_data(4, 4);
    assert!(agg.finish().is_empty());
}

// ── Ordering and conflicts ──────────────────────────────────────

#[test]
fn out_of_order_data_is_sorted() {
    let mut agg = lowering();
    agg.add_typed_data(MachineType::I64, 8);
    agg.add_typed_data(MachineType::Double, 0);
    let finished = agg.finish();
    assert_eq!(
        components(&finished),
        vec![(0..8, MachineType::Double), (8..16, MachineType::I64)]
    );
}

#[test]
#[should_panic(expected = "overlaps")]
fn overlapping_data_is_fatal() {
    let mut agg = lowering();
    agg.add_typed_data(MachineType::I64, 8);
    agg.add_typed_data(MachineType::I64, 0);
    agg.add_typed_data(MachineType::I32, 4);
}

#[test]
#[should_panic(expected = "aggregate")]
fn aggregate_data_is_fatal() {
    let mut agg = lowering();
    agg.add_typed_data(MachineType::Struct(vec![MachineType::I8]), 0);
}

#[test]
#[should_panic(expected = "does not fill")]
fn typed_range_must_match_store_size() {
    let mut agg = lowering();
    agg.add_typed_data_range(MachineType::I32, 0, 8);
}

// ── Indirect passing ────────────────────────────────────────────

#[test]
fn more_than_four_scalars_go_indirect() {
    let mut agg = lowering();
    for i in 0..5 {
        agg.add_typed_data(MachineType::I64, i * 8);
    }
    let finished = agg.finish();
    assert!(finished.should_pass_indirectly(false));
    assert!(finished.should_pass_indirectly(true));
}

#[test]
fn four_mixed_scalars_stay_direct() {
    let mut agg = lowering();
    agg.add_typed_data(MachineType::Double, 0);
    agg.add_typed_data(MachineType::I64, 8);
    agg.add_typed_data(MachineType::Pointer, 16);
    agg.add_typed_data(MachineType::Float, 24);
    let finished = agg.finish();
    assert!(!finished.should_pass_indirectly(false));
}

#[test]
fn empty_lowering_is_direct() {
    let finished = lowering().finish();
    assert!(finished.is_empty());
    assert!(!finished.should_pass_indirectly(true));
}
