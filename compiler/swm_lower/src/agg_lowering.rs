//! Aggregate lowering for the Swift calling convention.
//!
//! A loadable value is described to the calling convention as a list of
//! byte ranges, each either typed (`i32` at 4..8) or opaque. [`finish`]
//! normalizes the list: small neighbors that share a pointer-sized chunk are
//! merged, and opaque runs are re-split into power-of-two integers. The
//! result is the flat list of scalars the value is passed as.
//!
//! # References
//!
//! - Clang `lib/CodeGen/SwiftCallingConv.cpp` (`SwiftAggLowering`)
//!
//! [`finish`]: SwiftAggLowering::finish

use std::ops::Range;

use smallvec::SmallVec;

use crate::config::TargetConfig;
use crate::error::fatal;
use crate::machine::{MachineType, SwiftAbiInfo};
use crate::math::is_power_of_two;

#[derive(Clone, Debug, PartialEq, Eq)]
struct StorageEntry {
    begin: usize,
    end: usize,
    /// `None` for opaque data.
    ty: Option<MachineType>,
}

/// Builder for the scalar decomposition of one value.
#[derive(Clone, Debug)]
pub struct SwiftAggLowering {
    entries: Vec<StorageEntry>,
    chunk_size: usize,
    abi: SwiftAbiInfo,
}

impl SwiftAggLowering {
    pub fn new(config: &TargetConfig) -> Self {
        SwiftAggLowering {
            entries: Vec::new(),
            chunk_size: config.max_voluntary_int_size,
            abi: SwiftAbiInfo::new(config),
        }
    }

    /// Bytes `begin..end` are used but have no useful type.
    pub fn add_opaque_data(&mut self, begin: usize, end: usize) {
        if begin == end {
            return;
        }
        self.entries.push(StorageEntry {
            begin,
            end,
            ty: None,
        });
    }

    /// A `ty` value is stored at `begin`.
    pub fn add_typed_data(&mut self, ty: MachineType, begin: usize) {
        let end = begin + ty.size();
        self.add_typed_data_range(ty, begin, end);
    }

    /// A `ty` value occupies exactly `begin..end`.
    pub fn add_typed_data_range(&mut self, ty: MachineType, begin: usize, end: usize) {
        if end.checked_sub(begin) != Some(ty.size()) {
            fatal(&format!(
                "{ty} does not fill {begin}..{end}: store size is {}",
                ty.size()
            ));
        }
        if begin == end {
            return;
        }
        // Misaligned data is passed as raw bytes.
        if begin != 0 && begin % ty.alignment() != 0 {
            self.add_opaque_data(begin, end);
            return;
        }
        self.add_entry(Some(ty), begin, end);
    }

    fn add_entry(&mut self, ty: Option<MachineType>, begin: usize, end: usize) {
        if let Some(ty) = &ty {
            if ty.is_aggregate() {
                fatal(&format!("cannot add aggregate-typed data {ty}"));
            }
        }

        if self.entries.last().is_none_or(|last| last.end <= begin) {
            self.entries.push(StorageEntry { begin, end, ty });
            return;
        }

        // Insert after the last entry that ends before the new data.
        let index = self
            .entries
            .iter()
            .rposition(|entry| entry.end <= begin)
            .map_or(0, |i| i + 1);
        if self.entries[index].begin >= end {
            self.entries.insert(index, StorageEntry { begin, end, ty });
            return;
        }

        let existing = &self.entries[index];
        fatal(&format!(
            "data at {begin}..{end} overlaps {}..{}",
            existing.begin, existing.end
        ));
    }

    /// Merges and re-splits the entries into their final scalars.
    pub fn finish(mut self) -> FinishedAggLowering {
        if !self.entries.is_empty() {
            self.merge();
        }
        tracing::trace!(
            components = self.entries.len(),
            "finished aggregate lowering"
        );
        FinishedAggLowering {
            components: self
                .entries
                .into_iter()
                .map(|entry| {
                    let ty = entry
                        .ty
                        .unwrap_or_else(|| fatal("opaque entry survived aggregate lowering"));
                    (entry.begin..entry.end, ty)
                })
                .collect(),
            abi: self.abi,
        }
    }

    fn merge(&mut self) {
        let chunk_size = self.chunk_size;

        // First pass: neighbors that share a chunk become opaque, the first
        // stretched to meet the second.
        let mut has_opaque_entries = self.entries[0].ty.is_none();
        for i in 1..self.entries.len() {
            let (before, after) = self.entries.split_at_mut(i);
            let (first, second) = (&mut before[i - 1], &mut after[0]);
            if should_merge(first, second, chunk_size) {
                first.ty = None;
                second.ty = None;
                first.end = second.begin;
                has_opaque_entries = true;
            } else if second.ty.is_none() {
                has_opaque_entries = true;
            }
        }
        if !has_opaque_entries {
            return;
        }

        // Second pass: re-split each contiguous opaque run into the smallest
        // aligned integers covering it, one per chunk.
        let original = std::mem::take(&mut self.entries);
        let mut i = 0;
        while i < original.len() {
            let entry = &original[i];
            if entry.ty.is_some() {
                self.entries.push(entry.clone());
                i += 1;
                continue;
            }

            let mut begin = entry.begin;
            let mut end = entry.end;
            while let Some(next) = original.get(i + 1) {
                if next.ty.is_some() || next.begin != end {
                    break;
                }
                end = next.end;
                i += 1;
            }

            while begin != end {
                let chunk_begin = start_of_unit(begin, chunk_size);
                let local_end = end.min(chunk_begin + chunk_size);

                let mut unit_size = 1;
                let mut unit_begin = start_of_unit(begin, unit_size);
                while unit_begin + unit_size < local_end {
                    unit_size *= 2;
                    unit_begin = start_of_unit(begin, unit_size);
                }

                let ty = MachineType::integer(unit_size * 8)
                    .unwrap_or_else(|_| fatal("opaque unit wider than a machine integer"));
                self.entries.push(StorageEntry {
                    begin: unit_begin,
                    end: unit_begin + unit_size,
                    ty: Some(ty),
                });
                begin = local_end;
            }
            i += 1;
        }
    }
}

fn should_merge(first: &StorageEntry, second: &StorageEntry, chunk_size: usize) -> bool {
    if start_of_unit(first.end - 1, chunk_size) != start_of_unit(second.begin, chunk_size) {
        return false;
    }
    is_mergeable(first.ty.as_ref()) && is_mergeable(second.ty.as_ref())
}

/// Opaque data, integers and pointers merge; floating point never does.
fn is_mergeable(ty: Option<&MachineType>) -> bool {
    ty.is_none_or(|ty| !ty.is_floating_point())
}

/// Rounds `offset` down to a multiple of the power-of-two `unit_size`.
fn start_of_unit(offset: usize, unit_size: usize) -> usize {
    debug_assert!(is_power_of_two(unit_size));
    offset & !(unit_size - 1)
}

/// The scalars a value is passed as, in address order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinishedAggLowering {
    components: Vec<(Range<usize>, MachineType)>,
    abi: SwiftAbiInfo,
}

impl FinishedAggLowering {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Each component's byte range and machine type.
    pub fn components(&self) -> impl Iterator<Item = (Range<usize>, &MachineType)> + '_ {
        self.components
            .iter()
            .map(|(range, ty)| (range.clone(), ty))
    }

    pub fn component_types(&self) -> SmallVec<[MachineType; 4]> {
        self.components.iter().map(|(_, ty)| ty.clone()).collect()
    }

    /// Whether the value must travel through memory instead of registers.
    pub fn should_pass_indirectly(&self, as_return_value: bool) -> bool {
        if self.components.is_empty() {
            return false;
        }
        self.abi
            .should_pass_indirectly(&self.component_types(), as_return_value)
    }
}

#[cfg(test)]
mod tests;
