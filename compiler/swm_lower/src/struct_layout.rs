//! Field placement for structs and tuples.
//!
//! Tuples are laid out here: each field at the next offset aligned for it,
//! no tail padding. Structs come with offsets, size and alignment already
//! resolved by the metadata reader, which this only checks for overlap.

use std::rc::Rc;

use crate::error::fatal;
use crate::machine::MachineType;
use crate::math::align_to;
use crate::type_info::TypeInfo;

/// Placement of one field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementLayout {
    pub info: Rc<TypeInfo>,
    pub offset: usize,
    /// Position among the record's fields.
    pub index: usize,
}

impl ElementLayout {
    pub fn is_empty(&self) -> bool {
        self.info.size() == 0
    }

    /// End of the field's bytes.
    pub fn end(&self) -> usize {
        self.offset + self.info.size()
    }
}

/// Field placement, size and alignment of a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructLayout {
    pub elements: Vec<ElementLayout>,
    pub size: usize,
    pub alignment: usize,
}

impl StructLayout {
    /// Packs `fields` in order, aligning each.
    pub fn computed(fields: Vec<Rc<TypeInfo>>) -> Self {
        let mut offset = 0;
        let mut alignment = 1;
        let elements = fields
            .into_iter()
            .enumerate()
            .map(|(index, info)| {
                offset = align_to(offset, info.alignment());
                alignment = alignment.max(info.alignment());
                let element = ElementLayout {
                    offset,
                    index,
                    info,
                };
                offset += element.info.size();
                element
            })
            .collect();
        StructLayout {
            elements,
            size: offset,
            alignment,
        }
    }

    /// Uses offsets, size and alignment resolved elsewhere.
    pub fn supplied(
        fields: Vec<Rc<TypeInfo>>,
        offsets: &[usize],
        size: usize,
        alignment: usize,
    ) -> Self {
        if fields.len() != offsets.len() {
            fatal(&format!(
                "{} fields but {} field offsets",
                fields.len(),
                offsets.len()
            ));
        }
        let elements: Vec<ElementLayout> = fields
            .into_iter()
            .zip(offsets)
            .enumerate()
            .map(|(index, (info, &offset))| ElementLayout {
                info,
                offset,
                index,
            })
            .collect();
        check_disjoint(&elements);
        StructLayout {
            elements,
            size,
            alignment,
        }
    }

    /// `{ field storage... }`.
    pub fn storage_type(&self) -> MachineType {
        MachineType::Struct(
            self.elements
                .iter()
                .map(|element| element.info.storage_type().clone())
                .collect(),
        )
    }
}

fn check_disjoint(elements: &[ElementLayout]) {
    let mut placed: Vec<&ElementLayout> = elements.iter().filter(|e| !e.is_empty()).collect();
    placed.sort_by_key(|element| element.offset);
    for pair in placed.windows(2) {
        if pair[0].end() > pair[1].offset {
            fatal(&format!(
                "field {} at {}..{} overlaps field {} at offset {}",
                pair[0].index,
                pair[0].offset,
                pair[0].end(),
                pair[1].index,
                pair[1].offset
            ));
        }
    }
}
