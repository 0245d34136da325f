//! Tuples and structs.

use std::rc::Rc;

use super::IrTypeConverter;
use crate::error::{LoweringError, Result};
use crate::struct_layout::StructLayout;
use crate::type_info::{RecordField, RecordInfo, TypeInfo, TypeInfoKind};
use crate::types::AType;

impl IrTypeConverter<'_> {
    pub(super) fn convert_tuple(&mut self, elements: &[AType]) -> Result<TypeInfo> {
        let fields = elements
            .iter()
            .map(|element| self.convert_type(element))
            .collect::<Result<Vec<_>>>()?;
        Ok(record_type_info(StructLayout::computed(fields)))
    }

    /// Struct fields are lowered first: a stored `() -> Int` is laid out as
    /// the lowered function type.
    pub(super) fn convert_struct(&mut self, ty: &AType) -> Result<TypeInfo> {
        let layout = self.reader.composite_layout(ty)?;
        let lowering = self.sil_lowering();
        let mut fields: Vec<Rc<TypeInfo>> = Vec::with_capacity(layout.fields.len());
        let mut offsets = Vec::with_capacity(layout.fields.len());
        for field in &layout.fields {
            let field_ty = field
                .ty
                .as_ref()
                .ok_or_else(|| LoweringError::MissingMetadata(format!("field types of {ty}")))?;
            let lowered = lowering.lowered_type(field_ty)?;
            fields.push(self.convert_type(&lowered)?);
            offsets.push(field.offset);
        }
        Ok(record_type_info(StructLayout::supplied(
            fields,
            &offsets,
            layout.size,
            layout.alignment,
        )))
    }
}

/// A record over `layout`. Each field's explosion follows the previous
/// field's; a record with any address-only field is address-only.
fn record_type_info(layout: StructLayout) -> TypeInfo {
    let storage = layout.storage_type();
    let is_loadable = layout.elements.iter().all(|element| element.info.is_loadable());
    let mut next_scalar = 0;
    let fields = layout
        .elements
        .into_iter()
        .map(|element| {
            let width = if is_loadable {
                element.info.explosion_size()
            } else {
                0
            };
            let explosion = next_scalar..next_scalar + width;
            next_scalar += width;
            RecordField {
                info: element.info,
                offset: element.offset,
                explosion,
            }
        })
        .collect();
    TypeInfo::new(
        storage,
        layout.size,
        layout.alignment,
        TypeInfoKind::Record(RecordInfo {
            fields,
            is_loadable,
        }),
    )
}
