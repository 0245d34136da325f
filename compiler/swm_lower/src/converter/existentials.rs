//! Existentials and existential metatypes.

use super::IrTypeConverter;
use crate::error::fatal;
use crate::machine::MachineType;
use crate::type_info::{ScalarKind, TypeInfo, TypeInfoKind};
use crate::types::{
    AType, ExistentialLayoutKind, ExistentialType, MetatypeRepresentation, MetatypeType,
};

impl IrTypeConverter<'_> {
    /// Class-bound existentials are the object reference followed by one
    /// witness table per protocol. `any Error` is a single boxed reference.
    /// Opaque existentials hold the value in a three-word inline buffer,
    /// then its metadata and witness tables, and are never loaded.
    pub(super) fn convert_existential(&self, existential: &ExistentialType) -> TypeInfo {
        let layout = existential.layout();
        let pointer_size = self.config.pointer_size;
        let protocols = layout.number_of_protocols;
        match layout.kind {
            ExistentialLayoutKind::Class => TypeInfo::pointers(
                protocols + 1,
                pointer_size,
                TypeInfoKind::ClassExistential { protocols },
            ),
            ExistentialLayoutKind::Error => {
                TypeInfo::pointer(pointer_size, ScalarKind::HeapReference)
            }
            ExistentialLayoutKind::Opaque => {
                let mut fields = vec![MachineType::Array(Box::new(MachineType::Pointer), 3)];
                fields.extend(std::iter::repeat_n(MachineType::Pointer, protocols + 1));
                TypeInfo::new(
                    MachineType::Struct(fields),
                    self.config.fixed_buffer_size() + (protocols + 1) * pointer_size,
                    self.config.pointer_alignment(),
                    TypeInfoKind::OpaqueExistential { protocols },
                )
            }
        }
    }

    /// Metadata pointer followed by one witness table per protocol. Nested
    /// existential metatypes take their protocols from the innermost
    /// existential.
    pub(super) fn convert_existential_metatype(&self, metatype: &MetatypeType) -> TypeInfo {
        match metatype.representation {
            None => fatal("existential metatype reached the converter without a representation"),
            Some(MetatypeRepresentation::Thin) => fatal("existential metatypes cannot be thin"),
            Some(MetatypeRepresentation::Thick | MetatypeRepresentation::ObjC) => {}
        }
        let mut instance = metatype.instance.as_ref();
        while let AType::ExistentialMetatype(inner) = instance {
            instance = &inner.instance;
        }
        let Some(layout) = instance.existential_layout() else {
            fatal(&format!("existential metatype of non-existential {instance}"));
        };
        let protocols = layout.number_of_protocols;
        TypeInfo::pointers(
            protocols + 1,
            self.config.pointer_size,
            TypeInfoKind::ExistentialMetatype { protocols },
        )
    }
}
