//! Physical layout of a lowered type.
//!
//! A [`TypeInfo`] records how values of one type sit in memory: their
//! machine storage type, size and alignment. Loadable types can also say
//! how many scalars they explode into and describe themselves to the
//! aggregate lowering that decides how they are passed.
//!
//! The kinds form a closed set, so every consumer matches exhaustively
//! instead of dispatching through a hierarchy.
//!
//! # References
//!
//! - Swift `lib/IRGen/TypeInfo.h` (`FixedTypeInfo`, `LoadableTypeInfo`)
//! - Swift `lib/IRGen/GenRecord.h` (`RecordTypeInfo`)

use std::ops::Range;
use std::rc::Rc;

use crate::agg_lowering::SwiftAggLowering;
use crate::converter::EnumStrategy;
use crate::error::fatal;
use crate::machine::MachineType;
use crate::types::ReferenceOwnership;

// ---------------------------------------------------------------------------
// TypeInfo
// ---------------------------------------------------------------------------

/// Layout of a lowered type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeInfo {
    storage: MachineType,
    size: usize,
    alignment: usize,
    kind: TypeInfoKind,
}

/// What a [`TypeInfo`] describes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeInfoKind {
    /// No bits at all: `()`, thin metatypes, modules.
    Empty,
    /// One machine scalar.
    Scalar(ScalarKind),
    /// `Builtin.IntLiteral`: a pointer-sized word stored in a `{i64}`.
    IntegerLiteral,
    /// Function pointer and context pointer.
    ThickFunction { is_noescape: bool },
    /// Object reference followed by one witness table per protocol.
    ClassExistential { protocols: usize },
    /// Metadata pointer followed by one witness table per protocol.
    ExistentialMetatype { protocols: usize },
    /// Inline buffer, metadata and witness tables. Only ever handled by
    /// address.
    OpaqueExistential { protocols: usize },
    /// A struct or tuple.
    Record(RecordInfo),
    /// An enum, with the strategy that picked its storage.
    Enum(EnumStrategy),
    /// Fixed-size storage that can never be moved or copied by value.
    Immovable,
}

/// Flavor of a single-scalar type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Plain integer or floating-point data.
    Pod,
    RawPointer,
    /// A strong reference to a heap object.
    HeapReference,
    /// A weak, unowned or unmanaged reference.
    ReferenceStorage(ReferenceOwnership),
    ThinFunction,
    ThickMetatype,
}

impl TypeInfo {
    pub fn new(storage: MachineType, size: usize, alignment: usize, kind: TypeInfoKind) -> Self {
        debug_assert!(alignment.is_power_of_two(), "alignment {alignment}");
        TypeInfo {
            storage,
            size,
            alignment,
            kind,
        }
    }

    /// Zero-sized, byte-aligned, with the given storage type.
    pub fn empty(storage: MachineType) -> Self {
        TypeInfo::new(storage, 0, 1, TypeInfoKind::Empty)
    }

    /// A single scalar as large as `storage`.
    pub fn scalar(storage: MachineType, alignment: usize, kind: ScalarKind) -> Self {
        let size = storage.size();
        TypeInfo::new(storage, size, alignment, TypeInfoKind::Scalar(kind))
    }

    /// A pointer-sized scalar.
    pub fn pointer(pointer_size: usize, kind: ScalarKind) -> Self {
        TypeInfo::new(
            MachineType::Pointer,
            pointer_size,
            pointer_size,
            TypeInfoKind::Scalar(kind),
        )
    }

    /// `count` consecutive pointers described by `kind`.
    pub fn pointers(count: usize, pointer_size: usize, kind: TypeInfoKind) -> Self {
        TypeInfo::new(
            MachineType::Struct(vec![MachineType::Pointer; count]),
            count * pointer_size,
            pointer_size,
            kind,
        )
    }

    pub fn storage_type(&self) -> &MachineType {
        &self.storage
    }

    /// Size in bytes, without tail padding.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    pub fn kind(&self) -> &TypeInfoKind {
        &self.kind
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, TypeInfoKind::Empty)
    }

    /// Whether values can be decomposed into machine scalars and passed
    /// in registers.
    pub fn is_loadable(&self) -> bool {
        match &self.kind {
            TypeInfoKind::OpaqueExistential { .. } | TypeInfoKind::Immovable => false,
            TypeInfoKind::Record(record) => record.is_loadable,
            TypeInfoKind::Enum(strategy) => strategy.is_loadable(),
            TypeInfoKind::Empty
            | TypeInfoKind::Scalar(_)
            | TypeInfoKind::IntegerLiteral
            | TypeInfoKind::ThickFunction { .. }
            | TypeInfoKind::ClassExistential { .. }
            | TypeInfoKind::ExistentialMetatype { .. } => true,
        }
    }

    /// Number of scalars a loaded value explodes into.
    pub fn explosion_size(&self) -> usize {
        if !self.is_loadable() {
            fatal(&format!("explosion size of address-only type {}", self.storage));
        }
        match &self.kind {
            TypeInfoKind::Empty => 0,
            TypeInfoKind::Record(record) => record.explosion_size(),
            TypeInfoKind::Enum(EnumStrategy::Singleton { payload }) => {
                payload.as_ref().map_or(0, |payload| payload.explosion_size())
            }
            _ => match &self.storage {
                MachineType::Void => 0,
                MachineType::Struct(fields) => fields.len(),
                MachineType::Array(..) => fatal("loadable types never lower to arrays"),
                _ => 1,
            },
        }
    }

    /// Describes a value of this type stored at `offset` to `lowering`.
    pub fn add_to_agg_lowering(&self, lowering: &mut SwiftAggLowering, offset: usize) {
        match &self.kind {
            TypeInfoKind::Empty => {}
            TypeInfoKind::Scalar(_) => lowering.add_typed_data(self.storage.clone(), offset),
            TypeInfoKind::IntegerLiteral => lowering.add_typed_data(MachineType::I64, offset),
            TypeInfoKind::ThickFunction { .. }
            | TypeInfoKind::ClassExistential { .. }
            | TypeInfoKind::ExistentialMetatype { .. } => {
                let mut field_offset = offset;
                for field in self.storage.flatten() {
                    let size = field.size();
                    lowering.add_typed_data(field, field_offset);
                    field_offset += size;
                }
            }
            TypeInfoKind::Record(record) => {
                for field in &record.fields {
                    field.info.add_to_agg_lowering(lowering, offset + field.offset);
                }
            }
            TypeInfoKind::Enum(strategy) => strategy.add_to_agg_lowering(self, lowering, offset),
            TypeInfoKind::OpaqueExistential { .. } | TypeInfoKind::Immovable => fatal(&format!(
                "address-only type {} cannot be lowered to scalars",
                self.storage
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One field of a struct or tuple.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordField {
    pub info: Rc<TypeInfo>,
    /// Byte offset from the start of the record.
    pub offset: usize,
    /// The field's scalars within the record's explosion.
    pub explosion: Range<usize>,
}

/// Fields of a struct or tuple, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordInfo {
    pub fields: Vec<RecordField>,
    /// All fields are loadable.
    pub is_loadable: bool,
}

impl RecordInfo {
    pub fn explosion_size(&self) -> usize {
        self.fields.last().map_or(0, |field| field.explosion.end)
    }
}
