//! Lowered types to physical layouts.
//!
//! [`IrTypeConverter`] maps every lowered [`AType`] to a [`TypeInfo`],
//! memoizing results per type. Struct and enum layouts come from the
//! metadata reader; everything else is derived from the type's spelling
//! and the target configuration.
//!
//! The converter also owns the cache of expanded function signatures and
//! the stack of generic signatures that are in scope while a polymorphic
//! function is being expanded.
//!
//! # References
//!
//! - Swift `lib/IRGen/GenType.cpp` (`TypeConverter::convertType`)
//! - Swift `lib/IRGen/GenEnum.cpp`, `GenRecord.h`, `GenExistential.cpp`

mod enums;
mod existentials;
mod functions;
mod records;

use std::rc::Rc;

use rustc_hash::FxHashMap;
use swm_demangle::stack::ensure_sufficient_stack;

use crate::config::TargetConfig;
use crate::error::{fatal, not_implemented, Result};
use crate::machine::MachineType;
use crate::metadata::MetadataReader;
use crate::signature::IrSignature;
use crate::type_info::{ScalarKind, TypeInfo, TypeInfoKind};
use crate::type_lowering::SilTypeLowering;
use crate::types::{
    AType, BuiltinType, GenericSignature, MetatypeRepresentation, MetatypeType, NominalKind,
    SilFunctionType,
};

pub use enums::{EnumStrategy, PayloadLayout};

/// Converts lowered types to [`TypeInfo`]s.
pub struct IrTypeConverter<'r> {
    reader: &'r dyn MetadataReader,
    config: TargetConfig,
    cache: FxHashMap<AType, Rc<TypeInfo>>,
    signatures: FxHashMap<SilFunctionType, Rc<IrSignature>>,
    generic_contexts: Vec<GenericSignature>,
}

impl<'r> IrTypeConverter<'r> {
    pub fn new(reader: &'r dyn MetadataReader, config: TargetConfig) -> Self {
        IrTypeConverter {
            reader,
            config,
            cache: FxHashMap::default(),
            signatures: FxHashMap::default(),
            generic_contexts: Vec::new(),
        }
    }

    pub fn config(&self) -> &TargetConfig {
        &self.config
    }

    pub fn reader(&self) -> &'r dyn MetadataReader {
        self.reader
    }

    /// SIL lowering backed by the same metadata reader.
    pub fn sil_lowering(&self) -> SilTypeLowering<'r> {
        SilTypeLowering::new(self.reader)
    }

    /// Layout of the lowered type `ty`.
    ///
    /// Types that still mention type parameters are not supported.
    pub fn convert_type(&mut self, ty: &AType) -> Result<Rc<TypeInfo>> {
        if let Some(info) = self.cache.get(ty) {
            return Ok(Rc::clone(info));
        }
        if ty.has_type_parameter() {
            return Err(not_implemented!("generics: {ty}"));
        }
        let info = Rc::new(ensure_sufficient_stack(|| self.convert_uncached(ty))?);
        tracing::debug!(
            ty = %ty,
            storage = %info.storage_type(),
            size = info.size(),
            alignment = info.alignment(),
            "converted type"
        );
        self.cache.insert(ty.clone(), Rc::clone(&info));
        Ok(info)
    }

    fn convert_uncached(&mut self, ty: &AType) -> Result<TypeInfo> {
        let pointer_size = self.config.pointer_size;
        match ty {
            AType::Builtin(builtin) => self.convert_builtin(builtin),
            AType::Tuple(elements) => self.convert_tuple(elements),
            AType::Nominal(nominal) => match nominal.decl.kind {
                NominalKind::Class => {
                    Ok(TypeInfo::pointer(pointer_size, ScalarKind::HeapReference))
                }
                NominalKind::Struct => self.convert_struct(ty),
                NominalKind::Enum => self.convert_enum(ty),
            },
            AType::BoundGeneric(bound) => match bound.decl.kind {
                NominalKind::Class => {
                    Ok(TypeInfo::pointer(pointer_size, ScalarKind::HeapReference))
                }
                NominalKind::Struct => self.convert_struct(ty),
                NominalKind::Enum => self.convert_enum(ty),
            },
            AType::Existential(existential) => Ok(self.convert_existential(existential)),
            AType::Metatype(metatype) => self.convert_metatype(metatype),
            AType::ExistentialMetatype(metatype) => Ok(self.convert_existential_metatype(metatype)),
            AType::Module(_) => Ok(TypeInfo::empty(MachineType::I8)),
            AType::DynamicSelf(self_type) => Ok((*self.convert_type(self_type)?).clone()),
            AType::SilFunction(function) => self.convert_function(function),
            AType::ReferenceStorage(ownership, _) => Ok(TypeInfo::pointer(
                pointer_size,
                ScalarKind::ReferenceStorage(*ownership),
            )),
            AType::InOut(_) => Ok(TypeInfo::pointer(pointer_size, ScalarKind::RawPointer)),
            AType::SilBox(_) => Err(not_implemented!("SIL box types")),
            AType::Function(_) => fatal(&format!("formal function type {ty} was not lowered")),
            AType::GenericParam(_) | AType::DependentMember(_) => {
                fatal(&format!("type parameter {ty} has no fixed layout"))
            }
            AType::SilBlockStorage(_) => fatal("block storage types are not supported"),
            AType::SilToken => fatal("SIL tokens have no runtime representation"),
        }
    }

    fn convert_builtin(&self, builtin: &BuiltinType) -> Result<TypeInfo> {
        let pointer_size = self.config.pointer_size;
        Ok(match builtin {
            BuiltinType::Integer(bits) => {
                let storage = MachineType::integer(*bits as usize)?;
                let alignment = self.config.capped_alignment(storage.alignment());
                TypeInfo::scalar(storage, alignment, ScalarKind::Pod)
            }
            BuiltinType::Float(32) => TypeInfo::scalar(MachineType::Float, 4, ScalarKind::Pod),
            BuiltinType::Float(64) => TypeInfo::scalar(MachineType::Double, 8, ScalarKind::Pod),
            BuiltinType::Float(bits) => return Err(not_implemented!("{bits}-bit floating point")),
            BuiltinType::IntegerLiteral => TypeInfo::new(
                MachineType::Struct(vec![MachineType::I64]),
                2 * pointer_size,
                pointer_size,
                TypeInfoKind::IntegerLiteral,
            ),
            BuiltinType::RawPointer => TypeInfo::pointer(pointer_size, ScalarKind::RawPointer),
            BuiltinType::NativeObject | BuiltinType::BridgeObject | BuiltinType::UnknownObject => {
                TypeInfo::pointer(pointer_size, ScalarKind::HeapReference)
            }
            BuiltinType::UnsafeValueBuffer => TypeInfo::new(
                MachineType::Array(Box::new(MachineType::Pointer), 3),
                self.config.fixed_buffer_size(),
                self.config.pointer_alignment(),
                TypeInfoKind::Immovable,
            ),
            BuiltinType::Vector { .. } => return Err(not_implemented!("builtin vectors")),
        })
    }

    fn convert_metatype(&self, metatype: &MetatypeType) -> Result<TypeInfo> {
        match metatype.representation {
            None => fatal("metatype reached the converter without a representation"),
            Some(MetatypeRepresentation::Thin) => {
                Ok(TypeInfo::empty(MachineType::Struct(Vec::new())))
            }
            Some(MetatypeRepresentation::Thick) => Ok(TypeInfo::pointer(
                self.config.pointer_size,
                ScalarKind::ThickMetatype,
            )),
            Some(MetatypeRepresentation::ObjC) => Err(not_implemented!("Objective-C metatypes")),
        }
    }

    // ── Generic context ─────────────────────────────────────────────

    /// Makes `signature` the innermost generic context. `None` is a no-op,
    /// matched by a `None` pop.
    pub fn push_generic_context(&mut self, signature: Option<&GenericSignature>) {
        if let Some(signature) = signature {
            self.generic_contexts.push(signature.clone());
        }
    }

    pub fn pop_generic_context(&mut self, signature: Option<&GenericSignature>) {
        if signature.is_some() && self.generic_contexts.pop().is_none() {
            fatal("generic context popped without a matching push");
        }
    }

    pub fn current_generic_context(&self) -> Option<&GenericSignature> {
        self.generic_contexts.last()
    }
}
