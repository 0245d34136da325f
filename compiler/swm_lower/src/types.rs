//! AST-level type model.
//!
//! [`AType`] is what the lowering engine consumes: a closed sum over every
//! type shape the demangler can describe. Most shapes mirror one runtime
//! metadata record and are identified by it; the rest are synthesized from
//! their parts.
//!
//! # Equality
//!
//! Two [`AType`]s are equal when they denote the same type:
//!
//! - **Metadata-backed** (builtins, non-generic nominals, existentials):
//!   compared by metadata identity. Names are never consulted.
//! - **Synthetic** (tuples, bound generics, functions, metatypes, generic
//!   parameters, reference storage, SIL function types, ...): compared
//!   structurally.
//!
//! A metadata-backed type never equals a synthetic one. [`Hash`] follows the
//! same split, so [`AType`] can key the converter cache.

mod builtin;
mod function;
mod generics;
mod nominal;
mod props;

use std::fmt;
use std::hash::{Hash, Hasher};

pub use builtin::{BuiltinTable, BuiltinType};
pub use function::{
    CoroutineKind, FunctionExtInfo, FunctionParam, FunctionType, ParameterConvention,
    ResultConvention, SilFunctionType, SilFunctionTypeRepresentation, SilParameterInfo,
    SilResultInfo,
};
pub use generics::{
    enumerate_generic_requirements, GenericParam, GenericRequirement, GenericSignature,
    ProtocolConformanceRef, Requirement,
};
pub use nominal::{
    ExistentialLayout, ExistentialLayoutKind, ExistentialType, MetadataId, NominalDecl,
    NominalKind, NominalType, ProtocolDecl,
};
pub use props::RecursiveTypeProperties;

/// Coarse classification of an [`AType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    BuiltinInteger,
    BuiltinIntegerLiteral,
    BuiltinFloat,
    BuiltinRawPointer,
    BuiltinNativeObject,
    BuiltinBridgeObject,
    BuiltinUnknownObject,
    BuiltinUnsafeValueBuffer,
    BuiltinVector,
    Tuple,
    WeakStorage,
    UnownedStorage,
    UnmanagedStorage,
    Enum,
    Struct,
    Class,
    Protocol,
    BoundGenericClass,
    BoundGenericEnum,
    BoundGenericStruct,
    Metatype,
    ExistentialMetatype,
    Module,
    DynamicSelf,
    GenericTypeParam,
    DependentMember,
    Function,
    GenericFunction,
    SilFunction,
    SilBlockStorage,
    SilBox,
    SilToken,
    ProtocolComposition,
    InOut,
}

/// Ownership qualifier of a reference storage type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceOwnership {
    Weak,
    Unowned,
    Unmanaged,
}

/// How a metatype value is represented at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetatypeRepresentation {
    /// No runtime value; the type is statically known.
    Thin,
    /// A pointer to the type's metadata.
    Thick,
    /// An Objective-C class object.
    ObjC,
}

impl MetatypeRepresentation {
    pub fn from_attribute(text: &str) -> Option<Self> {
        match text {
            "@thin" => Some(MetatypeRepresentation::Thin),
            "@thick" => Some(MetatypeRepresentation::Thick),
            "@objc_metatype" => Some(MetatypeRepresentation::ObjC),
            _ => None,
        }
    }
}

/// Reference-counting scheme of a class-like value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceCounting {
    Native,
    Bridge,
    Unknown,
}

/// A metatype (`T.Type`) or existential metatype (`any P.Type`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MetatypeType {
    pub instance: Box<AType>,
    /// Only present on lowered types.
    pub representation: Option<MetatypeRepresentation>,
}

/// `Base.Name` where `Base` is a type parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DependentMemberType {
    pub base: Box<AType>,
    pub name: String,
}

/// A nominal type applied to generic arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BoundGenericType {
    pub decl: NominalDecl,
    pub args: Vec<AType>,
}

/// A type as seen by the lowering engine.
#[derive(Clone, Debug)]
pub enum AType {
    Builtin(BuiltinType),
    Tuple(Vec<AType>),
    Nominal(NominalType),
    BoundGeneric(BoundGenericType),
    Existential(ExistentialType),
    Metatype(MetatypeType),
    ExistentialMetatype(MetatypeType),
    Module(String),
    /// The dynamic `Self` type of a class method, wrapping the class.
    DynamicSelf(Box<AType>),
    GenericParam(GenericParam),
    DependentMember(DependentMemberType),
    Function(Box<FunctionType>),
    SilFunction(Box<SilFunctionType>),
    ReferenceStorage(ReferenceOwnership, Box<AType>),
    InOut(Box<AType>),
    /// A heap box with the given field types.
    SilBox(Vec<AType>),
    SilBlockStorage(Box<AType>),
    SilToken,
}

/// Identity of a metadata-backed type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum MetadataKey<'a> {
    Builtin(&'a BuiltinType),
    Runtime(MetadataId),
}

impl AType {
    /// The empty tuple, `()`.
    pub fn void() -> AType {
        AType::Tuple(Vec::new())
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            AType::Builtin(builtin) => builtin.kind(),
            AType::Tuple(_) => TypeKind::Tuple,
            AType::Nominal(nominal) => match nominal.decl.kind {
                NominalKind::Struct => TypeKind::Struct,
                NominalKind::Enum => TypeKind::Enum,
                NominalKind::Class => TypeKind::Class,
            },
            AType::BoundGeneric(bound) => match bound.decl.kind {
                NominalKind::Struct => TypeKind::BoundGenericStruct,
                NominalKind::Enum => TypeKind::BoundGenericEnum,
                NominalKind::Class => TypeKind::BoundGenericClass,
            },
            AType::Existential(existential) => {
                if existential.is_single_protocol() {
                    TypeKind::Protocol
                } else {
                    TypeKind::ProtocolComposition
                }
            }
            AType::Metatype(_) => TypeKind::Metatype,
            AType::ExistentialMetatype(_) => TypeKind::ExistentialMetatype,
            AType::Module(_) => TypeKind::Module,
            AType::DynamicSelf(_) => TypeKind::DynamicSelf,
            AType::GenericParam(_) => TypeKind::GenericTypeParam,
            AType::DependentMember(_) => TypeKind::DependentMember,
            AType::Function(function) => {
                if function.generic_signature.is_some() {
                    TypeKind::GenericFunction
                } else {
                    TypeKind::Function
                }
            }
            AType::SilFunction(_) => TypeKind::SilFunction,
            AType::ReferenceStorage(ownership, _) => match ownership {
                ReferenceOwnership::Weak => TypeKind::WeakStorage,
                ReferenceOwnership::Unowned => TypeKind::UnownedStorage,
                ReferenceOwnership::Unmanaged => TypeKind::UnmanagedStorage,
            },
            AType::InOut(_) => TypeKind::InOut,
            AType::SilBox(_) => TypeKind::SilBox,
            AType::SilBlockStorage(_) => TypeKind::SilBlockStorage,
            AType::SilToken => TypeKind::SilToken,
        }
    }

    fn metadata_key(&self) -> Option<MetadataKey<'_>> {
        match self {
            AType::Builtin(builtin) => Some(MetadataKey::Builtin(builtin)),
            AType::Nominal(nominal) => Some(MetadataKey::Runtime(nominal.metadata)),
            AType::Existential(existential) => Some(MetadataKey::Runtime(existential.metadata)),
            _ => None,
        }
    }

    fn structurally_equal(&self, other: &AType) -> bool {
        match (self, other) {
            (AType::Tuple(a), AType::Tuple(b)) | (AType::SilBox(a), AType::SilBox(b)) => a == b,
            (AType::BoundGeneric(a), AType::BoundGeneric(b)) => a == b,
            (AType::Metatype(a), AType::Metatype(b))
            | (AType::ExistentialMetatype(a), AType::ExistentialMetatype(b)) => a == b,
            (AType::Module(a), AType::Module(b)) => a == b,
            (AType::DynamicSelf(a), AType::DynamicSelf(b))
            | (AType::InOut(a), AType::InOut(b))
            | (AType::SilBlockStorage(a), AType::SilBlockStorage(b)) => a == b,
            (AType::GenericParam(a), AType::GenericParam(b)) => a == b,
            (AType::DependentMember(a), AType::DependentMember(b)) => a == b,
            (AType::Function(a), AType::Function(b)) => a == b,
            (AType::SilFunction(a), AType::SilFunction(b)) => a == b,
            (AType::ReferenceStorage(a, a_referent), AType::ReferenceStorage(b, b_referent)) => {
                a == b && a_referent == b_referent
            }
            (AType::SilToken, AType::SilToken) => true,
            _ => false,
        }
    }

    fn hash_structure<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AType::Tuple(elements) | AType::SilBox(elements) => elements.hash(state),
            AType::BoundGeneric(bound) => bound.hash(state),
            AType::Metatype(metatype) | AType::ExistentialMetatype(metatype) => {
                metatype.hash(state);
            }
            AType::Module(name) => name.hash(state),
            AType::DynamicSelf(inner) | AType::InOut(inner) | AType::SilBlockStorage(inner) => {
                inner.hash(state);
            }
            AType::GenericParam(param) => param.hash(state),
            AType::DependentMember(member) => member.hash(state),
            AType::Function(function) => function.hash(state),
            AType::SilFunction(function) => function.hash(state),
            AType::ReferenceStorage(ownership, referent) => {
                ownership.hash(state);
                referent.hash(state);
            }
            AType::Builtin(_)
            | AType::Nominal(_)
            | AType::Existential(_)
            | AType::SilToken => {}
        }
    }
}

impl PartialEq for AType {
    fn eq(&self, other: &Self) -> bool {
        match (self.metadata_key(), other.metadata_key()) {
            (Some(lhs), Some(rhs)) => lhs == rhs,
            (None, None) => self.structurally_equal(other),
            _ => false,
        }
    }
}

impl Eq for AType {}

impl Hash for AType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.metadata_key() {
            Some(key) => key.hash(state),
            None => self.hash_structure(state),
        }
    }
}

// ── Semantic queries ────────────────────────────────────────────────

impl AType {
    pub fn is_void(&self) -> bool {
        matches!(self, AType::Tuple(elements) if elements.is_empty())
    }

    /// A nominally uninhabited type such as `Never`.
    pub fn is_uninhabited(&self) -> bool {
        matches!(self, AType::Nominal(nominal) if nominal.case_count == Some(0))
    }

    pub fn is_class_or_bound_generic_class(&self) -> bool {
        matches!(self.kind(), TypeKind::Class | TypeKind::BoundGenericClass)
    }

    pub fn may_have_superclass(&self) -> bool {
        self.is_class_or_bound_generic_class() || matches!(self, AType::DynamicSelf(_))
    }

    /// `T` or `T.Assoc`, but not `Array<T>`.
    pub fn is_type_parameter(&self) -> bool {
        match self {
            AType::GenericParam(_) => true,
            AType::DependentMember(member) => member.base.is_type_parameter(),
            _ => false,
        }
    }

    pub fn is_existential(&self) -> bool {
        matches!(self, AType::Existential(_))
    }

    pub fn is_class_existential(&self) -> bool {
        matches!(self, AType::Existential(existential) if existential.layout().requires_class)
    }

    pub fn is_objc_existential(&self) -> bool {
        matches!(self, AType::Existential(existential) if existential.layout().is_objc())
    }

    pub fn is_any_object(&self) -> bool {
        matches!(self, AType::Existential(existential) if existential.layout().is_any_object())
    }

    pub fn existential_layout(&self) -> Option<ExistentialLayout> {
        match self {
            AType::Existential(existential) => Some(existential.layout()),
            _ => None,
        }
    }

    /// `T` for `Optional<T>`.
    pub fn optional_object_type(&self) -> Option<&AType> {
        match self {
            AType::BoundGeneric(bound) if bound.decl.is_optional() => bound.args.first(),
            _ => None,
        }
    }

    /// The bound generic arguments, or nothing for other types.
    pub fn generic_args(&self) -> &[AType] {
        match self {
            AType::BoundGeneric(bound) => &bound.args,
            _ => &[],
        }
    }

    pub fn reference_counting(&self) -> ReferenceCounting {
        match self {
            AType::Builtin(BuiltinType::NativeObject)
            | AType::SilBox(_)
            | AType::Nominal(NominalType {
                decl: NominalDecl {
                    kind: NominalKind::Class,
                    ..
                },
                ..
            }) => ReferenceCounting::Native,
            AType::BoundGeneric(bound) if bound.decl.kind == NominalKind::Class => {
                ReferenceCounting::Native
            }
            AType::Builtin(BuiltinType::BridgeObject) => ReferenceCounting::Bridge,
            AType::Builtin(BuiltinType::UnknownObject) => ReferenceCounting::Unknown,
            AType::DynamicSelf(self_type) => self_type.reference_counting(),
            AType::Existential(existential) => {
                if !existential.layout().requires_class {
                    crate::error::fatal("opaque existentials are not reference counted");
                }
                existential
                    .superclass
                    .as_deref()
                    .map_or(ReferenceCounting::Unknown, AType::reference_counting)
            }
            other => crate::error::fatal(&format!(
                "{:?} has no reference counting scheme",
                other.kind()
            )),
        }
    }
}

// ── Display ─────────────────────────────────────────────────────────

impl fmt::Display for AType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AType::Builtin(builtin) => write!(f, "{builtin}"),
            AType::Tuple(elements) => {
                f.write_str("(")?;
                write_types(f, elements)?;
                f.write_str(")")
            }
            AType::Nominal(nominal) => f.write_str(&nominal.decl.name),
            AType::BoundGeneric(bound) => {
                write!(f, "{}<", bound.decl.name)?;
                write_types(f, &bound.args)?;
                f.write_str(">")
            }
            AType::Existential(existential) => write!(f, "{existential}"),
            AType::Metatype(metatype) | AType::ExistentialMetatype(metatype) => {
                if let Some(representation) = metatype.representation {
                    let attr = match representation {
                        MetatypeRepresentation::Thin => "@thin",
                        MetatypeRepresentation::Thick => "@thick",
                        MetatypeRepresentation::ObjC => "@objc_metatype",
                    };
                    write!(f, "{attr} ")?;
                }
                if matches!(*metatype.instance, AType::Existential(_)) {
                    write!(f, "({}).Type", metatype.instance)
                } else {
                    write!(f, "{}.Type", metatype.instance)
                }
            }
            AType::Module(name) => write!(f, "module<{name}>"),
            AType::DynamicSelf(_) => f.write_str("Self"),
            AType::GenericParam(param) => write!(f, "{param}"),
            AType::DependentMember(member) => write!(f, "{}.{}", member.base, member.name),
            AType::Function(function) => write!(f, "{function}"),
            AType::SilFunction(function) => write!(f, "{function}"),
            AType::ReferenceStorage(ownership, referent) => {
                let attr = match ownership {
                    ReferenceOwnership::Weak => "@sil_weak",
                    ReferenceOwnership::Unowned => "@sil_unowned",
                    ReferenceOwnership::Unmanaged => "@sil_unmanaged",
                };
                write!(f, "{attr} {referent}")
            }
            AType::InOut(inner) => write!(f, "inout {inner}"),
            AType::SilBox(fields) => {
                f.write_str("{ ")?;
                write_types(f, fields)?;
                f.write_str(" }")
            }
            AType::SilBlockStorage(inner) => write!(f, "@block_storage {inner}"),
            AType::SilToken => f.write_str("Builtin.SILToken"),
        }
    }
}

pub(crate) fn write_types(f: &mut fmt::Formatter<'_>, types: &[AType]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}
