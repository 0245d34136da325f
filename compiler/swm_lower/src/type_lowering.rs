//! SIL type lowering: formal types to the types values are passed as.
//!
//! Two jobs live here. [`SilTypeLowering::lowered_type`] rewrites a formal
//! type into its lowered form: function types gain explicit conventions,
//! metatypes gain a representation. [`SilTypeLowering::lower_function`]
//! assigns every parameter and result of a native function its convention.
//!
//! Both depend on how a type is classified: trivial, a reference-counted
//! value, or address-only. Classification looks through tuples and, via
//! the metadata reader, through the fields and payloads of structs and
//! enums. Indirect enum cases are boxed and never looked through.
//!
//! # References
//!
//! - Swift `lib/SIL/TypeLowering.cpp` (`computeLoweredRValueType`)
//! - Swift `lib/SIL/SILFunctionType.cpp` (`DestructureInputs`, `DestructureResults`)

use swm_demangle::mangling::STDLIB_NAME;
use swm_demangle::stack::ensure_sufficient_stack;

use crate::error::Result;
use crate::metadata::MetadataReader;
use crate::types::{
    AType, BuiltinType, ExistentialLayoutKind, ExistentialType, FunctionType, GenericSignature,
    MetatypeRepresentation, MetatypeType, NominalKind, ParameterConvention, ReferenceOwnership,
    ResultConvention, SilFunctionType, SilFunctionTypeRepresentation, SilParameterInfo,
    SilResultInfo,
};

/// How values of a lowered type are handled, from cheapest to most
/// demanding. Aggregates take the most demanding class of their parts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeClass {
    /// Plain bits; copies need no bookkeeping.
    Trivial,
    /// Loadable, but holds references that must be retained.
    Reference,
    /// Must always be manipulated in memory.
    AddressOnly,
}

/// Lowers formal types, asking `reader` about nominal layouts.
pub struct SilTypeLowering<'r> {
    reader: &'r dyn MetadataReader,
}

impl<'r> SilTypeLowering<'r> {
    pub fn new(reader: &'r dyn MetadataReader) -> Self {
        SilTypeLowering { reader }
    }

    /// The lowered form of `ty`.
    pub fn lowered_type(&self, ty: &AType) -> Result<AType> {
        ensure_sufficient_stack(|| self.lower_rvalue(ty))
    }

    fn lower_rvalue(&self, ty: &AType) -> Result<AType> {
        Ok(match ty {
            AType::Function(function) => {
                AType::SilFunction(Box::new(self.lower_function(function)?))
            }
            AType::DynamicSelf(self_type) => self.lowered_type(self_type)?,
            AType::Metatype(metatype) if metatype.representation.is_none() => {
                let representation = if has_singleton_metatype(&metatype.instance) {
                    MetatypeRepresentation::Thin
                } else {
                    MetatypeRepresentation::Thick
                };
                AType::Metatype(MetatypeType {
                    instance: metatype.instance.clone(),
                    representation: Some(representation),
                })
            }
            AType::ExistentialMetatype(metatype) if metatype.representation.is_none() => {
                AType::ExistentialMetatype(MetatypeType {
                    instance: metatype.instance.clone(),
                    representation: Some(MetatypeRepresentation::Thick),
                })
            }
            AType::Tuple(elements) => AType::Tuple(
                elements
                    .iter()
                    .map(|element| self.lowered_type(element))
                    .collect::<Result<_>>()?,
            ),
            AType::ReferenceStorage(ownership, referent) => {
                AType::ReferenceStorage(*ownership, Box::new(self.lowered_type(referent)?))
            }
            AType::BoundGeneric(bound) if bound.decl.is_optional() => {
                let mut lowered = bound.clone();
                for arg in &mut lowered.args {
                    *arg = self.lowered_type(arg)?;
                }
                AType::BoundGeneric(lowered)
            }
            other => other.clone(),
        })
    }

    /// Classifies a lowered type. Type parameters are address-only unless
    /// `signature` binds them to classes.
    pub fn classify(&self, ty: &AType, signature: Option<&GenericSignature>) -> Result<TypeClass> {
        ensure_sufficient_stack(|| self.classify_inner(ty, signature))
    }

    fn classify_inner(
        &self,
        ty: &AType,
        signature: Option<&GenericSignature>,
    ) -> Result<TypeClass> {
        Ok(match ty {
            AType::Builtin(builtin) => match builtin {
                BuiltinType::NativeObject
                | BuiltinType::BridgeObject
                | BuiltinType::UnknownObject => TypeClass::Reference,
                BuiltinType::UnsafeValueBuffer => TypeClass::AddressOnly,
                BuiltinType::Integer(_)
                | BuiltinType::IntegerLiteral
                | BuiltinType::Float(_)
                | BuiltinType::RawPointer
                | BuiltinType::Vector { .. } => TypeClass::Trivial,
            },
            AType::Tuple(elements) => self.classify_all(elements, signature)?,
            AType::Nominal(nominal) if nominal.decl.kind == NominalKind::Class => {
                TypeClass::Reference
            }
            AType::BoundGeneric(bound) if bound.decl.kind == NominalKind::Class => {
                TypeClass::Reference
            }
            AType::Nominal(_) | AType::BoundGeneric(_) => self.classify_composite(ty, signature)?,
            AType::Existential(existential) => match existential.layout().kind {
                ExistentialLayoutKind::Opaque => TypeClass::AddressOnly,
                ExistentialLayoutKind::Class | ExistentialLayoutKind::Error => TypeClass::Reference,
            },
            AType::GenericParam(_) | AType::DependentMember(_) => {
                if signature.is_some_and(|signature| signature.requires_class(ty)) {
                    TypeClass::Reference
                } else {
                    TypeClass::AddressOnly
                }
            }
            AType::Function(function) => {
                classify_function(function.ext.representation, function.ext.is_noescape)
            }
            AType::SilFunction(function) => {
                classify_function(function.representation, function.is_noescape)
            }
            AType::ReferenceStorage(ReferenceOwnership::Unmanaged, _) => TypeClass::Trivial,
            AType::ReferenceStorage(..) | AType::DynamicSelf(_) | AType::SilBox(_) => {
                TypeClass::Reference
            }
            AType::SilBlockStorage(_) => TypeClass::AddressOnly,
            AType::Metatype(_)
            | AType::ExistentialMetatype(_)
            | AType::Module(_)
            | AType::InOut(_)
            | AType::SilToken => TypeClass::Trivial,
        })
    }

    fn classify_all<'a>(
        &self,
        types: impl IntoIterator<Item = &'a AType>,
        signature: Option<&GenericSignature>,
    ) -> Result<TypeClass> {
        let mut class = TypeClass::Trivial;
        for ty in types {
            class = class.max(self.classify(ty, signature)?);
        }
        Ok(class)
    }

    fn classify_composite(
        &self,
        ty: &AType,
        signature: Option<&GenericSignature>,
    ) -> Result<TypeClass> {
        let layout = self.reader.composite_layout(ty)?;
        let mut class = TypeClass::Trivial;
        for field in &layout.fields {
            if field.is_indirect_case {
                class = class.max(TypeClass::Reference);
            } else if let Some(field_ty) = &field.ty {
                class = class.max(self.classify(&self.lowered_type(field_ty)?, signature)?);
            }
        }
        Ok(class)
    }

    pub fn is_address_only(&self, ty: &AType) -> Result<bool> {
        Ok(self.classify(ty, None)? == TypeClass::AddressOnly)
    }

    /// Assigns native conventions to a formal function type.
    ///
    /// Tuple parameters are passed element by element and tuple results
    /// are returned element by element. `throws` becomes an owned
    /// `Swift.Error` error result.
    pub fn lower_function(&self, function: &FunctionType) -> Result<SilFunctionType> {
        let signature = function.generic_signature.as_ref();

        let mut params = Vec::with_capacity(function.params.len());
        for param in &function.params {
            let formal = match &param.ty {
                AType::InOut(inner) => inner,
                other => other,
            };
            let lowered = self.lowered_type(formal)?;
            if param.is_inout || matches!(param.ty, AType::InOut(_)) {
                params.push(SilParameterInfo::new(lowered, ParameterConvention::IndirectInout));
            } else {
                self.destructure_param(lowered, signature, &mut params)?;
            }
        }

        let mut results = Vec::new();
        let result = self.lowered_type(&function.result)?;
        self.destructure_result(result, signature, &mut results)?;

        let error_result = if function.ext.throws {
            Some(SilResultInfo::new(
                self.error_existential()?,
                ResultConvention::Owned,
            ))
        } else {
            None
        };

        let representation = function.ext.representation;
        let lowered = SilFunctionType {
            representation,
            callee_convention: if representation == SilFunctionTypeRepresentation::Thick {
                ParameterConvention::DirectGuaranteed
            } else {
                ParameterConvention::DirectUnowned
            },
            is_noescape: function.ext.is_noescape,
            params,
            results,
            error_result,
            generic_signature: function.generic_signature.clone(),
            ..SilFunctionType::default()
        };
        tracing::trace!(formal = %function, lowered = %lowered, "lowered function type");
        Ok(lowered)
    }

    fn destructure_param(
        &self,
        ty: AType,
        signature: Option<&GenericSignature>,
        params: &mut Vec<SilParameterInfo>,
    ) -> Result<()> {
        if let AType::Tuple(elements) = ty {
            for element in elements {
                self.destructure_param(element, signature, params)?;
            }
            return Ok(());
        }
        let convention = match self.classify(&ty, signature)? {
            TypeClass::AddressOnly => ParameterConvention::IndirectInGuaranteed,
            TypeClass::Trivial => ParameterConvention::DirectUnowned,
            TypeClass::Reference => ParameterConvention::DirectGuaranteed,
        };
        params.push(SilParameterInfo::new(ty, convention));
        Ok(())
    }

    fn destructure_result(
        &self,
        ty: AType,
        signature: Option<&GenericSignature>,
        results: &mut Vec<SilResultInfo>,
    ) -> Result<()> {
        if let AType::Tuple(elements) = ty {
            for element in elements {
                self.destructure_result(element, signature, results)?;
            }
            return Ok(());
        }
        let convention = match self.classify(&ty, signature)? {
            TypeClass::AddressOnly => ResultConvention::Indirect,
            TypeClass::Trivial => ResultConvention::Unowned,
            TypeClass::Reference => ResultConvention::Owned,
        };
        results.push(SilResultInfo::new(ty, convention));
        Ok(())
    }

    /// `any Swift.Error`, as thrown by native functions.
    pub fn error_existential(&self) -> Result<AType> {
        let protocol = self.reader.protocol(STDLIB_NAME, "Error")?;
        let protocols = vec![protocol];
        let metadata = self.reader.existential(&protocols, None, false)?;
        Ok(AType::Existential(ExistentialType {
            metadata,
            protocols,
            superclass: None,
            has_explicit_any_object: false,
        }))
    }
}

/// Types whose metatype has exactly one value, so it needs no storage.
fn has_singleton_metatype(instance: &AType) -> bool {
    match instance {
        AType::Nominal(nominal) => nominal.decl.kind != NominalKind::Class,
        AType::BoundGeneric(bound) => bound.decl.kind != NominalKind::Class,
        AType::Tuple(_)
        | AType::Builtin(_)
        | AType::Function(_)
        | AType::SilFunction(_)
        | AType::Metatype(_) => true,
        _ => false,
    }
}

fn classify_function(
    representation: SilFunctionTypeRepresentation,
    is_noescape: bool,
) -> TypeClass {
    match representation {
        SilFunctionTypeRepresentation::Thick if is_noescape => TypeClass::Trivial,
        SilFunctionTypeRepresentation::Thick | SilFunctionTypeRepresentation::Block => {
            TypeClass::Reference
        }
        SilFunctionTypeRepresentation::Thin
        | SilFunctionTypeRepresentation::Method
        | SilFunctionTypeRepresentation::WitnessMethod
        | SilFunctionTypeRepresentation::Closure
        | SilFunctionTypeRepresentation::CFunctionPointer
        | SilFunctionTypeRepresentation::ObjCMethod => TypeClass::Trivial,
    }
}

#[cfg(test)]
mod tests;
