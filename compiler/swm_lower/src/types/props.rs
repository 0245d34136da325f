//! Properties of types defined recursively over their structure.

use bitflags::bitflags;

use super::AType;

bitflags! {
    /// Facts that hold for a type when they hold anywhere inside it.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RecursiveTypeProperties: u8 {
        /// Contains a generic type parameter.
        const HAS_TYPE_PARAMETER = 1 << 0;
        /// Contains a member of a type parameter.
        const HAS_DEPENDENT_MEMBER = 1 << 1;
        /// Contains the dynamic `Self` type.
        const HAS_DYNAMIC_SELF = 1 << 2;
        /// Contains an `inout` position.
        const HAS_INOUT = 1 << 3;
    }
}

impl AType {
    pub fn recursive_properties(&self) -> RecursiveTypeProperties {
        swm_demangle::stack::ensure_sufficient_stack(|| self.compute_properties())
    }

    pub fn has_type_parameter(&self) -> bool {
        self.recursive_properties()
            .contains(RecursiveTypeProperties::HAS_TYPE_PARAMETER)
    }

    pub fn has_dependent_member(&self) -> bool {
        self.recursive_properties()
            .contains(RecursiveTypeProperties::HAS_DEPENDENT_MEMBER)
    }

    fn compute_properties(&self) -> RecursiveTypeProperties {
        match self {
            AType::GenericParam(_) => RecursiveTypeProperties::HAS_TYPE_PARAMETER,
            AType::DependentMember(member) => {
                member.base.recursive_properties()
                    | RecursiveTypeProperties::HAS_TYPE_PARAMETER
                    | RecursiveTypeProperties::HAS_DEPENDENT_MEMBER
            }
            AType::DynamicSelf(inner) => {
                inner.recursive_properties() | RecursiveTypeProperties::HAS_DYNAMIC_SELF
            }
            AType::InOut(inner) => {
                inner.recursive_properties() | RecursiveTypeProperties::HAS_INOUT
            }
            AType::Tuple(elements) | AType::SilBox(elements) => union(elements),
            AType::BoundGeneric(bound) => union(&bound.args),
            AType::Existential(existential) => union(existential.superclass.as_deref()),
            AType::Metatype(metatype) | AType::ExistentialMetatype(metatype) => {
                metatype.instance.recursive_properties()
            }
            AType::ReferenceStorage(_, inner) | AType::SilBlockStorage(inner) => {
                inner.recursive_properties()
            }
            AType::Function(function) => {
                let props = union(
                    function
                        .params
                        .iter()
                        .map(|param| &param.ty)
                        .chain(std::iter::once(&function.result)),
                );
                closed_over(props, function.generic_signature.is_some())
            }
            AType::SilFunction(function) => {
                let props = union(
                    function
                        .params
                        .iter()
                        .chain(&function.yields)
                        .map(|param| &param.ty)
                        .chain(function.results.iter().map(|result| &result.ty))
                        .chain(function.error_result.iter().map(|result| &result.ty)),
                );
                closed_over(props, function.generic_signature.is_some())
            }
            AType::Builtin(_)
            | AType::Nominal(_)
            | AType::Module(_)
            | AType::SilToken => RecursiveTypeProperties::empty(),
        }
    }
}

fn union<'a>(types: impl IntoIterator<Item = &'a AType>) -> RecursiveTypeProperties {
    types
        .into_iter()
        .fold(RecursiveTypeProperties::empty(), |acc, ty| {
            acc | ty.recursive_properties()
        })
}

/// A generic function type binds its own parameters, so they do not leak
/// out of it.
fn closed_over(props: RecursiveTypeProperties, is_generic: bool) -> RecursiveTypeProperties {
    if is_generic {
        props
            - RecursiveTypeProperties::HAS_TYPE_PARAMETER
            - RecursiveTypeProperties::HAS_DEPENDENT_MEMBER
    } else {
        props
    }
}
