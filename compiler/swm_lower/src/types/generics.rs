//! Generic parameters, signatures and requirements.

use std::fmt;

use super::{AType, ProtocolDecl};

/// `τ_depth_index`: the `index`-th generic parameter introduced at nesting
/// level `depth`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenericParam {
    pub depth: u32,
    pub index: u32,
}

impl GenericParam {
    pub fn new(depth: u32, index: u32) -> Self {
        GenericParam { depth, index }
    }
}

impl fmt::Display for GenericParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "τ_{}_{}", self.depth, self.index)
    }
}

/// One `where` clause entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// `subject: Protocol`
    Conformance {
        subject: AType,
        protocol: ProtocolDecl,
    },
    /// `subject: SomeClass`
    Superclass { subject: AType, superclass: AType },
    /// `subject == other`
    SameType { subject: AType, other: AType },
    /// `subject: AnyObject` and friends, by their mangling letter.
    Layout { subject: AType, constraint: String },
}

impl Requirement {
    pub fn subject(&self) -> &AType {
        match self {
            Requirement::Conformance { subject, .. }
            | Requirement::Superclass { subject, .. }
            | Requirement::SameType { subject, .. }
            | Requirement::Layout { subject, .. } => subject,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Conformance { subject, protocol } => write!(f, "{subject} : {protocol}"),
            Requirement::Superclass {
                subject,
                superclass,
            } => write!(f, "{subject} : {superclass}"),
            Requirement::SameType { subject, other } => write!(f, "{subject} == {other}"),
            Requirement::Layout {
                subject,
                constraint,
            } => write!(f, "{subject} : _layout({constraint})"),
        }
    }
}

/// Generic parameters of a declaration and the requirements on them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct GenericSignature {
    pub params: Vec<GenericParam>,
    pub requirements: Vec<Requirement>,
}

impl GenericSignature {
    /// Parameters not fixed to another type by a same-type requirement.
    pub fn canonical_params(&self) -> impl Iterator<Item = GenericParam> + '_ {
        self.params.iter().copied().filter(|&param| {
            !self.requirements.iter().any(|requirement| {
                matches!(
                    requirement,
                    Requirement::SameType { subject: AType::GenericParam(p), .. } if *p == param
                )
            })
        })
    }

    /// Class bound of `ty`, if a requirement names one.
    pub fn superclass_bound(&self, ty: &AType) -> Option<&AType> {
        self.requirements.iter().find_map(|requirement| match requirement {
            Requirement::Superclass {
                subject,
                superclass,
            } if subject == ty => Some(superclass),
            _ => None,
        })
    }

    /// Protocols `ty` is required to conform to, in requirement order.
    pub fn conformances<'a>(&'a self, ty: &'a AType) -> impl Iterator<Item = &'a ProtocolDecl> {
        self.requirements
            .iter()
            .filter_map(move |requirement| match requirement {
                Requirement::Conformance { subject, protocol } if subject == ty => Some(protocol),
                _ => None,
            })
    }

    /// Whether `ty` can only be bound to class types.
    pub fn requires_class(&self, ty: &AType) -> bool {
        self.superclass_bound(ty).is_some()
            || self.conformances(ty).any(|protocol| protocol.requires_class)
            || self.requirements.iter().any(|requirement| {
                matches!(
                    requirement,
                    Requirement::Layout { subject, constraint }
                        if subject == ty && constraint == "C"
                )
            })
    }
}

impl fmt::Display for GenericSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        for (i, requirement) in self.requirements.iter().enumerate() {
            f.write_str(if i == 0 { " where " } else { ", " })?;
            write!(f, "{requirement}")?;
        }
        f.write_str(">")
    }
}

/// A piece of generic context a polymorphic function needs at runtime:
/// metadata for a type parameter, or its witness table for a protocol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericRequirement {
    pub type_parameter: AType,
    pub protocol: Option<ProtocolDecl>,
}

/// Every runtime requirement of `signature`, in calling-convention order:
/// metadata for each canonical parameter, then one witness table per
/// conformance requirement.
pub fn enumerate_generic_requirements(
    signature: Option<&GenericSignature>,
) -> Vec<GenericRequirement> {
    let Some(signature) = signature else {
        return Vec::new();
    };
    let metadata = signature
        .canonical_params()
        .map(|param| GenericRequirement {
            type_parameter: AType::GenericParam(param),
            protocol: None,
        });
    let witness_tables = signature
        .requirements
        .iter()
        .filter_map(|requirement| match requirement {
            Requirement::Conformance { subject, protocol } => Some(GenericRequirement {
                type_parameter: subject.clone(),
                protocol: Some(protocol.clone()),
            }),
            _ => None,
        });
    metadata.chain(witness_tables).collect()
}

/// The conformance a witness method is implemented for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProtocolConformanceRef {
    pub protocol: ProtocolDecl,
    /// The conforming type, when the conformance is concrete.
    pub conforming_type: Option<AType>,
}

impl ProtocolConformanceRef {
    pub fn is_concrete(&self) -> bool {
        self.conforming_type.is_some()
    }
}
