//! Nominal types, protocols and existentials.

use std::fmt;
use std::hash::{Hash, Hasher};

use swm_demangle::mangling::STDLIB_NAME;

use super::AType;

/// Identity of a runtime metadata record, as handed out by the metadata
/// reader. Two types with the same id are the same type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetadataId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NominalKind {
    Struct,
    Enum,
    Class,
}

/// Declaration of a struct, enum or class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NominalDecl {
    pub kind: NominalKind,
    pub module: String,
    /// Dotted name relative to the module, such as `Outer.Inner`.
    pub name: String,
}

impl NominalDecl {
    pub fn new(kind: NominalKind, module: impl Into<String>, name: impl Into<String>) -> Self {
        NominalDecl {
            kind,
            module: module.into(),
            name: name.into(),
        }
    }

    pub fn is_optional(&self) -> bool {
        self.kind == NominalKind::Enum && self.module == STDLIB_NAME && self.name == "Optional"
    }
}

/// A non-generic nominal type with its runtime metadata.
#[derive(Clone, Debug)]
pub struct NominalType {
    pub decl: NominalDecl,
    pub metadata: MetadataId,
    /// Number of cases, for enums.
    pub case_count: Option<usize>,
}

/// A protocol declaration.
///
/// Identity is the qualified name; the flags are facts about the
/// declaration read from its descriptor.
#[derive(Clone, Debug)]
pub struct ProtocolDecl {
    pub module: String,
    pub name: String,
    /// Only classes may conform.
    pub requires_class: bool,
    pub is_objc: bool,
}

impl ProtocolDecl {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        ProtocolDecl {
            module: module.into(),
            name: name.into(),
            requires_class: false,
            is_objc: false,
        }
    }

    pub fn is_error(&self) -> bool {
        self.module == STDLIB_NAME && self.name == "Error"
    }
}

impl PartialEq for ProtocolDecl {
    fn eq(&self, other: &Self) -> bool {
        self.module == other.module && self.name == other.name
    }
}

impl Eq for ProtocolDecl {}

impl Hash for ProtocolDecl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.module.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for ProtocolDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// A protocol or protocol composition type, `any P & Q`.
#[derive(Clone, Debug)]
pub struct ExistentialType {
    pub metadata: MetadataId,
    pub protocols: Vec<ProtocolDecl>,
    pub superclass: Option<Box<AType>>,
    pub has_explicit_any_object: bool,
}

impl ExistentialType {
    /// Exactly one protocol and nothing else.
    pub fn is_single_protocol(&self) -> bool {
        self.protocols.len() == 1 && self.superclass.is_none() && !self.has_explicit_any_object
    }

    pub fn layout(&self) -> ExistentialLayout {
        let requires_class = self.superclass.is_some()
            || self.has_explicit_any_object
            || self.protocols.iter().any(|p| p.requires_class);
        let kind = if self.is_single_protocol() && self.protocols[0].is_error() {
            ExistentialLayoutKind::Error
        } else if requires_class {
            ExistentialLayoutKind::Class
        } else {
            ExistentialLayoutKind::Opaque
        };
        ExistentialLayout {
            kind,
            explicit_superclass: self.superclass.as_deref().cloned(),
            has_explicit_any_object: self.has_explicit_any_object,
            contains_non_objc_protocol: self.protocols.iter().any(|p| !p.is_objc),
            requires_class,
            number_of_protocols: self.protocols.len(),
        }
    }
}

impl fmt::Display for ExistentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(superclass) = &self.superclass {
            parts.push(superclass.to_string());
        }
        parts.extend(self.protocols.iter().map(|p| p.name.clone()));
        if self.has_explicit_any_object {
            parts.push("AnyObject".to_owned());
        }
        if parts.is_empty() {
            return f.write_str("Any");
        }
        f.write_str(&parts.join(" & "))
    }
}

/// How an existential value is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExistentialLayoutKind {
    /// Class reference followed by one witness table per protocol.
    Class,
    /// A single boxed `Error` reference.
    Error,
    /// Inline value buffer, metadata and witness tables.
    Opaque,
}

/// Storage facts of an existential type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExistentialLayout {
    pub kind: ExistentialLayoutKind,
    pub explicit_superclass: Option<AType>,
    pub has_explicit_any_object: bool,
    pub contains_non_objc_protocol: bool,
    pub requires_class: bool,
    pub number_of_protocols: usize,
}

impl ExistentialLayout {
    /// Class-bound with only Objective-C protocols.
    pub fn is_objc(&self) -> bool {
        (self.explicit_superclass.is_some()
            || self.has_explicit_any_object
            || self.number_of_protocols > 0)
            && !self.contains_non_objc_protocol
    }

    /// Exactly `AnyObject`.
    pub fn is_any_object(&self) -> bool {
        self.has_explicit_any_object
            && self.explicit_superclass.is_none()
            && self.number_of_protocols == 0
    }

    pub fn superclass(&self) -> Option<&AType> {
        self.explicit_superclass.as_ref()
    }
}
