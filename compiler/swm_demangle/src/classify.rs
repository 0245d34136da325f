//! Symbol classification.
//!
//! Node predicates look through any number of `Type` wrappers. The string
//! classifiers demangle their input and answer `false` (or `""`) when it does
//! not parse; none of them report errors.

use crate::demangler::{demangle_symbol, demangle_type};
use crate::mangling::mangling_prefix_length;
use crate::node::{Node, NodeKind};

impl Node {
    fn strip_types(&self) -> &Node {
        let mut node = self;
        while node.kind == NodeKind::Type && !node.children.is_empty() {
            node = node.unwrap_type();
        }
        node
    }

    pub fn is_alias_node(&self) -> bool {
        self.strip_types().kind == NodeKind::TypeAlias
    }

    pub fn is_class_node(&self) -> bool {
        matches!(
            self.strip_types().kind,
            NodeKind::Class | NodeKind::BoundGenericClass
        )
    }

    pub fn is_enum_node(&self) -> bool {
        matches!(
            self.strip_types().kind,
            NodeKind::Enum | NodeKind::BoundGenericEnum
        )
    }

    pub fn is_protocol_node(&self) -> bool {
        matches!(
            self.strip_types().kind,
            NodeKind::Protocol | NodeKind::ProtocolSymbolicReference
        )
    }

    pub fn is_struct_node(&self) -> bool {
        matches!(
            self.strip_types().kind,
            NodeKind::Structure | NodeKind::BoundGenericStructure
        )
    }
}

/// Suffixes of new-mangling symbols that may name a thunk.
const THUNK_SUFFIXES: [&str; 8] = ["TA", "Ta", "To", "TO", "TR", "Tr", "TW", "fC"];

/// Thunk suffixes whose target cannot be derived from the name.
const OPAQUE_THUNK_SUFFIXES: [&str; 3] = ["TR", "Tr", "TW"];

/// Leading kinds of symbols that do not use the native calling convention.
const NON_SWIFT_CALLING_CONVENTION: [NodeKind; 9] = [
    NodeKind::TypeMetadataAccessFunction,
    NodeKind::ValueWitness,
    NodeKind::ProtocolWitnessTableAccessor,
    NodeKind::GenericProtocolWitnessTableInstantiationFunction,
    NodeKind::LazyProtocolWitnessTableAccessor,
    NodeKind::AssociatedTypeMetadataAccessor,
    NodeKind::AssociatedTypeWitnessTableAccessor,
    NodeKind::BaseWitnessTableAccessor,
    NodeKind::ObjCAttribute,
];

pub fn is_mangled_name(name: &str) -> bool {
    mangling_prefix_length(name.as_bytes()) != 0
}

pub fn is_alias(name: &str) -> bool {
    demangle_type(name).is_ok_and(|node| node.is_alias_node())
}

pub fn is_class(name: &str) -> bool {
    demangle_type(name).is_ok_and(|node| node.is_class_node())
}

pub fn is_enum(name: &str) -> bool {
    demangle_type(name).is_ok_and(|node| node.is_enum_node())
}

pub fn is_protocol(name: &str) -> bool {
    demangle_type(name).is_ok_and(|node| node.is_protocol_node())
}

pub fn is_struct(name: &str) -> bool {
    demangle_type(name).is_ok_and(|node| node.is_struct_node())
}

/// Whether the symbol names an entity imported from Objective-C or C.
pub fn is_objc_symbol(name: &str) -> bool {
    let body = &name.as_bytes()[mangling_prefix_length(name.as_bytes())..];
    body.starts_with(b"So") || body.starts_with(b"SC")
}

/// Whether the symbol is a thunk: a forwarder, bridging thunk,
/// reabstraction thunk, protocol witness or allocating constructor.
///
/// Old-style `_T` manglings are recognized by prefix alone.
pub fn is_thunk_symbol(name: &str) -> bool {
    if is_mangled_name(name) {
        if !THUNK_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            return false;
        }
        // The suffix test alone has false positives.
        let Ok(global) = demangle_symbol(name) else {
            return false;
        };
        if global.kind != NodeKind::Global {
            return false;
        }
        return global.first_child().is_some_and(|top| {
            matches!(
                top.kind,
                NodeKind::ObjCAttribute
                    | NodeKind::NonObjCAttribute
                    | NodeKind::PartialApplyObjCForwarder
                    | NodeKind::PartialApplyForwarder
                    | NodeKind::ReabstractionThunkHelper
                    | NodeKind::ReabstractionThunk
                    | NodeKind::ProtocolWitness
                    | NodeKind::Allocator
            )
        });
    }

    if let Some(rest) = name.strip_prefix("_T") {
        return ["To", "TO", "PA_", "PAo_"]
            .iter()
            .any(|prefix| rest.starts_with(prefix));
    }
    false
}

/// Symbol of the function a thunk forwards to, when the name encodes it.
///
/// An allocating constructor (`fC`) targets its initializing constructor
/// (`fc`); other derivable thunks drop their two-character suffix.
pub fn thunk_target(name: &str) -> Option<String> {
    if !is_thunk_symbol(name) || !is_mangled_name(name) {
        return None;
    }
    if OPAQUE_THUNK_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
    {
        return None;
    }
    if let Some(stem) = name.strip_suffix("fC") {
        return Some(format!("{stem}fc"));
    }
    name.get(..name.len() - 2).map(str::to_owned)
}

/// Whether the symbol is called with the native calling convention.
pub fn has_swift_calling_convention(name: &str) -> bool {
    let Ok(global) = demangle_symbol(name) else {
        return false;
    };
    if global.kind != NodeKind::Global {
        return false;
    }
    global
        .first_child()
        .is_some_and(|top| !NON_SWIFT_CALLING_CONVENTION.contains(&top.kind))
}

/// Name of the module the symbol's entity is declared in, or `""`.
pub fn module_name(name: &str) -> String {
    let Ok(global) = demangle_symbol(name) else {
        return String::new();
    };
    let mut node = global;
    loop {
        node = match node.kind {
            NodeKind::Module => return node.text().to_owned(),
            NodeKind::TypeMangling | NodeKind::Type => match node.children.into_iter().next() {
                Some(child) => child,
                None => return String::new(),
            },
            NodeKind::Global => {
                match node
                    .children
                    .into_iter()
                    .find(|child| !child.kind.is_function_attr())
                {
                    Some(child) => child,
                    None => return String::new(),
                }
            }
            _ if node.is_specialized() => match node.unspecialized() {
                Some(unspecialized) => unspecialized,
                None => return String::new(),
            },
            kind if kind.is_context() => match node.children.into_iter().next() {
                Some(child) => child,
                None => return String::new(),
            },
            _ => return String::new(),
        };
    }
}

#[cfg(test)]
mod tests;
