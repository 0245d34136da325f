//! Demangling trees for runtime context descriptors.
//!
//! Symbolic references in a mangled name point at context descriptors
//! rather than spelling the entity out. A metadata reader walks the
//! descriptor's parent chain and hands the path here as a list of
//! [`ContextComponent`]s; [`build_demangling_for_context`] turns it into the
//! `Type` tree the demangler would have produced for the spelled-out name.

use crate::demangler::demangle_type;
use crate::error::{unexpected, Result};
use crate::node::{Node, NodeKind};

/// Length of a NUL-terminated mangled name that may embed symbolic
/// references.
///
/// Reference bytes `0x01..=0x17` carry a 4-byte relative offset and
/// `0x18..=0x1F` an absolute pointer, either of which may contain zero
/// bytes. The terminator is not counted; a name without one ends at the
/// end of `bytes`.
pub fn mangled_name_length(bytes: &[u8], pointer_size: usize) -> usize {
    let mut end = 0;
    while let Some(&byte) = bytes.get(end) {
        match byte {
            0 => break,
            0x01..=0x17 => end += 4,
            0x18..=0x1F => end += pointer_size,
            _ => {}
        }
        end += 1;
    }
    end.min(bytes.len())
}

/// Kind of a nominal type context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NominalContextKind {
    Class,
    Struct,
    Enum,
    /// A type kind this crate has no dedicated node for.
    Other,
}

impl NominalContextKind {
    fn node_kinds(self) -> (NodeKind, NodeKind) {
        match self {
            NominalContextKind::Class => (NodeKind::Class, NodeKind::BoundGenericClass),
            NominalContextKind::Struct => (NodeKind::Structure, NodeKind::BoundGenericStructure),
            NominalContextKind::Enum => (NodeKind::Enum, NodeKind::BoundGenericEnum),
            NominalContextKind::Other => (
                NodeKind::OtherNominalType,
                NodeKind::BoundGenericOtherNominalType,
            ),
        }
    }
}

/// One context descriptor on the path from a module to an entity.
///
/// `generic_params` counts every generic parameter visible in the context,
/// including those introduced by its parents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContextComponent {
    Module {
        name: String,
    },
    Extension {
        /// Mangled type name of the extended type.
        extended_type: String,
        generic_params: usize,
    },
    Protocol {
        name: String,
    },
    Nominal {
        kind: NominalContextKind,
        name: String,
        generic_params: usize,
    },
    /// A context with no stable name, identified by its descriptor address.
    Anonymous {
        address: u64,
        generic_params: usize,
    },
}

/// Builds the `Type` tree for the context path `path`, outermost first.
///
/// `generic_args` are the demangled arguments of every generic parameter
/// along the path, outermost first. Each generic context takes the
/// arguments it introduces. A protocol ends the path.
pub fn build_demangling_for_context(
    path: &[ContextComponent],
    generic_args: &[Node],
) -> Result<Node> {
    let mut used_args = 0;
    let mut take_args = |generic_params: usize| -> Option<Node> {
        if generic_args.is_empty() || generic_params <= used_args {
            return None;
        }
        let args = generic_args
            .iter()
            .take(generic_params)
            .skip(used_args)
            .cloned()
            .collect();
        used_args = generic_params;
        Some(Node::with_children(NodeKind::TypeList, args))
    };

    let mut current: Option<Node> = None;
    for component in path {
        let next = match component {
            ContextComponent::Module { name } => {
                if current.is_some() {
                    return Err(unexpected!("module {name} is not the outermost context"));
                }
                Node::with_text(NodeKind::Module, name.as_str())
            }
            ContextComponent::Extension {
                extended_type,
                generic_params,
            } => {
                let parent = current
                    .take()
                    .ok_or_else(|| unexpected!("extension has no parent context"))?;
                let mut self_type = demangle_type(extended_type)?.unwrap_type().clone();
                if is_bound_generic(self_type.kind) {
                    let kind = self_type.kind;
                    let unbound = self_type
                        .children
                        .into_iter()
                        .next()
                        .ok_or_else(|| unexpected!("{kind} has no unbound type"))?;
                    self_type = match take_args(*generic_params) {
                        Some(args) => Node::with_children(kind, vec![unbound, args]),
                        None => unbound.unwrap_type().clone(),
                    };
                }
                Node::with_children(NodeKind::Extension, vec![parent, self_type])
            }
            ContextComponent::Protocol { name } => {
                let parent = current
                    .take()
                    .ok_or_else(|| unexpected!("protocol {name} has no parent context"))?;
                let protocol = Node::with_children(
                    NodeKind::Protocol,
                    vec![parent, Node::with_text(NodeKind::Identifier, name.as_str())],
                );
                return Ok(Node::ty(protocol));
            }
            ContextComponent::Nominal {
                kind,
                name,
                generic_params,
            } => {
                let parent = current
                    .take()
                    .ok_or_else(|| unexpected!("type {name} has no parent context"))?;
                let (kind, bound_kind) = kind.node_kinds();
                let nominal = Node::with_children(
                    kind,
                    vec![parent, Node::with_text(NodeKind::Identifier, name.as_str())],
                );
                match take_args(*generic_params) {
                    Some(args) => Node::with_children(bound_kind, vec![Node::ty(nominal), args]),
                    None => nominal,
                }
            }
            ContextComponent::Anonymous {
                address,
                generic_params,
            } => {
                let parent = current
                    .take()
                    .ok_or_else(|| unexpected!("anonymous context has no parent context"))?;
                let args = take_args(*generic_params)
                    .unwrap_or_else(|| Node::new(NodeKind::TypeList));
                Node::with_children(
                    NodeKind::AnonymousContext,
                    vec![
                        Node::with_text(NodeKind::Identifier, format!("${address:x}")),
                        parent,
                        args,
                    ],
                )
            }
        };
        current = Some(next);
    }

    let node = current.ok_or_else(|| unexpected!("empty context path"))?;
    tracing::trace!(kind = %node.kind, "built context demangling");
    Ok(Node::ty(node))
}

fn is_bound_generic(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::BoundGenericEnum
            | NodeKind::BoundGenericStructure
            | NodeKind::BoundGenericClass
            | NodeKind::BoundGenericOtherNominalType
    )
}

#[cfg(test)]
mod tests;
