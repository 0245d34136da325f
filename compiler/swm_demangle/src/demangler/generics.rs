//! Generic arguments, signatures, requirements and archetypes.

use super::{dependent_generic_param_type, Demangler, Require};
use crate::error::Result;
use crate::mangling::node_consumes_generic_args;
use crate::node::{Node, NodeKind};
use crate::stack::ensure_sufficient_stack;

/// Bound generic argument lists, innermost first, plus any retroactive
/// conformances.
struct BoundGenerics {
    type_lists: Vec<Node>,
    retroactive_conformances: Option<Node>,
}

#[derive(Clone, Copy)]
enum ConstrainedType {
    Generic,
    Assoc,
    CompoundAssoc,
    Substitution,
}

#[derive(Clone, Copy)]
enum Constraint {
    Protocol,
    BaseClass,
    SameType,
    Layout,
}

impl Demangler<'_> {
    fn demangle_bound_generics(&mut self) -> Result<BoundGenerics> {
        let mut conformances: Vec<Node> = Vec::new();
        while let Some(conformance) = self.pop_kind(NodeKind::RetroactiveConformance) {
            conformances.push(conformance);
        }
        let retroactive_conformances = if conformances.is_empty() {
            None
        } else {
            conformances.reverse();
            Some(Node::with_children(NodeKind::TypeList, conformances))
        };

        let mut type_lists = Vec::new();
        loop {
            let mut types = Vec::new();
            while let Some(ty) = self.pop_kind(NodeKind::Type) {
                types.push(ty);
            }
            types.reverse();
            type_lists.push(Node::with_children(NodeKind::TypeList, types));

            if self.pop_kind(NodeKind::EmptyList).is_some() {
                break;
            }
            self.pop_kind(NodeKind::FirstElementMarker).require(self.pos)?;
        }
        Ok(BoundGenerics {
            type_lists,
            retroactive_conformances,
        })
    }

    pub(super) fn demangle_bound_generic_type(&mut self) -> Result<Node> {
        let BoundGenerics {
            type_lists,
            retroactive_conformances,
        } = self.demangle_bound_generics()?;
        let nominal = self.pop_type_and_get_any_generic()?;
        let mut bound = self.demangle_bound_generic_args(nominal, &type_lists, 0)?;
        if let Some(conformances) = retroactive_conformances {
            bound.add_child(conformances);
        }
        let ty = Node::ty(bound);
        self.add_substitution(ty.clone());
        Ok(ty)
    }

    /// Applies `type_lists[idx..]` to `nominal` and its parent contexts.
    ///
    /// The first list belongs to the innermost generic context; each
    /// context that consumes generic arguments takes the next one.
    fn demangle_bound_generic_args(
        &self,
        nominal: Node,
        type_lists: &[Node],
        idx: usize,
    ) -> Result<Node> {
        ensure_sufficient_stack(|| self.bind_generic_args(nominal, type_lists, idx))
    }

    fn bind_generic_args(
        &self,
        nominal: Node,
        type_lists: &[Node],
        mut idx: usize,
    ) -> Result<Node> {
        self.ensure(idx < type_lists.len())?;

        if matches!(
            nominal.kind,
            NodeKind::TypeSymbolicReference | NodeKind::ProtocolSymbolicReference
        ) {
            let remaining: Vec<Node> = type_lists[idx..]
                .iter()
                .rev()
                .flat_map(|list| list.children.iter().cloned())
                .collect();
            return Ok(Node::with_children(
                NodeKind::BoundGenericOtherNominalType,
                vec![
                    Node::ty(nominal),
                    Node::with_children(NodeKind::TypeList, remaining),
                ],
            ));
        }

        let context = nominal.first_child().require(self.pos)?.clone();
        let consumes_generic_args = node_consumes_generic_args(nominal.kind);
        let args = type_lists[idx].clone();
        if consumes_generic_args {
            idx += 1;
        }

        let mut nominal = nominal;
        if idx < type_lists.len() {
            let bound_parent = if context.kind == NodeKind::Extension {
                let extended = context.child(1).require(self.pos)?.clone();
                let bound = self.demangle_bound_generic_args(extended, type_lists, idx)?;
                let mut extension = Node::with_children(
                    NodeKind::Extension,
                    vec![context.first_child().require(self.pos)?.clone(), bound],
                );
                if let Some(signature) = context.child(2) {
                    extension.add_child(signature.clone());
                }
                extension
            } else {
                self.demangle_bound_generic_args(context, type_lists, idx)?
            };
            nominal.children[0] = bound_parent;
        }

        if !consumes_generic_args || args.children.is_empty() {
            return Ok(nominal);
        }

        let kind = match nominal.kind {
            NodeKind::Class => NodeKind::BoundGenericClass,
            NodeKind::Structure => NodeKind::BoundGenericStructure,
            NodeKind::Enum => NodeKind::BoundGenericEnum,
            NodeKind::Protocol => NodeKind::BoundGenericProtocol,
            NodeKind::OtherNominalType => NodeKind::BoundGenericOtherNominalType,
            NodeKind::TypeAlias => NodeKind::BoundGenericTypeAlias,
            NodeKind::Function | NodeKind::Constructor => {
                return Ok(Node::with_children(
                    NodeKind::BoundGenericFunction,
                    vec![nominal, args],
                ));
            }
            _ => return Err(self.failure()),
        };
        Ok(Node::with_children(kind, vec![Node::ty(nominal), args]))
    }

    // ── Archetypes ──────────────────────────────────────────────────

    pub(super) fn demangle_archetype(&mut self) -> Result<Node> {
        match self.next_char()? {
            b'a' => {
                let ident = self.pop_kind(NodeKind::Identifier).require(self.pos)?;
                let archetype = self.pop_type_and_get_child()?;
                let assoc = Node::ty(Node::with_children(
                    NodeKind::AssociatedTypeRef,
                    vec![archetype, ident],
                ));
                self.add_substitution(assoc.clone());
                Ok(assoc)
            }
            b'O' => {
                let defining_context = self.pop_context()?;
                Ok(Node::with_child(NodeKind::OpaqueReturnTypeOf, defining_context))
            }
            b'o' => {
                let index = self.demangle_index()?;
                let BoundGenerics {
                    mut type_lists,
                    retroactive_conformances,
                } = self.demangle_bound_generics()?;
                let name = self.pop().require(self.pos)?;
                type_lists.reverse();
                let mut opaque = Node::with_children(
                    NodeKind::OpaqueType,
                    vec![
                        name,
                        Node::with_index(NodeKind::Index, index as u64),
                        Node::with_children(NodeKind::TypeList, type_lists),
                    ],
                );
                if let Some(conformances) = retroactive_conformances {
                    opaque.add_child(conformances);
                }
                let ty = Node::ty(opaque);
                self.add_substitution(ty.clone());
                Ok(ty)
            }
            b'r' => Ok(Node::ty(Node::new(NodeKind::OpaqueReturnType))),
            b'y' => {
                let param = self.demangle_generic_param_index()?;
                let ty = self.demangle_associated_type_simple(param)?;
                self.add_substitution(ty.clone());
                Ok(ty)
            }
            b'z' => {
                let ty = self.demangle_associated_type_simple(dependent_generic_param_type(0, 0))?;
                self.add_substitution(ty.clone());
                Ok(ty)
            }
            b'Y' => {
                let param = self.demangle_generic_param_index()?;
                let ty = self.demangle_associated_type_compound(param)?;
                self.add_substitution(ty.clone());
                Ok(ty)
            }
            b'Z' => {
                let ty =
                    self.demangle_associated_type_compound(dependent_generic_param_type(0, 0))?;
                self.add_substitution(ty.clone());
                Ok(ty)
            }
            _ => Err(self.failure()),
        }
    }

    fn demangle_associated_type_simple(&mut self, param: Node) -> Result<Node> {
        let assoc_name = self.pop_assoc_type_name()?;
        Ok(Node::ty(Node::with_children(
            NodeKind::DependentMemberType,
            vec![Node::ty(param), assoc_name],
        )))
    }

    fn demangle_associated_type_compound(&mut self, param: Node) -> Result<Node> {
        let mut names = Vec::new();
        loop {
            let first = self.pop_kind(NodeKind::FirstElementMarker).is_some();
            names.push(self.pop_assoc_type_name()?);
            if first {
                break;
            }
        }
        let mut base = param;
        while let Some(assoc) = names.pop() {
            base = Node::with_children(
                NodeKind::DependentMemberType,
                vec![Node::ty(base), assoc],
            );
        }
        Ok(Node::ty(base))
    }

    /// `d<depth>_<index>_`, `z` for the first parameter, or `<index>_`.
    pub(super) fn demangle_generic_param_index(&mut self) -> Result<Node> {
        if self.next_if(b'd') {
            let depth = self.demangle_index_plus_one()?;
            let index = self.demangle_index()?;
            return Ok(dependent_generic_param_type(depth as u64, index as u64));
        }
        if self.next_if(b'z') {
            return Ok(dependent_generic_param_type(0, 0));
        }
        let index = self.demangle_index_plus_one()?;
        Ok(dependent_generic_param_type(0, index as u64))
    }

    // ── Signatures ──────────────────────────────────────────────────

    pub(super) fn demangle_protocol_list(&mut self) -> Result<Node> {
        let mut list = Node::new(NodeKind::TypeList);
        if self.pop_kind(NodeKind::EmptyList).is_none() {
            loop {
                let first = self.pop_kind(NodeKind::FirstElementMarker).is_some();
                list.add_child(self.pop_protocol()?);
                if first {
                    break;
                }
            }
            list.reverse_children_from(0);
        }
        Ok(Node::with_child(NodeKind::ProtocolList, list))
    }

    pub(super) fn demangle_generic_signature(&mut self, has_param_counts: bool) -> Result<Node> {
        let mut signature = Node::new(NodeKind::DependentGenericSignature);
        if has_param_counts {
            while !self.next_if(b'l') {
                let count = if self.next_if(b'z') {
                    0
                } else {
                    self.demangle_index_plus_one()?
                };
                signature.add_child(Node::with_index(
                    NodeKind::DependentGenericParamCount,
                    count as u64,
                ));
            }
        } else {
            signature.add_child(Node::with_index(NodeKind::DependentGenericParamCount, 1));
        }
        let num_counts = signature.num_children();
        while let Some(requirement) = self.pop_if(NodeKind::is_requirement) {
            signature.add_child(requirement);
        }
        signature.reverse_children_from(num_counts);
        Ok(signature)
    }

    pub(super) fn demangle_generic_requirement(&mut self) -> Result<Node> {
        let (constraint, type_kind) = match self.next_char()? {
            b'c' => (Constraint::BaseClass, ConstrainedType::Assoc),
            b'C' => (Constraint::BaseClass, ConstrainedType::CompoundAssoc),
            b'b' => (Constraint::BaseClass, ConstrainedType::Generic),
            b'B' => (Constraint::BaseClass, ConstrainedType::Substitution),
            b't' => (Constraint::SameType, ConstrainedType::Assoc),
            b'T' => (Constraint::SameType, ConstrainedType::CompoundAssoc),
            b's' => (Constraint::SameType, ConstrainedType::Generic),
            b'S' => (Constraint::SameType, ConstrainedType::Substitution),
            b'm' => (Constraint::Layout, ConstrainedType::Assoc),
            b'M' => (Constraint::Layout, ConstrainedType::CompoundAssoc),
            b'l' => (Constraint::Layout, ConstrainedType::Generic),
            b'L' => (Constraint::Layout, ConstrainedType::Substitution),
            b'p' => (Constraint::Protocol, ConstrainedType::Assoc),
            b'P' => (Constraint::Protocol, ConstrainedType::CompoundAssoc),
            b'Q' => (Constraint::Protocol, ConstrainedType::Substitution),
            _ => {
                self.push_back();
                (Constraint::Protocol, ConstrainedType::Generic)
            }
        };

        let constrained = match type_kind {
            ConstrainedType::Generic => Node::ty(self.demangle_generic_param_index()?),
            ConstrainedType::Assoc => {
                let param = self.demangle_generic_param_index()?;
                let ty = self.demangle_associated_type_simple(param)?;
                self.add_substitution(ty.clone());
                ty
            }
            ConstrainedType::CompoundAssoc => {
                let param = self.demangle_generic_param_index()?;
                let ty = self.demangle_associated_type_compound(param)?;
                self.add_substitution(ty.clone());
                ty
            }
            ConstrainedType::Substitution => self.pop_kind(NodeKind::Type).require(self.pos)?,
        };

        match constraint {
            Constraint::Protocol => Ok(Node::with_children(
                NodeKind::DependentGenericConformanceRequirement,
                vec![constrained, self.pop_protocol()?],
            )),
            Constraint::BaseClass => {
                let superclass = self.pop_kind(NodeKind::Type).require(self.pos)?;
                Ok(Node::with_children(
                    NodeKind::DependentGenericConformanceRequirement,
                    vec![constrained, superclass],
                ))
            }
            Constraint::SameType => {
                let same = self.pop_kind(NodeKind::Type).require(self.pos)?;
                Ok(Node::with_children(
                    NodeKind::DependentGenericSameTypeRequirement,
                    vec![constrained, same],
                ))
            }
            Constraint::Layout => self.demangle_layout_requirement(constrained),
        }
    }

    fn demangle_layout_requirement(&mut self, constrained: Node) -> Result<Node> {
        let c = self.next_char()?;
        let mut requirement = Node::with_children(
            NodeKind::DependentGenericLayoutRequirement,
            vec![
                constrained,
                Node::with_text(NodeKind::Identifier, char::from(c).to_string()),
            ],
        );
        match c {
            b'U' | b'R' | b'N' | b'C' | b'D' | b'T' => {}
            b'E' | b'M' => {
                requirement.add_child(self.demangle_index_as_node()?);
                requirement.add_child(self.demangle_index_as_node()?);
            }
            b'e' | b'm' => requirement.add_child(self.demangle_index_as_node()?),
            _ => return Err(self.failure()),
        }
        Ok(requirement)
    }

    pub(super) fn demangle_generic_type(&mut self) -> Result<Node> {
        let signature = self
            .pop_kind(NodeKind::DependentGenericSignature)
            .require(self.pos)?;
        let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
        Ok(Node::ty(Node::with_children(
            NodeKind::DependentGenericType,
            vec![signature, ty],
        )))
    }
}
