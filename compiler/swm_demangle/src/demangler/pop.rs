//! Node stack operations shared by the productions.

use super::{Demangler, Require};
use crate::error::Result;
use crate::node::{Node, NodeKind};

impl Demangler<'_> {
    pub(super) fn pop(&mut self) -> Option<Node> {
        self.node_stack.pop()
    }

    pub(super) fn pop_kind(&mut self, kind: NodeKind) -> Option<Node> {
        self.pop_if(|k| k == kind)
    }

    pub(super) fn pop_if(&mut self, pred: impl Fn(NodeKind) -> bool) -> Option<Node> {
        match self.node_stack.last() {
            Some(top) if pred(top.kind) => self.node_stack.pop(),
            _ => None,
        }
    }

    pub(super) fn pop_function_type(&mut self, kind: NodeKind) -> Result<Node> {
        let mut func = Node::new(kind);
        if let Some(throws) = self.pop_kind(NodeKind::ThrowsAnnotation) {
            func.add_child(throws);
        }
        func.add_child(self.pop_function_params(NodeKind::ArgumentTuple)?);
        func.add_child(self.pop_function_params(NodeKind::ReturnType)?);
        Ok(Node::ty(func))
    }

    pub(super) fn pop_function_params(&mut self, kind: NodeKind) -> Result<Node> {
        if self.pop_kind(NodeKind::EmptyList).is_some() {
            return Ok(Node::with_child(
                kind,
                Node::ty(Node::new(NodeKind::Tuple)),
            ));
        }
        let params = self.pop_kind(NodeKind::Type).require(self.pos)?;
        if kind != NodeKind::ArgumentTuple {
            return Ok(Node::with_child(kind, params));
        }
        let inner = params.first_child().require(self.pos)?;
        let num_params = if inner.kind == NodeKind::Tuple {
            inner.num_children()
        } else {
            1
        };
        let mut node = Node::with_index(kind, num_params as u64);
        node.add_child(params);
        Ok(node)
    }

    /// Pops the argument labels for a function type mangling.
    ///
    /// Returns `None` when `ty` is not a function type; an empty `LabelList`
    /// means the function has no labelled parameters.
    pub(super) fn pop_function_param_labels(&mut self, ty: &Node) -> Result<Option<Node>> {
        if self.pop_kind(NodeKind::EmptyList).is_some() {
            return Ok(Some(Node::new(NodeKind::LabelList)));
        }
        if ty.kind != NodeKind::Type {
            return Ok(None);
        }

        let top = ty.first_child().require(self.pos)?;
        let func = if top.kind == NodeKind::DependentGenericType {
            top.child(1)
                .and_then(Node::first_child)
                .require(self.pos)?
        } else {
            top
        };
        if !matches!(
            func.kind,
            NodeKind::FunctionType | NodeKind::NoEscapeFunctionType
        ) {
            return Ok(None);
        }

        let mut params = func.first_child().require(self.pos)?;
        if params.kind == NodeKind::ThrowsAnnotation {
            params = func.child(1).require(self.pos)?;
        }
        self.ensure(params.kind == NodeKind::ArgumentTuple)?;
        let Some(count) = params.index() else {
            return Ok(None);
        };

        let is_tuple = params
            .first_child()
            .and_then(Node::first_child)
            .is_some_and(|tuple| tuple.kind == NodeKind::Tuple);
        if !is_tuple {
            return Ok(Some(Node::new(NodeKind::LabelList)));
        }

        let mut labels = Vec::new();
        let mut has_labels = false;
        for _ in 0..count {
            let label = self.pop().require(self.pos)?;
            self.ensure(matches!(
                label.kind,
                NodeKind::Identifier | NodeKind::FirstElementMarker
            ))?;
            has_labels |= label.kind != NodeKind::FirstElementMarker;
            labels.push(label);
        }
        if !has_labels {
            return Ok(Some(Node::new(NodeKind::LabelList)));
        }
        labels.reverse();
        Ok(Some(Node::with_children(NodeKind::LabelList, labels)))
    }

    pub(super) fn pop_tuple(&mut self) -> Result<Node> {
        let mut elements = Vec::new();
        if self.pop_kind(NodeKind::EmptyList).is_none() {
            loop {
                let first = self.pop_kind(NodeKind::FirstElementMarker).is_some();
                let mut element = Node::new(NodeKind::TupleElement);
                if let Some(variadic) = self.pop_kind(NodeKind::VariadicMarker) {
                    element.add_child(variadic);
                }
                if let Some(ident) = self.pop_kind(NodeKind::Identifier) {
                    element.add_child(Node::with_text(
                        NodeKind::TupleElementName,
                        ident.text(),
                    ));
                }
                element.add_child(self.pop_kind(NodeKind::Type).require(self.pos)?);
                elements.push(element);
                if first {
                    break;
                }
            }
            elements.reverse();
        }
        Ok(Node::ty(Node::with_children(NodeKind::Tuple, elements)))
    }

    pub(super) fn pop_type_list(&mut self) -> Result<Node> {
        let mut types = Vec::new();
        if self.pop_kind(NodeKind::EmptyList).is_none() {
            loop {
                let first = self.pop_kind(NodeKind::FirstElementMarker).is_some();
                types.push(self.pop_kind(NodeKind::Type).require(self.pos)?);
                if first {
                    break;
                }
            }
            types.reverse();
        }
        Ok(Node::with_children(NodeKind::TypeList, types))
    }

    pub(super) fn pop_protocol(&mut self) -> Result<Node> {
        if let Some(ty) = self.pop_kind(NodeKind::Type) {
            self.ensure(ty.first_child().is_some_and(|p| p.kind == NodeKind::Protocol))?;
            return Ok(ty);
        }
        let name = self.pop_if(NodeKind::is_decl_name).require(self.pos)?;
        let context = self.pop_context()?;
        Ok(Node::ty(Node::with_children(
            NodeKind::Protocol,
            vec![context, name],
        )))
    }

    pub(super) fn pop_module(&mut self) -> Option<Node> {
        if let Some(ident) = self.pop_kind(NodeKind::Identifier) {
            return Some(ident.changing_kind(NodeKind::Module));
        }
        self.pop_kind(NodeKind::Module)
    }

    pub(super) fn pop_context(&mut self) -> Result<Node> {
        if let Some(module) = self.pop_module() {
            return Ok(module);
        }
        if let Some(ty) = self.pop_kind(NodeKind::Type) {
            let child = ty.children.into_iter().next().require(self.pos)?;
            self.ensure(child.kind.is_context())?;
            return Ok(child);
        }
        self.pop_if(NodeKind::is_context).require(self.pos)
    }

    pub(super) fn pop_type_and_get_child(&mut self) -> Result<Node> {
        self.pop_kind(NodeKind::Type)
            .and_then(|ty| ty.children.into_iter().next())
            .require(self.pos)
    }

    pub(super) fn pop_type_and_get_any_generic(&mut self) -> Result<Node> {
        let child = self.pop_type_and_get_child()?;
        self.ensure(child.kind.is_any_generic())?;
        Ok(child)
    }

    pub(super) fn pop_protocol_conformance(&mut self) -> Result<Node> {
        let signature = self.pop_kind(NodeKind::DependentGenericSignature);
        let module = self.pop_module().require(self.pos)?;
        let protocol = self.pop_protocol()?;
        let mut ty = self.pop_kind(NodeKind::Type);
        let mut ident = None;
        if ty.is_none() {
            ident = self.pop_kind(NodeKind::Identifier);
            ty = self.pop_kind(NodeKind::Type);
        }
        let mut ty = ty.require(self.pos)?;
        if let Some(signature) = signature {
            ty = Node::ty(Node::with_children(
                NodeKind::DependentGenericType,
                vec![signature, ty],
            ));
        }
        let mut conformance =
            Node::with_children(NodeKind::ProtocolConformance, vec![ty, protocol, module]);
        if let Some(ident) = ident {
            conformance.add_child(ident);
        }
        Ok(conformance)
    }

    pub(super) fn pop_any_protocol_conformance_list(&mut self) -> Result<Node> {
        let mut list = Node::new(NodeKind::AnyProtocolConformanceList);
        if self.pop_kind(NodeKind::EmptyList).is_none() {
            loop {
                let first = self.pop_kind(NodeKind::FirstElementMarker).is_some();
                list.add_child(self.pop_any_protocol_conformance()?);
                if first {
                    break;
                }
            }
            list.reverse_children_from(0);
        }
        Ok(list)
    }

    pub(super) fn pop_any_protocol_conformance(&mut self) -> Result<Node> {
        self.pop_if(|kind| {
            kind == NodeKind::ConcreteProtocolConformance || is_dependent_conformance(kind)
        })
        .require(self.pos)
    }

    pub(super) fn pop_dependent_protocol_conformance(&mut self) -> Result<Node> {
        self.pop_if(is_dependent_conformance).require(self.pos)
    }

    pub(super) fn pop_dependent_associated_conformance(&mut self) -> Result<Node> {
        let protocol = self.pop_protocol()?;
        let dependent = self.pop_kind(NodeKind::Type).require(self.pos)?;
        Ok(Node::with_children(
            NodeKind::DependentAssociatedConformance,
            vec![dependent, protocol],
        ))
    }

    pub(super) fn pop_assoc_type_name(&mut self) -> Result<Node> {
        let mut protocol = self.pop_kind(NodeKind::Type);
        if let Some(p) = &protocol {
            self.ensure(p.is_protocol_node())?;
        } else {
            protocol = self.pop_kind(NodeKind::ProtocolSymbolicReference);
        }
        let ident = self.pop_kind(NodeKind::Identifier).require(self.pos)?;
        let mut assoc = Node::with_child(NodeKind::DependentAssociatedTypeRef, ident);
        if let Some(protocol) = protocol {
            assoc.add_child(protocol);
        }
        Ok(assoc)
    }

    pub(super) fn pop_assoc_type_path(&mut self) -> Result<Node> {
        let mut path = Node::new(NodeKind::AssocTypePath);
        loop {
            let first = self.pop_kind(NodeKind::FirstElementMarker).is_some();
            path.add_child(self.pop_assoc_type_name()?);
            if first {
                break;
            }
        }
        path.reverse_children_from(0);
        Ok(path)
    }
}

fn is_dependent_conformance(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::DependentProtocolConformanceRoot
            | NodeKind::DependentProtocolConformanceInherited
            | NodeKind::DependentProtocolConformanceAssociated
    )
}
