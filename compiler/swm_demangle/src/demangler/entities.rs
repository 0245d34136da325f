//! Nominal types, functions, variables and protocol conformances.

use super::{Demangler, Require};
use crate::error::Result;
use crate::node::{Node, NodeKind};

/// Operands taken by a function entity after its context.
#[derive(Clone, Copy)]
enum EntityArgs {
    None,
    TypeAndMaybePrivateName,
    TypeAndIndex,
    Index,
}

impl Demangler<'_> {
    pub(super) fn demangle_any_generic_type(&mut self, kind: NodeKind) -> Result<Node> {
        let name = self.pop_if(NodeKind::is_decl_name).require(self.pos)?;
        let context = self.pop_context()?;
        let ty = Node::ty(Node::with_children(kind, vec![context, name]));
        self.add_substitution(ty.clone());
        Ok(ty)
    }

    pub(super) fn demangle_extension_context(&mut self) -> Result<Node> {
        let signature = self.pop_kind(NodeKind::DependentGenericSignature);
        let module = self.pop_module().require(self.pos)?;
        let extended = self.pop_type_and_get_any_generic()?;
        let mut extension = Node::with_children(NodeKind::Extension, vec![module, extended]);
        if let Some(signature) = signature {
            extension.add_child(signature);
        }
        Ok(extension)
    }

    pub(super) fn demangle_plain_function(&mut self) -> Result<Node> {
        let signature = self.pop_kind(NodeKind::DependentGenericSignature);
        let mut ty = self.pop_function_type(NodeKind::FunctionType)?;
        let labels = self.pop_function_param_labels(&ty)?;
        if let Some(signature) = signature {
            ty = Node::ty(Node::with_children(
                NodeKind::DependentGenericType,
                vec![signature, ty],
            ));
        }
        let name = self.pop_if(NodeKind::is_decl_name).require(self.pos)?;
        let context = self.pop_context()?;
        let mut children = vec![context, name];
        children.extend(labels);
        children.push(ty);
        Ok(Node::with_children(NodeKind::Function, children))
    }

    // ── Functions and storage ───────────────────────────────────────

    pub(super) fn demangle_function_entity(&mut self) -> Result<Node> {
        let (args, kind) = match self.next_char()? {
            b'D' => (EntityArgs::None, NodeKind::Deallocator),
            b'd' => (EntityArgs::None, NodeKind::Destructor),
            b'E' => (EntityArgs::None, NodeKind::IVarDestroyer),
            b'e' => (EntityArgs::None, NodeKind::IVarInitializer),
            b'i' => (EntityArgs::None, NodeKind::Initializer),
            b'C' => (EntityArgs::TypeAndMaybePrivateName, NodeKind::Allocator),
            b'c' => (EntityArgs::TypeAndMaybePrivateName, NodeKind::Constructor),
            b'U' => (EntityArgs::TypeAndIndex, NodeKind::ExplicitClosure),
            b'u' => (EntityArgs::TypeAndIndex, NodeKind::ImplicitClosure),
            b'A' => (EntityArgs::Index, NodeKind::DefaultArgumentInitializer),
            b'p' => return self.demangle_entity(NodeKind::GenericTypeParamDecl),
            _ => return Err(self.failure()),
        };

        let mut children = Vec::new();
        match args {
            EntityArgs::None => {}
            EntityArgs::TypeAndMaybePrivateName => {
                let private_name = self.pop_kind(NodeKind::PrivateDeclName);
                let param_type = self.pop_kind(NodeKind::Type).require(self.pos)?;
                let labels = self.pop_function_param_labels(&param_type)?;
                children.extend(labels);
                children.push(param_type);
                children.extend(private_name);
            }
            EntityArgs::TypeAndIndex => {
                let index = self.demangle_index_as_node()?;
                let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
                children.push(index);
                children.push(ty);
            }
            EntityArgs::Index => children.push(self.demangle_index_as_node()?),
        }
        children.insert(0, self.pop_context()?);
        Ok(Node::with_children(kind, children))
    }

    pub(super) fn demangle_entity(&mut self, kind: NodeKind) -> Result<Node> {
        let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
        let labels = self.pop_function_param_labels(&ty)?;
        let name = self.pop_if(NodeKind::is_decl_name).require(self.pos)?;
        let context = self.pop_context()?;
        let mut children = vec![context, name];
        children.extend(labels);
        children.push(ty);
        Ok(Node::with_children(kind, children))
    }

    pub(super) fn demangle_variable(&mut self) -> Result<Node> {
        let variable = self.demangle_entity(NodeKind::Variable)?;
        self.demangle_accessor(variable)
    }

    pub(super) fn demangle_subscript(&mut self) -> Result<Node> {
        let private_name = self.pop_kind(NodeKind::PrivateDeclName);
        let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
        let labels = self.pop_function_param_labels(&ty)?.require(self.pos)?;
        let context = self.pop_context()?;
        let mut subscript = Node::with_children(NodeKind::Subscript, vec![context, labels, ty]);
        if let Some(private_name) = private_name {
            subscript.add_child(private_name);
        }
        self.demangle_accessor(subscript)
    }

    fn demangle_accessor(&mut self, storage: Node) -> Result<Node> {
        let kind = match self.next_char()? {
            b'm' => NodeKind::MaterializeForSet,
            b's' => NodeKind::Setter,
            b'g' => NodeKind::Getter,
            b'G' => NodeKind::GlobalGetter,
            b'w' => NodeKind::WillSet,
            b'W' => NodeKind::DidSet,
            b'r' => NodeKind::ReadAccessor,
            b'M' => NodeKind::ModifyAccessor,
            b'a' => match self.next_char()? {
                b'O' => NodeKind::OwningMutableAddressor,
                b'o' => NodeKind::NativeOwningMutableAddressor,
                b'P' => NodeKind::NativePinningMutableAddressor,
                b'u' => NodeKind::UnsafeMutableAddressor,
                _ => return Err(self.failure()),
            },
            b'l' => match self.next_char()? {
                b'O' => NodeKind::OwningAddressor,
                b'o' => NodeKind::NativeOwningAddressor,
                b'p' => NodeKind::NativePinningAddressor,
                b'u' => NodeKind::UnsafeAddressor,
                _ => return Err(self.failure()),
            },
            // The storage declaration itself.
            b'p' => return Ok(storage),
            _ => return Err(self.failure()),
        };
        Ok(Node::with_child(kind, storage))
    }

    // ── Conformances ────────────────────────────────────────────────

    fn demangle_retroactive_protocol_conformance_ref(&mut self) -> Result<Node> {
        let module = self.pop_module().require(self.pos)?;
        let protocol = self.pop_protocol()?;
        Ok(Node::with_children(
            NodeKind::ProtocolConformanceRefInOtherModule,
            vec![protocol, module],
        ))
    }

    pub(super) fn demangle_concrete_protocol_conformance(&mut self) -> Result<Node> {
        let conditional = self.pop_any_protocol_conformance_list()?;
        let conformance_ref = match self.pop_if(|kind| {
            matches!(
                kind,
                NodeKind::ProtocolConformanceRefInTypeModule
                    | NodeKind::ProtocolConformanceRefInProtocolModule
            )
        }) {
            Some(conformance_ref) => conformance_ref,
            None => self.demangle_retroactive_protocol_conformance_ref()?,
        };
        let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
        Ok(Node::with_children(
            NodeKind::ConcreteProtocolConformance,
            vec![ty, conformance_ref, conditional],
        ))
    }

    pub(super) fn demangle_dependent_conformance_root(&mut self) -> Result<Node> {
        let index = self.demangle_dependent_conformance_index()?;
        let protocol = self.pop_protocol()?;
        let dependent = self.pop_kind(NodeKind::Type).require(self.pos)?;
        Ok(Node::with_children(
            NodeKind::DependentProtocolConformanceRoot,
            vec![dependent, protocol, index],
        ))
    }

    pub(super) fn demangle_dependent_conformance_inherited(&mut self) -> Result<Node> {
        let index = self.demangle_dependent_conformance_index()?;
        let protocol = self.pop_protocol()?;
        let nested = self.pop_dependent_protocol_conformance()?;
        Ok(Node::with_children(
            NodeKind::DependentProtocolConformanceInherited,
            vec![nested, protocol, index],
        ))
    }

    pub(super) fn demangle_dependent_conformance_associated(&mut self) -> Result<Node> {
        let index = self.demangle_dependent_conformance_index()?;
        let associated = self.pop_dependent_associated_conformance()?;
        let nested = self.pop_dependent_protocol_conformance()?;
        Ok(Node::with_children(
            NodeKind::DependentProtocolConformanceAssociated,
            vec![nested, associated, index],
        ))
    }

    /// Index 0 is ill-formed, 1 is unknown, `n` is requirement `n - 2`.
    fn demangle_dependent_conformance_index(&mut self) -> Result<Node> {
        let index = self.demangle_index()?;
        self.ensure(index > 0)?;
        if index == 1 {
            return Ok(Node::new(NodeKind::UnknownIndex));
        }
        Ok(Node::with_index(NodeKind::Index, index as u64 - 2))
    }

    pub(super) fn demangle_retroactive_conformance(&mut self) -> Result<Node> {
        let index = self.demangle_index_as_node()?;
        let conformance = self.pop_any_protocol_conformance()?;
        Ok(Node::with_children(
            NodeKind::RetroactiveConformance,
            vec![index, conformance],
        ))
    }
}
