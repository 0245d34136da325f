//! Metadata symbols, witnesses, SIL function types and the `X` special types.

use super::{Demangler, Require};
use crate::error::Result;
use crate::node::{Directness, Node, NodeKind, ValueWitnessKind};

impl Demangler<'_> {
    fn wrap_popped_type(&mut self, kind: NodeKind) -> Result<Node> {
        let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
        Ok(Node::with_child(kind, ty))
    }

    fn wrap_popped(&mut self, kind: NodeKind) -> Result<Node> {
        let node = self.pop().require(self.pos)?;
        Ok(Node::with_child(kind, node))
    }

    // ── Metadata ────────────────────────────────────────────────────

    pub(super) fn demangle_metatype(&mut self) -> Result<Node> {
        match self.next_char()? {
            b'c' => {
                let conformance = self.pop_protocol_conformance()?;
                Ok(Node::with_child(
                    NodeKind::ProtocolConformanceDescriptor,
                    conformance,
                ))
            }
            b'f' => self.wrap_popped_type(NodeKind::FullTypeMetadata),
            b'P' => self.wrap_popped_type(NodeKind::GenericTypeMetadataPattern),
            b'a' => self.wrap_popped_type(NodeKind::TypeMetadataAccessFunction),
            b'g' => self.wrap_popped(NodeKind::OpaqueTypeDescriptorAccessor),
            b'h' => self.wrap_popped(NodeKind::OpaqueTypeDescriptorAccessorImpl),
            b'j' => self.wrap_popped(NodeKind::OpaqueTypeDescriptorAccessorKey),
            b'k' => self.wrap_popped(NodeKind::OpaqueTypeDescriptorAccessorVar),
            b'I' => self.wrap_popped_type(NodeKind::TypeMetadataInstantiationCache),
            b'i' => self.wrap_popped_type(NodeKind::TypeMetadataInstantiationFunction),
            b'r' => self.wrap_popped_type(NodeKind::TypeMetadataCompletionFunction),
            b'l' => self.wrap_popped_type(NodeKind::TypeMetadataSingletonInitializationCache),
            b'L' => self.wrap_popped_type(NodeKind::TypeMetadataLazyCache),
            b'm' => self.wrap_popped_type(NodeKind::Metaclass),
            b'n' => self.wrap_popped_type(NodeKind::NominalTypeDescriptor),
            b'o' => self.wrap_popped_type(NodeKind::ClassMetadataBaseOffset),
            b'p' => {
                let protocol = self.pop_protocol()?;
                Ok(Node::with_child(NodeKind::ProtocolDescriptor, protocol))
            }
            b'Q' => self.wrap_popped(NodeKind::OpaqueTypeDescriptor),
            b'S' => {
                let protocol = self.pop_protocol()?;
                Ok(Node::with_child(
                    NodeKind::ProtocolSelfConformanceDescriptor,
                    protocol,
                ))
            }
            b'u' => self.wrap_popped_type(NodeKind::MethodLookupFunction),
            b'U' => self.wrap_popped_type(NodeKind::ObjCMetadataUpdateFunction),
            b's' => self.wrap_popped_type(NodeKind::ObjCResilientClassStub),
            b't' => self.wrap_popped_type(NodeKind::FullObjCResilientClassStub),
            b'B' => self.wrap_popped_type(NodeKind::ReflectionMetadataBuiltinDescriptor),
            b'F' => self.wrap_popped_type(NodeKind::ReflectionMetadataFieldDescriptor),
            b'A' => {
                let conformance = self.pop_protocol_conformance()?;
                Ok(Node::with_child(
                    NodeKind::ReflectionMetadataAssocTypeDescriptor,
                    conformance,
                ))
            }
            b'C' => {
                let superclass = self.pop_type_and_get_any_generic()?;
                Ok(Node::with_child(
                    NodeKind::ReflectionMetadataSuperclassDescriptor,
                    superclass,
                ))
            }
            b'V' => {
                let entity = self.pop_if(NodeKind::is_entity).require(self.pos)?;
                Ok(Node::with_child(NodeKind::PropertyDescriptor, entity))
            }
            b'X' => self.demangle_private_context_descriptor(),
            _ => Err(self.failure()),
        }
    }

    fn demangle_private_context_descriptor(&mut self) -> Result<Node> {
        match self.next_char()? {
            b'E' => {
                let context = self.pop_context()?;
                Ok(Node::with_child(NodeKind::ExtensionDescriptor, context))
            }
            b'M' => {
                let module = self.pop_module().require(self.pos)?;
                Ok(Node::with_child(NodeKind::ModuleDescriptor, module))
            }
            b'Y' => {
                let discriminator = self.pop().require(self.pos)?;
                let context = self.pop_context()?;
                Ok(Node::with_children(
                    NodeKind::AnonymousDescriptor,
                    vec![discriminator, context],
                ))
            }
            b'X' => {
                let context = self.pop_context()?;
                Ok(Node::with_child(NodeKind::AnonymousDescriptor, context))
            }
            b'A' => {
                let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
                let path = self.pop_assoc_type_path()?;
                Ok(Node::with_children(
                    NodeKind::AssociatedTypeGenericParamRef,
                    vec![ty, path],
                ))
            }
            _ => Err(self.failure()),
        }
    }

    // ── Special types ───────────────────────────────────────────────

    pub(super) fn demangle_special_type(&mut self) -> Result<Node> {
        let special = self.next_char()?;
        match special {
            b'E' => self.pop_function_type(NodeKind::NoEscapeFunctionType),
            b'A' => self.pop_function_type(NodeKind::EscapingAutoClosureType),
            b'f' => self.pop_function_type(NodeKind::ThinFunctionType),
            b'K' => self.pop_function_type(NodeKind::AutoClosureType),
            b'U' => self.pop_function_type(NodeKind::UncurriedFunctionType),
            b'B' => self.pop_function_type(NodeKind::ObjCBlock),
            b'C' => self.pop_function_type(NodeKind::CFunctionPointer),
            b'o' => Ok(Node::ty(self.wrap_popped_type(NodeKind::Unowned)?)),
            b'u' => Ok(Node::ty(self.wrap_popped_type(NodeKind::Unmanaged)?)),
            b'w' => Ok(Node::ty(self.wrap_popped_type(NodeKind::Weak)?)),
            b'b' => Ok(Node::ty(self.wrap_popped_type(NodeKind::SILBoxType)?)),
            b'D' => Ok(Node::ty(self.wrap_popped_type(NodeKind::DynamicSelf)?)),
            b'M' | b'm' => {
                let kind = if special == b'M' {
                    NodeKind::Metatype
                } else {
                    NodeKind::ExistentialMetatype
                };
                let representation = self.demangle_metatype_representation()?;
                let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
                Ok(Node::ty(Node::with_children(kind, vec![representation, ty])))
            }
            b'p' => Ok(Node::ty(self.wrap_popped_type(NodeKind::ExistentialMetatype)?)),
            b'c' => {
                let superclass = self.pop_kind(NodeKind::Type).require(self.pos)?;
                let protocols = self.demangle_protocol_list()?;
                Ok(Node::ty(Node::with_children(
                    NodeKind::ProtocolListWithClass,
                    vec![protocols, superclass],
                )))
            }
            b'l' => {
                let protocols = self.demangle_protocol_list()?;
                Ok(Node::ty(Node::with_child(
                    NodeKind::ProtocolListWithAnyObject,
                    protocols,
                )))
            }
            b'X' | b'x' => self.demangle_sil_box_type(special == b'X'),
            b'Y' => self.demangle_any_generic_type(NodeKind::OtherNominalType),
            b'Z' => {
                let types = self.pop_type_list()?;
                let name = self.pop_kind(NodeKind::Identifier).require(self.pos)?;
                let parent = self.pop_context()?;
                Ok(Node::with_children(
                    NodeKind::AnonymousContext,
                    vec![name, parent, types],
                ))
            }
            b'e' => Ok(Node::ty(Node::new(NodeKind::ErrorType))),
            b'S' => match self.next_char()? {
                b'q' => Ok(Node::ty(self.wrap_popped_type(NodeKind::SugaredOptional)?)),
                b'a' => Ok(Node::ty(self.wrap_popped_type(NodeKind::SugaredArray)?)),
                b'D' => {
                    let value = self.pop_kind(NodeKind::Type).require(self.pos)?;
                    let key = self.pop_kind(NodeKind::Type).require(self.pos)?;
                    Ok(Node::ty(Node::with_children(
                        NodeKind::SugaredDictionary,
                        vec![key, value],
                    )))
                }
                b'p' => Ok(Node::ty(self.wrap_popped_type(NodeKind::SugaredParen)?)),
                _ => Err(self.failure()),
            },
            _ => Err(self.failure()),
        }
    }

    fn demangle_sil_box_type(&mut self, has_signature: bool) -> Result<Node> {
        let signature_and_args = if has_signature {
            let signature = self
                .pop_kind(NodeKind::DependentGenericSignature)
                .require(self.pos)?;
            Some((signature, self.pop_type_list()?))
        } else {
            None
        };

        let field_types = self.pop_type_list()?;
        let mut layout = Node::new(NodeKind::SILBoxLayout);
        for field in field_types.children {
            self.ensure(field.kind == NodeKind::Type)?;
            // Mutable fields are mangled as `inout`.
            if field.first_child().is_some_and(|f| f.kind == NodeKind::InOut) {
                let inner = field
                    .children
                    .into_iter()
                    .next()
                    .and_then(|inout| inout.children.into_iter().next())
                    .require(self.pos)?;
                layout.add_child(Node::with_child(
                    NodeKind::SILBoxMutableField,
                    Node::ty(inner),
                ));
            } else {
                layout.add_child(Node::with_child(NodeKind::SILBoxImmutableField, field));
            }
        }

        let mut box_ty = Node::with_child(NodeKind::SILBoxTypeWithLayout, layout);
        if let Some((signature, args)) = signature_and_args {
            box_ty.add_child(signature);
            box_ty.add_child(args);
        }
        Ok(Node::ty(box_ty))
    }

    fn demangle_metatype_representation(&mut self) -> Result<Node> {
        let representation = match self.next_char()? {
            b't' => "@thin",
            b'T' => "@thick",
            b'o' => "@objc_metatype",
            _ => return Err(self.failure()),
        };
        Ok(Node::with_text(
            NodeKind::MetatypeRepresentation,
            representation,
        ))
    }

    // ── SIL function types ──────────────────────────────────────────

    fn demangle_impl_param_convention(&mut self) -> Option<Node> {
        let attr = match self.peek()? {
            b'i' => "@in",
            b'c' => "@in_constant",
            b'l' => "@inout",
            b'b' => "@inout_aliasable",
            b'n' => "@in_guaranteed",
            b'x' => "@owned",
            b'g' => "@guaranteed",
            b'e' => "@deallocating",
            b'y' => "@unowned",
            _ => return None,
        };
        self.pos += 1;
        Some(Node::with_child(
            NodeKind::ImplParameter,
            Node::with_text(NodeKind::ImplConvention, attr),
        ))
    }

    fn demangle_impl_result_convention(&mut self, kind: NodeKind) -> Option<Node> {
        let attr = match self.peek()? {
            b'r' => "@out",
            b'o' => "@owned",
            b'd' => "@unowned",
            b'u' => "@unowned_inner_pointer",
            b'a' => "@autoreleased",
            _ => return None,
        };
        self.pos += 1;
        Some(Node::with_child(
            kind,
            Node::with_text(NodeKind::ImplConvention, attr),
        ))
    }

    pub(super) fn demangle_impl_function_type(&mut self) -> Result<Node> {
        let mut children = Vec::new();

        let mut signature = self.pop_kind(NodeKind::DependentGenericSignature);
        if signature.is_some() && self.next_if(b'P') {
            signature =
                signature.map(|s| s.changing_kind(NodeKind::DependentPseudogenericSignature));
        }

        if self.next_if(b'e') {
            children.push(Node::new(NodeKind::ImplEscaping));
        }

        let callee = match self.next_char()? {
            b'y' => "@callee_unowned",
            b'g' => "@callee_guaranteed",
            b'x' => "@callee_owned",
            b't' => "@convention(thin)",
            _ => return Err(self.failure()),
        };
        children.push(Node::with_text(NodeKind::ImplConvention, callee));

        let function_attr = match self.peek() {
            Some(b'B') => Some("@convention(block)"),
            Some(b'C') => Some("@convention(c)"),
            Some(b'M') => Some("@convention(method)"),
            Some(b'O') => Some("@convention(objc_method)"),
            Some(b'K') => Some("@convention(closure)"),
            Some(b'W') => Some("@convention(witness_method)"),
            _ => None,
        };
        if let Some(attr) = function_attr {
            self.pos += 1;
            children.push(Node::with_text(NodeKind::ImplFunctionAttribute, attr));
        }

        children.extend(signature);

        let mut num_types = 0;
        while let Some(param) = self.demangle_impl_param_convention() {
            children.push(param);
            num_types += 1;
        }
        while let Some(result) = self.demangle_impl_result_convention(NodeKind::ImplResult) {
            children.push(result);
            num_types += 1;
        }
        if self.next_if(b'z') {
            let error = self
                .demangle_impl_result_convention(NodeKind::ImplErrorResult)
                .require(self.pos)?;
            children.push(error);
            num_types += 1;
        }
        let closed = self.next_if(b'_');
        self.ensure(closed)?;

        // Types were pushed in parameter order; the last one is on top.
        self.ensure(num_types <= children.len())?;
        let len = children.len();
        for slot in children[len - num_types..].iter_mut().rev() {
            let ty = self.node_stack.pop().filter(|n| n.kind == NodeKind::Type);
            slot.add_child(ty.ok_or_else(|| self.failure())?);
        }
        Ok(Node::ty(Node::with_children(
            NodeKind::ImplFunctionType,
            children,
        )))
    }

    // ── Witnesses ───────────────────────────────────────────────────

    pub(super) fn demangle_witness(&mut self) -> Result<Node> {
        let c = self.next_char()?;
        match c {
            b'C' => {
                let entity = self.pop_if(NodeKind::is_entity).require(self.pos)?;
                Ok(Node::with_child(NodeKind::EnumCase, entity))
            }
            b'V' => self.wrap_popped_type(NodeKind::ValueWitnessTable),
            b'v' => {
                let directness = match self.next_char()? {
                    b'd' => Directness::Direct,
                    b'i' => Directness::Indirect,
                    _ => return Err(self.failure()),
                };
                let entity = self.pop_if(NodeKind::is_entity).require(self.pos)?;
                Ok(Node::with_children(
                    NodeKind::FieldOffset,
                    vec![
                        Node::with_index(NodeKind::Directness, directness as u64),
                        entity,
                    ],
                ))
            }
            b'S' => {
                let protocol = self.pop_protocol()?;
                Ok(Node::with_child(
                    NodeKind::ProtocolSelfConformanceWitnessTable,
                    protocol,
                ))
            }
            b'P' => self.wrap_popped_conformance(NodeKind::ProtocolWitnessTable),
            b'p' => self.wrap_popped_conformance(NodeKind::ProtocolWitnessTablePattern),
            b'G' => self.wrap_popped_conformance(NodeKind::GenericProtocolWitnessTable),
            b'I' => self.wrap_popped_conformance(
                NodeKind::GenericProtocolWitnessTableInstantiationFunction,
            ),
            b'r' => self.wrap_popped_conformance(NodeKind::ResilientProtocolWitnessTable),
            b'a' => self.wrap_popped_conformance(NodeKind::ProtocolWitnessTableAccessor),
            b'l' | b'L' => {
                let kind = if c == b'l' {
                    NodeKind::LazyProtocolWitnessTableAccessor
                } else {
                    NodeKind::LazyProtocolWitnessTableCacheVariable
                };
                let conformance = self.pop_protocol_conformance()?;
                let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
                Ok(Node::with_children(kind, vec![ty, conformance]))
            }
            b't' => {
                let name = self.pop_if(NodeKind::is_decl_name).require(self.pos)?;
                let conformance = self.pop_protocol_conformance()?;
                Ok(Node::with_children(
                    NodeKind::AssociatedTypeMetadataAccessor,
                    vec![conformance, name],
                ))
            }
            b'T' => {
                let protocol = self.pop_kind(NodeKind::Type).require(self.pos)?;
                let path = self.pop_assoc_type_path()?;
                let conformance = self.pop_protocol_conformance()?;
                Ok(Node::with_children(
                    NodeKind::AssociatedTypeWitnessTableAccessor,
                    vec![conformance, path, protocol],
                ))
            }
            b'b' => {
                let protocol = self.pop_kind(NodeKind::Type).require(self.pos)?;
                let conformance = self.pop_protocol_conformance()?;
                Ok(Node::with_children(
                    NodeKind::BaseWitnessTableAccessor,
                    vec![conformance, protocol],
                ))
            }
            b'O' => {
                let signature = self.pop_kind(NodeKind::DependentGenericSignature);
                let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
                let mut children = vec![ty];
                children.extend(signature);
                let kind = match self.next_char()? {
                    b'y' => NodeKind::OutlinedCopy,
                    b'e' => NodeKind::OutlinedConsume,
                    b'r' => NodeKind::OutlinedRetain,
                    b's' => NodeKind::OutlinedRelease,
                    b'b' => NodeKind::OutlinedInitializeWithTake,
                    b'c' => NodeKind::OutlinedInitializeWithCopy,
                    b'd' => NodeKind::OutlinedAssignWithTake,
                    b'f' => NodeKind::OutlinedAssignWithCopy,
                    b'h' => NodeKind::OutlinedDestroy,
                    _ => return Err(self.failure()),
                };
                Ok(Node::with_children(kind, children))
            }
            _ => Err(self.failure()),
        }
    }

    fn wrap_popped_conformance(&mut self, kind: NodeKind) -> Result<Node> {
        let conformance = self.pop_protocol_conformance()?;
        Ok(Node::with_child(kind, conformance))
    }

    /// Two-letter value witness code applied to a popped type.
    pub(super) fn demangle_value_witness(&mut self) -> Result<Node> {
        let start = self.pos;
        self.next_char()?;
        self.next_char()?;
        let code = self.slice_str(start, self.pos)?;
        let kind = ValueWitnessKind::from_code(code).ok_or_else(|| self.failure())?;
        let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
        Ok(Node::with_children(
            NodeKind::ValueWitness,
            vec![Node::with_index(NodeKind::Index, kind as u64), ty],
        ))
    }
}
