//! Thunks, descriptors and specializations introduced by `T`.

use super::{Demangler, Require};
use crate::error::Result;
use crate::node::{FunctionSigSpecializationParamKind as ParamKind, Node, NodeKind};

impl Demangler<'_> {
    pub(super) fn demangle_thunk_or_specialization(&mut self) -> Result<Node> {
        let c = self.next_char()?;
        match c {
            b'c' => self.wrap_popped_entity(NodeKind::CurryThunk),
            b'j' => self.wrap_popped_entity(NodeKind::DispatchThunk),
            b'q' => self.wrap_popped_entity(NodeKind::MethodDescriptor),
            b'o' => Ok(Node::new(NodeKind::ObjCAttribute)),
            b'O' => Ok(Node::new(NodeKind::NonObjCAttribute)),
            b'D' => Ok(Node::new(NodeKind::DynamicAttribute)),
            b'd' => Ok(Node::new(NodeKind::DirectMethodReferenceAttribute)),
            b'a' => Ok(Node::new(NodeKind::PartialApplyObjCForwarder)),
            b'A' => Ok(Node::new(NodeKind::PartialApplyForwarder)),
            b'm' => Ok(Node::new(NodeKind::MergedFunction)),
            b'X' => Ok(Node::new(NodeKind::DynamicallyReplaceableFunctionVar)),
            b'x' => Ok(Node::new(NodeKind::DynamicallyReplaceableFunctionKey)),
            b'I' => Ok(Node::new(NodeKind::DynamicallyReplaceableFunctionImpl)),
            b'C' => {
                let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
                Ok(Node::with_child(NodeKind::CoroutineContinuationPrototype, ty))
            }
            b'V' => {
                let base = self.pop_if(NodeKind::is_entity).require(self.pos)?;
                let derived = self.pop_if(NodeKind::is_entity).require(self.pos)?;
                Ok(Node::with_children(NodeKind::VTableThunk, vec![derived, base]))
            }
            b'W' => {
                let entity = self.pop_if(NodeKind::is_entity).require(self.pos)?;
                let conformance = self.pop_protocol_conformance()?;
                Ok(Node::with_children(
                    NodeKind::ProtocolWitness,
                    vec![conformance, entity],
                ))
            }
            b'S' => self.wrap_popped_entity(NodeKind::ProtocolSelfConformanceWitness),
            b'R' | b'r' | b'y' => {
                let kind = match c {
                    b'R' => NodeKind::ReabstractionThunkHelper,
                    b'y' => NodeKind::ReabstractionThunkHelperWithSelf,
                    _ => NodeKind::ReabstractionThunk,
                };
                let mut thunk = Node::new(kind);
                if let Some(signature) = self.pop_kind(NodeKind::DependentGenericSignature) {
                    thunk.add_child(signature);
                }
                if kind == NodeKind::ReabstractionThunkHelperWithSelf {
                    thunk.add_child(self.pop_kind(NodeKind::Type).require(self.pos)?);
                }
                thunk.add_child(self.pop_kind(NodeKind::Type).require(self.pos)?);
                thunk.add_child(self.pop_kind(NodeKind::Type).require(self.pos)?);
                Ok(thunk)
            }
            b'g' => self.demangle_generic_specialization(NodeKind::GenericSpecialization),
            b'G' => {
                self.demangle_generic_specialization(NodeKind::GenericSpecializationNotReAbstracted)
            }
            b'i' => self.demangle_generic_specialization(NodeKind::InlinedGenericFunction),
            b'p' => self.demangle_partial_specialization(NodeKind::GenericPartialSpecialization),
            b'P' => self.demangle_partial_specialization(
                NodeKind::GenericPartialSpecializationNotReAbstracted,
            ),
            b'f' => self.demangle_function_specialization(),
            b'K' | b'k' => {
                let kind = if c == b'K' {
                    NodeKind::KeyPathGetterThunkHelper
                } else {
                    NodeKind::KeyPathSetterThunkHelper
                };
                self.demangle_key_path_accessor_thunk(kind)
            }
            b'l' => {
                let assoc = self.pop_assoc_type_name()?;
                Ok(Node::with_child(NodeKind::AssociatedTypeDescriptor, assoc))
            }
            b'L' => {
                let protocol = self.pop_protocol()?;
                Ok(Node::with_child(
                    NodeKind::ProtocolRequirementsBaseDescriptor,
                    protocol,
                ))
            }
            b'M' => {
                let assoc = self.pop_assoc_type_name()?;
                Ok(Node::with_child(
                    NodeKind::DefaultAssociatedTypeMetadataAccessor,
                    assoc,
                ))
            }
            b'n' | b'N' => {
                let kind = if c == b'n' {
                    NodeKind::AssociatedConformanceDescriptor
                } else {
                    NodeKind::DefaultAssociatedConformanceAccessor
                };
                let requirement = self.pop_protocol()?;
                let path = self.pop_assoc_type_path()?;
                let protocol = self.pop_kind(NodeKind::Type).require(self.pos)?;
                Ok(Node::with_children(kind, vec![protocol, path, requirement]))
            }
            b'b' => {
                let requirement = self.pop_protocol()?;
                let protocol = self.pop_kind(NodeKind::Type).require(self.pos)?;
                Ok(Node::with_children(
                    NodeKind::BaseConformanceDescriptor,
                    vec![protocol, requirement],
                ))
            }
            b'H' | b'h' => {
                let kind = if c == b'H' {
                    NodeKind::KeyPathEqualsThunkHelper
                } else {
                    NodeKind::KeyPathHashThunkHelper
                };
                self.demangle_key_path_hash_thunk(kind)
            }
            b'v' => {
                let index = self.demangle_index()?;
                Ok(Node::with_index(NodeKind::OutlinedVariable, index as u64))
            }
            b'e' => {
                let params = self.demangle_bridged_method_params()?;
                Ok(Node::with_text(NodeKind::OutlinedBridgedMethod, params))
            }
            _ => Err(self.failure()),
        }
    }

    fn wrap_popped_entity(&mut self, kind: NodeKind) -> Result<Node> {
        let entity = self.pop_if(NodeKind::is_entity).require(self.pos)?;
        Ok(Node::with_child(kind, entity))
    }

    fn demangle_key_path_accessor_thunk(&mut self, kind: NodeKind) -> Result<Node> {
        let is_serialized = self.next_if(b'q');

        let mut types = Vec::new();
        let mut node = self.pop_kind(NodeKind::Type).require(self.pos)?;
        while node.kind == NodeKind::Type {
            types.push(node);
            node = self.pop().require(self.pos)?;
        }

        let mut result = if node.kind == NodeKind::DependentGenericSignature {
            let decl = self.pop().require(self.pos)?;
            Node::with_children(kind, vec![decl, node])
        } else {
            Node::with_child(kind, node)
        };
        result.add_children(types.into_iter().rev());
        if is_serialized {
            result.add_child(Node::new(NodeKind::IsSerialized));
        }
        Ok(result)
    }

    fn demangle_key_path_hash_thunk(&mut self, kind: NodeKind) -> Result<Node> {
        let is_serialized = self.next_if(b'q');

        let mut signature = None;
        let mut types = Vec::new();
        let first = self.pop().require(self.pos)?;
        match first.kind {
            NodeKind::DependentGenericSignature => signature = Some(first),
            NodeKind::Type => types.push(first),
            _ => return Err(self.failure()),
        }
        while let Some(node) = self.pop() {
            self.ensure(node.kind == NodeKind::Type)?;
            types.push(node);
        }

        let mut result = Node::new(kind);
        result.add_children(types.into_iter().rev());
        if let Some(signature) = signature {
            result.add_child(signature);
        }
        if is_serialized {
            result.add_child(Node::new(NodeKind::IsSerialized));
        }
        Ok(result)
    }

    /// `_` for none, else `p`, `a` or `m` followed by `n`/`b` per parameter.
    fn demangle_bridged_method_params(&mut self) -> Result<String> {
        if self.next_if(b'_') {
            return Ok(String::new());
        }
        let mut params = String::new();
        let kind = self.next_char()?;
        self.ensure(matches!(kind, b'p' | b'a' | b'm'))?;
        params.push(char::from(kind));
        while !self.next_if(b'_') {
            let c = self.next_char()?;
            self.ensure(c == b'n' || c == b'b')?;
            params.push(char::from(c));
        }
        Ok(params)
    }

    // ── Specializations ─────────────────────────────────────────────

    fn demangle_spec_attributes(&mut self, kind: NodeKind) -> Result<Node> {
        let is_serialized = self.next_if(b'q');
        let pass = self.next_char()?;
        self.ensure(pass.is_ascii_digit())?;
        let mut spec = Node::new(kind);
        if is_serialized {
            spec.add_child(Node::new(NodeKind::IsSerialized));
        }
        spec.add_child(Node::with_index(
            NodeKind::SpecializationPassID,
            u64::from(pass - b'0'),
        ));
        Ok(spec)
    }

    fn demangle_generic_specialization(&mut self, kind: NodeKind) -> Result<Node> {
        let mut spec = self.demangle_spec_attributes(kind)?;
        let types = self.pop_type_list()?;
        spec.add_children(
            types
                .children
                .into_iter()
                .map(|ty| Node::with_child(NodeKind::GenericSpecializationParam, ty)),
        );
        Ok(spec)
    }

    fn demangle_partial_specialization(&mut self, kind: NodeKind) -> Result<Node> {
        let mut spec = self.demangle_spec_attributes(kind)?;
        let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
        spec.add_child(Node::with_child(NodeKind::GenericSpecializationParam, ty));
        Ok(spec)
    }

    fn demangle_function_specialization(&mut self) -> Result<Node> {
        let mut spec = self.demangle_spec_attributes(NodeKind::FunctionSignatureSpecialization)?;
        while !self.next_if(b'_') {
            let kind = NodeKind::FunctionSignatureSpecializationParam;
            spec.add_child(self.demangle_func_spec_param(kind)?);
        }
        if !self.next_if(b'n') {
            let kind = NodeKind::FunctionSignatureSpecializationReturn;
            spec.add_child(self.demangle_func_spec_param(kind)?);
        }

        // Payloads were pushed in parameter order, so pop them in reverse.
        for idx in (0..spec.num_children()).rev() {
            let param = &spec.children[idx];
            if param.kind != NodeKind::FunctionSignatureSpecializationParam {
                continue;
            }
            let Some(kind_node) = param.first_child() else {
                continue;
            };
            self.ensure(kind_node.kind == NodeKind::FunctionSignatureSpecializationParamKind)?;
            let raw = kind_node.index().require(self.pos)?;
            if !matches!(
                raw,
                ParamKind::CONSTANT_PROP_FUNCTION
                    | ParamKind::CONSTANT_PROP_GLOBAL
                    | ParamKind::CONSTANT_PROP_STRING
                    | ParamKind::CLOSURE_PROP
            ) {
                continue;
            }

            let fixed_children = param.num_children();
            let mut payload = Vec::new();
            while let Some(ty) = self.pop_kind(NodeKind::Type) {
                self.ensure(raw == ParamKind::CLOSURE_PROP)?;
                payload.push(ty);
            }
            let name = self.pop_kind(NodeKind::Identifier).require(self.pos)?;
            let mut text = name.text();
            if raw == ParamKind::CONSTANT_PROP_STRING {
                // `_` escapes a leading digit or underscore.
                text = text.strip_prefix('_').unwrap_or(text);
            }
            payload.push(Node::with_text(
                NodeKind::FunctionSignatureSpecializationParamPayload,
                text,
            ));

            let param = &mut spec.children[idx];
            param.add_children(payload);
            param.reverse_children_from(fixed_children);
        }
        Ok(spec)
    }

    fn demangle_func_spec_param(&mut self, kind: NodeKind) -> Result<Node> {
        let mut param = Node::new(kind);
        let param_kind = match self.next_char()? {
            b'n' => return Ok(param),
            b'c' => ParamKind::CLOSURE_PROP,
            b'p' => match self.next_char()? {
                b'f' => ParamKind::CONSTANT_PROP_FUNCTION,
                b'g' => ParamKind::CONSTANT_PROP_GLOBAL,
                b'i' => {
                    return self.add_func_spec_param_number(param, ParamKind::CONSTANT_PROP_INTEGER);
                }
                b'd' => {
                    return self.add_func_spec_param_number(param, ParamKind::CONSTANT_PROP_FLOAT);
                }
                b's' => {
                    let encoding = match self.next_char()? {
                        b'b' => "u8",
                        b'w' => "u16",
                        b'c' => "objc",
                        _ => return Err(self.failure()),
                    };
                    param.add_child(param_kind_node(ParamKind::CONSTANT_PROP_STRING));
                    param.add_child(Node::with_text(
                        NodeKind::FunctionSignatureSpecializationParamPayload,
                        encoding,
                    ));
                    return Ok(param);
                }
                _ => return Err(self.failure()),
            },
            b'e' => {
                let mut value = ParamKind::EXISTENTIAL_TO_GENERIC;
                if self.next_if(b'D') {
                    value |= ParamKind::DEAD;
                }
                value | self.demangle_ownership_flags()
            }
            b'd' => ParamKind::DEAD | self.demangle_ownership_flags(),
            b'g' => {
                let mut value = ParamKind::OWNED_TO_GUARANTEED;
                if self.next_if(b'X') {
                    value |= ParamKind::SROA;
                }
                value
            }
            b'o' => {
                let mut value = ParamKind::GUARANTEED_TO_OWNED;
                if self.next_if(b'X') {
                    value |= ParamKind::SROA;
                }
                value
            }
            b'x' => ParamKind::SROA,
            b'i' => ParamKind::BOX_TO_VALUE,
            b's' => ParamKind::BOX_TO_STACK,
            _ => return Err(self.failure()),
        };
        param.add_child(param_kind_node(param_kind));
        Ok(param)
    }

    /// Optional `G`, `O` and `X` suffixes, in that order.
    fn demangle_ownership_flags(&mut self) -> u64 {
        let mut value = 0;
        if self.next_if(b'G') {
            value |= ParamKind::OWNED_TO_GUARANTEED;
        }
        if self.next_if(b'O') {
            value |= ParamKind::GUARANTEED_TO_OWNED;
        }
        if self.next_if(b'X') {
            value |= ParamKind::SROA;
        }
        value
    }

    fn add_func_spec_param_number(&mut self, mut param: Node, kind: u64) -> Result<Node> {
        param.add_child(param_kind_node(kind));
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.ensure(self.pos > start)?;
        let digits = self.slice_str(start, self.pos)?;
        param.add_child(Node::with_text(
            NodeKind::FunctionSignatureSpecializationParamPayload,
            digits,
        ));
        Ok(param)
    }
}

fn param_kind_node(kind: u64) -> Node {
    Node::with_index(NodeKind::FunctionSignatureSpecializationParamKind, kind)
}
