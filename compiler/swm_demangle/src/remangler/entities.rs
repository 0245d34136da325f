//! Entities, conformances, specializations and global symbols.

use super::{child, child_of_type, index_of, single_child, Remangler};
use crate::error::fatal;
use crate::mangling::MANGLING_PREFIX;
use crate::node::{
    FunctionSigSpecializationParamKind as ParamKind, Node, NodeKind, ValueWitnessKind,
};

/// Top-level children emitted after the entity they annotate.
fn is_deferred_global_child(kind: NodeKind) -> bool {
    kind.is_function_attr()
        && !matches!(
            kind,
            NodeKind::PartialApplyForwarder | NodeKind::PartialApplyObjCForwarder
        )
}

impl Remangler<'_> {
    pub(super) fn mangle_entity_node(&mut self, node: &Node) {
        use NodeKind as K;
        match node.kind {
            K::Global => self.mangle_global(node),
            K::Function => self.mangle_function(node),
            K::Variable | K::Subscript => self.mangle_abstract_storage(node, "p"),
            K::ExplicitClosure => self.mangle_closure(node, "fU"),
            K::ImplicitClosure => self.mangle_closure(node, "fu"),
            K::DefaultArgumentInitializer => {
                self.mangle(child(node, 0));
                self.buffer.push_str("fA");
                self.mangle(child(node, 1));
            }

            // ── Conformances ────────────────────────────────────────
            K::ProtocolConformance => self.mangle_protocol_conformance(node),
            K::ProtocolConformanceDescriptor => {
                self.mangle_protocol_conformance(child(node, 0));
                self.buffer.push_str("Mc");
            }
            K::ProtocolConformanceRefInTypeModule => {
                self.mangle_pure_protocol(child(node, 0));
                self.buffer.push_str("HP");
            }
            K::ProtocolConformanceRefInProtocolModule => {
                self.mangle_pure_protocol(child(node, 0));
                self.buffer.push_str("Hp");
            }
            K::ProtocolConformanceRefInOtherModule => {
                self.mangle_pure_protocol(child(node, 0));
                self.mangle(child(node, 1));
            }
            K::ConcreteProtocolConformance
            | K::DependentProtocolConformanceRoot
            | K::DependentProtocolConformanceInherited
            | K::DependentProtocolConformanceAssociated => {
                self.mangle_any_protocol_conformance(node);
            }
            K::DependentAssociatedConformance => self.mangle_dependent_associated_conformance(node),
            K::AnyProtocolConformanceList => self.mangle_protocol_conformance_list(node),
            K::RetroactiveConformance => {
                self.mangle_any_protocol_conformance(child(node, 1));
                self.buffer.push('g');
                self.push_index(index_of(child(node, 0)));
            }
            K::AssociatedConformanceDescriptor => {
                self.mangle(child(node, 0));
                self.mangle(child(node, 1));
                self.mangle_pure_protocol(child(node, 2));
                self.buffer.push_str("Tn");
            }
            K::DefaultAssociatedConformanceAccessor => {
                self.mangle(child(node, 0));
                self.mangle(child(node, 1));
                self.mangle_pure_protocol(child(node, 2));
                self.buffer.push_str("TN");
            }
            K::BaseConformanceDescriptor => {
                self.mangle(child(node, 0));
                self.mangle_pure_protocol(child(node, 1));
                self.buffer.push_str("Tb");
            }
            K::ProtocolDescriptor => {
                self.mangle_pure_protocol(single_child(node));
                self.buffer.push_str("Mp");
            }
            K::ProtocolRequirementsBaseDescriptor => {
                self.mangle_pure_protocol(single_child(node));
                self.buffer.push_str("TL");
            }
            K::ProtocolSelfConformanceDescriptor => {
                self.mangle_pure_protocol(child(node, 0));
                self.buffer.push_str("MS");
            }
            K::ProtocolSelfConformanceWitnessTable => {
                self.mangle_pure_protocol(child(node, 0));
                self.buffer.push_str("WS");
            }

            // ── Metadata and witnesses ──────────────────────────────
            K::FieldOffset => {
                self.mangle(child(node, 1));
                self.buffer.push_str("Wv");
                self.mangle(child(node, 0));
            }
            K::Directness => match index_of(node) {
                0 => self.buffer.push('d'),
                1 => self.buffer.push('i'),
                other => fatal(&format!("unknown directness {other}")),
            },
            K::ValueWitness => {
                self.mangle(child(node, 1));
                let raw = index_of(child(node, 0));
                let Some(kind) = ValueWitnessKind::from_raw(raw) else {
                    fatal(&format!("unknown value witness {raw}"));
                };
                self.buffer.push('w');
                self.buffer.push_str(kind.code());
            }
            K::ModuleDescriptor => {
                self.mangle(child(node, 0));
                self.buffer.push_str("MXM");
            }
            K::ExtensionDescriptor => {
                self.mangle(child(node, 0));
                self.buffer.push_str("MXE");
            }
            K::AnonymousDescriptor => {
                self.mangle(child(node, 0));
                if let Some(name) = node.child(1) {
                    self.mangle_identifier_node(name, false);
                    self.buffer.push_str("MXY");
                } else {
                    self.buffer.push_str("MXX");
                }
            }
            K::AssociatedTypeGenericParamRef => {
                self.mangle(child(node, 0));
                self.mangle_assoc_type_path(child(node, 1));
                self.buffer.push_str("MXA");
            }
            K::AssocTypePath => self.mangle_assoc_type_path(node),

            // ── Specializations and thunks ──────────────────────────
            K::FunctionSignatureSpecialization => {
                self.mangle_function_signature_specialization(node);
            }
            K::FunctionSignatureSpecializationParam | K::FunctionSignatureSpecializationReturn => {
                self.mangle_function_signature_specialization_param(node);
            }
            K::GenericSpecialization
            | K::GenericSpecializationNotReAbstracted
            | K::InlinedGenericFunction => self.mangle_generic_specialization(node),
            K::GenericPartialSpecialization | K::GenericPartialSpecializationNotReAbstracted => {
                self.mangle_generic_partial_specialization(node);
            }
            K::SpecializationPassID => self.buffer.push_str(&index_of(node).to_string()),
            K::KeyPathGetterThunkHelper => self.mangle_key_path_thunk_helper(node, "TK"),
            K::KeyPathSetterThunkHelper => self.mangle_key_path_thunk_helper(node, "Tk"),
            K::KeyPathEqualsThunkHelper => self.mangle_key_path_thunk_helper(node, "TH"),
            K::KeyPathHashThunkHelper => self.mangle_key_path_thunk_helper(node, "Th"),
            K::OutlinedVariable => {
                self.buffer.push_str("Tv");
                self.push_index(index_of(node));
            }
            K::OutlinedBridgedMethod => {
                self.buffer.push_str("Te");
                self.buffer.push_str(node.text());
                self.buffer.push('_');
            }
            other => fatal(&format!("no mangling for {other}")),
        }
    }

    fn mangle_global(&mut self, node: &Node) {
        self.buffer.push_str(MANGLING_PREFIX);
        let mut in_reverse_order = false;
        for (idx, element) in node.children.iter().enumerate() {
            if is_deferred_global_child(element.kind) {
                in_reverse_order = true;
                continue;
            }
            self.mangle(element);
            if in_reverse_order {
                for prior in node.children[..idx].iter().rev() {
                    self.mangle(prior);
                }
                in_reverse_order = false;
            }
        }
    }

    /// `context name labels? signature generic-signature? F`.
    pub(super) fn mangle_function(&mut self, node: &Node) {
        self.mangle(child(node, 0));
        self.mangle(child(node, 1));

        let has_labels = child(node, 2).kind == NodeKind::LabelList;
        let function_type = single_child(child(node, if has_labels { 3 } else { 2 }));
        if has_labels {
            self.mangle(child(node, 2));
        }

        if function_type.kind == NodeKind::DependentGenericType {
            self.mangle_children_reversed(single_child(child(function_type, 1)));
            self.mangle(child(function_type, 0));
        } else {
            self.mangle_children_reversed(function_type);
        }
        self.buffer.push('F');
    }

    pub(super) fn mangle_abstract_storage(&mut self, node: &Node, accessor: &str) {
        self.mangle_children(node);
        match node.kind {
            NodeKind::Subscript => self.buffer.push('i'),
            NodeKind::Variable => self.buffer.push('v'),
            other => fatal(&format!("{other} is not a storage declaration")),
        }
        self.buffer.push_str(accessor);
    }

    /// `context type op index`.
    fn mangle_closure(&mut self, node: &Node, op: &str) {
        self.mangle(child(node, 0));
        self.mangle(child(node, 2));
        self.buffer.push_str(op);
        self.mangle(child(node, 1));
    }

    // ── Conformances ────────────────────────────────────────────────

    fn mangle_protocol_conformance(&mut self, node: &Node) {
        let mut ty = child_of_type(child(node, 0));
        let mut signature = None;
        if ty.kind == NodeKind::DependentGenericType {
            signature = Some(child(ty, 0));
            ty = child(ty, 1);
        }
        self.mangle(ty);
        if let Some(identifier) = node.child(3) {
            self.mangle(identifier);
        }
        self.mangle_pure_protocol(child(node, 1));
        self.mangle(child(node, 2));
        if let Some(signature) = signature {
            self.mangle(signature);
        }
    }

    fn mangle_any_protocol_conformance(&mut self, node: &Node) {
        match node.kind {
            NodeKind::ConcreteProtocolConformance => {
                self.mangle(child(node, 0));
                self.mangle(child(node, 1));
                match node.child(2) {
                    Some(list) => self.mangle_protocol_conformance_list(list),
                    None => self.buffer.push('y'),
                }
                self.buffer.push_str("HC");
            }
            NodeKind::DependentProtocolConformanceRoot => {
                self.mangle(child(node, 0));
                self.mangle_pure_protocol(child(node, 1));
                self.buffer.push_str("HD");
                self.mangle_dependent_conformance_index(child(node, 2));
            }
            NodeKind::DependentProtocolConformanceInherited => {
                self.mangle_any_protocol_conformance(child(node, 0));
                self.mangle_pure_protocol(child(node, 1));
                self.buffer.push_str("HI");
                self.mangle_dependent_conformance_index(child(node, 2));
            }
            NodeKind::DependentProtocolConformanceAssociated => {
                self.mangle_any_protocol_conformance(child(node, 0));
                self.mangle_dependent_associated_conformance(child(node, 1));
                self.buffer.push_str("HA");
                self.mangle_dependent_conformance_index(child(node, 2));
            }
            _ => {}
        }
    }

    fn mangle_dependent_associated_conformance(&mut self, node: &Node) {
        self.mangle(child(node, 0));
        self.mangle_pure_protocol(child(node, 1));
    }

    fn mangle_protocol_conformance_list(&mut self, node: &Node) {
        let mut is_first = true;
        for conformance in &node.children {
            self.mangle_any_protocol_conformance(conformance);
            self.list_separator(&mut is_first);
        }
        self.end_of_list(is_first);
    }

    /// Known indices are offset by two; an unknown index is 1.
    fn mangle_dependent_conformance_index(&mut self, node: &Node) {
        match node.kind {
            NodeKind::Index => self.push_index(index_of(node) + 2),
            NodeKind::UnknownIndex => self.push_index(1),
            other => fatal(&format!("{other} is not a conformance index")),
        }
    }

    fn mangle_assoc_type_path(&mut self, node: &Node) {
        let mut is_first = true;
        for member in &node.children {
            self.mangle(member);
            self.list_separator(&mut is_first);
        }
    }

    // ── Specializations ─────────────────────────────────────────────

    fn mangle_function_signature_specialization(&mut self, node: &Node) {
        // Payloads precede the operator, parameter by parameter.
        for param in &node.children {
            if param.kind != NodeKind::FunctionSignatureSpecializationParam {
                continue;
            }
            let Some(kind) = param.first_child() else {
                continue;
            };
            match index_of(kind) {
                ParamKind::CONSTANT_PROP_FUNCTION | ParamKind::CONSTANT_PROP_GLOBAL => {
                    self.mangle_identifier_node(child(param, 1), false);
                }
                ParamKind::CONSTANT_PROP_STRING => {
                    let text = child(param, 2).text();
                    if text.starts_with(|c: char| c.is_ascii_digit() || c == '_') {
                        let escaped = Node::with_text(NodeKind::Identifier, format!("_{text}"));
                        self.mangle_identifier_node(&escaped, false);
                    } else {
                        self.mangle_identifier_node(child(param, 2), false);
                    }
                }
                ParamKind::CLOSURE_PROP => {
                    self.mangle_identifier_node(child(param, 1), false);
                    for ty in param.children.iter().skip(2) {
                        self.mangle(ty);
                    }
                }
                _ => {}
            }
        }

        self.buffer.push_str("Tf");
        let mut has_return = false;
        for element in &node.children {
            if element.kind == NodeKind::FunctionSignatureSpecializationReturn {
                self.buffer.push('_');
                has_return = true;
            }
            self.mangle(element);
            if element.kind == NodeKind::SpecializationPassID {
                if let Some(index) = node.index() {
                    self.buffer.push_str(&index.to_string());
                }
            }
        }
        if !has_return {
            self.buffer.push_str("_n");
        }
    }

    fn mangle_function_signature_specialization_param(&mut self, node: &Node) {
        let Some(kind) = node.first_child() else {
            self.buffer.push('n');
            return;
        };
        let raw = index_of(kind);
        match raw {
            ParamKind::CONSTANT_PROP_FUNCTION => self.buffer.push_str("pf"),
            ParamKind::CONSTANT_PROP_GLOBAL => self.buffer.push_str("pg"),
            ParamKind::CONSTANT_PROP_INTEGER => {
                self.buffer.push_str("pi");
                self.buffer.push_str(child(node, 1).text());
            }
            ParamKind::CONSTANT_PROP_FLOAT => {
                self.buffer.push_str("pd");
                self.buffer.push_str(child(node, 1).text());
            }
            ParamKind::CONSTANT_PROP_STRING => {
                self.buffer.push_str("ps");
                let encoding = match child(node, 1).text() {
                    "u8" => 'b',
                    "u16" => 'w',
                    "objc" => 'c',
                    other => fatal(&format!("unknown string encoding {other:?}")),
                };
                self.buffer.push(encoding);
            }
            ParamKind::CLOSURE_PROP => self.buffer.push('c'),
            ParamKind::BOX_TO_VALUE => self.buffer.push('i'),
            ParamKind::BOX_TO_STACK => self.buffer.push('s'),
            ParamKind::SROA => self.buffer.push('x'),
            _ => {
                let flags = ParamKind(raw);
                if flags.contains(ParamKind::EXISTENTIAL_TO_GENERIC) {
                    self.buffer.push('e');
                    if flags.contains(ParamKind::DEAD) {
                        self.buffer.push('D');
                    }
                    self.push_ownership_flags(flags);
                } else if flags.contains(ParamKind::DEAD) {
                    self.buffer.push('d');
                    self.push_ownership_flags(flags);
                } else if flags.contains(ParamKind::OWNED_TO_GUARANTEED) {
                    self.buffer.push('g');
                } else if flags.contains(ParamKind::GUARANTEED_TO_OWNED) {
                    self.buffer.push('o');
                }
                if flags.contains(ParamKind::SROA) {
                    self.buffer.push('X');
                }
            }
        }
    }

    fn push_ownership_flags(&mut self, flags: ParamKind) {
        if flags.contains(ParamKind::OWNED_TO_GUARANTEED) {
            self.buffer.push('G');
        }
        if flags.contains(ParamKind::GUARANTEED_TO_OWNED) {
            self.buffer.push('O');
        }
    }

    fn mangle_generic_specialization(&mut self, node: &Node) {
        let mut is_first = true;
        for param in &node.children {
            if param.kind == NodeKind::GenericSpecializationParam {
                self.mangle(child(param, 0));
                self.list_separator(&mut is_first);
            }
        }
        if is_first {
            fatal("generic specialization without substitutions");
        }
        self.buffer.push_str(match node.kind {
            NodeKind::GenericSpecialization => "Tg",
            NodeKind::GenericSpecializationNotReAbstracted => "TG",
            _ => "Ti",
        });
        for element in &node.children {
            if element.kind != NodeKind::GenericSpecializationParam {
                self.mangle(element);
            }
        }
    }

    fn mangle_generic_partial_specialization(&mut self, node: &Node) {
        if let Some(param) = node
            .children
            .iter()
            .find(|c| c.kind == NodeKind::GenericSpecializationParam)
        {
            self.mangle(child(param, 0));
        }
        self.buffer
            .push_str(if node.kind == NodeKind::GenericPartialSpecializationNotReAbstracted {
                "TP"
            } else {
                "Tp"
            });
        for element in &node.children {
            if element.kind != NodeKind::GenericSpecializationParam {
                self.mangle(element);
            }
        }
    }

    /// Everything but the serialization marker, the operator, then the
    /// marker.
    fn mangle_key_path_thunk_helper(&mut self, node: &Node, op: &str) {
        for element in &node.children {
            if element.kind != NodeKind::IsSerialized {
                self.mangle(element);
            }
        }
        self.buffer.push_str(op);
        for element in &node.children {
            if element.kind == NodeKind::IsSerialized {
                self.mangle(element);
            }
        }
    }
}
