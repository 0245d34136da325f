//! Types, generic arguments, generic signatures and requirements.

use super::{child, child_of_type, index_of, single_child, skip_type, Remangler};
use crate::error::fatal;
use crate::mangling::{
    node_consumes_generic_args, BUILTIN_TYPE_NAME_BRIDGEOBJECT, BUILTIN_TYPE_NAME_FLOAT,
    BUILTIN_TYPE_NAME_INT, BUILTIN_TYPE_NAME_INTLITERAL, BUILTIN_TYPE_NAME_NATIVEOBJECT,
    BUILTIN_TYPE_NAME_RAWPOINTER, BUILTIN_TYPE_NAME_SILTOKEN, BUILTIN_TYPE_NAME_UNKNOWNOBJECT,
    BUILTIN_TYPE_NAME_UNSAFEVALUEBUFFER, BUILTIN_TYPE_NAME_VEC, BUILTIN_TYPE_NAME_WORD,
    STDLIB_NAME,
};
use crate::node::{Node, NodeKind};

/// Result of mangling the subject of a requirement or member type.
#[derive(Clone, Copy)]
enum ConstrainedType<'n> {
    /// The whole type was emitted as a substitution.
    Substituted,
    /// `members` associated type names were emitted; the root parameter
    /// is left to the caller.
    Param { members: usize, param: &'n Node },
}

impl Remangler<'_> {
    /// Mangles type-level kinds. Returns `false` for anything else.
    pub(super) fn mangle_type_node(&mut self, node: &Node) -> bool {
        use NodeKind as K;
        match node.kind {
            K::Structure | K::Enum | K::Class | K::OtherNominalType | K::TypeAlias => {
                self.mangle_any_nominal_type(node);
            }
            K::Protocol => self.mangle_any_generic_type(node, "P"),
            K::BoundGenericStructure
            | K::BoundGenericClass
            | K::BoundGenericOtherNominalType
            | K::BoundGenericProtocol
            | K::BoundGenericTypeAlias => self.mangle_any_nominal_type(node),
            K::BoundGenericEnum => self.mangle_bound_generic_enum(node),
            K::BoundGenericFunction => self.mangle_bound_generic_function(node),
            K::BuiltinTypeName => self.mangle_builtin_type_name(node.text()),
            K::Tuple => {
                self.mangle_type_list(node);
                self.buffer.push('t');
            }
            K::TypeList => self.mangle_type_list(node),
            K::ArgumentTuple | K::ReturnType => self.mangle_argument_tuple(node),
            K::LabelList => {
                if node.children.is_empty() {
                    self.buffer.push('y');
                } else {
                    self.mangle_children(node);
                }
            }
            K::Metatype => self.mangle_metatype(node, "m", "XM"),
            K::ExistentialMetatype => self.mangle_metatype(node, "Xp", "Xm"),
            K::MetatypeRepresentation => {
                let code = match node.text() {
                    "@thin" => 't',
                    "@thick" => 'T',
                    "@objc_metatype" => 'o',
                    other => fatal(&format!("unknown metatype representation {other:?}")),
                };
                self.buffer.push(code);
            }
            K::ProtocolList => self.mangle_protocol_list(node, None, false),
            K::ProtocolListWithClass => {
                self.mangle_protocol_list(child(node, 0), Some(child(node, 1)), false);
            }
            K::ProtocolListWithAnyObject => self.mangle_protocol_list(child(node, 0), None, true),
            K::ImplFunctionType => self.mangle_impl_function_type(node),
            K::ImplConvention => {
                let code = callee_convention_code(node.text());
                self.buffer.push_str(code);
            }
            K::SILBoxTypeWithLayout => self.mangle_sil_box_type_with_layout(node),
            K::DependentGenericParamType => {
                if index_of(child(node, 0)) == 0 && index_of(child(node, 1)) == 0 {
                    self.buffer.push('x');
                } else {
                    self.buffer.push('q');
                    self.mangle_dependent_generic_param_index(node, "", 'z');
                }
            }
            K::DependentMemberType => self.mangle_dependent_member_type(node),
            K::DependentAssociatedTypeRef => {
                self.mangle_identifier_node(child(node, 0), false);
                if let Some(protocol) = node.child(1) {
                    self.mangle(protocol);
                }
            }
            K::AssociatedTypeRef => {
                let Some(entry) = self.substitute(node, false) else {
                    return true;
                };
                self.mangle_children(node);
                self.buffer.push_str("Qa");
                self.add_substitution(entry);
            }
            K::DependentGenericSignature | K::DependentPseudogenericSignature => {
                self.mangle_dependent_generic_signature(node);
            }
            K::DependentGenericConformanceRequirement => self.mangle_conformance_requirement(node),
            K::DependentGenericSameTypeRequirement => {
                self.mangle(child(node, 1));
                let constrained = self.mangle_constrained_type(child(node, 0));
                self.mangle_constraint_operator(constrained, ["Rs", "Rt", "RT", "RS"]);
            }
            K::DependentGenericLayoutRequirement => self.mangle_layout_requirement(node),
            K::SugaredOptional => {
                self.mangle(child(node, 0));
                self.buffer.push_str("XSq");
            }
            K::SugaredArray => {
                self.mangle(child(node, 0));
                self.buffer.push_str("XSa");
            }
            K::SugaredDictionary => {
                self.mangle(child(node, 0));
                self.mangle(child(node, 1));
                self.buffer.push_str("XSD");
            }
            K::SugaredParen => {
                self.mangle(child(node, 0));
                self.buffer.push_str("XSp");
            }
            K::OpaqueType => self.mangle_opaque_type(node),
            K::OpaqueReturnTypeOf => {
                self.mangle(child(node, 0));
                self.buffer.push_str("QO");
            }
            K::AnonymousContext => {
                self.mangle(child(node, 1));
                self.mangle(child(node, 0));
                if let Some(args) = node.child(2) {
                    self.mangle_type_list(args);
                }
                self.buffer.push_str("XZ");
            }
            K::Extension => {
                self.mangle(child(node, 1));
                self.mangle(child(node, 0));
                if let Some(signature) = node.child(2) {
                    self.mangle(signature);
                }
                self.buffer.push('E');
            }
            _ => return false,
        }
        true
    }

    // ── Nominal types ───────────────────────────────────────────────

    fn mangle_any_nominal_type(&mut self, node: &Node) {
        if node.is_specialized() {
            let Some(entry) = self.substitute(node, false) else {
                return;
            };
            let unbound = node
                .unspecialized()
                .unwrap_or_else(|| fatal(&format!("cannot unspecialize {}", node.kind)));
            self.mangle_any_nominal_type(&unbound);
            let mut separator = 'y';
            self.mangle_generic_args(node, &mut separator, false);
            if let Some(conformances) = node.child(2) {
                for conformance in &conformances.children {
                    self.mangle(conformance);
                }
            }
            self.buffer.push('G');
            self.add_substitution(entry);
            return;
        }
        let op = match node.kind {
            NodeKind::Structure => "V",
            NodeKind::Enum => "O",
            NodeKind::Class => "C",
            NodeKind::OtherNominalType => "XY",
            NodeKind::TypeAlias => "a",
            NodeKind::Protocol => "P",
            NodeKind::TypeSymbolicReference | NodeKind::ProtocolSymbolicReference => {
                return self.mangle(node);
            }
            other => fatal(&format!("{other} is not a nominal type")),
        };
        self.mangle_any_generic_type(node, op);
    }

    fn mangle_any_generic_type(&mut self, node: &Node, op: &str) {
        let Some(entry) = self.substitute(node, false) else {
            return;
        };
        self.mangle_children(node);
        self.buffer.push_str(op);
        self.add_substitution(entry);
    }

    /// Emits the generic argument lists of `node` and its parent contexts,
    /// outermost first, each introduced by `separator`.
    fn mangle_generic_args(
        &mut self,
        node: &Node,
        separator: &mut char,
        full_substitution_map: bool,
    ) {
        use NodeKind as K;
        match node.kind {
            K::Structure | K::Enum | K::Class | K::TypeAlias => {
                let full = full_substitution_map || node.kind == K::TypeAlias;
                self.mangle_generic_args(child(node, 0), separator, full);
                self.buffer.push(*separator);
                *separator = '_';
            }
            K::Function
            | K::Getter
            | K::Setter
            | K::WillSet
            | K::DidSet
            | K::ReadAccessor
            | K::ModifyAccessor
            | K::UnsafeAddressor
            | K::UnsafeMutableAddressor
            | K::Allocator
            | K::Constructor
            | K::Destructor
            | K::Variable
            | K::Subscript
            | K::ExplicitClosure
            | K::ImplicitClosure
            | K::DefaultArgumentInitializer
            | K::Initializer => {
                if !full_substitution_map {
                    return;
                }
                self.mangle_generic_args(child(node, 0), separator, true);
                if node_consumes_generic_args(node.kind) {
                    self.buffer.push(*separator);
                    *separator = '_';
                }
            }
            K::BoundGenericOtherNominalType
            | K::BoundGenericStructure
            | K::BoundGenericEnum
            | K::BoundGenericClass
            | K::BoundGenericProtocol
            | K::BoundGenericTypeAlias => {
                let full = full_substitution_map || node.kind == K::BoundGenericTypeAlias;
                let nominal = child_of_type(child(node, 0));
                // Symbolic references have no parent to recurse into.
                if let Some(parent) = nominal.child(0) {
                    self.mangle_generic_args(parent, separator, full);
                }
                self.buffer.push(*separator);
                *separator = '_';
                self.mangle_children(child(node, 1));
            }
            K::BoundGenericFunction => {
                let function = child(node, 0);
                self.mangle_generic_args(child(function, 0), separator, true);
                self.buffer.push(*separator);
                *separator = '_';
                self.mangle_children(child(node, 1));
            }
            K::Extension => {
                self.mangle_generic_args(child(node, 1), separator, full_substitution_map);
            }
            _ => {}
        }
    }

    fn mangle_bound_generic_enum(&mut self, node: &Node) {
        let enum_node = child_of_type(child(node, 0));
        let is_optional = enum_node.kind == NodeKind::Enum
            && enum_node
                .child(0)
                .is_some_and(|m| m.kind == NodeKind::Module && m.text() == STDLIB_NAME)
            && enum_node
                .child(1)
                .is_some_and(|id| id.kind == NodeKind::Identifier && id.text() == "Optional");
        if !is_optional {
            return self.mangle_any_nominal_type(node);
        }
        let Some(entry) = self.substitute(node, false) else {
            return;
        };
        self.mangle_single_child(child(node, 1));
        self.buffer.push_str("Sg");
        self.add_substitution(entry);
    }

    fn mangle_bound_generic_function(&mut self, node: &Node) {
        let Some(entry) = self.substitute(node, false) else {
            return;
        };
        let unbound = node
            .unspecialized()
            .unwrap_or_else(|| fatal("cannot unspecialize bound generic function"));
        self.mangle_function(&unbound);
        let mut separator = 'y';
        self.mangle_generic_args(node, &mut separator, false);
        self.buffer.push('G');
        self.add_substitution(entry);
    }

    /// Protocol name without the `P` operator, as used in conformances.
    pub(super) fn mangle_pure_protocol(&mut self, protocol: &Node) {
        let protocol = skip_type(protocol);
        if protocol.kind == NodeKind::ProtocolSymbolicReference {
            return self.mangle(protocol);
        }
        if self.mangle_standard_substitution(protocol) {
            return;
        }
        self.mangle_children(protocol);
    }

    // ── Structural types ────────────────────────────────────────────

    fn mangle_builtin_type_name(&mut self, name: &str) {
        self.buffer.push('B');
        let code = match name {
            BUILTIN_TYPE_NAME_BRIDGEOBJECT => "b",
            BUILTIN_TYPE_NAME_UNSAFEVALUEBUFFER => "B",
            BUILTIN_TYPE_NAME_UNKNOWNOBJECT => "O",
            BUILTIN_TYPE_NAME_NATIVEOBJECT => "o",
            BUILTIN_TYPE_NAME_RAWPOINTER => "p",
            BUILTIN_TYPE_NAME_SILTOKEN => "t",
            BUILTIN_TYPE_NAME_INTLITERAL => "I",
            BUILTIN_TYPE_NAME_WORD => "w",
            _ => "",
        };
        if !code.is_empty() {
            self.buffer.push_str(code);
            return;
        }
        if let Some(bits) = name.strip_prefix(BUILTIN_TYPE_NAME_INT) {
            self.push_sized('i', bits);
        } else if let Some(bits) = name.strip_prefix(BUILTIN_TYPE_NAME_FLOAT) {
            self.push_sized('f', bits);
        } else if let Some(vector) = name.strip_prefix(BUILTIN_TYPE_NAME_VEC) {
            let Some((count, element)) = vector.split_once('x') else {
                fatal(&format!("malformed builtin vector {name:?}"));
            };
            if element == "RawPointer" {
                self.buffer.push('p');
            } else if let Some(bits) = element.strip_prefix("FPIEEE") {
                self.push_sized('f', bits);
            } else if let Some(bits) = element.strip_prefix("Int") {
                self.push_sized('i', bits);
            } else {
                fatal(&format!("unexpected builtin vector element {element:?}"));
            }
            self.buffer.push_str("Bv");
            self.buffer.push_str(count);
            self.buffer.push('_');
        } else {
            fatal(&format!("unexpected builtin type {name:?}"));
        }
    }

    fn push_sized(&mut self, code: char, size: &str) {
        self.buffer.push(code);
        self.buffer.push_str(size);
        self.buffer.push('_');
    }

    pub(super) fn mangle_type_list(&mut self, node: &Node) {
        let mut is_first = true;
        for element in &node.children {
            self.mangle(element);
            self.list_separator(&mut is_first);
        }
        self.end_of_list(is_first);
    }

    fn mangle_argument_tuple(&mut self, node: &Node) {
        let ty = skip_type(single_child(node));
        if ty.kind == NodeKind::Tuple && ty.children.is_empty() {
            self.buffer.push('y');
            return;
        }
        self.mangle(ty);
    }

    fn mangle_metatype(&mut self, node: &Node, plain: &str, with_representation: &str) {
        if child(node, 0).kind == NodeKind::MetatypeRepresentation {
            self.mangle(child(node, 1));
            self.buffer.push_str(with_representation);
            self.mangle(child(node, 0));
        } else {
            self.mangle_single_child(node);
            self.buffer.push_str(plain);
        }
    }

    fn mangle_protocol_list(&mut self, node: &Node, superclass: Option<&Node>, any_object: bool) {
        let protocols = single_child(node);
        if protocols.kind != NodeKind::TypeList {
            fatal(&format!("protocol list holds {}", protocols.kind));
        }
        let mut is_first = true;
        for protocol in &protocols.children {
            self.mangle_pure_protocol(protocol);
            self.list_separator(&mut is_first);
        }
        self.end_of_list(is_first);
        if let Some(superclass) = superclass {
            self.mangle(superclass);
            self.buffer.push_str("Xc");
        } else if any_object {
            self.buffer.push_str("Xl");
        } else {
            self.buffer.push('p');
        }
    }

    fn mangle_impl_function_type(&mut self, node: &Node) {
        let mut pseudogeneric = false;
        let mut signature = None;
        for element in &node.children {
            match element.kind {
                NodeKind::ImplParameter | NodeKind::ImplResult | NodeKind::ImplErrorResult => {
                    self.mangle(child(element, 1));
                }
                NodeKind::DependentPseudogenericSignature => {
                    pseudogeneric = true;
                    signature = Some(element);
                }
                NodeKind::DependentGenericSignature => signature = Some(element),
                _ => {}
            }
        }
        if let Some(signature) = signature {
            self.mangle(signature);
        }

        self.buffer.push('I');
        if pseudogeneric {
            self.buffer.push('P');
        }
        for element in &node.children {
            match element.kind {
                NodeKind::ImplEscaping => self.buffer.push('e'),
                NodeKind::ImplConvention => {
                    let code = match element.text() {
                        "@convention(thin)" => "t",
                        other => callee_convention_code(other),
                    };
                    self.buffer.push_str(code);
                }
                NodeKind::ImplFunctionAttribute => {
                    let code = match element.text() {
                        "@convention(block)" => 'B',
                        "@convention(c)" => 'C',
                        "@convention(method)" => 'M',
                        "@convention(objc_method)" => 'O',
                        "@convention(closure)" => 'K',
                        "@convention(witness_method)" => 'W',
                        other => fatal(&format!("unknown impl function attribute {other:?}")),
                    };
                    self.buffer.push(code);
                }
                NodeKind::ImplParameter => {
                    let code = match child(element, 0).text() {
                        "@in" => 'i',
                        "@inout" => 'l',
                        "@inout_aliasable" => 'b',
                        "@in_guaranteed" => 'n',
                        "@in_constant" => 'c',
                        "@owned" => 'x',
                        "@guaranteed" => 'g',
                        "@deallocating" => 'e',
                        "@unowned" => 'y',
                        other => fatal(&format!("unknown parameter convention {other:?}")),
                    };
                    self.buffer.push(code);
                }
                NodeKind::ImplResult | NodeKind::ImplErrorResult => {
                    if element.kind == NodeKind::ImplErrorResult {
                        self.buffer.push('z');
                    }
                    let code = match child(element, 0).text() {
                        "@out" => 'r',
                        "@owned" => 'o',
                        "@unowned" => 'd',
                        "@unowned_inner_pointer" => 'u',
                        "@autoreleased" => 'a',
                        other => fatal(&format!("unknown result convention {other:?}")),
                    };
                    self.buffer.push(code);
                }
                _ => {}
            }
        }
        self.buffer.push('_');
    }

    fn mangle_sil_box_type_with_layout(&mut self, node: &Node) {
        let layout = child(node, 0);
        if layout.kind != NodeKind::SILBoxLayout {
            fatal(&format!("box layout expected, found {}", layout.kind));
        }
        let mut fields = Node::new(NodeKind::TypeList);
        for field in &layout.children {
            let field_type = single_child(field);
            let ty = match field.kind {
                NodeKind::SILBoxImmutableField => field_type.clone(),
                // Mutable fields are spelled as `inout`.
                NodeKind::SILBoxMutableField => Node::ty(Node::with_child(
                    NodeKind::InOut,
                    child_of_type(field_type).clone(),
                )),
                other => fatal(&format!("{other} is not a box field")),
            };
            fields.add_child(ty);
        }
        self.mangle_type_list(&fields);

        if let (Some(signature), Some(args)) = (node.child(1), node.child(2)) {
            self.mangle_type_list(args);
            self.mangle_dependent_generic_signature(signature);
            self.buffer.push_str("XX");
        } else {
            self.buffer.push_str("Xx");
        }
    }

    fn mangle_opaque_type(&mut self, node: &Node) {
        let Some(entry) = self.substitute(node, false) else {
            return;
        };
        self.mangle(child(node, 0));
        for (idx, args) in child(node, 2).children.iter().enumerate() {
            self.buffer.push(if idx == 0 { 'y' } else { '_' });
            self.mangle_children(args);
        }
        if let Some(conformances) = node.child(3) {
            self.mangle_children(conformances);
        }
        self.buffer.push_str("Qo");
        self.push_index(index_of(child(node, 1)));
        self.add_substitution(entry);
    }

    // ── Generic signatures ──────────────────────────────────────────

    pub(super) fn mangle_dependent_generic_signature(&mut self, node: &Node) {
        let mut param_count_end = 0;
        for (idx, element) in node.children.iter().enumerate() {
            if element.kind == NodeKind::DependentGenericParamCount {
                param_count_end = idx + 1;
            } else {
                self.mangle(element);
            }
        }
        // A single generic parameter is implied.
        if param_count_end == 1 && index_of(child(node, 0)) == 1 {
            self.buffer.push('l');
            return;
        }
        self.buffer.push('r');
        for count in &node.children[..param_count_end] {
            match index_of(count) {
                0 => self.buffer.push('z'),
                n => self.push_index(n - 1),
            }
        }
        self.buffer.push('l');
    }

    fn mangle_dependent_generic_param_index(
        &mut self,
        node: &Node,
        non_zero_prefix: &str,
        zero_op: char,
    ) {
        let depth = index_of(child(node, 0));
        let index = index_of(child(node, 1));
        if depth != 0 {
            self.buffer.push_str(non_zero_prefix);
            self.buffer.push('d');
            self.push_index(depth - 1);
            self.push_index(index);
        } else if index != 0 {
            self.buffer.push_str(non_zero_prefix);
            self.push_index(index - 1);
        } else {
            self.buffer.push(zero_op);
        }
    }

    /// Emits the associated type path of a constrained type, innermost
    /// member last, and registers it as a substitution.
    fn mangle_constrained_type<'n>(&mut self, node: &'n Node) -> ConstrainedType<'n> {
        let node = skip_type(node);
        let Some(entry) = self.substitute(node, false) else {
            return ConstrainedType::Substituted;
        };

        let mut chain = Vec::new();
        let mut base = node;
        while base.kind == NodeKind::DependentMemberType {
            chain.push(child(base, 1));
            base = child_of_type(child(base, 0));
        }
        if base.kind != NodeKind::DependentGenericParamType {
            fatal(&format!("constrained type rooted at {}", base.kind));
        }

        let mut separator = if chain.len() > 1 { "_" } else { "" };
        for member in chain.iter().rev() {
            self.mangle(member);
            self.buffer.push_str(separator);
            separator = "";
        }
        if !chain.is_empty() {
            self.add_substitution(entry);
        }
        ConstrainedType::Param {
            members: chain.len(),
            param: base,
        }
    }

    /// `ops` holds the operators for a bare parameter, a single member,
    /// a member path and a substitution, in that order.
    fn mangle_constraint_operator(&mut self, constrained: ConstrainedType<'_>, ops: [&str; 4]) {
        match constrained {
            ConstrainedType::Substituted => self.buffer.push_str(ops[3]),
            ConstrainedType::Param { members, param } => {
                let op = match members {
                    0 => ops[0],
                    1 => ops[1],
                    _ => ops[2],
                };
                self.buffer.push_str(op);
                self.mangle_dependent_generic_param_index(param, "", 'z');
            }
        }
    }

    fn mangle_conformance_requirement(&mut self, node: &Node) {
        let constraint = child(node, 1);
        if constraint.is_protocol_node() {
            self.mangle_pure_protocol(constraint);
            let constrained = self.mangle_constrained_type(child(node, 0));
            self.mangle_constraint_operator(constrained, ["R", "Rp", "RP", "RQ"]);
        } else {
            self.mangle(constraint);
            let constrained = self.mangle_constrained_type(child(node, 0));
            self.mangle_constraint_operator(constrained, ["Rb", "Rc", "RC", "RB"]);
        }
    }

    fn mangle_layout_requirement(&mut self, node: &Node) {
        let constrained = self.mangle_constrained_type(child(node, 0));
        self.mangle_constraint_operator(constrained, ["Rl", "Rm", "RM", "RL"]);
        let layout = child(node, 1);
        if layout.kind != NodeKind::Identifier || layout.text().chars().count() != 1 {
            fatal("layout constraint must be a single-character identifier");
        }
        self.buffer.push_str(layout.text());
        for size in node.children.iter().skip(2).take(2) {
            self.mangle(size);
        }
    }

    fn mangle_dependent_member_type(&mut self, node: &Node) {
        match self.mangle_constrained_type(node) {
            ConstrainedType::Substituted => {}
            ConstrainedType::Param { members: 0, .. } => {
                fatal("dependent member type without members");
            }
            ConstrainedType::Param { members: 1, param } => {
                self.buffer.push('Q');
                self.mangle_dependent_generic_param_index(param, "y", 'z');
            }
            ConstrainedType::Param { param, .. } => {
                self.buffer.push('Q');
                self.mangle_dependent_generic_param_index(param, "Y", 'Z');
            }
        }
    }
}

fn callee_convention_code(convention: &str) -> &'static str {
    match convention {
        "@callee_unowned" => "y",
        "@callee_guaranteed" => "g",
        "@callee_owned" => "x",
        other => fatal(&format!("unknown callee convention {other:?}")),
    }
}
