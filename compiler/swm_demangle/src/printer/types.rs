//! Type spellings: sugar, function signatures, generic signatures.

use super::NodePrinter;
use crate::config::PrintOptions;
use crate::mangling::{generic_parameter_name, STDLIB_NAME};
use crate::node::{Node, NodeKind};

/// Generic parameters printed per depth before eliding the rest.
const MAX_PRINTED_GENERIC_PARAMS: u64 = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sugar {
    None,
    Optional,
    ImplicitlyUnwrappedOptional,
    Array,
    Dictionary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum ImplState {
    Attrs,
    Inputs,
    Results,
}

/// Types that never need parentheses before a postfix such as `?`.
fn is_simple_type(node: &Node) -> bool {
    use NodeKind as K;

    match node.kind {
        K::AssociatedType
        | K::AssociatedTypeRef
        | K::BoundGenericClass
        | K::BoundGenericEnum
        | K::BoundGenericStructure
        | K::BoundGenericProtocol
        | K::BoundGenericOtherNominalType
        | K::BoundGenericTypeAlias
        | K::BoundGenericFunction
        | K::BuiltinTypeName
        | K::Class
        | K::DependentGenericType
        | K::DependentMemberType
        | K::DependentGenericParamType
        | K::DynamicSelf
        | K::Enum
        | K::ErrorType
        | K::ExistentialMetatype
        | K::Metatype
        | K::MetatypeRepresentation
        | K::Module
        | K::Tuple
        | K::Protocol
        | K::ProtocolSymbolicReference
        | K::ReturnType
        | K::SILBoxType
        | K::SILBoxTypeWithLayout
        | K::Structure
        | K::OtherNominalType
        | K::TupleElementName
        | K::Type
        | K::TypeAlias
        | K::TypeList
        | K::LabelList
        | K::TypeSymbolicReference
        | K::SugaredOptional
        | K::SugaredArray
        | K::SugaredDictionary
        | K::SugaredParen => true,
        K::ProtocolList => node
            .first_child()
            .is_some_and(|list| list.children.len() <= 1),
        K::ProtocolListWithAnyObject => node
            .first_child()
            .and_then(Node::first_child)
            .is_some_and(|list| list.children.is_empty()),
        _ => false,
    }
}

fn is_existential_type(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::ExistentialMetatype
            | NodeKind::ProtocolList
            | NodeKind::ProtocolListWithClass
            | NodeKind::ProtocolListWithAnyObject
    )
}

pub(super) fn needs_space_before_type(ty: &Node) -> bool {
    match ty.kind {
        NodeKind::Type => ty.first_child().is_none_or(needs_space_before_type),
        NodeKind::FunctionType
        | NodeKind::NoEscapeFunctionType
        | NodeKind::UncurriedFunctionType
        | NodeKind::DependentGenericType => false,
        _ => true,
    }
}

/// Which standard library sugar, if any, spells a bound generic type.
fn find_sugar(node: &Node) -> Sugar {
    if node.kind == NodeKind::Type && node.children.len() == 1 {
        return find_sugar(&node.children[0]);
    }
    if node.children.len() != 2
        || !matches!(
            node.kind,
            NodeKind::BoundGenericEnum | NodeKind::BoundGenericStructure
        )
    {
        return Sugar::None;
    }

    let unbound = node.children[0].unwrap_type();
    let arguments = node.children[1].children.len();
    let (Some(module), Some(name)) = (unbound.child(0), unbound.child(1)) else {
        return Sugar::None;
    };
    if module.kind != NodeKind::Module
        || module.text() != STDLIB_NAME
        || name.kind != NodeKind::Identifier
    {
        return Sugar::None;
    }
    match (node.kind, name.text(), arguments) {
        (NodeKind::BoundGenericEnum, "Optional", 1) => Sugar::Optional,
        (NodeKind::BoundGenericEnum, "ImplicitlyUnwrappedOptional", 1) => {
            Sugar::ImplicitlyUnwrappedOptional
        }
        (NodeKind::BoundGenericStructure, "Array", 1) => Sugar::Array,
        (NodeKind::BoundGenericStructure, "Dictionary", 2) => Sugar::Dictionary,
        _ => Sugar::None,
    }
}

impl NodePrinter {
    fn print_with_parens(&mut self, ty: &Node) {
        let parens = !is_simple_type(ty);
        if parens {
            self.push("(");
        }
        self.print(ty, false);
        if parens {
            self.push(")");
        }
    }

    pub(super) fn print_child_with_parens(&mut self, node: &Node, index: usize) {
        if let Some(child) = self.child(node, index) {
            self.print_with_parens(child);
        }
    }

    // ── Bound generics ──────────────────────────────────────────────

    fn print_bound_generic_no_sugar(&mut self, node: &Node) {
        let (Some(unbound), Some(arguments)) = (node.child(0), node.child(1)) else {
            return;
        };
        self.print(unbound, false);
        self.push("<");
        self.print_children(arguments, ", ");
        self.push(">");
    }

    pub(super) fn print_bound_generic(&mut self, node: &Node) {
        if node.children.len() < 2 {
            return;
        }
        if node.children.len() != 2
            || !self.has(PrintOptions::SYNTHESIZE_SUGAR_ON_TYPES)
            || node.kind == NodeKind::BoundGenericClass
        {
            self.print_bound_generic_no_sugar(node);
            return;
        }

        // A bound protocol prints its conforming type "as" the protocol.
        if node.kind == NodeKind::BoundGenericProtocol {
            self.print_children(&node.children[1], "");
            self.push(" as ");
            self.print(&node.children[0], false);
            return;
        }

        let arguments = &node.children[1];
        match find_sugar(node) {
            Sugar::None => self.print_bound_generic_no_sugar(node),
            sugar @ (Sugar::Optional | Sugar::ImplicitlyUnwrappedOptional) => {
                self.print_child_with_parens(arguments, 0);
                self.push(if sugar == Sugar::Optional { "?" } else { "!" });
            }
            Sugar::Array => {
                self.push("[");
                self.print_child(arguments, 0);
                self.push("]");
            }
            Sugar::Dictionary => {
                self.push("[");
                self.print_child(arguments, 0);
                self.push(" : ");
                self.print_child(arguments, 1);
                self.push("]");
            }
        }
    }

    // ── Function types ──────────────────────────────────────────────

    /// Prints `(a: A, b: B)`, taking labels from `labels` when it has any
    /// and from the tuple element names otherwise.
    pub(super) fn print_function_parameters(
        &mut self,
        labels: Option<&Node>,
        parameter_type: &Node,
        show_types: bool,
    ) {
        if parameter_type.kind != NodeKind::ArgumentTuple {
            self.invalid();
            return;
        }
        let Some(parameters) = parameter_type.first_child().and_then(Node::first_child) else {
            self.invalid();
            return;
        };

        if parameters.kind != NodeKind::Tuple {
            // A single unnamed parameter.
            if show_types {
                self.push("(");
                self.print(parameters, false);
                self.push(")");
            } else {
                self.push("(_:)");
            }
            return;
        }

        let labels = labels.filter(|labels| !labels.children.is_empty());
        self.push("(");
        for (index, param) in parameters.children.iter().enumerate() {
            if index > 0 && show_types {
                self.push(", ");
            }
            if let Some(labels) = labels {
                match labels.child(index) {
                    Some(label) if label.kind == NodeKind::Identifier => self.push(label.text()),
                    Some(_) => self.push("_"),
                    None => {
                        self.invalid();
                        return;
                    }
                }
                self.push(":");
            } else if !show_types {
                match param
                    .children
                    .iter()
                    .find(|child| child.kind == NodeKind::TupleElementName)
                {
                    Some(name) => self.push(name.text()),
                    None => self.push("_"),
                }
                self.push(":");
            }

            if labels.is_some() && show_types {
                self.push(" ");
            }
            if show_types {
                self.print(param, false);
            }
        }
        self.push(")");
    }

    pub(super) fn print_function_type(&mut self, labels: Option<&Node>, node: &Node) {
        if !(2..=3).contains(&node.children.len()) {
            self.invalid();
            return;
        }
        let start = usize::from(node.children[0].kind == NodeKind::ThrowsAnnotation);
        let show_types = self.has(PrintOptions::SHOW_FUNCTION_ARGUMENT_TYPES);
        self.print_function_parameters(labels, &node.children[start], show_types);
        if !show_types {
            return;
        }
        if start == 1 {
            self.push(" throws");
        }
        self.print_child(node, start + 1);
    }

    fn advance_impl_state(&mut self, state: &mut ImplState, target: ImplState) {
        while *state < target {
            match *state {
                ImplState::Attrs => {
                    self.push("(");
                    *state = ImplState::Inputs;
                }
                ImplState::Inputs => {
                    self.push(") -> (");
                    *state = ImplState::Results;
                }
                ImplState::Results => break,
            }
        }
    }

    /// `@convention(thin) (@in A) -> (@out B)`: attributes, then
    /// parameters, then results.
    pub(super) fn print_impl_function_type(&mut self, node: &Node) {
        let mut state = ImplState::Attrs;
        for child in &node.children {
            match child.kind {
                NodeKind::ImplParameter => {
                    if state == ImplState::Inputs {
                        self.push(", ");
                    }
                    self.advance_impl_state(&mut state, ImplState::Inputs);
                    self.print(child, false);
                }
                NodeKind::ImplResult | NodeKind::ImplErrorResult => {
                    if state == ImplState::Results {
                        self.push(", ");
                    }
                    self.advance_impl_state(&mut state, ImplState::Results);
                    self.print(child, false);
                }
                _ => {
                    if state != ImplState::Attrs {
                        self.invalid();
                        return;
                    }
                    self.print(child, false);
                    self.push(" ");
                }
            }
        }
        self.advance_impl_state(&mut state, ImplState::Results);
        self.push(")");
    }

    // ── Metatypes and existentials ──────────────────────────────────

    pub(super) fn print_metatype(&mut self, node: &Node) {
        let mut idx = 0;
        if node.children.len() == 2 {
            self.print_child(node, 0);
            self.push(" ");
            idx = 1;
        }
        let Some(ty) = self.child(node, idx).and_then(Node::first_child) else {
            self.invalid();
            return;
        };
        self.print_with_parens(ty);
        self.push(if is_existential_type(ty) {
            ".Protocol"
        } else {
            ".Type"
        });
    }

    pub(super) fn print_protocol_list(&mut self, node: &Node) {
        match node.kind {
            NodeKind::ProtocolList => {
                let Some(list) = node.first_child() else {
                    return;
                };
                if list.children.is_empty() {
                    self.push("Any");
                } else {
                    self.print_children(list, " & ");
                }
            }
            NodeKind::ProtocolListWithClass => {
                let (Some(protocols), Some(superclass)) = (node.child(0), node.child(1)) else {
                    return;
                };
                self.print(superclass, false);
                self.push(" & ");
                if let Some(list) = protocols.first_child() {
                    self.print_children(list, " & ");
                }
            }
            _ => {
                let Some(list) = node.first_child().and_then(Node::first_child) else {
                    return;
                };
                if !list.children.is_empty() {
                    self.print_children(list, " & ");
                    self.push(" & ");
                }
                if self.has(PrintOptions::QUALIFY_ENTITIES) {
                    self.push("Swift.");
                }
                self.push("AnyObject");
            }
        }
    }

    // ── Generic signatures ──────────────────────────────────────────

    /// `<A, B where A: P>`, one `><` group per depth.
    pub(super) fn print_generic_signature(&mut self, node: &Node) {
        self.push("<");
        let depths = node
            .children
            .iter()
            .take_while(|child| child.kind == NodeKind::DependentGenericParamCount)
            .count();

        let mut depth = 0u64;
        for count in &node.children[..depths] {
            if depth != 0 {
                self.push("><");
            }
            for index in 0..count.index().unwrap_or(0) {
                if index != 0 {
                    self.push(", ");
                }
                if index >= MAX_PRINTED_GENERIC_PARAMS {
                    self.push("...");
                    break;
                }
                self.push(&generic_parameter_name(depth, index));
            }
            depth += 1;
        }

        if depths != node.children.len() && self.has(PrintOptions::DISPLAY_WHERE_CLAUSES) {
            self.push(" where ");
            for (i, requirement) in node.children[depths..].iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.print(requirement, false);
            }
        }
        self.push(">");
    }

    pub(super) fn print_layout_requirement(&mut self, node: &Node) {
        self.print_child(node, 0);
        self.push(": ");
        let Some(layout) = self.child(node, 1) else {
            return;
        };
        if layout.kind != NodeKind::Identifier {
            self.invalid();
            return;
        }
        self.push(match layout.text() {
            "U" => "_UnknownLayout",
            "R" => "_RefCountedObject",
            "N" => "_NativeRefCountedObject",
            "C" => "AnyObject",
            "D" => "_NativeClass",
            "T" | "E" | "e" => "_Trivial",
            "M" | "m" => "_TrivialAtMost",
            _ => "",
        });
        if let Some(size) = node.child(2) {
            self.push("(");
            self.print(size, false);
            if let Some(alignment) = node.child(3) {
                self.push(", ");
                self.print(alignment, false);
            }
            self.push(")");
        }
    }

    pub(super) fn print_sil_box_with_layout(&mut self, node: &Node) {
        let Some(layout) = node
            .first_child()
            .filter(|layout| layout.kind == NodeKind::SILBoxLayout)
        else {
            self.invalid();
            return;
        };
        let mut generic_args = None;
        if node.children.len() == 3 {
            self.print_child(node, 1);
            self.push(" ");
            generic_args = node.child(2);
        }
        self.print(layout, false);
        if let Some(args) = generic_args {
            self.push(" <");
            self.print_children(args, ", ");
            self.push(">");
        }
    }
}
