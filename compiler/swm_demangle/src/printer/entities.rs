//! Declarations: `<context>.<name><type>` and the prefixes hoisted onto them.

use super::{find_child, types::needs_space_before_type, NodePrinter};
use crate::config::PrintOptions;
use crate::node::{FunctionSigSpecializationParamKind, Node, NodeKind};

/// How an entity's type follows its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum TypePrinting {
    NoType,
    /// `name : Type`, used for storage.
    WithColon,
    /// `name(params) -> result`; falls back to a colon for non-function types.
    FunctionStyle,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct EntityStyle {
    pub type_printing: TypePrinting,
    /// Child 1 is the entity's name.
    pub has_name: bool,
    /// Appended after the name, as in `foo.getter` or `closure #`.
    pub extra_name: &'static str,
    pub extra_index: Option<u64>,
    /// Printed in place of the name, even when `has_name` is false.
    pub overwrite_name: &'static str,
}

impl EntityStyle {
    pub(super) fn named(type_printing: TypePrinting) -> Self {
        EntityStyle {
            type_printing,
            has_name: true,
            extra_name: "",
            extra_index: None,
            overwrite_name: "",
        }
    }

    pub(super) fn unnamed(type_printing: TypePrinting, extra_name: &'static str) -> Self {
        EntityStyle {
            type_printing,
            has_name: false,
            extra_name,
            extra_index: None,
            overwrite_name: "",
        }
    }
}

fn is_function_type(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::FunctionType
            | NodeKind::NoEscapeFunctionType
            | NodeKind::UncurriedFunctionType
            | NodeKind::CFunctionPointer
            | NodeKind::ThinFunctionType
    )
}

impl NodePrinter {
    /// Prints an entity with its context either as a prefix (`main.foo`) or,
    /// for multi-word names, as a postfix (`closure #1 in main.foo`).
    ///
    /// Returns the entity itself when it was asked to print as a prefix
    /// context but cannot.
    pub(super) fn print_entity<'n>(
        &mut self,
        entity: &'n Node,
        as_prefix_context: bool,
        style: EntityStyle,
    ) -> Option<&'n Node> {
        let mut entity = entity;
        let mut generic_args = None;
        if entity.kind == NodeKind::BoundGenericFunction {
            generic_args = Some(self.child(entity, 1)?);
            entity = self.child(entity, 0)?;
        }

        let mut extra_name = style.extra_name;
        // Local names do not read well after a prefix context either.
        let multi_word_name = extra_name.contains(' ')
            || (style.has_name
                && entity
                    .child(1)
                    .is_some_and(|name| name.kind == NodeKind::LocalDeclName));

        if as_prefix_context && (style.type_printing != TypePrinting::NoType || multi_word_name) {
            return Some(entity);
        }

        let mut postfix_context = None;
        let context = self.child(entity, 0)?;
        if self.prints_context(context) {
            if multi_word_name {
                postfix_context = Some(context);
            } else {
                let mark = self.out.len();
                postfix_context = self.print(context, true);
                if self.out.len() != mark {
                    self.push(".");
                }
            }
        }

        if style.has_name || !style.overwrite_name.is_empty() {
            if !extra_name.is_empty() && multi_word_name {
                self.push(extra_name);
                self.push(" of ");
                extra_name = "";
            }
            let mark = self.out.len();
            if style.overwrite_name.is_empty() {
                let name = self.child(entity, 1)?;
                if name.kind != NodeKind::PrivateDeclName {
                    self.print(name, false);
                }
                if let Some(private) = find_child(entity, NodeKind::PrivateDeclName) {
                    self.print(private, false);
                }
            } else {
                self.push(style.overwrite_name);
            }
            if self.out.len() != mark && !extra_name.is_empty() {
                self.push(".");
            }
        }
        if !extra_name.is_empty() {
            self.push(extra_name);
            if let Some(index) = style.extra_index {
                self.push_number(index);
            }
        }

        if style.type_printing != TypePrinting::NoType {
            let Some(ty) = find_child(entity, NodeKind::Type).and_then(Node::first_child) else {
                self.invalid();
                return None;
            };
            let mut type_printing = style.type_printing;
            if type_printing == TypePrinting::FunctionStyle {
                let mut inner = ty;
                while inner.kind == NodeKind::DependentGenericType {
                    match inner.child(1).and_then(Node::first_child) {
                        Some(next) => inner = next,
                        None => break,
                    }
                }
                if !is_function_type(inner.kind) {
                    type_printing = TypePrinting::WithColon;
                }
            }

            if type_printing == TypePrinting::WithColon {
                if self.has(PrintOptions::DISPLAY_ENTITY_TYPES) {
                    self.push(" : ");
                    self.print_entity_type(entity, ty, generic_args);
                }
            } else {
                if multi_word_name || needs_space_before_type(ty) {
                    self.push(" ");
                }
                self.print_entity_type(entity, ty, generic_args);
            }
        }

        if !as_prefix_context {
            if let Some(context) = postfix_context.take() {
                self.push(
                    if matches!(
                        entity.kind,
                        NodeKind::DefaultArgumentInitializer | NodeKind::Initializer
                    ) {
                        " of "
                    } else {
                        " in "
                    },
                );
                self.print(context, false);
            }
        }
        postfix_context
    }

    /// Labels and explicit generic arguments force the function-style
    /// spelling; anything else prints as a plain type.
    fn print_entity_type(&mut self, entity: &Node, ty: &Node, generic_args: Option<&Node>) {
        let labels = find_child(entity, NodeKind::LabelList);
        if labels.is_none() && generic_args.is_none() {
            self.print(ty, false);
            return;
        }

        if let Some(args) = generic_args {
            self.push("<");
            self.print_children(args, ", ");
            self.push(">");
        }
        let mut ty = ty;
        if ty.kind == NodeKind::DependentGenericType {
            if generic_args.is_none() {
                self.print_child(ty, 0);
            }
            let Some(dependent) = self.child(ty, 1) else {
                return;
            };
            if needs_space_before_type(dependent) {
                self.push(" ");
            }
            let Some(inner) = self.child(dependent, 0) else {
                return;
            };
            ty = inner;
        }
        self.print_function_type(labels, ty);
    }

    /// Accessors print as their storage with the accessor name appended.
    pub(super) fn print_abstract_storage<'n>(
        &mut self,
        accessor: &'n Node,
        as_prefix_context: bool,
        extra_name: &'static str,
    ) -> Option<&'n Node> {
        let storage = self.child(accessor, 0)?;
        match storage.kind {
            NodeKind::Variable => self.print_entity(
                storage,
                as_prefix_context,
                EntityStyle {
                    has_name: true,
                    ..EntityStyle::unnamed(TypePrinting::WithColon, extra_name)
                },
            ),
            NodeKind::Subscript => self.print_entity(
                storage,
                as_prefix_context,
                EntityStyle {
                    overwrite_name: "subscript",
                    ..EntityStyle::unnamed(TypePrinting::WithColon, extra_name)
                },
            ),
            _ => {
                self.invalid();
                None
            }
        }
    }

    // ── Specializations ─────────────────────────────────────────────

    pub(super) fn print_specialization_prefix(
        &mut self,
        node: &Node,
        description: &str,
        param_prefix: &str,
    ) {
        if !self.has(PrintOptions::DISPLAY_GENERIC_SPECIALIZATIONS) {
            if !self.specialization_prefix_printed {
                self.push("specialized ");
                self.specialization_prefix_printed = true;
            }
            return;
        }

        self.push(description);
        self.push(" <");
        let mut separator = "";
        let mut arg_num = 0u64;
        for child in &node.children {
            match child.kind {
                NodeKind::SpecializationPassID => {}
                NodeKind::IsSerialized => {
                    self.push(separator);
                    separator = ", ";
                    self.print(child, false);
                }
                _ => {
                    if !child.children.is_empty() {
                        self.push(separator);
                        self.push(param_prefix);
                        separator = ", ";
                        match child.kind {
                            NodeKind::FunctionSignatureSpecializationParam => {
                                self.push("Arg[");
                                self.push_number(arg_num);
                                self.push("] = ");
                                self.print_function_sig_specialization_params(child);
                            }
                            NodeKind::FunctionSignatureSpecializationReturn => {
                                self.push("Return = ");
                                self.print_function_sig_specialization_params(child);
                            }
                            _ => {
                                self.print(child, false);
                            }
                        }
                    }
                    arg_num += 1;
                }
            }
        }
        self.push("> of ");
    }

    fn print_function_sig_specialization_params(&mut self, node: &Node) {
        use FunctionSigSpecializationParamKind as P;

        let mut children = node.children.iter().peekable();
        while let Some(kind_node) = children.next() {
            let Some(raw) = kind_node.index() else {
                self.invalid();
                return;
            };
            match P(raw).exclusive_kind() {
                Some(P::BOX_TO_VALUE | P::BOX_TO_STACK) => {
                    self.print(kind_node, false);
                }
                Some(P::CONSTANT_PROP_FUNCTION | P::CONSTANT_PROP_GLOBAL) => {
                    self.push("[");
                    self.print(kind_node, false);
                    self.push(" : ");
                    let Some(payload) = children.next() else {
                        self.invalid();
                        return;
                    };
                    self.print_symbol_text(payload.text());
                    self.push("]");
                }
                Some(P::CONSTANT_PROP_INTEGER | P::CONSTANT_PROP_FLOAT) => {
                    self.push("[");
                    self.print(kind_node, false);
                    self.push(" : ");
                    let Some(value) = children.next() else {
                        self.invalid();
                        return;
                    };
                    self.print(value, false);
                    self.push("]");
                }
                Some(P::CONSTANT_PROP_STRING) => {
                    self.push("[");
                    self.print(kind_node, false);
                    self.push(" : ");
                    let (Some(encoding), Some(value)) = (children.next(), children.next()) else {
                        self.invalid();
                        return;
                    };
                    self.print(encoding, false);
                    self.push("'");
                    self.print(value, false);
                    self.push("'");
                    self.push("]");
                }
                Some(P::CLOSURE_PROP) => {
                    self.push("[");
                    self.print(kind_node, false);
                    self.push(" : ");
                    let Some(closure) = children.next() else {
                        self.invalid();
                        return;
                    };
                    self.print(closure, false);
                    self.push(", Argument Types : [");
                    while let Some(argument) = children.next_if(|c| c.kind == NodeKind::Type) {
                        self.print(argument, false);
                        if children.peek().is_some_and(|next| next.has_text()) {
                            self.push(", ");
                        }
                    }
                    self.push("]");
                }
                _ => {
                    self.print(kind_node, false);
                }
            }
        }
    }

    /// Option flags print joined by `and`; otherwise the exclusive kind.
    pub(super) fn print_param_kind(&mut self, raw: u64) {
        use FunctionSigSpecializationParamKind as P;

        let flags = [
            (P::EXISTENTIAL_TO_GENERIC, "Existential To Protocol Constrained Generic"),
            (P::DEAD, "Dead"),
            (P::OWNED_TO_GUARANTEED, "Owned To Guaranteed"),
            (P::GUARANTEED_TO_OWNED, "Guaranteed To Owned"),
            (P::SROA, "Exploded"),
        ];
        let set: Vec<&str> = flags
            .iter()
            .filter(|(flag, _)| P(raw).contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if !set.is_empty() {
            self.push(&set.join(" and "));
            return;
        }

        let name = match raw {
            P::BOX_TO_VALUE => "Value Promoted from Box",
            P::BOX_TO_STACK => "Stack Promoted from Box",
            P::CONSTANT_PROP_FUNCTION => "Constant Propagated Function",
            P::CONSTANT_PROP_GLOBAL => "Constant Propagated Global",
            P::CONSTANT_PROP_INTEGER => "Constant Propagated Integer",
            P::CONSTANT_PROP_FLOAT => "Constant Propagated Float",
            P::CONSTANT_PROP_STRING => "Constant Propagated String",
            P::CLOSURE_PROP => "Closure Propagated",
            _ => {
                self.invalid();
                return;
            }
        };
        self.push(name);
    }
}
