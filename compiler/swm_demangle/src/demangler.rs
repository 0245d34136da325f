//! Mangled name to [`Node`] tree.
//!
//! The demangler is a single left-to-right pass over the input bytes. Each
//! operator character either pushes a leaf onto the node stack or pops the
//! operands it needs and pushes the combined node. A symbol must leave
//! exactly one entity on the stack (plus an optional suffix), which becomes
//! the child of the `Global` node; a type mangling must leave one node.
//!
//! # Substitutions
//!
//! Nominal types, identifiers and a few other productions are recorded in a
//! substitution table as they are demangled; later `A` operators refer back
//! to them by index. Identifiers additionally record their words (runs of
//! letters split at case changes and underscores), which word-substituted
//! identifiers reference by letter.
//!
//! # Failure
//!
//! Demangling is all or nothing: the first malformed byte aborts with a
//! [`DemangleError`] and no partial tree is returned. Operands that no
//! operator consumed are errors too, and so are indices that overflow.

mod entities;
mod generics;
mod identifiers;
mod pop;
mod special;
mod thunks;

use crate::config::DemangleOptions;
use crate::error::{unexpected, DemangleError, Result};
use crate::mangling::MANGLING_PREFIXES;
use crate::node::{Node, NodeKind, SymbolicReferenceKind};
use crate::stack::ensure_sufficient_stack;
use crate::symbolic::{SymbolicReference, SymbolicResolver};

/// Converts a missing operand into a positioned demangling error.
trait Require<T> {
    fn require(self, pos: usize) -> Result<T>;
}

impl<T> Require<T> for Option<T> {
    #[inline]
    fn require(self, pos: usize) -> Result<T> {
        self.ok_or_else(|| unexpected!("malformed mangling at offset {pos}"))
    }
}

/// Demangling state for one input.
pub struct Demangler<'a> {
    text: &'a [u8],
    pos: usize,
    node_stack: Vec<Node>,
    substitutions: Vec<Node>,
    words: Vec<String>,
    resolver: Option<&'a mut dyn SymbolicResolver>,
    options: DemangleOptions,
}

impl<'a> Demangler<'a> {
    pub fn new(text: &'a [u8]) -> Self {
        Demangler {
            text,
            pos: 0,
            node_stack: Vec::new(),
            substitutions: Vec::new(),
            words: Vec::new(),
            resolver: None,
            options: DemangleOptions::default(),
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: &'a mut dyn SymbolicResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: DemangleOptions) -> Self {
        self.options = options;
        self
    }

    /// Demangles a full symbol, which must start with a mangling prefix.
    pub fn demangle_symbol(mut self) -> Result<Node> {
        if self.next_if_str("_Tt") {
            return Err(DemangleError::NotImplemented(
                "old-style class and protocol names".to_owned(),
            ));
        }
        if !self.text.starts_with(b"_T0") && self.next_if_str("_T") {
            return Err(DemangleError::NotImplemented(
                "old function type mangling".to_owned(),
            ));
        }
        if !MANGLING_PREFIXES
            .iter()
            .any(|prefix| self.next_if_str(prefix))
        {
            return Err(unexpected!("unknown mangling prefix"));
        }

        self.parse_and_push_nodes()?;
        let suffix = self.pop_kind(NodeKind::Suffix);

        // Attributes after a partial-apply forwarder nest inside it, so keep
        // the chain of open parents and fold it once the stack is drained.
        let mut parents = vec![Node::new(NodeKind::Global)];
        while let Some(attr) = self.pop_if(NodeKind::is_function_attr) {
            if matches!(
                attr.kind,
                NodeKind::PartialApplyForwarder | NodeKind::PartialApplyObjCForwarder
            ) {
                parents.push(attr);
            } else if let Some(parent) = parents.last_mut() {
                parent.add_child(attr);
            }
        }

        // Exactly one entity remains; anything else is an operand that no
        // operator consumed.
        let remaining = std::mem::take(&mut self.node_stack);
        match remaining.as_slice() {
            [entity] if !is_stray_operand(entity.kind) => {}
            [] => return Err(unexpected!("symbol has no entities")),
            _ => return Err(unexpected!("unconsumed operands at offset {}", self.pos)),
        }
        for node in remaining.into_iter().chain(suffix) {
            let node = if node.kind == NodeKind::Type {
                node.children.into_iter().next().require(self.pos)?
            } else {
                node
            };
            if let Some(parent) = parents.last_mut() {
                parent.add_child(node);
            }
        }

        let mut top_level = parents.pop().require(self.pos)?;
        while let Some(mut parent) = parents.pop() {
            parent.add_child(top_level);
            top_level = parent;
        }

        tracing::trace!(len = self.text.len(), "demangled symbol");
        Ok(top_level)
    }

    /// Demangles an unprefixed type mangling.
    pub fn demangle_type(mut self) -> Result<Node> {
        self.parse_and_push_nodes()?;
        if self.node_stack.len() > 1 {
            return Err(unexpected!("unconsumed operands at offset {}", self.pos));
        }
        if let Some(result) = self.pop() {
            return Ok(result);
        }
        Ok(Node::with_text(
            NodeKind::Suffix,
            String::from_utf8_lossy(self.text).into_owned(),
        ))
    }

    // ── Cursor ──────────────────────────────────────────────────────

    fn failure(&self) -> DemangleError {
        unexpected!("malformed mangling at offset {}", self.pos)
    }

    fn ensure(&self, condition: bool) -> Result<()> {
        if condition {
            Ok(())
        } else {
            Err(self.failure())
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }

    fn next_char(&mut self) -> Result<u8> {
        let c = self
            .peek()
            .ok_or_else(|| unexpected!("mangling ended prematurely"))?;
        self.pos += 1;
        Ok(c)
    }

    fn next_if(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn next_if_str(&mut self, s: &str) -> bool {
        if self.text[self.pos..].starts_with(s.as_bytes()) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn push_back(&mut self) {
        debug_assert!(self.pos > 0, "push back at start of input");
        self.pos -= 1;
    }

    fn slice_str(&self, start: usize, end: usize) -> Result<&'a str> {
        let bytes = self.text.get(start..end).require(self.pos)?;
        std::str::from_utf8(bytes).map_err(|_| self.failure())
    }

    fn add_substitution(&mut self, node: Node) {
        self.substitutions.push(node);
    }

    // ── Operators ───────────────────────────────────────────────────

    fn parse_and_push_nodes(&mut self) -> Result<()> {
        while !self.at_end() {
            let node = self.demangle_operator()?;
            self.node_stack.push(node);
        }
        Ok(())
    }

    fn demangle_operator(&mut self) -> Result<Node> {
        ensure_sufficient_stack(|| self.demangle_operator_inner())
    }

    fn demangle_operator_inner(&mut self) -> Result<Node> {
        while self.peek() == Some(0xFF) {
            self.pos += 1;
        }
        let c = self.next_char()?;
        match c {
            0x00..=0x0C => self.demangle_symbolic_reference(c),
            b'A' => self.demangle_multi_substitutions(),
            b'B' => self.demangle_builtin_type(),
            b'C' => self.demangle_any_generic_type(NodeKind::Class),
            b'D' => self.demangle_type_mangling(),
            b'E' => self.demangle_extension_context(),
            b'F' => self.demangle_plain_function(),
            b'G' => self.demangle_bound_generic_type(),
            b'H' => match self.next_char()? {
                b'A' => self.demangle_dependent_conformance_associated(),
                b'C' => self.demangle_concrete_protocol_conformance(),
                b'D' => self.demangle_dependent_conformance_root(),
                b'I' => self.demangle_dependent_conformance_inherited(),
                b'P' => Ok(Node::with_child(
                    NodeKind::ProtocolConformanceRefInTypeModule,
                    self.pop_protocol()?,
                )),
                b'p' => Ok(Node::with_child(
                    NodeKind::ProtocolConformanceRefInProtocolModule,
                    self.pop_protocol()?,
                )),
                _ => {
                    self.push_back();
                    self.push_back();
                    self.demangle_identifier()
                }
            },
            b'I' => self.demangle_impl_function_type(),
            b'K' => Ok(Node::new(NodeKind::ThrowsAnnotation)),
            b'L' => self.demangle_local_identifier(),
            b'M' => self.demangle_metatype(),
            b'N' => {
                let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
                Ok(Node::with_child(NodeKind::TypeMetadata, ty))
            }
            b'O' => self.demangle_any_generic_type(NodeKind::Enum),
            b'P' => self.demangle_any_generic_type(NodeKind::Protocol),
            b'Q' => self.demangle_archetype(),
            b'R' => self.demangle_generic_requirement(),
            b'S' => self.demangle_standard_substitution(),
            b'T' => self.demangle_thunk_or_specialization(),
            b'V' => self.demangle_any_generic_type(NodeKind::Structure),
            b'W' => self.demangle_witness(),
            b'X' => self.demangle_special_type(),
            b'Z' => {
                let entity = self.pop_if(NodeKind::is_entity).require(self.pos)?;
                Ok(Node::with_child(NodeKind::Static, entity))
            }
            b'a' => self.demangle_any_generic_type(NodeKind::TypeAlias),
            b'c' => self.pop_function_type(NodeKind::FunctionType),
            b'd' => Ok(Node::new(NodeKind::VariadicMarker)),
            b'f' => self.demangle_function_entity(),
            b'g' => self.demangle_retroactive_conformance(),
            b'h' => {
                let child = self.pop_type_and_get_child()?;
                Ok(Node::ty(Node::with_child(NodeKind::Shared, child)))
            }
            b'i' => self.demangle_subscript(),
            b'l' => self.demangle_generic_signature(false),
            b'm' => {
                let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
                Ok(Node::ty(Node::with_child(NodeKind::Metatype, ty)))
            }
            b'n' => {
                let child = self.pop_type_and_get_child()?;
                Ok(Node::ty(Node::with_child(NodeKind::Owned, child)))
            }
            b'o' => self.demangle_operator_identifier(),
            b'p' => Ok(Node::ty(self.demangle_protocol_list()?)),
            b'q' => Ok(Node::ty(self.demangle_generic_param_index()?)),
            b'r' => self.demangle_generic_signature(true),
            b's' => Ok(Node::with_text(
                NodeKind::Module,
                crate::mangling::STDLIB_NAME,
            )),
            b't' => self.pop_tuple(),
            b'u' => self.demangle_generic_type(),
            b'v' => self.demangle_variable(),
            b'w' => self.demangle_value_witness(),
            b'x' => Ok(Node::ty(dependent_generic_param_type(0, 0))),
            b'y' => Ok(Node::new(NodeKind::EmptyList)),
            b'z' => {
                let child = self.pop_type_and_get_child()?;
                Ok(Node::ty(Node::with_child(NodeKind::InOut, child)))
            }
            b'_' => Ok(Node::new(NodeKind::FirstElementMarker)),
            b'.' => {
                self.push_back();
                let suffix = String::from_utf8_lossy(&self.text[self.pos..]).into_owned();
                self.pos = self.text.len();
                Ok(Node::with_text(NodeKind::Suffix, suffix))
            }
            _ => {
                self.push_back();
                self.demangle_identifier()
            }
        }
    }

    fn demangle_type_mangling(&mut self) -> Result<Node> {
        let ty = self.pop_kind(NodeKind::Type).require(self.pos)?;
        let mut children = Vec::with_capacity(2);
        if let Some(labels) = self.pop_function_param_labels(&ty)? {
            children.push(labels);
        }
        children.push(ty);
        Ok(Node::with_children(NodeKind::TypeMangling, children))
    }

    fn demangle_symbolic_reference(&mut self, raw_kind: u8) -> Result<Node> {
        let position = self.pos - 1;
        let bytes = self.text.get(self.pos..self.pos + 4).require(self.pos)?;
        let offset = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        self.pos += 4;

        let (kind, directness) =
            SymbolicReference::from_control_byte(raw_kind).ok_or_else(|| self.failure())?;
        let reference = SymbolicReference {
            kind,
            directness,
            position,
            offset,
        };

        let resolver = self.resolver.as_mut().ok_or_else(|| {
            DemangleError::NotImplemented("symbolic reference without a resolver".to_owned())
        })?;
        let resolved = resolver
            .resolve(&reference)
            .ok_or_else(|| unexpected!("unresolved symbolic reference at offset {position}"))?;
        tracing::trace!(?kind, ?directness, position, offset, "resolved symbolic reference");

        if kind == SymbolicReferenceKind::Context
            && resolved.kind != NodeKind::OpaqueTypeDescriptorSymbolicReference
        {
            self.add_substitution(resolved.clone());
        }
        Ok(resolved)
    }
}

/// `DependentGenericParamType` with index children for `depth` and `index`.
/// Kinds that only exist as operands of a later operator and can never
/// stand alone as the entity of a symbol.
fn is_stray_operand(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Identifier
            | NodeKind::EmptyList
            | NodeKind::FirstElementMarker
            | NodeKind::VariadicMarker
            | NodeKind::TupleElementName
            | NodeKind::Number
            | NodeKind::Index
            | NodeKind::LabelList
            | NodeKind::TypeList
            | NodeKind::DependentGenericSignature
            | NodeKind::DependentGenericParamCount
            | NodeKind::ThrowsAnnotation
            | NodeKind::ReturnType
            | NodeKind::ArgumentTuple
            | NodeKind::RetroactiveConformance
            | NodeKind::ImplConvention
            | NodeKind::ImplFunctionAttribute
            | NodeKind::ImplParameter
            | NodeKind::ImplResult
            | NodeKind::ImplEscaping
            | NodeKind::PrivateDeclName
            | NodeKind::LocalDeclName
            | NodeKind::InfixOperator
            | NodeKind::PrefixOperator
            | NodeKind::PostfixOperator
            | NodeKind::DependentGenericSameTypeRequirement
            | NodeKind::DependentGenericLayoutRequirement
            | NodeKind::DependentGenericConformanceRequirement
            | NodeKind::DependentAssociatedTypeRef
            | NodeKind::SpecializationPassID
            | NodeKind::IsSerialized
            | NodeKind::Suffix
    )
}

fn dependent_generic_param_type(depth: u64, index: u64) -> Node {
    Node::with_children(
        NodeKind::DependentGenericParamType,
        vec![
            Node::with_index(NodeKind::Index, depth),
            Node::with_index(NodeKind::Index, index),
        ],
    )
}

/// Demangles a full symbol such as `$s4main3fooyyF`.
pub fn demangle_symbol(name: impl AsRef<[u8]>) -> Result<Node> {
    Demangler::new(name.as_ref()).demangle_symbol()
}

/// Demangles a type mangling without prefix, such as `Si` or `SaySSG`.
pub fn demangle_type(name: impl AsRef<[u8]>) -> Result<Node> {
    Demangler::new(name.as_ref()).demangle_type()
}

/// Demangles a symbol whose embedded symbolic references are resolved by
/// `resolver`.
pub fn demangle_symbol_with_resolver(
    name: impl AsRef<[u8]>,
    resolver: &mut dyn SymbolicResolver,
) -> Result<Node> {
    Demangler::new(name.as_ref())
        .with_resolver(resolver)
        .demangle_symbol()
}

/// Type-mangling counterpart of [`demangle_symbol_with_resolver`].
pub fn demangle_type_with_resolver(
    name: impl AsRef<[u8]>,
    resolver: &mut dyn SymbolicResolver,
) -> Result<Node> {
    Demangler::new(name.as_ref())
        .with_resolver(resolver)
        .demangle_type()
}

#[cfg(test)]
mod tests;
