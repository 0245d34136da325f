//! Demangled symbol trees.
//!
//! A [`Node`] is a plain value: a kind tag, an optional text or index payload
//! and an ordered list of children. Trees are built bottom-up by the
//! demangler and consumed by the remangler, the classifiers and the lowering
//! crate's type builder.

mod kind;

use std::fmt;

pub use kind::NodeKind;

/// Optional payload carried by a node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Payload {
    #[default]
    None,
    Text(String),
    Index(u64),
}

/// One node of a demangled tree.
///
/// Equality is structural: two trees are equal when their kinds, payloads
/// and children are pairwise equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub kind: NodeKind,
    pub payload: Payload,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            payload: Payload::None,
            children: Vec::new(),
        }
    }

    pub fn with_text(kind: NodeKind, text: impl Into<String>) -> Self {
        Node {
            kind,
            payload: Payload::Text(text.into()),
            children: Vec::new(),
        }
    }

    pub fn with_index(kind: NodeKind, index: u64) -> Self {
        Node {
            kind,
            payload: Payload::Index(index),
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, children: Vec<Node>) -> Self {
        Node {
            kind,
            payload: Payload::None,
            children,
        }
    }

    pub fn with_child(kind: NodeKind, child: Node) -> Self {
        Node::with_children(kind, vec![child])
    }

    /// Wraps `child` in a `Type` node.
    pub fn ty(child: Node) -> Self {
        Node::with_child(NodeKind::Type, child)
    }

    /// Text payload, or `""` when the node carries none.
    pub fn text(&self) -> &str {
        match &self.payload {
            Payload::Text(text) => text,
            _ => "",
        }
    }

    pub fn index(&self) -> Option<u64> {
        match self.payload {
            Payload::Index(index) => Some(index),
            _ => None,
        }
    }

    pub fn has_text(&self) -> bool {
        matches!(self.payload, Payload::Text(_))
    }

    pub fn has_index(&self) -> bool {
        matches!(self.payload, Payload::Index(_))
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children.first()
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn add_children(&mut self, children: impl IntoIterator<Item = Node>) {
        self.children.extend(children);
    }

    /// Same payload and children under a different kind.
    pub fn changing_kind(self, kind: NodeKind) -> Node {
        Node { kind, ..self }
    }

    /// Reverses the children at positions `from..`.
    pub fn reverse_children_from(&mut self, from: usize) {
        if from < self.children.len() {
            self.children[from..].reverse();
        }
    }

    /// Strips one `Type` wrapper, if present.
    pub fn unwrap_type(&self) -> &Node {
        if self.kind == NodeKind::Type {
            if let Some(inner) = self.first_child() {
                return inner;
            }
        }
        self
    }

    /// Whether the node, or any context above it, carries bound generic
    /// arguments.
    pub fn is_specialized(&self) -> bool {
        match self.kind {
            NodeKind::BoundGenericStructure
            | NodeKind::BoundGenericEnum
            | NodeKind::BoundGenericClass
            | NodeKind::BoundGenericOtherNominalType
            | NodeKind::BoundGenericTypeAlias
            | NodeKind::BoundGenericProtocol
            | NodeKind::BoundGenericFunction => true,
            NodeKind::Structure
            | NodeKind::Enum
            | NodeKind::Class
            | NodeKind::TypeAlias
            | NodeKind::OtherNominalType
            | NodeKind::Protocol
            | NodeKind::Function
            | NodeKind::Allocator
            | NodeKind::Constructor
            | NodeKind::Destructor
            | NodeKind::Variable
            | NodeKind::Subscript
            | NodeKind::ExplicitClosure
            | NodeKind::ImplicitClosure
            | NodeKind::Initializer
            | NodeKind::DefaultArgumentInitializer
            | NodeKind::Getter
            | NodeKind::Setter
            | NodeKind::WillSet
            | NodeKind::DidSet
            | NodeKind::ReadAccessor
            | NodeKind::ModifyAccessor
            | NodeKind::UnsafeAddressor
            | NodeKind::UnsafeMutableAddressor => {
                self.first_child().is_some_and(Node::is_specialized)
            }
            NodeKind::Extension => self.child(1).is_some_and(Node::is_specialized),
            _ => false,
        }
    }

    /// The node with every layer of bound generic arguments removed.
    ///
    /// Returns `None` for kinds that cannot be specialized.
    pub fn unspecialized(&self) -> Option<Node> {
        match self.kind {
            NodeKind::Structure
            | NodeKind::Enum
            | NodeKind::Class
            | NodeKind::TypeAlias
            | NodeKind::OtherNominalType
            | NodeKind::Protocol
            | NodeKind::Function
            | NodeKind::Allocator
            | NodeKind::Constructor
            | NodeKind::Destructor
            | NodeKind::Variable
            | NodeKind::Subscript
            | NodeKind::ExplicitClosure
            | NodeKind::ImplicitClosure
            | NodeKind::Initializer
            | NodeKind::DefaultArgumentInitializer
            | NodeKind::Getter
            | NodeKind::Setter
            | NodeKind::WillSet
            | NodeKind::DidSet
            | NodeKind::ReadAccessor
            | NodeKind::ModifyAccessor
            | NodeKind::UnsafeAddressor
            | NodeKind::UnsafeMutableAddressor => {
                let mut result = Node {
                    kind: self.kind,
                    payload: self.payload.clone(),
                    children: Vec::with_capacity(self.children.len()),
                };
                let mut children = self.children.iter();
                let parent = children.next()?;
                let parent = if parent.is_specialized() {
                    parent.unspecialized()?
                } else {
                    parent.clone()
                };
                result.add_child(parent);
                result.add_children(children.cloned());
                Some(result)
            }
            NodeKind::BoundGenericStructure
            | NodeKind::BoundGenericEnum
            | NodeKind::BoundGenericClass
            | NodeKind::BoundGenericOtherNominalType
            | NodeKind::BoundGenericTypeAlias
            | NodeKind::BoundGenericProtocol => {
                let unbound = self.first_child()?.first_child()?;
                if unbound.is_specialized() {
                    unbound.unspecialized()
                } else {
                    Some(unbound.clone())
                }
            }
            NodeKind::BoundGenericFunction => {
                let unbound = self.first_child()?;
                if unbound.is_specialized() {
                    unbound.unspecialized()
                } else {
                    Some(unbound.clone())
                }
            }
            NodeKind::Extension => {
                let parent = self.child(1)?;
                if !parent.is_specialized() {
                    return Some(self.clone());
                }
                let mut result = Node::new(NodeKind::Extension);
                result.add_child(self.first_child()?.clone());
                result.add_child(parent.unspecialized()?);
                if let Some(sig) = self.child(2) {
                    result.add_child(sig.clone());
                }
                Some(result)
            }
            _ => None,
        }
    }

    /// Pre-order iterator over the tree.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Encodes the tree for an on-disk demangling cache.
    #[cfg(feature = "cache")]
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    #[cfg(feature = "cache")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Node, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Pre-order traversal returned by [`Node::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Debug tree dump: one node per line, children indented by two spaces.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kind={}", self.kind)?;
        match &self.payload {
            Payload::None => {}
            Payload::Text(text) => write!(f, ", text=\"{text}\"")?,
            Payload::Index(index) => write!(f, ", index=\"{index}\"")?,
        }
        for child in &self.children {
            for line in child.to_string().lines() {
                write!(f, "\n  {line}")?;
            }
        }
        Ok(())
    }
}

// ── Auxiliary enums ─────────────────────────────────────────────

/// Whether a reference points at its target or at a pointer to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Directness {
    Direct = 0,
    Indirect = 1,
}

impl Directness {
    pub fn name(self) -> &'static str {
        match self {
            Directness::Direct => "direct",
            Directness::Indirect => "indirect",
        }
    }
}

/// What an embedded symbolic reference points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolicReferenceKind {
    /// A context descriptor.
    Context,
    /// An accessor function returning the referenced entity.
    AccessorFunctionReference,
}

/// Optimizer passes recorded in specialization manglings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SpecializationPass {
    AllocBoxToStack = 0,
    ClosureSpecializer,
    CapturePromotion,
    CapturePropagation,
    FunctionSignatureOpts,
    GenericSpecializer,
}

impl SpecializationPass {
    pub fn from_raw(raw: u64) -> Option<Self> {
        Some(match raw {
            0 => SpecializationPass::AllocBoxToStack,
            1 => SpecializationPass::ClosureSpecializer,
            2 => SpecializationPass::CapturePromotion,
            3 => SpecializationPass::CapturePropagation,
            4 => SpecializationPass::FunctionSignatureOpts,
            5 => SpecializationPass::GenericSpecializer,
            _ => return None,
        })
    }
}

/// Parameter transformations of a function signature specialization.
///
/// The low bits hold an exclusive kind (`0..=7`); the high bits are
/// combinable option flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FunctionSigSpecializationParamKind(pub u64);

impl FunctionSigSpecializationParamKind {
    pub const CONSTANT_PROP_FUNCTION: u64 = 0;
    pub const CONSTANT_PROP_GLOBAL: u64 = 1;
    pub const CONSTANT_PROP_INTEGER: u64 = 2;
    pub const CONSTANT_PROP_FLOAT: u64 = 3;
    pub const CONSTANT_PROP_STRING: u64 = 4;
    pub const CLOSURE_PROP: u64 = 5;
    pub const BOX_TO_VALUE: u64 = 6;
    pub const BOX_TO_STACK: u64 = 7;

    pub const DEAD: u64 = 1 << 6;
    pub const OWNED_TO_GUARANTEED: u64 = 1 << 7;
    pub const SROA: u64 = 1 << 8;
    pub const GUARANTEED_TO_OWNED: u64 = 1 << 9;
    pub const EXISTENTIAL_TO_GENERIC: u64 = 1 << 10;

    const KIND_MASK: u64 = 0x3F;

    /// The exclusive kind, when one of the low values is set and no option
    /// flag is.
    pub fn exclusive_kind(self) -> Option<u64> {
        if self.0 & !Self::KIND_MASK == 0 {
            Some(self.0)
        } else {
            None
        }
    }

    pub fn contains(self, flag: u64) -> bool {
        self.0 & flag != 0
    }
}

/// Value witness table entries, with their two-letter mangling codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueWitnessKind {
    AllocateBuffer = 0,
    AssignWithCopy,
    AssignWithTake,
    DeallocateBuffer,
    Destroy,
    DestroyArray,
    DestroyBuffer,
    InitializeBufferWithCopyOfBuffer,
    InitializeBufferWithCopy,
    InitializeWithCopy,
    InitializeBufferWithTake,
    InitializeWithTake,
    ProjectBuffer,
    InitializeBufferWithTakeOfBuffer,
    InitializeArrayWithCopy,
    InitializeArrayWithTakeFrontToBack,
    InitializeArrayWithTakeBackToFront,
    StoreExtraInhabitant,
    GetExtraInhabitantIndex,
    GetEnumTag,
    DestructiveProjectEnumData,
    DestructiveInjectEnumTag,
    GetEnumTagSinglePayload,
    StoreEnumTagSinglePayload,
}

impl ValueWitnessKind {
    pub const ALL: [ValueWitnessKind; 24] = [
        ValueWitnessKind::AllocateBuffer,
        ValueWitnessKind::AssignWithCopy,
        ValueWitnessKind::AssignWithTake,
        ValueWitnessKind::DeallocateBuffer,
        ValueWitnessKind::Destroy,
        ValueWitnessKind::DestroyArray,
        ValueWitnessKind::DestroyBuffer,
        ValueWitnessKind::InitializeBufferWithCopyOfBuffer,
        ValueWitnessKind::InitializeBufferWithCopy,
        ValueWitnessKind::InitializeWithCopy,
        ValueWitnessKind::InitializeBufferWithTake,
        ValueWitnessKind::InitializeWithTake,
        ValueWitnessKind::ProjectBuffer,
        ValueWitnessKind::InitializeBufferWithTakeOfBuffer,
        ValueWitnessKind::InitializeArrayWithCopy,
        ValueWitnessKind::InitializeArrayWithTakeFrontToBack,
        ValueWitnessKind::InitializeArrayWithTakeBackToFront,
        ValueWitnessKind::StoreExtraInhabitant,
        ValueWitnessKind::GetExtraInhabitantIndex,
        ValueWitnessKind::GetEnumTag,
        ValueWitnessKind::DestructiveProjectEnumData,
        ValueWitnessKind::DestructiveInjectEnumTag,
        ValueWitnessKind::GetEnumTagSinglePayload,
        ValueWitnessKind::StoreEnumTagSinglePayload,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ValueWitnessKind::AllocateBuffer => "al",
            ValueWitnessKind::AssignWithCopy => "ca",
            ValueWitnessKind::AssignWithTake => "ta",
            ValueWitnessKind::DeallocateBuffer => "de",
            ValueWitnessKind::Destroy => "xx",
            ValueWitnessKind::DestroyArray => "Xx",
            ValueWitnessKind::DestroyBuffer => "XX",
            ValueWitnessKind::InitializeBufferWithCopyOfBuffer => "CP",
            ValueWitnessKind::InitializeBufferWithCopy => "Cp",
            ValueWitnessKind::InitializeWithCopy => "cp",
            ValueWitnessKind::InitializeBufferWithTake => "Tk",
            ValueWitnessKind::InitializeWithTake => "tk",
            ValueWitnessKind::ProjectBuffer => "pr",
            ValueWitnessKind::InitializeBufferWithTakeOfBuffer => "TK",
            ValueWitnessKind::InitializeArrayWithCopy => "Cc",
            ValueWitnessKind::InitializeArrayWithTakeFrontToBack => "Tt",
            ValueWitnessKind::InitializeArrayWithTakeBackToFront => "tT",
            ValueWitnessKind::StoreExtraInhabitant => "xs",
            ValueWitnessKind::GetExtraInhabitantIndex => "xg",
            ValueWitnessKind::GetEnumTag => "ug",
            ValueWitnessKind::DestructiveProjectEnumData => "up",
            ValueWitnessKind::DestructiveInjectEnumTag => "ui",
            ValueWitnessKind::GetEnumTagSinglePayload => "et",
            ValueWitnessKind::StoreEnumTagSinglePayload => "st",
        }
    }

    /// The witness name as printed in demangled text.
    pub fn name(self) -> &'static str {
        match self {
            ValueWitnessKind::AllocateBuffer => "allocateBuffer",
            ValueWitnessKind::AssignWithCopy => "assignWithCopy",
            ValueWitnessKind::AssignWithTake => "assignWithTake",
            ValueWitnessKind::DeallocateBuffer => "deallocateBuffer",
            ValueWitnessKind::Destroy => "destroy",
            ValueWitnessKind::DestroyArray => "destroyArray",
            ValueWitnessKind::DestroyBuffer => "destroyBuffer",
            ValueWitnessKind::InitializeBufferWithCopyOfBuffer => "initializeBufferWithCopyOfBuffer",
            ValueWitnessKind::InitializeBufferWithCopy => "initializeBufferWithCopy",
            ValueWitnessKind::InitializeWithCopy => "initializeWithCopy",
            ValueWitnessKind::InitializeBufferWithTake => "initializeBufferWithTake",
            ValueWitnessKind::InitializeWithTake => "initializeWithTake",
            ValueWitnessKind::ProjectBuffer => "projectBuffer",
            ValueWitnessKind::InitializeBufferWithTakeOfBuffer => "initializeBufferWithTakeOfBuffer",
            ValueWitnessKind::InitializeArrayWithCopy => "initializeArrayWithCopy",
            ValueWitnessKind::InitializeArrayWithTakeFrontToBack => "initializeArrayWithTakeFrontToBack",
            ValueWitnessKind::InitializeArrayWithTakeBackToFront => "initializeArrayWithTakeBackToFront",
            ValueWitnessKind::StoreExtraInhabitant => "storeExtraInhabitant",
            ValueWitnessKind::GetExtraInhabitantIndex => "getExtraInhabitantIndex",
            ValueWitnessKind::GetEnumTag => "getEnumTag",
            ValueWitnessKind::DestructiveProjectEnumData => "destructiveProjectEnumData",
            ValueWitnessKind::DestructiveInjectEnumTag => "destructiveInjectEnumTag",
            ValueWitnessKind::GetEnumTagSinglePayload => "getEnumTagSinglePayload",
            ValueWitnessKind::StoreEnumTagSinglePayload => "storeEnumTagSinglePayload",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code)
    }

    pub fn from_raw(raw: u64) -> Option<Self> {
        usize::try_from(raw)
            .ok()
            .and_then(|raw| Self::ALL.get(raw))
            .copied()
    }
}

/// How far a type metadata record has been initialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MetadataState {
    Complete = 0x00,
    NonTransitiveComplete = 0x01,
    LayoutComplete = 0x3F,
    Abstract = 0xFF,
}

impl MetadataState {
    /// Whether `self` is at least as initialized as `other`.
    pub fn is_at_least(self, other: MetadataState) -> bool {
        (self as u8) <= (other as u8)
    }
}

#[cfg(test)]
mod tests;
