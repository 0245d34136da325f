//! Remangler: turns a demangled tree back into a mangled symbol.
//!
//! Remangling is the inverse of [`crate::demangler`]. Every subtree that the
//! demangler records as a substitution is recorded here in the same order,
//! so repeated subtrees come out as the same `A<letter>` references the
//! original symbol used. Trees that no demangler could produce (missing
//! children, unknown convention strings) abort via [`fatal`].
//!
//! # Layout
//!
//! - `types`: nominal and structural types, generic signatures, requirements.
//! - `entities`: functions, storage, conformances, specializations, globals.

mod entities;
mod types;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::config::DemangleOptions;
use crate::error::fatal;
use crate::mangling::{
    mangle_identifier, standard_type_substitution, translate_operator, SubstitutionMerging,
    SubstitutionWord, MANGLING_MODULE_CLANG_IMPORTER, MANGLING_MODULE_OBJC, STDLIB_NAME,
};
use crate::node::{Node, NodeKind, SymbolicReferenceKind};
use crate::stack::ensure_sufficient_stack;
use crate::substitution::SubstitutionEntry;
use crate::symbolic::RemangleResolver;

/// Mangles `node`, which must not contain symbolic references.
///
/// A `Global` node produces a full symbol with the `$s` prefix; any other
/// node produces the bare mangling of that subtree.
pub fn mangle(node: &Node) -> String {
    let mut remangler = Remangler::new(None);
    remangler.mangle(node);
    remangler.finish()
}

/// Mangles `node`, expanding symbolic references through `resolver`.
pub fn mangle_with_resolver(node: &Node, resolver: &mut dyn RemangleResolver) -> String {
    let mut remangler = Remangler::new(Some(resolver));
    remangler.mangle(node);
    remangler.finish()
}

/// How a node with a fixed operator suffix lays out its children.
#[derive(Clone, Copy, Debug)]
enum Layout {
    /// No children are mangled.
    Bare,
    /// Exactly one child, then the operator.
    Single,
    /// All children in order, then the operator.
    Children,
    /// All children last to first, then the operator.
    Reversed,
    /// Child 0 is a `Variable` or `Subscript` mangled as storage.
    Accessor,
}

/// Kinds whose mangling is a child layout followed by a constant operator.
fn suffix_operator(kind: NodeKind) -> Option<(Layout, &'static str)> {
    use Layout::{Accessor, Bare, Children, Reversed, Single};
    use NodeKind as K;

    let entry = match kind {
        K::DynamicAttribute => (Bare, "TD"),
        K::DirectMethodReferenceAttribute => (Bare, "Td"),
        K::ErrorType => (Bare, "Xe"),
        K::MergedFunction => (Bare, "Tm"),
        K::DynamicallyReplaceableFunctionImpl => (Bare, "TI"),
        K::DynamicallyReplaceableFunctionKey => (Bare, "Tx"),
        K::DynamicallyReplaceableFunctionVar => (Bare, "TX"),
        K::NonObjCAttribute => (Bare, "TO"),
        K::ObjCAttribute => (Bare, "To"),
        K::IsSerialized => (Bare, "q"),
        K::ThrowsAnnotation => (Bare, "K"),
        K::EmptyList => (Bare, "y"),
        K::FirstElementMarker => (Bare, "_"),
        K::VariadicMarker => (Bare, "d"),
        K::OpaqueReturnType => (Bare, "Qr"),
        K::ImplEscaping => (Bare, "e"),

        K::Type | K::DeclContext => (Single, ""),
        K::DynamicSelf => (Single, "XD"),
        K::EnumCase => (Single, "WC"),
        K::FullTypeMetadata => (Single, "Mf"),
        K::GenericProtocolWitnessTable => (Single, "WG"),
        K::GenericProtocolWitnessTableInstantiationFunction => (Single, "WI"),
        K::ResilientProtocolWitnessTable => (Single, "Wr"),
        K::GenericTypeMetadataPattern => (Single, "MP"),
        K::IVarInitializer => (Single, "fe"),
        K::IVarDestroyer => (Single, "fE"),
        K::InOut => (Single, "z"),
        K::Shared => (Single, "h"),
        K::Owned => (Single, "n"),
        K::ClassMetadataBaseOffset => (Single, "Mo"),
        K::NominalTypeDescriptor => (Single, "Mn"),
        K::OpaqueTypeDescriptor => (Single, "MQ"),
        K::OpaqueTypeDescriptorAccessor => (Single, "Mg"),
        K::OpaqueTypeDescriptorAccessorImpl => (Single, "Mh"),
        K::OpaqueTypeDescriptorAccessorKey => (Single, "Mj"),
        K::OpaqueTypeDescriptorAccessorVar => (Single, "Mk"),
        K::PropertyDescriptor => (Single, "MV"),
        K::ProtocolSelfConformanceWitness => (Single, "TS"),
        K::ProtocolWitnessTable => (Single, "WP"),
        K::ProtocolWitnessTablePattern => (Single, "Wp"),
        K::ProtocolWitnessTableAccessor => (Single, "Wa"),
        K::SILBoxType => (Single, "Xb"),
        K::Static => (Single, "Z"),
        K::TypeMetadata => (Single, "N"),
        K::TypeMetadataAccessFunction => (Single, "Ma"),
        K::TypeMetadataInstantiationCache => (Single, "MI"),
        K::TypeMetadataInstantiationFunction => (Single, "Mi"),
        K::TypeMetadataSingletonInitializationCache => (Single, "Ml"),
        K::TypeMetadataCompletionFunction => (Single, "Mr"),
        K::ValueWitnessTable => (Single, "WV"),
        K::Weak => (Single, "Xw"),
        K::Unowned => (Single, "Xo"),
        K::Unmanaged => (Single, "Xu"),
        K::ReflectionMetadataBuiltinDescriptor => (Single, "MB"),
        K::ReflectionMetadataFieldDescriptor => (Single, "MF"),
        K::ReflectionMetadataAssocTypeDescriptor => (Single, "MA"),
        K::ReflectionMetadataSuperclassDescriptor => (Single, "MC"),
        K::CurryThunk => (Single, "Tc"),
        K::DispatchThunk => (Single, "Tj"),
        K::MethodDescriptor => (Single, "Tq"),
        K::MethodLookupFunction => (Single, "Mu"),
        K::ObjCMetadataUpdateFunction => (Single, "MU"),
        K::ObjCResilientClassStub => (Single, "Ms"),
        K::FullObjCResilientClassStub => (Single, "Mt"),

        K::Allocator => (Children, "fC"),
        K::Constructor => (Children, "fc"),
        K::Deallocator => (Children, "fD"),
        K::Destructor => (Children, "fd"),
        K::Initializer => (Children, "fi"),
        K::GenericTypeParamDecl => (Children, "fp"),
        K::AssociatedTypeDescriptor => (Children, "Tl"),
        K::AssociatedTypeMetadataAccessor => (Children, "Wt"),
        K::DefaultAssociatedTypeMetadataAccessor => (Children, "TM"),
        K::AssociatedTypeWitnessTableAccessor => (Children, "WT"),
        K::BaseWitnessTableAccessor => (Children, "Wb"),
        K::CoroutineContinuationPrototype => (Children, "TC"),
        K::LazyProtocolWitnessTableAccessor => (Children, "Wl"),
        K::LazyProtocolWitnessTableCacheVariable => (Children, "WL"),
        K::Metaclass => (Children, "Mm"),
        K::ProtocolWitness => (Children, "TW"),
        K::TypeMangling => (Children, "D"),
        K::TypeMetadataLazyCache => (Children, "ML"),
        K::VTableThunk => (Children, "TV"),
        K::OutlinedCopy => (Children, "WOy"),
        K::OutlinedConsume => (Children, "WOe"),
        K::OutlinedRetain => (Children, "WOr"),
        K::OutlinedRelease => (Children, "WOs"),
        K::OutlinedInitializeWithTake => (Children, "WOb"),
        K::OutlinedInitializeWithCopy => (Children, "WOc"),
        K::OutlinedAssignWithTake => (Children, "WOd"),
        K::OutlinedAssignWithCopy => (Children, "WOf"),
        K::OutlinedDestroy => (Children, "WOh"),

        K::TupleElement => (Reversed, ""),
        K::FunctionType | K::UncurriedFunctionType => (Reversed, "c"),
        K::ThinFunctionType => (Reversed, "Xf"),
        K::AutoClosureType => (Reversed, "XK"),
        K::EscapingAutoClosureType => (Reversed, "XA"),
        K::NoEscapeFunctionType => (Reversed, "XE"),
        K::CFunctionPointer => (Reversed, "XC"),
        K::ObjCBlock => (Reversed, "XB"),
        K::DependentGenericType => (Reversed, "u"),
        K::PartialApplyForwarder => (Reversed, "TA"),
        K::PartialApplyObjCForwarder => (Reversed, "Ta"),
        K::ReabstractionThunk => (Reversed, "Tr"),
        K::ReabstractionThunkHelper => (Reversed, "TR"),
        K::ReabstractionThunkHelperWithSelf => (Reversed, "Ty"),

        K::Getter => (Accessor, "g"),
        K::Setter => (Accessor, "s"),
        K::MaterializeForSet => (Accessor, "m"),
        K::GlobalGetter => (Accessor, "G"),
        K::WillSet => (Accessor, "w"),
        K::DidSet => (Accessor, "W"),
        K::ReadAccessor => (Accessor, "r"),
        K::ModifyAccessor => (Accessor, "M"),
        K::NativeOwningAddressor => (Accessor, "lo"),
        K::NativeOwningMutableAddressor => (Accessor, "ao"),
        K::NativePinningAddressor => (Accessor, "lp"),
        K::NativePinningMutableAddressor => (Accessor, "aP"),
        K::OwningAddressor => (Accessor, "lO"),
        K::OwningMutableAddressor => (Accessor, "aO"),
        K::UnsafeAddressor => (Accessor, "lu"),
        K::UnsafeMutableAddressor => (Accessor, "au"),
        _ => return None,
    };
    Some(entry)
}

pub(crate) struct Remangler<'r> {
    buffer: String,
    words: Vec<SubstitutionWord>,
    substitutions: Vec<SubstitutionEntry>,
    /// Entry hash to indices into `substitutions`.
    lookup: FxHashMap<u64, SmallVec<[usize; 2]>>,
    merging: SubstitutionMerging,
    max_words: usize,
    resolver: Option<&'r mut dyn RemangleResolver>,
}

impl<'r> Remangler<'r> {
    fn new(resolver: Option<&'r mut dyn RemangleResolver>) -> Self {
        Remangler {
            buffer: String::with_capacity(512),
            words: Vec::new(),
            substitutions: Vec::new(),
            lookup: FxHashMap::default(),
            merging: SubstitutionMerging::default(),
            max_words: DemangleOptions::default().max_words,
            resolver,
        }
    }

    fn finish(self) -> String {
        tracing::trace!(
            symbol = %self.buffer,
            substitutions = self.substitutions.len(),
            "remangled"
        );
        self.buffer
    }

    fn mangle(&mut self, node: &Node) {
        ensure_sufficient_stack(|| self.mangle_node(node));
    }

    fn mangle_node(&mut self, node: &Node) {
        if let Some((layout, op)) = suffix_operator(node.kind) {
            match layout {
                Layout::Bare => {}
                Layout::Single => self.mangle_single_child(node),
                Layout::Children => self.mangle_children(node),
                Layout::Reversed => self.mangle_children_reversed(node),
                Layout::Accessor => self.mangle_abstract_storage(child(node, 0), op),
            }
            if !matches!(layout, Layout::Accessor) {
                self.buffer.push_str(op);
            }
            return;
        }

        use NodeKind as K;
        match node.kind {
            K::Identifier | K::TupleElementName => self.mangle_identifier_node(node, false),
            K::InfixOperator => {
                self.mangle_identifier_node(node, true);
                self.buffer.push_str("oi");
            }
            K::PrefixOperator => {
                self.mangle_identifier_node(node, true);
                self.buffer.push_str("op");
            }
            K::PostfixOperator => {
                self.mangle_identifier_node(node, true);
                self.buffer.push_str("oP");
            }
            K::Module => self.mangle_module(node),
            K::Number => self.push_index(index_of(node)),
            K::Suffix => self.buffer.push_str(node.text()),
            K::LocalDeclName => {
                self.mangle(child(node, 1));
                self.buffer.push('L');
                self.mangle(child(node, 0));
            }
            K::PrivateDeclName => {
                self.mangle_children_reversed(node);
                self.buffer
                    .push_str(if node.num_children() == 1 { "Ll" } else { "LL" });
            }
            K::RelatedEntityDeclName => {
                self.mangle(child(node, 1));
                let kind = child(node, 0).text();
                if kind.chars().count() != 1 {
                    fatal("related entity kind must be a single character");
                }
                self.buffer.push('L');
                self.buffer.push_str(kind);
            }
            K::TypeSymbolicReference
            | K::ProtocolSymbolicReference
            | K::OpaqueTypeDescriptorSymbolicReference => self.mangle_symbolic_reference(node),

            K::Index
            | K::UnknownIndex
            | K::DependentGenericParamCount
            | K::FunctionSignatureSpecializationParamKind
            | K::FunctionSignatureSpecializationParamPayload
            | K::GenericSpecializationParam
            | K::ImplFunctionAttribute
            | K::ImplParameter
            | K::ImplResult
            | K::ImplErrorResult
            | K::SILBoxLayout
            | K::SILBoxMutableField
            | K::SILBoxImmutableField => {
                fatal(&format!("{} is mangled by its parent node", node.kind));
            }
            K::AssociatedType | K::VTableAttribute | K::AccessorFunctionReference => {
                fatal(&format!("{} cannot be remangled", node.kind));
            }

            _ => {
                if !self.mangle_type_node(node) {
                    self.mangle_entity_node(node);
                }
            }
        }
    }

    // ── Child traversal ─────────────────────────────────────────────

    fn mangle_children(&mut self, node: &Node) {
        for child in &node.children {
            self.mangle(child);
        }
    }

    fn mangle_children_reversed(&mut self, node: &Node) {
        for child in node.children.iter().rev() {
            self.mangle(child);
        }
    }

    fn mangle_single_child(&mut self, node: &Node) {
        self.mangle(single_child(node));
    }

    /// Emits `_` after the first list element only.
    fn list_separator(&mut self, is_first: &mut bool) {
        if *is_first {
            self.buffer.push('_');
            *is_first = false;
        }
    }

    /// Emits `y` for a list that had no elements.
    fn end_of_list(&mut self, is_first: bool) {
        if is_first {
            self.buffer.push('y');
        }
    }

    /// `_` for 0, else `<value - 1>_`.
    fn push_index(&mut self, value: u64) {
        if value != 0 {
            self.buffer.push_str(&(value - 1).to_string());
        }
        self.buffer.push('_');
    }

    // ── Substitutions ───────────────────────────────────────────────

    /// Emits a substitution for `node` if one applies.
    ///
    /// Returns `None` when a standard or back-reference substitution was
    /// written. Otherwise returns the entry the caller registers with
    /// [`Self::add_substitution`] after mangling the node in full.
    fn substitute(&mut self, node: &Node, as_identifier: bool) -> Option<SubstitutionEntry> {
        if self.mangle_standard_substitution(node) {
            return None;
        }
        let entry = SubstitutionEntry::new(node.clone(), as_identifier);
        let Some(idx) = self.find_substitution(&entry) else {
            return Some(entry);
        };
        if idx >= 26 {
            self.buffer.push('A');
            self.push_index((idx - 26) as u64);
            return None;
        }
        // Checked above.
        #[allow(clippy::cast_possible_truncation)]
        let letter = b'A' + idx as u8;
        if !self.merging.try_merge(letter, false, &mut self.buffer) {
            self.buffer.push('A');
            self.buffer.push(char::from(letter));
        }
        None
    }

    fn find_substitution(&self, entry: &SubstitutionEntry) -> Option<usize> {
        self.lookup
            .get(&entry.hash())?
            .iter()
            .copied()
            .find(|&idx| self.substitutions[idx] == *entry)
    }

    fn add_substitution(&mut self, entry: SubstitutionEntry) {
        debug_assert!(self.find_substitution(&entry).is_none());
        let idx = self.substitutions.len();
        self.lookup.entry(entry.hash()).or_default().push(idx);
        self.substitutions.push(entry);
    }

    /// `S<letter>` for a well-known standard library type.
    fn mangle_standard_substitution(&mut self, node: &Node) -> bool {
        if !matches!(
            node.kind,
            NodeKind::Structure | NodeKind::Enum | NodeKind::Protocol
        ) {
            return false;
        }
        let (Some(context), Some(name)) = (node.child(0), node.child(1)) else {
            return false;
        };
        if context.kind != NodeKind::Module
            || context.text() != STDLIB_NAME
            || name.kind != NodeKind::Identifier
        {
            return false;
        }
        let Some(letter) = standard_type_substitution(name.text()) else {
            return false;
        };
        if !self.merging.try_merge(letter, true, &mut self.buffer) {
            self.buffer.push('S');
            self.buffer.push(char::from(letter));
        }
        true
    }

    // ── Identifiers ─────────────────────────────────────────────────

    fn mangle_identifier_node(&mut self, node: &Node, is_operator: bool) {
        let Some(entry) = self.substitute(node, true) else {
            return;
        };
        if is_operator {
            let translated = translate_operator(node.text());
            mangle_identifier(&translated, &mut self.buffer, &mut self.words, self.max_words);
        } else {
            mangle_identifier(node.text(), &mut self.buffer, &mut self.words, self.max_words);
        }
        self.add_substitution(entry);
    }

    fn mangle_module(&mut self, node: &Node) {
        match node.text() {
            STDLIB_NAME => self.buffer.push('s'),
            MANGLING_MODULE_OBJC => self.buffer.push_str("So"),
            MANGLING_MODULE_CLANG_IMPORTER => self.buffer.push_str("SC"),
            _ => self.mangle_identifier_node(node, false),
        }
    }

    fn mangle_symbolic_reference(&mut self, node: &Node) {
        let reference = index_of(node);
        let Some(resolver) = self.resolver.as_deref_mut() else {
            fatal("cannot remangle a symbolic reference without a resolver");
        };
        let resolved = resolver.resolve(SymbolicReferenceKind::Context, reference);
        self.mangle(&resolved);
    }
}

// ── Tree access ─────────────────────────────────────────────────────

#[track_caller]
fn child(node: &Node, index: usize) -> &Node {
    node.child(index)
        .unwrap_or_else(|| fatal(&format!("{} has no child {index}", node.kind)))
}

#[track_caller]
fn single_child(node: &Node) -> &Node {
    if node.num_children() != 1 {
        fatal(&format!(
            "{} has {} children, expected one",
            node.kind,
            node.num_children()
        ));
    }
    &node.children[0]
}

/// Strips a `Type` wrapper if present.
fn skip_type(node: &Node) -> &Node {
    if node.kind == NodeKind::Type {
        single_child(node)
    } else {
        node
    }
}

/// Child of a node that must be a `Type`.
#[track_caller]
fn child_of_type(node: &Node) -> &Node {
    if node.kind != NodeKind::Type {
        fatal(&format!("expected Type, found {}", node.kind));
    }
    single_child(node)
}

#[track_caller]
fn index_of(node: &Node) -> u64 {
    node.index()
        .unwrap_or_else(|| fatal(&format!("{} has no index payload", node.kind)))
}

#[cfg(test)]
mod tests;
