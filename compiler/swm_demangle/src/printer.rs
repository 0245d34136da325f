//! Node printer: renders a demangled tree as readable text.
//!
//! The output follows the platform demangling tools, so
//! `$s4main3add1a1bS2i_SitF` prints as
//! `main.add(a: Swift.Int, b: Swift.Int) -> Swift.Int`. [`PrintOptions`]
//! selects how much detail appears.
//!
//! A tree missing a child the printer needs is reported as
//! [`DemangleError::Unexpected`](crate::DemangleError::Unexpected); no
//! partial text is returned.
//!
//! # Layout
//!
//! - `entities`: declarations with a context, a name and a type, plus the
//!   specialization prefixes hoisted onto them.
//! - `types`: sugar, function types, generic signatures, metatypes.

mod entities;
mod types;

use crate::config::PrintOptions;
use crate::demangler::demangle_symbol;
use crate::error::{unexpected, Result};
use crate::mangling::generic_parameter_name;
use crate::node::{Directness, Node, NodeKind, ValueWitnessKind};
use crate::stack::ensure_sufficient_stack;

use entities::{EntityStyle, TypePrinting};

/// Modules the debugger synthesizes for evaluated expressions.
const DEBUGGER_MODULE_PREFIX: &str = "__lldb_expr_";

/// Renders `node` as text.
pub fn print_node(node: &Node, options: PrintOptions) -> Result<String> {
    let mut printer = NodePrinter::new(options);
    printer.print(node, false);
    if printer.valid {
        Ok(printer.out)
    } else {
        tracing::debug!(kind = %node.kind, "cannot print malformed tree");
        Err(unexpected!("malformed {} tree", node.kind))
    }
}

impl Node {
    /// Renders the tree as text; see [`print_node`].
    pub fn to_text(&self, options: PrintOptions) -> Result<String> {
        print_node(self, options)
    }
}

/// How a node with a fixed description lays out its children.
#[derive(Clone, Copy, Debug)]
enum Described {
    /// Only the description.
    Bare,
    /// The description, then child 0.
    First,
    /// The description, then every child.
    All,
}

/// Kinds printed as constant text followed by some of their children.
fn description(kind: NodeKind) -> Option<(Described, &'static str)> {
    use Described::{All, Bare, First};
    use NodeKind as K;

    let entry = match kind {
        K::NonObjCAttribute => (Bare, "@nonobjc "),
        K::ObjCAttribute => (Bare, "@objc "),
        K::DirectMethodReferenceAttribute => (Bare, "super "),
        K::DynamicAttribute => (Bare, "dynamic "),
        K::VTableAttribute => (Bare, "override "),
        K::IsSerialized => (Bare, "serialized"),
        K::DynamicSelf => (Bare, "Self"),
        K::ErrorType => (Bare, "<ERROR TYPE>"),
        K::UnknownIndex => (Bare, "unknown index"),
        K::ImplEscaping => (Bare, "@escaping"),
        K::ThrowsAnnotation => (Bare, " throws "),
        K::EmptyList => (Bare, " empty-list "),
        K::FirstElementMarker => (Bare, " first-element-marker "),
        K::VariadicMarker => (Bare, " variadic-marker "),
        K::OpaqueReturnType => (Bare, "some"),
        K::LabelList | K::AssociatedType => (Bare, ""),

        K::Type | K::DeclContext => (First, ""),
        K::Static => (First, "static "),
        K::CurryThunk => (First, "curry thunk of "),
        K::DispatchThunk => (First, "dispatch thunk of "),
        K::MethodDescriptor => (First, "method descriptor for "),
        K::MethodLookupFunction => (First, "method lookup function for "),
        K::ObjCMetadataUpdateFunction => (First, "ObjC metadata update function for "),
        K::ObjCResilientClassStub => (First, "ObjC resilient class stub for "),
        K::FullObjCResilientClassStub => (First, "full ObjC resilient class stub for "),
        K::OutlinedRetain => (First, "outlined retain of "),
        K::OutlinedRelease => (First, "outlined release of "),
        K::OutlinedInitializeWithTake => (First, "outlined init with take of "),
        K::OutlinedInitializeWithCopy => (First, "outlined init with copy of "),
        K::OutlinedAssignWithTake => (First, "outlined assign with take of "),
        K::OutlinedAssignWithCopy => (First, "outlined assign with copy of "),
        K::OutlinedDestroy => (First, "outlined destroy of "),
        K::InOut => (First, "inout "),
        K::Shared => (First, "__shared "),
        K::Owned => (First, "__owned "),
        K::SILBoxType => (First, "@box "),
        K::EnumCase => (First, "enum case for "),
        K::ProtocolSelfConformanceWitnessTable => {
            (First, "protocol self-conformance witness table for ")
        }
        K::ProtocolSelfConformanceWitness => (First, "protocol self-conformance witness for "),
        K::ProtocolWitnessTableAccessor => (First, "protocol witness table accessor for "),
        K::ProtocolWitnessTable => (First, "protocol witness table for "),
        K::ProtocolWitnessTablePattern => (First, "protocol witness table pattern for "),
        K::GenericProtocolWitnessTable => (First, "generic protocol witness table for "),
        K::GenericProtocolWitnessTableInstantiationFunction => (
            First,
            "instantiation function for generic protocol witness table for ",
        ),
        K::ResilientProtocolWitnessTable => (First, "resilient protocol witness table for "),
        K::GenericTypeMetadataPattern => (First, "generic type metadata pattern for "),
        K::Metaclass => (First, "metaclass for "),
        K::ProtocolSelfConformanceDescriptor => {
            (First, "protocol self-conformance descriptor for ")
        }
        K::ProtocolConformanceDescriptor => (First, "protocol conformance descriptor for "),
        K::ProtocolDescriptor => (First, "protocol descriptor for "),
        K::ProtocolRequirementsBaseDescriptor => {
            (First, "protocol requirements base descriptor for ")
        }
        K::FullTypeMetadata => (First, "full type metadata for "),
        K::TypeMetadata => (First, "type metadata for "),
        K::TypeMetadataAccessFunction => (First, "type metadata accessor for "),
        K::TypeMetadataInstantiationCache => (First, "type metadata instantiation cache for "),
        K::TypeMetadataInstantiationFunction => {
            (First, "type metadata instantiation function for ")
        }
        K::TypeMetadataSingletonInitializationCache => {
            (First, "type metadata singleton initialization cache for ")
        }
        K::TypeMetadataCompletionFunction => (First, "type metadata completion function for "),
        K::TypeMetadataLazyCache => (First, "lazy cache variable for type metadata for "),
        K::AssociatedTypeDescriptor => (First, "associated type descriptor for "),
        K::DefaultAssociatedTypeMetadataAccessor => {
            (First, "default associated type metadata accessor for ")
        }
        K::ClassMetadataBaseOffset => (First, "class metadata base offset for "),
        K::PropertyDescriptor => (First, "property descriptor for "),
        K::NominalTypeDescriptor => (First, "nominal type descriptor for "),
        K::OpaqueTypeDescriptor => (First, "opaque type descriptor for "),
        K::OpaqueTypeDescriptorAccessor => (First, "opaque type descriptor accessor for "),
        K::OpaqueTypeDescriptorAccessorImpl => {
            (First, "opaque type descriptor accessor impl for ")
        }
        K::OpaqueTypeDescriptorAccessorKey => (First, "opaque type descriptor accessor key for "),
        K::OpaqueTypeDescriptorAccessorVar => (First, "opaque type descriptor accessor var for "),
        K::CoroutineContinuationPrototype => (First, "coroutine continuation prototype for "),
        K::ValueWitnessTable => (First, "value witness table for "),
        K::ReflectionMetadataBuiltinDescriptor => {
            (First, "reflection metadata builtin descriptor ")
        }
        K::ReflectionMetadataFieldDescriptor => (First, "reflection metadata field descriptor "),
        K::ReflectionMetadataAssocTypeDescriptor => {
            (First, "reflection metadata associated type descriptor ")
        }
        K::ReflectionMetadataSuperclassDescriptor => {
            (First, "reflection metadata superclass descriptor ")
        }
        K::ModuleDescriptor => (First, "module descriptor "),
        K::AnonymousDescriptor => (First, "anonymous descriptor "),
        K::ExtensionDescriptor => (First, "extension descriptor "),

        K::Global | K::TypeList | K::AnyProtocolConformanceList => (All, ""),
        K::Weak => (All, "weak "),
        K::Unowned => (All, "unowned "),
        K::Unmanaged => (All, "unowned(unsafe) "),
        K::AssociatedTypeGenericParamRef => {
            (All, "generic parameter reference for associated type ")
        }
        K::DependentAssociatedConformance => (All, "dependent associated conformance "),
        K::ProtocolConformanceRefInTypeModule => {
            (All, "protocol conformance ref (type's module) ")
        }
        K::ProtocolConformanceRefInProtocolModule => {
            (All, "protocol conformance ref (protocol's module) ")
        }
        K::ProtocolConformanceRefInOtherModule => (All, "protocol conformance ref (retroactive) "),
        _ => return None,
    };
    Some(entry)
}

pub(crate) struct NodePrinter {
    out: String,
    options: PrintOptions,
    /// Set once `specialized ` has been written for a collapsed prefix.
    specialization_prefix_printed: bool,
    valid: bool,
}

impl NodePrinter {
    fn new(options: PrintOptions) -> Self {
        NodePrinter {
            out: String::new(),
            options,
            specialization_prefix_printed: false,
            valid: true,
        }
    }

    fn has(&self, option: PrintOptions) -> bool {
        self.options.contains(option)
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn push_number(&mut self, number: u64) {
        self.out.push_str(&number.to_string());
    }

    fn invalid(&mut self) {
        self.valid = false;
    }

    /// Child `index` of `node`; marks the tree malformed when it is missing.
    fn child<'n>(&mut self, node: &'n Node, index: usize) -> Option<&'n Node> {
        let child = node.child(index);
        if child.is_none() {
            self.invalid();
        }
        child
    }

    fn index_of(&mut self, node: &Node, index: usize) -> Option<u64> {
        let value = self.child(node, index)?.index();
        if value.is_none() {
            self.invalid();
        }
        value
    }

    fn print_child(&mut self, node: &Node, index: usize) {
        if let Some(child) = self.child(node, index) {
            self.print(child, false);
        }
    }

    fn print_children(&mut self, node: &Node, separator: &str) {
        for (i, child) in node.children.iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            self.print(child, false);
        }
    }

    fn qualifies_extensions(&self) -> bool {
        self.has(PrintOptions::QUALIFY_ENTITIES | PrintOptions::DISPLAY_EXTENSION_CONTEXTS)
    }

    /// Whether an entity's `context` is printed as a qualifier.
    fn prints_context(&self, context: &Node) -> bool {
        if !self.has(PrintOptions::QUALIFY_ENTITIES) {
            return false;
        }
        if context.kind == NodeKind::Module && context.text().starts_with(DEBUGGER_MODULE_PREFIX) {
            return self.has(PrintOptions::DISPLAY_DEBUGGER_GENERATED_MODULE);
        }
        true
    }

    /// Prints `node`. When it is an entity printed as a prefix context that
    /// cannot be written in prefix form, returns it so the caller can print
    /// it as ` in <context>` instead.
    pub(crate) fn print<'n>(
        &mut self,
        node: &'n Node,
        as_prefix_context: bool,
    ) -> Option<&'n Node> {
        ensure_sufficient_stack(|| self.print_kind(node, as_prefix_context))
    }

    fn print_kind<'n>(&mut self, node: &'n Node, as_prefix_context: bool) -> Option<&'n Node> {
        use NodeKind as K;

        match node.kind {
            K::Identifier
            | K::BuiltinTypeName
            | K::MetatypeRepresentation
            | K::ImplConvention
            | K::ImplFunctionAttribute => self.push(node.text()),
            K::Module => {
                if self.has(PrintOptions::DISPLAY_MODULE_NAMES) {
                    self.push(node.text());
                }
            }
            K::Index | K::Number | K::SpecializationPassID => match node.index() {
                Some(index) => self.push_number(index),
                None => self.invalid(),
            },
            K::TupleElementName => {
                self.push(node.text());
                self.push(": ");
            }
            K::InfixOperator | K::PrefixOperator | K::PostfixOperator => {
                self.push(node.text());
                self.push(match node.kind {
                    K::InfixOperator => " infix",
                    K::PrefixOperator => " prefix",
                    _ => " postfix",
                });
            }
            K::Suffix => {
                if self.has(PrintOptions::DISPLAY_UNMANGLED_SUFFIX) {
                    self.push(" with unmangled suffix ");
                    self.push_quoted(node.text());
                }
            }

            // ── Entities ──
            K::Class
            | K::Structure
            | K::Enum
            | K::Protocol
            | K::TypeAlias
            | K::OtherNominalType
            | K::GenericTypeParamDecl => {
                return self.print_entity(
                    node,
                    as_prefix_context,
                    EntityStyle::named(TypePrinting::NoType),
                );
            }
            K::Variable => {
                return self.print_entity(
                    node,
                    as_prefix_context,
                    EntityStyle::named(TypePrinting::WithColon),
                );
            }
            K::Function | K::BoundGenericFunction => {
                return self.print_entity(
                    node,
                    as_prefix_context,
                    EntityStyle::named(TypePrinting::FunctionStyle),
                );
            }
            K::Subscript => {
                let style = EntityStyle {
                    overwrite_name: "subscript",
                    ..EntityStyle::unnamed(TypePrinting::FunctionStyle, "")
                };
                return self.print_entity(node, as_prefix_context, style);
            }
            K::ExplicitClosure | K::ImplicitClosure => {
                let index = self.index_of(node, 1)?;
                let type_printing = if self.has(PrintOptions::SHOW_FUNCTION_ARGUMENT_TYPES) {
                    TypePrinting::FunctionStyle
                } else {
                    TypePrinting::NoType
                };
                let name = if node.kind == K::ExplicitClosure {
                    "closure #"
                } else {
                    "implicit closure #"
                };
                let style = EntityStyle {
                    extra_index: Some(index + 1),
                    ..EntityStyle::unnamed(type_printing, name)
                };
                return self.print_entity(node, as_prefix_context, style);
            }
            K::Initializer => {
                let style = EntityStyle::unnamed(
                    TypePrinting::NoType,
                    "variable initialization expression",
                );
                return self.print_entity(node, as_prefix_context, style);
            }
            K::DefaultArgumentInitializer => {
                let index = self.index_of(node, 1)?;
                let style = EntityStyle {
                    extra_index: Some(index),
                    ..EntityStyle::unnamed(TypePrinting::NoType, "default argument ")
                };
                return self.print_entity(node, as_prefix_context, style);
            }
            K::Allocator | K::Deallocator => {
                let is_class = self.child(node, 0)?.kind == K::Class;
                let (type_printing, name) = match (node.kind, is_class) {
                    (K::Allocator, true) => (TypePrinting::FunctionStyle, "__allocating_init"),
                    (K::Allocator, false) => (TypePrinting::FunctionStyle, "init"),
                    (_, true) => (TypePrinting::NoType, "__deallocating_deinit"),
                    (_, false) => (TypePrinting::NoType, "deinit"),
                };
                return self.print_entity(
                    node,
                    as_prefix_context,
                    EntityStyle::unnamed(type_printing, name),
                );
            }
            K::Constructor => {
                let style = EntityStyle {
                    has_name: node.children.len() > 2,
                    ..EntityStyle::unnamed(TypePrinting::FunctionStyle, "init")
                };
                return self.print_entity(node, as_prefix_context, style);
            }
            K::Destructor | K::IVarInitializer | K::IVarDestroyer => {
                let name = match node.kind {
                    K::Destructor => "deinit",
                    K::IVarInitializer => "__ivar_initializer",
                    _ => "__ivar_destroyer",
                };
                return self.print_entity(
                    node,
                    as_prefix_context,
                    EntityStyle::unnamed(TypePrinting::NoType, name),
                );
            }
            K::Getter | K::GlobalGetter => {
                return self.print_abstract_storage(node, as_prefix_context, "getter");
            }
            K::Setter => return self.print_abstract_storage(node, as_prefix_context, "setter"),
            K::MaterializeForSet => {
                return self.print_abstract_storage(node, as_prefix_context, "materializeForSet");
            }
            K::WillSet => return self.print_abstract_storage(node, as_prefix_context, "willset"),
            K::DidSet => return self.print_abstract_storage(node, as_prefix_context, "didset"),
            K::ReadAccessor => return self.print_abstract_storage(node, as_prefix_context, "read"),
            K::ModifyAccessor => {
                return self.print_abstract_storage(node, as_prefix_context, "modify");
            }
            K::OwningAddressor => {
                return self.print_abstract_storage(node, as_prefix_context, "owningAddressor");
            }
            K::OwningMutableAddressor => {
                return self.print_abstract_storage(
                    node,
                    as_prefix_context,
                    "owningMutableAddressor",
                );
            }
            K::NativeOwningAddressor => {
                return self.print_abstract_storage(
                    node,
                    as_prefix_context,
                    "nativeOwningAddressor",
                );
            }
            K::NativeOwningMutableAddressor => {
                return self.print_abstract_storage(
                    node,
                    as_prefix_context,
                    "nativeOwningMutableAddressor",
                );
            }
            K::NativePinningAddressor => {
                return self.print_abstract_storage(
                    node,
                    as_prefix_context,
                    "nativePinningAddressor",
                );
            }
            K::NativePinningMutableAddressor => {
                return self.print_abstract_storage(
                    node,
                    as_prefix_context,
                    "nativePinningMutableAddressor",
                );
            }
            K::UnsafeAddressor => {
                return self.print_abstract_storage(node, as_prefix_context, "unsafeAddressor");
            }
            K::UnsafeMutableAddressor => {
                return self.print_abstract_storage(
                    node,
                    as_prefix_context,
                    "unsafeMutableAddressor",
                );
            }
            K::Extension => {
                if !(2..=3).contains(&node.children.len()) {
                    self.invalid();
                    return None;
                }
                if self.qualifies_extensions() {
                    self.push("(extension in ");
                    self.print(&node.children[0], true);
                    self.push("):");
                }
                self.print(&node.children[1], false);
                if let Some(signature) = node.child(2) {
                    self.print(signature, false);
                }
            }
            K::AnonymousContext => {
                if self.qualifies_extensions() {
                    self.print_child(node, 1);
                    self.push(".(unknown context at ");
                    self.print_child(node, 0);
                    self.push(")");
                    let arguments = node.child(2).filter(|args| !args.children.is_empty());
                    if let Some(arguments) = arguments {
                        self.push("<");
                        self.print(arguments, false);
                        self.push(">");
                    }
                }
            }
            K::LocalDeclName => {
                self.print_child(node, 1);
                self.push(" #");
                let index = self.index_of(node, 0)?;
                self.push_number(index + 1);
            }
            K::PrivateDeclName => {
                let discriminators = self.has(PrintOptions::SHOW_PRIVATE_DISCRIMINATORS);
                let discriminator = self.child(node, 0)?.text();
                if let Some(name) = node.child(1) {
                    if discriminators {
                        self.push("(");
                    }
                    self.print(name, false);
                    if discriminators {
                        self.push(" in ");
                        self.push(discriminator);
                        self.push(")");
                    }
                } else if discriminators {
                    self.push("(in ");
                    self.push(discriminator);
                    self.push(")");
                }
            }
            K::RelatedEntityDeclName => {
                self.push("related decl '");
                let related = self.child(node, 0)?.text();
                self.push(related);
                self.push("' for ");
                self.print_child(node, 1);
            }

            // ── Types ──
            K::TypeMangling => {
                let first = self.child(node, 0)?;
                if first.kind == K::LabelList {
                    let function = self.child(node, 1)?.first_child();
                    match function {
                        Some(function) => self.print_function_type(Some(first), function),
                        None => self.invalid(),
                    }
                } else {
                    self.print(first, false);
                }
            }
            K::Tuple => {
                self.push("(");
                self.print_children(node, ", ");
                self.push(")");
            }
            K::TupleElement => {
                if let Some(label) = find_child(node, K::TupleElementName) {
                    self.push(label.text());
                    self.push(": ");
                }
                let Some(ty) = find_child(node, K::Type) else {
                    self.invalid();
                    return None;
                };
                self.print(ty, false);
                if find_child(node, K::VariadicMarker).is_some() {
                    self.push("...");
                }
            }
            K::ReturnType => {
                self.push(" -> ");
                if node.children.is_empty() {
                    self.push(node.text());
                } else {
                    self.print_children(node, "");
                }
            }
            K::ArgumentTuple => {
                let show_types = self.has(PrintOptions::SHOW_FUNCTION_ARGUMENT_TYPES);
                self.print_function_parameters(None, node, show_types);
            }
            K::FunctionType | K::UncurriedFunctionType | K::NoEscapeFunctionType => {
                self.print_function_type(None, node);
            }
            K::AutoClosureType | K::EscapingAutoClosureType => {
                self.push("@autoclosure ");
                self.print_function_type(None, node);
            }
            K::ThinFunctionType => {
                self.push("@convention(thin) ");
                self.print_function_type(None, node);
            }
            K::CFunctionPointer => {
                self.push("@convention(c) ");
                self.print_function_type(None, node);
            }
            K::ObjCBlock => {
                self.push("@convention(block) ");
                self.print_function_type(None, node);
            }
            K::ImplFunctionType => self.print_impl_function_type(node),
            K::ImplErrorResult => {
                self.push("@error ");
                self.print_children(node, " ");
            }
            K::ImplParameter | K::ImplResult => self.print_children(node, " "),
            K::BoundGenericClass
            | K::BoundGenericStructure
            | K::BoundGenericEnum
            | K::BoundGenericProtocol
            | K::BoundGenericOtherNominalType
            | K::BoundGenericTypeAlias => self.print_bound_generic(node),
            K::SugaredOptional => {
                self.print_child_with_parens(node, 0);
                self.push("?");
            }
            K::SugaredArray => {
                self.push("[");
                self.print_child(node, 0);
                self.push("]");
            }
            K::SugaredDictionary => {
                self.push("[");
                self.print_child(node, 0);
                self.push(" : ");
                self.print_child(node, 1);
                self.push("]");
            }
            K::SugaredParen => {
                self.push("(");
                self.print_child(node, 0);
                self.push(")");
            }
            K::Metatype => self.print_metatype(node),
            K::ExistentialMetatype => {
                let mut idx = 0;
                if node.children.len() == 2 {
                    self.print_child(node, 0);
                    self.push(" ");
                    idx = 1;
                }
                self.print_child(node, idx);
                self.push(".Type");
            }
            K::ProtocolList | K::ProtocolListWithClass | K::ProtocolListWithAnyObject => {
                self.print_protocol_list(node);
            }
            K::AssociatedTypeRef => {
                self.print_child(node, 0);
                self.push(".");
                let name = self.child(node, 1)?.text();
                self.push(name);
            }
            K::DependentGenericSignature | K::DependentPseudogenericSignature => {
                self.print_generic_signature(node);
            }
            K::DependentGenericConformanceRequirement => {
                self.print_child(node, 0);
                self.push(": ");
                self.print_child(node, 1);
            }
            K::DependentGenericSameTypeRequirement => {
                self.print_child(node, 0);
                self.push(" == ");
                self.print_child(node, 1);
            }
            K::DependentGenericLayoutRequirement => self.print_layout_requirement(node),
            K::DependentGenericParamType => {
                let depth = self.index_of(node, 0)?;
                let index = self.index_of(node, 1)?;
                self.push(&generic_parameter_name(depth, index));
            }
            K::DependentGenericType => {
                self.print_child(node, 0);
                let dependent = self.child(node, 1)?;
                if types::needs_space_before_type(dependent) {
                    self.push(" ");
                }
                self.print(dependent, false);
            }
            K::DependentMemberType | K::OpaqueType => {
                self.print_child(node, 0);
                self.push(".");
                self.print_child(node, 1);
            }
            K::DependentAssociatedTypeRef => {
                let name = self.child(node, 0)?.text();
                self.push(name);
            }
            K::AssocTypePath => self.print_children(node, "."),
            K::SILBoxTypeWithLayout => self.print_sil_box_with_layout(node),
            K::SILBoxLayout => {
                self.push("{");
                for (i, field) in node.children.iter().enumerate() {
                    if i > 0 {
                        self.push(",");
                    }
                    self.push(" ");
                    self.print(field, false);
                }
                self.push(" }");
            }
            K::SILBoxMutableField | K::SILBoxImmutableField => {
                self.push(if node.kind == K::SILBoxImmutableField {
                    "let "
                } else {
                    "var "
                });
                self.print_child(node, 0);
            }
            K::OpaqueReturnTypeOf => {
                self.push("<<opaque return type of ");
                self.print_children(node, "");
                self.push(">>");
            }
            K::TypeSymbolicReference
            | K::ProtocolSymbolicReference
            | K::OpaqueTypeDescriptorSymbolicReference => {
                self.push(match node.kind {
                    K::TypeSymbolicReference => "type symbolic reference 0x",
                    K::ProtocolSymbolicReference => "protocol symbolic reference 0x",
                    _ => "opaque type symbolic reference 0x",
                });
                let address = node.index().unwrap_or(0);
                self.push(&format!("{address:X}"));
            }
            K::AccessorFunctionReference => {
                self.push("accessor function at ");
                self.push_number(node.index().unwrap_or(0));
            }

            // ── Attributes and specializations ──
            K::FunctionSignatureSpecialization => {
                self.print_specialization_prefix(node, "function signature specialization", "");
            }
            K::GenericSpecialization => {
                self.print_specialization_prefix(node, "generic specialization", "");
            }
            K::GenericSpecializationNotReAbstracted => self.print_specialization_prefix(
                node,
                "generic not re-abstracted specialization",
                "",
            ),
            K::GenericPartialSpecialization => self.print_specialization_prefix(
                node,
                "generic partial specialization",
                "Signature = ",
            ),
            K::GenericPartialSpecializationNotReAbstracted => self.print_specialization_prefix(
                node,
                "generic not-reabstracted partial specialization",
                "Signature = ",
            ),
            K::InlinedGenericFunction => {
                self.print_specialization_prefix(node, "inlined generic function", "");
            }
            K::GenericSpecializationParam => {
                self.print_child(node, 0);
                for (i, conformance) in node.children.iter().enumerate().skip(1) {
                    self.push(if i == 1 { " with " } else { " and " });
                    self.print(conformance, false);
                }
            }
            K::FunctionSignatureSpecializationParamKind => match node.index() {
                Some(raw) => self.print_param_kind(raw),
                None => self.invalid(),
            },
            K::FunctionSignatureSpecializationParamPayload => self.print_symbol_text(node.text()),
            K::FunctionSignatureSpecializationParam
            | K::FunctionSignatureSpecializationReturn
            | K::DependentGenericParamCount => {
                // Only meaningful inside their parent's own printing.
                self.invalid();
            }
            K::MergedFunction => {
                if !self.has(PrintOptions::SHORTEN_THUNK) {
                    self.push("merged ");
                }
            }
            K::DynamicallyReplaceableFunctionKey
            | K::DynamicallyReplaceableFunctionImpl
            | K::DynamicallyReplaceableFunctionVar => {
                if !self.has(PrintOptions::SHORTEN_THUNK) {
                    self.push(match node.kind {
                        K::DynamicallyReplaceableFunctionKey => "dynamically replaceable key for ",
                        K::DynamicallyReplaceableFunctionImpl => {
                            "dynamically replaceable thunk for "
                        }
                        _ => "dynamically replaceable variable for ",
                    });
                }
            }
            K::OutlinedBridgedMethod => {
                self.push("outlined bridged method (");
                self.push(node.text());
                self.push(") of ");
            }
            K::OutlinedVariable => {
                self.push("outlined variable #");
                self.push_number(node.index().unwrap_or(0));
                self.push(" of ");
            }

            // ── Thunks, witnesses and runtime records ──
            K::OutlinedCopy | K::OutlinedConsume => {
                self.push(if node.kind == K::OutlinedCopy {
                    "outlined copy of "
                } else {
                    "outlined consume of "
                });
                self.print_child(node, 0);
                if let Some(extra) = node.child(1) {
                    self.print(extra, false);
                }
            }
            K::PartialApplyForwarder | K::PartialApplyObjCForwarder => {
                self.push(match (self.has(PrintOptions::SHORTEN_PARTIAL_APPLY), node.kind) {
                    (true, _) => "partial apply",
                    (false, K::PartialApplyForwarder) => "partial apply forwarder",
                    (false, _) => "partial apply ObjC forwarder",
                });
                if let Some(target) = node.first_child() {
                    self.push(" for ");
                    self.print(target, false);
                }
            }
            K::ReabstractionThunk | K::ReabstractionThunkHelper => {
                if self.has(PrintOptions::SHORTEN_THUNK) {
                    self.push("thunk for ");
                    match node.children.last() {
                        Some(last) => {
                            self.print(last, false);
                        }
                        None => self.invalid(),
                    }
                    return None;
                }
                self.push("reabstraction thunk ");
                if node.kind == K::ReabstractionThunkHelper {
                    self.push("helper ");
                }
                let mut idx = 0;
                if node.children.len() == 3 {
                    self.print_child(node, 0);
                    self.push(" ");
                    idx = 1;
                }
                self.push("from ");
                self.print_child(node, idx + 1);
                self.push(" to ");
                self.print_child(node, idx);
            }
            K::ReabstractionThunkHelperWithSelf => {
                self.push("reabstraction thunk ");
                let mut idx = 0;
                if node.children.len() == 4 {
                    self.print_child(node, 0);
                    self.push(" ");
                    idx = 1;
                }
                self.push("from ");
                self.print_child(node, idx + 2);
                self.push(" to ");
                self.print_child(node, idx + 1);
                self.push(" self ");
                self.print_child(node, idx);
            }
            K::KeyPathGetterThunkHelper | K::KeyPathSetterThunkHelper => {
                self.push(if node.kind == K::KeyPathGetterThunkHelper {
                    "key path getter for "
                } else {
                    "key path setter for "
                });
                self.print_child(node, 0);
                self.push(" : ");
                for child in node.children.iter().skip(1) {
                    if child.kind == K::IsSerialized {
                        self.push(", ");
                    }
                    self.print(child, false);
                }
            }
            K::KeyPathEqualsThunkHelper | K::KeyPathHashThunkHelper => {
                self.print_key_path_index_operator(node);
            }
            K::VTableThunk => {
                self.push("vtable thunk for ");
                self.print_child(node, 1);
                self.push(" dispatching to ");
                self.print_child(node, 0);
            }
            K::ProtocolWitness => {
                self.push("protocol witness for ");
                self.print_child(node, 1);
                self.push(" in conformance ");
                self.print_child(node, 0);
            }
            K::LazyProtocolWitnessTableAccessor | K::LazyProtocolWitnessTableCacheVariable => {
                self.push(if node.kind == K::LazyProtocolWitnessTableAccessor {
                    "lazy protocol witness table accessor for type "
                } else {
                    "lazy protocol witness table cache variable for type "
                });
                self.print_child(node, 0);
                self.push(" and conformance ");
                self.print_child(node, 1);
            }
            K::AssociatedConformanceDescriptor | K::DefaultAssociatedConformanceAccessor => {
                self.push(if node.kind == K::AssociatedConformanceDescriptor {
                    "associated conformance descriptor for "
                } else {
                    "default associated conformance accessor for "
                });
                self.print_child(node, 0);
                self.push(".");
                self.print_child(node, 1);
                self.push(": ");
                self.print_child(node, 2);
            }
            K::AssociatedTypeMetadataAccessor => {
                self.push("associated type metadata accessor for ");
                self.print_child(node, 1);
                self.push(" in ");
                self.print_child(node, 0);
            }
            K::BaseConformanceDescriptor => {
                self.push("base conformance descriptor for ");
                self.print_child(node, 0);
                self.push(": ");
                self.print_child(node, 1);
            }
            K::AssociatedTypeWitnessTableAccessor => {
                self.push("associated type witness table accessor for ");
                self.print_child(node, 1);
                self.push(" : ");
                self.print_child(node, 2);
                self.push(" in ");
                self.print_child(node, 0);
            }
            K::BaseWitnessTableAccessor => {
                self.push("base witness table accessor for ");
                self.print_child(node, 1);
                self.push(" in ");
                self.print_child(node, 0);
            }
            K::ValueWitness => {
                let raw = self.index_of(node, 0)?;
                let Some(witness) = ValueWitnessKind::from_raw(raw) else {
                    self.invalid();
                    return None;
                };
                self.push(witness.name());
                self.push(if self.has(PrintOptions::SHORTEN_VALUE_WITNESS) {
                    " for "
                } else {
                    " value witness for "
                });
                self.print_child(node, 1);
            }
            K::FieldOffset => {
                self.print_child(node, 0);
                self.push("field offset for ");
                self.print_child(node, 1);
            }
            K::Directness => match node.index() {
                Some(0) => self.push_directness(Directness::Direct),
                Some(1) => self.push_directness(Directness::Indirect),
                _ => self.invalid(),
            },
            K::ProtocolConformance => self.print_protocol_conformance(node),
            K::RetroactiveConformance => {
                if node.children.len() == 2 {
                    self.push("retroactive @ ");
                    self.print_child(node, 0);
                    self.print_child(node, 1);
                }
            }
            K::ConcreteProtocolConformance => {
                self.push("concrete protocol conformance ");
                if let Some(index) = node.index() {
                    self.push("#");
                    self.push_number(index);
                    self.push(" ");
                }
                self.print_children(node, "");
            }
            K::DependentProtocolConformanceRoot
            | K::DependentProtocolConformanceInherited
            | K::DependentProtocolConformanceAssociated => {
                self.push(match node.kind {
                    K::DependentProtocolConformanceRoot => "dependent root protocol conformance ",
                    K::DependentProtocolConformanceInherited => {
                        "dependent inherited protocol conformance "
                    }
                    _ => "dependent associated protocol conformance ",
                });
                if let Some(index) = node.child(2).and_then(Node::index) {
                    self.push("#");
                    self.push_number(index);
                    self.push(" ");
                }
                self.print_child(node, 0);
                self.print_child(node, 1);
            }
            _ => self.print_described(node),
        }
        None
    }

    fn print_described(&mut self, node: &Node) {
        let Some((layout, text)) = description(node.kind) else {
            self.invalid();
            return;
        };
        self.push(text);
        match layout {
            Described::Bare => {}
            Described::First => self.print_child(node, 0),
            Described::All => self.print_children(node, ""),
        }
    }

    fn push_directness(&mut self, directness: Directness) {
        self.push(directness.name());
        self.push(" ");
    }

    /// Writes `text` in double quotes with control characters escaped.
    fn push_quoted(&mut self, text: &str) {
        self.out.push('"');
        for c in text.chars() {
            match c {
                '\\' => self.push("\\\\"),
                '\t' => self.push("\\t"),
                '\n' => self.push("\\n"),
                '\r' => self.push("\\r"),
                '"' => self.push("\\\""),
                '\0' => self.push("\\0"),
                c if c.is_ascii_control() => {
                    self.out.push_str(&format!("\\x{:02X}", u32::from(c)));
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }

    /// Prints an embedded symbol demangled when it parses, verbatim otherwise.
    fn print_symbol_text(&mut self, text: &str) {
        let demangled = demangle_symbol(text).and_then(|tree| print_node(&tree, self.options));
        match demangled {
            Ok(demangled) => self.push(&demangled),
            Err(_) => self.push(text),
        }
    }

    fn print_protocol_conformance(&mut self, node: &Node) {
        if node.children.len() == 4 {
            self.push("property behavior storage of ");
            self.print_child(node, 2);
            self.push(" in ");
            self.print_child(node, 0);
            self.push(" : ");
            self.print_child(node, 1);
            return;
        }
        self.print_child(node, 0);
        if self.has(PrintOptions::DISPLAY_PROTOCOL_CONFORMANCES) {
            self.push(" : ");
            self.print_child(node, 1);
            self.push(" in ");
            self.print_child(node, 2);
        }
    }

    fn print_key_path_index_operator(&mut self, node: &Node) {
        self.push("key path index ");
        self.push(if node.kind == NodeKind::KeyPathEqualsThunkHelper {
            "equality"
        } else {
            "hash"
        });
        self.push(" operator for ");

        let mut count = node.children.len();
        if node.children.last().is_some_and(|last| last.kind == NodeKind::IsSerialized) {
            count -= 1;
        }
        if let Some(signature) = count
            .checked_sub(1)
            .and_then(|last| node.child(last))
            .filter(|last| last.kind == NodeKind::DependentGenericSignature)
        {
            self.print(signature, false);
            count -= 1;
        }
        self.push("(");
        for (i, child) in node.children[..count].iter().enumerate() {
            if i != 0 {
                self.push(", ");
            }
            self.print(child, false);
        }
        self.push(")");
    }
}

fn find_child(node: &Node, kind: NodeKind) -> Option<&Node> {
    node.children.iter().find(|child| child.kind == kind)
}

#[cfg(test)]
mod tests;
