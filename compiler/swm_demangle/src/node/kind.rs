//! The closed set of node kinds a demangled tree can contain.
//!
//! Kinds are declared once through `node_kinds!`, which derives the enum,
//! a stable ordinal (used by the remangler's substitution hash) and the
//! textual name printed by the tree dump.

macro_rules! node_kinds {
    ($($kind:ident),+ $(,)?) => {
        /// Kind tag of a [`Node`](super::Node).
        ///
        /// The declaration order is significant: [`NodeKind::ordinal`] is the
        /// position in this list.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
        #[repr(u16)]
        pub enum NodeKind {
            $($kind,)+
        }

        impl NodeKind {
            /// Every kind, in declaration order.
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$kind,)+];

            /// The kind's name as printed in tree dumps.
            pub fn name(self) -> &'static str {
                match self {
                    $(NodeKind::$kind => stringify!($kind),)+
                }
            }
        }
    };
}

node_kinds! {
    Allocator,
    AnonymousContext,
    AnyProtocolConformanceList,
    ArgumentTuple,
    AssociatedType,
    AssociatedTypeRef,
    AssociatedTypeMetadataAccessor,
    DefaultAssociatedTypeMetadataAccessor,
    AssociatedTypeWitnessTableAccessor,
    BaseWitnessTableAccessor,
    AutoClosureType,
    BoundGenericClass,
    BoundGenericEnum,
    BoundGenericStructure,
    BoundGenericProtocol,
    BoundGenericOtherNominalType,
    BoundGenericTypeAlias,
    BoundGenericFunction,
    BuiltinTypeName,
    CFunctionPointer,
    Class,
    ClassMetadataBaseOffset,
    ConcreteProtocolConformance,
    Constructor,
    CoroutineContinuationPrototype,
    Deallocator,
    DeclContext,
    DefaultArgumentInitializer,
    DependentAssociatedConformance,
    DependentAssociatedTypeRef,
    DependentGenericConformanceRequirement,
    DependentGenericParamCount,
    DependentGenericParamType,
    DependentGenericSameTypeRequirement,
    DependentGenericLayoutRequirement,
    DependentGenericSignature,
    DependentGenericType,
    DependentMemberType,
    DependentPseudogenericSignature,
    DependentProtocolConformanceRoot,
    DependentProtocolConformanceInherited,
    DependentProtocolConformanceAssociated,
    Destructor,
    DidSet,
    Directness,
    DynamicAttribute,
    DirectMethodReferenceAttribute,
    DynamicSelf,
    DynamicallyReplaceableFunctionImpl,
    DynamicallyReplaceableFunctionKey,
    DynamicallyReplaceableFunctionVar,
    Enum,
    EnumCase,
    ErrorType,
    EscapingAutoClosureType,
    NoEscapeFunctionType,
    ExistentialMetatype,
    ExplicitClosure,
    Extension,
    FieldOffset,
    FullTypeMetadata,
    Function,
    FunctionSignatureSpecialization,
    FunctionSignatureSpecializationParam,
    FunctionSignatureSpecializationReturn,
    FunctionSignatureSpecializationParamKind,
    FunctionSignatureSpecializationParamPayload,
    FunctionType,
    GenericPartialSpecialization,
    GenericPartialSpecializationNotReAbstracted,
    GenericProtocolWitnessTable,
    GenericProtocolWitnessTableInstantiationFunction,
    ResilientProtocolWitnessTable,
    GenericSpecialization,
    GenericSpecializationNotReAbstracted,
    GenericSpecializationParam,
    InlinedGenericFunction,
    GenericTypeMetadataPattern,
    Getter,
    Global,
    GlobalGetter,
    Identifier,
    Index,
    IVarInitializer,
    IVarDestroyer,
    ImplEscaping,
    ImplConvention,
    ImplFunctionAttribute,
    ImplFunctionType,
    ImplicitClosure,
    ImplParameter,
    ImplResult,
    ImplErrorResult,
    InOut,
    InfixOperator,
    Initializer,
    KeyPathGetterThunkHelper,
    KeyPathSetterThunkHelper,
    KeyPathEqualsThunkHelper,
    KeyPathHashThunkHelper,
    LazyProtocolWitnessTableAccessor,
    LazyProtocolWitnessTableCacheVariable,
    LocalDeclName,
    MaterializeForSet,
    MergedFunction,
    Metatype,
    MetatypeRepresentation,
    Metaclass,
    MethodLookupFunction,
    ObjCMetadataUpdateFunction,
    ObjCResilientClassStub,
    FullObjCResilientClassStub,
    ModifyAccessor,
    Module,
    NativeOwningAddressor,
    NativeOwningMutableAddressor,
    NativePinningAddressor,
    NativePinningMutableAddressor,
    NominalTypeDescriptor,
    NonObjCAttribute,
    Number,
    ObjCAttribute,
    ObjCBlock,
    OtherNominalType,
    OwningAddressor,
    OwningMutableAddressor,
    PartialApplyForwarder,
    PartialApplyObjCForwarder,
    PostfixOperator,
    PrefixOperator,
    PrivateDeclName,
    PropertyDescriptor,
    ProtocolSymbolicReference,
    ProtocolConformance,
    ProtocolConformanceRefInTypeModule,
    ProtocolConformanceRefInProtocolModule,
    ProtocolConformanceRefInOtherModule,
    ProtocolDescriptor,
    ProtocolConformanceDescriptor,
    ProtocolList,
    ProtocolListWithClass,
    ProtocolListWithAnyObject,
    ProtocolSelfConformanceDescriptor,
    ProtocolSelfConformanceWitness,
    ProtocolSelfConformanceWitnessTable,
    ProtocolWitness,
    ProtocolWitnessTable,
    ProtocolWitnessTableAccessor,
    ProtocolWitnessTablePattern,
    Protocol,
    ReabstractionThunk,
    ReabstractionThunkHelper,
    ReabstractionThunkHelperWithSelf,
    ReadAccessor,
    RelatedEntityDeclName,
    RetroactiveConformance,
    ReturnType,
    Shared,
    Owned,
    SILBoxType,
    SILBoxTypeWithLayout,
    SILBoxLayout,
    SILBoxMutableField,
    SILBoxImmutableField,
    Setter,
    SpecializationPassID,
    IsSerialized,
    Static,
    Structure,
    Subscript,
    Suffix,
    ThinFunctionType,
    Tuple,
    TupleElement,
    TupleElementName,
    Type,
    TypeSymbolicReference,
    TypeAlias,
    TypeList,
    TypeMangling,
    TypeMetadata,
    TypeMetadataAccessFunction,
    TypeMetadataCompletionFunction,
    TypeMetadataInstantiationCache,
    TypeMetadataInstantiationFunction,
    TypeMetadataSingletonInitializationCache,
    TypeMetadataLazyCache,
    UncurriedFunctionType,
    UnknownIndex,
    Weak,
    Unowned,
    Unmanaged,
    UnsafeAddressor,
    UnsafeMutableAddressor,
    ValueWitness,
    ValueWitnessTable,
    Variable,
    VTableThunk,
    VTableAttribute,
    WillSet,
    ReflectionMetadataBuiltinDescriptor,
    ReflectionMetadataFieldDescriptor,
    ReflectionMetadataAssocTypeDescriptor,
    ReflectionMetadataSuperclassDescriptor,
    GenericTypeParamDecl,
    CurryThunk,
    DispatchThunk,
    MethodDescriptor,
    ProtocolRequirementsBaseDescriptor,
    AssociatedConformanceDescriptor,
    DefaultAssociatedConformanceAccessor,
    BaseConformanceDescriptor,
    AssociatedTypeDescriptor,
    ThrowsAnnotation,
    EmptyList,
    FirstElementMarker,
    VariadicMarker,
    OutlinedBridgedMethod,
    OutlinedCopy,
    OutlinedConsume,
    OutlinedRetain,
    OutlinedRelease,
    OutlinedInitializeWithTake,
    OutlinedInitializeWithCopy,
    OutlinedAssignWithTake,
    OutlinedAssignWithCopy,
    OutlinedDestroy,
    OutlinedVariable,
    AssocTypePath,
    LabelList,
    ModuleDescriptor,
    ExtensionDescriptor,
    AnonymousDescriptor,
    AssociatedTypeGenericParamRef,
    SugaredOptional,
    SugaredArray,
    SugaredDictionary,
    SugaredParen,
    AccessorFunctionReference,
    OpaqueType,
    OpaqueTypeDescriptorSymbolicReference,
    OpaqueTypeDescriptor,
    OpaqueTypeDescriptorAccessor,
    OpaqueTypeDescriptorAccessorImpl,
    OpaqueTypeDescriptorAccessorKey,
    OpaqueTypeDescriptorAccessorVar,
    OpaqueReturnType,
    OpaqueReturnTypeOf,
}

impl NodeKind {
    /// Position of this kind in the declaration list.
    #[inline]
    pub fn ordinal(self) -> u16 {
        self as u16
    }

    /// Kinds that name a declaration.
    pub fn is_decl_name(self) -> bool {
        matches!(
            self,
            NodeKind::Identifier
                | NodeKind::LocalDeclName
                | NodeKind::PrivateDeclName
                | NodeKind::RelatedEntityDeclName
                | NodeKind::PrefixOperator
                | NodeKind::PostfixOperator
                | NodeKind::InfixOperator
                | NodeKind::TypeSymbolicReference
                | NodeKind::ProtocolSymbolicReference
        )
    }

    /// Kinds that can carry generic arguments as a nominal type.
    pub fn is_any_generic(self) -> bool {
        matches!(
            self,
            NodeKind::Structure
                | NodeKind::Class
                | NodeKind::Enum
                | NodeKind::Protocol
                | NodeKind::ProtocolSymbolicReference
                | NodeKind::OtherNominalType
                | NodeKind::TypeAlias
                | NodeKind::TypeSymbolicReference
        )
    }

    pub fn is_entity(self) -> bool {
        // Also accepts some kinds which are not entities.
        self == NodeKind::Type || self.is_context()
    }

    pub fn is_requirement(self) -> bool {
        matches!(
            self,
            NodeKind::DependentGenericSameTypeRequirement
                | NodeKind::DependentGenericLayoutRequirement
                | NodeKind::DependentGenericConformanceRequirement
        )
    }

    /// Kinds that can appear as the parent context of another entity.
    pub fn is_context(self) -> bool {
        matches!(
            self,
            NodeKind::Allocator
                | NodeKind::AnonymousContext
                | NodeKind::Class
                | NodeKind::Constructor
                | NodeKind::Deallocator
                | NodeKind::DefaultArgumentInitializer
                | NodeKind::Destructor
                | NodeKind::DidSet
                | NodeKind::Enum
                | NodeKind::ExplicitClosure
                | NodeKind::Extension
                | NodeKind::Function
                | NodeKind::Getter
                | NodeKind::GlobalGetter
                | NodeKind::IVarInitializer
                | NodeKind::IVarDestroyer
                | NodeKind::ImplicitClosure
                | NodeKind::Initializer
                | NodeKind::MaterializeForSet
                | NodeKind::ModifyAccessor
                | NodeKind::Module
                | NodeKind::NativeOwningAddressor
                | NodeKind::NativeOwningMutableAddressor
                | NodeKind::NativePinningAddressor
                | NodeKind::NativePinningMutableAddressor
                | NodeKind::OtherNominalType
                | NodeKind::OwningAddressor
                | NodeKind::OwningMutableAddressor
                | NodeKind::Protocol
                | NodeKind::ProtocolSymbolicReference
                | NodeKind::ReadAccessor
                | NodeKind::Setter
                | NodeKind::Static
                | NodeKind::Structure
                | NodeKind::Subscript
                | NodeKind::TypeSymbolicReference
                | NodeKind::TypeAlias
                | NodeKind::UnsafeAddressor
                | NodeKind::UnsafeMutableAddressor
                | NodeKind::Variable
                | NodeKind::WillSet
                | NodeKind::OpaqueReturnTypeOf
        )
    }

    /// Kinds the demangler hoists to the top of a `Global` node.
    pub fn is_function_attr(self) -> bool {
        matches!(
            self,
            NodeKind::FunctionSignatureSpecialization
                | NodeKind::GenericSpecialization
                | NodeKind::InlinedGenericFunction
                | NodeKind::GenericSpecializationNotReAbstracted
                | NodeKind::GenericPartialSpecialization
                | NodeKind::GenericPartialSpecializationNotReAbstracted
                | NodeKind::ObjCAttribute
                | NodeKind::NonObjCAttribute
                | NodeKind::DynamicAttribute
                | NodeKind::DirectMethodReferenceAttribute
                | NodeKind::VTableAttribute
                | NodeKind::PartialApplyForwarder
                | NodeKind::PartialApplyObjCForwarder
                | NodeKind::OutlinedVariable
                | NodeKind::OutlinedBridgedMethod
                | NodeKind::MergedFunction
                | NodeKind::DynamicallyReplaceableFunctionImpl
                | NodeKind::DynamicallyReplaceableFunctionKey
                | NodeKind::DynamicallyReplaceableFunctionVar
        )
    }

    /// Kinds whose generic arguments are applied through `BoundGeneric*`.
    pub fn is_bound_generic(self) -> bool {
        matches!(
            self,
            NodeKind::BoundGenericClass
                | NodeKind::BoundGenericEnum
                | NodeKind::BoundGenericStructure
                | NodeKind::BoundGenericProtocol
                | NodeKind::BoundGenericOtherNominalType
                | NodeKind::BoundGenericTypeAlias
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
