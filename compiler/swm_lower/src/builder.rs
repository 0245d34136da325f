//! Lowering-engine types from demangled trees.
//!
//! [`TypeBuilder`] walks a [`Node`] produced by the demangler and builds
//! the [`AType`] it spells. Builtins are resolved through the shared
//! [`BuiltinTable`]; nominal types and protocols are resolved through the
//! metadata reader, which supplies their runtime identity.
//!
//! Function symbols are built into a [`FunctionSymbol`] whose type is
//! already uncurried: methods take `self` as their last parameter.

use swm_demangle::mangling::{BUILTIN_TYPE_NAME_SILTOKEN, STDLIB_NAME};
use swm_demangle::stack::ensure_sufficient_stack;
use swm_demangle::{demangle_symbol, demangle_type, Node, NodeKind};

use crate::error::{malformed, not_implemented, Result};
use crate::metadata::MetadataReader;
use crate::types::{
    AType, BoundGenericType, BuiltinTable, DependentMemberType, ExistentialType,
    FunctionExtInfo, FunctionParam, FunctionType, GenericParam, GenericSignature,
    MetatypeRepresentation, MetatypeType, NominalDecl, NominalKind, NominalType,
    ParameterConvention, ProtocolDecl, ReferenceOwnership, Requirement, ResultConvention,
    SilFunctionType, SilFunctionTypeRepresentation, SilParameterInfo, SilResultInfo,
};

/// A function declaration recovered from its symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSymbol {
    pub name: String,
    /// The type `self` is bound to, for methods. A metatype for static
    /// methods.
    pub self_type: Option<AType>,
    /// Thin for free functions; methods carry `self` last.
    pub function: FunctionType,
}

/// Builds [`AType`]s from demangled type trees.
pub struct TypeBuilder<'r> {
    reader: &'r dyn MetadataReader,
    builtins: &'static BuiltinTable,
}

impl<'r> TypeBuilder<'r> {
    pub fn new(reader: &'r dyn MetadataReader, builtins: &'static BuiltinTable) -> Self {
        TypeBuilder { reader, builtins }
    }

    /// Demangles and builds a type mangling such as `Si` or `Bi64_`.
    pub fn build_mangled_type(&self, mangled: &str) -> Result<AType> {
        let node = demangle_type(mangled)?;
        self.build_type(&node)
    }

    /// Demangles and builds a function symbol such as `$s4main3fooyyF`.
    pub fn build_mangled_function(&self, symbol: &str) -> Result<FunctionSymbol> {
        let node = demangle_symbol(symbol)?;
        self.build_function_symbol(&node)
    }

    /// The type spelled by `node`, with or without its `Type` wrapper.
    pub fn build_type(&self, node: &Node) -> Result<AType> {
        ensure_sufficient_stack(|| self.build(node.unwrap_type()))
    }

    fn build(&self, node: &Node) -> Result<AType> {
        match node.kind {
            NodeKind::Type => self.build_type(child(node, 0)?),
            NodeKind::BuiltinTypeName if node.text() == BUILTIN_TYPE_NAME_SILTOKEN => {
                Ok(AType::SilToken)
            }
            NodeKind::BuiltinTypeName => self
                .builtins
                .lookup(node.text())
                .map(AType::Builtin)
                .ok_or_else(|| not_implemented!("builtin type {}", node.text())),
            NodeKind::Tuple => self.build_tuple(node),
            NodeKind::Structure | NodeKind::Class | NodeKind::Enum => self.build_nominal(node),
            NodeKind::Protocol => {
                let protocol = self.build_protocol(node)?;
                self.existential(vec![protocol], None, false)
            }
            NodeKind::ProtocolList => {
                self.existential(self.build_protocol_list(node)?, None, false)
            }
            NodeKind::ProtocolListWithClass => {
                let protocols = self.build_protocol_list(child(node, 0)?)?;
                let superclass = self.build_type(child(node, 1)?)?;
                self.existential(protocols, Some(superclass), false)
            }
            NodeKind::ProtocolListWithAnyObject => {
                let protocols = self.build_protocol_list(child(node, 0)?)?;
                self.existential(protocols, None, true)
            }
            NodeKind::BoundGenericStructure
            | NodeKind::BoundGenericClass
            | NodeKind::BoundGenericEnum => self.build_bound_generic(node),
            NodeKind::SugaredOptional => self.sugar(node, NominalKind::Enum, "Optional"),
            NodeKind::SugaredArray => self.sugar(node, NominalKind::Struct, "Array"),
            NodeKind::SugaredDictionary => self.sugar(node, NominalKind::Struct, "Dictionary"),
            NodeKind::SugaredParen => self.build_type(child(node, 0)?),
            NodeKind::FunctionType
            | NodeKind::NoEscapeFunctionType
            | NodeKind::ThinFunctionType
            | NodeKind::AutoClosureType
            | NodeKind::EscapingAutoClosureType
            | NodeKind::UncurriedFunctionType
            | NodeKind::ObjCBlock
            | NodeKind::CFunctionPointer => {
                Ok(AType::Function(Box::new(self.build_function(node, None)?)))
            }
            NodeKind::DependentGenericType => {
                let signature = self.build_generic_signature(child(node, 0)?)?;
                let inner = child(node, 1)?.unwrap_type();
                match inner.kind {
                    NodeKind::FunctionType
                    | NodeKind::NoEscapeFunctionType
                    | NodeKind::ThinFunctionType
                    | NodeKind::UncurriedFunctionType => Ok(AType::Function(Box::new(
                        self.build_function(inner, Some(signature))?,
                    ))),
                    kind => Err(not_implemented!("generic {kind} types")),
                }
            }
            NodeKind::ImplFunctionType => {
                Ok(AType::SilFunction(Box::new(self.build_impl_function(node)?)))
            }
            NodeKind::Metatype => Ok(AType::Metatype(self.build_metatype(node)?)),
            NodeKind::ExistentialMetatype => {
                Ok(AType::ExistentialMetatype(self.build_metatype(node)?))
            }
            NodeKind::Weak => self.reference_storage(node, ReferenceOwnership::Weak),
            NodeKind::Unowned => self.reference_storage(node, ReferenceOwnership::Unowned),
            NodeKind::Unmanaged => self.reference_storage(node, ReferenceOwnership::Unmanaged),
            NodeKind::InOut => Ok(AType::InOut(Box::new(self.build_type(child(node, 0)?)?))),
            NodeKind::Owned | NodeKind::Shared => self.build_type(child(node, 0)?),
            NodeKind::DynamicSelf => {
                Ok(AType::DynamicSelf(Box::new(self.build_type(child(node, 0)?)?)))
            }
            NodeKind::SILBoxType => Ok(AType::SilBox(vec![self.build_type(child(node, 0)?)?])),
            NodeKind::DependentGenericParamType => Ok(AType::GenericParam(generic_param(node)?)),
            NodeKind::DependentMemberType => {
                let base = self.build_type(child(node, 0)?)?;
                let assoc = child(node, 1)?;
                if assoc.kind != NodeKind::DependentAssociatedTypeRef {
                    return Err(malformed!("{} in a dependent member type", assoc.kind));
                }
                Ok(AType::DependentMember(DependentMemberType {
                    base: Box::new(base),
                    name: child(assoc, 0)?.text().to_owned(),
                }))
            }
            NodeKind::ErrorType => Err(malformed!("error type")),
            kind => Err(not_implemented!("{kind} types")),
        }
    }

    // ── Nominal types ───────────────────────────────────────────────

    fn build_nominal(&self, node: &Node) -> Result<AType> {
        let decl = nominal_decl(node)?;
        let metadata = self.reader.nominal(&decl)?;
        Ok(AType::Nominal(NominalType {
            decl,
            metadata: metadata.id,
            case_count: metadata.case_count,
        }))
    }

    fn build_bound_generic(&self, node: &Node) -> Result<AType> {
        let decl = nominal_decl(child(node, 0)?.unwrap_type())?;
        let list = child(node, 1)?;
        if list.kind != NodeKind::TypeList {
            return Err(malformed!("{} as generic arguments", list.kind));
        }
        let args = list
            .children
            .iter()
            .map(|arg| self.build_type(arg))
            .collect::<Result<Vec<_>>>()?;
        Ok(AType::BoundGeneric(BoundGenericType { decl, args }))
    }

    fn sugar(&self, node: &Node, kind: NominalKind, name: &str) -> Result<AType> {
        let args = node
            .children
            .iter()
            .map(|arg| self.build_type(arg))
            .collect::<Result<Vec<_>>>()?;
        Ok(AType::BoundGeneric(BoundGenericType {
            decl: NominalDecl::new(kind, STDLIB_NAME, name),
            args,
        }))
    }

    fn build_protocol(&self, node: &Node) -> Result<ProtocolDecl> {
        let node = node.unwrap_type();
        if node.kind != NodeKind::Protocol {
            return Err(malformed!("{} where a protocol was expected", node.kind));
        }
        let (module, name) = qualified_name(node)?;
        self.reader.protocol(&module, &name)
    }

    fn build_protocol_list(&self, node: &Node) -> Result<Vec<ProtocolDecl>> {
        let list = child(node, 0)?;
        list.children
            .iter()
            .map(|protocol| self.build_protocol(protocol))
            .collect()
    }

    fn existential(
        &self,
        protocols: Vec<ProtocolDecl>,
        superclass: Option<AType>,
        has_explicit_any_object: bool,
    ) -> Result<AType> {
        let metadata = self
            .reader
            .existential(&protocols, superclass.as_ref(), has_explicit_any_object)?;
        Ok(AType::Existential(ExistentialType {
            metadata,
            protocols,
            superclass: superclass.map(Box::new),
            has_explicit_any_object,
        }))
    }

    // ── Structural types ────────────────────────────────────────────

    fn build_tuple(&self, node: &Node) -> Result<AType> {
        let mut elements = Vec::with_capacity(node.num_children());
        for element in &node.children {
            elements.push(self.build_tuple_element(element)?.ty);
        }
        Ok(AType::Tuple(elements))
    }

    fn build_tuple_element(&self, element: &Node) -> Result<FunctionParam> {
        if element.kind != NodeKind::TupleElement {
            return Err(malformed!("{} inside a tuple", element.kind));
        }
        let mut label = None;
        let mut ty = None;
        for part in &element.children {
            match part.kind {
                NodeKind::TupleElementName => label = Some(part.text().to_owned()),
                NodeKind::VariadicMarker => return Err(not_implemented!("variadic tuple elements")),
                NodeKind::Type => ty = Some(part),
                kind => return Err(malformed!("{kind} inside a tuple element")),
            }
        }
        let ty = ty.ok_or_else(|| malformed!("tuple element without a type"))?;
        let mut param = self.build_param(ty)?;
        param.label = label;
        Ok(param)
    }

    /// A parameter type; `inout` moves from the type to the parameter.
    fn build_param(&self, node: &Node) -> Result<FunctionParam> {
        Ok(match self.build_type(node)? {
            AType::InOut(inner) => FunctionParam {
                is_inout: true,
                ..FunctionParam::new(*inner)
            },
            ty => FunctionParam::new(ty),
        })
    }

    fn build_metatype(&self, node: &Node) -> Result<MetatypeType> {
        let (representation, instance) = match node.children.as_slice() {
            [instance] => (None, instance),
            [representation, instance] => {
                let text = representation.text();
                let representation = MetatypeRepresentation::from_attribute(text)
                    .ok_or_else(|| malformed!("metatype representation {text}"))?;
                (Some(representation), instance)
            }
            _ => return Err(malformed!("metatype with {} children", node.num_children())),
        };
        Ok(MetatypeType {
            instance: Box::new(self.build_type(instance)?),
            representation,
        })
    }

    fn reference_storage(&self, node: &Node, ownership: ReferenceOwnership) -> Result<AType> {
        let referent = self.build_type(child(node, 0)?)?;
        Ok(AType::ReferenceStorage(ownership, Box::new(referent)))
    }

    // ── Function types ──────────────────────────────────────────────

    fn build_function(
        &self,
        node: &Node,
        generic_signature: Option<GenericSignature>,
    ) -> Result<FunctionType> {
        let (representation, is_noescape) = match node.kind {
            NodeKind::NoEscapeFunctionType | NodeKind::AutoClosureType => {
                (SilFunctionTypeRepresentation::Thick, true)
            }
            NodeKind::ThinFunctionType | NodeKind::UncurriedFunctionType => {
                (SilFunctionTypeRepresentation::Thin, false)
            }
            NodeKind::ObjCBlock => (SilFunctionTypeRepresentation::Block, false),
            NodeKind::CFunctionPointer => (SilFunctionTypeRepresentation::CFunctionPointer, false),
            _ => (SilFunctionTypeRepresentation::Thick, false),
        };
        let mut ext = FunctionExtInfo {
            representation,
            is_noescape,
            throws: false,
        };
        let mut params = None;
        let mut result = None;
        for part in &node.children {
            match part.kind {
                NodeKind::ThrowsAnnotation => ext.throws = true,
                NodeKind::ArgumentTuple => params = Some(self.build_arguments(part)?),
                NodeKind::ReturnType => result = Some(self.build_type(child(part, 0)?)?),
                kind => return Err(not_implemented!("{kind} in function types")),
            }
        }
        Ok(FunctionType {
            params: params.ok_or_else(|| malformed!("function type without arguments"))?,
            result: result.ok_or_else(|| malformed!("function type without a result"))?,
            ext,
            generic_signature,
        })
    }

    /// A lone parameter is spelled as its type; several as a tuple. The
    /// optional index payload disambiguates a single tuple parameter.
    fn build_arguments(&self, node: &Node) -> Result<Vec<FunctionParam>> {
        let arguments = child(node, 0)?;
        let inner = arguments.unwrap_type();
        if inner.kind == NodeKind::Tuple && node.index() != Some(1) {
            return inner
                .children
                .iter()
                .map(|element| self.build_tuple_element(element))
                .collect();
        }
        Ok(vec![self.build_param(arguments)?])
    }

    fn build_impl_function(&self, node: &Node) -> Result<SilFunctionType> {
        let mut function = SilFunctionType {
            is_noescape: true,
            ..SilFunctionType::default()
        };
        for part in &node.children {
            match part.kind {
                NodeKind::ImplEscaping => function.is_noescape = false,
                NodeKind::ImplConvention => {
                    let attribute = part.text();
                    if let Some(representation) =
                        SilFunctionTypeRepresentation::from_attribute(attribute)
                    {
                        function.representation = representation;
                    } else {
                        function.callee_convention = ParameterConvention::from_attribute(attribute)
                            .ok_or_else(|| malformed!("callee convention {attribute}"))?;
                    }
                }
                NodeKind::ImplFunctionAttribute => {
                    let attribute = part.text();
                    function.representation =
                        SilFunctionTypeRepresentation::from_attribute(attribute)
                            .ok_or_else(|| not_implemented!("function attribute {attribute}"))?;
                }
                NodeKind::DependentGenericSignature => {
                    function.generic_signature = Some(self.build_generic_signature(part)?);
                }
                NodeKind::DependentPseudogenericSignature => {
                    function.generic_signature = Some(self.build_generic_signature(part)?);
                    function.is_pseudogeneric = true;
                }
                NodeKind::ImplParameter => {
                    let (convention, ty) = self.impl_slot(part)?;
                    let convention = ParameterConvention::from_attribute(convention)
                        .ok_or_else(|| not_implemented!("parameter convention {convention}"))?;
                    function.params.push(SilParameterInfo::new(ty, convention));
                }
                NodeKind::ImplResult | NodeKind::ImplErrorResult => {
                    let (convention, ty) = self.impl_slot(part)?;
                    let convention = ResultConvention::from_attribute(convention)
                        .ok_or_else(|| malformed!("result convention {convention}"))?;
                    let result = SilResultInfo::new(ty, convention);
                    if part.kind == NodeKind::ImplErrorResult {
                        function.error_result = Some(result);
                    } else {
                        function.results.push(result);
                    }
                }
                kind => return Err(not_implemented!("{kind} in SIL function types")),
            }
        }
        if function.representation != SilFunctionTypeRepresentation::Thick {
            function.is_noescape = false;
        }
        Ok(function)
    }

    fn impl_slot<'n>(&self, node: &'n Node) -> Result<(&'n str, AType)> {
        let convention = child(node, 0)?;
        if convention.kind != NodeKind::ImplConvention {
            return Err(malformed!("{} where a convention was expected", convention.kind));
        }
        Ok((convention.text(), self.build_type(child(node, 1)?)?))
    }

    // ── Generic signatures ──────────────────────────────────────────

    fn build_generic_signature(&self, node: &Node) -> Result<GenericSignature> {
        let mut signature = GenericSignature::default();
        let mut depth = 0;
        for part in &node.children {
            match part.kind {
                NodeKind::DependentGenericParamCount => {
                    let count = part
                        .index()
                        .ok_or_else(|| malformed!("generic parameter count without an index"))?;
                    for index in 0..count {
                        signature
                            .params
                            .push(GenericParam::new(depth, narrow(index)?));
                    }
                    depth += 1;
                }
                NodeKind::DependentGenericConformanceRequirement => {
                    let subject = self.build_type(child(part, 0)?)?;
                    let constraint = child(part, 1)?;
                    let is_protocol = constraint.unwrap_type().kind == NodeKind::Protocol;
                    signature.requirements.push(if is_protocol {
                        Requirement::Conformance {
                            subject,
                            protocol: self.build_protocol(constraint)?,
                        }
                    } else {
                        Requirement::Superclass {
                            subject,
                            superclass: self.build_type(constraint)?,
                        }
                    });
                }
                NodeKind::DependentGenericSameTypeRequirement => {
                    signature.requirements.push(Requirement::SameType {
                        subject: self.build_type(child(part, 0)?)?,
                        other: self.build_type(child(part, 1)?)?,
                    });
                }
                NodeKind::DependentGenericLayoutRequirement => {
                    signature.requirements.push(Requirement::Layout {
                        subject: self.build_type(child(part, 0)?)?,
                        constraint: child(part, 1)?.text().to_owned(),
                    });
                }
                kind => return Err(malformed!("{kind} in a generic signature")),
            }
        }
        Ok(signature)
    }

    // ── Symbols ─────────────────────────────────────────────────────

    /// Builds the declaration named by a demangled function symbol.
    pub fn build_function_symbol(&self, node: &Node) -> Result<FunctionSymbol> {
        let mut entity = node;
        if entity.kind == NodeKind::Global {
            entity = child(entity, 0)?;
        }
        let is_static = entity.kind == NodeKind::Static;
        if is_static {
            entity = child(entity, 0)?;
        }
        if entity.kind != NodeKind::Function {
            return Err(not_implemented!("{} symbols", entity.kind));
        }

        let (context, name, labels, ty) = match entity.children.as_slice() {
            [context, name, ty] => (context, name, None, ty),
            [context, name, labels, ty] if labels.kind == NodeKind::LabelList => {
                (context, name, Some(labels), ty)
            }
            _ => return Err(malformed!("function with {} children", entity.num_children())),
        };

        let AType::Function(function) = self.build_type(ty)? else {
            return Err(malformed!("function {} without a function type", name.text()));
        };
        let mut function = *function;
        if let Some(labels) = labels {
            for (param, label) in function.params.iter_mut().zip(&labels.children) {
                if label.kind == NodeKind::Identifier {
                    param.label = Some(label.text().to_owned());
                }
            }
        }

        let self_type = match context.kind {
            NodeKind::Module => None,
            NodeKind::Structure | NodeKind::Class | NodeKind::Enum => {
                let instance = self.build_nominal(context)?;
                Some(if is_static {
                    AType::Metatype(MetatypeType {
                        instance: Box::new(instance),
                        representation: None,
                    })
                } else {
                    instance
                })
            }
            kind => return Err(not_implemented!("functions declared in {kind} contexts")),
        };
        function.ext.representation = match &self_type {
            Some(self_type) => {
                function.params.push(FunctionParam::new(self_type.clone()));
                SilFunctionTypeRepresentation::Method
            }
            None => SilFunctionTypeRepresentation::Thin,
        };

        tracing::debug!(name = name.text(), function = %function, "built function symbol");
        Ok(FunctionSymbol {
            name: name.text().to_owned(),
            self_type,
            function,
        })
    }
}

fn child(node: &Node, index: usize) -> Result<&Node> {
    node.child(index)
        .ok_or_else(|| malformed!("{} has no child {index}", node.kind))
}

fn narrow(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| malformed!("index {value} out of range"))
}

fn generic_param(node: &Node) -> Result<GenericParam> {
    let depth = child(node, 0)?.index().ok_or_else(|| malformed!("generic depth"))?;
    let index = child(node, 1)?.index().ok_or_else(|| malformed!("generic index"))?;
    Ok(GenericParam::new(narrow(depth)?, narrow(index)?))
}

fn nominal_decl(node: &Node) -> Result<NominalDecl> {
    let kind = match node.kind {
        NodeKind::Structure => NominalKind::Struct,
        NodeKind::Class => NominalKind::Class,
        NodeKind::Enum => NominalKind::Enum,
        kind => return Err(not_implemented!("{kind} nominal types")),
    };
    let (module, name) = qualified_name(node)?;
    Ok(NominalDecl::new(kind, module, name))
}

/// Module and dotted name of a declaration, such as `("main", "Outer.Inner")`.
fn qualified_name(node: &Node) -> Result<(String, String)> {
    let context = child(node, 0)?;
    let name = decl_name(child(node, 1)?)?;
    match context.kind {
        NodeKind::Module => Ok((context.text().to_owned(), name.to_owned())),
        NodeKind::Structure | NodeKind::Class | NodeKind::Enum | NodeKind::Protocol => {
            let (module, parent) = qualified_name(context)?;
            Ok((module, format!("{parent}.{name}")))
        }
        NodeKind::Extension => {
            let extended = child(context, 1)?.unwrap_type();
            let (module, parent) = qualified_name(extended)?;
            Ok((module, format!("{parent}.{name}")))
        }
        kind => Err(not_implemented!("declarations in {kind} contexts")),
    }
}

fn decl_name(node: &Node) -> Result<&str> {
    match node.kind {
        NodeKind::Identifier => Ok(node.text()),
        NodeKind::PrivateDeclName | NodeKind::LocalDeclName => {
            let last = node
                .children
                .last()
                .ok_or_else(|| malformed!("{} without a name", node.kind))?;
            Ok(last.text())
        }
        kind => Err(malformed!("{kind} as a declaration name")),
    }
}

#[cfg(test)]
mod tests;
