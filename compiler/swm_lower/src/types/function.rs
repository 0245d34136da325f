//! Formal and lowered function types.

use std::fmt;

use super::{AType, GenericSignature, ProtocolConformanceRef};

/// Calling convention family of a function value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SilFunctionTypeRepresentation {
    /// Function pointer plus retained context.
    #[default]
    Thick,
    /// Bare function pointer.
    Thin,
    Method,
    WitnessMethod,
    Closure,
    Block,
    CFunctionPointer,
    ObjCMethod,
}

impl SilFunctionTypeRepresentation {
    /// Parses a `@convention(...)` attribute.
    pub fn from_attribute(text: &str) -> Option<Self> {
        let name = text.strip_prefix("@convention(")?.strip_suffix(')')?;
        match name {
            "thick" => Some(SilFunctionTypeRepresentation::Thick),
            "thin" => Some(SilFunctionTypeRepresentation::Thin),
            "method" => Some(SilFunctionTypeRepresentation::Method),
            "witness_method" => Some(SilFunctionTypeRepresentation::WitnessMethod),
            "closure" => Some(SilFunctionTypeRepresentation::Closure),
            "block" => Some(SilFunctionTypeRepresentation::Block),
            "c" => Some(SilFunctionTypeRepresentation::CFunctionPointer),
            "objc_method" => Some(SilFunctionTypeRepresentation::ObjCMethod),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SilFunctionTypeRepresentation::Thick => "thick",
            SilFunctionTypeRepresentation::Thin => "thin",
            SilFunctionTypeRepresentation::Method => "method",
            SilFunctionTypeRepresentation::WitnessMethod => "witness_method",
            SilFunctionTypeRepresentation::Closure => "closure",
            SilFunctionTypeRepresentation::Block => "block",
            SilFunctionTypeRepresentation::CFunctionPointer => "c",
            SilFunctionTypeRepresentation::ObjCMethod => "objc_method",
        }
    }

    /// Whether the last formal parameter is `self`.
    pub fn has_self_param(self) -> bool {
        matches!(
            self,
            SilFunctionTypeRepresentation::Method
                | SilFunctionTypeRepresentation::WitnessMethod
                | SilFunctionTypeRepresentation::ObjCMethod
        )
    }

    /// Whether functions of this representation use the native Swift
    /// calling convention.
    pub fn is_native(self) -> bool {
        !matches!(
            self,
            SilFunctionTypeRepresentation::Block
                | SilFunctionTypeRepresentation::CFunctionPointer
                | SilFunctionTypeRepresentation::ObjCMethod
        )
    }
}

/// How a parameter value is passed and who owns it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParameterConvention {
    /// By address; the callee takes ownership.
    IndirectIn,
    IndirectInConstant,
    /// By address; the caller keeps ownership.
    IndirectInGuaranteed,
    IndirectInout,
    IndirectInoutAliasable,
    DirectOwned,
    DirectUnowned,
    #[default]
    DirectGuaranteed,
}

impl ParameterConvention {
    pub fn from_attribute(text: &str) -> Option<Self> {
        match text {
            "@in" => Some(ParameterConvention::IndirectIn),
            "@in_constant" => Some(ParameterConvention::IndirectInConstant),
            "@in_guaranteed" => Some(ParameterConvention::IndirectInGuaranteed),
            "@inout" => Some(ParameterConvention::IndirectInout),
            "@inout_aliasable" => Some(ParameterConvention::IndirectInoutAliasable),
            "@owned" | "@callee_owned" => Some(ParameterConvention::DirectOwned),
            "@unowned" | "@callee_unowned" => Some(ParameterConvention::DirectUnowned),
            "@guaranteed" | "@callee_guaranteed" => Some(ParameterConvention::DirectGuaranteed),
            _ => None,
        }
    }

    pub fn attribute(self) -> &'static str {
        match self {
            ParameterConvention::IndirectIn => "@in",
            ParameterConvention::IndirectInConstant => "@in_constant",
            ParameterConvention::IndirectInGuaranteed => "@in_guaranteed",
            ParameterConvention::IndirectInout => "@inout",
            ParameterConvention::IndirectInoutAliasable => "@inout_aliasable",
            ParameterConvention::DirectOwned => "@owned",
            ParameterConvention::DirectUnowned => "@unowned",
            ParameterConvention::DirectGuaranteed => "@guaranteed",
        }
    }

    pub fn is_indirect(self) -> bool {
        matches!(
            self,
            ParameterConvention::IndirectIn
                | ParameterConvention::IndirectInConstant
                | ParameterConvention::IndirectInGuaranteed
                | ParameterConvention::IndirectInout
                | ParameterConvention::IndirectInoutAliasable
        )
    }

    pub fn is_inout(self) -> bool {
        matches!(
            self,
            ParameterConvention::IndirectInout | ParameterConvention::IndirectInoutAliasable
        )
    }
}

/// How a result value is returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultConvention {
    /// Into caller-provided memory.
    Indirect,
    Owned,
    Unowned,
    UnownedInnerPointer,
    Autoreleased,
}

impl ResultConvention {
    pub fn from_attribute(text: &str) -> Option<Self> {
        match text {
            "@out" => Some(ResultConvention::Indirect),
            "@owned" => Some(ResultConvention::Owned),
            "@unowned" => Some(ResultConvention::Unowned),
            "@unowned_inner_pointer" => Some(ResultConvention::UnownedInnerPointer),
            "@autoreleased" => Some(ResultConvention::Autoreleased),
            _ => None,
        }
    }

    pub fn attribute(self) -> &'static str {
        match self {
            ResultConvention::Indirect => "@out",
            ResultConvention::Owned => "@owned",
            ResultConvention::Unowned => "@unowned",
            ResultConvention::UnownedInnerPointer => "@unowned_inner_pointer",
            ResultConvention::Autoreleased => "@autoreleased",
        }
    }

    pub fn is_indirect(self) -> bool {
        self == ResultConvention::Indirect
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CoroutineKind {
    #[default]
    None,
    YieldOnce,
    YieldMany,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SilParameterInfo {
    pub ty: AType,
    pub convention: ParameterConvention,
}

impl SilParameterInfo {
    pub fn new(ty: AType, convention: ParameterConvention) -> Self {
        SilParameterInfo { ty, convention }
    }

    pub fn is_formal_indirect(&self) -> bool {
        self.convention.is_indirect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SilResultInfo {
    pub ty: AType,
    pub convention: ResultConvention,
}

impl SilResultInfo {
    pub fn new(ty: AType, convention: ResultConvention) -> Self {
        SilResultInfo { ty, convention }
    }

    pub fn is_formal_indirect(&self) -> bool {
        self.convention.is_indirect()
    }
}

/// A function type after SIL lowering: every parameter and result carries
/// an explicit convention.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SilFunctionType {
    pub representation: SilFunctionTypeRepresentation,
    /// Convention of the context for thick functions.
    pub callee_convention: ParameterConvention,
    pub is_pseudogeneric: bool,
    pub is_noescape: bool,
    pub coroutine_kind: CoroutineKind,
    pub params: Vec<SilParameterInfo>,
    pub yields: Vec<SilParameterInfo>,
    pub results: Vec<SilResultInfo>,
    pub error_result: Option<SilResultInfo>,
    pub generic_signature: Option<GenericSignature>,
    pub witness_method_conformance: Option<ProtocolConformanceRef>,
}

impl SilFunctionType {
    pub fn new(
        representation: SilFunctionTypeRepresentation,
        params: Vec<SilParameterInfo>,
        results: Vec<SilResultInfo>,
    ) -> Self {
        SilFunctionType {
            representation,
            params,
            results,
            ..SilFunctionType::default()
        }
    }

    pub fn has_self_param(&self) -> bool {
        self.representation.has_self_param()
    }

    /// The `self` parameter of a method: always the last one.
    pub fn self_parameter(&self) -> Option<&SilParameterInfo> {
        if self.has_self_param() {
            self.params.last()
        } else {
            None
        }
    }

    /// The type `Self` is bound to: the `self` parameter with any metatype
    /// stripped, as for static methods.
    pub fn self_instance_type(&self) -> Option<&AType> {
        let self_type = &self.self_parameter()?.ty;
        Some(match self_type {
            AType::Metatype(metatype) => &metatype.instance,
            other => other,
        })
    }

    /// Whether the function value carries a context.
    pub fn has_context(&self) -> bool {
        self.representation == SilFunctionTypeRepresentation::Thick
    }

    pub fn is_coroutine(&self) -> bool {
        self.coroutine_kind != CoroutineKind::None
    }

    pub fn is_polymorphic(&self) -> bool {
        self.generic_signature.is_some()
    }

    pub fn indirect_formal_results(&self) -> impl Iterator<Item = &SilResultInfo> {
        self.results.iter().filter(|result| result.is_formal_indirect())
    }

    pub fn direct_formal_results(&self) -> impl Iterator<Item = &SilResultInfo> {
        self.results.iter().filter(|result| !result.is_formal_indirect())
    }

    pub fn number_of_indirect_formal_results(&self) -> usize {
        self.indirect_formal_results().count()
    }

    /// The type of all direct results taken together: `()` for none, the
    /// result itself for one, a tuple otherwise.
    pub fn direct_formal_results_type(&self) -> AType {
        let mut direct: Vec<AType> = self.direct_formal_results().map(|r| r.ty.clone()).collect();
        if direct.len() == 1 {
            direct.remove(0)
        } else {
            AType::Tuple(direct)
        }
    }
}

impl fmt::Display for SilFunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_context() {
            let callee = match self.callee_convention {
                ParameterConvention::DirectOwned => "@callee_owned",
                ParameterConvention::DirectUnowned => "@callee_unowned",
                _ => "@callee_guaranteed",
            };
            write!(f, "{callee} ")?;
        } else {
            write!(f, "@convention({}) ", self.representation.name())?;
        }
        if let Some(signature) = &self.generic_signature {
            write!(f, "{signature} ")?;
        }
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", param.convention.attribute(), param.ty)?;
        }
        f.write_str(") -> (")?;
        let mut first = true;
        for result in &self.results {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{} {}", result.convention.attribute(), result.ty)?;
        }
        if let Some(error) = &self.error_result {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "@error {} {}", error.convention.attribute(), error.ty)?;
        }
        f.write_str(")")
    }
}

// ── Formal function types ───────────────────────────────────────────

/// A formal parameter of a source-level function type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionParam {
    pub ty: AType,
    pub label: Option<String>,
    pub is_inout: bool,
}

impl FunctionParam {
    pub fn new(ty: AType) -> Self {
        FunctionParam {
            ty,
            label: None,
            is_inout: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FunctionExtInfo {
    pub representation: SilFunctionTypeRepresentation,
    pub is_noescape: bool,
    pub throws: bool,
}

/// A source-level function type, `(Int, String) throws -> Bool`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub params: Vec<FunctionParam>,
    pub result: AType,
    pub ext: FunctionExtInfo,
    pub generic_signature: Option<GenericSignature>,
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ext.representation != SilFunctionTypeRepresentation::Thick {
            write!(f, "@convention({}) ", self.ext.representation.name())?;
        }
        if let Some(signature) = &self.generic_signature {
            write!(f, "{signature} ")?;
        }
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if let Some(label) = &param.label {
                write!(f, "{label}: ")?;
            }
            if param.is_inout {
                f.write_str("inout ")?;
            }
            write!(f, "{}", param.ty)?;
        }
        f.write_str(")")?;
        if self.ext.throws {
            f.write_str(" throws")?;
        }
        write!(f, " -> {}", self.result)
    }
}
