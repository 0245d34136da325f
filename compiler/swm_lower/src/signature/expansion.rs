//! Expansion of a lowered function type into machine parameters.
//!
//! Parameter order under the native convention:
//!
//! 1. indirect result pointers (the first may be `sret`)
//! 2. the coroutine buffer, for coroutines
//! 3. formal parameters, minus `self` when it travels as the context
//! 4. generic context that no other argument provides
//! 5. `self` or the closure context, marked `swiftself`
//! 6. the error slot, marked `swifterror`
//! 7. `Self` metadata and witness table, for witness methods

use std::mem;

use smallvec::SmallVec;

use super::{IrSignature, ResultMapping};
use crate::converter::IrTypeConverter;
use crate::error::{fatal, not_implemented, Result};
use crate::machine::{
    AttributeList, CallingConv, MachineFunctionType, MachineType, ParamAttrs, ParamMapping,
    SwiftAbiInfo,
};
use crate::native_schema::NativeConventionSchema;
use crate::polymorphic::expand_polymorphic_signature;
use crate::types::{
    AType, MetatypeRepresentation, SilFunctionType, SilFunctionTypeRepresentation,
    SilParameterInfo,
};

pub(super) fn expand(
    converter: &mut IrTypeConverter<'_>,
    function: &SilFunctionType,
) -> Result<IrSignature> {
    if !function.representation.is_native() {
        return Err(not_implemented!(
            "@convention({}) signatures",
            function.representation.name()
        ));
    }
    let generics = function.generic_signature.as_ref();
    converter.push_generic_context(generics);
    let expanded = SignatureExpansion::new(converter, function).expand();
    converter.pop_generic_context(generics);
    expanded
}

struct SignatureExpansion<'c, 'r> {
    converter: &'c mut IrTypeConverter<'r>,
    function: &'c SilFunctionType,
    params: Vec<MachineType>,
    attributes: AttributeList,
    mappings: Vec<ParamMapping>,
    result_mapping: ResultMapping,
    coroutine_overflow: Option<MachineType>,
    can_use_self: bool,
    can_use_error: bool,
    can_use_sret: bool,
}

impl<'c, 'r> SignatureExpansion<'c, 'r> {
    fn new(converter: &'c mut IrTypeConverter<'r>, function: &'c SilFunctionType) -> Self {
        SignatureExpansion {
            converter,
            function,
            params: Vec::new(),
            attributes: AttributeList::default(),
            mappings: Vec::new(),
            result_mapping: ResultMapping::default(),
            coroutine_overflow: None,
            can_use_self: true,
            can_use_error: true,
            can_use_sret: true,
        }
    }

    fn expand(mut self) -> Result<IrSignature> {
        let result = self.expand_result()?;
        self.expand_parameters()?;
        if self.mappings.len() != self.function.params.len() {
            fatal(&format!(
                "{} formal parameters but {} mappings",
                self.function.params.len(),
                self.mappings.len()
            ));
        }

        let function_type = MachineFunctionType {
            result,
            params: self.params,
            is_var_args: false,
        };
        tracing::debug!(
            function = %self.function,
            signature = %function_type,
            "expanded signature"
        );
        Ok(IrSignature {
            function_type,
            attributes: self.attributes,
            calling_conv: CallingConv::Swift,
            mappings: self.mappings,
            result_mapping: self.result_mapping,
            coroutine_overflow: self.coroutine_overflow,
        })
    }

    // ── Claims ──────────────────────────────────────────────────────

    fn claim_self(&mut self) {
        if !mem::replace(&mut self.can_use_self, false) {
            fatal("swiftself claimed twice");
        }
    }

    fn claim_error(&mut self) {
        if !mem::replace(&mut self.can_use_error, false) {
            fatal("swifterror claimed twice");
        }
    }

    /// Whether the next indirect result may be `sret`; only the first can.
    fn claim_sret(&mut self) -> bool {
        mem::replace(&mut self.can_use_sret, false)
    }

    // ── Results ─────────────────────────────────────────────────────

    fn expand_result(&mut self) -> Result<MachineType> {
        if self.function.is_coroutine() {
            return self.expand_coroutine_result();
        }

        if self.function.number_of_indirect_formal_results() > 1 {
            self.can_use_sret = false;
        }
        let result = self.expand_direct_result()?;
        for _ in 0..self.function.number_of_indirect_formal_results() {
            self.add_indirect_result();
        }
        Ok(result)
    }

    fn expand_direct_result(&mut self) -> Result<MachineType> {
        let result_type = self.function.direct_formal_results_type();
        if result_type.is_void() {
            return Ok(MachineType::Void);
        }
        let info = self.converter.convert_type(&result_type)?;
        let schema = NativeConventionSchema::new(&info, self.converter.config(), true);
        if schema.requires_indirect() {
            self.add_indirect_result();
            self.result_mapping.requires_indirect = true;
            return Ok(MachineType::Void);
        }
        if schema.is_empty() {
            return Ok(MachineType::Void);
        }
        self.can_use_sret = false;
        self.result_mapping.ranges.push(0..schema.components().len());
        Ok(schema.expanded_type())
    }

    fn add_indirect_result(&mut self) {
        if self.claim_sret() {
            self.attributes.add(self.params.len(), ParamAttrs::SRET);
        }
        self.params.push(MachineType::Pointer);
    }

    /// A continuation pointer followed by the yielded values. Yields that
    /// do not fit are moved, from the back, into a struct passed by
    /// pointer in their place.
    fn expand_coroutine_result(&mut self) -> Result<MachineType> {
        if !self.function.results.is_empty() {
            return Err(not_implemented!("coroutines with direct results"));
        }
        let function = self.function;
        let mut components: SmallVec<[MachineType; 4]> = SmallVec::new();
        components.push(MachineType::Pointer);
        for yielded in &function.yields {
            if yielded.is_formal_indirect() {
                components.push(MachineType::Pointer);
                continue;
            }
            let info = self.converter.convert_type(&yielded.ty)?;
            let schema = NativeConventionSchema::new(&info, self.converter.config(), true);
            if schema.requires_indirect() {
                components.push(MachineType::Pointer);
            } else {
                components.extend(schema.components());
            }
        }

        let abi = SwiftAbiInfo::new(self.converter.config());
        let mut overflow = Vec::new();
        while abi.should_pass_indirectly(&components, true) {
            if !overflow.is_empty() {
                components.pop();
            }
            let Some(last) = components.pop() else {
                fatal("coroutine result has no components left to move");
            };
            overflow.push(last);
            components.push(MachineType::Pointer);
        }
        if !overflow.is_empty() {
            overflow.reverse();
            self.coroutine_overflow = Some(MachineType::Struct(overflow));
        }

        Ok(if components.len() == 1 {
            components.remove(0)
        } else {
            MachineType::Struct(components.into_vec())
        })
    }

    // ── Parameters ──────────────────────────────────────────────────

    fn expand_parameters(&mut self) -> Result<()> {
        if self.function.is_coroutine() {
            self.params.push(MachineType::Pointer);
        }

        let function = self.function;
        let has_self_context = has_self_context_parameter(function);
        let formal = if has_self_context {
            &function.params[..function.params.len() - 1]
        } else {
            &function.params[..]
        };
        for param in formal {
            self.expand_parameter(param)?;
        }

        if has_polymorphic_parameters(function) {
            self.params.extend(expand_polymorphic_signature(function)?);
        }

        if has_self_context {
            self.claim_self();
            self.attributes.add(self.params.len(), ParamAttrs::SWIFT_SELF);
            if let Some(self_param) = function.params.last() {
                self.expand_parameter(self_param)?;
            }
        } else if function.has_context() || function.error_result.is_some() {
            self.claim_self();
            self.attributes.add(self.params.len(), ParamAttrs::SWIFT_SELF);
            self.params.push(MachineType::Pointer);
        }

        if function.error_result.is_some() {
            self.claim_error();
            self.attributes.add(self.params.len(), ParamAttrs::SWIFT_ERROR);
            self.params.push(MachineType::Pointer);
        }

        if function.representation == SilFunctionTypeRepresentation::WitnessMethod {
            self.params.push(MachineType::Pointer);
            self.params.push(MachineType::Pointer);
        }
        Ok(())
    }

    fn expand_parameter(&mut self, param: &SilParameterInfo) -> Result<()> {
        let start = self.params.len();
        let requires_indirect = if param.convention.is_indirect() {
            let schema = NativeConventionSchema::for_indirect_parameter(self.converter.config());
            self.params.extend(schema.components());
            false
        } else {
            let info = self.converter.convert_type(&param.ty)?;
            let schema = NativeConventionSchema::new(&info, self.converter.config(), false);
            if schema.requires_indirect() {
                self.params.push(MachineType::Pointer);
                true
            } else {
                self.params.extend(schema.components());
                false
            }
        };
        self.mappings.push(ParamMapping {
            requires_indirect,
            range: start..self.params.len(),
        });
        Ok(())
    }
}

/// Whether `self` is passed in the context register rather than as an
/// ordinary trailing parameter.
fn has_self_context_parameter(function: &SilFunctionType) -> bool {
    let Some(self_param) = function.self_parameter() else {
        return false;
    };
    if self_param.is_formal_indirect() {
        return true;
    }
    match &self_param.ty {
        AType::Metatype(metatype) => metatype.representation != Some(MetatypeRepresentation::Thin),
        ty => ty.may_have_superclass() || ty.is_type_parameter() || ty.is_objc_existential(),
    }
}

fn has_polymorphic_parameters(function: &SilFunctionType) -> bool {
    function.representation == SilFunctionTypeRepresentation::WitnessMethod
        || function.is_polymorphic()
}
