//! Physical signatures of lowered function types.
//!
//! An [`IrSignature`] is what a call site or an interceptor needs to know
//! about a function: its machine function type, the attributes on each
//! parameter, and which machine parameters each formal parameter became.
//!
//! # References
//!
//! - Swift `lib/IRGen/GenCall.cpp` (`SignatureExpansion`)
//! - Swift `lib/IRGen/Signature.h`

mod expansion;

use std::ops::Range;

use crate::converter::IrTypeConverter;
use crate::error::Result;
use crate::machine::{AttributeList, CallingConv, MachineFunctionType, MachineType, ParamMapping};
use crate::types::SilFunctionType;

/// Where the direct result of a call ends up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultMapping {
    /// The result is written through a pointer parameter.
    pub requires_indirect: bool,
    /// Components of the returned value, as ranges over the elements of
    /// the machine result type.
    pub ranges: Vec<Range<usize>>,
}

/// The expanded signature of one function type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrSignature {
    pub function_type: MachineFunctionType,
    pub attributes: AttributeList,
    pub calling_conv: CallingConv,
    mappings: Vec<ParamMapping>,
    result_mapping: ResultMapping,
    coroutine_overflow: Option<MachineType>,
}

impl IrSignature {
    pub(crate) fn expand(
        converter: &mut IrTypeConverter<'_>,
        function: &SilFunctionType,
    ) -> Result<Self> {
        expansion::expand(converter, function)
    }

    /// One mapping per formal parameter, in declaration order.
    pub fn mappings(&self) -> &[ParamMapping] {
        &self.mappings
    }

    pub fn result_mapping(&self) -> &ResultMapping {
        &self.result_mapping
    }

    /// Machine parameters formal parameter `index` was expanded into.
    pub fn range_of_ir_parameters(&self, index: usize) -> Range<usize> {
        self.mappings[index].range.clone()
    }

    /// Whether formal parameter `index` is passed by pointer although its
    /// convention is direct.
    pub fn requires_indirect(&self, index: usize) -> bool {
        self.mappings[index].requires_indirect
    }

    pub fn requires_indirect_result(&self) -> bool {
        self.result_mapping.requires_indirect
    }

    pub fn uses_sret(&self) -> bool {
        self.attributes.uses_sret()
    }

    /// The yields that did not fit in registers, passed together behind
    /// the last result pointer of a coroutine.
    pub fn coroutine_overflow(&self) -> Option<&MachineType> {
        self.coroutine_overflow.as_ref()
    }
}

#[cfg(test)]
mod tests;
