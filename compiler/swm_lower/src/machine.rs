//! Machine-level types and the target ABI oracle.
//!
//! A deliberately small model of LLVM's first-class types: the scalar
//! widths the Swift ABI uses, arrays, non-packed structs and an opaque
//! pointer. Layout rules follow the x86-64 data layout.
//!
//! # References
//!
//! - Swift `lib/IRGen/SwiftTargetInfo.cpp`
//! - Clang `lib/CodeGen/SwiftCallingConv.cpp` (`shouldPassIndirectly`)

use std::fmt;
use std::ops::Range;

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::config::TargetConfig;
use crate::error::{fatal, not_implemented, Result};
use crate::math::align_to;

// ---------------------------------------------------------------------------
// Machine types
// ---------------------------------------------------------------------------

/// A first-class machine type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MachineType {
    Void,
    I1,
    I8,
    I16,
    I32,
    I64,
    Float,
    Double,
    X86Fp80,
    Array(Box<MachineType>, usize),
    Struct(Vec<MachineType>),
    Pointer,
}

impl MachineType {
    /// The integer type of exactly `bits` bits.
    pub fn integer(bits: usize) -> Result<MachineType> {
        match bits {
            1 => Ok(MachineType::I1),
            8 => Ok(MachineType::I8),
            16 => Ok(MachineType::I16),
            32 => Ok(MachineType::I32),
            64 => Ok(MachineType::I64),
            _ => Err(not_implemented!("machine integer i{bits}")),
        }
    }

    /// `[i8 x bytes]`, the storage of an untyped byte range.
    pub fn bytes(bytes: usize) -> MachineType {
        MachineType::Array(Box::new(MachineType::I8), bytes)
    }

    /// Store size in bytes. Struct fields are laid out at their natural
    /// alignment with no tail padding.
    pub fn size(&self) -> usize {
        match self {
            MachineType::Void => 0,
            MachineType::I1 | MachineType::I8 => 1,
            MachineType::I16 => 2,
            MachineType::I32 | MachineType::Float => 4,
            MachineType::I64 | MachineType::Double | MachineType::Pointer => 8,
            MachineType::X86Fp80 => fatal("x86_fp80 has no layout on this target"),
            MachineType::Array(element, count) => element.size() * count,
            MachineType::Struct(fields) => fields
                .iter()
                .fold(0, |end, field| align_to(end, field.alignment()) + field.size()),
        }
    }

    pub fn alignment(&self) -> usize {
        match self {
            MachineType::Void | MachineType::I1 | MachineType::I8 => 1,
            MachineType::I16 => 2,
            MachineType::I32 | MachineType::Float => 4,
            MachineType::I64 | MachineType::Double | MachineType::Pointer => 8,
            MachineType::X86Fp80 => fatal("x86_fp80 has no layout on this target"),
            MachineType::Array(element, _) => element.alignment(),
            MachineType::Struct(fields) => {
                fields.iter().map(MachineType::alignment).max().unwrap_or(1)
            }
        }
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(
            self,
            MachineType::Float | MachineType::Double | MachineType::X86Fp80
        )
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, MachineType::Array(..) | MachineType::Struct(_))
    }

    /// Struct fields, or the type itself for anything else. `void`
    /// flattens to nothing.
    pub fn flatten(&self) -> SmallVec<[MachineType; 4]> {
        match self {
            MachineType::Void => SmallVec::new(),
            MachineType::Struct(fields) => fields.iter().cloned().collect(),
            other => smallvec::smallvec![other.clone()],
        }
    }
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineType::Void => f.write_str("void"),
            MachineType::I1 => f.write_str("i1"),
            MachineType::I8 => f.write_str("i8"),
            MachineType::I16 => f.write_str("i16"),
            MachineType::I32 => f.write_str("i32"),
            MachineType::I64 => f.write_str("i64"),
            MachineType::Float => f.write_str("float"),
            MachineType::Double => f.write_str("double"),
            MachineType::X86Fp80 => f.write_str("x86_fp80"),
            MachineType::Array(element, count) => write!(f, "[{count} x {element}]"),
            MachineType::Struct(fields) => {
                if fields.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                write_list(f, fields)?;
                f.write_str(" }")
            }
            MachineType::Pointer => f.write_str("ptr"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[MachineType]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Function types and attributes
// ---------------------------------------------------------------------------

/// Physical function type: one machine type per IR parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MachineFunctionType {
    pub result: MachineType,
    pub params: Vec<MachineType>,
    pub is_var_args: bool,
}

impl fmt::Display for MachineFunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.result)?;
        write_list(f, &self.params)?;
        if self.is_var_args {
            f.write_str(if self.params.is_empty() { "..." } else { ", ..." })?;
        }
        f.write_str(")")
    }
}

/// Calling convention of an expanded signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallingConv {
    Swift,
}

bitflags! {
    /// Attributes attached to a single IR parameter.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ParamAttrs: u8 {
        /// Pointer to caller-allocated storage for the result.
        const SRET = 1 << 0;
        /// Context or self value, passed in the dedicated self register.
        const SWIFT_SELF = 1 << 1;
        /// Error slot, passed in the dedicated error register.
        const SWIFT_ERROR = 1 << 2;
    }
}

/// Per-parameter attributes of an expanded signature.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeList {
    params: FxHashMap<usize, ParamAttrs>,
}

impl AttributeList {
    pub fn add(&mut self, index: usize, attrs: ParamAttrs) {
        *self.params.entry(index).or_default() |= attrs;
    }

    /// Attributes of IR parameter `index`; empty when it has none.
    pub fn param(&self, index: usize) -> ParamAttrs {
        self.params.get(&index).copied().unwrap_or_default()
    }

    /// Index of the parameter carrying `attr`, if any.
    pub fn find(&self, attr: ParamAttrs) -> Option<usize> {
        self.params
            .iter()
            .filter(|(_, attrs)| attrs.contains(attr))
            .map(|(&index, _)| index)
            .min()
    }

    pub fn uses_sret(&self) -> bool {
        self.param(0).contains(ParamAttrs::SRET)
    }
}

/// Range of IR parameters one formal parameter expanded into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamMapping {
    pub requires_indirect: bool,
    pub range: Range<usize>,
}

// ---------------------------------------------------------------------------
// ABI oracle
// ---------------------------------------------------------------------------

/// Target ABI oracle for the Swift calling convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwiftAbiInfo {
    max_direct_scalar_components: usize,
}

impl SwiftAbiInfo {
    pub fn new(config: &TargetConfig) -> Self {
        SwiftAbiInfo {
            max_direct_scalar_components: config.max_direct_scalar_components,
        }
    }

    /// Whether a value made of `components` must be passed through memory.
    ///
    /// Components must already be split into scalars; `void` components
    /// are ignored. The decision is the same for arguments and results on
    /// x86-64, but callers still say which one they ask about.
    pub fn should_pass_indirectly(
        &self,
        components: &[MachineType],
        as_return_value: bool,
    ) -> bool {
        let mut ints = 0;
        let mut floats = 0;
        for component in components {
            match component {
                MachineType::Pointer
                | MachineType::I1
                | MachineType::I8
                | MachineType::I16
                | MachineType::I32
                | MachineType::I64 => ints += 1,
                MachineType::Float | MachineType::Double => floats += 1,
                MachineType::Void => {}
                MachineType::X86Fp80 => fatal("x86_fp80 has no Swift ABI classification"),
                MachineType::Array(..) | MachineType::Struct(_) => {
                    fatal("aggregate component reached the ABI oracle")
                }
            }
        }
        let indirect = ints + floats > self.max_direct_scalar_components;
        tracing::trace!(ints, floats, as_return_value, indirect, "abi oracle");
        indirect
    }
}

#[cfg(test)]
mod tests;
