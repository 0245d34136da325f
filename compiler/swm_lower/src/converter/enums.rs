//! Enum layout strategies.
//!
//! Cases are sorted into payload cases and empty cases, and the counts
//! pick a strategy:
//!
//! - no cases: uninhabited, no storage at all
//! - one case: laid out exactly as its payload (or as nothing)
//! - only empty cases: a tag integer just wide enough to number them
//! - one or more payload cases: a payload area as wide as the largest
//!   payload, followed by whatever extra tag bytes the runtime layout adds
//!
//! Payload bits are never inspected, so spare-bit packing of the tag is
//! invisible here; it only shows up as a smaller number of extra bytes.

use std::rc::Rc;

use super::IrTypeConverter;
use crate::agg_lowering::SwiftAggLowering;
use crate::error::{fatal, Result};
use crate::machine::MachineType;
use crate::math::{is_power_of_two, log2_floor, next_power_of_two};
use crate::type_info::{ScalarKind, TypeInfo, TypeInfoKind};
use crate::types::AType;

/// How an enum's cases share its storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnumStrategy {
    /// Exactly one case; `None` when it has no payload.
    Singleton { payload: Option<Rc<TypeInfo>> },
    /// Only cases without payloads.
    NoPayload { cases: usize },
    /// One payload case plus empty cases.
    SinglePayload(PayloadLayout),
    /// Several payload cases.
    MultiPayload(PayloadLayout),
}

/// Payload area and extra tag bytes of an enum with payload cases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadLayout {
    /// Payload of each payload case, boxed ones as object references.
    pub payloads: Vec<Rc<TypeInfo>>,
    pub empty_cases: usize,
    /// Bytes of the largest payload.
    pub payload_size: usize,
    /// Bytes the runtime layout adds after the payload area.
    pub extra_tag_bytes: usize,
}

impl EnumStrategy {
    pub fn is_loadable(&self) -> bool {
        match self {
            EnumStrategy::Singleton { payload } => payload.as_ref().is_none_or(|p| p.is_loadable()),
            EnumStrategy::NoPayload { .. } => true,
            EnumStrategy::SinglePayload(layout) | EnumStrategy::MultiPayload(layout) => {
                layout.payloads.iter().all(|payload| payload.is_loadable())
            }
        }
    }

    /// Describes an enum value of layout `info` at `offset`.
    ///
    /// Payload areas are passed as pointer-sized integers, with a smaller
    /// integer or opaque bytes for the tail. Tag bytes are opaque.
    pub fn add_to_agg_lowering(
        &self,
        info: &TypeInfo,
        lowering: &mut SwiftAggLowering,
        offset: usize,
    ) {
        match self {
            EnumStrategy::Singleton { payload } => {
                if let Some(payload) = payload {
                    payload.add_to_agg_lowering(lowering, offset);
                }
            }
            EnumStrategy::NoPayload { .. } => {
                lowering.add_opaque_data(offset, offset + info.size());
            }
            EnumStrategy::SinglePayload(layout) | EnumStrategy::MultiPayload(layout) => {
                let word = MachineType::I64;
                let word_size = word.size();
                let mut remaining = layout.payload_size;
                let mut running = offset;
                while remaining >= word_size {
                    lowering.add_typed_data(word.clone(), running);
                    running += word_size;
                    remaining -= word_size;
                }
                if remaining > 0 {
                    match MachineType::integer(remaining * 8) {
                        Ok(tail) if is_power_of_two(remaining) => {
                            lowering.add_typed_data(tail, running);
                        }
                        _ => lowering.add_opaque_data(running, running + remaining),
                    }
                    running += remaining;
                }
                lowering.add_opaque_data(running, running + layout.extra_tag_bytes);
            }
        }
    }
}

/// Bit width of the integer holding a `tag_bits`-bit tag: `i1` for one
/// bit, otherwise a power-of-two number of bytes.
pub(crate) fn tag_integer_bits(tag_bits: usize) -> usize {
    if tag_bits == 1 {
        return 1;
    }
    next_power_of_two(tag_bits.div_ceil(8)) * 8
}

impl IrTypeConverter<'_> {
    pub(super) fn convert_enum(&mut self, ty: &AType) -> Result<TypeInfo> {
        let layout = self.reader.composite_layout(ty)?;
        let lowering = self.sil_lowering();
        let pointer_size = self.config.pointer_size;

        let mut payloads: Vec<Rc<TypeInfo>> = Vec::new();
        let mut empty_cases = 0;
        for case in &layout.fields {
            if case.is_indirect_case {
                payloads.push(Rc::new(TypeInfo::pointer(
                    pointer_size,
                    ScalarKind::HeapReference,
                )));
            } else if let Some(payload) = &case.ty {
                let lowered = lowering.lowered_type(payload)?;
                payloads.push(self.convert_type(&lowered)?);
            } else {
                empty_cases += 1;
            }
        }

        let cases = payloads.len() + empty_cases;
        tracing::trace!(%ty, cases, payload_cases = payloads.len(), "enum cases");
        if cases == 0 {
            return Ok(TypeInfo::empty(MachineType::Void));
        }
        if cases == 1 {
            let payload = payloads.pop();
            let info = match &payload {
                Some(payload) => TypeInfo::new(
                    MachineType::Struct(vec![payload.storage_type().clone()]),
                    payload.size(),
                    payload.alignment(),
                    TypeInfoKind::Enum(EnumStrategy::Singleton {
                        payload: Some(Rc::clone(payload)),
                    }),
                ),
                None => TypeInfo::new(
                    MachineType::Struct(Vec::new()),
                    0,
                    1,
                    TypeInfoKind::Enum(EnumStrategy::Singleton { payload: None }),
                ),
            };
            return Ok(info);
        }
        if payloads.is_empty() {
            let used_bits = log2_floor(cases - 1) as usize + 1;
            let tag = MachineType::integer(tag_integer_bits(used_bits))?;
            let bytes = tag.size();
            return Ok(TypeInfo::new(
                MachineType::Struct(vec![tag]),
                bytes,
                bytes,
                TypeInfoKind::Enum(EnumStrategy::NoPayload { cases }),
            ));
        }

        let payload_size = payloads.iter().map(|p| p.size()).max().unwrap_or(0);
        let payload_alignment = payloads.iter().map(|p| p.alignment()).max().unwrap_or(1);
        let Some(extra_tag_bytes) = layout.size.checked_sub(payload_size) else {
            fatal(&format!(
                "{ty} is {} bytes but its largest payload is {payload_size}",
                layout.size
            ));
        };

        let mut body = Vec::with_capacity(2);
        if payload_size > 0 {
            body.push(MachineType::bytes(payload_size));
        }
        if extra_tag_bytes > 0 {
            body.push(MachineType::bytes(tag_integer_bits(extra_tag_bytes * 8) / 8));
        }
        let single = payloads.len() == 1;
        let payload_layout = PayloadLayout {
            payloads,
            empty_cases,
            payload_size,
            extra_tag_bytes,
        };
        let strategy = if single {
            EnumStrategy::SinglePayload(payload_layout)
        } else {
            EnumStrategy::MultiPayload(payload_layout)
        };
        Ok(TypeInfo::new(
            MachineType::Struct(body),
            payload_size + extra_tag_bytes,
            payload_alignment,
            TypeInfoKind::Enum(strategy),
        ))
    }
}
