//! How one value travels under the native calling convention.

use smallvec::SmallVec;

use crate::agg_lowering::{FinishedAggLowering, SwiftAggLowering};
use crate::config::TargetConfig;
use crate::machine::MachineType;
use crate::type_info::TypeInfo;

/// The scalar components a value is passed or returned as, and whether
/// the ABI sends it through memory instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeConventionSchema {
    lowering: FinishedAggLowering,
    requires_indirect: bool,
}

impl NativeConventionSchema {
    /// Address-only types have no components and always go indirect.
    pub fn new(info: &TypeInfo, config: &TargetConfig, is_result: bool) -> Self {
        let mut lowering = SwiftAggLowering::new(config);
        if !info.is_loadable() {
            return NativeConventionSchema {
                lowering: lowering.finish(),
                requires_indirect: true,
            };
        }
        info.add_to_agg_lowering(&mut lowering, 0);
        let lowering = lowering.finish();
        let requires_indirect = lowering.should_pass_indirectly(is_result);
        NativeConventionSchema {
            lowering,
            requires_indirect,
        }
    }

    /// The single pointer an indirect parameter is passed as.
    pub fn for_indirect_parameter(config: &TargetConfig) -> Self {
        let mut lowering = SwiftAggLowering::new(config);
        lowering.add_typed_data(MachineType::Pointer, 0);
        NativeConventionSchema {
            lowering: lowering.finish(),
            requires_indirect: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lowering.is_empty()
    }

    pub fn requires_indirect(&self) -> bool {
        self.requires_indirect
    }

    pub fn components(&self) -> SmallVec<[MachineType; 4]> {
        self.lowering.component_types()
    }

    /// `void` for no components, the component itself for one, a struct
    /// otherwise.
    pub fn expanded_type(&self) -> MachineType {
        let mut components = self.components();
        match components.len() {
            0 => MachineType::Void,
            1 => components.remove(0),
            _ => MachineType::Struct(components.into_vec()),
        }
    }
}
