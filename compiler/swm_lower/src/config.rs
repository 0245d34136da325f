//! Target description used by the lowering engine.

/// Facts about the target ABI that lowering decisions depend on.
///
/// The default describes x86-64 with the Swift calling convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetConfig {
    /// Size and alignment of a pointer, in bytes.
    pub pointer_size: usize,
    /// Largest integer the aggregate lowering will voluntarily form when it
    /// re-splits opaque runs. Also the chunk size of the merge pass.
    pub max_voluntary_int_size: usize,
    /// Scalar components above which a value is passed indirectly.
    pub max_direct_scalar_components: usize,
    /// Alignment cap applied to builtin integers.
    pub max_alignment: usize,
}

impl Default for TargetConfig {
    fn default() -> Self {
        TargetConfig {
            pointer_size: 8,
            max_voluntary_int_size: 8,
            max_direct_scalar_components: 4,
            max_alignment: 16,
        }
    }
}

impl TargetConfig {
    pub fn pointer_alignment(&self) -> usize {
        self.pointer_size
    }

    /// Size of the inline buffer used by opaque existentials and unsafe
    /// value buffers: three pointers.
    pub fn fixed_buffer_size(&self) -> usize {
        3 * self.pointer_size
    }

    pub fn capped_alignment(&self, alignment: usize) -> usize {
        alignment.min(self.max_alignment)
    }
}
