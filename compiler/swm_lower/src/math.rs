//! Integer helpers for sizes, alignments and tag widths.

pub fn is_power_of_two(value: usize) -> bool {
    value != 0 && value & (value - 1) == 0
}

/// Smallest power of two that is `>= value`. Zero maps to one.
pub fn next_power_of_two(value: usize) -> usize {
    value.max(1).next_power_of_two()
}

/// `floor(log2(value))`; zero maps to zero.
pub fn log2_floor(value: usize) -> u32 {
    value.checked_ilog2().unwrap_or(0)
}

/// Rounds `offset` up to a multiple of `alignment`, which must be a power
/// of two.
pub fn align_to(offset: usize, alignment: usize) -> usize {
    debug_assert!(is_power_of_two(alignment));
    (offset + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn powers_of_two() {
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(64));
        assert!(!is_power_of_two(0));
        assert!(!is_power_of_two(12));
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(8), 8);
    }

    #[test]
    fn floor_log() {
        assert_eq!(log2_floor(1), 0);
        assert_eq!(log2_floor(2), 1);
        assert_eq!(log2_floor(255), 7);
        assert_eq!(log2_floor(256), 8);
    }

    #[test]
    fn alignment_rounding() {
        assert_eq!(align_to(0, 8), 0);
        assert_eq!(align_to(1, 8), 8);
        assert_eq!(align_to(12, 4), 12);
        assert_eq!(align_to(13, 16), 16);
    }
}
