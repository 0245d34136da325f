//! Stack growth for the recursive demangler and remangler paths.
//!
//! Symbol trees nest as deeply as the input's generic arguments and
//! function types, so adversarial symbols can recurse far deeper than a
//! thread's default stack allows.
//!
//! - **Native targets**: `stacker` grows the stack on demand.
//! - **WASM targets**: passthrough.

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Runs `f`, first growing the stack if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly (WASM has its own stack management).
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_recursion_does_not_overflow() {
        fn nest(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { nest(n - 1) + 1 })
        }

        assert_eq!(nest(100_000), 100_000);
    }

    #[test]
    fn returns_closure_result() {
        let result: Result<i32, &str> = ensure_sufficient_stack(|| Ok(123));
        assert_eq!(result, Ok(123));
    }
}
