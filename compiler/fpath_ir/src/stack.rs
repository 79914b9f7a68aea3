//! Stack growth for the recursive passes.
//!
//! Parsing, lowering, compaction and code generation all recurse along
//! the template's nesting. Each recursive entry point runs under
//! [`ensure_sufficient_stack`] so a deep template on a small thread stack
//! (a rayon worker, a test thread) grows the stack instead of aborting.

/// Grow when less than this much stack is left.
const RED_ZONE: usize = 64 * 1024;

/// Size of each new stack segment.
const GROW_BY: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, GROW_BY, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
