//! Stack growth for the recursive tree walks.
//!
//! Parsing, resolving, printing and evaluating all recurse once per tree
//! level.  Each of them enters [`guarded`] before descending, so a tree as
//! deep as [`MAX_NESTING`](crate::parser::MAX_NESTING) allows runs on a
//! freshly allocated segment instead of overflowing the thread's stack.

/// Grow when less than this much stack is left.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated segment.
const SEGMENT: usize = 1024 * 1024;

/// Run `f`, first moving to a new stack segment if the current one is
/// nearly exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn guarded<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn guarded<R>(f: impl FnOnce() -> R) -> R {
    f()
}
