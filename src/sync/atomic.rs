use std::sync::atomic::{AtomicUsize, Ordering};

/// Atomically replaces `value` with `new` if it currently equals `expected`.
///
/// Returns `true` if the store happened. On failure `value` is left
/// untouched. A successful exchange has acquire-release semantics so it can
/// serve as the only synchronization point of a lock.
///
/// # Examples
///
/// ```rust
/// use cadentis_sync::sync::compare_and_set;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let word = AtomicUsize::new(0);
/// assert!(compare_and_set(&word, 0, 1));
/// assert!(!compare_and_set(&word, 0, 2));
/// assert_eq!(word.load(Ordering::SeqCst), 1);
/// ```
#[inline]
pub fn compare_and_set(value: &AtomicUsize, expected: usize, new: usize) -> bool {
    value
        .compare_exchange(expected, new, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
}
