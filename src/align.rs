use std::mem;

/// Machine word size in bytes: 8 on 64 bit targets, 4 on 32 bit targets.
pub const WORD_SIZE: usize = mem::size_of::<usize>();

/// Rounds the given size up to the next multiple of the machine word size.
///
/// The expression must not overflow when `WORD_SIZE - 1` is added to it; use
/// [`checked_align`] for sizes that come from callers.
///
/// # Examples
///
/// ```rust
/// use std::mem;
/// use rallocator::align;
///
/// match mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::WORD_SIZE - 1) & !($crate::align::WORD_SIZE - 1)
  };
}

/// Overflow-aware version of [`align!`]. Returns `None` when the aligned
/// value does not fit in a `usize`.
pub const fn checked_align(size: usize) -> Option<usize> {
  match size.checked_add(WORD_SIZE - 1) {
    Some(padded) => Some(padded & !(WORD_SIZE - 1)),
    None => None,
  }
}
