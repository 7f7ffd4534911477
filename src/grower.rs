//! Growth primitives the allocator builds its arena on.
//!
//! A [`Grower`] can only push the high end of one contiguous range forward.
//! It never hands back interior memory, which is why the allocator keeps its
//! own free list on top of it.

#[cfg(unix)]
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use crate::{align, align::WORD_SIZE};

/// Default capacity of an [`ArenaGrower`]: 64 KiB.
pub const DEFAULT_ARENA_CAPACITY: usize = 64 * 1024;

/// Extends a contiguous, monotonically growing address range.
///
/// # Safety
///
/// Implementors must guarantee that a `Some(start)` returned by
/// [`Grower::grow`] points to `bytes` writable bytes that nothing else uses,
/// that `start` is aligned to [`WORD_SIZE`], and that previously returned
/// regions are never moved or reclaimed while the grower is alive.
pub unsafe trait Grower {
  /// Extends the range by `bytes` and returns the start of the new region,
  /// or `None` when the range cannot grow any further. `bytes` is always a
  /// multiple of [`WORD_SIZE`].
  fn grow(
    &mut self,
    bytes: usize,
  ) -> Option<NonNull<u8>>;
}

/// Grows the process data segment with `sbrk(2)`.
///
/// `sbrk` moves one process-wide boundary and is not thread safe, so the
/// grower is neither `Send` nor `Sync`:
///
/// ```compile_fail
/// fn assert_send<T: Send>() {}
/// assert_send::<rallocator::BrkGrower>();
/// ```
///
/// ```compile_fail
/// fn assert_sync<T: Sync>() {}
/// assert_sync::<rallocator::BrkGrower>();
/// ```
#[cfg(unix)]
#[derive(Debug)]
pub struct BrkGrower {
  _not_thread_safe: PhantomData<*mut ()>,
}

#[cfg(unix)]
impl BrkGrower {
  /// # Safety
  ///
  /// Nothing may move the program break concurrently with this grower: no
  /// `BrkGrower` or direct `brk`/`sbrk` call on another thread, and no
  /// allocator on another thread that extends its heap with `brk` (glibc's
  /// main arena does). Code on the same thread may move the break between
  /// calls, but must never lower it below a region this grower handed out.
  pub const unsafe fn new() -> Self {
    Self {
      _not_thread_safe: PhantomData,
    }
  }

  /// Current program break, i.e. `sbrk(0)`.
  pub fn current_break() -> *mut u8 {
    unsafe { libc::sbrk(0).cast() }
  }
}

#[cfg(unix)]
unsafe impl Grower for BrkGrower {
  fn grow(
    &mut self,
    bytes: usize,
  ) -> Option<NonNull<u8>> {
    // The break is not guaranteed to be word aligned, and other code in the
    // process may have moved it since the last call.
    let current = Self::current_break() as usize;
    let padding = align!(current) - current;

    let increment = bytes.checked_add(padding)?.try_into().ok()?;
    let address = unsafe { libc::sbrk(increment) };

    if address == usize::MAX as *mut libc::c_void {
      return None;
    }

    NonNull::new(unsafe { address.cast::<u8>().add(padding) })
  }
}

/// Fixed-capacity arena backed by one heap buffer.
///
/// Behaves like the process break with a hard ceiling: regions are handed out
/// back to back and `grow` fails once the capacity is used up.
pub struct ArenaGrower {
  base: NonNull<usize>,
  words: usize,
  used: usize,
}

impl ArenaGrower {
  /// Creates an arena of `capacity` bytes, rounded up to the word size.
  ///
  /// # Panics
  ///
  /// Panics if the backing buffer cannot be allocated.
  pub fn with_capacity(capacity: usize) -> Self {
    let words = capacity_in_words(capacity);
    let memory: Box<[usize]> = vec![0; words].into_boxed_slice();
    let base = NonNull::from(Box::leak(memory)).cast::<usize>();

    Self { base, words, used: 0 }
  }

  pub fn capacity(&self) -> usize {
    self.words * WORD_SIZE
  }

  /// Bytes handed out so far.
  pub fn used(&self) -> usize {
    self.used
  }

  /// Address of the first byte of the arena.
  pub fn base(&self) -> *const u8 {
    self.base.as_ptr().cast()
  }
}

/// Number of words needed for `capacity` bytes, saturating at `usize::MAX`
/// bytes instead of overflowing.
fn capacity_in_words(capacity: usize) -> usize {
  match align::checked_align(capacity) {
    Some(aligned) => aligned / WORD_SIZE,
    None => usize::MAX / WORD_SIZE,
  }
}

impl Default for ArenaGrower {
  fn default() -> Self {
    Self::with_capacity(DEFAULT_ARENA_CAPACITY)
  }
}

unsafe impl Grower for ArenaGrower {
  fn grow(
    &mut self,
    bytes: usize,
  ) -> Option<NonNull<u8>> {
    if bytes > self.capacity() - self.used {
      return None;
    }

    let start = unsafe { self.base.cast::<u8>().add(self.used) };
    self.used += bytes;

    Some(start)
  }
}

impl Drop for ArenaGrower {
  fn drop(&mut self) {
    let memory = ptr::slice_from_raw_parts_mut(self.base.as_ptr(), self.words);
    unsafe { drop(Box::from_raw(memory)) };
  }
}
