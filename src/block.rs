use std::{mem, ptr::NonNull};

use crate::{align, align::WORD_SIZE};

/// Metadata stored in front of every block, used or free.
///
/// `size` counts the usable data bytes after the header and is always a
/// multiple of [`WORD_SIZE`].
#[repr(C)]
pub struct Header {
  pub size: usize,
  pub is_free: bool,
}

/// Distance between a block's header and its data.
pub const HEADER_SIZE: usize = align!(mem::size_of::<Header>());

/// Smallest usable size a block can have. A free block keeps its registry
/// link in the data area, so the data area must hold at least one pointer.
pub const MIN_BLOCK_SIZE: usize = mem::size_of::<Option<BlockPtr>>();

const _: () = assert!(HEADER_SIZE % mem::align_of::<Header>() == 0);
const _: () = assert!(MIN_BLOCK_SIZE == WORD_SIZE);

/// Usable size handed out for a request of `size` bytes, or `None` if the
/// block footprint would overflow.
pub fn usable_size(size: usize) -> Option<usize> {
  let size = align::checked_align(size)?.max(MIN_BLOCK_SIZE);
  size.checked_add(HEADER_SIZE)?;
  Some(size)
}

/// Handle to a block header inside the arena.
///
/// The header/data offset lives here and nowhere else: callers move between
/// the two views with [`BlockPtr::from_data`] and [`BlockPtr::data`].
/// Ordering compares header addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockPtr(NonNull<Header>);

impl BlockPtr {
  /// Formats a used block of `size` usable bytes at `start`.
  ///
  /// # Safety
  ///
  /// `start` must be word aligned and point to at least
  /// `HEADER_SIZE + size` writable bytes owned by the allocator.
  pub unsafe fn init(
    start: NonNull<u8>,
    size: usize,
  ) -> Self {
    let header = start.cast::<Header>();
    unsafe {
      header.as_ptr().write(Header { size, is_free: false });
    }
    Self(header)
  }

  /// Recovers the block from a pointer previously returned by [`BlockPtr::data`].
  ///
  /// # Safety
  ///
  /// `data` must have been produced by `data()` on a live block.
  pub unsafe fn from_data(data: NonNull<u8>) -> Self {
    unsafe { Self(data.sub(HEADER_SIZE).cast::<Header>()) }
  }

  pub fn data(self) -> NonNull<u8> {
    // SAFETY: every block is at least HEADER_SIZE + MIN_BLOCK_SIZE bytes
    // inside the arena, so the data pointer stays in the same allocation.
    unsafe { self.0.cast::<u8>().add(HEADER_SIZE) }
  }

  pub fn addr(self) -> usize {
    self.0.as_ptr() as usize
  }

  /// # Safety
  ///
  /// The header must be live.
  pub unsafe fn size(self) -> usize {
    unsafe { (*self.0.as_ptr()).size }
  }

  /// # Safety
  ///
  /// The header must be live and `size` bytes of data must belong to it.
  pub unsafe fn set_size(
    self,
    size: usize,
  ) {
    unsafe { (*self.0.as_ptr()).size = size }
  }

  /// # Safety
  ///
  /// The header must be live.
  pub unsafe fn is_free(self) -> bool {
    unsafe { (*self.0.as_ptr()).is_free }
  }

  /// # Safety
  ///
  /// The header must be live.
  pub unsafe fn set_free(
    self,
    is_free: bool,
  ) {
    unsafe { (*self.0.as_ptr()).is_free = is_free }
  }

  /// Address one past the last data byte, where a physically adjacent
  /// block's header would start.
  ///
  /// # Safety
  ///
  /// The header must be live.
  pub unsafe fn end(self) -> usize {
    unsafe { self.addr() + HEADER_SIZE + self.size() }
  }

  /// Reads the registry link stored in the data area of a free block.
  ///
  /// # Safety
  ///
  /// The block must be free and its link initialised with [`BlockPtr::set_next`].
  pub unsafe fn next(self) -> Option<BlockPtr> {
    unsafe { self.link().read() }
  }

  /// Stores the registry link in the data area, overwriting user bytes.
  ///
  /// # Safety
  ///
  /// The block must be free; the caller no longer owns its data.
  pub unsafe fn set_next(
    self,
    next: Option<BlockPtr>,
  ) {
    unsafe { self.link().write(next) }
  }

  fn link(self) -> *mut Option<BlockPtr> {
    self.data().as_ptr().cast::<Option<BlockPtr>>()
  }
}
