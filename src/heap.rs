use std::{alloc::Layout, ptr::NonNull};

use tracing::{debug, trace, warn};

use crate::{
  align::WORD_SIZE,
  block::{self, BlockPtr, HEADER_SIZE},
  error::{AllocError, Result},
  free_list::{FreeBlock, FreeList},
  grower::Grower,
};

/// Free-list allocator on top of a growth-only arena.
///
/// Requests are served from the free list when a block fits (exact size
/// first, then the first larger block in address order) and from fresh arena
/// space otherwise. Released blocks go back into the address-ordered free
/// list and are merged with physically adjacent free blocks right away.
///
/// Oversized free blocks are handed out whole; they are never split.
///
/// The allocator is not thread safe. Wrap it in a single lock if it has to be
/// shared.
pub struct FreeListAllocator<G: Grower> {
  grower: G,
  free_list: FreeList,
}

impl<G: Grower> FreeListAllocator<G> {
  pub const fn new(grower: G) -> Self {
    Self {
      grower,
      free_list: FreeList::new(),
    }
  }

  /// Returns a pointer to at least `size` usable bytes, aligned to the
  /// machine word.
  ///
  /// The usable size of the block is `size` rounded up to the word size, and
  /// never less than one word. A reused free block may be larger than that.
  pub fn acquire(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    let usable = block::usable_size(size).ok_or(AllocError::SizeOverflow { size })?;

    // SAFETY: the free list only holds blocks released through `release`,
    // which requires them to be live blocks of this allocator.
    if let Some(block) = unsafe { self.free_list.find_suitable(usable) } {
      unsafe {
        let removed = self.free_list.remove(block);
        debug_assert!(removed, "block found in the free list could not be unlinked");
        block.set_free(false);

        debug!(
          requested = size,
          size = block.size(),
          address = ?block.data(),
          "reusing free block"
        );
      }

      return Ok(block.data());
    }

    let footprint = usable + HEADER_SIZE;

    let Some(start) = self.grower.grow(footprint) else {
      warn!(requested = size, footprint, "arena exhausted");
      return Err(AllocError::Exhausted { requested: footprint });
    };

    // SAFETY: the grower contract hands us `footprint` fresh, word aligned bytes.
    let block = unsafe { BlockPtr::init(start, usable) };

    debug!(
      requested = size,
      size = usable,
      address = ?block.data(),
      "grew arena"
    );

    Ok(block.data())
  }

  /// [`acquire`](Self::acquire) for a [`Layout`]. Layouts asking for more than
  /// word alignment are rejected.
  pub fn allocate(
    &mut self,
    layout: Layout,
  ) -> Result<NonNull<u8>> {
    if layout.align() > WORD_SIZE {
      return Err(AllocError::UnsupportedAlignment { align: layout.align() });
    }

    self.acquire(layout.size())
  }

  /// Gives a block back to the allocator.
  ///
  /// The block is inserted into the free list in address order and merged
  /// with any free block physically next to it.
  ///
  /// # Safety
  ///
  /// `address` must have been returned by `acquire` or `allocate` on this
  /// allocator and must not have been released since. The caller must not use
  /// the memory afterwards. Neither condition is checked.
  pub unsafe fn release(
    &mut self,
    address: NonNull<u8>,
  ) {
    unsafe {
      let block = BlockPtr::from_data(address);
      block.set_free(true);

      trace!(address = ?address, size = block.size(), "releasing block");

      if self.free_list.is_empty() {
        self.free_list.insert_sorted(block);
        return;
      }

      self.free_list.insert_sorted(block);
      let merged = self.free_list.coalesce();

      if merged > 0 {
        debug!(merged, "coalesced free blocks");
      }
    }
  }

  /// Free blocks in address order.
  pub fn free_blocks(&self) -> impl Iterator<Item = FreeBlock> + '_ {
    self.free_list.iter()
  }

  /// Emits one `debug` event per free block.
  pub fn log_free_list(&self) {
    let mut count = 0;

    for block in self.free_blocks() {
      debug!(
        header = ?block.header,
        data = ?block.data,
        size = block.size,
        "free block"
      );
      count += 1;
    }

    debug!(count, "end of free list");
  }

  pub fn grower(&self) -> &G {
    &self.grower
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grower::ArenaGrower;

  fn allocator(capacity: usize) -> FreeListAllocator<ArenaGrower> {
    FreeListAllocator::new(ArenaGrower::with_capacity(capacity))
  }

  #[test]
  fn test_alloc() {
    let mut allocator = allocator(1024);

    unsafe {
      let first_addr = allocator.allocate(Layout::new::<u64>()).unwrap().cast::<u64>().as_ptr();

      *first_addr = 3u64;

      assert_eq!(*first_addr, 3);

      let size: usize = 6;

      let second_addr = allocator
        .allocate(Layout::array::<u16>(size).unwrap())
        .unwrap()
        .cast::<u16>()
        .as_ptr();

      for i in 0..size {
        *(second_addr.add(i)) = (i + 1) as u16;
      }

      assert_eq!(*first_addr, 3);

      for i in 0..size {
        assert_eq!((i + 1) as u16, *(second_addr.add(i)))
      }

      allocator.release(NonNull::new_unchecked(first_addr.cast()));

      let third_addr = allocator.allocate(Layout::new::<u32>()).unwrap().cast::<u32>().as_ptr();

      assert_eq!(first_addr as *mut u32, third_addr);

      allocator.release(NonNull::new_unchecked(third_addr.cast()));

      let fourth_addr = allocator
        .allocate(Layout::new::<[u64; 2]>())
        .unwrap()
        .cast::<[u64; 2]>()
        .as_ptr();

      *fourth_addr = [25, 26];

      assert!(fourth_addr as usize > second_addr as usize);

      assert_eq!(*fourth_addr, [25, 26]);
    }
  }

  #[test]
  fn test_new_blocks_are_adjacent() {
    let mut allocator = allocator(1024);

    let first = allocator.acquire(1).unwrap();
    let second = allocator.acquire(3 * WORD_SIZE).unwrap();
    let third = allocator.acquire(0).unwrap();

    let base = allocator.grower().base() as usize;
    assert_eq!(base + HEADER_SIZE, first.as_ptr() as usize);
    assert_eq!(first.as_ptr() as usize + WORD_SIZE + HEADER_SIZE, second.as_ptr() as usize);
    assert_eq!(second.as_ptr() as usize + 3 * WORD_SIZE + HEADER_SIZE, third.as_ptr() as usize);
    assert_eq!(3 * HEADER_SIZE + 5 * WORD_SIZE, allocator.grower().used());
  }

  #[test]
  fn test_reuse_hands_out_oversized_block_whole() {
    let mut allocator = allocator(1024);

    let big = allocator.acquire(4 * WORD_SIZE).unwrap();
    let _guard = allocator.acquire(WORD_SIZE).unwrap();

    unsafe { allocator.release(big) };

    let small = allocator.acquire(WORD_SIZE).unwrap();
    assert_eq!(big, small);
    assert_eq!(0, allocator.free_blocks().count());
    assert!(allocator.free_list.is_empty());

    // The whole block is usable, nothing was split off.
    unsafe { std::ptr::write_bytes(small.as_ptr(), 0x5A, 4 * WORD_SIZE) };
  }

  #[test]
  fn test_exact_fit_beats_earlier_larger_block() {
    let mut allocator = allocator(1024);

    let larger = allocator.acquire(3 * WORD_SIZE).unwrap();
    let _guard_a = allocator.acquire(WORD_SIZE).unwrap();
    let exact = allocator.acquire(WORD_SIZE).unwrap();
    let _guard_b = allocator.acquire(WORD_SIZE).unwrap();

    unsafe {
      allocator.release(larger);
      allocator.release(exact);
    }

    assert_eq!(exact, allocator.acquire(WORD_SIZE).unwrap());
    assert_eq!(larger, allocator.acquire(WORD_SIZE).unwrap());
  }

  #[test]
  fn test_release_into_empty_list() {
    let mut allocator = allocator(1024);

    let block = allocator.acquire(2 * WORD_SIZE).unwrap();
    unsafe { allocator.release(block) };

    let free: Vec<FreeBlock> = allocator.free_blocks().collect();
    assert_eq!(1, free.len());
    assert_eq!(block.as_ptr() as *const u8, free[0].data);
    assert_eq!(2 * WORD_SIZE, free[0].size);
  }

  #[test]
  fn test_release_merges_both_sides() {
    let mut allocator = allocator(1024);

    let blocks: Vec<NonNull<u8>> = (0..3).map(|_| allocator.acquire(WORD_SIZE).unwrap()).collect();

    unsafe {
      allocator.release(blocks[0]);
      allocator.release(blocks[2]);
      assert_eq!(2, allocator.free_blocks().count());

      allocator.release(blocks[1]);
    }

    let free: Vec<FreeBlock> = allocator.free_blocks().collect();
    assert_eq!(1, free.len());
    assert_eq!(blocks[0].as_ptr() as *const u8, free[0].data);
    assert_eq!(3 * WORD_SIZE + 2 * HEADER_SIZE, free[0].size);
  }

  #[test]
  fn test_exhaustion_reports_footprint() {
    let mut allocator = allocator(HEADER_SIZE + WORD_SIZE);

    assert!(allocator.acquire(WORD_SIZE).is_ok());
    assert_eq!(
      Err(AllocError::Exhausted {
        requested: HEADER_SIZE + WORD_SIZE
      }),
      allocator.acquire(1)
    );
  }

  #[test]
  fn test_size_overflow_is_rejected_before_growing() {
    let mut allocator = allocator(1024);

    assert_eq!(
      Err(AllocError::SizeOverflow { size: usize::MAX }),
      allocator.acquire(usize::MAX)
    );
    assert_eq!(0, allocator.grower().used());
  }

  #[test]
  fn test_over_aligned_layout_is_rejected() {
    let mut allocator = allocator(1024);
    let layout = Layout::from_size_align(8, 2 * WORD_SIZE).unwrap();

    assert_eq!(
      Err(AllocError::UnsupportedAlignment { align: 2 * WORD_SIZE }),
      allocator.allocate(layout)
    );
    assert_eq!(0, allocator.grower().used());
  }
}
