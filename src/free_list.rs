//! Address-ordered intrusive list of free blocks.
//!
//! ```text
//!   head
//!    │
//!    ▼
//!   ┌────────┬───────────┬─────┐      ┌────────┬───────────┬─────┐
//!   │ Header │ next ─────┼─────┼─────▶│ Header │ next: None│ ... │
//!   └────────┴───────────┴─────┘      └────────┴───────────┴─────┘
//!   low address                                         high address
//! ```
//!
//! The link of each node is stored in the first word of the free block's own
//! data area, so the list needs no storage of its own. Nodes are kept sorted
//! by header address, which makes physical neighbours list neighbours too.

use std::marker::PhantomData;

use tracing::trace;

use crate::block::{BlockPtr, HEADER_SIZE};

/// Snapshot of one free block, as reported by
/// [`FreeListAllocator::free_blocks`](crate::FreeListAllocator::free_blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
  /// Start of the block header.
  pub header: *const u8,
  /// Start of the data area; what `acquire` would return for this block.
  pub data: *const u8,
  /// Usable bytes after the header.
  pub size: usize,
}

pub struct FreeList {
  head: Option<BlockPtr>,
}

impl FreeList {
  pub const fn new() -> Self {
    Self { head: None }
  }

  pub fn is_empty(&self) -> bool {
    self.head.is_none()
  }

  /// Exact fit first, else the lowest-addressed block that is strictly
  /// larger than `size`.
  ///
  /// This is deliberately not best fit: among larger blocks the first one in
  /// address order wins, not the smallest.
  ///
  /// # Safety
  ///
  /// Every node in the list must be a live free block.
  pub unsafe fn find_suitable(
    &self,
    size: usize,
  ) -> Option<BlockPtr> {
    unsafe {
      let mut current = self.head;
      while let Some(block) = current {
        if block.size() == size {
          return Some(block);
        }
        current = block.next();
      }

      let mut current = self.head;
      while let Some(block) = current {
        if block.size() > size {
          return Some(block);
        }
        current = block.next();
      }

      None
    }
  }

  /// Links `block` in front of the first node with a higher address.
  ///
  /// # Safety
  ///
  /// `block` must be a live block that is marked free and not already in the
  /// list. Its first data word is overwritten.
  pub unsafe fn insert_sorted(
    &mut self,
    block: BlockPtr,
  ) {
    unsafe {
      let Some(head) = self.head else {
        block.set_next(None);
        self.head = Some(block);
        return;
      };

      if block < head {
        block.set_next(Some(head));
        self.head = Some(block);
        return;
      }

      let mut prev = head;
      while let Some(next) = prev.next() {
        if next > block {
          break;
        }
        prev = next;
      }

      // Covers both the middle and the tail case: prev.next() is None at the tail.
      block.set_next(prev.next());
      prev.set_next(Some(block));
    }
  }

  /// Unlinks `block`. Returns `false` if it was not in the list.
  ///
  /// # Safety
  ///
  /// Every node in the list must be a live free block.
  pub unsafe fn remove(
    &mut self,
    block: BlockPtr,
  ) -> bool {
    unsafe {
      let Some(head) = self.head else {
        return false;
      };

      if head == block {
        self.head = block.next();
        return true;
      }

      let mut prev = head;
      while let Some(next) = prev.next() {
        if next == block {
          prev.set_next(block.next());
          return true;
        }
        prev = next;
      }

      false
    }
  }

  /// Merges every run of physically adjacent free blocks into the first
  /// block of the run. Returns the number of blocks absorbed.
  ///
  /// One left-to-right pass is enough: the list is address ordered, so a
  /// block's physical successor, if free, is also its list successor.
  ///
  /// # Safety
  ///
  /// Every node in the list must be a live free block.
  pub unsafe fn coalesce(&mut self) -> usize {
    let mut merged = 0;

    unsafe {
      let mut current = self.head;
      while let Some(block) = current {
        while let Some(next) = block.next() {
          if next.addr() != block.end() {
            break;
          }

          let size = block.size() + HEADER_SIZE + next.size();
          trace!(
            block = ?block.data(),
            absorbed = ?next.data(),
            size,
            "coalescing adjacent free blocks"
          );

          block.set_next(next.next());
          block.set_size(size);
          merged += 1;
        }
        current = block.next();
      }
    }

    merged
  }

  pub fn iter(&self) -> Iter<'_> {
    Iter {
      current: self.head,
      _list: PhantomData,
    }
  }
}

pub struct Iter<'a> {
  current: Option<BlockPtr>,
  _list: PhantomData<&'a FreeList>,
}

impl Iterator for Iter<'_> {
  type Item = FreeBlock;

  fn next(&mut self) -> Option<FreeBlock> {
    let block = self.current?;

    // SAFETY: nodes only enter the list through `insert_sorted`, whose
    // contract makes them live free blocks for as long as they are linked.
    unsafe {
      debug_assert!(block.is_free(), "used block linked into the free list");
      self.current = block.next();

      Some(FreeBlock {
        header: block.addr() as *const u8,
        data: block.data().as_ptr(),
        size: block.size(),
      })
    }
  }
}
