//! Allocation failures.

/// Result type for allocator operations.
pub type Result<T> = std::result::Result<T, AllocError>;

/// Errors returned by [`FreeListAllocator`](crate::FreeListAllocator).
///
/// Every variant is reported before the free list or the arena is touched,
/// so a failed call leaves the allocator exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
  #[error("arena exhausted: could not grow by {requested} bytes")]
  Exhausted { requested: usize },

  #[error("requested size {size} overflows the block footprint")]
  SizeOverflow { size: usize },

  #[error("alignment {align} exceeds the machine word size")]
  UnsupportedAlignment { align: usize },
}
