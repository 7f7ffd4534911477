//! # rallocator - A Free-List Memory Allocator
//!
//! This crate provides a general purpose allocator built on a growth-only
//! address space primitive such as `sbrk(2)`. The primitive can only move the
//! end of the heap, so holes in the middle of the heap are tracked and reused
//! by the allocator itself.
//!
//! ## Overview
//!
//! ```text
//!   Heap after a few acquires and releases:
//!
//!   ┌────┬──────┬────┬──────┬────┬──────┬────┬──────┬──────────────────┐
//!   │ H  │ used │ H  │ free │ H  │ used │ H  │ free │    not grown     │
//!   └────┴──────┴────┴──┬───┴────┴──────┴────┴──┬───┴──────────────────┘
//!                       │          ▲            │                      ▲
//!   free list head ─────┘          │            └──▶ None              │
//!                        link stored in the                        Program
//!                        free block's data                          Break
//! ```
//!
//! - `acquire(size)` looks for a free block of exactly the aligned size, then
//!   for the first (lowest address) block that is larger. If none fits, the
//!   arena is grown by one header plus the aligned size.
//! - `release(ptr)` inserts the block into the free list in address order and
//!   merges it with any free block physically next to it.
//!
//! ## Crate Structure
//!
//! ```text
//!   rallocator
//!   ├── align      - Word alignment (align!, checked_align)
//!   ├── block      - Block header and header/data handle (internal)
//!   ├── free_list  - Address-ordered intrusive free list (internal)
//!   ├── grower     - Growth primitives: BrkGrower, ArenaGrower
//!   ├── heap       - FreeListAllocator
//!   └── error      - AllocError
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rallocator::{ArenaGrower, FreeListAllocator};
//!
//! let mut allocator = FreeListAllocator::new(ArenaGrower::with_capacity(4096));
//!
//! let ptr = allocator.acquire(8).unwrap();
//! unsafe {
//!     ptr.cast::<u64>().write(42);
//!     assert_eq!(42, ptr.cast::<u64>().read());
//!     allocator.release(ptr);
//! }
//!
//! // The released block is reused for the next request of the same size.
//! assert_eq!(ptr, allocator.acquire(8).unwrap());
//! ```
//!
//! ## Block Layout
//!
//! ```text
//!   Used block:
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         User Data              │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size: N         │  │     N bytes usable             │
//!   │  │ is_free: false  │  │     (multiple of the word)     │
//!   │  └─────────────────┘  │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//!
//!   Free block:
//!   ┌───────────────────────┬──────────────┬─────────────────┐
//!   │  size: N              │ next free ──▶│   (unused)      │
//!   │  is_free: true        │   block      │                 │
//!   └───────────────────────┴──────────────┴─────────────────┘
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization; wrap the allocator in one
//!   lock to share it
//! - **No splitting**: a larger free block is handed out whole
//! - **No shrinking**: memory is never returned to the operating system
//! - **Word alignment only**: layouts with larger alignment are rejected
//! - **No misuse detection**: double release or foreign pointers are undefined
//!   behavior
//!
//! ## Safety
//!
//! `acquire` is safe to call. `release` is `unsafe` because the allocator
//! trusts the pointer it is given.

pub mod align;
mod block;
mod error;
mod free_list;
pub mod grower;
mod heap;

pub use block::{HEADER_SIZE, MIN_BLOCK_SIZE};
pub use error::{AllocError, Result};
pub use free_list::FreeBlock;
#[cfg(unix)]
pub use grower::BrkGrower;
pub use grower::{ArenaGrower, DEFAULT_ARENA_CAPACITY, Grower};
pub use heap::FreeListAllocator;
