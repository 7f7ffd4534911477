#![cfg(unix)]

use rallocator::{BrkGrower, FreeListAllocator, align::WORD_SIZE};

#[test]
fn process_heap_round_trip() {
  // SAFETY: this binary holds a single test and creates a single grower; the
  // harness thread only waits for it.
  let mut allocator = FreeListAllocator::new(unsafe { BrkGrower::new() });

  let first = allocator.acquire(3 * WORD_SIZE).unwrap();
  assert_eq!(0, first.as_ptr() as usize % WORD_SIZE);
  assert!(first.as_ptr() < BrkGrower::current_break());

  unsafe {
    std::ptr::write_bytes(first.as_ptr(), 0xC3, 3 * WORD_SIZE);
    for offset in 0..3 * WORD_SIZE {
      assert_eq!(0xC3, *first.as_ptr().add(offset));
    }

    allocator.release(first);
  }

  assert_eq!(first, allocator.acquire(3 * WORD_SIZE).unwrap());
}
