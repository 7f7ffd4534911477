//! Walks the free list through a short acquire/release sequence on the real
//! process heap.
//!
//! Run with `RUST_LOG=trace cargo run --example free_list` to also see every
//! merge performed while coalescing.

use std::mem;

use rallocator::{AllocError, BrkGrower, FreeListAllocator, HEADER_SIZE, align::WORD_SIZE};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_program_break(label: &str) {
  info!(
    label,
    pid = std::process::id(),
    program_break = ?BrkGrower::current_break(),
    "program break"
  );
}

fn main() -> Result<(), AllocError> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
    )
    .init();

  // SAFETY: the demo runs on a single thread, so nothing moves the break
  // concurrently with the grower.
  let mut allocator = FreeListAllocator::new(unsafe { BrkGrower::new() });

  print_program_break("start");

  // 1) Five small blocks, one pointer-sized value each.
  let mut blocks = Vec::with_capacity(5);
  for value in 1..=5usize {
    let block = allocator.acquire(mem::size_of::<u32>())?;
    unsafe { block.cast::<usize>().write(value) };
    blocks.push(block);
  }

  for block in &blocks {
    info!(address = ?block, value = unsafe { block.cast::<usize>().read() }, "acquired");
  }

  print_program_break("after acquire");

  // 2) Release all of them. The free list ends up as one coalesced block,
  // as long as nothing else moved the break between the five acquires. The
  // subscriber formats events through the system malloc, which may grow the
  // break too and leave gaps between the blocks.
  for &block in &blocks {
    unsafe { allocator.release(block) };
  }

  allocator.log_free_list();

  if let Some(merged) = allocator.free_blocks().next() {
    info!(
      size = merged.size,
      expected_if_contiguous = 5 * WORD_SIZE + 4 * HEADER_SIZE,
      "coalesced block"
    );
  }

  // 3) The next acquire reuses the first block's address.
  let reused = allocator.acquire(mem::size_of::<u32>())?;
  unsafe { reused.cast::<usize>().write(15) };

  info!(
    address = ?reused,
    reused_first = reused == blocks[0],
    "acquired after release"
  );

  allocator.log_free_list();
  print_program_break("end");

  Ok(())
}
