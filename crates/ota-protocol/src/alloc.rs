//! Buffer allocation for variable-length parameters.

use std::cell::Cell;

/// Source of buffers for variable-length extraction.
pub trait BufferAllocator {
    /// Returns an empty vector able to hold `len` bytes without reallocating,
    /// or `None` when the memory is not available.
    fn allocate(&self, len: usize) -> Option<Vec<u8>>;
}

/// Allocates from the global heap, reporting exhaustion instead of aborting.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAllocator;

impl BufferAllocator for HeapAllocator {
    fn allocate(&self, len: usize) -> Option<Vec<u8>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len).ok()?;
        Some(buf)
    }
}

/// Heap allocator with a fixed byte budget.
///
/// Requests that would overrun the remaining budget are refused. Useful on
/// devices that reserve a small arena for OTA bookkeeping, and in tests that
/// need to observe how many buffers a call obtained.
#[derive(Debug)]
pub struct BudgetAllocator {
    remaining: Cell<usize>,
    allocations: Cell<usize>,
}

impl BudgetAllocator {
    /// Create an allocator that hands out at most `max_bytes` in total.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            remaining: Cell::new(max_bytes),
            allocations: Cell::new(0),
        }
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.remaining.get()
    }

    /// Number of successful allocations so far.
    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }
}

impl BufferAllocator for BudgetAllocator {
    fn allocate(&self, len: usize) -> Option<Vec<u8>> {
        let remaining = self.remaining.get().checked_sub(len)?;
        let buf = HeapAllocator.allocate(len)?;
        self.remaining.set(remaining);
        self.allocations.set(self.allocations.get() + 1);
        Some(buf)
    }
}

impl<A: BufferAllocator + ?Sized> BufferAllocator for &A {
    fn allocate(&self, len: usize) -> Option<Vec<u8>> {
        (**self).allocate(len)
    }
}
