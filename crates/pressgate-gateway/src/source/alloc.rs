//! Heap accounting allocator.
//!
//! Install in a binary to make `heap_used_bytes` meaningful:
//!
//! ```ignore
//! #[global_allocator]
//! static HEAP: TrackingAllocator = TrackingAllocator::new();
//! ```

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

/// `System` allocator wrapper keeping a live-bytes counter.
pub struct TrackingAllocator {
    allocated: AtomicU64,
}

impl TrackingAllocator {
    pub const fn new() -> Self {
        Self {
            allocated: AtomicU64::new(0),
        }
    }

    /// Bytes currently allocated through this allocator.
    pub fn allocated(&self) -> u64 {
        self.allocated.load(Ordering::Relaxed)
    }
}

impl Default for TrackingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            self.allocated.fetch_add(layout.size() as u64, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            self.allocated.fetch_add(layout.size() as u64, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        self.allocated.fetch_sub(layout.size() as u64, Ordering::Relaxed);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            let old = layout.size() as u64;
            let new = new_size as u64;
            if new >= old {
                self.allocated.fetch_add(new - old, Ordering::Relaxed);
            } else {
                self.allocated.fetch_sub(old - new, Ordering::Relaxed);
            }
        }
        new_ptr
    }
}
