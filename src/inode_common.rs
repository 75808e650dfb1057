//! Inode number allocation shared by every userfs mount

use core::sync::atomic::{AtomicUsize, Ordering};

/// Process-wide monotonic inode number source
///
/// Numbers are handed out by a single atomic fetch-and-add, so concurrent
/// mounts drawing from the same counter never observe the same value.
#[derive(Debug)]
pub struct InodeNumberAllocator {
    next: AtomicUsize,
}

impl InodeNumberAllocator {
    pub const fn new(first: usize) -> Self {
        Self {
            next: AtomicUsize::new(first),
        }
    }

    /// Draw the next inode number
    pub fn next_ino(&self) -> usize {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// The number the next call to [`next_ino`](Self::next_ino) will return
    pub fn peek(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

impl Default for InodeNumberAllocator {
    fn default() -> Self {
        Self::new(1)
    }
}
