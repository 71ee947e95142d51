//! Per-channel buffer pools.
//!
//! Decoded frame payloads are carved out of the pool belonging to their
//! channel, so payload lifetime follows the channel's recycle policy
//! rather than individual frees. Small allocations bump through fixed-size
//! pages; oversized allocations become standalone blocks that never
//! consume page space.

use bytes::BytesMut;
use std::collections::HashMap;

/// Default page size for channel pools.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

const ALIGNMENT: usize = 8;

fn align_up(size: usize) -> usize {
    (size + ALIGNMENT - 1) & !(ALIGNMENT - 1)
}

/// A page-based bump allocator recycled in bulk.
#[derive(Debug)]
pub struct Pool {
    page_size: usize,
    /// Unused tail of the active page.
    current: BytesMut,
    /// Exhausted page tails awaiting recycle.
    used: Vec<BytesMut>,
    /// Full-capacity pages ready for reuse.
    free: Vec<BytesMut>,
    pages_acquired: usize,
    large_blocks: usize,
}

impl Pool {
    pub fn new(page_size: usize) -> Self {
        debug_assert!(page_size >= ALIGNMENT && page_size % ALIGNMENT == 0);
        Self {
            page_size,
            current: BytesMut::new(),
            used: Vec::new(),
            free: Vec::new(),
            pages_acquired: 0,
            large_blocks: 0,
        }
    }

    /// Returns an empty buffer with capacity for at least `size` bytes.
    ///
    /// Requests up to the page size are bump-carved out of the current
    /// page, rounded up to an 8-byte boundary; larger requests get a
    /// standalone block.
    pub fn alloc(&mut self, size: usize) -> BytesMut {
        if size > self.page_size {
            self.large_blocks += 1;
            return BytesMut::with_capacity(size);
        }
        let aligned = align_up(size);
        if self.current.capacity() < aligned {
            self.next_page();
        }
        self.current.resize(aligned, 0);
        let mut chunk = self.current.split_to(aligned);
        chunk.clear();
        chunk
    }

    fn next_page(&mut self) {
        let page = self.free.pop().unwrap_or_else(|| {
            self.pages_acquired += 1;
            BytesMut::with_capacity(self.page_size)
        });
        let exhausted = std::mem::replace(&mut self.current, page);
        self.used.push(exhausted);
    }

    /// Rewinds the pool: large-block accounting is dropped, and every page
    /// whose carved-out slices have all been dropped regains its full
    /// capacity on the free list. Pages with live slices are released to
    /// the reference count and reclaimed when the last slice goes away.
    pub fn recycle(&mut self) {
        self.large_blocks = 0;
        let mut pages: Vec<BytesMut> = self.used.drain(..).collect();
        pages.push(std::mem::take(&mut self.current));
        for mut page in pages {
            if page.try_reclaim(self.page_size) {
                self.free.push(page);
            }
        }
    }

    /// Recycles and additionally releases the retained pages.
    pub fn empty(&mut self) {
        self.recycle();
        self.free.clear();
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Total pages ever requested from the system allocator.
    pub fn pages_acquired(&self) -> usize {
        self.pages_acquired
    }

    /// Standalone blocks handed out since the last recycle.
    pub fn large_blocks(&self) -> usize {
        self.large_blocks
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Pools keyed by channel number, created on first use of a channel.
#[derive(Debug)]
pub struct ChannelPools {
    page_size: usize,
    pools: HashMap<u16, Pool>,
}

impl ChannelPools {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            pools: HashMap::new(),
        }
    }

    pub fn get(&mut self, channel: u16) -> &mut Pool {
        let page_size = self.page_size;
        self.pools
            .entry(channel)
            .or_insert_with(|| Pool::new(page_size))
    }

    /// Recycles one channel's pool, if it exists.
    pub fn recycle_channel(&mut self, channel: u16) {
        if let Some(pool) = self.pools.get_mut(&channel) {
            pool.recycle();
        }
    }

    /// Drops one channel's pool entirely.
    pub fn remove(&mut self, channel: u16) {
        self.pools.remove(&channel);
    }

    pub fn recycle_all(&mut self) {
        for pool in self.pools.values_mut() {
            pool.recycle();
        }
    }

    pub fn channel_count(&self) -> usize {
        self.pools.len()
    }
}

impl Default for ChannelPools {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_returns_requested_capacity() {
        let mut pool = Pool::new(4096);
        let buf = pool.alloc(100);
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 100);
    }

    #[test]
    fn test_page_bound() {
        let mut pool = Pool::new(4096);
        // 64 aligned allocations of 64 bytes fill exactly one page.
        let bufs: Vec<_> = (0..64).map(|_| pool.alloc(64)).collect();
        assert_eq!(pool.pages_acquired(), 1);

        let extra = pool.alloc(64);
        assert_eq!(pool.pages_acquired(), 2);
        drop((bufs, extra));
    }

    #[test]
    fn test_alignment_consumption() {
        // 3 and 5 both round up to 8; a 16-byte page holds exactly the two.
        let mut pool = Pool::new(16);
        let a = pool.alloc(3);
        let b = pool.alloc(5);
        assert_eq!(pool.pages_acquired(), 1);
        let c = pool.alloc(1);
        assert_eq!(pool.pages_acquired(), 2);
        drop((a, b, c));
    }

    #[test]
    fn test_large_block_bypasses_pages() {
        let mut pool = Pool::new(4096);
        let big = pool.alloc(4097);
        assert!(big.capacity() >= 4097);
        assert_eq!(pool.pages_acquired(), 0);
        assert_eq!(pool.large_blocks(), 1);

        // Page space is untouched by the large block.
        let small = pool.alloc(64);
        assert_eq!(pool.pages_acquired(), 1);
        drop((big, small));

        pool.recycle();
        assert_eq!(pool.large_blocks(), 0);
    }

    #[test]
    fn test_recycle_reuses_drained_pages() {
        let mut pool = Pool::new(4096);
        let buf = pool.alloc(1000);
        assert_eq!(pool.pages_acquired(), 1);
        drop(buf);

        pool.recycle();
        let _buf = pool.alloc(1000);
        // Served from the free list, not the system allocator.
        assert_eq!(pool.pages_acquired(), 1);
    }

    #[test]
    fn test_recycle_with_live_slice() {
        let mut pool = Pool::new(4096);
        let mut held = pool.alloc(16);
        held.extend_from_slice(b"still here");
        pool.recycle();

        // The referenced page cannot be reused; a new one is acquired.
        let _other = pool.alloc(16);
        assert_eq!(pool.pages_acquired(), 2);
        assert_eq!(&held[..], b"still here");
    }

    #[test]
    fn test_empty_releases_pages() {
        let mut pool = Pool::new(4096);
        drop(pool.alloc(100));
        pool.empty();

        let _buf = pool.alloc(100);
        assert_eq!(pool.pages_acquired(), 2);
    }

    #[test]
    fn test_channel_pools_isolated() {
        let mut pools = ChannelPools::new(4096);
        let a = pools.get(1).alloc(64);
        let b = pools.get(2).alloc(64);
        assert_eq!(pools.channel_count(), 2);
        assert_eq!(pools.get(1).pages_acquired(), 1);
        assert_eq!(pools.get(2).pages_acquired(), 1);
        drop((a, b));

        pools.recycle_channel(1);
        pools.remove(2);
        assert_eq!(pools.channel_count(), 1);
    }
}
