//! The per-session transfer buffer.
//!
//! A fixed-size buffer allocated once per session and reused across reads
//! and writes. This targets a portable async runtime with no DMA
//! descriptors to feed, and the workspace's lint configuration forbids
//! `unsafe_code`, so pointer alignment is left to the global allocator
//! (`Vec<u8>` already rounds large allocations to page-friendly boundaries
//! on every target Rust supports). What drives the STOR buffering behavior
//! is the size invariant: the buffer is always `1024 * buf_size_mult` bytes,
//! a multiple of the 512-byte sector.

/// A reusable, sector-size-multiple transfer buffer.
pub struct TransferBuffer {
    bytes: Vec<u8>,
}

impl TransferBuffer {
    pub const SECTOR_SIZE: usize = 512;

    pub fn new(size: usize) -> Self {
        debug_assert_eq!(
            size % Self::SECTOR_SIZE,
            0,
            "transfer buffer size must be a multiple of the sector size"
        );
        Self {
            bytes: vec![0u8; size],
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}
