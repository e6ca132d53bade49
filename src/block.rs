//! Raw block buffers and the indirect-pointer-block view over them.
//!
//! A block is, physically, just `BLOCK_SIZE` bytes; the superblock, the inode table and the
//! indirect pointer blocks are all different interpretations of the same raw buffer.

use crate::BLOCK_SIZE;
use crate::inode::POINTERS_PER_BLOCK;

/// One on-disk block, as raw bytes.
pub type RawBlock = [u8; BLOCK_SIZE];

/// Returns a fresh, zeroed block.
pub fn zeroed() -> RawBlock {
    [0u8; BLOCK_SIZE]
}

/// A data block reinterpreted as an array of block pointers (`u32[POINTERS_PER_BLOCK]`), used
/// for indirect blocks. Entries are little-endian; a `0` entry terminates the used prefix of
/// the array.
#[derive(Debug, Clone, Copy)]
pub struct IndirectBlock {
    pointers: [u32; POINTERS_PER_BLOCK],
}

impl IndirectBlock {
    /// An indirect block with every pointer cleared.
    pub fn zeroed() -> Self {
        Self {
            pointers: [0; POINTERS_PER_BLOCK],
        }
    }

    /// Parses a raw block read from disk.
    pub fn from_raw(raw: &RawBlock) -> Self {
        let mut pointers = [0u32; POINTERS_PER_BLOCK];
        for (dst, chunk) in pointers.iter_mut().zip(raw.chunks_exact(4)) {
            *dst = u32::from_le_bytes(chunk.try_into().unwrap());
        }
        Self { pointers }
    }

    /// Serializes back into a raw block ready to be written to disk.
    pub fn to_raw(&self) -> RawBlock {
        let mut raw = zeroed();
        for (chunk, ptr) in raw.chunks_exact_mut(4).zip(self.pointers.iter()) {
            chunk.copy_from_slice(&ptr.to_le_bytes());
        }
        raw
    }

    /// Returns the pointer stored at index `i`.
    pub fn get(&self, i: usize) -> u32 {
        self.pointers[i]
    }

    /// Sets the pointer stored at index `i`.
    pub fn set(&mut self, i: usize, value: u32) {
        self.pointers[i] = value;
    }
}
