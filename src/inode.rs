//! The inode record: a file's size and the location of its data blocks.

use crate::BLOCK_SIZE;

/// Number of direct block pointers embedded in each inode.
pub const POINTERS_PER_INODE: usize = 5;
/// Number of block pointers held by one indirect block.
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 4;
/// Size in bytes of one on-disk inode record.
pub const INODE_SIZE: usize = 32;
/// Number of inode records packed into one block of the inode table.
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;

/// Total number of bytes a single inode can address through its direct and indirect pointers.
pub const MAX_FILE_SIZE: usize = (POINTERS_PER_INODE + POINTERS_PER_BLOCK) * BLOCK_SIZE;

/// An inode: `valid`, `size`, up to [`POINTERS_PER_INODE`] direct block numbers, and one
/// indirect block number. 32 bytes on disk, little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    /// Whether this slot currently describes a file.
    pub valid: bool,
    /// Logical size of the file, in bytes.
    pub size: u32,
    /// Direct data block numbers; `0` marks an unused slot and terminates the used prefix.
    pub direct: [u32; POINTERS_PER_INODE],
    /// Indirect block number, or `0` if the file doesn't use one.
    pub indirect: u32,
}

impl Inode {
    /// A fresh, empty, invalid inode.
    pub fn zeroed() -> Self {
        Self {
            valid: false,
            size: 0,
            direct: [0; POINTERS_PER_INODE],
            indirect: 0,
        }
    }

    /// Parses one inode record from a [`INODE_SIZE`]-byte slice.
    ///
    /// Panics if `bytes` is shorter than [`INODE_SIZE`]; callers always hand in a fixed-size
    /// slice carved out of a block buffer.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let valid = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) != 0;
        let size = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let mut direct = [0u32; POINTERS_PER_INODE];
        for (i, d) in direct.iter_mut().enumerate() {
            let off = 8 + i * 4;
            *d = u32::from_le_bytes(bytes[off..off + 4].try_into().unwrap());
        }
        let indirect_off = 8 + POINTERS_PER_INODE * 4;
        let indirect = u32::from_le_bytes(bytes[indirect_off..indirect_off + 4].try_into().unwrap());
        Self {
            valid,
            size,
            direct,
            indirect,
        }
    }

    /// Serializes this inode into a fixed [`INODE_SIZE`]-byte record.
    pub fn to_bytes(&self) -> [u8; INODE_SIZE] {
        let mut bytes = [0u8; INODE_SIZE];
        bytes[0..4].copy_from_slice(&(self.valid as u32).to_le_bytes());
        bytes[4..8].copy_from_slice(&self.size.to_le_bytes());
        for (i, d) in self.direct.iter().enumerate() {
            let off = 8 + i * 4;
            bytes[off..off + 4].copy_from_slice(&d.to_le_bytes());
        }
        let indirect_off = 8 + POINTERS_PER_INODE * 4;
        bytes[indirect_off..indirect_off + 4].copy_from_slice(&self.indirect.to_le_bytes());
        bytes
    }
}
