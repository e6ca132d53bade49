//! The filesystem engine: layout, the inode table, the allocator, and file I/O.

use crate::BLOCK_SIZE;
use crate::block::{self, IndirectBlock};
use crate::disk::Disk;
use crate::error::{Error, Result};
use crate::inode::{INODES_PER_BLOCK, Inode, POINTERS_PER_BLOCK, POINTERS_PER_INODE};
use crate::superblock::SuperBlock;

/// A mounted (or not-yet-mounted) filesystem.
///
/// `FileSystem::default()` produces a handle with nothing mounted; [`format`](Self::format)
/// prepares a [`Disk`] and [`mount`](Self::mount) binds one to this handle, reconstructing the
/// free-block bitmap from the inode table it finds there.
#[derive(Debug, Default)]
pub struct FileSystem {
    disk: Option<Disk>,
    meta_data: Option<SuperBlock>,
    free_blocks: Vec<bool>,
}

impl FileSystem {
    /// Builds a handle with nothing mounted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a disk is currently mounted.
    pub fn is_mounted(&self) -> bool {
        self.disk.is_some()
    }

    fn disk_mut(&mut self) -> Result<&mut Disk> {
        self.disk.as_mut().ok_or(Error::NotMounted)
    }

    fn meta(&self) -> Result<&SuperBlock> {
        self.meta_data.as_ref().ok_or(Error::NotMounted)
    }

    /// Formats `disk` with a fresh superblock and zeroes every other block.
    ///
    /// `disk` is borrowed, not consumed, so the caller can [`mount`](Self::mount) the same
    /// handle immediately after formatting it. Fails with [`Error::BadArgs`] if the disk has
    /// fewer than two blocks, and with [`Error::AlreadyMounted`] if this handle is currently
    /// mounted.
    pub fn format(&mut self, disk: &mut Disk) -> Result<()> {
        if self.is_mounted() {
            return Err(Error::AlreadyMounted);
        }
        let blocks = disk.blocks();
        if blocks < 2 {
            return Err(Error::BadArgs);
        }

        let super_block = SuperBlock::new(blocks);
        disk.write(0, &super_block.to_raw())?;

        let zero = block::zeroed();
        for b in 1..blocks {
            disk.write(b, &zero)?;
        }
        Ok(())
    }

    /// Mounts `disk`, validating its superblock and reconstructing the free-block bitmap from
    /// the inode table found on it.
    ///
    /// Fails with [`Error::AlreadyMounted`] if this handle already has a disk mounted, or
    /// [`Error::InvalidSuperblock`] if `disk`'s block 0 doesn't carry a valid superblock for it.
    pub fn mount(&mut self, mut disk: Disk) -> Result<()> {
        if self.is_mounted() {
            return Err(Error::AlreadyMounted);
        }

        let mut raw = block::zeroed();
        disk.read(0, &mut raw)?;
        let super_block = SuperBlock::from_raw(&raw);
        if !super_block.is_valid(disk.blocks()) {
            return Err(Error::InvalidSuperblock);
        }

        let free_blocks = Self::build_free_block_bitmap(&mut disk, &super_block)?;

        self.disk = Some(disk);
        self.meta_data = Some(super_block);
        self.free_blocks = free_blocks;
        Ok(())
    }

    /// Releases the bitmap and hands the disk back to the caller, or `None` if nothing was
    /// mounted.
    pub fn unmount(&mut self) -> Option<Disk> {
        self.meta_data = None;
        self.free_blocks.clear();
        self.disk.take()
    }

    fn build_free_block_bitmap(disk: &mut Disk, super_block: &SuperBlock) -> Result<Vec<bool>> {
        let mut free_blocks = vec![false; super_block.blocks as usize];
        free_blocks[0] = true;
        for i in 1..=super_block.inode_blocks {
            free_blocks[i as usize] = true;

            let mut raw = block::zeroed();
            disk.read(i, &mut raw)?;
            for slot in 0..INODES_PER_BLOCK {
                let inode = Inode::from_bytes(&raw[slot * 32..(slot + 1) * 32]);
                if !inode.valid {
                    continue;
                }
                for &d in &inode.direct {
                    if d == 0 {
                        break;
                    }
                    free_blocks[d as usize] = true;
                }
                if inode.indirect == 0 {
                    continue;
                }
                free_blocks[inode.indirect as usize] = true;

                let mut indirect_raw = block::zeroed();
                disk.read(inode.indirect, &mut indirect_raw)?;
                let indirect = IndirectBlock::from_raw(&indirect_raw);
                for j in 0..POINTERS_PER_BLOCK {
                    let p = indirect.get(j);
                    if p == 0 {
                        break;
                    }
                    free_blocks[p as usize] = true;
                }
            }
        }
        Ok(free_blocks)
    }

    fn load_inode(&mut self, inode_number: u32) -> Result<Inode> {
        let inodes = self.meta()?.inodes;
        if inode_number >= inodes {
            return Err(Error::InvalidInode);
        }
        let block_index = inode_number / INODES_PER_BLOCK as u32 + 1;
        let slot = inode_number as usize % INODES_PER_BLOCK;

        let mut raw = block::zeroed();
        self.disk_mut()?.read(block_index, &mut raw)?;
        let inode = Inode::from_bytes(&raw[slot * 32..(slot + 1) * 32]);
        if !inode.valid {
            return Err(Error::InvalidInode);
        }
        Ok(inode)
    }

    fn save_inode(&mut self, inode_number: u32, inode: &Inode) -> Result<()> {
        let block_index = inode_number / INODES_PER_BLOCK as u32 + 1;
        let slot = inode_number as usize % INODES_PER_BLOCK;

        let mut raw = block::zeroed();
        self.disk_mut()?.read(block_index, &mut raw)?;
        raw[slot * 32..(slot + 1) * 32].copy_from_slice(&inode.to_bytes());
        self.disk_mut()?.write(block_index, &raw)?;
        Ok(())
    }

    /// Scans the free-block bitmap from index 1 and returns the first free block, marking it
    /// used. Returns [`Error::NoSpace`] when every block is in use.
    fn allocate_free_block(&mut self) -> Result<u32> {
        for i in 1..self.free_blocks.len() {
            if !self.free_blocks[i] {
                self.free_blocks[i] = true;
                return Ok(i as u32);
            }
        }
        Err(Error::NoSpace)
    }

    /// Allocates a free inode slot and returns its index.
    ///
    /// Fails with [`Error::NoFreeInode`] when the inode table has no free slot.
    pub fn create(&mut self) -> Result<u32> {
        let inodes = self.meta()?.inodes;
        let inode_blocks = self.meta()?.inode_blocks;

        for block_index in 1..=inode_blocks {
            let mut raw = block::zeroed();
            self.disk_mut()?.read(block_index, &mut raw)?;
            for slot in 0..INODES_PER_BLOCK {
                let index = (block_index - 1) * INODES_PER_BLOCK as u32 + slot as u32;
                if index >= inodes {
                    break;
                }
                let existing = Inode::from_bytes(&raw[slot * 32..(slot + 1) * 32]);
                if existing.valid {
                    continue;
                }
                let mut fresh = Inode::zeroed();
                fresh.valid = true;
                self.save_inode(index, &fresh)?;
                return Ok(index);
            }
        }
        Err(Error::NoFreeInode)
    }

    /// Releases every block owned by `inode_number` and frees its inode slot.
    pub fn remove(&mut self, inode_number: u32) -> Result<()> {
        let inode = self.load_inode(inode_number)?;

        for &d in &inode.direct {
            if d == 0 {
                break;
            }
            self.free_blocks[d as usize] = false;
        }

        if inode.indirect != 0 {
            let mut raw = block::zeroed();
            self.disk_mut()?.read(inode.indirect, &mut raw)?;
            let indirect = IndirectBlock::from_raw(&raw);
            let mut freed_any = false;
            for j in 0..POINTERS_PER_BLOCK {
                let p = indirect.get(j);
                if p == 0 {
                    break;
                }
                self.free_blocks[p as usize] = false;
                freed_any = true;
            }
            if freed_any {
                self.free_blocks[inode.indirect as usize] = false;
            }
        }

        self.save_inode(inode_number, &Inode::zeroed())
    }

    /// Returns the logical size, in bytes, of `inode_number`.
    pub fn stat(&mut self, inode_number: u32) -> Result<u32> {
        Ok(self.load_inode(inode_number)?.size)
    }

    /// Reads up to `buf.len()` bytes of `inode_number`'s content starting at `offset`.
    ///
    /// Returns the number of bytes actually copied: 0 if `offset` is at or past the end of the
    /// file, clamped to `size - offset` if the requested range would run past the end.
    pub fn read(&mut self, inode_number: u32, buf: &mut [u8], offset: usize) -> Result<usize> {
        let inode = self.load_inode(inode_number)?;
        let size = inode.size as usize;
        if offset >= size || buf.is_empty() {
            return Ok(0);
        }
        let length = (buf.len()).min(size - offset);

        let mut sum = 0usize;
        let mut cur_offset = offset;
        let mut i = offset / BLOCK_SIZE;

        while i < POINTERS_PER_INODE && sum < length {
            let block_number = inode.direct[i];
            if block_number == 0 {
                break;
            }
            let mut raw = block::zeroed();
            self.disk_mut()?.read(block_number, &mut raw)?;

            let read_size = (length - sum).min(BLOCK_SIZE);
            let within = cur_offset % BLOCK_SIZE;
            buf[sum..sum + read_size].copy_from_slice(&raw[within..within + read_size]);
            sum += read_size;
            cur_offset += read_size;
            i += 1;
        }

        if inode.indirect != 0 && sum < length {
            let mut j = i - POINTERS_PER_INODE;
            let mut raw = block::zeroed();
            self.disk_mut()?.read(inode.indirect, &mut raw)?;
            let indirect = IndirectBlock::from_raw(&raw);

            while j < POINTERS_PER_BLOCK && sum < length {
                let block_number = indirect.get(j);
                if block_number == 0 {
                    break;
                }
                let mut data = block::zeroed();
                self.disk_mut()?.read(block_number, &mut data)?;

                let read_size = (length - sum).min(BLOCK_SIZE);
                let within = cur_offset % BLOCK_SIZE;
                buf[sum..sum + read_size].copy_from_slice(&data[within..within + read_size]);
                sum += read_size;
                cur_offset += read_size;
                j += 1;
            }
        }

        Ok(sum)
    }

    /// Writes `buf` into `inode_number`'s content starting at `offset`, extending the file and
    /// allocating blocks as needed.
    ///
    /// Returns the number of bytes actually written: 0 if `offset` is past the current size
    /// (holes aren't supported); fewer than `buf.len()` if the allocator runs out of space
    /// partway through, in which case the bytes already copied remain persisted and accounted
    /// for in the updated size.
    pub fn write(&mut self, inode_number: u32, buf: &[u8], offset: usize) -> Result<usize> {
        let mut inode = self.load_inode(inode_number)?;
        if offset > inode.size as usize {
            return Ok(0);
        }

        let mut written = 0usize;
        let mut cur_offset = offset;
        let mut length = buf.len();
        let mut p = offset / BLOCK_SIZE;
        let mut direct_exhausted = false;

        'direct: while p < POINTERS_PER_INODE && length > 0 {
            let mut raw;
            if inode.direct[p] == 0 {
                let allocated = match self.allocate_free_block() {
                    Ok(b) => b,
                    Err(Error::NoSpace) => {
                        direct_exhausted = true;
                        break 'direct;
                    }
                    Err(e) => return Err(e),
                };
                inode.direct[p] = allocated;
                raw = block::zeroed();
            } else {
                raw = block::zeroed();
                self.disk_mut()?.read(inode.direct[p], &mut raw)?;
            }

            let within = cur_offset % BLOCK_SIZE;
            let copy_size = (BLOCK_SIZE - within).min(length);
            raw[within..within + copy_size].copy_from_slice(&buf[written..written + copy_size]);
            self.disk_mut()?.write(inode.direct[p], &raw)?;

            length -= copy_size;
            cur_offset += copy_size;
            written += copy_size;
            p += 1;
        }

        if length > 0 && !direct_exhausted {
            let mut q = p - POINTERS_PER_INODE;
            let mut indirect_raw;
            if inode.indirect == 0 {
                match self.allocate_free_block() {
                    Ok(b) => {
                        inode.indirect = b;
                        indirect_raw = block::zeroed();
                    }
                    Err(Error::NoSpace) => indirect_raw = block::zeroed(),
                    Err(e) => return Err(e),
                }
            } else {
                indirect_raw = block::zeroed();
                self.disk_mut()?.read(inode.indirect, &mut indirect_raw)?;
            }

            if inode.indirect != 0 {
                let mut indirect = IndirectBlock::from_raw(&indirect_raw);

                'indirect: while length > 0 {
                    if q >= POINTERS_PER_BLOCK {
                        break 'indirect;
                    }
                    let mut data;
                    let pointer = indirect.get(q);
                    if pointer == 0 {
                        let allocated = match self.allocate_free_block() {
                            Ok(b) => b,
                            Err(Error::NoSpace) => break 'indirect,
                            Err(e) => return Err(e),
                        };
                        indirect.set(q, allocated);
                        data = block::zeroed();
                    } else {
                        data = block::zeroed();
                        self.disk_mut()?.read(pointer, &mut data)?;
                    }

                    let within = cur_offset % BLOCK_SIZE;
                    let copy_size = (BLOCK_SIZE - within).min(length);
                    data[within..within + copy_size]
                        .copy_from_slice(&buf[written..written + copy_size]);
                    self.disk_mut()?.write(indirect.get(q), &data)?;

                    length -= copy_size;
                    cur_offset += copy_size;
                    written += copy_size;
                    q += 1;
                }

                indirect_raw = indirect.to_raw();
                self.disk_mut()?.write(inode.indirect, &indirect_raw)?;
            }
        }

        inode.size = inode.size.max(cur_offset as u32);
        self.save_inode(inode_number, &inode)?;
        Ok(written)
    }
}
