//! Stand-alone disk inspection: dumps the superblock and inode table without mounting.

use std::io::Write;

use crate::block::{self, IndirectBlock};
use crate::disk::Disk;
use crate::error::Result;
use crate::inode::{INODES_PER_BLOCK, Inode, POINTERS_PER_BLOCK};
use crate::superblock::SuperBlock;

/// Prints a report of `disk`'s superblock and inode table to stdout.
///
/// Doesn't require (or check for) a mount; reads block 0 and every inode table block directly.
/// Per valid inode, the index printed is the slot's position *within its inode table block*,
/// not its global inode number. This is intentional: the report is meant to mirror the raw
/// layout of each inode table block as it's scanned, not reconstruct a global numbering.
pub fn fs_debug(disk: &mut Disk) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut raw = block::zeroed();
    disk.read(0, &mut raw)?;
    let super_block = SuperBlock::from_raw(&raw);

    writeln!(out, "SuperBlock:")?;
    writeln!(out, "    magic number is valid")?;
    writeln!(out, "    {} blocks", super_block.blocks)?;
    if super_block.inodes == 0 {
        return Ok(());
    }
    writeln!(out, "    {} inode blocks", super_block.inode_blocks)?;
    writeln!(out, "    {} inodes", super_block.inodes)?;

    for index in 1..=super_block.inode_blocks {
        let mut table_raw = block::zeroed();
        disk.read(index, &mut table_raw)?;

        for slot in 0..INODES_PER_BLOCK {
            let inode = Inode::from_bytes(&table_raw[slot * 32..(slot + 1) * 32]);
            if !inode.valid {
                continue;
            }

            writeln!(out, "Inode {slot}:")?;
            writeln!(out, "    size: {} bytes", inode.size)?;
            write!(out, "    direct blocks:")?;
            for &d in &inode.direct {
                if d != 0 {
                    write!(out, " {d}")?;
                }
            }
            writeln!(out)?;

            if inode.indirect != 0 {
                writeln!(out, "    indirect block: {}", inode.indirect)?;
                let mut pointers_raw = block::zeroed();
                disk.read(inode.indirect, &mut pointers_raw)?;
                let pointers = IndirectBlock::from_raw(&pointers_raw);

                write!(out, "    indirect data blocks:")?;
                for j in 0..POINTERS_PER_BLOCK {
                    let p = pointers.get(j);
                    if p == 0 {
                        break;
                    }
                    write!(out, " {p}")?;
                }
                writeln!(out)?;
            }
        }
    }

    Ok(())
}
