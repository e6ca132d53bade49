//! End-to-end scenarios driving `simplefs` against real temporary disk images.

use simplefs::{Disk, Error, FileSystem};

fn disk_path(dir: &tempfile::TempDir) -> std::path::PathBuf {
    dir.path().join("disk.img")
}

#[test]
fn format_mount_unmount_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = disk_path(&dir);

    let mut disk = Disk::open(&path, 10).unwrap();
    let mut fs = FileSystem::new();
    fs.format(&mut disk).unwrap();
    fs.mount(disk).unwrap();
    assert!(fs.is_mounted());

    let disk = fs.unmount().unwrap();
    assert!(!fs.is_mounted());
    assert_eq!(disk.blocks(), 10);
}

#[test]
fn debug_reports_superblock_without_mounting() {
    let dir = tempfile::tempdir().unwrap();
    let path = disk_path(&dir);

    let mut disk = Disk::open(&path, 10).unwrap();
    let mut fs = FileSystem::new();
    fs.format(&mut disk).unwrap();

    simplefs::debug::fs_debug(&mut disk).unwrap();
}

#[test]
fn create_stat_remove_then_recreate_reuses_slot() {
    let dir = tempfile::tempdir().unwrap();
    let path = disk_path(&dir);

    let mut disk = Disk::open(&path, 10).unwrap();
    let mut fs = FileSystem::new();
    fs.format(&mut disk).unwrap();
    fs.mount(disk).unwrap();

    assert_eq!(fs.create().unwrap(), 0);
    assert_eq!(fs.create().unwrap(), 1);
    assert_eq!(fs.stat(0).unwrap(), 0);

    fs.remove(0).unwrap();
    assert!(matches!(fs.stat(0), Err(Error::InvalidInode)));

    assert_eq!(fs.create().unwrap(), 0);
}

#[test]
fn write_then_read_small_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = disk_path(&dir);

    let mut disk = Disk::open(&path, 10).unwrap();
    let mut fs = FileSystem::new();
    fs.format(&mut disk).unwrap();
    fs.mount(disk).unwrap();

    let inode = fs.create().unwrap();
    assert_eq!(fs.write(inode, b"hello", 0).unwrap(), 5);
    assert_eq!(fs.stat(inode).unwrap(), 5);

    let mut buf = [0u8; 5];
    assert_eq!(fs.read(inode, &mut buf, 0).unwrap(), 5);
    assert_eq!(&buf, b"hello");
}

#[test]
fn filling_exactly_the_direct_pointers_never_touches_indirect_block() {
    const BLOCK_SIZE: usize = simplefs::BLOCK_SIZE;

    let dir = tempfile::tempdir().unwrap();
    let path = disk_path(&dir);

    let mut disk = Disk::open(&path, 200).unwrap();
    let mut fs = FileSystem::new();
    fs.format(&mut disk).unwrap();
    fs.mount(disk).unwrap();

    let inode = fs.create().unwrap();
    let payload = vec![0x5au8; 5 * BLOCK_SIZE];
    let written = fs.write(inode, &payload, 0).unwrap();

    assert_eq!(written, payload.len());
    assert_eq!(fs.stat(inode).unwrap() as usize, 5 * BLOCK_SIZE);

    let mut out = vec![0u8; payload.len()];
    assert_eq!(fs.read(inode, &mut out, 0).unwrap(), payload.len());
    assert_eq!(out, payload);
}

#[test]
fn spilling_past_direct_pointers_allocates_and_round_trips_through_indirect_block() {
    const BLOCK_SIZE: usize = simplefs::BLOCK_SIZE;

    let dir = tempfile::tempdir().unwrap();
    let path = disk_path(&dir);

    let mut disk = Disk::open(&path, 200).unwrap();
    let mut fs = FileSystem::new();
    fs.format(&mut disk).unwrap();
    fs.mount(disk).unwrap();

    let inode = fs.create().unwrap();
    let payload = vec![0xa5u8; 6 * BLOCK_SIZE];
    let written = fs.write(inode, &payload, 0).unwrap();
    assert_eq!(written, payload.len());

    let mut out = vec![0u8; payload.len()];
    assert_eq!(fs.read(inode, &mut out, 0).unwrap(), payload.len());
    assert_eq!(out, payload);
}

#[test]
fn allocator_exhaustion_during_write_persists_the_partial_result() {
    const BLOCK_SIZE: usize = simplefs::BLOCK_SIZE;

    let dir = tempfile::tempdir().unwrap();
    let path = disk_path(&dir);

    let mut disk = Disk::open(&path, 4).unwrap();
    let mut fs = FileSystem::new();
    fs.format(&mut disk).unwrap();
    fs.mount(disk).unwrap();

    let inode = fs.create().unwrap();
    let payload = vec![0x11u8; 8 * BLOCK_SIZE];
    let written = fs.write(inode, &payload, 0).unwrap();

    assert!(written > 0);
    assert!(written < payload.len());
    assert_eq!(fs.stat(inode).unwrap() as usize, written);

    let mut out = vec![0u8; written];
    assert_eq!(fs.read(inode, &mut out, 0).unwrap(), written);
    assert_eq!(out, payload[..written]);
}

#[test]
fn remounting_reconstructs_a_bitmap_consistent_with_the_inode_table() {
    const BLOCK_SIZE: usize = simplefs::BLOCK_SIZE;

    let dir = tempfile::tempdir().unwrap();
    let path = disk_path(&dir);

    let mut disk = Disk::open(&path, 50).unwrap();
    let mut fs = FileSystem::new();
    fs.format(&mut disk).unwrap();
    fs.mount(disk).unwrap();

    let a = fs.create().unwrap();
    fs.write(a, &[1u8; 2 * BLOCK_SIZE], 0).unwrap();
    let b = fs.create().unwrap();
    fs.write(b, &[2u8; 7 * BLOCK_SIZE], 0).unwrap();

    let disk = fs.unmount().unwrap();

    let mut fs2 = FileSystem::new();
    fs2.mount(disk).unwrap();

    assert_eq!(fs2.stat(a).unwrap() as usize, 2 * BLOCK_SIZE);
    assert_eq!(fs2.stat(b).unwrap() as usize, 7 * BLOCK_SIZE);

    let mut out_a = vec![0u8; 2 * BLOCK_SIZE];
    fs2.read(a, &mut out_a, 0).unwrap();
    assert!(out_a.iter().all(|&b| b == 1));

    let mut out_b = vec![0u8; 7 * BLOCK_SIZE];
    fs2.read(b, &mut out_b, 0).unwrap();
    assert!(out_b.iter().all(|&b| b == 2));
}

#[test]
fn mounting_an_unformatted_disk_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = disk_path(&dir);

    let disk = Disk::open(&path, 10).unwrap();
    let mut fs = FileSystem::new();
    assert!(matches!(fs.mount(disk), Err(Error::InvalidSuperblock)));
}

#[test]
fn mounting_twice_into_the_same_handle_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = disk_path(&dir);

    let mut disk_a = Disk::open(&path, 10).unwrap();
    let mut fs = FileSystem::new();
    fs.format(&mut disk_a).unwrap();
    fs.mount(disk_a).unwrap();

    let dir_b = tempfile::tempdir().unwrap();
    let path_b = disk_path(&dir_b);
    let disk_b = Disk::open(&path_b, 10).unwrap();
    assert!(matches!(fs.mount(disk_b), Err(Error::AlreadyMounted)));
}
