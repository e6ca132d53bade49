//! Error type shared by the disk and filesystem layers.

use std::fmt;
use std::io;

/// Errors produced by [`crate::disk::Disk`] and [`crate::fs::FileSystem`] operations.
#[derive(Debug)]
pub enum Error {
    /// A caller-supplied argument violated a precondition (out-of-range block number,
    /// wrong-size buffer, ...).
    BadArgs,
    /// A host I/O operation (open, seek, read, write) failed.
    Io(io::Error),
    /// The operation requires a mounted filesystem, but none is mounted.
    NotMounted,
    /// [`FileSystem::mount`](crate::fs::FileSystem::mount) or
    /// [`FileSystem::format`](crate::fs::FileSystem::format) was called on a handle that is
    /// already mounted.
    AlreadyMounted,
    /// The superblock read from disk failed validation.
    InvalidSuperblock,
    /// The inode number is out of range, or its slot is not currently valid.
    InvalidInode,
    /// The inode table has no free slot left.
    NoFreeInode,
    /// The free-block bitmap has no free block left.
    NoSpace,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadArgs => write!(f, "invalid argument"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::NotMounted => write!(f, "filesystem is not mounted"),
            Self::AlreadyMounted => write!(f, "filesystem is already mounted"),
            Self::InvalidSuperblock => write!(f, "invalid superblock"),
            Self::InvalidInode => write!(f, "invalid inode number"),
            Self::NoFreeInode => write!(f, "no free inode"),
            Self::NoSpace => write!(f, "no free block"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
