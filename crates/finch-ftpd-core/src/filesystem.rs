//! The filesystem collaborator contract.
//!
//! The FTP engine never touches `std::fs` directly: every DELE/RETR/STOR/LIST
//! etc. handler goes through this trait, so the filesystem is a pluggable,
//! block-addressable backend (FAT-family embedded filesystems included)
//! rather than an assumption baked into the protocol engine.
//!
//! The trait uses an associated `Handle` type rather than a boxed trait
//! object so that a concrete backend is selected once, at compile time, via
//! a generic parameter on the session/supervisor types — no per-call
//! dynamic dispatch on the hot transfer path.

use crate::error::Result;
use async_trait::async_trait;

/// Directory or file metadata as returned by `stat`/`read_dir`.
///
/// Timestamps are packed FAT `(date, time)` pairs — see
/// `finch_ftpd::codec::mdtm` for the bit layout — so that a FAT-backed
/// implementation can hand these through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub date: u16,
    pub time: u16,
    pub is_dir: bool,
}

/// Alias kept distinct from [`FileInfo`] at the call site even though the
/// shape is identical to a directory-listing entry.
pub type DirEntry = FileInfo;

/// How a file is opened. Only read, or create-always+write, are needed;
/// there is no append or read/write mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    CreateWrite,
}

/// `getfree()` result: FAT-style cluster accounting (SITE FREE divides by
/// 2048 assuming 512-byte sectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeSpace {
    pub free_clusters: u64,
    pub cluster_sectors: u32,
    pub total_clusters: u64,
}

impl FreeSpace {
    /// Sector size assumed by the `SITE FREE` arithmetic.
    pub const SECTOR_SIZE: u32 = 512;

    /// Free space in megabytes, per `SITE FREE`: `free_clusters *
    /// cluster_sectors / 2048` (2048 = 1 MiB / 512-byte sector).
    pub fn free_mb(&self) -> u64 {
        self.free_clusters * self.cluster_sectors as u64 / 2048
    }

    /// Total capacity in megabytes, same arithmetic as [`Self::free_mb`].
    pub fn total_mb(&self) -> u64 {
        self.total_clusters * self.cluster_sectors as u64 / 2048
    }
}

/// The pluggable filesystem backend the FTP engine is brokered against.
///
/// All operations are fallible; short reads are permitted (a `read` that
/// returns fewer bytes than the buffer is not EOF — only a `read` returning
/// `Ok(0)` is), but a `write` that persists fewer bytes than requested is
/// reported as an error by implementations.
#[async_trait]
pub trait Filesystem: Send + Sync + 'static {
    /// Backend-specific open-file token.
    type Handle: Send + 'static;

    async fn stat(&self, path: &str) -> Result<FileInfo>;

    /// Lists one directory. Collected eagerly rather than streamed — the
    /// classic `opendir`/`readdir`/`closedir` triad collapses naturally into
    /// one call once the backend isn't embedded C iterating a fixed-size
    /// scratch struct.
    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>>;

    async fn open(&self, path: &str, mode: OpenMode) -> Result<Self::Handle>;

    /// Reads into `buf`, returning the number of bytes read. `Ok(0)` is EOF.
    async fn read(&self, handle: &mut Self::Handle, buf: &mut [u8]) -> Result<usize>;

    /// Writes all of `buf`. Returns the number of bytes written; a returned
    /// count short of `buf.len()` is treated by callers as a hard error.
    async fn write(&self, handle: &mut Self::Handle, buf: &[u8]) -> Result<usize>;

    async fn close(&self, handle: Self::Handle) -> Result<()>;

    /// Removes a file, or an empty directory (same call for both).
    async fn unlink(&self, path: &str) -> Result<()>;

    async fn mkdir(&self, path: &str) -> Result<()>;

    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Sets modification time from a packed FAT `(date, time)` pair.
    async fn set_mtime(&self, path: &str, date: u16, time: u16) -> Result<()>;

    async fn free_space(&self) -> Result<FreeSpace>;
}
