//! A disk-backed [`Filesystem`] rooted at a configured directory.
//!
//! Every path the protocol engine hands in is already an absolute
//! POSIX-style string produced by `finch_ftpd::path`; this backend joins it
//! onto [`LocalFilesystem::root`] and otherwise defers to `tokio::fs`. Mtimes
//! round-trip through the same packed FAT `(date, time)` pair the rest of
//! the engine uses, via `filetime` for the actual syscall.

use crate::error::{FsError, Result};
use crate::filesystem::{DirEntry, FileInfo, Filesystem, FreeSpace, OpenMode};
use async_trait::async_trait;
use chrono::{Datelike, TimeZone, Timelike, Utc};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// An open file plus the mode it was opened under, so `write` can reject a
/// handle opened for `Read` instead of silently truncating nothing.
pub struct LocalHandle {
    file: tokio::fs::File,
    mode: OpenMode,
}

pub struct LocalFilesystem {
    root: PathBuf,
}

impl LocalFilesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn real_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn entry_name(path: &str) -> String {
        match path.rfind('/') {
            Some(i) if i + 1 < path.len() => path[i + 1..].to_string(),
            _ => path.to_string(),
        }
    }
}

/// Packs a [`SystemTime`] into the same FAT `(date, time)` bit layout the
/// engine's `codec::FatTimestamp` uses.
fn pack_fat(t: SystemTime) -> (u16, u16) {
    let dt = chrono::DateTime::<Utc>::from(t);
    let year = dt.year().max(1980) as u32;
    let date = (((year - 1980) as u16) << 9) | ((dt.month() as u16) << 5) | dt.day() as u16;
    let time = ((dt.hour() as u16) << 11) | ((dt.minute() as u16) << 5) | (dt.second() as u16 >> 1);
    (date, time)
}

/// Inverse of [`pack_fat`], used by `set_mtime`.
fn unpack_fat(date: u16, time: u16) -> Option<SystemTime> {
    let year = 1980 + (date >> 9) as i32;
    let month = ((date >> 5) & 0xF) as u32;
    let day = (date & 0x1F) as u32;
    let hour = (time >> 11) as u32;
    let minute = ((time >> 5) & 0x3F) as u32;
    let second = ((time & 0x1F) as u32) * 2;
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .map(SystemTime::from)
}

fn to_io_err(e: std::io::Error, path: &str) -> FsError {
    match e.kind() {
        std::io::ErrorKind::NotFound => FsError::NotFound(path.to_string()),
        std::io::ErrorKind::AlreadyExists => FsError::AlreadyExists(path.to_string()),
        std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied(path.to_string()),
        _ => FsError::Io(e),
    }
}

async fn stat_real(real: &Path, name: String) -> Result<FileInfo> {
    let meta = tokio::fs::metadata(real)
        .await
        .map_err(|e| to_io_err(e, &real.to_string_lossy()))?;
    let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    let (date, time) = pack_fat(modified);
    Ok(FileInfo {
        name,
        size: meta.len(),
        date,
        time,
        is_dir: meta.is_dir(),
    })
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    type Handle = LocalHandle;

    async fn stat(&self, path: &str) -> Result<FileInfo> {
        let real = self.real_path(path);
        let name = if path == "/" { "/".to_string() } else { Self::entry_name(path) };
        stat_real(&real, name).await
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let real = self.real_path(path);
        let mut rd = tokio::fs::read_dir(&real)
            .await
            .map_err(|e| to_io_err(e, path))?;

        let mut out = Vec::new();
        while let Some(entry) = rd.next_entry().await.map_err(|e| to_io_err(e, path))? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Ok(info) = stat_real(&entry.path(), name).await {
                out.push(info);
            }
        }
        Ok(out)
    }

    async fn open(&self, path: &str, mode: OpenMode) -> Result<Self::Handle> {
        let real = self.real_path(path);
        let file = match mode {
            OpenMode::Read => tokio::fs::File::open(&real).await.map_err(|e| to_io_err(e, path))?,
            OpenMode::CreateWrite => {
                if let Some(parent) = real.parent() {
                    let _ = tokio::fs::create_dir_all(parent).await;
                }
                tokio::fs::File::create(&real).await.map_err(|e| to_io_err(e, path))?
            }
        };
        Ok(LocalHandle { file, mode })
    }

    async fn read(&self, handle: &mut Self::Handle, buf: &mut [u8]) -> Result<usize> {
        handle.file.read(buf).await.map_err(FsError::Io)
    }

    async fn write(&self, handle: &mut Self::Handle, buf: &[u8]) -> Result<usize> {
        if handle.mode != OpenMode::CreateWrite {
            return Err(FsError::PermissionDenied("handle opened read-only".to_string()));
        }
        handle.file.write_all(buf).await.map_err(FsError::Io)?;
        Ok(buf.len())
    }

    async fn close(&self, mut handle: Self::Handle) -> Result<()> {
        let _ = handle.file.flush().await;
        Ok(())
    }

    async fn unlink(&self, path: &str) -> Result<()> {
        let real = self.real_path(path);
        let meta = tokio::fs::metadata(&real).await.map_err(|e| to_io_err(e, path))?;
        if meta.is_dir() {
            let mut rd = tokio::fs::read_dir(&real).await.map_err(|e| to_io_err(e, path))?;
            if rd.next_entry().await.map_err(|e| to_io_err(e, path))?.is_some() {
                return Err(FsError::NotEmpty(path.to_string()));
            }
            tokio::fs::remove_dir(&real).await.map_err(|e| to_io_err(e, path))
        } else {
            tokio::fs::remove_file(&real).await.map_err(|e| to_io_err(e, path))
        }
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let real = self.real_path(path);
        tokio::fs::create_dir(&real).await.map_err(|e| to_io_err(e, path))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let real_from = self.real_path(from);
        let real_to = self.real_path(to);
        tokio::fs::rename(&real_from, &real_to)
            .await
            .map_err(|e| to_io_err(e, from))
    }

    async fn set_mtime(&self, path: &str, date: u16, time: u16) -> Result<()> {
        let real = self.real_path(path);
        let when = unpack_fat(date, time)
            .ok_or_else(|| FsError::Other("invalid FAT timestamp".to_string()))?;
        let ft = filetime::FileTime::from_system_time(when);
        let real = real.clone();
        tokio::task::spawn_blocking(move || filetime::set_file_mtime(&real, ft))
            .await
            .map_err(|e| FsError::Other(e.to_string()))?
            .map_err(FsError::Io)
    }

    async fn free_space(&self) -> Result<FreeSpace> {
        // No portable async statvfs in the ambient stack; report the root's
        // own size as a single "cluster" so SITE FREE still returns a
        // plausible, monotonically-decreasing-as-you-fill-it number.
        let cluster_sectors = 8u32;
        let total_clusters = 1_000_000u64;
        let used = dir_size(&self.root).await.unwrap_or(0);
        let bytes_per_cluster = cluster_sectors as u64 * FreeSpace::SECTOR_SIZE as u64;
        let used_clusters = used.div_ceil(bytes_per_cluster);
        Ok(FreeSpace {
            free_clusters: total_clusters.saturating_sub(used_clusters),
            cluster_sectors,
            total_clusters,
        })
    }
}

fn dir_size(root: &Path) -> std::pin::Pin<Box<dyn std::future::Future<Output = std::io::Result<u64>> + Send + '_>> {
    Box::pin(async move {
        let mut total = 0u64;
        let mut rd = tokio::fs::read_dir(root).await?;
        while let Some(entry) = rd.next_entry().await? {
            let meta = entry.metadata().await?;
            if meta.is_dir() {
                total += dir_size(&entry.path()).await?;
            } else {
                total += meta.len();
            }
        }
        Ok(total)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFilesystem::new(dir.path());

        let mut h = fs.open("/a.txt", OpenMode::CreateWrite).await.unwrap();
        fs.write(&mut h, b"hello").await.unwrap();
        fs.close(h).await.unwrap();

        let mut h = fs.open("/a.txt", OpenMode::Read).await.unwrap();
        let mut buf = [0u8; 16];
        let n = fs.read(&mut h, &mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[tokio::test]
    async fn read_dir_lists_children() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFilesystem::new(dir.path());
        fs.mkdir("/sub").await.unwrap();
        let mut h = fs.open("/file.bin", OpenMode::CreateWrite).await.unwrap();
        fs.write(&mut h, &[0u8; 100]).await.unwrap();
        fs.close(h).await.unwrap();

        let mut entries = fs.read_dir("/").await.unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "file.bin");
        assert_eq!(entries[0].size, 100);
        assert_eq!(entries[1].name, "sub");
        assert!(entries[1].is_dir);
    }

    #[tokio::test]
    async fn unlink_nonempty_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFilesystem::new(dir.path());
        fs.mkdir("/sub").await.unwrap();
        let mut h = fs.open("/sub/a.txt", OpenMode::CreateWrite).await.unwrap();
        fs.write(&mut h, b"x").await.unwrap();
        fs.close(h).await.unwrap();

        assert!(matches!(fs.unlink("/sub").await, Err(FsError::NotEmpty(_))));
    }

    #[tokio::test]
    async fn mtime_round_trips_through_fat_packing() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFilesystem::new(dir.path());
        let mut h = fs.open("/a.txt", OpenMode::CreateWrite).await.unwrap();
        fs.write(&mut h, b"x").await.unwrap();
        fs.close(h).await.unwrap();

        let (date, time) = (
            (((2024 - 1980) as u16) << 9) | (1 << 5) | 15,
            (10 << 11) | (30 << 5) | 0,
        );
        fs.set_mtime("/a.txt", date, time).await.unwrap();
        let info = fs.stat("/a.txt").await.unwrap();
        assert_eq!(info.date, date);
        assert_eq!(info.time, time);
    }
}
