//! An in-memory [`Filesystem`] used by the test suite so that protocol tests
//! never touch the real disk — a fixture-free double fits naturally here
//! since the filesystem is an explicit pluggable collaborator.

use crate::error::{FsError, Result};
use crate::filesystem::{DirEntry, FileInfo, Filesystem, FreeSpace, OpenMode};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, date: u16, time: u16 },
    Dir,
}

/// A handle into the in-memory tree: the path plus a read/write cursor.
pub struct MemHandle {
    path: String,
    mode: OpenMode,
    cursor: usize,
}

/// `HashMap`-backed tree filesystem. Paths are full POSIX-style strings
/// (`"/a/b.txt"`) as produced by `finch_ftpd::path`; this backend does no
/// normalization of its own.
pub struct MemFilesystem {
    nodes: Mutex<BTreeMap<String, Node>>,
    total_clusters: u64,
    cluster_sectors: u32,
}

impl MemFilesystem {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir);
        Self {
            nodes: Mutex::new(nodes),
            total_clusters: 1_000_000,
            cluster_sectors: 8,
        }
    }

    /// Seeds a file directly, for test setup.
    pub fn put_file(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.nodes.lock().unwrap().insert(
            path.to_string(),
            Node::File {
                data: data.into(),
                date: 0,
                time: 0,
            },
        );
    }

    /// Seeds a directory directly, for test setup.
    pub fn put_dir(&self, path: &str) {
        self.nodes.lock().unwrap().insert(path.to_string(), Node::Dir);
    }

    fn parent_and_name(path: &str) -> (&str, &str) {
        match path.rfind('/') {
            Some(0) => ("/", &path[1..]),
            Some(i) => (&path[..i], &path[i + 1..]),
            None => ("/", path),
        }
    }
}

impl Default for MemFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Filesystem for MemFilesystem {
    type Handle = MemHandle;

    async fn stat(&self, path: &str) -> Result<FileInfo> {
        let nodes = self.nodes.lock().unwrap();
        let node = nodes.get(path).ok_or_else(|| FsError::NotFound(path.to_string()))?;
        let (_, name) = Self::parent_and_name(path);
        Ok(match node {
            Node::File { data, date, time } => FileInfo {
                name: name.to_string(),
                size: data.len() as u64,
                date: *date,
                time: *time,
                is_dir: false,
            },
            Node::Dir => FileInfo {
                name: name.to_string(),
                size: 0,
                date: 0,
                time: 0,
                is_dir: true,
            },
        })
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let nodes = self.nodes.lock().unwrap();
        if !matches!(nodes.get(path), Some(Node::Dir)) {
            return Err(FsError::NotADirectory(path.to_string()));
        }
        let prefix = if path == "/" {
            "/".to_string()
        } else {
            format!("{path}/")
        };
        let mut out = Vec::new();
        for (child_path, node) in nodes.iter() {
            if child_path == path {
                continue;
            }
            if let Some(rest) = child_path.strip_prefix(&prefix) {
                if rest.is_empty() || rest.contains('/') {
                    continue; // not a direct child
                }
                out.push(match node {
                    Node::File { data, date, time } => FileInfo {
                        name: rest.to_string(),
                        size: data.len() as u64,
                        date: *date,
                        time: *time,
                        is_dir: false,
                    },
                    Node::Dir => FileInfo {
                        name: rest.to_string(),
                        size: 0,
                        date: 0,
                        time: 0,
                        is_dir: true,
                    },
                });
            }
        }
        Ok(out)
    }

    async fn open(&self, path: &str, mode: OpenMode) -> Result<Self::Handle> {
        let mut nodes = self.nodes.lock().unwrap();
        match mode {
            OpenMode::Read => {
                if !matches!(nodes.get(path), Some(Node::File { .. })) {
                    return Err(FsError::NotFound(path.to_string()));
                }
            }
            OpenMode::CreateWrite => {
                nodes.insert(
                    path.to_string(),
                    Node::File {
                        data: Vec::new(),
                        date: 0,
                        time: 0,
                    },
                );
            }
        }
        Ok(MemHandle {
            path: path.to_string(),
            mode,
            cursor: 0,
        })
    }

    async fn read(&self, handle: &mut Self::Handle, buf: &mut [u8]) -> Result<usize> {
        let nodes = self.nodes.lock().unwrap();
        let Some(Node::File { data, .. }) = nodes.get(&handle.path) else {
            return Err(FsError::NotFound(handle.path.clone()));
        };
        let remaining = data.len().saturating_sub(handle.cursor);
        let n = remaining.min(buf.len());
        buf[..n].copy_from_slice(&data[handle.cursor..handle.cursor + n]);
        handle.cursor += n;
        Ok(n)
    }

    async fn write(&self, handle: &mut Self::Handle, buf: &[u8]) -> Result<usize> {
        if handle.mode != OpenMode::CreateWrite {
            return Err(FsError::PermissionDenied(handle.path.clone()));
        }
        let mut nodes = self.nodes.lock().unwrap();
        let Some(Node::File { data, .. }) = nodes.get_mut(&handle.path) else {
            return Err(FsError::NotFound(handle.path.clone()));
        };
        data.extend_from_slice(buf);
        handle.cursor += buf.len();
        Ok(buf.len())
    }

    async fn close(&self, _handle: Self::Handle) -> Result<()> {
        Ok(())
    }

    async fn unlink(&self, path: &str) -> Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        if let Some(Node::Dir) = nodes.get(path) {
            let prefix = format!("{path}/");
            if nodes.keys().any(|k| k.starts_with(&prefix)) {
                return Err(FsError::NotEmpty(path.to_string()));
            }
        }
        nodes
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        if nodes.contains_key(path) {
            return Err(FsError::AlreadyExists(path.to_string()));
        }
        nodes.insert(path.to_string(), Node::Dir);
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        let node = nodes
            .remove(from)
            .ok_or_else(|| FsError::NotFound(from.to_string()))?;
        nodes.insert(to.to_string(), node);
        Ok(())
    }

    async fn set_mtime(&self, path: &str, new_date: u16, new_time: u16) -> Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        match nodes.get_mut(path) {
            Some(Node::File { date, time, .. }) => {
                *date = new_date;
                *time = new_time;
                Ok(())
            }
            Some(Node::Dir) => Err(FsError::NotADirectory(path.to_string())),
            None => Err(FsError::NotFound(path.to_string())),
        }
    }

    async fn free_space(&self) -> Result<FreeSpace> {
        let used: u64 = self
            .nodes
            .lock()
            .unwrap()
            .values()
            .map(|n| match n {
                Node::File { data, .. } => data.len() as u64,
                Node::Dir => 0,
            })
            .sum();
        let bytes_per_cluster = self.cluster_sectors as u64 * FreeSpace::SECTOR_SIZE as u64;
        let used_clusters = used.div_ceil(bytes_per_cluster);
        Ok(FreeSpace {
            free_clusters: self.total_clusters.saturating_sub(used_clusters),
            cluster_sectors: self.cluster_sectors,
            total_clusters: self.total_clusters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let fs = MemFilesystem::new();
        let mut h = fs.open("/a.txt", OpenMode::CreateWrite).await.unwrap();
        fs.write(&mut h, b"hello").await.unwrap();
        fs.close(h).await.unwrap();

        let mut h = fs.open("/a.txt", OpenMode::Read).await.unwrap();
        let mut buf = [0u8; 16];
        let n = fs.read(&mut h, &mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[tokio::test]
    async fn read_dir_lists_direct_children_only() {
        let fs = MemFilesystem::new();
        fs.put_dir("/sub");
        fs.put_file("/file.bin", vec![0u8; 100]);
        fs.put_file("/sub/nested.txt", vec![]);

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
        let fs = MemFilesystem::new();
        fs.put_dir("/sub");
        fs.put_file("/sub/a.txt", vec![]);
        assert!(matches!(fs.unlink("/sub").await, Err(FsError::NotEmpty(_))));
    }
}
