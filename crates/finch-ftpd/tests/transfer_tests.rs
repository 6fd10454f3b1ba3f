mod common;

use async_trait::async_trait;
use common::{free_port, spawn_session, test_config, LineReader};
use finch_ftpd_core::{DirEntry, FileInfo, FreeSpace, FsError, OpenMode, Result};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Records the length of every `write` call so the STOR buffering
/// invariant (full-buffer writes, single final flush) can be checked
/// directly instead of inferred from total bytes alone.
#[derive(Default)]
struct RecordingFilesystem {
    content: Mutex<Vec<u8>>,
    write_sizes: Mutex<Vec<usize>>,
}

pub struct RecordingHandle;

#[async_trait]
impl finch_ftpd_core::Filesystem for RecordingFilesystem {
    type Handle = RecordingHandle;

    async fn stat(&self, _path: &str) -> Result<FileInfo> {
        Err(FsError::NotFound("unused".to_string()))
    }

    async fn read_dir(&self, _path: &str) -> Result<Vec<DirEntry>> {
        Ok(Vec::new())
    }

    async fn open(&self, _path: &str, _mode: OpenMode) -> Result<Self::Handle> {
        Ok(RecordingHandle)
    }

    async fn read(&self, _handle: &mut Self::Handle, _buf: &mut [u8]) -> Result<usize> {
        Ok(0)
    }

    async fn write(&self, _handle: &mut Self::Handle, buf: &[u8]) -> Result<usize> {
        self.content.lock().unwrap().extend_from_slice(buf);
        self.write_sizes.lock().unwrap().push(buf.len());
        Ok(buf.len())
    }

    async fn close(&self, _handle: Self::Handle) -> Result<()> {
        Ok(())
    }

    async fn unlink(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    async fn mkdir(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    async fn rename(&self, _from: &str, _to: &str) -> Result<()> {
        Ok(())
    }

    async fn set_mtime(&self, _path: &str, _date: u16, _time: u16) -> Result<()> {
        Ok(())
    }

    async fn free_space(&self) -> Result<FreeSpace> {
        Ok(FreeSpace {
            free_clusters: 0,
            cluster_sectors: 8,
            total_clusters: 0,
        })
    }
}

async fn login(reader: &mut LineReader) {
    assert!(reader.read_line().await.starts_with("220"));
    reader.write_line("USER user").await;
    assert!(reader.read_line().await.starts_with("331"));
    reader.write_line("PASS pass").await;
    assert!(reader.read_line().await.starts_with("230"));
}

#[tokio::test]
async fn s3_upload_33kib_writes_in_two_buffer_sized_chunks() {
    let control_data_port = free_port().await;
    let fs = Arc::new(RecordingFilesystem::default());

    let stream = spawn_session(test_config(control_data_port), fs.clone()).await;
    let mut reader = LineReader::new(stream);
    login(&mut reader).await;

    reader.write_line("PASV").await;
    let pasv_reply = reader.read_line().await;
    assert!(pasv_reply.starts_with("227"));

    let mut data = TcpStream::connect(("127.0.0.1", control_data_port)).await.unwrap();

    reader.write_line("STOR x.bin").await;
    assert!(reader.read_line().await.starts_with("150"));

    let payload = vec![0xABu8; 33792]; // 32 KiB + 1 KiB, per the default 32 KiB buffer
    data.write_all(&payload).await.unwrap();
    data.shutdown().await.unwrap();

    assert_eq!(reader.read_line().await, "226 File successfully transferred");

    let sizes = fs.write_sizes.lock().unwrap().clone();
    assert_eq!(sizes, vec![32768, 1024]);
    assert_eq!(fs.content.lock().unwrap().len(), 33792);
}
