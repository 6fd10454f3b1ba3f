//! RETR / STOR — bulk file transfer over the data channel.

use crate::session::{CmdOutcome, Session};
use finch_ftpd_core::{Filesystem, OpenMode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use std::time::Duration;

/// Typical Ethernet-path TCP maximum segment size; bounds the per-iteration
/// read-from-file chunk alongside the transfer buffer's own capacity.
const TCP_MSS: usize = 1460;

/// Size of the scratch buffer used to pull bytes off the data socket during
/// STOR, independent of the file-side transfer buffer's sector alignment.
const RECV_CHUNK: usize = 8192;

pub async fn retr<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    let Some(path) = session.resolve_path(&session.args.clone()) else {
        return session.write_reply(550, "Path too long").await;
    };

    let info = match session.shared.fs.stat(&path).await {
        Ok(info) if !info.is_dir => info,
        _ => return session.write_reply(550, "No such file or directory").await,
    };

    let handle = match session.shared.fs.open(&path, OpenMode::Read).await {
        Ok(h) => h,
        Err(_) => return session.write_reply(550, "Failed to open file").await,
    };
    session.open_file = Some(handle);

    let outcome = session
        .write_reply(150, &format!("Opening data connection for {} ({} bytes)", path, info.size))
        .await;
    if outcome != CmdOutcome::Ok {
        close_file(session).await;
        return outcome;
    }

    if session.open_data_socket().await.is_err() {
        close_file(session).await;
        session.data.data_close();
        return session.write_reply(425, "Cannot open data connection").await;
    }

    let chunk_len = TCP_MSS.min(session.buffer.capacity());
    let mut read_failed = false;
    let mut write_failed = false;

    loop {
        let n = {
            let Some(handle) = session.open_file.as_mut() else {
                break;
            };
            let buf = &mut session.buffer.as_mut_slice()[..chunk_len];
            match session.shared.fs.read(handle, buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(_) => {
                    read_failed = true;
                    break;
                }
            }
        };

        let chunk = session.buffer.as_mut_slice()[..n].to_vec();
        let Some(socket) = session.data.socket_mut() else {
            write_failed = true;
            break;
        };
        if socket.write_all(&chunk).await.is_err() {
            write_failed = true;
            break;
        }
    }

    close_file(session).await;
    session.data.data_close();

    if read_failed {
        session.shared.stats.file_sent_fail();
        session.write_reply(451, "Local error reading file").await
    } else if write_failed {
        session.shared.stats.file_sent_fail();
        session.write_reply(426, "Connection closed; transfer aborted").await
    } else {
        session.shared.stats.file_sent_ok();
        session.write_reply(226, "File successfully transferred").await
    }
}

async fn close_file<F: Filesystem>(session: &mut Session<F>) {
    if let Some(handle) = session.open_file.take() {
        let _ = session.shared.fs.close(handle).await;
    }
}

pub async fn stor<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    let Some(path) = session.resolve_path(&session.args.clone()) else {
        return session.write_reply(553, "Path too long").await;
    };

    let handle = match session.shared.fs.open(&path, OpenMode::CreateWrite).await {
        Ok(h) => h,
        Err(_) => return session.write_reply(550, "Failed to create file").await,
    };
    session.open_file = Some(handle);

    let outcome = session
        .write_reply(150, &format!("Connected to port {}", session.data_port))
        .await;
    if outcome != CmdOutcome::Ok {
        close_file(session).await;
        return outcome;
    }

    if session.open_data_socket().await.is_err() {
        close_file(session).await;
        session.data.data_close();
        return session.write_reply(425, "Cannot open data connection").await;
    }

    let recv_timeout = Duration::from_millis(session.shared.config.stor_recv_timeout_ms);
    let cap = session.buffer.capacity();
    let mut fill: usize = 0;
    let mut failed = false;

    'recv: loop {
        let mut recv_buf = [0u8; RECV_CHUNK];
        let read = {
            let Some(socket) = session.data.socket_mut() else {
                failed = true;
                break;
            };
            timeout(recv_timeout, socket.read(&mut recv_buf)).await
        };

        let n = match read {
            Ok(Ok(0)) => break, // peer closed: end of stream
            Ok(Ok(n)) => n,
            Ok(Err(_)) | Err(_) => {
                failed = true;
                break;
            }
        };

        let mut segment = &recv_buf[..n];

        if segment.len() >= cap {
            if fill > 0 && !flush(session, &mut fill).await {
                failed = true;
                break 'recv;
            }
            if !write_all_to_file(session, segment).await {
                failed = true;
                break 'recv;
            }
            continue;
        }

        while !segment.is_empty() {
            let space = cap - fill;
            let take = space.min(segment.len());
            session.buffer.as_mut_slice()[fill..fill + take].copy_from_slice(&segment[..take]);
            fill += take;
            segment = &segment[take..];
            if fill == cap && !flush(session, &mut fill).await {
                failed = true;
                break 'recv;
            }
        }
    }

    if !failed && fill > 0 && !flush(session, &mut fill).await {
        failed = true;
    }

    session.data.data_close();
    close_file(session).await;

    if failed {
        session.shared.stats.file_received_fail();
        session.write_reply(426, "Connection closed; transfer aborted").await
    } else {
        session.shared.stats.file_received_ok();
        session.write_reply(226, "File successfully transferred").await
    }
}

/// Writes `buffer[..*fill]` to the open file and resets `*fill` to zero.
async fn flush<F: Filesystem>(session: &mut Session<F>, fill: &mut usize) -> bool {
    let data = session.buffer.as_mut_slice()[..*fill].to_vec();
    *fill = 0;
    write_all_to_file(session, &data).await
}

/// Writes `data` to the currently open file handle; a short write is a hard
/// error.
async fn write_all_to_file<F: Filesystem>(session: &mut Session<F>, data: &[u8]) -> bool {
    let Some(handle) = session.open_file.as_mut() else {
        return false;
    };
    matches!(session.shared.fs.write(handle, data).await, Ok(n) if n == data.len())
}
