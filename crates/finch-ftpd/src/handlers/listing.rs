//! LIST / NLST / MLSD — directory listings streamed on the data channel.

use crate::codec::FatTimestamp;
use crate::session::{CmdOutcome, Session};
use finch_ftpd_core::{DirEntry, Filesystem};
use tokio::io::AsyncWriteExt;

fn eplf_line(entry: &DirEntry) -> String {
    if entry.is_dir {
        format!("+/,\t{}\r\n", entry.name)
    } else {
        format!("+r,s{},\t{}\r\n", entry.size, entry.name)
    }
}

fn mlsd_line(entry: &DirEntry) -> String {
    let ts = FatTimestamp {
        date: entry.date,
        time: entry.time,
    };
    let kind = if entry.is_dir { "dir" } else { "file" };
    format!(
        "Type={kind};Size={};Modify={}; {}\r\n",
        entry.size,
        ts.format(),
        entry.name
    )
}

/// Shared streaming body for LIST/NLST/MLSD: opens the data socket, writes
/// one formatted line per entry, closes the data socket, and replies.
async fn stream_listing<F: Filesystem>(
    session: &mut Session<F>,
    format_line: impl Fn(&DirEntry) -> String,
    final_reply: &str,
) -> CmdOutcome {
    let path = session.cwd.clone();
    let mut entries = match session.shared.fs.read_dir(&path).await {
        Ok(entries) => entries,
        Err(_) => return session.write_reply(550, "Failed to list directory").await,
    };
    // Directories first, backend order within each group: readdir order on
    // the original media is not reproducible over a generic `Filesystem`
    // backend, but every known client tolerates a stable directories-first
    // split.
    entries.sort_by_key(|e| !e.is_dir);

    let outcome = session.write_reply(150, "Opening data connection").await;
    if outcome != CmdOutcome::Ok {
        return outcome;
    }

    if session.open_data_socket().await.is_err() {
        session.data.data_close();
        return session.write_reply(425, "Cannot open data connection").await;
    }

    let mut failed = false;
    {
        let Some(socket) = session.data.socket_mut() else {
            return session.write_reply(425, "Cannot open data connection").await;
        };
        for entry in &entries {
            let line = format_line(entry);
            if socket.write_all(line.as_bytes()).await.is_err() {
                failed = true;
                break;
            }
        }
    }
    session.data.data_close();

    if failed {
        session.write_reply(426, "Connection closed; transfer aborted").await
    } else {
        session.write_reply(226, final_reply).await
    }
}

/// Emits `+r,s<size>,\t<name>` for files and `+/,\t<name>` for directories —
/// an EPLF-like form, returned from the verb literally named `LIST`.
pub async fn list<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    stream_listing(session, eplf_line, "Directory send OK.").await
}

/// Bare names only, one per line.
pub async fn nlst<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    stream_listing(
        session,
        |entry| format!("{}\r\n", entry.name),
        "Directory send OK.",
    )
    .await
}

pub async fn mlsd<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    stream_listing(session, mlsd_line, "MLSD listing complete.").await
}
