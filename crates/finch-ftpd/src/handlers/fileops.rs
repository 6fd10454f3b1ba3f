//! DELE / MKD / RMD / RNFR / RNTO / MDTM / SIZE — metadata and namespace
//! operations that don't need a data channel.

use crate::codec;
use crate::session::{CmdOutcome, Session};
use finch_ftpd_core::Filesystem;

pub async fn dele<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    let Some(path) = session.resolve_path(&session.args.clone()) else {
        return session.write_reply(550, "Path too long").await;
    };
    match session.shared.fs.unlink(&path).await {
        Ok(()) => session.write_reply(250, "File deleted").await,
        Err(_) => session.write_reply(450, "File unavailable").await,
    }
}

pub async fn mkd<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    let Some(path) = session.resolve_path(&session.args.clone()) else {
        return session.write_reply(550, "Path too long").await;
    };
    match session.shared.fs.mkdir(&path).await {
        Ok(()) => session.write_reply(257, &format!("\"{path}\" directory created")).await,
        Err(finch_ftpd_core::FsError::AlreadyExists(_)) => {
            session.write_reply(521, "Directory already exists").await
        }
        Err(_) => session.write_reply(550, "Failed to create directory").await,
    }
}

pub async fn rmd<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    let Some(path) = session.resolve_path(&session.args.clone()) else {
        return session.write_reply(550, "Path too long").await;
    };
    match session.shared.fs.unlink(&path).await {
        Ok(()) => session.write_reply(250, "Directory removed").await,
        Err(finch_ftpd_core::FsError::NotEmpty(_)) => {
            session.write_reply(501, "Directory not empty").await
        }
        Err(_) => session.write_reply(550, "Failed to remove directory").await,
    }
}

pub async fn rnfr<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    let Some(path) = session.resolve_path(&session.args.clone()) else {
        return session.write_reply(550, "Path too long").await;
    };
    match session.shared.fs.stat(&path).await {
        Ok(_) => {
            session.rename_from = Some(path);
            session.write_reply(350, "Ready for RNTO").await
        }
        Err(_) => session.write_reply(550, "No such file or directory").await,
    }
}

pub async fn rnto<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    let Some(from) = session.rename_from.take() else {
        return session.write_reply(503, "Need RNFR before RNTO").await;
    };
    let Some(to) = session.resolve_path(&session.args.clone()) else {
        return session.write_reply(553, "Path too long").await;
    };
    match session.shared.fs.rename(&from, &to).await {
        Ok(()) => session.write_reply(250, "File successfully renamed or moved").await,
        Err(_) => session.write_reply(451, "Rename failed").await,
    }
}

pub async fn mdtm<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    let args = session.args.clone();
    if let Some((ts, filename)) = codec::parse_mdtm(&args) {
        let Some(path) = session.resolve_path(filename) else {
            return session.write_reply(550, "Path too long").await;
        };
        return match session.shared.fs.set_mtime(&path, ts.date, ts.time).await {
            Ok(()) => session.write_reply(200, "Ok").await,
            Err(_) => session.write_reply(550, "No such file or directory").await,
        };
    }

    let Some(path) = session.resolve_path(&args) else {
        return session.write_reply(550, "Path too long").await;
    };
    match session.shared.fs.stat(&path).await {
        Ok(info) => {
            let ts = codec::FatTimestamp {
                date: info.date,
                time: info.time,
            };
            session.write_reply(213, &ts.format()).await
        }
        Err(_) => session.write_reply(550, "No such file or directory").await,
    }
}

pub async fn size<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    let Some(path) = session.resolve_path(&session.args.clone()) else {
        return session.write_reply(550, "Path too long").await;
    };
    match session.shared.fs.stat(&path).await {
        Ok(info) if !info.is_dir => session.write_reply(213, &info.size.to_string()).await,
        Ok(_) => session.write_reply(550, "Not a plain file").await,
        Err(_) => session.write_reply(550, "No such file or directory").await,
    }
}
