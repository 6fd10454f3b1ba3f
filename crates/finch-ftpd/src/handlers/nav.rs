//! PWD / CWD / CDUP — working-directory navigation.

use crate::path;
use crate::session::{CmdOutcome, Session};
use finch_ftpd_core::Filesystem;

pub async fn pwd<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    let cwd = session.cwd.clone();
    session.write_reply(257, &format!("\"{cwd}\" is your current directory")).await
}

pub async fn cwd<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    let Some(target) = session.resolve_path(&session.args.clone()) else {
        return session.write_reply(550, "Path too long").await;
    };

    if target == "/" {
        session.cwd = target;
        return session.write_reply(250, "Directory changed to /").await;
    }

    match session.shared.fs.stat(&target).await {
        Ok(info) if info.is_dir => {
            session.cwd = target;
            session.write_reply(250, "Directory changed").await
        }
        Ok(_) => session.write_reply(550, "Not a directory").await,
        Err(_) => session.write_reply(550, "No such directory").await,
    }
}

/// Hard-resets `cwd` to `/` rather than stepping up one level, preserving the
/// source's behavior even though it departs from RFC 959.
pub async fn cdup<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    session.cwd = "/".to_string();
    session.write_reply(250, "Directory changed to /").await
}
