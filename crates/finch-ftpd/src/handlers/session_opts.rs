//! TYPE / STRU / MODE / NOOP / SYST / STAT / SITE / FEAT — session options
//! and informational verbs that don't touch the filesystem or data channel.

use crate::session::{CmdOutcome, Session};
use finch_ftpd_core::Filesystem;

pub async fn type_cmd<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    match session.args.as_str() {
        "A" | "I" => session.write_reply(200, "Type set").await,
        _ => session.write_reply(504, "Type not supported").await,
    }
}

pub async fn stru<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    match session.args.as_str() {
        "F" => session.write_reply(200, "Structure set to F").await,
        _ => session.write_reply(504, "Structure not supported").await,
    }
}

pub async fn mode<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    match session.args.as_str() {
        "S" => session.write_reply(200, "Mode set to S").await,
        _ => session.write_reply(504, "Mode not supported").await,
    }
}

pub async fn noop<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    session.write_reply(200, "Zzz...").await
}

pub async fn syst<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    session.write_reply(215, "FTP Server, V1.0").await
}

pub async fn stat<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    let minutes = (session.shared.config.server_inactive_cnt as u64
        * session.shared.config.server_read_timeout_ms)
        / 60_000;
    session
        .write_reply(221, &format!("Inactivity timeout is {minutes} minutes"))
        .await
}

pub async fn site<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    if !session.args.eq_ignore_ascii_case("free") {
        return session.write_reply(501, "Unknown SITE subcommand").await;
    }
    match session.shared.fs.free_space().await {
        Ok(free) => {
            session
                .write_reply(
                    211,
                    &format!("{} MB free of {} MB", free.free_mb(), free.total_mb()),
                )
                .await
        }
        Err(_) => session.write_reply(550, "Failed to query free space").await,
    }
}

pub async fn feat<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    session
        .write_multiline_reply(
            211,
            &["Features:", " MDTM", " MLSD", " SIZE", " SITE FREE"],
            "End",
        )
        .await
}
