//! USER / PASS / AUTH — the only handlers reachable before login, plus the
//! explicit "FTPS not available" stub.

use crate::session::{CmdOutcome, Session, UserState};
use finch_ftpd_core::Filesystem;

pub async fn user<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    if session.shared.credentials.username_matches(&session.args) {
        session.user_state = UserState::AwaitingPassword;
        session.write_reply(331, "OK. Password required").await
    } else {
        session.write_reply(530, "Not logged in").await
    }
}

pub async fn pass<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    if session.user_state != UserState::AwaitingPassword {
        return session.write_reply(530, "Not logged in").await;
    }
    if session.shared.credentials.password_matches(&session.args) {
        session.user_state = UserState::LoggedIn;
        let username = session.shared.credentials.username().to_string();
        session
            .write_reply(230, &format!("OK, logged in as {username}"))
            .await
    } else {
        session.user_state = UserState::Anonymous;
        session.write_reply(530, "Not logged in").await
    }
}

pub async fn auth<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    session.write_reply(504, "Not available").await
}
