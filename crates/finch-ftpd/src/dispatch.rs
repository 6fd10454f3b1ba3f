//! command dispatcher: verb lookup, the login gate, and the
//! begin/end instrumentation hooks around every handler invocation.

use crate::handlers;
use crate::session::{CmdOutcome, Session, UserState};
use finch_ftpd_core::Filesystem;

/// Verbs reachable before `USER`+`PASS` complete.
const PRE_LOGIN_VERBS: &[&str] = &["USER", "PASS", "AUTH", "QUIT", "FEAT", "SYST"];

/// Looks up and runs the handler for `session.verb`, honoring the login
/// gate. `QUIT` never reaches here — the session loop handles it inline.
///
/// A `match` on an already-uppercased 4-letter verb compiles to a flat
/// comparison chain, so there's no need for a dispatch table indexed by
/// verb string.
pub async fn dispatch<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    let verb = session.verb.clone();

    if session.user_state != UserState::LoggedIn && !PRE_LOGIN_VERBS.contains(&verb.as_str()) {
        // Silent no-op: the client gets no reply at all for data-bearing
        // commands issued before login.
        return CmdOutcome::Ok;
    }

    match verb.as_str() {
        "USER" => handlers::user(session).await,
        "PASS" => handlers::pass(session).await,
        "AUTH" => handlers::auth(session).await,
        "PWD" => handlers::pwd(session).await,
        "CWD" => handlers::cwd(session).await,
        "CDUP" => handlers::cdup(session).await,
        "TYPE" => handlers::type_cmd(session).await,
        "STRU" => handlers::stru(session).await,
        "MODE" => handlers::mode(session).await,
        "PASV" => handlers::pasv(session).await,
        "PORT" => handlers::port(session).await,
        "LIST" => handlers::list(session).await,
        "NLST" => handlers::nlst(session).await,
        "MLSD" => handlers::mlsd(session).await,
        "DELE" => handlers::dele(session).await,
        "RETR" => handlers::retr(session).await,
        "STOR" => handlers::stor(session).await,
        "MKD" => handlers::mkd(session).await,
        "RMD" => handlers::rmd(session).await,
        "RNFR" => handlers::rnfr(session).await,
        "RNTO" => handlers::rnto(session).await,
        "MDTM" => handlers::mdtm(session).await,
        "SIZE" => handlers::size(session).await,
        "SITE" => handlers::site(session).await,
        "FEAT" => handlers::feat(session).await,
        "SYST" => handlers::syst(session).await,
        "STAT" => handlers::stat(session).await,
        "NOOP" => handlers::noop(session).await,
        _ => session.write_reply(500, "Unknown command").await,
    }
}
