//! PASV / PORT — data-channel mode negotiation.

use crate::codec;
use crate::session::{CmdOutcome, Session};
use finch_ftpd_core::Filesystem;
use std::time::Duration;

pub async fn pasv<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    if !session.shared.config.use_passive_mode {
        return session.write_reply(421, "Passive mode not available").await;
    }

    let port = session.data_port;
    let listen_timeout = Duration::from_millis(session.shared.config.psv_listen_timeout_ms);
    if session.data.pasv_open(port, listen_timeout).await.is_err() {
        return session.write_reply(425, "Cannot open passive connection").await;
    }

    let reply = codec::format_pasv_reply(session.server_ip, port);
    session.write_raw(reply.as_bytes()).await
}

pub async fn port<F: Filesystem>(session: &mut Session<F>) -> CmdOutcome {
    let Some((ip, port)) = codec::parse_port_tuple(&session.args) else {
        return session.write_reply(501, "Syntax error in parameters").await;
    };
    session.data.set_active(ip, port);
    session.port_client = Some((ip, port));
    session.write_reply(200, "PORT command successful").await
}
