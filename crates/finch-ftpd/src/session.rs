//! the per-client session engine: the control-channel read → parse →
//! dispatch → reply loop, inactivity timeout, and teardown.

use crate::buffer::TransferBuffer;
use crate::codec;
use crate::datachan::DataChannel;
use crate::dispatch;
use crate::hooks::Hooks;
use finch_ftpd_core::{Credentials, ErrorBitmap, ErrorFlag, FtpConfig, Filesystem, SharedStatus, Stats};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Tagged outcome of a control-channel operation or command handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdOutcome {
    Ok,
    Timeout,
    Error,
}

/// Login state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserState {
    Anonymous,
    AwaitingPassword,
    LoggedIn,
}

/// Resources shared by every worker in the pool: config, the filesystem
/// collaborator, credentials, the process-level error bitmap and stats, and
/// the observability hooks. Cheaply cloned (everything behind an `Arc`) so
/// each session gets its own handle.
pub struct SessionShared<F: Filesystem> {
    pub config: Arc<FtpConfig>,
    pub fs: Arc<F>,
    pub credentials: Arc<Credentials>,
    pub error_bitmap: Arc<ErrorBitmap>,
    pub stats: Arc<Stats>,
    pub status: Arc<SharedStatus>,
    pub hooks: Arc<dyn Hooks>,
}

/// One per-connection session. Created when a slot is assigned a
/// control socket, destroyed when [`Session::run`] returns.
pub struct Session<F: Filesystem> {
    pub control: TcpStream,
    pub data: DataChannel,
    pub server_ip: Ipv4Addr,
    pub client_ip: Ipv4Addr,
    pub data_port: u16,
    pub data_port_offset: u8,
    pub slot_index: u8,
    pub user_state: UserState,
    pub cwd: String,
    pub rename_from: Option<String>,
    pub verb: String,
    pub args: String,
    pub buffer: TransferBuffer,
    pub shared: Arc<SessionShared<F>>,
    pub stop_flag: Arc<AtomicBool>,
    pub open_file: Option<F::Handle>,
    /// Address/port advertised by the last `PORT` command, consumed by the
    /// next `data_open` in active mode.
    pub port_client: Option<(Ipv4Addr, u16)>,
}

/// Base passive data port before slot/offset rotation is applied.
pub const PORT_ROTATION_MODULUS: u8 = 25;

impl<F: Filesystem> Session<F> {
    pub fn new(
        control: TcpStream,
        server_ip: Ipv4Addr,
        client_ip: Ipv4Addr,
        slot_index: u8,
        data_port_offset: u8,
        shared: Arc<SessionShared<F>>,
        stop_flag: Arc<AtomicBool>,
    ) -> Self {
        let data_port = shared.config.data_port
            + data_port_offset as u16
            + slot_index as u16 * PORT_ROTATION_MODULUS as u16;
        let buffer = TransferBuffer::new(shared.config.buffer_size());
        Self {
            control,
            data: DataChannel::default(),
            server_ip,
            client_ip,
            data_port,
            data_port_offset,
            slot_index,
            user_state: UserState::Anonymous,
            cwd: "/".to_string(),
            rename_from: None,
            verb: String::new(),
            args: String::new(),
            buffer,
            shared,
            stop_flag,
            open_file: None,
            port_client: None,
        }
    }

    /// Opens the data socket for this transfer against whichever mode is
    /// currently set, using the config's passive accept/connect timeouts.
    pub async fn open_data_socket(&mut self) -> std::result::Result<(), crate::error::SessionError> {
        let (client_addr, client_port) = self.port_client.unwrap_or((Ipv4Addr::UNSPECIFIED, 0));
        let accept_timeout = Duration::from_millis(self.shared.config.psv_accept_timeout_ms);
        self.data
            .data_open(client_addr, client_port, accept_timeout, accept_timeout)
            .await
    }

    fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.shared.config.server_read_timeout_ms)
    }

    fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.shared.config.server_write_timeout_ms)
    }

    /// Polls the control socket for up to `server_inactive_cnt` iterations
    /// of `server_read_timeout_ms` each, checking `stop_flag`, server error
    /// status, and link health on every iteration.
    async fn read_command_bytes(&mut self) -> Result<Vec<u8>, CmdOutcome> {
        let timeout = self.read_timeout();
        for _ in 0..self.shared.config.server_inactive_cnt {
            if self.stop_flag.load(Ordering::SeqCst) {
                return Err(CmdOutcome::Error);
            }
            if self.shared.status.is_error() {
                return Err(CmdOutcome::Error);
            }
            if !self.shared.hooks.link_up() {
                return Err(CmdOutcome::Error);
            }

            let buf = self.buffer.as_mut_slice();
            match tokio::time::timeout(timeout, self.control.read(buf)).await {
                Ok(Ok(0)) => return Err(CmdOutcome::Error), // peer closed
                Ok(Ok(n)) => return Ok(buf[..n].to_vec()),
                Ok(Err(_)) => {
                    self.shared.error_bitmap.set(ErrorFlag::ClientSocketWrite);
                    return Err(CmdOutcome::Error);
                }
                Err(_) => continue, // this iteration's read timed out, try again
            }
        }
        Err(CmdOutcome::Timeout)
    }

    /// Bounded by `server_write_timeout_ms`; a timeout is reported
    /// distinctly from a hard I/O error so the caller can decide whether to
    /// flag the error bitmap.
    pub async fn write_raw(&mut self, bytes: &[u8]) -> CmdOutcome {
        match tokio::time::timeout(self.write_timeout(), self.control.write_all(bytes)).await {
            Ok(Ok(())) => CmdOutcome::Ok,
            Ok(Err(_)) => {
                self.shared.error_bitmap.set(ErrorFlag::ClientSocketWrite);
                CmdOutcome::Error
            }
            Err(_) => CmdOutcome::Timeout,
        }
    }

    pub async fn write_reply(&mut self, code: u16, message: &str) -> CmdOutcome {
        let line = codec::format_reply(code, message);
        self.write_raw(line.as_bytes()).await
    }

    pub async fn write_multiline_reply(&mut self, code: u16, lines: &[&str], last: &str) -> CmdOutcome {
        let text = codec::format_multiline_reply(code, lines, last);
        self.write_raw(text.as_bytes()).await
    }

    /// Builds an absolute path from the session's `cwd` and a command
    /// argument, without mutating `cwd` itself (used by every handler that
    /// takes a filename argument).
    pub fn resolve_path(&self, arg: &str) -> Option<String> {
        let mut scratch = self.cwd.clone();
        if crate::path::build(&mut scratch, arg) {
            Some(scratch)
        } else {
            None
        }
    }

    /// The per-client control loop. Runs until QUIT, a parse error, a
    /// handler reporting `Timeout`/`Error`, or the control read itself
    /// timing out / erroring.
    pub async fn run(mut self) {
        self.shared.hooks.connected(self.client_ip);
        self.shared.stats.client_connected();

        let greeting = codec::format_reply(220, "-> CMS FTP Server, FTP Version 2020-08-20");
        if self.write_raw(greeting.as_bytes()).await != CmdOutcome::Ok {
            self.teardown().await;
            return;
        }

        loop {
            let raw = match self.read_command_bytes().await {
                Ok(raw) => raw,
                Err(_) => break,
            };

            let parsed = match codec::parse_command(&raw) {
                Ok(p) => p,
                Err(_) => break, // oversize argument: terminate without reply
            };

            self.verb = parsed.verb;
            self.args = parsed.args;

            if self.verb == "QUIT" {
                let _ = self.write_reply(221, "Goodbye").await;
                break;
            }

            self.shared.hooks.cmd_begin(&self.verb);
            let outcome = dispatch::dispatch(&mut self).await;
            self.shared.hooks.cmd_end(&self.verb);

            if outcome != CmdOutcome::Ok {
                break;
            }
        }

        self.teardown().await;
    }

    async fn teardown(&mut self) {
        self.data.teardown();
        self.shared.hooks.disconnected(self.client_ip);
        self.shared.stats.client_disconnected();
    }
}
