//! data-channel manager: opens, accepts and closes the data
//! connection in either active (PORT) or passive (PASV) mode.

use crate::error::{Result, SessionError};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

/// Which of the two RFC 959 data-connection modes the session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataMode {
    #[default]
    Unset,
    Passive,
    Active,
}

/// Owns the data-channel listener and socket lifetimes for one session.
///
/// The listener (passive mode) survives across transfers within a session —
/// only [`DataChannel::close_listener`] (switching to active via `PORT`) or
/// session teardown destroys it — while the socket is opened and closed once
/// per transfer.
#[derive(Default)]
pub struct DataChannel {
    mode: DataMode,
    listener: Option<TcpListener>,
    socket: Option<TcpStream>,
    /// Set by [`Self::pasv_open`] to the listen-phase timeout and consumed by
    /// the next [`Self::data_open`] accept; later accepts on the same
    /// listener fall back to the shorter per-transfer `accept_timeout`.
    pending_listen_timeout: Option<Duration>,
}

impl DataChannel {
    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn set_active(&mut self, _client_addr: Ipv4Addr, _client_port: u16) {
        // PORT always tears down any passive listener left over from a
        // previous PASV on this session.
        self.close_listener();
        self.mode = DataMode::Active;
    }

    fn close_listener(&mut self) {
        self.listener = None;
        self.pending_listen_timeout = None;
    }

    /// `pasv_open`: idempotent — binds a listener on `bind_port` only if one
    /// isn't already open. `listen_timeout` becomes the bound for the first
    /// accept after this call; it is lowered to the per-transfer
    /// `accept_timeout` by [`Self::data_open`] once that first wait resolves.
    pub async fn pasv_open(&mut self, bind_port: u16, listen_timeout: Duration) -> Result<()> {
        self.mode = DataMode::Passive;
        if self.listener.is_some() {
            return Ok(());
        }
        let addr = SocketAddr::from(([0, 0, 0, 0], bind_port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            warn!(port = bind_port, error = %e, "failed to bind passive data listener");
            SessionError::Io(e)
        })?;
        self.listener = Some(listener);
        self.pending_listen_timeout = Some(listen_timeout);
        Ok(())
    }

    /// `data_open`: produces the data socket for this transfer, branching on
    /// the current mode.
    ///
    /// * Passive — waits for the client to connect to the listener opened by
    ///   [`Self::pasv_open`], bounded by that call's `listen_timeout` the
    ///   first time through and by `accept_timeout` on every accept after.
    /// * Active — dials out to `(client_addr, client_port)`, bounded by
    ///   `connect_timeout`.
    /// * Unset — fails.
    pub async fn data_open(
        &mut self,
        client_addr: Ipv4Addr,
        client_port: u16,
        accept_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<()> {
        match self.mode {
            DataMode::Passive => {
                let listener = self.listener.as_ref().ok_or(SessionError::DataChannelUnset)?;
                let wait = self.pending_listen_timeout.take().unwrap_or(accept_timeout);
                let (socket, peer) = tokio::time::timeout(wait, listener.accept())
                    .await
                    .map_err(|_| SessionError::Timeout)??;
                debug!(%peer, "accepted passive data connection");
                self.socket = Some(socket);
                Ok(())
            }
            DataMode::Active => {
                let addr = SocketAddr::from((client_addr, client_port));
                let socket = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
                    .await
                    .map_err(|_| SessionError::Timeout)??;
                self.socket = Some(socket);
                Ok(())
            }
            DataMode::Unset => Err(SessionError::DataChannelUnset),
        }
    }

    pub fn socket_mut(&mut self) -> Option<&mut TcpStream> {
        self.socket.as_mut()
    }

    /// `data_close`: drops the socket (if any) and resets the mode to
    /// `Unset`. The listener is left intact, per the struct-level doc.
    pub fn data_close(&mut self) {
        self.socket = None;
    }

    /// Full teardown at session end: drops both listener and socket.
    pub fn teardown(&mut self) {
        self.socket = None;
        self.listener = None;
        self.pending_listen_timeout = None;
        self.mode = DataMode::Unset;
    }
}
