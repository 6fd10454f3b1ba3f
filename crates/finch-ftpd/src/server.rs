//! the server supervisor: lifecycle state machine, fixed client-slot
//! pool, accept loop, and graceful drain.

use crate::session::{Session, SessionShared, PORT_ROTATION_MODULUS};
use finch_ftpd_core::{
    Credentials, ErrorBitmap, ErrorFlag, FtpConfig, Filesystem, ServerStatus, SharedStatus, Stats,
};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// How long the drain phase waits for busy slots to clear before recording
/// `WorkersFailedToDrain`.
const DRAIN_DEADLINE: Duration = Duration::from_secs(6);

/// Delay after a slot-exhaustion rejection before the next accept attempt.
const SLOT_EXHAUSTED_BACKOFF: Duration = Duration::from_millis(500);

/// One position in the fixed worker pool.
struct Slot {
    index: u8,
    offset: u8,
    stop_flag: Arc<AtomicBool>,
    busy: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Slot {
    fn new(index: u8) -> Self {
        Self {
            index,
            offset: 0,
            stop_flag: Arc::new(AtomicBool::new(false)),
            busy: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn spawn<F: Filesystem>(&mut self, socket: TcpStream, shared: Arc<SessionShared<F>>) {
        let server_ip = to_v4(socket.local_addr().ok());
        let client_ip = to_v4(socket.peer_addr().ok());

        self.busy.store(true, Ordering::SeqCst);
        self.stop_flag.store(false, Ordering::SeqCst);

        let offset = self.offset;
        self.offset = (self.offset + 1) % PORT_ROTATION_MODULUS;

        let index = self.index;
        let stop_flag = self.stop_flag.clone();
        let busy = self.busy.clone();

        self.handle = Some(tokio::spawn(async move {
            let session = Session::new(socket, server_ip, client_ip, index, offset, shared, stop_flag);
            session.run().await;
            busy.store(false, Ordering::SeqCst);
        }));
    }
}

fn to_v4(addr: Option<SocketAddr>) -> Ipv4Addr {
    match addr {
        Some(SocketAddr::V4(a)) => *a.ip(),
        Some(SocketAddr::V6(a)) => a.ip().to_ipv4().unwrap_or(Ipv4Addr::UNSPECIFIED),
        None => Ipv4Addr::UNSPECIFIED,
    }
}

/// Runs the command-port accept loop and fixed worker pool for one `F`
/// filesystem backend. Owns the singleton server state.
pub struct Supervisor<F: Filesystem> {
    config: Arc<FtpConfig>,
    shared: Arc<SessionShared<F>>,
}

impl<F: Filesystem> Supervisor<F> {
    pub fn new(config: FtpConfig, fs: F, hooks: Arc<dyn crate::hooks::Hooks>) -> Self {
        let config = Arc::new(config);
        let credentials = Arc::new(Credentials::new(
            config.user_name_default.clone(),
            config.user_pass_default.clone(),
        ));
        let shared = Arc::new(SessionShared {
            config: config.clone(),
            fs: Arc::new(fs),
            credentials,
            error_bitmap: Arc::new(ErrorBitmap::default()),
            stats: Arc::new(Stats::new(config.nbr_clients as u64)),
            status: Arc::new(SharedStatus::new(ServerStatus::Idle)),
            hooks,
        });
        Self { config, shared }
    }

    pub fn status(&self) -> ServerStatus {
        self.shared.status.get()
    }

    pub fn stats(&self) -> Arc<Stats> {
        self.shared.stats.clone()
    }

    /// Runs the full `Starting -> Running -> Stopping/ErrorStopping ->
    /// Idle/Error` lifecycle until `stop` is set.
    pub async fn run(&self, stop: Arc<AtomicBool>) -> std::io::Result<()> {
        self.shared.status.set(ServerStatus::Starting);

        let addr = format!("{}:{}", self.config.bind_address, self.config.server_port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                self.shared.error_bitmap.set(ErrorFlag::ListenerBind);
                self.shared.status.set(ServerStatus::ErrorStopping);
                self.drain(&mut Vec::new()).await;
                self.shared.status.set(ServerStatus::Error);
                return Err(e);
            }
        };

        tracing::info!(%addr, "ftp server listening");
        self.shared.status.set(ServerStatus::Running);

        let mut slots: Vec<Slot> = (0..self.config.nbr_clients).map(Slot::new).collect();
        let accept_timeout = Duration::from_millis(self.config.psv_accept_timeout_ms);

        while !stop.load(Ordering::SeqCst) {
            match tokio::time::timeout(accept_timeout, listener.accept()).await {
                Ok(Ok((mut socket, peer))) => {
                    tracing::debug!(%peer, "accepted control connection");
                    match slots.iter_mut().find(|s| !s.is_busy()) {
                        Some(slot) => slot.spawn(socket, self.shared.clone()),
                        None => {
                            use tokio::io::AsyncWriteExt;
                            let _ = socket.write_all(b"421 No more connections allowed\r\n").await;
                            drop(socket);
                            tokio::time::sleep(SLOT_EXHAUSTED_BACKOFF).await;
                        }
                    }
                }
                Ok(Err(_)) => {
                    self.shared.error_bitmap.set(ErrorFlag::ListenerAccept);
                }
                Err(_) => {} // accept timed out this tick; loop back to re-check `stop`
            }
        }

        self.shared.status.set(ServerStatus::Stopping);
        drop(listener);
        let drained = self.drain(&mut slots).await;
        if drained {
            self.shared.status.set(ServerStatus::Idle);
        } else {
            self.shared.error_bitmap.set(ErrorFlag::WorkersFailedToDrain);
            self.shared.status.set(ServerStatus::Error);
        }
        Ok(())
    }

    /// Signals every busy slot's `stop_flag` and polls up to
    /// [`DRAIN_DEADLINE`] for all of them to go idle.
    async fn drain(&self, slots: &mut Vec<Slot>) -> bool {
        for slot in slots.iter() {
            slot.stop_flag.store(true, Ordering::SeqCst);
        }

        let deadline = tokio::time::Instant::now() + DRAIN_DEADLINE;
        loop {
            if slots.iter().all(|s| !s.is_busy()) {
                for slot in slots.iter_mut() {
                    if let Some(handle) = slot.handle.take() {
                        let _ = handle.await;
                    }
                }
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
