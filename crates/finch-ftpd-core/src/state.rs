//! Process-wide credential and server-state types.
//!
//! These are plain data: the state machine that drives [`ServerStatus`]
//! transitions lives in `finch_ftpd::server`, not here, so this crate stays
//! free of any networking dependency.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Maximum length of the username/password: bounded 32-byte credential
/// strings.
pub const CREDENTIAL_MAX_LEN: usize = 32;

/// The single account this server authenticates clients against.
///
/// Not hot-swapped for in-flight sessions: a session captures its own
/// snapshot at `PASS` time and never re-reads this struct afterwards.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let mut username = username.into();
        let mut password = password.into();
        username.truncate(CREDENTIAL_MAX_LEN);
        password.truncate(CREDENTIAL_MAX_LEN);
        Self { username, password }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }

    pub fn username_matches(&self, candidate: &str) -> bool {
        self.username == candidate
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("user", "pass")
    }
}

/// Lifecycle state of the server supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerStatus {
    Idle = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
    ErrorStopping = 4,
    Error = 5,
}

impl ServerStatus {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Starting,
            2 => Self::Running,
            3 => Self::Stopping,
            4 => Self::ErrorStopping,
            _ => Self::Error,
        }
    }
}

/// A [`ServerStatus`] stored behind a single atomic word so any worker can
/// read it lock-free, and the supervisor can write it without a lock.
#[derive(Debug)]
pub struct SharedStatus(AtomicU32);

impl SharedStatus {
    pub fn new(initial: ServerStatus) -> Self {
        Self(AtomicU32::new(initial as u32))
    }

    pub fn get(&self) -> ServerStatus {
        ServerStatus::from_u8(self.0.load(Ordering::SeqCst) as u8)
    }

    pub fn set(&self, status: ServerStatus) {
        self.0.store(status as u32, Ordering::SeqCst);
    }

    /// `true` while the supervisor is tearing the listener down due to an
    /// internal failure — the session read loop treats this the same as a
    /// hard error.
    pub fn is_error(&self) -> bool {
        matches!(self.get(), ServerStatus::Error | ServerStatus::ErrorStopping)
    }
}

/// One bit of the process-level error bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorFlag {
    ListenerBind = 1 << 0,
    ListenerListen = 1 << 1,
    ListenerAccept = 1 << 2,
    ClientSocketWrite = 1 << 3,
    DataListenerBind = 1 << 4,
    DataListenerListen = 1 << 5,
    DataListenerAccept = 1 << 6,
    DataSocketConnect = 1 << 7,
    DataSocketIo = 1 << 8,
    BindPortZero = 1 << 9,
    WorkersFailedToDrain = 1 << 10,
}

/// Monotonic counters plus the `clients_active` gauge.
///
/// Incremented without interlocks beyond the atomics themselves — exact
/// counts under concurrent failure are advisory, not a correctness
/// property.
#[derive(Debug, Default)]
pub struct Stats {
    pub clients_active: AtomicU64,
    pub clients_max: AtomicU64,
    pub clients_connected: AtomicU64,
    pub clients_disconnected: AtomicU64,
    pub files_sent_ok: AtomicU64,
    pub files_sent_fail: AtomicU64,
    pub files_received_ok: AtomicU64,
    pub files_received_fail: AtomicU64,
}

impl Stats {
    pub fn new(clients_max: u64) -> Self {
        let stats = Self::default();
        stats.clients_max.store(clients_max, Ordering::Relaxed);
        stats
    }

    pub fn client_connected(&self) {
        self.clients_active.fetch_add(1, Ordering::Relaxed);
        self.clients_connected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn client_disconnected(&self) {
        self.clients_active.fetch_sub(1, Ordering::Relaxed);
        self.clients_disconnected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn file_sent_ok(&self) {
        self.files_sent_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn file_sent_fail(&self) {
        self.files_sent_fail.fetch_add(1, Ordering::Relaxed);
    }

    pub fn file_received_ok(&self) {
        self.files_received_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn file_received_fail(&self) {
        self.files_received_fail.fetch_add(1, Ordering::Relaxed);
    }
}

/// The singleton error bitmap, stored as a single atomic word so that
/// writers from any worker task can set a flag without a lock.
#[derive(Debug, Default)]
pub struct ErrorBitmap(AtomicU32);

impl ErrorBitmap {
    pub fn set(&self, flag: ErrorFlag) {
        self.0.fetch_or(flag as u32, Ordering::SeqCst);
    }

    pub fn bits(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_set(&self, flag: ErrorFlag) -> bool {
        self.bits() & (flag as u32) != 0
    }

    /// Resets the bitmap. The supervisor only calls this while
    /// `status == Error`.
    pub fn clear(&self) {
        self.0.store(0, Ordering::SeqCst);
    }
}
