use finch_ftpd::hooks::TracingHooks;
use finch_ftpd::session::{Session, SessionShared};
use finch_ftpd_core::{Credentials, ErrorBitmap, FtpConfig, Filesystem, ServerStatus, SharedStatus, Stats};
use std::net::Ipv4Addr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// Binds a fresh control-channel listener, runs one `Session` against the
/// first connection it accepts, and hands back the client side of that
/// connection so a test can drive the protocol.
pub async fn spawn_session<F: Filesystem>(config: FtpConfig, fs: Arc<F>) -> TcpStream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shared = Arc::new(SessionShared {
        config: Arc::new(config),
        fs,
        credentials: Arc::new(Credentials::new("user", "pass")),
        error_bitmap: Arc::new(ErrorBitmap::default()),
        stats: Arc::new(Stats::new(1)),
        status: Arc::new(SharedStatus::new(ServerStatus::Running)),
        hooks: Arc::new(TracingHooks),
    });

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let session = Session::new(
            socket,
            Ipv4Addr::LOCALHOST,
            Ipv4Addr::LOCALHOST,
            0,
            0,
            shared,
            Arc::new(AtomicBool::new(false)),
        );
        session.run().await;
    });

    TcpStream::connect(addr).await.unwrap()
}

/// A free TCP port on localhost, discovered by binding then immediately
/// releasing a listener — used for PASV's fixed-port bind in tests.
pub async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

pub fn test_config(data_port: u16) -> FtpConfig {
    let mut config = FtpConfig::default();
    config.data_port = data_port;
    config.server_read_timeout_ms = 50;
    config.server_inactive_cnt = 3;
    config
}

/// Buffers control-channel bytes and hands back one CRLF-terminated line at
/// a time, since a single `read()` is not guaranteed to align with reply
/// boundaries.
pub struct LineReader {
    stream: TcpStream,
    buf: Vec<u8>,
}

impl LineReader {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream, buf: Vec::new() }
    }

    pub async fn read_line(&mut self) -> String {
        use tokio::io::AsyncReadExt;
        loop {
            if let Some(pos) = find_crlf(&self.buf) {
                let line: Vec<u8> = self.buf.drain(..pos + 2).collect();
                return String::from_utf8_lossy(&line[..line.len() - 2]).into_owned();
            }
            let mut chunk = [0u8; 512];
            let n = self.stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before a full line arrived");
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    pub async fn write_line(&mut self, line: &str) {
        use tokio::io::AsyncWriteExt;
        self.stream.write_all(format!("{line}\r\n").as_bytes()).await.unwrap();
    }

    pub fn into_inner(self) -> TcpStream {
        self.stream
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
