mod common;

use common::free_port;
use finch_ftpd::hooks::TracingHooks;
use finch_ftpd::Supervisor;
use finch_ftpd_core::MemFilesystem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

fn one_client_config(control_port: u16, data_port: u16) -> finch_ftpd_core::FtpConfig {
    let mut config = finch_ftpd_core::FtpConfig::default();
    config.bind_address = "127.0.0.1".to_string();
    config.server_port = control_port;
    config.data_port = data_port;
    config.nbr_clients = 1;
    config.psv_accept_timeout_ms = 100;
    config
}

#[tokio::test]
async fn slot_exhaustion_rejects_the_next_connection() {
    let control_port = free_port().await;
    let data_port = free_port().await;
    let config = one_client_config(control_port, data_port);

    let supervisor = Supervisor::new(config, MemFilesystem::new(), Arc::new(TracingHooks));
    let stop = Arc::new(AtomicBool::new(false));
    let stop_clone = stop.clone();
    tokio::spawn(async move {
        let _ = supervisor.run(stop_clone).await;
    });

    // Give the supervisor a moment to bind and start accepting.
    tokio::time::sleep(Duration::from_millis(150)).await;

    let first = TcpStream::connect(("127.0.0.1", control_port)).await.unwrap();
    // Hold `first` open without reading its greeting: the slot stays busy
    // because the session is blocked on its own control-read loop.
    tokio::time::sleep(Duration::from_millis(150)).await;

    let mut second = TcpStream::connect(("127.0.0.1", control_port)).await.unwrap();
    let mut buf = [0u8; 128];
    let n = tokio::time::timeout(Duration::from_secs(2), second.read(&mut buf))
        .await
        .expect("second connection should get a reply")
        .unwrap();
    let text = String::from_utf8_lossy(&buf[..n]);
    assert!(text.contains("421 No more connections allowed"));

    drop(first);
    stop.store(true, Ordering::SeqCst);
}

#[tokio::test]
async fn stop_drains_to_idle_with_no_active_sessions() {
    let control_port = free_port().await;
    let data_port = free_port().await;
    let config = one_client_config(control_port, data_port);

    let supervisor = Arc::new(Supervisor::new(config, MemFilesystem::new(), Arc::new(TracingHooks)));
    let stop = Arc::new(AtomicBool::new(false));
    let stop_clone = stop.clone();
    let supervisor_clone = supervisor.clone();
    let handle = tokio::spawn(async move {
        let _ = supervisor_clone.run(stop_clone).await;
    });

    tokio::time::sleep(Duration::from_millis(150)).await;
    stop.store(true, Ordering::SeqCst);
    tokio::time::timeout(Duration::from_secs(7), handle).await.unwrap().unwrap();

    assert_eq!(supervisor.status(), finch_ftpd_core::ServerStatus::Idle);
}
