mod common;

use common::{free_port, spawn_session, test_config, LineReader};
use finch_ftpd_core::MemFilesystem;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn login(reader: &mut LineReader) {
    assert!(reader.read_line().await.starts_with("220"));
    reader.write_line("USER user").await;
    assert!(reader.read_line().await.starts_with("331"));
    reader.write_line("PASS pass").await;
    assert!(reader.read_line().await.starts_with("230"));
}

#[tokio::test]
async fn s1_minimal_session() {
    let port = free_port().await;
    let stream = spawn_session(test_config(port), Arc::new(MemFilesystem::new())).await;
    let mut reader = LineReader::new(stream);

    login(&mut reader).await;

    reader.write_line("PWD").await;
    assert_eq!(reader.read_line().await, "257 \"/\" is your current directory");

    reader.write_line("QUIT").await;
    assert_eq!(reader.read_line().await, "221 Goodbye");

    let mut stream = reader.into_inner();
    let mut buf = [0u8; 8];
    assert_eq!(stream.read(&mut buf).await.unwrap(), 0, "socket should close after QUIT");
}

#[tokio::test]
async fn s2_list_over_passive() {
    let port = free_port().await;
    let fs = Arc::new(MemFilesystem::new());
    fs.put_file("/file.bin", vec![0u8; 100]);
    fs.put_dir("/sub");

    let stream = spawn_session(test_config(port), fs).await;
    let mut reader = LineReader::new(stream);
    login(&mut reader).await;

    reader.write_line("PASV").await;
    let pasv_reply = reader.read_line().await;
    assert!(pasv_reply.starts_with("227"));
    let data_port = parse_pasv_port(&pasv_reply);
    assert_eq!(data_port, port);

    let mut data = TcpStream::connect(("127.0.0.1", data_port)).await.unwrap();

    reader.write_line("LIST").await;
    assert!(reader.read_line().await.starts_with("150"));

    let mut received = Vec::new();
    data.read_to_end(&mut received).await.unwrap();
    let text = String::from_utf8(received).unwrap();
    // directories before files, regardless of name
    assert_eq!(text, "+/,\tsub\r\n+r,s100,\tfile.bin\r\n");

    assert_eq!(reader.read_line().await, "226 Directory send OK.");
}

#[tokio::test]
async fn s4_rnfr_rnto_happy_path() {
    let port = free_port().await;
    let fs = Arc::new(MemFilesystem::new());
    fs.put_file("/a.txt", b"hi".to_vec());

    let stream = spawn_session(test_config(port), fs).await;
    let mut reader = LineReader::new(stream);
    login(&mut reader).await;

    reader.write_line("RNFR a.txt").await;
    assert!(reader.read_line().await.starts_with("350"));
    reader.write_line("RNTO b.txt").await;
    assert_eq!(reader.read_line().await, "250 File successfully renamed or moved");
}

#[tokio::test]
async fn s5_rnto_without_rnfr() {
    let port = free_port().await;
    let stream = spawn_session(test_config(port), Arc::new(MemFilesystem::new())).await;
    let mut reader = LineReader::new(stream);
    login(&mut reader).await;

    reader.write_line("RNTO b.txt").await;
    assert_eq!(reader.read_line().await, "503 Need RNFR before RNTO");
}

#[tokio::test]
async fn s6_mdtm_set_then_query() {
    let port = free_port().await;
    let fs = Arc::new(MemFilesystem::new());
    fs.put_file("/f.txt", b"x".to_vec());

    let stream = spawn_session(test_config(port), fs).await;
    let mut reader = LineReader::new(stream);
    login(&mut reader).await;

    reader.write_line("MDTM 20240115103000 f.txt").await;
    assert_eq!(reader.read_line().await, "200 Ok");

    reader.write_line("MDTM f.txt").await;
    assert_eq!(reader.read_line().await, "213 20240115103000");
}

#[tokio::test]
async fn login_gate_silently_ignores_pwd_before_login() {
    let port = free_port().await;
    let stream = spawn_session(test_config(port), Arc::new(MemFilesystem::new())).await;
    let mut reader = LineReader::new(stream);

    assert!(reader.read_line().await.starts_with("220"));
    reader.write_line("PWD").await;

    // No reply should arrive for PWD before login; the next thing on the
    // wire is whatever a following, pre-login-exempt command produces.
    reader.write_line("SYST").await;
    assert_eq!(reader.read_line().await, "215 FTP Server, V1.0");
}

#[tokio::test]
async fn idle_session_is_disconnected_without_reply() {
    let port = free_port().await;
    let mut config = test_config(port);
    config.server_read_timeout_ms = 20;
    config.server_inactive_cnt = 2;

    let stream = spawn_session(config, Arc::new(MemFilesystem::new())).await;
    let mut reader = LineReader::new(stream);
    assert!(reader.read_line().await.starts_with("220"));

    let mut stream = reader.into_inner();
    let mut buf = [0u8; 8];
    let result = tokio::time::timeout(Duration::from_millis(500), stream.read(&mut buf)).await;
    assert_eq!(result.unwrap().unwrap(), 0, "idle session should close with no reply");
}

fn parse_pasv_port(reply: &str) -> u16 {
    let start = reply.find('(').unwrap() + 1;
    let end = reply.find(')').unwrap();
    let nums: Vec<u16> = reply[start..end].split(',').map(|s| s.parse().unwrap()).collect();
    nums[4] * 256 + nums[5]
}
