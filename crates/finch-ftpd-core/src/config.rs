//! Configuration for the FTP server: a layered TOML + CLI-overridable
//! struct, with a `#[serde(default = "…")]` per field and a `load`/`to_toml`
//! pair for reading and round-tripping it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// FTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FtpConfig {
    /// Control-channel listen address.
    pub bind_address: String,

    /// Control-channel listen port (`SERVER_PORT`).
    pub server_port: u16,

    /// Passive-mode data port base (`DATA_PORT`).
    pub data_port: u16,

    /// Root directory served to clients, passed to the filesystem backend.
    pub root_dir: PathBuf,

    /// Size of the fixed client worker pool (`NBR_CLIENTS`).
    pub nbr_clients: u8,

    /// Control-channel read iteration timeout, ms (`SERVER_READ_TIMEOUT_MS`).
    pub server_read_timeout_ms: u64,

    /// Bounded partial-write wait, ms (`SERVER_WRITE_TIMEOUT_MS`).
    pub server_write_timeout_ms: u64,

    /// Read-timeout iterations before idle disconnect (`SERVER_INACTIVE_CNT`).
    pub server_inactive_cnt: u32,

    /// Passive accept timeout, ms (`PSV_ACCEPT_TIMEOUT_MS`).
    pub psv_accept_timeout_ms: u64,

    /// Passive listen timeout, ms (`PSV_LISTEN_TIMEOUT_MS`).
    pub psv_listen_timeout_ms: u64,

    /// STOR data-socket recv timeout, ms (`STOR_RECV_TIMEOUT_MS`).
    pub stor_recv_timeout_ms: u64,

    /// If false, `PASV` replies `421` (`USE_PASSIVE_MODE`).
    pub use_passive_mode: bool,

    /// Transfer buffer size multiplier; buffer = `1024 * buf_size_mult`
    /// bytes (`BUF_SIZE_MULT`).
    pub buf_size_mult: u32,

    /// Default username (`USER_NAME_DEFAULT`).
    pub user_name_default: String,

    /// Default password (`USER_PASS_DEFAULT`).
    pub user_pass_default: String,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            server_port: default_server_port(),
            data_port: default_data_port(),
            root_dir: default_root_dir(),
            nbr_clients: default_nbr_clients(),
            server_read_timeout_ms: default_server_read_timeout_ms(),
            server_write_timeout_ms: default_server_write_timeout_ms(),
            server_inactive_cnt: default_server_inactive_cnt(),
            psv_accept_timeout_ms: default_psv_accept_timeout_ms(),
            psv_listen_timeout_ms: default_psv_listen_timeout_ms(),
            stor_recv_timeout_ms: default_stor_recv_timeout_ms(),
            use_passive_mode: true,
            buf_size_mult: default_buf_size_mult(),
            user_name_default: default_user_name(),
            user_pass_default: default_user_pass(),
            logging: LoggingConfig::default(),
        }
    }
}

impl FtpConfig {
    /// Transfer buffer size in bytes (`1024 * buf_size_mult`), aligned to a
    /// multiple of the filesystem sector size.
    pub fn buffer_size(&self) -> usize {
        1024 * self.buf_size_mult as usize
    }

    /// Loads configuration from a TOML file, falling back to defaults for
    /// any field the file omits.
    pub fn load(path: &std::path::Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Serializes the configuration back to TOML, used by `--init-config`.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).expect("FtpConfig always serializes")
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_server_port() -> u16 {
    21
}
fn default_data_port() -> u16 {
    55600
}
fn default_root_dir() -> PathBuf {
    PathBuf::from("/srv/ftp")
}
fn default_nbr_clients() -> u8 {
    1
}
fn default_server_read_timeout_ms() -> u64 {
    1000
}
fn default_server_write_timeout_ms() -> u64 {
    3000
}
fn default_server_inactive_cnt() -> u32 {
    60
}
fn default_psv_accept_timeout_ms() -> u64 {
    500
}
fn default_psv_listen_timeout_ms() -> u64 {
    5000
}
fn default_stor_recv_timeout_ms() -> u64 {
    5000
}
fn default_buf_size_mult() -> u32 {
    32
}
fn default_user_name() -> String {
    "user".to_string()
}
fn default_user_pass() -> String {
    "pass".to_string()
}
