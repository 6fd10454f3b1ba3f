//! finch-ftpd server binary.
//!
//! Run with: cargo run --bin finch-ftpd -- serve

use clap::{Parser, Subcommand};
use finch_ftpd_core::{FtpConfig, LocalFilesystem};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the FTP server.
    Serve(ServeArgs),
    /// Print the default configuration as TOML and exit.
    InitConfig,
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Configuration file path (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Control-channel bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Control-channel listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Passive-mode data port base.
    #[arg(long)]
    data_port: Option<u16>,

    /// Root directory served to clients.
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Size of the fixed client worker pool.
    #[arg(long)]
    clients: Option<u8>,

    /// Verbose logging (debug level).
    #[arg(short, long)]
    verbose: bool,

    /// Log format (json or text).
    #[arg(long)]
    log_format: Option<finch_ftpd_core::config::LogFormat>,

    /// Log file path; rotated daily.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let args = match cli.command {
        Command::InitConfig => {
            print!("{}", FtpConfig::default().to_toml());
            return;
        }
        Command::Serve(args) => args,
    };

    let mut config = match &args.config {
        Some(path) => match FtpConfig::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load config: {e}");
                std::process::exit(1);
            }
        },
        None => FtpConfig::default(),
    };

    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.server_port = port;
    }
    if let Some(data_port) = args.data_port {
        config.data_port = data_port;
    }
    if let Some(root) = args.root {
        config.root_dir = root;
    }
    if let Some(clients) = args.clients {
        config.nbr_clients = clients;
    }
    if let Some(log_format) = args.log_format {
        config.logging.format = log_format;
    }
    if let Some(log_file) = args.log_file {
        config.logging.file = Some(log_file);
    }
    if args.verbose {
        config.logging.level = "debug".to_string();
    }

    let _log_guard = init_logging(&mut config);

    info!(
        event = "server_starting",
        version = env!("CARGO_PKG_VERSION"),
        "starting finch-ftpd"
    );

    if !config.root_dir.exists() {
        info!(event = "creating_root_directory", directory = ?config.root_dir, "creating root directory");
        if let Err(e) = std::fs::create_dir_all(&config.root_dir) {
            error!(event = "root_directory_creation_failed", error = %e, "failed to create root directory");
            std::process::exit(1);
        }
    }

    info!(
        event = "server_configuration",
        bind_address = %config.bind_address,
        port = config.server_port,
        data_port = config.data_port,
        root_dir = ?config.root_dir,
        nbr_clients = config.nbr_clients,
        buffer_size = config.buffer_size(),
        "finch-ftpd configuration"
    );

    let fs = LocalFilesystem::new(config.root_dir.clone());
    let supervisor = finch_ftpd::Supervisor::new(config, fs, Arc::new(finch_ftpd::hooks::TracingHooks));

    let stop = Arc::new(AtomicBool::new(false));
    let stop_signal = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(event = "shutdown_requested", "received Ctrl-C, draining workers");
            stop_signal.store(true, Ordering::SeqCst);
        }
    });

    if let Err(e) = supervisor.run(stop).await {
        error!(event = "server_error", error = %e, "server encountered an error");
        std::process::exit(1);
    }

    info!(event = "server_shutdown", "finch-ftpd shutdown complete");
}

/// JSON/text + optional daily-rotating file sink `tracing-subscriber` setup.
fn init_logging(config: &mut FtpConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use finch_ftpd_core::config::LogFormat;

    if let Some(ref log_file) = config.logging.file {
        if let Some(parent) = log_file.parent() {
            if !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    eprintln!("Warning: failed to create log directory: {e}");
                    eprintln!("Falling back to stderr logging");
                    config.logging.file = None;
                }
            }
        }

        if let Some(ref log_file) = config.logging.file {
            let file_appender = tracing_appender::rolling::daily(
                log_file.parent().expect("log file must have parent directory"),
                log_file
                    .file_name()
                    .expect("log file must have filename")
                    .to_string_lossy()
                    .as_ref(),
            );
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            match config.logging.format {
                LogFormat::Json => {
                    tracing_subscriber::fmt()
                        .json()
                        .with_env_filter(EnvFilter::new(config.logging.level.clone()))
                        .with_writer(non_blocking)
                        .init();
                }
                LogFormat::Text => {
                    tracing_subscriber::fmt()
                        .with_env_filter(EnvFilter::new(config.logging.level.clone()))
                        .with_writer(non_blocking)
                        .init();
                }
            }

            return Some(guard);
        }
    }

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(EnvFilter::new(config.logging.level.clone()))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new(config.logging.level.clone()))
                .init();
        }
    }
    None
}
