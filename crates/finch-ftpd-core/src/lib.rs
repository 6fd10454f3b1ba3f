//! Shared types for the finch-ftpd embedded FTP server.
//!
//! This crate carries everything the protocol engine (`finch-ftpd`) needs but
//! that is not itself protocol logic: the filesystem collaborator contract
//! (the engine operates against a block-addressable filesystem rather than
//! `std::fs` directly, so it can run against FAT/embedded backends), the
//! process-wide credential and server-state types, and layered
//! configuration.

pub mod config;
pub mod error;
pub mod filesystem;
pub mod local;
pub mod memfs;
pub mod state;

pub use config::FtpConfig;
pub use error::{FsError, Result};
pub use filesystem::{DirEntry, FileInfo, Filesystem, FreeSpace, OpenMode};
pub use local::LocalFilesystem;
pub use memfs::MemFilesystem;
pub use state::{Credentials, ErrorBitmap, ErrorFlag, ServerStatus, SharedStatus, Stats};
