//! Embedded-friendly FTP server: an RFC 959 command subset plus the RFC 3659
//! `MDTM`/`SIZE`/`MLSD` extensions, built around a pluggable
//! [`finch_ftpd_core::Filesystem`] backend so the same protocol engine can
//! run against a real disk or an in-memory double.
//!
//! The binary (`src/bin/server.rs`) wires a [`finch_ftpd_core::LocalFilesystem`]
//! and [`hooks::TracingHooks`] into a [`server::Supervisor`]; everything in
//! this crate is reusable by an embedder that wants a different backend or
//! different instrumentation.

pub mod buffer;
pub mod codec;
pub mod datachan;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod hooks;
pub mod path;
pub mod server;
pub mod session;

pub use error::{Result, SessionError};
pub use server::Supervisor;
pub use session::{CmdOutcome, Session, SessionShared, UserState};
