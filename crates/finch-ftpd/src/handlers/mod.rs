//! one module per related group of FTP verbs, each handler sharing the
//! signature `async fn(&mut Session<F>) -> CmdOutcome`.

mod auth;
mod datachannel;
mod fileops;
mod listing;
mod nav;
mod session_opts;
mod transfer;

pub use auth::{auth, pass, user};
pub use datachannel::{pasv, port};
pub use fileops::{dele, mdtm, mkd, rmd, rnfr, rnto, size};
pub use listing::{list, mlsd, nlst};
pub use nav::{cdup, cwd, pwd};
pub use session_opts::{feat, mode, noop, site, stat, stru, syst, type_cmd};
pub use transfer::{retr, stor};
