//! Internal engine errors — failures that don't carry their own FTP reply
//! code and instead feed the process-level error bitmap, plus the
//! `Timeout` variant the control-channel read/write wrappers use.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation timed out")]
    Timeout,

    #[error("data channel is not open")]
    DataChannelUnset,
}
