//! Error type shared by every module.

use thiserror::Error;

/// Every way a chunk session can fail.
///
/// None of these are retried inside the crate: the first error ends the
/// session that produced it.
#[derive(Error, Debug)]
pub enum Error {
    /// No role selected, or a configuration value that cannot be used.
    #[error("configuration error: {0}")]
    Config(String),

    /// Socket creation, option setting, bind, connect, listen or accept failed.
    #[error("{op} failed: {source}")]
    Setup {
        /// The operation that failed, e.g. `"bind"`.
        op: &'static str,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A request read returned a byte count other than a full frame or zero.
    #[error("framing violation: expected {expected} bytes, got {got}")]
    Framing {
        /// Size of a complete request frame.
        expected: usize,
        /// Bytes actually returned by the read.
        got: usize,
    },

    /// The peer closed the connection before a chunk was fully received.
    #[error("peer closed after {received} of {expected} chunk bytes")]
    PeerClosed {
        /// Bytes of the current chunk received before the close.
        received: u64,
        /// Configured chunk length.
        expected: u64,
    },

    /// Transport failure during a session.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request codec rejected a value.
    #[error("codec error: {0}")]
    Codec(String),
}

impl Error {
    pub(crate) fn setup(op: &'static str) -> impl FnOnce(std::io::Error) -> Error {
        move |source| Error::Setup { op, source }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
