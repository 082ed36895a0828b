//! # Chunk Perf - TCP Chunk Transfer Measurement
//!
//! Chunk Perf measures the throughput and latency a TCP path achieves under a
//! controlled load shape. A client asks a server for a number of fixed-size
//! chunks, optionally pausing between them, and counts the bytes that come
//! back.
//!
//! ## Protocol
//!
//! Each chunk is one request/response pair on a single TCP connection:
//!
//! - the client writes an 8-byte request holding the chunk length as a
//!   `u64` in the host's native byte order,
//! - the server answers with exactly that many zero bytes.
//!
//! There is no pipelining: the next request is only sent once the previous
//! chunk has been fully received. The client ends the session by closing
//! the connection.
//!
//! ## Basic Usage
//!
//! ### Server Side
//!
//! ```rust,no_run
//! use chunk_perf::{Responder, ServerConfig};
//! use std::net::Ipv4Addr;
//!
//! let responder = Responder::bind(ServerConfig::new(Ipv4Addr::UNSPECIFIED, 1234))?;
//! responder.serve()?;
//! # Ok::<(), chunk_perf::Error>(())
//! ```
//!
//! ### Client Side
//!
//! ```rust,no_run
//! use chunk_perf::{ClientConfig, Connector};
//! use std::net::Ipv4Addr;
//! use std::time::Duration;
//!
//! let config = ClientConfig::new(Ipv4Addr::LOCALHOST, 1234)
//!     .with_num_chunks(3)
//!     .with_chunk_length(1_000_000)
//!     .with_chunk_delay(Duration::from_millis(50));
//! let report = Connector::new(config).run()?;
//! assert_eq!(report.total_bytes, 3_000_000);
//! # Ok::<(), chunk_perf::Error>(())
//! ```
//!
//! ## Failure Policy
//!
//! Nothing is retried. A setup failure, a transport error or a request
//! frame that arrives short ends the session with an [`Error`]; it is up to
//! the caller whether that ends the process.

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod report;
pub mod server;
pub mod socket;
pub mod wire;

pub use client::Connector;
pub use config::{ClientConfig, Role, ServerConfig};
pub use error::{Error, Result};
pub use report::{ChunkStats, ConnectionReport, SessionReport};
pub use server::Responder;
pub use wire::{ChunkRequest, REQUEST_LEN};
