//! The requesting side of a session.

use std::io::{ErrorKind, Read};
use std::net::TcpStream;
use std::time::Instant;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::report::{ChunkStats, SessionReport};
use crate::socket;
use crate::wire::{self, ChunkRequest};

/// Largest single read issued while draining a chunk.
const READ_BUF_LEN: usize = 256 * 1024;

/// Requests `num_chunks` chunks over one connection and counts what arrives.
///
/// Chunks are strictly sequential: request `i + 1` is only written after
/// every byte of chunk `i` has been read.
pub struct Connector {
    config: ClientConfig,
}

impl Connector {
    /// Creates a connector for the given session settings.
    pub fn new(config: ClientConfig) -> Self {
        Connector { config }
    }

    /// Connects to the server and runs the whole session.
    ///
    /// The connection is dropped, and therefore closed, when this returns.
    pub fn run(&self) -> Result<SessionReport> {
        log::info!("Connecting to: {}", self.config.server_addr());
        let mut stream = socket::connect(&self.config)?;
        self.run_on(&mut stream)
    }

    /// Runs the request loop on an already connected stream.
    pub fn run_on(&self, stream: &mut TcpStream) -> Result<SessionReport> {
        let num_chunks = self.config.num_chunks;
        let chunk_length = self.config.chunk_length;
        let request = ChunkRequest::new(chunk_length);
        let mut report = SessionReport::new(stream.peer_addr()?, stream.local_addr()?);
        let mut buf = vec![0u8; read_buf_len(chunk_length)];

        log::info!(
            "Requesting {num_chunks} chunks of {chunk_length} bytes every {} ms.",
            self.config.chunk_delay.as_millis()
        );
        log::debug!("Expecting {} bytes in total.", self.config.expected_total());
        let start = Instant::now();
        for i in 1..=num_chunks {
            log::info!("Requesting chunk {i} of {num_chunks}.");
            let sent_at = Instant::now();
            wire::write_request(stream, &request)?;
            let bytes = drain_chunk(stream, &mut buf, chunk_length)?;
            log::info!("Received a chunk of {bytes} bytes.");
            report.record(ChunkStats {
                index: i,
                bytes,
                elapsed: sent_at.elapsed(),
            });

            if i < num_chunks && !self.config.chunk_delay.is_zero() {
                std::thread::sleep(self.config.chunk_delay);
            }
        }
        report.elapsed = start.elapsed();
        log::info!("Received {} bytes.", report.total_bytes);
        Ok(report)
    }
}

fn read_buf_len(chunk_length: u64) -> usize {
    usize::try_from(chunk_length)
        .unwrap_or(READ_BUF_LEN)
        .clamp(1, READ_BUF_LEN)
}

/// Reads exactly `chunk_length` bytes, never more.
///
/// A short chunk is not counted: if the peer closes before the last byte
/// arrives this returns [`Error::PeerClosed`] with the bytes seen so far,
/// and the session ends there.
fn drain_chunk<R: Read>(r: &mut R, buf: &mut [u8], chunk_length: u64) -> Result<u64> {
    let mut received = 0u64;
    while received < chunk_length {
        let want = usize::try_from(chunk_length - received)
            .unwrap_or(buf.len())
            .min(buf.len());
        match r.read(&mut buf[..want]) {
            Ok(0) => {
                return Err(Error::PeerClosed {
                    received,
                    expected: chunk_length,
                });
            }
            Ok(n) => received += n as u64,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(received)
}
