//! The answering side of a session.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::report::ConnectionReport;
use crate::socket;
use crate::wire;

/// Listens for clients and answers every chunk request with zeros.
///
/// By default connections are served one after another: the next `accept`
/// only happens once the current connection's request loop has ended.
/// With [`ServerConfig::concurrent`] each connection gets its own thread.
pub struct Responder {
    listener: TcpListener,
    config: ServerConfig,
}

impl Responder {
    /// Binds the listening socket.
    pub fn bind(config: ServerConfig) -> Result<Responder> {
        let listener = socket::listen(&config)?;
        Ok(Responder { listener, config })
    }

    /// Returns the local address that this responder is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Error::setup("getsockname"))
    }

    fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = self.listener.accept().map_err(Error::setup("accept"))?;
        log::info!("Accepted connection from: {peer}");
        Ok((stream, peer))
    }

    /// Accepts a single connection and serves it until the client closes.
    pub fn accept_one(&self) -> Result<ConnectionReport> {
        let (stream, peer) = self.accept()?;
        serve_connection(stream, peer, self.config.io_timeout)
    }

    /// Accepts and serves connections until an error stops it.
    ///
    /// In sequential mode any session error is returned after its
    /// connection has been closed. In concurrent mode a session error only
    /// ends that session; only `accept` failures are returned.
    pub fn serve(&self) -> Result<()> {
        log::info!("Listening on: {}", self.local_addr()?);
        loop {
            let (stream, peer) = self.accept()?;
            if self.config.concurrent {
                let io_timeout = self.config.io_timeout;
                std::thread::spawn(move || {
                    if let Err(e) = serve_connection(stream, peer, io_timeout) {
                        log::warn!("Session with {peer} aborted: {e}");
                    }
                });
            } else {
                let report = serve_connection(stream, peer, self.config.io_timeout)?;
                log::info!("{report}");
            }
        }
    }
}

/// Runs the request/response loop for one accepted connection.
///
/// The stream is dropped, closing the connection, on every return path.
pub fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    io_timeout: Option<Duration>,
) -> Result<ConnectionReport> {
    let session_id = Uuid::new_v4();
    log::debug!("Connection {peer} is session {session_id}");
    socket::apply_io_timeout(&stream, io_timeout)?;

    let mut report = ConnectionReport {
        session_id,
        peer,
        requests: 0,
        bytes_sent: 0,
    };
    while let Some(request) = wire::read_request(&mut stream)? {
        log::info!("Sending a chunk of {} bytes.", request.chunk_length);
        wire::write_zeros(&mut stream, request.chunk_length)?;
        report.requests += 1;
        report.bytes_sent += request.chunk_length;
    }
    log::debug!("Session {session_id} closed by {peer}");
    Ok(report)
}
