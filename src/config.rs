//! Settings for the two roles, with the command line tool's defaults.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

/// Port used by both roles when none is given.
pub const DEFAULT_PORT: u16 = 1234;
/// Address the client connects to by default.
pub const DEFAULT_CONNECT_ADDR: Ipv4Addr = Ipv4Addr::LOCALHOST;
/// Address the server listens on by default.
pub const DEFAULT_LISTEN_ADDR: Ipv4Addr = Ipv4Addr::UNSPECIFIED;
/// Chunks requested per client session by default.
pub const DEFAULT_NUM_CHUNKS: u64 = 1;
/// Bytes per chunk by default.
pub const DEFAULT_CHUNK_LENGTH: u64 = 1_000_000;

/// Settings for one client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server address to connect to.
    pub connect_addr: Ipv4Addr,
    /// Server port.
    pub port: u16,
    /// Local port to bind before connecting, `0` lets the OS choose.
    pub bind_port: u16,
    /// Number of chunks to request.
    pub num_chunks: u64,
    /// Bytes per chunk.
    pub chunk_length: u64,
    /// Pause between chunks, never applied after the last one.
    pub chunk_delay: Duration,
    /// Read/write timeout on the session socket, `None` blocks forever.
    pub io_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            connect_addr: DEFAULT_CONNECT_ADDR,
            port: DEFAULT_PORT,
            bind_port: 0,
            num_chunks: DEFAULT_NUM_CHUNKS,
            chunk_length: DEFAULT_CHUNK_LENGTH,
            chunk_delay: Duration::ZERO,
            io_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Client config targeting `addr:port` with default load shape.
    pub fn new(connect_addr: Ipv4Addr, port: u16) -> Self {
        ClientConfig {
            connect_addr,
            port,
            ..Default::default()
        }
    }

    /// Sets the local port bound before connecting.
    pub fn with_bind_port(mut self, bind_port: u16) -> Self {
        self.bind_port = bind_port;
        self
    }

    /// Sets the number of chunks to request.
    pub fn with_num_chunks(mut self, num_chunks: u64) -> Self {
        self.num_chunks = num_chunks;
        self
    }

    /// Sets the bytes per chunk.
    pub fn with_chunk_length(mut self, chunk_length: u64) -> Self {
        self.chunk_length = chunk_length;
        self
    }

    /// Sets the pause between chunks.
    pub fn with_chunk_delay(mut self, chunk_delay: Duration) -> Self {
        self.chunk_delay = chunk_delay;
        self
    }

    /// Sets the socket timeout, zero disables it.
    pub fn with_io_timeout(mut self, io_timeout: Option<Duration>) -> Self {
        self.io_timeout = io_timeout.filter(|t| !t.is_zero());
        self
    }

    /// The server endpoint.
    pub fn server_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.connect_addr, self.port)
    }

    /// Bytes a complete session transfers.
    pub fn expected_total(&self) -> u128 {
        self.num_chunks as u128 * self.chunk_length as u128
    }
}

/// Settings for the listening side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on.
    pub listen_addr: Ipv4Addr,
    /// Port to listen on, `0` picks an ephemeral one.
    pub port: u16,
    /// Serve each connection on its own thread instead of one at a time.
    pub concurrent: bool,
    /// Read/write timeout applied to accepted connections.
    pub io_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: DEFAULT_LISTEN_ADDR,
            port: DEFAULT_PORT,
            concurrent: false,
            io_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Server config listening on `addr:port`.
    pub fn new(listen_addr: Ipv4Addr, port: u16) -> Self {
        ServerConfig {
            listen_addr,
            port,
            ..Default::default()
        }
    }

    /// Serve connections on separate threads.
    pub fn with_concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Sets the socket timeout, zero disables it.
    pub fn with_io_timeout(mut self, io_timeout: Option<Duration>) -> Self {
        self.io_timeout = io_timeout.filter(|t| !t.is_zero());
        self
    }

    /// The listening endpoint.
    pub fn listen_socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.listen_addr, self.port)
    }
}

/// Which side of the protocol this process plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Connect and request chunks.
    Client(ClientConfig),
    /// Listen and answer chunk requests.
    Server(ServerConfig),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_command_line_tool() {
        let client = ClientConfig::default();
        assert_eq!(client.server_addr(), "127.0.0.1:1234".parse().unwrap());
        assert_eq!(client.bind_port, 0);
        assert_eq!(client.num_chunks, 1);
        assert_eq!(client.chunk_length, 1_000_000);
        assert_eq!(client.chunk_delay, Duration::ZERO);
        assert_eq!(client.io_timeout, None);

        let server = ServerConfig::default();
        assert_eq!(server.listen_socket_addr(), "0.0.0.0:1234".parse().unwrap());
        assert!(!server.concurrent);
    }

    #[test]
    fn zero_timeout_means_no_timeout() {
        let client = ClientConfig::default().with_io_timeout(Some(Duration::ZERO));
        assert_eq!(client.io_timeout, None);
        let server = ServerConfig::default().with_io_timeout(Some(Duration::from_millis(5)));
        assert_eq!(server.io_timeout, Some(Duration::from_millis(5)));
    }

    #[test]
    fn expected_total_does_not_overflow() {
        let client = ClientConfig::default()
            .with_num_chunks(u64::MAX)
            .with_chunk_length(2);
        assert_eq!(client.expected_total(), u64::MAX as u128 * 2);
    }
}
