//! Connection setup for both roles.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use crate::config::{ClientConfig, ServerConfig};
use crate::error::{Error, Result};

/// Pending connections the listener queues. Sessions are served one at a
/// time, so one is enough.
pub const LISTEN_BACKLOG: i32 = 1;

fn new_tcp_socket() -> Result<Socket> {
    Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).map_err(Error::setup("socket"))
}

fn set_reuse(socket: &Socket) -> Result<()> {
    socket.set_reuse_address(true).map_err(Error::setup("SO_REUSEADDR"))?;
    socket.set_reuse_port(true).map_err(Error::setup("SO_REUSEPORT"))?;
    Ok(())
}

/// Applies the same timeout to reads and writes on a session socket.
pub fn apply_io_timeout(stream: &TcpStream, timeout: Option<Duration>) -> Result<()> {
    stream.set_read_timeout(timeout).map_err(Error::setup("SO_RCVTIMEO"))?;
    stream.set_write_timeout(timeout).map_err(Error::setup("SO_SNDTIMEO"))?;
    Ok(())
}

/// Opens the client's session connection.
///
/// With a non-zero bind port the socket is bound to `0.0.0.0:bind_port`
/// with address and port reuse enabled, so back-to-back runs on the same
/// port are not refused while the previous connection sits in `TIME_WAIT`.
pub fn connect(config: &ClientConfig) -> Result<TcpStream> {
    let socket = new_tcp_socket()?;
    if config.bind_port != 0 {
        set_reuse(&socket)?;
        let local = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.bind_port);
        socket.bind(&local.into()).map_err(Error::setup("bind"))?;
        log::debug!("Bound client socket to {local}");
    }
    let server = SocketAddr::V4(config.server_addr());
    socket.connect(&server.into()).map_err(Error::setup("connect"))?;
    let stream: TcpStream = socket.into();
    apply_io_timeout(&stream, config.io_timeout)?;
    Ok(stream)
}

/// Binds and listens on the server endpoint.
pub fn listen(config: &ServerConfig) -> Result<TcpListener> {
    let socket = new_tcp_socket()?;
    set_reuse(&socket)?;
    let addr = config.listen_socket_addr();
    socket.bind(&addr.into()).map_err(Error::setup("bind"))?;
    socket.listen(LISTEN_BACKLOG).map_err(Error::setup("listen"))?;
    Ok(socket.into())
}
