// Listener module
// Creates the TCP listener, dual-stack when bound to an IPv6 address

use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;

/// Listen backlog queue size
const BACKLOG: i32 = 128;

/// Create a non-blocking `std::net::TcpListener` with `SO_REUSEADDR` set.
///
/// IPv6 sockets also accept IPv4 connections, so binding `::` serves both
/// families. The caller converts the result with
/// `tokio::net::TcpListener::from_std` inside the runtime.
pub fn create_listener(addr: SocketAddr) -> std::io::Result<std::net::TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // Allow a quick restart while old connections linger in TIME_WAIT
    socket.set_reuse_address(true)?;

    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }

    // Set non-blocking mode for async compatibility
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;

    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_ephemeral_port() {
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn test_port_in_use_fails() {
        let first = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let taken = first.local_addr().unwrap();
        assert!(create_listener(taken).is_err());
    }
}
