//! The proxy's two ends: a `Stream` of datagrams arriving on a UDP socket and a `Sink` which
//! relays datagrams to a fixed address.

use crate::priv_prelude::*;

mod listener;
mod sender;

pub use self::{
    listener::UdpListener,
    sender::UdpSender,
};

/// Largest datagram the listener will read. Anything longer is truncated by the socket.
pub const MAX_DATAGRAM_SIZE: usize = 16 * 1024;

fn bind_error(addr: SocketAddr, err: io::Error) -> io::Error {
    io::Error::new(err.kind(), format!("failed to bind udp socket to {}: {}", addr, err))
}

fn unspecified_addr_for(target: SocketAddr) -> SocketAddr {
    match target {
        SocketAddr::V4(_) => addr!("0.0.0.0:0"),
        SocketAddr::V6(_) => addr!("[::]:0"),
    }
}
