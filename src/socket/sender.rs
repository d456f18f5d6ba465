use crate::priv_prelude::*;

/// A `Sink` which sends every item as a datagram to a fixed target address.
///
/// Delivery is best effort. A datagram which fails to send is reported once through the `Sink`
/// error and then forgotten.
pub struct UdpSender {
    socket: UdpSocket,
    target: SocketAddr,
    send_packet_opt: Option<Bytes>,
}

impl UdpSender {
    /// Binds a sender to `bind_addr` which relays to `target`.
    pub async fn bind(bind_addr: SocketAddr, target: SocketAddr) -> io::Result<UdpSender> {
        let socket = match UdpSocket::bind(bind_addr).await {
            Ok(socket) => socket,
            Err(err) => return Err(super::bind_error(bind_addr, err)),
        };
        Ok(UdpSender::from_socket(socket, target))
    }

    /// Binds a sender to an ephemeral port of the same address family as `target`.
    pub async fn for_target(target: SocketAddr) -> io::Result<UdpSender> {
        UdpSender::bind(super::unspecified_addr_for(target), target).await
    }

    /// Wraps an already bound socket.
    pub fn from_socket(socket: UdpSocket, target: SocketAddr) -> UdpSender {
        UdpSender {
            socket,
            target,
            send_packet_opt: None,
        }
    }

    /// The address datagrams are sent to.
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// The address datagrams are sent from.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Sink<Bytes> for UdpSender {
    type Error = io::Error;

    fn poll_ready(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<io::Result<()>> {
        Self::poll_flush(self, cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Bytes) -> io::Result<()> {
        let this = self.get_mut();
        let send_packet_opt = this.send_packet_opt.replace(item);
        debug_assert!(send_packet_opt.is_none());
        Ok(())
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let packet = match &this.send_packet_opt {
            Some(packet) => packet,
            None => return Poll::Ready(Ok(())),
        };
        let res = ready!(this.socket.poll_send_to(cx, packet, this.target));
        let packet_len = packet.len();
        this.send_packet_opt = None;
        match res {
            Ok(n) if n == packet_len => Poll::Ready(Ok(())),
            Ok(n) => {
                let msg = format!("sent {} of {} bytes to {}", n, packet_len, this.target);
                Poll::Ready(Err(io::Error::new(io::ErrorKind::WriteZero, msg)))
            },
            Err(err) => Poll::Ready(Err(err)),
        }
    }

    fn poll_close(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<io::Result<()>> {
        Self::poll_flush(self, cx)
    }
}
