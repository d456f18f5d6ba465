use crate::priv_prelude::*;
use tokio::io::ReadBuf;

/// A UDP socket read as a `Stream` of datagram payloads.
///
/// The stream ends when a zero-length datagram arrives.
pub struct UdpListener {
    socket: UdpSocket,
    buffer: Box<[u8]>,
    finished: bool,
}

impl UdpListener {
    /// Binds a listener to `addr`.
    pub async fn bind(addr: SocketAddr) -> io::Result<UdpListener> {
        let socket = match UdpSocket::bind(addr).await {
            Ok(socket) => socket,
            Err(err) => return Err(super::bind_error(addr, err)),
        };
        Ok(UdpListener::from_socket(socket))
    }

    /// Wraps an already bound socket.
    pub fn from_socket(socket: UdpSocket) -> UdpListener {
        UdpListener {
            socket,
            buffer: vec![0u8; MAX_DATAGRAM_SIZE].into_boxed_slice(),
            finished: false,
        }
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Stream for UdpListener {
    type Item = io::Result<Bytes>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Option<io::Result<Bytes>>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        let mut buffer = ReadBuf::new(&mut this.buffer);
        match ready!(this.socket.poll_recv_from(cx, &mut buffer)) {
            Ok(_addr) => {
                let data = buffer.filled();
                if data.is_empty() {
                    this.finished = true;
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Ok(Bytes::copy_from_slice(data))))
                }
            },
            Err(err) => Poll::Ready(Some(Err(err))),
        }
    }
}
