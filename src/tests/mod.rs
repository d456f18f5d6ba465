use crate::priv_prelude::*;

mod loss;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A `Sink` which remembers every payload it's given along with when it was given it.
#[derive(Clone, Default)]
struct Recorder {
    sent: Arc<Mutex<Vec<(Instant, Bytes)>>>,
}

impl Recorder {
    fn new() -> Recorder {
        Recorder::default()
    }

    fn sent(&self) -> Vec<(Instant, Bytes)> {
        self.sent.lock().unwrap().clone()
    }

    fn payloads(&self) -> Vec<Bytes> {
        self.sent().into_iter().map(|(_instant, payload)| payload).collect()
    }
}

impl Sink<Bytes> for Recorder {
    type Error = io::Error;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut task::Context) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Bytes) -> io::Result<()> {
        self.sent.lock().unwrap().push((Instant::now(), item));
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut task::Context) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut task::Context) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// A `Sink` which fails every send.
struct Unreachable;

impl Sink<Bytes> for Unreachable {
    type Error = io::Error;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut task::Context) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, _item: Bytes) -> io::Result<()> {
        Err(io::ErrorKind::ConnectionRefused.into())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut task::Context) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut task::Context) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn payload(index: usize) -> Bytes {
    Bytes::from(index.to_be_bytes().to_vec())
}
