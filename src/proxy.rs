use crate::priv_prelude::*;

/// A bound relay, ready to run.
///
/// Created with [`Proxy::bind`](crate::Proxy::bind), which fails if either socket can't be bound.
/// [`Proxy::run`](crate::Proxy::run) then relays datagrams from the listen address to the target,
/// dropping, delaying and jittering them as configured.
pub struct Proxy {
    config: ProxyConfig,
    listener: UdpListener,
    sender: UdpSender,
}

/// What happened over the lifetime of a [`Proxy`](crate::Proxy).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxySummary {
    /// Datagrams read from the listen socket.
    pub received: u64,
    /// Datagrams dropped by the loss model before reaching the scheduler.
    pub dropped: u64,
    /// The scheduler's counters at shutdown.
    pub scheduler: SchedulerStats,
}

impl Proxy {
    /// Validates `config` and binds the listen and relay sockets.
    pub async fn bind(config: ProxyConfig) -> io::Result<Proxy> {
        if let Err(err) = config.validate() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, err));
        }
        let listener = UdpListener::bind(config.listen_addr).await?;
        let sender = UdpSender::for_target(config.target_addr).await?;
        Ok(Proxy { config, listener, sender })
    }

    /// The address the proxy is listening on. Useful when binding to port `0`.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The config the proxy was bound with.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Relays datagrams until a zero-length datagram arrives, the listen socket errors, or
    /// `shutdown` completes. The scheduler is shut down before this returns, discarding any
    /// datagrams still being held.
    pub async fn run<F>(self, shutdown: F) -> io::Result<ProxySummary>
    where
        F: Future<Output = ()>,
    {
        let Proxy { config, listener, sender } = self;
        let mut scheduler = DelayScheduler::spawn(config.scheduler, sender);
        let mut datagrams = listener.with_loss(config.loss);
        tokio::pin!(shutdown);

        let res = loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("shutdown requested");
                    break Ok(());
                },
                datagram_opt = datagrams.next() => match datagram_opt {
                    Some(Ok(payload)) => {
                        trace!("received {} bytes", payload.len());
                        let _dispatch_time = scheduler.enqueue(payload, Instant::now());
                    },
                    Some(Err(err)) => break Err(err),
                    None => {
                        info!("listen socket closed by zero-length datagram");
                        break Ok(());
                    },
                },
            }
        };

        scheduler.shutdown().await;
        let summary = ProxySummary {
            received: datagrams.passed() + datagrams.dropped(),
            dropped: datagrams.dropped(),
            scheduler: scheduler.stats(),
        };
        info!(
            "proxy stopped: received {}, dropped {}, forwarded {}, discarded {}",
            summary.received,
            summary.dropped,
            summary.scheduler.dispatched,
            summary.scheduler.discarded,
        );
        res.map(|()| summary)
    }
}
