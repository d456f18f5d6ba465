//! A UDP relay for testing applications over a bad network.
//!
//! The proxy listens on one UDP port and forwards every datagram it receives to a fixed target
//! address. On the way through, datagrams can be dropped in bursts, held back by a fixed delay,
//! and held back by an additional random amount of jitter. Payloads are never inspected or
//! modified.
//!
//! # Running a proxy
//!
//! ```ignore
//! use jitter_proxy::{Proxy, ProxyConfig, LossConfig};
//! use std::time::Duration;
//!
//! let config = {
//!     ProxyConfig::new(addr!("127.0.0.1:5000"), addr!("127.0.0.1:6000"))
//!     .delay(Duration::from_millis(50))
//!     .jitter(Duration::from_millis(10))
//!     .loss(LossConfig::new(0.001, 0.999)?)
//! };
//! let proxy = Proxy::bind(config).await?;
//! let summary = proxy.run(tokio::signal::ctrl_c().map(|_| ())).await?;
//! ```
//!
//! # Scheduling packets directly
//!
//! The [`DelayScheduler`] which does the delaying can be used on its own with any
//! `Sink<Bytes>`. It always forwards the packet with the earliest deadline first, including
//! when that packet arrived while the scheduler was already waiting on a later one.
//!
//! ```ignore
//! let mut scheduler = DelayScheduler::spawn(SchedulerConfig::new(delay, jitter), sink);
//! scheduler.enqueue(Bytes::from_static(b"hello"), Instant::now());
//! scheduler.shutdown().await;
//! ```

mod priv_prelude;

pub mod adapter;
mod config;
mod proxy;
mod scheduler;
mod socket;
mod stream_ext;

#[cfg(test)]
mod tests;

pub use crate::{
    config::{ConfigError, LossConfig, ProxyConfig, SchedulerConfig, MAX_DELAY},
    proxy::{Proxy, ProxySummary},
    scheduler::{DelayScheduler, SchedulerHandle, SchedulerStats},
    socket::{UdpListener, UdpSender, MAX_DATAGRAM_SIZE},
    stream_ext::DatagramStreamExt,
};
