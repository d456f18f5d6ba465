pub use std::{fmt, io, panic};
pub use std::collections::{BTreeMap, VecDeque};
pub use std::future::Future;
pub use std::net::SocketAddr;
pub use std::pin::Pin;
pub use std::sync::{Arc, Mutex, MutexGuard};
pub use std::sync::atomic::{self, AtomicU64};
pub use std::task::{self, Poll};
pub use std::time::Duration;
pub use bytes::Bytes;
pub use futures::{ready, Sink, SinkExt, Stream, StreamExt, TryStream};
pub use log::{debug, info, trace, warn};
pub use net_literals::addr;
pub use pin_project::pin_project;
pub use rand::{Rng, SeedableRng};
pub use rand::rngs::StdRng;
pub use thiserror::Error;
pub use tokio::net::UdpSocket;
pub use tokio::sync::Notify;
pub use tokio::time::Instant;

pub use crate::{
    adapter::{self, Loss},
    config::{ConfigError, LossConfig, ProxyConfig, SchedulerConfig, MAX_DELAY},
    scheduler::{DelayScheduler, SchedulerHandle, SchedulerStats},
    socket::{UdpListener, UdpSender, MAX_DATAGRAM_SIZE},
    stream_ext::DatagramStreamExt,
    proxy::{Proxy, ProxySummary},
};
