//! Holds packets until their dispatch time and forwards them in deadline order.

use crate::priv_prelude::*;

mod queue;

use self::queue::{PendingPacket, PendingQueue};

/// Dispatches running behind their deadline by less than this aren't reported as late.
const LATE_THRESHOLD: Duration = Duration::from_millis(1);

/// Stands in for deadlines too far away for `Instant` to represent.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// A running delay scheduler.
///
/// Packets are queued with [`enqueue`](crate::DelayScheduler::enqueue) and are forwarded into the
/// scheduler's sink once their dispatch time is reached, always earliest deadline first. A
/// background task does the forwarding; it keeps running until
/// [`shutdown`](crate::DelayScheduler::shutdown) is called or the scheduler is dropped, at which
/// point any packets still waiting are discarded.
pub struct DelayScheduler {
    shared: Arc<Shared>,
    shutdown_tx_opt: Option<oneshot::Sender<()>>,
    join_handle_opt: Option<tokio::task::JoinHandle<()>>,
}

/// A cloneable handle for queueing packets on a [`DelayScheduler`](crate::DelayScheduler) from
/// other tasks or threads.
#[derive(Clone)]
pub struct SchedulerHandle {
    shared: Arc<Shared>,
}

/// Counters describing what a scheduler has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Packets accepted by `enqueue`.
    pub enqueued: u64,
    /// Packets handed to the sink, including ones the sink failed to send.
    pub dispatched: u64,
    /// Packets dispatched after their deadline had already passed.
    pub late: u64,
    /// Times the dispatcher gave up waiting on a packet because the queue changed.
    pub rescheduled: u64,
    /// Packets the sink returned an error for.
    pub send_errors: u64,
    /// Packets thrown away because the scheduler shut down before they were due.
    pub discarded: u64,
}

struct Shared {
    config: SchedulerConfig,
    state: Mutex<State>,
    queue_changed: Notify,
    stats: Counters,
}

struct State {
    queue: PendingQueue,
    changed: bool,
    closed: bool,
}

#[derive(Default)]
struct Counters {
    enqueued: AtomicU64,
    dispatched: AtomicU64,
    late: AtomicU64,
    rescheduled: AtomicU64,
    send_errors: AtomicU64,
    discarded: AtomicU64,
}

struct Dispatcher<S> {
    shared: Arc<Shared>,
    sink: Pin<Box<S>>,
    shutdown_rx: oneshot::Receiver<()>,
}

enum Wait {
    Due(PendingPacket),
    Rescheduled,
    Shutdown(PendingPacket),
}

impl DelayScheduler {
    /// Starts a scheduler which forwards packets into `sink`. Must be called within a `tokio`
    /// context.
    pub fn spawn<S>(config: SchedulerConfig, sink: S) -> DelayScheduler
    where
        S: Sink<Bytes> + Send + 'static,
        S::Error: fmt::Display,
    {
        let shared = Arc::new(Shared {
            config,
            state: Mutex::new(State {
                queue: PendingQueue::new(),
                changed: false,
                closed: false,
            }),
            queue_changed: Notify::new(),
            stats: Counters::default(),
        });
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let dispatcher = Dispatcher {
            shared: shared.clone(),
            sink: Box::pin(sink),
            shutdown_rx,
        };
        let join_handle = tokio::spawn(dispatcher.run());
        DelayScheduler {
            shared,
            shutdown_tx_opt: Some(shutdown_tx),
            join_handle_opt: Some(join_handle),
        }
    }

    /// Queues `payload`, which arrived at `now`, for dispatch after the configured delay plus a
    /// random amount of jitter. Returns the instant the packet is due.
    pub fn enqueue(&self, payload: Bytes, now: Instant) -> Instant {
        self.shared.enqueue(payload, now)
    }

    /// Queues `payload` for dispatch at exactly `dispatch_time`, bypassing the configured delay.
    pub fn schedule(&self, payload: Bytes, dispatch_time: Instant) {
        self.shared.schedule(payload, dispatch_time)
    }

    /// Gets a handle which can be used to queue packets from elsewhere.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            shared: self.shared.clone(),
        }
    }

    /// The timing parameters this scheduler was started with.
    pub fn config(&self) -> SchedulerConfig {
        self.shared.config
    }

    /// Number of packets waiting to be dispatched. A packet the dispatcher is currently waiting on
    /// isn't counted.
    pub fn len(&self) -> usize {
        self.shared.lock_state().queue.len()
    }

    /// Returns `true` if no packets are waiting in the queue.
    pub fn is_empty(&self) -> bool {
        self.shared.lock_state().queue.is_empty()
    }

    /// A snapshot of the scheduler's counters.
    pub fn stats(&self) -> SchedulerStats {
        self.shared.stats.snapshot()
    }

    /// Stops the dispatcher and waits for it to exit. Packets which haven't been dispatched yet
    /// are discarded and no packet is forwarded after this returns. Calling this more than once
    /// is harmless, as is calling it again after a previous call was cancelled part-way.
    pub async fn shutdown(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx_opt.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(join_handle) = self.join_handle_opt.as_mut() {
            let res = join_handle.await;
            self.join_handle_opt = None;
            match res {
                Ok(()) => (),
                Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
                Err(_cancelled) => (),
            }
        }
    }

    /// Returns `true` once [`shutdown`](crate::DelayScheduler::shutdown) has completed.
    pub fn is_shut_down(&self) -> bool {
        self.join_handle_opt.is_none()
    }
}

impl SchedulerHandle {
    /// See [`DelayScheduler::enqueue`](crate::DelayScheduler::enqueue).
    pub fn enqueue(&self, payload: Bytes, now: Instant) -> Instant {
        self.shared.enqueue(payload, now)
    }

    /// See [`DelayScheduler::schedule`](crate::DelayScheduler::schedule).
    pub fn schedule(&self, payload: Bytes, dispatch_time: Instant) {
        self.shared.schedule(payload, dispatch_time)
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        // The lock is never held across anything that can panic, so poisoning can be ignored.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enqueue(&self, payload: Bytes, now: Instant) -> Instant {
        let jitter = adapter::uniform_duration(self.config.jitter, &mut rand::thread_rng());
        let hold = self.config.delay.saturating_add(jitter);
        let dispatch_time = match now.checked_add(hold) {
            Some(dispatch_time) => dispatch_time,
            None => {
                debug!("can't hold a packet for {:?}, holding it until shutdown instead", hold);
                now.checked_add(FAR_FUTURE).unwrap_or(now)
            },
        };
        self.schedule(payload, dispatch_time);
        dispatch_time
    }

    fn schedule(&self, payload: Bytes, dispatch_time: Instant) {
        {
            let mut state = self.lock_state();
            if state.closed {
                drop(state);
                trace!("scheduler is shut down, discarding {} byte packet", payload.len());
                self.stats.discarded.fetch_add(1, atomic::Ordering::Relaxed);
                return;
            }
            state.queue.push(PendingPacket { dispatch_time, payload });
            state.changed = true;
            self.stats.enqueued.fetch_add(1, atomic::Ordering::Relaxed);
        }
        self.queue_changed.notify_one();
    }
}

impl Counters {
    fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            enqueued: self.enqueued.load(atomic::Ordering::Relaxed),
            dispatched: self.dispatched.load(atomic::Ordering::Relaxed),
            late: self.late.load(atomic::Ordering::Relaxed),
            rescheduled: self.rescheduled.load(atomic::Ordering::Relaxed),
            send_errors: self.send_errors.load(atomic::Ordering::Relaxed),
            discarded: self.discarded.load(atomic::Ordering::Relaxed),
        }
    }
}

impl<S> Dispatcher<S>
where
    S: Sink<Bytes>,
    S::Error: fmt::Display,
{
    async fn run(mut self) {
        loop {
            let packet_opt = {
                let mut state = self.shared.lock_state();
                state.changed = false;
                state.queue.pop()
            };
            let packet = match packet_opt {
                Some(packet) => packet,
                None => {
                    // An enqueue racing with the pop above leaves a permit in `queue_changed`, so
                    // this can't miss it.
                    tokio::select! {
                        biased;
                        _ = &mut self.shutdown_rx => break,
                        () = self.shared.queue_changed.notified() => continue,
                    }
                },
            };
            match self.wait_until_due(packet).await {
                Wait::Due(packet) => self.dispatch(packet).await,
                Wait::Rescheduled => (),
                Wait::Shutdown(packet) => {
                    drop(packet);
                    self.shared.stats.discarded.fetch_add(1, atomic::Ordering::Relaxed);
                    break;
                },
            }
        }

        let discarded = {
            let mut state = self.shared.lock_state();
            state.closed = true;
            state.queue.clear()
        };
        self.shared.stats.discarded.fetch_add(discarded as u64, atomic::Ordering::Relaxed);
        info!("scheduler shut down, discarded {} pending packets", discarded);
    }

    async fn wait_until_due(&mut self, packet: PendingPacket) -> Wait {
        let now = Instant::now();
        if packet.dispatch_time <= now {
            let behind = now - packet.dispatch_time;
            if behind > LATE_THRESHOLD {
                warn!("running late: packet dispatched {:?} after its deadline", behind);
                self.shared.stats.late.fetch_add(1, atomic::Ordering::Relaxed);
            }
            return Wait::Due(packet);
        }

        let sleep = tokio::time::sleep_until(packet.dispatch_time);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                biased;
                _ = &mut self.shutdown_rx => return Wait::Shutdown(packet),
                () = self.shared.queue_changed.notified() => {
                    let mut state = self.shared.lock_state();
                    if !state.changed {
                        // Left over from an enqueue we've already seen.
                        continue;
                    }
                    let remaining = packet.dispatch_time.saturating_duration_since(Instant::now());
                    state.queue.push_front(packet);
                    drop(state);
                    debug!("queue changed, rescheduled packet due in {:?}", remaining);
                    self.shared.stats.rescheduled.fetch_add(1, atomic::Ordering::Relaxed);
                    return Wait::Rescheduled;
                },
                () = &mut sleep => return Wait::Due(packet),
            }
        }
    }

    async fn dispatch(&mut self, packet: PendingPacket) {
        let len = packet.payload.len();
        self.shared.stats.dispatched.fetch_add(1, atomic::Ordering::Relaxed);
        match self.sink.send(packet.payload).await {
            Ok(()) => trace!("dispatched {} byte packet", len),
            Err(err) => {
                warn!("failed to forward {} byte packet: {}", len, err);
                self.shared.stats.send_errors.fetch_add(1, atomic::Ordering::Relaxed);
            },
        }
    }
}
