use crate::priv_prelude::*;

/// A payload waiting in a [`PendingQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingPacket {
    pub dispatch_time: Instant,
    pub payload: Bytes,
}

/// Payloads ordered by the instant they're due. Payloads which share a dispatch time come out in
/// the order they went in.
#[derive(Debug, Default)]
pub(crate) struct PendingQueue {
    pending: BTreeMap<Instant, VecDeque<Bytes>>,
    len: usize,
}

impl PendingQueue {
    pub fn new() -> PendingQueue {
        PendingQueue {
            pending: BTreeMap::new(),
            len: 0,
        }
    }

    pub fn push(&mut self, packet: PendingPacket) {
        self.pending.entry(packet.dispatch_time).or_default().push_back(packet.payload);
        self.len += 1;
    }

    /// Puts back a packet which was popped but not dispatched. It goes ahead of anything queued
    /// for the same instant since it was ahead of them before it was popped.
    pub fn push_front(&mut self, packet: PendingPacket) {
        self.pending.entry(packet.dispatch_time).or_default().push_front(packet.payload);
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<PendingPacket> {
        let mut entry = self.pending.first_entry()?;
        let dispatch_time = *entry.key();
        let payload = entry.get_mut().pop_front()?;
        if entry.get().is_empty() {
            let _ = entry.remove();
        }
        self.len -= 1;
        Some(PendingPacket { dispatch_time, payload })
    }

    #[cfg(test)]
    pub fn next_dispatch_time(&self) -> Option<Instant> {
        self.pending.first_key_value().map(|(&instant, _payloads)| instant)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops everything, returning how many payloads were dropped.
    pub fn clear(&mut self) -> usize {
        let len = self.len;
        self.pending.clear();
        self.len = 0;
        len
    }
}
