//! Write-batching buffer for dead destination channels.
//!
//! The sink reports a channel as gone at delivery time, potentially many
//! times in one cycle (several items, several accounts, or a whole guild
//! purge). Instead of issuing one registry delete per report, the cycle
//! accumulates ids here and flushes them in a single batched delete at the
//! end, and again on shutdown.

/// Deduplicating, bounded id buffer.
#[derive(Debug)]
pub struct DeadChannelQueue {
    pending: Vec<i64>,
    capacity: usize,
}

impl DeadChannelQueue {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: Vec::new(),
            capacity,
        }
    }

    /// Queue a channel id. Duplicate ids collapse; ids past the capacity are
    /// dropped (they will be reported again next cycle when the send fails
    /// again). Returns whether the id is queued after the call.
    pub fn push(&mut self, channel_id: i64) -> bool {
        if self.pending.contains(&channel_id) {
            return true;
        }
        if self.pending.len() >= self.capacity {
            tracing::warn!(channel_id, capacity = self.capacity, "dead-channel queue full; dropping");
            return false;
        }
        self.pending.push(channel_id);
        true
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Take everything queued, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<i64> {
        std::mem::take(&mut self.pending)
    }
}
