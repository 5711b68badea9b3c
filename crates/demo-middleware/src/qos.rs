//! Quality-of-service settings.
//!
//! Only the history depth is modelled: it sizes the per-topic channel, and a
//! subscription that falls further behind than that loses the oldest frames.
//! The channel is created by the first endpoint on a topic and keeps that
//! endpoint's depth for as long as the topic exists.

/// Depth used when a caller does not pick one.
pub const DEFAULT_DEPTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QoS {
    depth: usize,
}

impl QoS {
    /// Keep the last `depth` messages.  A depth of zero is treated as one.
    pub fn keep_last(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Default for QoS {
    fn default() -> Self {
        Self::keep_last(DEFAULT_DEPTH)
    }
}
