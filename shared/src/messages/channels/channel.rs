/// Delivery contract of a channel, derived from its settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelMode {
    /// Fire and forget, delivered in arrival order
    UnorderedUnreliable,
    /// Fire and forget, only the newest message is delivered
    SequencedUnreliable,
    /// Retransmitted until acknowledged, delivered in arrival order
    UnorderedReliable,
    /// Retransmitted until acknowledged, delivered strictly in send order
    OrderedReliable,
}

/// Settings of a single channel. Fixed when the channel is set up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ChannelSettings {
    /// Packets carrying this channel are retransmitted until acknowledged
    pub reliable: bool,
    /// Messages carry a sequence on the wire and are delivered in order
    /// (reliable) or newest-only (unreliable)
    pub ordered: bool,
    /// Retain the most recently acknowledged message, for channels where only
    /// the latest authoritative value matters
    pub keep_last_sent: bool,
}

impl ChannelSettings {
    pub fn new(reliable: bool, ordered: bool, keep_last_sent: bool) -> Self {
        Self {
            reliable,
            ordered,
            keep_last_sent,
        }
    }

    pub fn ordered_reliable() -> Self {
        Self::new(true, true, false)
    }

    pub fn unordered_reliable() -> Self {
        Self::new(true, false, false)
    }

    pub fn sequenced_unreliable() -> Self {
        Self::new(false, true, false)
    }

    pub fn unordered_unreliable() -> Self {
        Self::new(false, false, false)
    }

    pub fn keep_last_sent(mut self) -> Self {
        self.keep_last_sent = true;
        self
    }

    pub fn mode(&self) -> ChannelMode {
        match (self.reliable, self.ordered) {
            (false, false) => ChannelMode::UnorderedUnreliable,
            (false, true) => ChannelMode::SequencedUnreliable,
            (true, false) => ChannelMode::UnorderedReliable,
            (true, true) => ChannelMode::OrderedReliable,
        }
    }
}
