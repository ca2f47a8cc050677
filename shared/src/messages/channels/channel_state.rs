use std::mem;

use log::trace;

use crate::{
    messages::{
        channels::channel::{ChannelMode, ChannelSettings},
        message_container::MessageContainer,
    },
    types::MessageIndex,
    wrapping_number::{sequence_distance, sequence_newer},
};

/// One channel slot of a MessageQueue: its settings, sequence bookkeeping and
/// the buffer of received messages not yet handed to the application
pub struct Channel {
    settings: Option<ChannelSettings>,
    last_sent_seq: MessageIndex,
    last_received_seq: MessageIndex,
    last_ack_seq: MessageIndex,
    last_ack: Option<MessageContainer>,
    receive_buffer: Vec<MessageContainer>,
}

impl Channel {
    /// An empty, unconfigured slot
    pub fn new() -> Self {
        Self {
            settings: None,
            last_sent_seq: 0,
            last_received_seq: 0,
            last_ack_seq: 0,
            last_ack: None,
            receive_buffer: Vec::new(),
        }
    }

    pub fn with_settings(settings: ChannelSettings) -> Self {
        let mut channel = Self::new();
        channel.settings = Some(settings);
        channel
    }

    pub fn is_initialized(&self) -> bool {
        self.settings.is_some()
    }

    pub fn settings(&self) -> Option<&ChannelSettings> {
        self.settings.as_ref()
    }

    pub fn last_sent_seq(&self) -> MessageIndex {
        self.last_sent_seq
    }

    pub fn last_received_seq(&self) -> MessageIndex {
        self.last_received_seq
    }

    pub fn last_ack_seq(&self) -> MessageIndex {
        self.last_ack_seq
    }

    /// The most recently acknowledged message, kept only on `keep_last_sent`
    /// channels
    pub fn last_ack(&self) -> Option<&MessageContainer> {
        self.last_ack.as_ref()
    }

    pub fn buffered_len(&self) -> usize {
        self.receive_buffer.len()
    }

    /// Only called once per slot, the queue checks for double setup
    pub(crate) fn configure(&mut self, settings: ChannelSettings) {
        self.settings = Some(settings);
    }

    pub(crate) fn next_send_seq(&mut self) -> MessageIndex {
        self.last_sent_seq = self.last_sent_seq.wrapping_add(1);
        self.last_sent_seq
    }

    /// Whether a freshly deframed message should enter the receive buffer.
    /// Ordered channels reject sequences that were already consumed or are
    /// already buffered, which filters out retransmitted duplicates.
    pub(crate) fn accepts(&self, seq: Option<MessageIndex>) -> bool {
        let Some(settings) = &self.settings else {
            return false;
        };
        if !settings.ordered {
            return true;
        }
        let Some(seq) = seq else {
            return false;
        };
        sequence_newer(seq, self.last_received_seq)
            && !self
                .receive_buffer
                .iter()
                .any(|buffered| buffered.seq() == Some(seq))
    }

    /// Adds a received message to the buffer without filtering
    pub fn push_received(&mut self, message: MessageContainer) {
        self.receive_buffer.push(message);
    }

    /// Records that the packet holding `message` was acknowledged
    pub(crate) fn on_message_acked(&mut self, message: MessageContainer) {
        let Some(seq) = message.seq() else {
            return;
        };
        if !sequence_newer(seq, self.last_ack_seq) {
            return;
        }
        self.last_ack_seq = seq;
        if self
            .settings
            .as_ref()
            .is_some_and(|settings| settings.keep_last_sent)
        {
            self.last_ack = Some(message);
        }
    }

    /// Moves every message the channel's contract allows to release into
    /// `output`
    pub fn ready_messages(&mut self, output: &mut Vec<MessageContainer>) {
        let Some(settings) = &self.settings else {
            return;
        };
        match settings.mode() {
            ChannelMode::OrderedReliable => self.release_in_order(output),
            ChannelMode::SequencedUnreliable => self.release_newest(output),
            ChannelMode::UnorderedReliable | ChannelMode::UnorderedUnreliable => {
                output.append(&mut self.receive_buffer);
            }
        }
    }

    // Gaps block delivery until they are filled
    fn release_in_order(&mut self, output: &mut Vec<MessageContainer>) {
        loop {
            let next_seq = self.last_received_seq.wrapping_add(1);
            let Some(index) = self
                .receive_buffer
                .iter()
                .position(|message| message.seq() == Some(next_seq))
            else {
                return;
            };
            output.push(self.receive_buffer.swap_remove(index));
            self.last_received_seq = next_seq;
        }
    }

    // Everything older than the newest in-window message is stale
    fn release_newest(&mut self, output: &mut Vec<MessageContainer>) {
        let buffered = mem::take(&mut self.receive_buffer);
        let dropped = buffered.len();

        let mut best: Option<(u16, MessageContainer)> = None;
        for message in buffered {
            let Some(seq) = message.seq() else {
                continue;
            };
            if !sequence_newer(seq, self.last_received_seq) {
                continue;
            }
            let distance = sequence_distance(seq, self.last_received_seq);
            if best
                .as_ref()
                .map_or(true, |(best_distance, _)| distance > *best_distance)
            {
                best = Some((distance, message));
            }
        }

        if let Some((_, message)) = best {
            if let Some(seq) = message.seq() {
                self.last_received_seq = seq;
            }
            trace!(
                "released seq {} on sequenced channel, discarded {} stale",
                self.last_received_seq,
                dropped - 1
            );
            output.push(message);
        }
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}
