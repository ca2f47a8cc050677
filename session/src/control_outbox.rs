use std::time::Instant;

use log::debug;

use tidewire_shared::{PacketTag, ReliableConnection, ReliableSubPacket, ResendPolicy};

use crate::peer_id::PeerId;

/// What a pending control packet describes. A newer packet for the same
/// slot replaces the older one, so only the latest state is retransmitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlSlot {
    PeerId,
    SessionState,
    PeerState(PeerId),
}

struct OutgoingControl {
    slot: ControlSlot,
    packet: Vec<u8>,
    sent: Option<(PacketTag, Instant)>,
}

/// Control packets addressed to one connection that have not been
/// acknowledged yet
pub struct ControlOutbox {
    entries: Vec<OutgoingControl>,
    next_tag: PacketTag,
}

impl ControlOutbox {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_tag: PacketTag::new(0),
        }
    }

    /// Queues `packet`, dropping any older packet still pending for `slot`.
    /// It goes out on the next `flush`.
    pub fn push(&mut self, slot: ControlSlot, packet: Vec<u8>) {
        self.entries.retain(|entry| entry.slot != slot);
        self.entries.push(OutgoingControl {
            slot,
            packet,
            sent: None,
        });
    }

    /// Forgets the packet sent under `tag`, if it is still pending
    pub fn on_acked(&mut self, tag: PacketTag) {
        self.entries
            .retain(|entry| !matches!(entry.sent, Some((sent_tag, _)) if sent_tag == tag));
    }

    /// Sends packets never sent so far, and resends under a fresh tag those
    /// whose timeout expired
    pub fn flush<C: ReliableConnection>(
        &mut self,
        connection: &mut C,
        now: &Instant,
        resend: &ResendPolicy,
    ) {
        let latency = connection.latency();
        let mut packets = Vec::new();

        for entry in self.entries.iter_mut() {
            if let Some((tag, time_sent)) = entry.sent {
                if !resend.is_expired(&time_sent, now, latency) {
                    continue;
                }
                debug!("control packet {} for {:?} timed out, resending", tag, entry.slot);
            }
            let tag = self.next_tag.take_next();
            entry.sent = Some((tag, *now));
            packets.push(ReliableSubPacket::new(tag, entry.packet.clone()));
        }

        if !packets.is_empty() {
            connection.send_tagged(packets);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ControlOutbox {
    fn default() -> Self {
        Self::new()
    }
}
