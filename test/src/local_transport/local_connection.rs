use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use log::trace;

use tidewire_shared::{
    Connection, ConnectionStatus, PacketTag, ReliableConnection, ReliableSubPacket,
};

use super::link_conditioner::LinkConditionerConfig;

struct InboundPacket {
    payload: Vec<u8>,
    tag: Option<PacketTag>,
}

#[derive(Default)]
struct Endpoint {
    inbound: VecDeque<InboundPacket>,
    acks: Vec<PacketTag>,
    sent_count: usize,
}

struct LinkState {
    ends: [Endpoint; 2],
    closed: bool,
    conditioner: LinkConditionerConfig,
    rng: fastrand::Rng,
}

impl LinkState {
    // Applies the conditioner and queues the packet on the other end
    fn transmit(&mut self, from: usize, payload: Vec<u8>, tag: Option<PacketTag>) {
        self.ends[from].sent_count += 1;
        if self.closed {
            return;
        }
        if self.rng.f32() < self.conditioner.loss_rate {
            trace!("link dropped packet {:?}", tag);
            return;
        }
        let copies = if self.rng.f32() < self.conditioner.duplicate_rate {
            2
        } else {
            1
        };
        for _ in 0..copies {
            let packet = InboundPacket {
                payload: payload.clone(),
                tag,
            };
            let inbound = &mut self.ends[1 - from].inbound;
            if !inbound.is_empty() && self.rng.f32() < self.conditioner.reorder_rate {
                let position = self.rng.usize(..=inbound.len());
                inbound.insert(position, packet);
            } else {
                inbound.push_back(packet);
            }
        }
    }
}

/// One end of an in-memory link. Tagged packets are acknowledged back to
/// the sender when the other end reads them.
pub struct LocalConnection {
    link: Arc<Mutex<LinkState>>,
    side: usize,
}

impl LocalConnection {
    /// Two connected ends sharing one conditioned link
    pub fn pair(conditioner: LinkConditionerConfig, seed: u64) -> (LocalConnection, LocalConnection) {
        let link = Arc::new(Mutex::new(LinkState {
            ends: [Endpoint::default(), Endpoint::default()],
            closed: false,
            conditioner,
            rng: fastrand::Rng::with_seed(seed),
        }));
        (
            LocalConnection {
                link: link.clone(),
                side: 0,
            },
            LocalConnection { link, side: 1 },
        )
    }

    // Second handle on the same end, used by the network to reach every link
    pub(crate) fn clone_handle(&self) -> LocalConnection {
        LocalConnection {
            link: self.link.clone(),
            side: self.side,
        }
    }

    fn state(&self) -> MutexGuard<'_, LinkState> {
        self.link
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Changes the impairments of the whole link, both directions
    pub fn set_conditioner(&self, conditioner: LinkConditionerConfig) {
        self.state().conditioner = conditioner;
    }

    /// Packets waiting to be read on this end
    pub fn inbound_len(&self) -> usize {
        self.state().ends[self.side].inbound.len()
    }

    /// Packets this end has handed to the link, dropped ones included
    pub fn sent_count(&self) -> usize {
        self.state().ends[self.side].sent_count
    }

    /// Forgets everything in flight towards this end
    pub fn discard_inbound(&self) {
        self.state().ends[self.side].inbound.clear();
    }

    /// Queues a raw packet on this end as if the remote had sent it
    pub fn inject(&self, payload: Vec<u8>) {
        self.state().ends[self.side]
            .inbound
            .push_back(InboundPacket { payload, tag: None });
    }
}

impl Connection for LocalConnection {
    fn status(&self) -> ConnectionStatus {
        if self.state().closed {
            ConnectionStatus::Closed
        } else {
            ConnectionStatus::Open
        }
    }

    fn send(&mut self, packet: Vec<u8>) {
        let side = self.side;
        self.state().transmit(side, packet, None);
    }

    fn receive(&mut self) -> Option<Vec<u8>> {
        let side = self.side;
        let mut state = self.state();
        let packet = state.ends[side].inbound.pop_front()?;
        if let Some(tag) = packet.tag {
            state.ends[1 - side].acks.push(tag);
        }
        Some(packet.payload)
    }

    fn latency(&self) -> Duration {
        self.state().conditioner.latency
    }

    fn close(&mut self) {
        self.state().closed = true;
    }
}

impl ReliableConnection for LocalConnection {
    fn send_tagged(&mut self, packets: Vec<ReliableSubPacket>) {
        let side = self.side;
        let mut state = self.state();
        for packet in packets {
            state.transmit(side, packet.payload, Some(packet.tag));
        }
    }

    fn drain_acks(&mut self) -> Vec<PacketTag> {
        let side = self.side;
        std::mem::take(&mut self.state().ends[side].acks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_and_acks_on_read() {
        let (mut a, mut b) = LocalConnection::pair(LinkConditionerConfig::perfect(), 1);
        a.send_tagged(vec![ReliableSubPacket::new(PacketTag::new(4), vec![1, 2])]);

        assert!(a.drain_acks().is_empty());
        assert_eq!(b.receive(), Some(vec![1, 2]));
        assert_eq!(a.drain_acks(), vec![PacketTag::new(4)]);
        assert!(a.drain_acks().is_empty());
    }

    #[test]
    fn close_is_seen_by_both_ends() {
        let (mut a, b) = LocalConnection::pair(LinkConditionerConfig::perfect(), 1);
        a.close();

        assert!(b.status().is_closed());
        assert!(a.status().is_closed());
    }

    #[test]
    fn severed_link_drops_everything() {
        let (mut a, mut b) = LocalConnection::pair(LinkConditionerConfig::severed(), 1);
        a.send(vec![1]);

        assert_eq!(b.receive(), None);
        assert_eq!(a.sent_count(), 1);
    }
}
