use tidewire_shared::ReliableConnection;

use crate::{control_outbox::ControlOutbox, peer_id::PeerId};

/// One connection of a session. On a client the only peer is the host.
pub struct Peer<C: ReliableConnection> {
    pub connection: C,
    pub peer_id: PeerId,
    pub outbox: ControlOutbox,
}

impl<C: ReliableConnection> Peer<C> {
    pub fn new(connection: C, peer_id: PeerId) -> Self {
        Self {
            connection,
            peer_id,
            outbox: ControlOutbox::new(),
        }
    }
}
