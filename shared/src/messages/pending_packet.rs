use std::time::Instant;

use crate::messages::message_container::MessageContainer;

/// A packet handed to the transport and not yet acknowledged. Owns the
/// messages it carries until it is acked or given up on.
pub struct PendingPacket {
    pub messages: Vec<MessageContainer>,
    pub payload: Vec<u8>,
    pub reliable: bool,
    pub time_sent: Instant,
}

impl PendingPacket {
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}
