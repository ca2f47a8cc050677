use std::mem;

use crate::messages::{error::MessageQueueError, message_container::MessageContainer};

/// A message waiting to be packed, together with its encoded frame
pub struct OutboundMessage {
    pub message: MessageContainer,
    pub frame: Vec<u8>,
    pub reliable: bool,
}

/// Packet contents produced by one packing pass
pub struct BuiltPacket {
    pub messages: Vec<MessageContainer>,
    pub payload: Vec<u8>,
    pub reliable: bool,
}

/// Greedy packer. Each pass walks the outbound list once, and a message
/// joins the packet if it is the first one, or if it shares the packet's
/// reliability and still fits. Everything else keeps its place in the list
/// for the next pass.
pub struct PacketBuilder {
    max_packet_size: usize,
}

impl PacketBuilder {
    pub fn new(max_packet_size: usize) -> Self {
        Self { max_packet_size }
    }

    /// Builds the next packet out of `outbound`. Returns `Ok(None)` once the
    /// list is empty. If the first message cannot fit even in an empty packet
    /// it is removed from the list and reported.
    pub fn build_packet(
        &self,
        outbound: &mut Vec<OutboundMessage>,
    ) -> Result<Option<BuiltPacket>, MessageQueueError> {
        let Some(first) = outbound.first() else {
            return Ok(None);
        };
        if first.frame.len() > self.max_packet_size {
            let rejected = outbound.remove(0);
            return Err(MessageQueueError::MessageTooLarge {
                message_name: rejected.message.name(),
                frame_size: rejected.frame.len(),
                max_packet_size: self.max_packet_size,
            });
        }
        let reliable = first.reliable;

        let mut packet = BuiltPacket {
            messages: Vec::new(),
            payload: Vec::with_capacity(self.max_packet_size),
            reliable,
        };
        let mut remaining = Vec::new();

        for outbound_message in mem::take(outbound) {
            let fits = packet.payload.len() + outbound_message.frame.len() <= self.max_packet_size;
            let joins = packet.messages.is_empty() || (outbound_message.reliable == reliable && fits);
            if joins {
                packet.payload.extend_from_slice(&outbound_message.frame);
                packet.messages.push(outbound_message.message);
            } else {
                remaining.push(outbound_message);
            }
        }

        *outbound = remaining;
        Ok(Some(packet))
    }
}
