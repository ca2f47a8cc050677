use thiserror::Error;

use crate::types::{ChannelIndex, NetId};

/// Errors that can occur during message kind operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageKindsError {
    /// Message type registered twice
    #[error("Message type `{name}` is already registered. Each Message type may only be added once")]
    AlreadyRegistered { name: &'static str },

    /// Network ID not found in registry
    #[error("Network ID {net_id} not found in message registry. Message type must be registered via add_message()")]
    NetIdNotFound { net_id: NetId },

    /// Message kind not found in registry
    #[error("Message kind not found in registry. Message type must be registered via add_message()")]
    MessageKindNotFound,

    /// No more wire ids can be handed out
    #[error("Message registry is full: at most {limit} Message types can be encoded on the wire")]
    NetIdSpaceExhausted { limit: u16 },
}

/// Configuration and capacity errors raised by the MessageQueue. These point
/// at a mistake in the calling code and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageQueueError {
    /// Channel index outside of the fixed slot range
    #[error("Channel index {channel} is invalid. Channels are numbered 0 to {max}")]
    InvalidChannel { channel: usize, max: usize },

    /// set_channel() called twice for the same slot
    #[error("Channel {channel} is already configured. Channel settings can only be set once")]
    ChannelAlreadyConfigured { channel: ChannelIndex },

    /// Channel used before set_channel()
    #[error("Channel {channel} is not configured. Call set_channel() before using it")]
    ChannelNotConfigured { channel: ChannelIndex },

    /// A single message cannot fit in an empty packet
    #[error("Message `{message_name}` needs {frame_size} bytes but a packet holds at most {max_packet_size} bytes. Split the data into smaller messages")]
    MessageTooLarge {
        message_name: &'static str,
        frame_size: usize,
        max_packet_size: usize,
    },

    /// Message kinds error
    #[error("Message kinds error: {0}")]
    MessageKinds(#[from] MessageKindsError),
}

/// Errors found while deframing a received packet. Any of these rejects the
/// whole packet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Channel byte outside of the slot range
    #[error("Invalid channel index {channel} in received packet (valid range: 0-31). This may indicate a malformed or malicious packet")]
    InvalidChannel { channel: u8 },

    /// Channel byte names a slot that was never configured
    #[error("Received message on unconfigured channel {channel}")]
    ChannelNotConfigured { channel: ChannelIndex },

    /// Packet ended inside the sequence field
    #[error("Packet truncated while reading the sequence of a message on channel {channel}")]
    TruncatedSequence { channel: ChannelIndex },

    /// Packet ended inside the length field
    #[error("Packet truncated while reading the length of a message on channel {channel}")]
    TruncatedLength { channel: ChannelIndex },

    /// Packet ended inside the message type field
    #[error("Packet truncated while reading the message type of a message on channel {channel}")]
    TruncatedMessageType { channel: ChannelIndex },

    /// Packet ended inside the payload
    #[error("Packet truncated: message on channel {channel} declares {expected} payload bytes but only {available} remain")]
    TruncatedPayload {
        channel: ChannelIndex,
        expected: usize,
        available: usize,
    },

    /// Message type id not present in the registry
    #[error("Unknown message type {net_id} on channel {channel}. Both ends must register the same Message types in the same order")]
    UnknownMessageType { channel: ChannelIndex, net_id: NetId },

    /// Payload could not be decoded by its Message type
    #[error("Payload of `{message_name}` on channel {channel} could not be decoded (possible malformed or malicious data)")]
    MalformedPayload {
        channel: ChannelIndex,
        message_name: &'static str,
    },

    /// Message type decoded without consuming its whole payload
    #[error("Payload of `{message_name}` on channel {channel} left {remaining} bytes unread")]
    TrailingPayloadBytes {
        channel: ChannelIndex,
        message_name: &'static str,
        remaining: usize,
    },
}
