//! # Tidewire Shared
//! Channel multiplexing, ordering and retransmission of typed messages over
//! an unreliable packet transport. Shared by tidewire-session and
//! applications that drive a MessageQueue directly.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod constants;
mod error;
mod messages;
mod resend_policy;
mod serde;
mod transport;
mod types;
mod wrapping_number;

pub use constants::{
    COMPACT_MAX, MAX_CHANNELS, MAX_PACKET_SIZE, MIN_RESEND_INTERVAL, RESEND_LATENCY_FACTOR,
    SEQUENCE_WINDOW,
};
pub use error::TidewireError;
pub use messages::{
    channels::{
        channel::{ChannelMode, ChannelSettings},
        channel_state::Channel,
    },
    error::{FrameError, MessageKindsError, MessageQueueError},
    frame::{deframe_packet, encode_frame, frame_size, FrameHeader},
    message::{AsAny, Message, MessageBuilder, MessageKind},
    message_container::MessageContainer,
    message_kinds::MessageKinds,
    message_queue::MessageQueue,
    message_queue_config::MessageQueueConfig,
    pending_packet::PendingPacket,
};
pub use resend_policy::ResendPolicy;
pub use serde::{compact_len, read_compact, write_compact, ByteReader, ByteWriter, SerdeErr};
pub use transport::{
    Connection, ConnectionStatus, NetworkService, ReliableConnection, ReliableSubPacket,
    TransportError,
};
pub use types::{ChannelIndex, MessageIndex, NetId, PacketTag};
pub use wrapping_number::{sequence_distance, sequence_newer};
