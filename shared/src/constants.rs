use std::time::Duration;

/// Number of channel slots available on every MessageQueue
pub const MAX_CHANNELS: usize = 32;

/// Largest packet payload the MessageQueue will build, in bytes. Any single
/// message whose frame (header + payload) exceeds this can never be sent.
pub const MAX_PACKET_SIZE: usize = 1200;

/// Half-range window used for every wrapping sequence comparison
pub const SEQUENCE_WINDOW: u16 = 0x7FFF;

/// Values below this are written in a single compact byte
pub const COMPACT_ONE_BYTE_LIMIT: u16 = 0x80;

/// Largest value the 1-2 byte compact encoding can carry
pub const COMPACT_MAX: u16 = 0x7FFF;

/// Lower bound of the retransmission timeout
pub const MIN_RESEND_INTERVAL: Duration = Duration::from_millis(100);

/// Retransmission timeout as a multiple of the measured latency
pub const RESEND_LATENCY_FACTOR: f32 = 3.0;
