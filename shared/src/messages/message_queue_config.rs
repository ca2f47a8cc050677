use crate::{constants::MAX_PACKET_SIZE, resend_policy::ResendPolicy};

/// Contains MessageQueue configuration parameters
#[derive(Clone, Debug)]
pub struct MessageQueueConfig {
    /// Largest packet the queue will build, in bytes. Also the hard ceiling
    /// for a single message frame.
    pub max_packet_size: usize,
    /// When unacknowledged packets are retransmitted (reliable) or forgotten
    /// (unreliable)
    pub resend: ResendPolicy,
}

impl Default for MessageQueueConfig {
    fn default() -> Self {
        Self {
            max_packet_size: MAX_PACKET_SIZE,
            resend: ResendPolicy::default(),
        }
    }
}
