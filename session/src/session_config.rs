use tidewire_shared::ResendPolicy;

/// The host occupies one of the `max_clients` slots itself
pub const HOST_COUNTS_AS_CLIENT: usize = 1;

/// Contains NetworkSession configuration parameters
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Participants allowed in a hosted session, host included. Peer ids are
    /// an `i8` on the wire, so values above 128 are clamped.
    pub max_clients: usize,
    /// Retransmission timing of control packets
    pub control_resend: ResendPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_clients: 8,
            control_resend: ResendPolicy::default(),
        }
    }
}
