use std::time::Duration;

/// Impairments applied to every packet crossing a local link
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkConditionerConfig {
    /// Probability that a packet is dropped
    pub loss_rate: f32,
    /// Probability that a packet is inserted at a random position of the
    /// receive queue instead of its tail
    pub reorder_rate: f32,
    /// Probability that a delivered packet is delivered a second time
    pub duplicate_rate: f32,
    /// Round trip reported by `Connection::latency`
    pub latency: Duration,
}

impl LinkConditionerConfig {
    pub fn new(loss_rate: f32, reorder_rate: f32, duplicate_rate: f32) -> Self {
        Self {
            loss_rate,
            reorder_rate,
            duplicate_rate,
            latency: Duration::ZERO,
        }
    }

    /// Every packet arrives, in order, exactly once
    pub fn perfect() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Nothing arrives
    pub fn severed() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    pub fn poor() -> Self {
        Self::new(0.2, 0.3, 0.05)
    }
}

impl Default for LinkConditionerConfig {
    fn default() -> Self {
        Self::perfect()
    }
}
