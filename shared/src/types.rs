use std::fmt;

/// Per-channel message sequence number, wraps at 65536
pub type MessageIndex = u16;
/// Index of one of the fixed channel slots
pub type ChannelIndex = u8;
/// Wire index of a registered message type
pub type NetId = u16;

/// Opaque per-packet identifier, assigned when a packet is handed to the
/// transport and echoed back when that packet is acknowledged
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketTag(u32);

impl PacketTag {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Returns this tag and advances `self` to the following one
    pub fn take_next(&mut self) -> PacketTag {
        let current = *self;
        self.0 = self.0.wrapping_add(1);
        current
    }
}

impl fmt::Display for PacketTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
