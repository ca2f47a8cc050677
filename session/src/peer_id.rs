use std::fmt;

/// Identity of a participant in a session. The host is always `PeerId::HOST`.
/// Written on the wire as an `i8`, where a negative value means "unassigned".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(u8);

impl PeerId {
    pub const HOST: PeerId = PeerId(0);
    /// Largest id that still fits the wire encoding
    pub const MAX: PeerId = PeerId(i8::MAX as u8);

    /// Returns `None` if `value` cannot be encoded on the wire
    pub fn new(value: u8) -> Option<Self> {
        if value > Self::MAX.0 {
            return None;
        }
        Some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_host(&self) -> bool {
        *self == Self::HOST
    }

    /// Decodes a wire id, `None` for the unassigned marker
    pub fn from_wire(value: i8) -> Option<Self> {
        u8::try_from(value).ok().map(Self)
    }

    pub fn to_wire(self) -> i8 {
        self.0 as i8
    }

    /// Wire form of a possibly unassigned id
    pub fn wire_of(peer_id: Option<PeerId>) -> i8 {
        peer_id.map_or(-1, PeerId::to_wire)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
