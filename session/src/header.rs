use tidewire_shared::{ByteReader, ByteWriter};

use crate::error::ProtocolViolation;

/// Size of the header prepended to every session packet
pub const SESSION_HEADER_SIZE: usize = 2;

/// What a session packet carries and who consumes it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionMessageType {
    /// Application data for every participant, relayed by the host
    ToPeers = 0,
    /// Application data consumed by the host only
    ToMaster = 1,
    /// Session control, never reaches the application
    Control = 2,
}

impl TryFrom<u8> for SessionMessageType {
    type Error = ProtocolViolation;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SessionMessageType::ToPeers),
            1 => Ok(SessionMessageType::ToMaster),
            2 => Ok(SessionMessageType::Control),
            _ => Err(ProtocolViolation::UnknownMessageType { value }),
        }
    }
}

/// `[type: u8][src_peer_id: i8]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionHeader {
    pub message_type: SessionMessageType,
    pub src_peer_id: i8,
}

impl SessionHeader {
    pub fn new(message_type: SessionMessageType, src_peer_id: i8) -> Self {
        Self {
            message_type,
            src_peer_id,
        }
    }

    pub fn write(&self, writer: &mut ByteWriter) {
        writer.write_u8(self.message_type as u8);
        writer.write_i8(self.src_peer_id);
    }

    pub fn read(reader: &mut ByteReader) -> Result<Self, ProtocolViolation> {
        let message_type = reader
            .read_u8()
            .map_err(|_| ProtocolViolation::MalformedHeader)?;
        let src_peer_id = reader
            .read_i8()
            .map_err(|_| ProtocolViolation::MalformedHeader)?;
        Ok(Self {
            message_type: SessionMessageType::try_from(message_type)?,
            src_peer_id,
        })
    }

    /// Builds a complete packet: this header followed by `payload`
    pub fn packet(&self, payload: &[u8]) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(SESSION_HEADER_SIZE + payload.len());
        self.write(&mut writer);
        writer.write_bytes(payload);
        writer.to_bytes()
    }
}
