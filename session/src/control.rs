use tidewire_shared::{ByteReader, ByteWriter, SerdeErr};

use crate::{
    error::ProtocolViolation,
    header::{SessionHeader, SessionMessageType},
};

const SET_PEER_ID: u8 = 0;
const SET_SESSION_STATE: u8 = 1;
const SET_PEER_STATE: u8 = 2;

/// Control sub-protocol carried by `SessionMessageType::Control` packets.
/// Peer ids are raw wire values here; the session validates them.
///
/// State blobs carry a wrapping version stamped by their owner. Receivers
/// only apply a blob whose version is newer than the last one applied for
/// the same target, so a stale blob overtaken on the wire is ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlMessage {
    /// Host tells a newcomer which id it was given, and the version its own
    /// state blobs continue from
    SetPeerId { peer_id: i8, base_version: u16 },
    /// Host publishes the session-wide shared data
    SetSessionState { version: u16, state: Vec<u8> },
    /// A peer publishes its own shared data, relayed by the host
    SetPeerState {
        peer_id: i8,
        version: u16,
        state: Vec<u8>,
    },
}

impl ControlMessage {
    pub fn name(&self) -> &'static str {
        match self {
            ControlMessage::SetPeerId { .. } => "SetPeerId",
            ControlMessage::SetSessionState { .. } => "SetSessionState",
            ControlMessage::SetPeerState { .. } => "SetPeerState",
        }
    }

    pub fn write(&self, writer: &mut ByteWriter) {
        match self {
            ControlMessage::SetPeerId {
                peer_id,
                base_version,
            } => {
                writer.write_u8(SET_PEER_ID);
                writer.write_i8(*peer_id);
                writer.write_u16(*base_version);
            }
            ControlMessage::SetSessionState { version, state } => {
                writer.write_u8(SET_SESSION_STATE);
                writer.write_u16(*version);
                writer.write_bytes(state);
            }
            ControlMessage::SetPeerState {
                peer_id,
                version,
                state,
            } => {
                writer.write_u8(SET_PEER_STATE);
                writer.write_i8(*peer_id);
                writer.write_u16(*version);
                writer.write_bytes(state);
            }
        }
    }

    /// Reads a control message spanning the rest of the packet
    pub fn read(reader: &mut ByteReader) -> Result<Self, ProtocolViolation> {
        let control_type = reader
            .read_u8()
            .map_err(|_| ProtocolViolation::MalformedControl)?;
        match control_type {
            SET_PEER_ID => {
                let peer_id = read_field(reader.read_i8())?;
                let base_version = read_field(reader.read_u16())?;
                Ok(ControlMessage::SetPeerId {
                    peer_id,
                    base_version,
                })
            }
            SET_SESSION_STATE => {
                let version = read_field(reader.read_u16())?;
                Ok(ControlMessage::SetSessionState {
                    version,
                    state: reader.read_remaining().to_vec(),
                })
            }
            SET_PEER_STATE => {
                let peer_id = read_field(reader.read_i8())?;
                let version = read_field(reader.read_u16())?;
                Ok(ControlMessage::SetPeerState {
                    peer_id,
                    version,
                    state: reader.read_remaining().to_vec(),
                })
            }
            value => Err(ProtocolViolation::UnknownControlType { value }),
        }
    }

    /// Complete session packet carrying this control message
    pub fn packet(&self, src_peer_id: i8) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        SessionHeader::new(SessionMessageType::Control, src_peer_id).write(&mut writer);
        self.write(&mut writer);
        writer.to_bytes()
    }
}

fn read_field<T>(result: Result<T, SerdeErr>) -> Result<T, ProtocolViolation> {
    result.map_err(|_| ProtocolViolation::MalformedControl)
}
