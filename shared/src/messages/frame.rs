//! Per-message framing inside a packet.
//!
//! ```text
//! u8        channel (0-31)
//! [u16]     sequence, only when the channel is ordered
//! u8[1-2]   payload length, compact
//! u8[1-2]   message type id, compact
//! u8[len]   payload
//! ```
//!
//! The sequence is written in host byte order.

use log::trace;

use crate::{
    constants::{COMPACT_MAX, MAX_CHANNELS},
    messages::{
        channels::channel_state::Channel,
        error::{FrameError, MessageQueueError},
        message_container::MessageContainer,
        message_kinds::MessageKinds,
    },
    serde::{compact_len, read_compact, write_compact, ByteReader, ByteWriter, SerdeErr},
    types::{ChannelIndex, MessageIndex, NetId},
};

const CHANNEL_SIZE: usize = 1;
const SEQUENCE_SIZE: usize = 2;

/// Bytes taken by one message inside a packet, header included
pub fn frame_size(ordered: bool, payload_len: usize, net_id: NetId) -> usize {
    let sequence_size = if ordered { SEQUENCE_SIZE } else { 0 };
    CHANNEL_SIZE + sequence_size + compact_len(payload_len) + compact_len(net_id as usize) + payload_len
}

/// Header preceding each message payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub channel: ChannelIndex,
    pub seq: Option<MessageIndex>,
    pub length: u16,
    pub net_id: NetId,
}

impl FrameHeader {
    fn write(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        writer.write_u8(self.channel);
        if let Some(seq) = self.seq {
            writer.write_u16(seq);
        }
        write_compact(writer, self.length)?;
        write_compact(writer, self.net_id)
    }

    fn read(
        channel: ChannelIndex,
        reader: &mut ByteReader,
        channels: &[Channel],
    ) -> Result<Self, FrameError> {
        if channel as usize >= MAX_CHANNELS {
            return Err(FrameError::InvalidChannel { channel });
        }
        let settings = channels
            .get(channel as usize)
            .and_then(|slot| slot.settings())
            .ok_or(FrameError::ChannelNotConfigured { channel })?;

        let seq = if settings.ordered {
            Some(
                reader
                    .read_u16()
                    .map_err(|_| FrameError::TruncatedSequence { channel })?,
            )
        } else {
            None
        };
        let length =
            read_compact(reader).map_err(|_| FrameError::TruncatedLength { channel })?;
        let net_id =
            read_compact(reader).map_err(|_| FrameError::TruncatedMessageType { channel })?;

        Ok(Self {
            channel,
            seq,
            length,
            net_id,
        })
    }
}

/// Serializes `message` into a standalone frame, ready to be appended to a
/// packet. Fails when the frame could never fit in a packet of
/// `max_packet_size` bytes.
pub fn encode_frame(
    message: &MessageContainer,
    ordered: bool,
    message_kinds: &MessageKinds,
    max_packet_size: usize,
) -> Result<Vec<u8>, MessageQueueError> {
    let net_id = message_kinds.net_id_of(&message.kind())?;

    let mut payload = ByteWriter::with_capacity(message.message().serialized_size());
    message.message().write(&mut payload);

    let size = frame_size(ordered, payload.len(), net_id);
    let too_large = || MessageQueueError::MessageTooLarge {
        message_name: message.name(),
        frame_size: size,
        max_packet_size,
    };
    if size > max_packet_size || payload.len() > COMPACT_MAX as usize {
        return Err(too_large());
    }

    let header = FrameHeader {
        channel: message.channel(),
        seq: if ordered { message.seq() } else { None },
        length: payload.len() as u16,
        net_id,
    };
    let mut writer = ByteWriter::with_capacity(size);
    header.write(&mut writer).map_err(|_| too_large())?;
    writer.write_bytes(payload.as_slice());
    Ok(writer.to_bytes())
}

/// Splits a received packet into its messages. Either every frame decodes
/// or the packet is rejected as a whole.
pub fn deframe_packet(
    packet: &[u8],
    channels: &[Channel],
    message_kinds: &MessageKinds,
) -> Result<Vec<MessageContainer>, FrameError> {
    let mut reader = ByteReader::new(packet);
    let mut output = Vec::new();

    while let Ok(channel) = reader.read_u8() {
        let header = FrameHeader::read(channel, &mut reader, channels)?;
        let expected = header.length as usize;
        let available = reader.remaining();
        let payload = reader
            .read_bytes(expected)
            .map_err(|_| FrameError::TruncatedPayload {
                channel,
                expected,
                available,
            })?;

        let builder = message_kinds
            .builder(header.net_id)
            .ok_or(FrameError::UnknownMessageType {
                channel,
                net_id: header.net_id,
            })?;
        let message_name = builder.name();

        let mut payload_reader = ByteReader::new(payload);
        let message = builder
            .read(&mut payload_reader)
            .map_err(|_| FrameError::MalformedPayload {
                channel,
                message_name,
            })?;
        if !payload_reader.is_empty() {
            return Err(FrameError::TrailingPayloadBytes {
                channel,
                message_name,
                remaining: payload_reader.remaining(),
            });
        }

        trace!("deframed `{}` on channel {} seq {:?}", message_name, channel, header.seq);
        output.push(MessageContainer::new(channel, header.seq, message));
    }

    Ok(output)
}
