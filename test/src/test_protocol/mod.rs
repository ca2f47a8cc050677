//! Messages and channel layout shared by the integration tests

use tidewire_shared::{
    ByteReader, ByteWriter, ChannelSettings, Message, MessageKinds, MessageQueue,
    MessageQueueConfig, ReliableConnection, SerdeErr,
};

pub const ORDERED_RELIABLE: usize = 0;
pub const UNORDERED_RELIABLE: usize = 1;
pub const SEQUENCED_UNRELIABLE: usize = 2;
pub const UNORDERED_UNRELIABLE: usize = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Message for Position {
    fn write(&self, writer: &mut ByteWriter) {
        writer.write_f32(self.x);
        writer.write_f32(self.y);
    }

    fn read(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            x: reader.read_f32()?,
            y: reader.read_f32()?,
        })
    }

    fn serialized_size(&self) -> usize {
        8
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatLine {
    pub author: String,
    pub text: String,
}

impl ChatLine {
    pub fn new(author: &str, text: &str) -> Self {
        Self {
            author: author.to_string(),
            text: text.to_string(),
        }
    }
}

impl Message for ChatLine {
    fn write(&self, writer: &mut ByteWriter) {
        writer.write_str(&self.author);
        writer.write_str(&self.text);
    }

    fn read(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            author: reader.read_str()?,
            text: reader.read_str()?,
        })
    }
}

/// Carries its own position in a stream, so tests can check delivery order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Counter {
    pub value: u32,
}

impl Message for Counter {
    fn write(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.value);
    }

    fn read(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            value: reader.read_u32()?,
        })
    }

    fn serialized_size(&self) -> usize {
        4
    }
}

/// Opaque bytes of arbitrary length, for packing tests
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    pub bytes: Vec<u8>,
}

impl Payload {
    pub fn filled(length: usize, byte: u8) -> Self {
        Self {
            bytes: vec![byte; length],
        }
    }
}

impl Message for Payload {
    fn write(&self, writer: &mut ByteWriter) {
        writer.write_bytes(&self.bytes);
    }

    fn read(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            bytes: reader.read_remaining().to_vec(),
        })
    }

    fn serialized_size(&self) -> usize {
        self.bytes.len()
    }
}

/// Registry with every test message, in a fixed order
pub fn message_kinds() -> MessageKinds {
    let mut kinds = MessageKinds::new();
    kinds.add_message::<Position>();
    kinds.add_message::<ChatLine>();
    kinds.add_message::<Counter>();
    kinds.add_message::<Payload>();
    kinds
}

/// A queue over `connection` with the test messages registered and the four
/// test channels configured
pub fn message_queue<C: ReliableConnection>(connection: C) -> MessageQueue<C> {
    let mut queue =
        MessageQueue::with_kinds(connection, MessageQueueConfig::default(), message_kinds());
    queue.set_channel(ORDERED_RELIABLE, ChannelSettings::ordered_reliable());
    queue.set_channel(UNORDERED_RELIABLE, ChannelSettings::unordered_reliable());
    queue.set_channel(
        SEQUENCED_UNRELIABLE,
        ChannelSettings::sequenced_unreliable().keep_last_sent(),
    );
    queue.set_channel(UNORDERED_UNRELIABLE, ChannelSettings::unordered_unreliable());
    queue
}
