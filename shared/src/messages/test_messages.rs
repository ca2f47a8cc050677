use crate::{
    messages::message::Message,
    serde::{ByteReader, ByteWriter, SerdeErr},
};

#[derive(Debug, PartialEq)]
pub struct Ping {
    pub value: u32,
}

impl Message for Ping {
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

/// Raw bytes, the payload is the whole frame body
#[derive(Debug, PartialEq)]
pub struct Blob {
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn of_len(length: usize) -> Self {
        Self {
            bytes: vec![0xAB; length],
        }
    }
}

impl Message for Blob {
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
