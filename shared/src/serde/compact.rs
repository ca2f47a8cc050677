//! The 1-2 byte length encoding used for frame lengths and message type ids.
//!
//! Values below 128 take a single byte. Larger values set the top bit of
//! the first byte as a continuation flag; its lower 7 bits hold the high
//! bits of the value and the second byte holds the low 8 bits.

use super::{ByteReader, ByteWriter, SerdeErr};
use crate::constants::{COMPACT_MAX, COMPACT_ONE_BYTE_LIMIT};

const CONTINUATION_BIT: u8 = 0x80;

/// Number of bytes `value` occupies once encoded
pub fn compact_len(value: usize) -> usize {
    if value < COMPACT_ONE_BYTE_LIMIT as usize {
        1
    } else {
        2
    }
}

pub fn write_compact(writer: &mut ByteWriter, value: u16) -> Result<(), SerdeErr> {
    if value > COMPACT_MAX {
        return Err(SerdeErr);
    }
    if value < COMPACT_ONE_BYTE_LIMIT {
        writer.write_u8(value as u8);
    } else {
        writer.write_u8(CONTINUATION_BIT | (value >> 8) as u8);
        writer.write_u8((value & 0xFF) as u8);
    }
    Ok(())
}

pub fn read_compact(reader: &mut ByteReader) -> Result<u16, SerdeErr> {
    let first = reader.read_u8()?;
    if first & CONTINUATION_BIT == 0 {
        return Ok(u16::from(first));
    }
    let second = reader.read_u8()?;
    Ok((u16::from(first & !CONTINUATION_BIT) << 8) | u16::from(second))
}
