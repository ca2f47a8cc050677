use super::SerdeErr;

/// Cursor over a received byte buffer. Every read is bounds-checked and
/// fails with `SerdeErr` instead of panicking, since the input comes from
/// the network.
pub struct ByteReader<'b> {
    buffer: &'b [u8],
    cursor: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], SerdeErr> {
        let bytes = self.read_bytes(N)?;
        let mut output = [0u8; N];
        output.copy_from_slice(bytes);
        Ok(output)
    }

    pub fn read_u8(&mut self) -> Result<u8, SerdeErr> {
        let [byte] = self.take::<1>()?;
        Ok(byte)
    }

    pub fn read_i8(&mut self) -> Result<i8, SerdeErr> {
        Ok(i8::from_ne_bytes(self.take::<1>()?))
    }

    pub fn read_bool(&mut self) -> Result<bool, SerdeErr> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(SerdeErr),
        }
    }

    pub fn read_u16(&mut self) -> Result<u16, SerdeErr> {
        Ok(u16::from_ne_bytes(self.take::<2>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, SerdeErr> {
        Ok(u32::from_ne_bytes(self.take::<4>()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, SerdeErr> {
        Ok(i32::from_ne_bytes(self.take::<4>()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, SerdeErr> {
        Ok(f32::from_ne_bytes(self.take::<4>()?))
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<&'b [u8], SerdeErr> {
        if self.remaining() < length {
            return Err(SerdeErr);
        }
        let start = self.cursor;
        self.cursor += length;
        Ok(&self.buffer[start..self.cursor])
    }

    pub fn read_str(&mut self) -> Result<String, SerdeErr> {
        let length = self.read_u16()? as usize;
        let bytes = self.read_bytes(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| SerdeErr)
    }

    /// Consumes and returns everything left in the buffer
    pub fn read_remaining(&mut self) -> &'b [u8] {
        let start = self.cursor;
        self.cursor = self.buffer.len();
        &self.buffer[start..]
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}
