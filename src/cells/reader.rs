use thiserror::Error;

/// The error produced when a read runs past the end of a cell. Marker
/// decoding treats this as "no marker", so it carries no further detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("read past the end of the cell")]
pub struct ReadError;

/// A bit-stream over a cell's data, seekable to any offset. Bits are
/// consumed most significant first.
#[derive(Debug, Clone)]
pub struct CellReader<'a> {
    data: &'a [u8],
    bit_len: u32,
    pos: u32,
}

impl<'a> CellReader<'a> {
    pub(super) fn new(data: &'a [u8], bit_len: u32) -> Self {
        Self {
            data,
            bit_len,
            pos: 0,
        }
    }

    /// The number of unread bits left in the stream
    pub fn remaining(&self) -> u32 {
        self.bit_len - self.pos
    }

    /// Advance the stream by `bits` without reading them
    pub fn skip(&mut self, bits: u32) -> Result<(), ReadError> {
        if bits > self.remaining() {
            return Err(ReadError);
        }
        self.pos += bits;
        Ok(())
    }

    pub fn read_bit(&mut self) -> Result<bool, ReadError> {
        if self.remaining() == 0 {
            return Err(ReadError);
        }
        let byte = self.data[(self.pos / 8) as usize];
        let bit = byte >> (7 - self.pos % 8) & 1 == 1;
        self.pos += 1;
        Ok(bit)
    }

    /// Read `bits` bits as an unsigned integer, most significant first.
    /// `bits` may be at most 64.
    pub fn read_uint(&mut self, bits: u32) -> Result<u64, ReadError> {
        assert!(bits <= 64, "read_uint width must be at most 64");
        if bits > self.remaining() {
            return Err(ReadError);
        }
        let mut value = 0u64;
        for _ in 0..bits {
            value = value << 1 | self.read_bit()? as u64;
        }
        Ok(value)
    }

    /// Read `count` whole bytes. The read need not be byte-aligned.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, ReadError> {
        if count as u64 * 8 > self.remaining() as u64 {
            return Err(ReadError);
        }
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.read_uint(8)? as u8);
        }
        Ok(out)
    }
}
