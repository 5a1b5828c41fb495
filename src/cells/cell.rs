use std::fmt;
use std::rc::Rc;

use sha2::{Digest, Sha256};
use smallvec::SmallVec;

use super::reader::CellReader;
use super::{CellError, MAX_BITS, MAX_REFS};

/// The 32-byte content hash identifying a cell. Rendered as uppercase hex,
/// which is the form the emulator reports code positions in.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellHash([u8; 32]);

impl CellHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The uppercase-hex representation of the hash
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for CellHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellHash({self})")
    }
}

#[derive(Debug)]
struct CellInner {
    data: Vec<u8>,
    bit_len: u32,
    refs: SmallVec<[Cell; MAX_REFS]>,
    hash: CellHash,
    depth: u16,
}

/// An immutable node in the Merkle-like DAG of bit-strings making up a
/// contract's code. Cells are cheap to clone and compare by content hash.
#[derive(Clone, Debug)]
pub struct Cell(Rc<CellInner>);

impl Cell {
    /// The number of data bits stored in this cell
    pub fn bit_len(&self) -> u32 {
        self.0.bit_len
    }

    /// The raw data bytes. The final byte is zero-padded past `bit_len`.
    pub fn data(&self) -> &[u8] {
        &self.0.data
    }

    pub fn refs(&self) -> &[Cell] {
        &self.0.refs
    }

    pub fn hash(&self) -> CellHash {
        self.0.hash
    }

    /// Distance to the deepest leaf reachable from this cell
    pub fn depth(&self) -> u16 {
        self.0.depth
    }

    /// Open a bit-stream over this cell's data, positioned at bit zero
    pub fn reader(&self) -> CellReader<'_> {
        CellReader::new(&self.0.data, self.0.bit_len)
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.0.hash == other.0.hash
    }
}

impl Eq for Cell {}

/// Bit-level writer used to assemble cells. Bits are appended most
/// significant first, matching the order [CellReader] consumes them in.
#[derive(Debug, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: u32,
    refs: SmallVec<[Cell; MAX_REFS]>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of bits written so far
    pub fn bit_len(&self) -> u32 {
        self.bit_len
    }

    /// Append a single bit
    pub fn store_bit(&mut self, bit: bool) -> Result<(), CellError> {
        if self.bit_len >= MAX_BITS {
            return Err(CellError::CapacityExceeded(self.bit_len + 1));
        }
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            let last = self.data.last_mut().unwrap();
            *last |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
        Ok(())
    }

    /// Append the low `bits` bits of `value`, most significant first.
    /// `bits` may be at most 64.
    pub fn store_uint(
        &mut self,
        value: u64,
        bits: u32,
    ) -> Result<(), CellError> {
        assert!(bits <= 64, "store_uint width must be at most 64");
        if bits < 64 && value >> bits != 0 {
            return Err(CellError::ValueOutOfRange(bits));
        }
        if self.bit_len + bits > MAX_BITS {
            return Err(CellError::CapacityExceeded(self.bit_len + bits));
        }
        for i in (0..bits).rev() {
            self.store_bit(value >> i & 1 == 1)?;
        }
        Ok(())
    }

    /// Append whole bytes. The write need not be byte-aligned.
    pub fn store_slice(&mut self, bytes: &[u8]) -> Result<(), CellError> {
        for byte in bytes {
            self.store_uint(*byte as u64, 8)?;
        }
        Ok(())
    }

    /// Append a child reference
    pub fn store_ref(&mut self, cell: Cell) -> Result<(), CellError> {
        if self.refs.len() >= MAX_REFS {
            return Err(CellError::TooManyRefs);
        }
        self.refs.push(cell);
        Ok(())
    }

    /// Seal the builder into an immutable cell, computing its content hash
    pub fn build(self) -> Cell {
        let hash = representation_hash(&self.data, self.bit_len, &self.refs);
        let depth = self
            .refs
            .iter()
            .map(|r| r.depth() + 1)
            .max()
            .unwrap_or(0);

        Cell(Rc::new(CellInner {
            data: self.data,
            bit_len: self.bit_len,
            refs: self.refs,
            hash,
            depth,
        }))
    }
}

/// The standard representation hash for an ordinary cell: two descriptor
/// bytes, the data with a completion tag when the bit length is not a whole
/// number of bytes, then each child's depth and hash.
fn representation_hash(
    data: &[u8],
    bit_len: u32,
    refs: &[Cell],
) -> CellHash {
    let mut hasher = Sha256::new();

    let d1 = refs.len() as u8;
    let d2 = (bit_len / 8 + bit_len.div_ceil(8)) as u8;
    hasher.update([d1, d2]);

    if bit_len % 8 == 0 {
        hasher.update(data);
    } else {
        let mut padded = data.to_vec();
        let last = padded.last_mut().unwrap();
        *last |= 0x80 >> (bit_len % 8);
        hasher.update(&padded);
    }

    for r in refs {
        hasher.update(r.depth().to_be_bytes());
    }
    for r in refs {
        hasher.update(r.hash().as_bytes());
    }

    CellHash(hasher.finalize().into())
}
