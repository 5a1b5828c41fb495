//! Encoding and decoding of the debug markers the compiler embeds in
//! contract bytecode. A marker is a pseudo-instruction carrying a
//! [DebugInfoIndex] payload:
//!
//! ```text
//! opcode     : 12 bits, value 0xFEF
//! len_minus1 : 4 bits
//! payload    : (len_minus1 + 1) bytes of UTF-8, "DI" + decimal index
//! ```
//!
//! Markers are a best-effort signal. Decoding swallows every failure mode
//! and reports it as "no marker here"; absence only delays a stop, it never
//! causes one.

use thiserror::Error;

use crate::cells::{CellBuilder, CellError, CodeCellIndex};
use crate::emulator::CodePos;

/// Index into the source map, as embedded in bytecode markers
pub type DebugInfoIndex = u64;

/// The 12-bit opcode tagging a marker pseudo-instruction
pub const MARKER_OPCODE: u64 = 0xFEF;

/// The ASCII prefix of every marker payload
pub const MARKER_PREFIX: &str = "DI";

/// The largest payload the 4-bit length field can describe, in bytes
pub const MARKER_MAX_PAYLOAD: usize = 16;

/// Errors produced when emitting a marker into a cell under construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerEncodeError {
    /// The decimal rendering of the index does not fit the payload limit
    #[error("debug info index {0} does not fit in a marker payload")]
    IndexTooLarge(DebugInfoIndex),

    /// The target cell ran out of space
    #[error(transparent)]
    Cell(#[from] CellError),
}

/// Attempt to decode a marker at the given code position. Returns the
/// embedded index, or `None` when the position does not carry a well-formed
/// marker: unknown cell hash, short read, wrong opcode, invalid UTF-8,
/// missing prefix, or a malformed decimal all land here.
pub fn decode_marker(
    cells: &CodeCellIndex,
    pos: &CodePos,
) -> Option<DebugInfoIndex> {
    let cell = cells.get(&pos.hash)?;

    let mut reader = cell.reader();
    reader.skip(pos.offset).ok()?;

    if reader.read_uint(12).ok()? != MARKER_OPCODE {
        return None;
    }
    let payload_len = reader.read_uint(4).ok()? as usize + 1;
    let payload = reader.read_bytes(payload_len).ok()?;

    let text = std::str::from_utf8(&payload).ok()?;
    let digits = text.strip_prefix(MARKER_PREFIX)?;
    digits.parse().ok()
}

/// Emit a marker for `index` into the builder, exactly as the compiler
/// toolchain does
pub fn encode_marker(
    builder: &mut CellBuilder,
    index: DebugInfoIndex,
) -> Result<(), MarkerEncodeError> {
    let payload = format!("{MARKER_PREFIX}{index}");
    if payload.len() > MARKER_MAX_PAYLOAD {
        return Err(MarkerEncodeError::IndexTooLarge(index));
    }

    builder.store_uint(MARKER_OPCODE, 12)?;
    builder.store_uint(payload.len() as u64 - 1, 4)?;
    builder.store_slice(payload.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::Cell;
    use proptest::prelude::*;

    fn index_of(cell: &Cell) -> CodeCellIndex {
        CodeCellIndex::build(cell)
    }

    fn pos(cell: &Cell, offset: u32) -> CodePos {
        CodePos {
            hash: cell.hash(),
            offset,
        }
    }

    #[test]
    fn decodes_marker_mid_cell() {
        let mut builder = CellBuilder::new();
        builder.store_uint(0b10110, 5).unwrap();
        let offset = builder.bit_len();
        encode_marker(&mut builder, 1204).unwrap();
        let cell = builder.build();

        let cells = index_of(&cell);
        assert_eq!(decode_marker(&cells, &pos(&cell, offset)), Some(1204));
    }

    #[test]
    fn unknown_hash_is_no_marker() {
        let mut builder = CellBuilder::new();
        encode_marker(&mut builder, 3).unwrap();
        let cell = builder.build();

        let mut other = CellBuilder::new();
        other.store_uint(9, 8).unwrap();
        let other = other.build();

        let cells = index_of(&other);
        assert_eq!(decode_marker(&cells, &pos(&cell, 0)), None);
    }

    #[test]
    fn wrong_opcode_is_no_marker() {
        let mut builder = CellBuilder::new();
        builder.store_uint(0xFEE, 12).unwrap();
        builder.store_uint(2, 4).unwrap();
        builder.store_slice(b"DI4").unwrap();
        let cell = builder.build();

        let cells = index_of(&cell);
        assert_eq!(decode_marker(&cells, &pos(&cell, 0)), None);
    }

    #[test]
    fn short_cell_is_no_marker() {
        // opcode and length promise three payload bytes, only two present
        let mut builder = CellBuilder::new();
        builder.store_uint(MARKER_OPCODE, 12).unwrap();
        builder.store_uint(2, 4).unwrap();
        builder.store_slice(b"DI").unwrap();
        let cell = builder.build();

        let cells = index_of(&cell);
        assert_eq!(decode_marker(&cells, &pos(&cell, 0)), None);
    }

    #[test]
    fn bad_payloads_are_no_marker() {
        for payload in [&b"XY12"[..], b"DIxy", b"DI", b"\xFF\xFE\xFD"] {
            let mut builder = CellBuilder::new();
            builder.store_uint(MARKER_OPCODE, 12).unwrap();
            builder
                .store_uint(payload.len() as u64 - 1, 4)
                .unwrap();
            builder.store_slice(payload).unwrap();
            let cell = builder.build();

            let cells = index_of(&cell);
            assert_eq!(
                decode_marker(&cells, &pos(&cell, 0)),
                None,
                "payload {payload:?} should not decode"
            );
        }
    }

    #[test]
    fn offset_past_end_is_no_marker() {
        let mut builder = CellBuilder::new();
        encode_marker(&mut builder, 1).unwrap();
        let cell = builder.build();

        let cells = index_of(&cell);
        let end = cell.bit_len();
        assert_eq!(decode_marker(&cells, &pos(&cell, end + 1)), None);
    }

    #[test]
    fn oversized_index_rejected() {
        // fifteen decimal digits exceed the 16-byte payload with the prefix
        let mut builder = CellBuilder::new();
        assert_eq!(
            encode_marker(&mut builder, 100_000_000_000_000),
            Err(MarkerEncodeError::IndexTooLarge(100_000_000_000_000))
        );
    }

    proptest! {
        #[test]
        fn round_trip(index in 0u64..=99_999_999_999_999) {
            let mut builder = CellBuilder::new();
            builder.store_uint(0xA5, 8).unwrap();
            let offset = builder.bit_len();
            encode_marker(&mut builder, index).unwrap();
            let cell = builder.build();

            let cells = index_of(&cell);
            prop_assert_eq!(
                decode_marker(&cells, &pos(&cell, offset)),
                Some(index)
            );
        }
    }
}
