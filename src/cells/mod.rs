//! The code-cell model consumed by the debugger: immutable content-addressed
//! bit-string cells, a builder used to assemble them, a seekable bit-stream
//! reader, and the index of every cell reachable from a contract's code root.

mod cell;
mod index;
mod reader;

pub use cell::{Cell, CellBuilder, CellHash};
pub use index::CodeCellIndex;
pub use reader::{CellReader, ReadError};

use thiserror::Error;

/// The maximum number of data bits a single cell may hold
pub const MAX_BITS: u32 = 1023;
/// The maximum number of child references a single cell may hold
pub const MAX_REFS: usize = 4;

/// Errors produced when assembling a cell
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    /// The builder was asked to store more data than fits in one cell
    #[error("cell capacity exceeded, {0} bits do not fit")]
    CapacityExceeded(u32),

    /// The builder was asked to store a fifth child reference
    #[error("a cell may reference at most {MAX_REFS} children")]
    TooManyRefs,

    /// The value passed to `store_uint` does not fit in the requested width
    #[error("value does not fit in {0} bits")]
    ValueOutOfRange(u32),
}
