//! This module contains the structures used for source-code attribution
pub(crate) mod debug_info;
pub mod structures;

pub use debug_info::{DebugInfo, Location};
pub use structures::{GlobalEntry, SourceMap, SourceMapEntry};
