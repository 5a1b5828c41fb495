pub(crate) mod context;

pub use context::{Breakpoint, DebuggingContext};
