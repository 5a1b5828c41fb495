mod debugger_core;
mod debugging_context;
pub mod marker;
pub mod source;

pub use debugger_core::{Debugger, FinishedCallback, StackFrame};
pub use debugging_context::{Breakpoint, DebuggingContext};
