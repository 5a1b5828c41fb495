//! tvm-dbg: the debuggee engine of a source-level debugger for FunC
//! contracts running on the TON Virtual Machine.
//!
//! The engine drives a single-step emulator, attributes each code position
//! to a source location through markers embedded in the bytecode, and
//! implements continue / step-in / step-over / step-out on top. Hosts embed
//! it behind whatever transport they speak; the engine itself only emits
//! events and answers inspection queries.

pub mod cells;
pub mod configuration;
pub mod debugger;
pub mod emulator;
pub mod errors;
pub mod events;
pub mod logging;
