//! The seam between the debugger engine and the native TVM emulator
//! bindings. The engine only ever talks to the emulator through [VmHandle];
//! tests drive it with a scripted implementation instead of the real thing.

use std::fmt;

use itertools::Itertools;
use num_bigint::BigInt;

use crate::cells::{Cell, CellHash};
use crate::errors::TvmDbgResult;

/// Which set of emulator calls a session dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Read-only contract invocation
    GetMethod,
    /// State-mutating message processing
    Transaction,
}

/// The emulator's current instruction pointer: the hash of the code cell
/// being executed and the bit offset of the next instruction within it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePos {
    pub hash: CellHash,
    pub offset: u32,
}

/// A value on the VM operand stack or inside the C7 context tuple
#[derive(Debug, Clone, PartialEq)]
pub enum StackItem {
    Null,
    Int(BigInt),
    Cell(Cell),
    Slice(Cell),
    Tuple(Vec<StackItem>),
}

impl fmt::Display for StackItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackItem::Null => write!(f, "null"),
            StackItem::Int(v) => write!(f, "{v}"),
            StackItem::Cell(c) => write!(f, "cell:{}", c.hash()),
            StackItem::Slice(c) => write!(f, "slice:{}", c.hash()),
            StackItem::Tuple(items) => {
                write!(f, "[{}]", items.iter().join(", "))
            }
        }
    }
}

/// The kind-specific payload delivered to the session's finished callback
#[derive(Debug, Clone, PartialEq)]
pub enum VmResult {
    GetMethod {
        exit_code: i64,
        stack: Vec<StackItem>,
    },
    Transaction {
        transaction: serde_json::Value,
    },
}

/// Sink the engine wires into the emulator so its log output can be
/// forwarded to the host as `Output` events
pub type LogSink = Box<dyn FnMut(String)>;

/// Single-step execution interface over an opaque emulator handle. The
/// engine owns the handle exclusively for the session's lifetime; teardown
/// is the implementation's `Drop`.
pub trait VmHandle {
    /// Run kind-specific setup, returning the emulator's setup result code.
    /// Transactions report failure through a code other than 1.
    fn prepare(&mut self, kind: SessionKind) -> TvmDbgResult<i64>;

    /// Install the sink that receives emulator debug-log lines
    fn set_log_sink(&mut self, sink: LogSink);

    /// Execute one VM instruction. Returns true when the VM has terminated.
    fn step(&mut self) -> TvmDbgResult<bool>;

    /// The instruction pointer after the most recent step
    fn code_pos(&mut self) -> TvmDbgResult<CodePos>;

    /// The current operand stack, bottom first
    fn stack(&mut self) -> TvmDbgResult<Vec<StackItem>>;

    /// The C7 context register
    fn c7(&mut self) -> TvmDbgResult<StackItem>;

    /// The integer slot attached to the current continuation
    fn cont_param(&mut self) -> TvmDbgResult<u32>;

    /// Overwrite the integer slot attached to the current continuation
    fn set_cont_param(&mut self, value: u32) -> TvmDbgResult<()>;

    /// The kind-specific execution result; valid once `step` has returned
    /// true
    fn take_result(&mut self, kind: SessionKind) -> TvmDbgResult<VmResult>;
}
