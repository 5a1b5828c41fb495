use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

use super::debugging_context::{Breakpoint, DebuggingContext};
use super::marker::{DebugInfoIndex, decode_marker};
use super::source::{DebugInfo, SourceMap, SourceMapEntry};
use crate::cells::{Cell, CodeCellIndex};
use crate::configuration::RuntimeConfig;
use crate::emulator::{SessionKind, StackItem, VmHandle, VmResult};
use crate::errors::{TvmDbgError, TvmDbgResult};
use crate::events::{Event, EventSender, event_channel};
use crate::logging::{Logger, debug, trace};

/// A source-level activation record. Index 0 of the frame stack is the
/// outermost frame; the top frame's line follows the current statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub function: String,
    pub path: PathBuf,
    pub line: u32,
}

/// One-shot continuation handed the VM's final result at session end
pub type FinishedCallback = Box<dyn FnOnce(VmResult)>;

/// The stop condition a stepping verb runs under. Depth bounds are captured
/// when the verb is invoked so relative measurements refer to the call-site
/// depth.
enum StopCondition {
    /// Stop on a statement with a matching breakpoint
    OnBreakpoint,
    /// Stop on any statement
    OnStatement,
    /// Stop on a statement at or below the captured depth
    AtOrBelowDepth(usize),
    /// Stop on a statement strictly below the captured depth
    BelowDepth(usize),
}

enum StepOutcome {
    /// The stop condition was met; the session remains live
    Stopped,
    /// The VM terminated
    Finished,
}

/// The debuggee engine. Drives the emulator through single steps until a
/// stop condition is met, maintaining the source-level frame stack and the
/// breakpoint set along the way.
///
/// Stop and output events are queued on the channel returned by
/// [Debugger::new]; the host drains it after each verb returns, so
/// listeners registered after a call never miss an event.
pub struct Debugger<E: VmHandle> {
    /// Taken out at finalization; `None` marks a finished session
    emulator: Option<E>,
    kind: SessionKind,
    code_cells: CodeCellIndex,
    source_map: SourceMap,
    debugging_context: DebuggingContext,
    frames: Vec<StackFrame>,
    /// The statement marker the session is currently stopped on, if any.
    /// Variable inspection is only available while this is set.
    current_statement: Option<DebugInfoIndex>,
    events: EventSender,
    on_finished: Option<FinishedCallback>,
    config: RuntimeConfig,
    logger: Logger,
}

impl<E: VmHandle> std::fmt::Debug for Debugger<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debugger")
            .field("kind", &self.kind)
            .field("code_cells", &self.code_cells)
            .field("source_map", &self.source_map)
            .field("debugging_context", &self.debugging_context)
            .field("frames", &self.frames)
            .field("current_statement", &self.current_statement)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<E: VmHandle> Debugger<E> {
    /// Prepare a debug session: wire the emulator's log output into the
    /// event queue, run kind-specific setup, index the code graph, and load
    /// the debug-info table.
    ///
    /// A transaction emulator reporting a setup result other than 1 is a
    /// fatal preparation error; no stepping has happened at that point.
    pub fn new(
        mut emulator: E,
        kind: SessionKind,
        code_root: &Cell,
        debug_info: DebugInfo,
        project_root: &Path,
        config: RuntimeConfig,
        on_finished: FinishedCallback,
    ) -> TvmDbgResult<(Self, Receiver<Event>)> {
        let logger =
            crate::logging::initialize_logger(config.get_logging_config());
        let (events, receiver) = event_channel();

        let log_events = events.clone();
        emulator.set_log_sink(Box::new(move |line| {
            log_events.send(Event::Output(line));
        }));

        let setup_code = emulator.prepare(kind)?;
        if kind == SessionKind::Transaction && setup_code != 1 {
            return Err(TvmDbgError::PreparationFailed(setup_code).into());
        }

        let code_cells = CodeCellIndex::build(code_root);
        let source_map = debug_info.into_source_map(project_root);

        debug!(logger, "debug session prepared";
            "kind" => format!("{kind:?}"),
            "code cells" => code_cells.len(),
        );

        Ok((
            Self {
                emulator: Some(emulator),
                kind,
                code_cells,
                source_map,
                debugging_context: DebuggingContext::new(),
                frames: Vec::new(),
                current_statement: None,
                events,
                on_finished: Some(on_finished),
                config,
                logger,
            },
            receiver,
        ))
    }

    /// Begin execution. Stops on the program's first statement when the
    /// session is configured to stop on entry, otherwise runs like
    /// [Debugger::cont].
    pub fn start(&mut self) -> TvmDbgResult<()> {
        if self.config.stop_on_entry {
            self.step_until(StopCondition::OnStatement, Event::StoppedOnEntry)
        } else {
            self.cont()
        }
    }

    /// Run until a statement with a matching breakpoint, or termination
    pub fn cont(&mut self) -> TvmDbgResult<()> {
        self.step_until(
            StopCondition::OnBreakpoint,
            Event::StoppedOnBreakpoint,
        )
    }

    /// Run until the next statement, entering calls
    pub fn step_in(&mut self) -> TvmDbgResult<()> {
        self.step_until(StopCondition::OnStatement, Event::StoppedOnStep)
    }

    /// Run until the next statement at or below the current frame depth,
    /// stepping over calls made by the current statement
    pub fn step_over(&mut self) -> TvmDbgResult<()> {
        let depth = self.frames.len();
        self.step_until(
            StopCondition::AtOrBelowDepth(depth),
            Event::StoppedOnStep,
        )
    }

    /// Run until the current function returns to its caller
    pub fn step_out(&mut self) -> TvmDbgResult<()> {
        let depth = self.frames.len();
        self.step_until(StopCondition::BelowDepth(depth), Event::StoppedOnStep)
    }

    /// Set a breakpoint and return the created record. Verification is
    /// decided here, once: the line must be a reachable statement position
    /// in the source map.
    pub fn set_breakpoint(&mut self, path: &Path, line: u32) -> Breakpoint {
        let verified = self.source_map.is_line_available(path, line);
        let breakpoint =
            self.debugging_context.add_breakpoint(path, line, verified);
        debug!(self.logger, "breakpoint set";
            "path" => path.display().to_string(),
            "breakpoint" => breakpoint.to_string(),
        );
        breakpoint
    }

    /// Remove every breakpoint on the given path
    pub fn clear_breakpoints(&mut self, path: &Path) {
        self.debugging_context.clear_breakpoints(path);
    }

    /// The breakpoints currently set on `path`, in insertion order
    pub fn breakpoints(&self, path: &Path) -> &[Breakpoint] {
        self.debugging_context.breakpoints(path)
    }

    /// The current frame stack, outermost first
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// The statement entry the session is stopped on, if it is stopped
    pub fn current_entry(&self) -> Option<&SourceMapEntry> {
        self.source_map.entry_at(self.current_statement?)
    }

    /// Whether the VM has terminated and the session is finalized
    pub fn is_finished(&self) -> bool {
        self.emulator.is_none()
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// The local variables of the current statement, paired with their
    /// operand-stack values. Unavailable (`None`) unless the session is
    /// stopped on a statement marker.
    pub fn locals(
        &mut self,
    ) -> TvmDbgResult<Option<Vec<(String, StackItem)>>> {
        let Some(index) = self.current_statement else {
            return Ok(None);
        };
        let Some(SourceMapEntry::Statement { variables, .. }) =
            self.source_map.entry_at(index)
        else {
            return Ok(None);
        };
        let Some(emulator) = self.emulator.as_mut() else {
            return Ok(None);
        };

        let stack = emulator.stack()?;
        Ok(Some(variables.iter().cloned().zip(stack).collect()))
    }

    /// The contract's global variables, read from the C7 context tuple.
    /// Slot 0 of the tuple is reserved; global `i` lives in slot `i + 1`.
    /// Globals missing from a short tuple read as null. Unavailable unless
    /// stopped on a statement, or when C7 is not a tuple.
    pub fn globals(
        &mut self,
    ) -> TvmDbgResult<Option<Vec<(String, StackItem)>>> {
        if self.current_statement.is_none() {
            return Ok(None);
        }
        let Some(emulator) = self.emulator.as_mut() else {
            return Ok(None);
        };
        let StackItem::Tuple(items) = emulator.c7()? else {
            return Ok(None);
        };

        Ok(Some(
            self.source_map
                .globals()
                .iter()
                .enumerate()
                .map(|(i, global)| {
                    let value = items
                        .get(i + 1)
                        .cloned()
                        .unwrap_or(StackItem::Null);
                    (global.name.clone(), value)
                })
                .collect(),
        ))
    }

    fn step_until(
        &mut self,
        condition: StopCondition,
        stop_event: Event,
    ) -> TvmDbgResult<()> {
        let Some(mut emulator) = self.emulator.take() else {
            return Err(TvmDbgError::SessionFinished.into());
        };

        // the handle is local to this frame now: an early return on the
        // error path drops and thereby destroys it
        match self.step_loop(&mut emulator, &condition) {
            Ok(StepOutcome::Stopped) => {
                self.emulator = Some(emulator);
                self.events.send(stop_event);
                Ok(())
            }
            Ok(StepOutcome::Finished) => self.finalize(emulator),
            Err(e) => Err(e),
        }
    }

    /// The inner stepping loop: advance one VM instruction at a time,
    /// decode markers at the new code position, maintain the frame stack,
    /// and check the stop condition on statement markers.
    fn step_loop(
        &mut self,
        emulator: &mut E,
        condition: &StopCondition,
    ) -> TvmDbgResult<StepOutcome> {
        loop {
            if emulator.step()? {
                self.current_statement = None;
                return Ok(StepOutcome::Finished);
            }

            let pos = emulator.code_pos()?;
            let Some(index) = decode_marker(&self.code_cells, &pos) else {
                // unmarked instruction, or a position we cannot attribute;
                // keep stepping
                continue;
            };
            let Some(entry) = self.source_map.entry_at(index) else {
                continue;
            };

            match entry {
                SourceMapEntry::Statement {
                    path,
                    line,
                    function,
                    first_statement,
                    ..
                } => {
                    if *first_statement {
                        self.frames.push(StackFrame {
                            function: function.clone(),
                            path: path.clone(),
                            line: *line,
                        });
                        // checkpoint the entry depth in the continuation
                        // slot so a later catch can restore it
                        emulator.set_cont_param(self.frames.len() as u32)?;
                        trace!(self.logger, "entered function";
                            "function" => function.clone(),
                            "depth" => self.frames.len(),
                        );
                    }
                    if let Some(top) = self.frames.last_mut() {
                        top.line = *line;
                    }
                    self.current_statement = Some(index);

                    if self.stop_condition_met(condition, path, *line) {
                        debug!(self.logger, "stopped";
                            "path" => path.display().to_string(),
                            "line" => *line,
                        );
                        return Ok(StepOutcome::Stopped);
                    }
                }
                SourceMapEntry::Return { function, .. } => {
                    self.frames.pop();
                    self.current_statement = None;
                    trace!(self.logger, "returned";
                        "function" => function.clone(),
                        "depth" => self.frames.len(),
                    );
                }
                SourceMapEntry::Catch { .. } => {
                    // unwind to the depth checkpointed when the protected
                    // frame was entered
                    let depth = emulator.cont_param()? as usize;
                    self.frames.truncate(depth);
                    self.current_statement = None;
                    trace!(self.logger, "catch unwound";
                        "depth" => depth,
                    );
                }
            }
        }
    }

    fn stop_condition_met(
        &self,
        condition: &StopCondition,
        path: &Path,
        line: u32,
    ) -> bool {
        match condition {
            StopCondition::OnBreakpoint => {
                self.debugging_context.has_breakpoint(path, line)
            }
            StopCondition::OnStatement => true,
            StopCondition::AtOrBelowDepth(depth) => {
                self.frames.len() <= *depth
            }
            StopCondition::BelowDepth(depth) => self.frames.len() < *depth,
        }
    }

    /// The VM has terminated: emit the end event, deliver the result to the
    /// finished callback, and destroy the emulator handle.
    fn finalize(&mut self, mut emulator: E) -> TvmDbgResult<()> {
        self.events.send(Event::End);

        let result = emulator.take_result(self.kind)?;
        drop(emulator);

        debug!(self.logger, "vm terminated");

        if let Some(callback) = self.on_finished.take() {
            callback(result);
        }
        Ok(())
    }
}
