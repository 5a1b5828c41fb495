use std::path::{Path, PathBuf};

use ahash::{HashMap, HashMapExt, HashSet};
use serde::Deserialize;

use crate::debugger::marker::DebugInfoIndex;

/// One classified debug-info record. The three variants are a closed set;
/// the stepping engine dispatches on them exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMapEntry {
    /// An executable statement boundary
    Statement {
        path: PathBuf,
        line: u32,
        function: String,
        /// Local variable names, ordered to match positions on the VM
        /// operand stack at this point
        variables: Vec<String>,
        /// True on the first statement of a function body
        first_statement: bool,
    },
    /// A function return site
    Return {
        path: PathBuf,
        line: u32,
        function: String,
    },
    /// A catch-handler entry
    Catch {
        path: PathBuf,
        line: u32,
        function: String,
    },
}

impl SourceMapEntry {
    pub fn path(&self) -> &Path {
        match self {
            SourceMapEntry::Statement { path, .. }
            | SourceMapEntry::Return { path, .. }
            | SourceMapEntry::Catch { path, .. } => path,
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            SourceMapEntry::Statement { line, .. }
            | SourceMapEntry::Return { line, .. }
            | SourceMapEntry::Catch { line, .. } => *line,
        }
    }

    pub fn function(&self) -> &str {
        match self {
            SourceMapEntry::Statement { function, .. }
            | SourceMapEntry::Return { function, .. }
            | SourceMapEntry::Catch { function, .. } => function,
        }
    }
}

/// A global variable's name. Globals are positional: entry `i` corresponds
/// to slot `i + 1` of the C7 context tuple.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GlobalEntry {
    pub name: String,
}

/// The mapping from debug-info index to source location, the derived index
/// of reachable `(path, line)` pairs, and the ordered global names. Built
/// once at session preparation.
#[derive(Debug)]
pub struct SourceMap {
    entries: Vec<SourceMapEntry>,
    available_lines: HashMap<PathBuf, HashSet<u32>>,
    globals: Vec<GlobalEntry>,
}

impl SourceMap {
    pub(crate) fn new(
        entries: Vec<SourceMapEntry>,
        globals: Vec<GlobalEntry>,
    ) -> Self {
        let mut available_lines: HashMap<PathBuf, HashSet<u32>> =
            HashMap::new();
        for entry in &entries {
            available_lines
                .entry(entry.path().to_path_buf())
                .or_default()
                .insert(entry.line());
        }

        Self {
            entries,
            available_lines,
            globals,
        }
    }

    pub fn entry_at(&self, index: DebugInfoIndex) -> Option<&SourceMapEntry> {
        self.entries.get(usize::try_from(index).ok()?)
    }

    pub fn available_paths(&self) -> impl Iterator<Item = &Path> {
        self.available_lines.keys().map(PathBuf::as_path)
    }

    /// The lines of `path` that appear in any entry
    pub fn available_lines<'a>(
        &'a self,
        path: &Path,
    ) -> impl Iterator<Item = u32> + use<'a> {
        self.available_lines
            .get(path)
            .into_iter()
            .flatten()
            .copied()
    }

    /// Whether `(path, line)` is a position a breakpoint can bind to
    pub fn is_line_available(&self, path: &Path, line: u32) -> bool {
        self.available_lines
            .get(path)
            .is_some_and(|lines| lines.contains(&line))
    }

    pub fn globals(&self) -> &[GlobalEntry] {
        &self.globals
    }
}
