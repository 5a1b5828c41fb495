use std::fmt::Display;
use std::path::{Path, PathBuf};

use ahash::{HashMap, HashMapExt};

/// A source-line breakpoint. `verified` is frozen at creation time: it
/// records whether the line was a reachable statement position when the
/// breakpoint was set, and editors render unverified breakpoints greyed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub id: u32,
    pub line: u32,
    pub verified: bool,
}

impl Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}) line {}: {}",
            self.id,
            self.line,
            if self.verified {
                "verified"
            } else {
                "unverified"
            }
        )
    }
}

/// Holds the session's breakpoints, grouped per source path. Breakpoints
/// persist across stepping verbs until the host clears their path;
/// duplicate lines are kept as separate records with distinct ids.
#[derive(Debug)]
pub struct DebuggingContext {
    breakpoints: HashMap<PathBuf, Vec<Breakpoint>>,
    breakpoint_counter: u32,
}

impl DebuggingContext {
    pub fn new() -> Self {
        Self {
            breakpoints: HashMap::new(),
            breakpoint_counter: 0,
        }
    }

    /// Replace the given path's breakpoint list with an empty one. Other
    /// paths are untouched.
    pub fn clear_breakpoints(&mut self, path: &Path) {
        self.breakpoints.remove(path);
    }

    /// Append a breakpoint with a fresh id and return a copy of the record
    pub fn add_breakpoint(
        &mut self,
        path: &Path,
        line: u32,
        verified: bool,
    ) -> Breakpoint {
        let breakpoint = Breakpoint {
            id: self.breakpoint_counter,
            line,
            verified,
        };
        self.breakpoint_counter += 1;

        self.breakpoints
            .entry(path.to_path_buf())
            .or_default()
            .push(breakpoint.clone());
        breakpoint
    }

    /// Whether any breakpoint is set on `(path, line)`. Per-path lists are
    /// small, so a linear scan is fine.
    pub fn has_breakpoint(&self, path: &Path, line: u32) -> bool {
        self.breakpoints
            .get(path)
            .is_some_and(|list| list.iter().any(|b| b.line == line))
    }

    /// The breakpoints currently set on `path`, in insertion order
    pub fn breakpoints(&self, path: &Path) -> &[Breakpoint] {
        self.breakpoints
            .get(path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Default for DebuggingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_across_paths() {
        let mut ctx = DebuggingContext::new();
        let a = ctx.add_breakpoint(Path::new("/p/a.fc"), 1, true);
        let b = ctx.add_breakpoint(Path::new("/p/b.fc"), 1, true);
        let c = ctx.add_breakpoint(Path::new("/p/a.fc"), 2, false);

        assert_eq!((a.id, b.id, c.id), (0, 1, 2));
    }

    #[test]
    fn duplicate_lines_yield_distinct_records() {
        let mut ctx = DebuggingContext::new();
        let path = Path::new("/p/a.fc");
        let first = ctx.add_breakpoint(path, 5, true);
        let second = ctx.add_breakpoint(path, 5, true);

        assert_ne!(first.id, second.id);
        assert_eq!(ctx.breakpoints(path), &[first, second]);
        assert!(ctx.has_breakpoint(path, 5));
    }

    #[test]
    fn clear_is_idempotent_and_scoped() {
        let mut ctx = DebuggingContext::new();
        let a = Path::new("/p/a.fc");
        let b = Path::new("/p/b.fc");
        ctx.add_breakpoint(a, 1, true);
        ctx.add_breakpoint(b, 2, true);

        ctx.clear_breakpoints(a);
        ctx.clear_breakpoints(a);

        assert!(!ctx.has_breakpoint(a, 1));
        assert!(ctx.breakpoints(a).is_empty());
        assert!(ctx.has_breakpoint(b, 2));

        // ids keep counting after a clear
        let next = ctx.add_breakpoint(a, 3, true);
        assert_eq!(next.id, 2);
    }

    #[test]
    fn verified_flag_is_stored_as_given() {
        let mut ctx = DebuggingContext::new();
        let path = Path::new("/p/a.fc");
        assert!(ctx.add_breakpoint(path, 1, true).verified);
        assert!(!ctx.add_breakpoint(path, 99, false).verified);
    }
}
