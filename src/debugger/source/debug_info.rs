use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::structures::{GlobalEntry, SourceMap, SourceMapEntry};
use crate::errors::TvmDbgResult;

/// The debug-info table emitted by the compiler toolchain alongside the
/// compiled code. `locations` is indexed by the marker indices embedded in
/// the bytecode.
#[derive(Debug, Clone, Deserialize)]
pub struct DebugInfo {
    pub locations: Vec<Location>,
    #[serde(default)]
    pub globals: Vec<GlobalEntry>,
}

/// One raw location record. The tagging fields decide how it is classified:
/// `ret` marks function returns, `is_catch` marks catch-handler entries,
/// everything else is a statement.
#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    pub line: u32,
    #[serde(rename = "func")]
    pub function: String,
    #[serde(default)]
    pub ret: bool,
    #[serde(default)]
    pub is_catch: bool,
    #[serde(default)]
    pub vars: Option<Vec<String>>,
    #[serde(default, rename = "first_stmt")]
    pub first_statement: bool,
}

impl DebugInfo {
    pub fn from_file(path: &Path) -> TvmDbgResult<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn from_string<S>(input: S) -> TvmDbgResult<Self>
    where
        S: AsRef<str>,
    {
        Ok(serde_json::from_str(input.as_ref())?)
    }

    /// Classify every location and build the queryable source map. Relative
    /// file paths are resolved against `project_root` here, once; the map is
    /// immutable afterwards.
    pub fn into_source_map(self, project_root: &Path) -> SourceMap {
        let entries = self
            .locations
            .into_iter()
            .map(|loc| {
                let path = if loc.file.is_absolute() {
                    loc.file
                } else {
                    project_root.join(loc.file)
                };

                if loc.ret {
                    SourceMapEntry::Return {
                        path,
                        line: loc.line,
                        function: loc.function,
                    }
                } else if loc.is_catch {
                    SourceMapEntry::Catch {
                        path,
                        line: loc.line,
                        function: loc.function,
                    }
                } else {
                    SourceMapEntry::Statement {
                        path,
                        line: loc.line,
                        function: loc.function,
                        variables: loc.vars.unwrap_or_default(),
                        first_statement: loc.first_statement,
                    }
                }
            })
            .collect();

        SourceMap::new(entries, self.globals)
    }
}
