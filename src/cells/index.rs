use ahash::{HashMap, HashMapExt};

use super::{Cell, CellHash};

/// The index of every cell reachable from a contract's code root, keyed by
/// content hash. Built once at session preparation; immutable afterwards.
#[derive(Debug)]
pub struct CodeCellIndex {
    cells: HashMap<CellHash, Cell>,
}

impl CodeCellIndex {
    /// Walk the code graph from `root`, visiting each distinct cell exactly
    /// once. Cells are content-addressed so the graph cannot contain cycles.
    pub fn build(root: &Cell) -> Self {
        let mut cells = HashMap::new();
        let mut pending = vec![root.clone()];

        while let Some(cell) = pending.pop() {
            if cells.contains_key(&cell.hash()) {
                continue;
            }
            pending.extend(cell.refs().iter().cloned());
            cells.insert(cell.hash(), cell);
        }

        Self { cells }
    }

    pub fn get(&self, hash: &CellHash) -> Option<&Cell> {
        self.cells.get(hash)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
