//! Selection and keyboard navigation.

use gridbase_core::{GridCell, SelectionRange};

use crate::grid::GridEngine;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOptions {
    /// Keep the anchor and move only the focus.
    pub extend: bool,
    /// Anchor to use instead of the current one when extending.
    pub anchor_override: Option<GridCell>,
}

impl SelectOptions {
    pub fn extend() -> Self {
        Self {
            extend: true,
            anchor_override: None,
        }
    }
}

impl GridEngine {
    /// Select `cell`. No-op (returns false) when it does not resolve.
    pub fn select_cell(&mut self, cell: GridCell, options: SelectOptions) -> bool {
        if !self.maps.is_resolvable(&cell) {
            return false;
        }

        if !options.extend {
            self.focus_cell(cell);
            return true;
        }

        let anchor = options
            .anchor_override
            .or_else(|| self.state.selection().map(|s| s.anchor.clone()))
            .or_else(|| self.state.active_cell().cloned())
            .unwrap_or_else(|| cell.clone());
        let mut changes = self.state.set_selection(Some(SelectionRange { anchor: anchor.clone(), focus: cell }));
        if self.state.active_cell().is_none() {
            changes = changes.merge(self.state.set_active_cell(Some(anchor)));
        }
        self.emit_state(changes);
        true
    }

    /// Move by `(d_row, d_col)`, clamped to the grid. Extending moves the
    /// focus; otherwise the active cell moves and the selection collapses.
    pub fn move_selection(&mut self, d_row: isize, d_col: isize, extend: bool) -> bool {
        let reference = if extend {
            self.state
                .selection()
                .map(|s| s.focus.clone())
                .or_else(|| self.state.active_cell().cloned())
        } else {
            self.state.active_cell().cloned()
        };
        let Some((row, col)) = reference.and_then(|c| self.maps.resolve(&c)) else {
            return false;
        };

        let row = clamp_offset(row, d_row, self.maps.row_count());
        let col = clamp_offset(col, d_col, self.maps.column_count());
        let Some(target) = self.maps.cell_at(row, col) else {
            return false;
        };
        self.select_cell(
            target,
            SelectOptions {
                extend,
                anchor_override: None,
            },
        )
    }

    /// Select from the first to the last loaded cell.
    pub fn select_all(&mut self) -> bool {
        let (mut first, mut last) = (usize::MAX, 0);
        for (index, _) in self.windows.known_rows() {
            first = first.min(index);
            last = last.max(index);
        }
        let cols = self.maps.column_count();
        if first == usize::MAX || cols == 0 {
            return false;
        }
        let (Some(anchor), Some(focus)) = (self.maps.cell_at(first, 0), self.maps.cell_at(last, cols - 1)) else {
            return false;
        };
        let changes = self
            .state
            .set_active_cell(Some(anchor.clone()))
            .merge(self.state.set_selection(Some(SelectionRange { anchor, focus })));
        self.emit_state(changes);
        true
    }
}

fn clamp_offset(index: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let target = index as isize + delta;
    target.clamp(0, len as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::{cell, engine};
    use gridbase_core::CellRange;

    #[test]
    fn test_select_collapses_without_extend() {
        let mut engine = engine(5);
        assert!(engine.select_cell(cell(2, "b"), SelectOptions::default()));
        assert_eq!(engine.active_cell(), Some(&cell(2, "b")));
        assert!(engine.selection().unwrap().is_single());
    }

    #[test]
    fn test_unresolved_cell_is_noop() {
        let mut engine = engine(5);
        assert!(!engine.select_cell(cell(9, "a"), SelectOptions::default()));
        assert!(!engine.select_cell(cell(0, "zz"), SelectOptions::default()));
        assert!(engine.active_cell().is_none());
    }

    #[test]
    fn test_extend_keeps_anchor() {
        let mut engine = engine(5);
        engine.select_cell(cell(1, "a"), SelectOptions::default());
        engine.select_cell(cell(3, "b"), SelectOptions::extend());
        let sel = engine.selection().unwrap();
        assert_eq!(sel.anchor, cell(1, "a"));
        assert_eq!(sel.focus, cell(3, "b"));
        assert_eq!(engine.active_cell(), Some(&cell(1, "a")));
    }

    #[test]
    fn test_extend_with_anchor_override() {
        let mut engine = engine(5);
        engine.select_cell(cell(1, "a"), SelectOptions::default());
        engine.select_cell(
            cell(2, "a"),
            SelectOptions {
                extend: true,
                anchor_override: Some(cell(4, "b")),
            },
        );
        assert_eq!(engine.selection_bounds(), Some(CellRange::new(2, 0, 4, 1)));
    }

    #[test]
    fn test_extend_without_active_anchors_on_cell() {
        let mut engine = engine(5);
        engine.select_cell(cell(2, "a"), SelectOptions::extend());
        assert!(engine.selection().unwrap().is_single());
        assert_eq!(engine.active_cell(), Some(&cell(2, "a")));
    }

    #[test]
    fn test_move_clamps_at_edges() {
        let mut engine = engine(3);
        engine.select_cell(cell(0, "a"), SelectOptions::default());
        engine.move_selection(-1, -1, false);
        assert_eq!(engine.active_cell(), Some(&cell(0, "a")));
        engine.move_selection(10, 10, false);
        assert_eq!(engine.active_cell(), Some(&cell(2, "n")));
    }

    #[test]
    fn test_move_extend_moves_focus() {
        let mut engine = engine(10);
        engine.select_cell(cell(0, "a"), SelectOptions::default());
        for _ in 0..3 {
            engine.move_selection(1, 0, true);
        }
        assert_eq!(engine.selection_bounds(), Some(CellRange::new(0, 0, 3, 0)));
        assert_eq!(engine.active_cell(), Some(&cell(0, "a")));
    }

    #[test]
    fn test_move_without_active_is_noop() {
        let mut engine = engine(3);
        assert!(!engine.move_selection(1, 0, false));
    }

    #[test]
    fn test_select_all() {
        let mut engine = engine(4);
        assert!(engine.select_all());
        assert_eq!(engine.selection_bounds(), Some(CellRange::new(0, 0, 3, 2)));
    }
}
