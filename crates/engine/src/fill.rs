//! Fill handle: preview and apply a single-column drag.

use gridbase_core::{CoordinateMaps, FillPreview, GridCell, SelectionRange};

use crate::grid::GridEngine;
use crate::history::HistoryChange;
use crate::normalize::comparable;

/// Rows a drag from `origin` to `target` would fill. `None` when the drag
/// leaves the origin's column, lands on the origin row, or either end does
/// not resolve.
pub fn compute_fill_preview(maps: &CoordinateMaps, origin: &GridCell, target: &GridCell) -> Option<FillPreview> {
    if origin.column_id != target.column_id {
        return None;
    }
    let (from, _) = maps.resolve(origin)?;
    let (to, _) = maps.resolve(target)?;
    let rows: Vec<usize> = if to > from {
        (from + 1..=to).collect()
    } else {
        (to..from).rev().collect()
    };
    if rows.is_empty() {
        return None;
    }
    Some(FillPreview {
        column_id: origin.column_id.clone(),
        rows,
    })
}

impl GridEngine {
    /// Show (or clear) the preview for a drag from `origin` to `target`.
    /// Showing a preview ends edit mode; the buffer is committed first.
    pub fn update_fill_preview(&mut self, origin: &GridCell, target: &GridCell) -> bool {
        let preview = compute_fill_preview(&self.maps, origin, target);
        if preview.is_some() && self.edit.is_some() {
            self.commit_edit();
        }
        let changes = self.state.set_fill_preview(preview);
        self.emit_state(changes);
        changes.fill
    }

    pub fn clear_fill_preview(&mut self) {
        let changes = self.state.set_fill_preview(None);
        self.emit_state(changes);
    }

    /// Copy the anchor row's value in the preview column into every preview
    /// row. One history step; the selection ends spanning anchor to the
    /// last filled row.
    pub fn apply_fill(&mut self, preview: &FillPreview, anchor: &GridCell) -> bool {
        if self.edit.is_some() {
            self.commit_edit();
        }
        let source = GridCell {
            row_id: anchor.row_id.clone(),
            column_id: preview.column_id.clone(),
        };
        let Some((_, col)) = self.maps.resolve(&source) else {
            return false;
        };
        let value = self.cell_value(&source).map(str::to_string);

        let mut changes = Vec::new();
        let mut last_filled = None;
        for &row in &preview.rows {
            let Some(target) = self.maps.cell_at(row, col) else {
                continue;
            };
            last_filled = Some(target.clone());
            let previous = self.cell_value(&target).map(str::to_string);
            if comparable(&previous) == comparable(&value) {
                continue;
            }
            changes.push(HistoryChange {
                row_id: target.row_id.clone(),
                column_id: target.column_id.clone(),
                previous_value: previous,
                next_value: value.clone(),
            });
            self.write_cell(target, value.clone());
        }

        let filled = !changes.is_empty();
        self.record(changes);
        self.end_gesture();

        let mut state = self.state.set_fill_preview(None);
        if let Some(focus) = last_filled {
            state = state
                .merge(self.state.set_active_cell(Some(source.clone())))
                .merge(self.state.set_selection(Some(SelectionRange { anchor: source, focus })));
        }
        self.emit_state(state);
        log::debug!("fill wrote {} cell(s)", preview.rows.len());
        filled
    }
}
