//! Clipboard codec: tab-separated ranges.
//!
//! Wire format is plain UTF-8, `\t` between columns and `\n` between rows.
//! Embedded tabs or newlines are not escaped.

use gridbase_core::{CellRange, SelectionRange};

use crate::grid::{Effect, GridEngine};
use crate::history::HistoryChange;
use crate::normalize::{comparable, normalize, RawValue};

/// Serialize `bounds` using `resolve` for each `(row, col)`. Null cells
/// become empty strings.
pub fn serialize_range(bounds: CellRange, mut resolve: impl FnMut(usize, usize) -> Option<String>) -> String {
    let mut out = String::new();
    for row in bounds.start_row..=bounds.end_row {
        if row > bounds.start_row {
            out.push('\n');
        }
        for col in bounds.start_col..=bounds.end_col {
            if col > bounds.start_col {
                out.push('\t');
            }
            if let Some(value) = resolve(row, col) {
                out.push_str(&value);
            }
        }
    }
    out
}

/// Split clipboard text into rows of cells. A trailing newline does not
/// produce an extra empty row, and CRLF line endings are accepted.
pub fn parse_clipboard(text: &str) -> Vec<Vec<String>> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty() || *l == "\r") {
        lines.pop();
    }
    lines
        .into_iter()
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            line.split('\t').map(str::to_string).collect()
        })
        .collect()
}

impl GridEngine {
    /// Serialize the selection (or active cell) and ask the driver to put
    /// it on the system clipboard.
    pub fn copy(&mut self) -> Option<String> {
        let bounds = self.selection_bounds()?;
        let text = serialize_range(bounds, |row, col| self.value_at(row, col).map(str::to_string));
        self.push_effect(Effect::WriteClipboard(text.clone()));
        Some(text)
    }

    /// Ask the driver to read the system clipboard. The text comes back as
    /// an `InputEvent::ClipboardText`.
    pub fn request_paste(&mut self) {
        self.push_effect(Effect::ReadClipboard);
    }

    /// Paste `text` anchored at the active cell, extending right and down.
    /// Targets outside the grid or on unloaded rows are skipped. The
    /// selection ends as the bounding box of the addressed cells, so a
    /// ragged paste can leave its focus on a cell nothing was written to.
    pub fn paste_text(&mut self, text: &str) -> bool {
        let Some(origin) = self.state.active_cell().cloned() else {
            return false;
        };
        let Some((row0, col0)) = self.maps.resolve(&origin) else {
            return false;
        };
        let grid = parse_clipboard(text);
        if grid.is_empty() {
            return false;
        }

        let mut changes = Vec::new();
        let mut furthest = (row0, col0);
        for (i, line) in grid.iter().enumerate() {
            for (j, raw) in line.iter().enumerate() {
                let (row, col) = (row0 + i, col0 + j);
                let Some(target) = self.maps.cell_at(row, col) else {
                    continue;
                };
                furthest = (furthest.0.max(row), furthest.1.max(col));

                let raw = if raw.is_empty() { RawValue::Null } else { RawValue::from(raw.as_str()) };
                let next = normalize(self.maps.column(&target.column_id), raw);
                let previous = self.cell_value(&target).map(str::to_string);
                if comparable(&next) == comparable(&previous) {
                    continue;
                }
                changes.push(HistoryChange {
                    row_id: target.row_id.clone(),
                    column_id: target.column_id.clone(),
                    previous_value: previous,
                    next_value: next.clone(),
                });
                self.write_cell(target, next);
            }
        }

        let pasted = !changes.is_empty();
        self.record(changes);
        self.end_gesture();

        if let Some(focus) = self.maps.cell_at(furthest.0, furthest.1) {
            let changes = self.state.set_selection(Some(SelectionRange { anchor: origin, focus }));
            self.emit_state(changes);
        }
        pasted
    }
}
