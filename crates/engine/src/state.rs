//! Grid State Store: the four transient UI fields.
//!
//! Every field changes only through a named setter that reports what
//! changed, so the engine can emit exactly the events it needs.
//! Edit mode and the fill preview are mutually exclusive.

use gridbase_core::{CoordinateMaps, FillPreview, GridCell, SelectionRange};

/// Which fields a setter touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateChanges {
    pub active: bool,
    pub selection: bool,
    pub editing: bool,
    pub fill: bool,
}

impl StateChanges {
    pub fn any(&self) -> bool {
        self.active || self.selection || self.editing || self.fill
    }

    pub fn merge(self, other: StateChanges) -> StateChanges {
        StateChanges {
            active: self.active || other.active,
            selection: self.selection || other.selection,
            editing: self.editing || other.editing,
            fill: self.fill || other.fill,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridState {
    active_cell: Option<GridCell>,
    selection: Option<SelectionRange>,
    editing_cell: Option<GridCell>,
    fill_preview: Option<FillPreview>,
}

impl GridState {
    pub fn active_cell(&self) -> Option<&GridCell> {
        self.active_cell.as_ref()
    }

    pub fn selection(&self) -> Option<&SelectionRange> {
        self.selection.as_ref()
    }

    pub fn editing_cell(&self) -> Option<&GridCell> {
        self.editing_cell.as_ref()
    }

    pub fn fill_preview(&self) -> Option<&FillPreview> {
        self.fill_preview.as_ref()
    }

    pub fn set_active_cell(&mut self, cell: Option<GridCell>) -> StateChanges {
        let active = replace_if_changed(&mut self.active_cell, cell);
        StateChanges { active, ..Default::default() }
    }

    pub fn set_selection(&mut self, selection: Option<SelectionRange>) -> StateChanges {
        let changed = replace_if_changed(&mut self.selection, selection);
        StateChanges { selection: changed, ..Default::default() }
    }

    /// Entering edit mode drops any fill preview.
    pub fn set_editing_cell(&mut self, cell: Option<GridCell>) -> StateChanges {
        let entering = cell.is_some();
        let mut changes = StateChanges {
            editing: replace_if_changed(&mut self.editing_cell, cell),
            ..Default::default()
        };
        if entering {
            changes.fill = replace_if_changed(&mut self.fill_preview, None);
        }
        changes
    }

    /// Showing a fill preview leaves edit mode.
    pub fn set_fill_preview(&mut self, preview: Option<FillPreview>) -> StateChanges {
        let showing = preview.is_some();
        let mut changes = StateChanges {
            fill: replace_if_changed(&mut self.fill_preview, preview),
            ..Default::default()
        };
        if showing {
            changes.editing = replace_if_changed(&mut self.editing_cell, None);
        }
        changes
    }

    /// Clear every field that no longer resolves after a structural change.
    pub fn retain_resolvable(&mut self, maps: &CoordinateMaps) -> StateChanges {
        let mut changes = StateChanges::default();
        if self.active_cell.as_ref().is_some_and(|c| !maps.is_resolvable(c)) {
            self.active_cell = None;
            changes.active = true;
        }
        if self
            .selection
            .as_ref()
            .is_some_and(|s| !maps.is_resolvable(&s.anchor) || !maps.is_resolvable(&s.focus))
        {
            self.selection = None;
            changes.selection = true;
        }
        if self.editing_cell.as_ref().is_some_and(|c| !maps.is_resolvable(c)) {
            self.editing_cell = None;
            changes.editing = true;
        }
        if self
            .fill_preview
            .as_ref()
            .is_some_and(|f| maps.column_index(&f.column_id).is_none() || f.rows.iter().any(|&r| r >= maps.row_count()))
        {
            self.fill_preview = None;
            changes.fill = true;
        }
        changes
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut Option<T>, value: Option<T>) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
