//! Viewport data: on-demand row windows and their completions.

use gridbase_core::Row;

use crate::events::GridEvent;
use crate::grid::{Effect, GridEngine};
use crate::store::{RowPage, StoreError};
use crate::window::{ChunkKey, Completion, LoadState};

impl GridEngine {
    /// Make sure visible rows `[first, last]` (plus the buffer) are loaded
    /// or loading. Returns whether a fetch was issued.
    pub fn ensure_viewport_data(&mut self, first: usize, last: usize) -> bool {
        let request = self.windows.ensure(first, last);
        if self.windows.take_evicted() {
            self.rebuild_maps();
        }
        match request {
            Some(request) => {
                self.push_effect(Effect::Fetch(request));
                true
            }
            None => false,
        }
    }

    /// Re-run `ensure` for the last requested viewport.
    pub(crate) fn refresh_viewport(&mut self) {
        if let Some((first, last)) = self.windows.viewport() {
            self.ensure_viewport_data(first, last);
        }
    }

    pub fn complete_fetch(&mut self, key: ChunkKey, result: Result<RowPage, StoreError>) {
        match self.windows.complete(key, result) {
            Completion::Stale => {}
            Completion::Loaded { start, end } => {
                self.windows.take_evicted();
                self.rebuild_maps();
                self.emit(GridEvent::RowsLoaded { start, end });
                // A viewport wider than one chunk fills in chunk by chunk.
                self.refresh_viewport();
            }
            Completion::Failed { start, end, error } => {
                self.rebuild_maps();
                self.emit(GridEvent::FetchFailed {
                    start,
                    end,
                    message: error.to_string(),
                });
            }
        }
    }

    /// Whether any row of the last requested viewport is not loaded yet.
    pub fn is_viewport_loading(&self) -> bool {
        match self.windows.viewport() {
            Some((first, last)) => self.windows.is_loading(first, last),
            None => false,
        }
    }

    pub fn loading_state(&self, index: usize) -> LoadState {
        self.windows.state(index)
    }

    /// Empty row shell the renderer can draw while `index` loads.
    pub fn placeholder_row(&self, index: usize) -> Row {
        Row::new(format!("placeholder-{index}"), index)
    }

    /// Resize the row space (e.g. after an external count).
    pub fn set_total_rows(&mut self, total: usize) {
        self.windows.set_total(total);
        self.rebuild_maps();
    }
}
