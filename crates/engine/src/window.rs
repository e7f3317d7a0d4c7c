//! Viewport Data Window Manager
//!
//! Serves an unbounded row space to a fixed-height viewport with bounded
//! memory. Rows come from two places:
//! - primary rows: `[0, primary.len())`, loaded when the session opens
//! - windows: disjoint, sorted slices fetched on demand
//!
//! Key invariants:
//! - Windows never overlap each other or the primary range
//! - A loading window claims its range immediately, so a second request
//!   for the same rows shares the in-flight fetch
//! - Completions tagged with an older generation are ignored
//! - Eviction never removes a loading window or one intersecting the
//!   visible viewport

use gridbase_core::{ColumnId, Row, RowId};

use crate::store::{RowPage, StoreError};

/// Per-index load state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unfetched,
    Loading,
    Loaded,
}

/// Identifies one fetch. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub generation: u64,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub key: ChunkKey,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataWindow {
    pub start: usize,
    /// Exclusive.
    pub end: usize,
    pub rows: Vec<Row>,
    pub loading: bool,
    loaded_seq: u64,
}

impl DataWindow {
    fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    fn intersects(&self, first: usize, last: usize) -> bool {
        self.start <= last && first < self.end
    }
}

/// What a fetch completion did to the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Rows `[start, end)` are now loaded.
    Loaded { start: usize, end: usize },
    /// The fetch failed; its range is unfetched again.
    Failed { start: usize, end: usize, error: StoreError },
    /// Superseded by an invalidation or no longer tracked.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    pub buffer_rows: usize,
    pub chunk_size: usize,
    pub max_windows: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            buffer_rows: 20,
            chunk_size: 100,
            max_windows: 24,
        }
    }
}

pub struct WindowManager {
    config: WindowConfig,
    total: usize,
    primary: Vec<Row>,
    windows: Vec<DataWindow>,
    generation: u64,
    load_seq: u64,
    /// Last visible range passed to `ensure`, inclusive.
    viewport: Option<(usize, usize)>,
    /// Set when loaded rows were evicted since the last `take_evicted`.
    evicted: bool,
}

impl WindowManager {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config: WindowConfig {
                buffer_rows: config.buffer_rows,
                chunk_size: config.chunk_size.max(1),
                max_windows: config.max_windows.max(2),
            },
            total: 0,
            primary: Vec::new(),
            windows: Vec::new(),
            generation: 0,
            load_seq: 0,
            viewport: None,
            evicted: false,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn viewport(&self) -> Option<(usize, usize)> {
        self.viewport
    }

    pub fn windows(&self) -> &[DataWindow] {
        &self.windows
    }

    pub fn primary_len(&self) -> usize {
        self.primary.len()
    }

    /// Replace the primary rows and the size of the row space.
    pub fn set_primary(&mut self, rows: Vec<Row>, total: usize) {
        self.total = total.max(rows.len());
        self.primary = rows;
        self.invalidate();
    }

    pub fn set_total(&mut self, total: usize) {
        self.total = total.max(self.primary.len());
        self.windows.retain(|w| w.start < self.total);
        for w in &mut self.windows {
            if w.end > self.total {
                w.end = self.total;
                w.rows.truncate(w.end - w.start);
            }
        }
    }

    /// Drop every window and bump the generation so in-flight fetches are
    /// ignored when they land. Primary rows are kept.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.windows.clear();
    }

    pub fn row_at(&self, index: usize) -> Option<&Row> {
        if index < self.primary.len() {
            return self.primary.get(index);
        }
        let window = self.window_at(index)?;
        if window.loading {
            return None;
        }
        window.rows.get(index - window.start)
    }

    pub fn state(&self, index: usize) -> LoadState {
        if index < self.primary.len() {
            return LoadState::Loaded;
        }
        match self.window_at(index) {
            Some(w) if w.loading => LoadState::Loading,
            Some(_) => LoadState::Loaded,
            None => LoadState::Unfetched,
        }
    }

    fn window_at(&self, index: usize) -> Option<&DataWindow> {
        let pos = self.windows.partition_point(|w| w.end <= index);
        self.windows.get(pos).filter(|w| w.contains(index))
    }

    /// Every loaded `(index, row id)` pair, for rebuilding coordinate maps.
    pub fn known_rows(&self) -> impl Iterator<Item = (usize, &RowId)> {
        let primary = self.primary.iter().enumerate().map(|(i, r)| (i, &r.id));
        let windowed = self
            .windows
            .iter()
            .filter(|w| !w.loading)
            .flat_map(|w| w.rows.iter().enumerate().map(move |(i, r)| (w.start + i, &r.id)));
        primary.chain(windowed)
    }

    /// Every loaded row, primary first.
    pub fn loaded_rows(&self) -> impl Iterator<Item = &Row> {
        self.primary
            .iter()
            .chain(self.windows.iter().filter(|w| !w.loading).flat_map(|w| w.rows.iter()))
    }

    pub fn row_mut(&mut self, row_id: &RowId) -> Option<&mut Row> {
        self.primary
            .iter_mut()
            .chain(self.windows.iter_mut().flat_map(|w| w.rows.iter_mut()))
            .find(|r| &r.id == row_id)
    }

    /// Index and contents of a loaded row.
    pub fn find_row(&self, row_id: &RowId) -> Option<(usize, &Row)> {
        if let Some(i) = self.primary.iter().position(|r| &r.id == row_id) {
            return Some((i, &self.primary[i]));
        }
        self.windows.iter().find_map(|w| {
            w.rows
                .iter()
                .position(|r| &r.id == row_id)
                .map(|i| (w.start + i, &w.rows[i]))
        })
    }

    /// Append a row at the end of the row space. It lands in the primary
    /// rows only when they already reach the end.
    pub fn push_row(&mut self, row: Row) {
        if self.primary.len() == self.total {
            self.primary.push(row);
        }
        self.total += 1;
        self.invalidate();
    }

    /// Insert a row at `index`, shifting later rows down.
    pub fn insert_row(&mut self, index: usize, row: Row) {
        if index <= self.primary.len() && (index < self.primary.len() || self.primary.len() == self.total) {
            self.primary.insert(index, row);
        }
        self.total += 1;
        self.invalidate();
    }

    /// Remove a row by id. Returns its former index when it was loaded.
    pub fn remove_row(&mut self, row_id: &RowId) -> Option<usize> {
        let index = self.find_row(row_id).map(|(i, _)| i);
        if let Some(i) = index {
            if i < self.primary.len() {
                self.primary.remove(i);
            }
            self.total = self.total.saturating_sub(1);
        }
        self.invalidate();
        index
    }

    pub fn remove_column(&mut self, column_id: &ColumnId) {
        for row in self
            .primary
            .iter_mut()
            .chain(self.windows.iter_mut().flat_map(|w| w.rows.iter_mut()))
        {
            row.remove_column(column_id);
        }
    }

    /// Make sure rows `[first, last]` plus the buffer are loaded or loading.
    /// Returns the one fetch to issue, if any range is still unfetched.
    pub fn ensure(&mut self, first: usize, last: usize) -> Option<FetchRequest> {
        if self.total == 0 {
            return None;
        }
        let (first, last) = (first.min(last), first.max(last));
        let first = first.min(self.total - 1);
        let last = last.min(self.total - 1);
        self.viewport = Some((first, last));

        let lo = first.saturating_sub(self.config.buffer_rows);
        let hi = (last + self.config.buffer_rows).min(self.total - 1);
        let center = (first + last) / 2;

        let gaps = self.gaps(lo, hi + 1);
        let (gap_start, gap_end) = gaps
            .into_iter()
            .min_by_key(|&(s, e)| (distance(center, s, e), s))?;

        let (start, end) = self.place_chunk(center, gap_start, gap_end);
        let key = ChunkKey {
            generation: self.generation,
            start,
            end,
        };
        let pos = self.windows.partition_point(|w| w.start < start);
        self.windows.insert(
            pos,
            DataWindow {
                start,
                end,
                rows: Vec::new(),
                loading: true,
                loaded_seq: 0,
            },
        );
        self.evict();

        log::debug!("fetching rows {}..{} (generation {})", start, end, self.generation);
        Some(FetchRequest {
            key,
            offset: start,
            limit: end - start,
        })
    }

    /// Uncovered sub-ranges of `[lo, hi)`, in ascending order.
    fn gaps(&self, lo: usize, hi: usize) -> Vec<(usize, usize)> {
        let mut gaps = Vec::new();
        let mut cursor = lo.max(self.primary.len());
        for w in &self.windows {
            if cursor >= hi {
                break;
            }
            if w.end <= cursor {
                continue;
            }
            if w.start > cursor {
                gaps.push((cursor, w.start.min(hi)));
            }
            cursor = cursor.max(w.end);
        }
        if cursor < hi {
            gaps.push((cursor, hi));
        }
        gaps
    }

    /// Chunk bounds for the gap `[gap_start, gap_end)`. The chunk contains
    /// the gap point nearest `center` and never leaves uncovered space.
    fn place_chunk(&self, center: usize, gap_start: usize, gap_end: usize) -> (usize, usize) {
        let chunk = self.config.chunk_size;
        if gap_end - gap_start >= chunk {
            let point = center.clamp(gap_start, gap_end - 1);
            let start = point.saturating_sub(chunk / 2).clamp(gap_start, gap_end - chunk);
            return (start, start + chunk);
        }

        // Free space around the gap, bounded by neighbouring windows.
        let free_start = self
            .windows
            .iter()
            .filter(|w| w.end <= gap_start)
            .map(|w| w.end)
            .max()
            .unwrap_or(0)
            .max(self.primary.len());
        let free_end = self
            .windows
            .iter()
            .filter(|w| w.start >= gap_end)
            .map(|w| w.start)
            .min()
            .unwrap_or(self.total);

        let end = (gap_start + chunk).min(free_end);
        let start = end.saturating_sub(chunk).max(free_start).min(gap_start);
        (start, end)
    }

    /// Apply a fetch result.
    pub fn complete(&mut self, key: ChunkKey, result: Result<RowPage, StoreError>) -> Completion {
        if key.generation != self.generation {
            log::debug!("ignoring stale fetch {}..{} (generation {})", key.start, key.end, key.generation);
            return Completion::Stale;
        }
        let Some(pos) = self
            .windows
            .iter()
            .position(|w| w.loading && w.start == key.start && w.end == key.end)
        else {
            return Completion::Stale;
        };

        match result {
            Err(error) => {
                self.windows.remove(pos);
                log::warn!("fetch of rows {}..{} failed: {}", key.start, key.end, error);
                Completion::Failed {
                    start: key.start,
                    end: key.end,
                    error,
                }
            }
            Ok(page) => {
                let mut rows = page.items;
                rows.truncate(key.end - key.start);
                let len = rows.len();
                if len < key.end - key.start {
                    // Short page: the table ends here.
                    self.total = (key.start + len).max(self.primary.len());
                }
                if len == 0 {
                    self.windows.remove(pos);
                } else {
                    self.load_seq += 1;
                    let window = &mut self.windows[pos];
                    window.end = key.start + len;
                    window.rows = rows;
                    window.loading = false;
                    window.loaded_seq = self.load_seq;
                }
                let total = self.total;
                self.windows.retain(|w| w.start < total);
                self.evict();
                log::debug!("loaded rows {}..{}", key.start, key.start + len);
                Completion::Loaded {
                    start: key.start,
                    end: key.start + len,
                }
            }
        }
    }

    /// Drop the oldest loaded windows until the cap holds.
    fn evict(&mut self) {
        while self.windows.len() > self.config.max_windows {
            let viewport = self.viewport;
            let victim = self
                .windows
                .iter()
                .enumerate()
                .filter(|(_, w)| !w.loading)
                .filter(|(_, w)| viewport.map_or(true, |(first, last)| !w.intersects(first, last)))
                .min_by_key(|(_, w)| w.loaded_seq)
                .map(|(i, _)| i);
            match victim {
                Some(i) => {
                    let w = self.windows.remove(i);
                    self.evicted = true;
                    log::debug!("evicted rows {}..{}", w.start, w.end);
                }
                None => break,
            }
        }
    }

    /// Whether loaded rows were dropped since the last call. Row indices
    /// they covered no longer resolve.
    pub fn take_evicted(&mut self) -> bool {
        std::mem::take(&mut self.evicted)
    }

    /// Whether any visible index in `[first, last]` is not loaded yet.
    pub fn is_loading(&self, first: usize, last: usize) -> bool {
        if self.total == 0 {
            return false;
        }
        let last = last.min(self.total - 1);
        (first..=last).any(|i| self.state(i) != LoadState::Loaded)
    }
}

fn distance(point: usize, start: usize, end: usize) -> usize {
    if point < start {
        start - point
    } else if point >= end {
        point - (end - 1)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(start: usize, count: usize) -> Vec<Row> {
        (start..start + count).map(|i| Row::new(format!("row{i}"), i)).collect()
    }

    fn page(req: &FetchRequest) -> RowPage {
        RowPage {
            items: rows(req.offset, req.limit),
        }
    }

    fn manager(total: usize, primary: usize) -> WindowManager {
        let mut m = WindowManager::new(WindowConfig::default());
        m.set_primary(rows(0, primary), total);
        m
    }

    #[test]
    fn test_single_chunk_covers_viewport_and_buffer() {
        let mut m = manager(1000, 100);
        let req = m.ensure(400, 420).unwrap();
        assert_eq!((req.offset, req.limit), (380, 100));
        assert!(m.ensure(400, 420).is_none());
        assert_eq!(m.state(400), LoadState::Loading);
    }

    #[test]
    fn test_primary_rows_need_no_fetch() {
        let mut m = manager(1000, 100);
        assert!(m.ensure(0, 20).is_none());
        assert!(!m.is_loading(0, 20));
        assert_eq!(m.row_at(5).map(|r| r.id.as_str()), Some("row5"));
    }

    #[test]
    fn test_completion_loads_rows() {
        let mut m = manager(1000, 100);
        let req = m.ensure(400, 420).unwrap();
        assert!(m.is_loading(400, 420));
        let done = m.complete(req.key, Ok(page(&req)));
        assert_eq!(done, Completion::Loaded { start: 380, end: 480 });
        assert!(!m.is_loading(400, 420));
        assert_eq!(m.row_at(450).map(|r| r.id.as_str()), Some("row450"));
        assert!(m.row_at(480).is_none());
    }

    #[test]
    fn test_gap_closest_to_center_first() {
        let mut m = manager(1000, 0);
        let req = m.ensure(500, 520).unwrap();
        m.complete(req.key, Ok(page(&req)));
        // Viewport straddles the loaded window; two gaps remain.
        let req = m.ensure(440, 620).unwrap();
        assert_eq!(req.offset, 580);
        assert!(m.windows().windows(2).all(|w| w[0].end <= w[1].start));
    }

    #[test]
    fn test_chunk_never_overlaps_neighbours() {
        let mut m = manager(1000, 0);
        let a = m.ensure(300, 310).unwrap();
        m.complete(a.key, Ok(page(&a)));
        let b = m.ensure(230, 240).unwrap();
        assert!(b.offset + b.limit <= a.offset);
        assert!(b.offset <= 210);
    }

    #[test]
    fn test_short_page_shrinks_total() {
        let mut m = manager(1000, 0);
        let req = m.ensure(0, 10).unwrap();
        let done = m.complete(req.key, Ok(RowPage { items: rows(0, 30) }));
        assert_eq!(done, Completion::Loaded { start: 0, end: 30 });
        assert_eq!(m.total(), 30);
    }

    #[test]
    fn test_failed_fetch_is_retried() {
        let mut m = manager(1000, 100);
        let req = m.ensure(400, 420).unwrap();
        let done = m.complete(req.key, Err(StoreError::Network("offline".into())));
        assert!(matches!(done, Completion::Failed { start: 380, .. }));
        assert_eq!(m.state(400), LoadState::Unfetched);
        assert!(m.ensure(400, 420).is_some());
    }

    #[test]
    fn test_stale_generation_ignored() {
        let mut m = manager(1000, 100);
        let req = m.ensure(400, 420).unwrap();
        m.invalidate();
        assert_eq!(m.complete(req.key, Ok(page(&req))), Completion::Stale);
        assert!(m.row_at(400).is_none());
    }

    #[test]
    fn test_eviction_skips_visible_window() {
        let mut m = WindowManager::new(WindowConfig {
            buffer_rows: 0,
            chunk_size: 10,
            max_windows: 2,
        });
        m.set_primary(Vec::new(), 1000);
        for first in [0, 100, 200] {
            let req = m.ensure(first, first + 5).unwrap();
            m.complete(req.key, Ok(page(&req)));
        }
        assert_eq!(m.windows().len(), 2);
        assert_eq!(m.state(0), LoadState::Unfetched);
        assert_eq!(m.state(200), LoadState::Loaded);
        assert!(m.take_evicted());
        assert!(!m.take_evicted());
    }

    #[test]
    fn test_push_row_extends_primary_at_end() {
        let mut m = manager(3, 3);
        m.push_row(Row::new("new", 3));
        assert_eq!(m.total(), 4);
        assert_eq!(m.row_at(3).map(|r| r.id.as_str()), Some("new"));

        let mut m = manager(1000, 100);
        m.push_row(Row::new("new", 1000));
        assert_eq!(m.total(), 1001);
        assert_eq!(m.primary_len(), 100);
    }

    #[test]
    fn test_remove_and_reinsert_row() {
        let mut m = manager(5, 5);
        assert_eq!(m.remove_row(&RowId::from("row2")), Some(2));
        assert_eq!(m.total(), 4);
        assert_eq!(m.row_at(2).map(|r| r.id.as_str()), Some("row3"));
        m.insert_row(2, Row::new("row2", 2));
        assert_eq!(m.row_at(2).map(|r| r.id.as_str()), Some("row2"));
        assert_eq!(m.total(), 5);
    }

    #[test]
    fn test_known_rows_skip_loading_windows() {
        let mut m = manager(1000, 2);
        m.ensure(400, 420);
        assert_eq!(m.known_rows().count(), 2);
    }
}
