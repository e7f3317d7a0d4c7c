//! Replay scripts: one JSON action per line.
//!
//! ```text
//! {"action": "select", "row": 0, "col": 1}
//! {"action": "type", "text": "42"}
//! {"action": "key", "combo": "enter"}
//! {"action": "fill", "row": 5, "col": 1}
//! ```
//!
//! Blank lines and lines starting with `#` or `//` are skipped.
//! Coordinates are display indices at the moment the action runs.

use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Make a cell active and collapse the selection onto it.
    Select { row: usize, col: usize },
    /// Extend the selection to a cell, keeping the anchor.
    Extend { row: usize, col: usize },
    Move {
        #[serde(default)]
        rows: isize,
        #[serde(default)]
        cols: isize,
        #[serde(default)]
        extend: bool,
    },
    /// A key combo such as `"shift+down"` or `"ctrl+z"`.
    Key { combo: String },
    /// Each character is sent as a key press.
    Type { text: String },
    Commit,
    Cancel,
    /// Paste `text`, or read the clipboard when absent.
    Paste {
        #[serde(default)]
        text: Option<String>,
    },
    Copy,
    /// Fill from the active cell down (or up) to `row`.
    Fill { row: usize, col: usize },
    /// Clear every value in the selection.
    Delete,
    Undo,
    Redo,
    Viewport { first: usize, last: usize },
    AddRow,
    DeleteRow { row: usize },
    AddColumn {
        name: String,
        #[serde(default)]
        number: bool,
    },
    DeleteColumn { col: usize },
    RenameColumn { col: usize, name: String },
}

fn is_skipped(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//")
}

/// Parse a whole script. Errors name the offending 1-based line.
pub fn parse_script(text: &str) -> Result<Vec<Action>, CliError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !is_skipped(line))
        .map(|(i, line)| {
            serde_json::from_str(line.trim()).map_err(|e| {
                CliError::usage(format!("script line {}: {}", i + 1, e))
                    .with_hint("each line must be a JSON object with an \"action\" field")
            })
        })
        .collect()
}
