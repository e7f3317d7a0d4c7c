// `gridbase replay`: load a CSV into a memory store, drive a grid session
// with a script of user actions, then print what the store ended up with.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use gridbase_config::GridSettings;
use gridbase_core::{ColumnType, GridCell, TableId};
use gridbase_engine::{
    parse_key_combo, EventCollector, GridEngine, GridSession, InputEvent, Key, MemoryClipboard,
    SelectOptions,
};

use crate::error::CliError;
use crate::script::{parse_script, Action};
use crate::table::{load_csv, write_table, OutputFormat};

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub data: PathBuf,
    pub script: PathBuf,
    pub settings: Option<PathBuf>,
    pub format: OutputFormat,
    /// Columns forced to NUMBER regardless of their contents.
    pub number: Vec<String>,
}

/// What the run produced besides the table itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub actions: usize,
    pub mutation_failures: usize,
    pub fetch_failures: usize,
    /// Last text the script copied, if any.
    pub clipboard: Option<String>,
}

fn read_file(path: &Path, what: &str) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|e| CliError::usage(format!("cannot read {} {}: {}", what, path.display(), e)))
}

fn settings_for(path: Option<&Path>) -> Result<GridSettings, CliError> {
    match path {
        Some(path) => GridSettings::load_from(path)
            .map_err(|e| CliError::usage(format!("{}: {}", path.display(), e))),
        None => Ok(GridSettings::load()),
    }
}

fn table_id(data: &Path) -> TableId {
    data.file_stem()
        .and_then(|s| s.to_str())
        .map(TableId::from)
        .unwrap_or_else(|| TableId::from("data"))
}

/// Run the replay and write the resulting table to `out`.
pub fn run_replay<W: Write>(options: &ReplayOptions, out: W) -> Result<ReplaySummary, CliError> {
    let data = read_file(&options.data, "data file")?;
    let actions = parse_script(&read_file(&options.script, "script")?)?;
    let settings = settings_for(options.settings.as_deref())?;
    let table = table_id(&options.data);
    let store = load_csv(data.as_bytes(), table.clone(), &options.number)?;

    let clipboard = MemoryClipboard::new();
    let collector = EventCollector::new();

    let session = smol::block_on(GridSession::open(store, table, settings, Rc::new(clipboard.clone())))
        .map_err(|e| CliError::runtime(format!("cannot open table: {}", e)))?;
    session.with_engine(|engine| engine.subscribe(collector.callback()));

    for (i, action) in actions.iter().enumerate() {
        log::debug!("action {}: {:?}", i + 1, action);
        session
            .with_engine(|engine| apply(engine, action))
            .map_err(|e| CliError { message: format!("action {}: {}", i + 1, e.message), ..e })?;
        // Each action sees the results of the one before it.
        smol::block_on(session.run_until_idle());
    }

    let summary = ReplaySummary {
        actions: actions.len(),
        mutation_failures: collector.mutation_failures(),
        fetch_failures: collector.fetch_failures(),
        clipboard: clipboard.contents(),
    };
    if summary.mutation_failures > 0 {
        log::warn!("{} store write(s) failed and were rolled back", summary.mutation_failures);
    }

    write_table(session.store(), options.format, out)?;
    Ok(summary)
}

fn cell(engine: &GridEngine, row: usize, col: usize) -> Result<GridCell, CliError> {
    engine.maps().cell_at(row, col).ok_or_else(|| {
        CliError::usage(format!("no loaded cell at row {}, col {}", row, col))
            .with_hint("rows far from the top need a \"viewport\" action before they can be addressed")
    })
}

fn apply(engine: &mut GridEngine, action: &Action) -> Result<(), CliError> {
    match action {
        Action::Select { row, col } => {
            let target = cell(engine, *row, *col)?;
            engine.select_cell(target, SelectOptions::default());
        }
        Action::Extend { row, col } => {
            let target = cell(engine, *row, *col)?;
            engine.select_cell(target, SelectOptions::extend());
        }
        Action::Move { rows, cols, extend } => {
            engine.move_selection(*rows, *cols, *extend);
        }
        Action::Key { combo } => {
            let (key, modifiers) =
                parse_key_combo(combo).ok_or_else(|| CliError::usage(format!("unknown key combo: {:?}", combo)))?;
            engine.handle_input(InputEvent::Key { key, modifiers });
        }
        Action::Type { text } => {
            for c in text.chars() {
                engine.handle_input(InputEvent::key(Key::Char(c)));
            }
        }
        Action::Commit => {
            engine.commit_edit();
        }
        Action::Cancel => {
            engine.cancel_edit();
        }
        Action::Paste { text: Some(text) } => {
            engine.paste_text(text);
        }
        Action::Paste { text: None } => engine.request_paste(),
        Action::Copy => {
            engine.copy();
        }
        Action::Fill { row, col } => {
            let origin = engine
                .active_cell()
                .cloned()
                .ok_or_else(|| CliError::usage("fill needs an active cell"))?;
            let target = cell(engine, *row, *col)?;
            engine.update_fill_preview(&origin, &target);
            if let Some(preview) = engine.fill_preview().cloned() {
                engine.apply_fill(&preview, &origin);
            }
        }
        Action::Delete => {
            engine.clear_selection_values();
        }
        Action::Undo => {
            engine.undo();
        }
        Action::Redo => {
            engine.redo();
        }
        Action::Viewport { first, last } => {
            engine.ensure_viewport_data(*first, *last);
        }
        Action::AddRow => {
            engine.add_row();
        }
        Action::DeleteRow { row } => {
            let row_id = engine
                .maps()
                .row_id_at(*row)
                .cloned()
                .ok_or_else(|| CliError::usage(format!("no loaded row at {}", row)))?;
            engine.delete_row(&row_id);
        }
        Action::AddColumn { name, number } => {
            let column_type = if *number { ColumnType::Number } else { ColumnType::Text };
            engine.add_column(name, column_type);
        }
        Action::DeleteColumn { col } => {
            let column_id = column_id(engine, *col)?;
            engine.delete_column(&column_id);
        }
        Action::RenameColumn { col, name } => {
            let column_id = column_id(engine, *col)?;
            engine.rename_column(&column_id, name);
        }
    }
    Ok(())
}

fn column_id(engine: &GridEngine, col: usize) -> Result<gridbase_core::ColumnId, CliError> {
    engine
        .maps()
        .column_at(col)
        .map(|c| c.id.clone())
        .ok_or_else(|| CliError::usage(format!("no column at {}", col)))
}
