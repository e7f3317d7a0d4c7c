//! CSV in, CSV/TSV out.
//!
//! The header row names the columns. A column is NUMBER when every
//! non-empty value parses as a finite number (or when forced by name);
//! everything else is TEXT. Empty fields load as null.

use std::io::{Read, Write};

use gridbase_core::{Column, ColumnType, Row, TableId};
use gridbase_engine::MemoryStore;

use crate::error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Tsv,
    Csv,
}

impl OutputFormat {
    fn delimiter(self) -> u8 {
        match self {
            OutputFormat::Tsv => b'\t',
            OutputFormat::Csv => b',',
        }
    }
}

fn is_number(s: &str) -> bool {
    s.trim().parse::<f64>().map(|n| n.is_finite()).unwrap_or(false)
}

/// Load CSV text into a single-table store.
pub fn load_csv<R: Read>(reader: R, table: TableId, force_number: &[String]) -> Result<MemoryStore, CliError> {
    let mut csv = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);
    let headers: Vec<String> = csv
        .headers()
        .map_err(|e| CliError::usage(format!("cannot read CSV header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() {
        return Err(CliError::usage("CSV has no header row"));
    }

    let mut records: Vec<Vec<Option<String>>> = Vec::new();
    for (line, record) in csv.records().enumerate() {
        let record = record.map_err(|e| CliError::usage(format!("CSV record {}: {}", line + 1, e)))?;
        let values = (0..headers.len())
            .map(|i| record.get(i).filter(|v| !v.is_empty()).map(str::to_string))
            .collect();
        records.push(values);
    }

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut present = records.iter().filter_map(|r| r[i].as_deref()).peekable();
            let inferred = present.peek().is_some() && present.all(is_number);
            let forced = force_number.iter().any(|f| f == name);
            let column_type = if inferred || forced { ColumnType::Number } else { ColumnType::Text };
            Column::new(format!("col{i}"), name.as_str(), column_type, i)
        })
        .collect();

    let rows = records
        .into_iter()
        .enumerate()
        .map(|(i, values)| {
            let mut row = Row::new(format!("row{i}"), i);
            for (column, value) in columns.iter().zip(values) {
                if value.is_some() {
                    row.set_value(&column.id, value);
                }
            }
            row
        })
        .collect();

    log::debug!("loaded {} column(s) from CSV", columns.len());
    Ok(MemoryStore::new(table, columns, rows))
}

/// Write the store's current contents, header first. Null prints empty.
pub fn write_table<W: Write>(store: &MemoryStore, format: OutputFormat, out: W) -> Result<(), CliError> {
    let mut columns = store.columns();
    gridbase_core::model::sort_columns(&mut columns);

    let mut writer = csv::WriterBuilder::new().delimiter(format.delimiter()).from_writer(out);
    let write_err = |e: csv::Error| CliError::runtime(format!("write failed: {}", e));

    writer
        .write_record(columns.iter().map(|c| c.name.as_str()))
        .map_err(write_err)?;
    for row in store.rows() {
        writer
            .write_record(columns.iter().map(|c| row.value(&c.id).unwrap_or("")))
            .map_err(write_err)?;
    }
    writer.flush().map_err(|e| CliError::runtime(format!("write failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridbase_core::{ColumnId, RowId};

    const DATA: &str = "name,age,zip\nAnn,30,0101\nBo,,0202\n";

    #[test]
    fn test_infers_number_columns() {
        let store = load_csv(DATA.as_bytes(), TableId::from("t"), &[]).unwrap();
        let types: Vec<_> = store.columns().iter().map(|c| c.column_type).collect();
        assert_eq!(types, vec![ColumnType::Text, ColumnType::Number, ColumnType::Number]);
        assert_eq!(store.value(&RowId::from("row1"), &ColumnId::from("col1")), None);
    }

    #[test]
    fn test_force_number() {
        let store = load_csv("a\nx\n".as_bytes(), TableId::from("t"), &["a".to_string()]).unwrap();
        assert_eq!(store.columns()[0].column_type, ColumnType::Number);
    }

    #[test]
    fn test_empty_column_is_text() {
        let store = load_csv("a,b\n1,\n".as_bytes(), TableId::from("t"), &[]).unwrap();
        assert_eq!(store.columns()[1].column_type, ColumnType::Text);
    }

    #[test]
    fn test_write_tsv() {
        let store = load_csv(DATA.as_bytes(), TableId::from("t"), &[]).unwrap();
        let mut out = Vec::new();
        write_table(&store, OutputFormat::Tsv, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "name\tage\tzip\nAnn\t30\t0101\nBo\t\t0202\n");
    }
}
