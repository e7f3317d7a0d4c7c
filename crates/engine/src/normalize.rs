//! Value normalization at commit time.
//!
//! TEXT columns store whatever was typed. NUMBER columns store the canonical
//! decimal form of a finite number, or null. Normalization never fails.

use gridbase_core::{Column, ColumnType};

/// An edit value before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Text(String),
    Number(f64),
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<Option<String>> for RawValue {
    fn from(v: Option<String>) -> Self {
        v.map_or(RawValue::Null, RawValue::Text)
    }
}

impl From<Option<&str>> for RawValue {
    fn from(v: Option<&str>) -> Self {
        v.map_or(RawValue::Null, |s| RawValue::Text(s.to_string()))
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

/// Canonical string for a finite number. `-0` prints as `0`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Normalize a raw value for `column`. `None` column (unknown) passes the
/// input through unchanged.
pub fn normalize(column: Option<&Column>, raw: RawValue) -> Option<String> {
    let column_type = match column {
        Some(c) => c.column_type,
        None => {
            return match raw {
                RawValue::Null => None,
                RawValue::Text(s) => Some(s),
                RawValue::Number(n) => Some(n.to_string()),
            }
        }
    };

    match (column_type, raw) {
        (_, RawValue::Null) => None,
        (ColumnType::Text, RawValue::Text(s)) => Some(s),
        (ColumnType::Text, RawValue::Number(n)) => Some(n.to_string()),
        (ColumnType::Number, RawValue::Text(s)) => parse_number(&s).map(format_number),
        (ColumnType::Number, RawValue::Number(n)) => Some(n).filter(|n| n.is_finite()).map(format_number),
    }
}

/// Form used to decide whether a commit changes anything. Null and empty
/// text compare equal, so clearing an empty cell is not an edit.
pub(crate) fn comparable(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number() -> Column {
        Column::new("n", "N", ColumnType::Number, 0)
    }

    fn text() -> Column {
        Column::new("t", "T", ColumnType::Text, 0)
    }

    #[test]
    fn test_text_passes_through() {
        assert_eq!(normalize(Some(&text()), " hi ".into()), Some(" hi ".into()));
        assert_eq!(normalize(Some(&text()), RawValue::Number(3.5)), Some("3.5".into()));
        assert_eq!(normalize(Some(&text()), RawValue::Null), None);
    }

    #[test]
    fn test_number_canonical() {
        let col = number();
        assert_eq!(normalize(Some(&col), " 42 ".into()), Some("42".into()));
        assert_eq!(normalize(Some(&col), "1.50".into()), Some("1.5".into()));
        assert_eq!(normalize(Some(&col), "1e3".into()), Some("1000".into()));
        assert_eq!(normalize(Some(&col), "-0".into()), Some("0".into()));
        assert_eq!(normalize(Some(&col), RawValue::Number(-0.0)), Some("0".into()));
    }

    #[test]
    fn test_number_rejects_garbage() {
        let col = number();
        assert_eq!(normalize(Some(&col), "x".into()), None);
        assert_eq!(normalize(Some(&col), "   ".into()), None);
        assert_eq!(normalize(Some(&col), "inf".into()), None);
        assert_eq!(normalize(Some(&col), "NaN".into()), None);
        assert_eq!(normalize(Some(&col), RawValue::Number(f64::INFINITY)), None);
    }

    #[test]
    fn test_unknown_column_unchanged() {
        assert_eq!(normalize(None, "x".into()), Some("x".into()));
        assert_eq!(normalize(None, RawValue::Null), None);
    }

    #[test]
    fn test_comparable_null_is_empty() {
        assert_eq!(comparable(&None), comparable(&Some(String::new())));
    }
}
