//! Uploaded dataset analysis
//!
//! Independent of the weather flow: load a CSV or spreadsheet, infer which
//! columns are numeric, plot two of them and summarize every numeric column.

pub mod chart;
pub mod loader;
pub mod stats;

use serde::Serialize;
use std::fmt;

pub use chart::{ChartKind, ChartRequest, TabularChart, Trace, XyPoint};
pub use loader::load;
pub use stats::{ColumnSummary, describe};

/// Number of rows shown in the data preview
pub const PREVIEW_ROWS: usize = 5;

/// A single parsed cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// Infer a cell from its raw text. Blank and common NA markers are missing.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "" | "NA" | "N/A" | "NaN" | "nan" | "null" | "NULL" | "None" => Cell::Missing,
            _ => raw
                .parse::<f64>()
                .map_or_else(|_| Cell::Text(raw.to_string()), Cell::Number),
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Text(text) => f.write_str(text),
            Cell::Missing => f.write_str("NaN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub cells: Vec<Cell>,
}

impl Column {
    /// Numeric when at least one cell is a number and none is text
    #[must_use]
    pub fn new(name: String, cells: Vec<Cell>) -> Self {
        let has_number = cells.iter().any(|c| matches!(c, Cell::Number(_)));
        let has_text = cells.iter().any(|c| matches!(c, Cell::Text(_)));
        let kind = if has_number && !has_text {
            ColumnKind::Numeric
        } else {
            ColumnKind::Text
        };
        Self { name, kind, cells }
    }

    /// Non-missing numeric values in file order
    #[must_use]
    pub fn numbers(&self) -> Vec<f64> {
        self.cells.iter().filter_map(Cell::as_number).collect()
    }
}

/// In-memory table loaded from one uploaded file
#[derive(Debug, Clone, PartialEq)]
pub struct TabularDataset {
    columns: Vec<Column>,
    row_count: usize,
}

/// First rows of a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Everything the analysis page shows for one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub row_count: usize,
    pub preview: Preview,
    pub chart: Option<TabularChart>,
    pub summary: Vec<ColumnSummary>,
}

impl TabularDataset {
    /// Build from a header row and raw text rows. Short rows are padded with
    /// missing cells, surplus cells are dropped.
    #[must_use]
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let row_count = rows.len();
        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(index, header)| {
                let name = if header.trim().is_empty() {
                    format!("Unnamed: {index}")
                } else {
                    header.trim().to_string()
                };
                let cells = rows
                    .iter()
                    .map(|row| row.get(index).map_or(Cell::Missing, |raw| Cell::parse(raw)))
                    .collect();
                Column::new(name, cells)
            })
            .collect();

        Self { columns, row_count }
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    #[must_use]
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .map(|c| c.name.clone())
            .collect()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn preview(&self, rows: usize) -> Preview {
        let rows = (0..self.row_count.min(rows))
            .map(|row| self.columns.iter().map(|c| c.cells[row].clone()).collect())
            .collect();

        Preview {
            columns: self.column_names(),
            rows,
        }
    }

    /// Preview, statistics and, when requested, a chart
    pub fn analyze(&self, request: Option<&ChartRequest>) -> crate::Result<Analysis> {
        let chart = request.map(|r| chart::build(self, r)).transpose()?;

        Ok(Analysis {
            columns: self.column_names(),
            numeric_columns: self.numeric_columns(),
            row_count: self.row_count,
            preview: self.preview(PREVIEW_ROWS),
            chart,
            summary: describe(self),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|s| (*s).to_string()).collect())
            .collect()
    }

    #[rstest]
    #[case("42", Cell::Number(42.0))]
    #[case(" -1.5 ", Cell::Number(-1.5))]
    #[case("", Cell::Missing)]
    #[case("NaN", Cell::Missing)]
    #[case("maize", Cell::Text("maize".to_string()))]
    fn test_cell_parse(#[case] raw: &str, #[case] expected: Cell) {
        assert_eq!(Cell::parse(raw), expected);
    }

    #[test]
    fn test_type_inference() {
        let dataset = TabularDataset::from_rows(
            vec!["rain".into(), "crop".into(), "yield".into()],
            rows(&[&["1.2", "maize", "3"], &["", "rice", "4"], &["0.4", "maize", "x"]]),
        );

        assert_eq!(dataset.numeric_columns(), vec!["rain".to_string()]);
        assert_eq!(dataset.column("yield").unwrap().kind, ColumnKind::Text);
        assert_eq!(dataset.column("rain").unwrap().numbers(), vec![1.2, 0.4]);
    }

    #[test]
    fn test_ragged_rows_and_unnamed_headers() {
        let dataset = TabularDataset::from_rows(
            vec!["a".into(), "".into()],
            rows(&[&["1"], &["2", "3", "extra"]]),
        );

        assert_eq!(dataset.column_names(), vec!["a".to_string(), "Unnamed: 1".to_string()]);
        assert_eq!(dataset.columns()[1].cells, vec![Cell::Missing, Cell::Number(3.0)]);
    }

    #[test]
    fn test_preview_is_limited() {
        let data: Vec<Vec<String>> = (0..10).map(|i| vec![i.to_string()]).collect();
        let dataset = TabularDataset::from_rows(vec!["n".into()], data);

        let preview = dataset.preview(PREVIEW_ROWS);
        assert_eq!(preview.rows.len(), 5);
        assert_eq!(preview.rows[4], vec![Cell::Number(4.0)]);
    }

    #[test]
    fn test_cell_serialization() {
        let json = serde_json::to_string(&vec![
            Cell::Number(1.5),
            Cell::Text("a".into()),
            Cell::Missing,
        ])
        .unwrap();
        assert_eq!(json, r#"[1.5,"a",null]"#);
    }
}
