//! File loading for CSV and spreadsheet uploads

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::NaiveTime;
use csv::{ReaderBuilder, Trim};
use tracing::{debug, instrument};

use super::TabularDataset;
use crate::{Result, TerraGraphError};

/// Load a dataset, picking the parser from the file extension
#[instrument(skip(bytes), fields(size = bytes.len()))]
pub fn load(file_name: &str, bytes: &[u8]) -> Result<TabularDataset> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let dataset = match extension.as_str() {
        "csv" => from_csv(bytes)?,
        "xlsx" | "xlsm" | "xls" | "ods" => from_spreadsheet(bytes)?,
        _ => {
            return Err(TerraGraphError::dataset(format!(
                "Unsupported file type '{file_name}'. Please upload a CSV or Excel file."
            )));
        }
    };

    debug!(
        "Loaded {} rows and {} columns",
        dataset.row_count(),
        dataset.columns().len()
    );
    Ok(dataset)
}

/// Parse comma-separated text with a header row
pub fn from_csv(bytes: &[u8]) -> Result<TabularDataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| TerraGraphError::dataset(format!("Failed to parse CSV: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() {
        return Err(TerraGraphError::dataset("The file has no header row"));
    }

    let rows = reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect::<Vec<_>>())
                .map_err(|e| TerraGraphError::dataset(format!("Failed to parse CSV: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TabularDataset::from_rows(headers, rows))
}

/// Parse the first worksheet of a workbook, first row as headers
pub fn from_spreadsheet(bytes: &[u8]) -> Result<TabularDataset> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| TerraGraphError::dataset(format!("Failed to open spreadsheet: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TerraGraphError::dataset("The workbook has no worksheets"))?
        .map_err(|e| TerraGraphError::dataset(format!("Failed to read worksheet: {e}")))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| TerraGraphError::dataset("The worksheet is empty"))?
        .iter()
        .map(cell_text)
        .collect();

    let rows: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .collect();

    Ok(TabularDataset::from_rows(headers, rows))
}

/// Dates become text so date columns are not typed as numeric
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) => value.to_string(),
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => {
            value.clone()
        }
        Data::DateTime(value) => match value.as_datetime() {
            Some(datetime) if datetime.time() == NaiveTime::MIN => datetime.date().to_string(),
            Some(datetime) => datetime.to_string(),
            None => format!("serial {}", value.as_f64()),
        },
        other => other.to_string(),
    }
}
