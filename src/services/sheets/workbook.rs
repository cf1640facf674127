use std::io::Cursor;
use std::path::PathBuf;

use bytes::Bytes;
use calamine::{open_workbook_from_rs, Data, DataType, Reader, Xlsx};

use super::utils::rows_to_table;
use crate::error::AppError;
use crate::models::RawTable;
use crate::services::normalizer::TIMESTAMP_FORMAT;

/// Reads the responses tab from a local `.xlsx` export of the form spreadsheet.
pub struct WorkbookSource {
    path: PathBuf,
    sheet_name: String,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>, sheet_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet_name: sheet_name.into(),
        }
    }

    pub async fn fetch_records(&self) -> Result<RawTable, AppError> {
        tracing::info!("Reading workbook {}", self.path.display());
        let file_data = tokio::fs::read(&self.path).await.map_err(|e| {
            AppError::Fetch(format!("Failed to read workbook {}: {}", self.path.display(), e))
        })?;
        read_sheet(Bytes::from(file_data), &self.sheet_name)
    }
}

pub fn read_sheet(file_data: Bytes, sheet_name: &str) -> Result<RawTable, AppError> {
    let cursor = Cursor::new(file_data);
    let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor)?;

    if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
        return Err(AppError::Fetch(format!("Sheet {} not found in workbook", sheet_name)));
    }

    let range = workbook.worksheet_range(sheet_name)?;
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_text).collect())
        .collect();

    tracing::debug!("Sheet {} has {} rows including headers", sheet_name, rows.len());
    let mut table = rows_to_table(rows);

    // The used range starts at the first non-empty row, which may sit below row 1.
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    for sheet_row in table.sheet_rows.iter_mut() {
        *sheet_row += first_row;
    }
    Ok(table)
}

/// Cells are text to the normalizer; date-time cells go back to the form's timestamp layout.
pub fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| cell.to_string()),
        _ => cell.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_plain_cells_as_text() {
        assert_eq!(cell_to_text(&Data::Empty), "");
        assert_eq!(cell_to_text(&Data::String("Italy".to_string())), "Italy");
        assert_eq!(cell_to_text(&Data::Int(3)), "3");
        assert_eq!(cell_to_text(&Data::Float(3.0)), "3");
    }

    #[test]
    fn renders_iso_datetime_in_form_layout() {
        let cell = Data::DateTimeIso("2023-07-15T10:30:00".to_string());
        assert_eq!(cell_to_text(&cell), "07/15/2023 10:30:00");
    }

    #[test]
    fn rejects_bytes_that_are_not_a_workbook() {
        let result = read_sheet(Bytes::from_static(b"not a zip archive"), "Responses");
        assert!(matches!(result, Err(AppError::Fetch(_))));
    }

    #[test]
    fn missing_workbook_is_a_fetch_error() {
        let source = WorkbookSource::new("/nonexistent/responses.xlsx", "Responses");
        let result = tokio_test::block_on(source.fetch_records());
        assert!(matches!(result, Err(AppError::Fetch(msg)) if msg.contains("responses.xlsx")));
    }
}
