use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{RawRecord, RawTable};

static URL_KEY_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").expect("valid spreadsheet url pattern"),
        Regex::new(r"key=([^&#]+)").expect("valid spreadsheet key pattern"),
    ]
});

static BARE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid spreadsheet id pattern"));

/// Accepts a full Google Sheets URL or a bare spreadsheet id.
pub fn extract_spreadsheet_id(reference: &str) -> Option<String> {
    let reference = reference.trim();
    for pattern in URL_KEY_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(reference) {
            return caps.get(1).map(|m| m.as_str().to_string());
        }
    }

    if BARE_ID.is_match(reference) {
        Some(reference.to_string())
    } else {
        None
    }
}

/// Turns a grid of cells into records: first row is the header row,
/// short rows are padded with blanks, fully blank rows are skipped.
pub fn rows_to_table(rows: Vec<Vec<String>>) -> RawTable {
    let mut rows = rows.into_iter();
    let headers = match rows.next() {
        Some(headers) => headers,
        None => return RawTable::default(),
    };

    let mut skipped = 0usize;
    let mut records: Vec<RawRecord> = Vec::new();
    let mut sheet_rows: Vec<usize> = Vec::new();

    // Header is sheet row 1, so the first data row is row 2.
    for (idx, row) in rows.enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            skipped += 1;
            continue;
        }

        records.push(
            headers
                .iter()
                .enumerate()
                .map(|(col, header)| (header.clone(), row.get(col).cloned().unwrap_or_default()))
                .collect(),
        );
        sheet_rows.push(idx + 2);
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} blank rows", skipped);
    }

    RawTable::with_sheet_rows(headers, records, sheet_rows)
}
