use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Spreadsheet unreachable, unauthorized, or tab missing.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A cell could not be parsed. `row` is the 1-based sheet row (headers are row 1).
    #[error("Parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Category mismatch in {field} at row {row}: {value:?} is neither Yes nor No")]
    CategoryMismatch {
        field: String,
        value: String,
        row: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Fetch(format!("request timed out: {}", err))
        } else {
            AppError::Fetch(err.to_string())
        }
    }
}

impl From<calamine::XlsxError> for AppError {
    fn from(err: calamine::XlsxError) -> Self {
        AppError::Fetch(format!("Failed to read workbook: {}", err))
    }
}
