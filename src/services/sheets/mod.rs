pub mod google;
pub mod utils;
pub mod workbook;

pub use google::GoogleSheetsClient;
pub use workbook::WorkbookSource;

use crate::config::{Config, SourceConfig};
use crate::error::AppError;
use crate::models::RawTable;

/// Where the responses tab is read from at startup.
pub enum SheetSource {
    Google(GoogleSheetsClient),
    Workbook(WorkbookSource),
}

impl SheetSource {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        match &config.source {
            SourceConfig::GoogleSheets {
                spreadsheet_id,
                credentials_path,
            } => Ok(SheetSource::Google(GoogleSheetsClient::new(
                spreadsheet_id.as_str(),
                config.sheet_name.as_str(),
                credentials_path.as_path(),
                config.fetch_timeout,
            )?)),
            SourceConfig::Workbook { path } => Ok(SheetSource::Workbook(WorkbookSource::new(
                path.as_path(),
                config.sheet_name.as_str(),
            ))),
        }
    }

    pub async fn fetch_records(&self) -> Result<RawTable, AppError> {
        let start = std::time::Instant::now();
        let table = match self {
            SheetSource::Google(client) => client.fetch_records().await?,
            SheetSource::Workbook(source) => source.fetch_records().await?,
        };
        tracing::info!(
            "Fetched {} records with {} columns in {:?}",
            table.len(),
            table.headers.len(),
            start.elapsed()
        );
        Ok(table)
    }
}
