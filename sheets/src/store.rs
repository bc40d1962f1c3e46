use crate::address::AddressError;
use async_trait::async_trait;
use chrono_tz::Tz;
use std::io;

/// Handle to a single sheet (tab) inside a spreadsheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sheet {
    pub id: u64,
    pub title: String,
}

impl Sheet {
    pub fn new<T: Into<String>>(id: u64, title: T) -> Self {
        Sheet {
            id,
            title: title.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Spreadsheet \"{0}\" not found")]
    SpreadsheetNotFound(String),

    #[error("Sheet \"{0}\" no longer exists")]
    SheetNotFound(String),

    #[error("A sheet with the name \"{0}\" already exists. Please enter another name.")]
    DuplicateSheetName(String),

    #[error("Sheet name cannot be empty")]
    EmptySheetName,

    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    #[error("invalid time zone \"{0}\"")]
    InvalidTimeZone(String),

    #[error("environment variable {0} is not set")]
    MissingCredentials(String),

    #[error("Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected Sheets API response: {0}")]
    UnexpectedResponse(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("workbook encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Entry point to a spreadsheet backend.
#[async_trait]
pub trait SpreadsheetStore: Send + Sync {
    /// Opens the spreadsheet identified by `spreadsheet_id`.
    async fn open(&self, spreadsheet_id: &str) -> Result<Box<dyn Spreadsheet>, StoreError>;
}

/// An open spreadsheet. Every call goes straight to the backend; nothing is retried.
#[async_trait]
pub trait Spreadsheet: Send + Sync {
    /// The time zone the spreadsheet formats dates in.
    fn time_zone(&self) -> Tz;

    /// Looks up a sheet by its exact title.
    async fn find_sheet(&self, title: &str) -> Result<Option<Sheet>, StoreError>;

    /// Copies `source` (cells included) into a new sheet with a generated title.
    async fn duplicate_sheet(&self, source: &Sheet) -> Result<Sheet, StoreError>;

    async fn rename_sheet(&self, sheet: &Sheet, new_title: &str) -> Result<Sheet, StoreError>;

    /// Writes `value` into the cell at `address` (A1 notation).
    async fn write_cell(&self, sheet: &Sheet, address: &str, value: &str)
    -> Result<(), StoreError>;
}

pub fn parse_time_zone(name: &str) -> Result<Tz, StoreError> {
    name.parse::<Tz>()
        .map_err(|_| StoreError::InvalidTimeZone(name.to_string()))
}
