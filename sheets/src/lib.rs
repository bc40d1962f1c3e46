//! Spreadsheet storage backends.
//!
//! The intake pipeline only talks to the [`SpreadsheetStore`] and [`Spreadsheet`]
//! traits; this crate provides the in-memory, filesystem and Google Sheets
//! implementations behind them.

pub mod address;
pub mod config;
pub mod filesystem;
pub mod google;
pub mod memory;
pub mod store;
pub mod workbook;

pub use address::{AddressError, CellAddress};
pub use store::{Sheet, Spreadsheet, SpreadsheetStore, StoreError, parse_time_zone};
pub use workbook::Workbook;

use chrono_tz::Tz;
use config::StoreConfig;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds the store described by `config`.
///
/// `time_zone` applies to the local backends; Google Sheets uses the
/// spreadsheet's own setting.
pub fn get_store(
    config: &StoreConfig,
    spreadsheet_id: &str,
    time_zone: Tz,
) -> Result<Arc<dyn SpreadsheetStore>, StoreError> {
    match config {
        StoreConfig::Memory { sheets } => {
            let store = memory::MemoryStore::new(time_zone);
            let mut workbook = Workbook::new();
            for title in sheets {
                workbook.add_sheet(title.as_str(), BTreeMap::new())?;
            }
            store.insert(spreadsheet_id, workbook);
            tracing::warn!("Using the in-memory spreadsheet store, records are not persisted");
            Ok(Arc::new(store))
        }
        StoreConfig::Filesystem { base_dir } => {
            Ok(Arc::new(filesystem::FilesystemStore::new(base_dir, time_zone)))
        }
        StoreConfig::GoogleSheets {
            access_token_env,
            api_url,
        } => Ok(Arc::new(google::GoogleSheetsStore::from_env(
            api_url.clone(),
            access_token_env,
        )?)),
    }
}
