use crate::store::{Sheet, Spreadsheet, SpreadsheetStore, StoreError};
use crate::workbook::Workbook;
use async_trait::async_trait;
use chrono_tz::Tz;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// In-process spreadsheet store. Contents are lost when the process exits.
#[derive(Clone)]
pub struct MemoryStore {
    workbooks: Arc<RwLock<HashMap<String, Workbook>>>,
    time_zone: Tz,
}

impl MemoryStore {
    pub fn new(time_zone: Tz) -> Self {
        MemoryStore {
            workbooks: Arc::new(RwLock::new(HashMap::new())),
            time_zone,
        }
    }

    /// Adds or replaces a spreadsheet.
    pub fn insert<I: Into<String>>(&self, spreadsheet_id: I, workbook: Workbook) {
        self.workbooks.write().insert(spreadsheet_id.into(), workbook);
    }

    /// Returns a snapshot of a spreadsheet's current contents.
    pub fn workbook(&self, spreadsheet_id: &str) -> Option<Workbook> {
        self.workbooks.read().get(spreadsheet_id).cloned()
    }
}

#[async_trait]
impl SpreadsheetStore for MemoryStore {
    async fn open(&self, spreadsheet_id: &str) -> Result<Box<dyn Spreadsheet>, StoreError> {
        if !self.workbooks.read().contains_key(spreadsheet_id) {
            return Err(StoreError::SpreadsheetNotFound(spreadsheet_id.to_string()));
        }

        Ok(Box::new(MemorySpreadsheet {
            id: spreadsheet_id.to_string(),
            store: self.clone(),
        }))
    }
}

struct MemorySpreadsheet {
    id: String,
    store: MemoryStore,
}

impl MemorySpreadsheet {
    fn with_workbook<T>(
        &self,
        f: impl FnOnce(&mut Workbook) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.store.workbooks.write();
        let workbook = guard
            .get_mut(&self.id)
            .ok_or_else(|| StoreError::SpreadsheetNotFound(self.id.clone()))?;
        f(workbook)
    }
}

#[async_trait]
impl Spreadsheet for MemorySpreadsheet {
    fn time_zone(&self) -> Tz {
        self.store.time_zone
    }

    async fn find_sheet(&self, title: &str) -> Result<Option<Sheet>, StoreError> {
        self.with_workbook(|workbook| Ok(workbook.find(title)))
    }

    async fn duplicate_sheet(&self, source: &Sheet) -> Result<Sheet, StoreError> {
        self.with_workbook(|workbook| workbook.duplicate(source))
    }

    async fn rename_sheet(&self, sheet: &Sheet, new_title: &str) -> Result<Sheet, StoreError> {
        self.with_workbook(|workbook| workbook.rename(sheet, new_title))
    }

    async fn write_cell(
        &self,
        sheet: &Sheet,
        address: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.with_workbook(|workbook| workbook.write(sheet, address, value))
    }
}
