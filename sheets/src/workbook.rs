//! Grid storage shared by the in-memory and filesystem backends.

use crate::address::CellAddress;
use crate::store::{Sheet, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SheetData {
    id: u64,
    title: String,
    #[serde(default)]
    cells: BTreeMap<CellAddress, String>,
}

impl SheetData {
    fn handle(&self) -> Sheet {
        Sheet::new(self.id, self.title.clone())
    }
}

/// All sheets of one spreadsheet, in tab order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    next_sheet_id: u64,
    sheets: Vec<SheetData>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sheet and returns its handle.
    pub fn add_sheet<T: Into<String>>(
        &mut self,
        title: T,
        cells: BTreeMap<CellAddress, String>,
    ) -> Result<Sheet, StoreError> {
        let title = title.into();
        self.check_title_available(&title, None)?;

        let sheet = SheetData {
            id: self.allocate_id(),
            title,
            cells,
        };
        let handle = sheet.handle();
        self.sheets.push(sheet);
        Ok(handle)
    }

    pub fn titles(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.title.as_str()).collect()
    }

    pub fn cells(&self, title: &str) -> Option<&BTreeMap<CellAddress, String>> {
        self.sheets
            .iter()
            .find(|s| s.title == title)
            .map(|s| &s.cells)
    }

    pub fn find(&self, title: &str) -> Option<Sheet> {
        self.sheets
            .iter()
            .find(|s| s.title == title)
            .map(SheetData::handle)
    }

    pub fn duplicate(&mut self, source: &Sheet) -> Result<Sheet, StoreError> {
        let cells = self.get(source)?.cells.clone();
        let title = self.copy_title(&source.title);
        self.add_sheet(title, cells)
    }

    pub fn rename(&mut self, sheet: &Sheet, new_title: &str) -> Result<Sheet, StoreError> {
        if new_title.trim().is_empty() {
            return Err(StoreError::EmptySheetName);
        }
        self.check_title_available(new_title, Some(sheet.id))?;

        let data = self.get_mut(sheet)?;
        data.title = new_title.to_string();
        Ok(data.handle())
    }

    pub fn write(&mut self, sheet: &Sheet, address: &str, value: &str) -> Result<(), StoreError> {
        let address: CellAddress = address.parse()?;
        self.get_mut(sheet)?.cells.insert(address, value.to_string());
        Ok(())
    }

    fn get(&self, sheet: &Sheet) -> Result<&SheetData, StoreError> {
        self.sheets
            .iter()
            .find(|s| s.id == sheet.id)
            .ok_or_else(|| StoreError::SheetNotFound(sheet.title.clone()))
    }

    fn get_mut(&mut self, sheet: &Sheet) -> Result<&mut SheetData, StoreError> {
        self.sheets
            .iter_mut()
            .find(|s| s.id == sheet.id)
            .ok_or_else(|| StoreError::SheetNotFound(sheet.title.clone()))
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_sheet_id;
        self.next_sheet_id += 1;
        id
    }

    // Titles are unique ignoring case, the same way Google Sheets treats them.
    fn check_title_available(&self, title: &str, except: Option<u64>) -> Result<(), StoreError> {
        let lowered = title.to_lowercase();
        let taken = self
            .sheets
            .iter()
            .any(|s| Some(s.id) != except && s.title.to_lowercase() == lowered);

        match taken {
            true => Err(StoreError::DuplicateSheetName(title.to_string())),
            false => Ok(()),
        }
    }

    fn copy_title(&self, source_title: &str) -> String {
        let base = format!("Copy of {source_title}");
        let mut candidate = base.clone();
        let mut n = 2;
        while self.check_title_available(&candidate, None).is_err() {
            candidate = format!("{base} {n}");
            n += 1;
        }
        candidate
    }
}
