//! Stores each spreadsheet as a JSON document `<base_dir>/<spreadsheet_id>.json`.
//! Every operation reads the document, applies the change and writes it back.
//! The whole read-modify-write runs under a lock shared by the store and every
//! spreadsheet it opened, so concurrent requests see each other's sheets.
use crate::store::{Sheet, Spreadsheet, SpreadsheetStore, StoreError};
use crate::workbook::Workbook;
use async_trait::async_trait;
use chrono_tz::Tz;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct FilesystemStore {
    base_dir: PathBuf,
    time_zone: Tz,
    lock: Arc<Mutex<()>>,
}

impl FilesystemStore {
    pub fn new<P: AsRef<Path>>(base_dir: P, time_zone: Tz) -> Self {
        FilesystemStore {
            base_dir: base_dir.as_ref().to_path_buf(),
            time_zone,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Creates or overwrites the document for `spreadsheet_id`.
    pub async fn save(&self, spreadsheet_id: &str, workbook: &Workbook) -> Result<(), StoreError> {
        let path = self.path_for(spreadsheet_id)?;
        let _guard = self.lock.lock().await;
        write_workbook(&path, workbook).await
    }

    pub async fn load(&self, spreadsheet_id: &str) -> Result<Workbook, StoreError> {
        let path = self.path_for(spreadsheet_id)?;
        let _guard = self.lock.lock().await;
        read_workbook(&path, spreadsheet_id).await
    }

    fn path_for(&self, spreadsheet_id: &str) -> Result<PathBuf, StoreError> {
        let is_plain_name = !spreadsheet_id.is_empty()
            && spreadsheet_id != "."
            && spreadsheet_id != ".."
            && !spreadsheet_id.contains(['/', '\\']);

        if !is_plain_name {
            return Err(StoreError::SpreadsheetNotFound(spreadsheet_id.to_string()));
        }
        Ok(self.base_dir.join(format!("{spreadsheet_id}.json")))
    }
}

async fn read_workbook(path: &Path, spreadsheet_id: &str) -> Result<Workbook, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::SpreadsheetNotFound(spreadsheet_id.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&bytes)?)
}

async fn write_workbook(path: &Path, workbook: &Workbook) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(workbook)?;
    let len = bytes.len();

    // Write to a fresh file next to the target and swap it in so readers never
    // see a partial document
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(io::Error::other)??;

    tracing::debug!(path = %path.display(), bytes = len, "Stored workbook");
    Ok(())
}

#[async_trait]
impl SpreadsheetStore for FilesystemStore {
    async fn open(&self, spreadsheet_id: &str) -> Result<Box<dyn Spreadsheet>, StoreError> {
        let path = self.path_for(spreadsheet_id)?;
        // Fail early when the document is missing or unreadable
        {
            let _guard = self.lock.lock().await;
            read_workbook(&path, spreadsheet_id).await?;
        }

        Ok(Box::new(FilesystemSpreadsheet {
            id: spreadsheet_id.to_string(),
            path,
            time_zone: self.time_zone,
            lock: self.lock.clone(),
        }))
    }
}

struct FilesystemSpreadsheet {
    id: String,
    path: PathBuf,
    time_zone: Tz,
    lock: Arc<Mutex<()>>,
}

impl FilesystemSpreadsheet {
    async fn update<T>(
        &self,
        f: impl FnOnce(&mut Workbook) -> Result<T, StoreError> + Send,
    ) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;
        let mut workbook = read_workbook(&self.path, &self.id).await?;
        let result = f(&mut workbook)?;
        write_workbook(&self.path, &workbook).await?;
        Ok(result)
    }
}

#[async_trait]
impl Spreadsheet for FilesystemSpreadsheet {
    fn time_zone(&self) -> Tz {
        self.time_zone
    }

    async fn find_sheet(&self, title: &str) -> Result<Option<Sheet>, StoreError> {
        let _guard = self.lock.lock().await;
        let workbook = read_workbook(&self.path, &self.id).await?;
        Ok(workbook.find(title))
    }

    async fn duplicate_sheet(&self, source: &Sheet) -> Result<Sheet, StoreError> {
        self.update(|workbook| workbook.duplicate(source)).await
    }

    async fn rename_sheet(&self, sheet: &Sheet, new_title: &str) -> Result<Sheet, StoreError> {
        self.update(|workbook| workbook.rename(sheet, new_title))
            .await
    }

    async fn write_cell(
        &self,
        sheet: &Sheet,
        address: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.update(|workbook| workbook.write(sheet, address, value))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::CellAddress;
    use std::collections::BTreeMap;

    async fn store_with_template() -> (tempfile::TempDir, FilesystemStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path(), chrono_tz::UTC);

        let mut workbook = Workbook::new();
        workbook
            .add_sheet(
                "Template",
                BTreeMap::from([(CellAddress::new(1, 1), "Intake".to_string())]),
            )
            .unwrap();
        store.save("intake", &workbook).await.unwrap();

        (dir, store)
    }

    #[tokio::test]
    async fn test_changes_are_persisted() {
        let (_dir, store) = store_with_template().await;
        let spreadsheet = store.open("intake").await.unwrap();

        let template = spreadsheet.find_sheet("Template").await.unwrap().unwrap();
        let copy = spreadsheet.duplicate_sheet(&template).await.unwrap();
        let record = spreadsheet.rename_sheet(&copy, "Jane Doe").await.unwrap();
        spreadsheet
            .write_cell(&record, "E11", "jane.doe@example.com")
            .await
            .unwrap();

        let workbook = store.load("intake").await.unwrap();
        assert_eq!(workbook.titles(), vec!["Template", "Jane Doe"]);

        let cells = workbook.cells("Jane Doe").unwrap();
        assert_eq!(cells[&CellAddress::new(1, 1)], "Intake");
        assert_eq!(cells[&CellAddress::new(5, 11)], "jane.doe@example.com");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_records_stay_separate() {
        let (_dir, store) = store_with_template().await;
        let store = Arc::new(store);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let spreadsheet = store.open("intake").await?;
                    let template = spreadsheet.find_sheet("Template").await?.unwrap();
                    let copy = spreadsheet.duplicate_sheet(&template).await?;
                    let record = spreadsheet
                        .rename_sheet(&copy, &format!("Person {i}"))
                        .await?;
                    spreadsheet
                        .write_cell(&record, "E5", &format!("value {i}"))
                        .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let workbook = store.load("intake").await.unwrap();
        assert_eq!(workbook.titles().len(), 17);
        assert!(!workbook.titles().contains(&"Copy of Template"));
        for i in 0..16 {
            let cells = workbook.cells(&format!("Person {i}")).unwrap();
            assert_eq!(cells[&CellAddress::new(5, 5)], format!("value {i}"));
            assert_eq!(cells[&CellAddress::new(1, 1)], "Intake");
        }
    }

    #[tokio::test]
    async fn test_missing_spreadsheet() {
        let (_dir, store) = store_with_template().await;

        for id in ["other", "../intake", ""] {
            let err = store.open(id).await.err().unwrap();
            assert!(
                matches!(err, StoreError::SpreadsheetNotFound(ref missing) if missing == id),
                "{id}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_corrupt_document() {
        let (dir, store) = store_with_template().await;
        std::fs::write(dir.path().join("intake.json"), "not json").unwrap();

        let err = store.open("intake").await.err().unwrap();
        assert!(matches!(err, StoreError::Encoding(_)));
    }
}
