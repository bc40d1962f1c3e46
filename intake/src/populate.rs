use crate::config::FieldMap;
use crate::normalize::Submission;
use sheets::{Sheet, Spreadsheet, StoreError};

/// Writes every submitted field that has a cell in `field_map` onto `record`.
///
/// Fields missing from the submission are skipped and their cells keep the
/// template's content. The first failed write stops the loop and is returned;
/// cells written before it stay written. Returns the number of cells written.
pub async fn populate(
    spreadsheet: &dyn Spreadsheet,
    record: &Sheet,
    field_map: &FieldMap,
    submission: &Submission,
) -> Result<usize, StoreError> {
    let mut written = 0;

    for (field, address) in field_map {
        let Some(value) = submission.get(field) else {
            tracing::debug!(field = %field, "Field not submitted, skipping");
            continue;
        };

        spreadsheet.write_cell(record, address, value).await?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheets::memory::MemoryStore;
    use sheets::{CellAddress, SpreadsheetStore, Workbook};
    use std::collections::BTreeMap;

    fn field_map() -> FieldMap {
        FieldMap::from([
            ("First Name".to_string(), "E5".to_string()),
            ("Last Name".to_string(), "L5".to_string()),
            ("Email".to_string(), "E11".to_string()),
        ])
    }

    async fn open_record() -> (MemoryStore, Box<dyn Spreadsheet>, Sheet) {
        let store = MemoryStore::new(chrono_tz::UTC);
        let mut workbook = Workbook::new();
        let record = workbook
            .add_sheet(
                "Record",
                BTreeMap::from([(CellAddress::new(12, 5), "Last name here".to_string())]),
            )
            .unwrap();
        store.insert("intake", workbook);

        let spreadsheet = store.open("intake").await.unwrap();
        (store, spreadsheet, record)
    }

    fn cells(store: &MemoryStore) -> BTreeMap<CellAddress, String> {
        store
            .workbook("intake")
            .unwrap()
            .cells("Record")
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_writes_present_fields_only() {
        let (store, spreadsheet, record) = open_record().await;
        let submission = Submission::from([
            ("First Name".to_string(), "Jane".to_string()),
            ("Email".to_string(), "".to_string()),
            ("Unmapped".to_string(), "ignored".to_string()),
        ]);

        let written = populate(spreadsheet.as_ref(), &record, &field_map(), &submission)
            .await
            .unwrap();
        assert_eq!(written, 2);

        assert_eq!(
            cells(&store),
            BTreeMap::from([
                (CellAddress::new(5, 5), "Jane".to_string()),
                // Absent field leaves the template text alone
                (CellAddress::new(12, 5), "Last name here".to_string()),
                // Empty string is a value and is written
                (CellAddress::new(5, 11), "".to_string()),
            ])
        );
    }

    #[tokio::test]
    async fn test_stops_at_first_failed_write() {
        let (store, spreadsheet, record) = open_record().await;
        let field_map = FieldMap::from([
            ("First Name".to_string(), "E5".to_string()),
            ("Last Name".to_string(), "nowhere".to_string()),
            ("Email".to_string(), "E11".to_string()),
        ]);
        let submission = Submission::from([
            ("First Name".to_string(), "Jane".to_string()),
            ("Last Name".to_string(), "Doe".to_string()),
            ("Email".to_string(), "jane.doe@example.com".to_string()),
        ]);

        let err = populate(spreadsheet.as_ref(), &record, &field_map, &submission)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid cell address \"nowhere\"");

        // The write before the failure stays, the one after never happens
        let cells = cells(&store);
        assert_eq!(cells[&CellAddress::new(5, 5)], "Jane");
        assert!(!cells.contains_key(&CellAddress::new(5, 11)));
    }
}
