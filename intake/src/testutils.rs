use crate::config::{FieldMap, IntakeConfig, Listener, NameFields};
use crate::submission::SubmissionHandler;
use chrono::{DateTime, TimeZone, Utc};
use sheets::config::StoreConfig;
use sheets::memory::MemoryStore;
use sheets::{CellAddress, Workbook};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SPREADSHEET_ID: &str = "intake-spreadsheet";
pub const TEMPLATE: &str = "Template";

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
}

/// The ten-field layout of the reference intake form.
pub fn field_map() -> FieldMap {
    [
        ("First Name", "E5"),
        ("Last Name", "L5"),
        ("Date of Birth", "E7"),
        ("Phone", "L7"),
        ("Street Address", "E9"),
        ("City", "L9"),
        ("Email", "E11"),
        ("Preferred Contact", "L11"),
        ("Referral Source", "E13"),
        ("Notes", "E15"),
    ]
    .into_iter()
    .map(|(field, address)| (field.to_string(), address.to_string()))
    .collect()
}

pub fn test_config() -> IntakeConfig {
    IntakeConfig {
        listener: Listener::default(),
        admin_listener: None,
        spreadsheet_id: SPREADSHEET_ID.into(),
        template_sheet: TEMPLATE.into(),
        field_map: field_map(),
        name_fields: NameFields::default(),
        time_zone: "UTC".into(),
        max_body_bytes: 1024,
        store: StoreConfig::Memory { sheets: vec![] },
    }
}

/// A memory store holding one spreadsheet whose template has labels in column A
/// and a placeholder in L5.
pub fn template_store() -> MemoryStore {
    let store = MemoryStore::new(chrono_tz::UTC);
    let mut workbook = Workbook::new();
    workbook
        .add_sheet(
            TEMPLATE,
            BTreeMap::from([
                (CellAddress::new(1, 5), "Name".to_string()),
                (CellAddress::new(1, 11), "Email".to_string()),
                (CellAddress::new(12, 5), "(last name)".to_string()),
            ]),
        )
        .unwrap();
    store.insert(SPREADSHEET_ID, workbook);
    store
}

pub fn test_handler(store: &MemoryStore) -> SubmissionHandler {
    SubmissionHandler::new(Arc::new(test_config()), Arc::new(store.clone()))
        .with_clock(fixed_now)
}
