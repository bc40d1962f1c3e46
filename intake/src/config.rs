use indexmap::IndexMap;
use serde::Deserialize;
use sheets::CellAddress;
use sheets::config::StoreConfig;
use thiserror::Error;

/// Ordered map from submission field name to the cell (A1 notation) it is written to.
pub type FieldMap = IndexMap<String, String>;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Empty spreadsheet id")]
    EmptySpreadsheetId,

    #[error("Empty template sheet name")]
    EmptyTemplateSheet,

    #[error("Field map cannot be empty")]
    EmptyFieldMap,

    #[error("Field \"{field}\" maps to an invalid cell address \"{address}\"")]
    InvalidCellAddress { field: String, address: String },

    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Submission fields that make up the generated record name.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NameFields {
    pub first: String,
    pub last: String,
}

impl Default for NameFields {
    fn default() -> Self {
        NameFields {
            first: "First Name".into(),
            last: "Last Name".into(),
        }
    }
}

fn default_time_zone() -> String {
    "UTC".into()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Intake service configuration, read once at startup.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct IntakeConfig {
    /// Webhook listener
    #[serde(default)]
    pub listener: Listener,
    /// Optional listener for `/health` and `/ready`
    pub admin_listener: Option<Listener>,
    pub spreadsheet_id: String,
    /// Title of the sheet copied for every submission
    pub template_sheet: String,
    pub field_map: FieldMap,
    #[serde(default)]
    pub name_fields: NameFields,
    /// IANA time zone used by the local stores to timestamp record names.
    /// Google Sheets spreadsheets carry their own.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    pub store: StoreConfig,
}

impl IntakeConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        if let Some(admin_listener) = &self.admin_listener {
            admin_listener.validate()?;
        }

        if self.spreadsheet_id.trim().is_empty() {
            return Err(ValidationError::EmptySpreadsheetId);
        }
        if self.template_sheet.trim().is_empty() {
            return Err(ValidationError::EmptyTemplateSheet);
        }

        if self.field_map.is_empty() {
            return Err(ValidationError::EmptyFieldMap);
        }
        for (field, address) in &self.field_map {
            if address.parse::<CellAddress>().is_err() {
                return Err(ValidationError::InvalidCellAddress {
                    field: field.clone(),
                    address: address.clone(),
                });
            }
        }

        sheets::parse_time_zone(&self.time_zone)
            .map_err(|_| ValidationError::UnknownTimeZone(self.time_zone.clone()))?;

        Ok(())
    }
}
