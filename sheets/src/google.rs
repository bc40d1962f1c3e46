//! Google Sheets REST (v4) backend.
//!
//! Authentication is out of scope: the caller supplies a ready-to-use OAuth
//! access token, sent as a bearer token on every request.
use crate::address::CellAddress;
use crate::store::{Sheet, Spreadsheet, SpreadsheetStore, StoreError, parse_time_zone};
use async_trait::async_trait;
use chrono_tz::Tz;
use reqwest::{Method, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const DEFAULT_API_URL: &str = "https://sheets.googleapis.com/";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: u64,
    title: String,
}

impl From<SheetProperties> for Sheet {
    fn from(properties: SheetProperties) -> Self {
        Sheet::new(properties.sheet_id, properties.title)
    }
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetProperties {
    time_zone: String,
}

#[derive(Deserialize)]
struct SpreadsheetMetadata {
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DuplicateSheetReply {
    duplicate_sheet: SheetEntry,
}

#[derive(Deserialize)]
struct BatchUpdateResponse<R> {
    replies: Vec<R>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [[&'a str; 1]; 1],
}

/// Quotes a sheet title for use in A1 range notation, doubling embedded quotes.
fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn range_for(sheet: &Sheet, address: &CellAddress) -> String {
    format!("{}!{}", quote_title(&sheet.title), address)
}

pub struct GoogleSheetsStore {
    client: reqwest::Client,
    api_url: Url,
    access_token: String,
}

impl GoogleSheetsStore {
    pub fn new(api_url: Url, access_token: String) -> Self {
        GoogleSheetsStore {
            client: reqwest::Client::new(),
            api_url,
            access_token,
        }
    }

    /// Reads the access token from the environment variable `access_token_env`.
    pub fn from_env(api_url: Url, access_token_env: &str) -> Result<Self, StoreError> {
        let access_token = std::env::var(access_token_env)
            .map_err(|_| StoreError::MissingCredentials(access_token_env.to_string()))?;
        Ok(Self::new(api_url, access_token))
    }

    /// Builds `<api_url>/v4/spreadsheets/<spreadsheet_id><suffix>`.
    fn endpoint(&self, spreadsheet_id: &str, suffix: &str) -> Result<Url, StoreError> {
        let last_segment = format!("{spreadsheet_id}{suffix}");
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::UnexpectedResponse("API URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", last_segment.as_str()]);
        Ok(url)
    }
}

#[async_trait]
impl SpreadsheetStore for GoogleSheetsStore {
    async fn open(&self, spreadsheet_id: &str) -> Result<Box<dyn Spreadsheet>, StoreError> {
        let base_url = self.endpoint(spreadsheet_id, "")?;
        let batch_update_url = self.endpoint(spreadsheet_id, ":batchUpdate")?;
        let client = ApiClient {
            client: self.client.clone(),
            access_token: self.access_token.clone(),
        };

        let mut url = base_url.clone();
        url.query_pairs_mut().append_pair(
            "fields",
            "properties.timeZone,sheets.properties(sheetId,title)",
        );

        let response = client.send(Method::GET, url, None).await.map_err(|e| match e {
            StoreError::Api { status: 404, .. } => {
                StoreError::SpreadsheetNotFound(spreadsheet_id.to_string())
            }
            other => other,
        })?;
        let metadata: SpreadsheetMetadata = response.json().await?;

        Ok(Box::new(GoogleSpreadsheet {
            client,
            base_url,
            batch_update_url,
            time_zone: parse_time_zone(&metadata.properties.time_zone)?,
            sheets: metadata
                .sheets
                .into_iter()
                .map(|entry| entry.properties.into())
                .collect(),
        }))
    }
}

struct ApiClient {
    client: reqwest::Client,
    access_token: String,
}

impl ApiClient {
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<Response, StoreError> {
        tracing::debug!(%method, path = url.path(), "Sheets API request");

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.access_token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|body| body.error.message)
            .unwrap_or(text);

        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

struct GoogleSpreadsheet {
    client: ApiClient,
    base_url: Url,
    batch_update_url: Url,
    time_zone: Tz,
    // Sheet list as of `open`
    sheets: Vec<Sheet>,
}

impl GoogleSpreadsheet {
    async fn batch_update(&self, request: serde_json::Value) -> Result<Response, StoreError> {
        self.client
            .send(
                Method::POST,
                self.batch_update_url.clone(),
                Some(json!({ "requests": [request] })),
            )
            .await
    }
}

#[async_trait]
impl Spreadsheet for GoogleSpreadsheet {
    fn time_zone(&self) -> Tz {
        self.time_zone
    }

    async fn find_sheet(&self, title: &str) -> Result<Option<Sheet>, StoreError> {
        Ok(self.sheets.iter().find(|s| s.title == title).cloned())
    }

    async fn duplicate_sheet(&self, source: &Sheet) -> Result<Sheet, StoreError> {
        let response = self
            .batch_update(json!({
                "duplicateSheet": {
                    "sourceSheetId": source.id,
                    "insertSheetIndex": self.sheets.len(),
                }
            }))
            .await?;

        let body: BatchUpdateResponse<DuplicateSheetReply> = response.json().await?;
        body.replies
            .into_iter()
            .next()
            .map(|reply| reply.duplicate_sheet.properties.into())
            .ok_or_else(|| StoreError::UnexpectedResponse("missing duplicateSheet reply".into()))
    }

    async fn rename_sheet(&self, sheet: &Sheet, new_title: &str) -> Result<Sheet, StoreError> {
        if new_title.trim().is_empty() {
            return Err(StoreError::EmptySheetName);
        }

        self.batch_update(json!({
            "updateSheetProperties": {
                "properties": { "sheetId": sheet.id, "title": new_title },
                "fields": "title",
            }
        }))
        .await?;

        Ok(Sheet::new(sheet.id, new_title))
    }

    async fn write_cell(
        &self,
        sheet: &Sheet,
        address: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let address: CellAddress = address.parse()?;
        let range = range_for(sheet, &address);

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::UnexpectedResponse("API URL cannot be a base".into()))?
            .extend(["values", range.as_str()]);
        // RAW keeps submitted text such as "=SUM(...)" from being evaluated
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW");

        let body = ValueRange {
            range: &range,
            major_dimension: "ROWS",
            values: [[value]],
        };
        self.client
            .send(Method::PUT, url, Some(serde_json::to_value(&body)?))
            .await?;
        Ok(())
    }
}
