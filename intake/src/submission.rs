//! The submission pipeline: normalize, find the template, copy it, fill it in.

use crate::config::IntakeConfig;
use crate::errors::SubmissionError;
use crate::metrics_defs::{
    SUBMISSION_DURATION, SUBMISSION_FAILED, SUBMISSION_FIELDS_WRITTEN, SUBMISSION_RECEIVED,
    SUBMISSION_SUCCEEDED,
};
use crate::naming::record_name;
use crate::normalize::{Submission, normalize};
use crate::populate::populate;
use chrono::{DateTime, Utc};
use http_body_util::{BodyExt, Limited};
use hyper::Request;
use hyper::body::Body;
use hyper::header::CONTENT_TYPE;
use shared::{counter, histogram};
use sheets::{Sheet, SpreadsheetStore};
use std::sync::Arc;
use std::time::Instant;

pub type Clock = fn() -> DateTime<Utc>;

pub struct SubmissionHandler {
    config: Arc<IntakeConfig>,
    store: Arc<dyn SpreadsheetStore>,
    clock: Clock,
}

impl SubmissionHandler {
    pub fn new(config: Arc<IntakeConfig>, store: Arc<dyn SpreadsheetStore>) -> Self {
        SubmissionHandler {
            config,
            store,
            clock: Utc::now,
        }
    }

    /// Replaces the clock used to timestamp record names.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Runs a request through the whole pipeline and returns the new record.
    pub async fn handle_request<B>(&self, request: Request<B>) -> Result<Sheet, SubmissionError>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let started = Instant::now();
        counter!(SUBMISSION_RECEIVED).increment(1);

        let result = match self.read_submission(request).await {
            Ok(submission) => self.process(&submission).await,
            Err(e) => Err(e),
        };

        histogram!(SUBMISSION_DURATION).record(started.elapsed().as_secs_f64());
        match &result {
            Ok(record) => {
                counter!(SUBMISSION_SUCCEEDED).increment(1);
                tracing::info!(record = %record.title, "Recorded submission");
            }
            Err(e) => {
                counter!(SUBMISSION_FAILED).increment(1);
                tracing::error!(error = %e, "Failed to record submission");
            }
        }

        result
    }

    async fn read_submission<B>(&self, request: Request<B>) -> Result<Submission, SubmissionError>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = request.into_parts();
        let bytes = Limited::new(body, self.config.max_body_bytes)
            .collect()
            .await
            .map_err(|e| SubmissionError::RequestBody(e.to_string()))?
            .to_bytes();

        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        normalize(content_type, parts.uri.query(), &bytes)
    }

    /// Copies the template into a new record named after the submitter and
    /// fills in the mapped fields.
    pub async fn process(&self, submission: &Submission) -> Result<Sheet, SubmissionError> {
        let spreadsheet = self.store.open(&self.config.spreadsheet_id).await?;
        let template = spreadsheet
            .find_sheet(&self.config.template_sheet)
            .await?
            .ok_or_else(|| SubmissionError::TemplateNotFound(self.config.template_sheet.clone()))?;

        let name = record_name(
            submission,
            &self.config.name_fields,
            (self.clock)(),
            spreadsheet.time_zone(),
        );

        let copy = spreadsheet.duplicate_sheet(&template).await?;
        let record = spreadsheet.rename_sheet(&copy, &name).await?;
        tracing::debug!(record = %record.title, template = %template.title, "Created record");

        let written = populate(
            spreadsheet.as_ref(),
            &record,
            &self.config.field_map,
            submission,
        )
        .await?;
        counter!(SUBMISSION_FIELDS_WRITTEN).increment(written as u64);

        Ok(record)
    }

    /// Opens the spreadsheet and checks that the template exists.
    pub async fn probe(&self) -> Result<(), SubmissionError> {
        let spreadsheet = self.store.open(&self.config.spreadsheet_id).await?;
        spreadsheet
            .find_sheet(&self.config.template_sheet)
            .await?
            .map(|_| ())
            .ok_or_else(|| SubmissionError::TemplateNotFound(self.config.template_sheet.clone()))
    }
}
