use sheets::StoreError;
use thiserror::Error;

/// Errors raised while turning a submission into a record. Each one ends up
/// in the body of a success response; none changes the status code.
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// The JSON body could not be decoded. Displays the decoder's own message.
    #[error("{0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("Failed to read request body: {0}")]
    RequestBody(String),

    #[error("Template sheet \"{0}\" not found")]
    TemplateNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that stop the service itself.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
