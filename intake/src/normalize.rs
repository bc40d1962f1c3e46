//! Turns the two accepted request encodings into a flat [`Submission`].

use crate::errors::SubmissionError;
use indexmap::IndexMap;
use serde_json::Value;

/// Field name to value, in the order the fields arrived.
pub type Submission = IndexMap<String, String>;

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// Prefix match so that parameters such as `; charset=utf-8` are tolerated.
fn has_media_type(content_type: Option<&str>, media_type: &str) -> bool {
    content_type.is_some_and(|ct| {
        ct.trim_start()
            .get(..media_type.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(media_type))
    })
}

/// Normalizes a request into a [`Submission`].
///
/// A JSON body must decode to an object, otherwise the decoder's error is
/// returned. Anything else yields the query string parameters followed by the
/// form body parameters; that path never fails.
pub fn normalize(
    content_type: Option<&str>,
    query: Option<&str>,
    body: &[u8],
) -> Result<Submission, SubmissionError> {
    if has_media_type(content_type, JSON_CONTENT_TYPE) {
        return from_json(body);
    }

    let mut submission = Submission::new();
    add_params(&mut submission, query.unwrap_or_default().as_bytes());
    if has_media_type(content_type, FORM_CONTENT_TYPE) {
        add_params(&mut submission, body);
    }
    Ok(submission)
}

fn from_json(body: &[u8]) -> Result<Submission, SubmissionError> {
    let document: IndexMap<String, Value> = serde_json::from_slice(body)?;

    Ok(document
        .into_iter()
        .map(|(field, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (field, value)
        })
        .collect())
}

// The first occurrence of a repeated key wins.
fn add_params(submission: &mut Submission, encoded: &[u8]) {
    for (key, value) in url::form_urlencoded::parse(encoded) {
        submission
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
}
