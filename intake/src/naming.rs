//! Display names for newly created records.

use crate::config::NameFields;
use crate::normalize::Submission;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Longest name a sheet can be given.
pub const MAX_NAME_LENGTH: usize = 99;

/// Characters that may not appear in a sheet name.
const INVALID_NAME_CHARS: &[char] = &['[', ']', '*', '?', ':', '/', '\\'];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Strips characters that are not allowed in sheet names, then trims whitespace.
pub fn sanitize(value: &str) -> String {
    let kept: String = value
        .chars()
        .filter(|c| !INVALID_NAME_CHARS.contains(c))
        .collect();
    kept.trim().to_string()
}

/// Builds `"<first> <last> <timestamp>"`, leaving out empty name parts.
///
/// The timestamp is `now` rendered in `time_zone`. The result is cut to
/// [`MAX_NAME_LENGTH`] characters and never starts or ends with whitespace.
pub fn record_name(
    submission: &Submission,
    fields: &NameFields,
    now: DateTime<Utc>,
    time_zone: Tz,
) -> String {
    let field = |name: &str| {
        sanitize(
            submission
                .get(name)
                .map(String::as_str)
                .unwrap_or_default(),
        )
    };
    let timestamp = now
        .with_timezone(&time_zone)
        .format(TIMESTAMP_FORMAT)
        .to_string();

    let joined = [field(&fields.first), field(&fields.last), timestamp]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let truncated: String = joined.chars().take(MAX_NAME_LENGTH).collect();
    truncated.trim_end().to_string()
}
