//! Metrics definitions for the intake service.

use shared::metrics_defs::{MetricDef, MetricType};

pub const SUBMISSION_RECEIVED: MetricDef = MetricDef {
    name: "submission.received",
    metric_type: MetricType::Counter,
    description: "Number of submission requests received",
};

pub const SUBMISSION_SUCCEEDED: MetricDef = MetricDef {
    name: "submission.succeeded",
    metric_type: MetricType::Counter,
    description: "Number of submissions recorded in a new sheet",
};

pub const SUBMISSION_FAILED: MetricDef = MetricDef {
    name: "submission.failed",
    metric_type: MetricType::Counter,
    description: "Number of submissions that failed and were acknowledged with an error body",
};

pub const SUBMISSION_FIELDS_WRITTEN: MetricDef = MetricDef {
    name: "submission.fields_written",
    metric_type: MetricType::Counter,
    description: "Number of cells written into new records",
};

pub const SUBMISSION_DURATION: MetricDef = MetricDef {
    name: "submission.duration",
    metric_type: MetricType::Histogram,
    description: "Time to process a submission in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[
    SUBMISSION_RECEIVED,
    SUBMISSION_SUCCEEDED,
    SUBMISSION_FAILED,
    SUBMISSION_FIELDS_WRITTEN,
    SUBMISSION_DURATION,
];
