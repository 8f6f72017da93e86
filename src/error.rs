//! Error taxonomy shared by the reader, the metrics pipeline and the batch driver.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackError {
    /// Root element is missing or is not a GPX 1.1 `gpx` element.
    #[error("Invalid GPX document: {0}")]
    InvalidDocument(String),

    #[error("Malformed track point field `{field}`: {reason}")]
    MalformedPoint { field: String, reason: String },

    /// `index` is the position of the first point whose timestamp is not
    /// strictly greater than its predecessor's.
    #[error("Track points are not in chronological order at point {index}")]
    NonChronological { index: usize },

    #[error("Track has no name")]
    MissingTrackName,

    #[error("GPX document contains no track segment")]
    EmptyDocument,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Directory traversal error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl TrackError {
    pub(crate) fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        TrackError::MalformedPoint {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
