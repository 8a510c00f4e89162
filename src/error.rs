//! Error types for extraction runs.

use thiserror::Error;

/// Errors raised while extracting events from a store.
///
/// Row-scoped variants are recovered by the extraction loop (the row is
/// skipped); everything else ends the run for that store.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The store lacks tables the plugin queries.
    #[error("missing required tables: {}", .0.join(", "))]
    MissingTables(Vec<String>),

    /// A timestamp column held something that is not a Cocoa time value.
    #[error("malformed timestamp in column '{field}': {value}")]
    MalformedTimestamp { field: &'static str, value: String },

    /// A non-timestamp column held a value of the wrong kind.
    #[error("malformed value in column '{field}': expected {expected}, found {found}")]
    MalformedValue {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The event sink failed to accept an event.
    #[error("event sink error: {0}")]
    Sink(#[from] SinkError),

    /// The database worker thread is no longer reachable.
    #[error("database worker unavailable: {0}")]
    Worker(String),
}

impl ExtractError {
    /// Whether the error only affects the current row.
    pub fn is_row_scoped(&self) -> bool {
        matches!(
            self,
            ExtractError::MalformedTimestamp { .. } | ExtractError::MalformedValue { .. }
        )
    }
}

/// Errors raised by event sinks.
#[derive(Error, Debug)]
pub enum SinkError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_scoped_classification() {
        let malformed = ExtractError::MalformedTimestamp {
            field: "start",
            value: "'yesterday'".into(),
        };
        assert!(malformed.is_row_scoped());

        let missing = ExtractError::MissingTables(vec!["ZOBJECT".into()]);
        assert!(!missing.is_row_scoped());
        assert_eq!(missing.to_string(), "missing required tables: ZOBJECT");
    }
}
