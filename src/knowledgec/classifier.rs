//! Row classification and event building for KnowledgeC rows.

use std::sync::Arc;

use rusqlite::types::Value;

use crate::cocoa_time::timestamp_from_column;
use crate::error::ExtractError;
use crate::models::{
    describe_value, ApplicationActivity, EventData, SafariActivity, Seconds, SourceRow,
    TimeDescription, TimelineEvent,
};
use crate::sink::EventSink;

use super::query::{
    ACTION, APP_ACT_CONTENT_DESCRIPTION, APP_ACT_USER_ACTIVITY_REQUEST, BUNDLE_ID, END,
    ENTRY_CREATION, START, URI, URI_TITLE, USAGE_IN_SECONDS,
};

// Set to true to trace every classified row
const ENABLE_LOGS: bool = false;

use crate::log_debug;

pub const SAFARI_PREFIX: &str = "/safari/";
pub const APP_PREFIX: &str = "/app/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Safari,
    Application,
}

/// Classifies a stream name. Anything without a known prefix, including a
/// missing stream name, is unclassified.
pub fn classify(action: Option<&str>) -> Option<ActivityKind> {
    let action = action?;
    if action.starts_with(SAFARI_PREFIX) {
        Some(ActivityKind::Safari)
    } else if action.starts_with(APP_PREFIX) {
        Some(ActivityKind::Application)
    } else {
        None
    }
}

/// Turns one row into 0 or 3 events.
///
/// Every column the branch needs is decoded before the first event is
/// produced, so a malformed row produces nothing.
pub fn process(
    parser: &'static str,
    row: &SourceRow,
    sink: &mut dyn EventSink,
) -> Result<usize, ExtractError> {
    let action = text_column(row, ACTION)?;
    let Some(kind) = classify(action.as_deref()) else {
        return Ok(0);
    };

    let entry_creation = timestamp_from_column(ENTRY_CREATION, row.get(ENTRY_CREATION))?;
    let start = timestamp_from_column(START, row.get(START))?;
    let end = timestamp_from_column(END, row.get(END))?;
    let usage_in_seconds = seconds_column(row, USAGE_IN_SECONDS)?;
    let bundle_id = text_column(row, BUNDLE_ID)?;

    let data = match kind {
        ActivityKind::Safari => EventData::Safari(SafariActivity {
            usage_in_seconds,
            uri: bundle_id,
            fulluri: text_column(row, URI)?,
            uri_title: text_column(row, URI_TITLE)?,
        }),
        ActivityKind::Application => {
            // Trace-only columns; an undecodable value must not cost the row.
            let description = text_column(row, APP_ACT_CONTENT_DESCRIPTION).ok().flatten();
            let activity_request = text_column(row, APP_ACT_USER_ACTIVITY_REQUEST)
                .ok()
                .flatten();
            log_debug!(
                "app activity {:?}: description={:?} request={:?}",
                bundle_id,
                description,
                activity_request
            );
            EventData::Application(ApplicationActivity {
                action: action.unwrap_or_default(),
                usage_in_seconds,
                bundle_id,
            })
        }
    };

    log_debug!("classified {} row", data.data_type());

    let data = Arc::new(data);
    let dimensions = [
        (entry_creation, TimeDescription::Creation),
        (start, TimeDescription::Start),
        (end, TimeDescription::End),
    ];
    for (timestamp, timestamp_desc) in dimensions {
        sink.produce(TimelineEvent {
            timestamp,
            timestamp_desc,
            parser,
            data: Arc::clone(&data),
        })?;
    }

    Ok(dimensions.len())
}

fn text_column(row: &SourceRow, field: &'static str) -> Result<Option<String>, ExtractError> {
    match row.get(field) {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text.clone())),
        // VARCHAR columns only have text affinity; numbers can still land here.
        Value::Integer(v) => Ok(Some(v.to_string())),
        Value::Real(v) => Ok(Some(v.to_string())),
        Value::Blob(bytes) => String::from_utf8(bytes.clone())
            .map(Some)
            .map_err(|err| ExtractError::MalformedValue {
                field,
                expected: "text",
                found: format!("blob of {} bytes", err.as_bytes().len()),
            }),
    }
}

fn seconds_column(row: &SourceRow, field: &'static str) -> Result<Option<Seconds>, ExtractError> {
    let value = row.get(field);
    let malformed = || ExtractError::MalformedValue {
        field,
        expected: "a number",
        found: describe_value(value),
    };

    match value {
        Value::Null => Ok(None),
        Value::Integer(v) => Ok(Some(Seconds::Integer(*v))),
        Value::Real(v) => Ok(Some(Seconds::Real(*v))),
        Value::Text(text) => {
            let text = text.trim();
            match text.parse::<i64>() {
                Ok(v) => Ok(Some(Seconds::Integer(v))),
                Err(_) => text
                    .parse::<f64>()
                    .map(|v| Some(Seconds::Real(v)))
                    .map_err(|_| malformed()),
            }
        }
        Value::Blob(_) => Err(malformed()),
    }
}
