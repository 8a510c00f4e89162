use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cocoa_time::datetime_to_cocoa;

/// Which time dimension of a record an event instant represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeDescription {
    #[serde(rename = "Creation Time")]
    Creation,
    #[serde(rename = "Start Time")]
    Start,
    #[serde(rename = "End Time")]
    End,
}

/// An event instant, or the sentinel for a column that held no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTimestamp {
    NotSet,
    At(DateTime<Utc>),
}

impl EventTimestamp {
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            EventTimestamp::NotSet => None,
            EventTimestamp::At(instant) => Some(*instant),
        }
    }

    pub fn to_cocoa_seconds(&self) -> Option<f64> {
        self.as_datetime().as_ref().map(datetime_to_cocoa)
    }
}

/// A usage duration as stored: SQLite integers stay integers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Seconds {
    Integer(i64),
    Real(f64),
}

impl Seconds {
    pub fn as_f64(&self) -> f64 {
        match self {
            Seconds::Integer(v) => *v as f64,
            Seconds::Real(v) => *v,
        }
    }
}

/// One interval of application focus or usage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationActivity {
    pub action: String,
    pub usage_in_seconds: Option<Seconds>,
    pub bundle_id: Option<String>,
}

/// One interval of Safari browsing on a page.
///
/// `uri` is the short form stored in `ZVALUESTRING`, `fulluri` the long form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafariActivity {
    pub usage_in_seconds: Option<Seconds>,
    pub uri: Option<String>,
    pub fulluri: Option<String>,
    pub uri_title: Option<String>,
}

/// Event payload, tagged so consumers can tell the shapes apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "data_type")]
pub enum EventData {
    #[serde(rename = "app-activity")]
    Application(ApplicationActivity),
    #[serde(rename = "safari-activity")]
    Safari(SafariActivity),
}

impl EventData {
    pub fn data_type(&self) -> &'static str {
        match self {
            EventData::Application(_) => "app-activity",
            EventData::Safari(_) => "safari-activity",
        }
    }
}

/// A finished timeline entry. The three events built from one row share
/// their `data`.
#[derive(Debug, Clone)]
pub struct TimelineEvent {
    pub timestamp: EventTimestamp,
    pub timestamp_desc: TimeDescription,
    pub parser: &'static str,
    pub data: Arc<EventData>,
}

/// Flat wire form of a [`TimelineEvent`].
#[derive(Debug, Serialize)]
pub struct SerializedEvent<'a> {
    pub timestamp: Option<DateTime<Utc>>,
    pub timestamp_desc: TimeDescription,
    pub parser: &'static str,
    #[serde(flatten)]
    pub data: &'a EventData,
}

impl TimelineEvent {
    pub fn serialized(&self) -> SerializedEvent<'_> {
        SerializedEvent {
            timestamp: self.timestamp.as_datetime(),
            timestamp_desc: self.timestamp_desc,
            parser: self.parser,
            data: &self.data,
        }
    }
}
