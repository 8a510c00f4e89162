//! Event sinks: where finished timeline events go.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::error::SinkError;
use crate::models::TimelineEvent;

/// Receives events produced by plugins.
pub trait EventSink {
    fn produce(&mut self, event: TimelineEvent) -> Result<(), SinkError>;

    /// Called once after the last event of a run.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn produce(&mut self, event: TimelineEvent) -> Result<(), SinkError> {
        (**self).produce(event)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        (**self).finish()
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Vec<TimelineEvent>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<TimelineEvent> {
        self.events
    }
}

impl EventSink for CollectingSink {
    fn produce(&mut self, event: TimelineEvent) -> Result<(), SinkError> {
        self.events.push(event);
        Ok(())
    }
}

/// A sink handle that can be given to the database worker while the caller
/// keeps its own handle, so the sink outlives a failed run.
pub struct SharedSink<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedSink<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> SharedSink<S> {
    pub fn new(sink: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sink)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Takes the sink back. Fails while another handle is still alive.
    pub fn into_inner(self) -> Result<S, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(match mutex.into_inner() {
                Ok(sink) => sink,
                Err(poisoned) => poisoned.into_inner(),
            }),
            Err(inner) => Err(Self { inner }),
        }
    }
}

impl<S: EventSink> EventSink for SharedSink<S> {
    fn produce(&mut self, event: TimelineEvent) -> Result<(), SinkError> {
        self.lock().produce(event)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.lock().finish()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line, written as events arrive.
    #[default]
    Jsonl,
    /// A single JSON array, written on finish.
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Json => "json",
        }
    }
}

/// Serializes events to a writer.
pub struct JsonSink<W: Write> {
    writer: W,
    format: OutputFormat,
    buffered: Vec<serde_json::Value>,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            buffered: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonSink<W> {
    fn produce(&mut self, event: TimelineEvent) -> Result<(), SinkError> {
        match self.format {
            OutputFormat::Jsonl => {
                serde_json::to_writer(&mut self.writer, &event.serialized())?;
                self.writer.write_all(b"\n")?;
            }
            OutputFormat::Json => {
                self.buffered.push(serde_json::to_value(event.serialized())?);
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if self.format == OutputFormat::Json {
            let events = std::mem::take(&mut self.buffered);
            serde_json::to_writer_pretty(&mut self.writer, &events)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ApplicationActivity, EventData, EventTimestamp, Seconds, TimeDescription,
    };

    fn sample(desc: TimeDescription) -> TimelineEvent {
        TimelineEvent {
            timestamp: EventTimestamp::NotSet,
            timestamp_desc: desc,
            parser: "mac_knowledgec",
            data: Arc::new(EventData::Application(ApplicationActivity {
                action: "/app/usage".into(),
                usage_in_seconds: Some(Seconds::Real(-5.0)),
                bundle_id: None,
            })),
        }
    }

    #[test]
    fn jsonl_writes_one_line_per_event() {
        let mut sink = JsonSink::new(Vec::new(), OutputFormat::Jsonl);
        sink.produce(sample(TimeDescription::Creation)).unwrap();
        sink.produce(sample(TimeDescription::End)).unwrap();
        sink.finish().unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let last: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(last["timestamp_desc"], "End Time");
        assert_eq!(last["usage_in_seconds"], -5.0);
    }

    #[test]
    fn json_writes_an_array_on_finish() {
        let mut sink = JsonSink::new(Vec::new(), OutputFormat::Json);
        sink.produce(sample(TimeDescription::Start)).unwrap();
        sink.finish().unwrap();

        let parsed: serde_json::Value =
            serde_json::from_slice(&sink.into_inner()).unwrap();
        let events = parsed.as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["data_type"], "app-activity");
    }

    #[test]
    fn shared_sink_hands_back_events_from_clones() {
        let shared = SharedSink::new(CollectingSink::new());
        let mut worker_handle = shared.clone();
        worker_handle.produce(sample(TimeDescription::Creation)).unwrap();

        let shared = match shared.into_inner() {
            Ok(_) => panic!("a second handle is still alive"),
            Err(shared) => shared,
        };
        drop(worker_handle);

        let sink = shared.into_inner().ok().unwrap();
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn json_with_no_events_is_an_empty_array() {
        let mut sink = JsonSink::new(Vec::new(), OutputFormat::Json);
        sink.finish().unwrap();
        let parsed: serde_json::Value =
            serde_json::from_slice(&sink.into_inner()).unwrap();
        assert_eq!(parsed, serde_json::json!([]));
    }
}
