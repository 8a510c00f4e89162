use crate::error::ExtractError;
use crate::models::SourceRow;
use crate::sink::EventSink;

/// A named query a plugin runs against the store.
#[derive(Debug, Clone, Copy)]
pub struct PluginQuery {
    pub name: &'static str,
    pub sql: &'static str,
}

/// Turns rows of one kind of SQLite store into timeline events.
pub trait SqlitePlugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Tables that must exist before any query runs.
    fn required_tables(&self) -> &'static [&'static str];

    fn queries(&self) -> &'static [PluginQuery];

    /// Handles one row of `query`, returning how many events were produced.
    ///
    /// Row-scoped errors must be returned before anything is sent to `sink`.
    fn process_row(
        &self,
        query: &PluginQuery,
        row: &SourceRow,
        sink: &mut dyn EventSink,
    ) -> Result<usize, ExtractError>;

    /// Required tables absent from `tables`.
    fn missing_tables(&self, tables: &[String]) -> Vec<String> {
        self.required_tables()
            .iter()
            .filter(|required| !tables.iter().any(|table| table == *required))
            .map(|required| required.to_string())
            .collect()
    }
}
