use std::sync::Arc;

use rusqlite::Connection;
use serde::Serialize;

use crate::error::ExtractError;
use crate::models::{ColumnIndex, SourceRow};
use crate::plugin::SqlitePlugin;
use crate::sink::EventSink;

use super::helpers::{list_tables, read_values};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Counters for one plugin run over one store.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub plugin: String,
    pub rows_read: u64,
    pub rows_skipped: u64,
    pub events_emitted: u64,
}

/// Runs every query of `plugin` against `conn`, feeding rows to the plugin.
///
/// Missing tables fail the run before any row is read. Row-scoped errors are
/// logged and the row is skipped; anything else aborts the run.
pub fn run_plugin(
    conn: &Connection,
    plugin: &dyn SqlitePlugin,
    sink: &mut dyn EventSink,
) -> Result<ExtractionSummary, ExtractError> {
    let tables = list_tables(conn)?;
    let missing = plugin.missing_tables(&tables);
    if !missing.is_empty() {
        return Err(ExtractError::MissingTables(missing));
    }

    let mut summary = ExtractionSummary {
        plugin: plugin.name().to_string(),
        ..ExtractionSummary::default()
    };

    for query in plugin.queries() {
        let mut stmt = conn.prepare(query.sql)?;
        let columns = Arc::new(ColumnIndex::new(stmt.column_names()));
        let column_count = stmt.column_count();

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            summary.rows_read += 1;
            let source_row = SourceRow::new(columns.clone(), read_values(row, column_count)?);

            match plugin.process_row(query, &source_row, sink) {
                Ok(emitted) => summary.events_emitted += emitted as u64,
                Err(err) if err.is_row_scoped() => {
                    summary.rows_skipped += 1;
                    log_warn!(
                        "{}: skipping row {} of query {}: {err}",
                        plugin.name(),
                        summary.rows_read,
                        query.name
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    log_info!(
        "{}: {} rows read, {} skipped, {} events",
        summary.plugin,
        summary.rows_read,
        summary.rows_skipped,
        summary.events_emitted
    );

    Ok(summary)
}
