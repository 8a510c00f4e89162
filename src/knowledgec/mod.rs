//! Plugin for the macOS Duet / KnowledgeC database.

pub mod classifier;
pub mod query;

use crate::error::ExtractError;
use crate::models::SourceRow;
use crate::plugin::{PluginQuery, SqlitePlugin};
use crate::sink::EventSink;

pub use classifier::{classify, ActivityKind};

pub const PLUGIN_NAME: &str = "mac_knowledgec";

#[derive(Debug, Clone, Copy, Default)]
pub struct KnowledgeCPlugin;

impl SqlitePlugin for KnowledgeCPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn description(&self) -> &'static str {
        "Parser for Duet / KnowledgeC database file."
    }

    fn required_tables(&self) -> &'static [&'static str] {
        query::REQUIRED_TABLES
    }

    fn queries(&self) -> &'static [PluginQuery] {
        query::QUERIES
    }

    fn process_row(
        &self,
        _query: &PluginQuery,
        row: &SourceRow,
        sink: &mut dyn EventSink,
    ) -> Result<usize, ExtractError> {
        classifier::process(PLUGIN_NAME, row, sink)
    }
}
