pub mod cocoa_time;
pub mod db;
pub mod error;
pub mod knowledgec;
pub mod models;
pub mod plugin;
pub mod registry;
pub mod settings;
pub mod sink;
mod utils;

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{debug, error, info, warn};

use db::{Database, ExtractionSummary};
use error::ExtractError;
use knowledgec::KnowledgeCPlugin;
use registry::PluginRegistry;
use settings::Settings;
use sink::{EventSink, JsonSink, OutputFormat, SharedSink};

pub use utils::logging::init as init_logging;

#[derive(Parser, Debug)]
#[command(
    name = "knowledgec",
    version,
    about = "Extract timeline events from macOS KnowledgeC databases"
)]
pub struct Cli {
    /// KnowledgeC database files (knowledgeC.db)
    #[arg(required = true)]
    pub databases: Vec<PathBuf>,

    /// Write events here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (overrides settings)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// JSON settings file
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Only run the named plugin (repeatable; overrides settings)
    #[arg(long = "plugin")]
    pub plugins: Vec<String>,
}

/// Every plugin this build knows about.
pub fn build_registry() -> Result<PluginRegistry> {
    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(KnowledgeCPlugin))?;
    Ok(registry)
}

/// Per-store results of an extraction run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub summaries: Vec<(PathBuf, ExtractionSummary)>,
    pub failed: Vec<PathBuf>,
}

impl RunReport {
    pub fn events_emitted(&self) -> u64 {
        self.summaries
            .iter()
            .map(|(_, summary)| summary.events_emitted)
            .sum()
    }
}

/// Extracts each store in turn into one sink.
///
/// A store that cannot be opened, matches no plugin, or fails mid-run is
/// logged and recorded in the report; the remaining stores still run.
pub async fn extract_files<S>(
    registry: &PluginRegistry,
    paths: &[PathBuf],
    sink: S,
) -> Result<(S, RunReport)>
where
    S: EventSink + Send + 'static,
{
    let mut report = RunReport::default();
    let mut shared = SharedSink::new(sink);

    for path in paths {
        let database = match Database::open(path.clone()) {
            Ok(database) => database,
            Err(err) => {
                error!("{}: {err:#}", path.display());
                report.failed.push(path.clone());
                continue;
            }
        };

        let tables = match database.table_names().await {
            Ok(tables) => tables,
            Err(err) => {
                error!("{}: cannot list tables: {err}", path.display());
                report.failed.push(path.clone());
                continue;
            }
        };

        let plugins = registry.matching(&tables);
        if plugins.is_empty() {
            for plugin in registry.plugins() {
                error!(
                    "{}: {} cannot run, missing tables: {}",
                    path.display(),
                    plugin.name(),
                    plugin.missing_tables(&tables).join(", ")
                );
            }
            report.failed.push(path.clone());
            continue;
        }

        for plugin in plugins {
            let plugin_name = plugin.name();
            let result = match database.extract(plugin, shared.clone()).await {
                Ok(outcome) => outcome.result,
                Err(err) => Err(err),
            };

            match result {
                Ok(summary) => report.summaries.push((path.clone(), summary)),
                Err(err) => {
                    error!("{}: {plugin_name} failed: {err}", path.display());
                    if !report.failed.contains(path) {
                        report.failed.push(path.clone());
                    }
                    if matches!(err, ExtractError::Worker(_)) {
                        break;
                    }
                }
            }
        }
    }

    shared.finish().context("failed to flush events")?;
    let sink = shared
        .into_inner()
        .map_err(|_| anyhow!("event sink is still held by a database worker"))?;
    Ok((sink, report))
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(format) = cli.format {
        settings.output_format = format;
    }
    if !cli.plugins.is_empty() {
        settings.plugins = cli.plugins.clone();
    }

    init_logging(settings.log_filter());

    let mut registry = build_registry()?;
    if !settings.plugins.is_empty() {
        registry.retain_named(&settings.plugins)?;
    }

    let writer: Box<dyn Write + Send> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    let sink = JsonSink::new(writer, settings.output_format);

    info!(
        "Extracting {} file(s) as {} with plugins: {}",
        cli.databases.len(),
        settings.output_format.as_str(),
        registry.names().join(", ")
    );
    for plugin in registry.plugins() {
        debug!("{}: {}", plugin.name(), plugin.description());
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let (_, report) = runtime.block_on(extract_files(&registry, &cli.databases, sink))?;

    info!(
        "Done: {} event(s) from {} file(s)",
        report.events_emitted(),
        report.summaries.len()
    );

    if report.failed.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!("{} file(s) could not be extracted", report.failed.len());
        Ok(ExitCode::FAILURE)
    }
}
