use std::{
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use tokio::sync::oneshot;

mod extract;
pub mod helpers;

pub use extract::{run_plugin, ExtractionSummary};

use crate::error::ExtractError;
use crate::plugin::SqlitePlugin;
use crate::sink::EventSink;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

/// What an extraction run hands back. The sink is returned even when the run
/// failed so the caller can keep using it for other stores.
pub struct ExtractionOutcome<S> {
    pub sink: S,
    pub result: Result<ExtractionSummary, ExtractError>,
}

/// A KnowledgeC store opened read-only on its own worker thread.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if !db_path.is_file() {
            return Err(anyhow!("database file {} does not exist", db_path.display()));
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("knowledgec-db".into())
            .spawn(move || {
                let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
                let mut conn = match Connection::open_with_flags(&path_for_thread, flags) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                // The open is lazy; touch the schema so a non-database file fails here.
                let init_result = conn
                    .query_row("SELECT count(*) FROM sqlite_master", [], |row| {
                        row.get::<_, i64>(0)
                    })
                    .map(|_| ())
                    .context("file is not a readable SQLite database");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            // A panicking task drops its reply channel; the caller
                            // sees a worker error and the thread keeps serving.
                            let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(&mut conn)));
                            if outcome.is_err() {
                                error!("DB task panicked");
                            }
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Opened {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T, ExtractError>
    where
        F: FnOnce(&mut Connection) -> Result<T, ExtractError> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender.send(command).map_err(|err| {
            ExtractError::Worker(format!("failed to send command to DB thread: {err}"))
        })?;

        reply_rx
            .await
            .map_err(|_| ExtractError::Worker("database thread terminated unexpectedly".into()))?
    }

    pub async fn table_names(&self) -> Result<Vec<String>, ExtractError> {
        self.execute(|conn| Ok(helpers::list_tables(conn)?)).await
    }

    /// Runs `plugin` over the store, sending events to `sink`.
    pub async fn extract<S>(
        &self,
        plugin: Arc<dyn SqlitePlugin>,
        sink: S,
    ) -> Result<ExtractionOutcome<S>, ExtractError>
    where
        S: EventSink + Send + 'static,
    {
        self.execute(move |conn| {
            let mut sink = sink;
            let result = run_plugin(conn, plugin.as_ref(), &mut sink);
            Ok(ExtractionOutcome { sink, result })
        })
        .await
    }
}
