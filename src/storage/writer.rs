use std::{
    any::Any,
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, bail, Context, Result};
use tokio::sync::oneshot;

use super::workbook::WorkbookStore;
use crate::{
    error::{StoreError, StoreResult},
    log_error, log_info, log_warn,
    models::HealthRecord,
};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "health_intake::workbook";

type WorkbookTask = Box<dyn FnOnce(&WorkbookStore) + Send + 'static>;

enum WriterCommand {
    Execute(WorkbookTask),
    Shutdown,
}

struct WriterInner {
    commands: mpsc::Sender<WriterCommand>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl WriterInner {
    /// Lets the thread drain queued tasks, then waits for it. Later calls
    /// are no-ops.
    fn stop(&self) {
        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };

        // Send fails only when the thread has already exited.
        let _ = self.commands.send(WriterCommand::Shutdown);
        if let Err(payload) = handle.join() {
            log_error!("Workbook thread panicked: {}", panic_message(payload.as_ref()));
        }
    }
}

impl Drop for WriterInner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

fn serve(store: &WorkbookStore, commands: &mpsc::Receiver<WriterCommand>) {
    for command in commands {
        match command {
            WriterCommand::Execute(task) => task(store),
            WriterCommand::Shutdown => break,
        }
    }
    log_info!("Workbook thread for {} stopped", store.path().display());
}

/// Serializes every workbook operation onto one dedicated thread.
///
/// The thread owns the [`WorkbookStore`], so read-modify-write appends from
/// concurrent requests run one after another and none of them is lost.
/// The thread stops once the last clone is dropped.
#[derive(Clone)]
pub struct WorkbookWriter {
    inner: Arc<WriterInner>,
    path: Arc<PathBuf>,
}

impl WorkbookWriter {
    pub fn spawn(store: WorkbookStore) -> Result<Self> {
        let path = store.path().to_path_buf();
        let (commands, queue) = mpsc::channel::<WriterCommand>();
        let (prepared_tx, prepared_rx) = mpsc::sync_channel::<StoreResult<()>>(1);

        let thread = thread::Builder::new()
            .name("health-intake-workbook".into())
            .spawn(move || {
                if prepared_tx.send(store.ensure_storage_ready()).is_ok() {
                    serve(&store, &queue);
                }
            })
            .context("failed to spawn workbook worker thread")?;

        match prepared_rx.recv() {
            Ok(Ok(())) => {}
            // The first append retries directory creation.
            Ok(Err(err)) => log_warn!("Workbook storage not ready yet: {err:#}"),
            Err(_) => bail!("workbook thread exited during startup"),
        }
        log_info!("Workbook writer started for {}", path.display());

        Ok(Self {
            inner: Arc::new(WriterInner {
                commands,
                thread: Mutex::new(Some(thread)),
            }),
            path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Runs `task` against the store on the writer thread and waits for its
    /// result. Tasks run in submission order.
    pub async fn execute<F, T>(&self, task: F) -> StoreResult<T>
    where
        F: FnOnce(&WorkbookStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = WriterCommand::Execute(Box::new(move |store| {
            let result = task(store);
            if reply_tx.send(result).is_err() {
                log_warn!("Workbook caller dropped before receiving result");
            }
        }));

        self.inner
            .commands
            .send(command)
            .map_err(|err| anyhow!("failed to send command to workbook thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| StoreError::from(anyhow!("workbook thread terminated unexpectedly")))?
    }

    pub async fn append_row(&self, record: HealthRecord) -> StoreResult<()> {
        self.execute(move |store| store.append_row(&record)).await
    }

    /// Best-effort like [`WorkbookStore::read_all`]: a dead writer thread
    /// reads as an empty workbook.
    pub async fn read_all(&self) -> Vec<HealthRecord> {
        match self.execute(|store| Ok(store.read_all())).await {
            Ok(records) => records,
            Err(err) => {
                log_error!("Failed to read workbook rows: {err:#}");
                Vec::new()
            }
        }
    }

    pub async fn read_raw(&self) -> StoreResult<Vec<u8>> {
        self.execute(WorkbookStore::read_raw).await
    }
}
