pub mod analysis;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod storage;
pub mod utils;
pub mod validation;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use config::Config;
use storage::{RecordStore, WorkbookStore, WorkbookWriter};

pub use routes::router;

#[derive(Clone)]
pub struct AppState {
    pub records: Arc<RecordStore>,
    pub workbook: WorkbookWriter,
}

impl AppState {
    /// Opens both stores under the configured data directory and starts the
    /// workbook writer thread.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;

        let records = RecordStore::new(&config.data_dir);
        let workbook = WorkbookWriter::spawn(WorkbookStore::new(config.workbook_path()))
            .context("failed to start workbook writer")?;

        Ok(Self {
            records: Arc::new(records),
            workbook,
        })
    }
}

/// Serves the API until the process is stopped.
pub async fn run(config: Config) -> Result<()> {
    let state = AppState::open(&config)?;
    info!(
        "Storing records in {} and workbook at {}",
        config.data_dir.display(),
        state.workbook.path().display()
    );

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!("Health intake listening on {}", config.listen);

    axum::serve(listener, router(state))
        .await
        .context("server error")?;
    Ok(())
}
