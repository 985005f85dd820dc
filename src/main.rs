use clap::Parser;
use health_intake_lib::config::{init_logging, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG on top of the Info default
    init_logging();

    let config = Config::parse();
    log::info!("Health intake starting up...");

    if let Err(err) = health_intake_lib::run(config).await {
        log::error!("Failed to run server: {err:#}");
        return Err(err);
    }
    Ok(())
}
