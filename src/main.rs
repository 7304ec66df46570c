use anyhow::Result;
use clap::Parser;

use torneo::config::ServerConfig;
use torneo::{api, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = ServerConfig::parse();
    logging::init_logging(config.log_json)?;
    config.validate()?;

    if let Err(err) = api::serve(config).await {
        tracing::error!(error = %format!("{err:#}"), "server exited with error");
        return Err(err);
    }
    Ok(())
}
