use std::sync::Arc;

use anyhow::Context;
use stock_admin::config::ClientConfig;
use stock_admin::external::http_client::HttpStocksClient;
use stock_admin::logging::{init_logging, LoggingConfig};
use stock_admin::state::AppState;
use stock_admin::views::StocksTable;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_logging(LoggingConfig::from_env()?)
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialize logging")?;

    let config = ClientConfig::from_env()?;
    tracing::info!("Using stocks API at {}", config.base_url);

    let client = HttpStocksClient::new(&config)?;
    let state = AppState::with_config(Arc::new(client), &config);

    let mut table = StocksTable::new(&state);
    table.load(&state).await;
    print!("{}", table.render());

    Ok(())
}
