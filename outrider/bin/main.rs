#![deny(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

use std::sync::Arc;

use anyhow::Context;
use outrider_common::{logging, Config};
use outrider_delivery::SmtpDeliveryClient;
use outrider_store::{MongoStore, StoreGateway};
use outrider_worker::Supervisor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("invalid configuration")?;

    logging::init();

    outrider_common::tracing::info!(
        "starting outrider with a pool of {} worker(s)",
        config.worker_pool
    );

    let store: Arc<dyn StoreGateway> = Arc::new(MongoStore::new(
        format!("mongodb://{}:{}", config.db_host, config.db_port),
        config.db_name.clone(),
        config.connection_retries,
        config.connection_timeout,
    ));
    let delivery = Arc::new(SmtpDeliveryClient::new());

    let supervisor = Supervisor::new(Arc::new(config), store, delivery);
    supervisor.run().await.context("supervisor exited with an error")
}
