//! Owns the termination broadcast and the worker pool.

use std::sync::{Arc, LazyLock};

use futures_util::future::join_all;
use outrider_common::{worker, Config, Signal};
use outrider_delivery::DeliveryClient;
use outrider_store::StoreGateway;
use tokio::sync::broadcast;

use crate::worker::Worker;

/// Global shutdown broadcast, mirroring `empath`'s `SHUTDOWN_BROADCAST`: a
/// single channel every worker subscribes to.
pub static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(64);
    sender
});

/// Waits for an OS termination signal (interrupt or terminate), then
/// broadcasts [`Signal::Shutdown`] once and returns.
///
/// `empath`'s own `shutdown()` (`empath/src/controller.rs`) follows this
/// broadcast with a loop that drains `SHUTDOWN_BROADCAST` until it sees a
/// second `Ctrl+C` or the channel closes — harmless there only because the
/// controller races that whole future against its subsystems in a single
/// top-level `tokio::select!`, so the drain loop is simply cancelled once
/// those subsystems finish. This supervisor has nothing else to race it
/// against, so the broadcast itself is the end of this function's job: a
/// lone `SIGTERM` (the normal way a container or systemd asks a process to
/// stop) must be enough to unblock `Supervisor::run`'s `join_all` below,
/// not just the first of two signals.
async fn wait_for_termination() -> anyhow::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            worker!(level = INFO, "interrupt received, shutting down");
        }
        _ = terminate.recv() => {
            worker!(level = INFO, "terminate received, shutting down");
        }
    }

    SHUTDOWN_BROADCAST
        .send(Signal::Shutdown)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Interrupted, err.to_string()))?;

    Ok(())
}

/// Owns N worker tasks and the termination broadcast.
pub struct Supervisor {
    config: Arc<Config>,
    store: Arc<dyn StoreGateway>,
    delivery: Arc<dyn DeliveryClient>,
}

impl Supervisor {
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn StoreGateway>,
        delivery: Arc<dyn DeliveryClient>,
    ) -> Self {
        Self {
            config,
            store,
            delivery,
        }
    }

    /// Launches `worker_pool` workers and runs until a termination signal
    /// arrives, at which point every worker is given the shutdown signal
    /// and joined before returning.
    ///
    /// # Errors
    /// Returns an error if the OS signal handlers could not be installed.
    pub async fn run(self) -> anyhow::Result<()> {
        worker!(level = INFO, "starting {} worker(s)", self.config.worker_pool);

        let mut handles = Vec::with_capacity(self.config.worker_pool);
        for _ in 0..self.config.worker_pool {
            let worker = Worker::new(
                Arc::clone(&self.store),
                Arc::clone(&self.delivery),
                Arc::clone(&self.config),
            );
            let shutdown = SHUTDOWN_BROADCAST.subscribe();
            handles.push(tokio::spawn(async move {
                worker.run(shutdown).await;
            }));
        }

        let result = wait_for_termination().await;

        join_all(handles).await;

        worker!(level = INFO, "all workers exited");

        result
    }
}
