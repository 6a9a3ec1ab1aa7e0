//! One worker's loop: claim, format, deliver, classify, finalize.

use std::sync::Arc;

use outrider_common::{worker, Config, Signal};
use outrider_delivery::{classify, format, malformed_record_intent, DeliveryClient};
use outrider_store::StoreGateway;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A single worker task.
///
/// Its identifier is a random UUIDv4, generated once at construction and
/// unchanged for the worker's lifetime, matching spec §4.5's "one id per
/// worker goroutine/task/thread".
pub struct Worker {
    id: String,
    store: Arc<dyn StoreGateway>,
    delivery: Arc<dyn DeliveryClient>,
    config: Arc<Config>,
}

impl Worker {
    #[must_use]
    pub fn new(
        store: Arc<dyn StoreGateway>,
        delivery: Arc<dyn DeliveryClient>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            store,
            delivery,
            config,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Runs the worker loop until `shutdown` fires or is closed.
    ///
    /// Mirrors the eight-step loop of spec §4.5: a non-blocking shutdown
    /// check, a relay pick, a claim attempt, formatting (with a
    /// short-circuit to terminal failure on a malformed record), a send
    /// attempt, classification, and a finalize, then straight back to the
    /// top with no sleep on the successful-work path.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<Signal>) {
        loop {
            match shutdown.try_recv() {
                Ok(Signal::Shutdown) => {
                    worker!(level = INFO, "worker {} received shutdown, exiting", self.id);
                    break;
                }
                Err(broadcast::error::TryRecvError::Empty) => {}
                Err(broadcast::error::TryRecvError::Closed) => break,
                Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    // Missed broadcasts; the only signal ever sent is
                    // Shutdown, so treat a lag as one too.
                    break;
                }
            }

            let relay = match self.store.pick_relay().await {
                Ok(relay) => relay,
                Err(err) => {
                    worker!(level = WARN, "worker {} could not pick a relay: {err}", self.id);
                    tokio::time::sleep(self.config.worker_sleep).await;
                    continue;
                }
            };

            let record = match self
                .store
                .claim_ready(&self.id, self.config.send_retry_interval)
                .await
            {
                Ok(Some(record)) => record,
                Ok(None) => {
                    tokio::time::sleep(self.config.worker_sleep).await;
                    continue;
                }
                Err(err) => {
                    worker!(level = WARN, "worker {} claim_ready failed: {err}", self.id);
                    tokio::time::sleep(self.config.worker_sleep).await;
                    continue;
                }
            };

            worker!(level = DEBUG, "worker {} claimed record {}", self.id, record.id);

            let message = match format(&record) {
                Ok(bytes) => bytes,
                Err(err) => {
                    worker!(
                        level = ERROR,
                        "worker {} could not format record {}: {err}",
                        self.id,
                        record.id
                    );
                    let intent = malformed_record_intent(&record);
                    if let Err(finalize_err) = self.store.finalize(&record.id, &intent).await {
                        worker!(
                            level = ERROR,
                            "worker {} could not finalize malformed record {}: {finalize_err}",
                            self.id,
                            record.id
                        );
                    }
                    continue;
                }
            };

            let send_result = self.delivery.send(&relay, &record, &message).await;
            let err_text = send_result.as_ref().err().map(outrider_delivery::DeliveryError::classifier_text);
            let intent = classify(err_text.as_deref(), &record, self.config.send_retries);

            worker!(
                level = INFO,
                "worker {} finalizing record {} as {:?} ({})",
                self.id,
                record.id,
                intent.status,
                intent.reason
            );

            if let Err(err) = self.store.finalize(&record.id, &intent).await {
                worker!(
                    level = ERROR,
                    "worker {} could not finalize record {}: {err}",
                    self.id,
                    record.id
                );
            }
        }

        self.store.close().await;
    }
}
