//! The worker pool: one loop per worker, a supervisor that owns them all.

pub mod supervisor;
pub mod worker;

pub use supervisor::{Supervisor, SHUTDOWN_BROADCAST};
pub use worker::Worker;

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use outrider_common::{Config, Record, RecipientKind, Recipient};
    use outrider_delivery::{DeliveryClient, DeliveryError};
    use outrider_store::{MemoryStore, StoreGateway};

    use super::*;

    struct AlwaysSucceeds;

    #[async_trait::async_trait]
    impl DeliveryClient for AlwaysSucceeds {
        async fn send(
            &self,
            _relay: &outrider_common::RelayDescriptor,
            _record: &Record,
            _message: &[u8],
        ) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    struct AlwaysRejects;

    #[async_trait::async_trait]
    impl DeliveryClient for AlwaysRejects {
        async fn send(
            &self,
            _relay: &outrider_common::RelayDescriptor,
            _record: &Record,
            _message: &[u8],
        ) -> Result<(), DeliveryError> {
            Err(DeliveryError::Rejected("550 Invalid Recipient: a@u.com".to_string()))
        }
    }

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            db_host: "localhost".to_string(),
            db_port: "27017".to_string(),
            db_name: "outrider".to_string(),
            worker_sleep: Duration::from_millis(5),
            worker_pool: 1,
            connection_retries: 3,
            connection_timeout: Duration::from_secs(1),
            send_retries: 3,
            send_retry_interval: Duration::from_millis(1),
        })
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_relay(outrider_common::RelayDescriptor {
            id: "relay-1".to_string(),
            hostname: "relay.example.com".to_string(),
            port: 587,
            username: "user".to_string(),
            password: "pass".to_string(),
        });
        let mut record = Record::new(
            "rec-1",
            "from@u.com",
            "S",
            "B",
            vec![Recipient::new("a@u.com", RecipientKind::To)],
        );
        record.updated_at = bson::DateTime::from_millis(0);
        store.insert_record(record);
        store
    }

    #[tokio::test]
    async fn successful_delivery_completes_the_record() {
        let store = seeded_store();
        let store_handle: Arc<dyn StoreGateway> = Arc::new(store.clone());
        let worker = Worker::new(store_handle, Arc::new(AlwaysSucceeds), test_config());

        let (tx, rx) = tokio::sync::broadcast::channel(1);
        let run = tokio::spawn(async move { worker.run(rx).await });

        // Give the worker one iteration, then stop it.
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(outrider_common::Signal::Shutdown).ok();
        run.await.unwrap();

        let record = store.get("rec-1").unwrap();
        assert_eq!(record.status, outrider_common::RecordStatus::Complete);
        assert!(record.worker_id.is_none());
    }

    #[tokio::test]
    async fn rejected_delivery_marks_record_failed() {
        let store = seeded_store();
        let store_handle: Arc<dyn StoreGateway> = Arc::new(store.clone());
        let worker = Worker::new(store_handle, Arc::new(AlwaysRejects), test_config());

        let (tx, rx) = tokio::sync::broadcast::channel(1);
        let run = tokio::spawn(async move { worker.run(rx).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(outrider_common::Signal::Shutdown).ok();
        run.await.unwrap();

        let record = store.get("rec-1").unwrap();
        assert_eq!(record.status, outrider_common::RecordStatus::Failed);
        assert_eq!(record.reason, "invalid-recipient");
    }
}
