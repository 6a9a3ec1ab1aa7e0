//! Mongo-backed [`StoreGateway`] implementation.
//!
//! Keeps a health flag on the driver session: a failing operation
//! invalidates it, and the next operation redials up to `connection_retries`
//! times (each attempt bounded by `connection_timeout`) before giving up,
//! the same "redial on failure" shape `empath-spool`'s file backends use
//! for their own resource recovery, adapted here to a network session.

use std::time::Duration;

use async_trait::async_trait;
use bson::{doc, DateTime as BsonDateTime};
use mongodb::{
    options::{FindOneAndUpdateOptions, ReturnDocument},
    Client, Collection,
};
use outrider_common::{store, Record, RecordStatus, RelayDescriptor, UpdateIntent};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};

const RECORDS_COLLECTION: &str = "records";
const SERVERS_COLLECTION: &str = "servers";

/// A `StoreGateway` backed by a MongoDB deployment.
pub struct MongoStore {
    uri: String,
    db_name: String,
    connection_retries: u32,
    connection_timeout: Duration,
    session: RwLock<Option<Client>>,
}

impl MongoStore {
    #[must_use]
    pub fn new(
        uri: impl Into<String>,
        db_name: impl Into<String>,
        connection_retries: u32,
        connection_timeout: Duration,
    ) -> Self {
        Self {
            uri: uri.into(),
            db_name: db_name.into(),
            connection_retries,
            connection_timeout,
            session: RwLock::new(None),
        }
    }

    /// Returns a live client, dialing (or redialing, if the last operation
    /// marked the session unhealthy) up to `connection_retries` times.
    async fn ensure_session(&self) -> Result<Client> {
        if let Some(client) = self.session.read().await.clone() {
            return Ok(client);
        }

        let mut last_error: Option<mongodb::error::Error> = None;

        for attempt in 1..=self.connection_retries.max(1) {
            let dial = tokio::time::timeout(self.connection_timeout, Client::with_uri_str(&self.uri)).await;

            match dial {
                Ok(Ok(client)) => {
                    *self.session.write().await = Some(client.clone());
                    return Ok(client);
                }
                Ok(Err(err)) => {
                    store!(level = WARN, "store dial attempt {attempt} failed: {err}");
                    last_error = Some(err);
                }
                Err(_elapsed) => {
                    store!(level = WARN, "store dial attempt {attempt} timed out");
                    last_error = Some(mongodb::error::Error::custom("connection attempt timed out"));
                }
            }
        }

        Err(StoreError::Connection {
            retries: self.connection_retries,
            source: last_error
                .map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
                .unwrap_or_else(|| Box::new(mongodb::error::Error::custom("no dial attempts made"))),
        })
    }

    /// Marks the current session unhealthy so the next operation redials.
    async fn invalidate(&self) {
        store!(level = WARN, "invalidating store session after a failed operation");
        *self.session.write().await = None;
    }

    fn records(&self, client: &Client) -> Collection<Record> {
        client.database(&self.db_name).collection(RECORDS_COLLECTION)
    }

    fn servers(&self, client: &Client) -> Collection<RelayDescriptor> {
        client.database(&self.db_name).collection(SERVERS_COLLECTION)
    }
}

#[async_trait]
impl crate::StoreGateway for MongoStore {
    async fn claim_ready(
        &self,
        worker_id: &str,
        retry_interval: Duration,
    ) -> Result<Option<Record>> {
        let client = self.ensure_session().await?;
        let collection = self.records(&client);

        let cutoff = BsonDateTime::from_millis(
            BsonDateTime::now().timestamp_millis() - retry_interval.as_millis() as i64,
        );

        let filter = doc! {
            "worker_id": null,
            "status": "incomplete",
            "updated_at": { "$lt": cutoff },
        };
        let update = doc! { "$set": { "worker_id": worker_id } };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        match collection
            .find_one_and_update(filter, update)
            .with_options(options)
            .await
        {
            Ok(record) => Ok(record),
            Err(err) => {
                self.invalidate().await;
                Err(StoreError::Backend(Box::new(err)))
            }
        }
    }

    async fn finalize(&self, record_id: &str, intent: &UpdateIntent) -> Result<()> {
        let client = self.ensure_session().await?;
        let collection = self.records(&client);

        let status = match intent.status {
            RecordStatus::Incomplete => "incomplete",
            RecordStatus::Complete => "complete",
            RecordStatus::Failed => "failed",
        };

        let recipients = bson::to_bson(&intent.recipients)
            .map_err(|err| StoreError::Backend(Box::new(err)))?;

        let filter = doc! { "_id": record_id };
        let update = doc! {
            "$set": {
                "worker_id": null,
                "tries": i64::from(intent.tries),
                "status": status,
                "reason": &intent.reason,
                "recipients": recipients,
                "updated_at": BsonDateTime::now(),
            }
        };

        match collection.update_one(filter, update).await {
            Ok(result) if result.matched_count == 0 => Err(StoreError::NotFound(record_id.to_string())),
            Ok(_) => Ok(()),
            Err(err) => {
                self.invalidate().await;
                Err(StoreError::Backend(Box::new(err)))
            }
        }
    }

    async fn pick_relay(&self) -> Result<RelayDescriptor> {
        let client = self.ensure_session().await?;
        let collection = self.servers(&client);

        let pipeline = vec![doc! { "$sample": { "size": 1 } }];

        let mut cursor = collection
            .clone_with_type::<bson::Document>()
            .aggregate(pipeline)
            .await
            .map_err(|err| {
                StoreError::Backend(Box::new(err))
            })?;

        use futures_util::stream::StreamExt;

        let Some(doc) = cursor.next().await else {
            return Err(StoreError::NoServers);
        };

        let doc = doc.map_err(|err| StoreError::Backend(Box::new(err)))?;
        bson::from_document(doc).map_err(|err| StoreError::Backend(Box::new(err)))
    }

    async fn close(&self) {
        *self.session.write().await = None;
    }
}
