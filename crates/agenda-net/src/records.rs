//! Typed client for the `/records/` collection resource.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use agenda_shared::constants::{PARTICIPANTS_PATH, RECORDS_PATH};
use agenda_shared::{Participant, Record, RecordId};

use crate::error::GatewayError;
use crate::gateway::HttpGateway;
use reqwest::Method;

/// REST calls used by the record workflow.
#[derive(Debug, Clone)]
pub struct RecordsApi {
    gateway: HttpGateway,
    records_path: String,
    participants_path: String,
}

impl RecordsApi {
    pub fn new(
        gateway: HttpGateway,
        records_path: impl Into<String>,
        participants_path: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            records_path: with_trailing_slash(records_path.into()),
            participants_path: with_trailing_slash(participants_path.into()),
        }
    }

    /// Use the default `/records/` and `/participants/` paths.
    pub fn with_default_paths(gateway: HttpGateway) -> Self {
        Self::new(gateway, RECORDS_PATH, PARTICIPANTS_PATH)
    }

    pub fn gateway(&self) -> &HttpGateway {
        &self.gateway
    }

    /// `GET /records/`
    pub async fn list(&self) -> Result<Vec<Record>, GatewayError> {
        let value = self.gateway.send(Method::GET, &self.records_path, None).await?;
        decode(value)
    }

    /// `GET /records/{id}/`
    pub async fn get(&self, id: RecordId) -> Result<Record, GatewayError> {
        let value = self.gateway.send(Method::GET, &self.item_path(id), None).await?;
        decode(value)
    }

    /// `POST /records/` with the record minus its id.  The reply must carry
    /// the server-assigned id.
    pub async fn create(&self, record: &Record) -> Result<Record, GatewayError> {
        let body = encode(&record.without_id())?;
        let value = self
            .gateway
            .send(Method::POST, &self.records_path, Some(&body))
            .await?;
        let created: Record = decode(value)?;
        let Some(id) = created.id else {
            return Err(GatewayError::Parse("created record has no id".into()));
        };
        info!(record_id = %id, "Record created");
        Ok(created)
    }

    /// `PUT /records/{id}/` with the full record.
    pub async fn update(&self, id: RecordId, record: &Record) -> Result<Record, GatewayError> {
        let body = encode(&record.with_id(id))?;
        let value = self
            .gateway
            .send(Method::PUT, &self.item_path(id), Some(&body))
            .await?;
        let mut updated: Record = decode(value)?;
        // some backends omit the id on update replies
        updated.id.get_or_insert(id);
        info!(record_id = %id, "Record updated");
        Ok(updated)
    }

    /// `DELETE /records/{id}/`.  Any 2xx body is accepted.
    pub async fn delete(&self, id: RecordId) -> Result<(), GatewayError> {
        self.gateway
            .send(Method::DELETE, &self.item_path(id), None)
            .await?;
        info!(record_id = %id, "Record deleted");
        Ok(())
    }

    /// `GET /participants/`
    pub async fn participants(&self) -> Result<Vec<Participant>, GatewayError> {
        let value = self
            .gateway
            .send(Method::GET, &self.participants_path, None)
            .await?;
        decode(value)
    }

    fn item_path(&self, id: RecordId) -> String {
        format!("{}{}/", self.records_path, id)
    }
}

fn with_trailing_slash(mut path: String) -> String {
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}

fn encode(record: &Record) -> Result<Value, GatewayError> {
    serde_json::to_value(record).map_err(|e| GatewayError::Parse(e.to_string()))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, GatewayError> {
    serde_json::from_value(value).map_err(|e| GatewayError::Parse(e.to_string()))
}
