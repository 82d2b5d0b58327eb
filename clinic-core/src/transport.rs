//! Transport contract consumed by the orchestration layer.

use crate::error::FetchError;
use crate::record::{Payload, Record, RecordId};
use async_trait::async_trait;

/// REST-style collection access.
///
/// Entity names are passed as declared in the schema; implementations
/// derive paths with [`crate::Endpoint`]. Full collections are always
/// returned: no pagination, filtering or projection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET /{entity}s/`
    async fn list(&self, entity: &str) -> Result<Vec<Record>, FetchError>;

    /// `GET /{entity}s/{id}`
    async fn get(&self, entity: &str, id: &RecordId) -> Result<Record, FetchError>;

    /// `POST /{entity}s/` with a body that carries no id.
    async fn create(&self, entity: &str, body: &Payload) -> Result<Record, FetchError>;

    /// `PUT /{entity}s/{id}`
    async fn update(
        &self,
        entity: &str,
        id: &RecordId,
        body: &Payload,
    ) -> Result<Record, FetchError>;

    /// `DELETE /{entity}s/{id}`
    async fn delete(&self, entity: &str, id: &RecordId) -> Result<(), FetchError>;

    /// `GET /{parent}s/{id}/{child}s`
    async fn list_nested(
        &self,
        parent: &str,
        id: &RecordId,
        child: &str,
    ) -> Result<Vec<Record>, FetchError>;
}
