//! Clinic Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - An in-memory [`MockTransport`] that records every call
//! - Seeded fixtures for the built-in domain
//! - Proptest generators for records

pub use clinic_core::{
    Endpoint, EntitySchema, FetchError, FieldType, Payload, Record, RecordId, SchemaRegistry,
    Transport,
};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

// ============================================================================
// MOCK TRANSPORT
// ============================================================================

/// One request observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum Failure {
    Status(u16),
    Network,
}

/// In-memory REST backend keyed by lower-cased entity name.
///
/// Nested listings are answered from foreign keys: `GET /pets/1/visits`
/// returns every visit whose `pet_id` is 1. Individual paths can be made to
/// fail or to hang until released.
#[derive(Default)]
pub struct MockTransport {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<(&'static str, String), Failure>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table. Panics if a value is not a record with an id.
    pub fn with_records(self, entity: &str, records: Vec<Value>) -> Self {
        for value in records {
            self.insert(entity, value);
        }
        self
    }

    pub fn insert(&self, entity: &str, value: Value) {
        let record = Record::from_value(value).expect("fixture record must carry an id");
        lock(&self.tables)
            .entry(entity.to_lowercase())
            .or_default()
            .push(record);
    }

    /// Current contents of a table, in insertion order.
    pub fn records(&self, entity: &str) -> Vec<Record> {
        lock(&self.tables)
            .get(&entity.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    /// Make `method path` answer with an HTTP error status.
    pub fn fail(&self, method: &'static str, path: impl Into<String>, status: u16) {
        lock(&self.failures).insert((method, path.into()), Failure::Status(status));
    }

    /// Make `method path` fail before reaching the server.
    pub fn fail_network(&self, method: &'static str, path: impl Into<String>) {
        lock(&self.failures).insert((method, path.into()), Failure::Network);
    }

    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    /// Hold every request to `path` until [`MockTransport::release`].
    pub fn hold(&self, path: impl Into<String>) {
        lock(&self.holds).insert(path.into(), Arc::new(Notify::new()));
    }

    pub fn release(&self, path: &str) {
        if let Some(gate) = lock(&self.holds).remove(path) {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    pub fn last_body(&self, method: &str, path: &str) -> Option<Value> {
        lock(&self.calls)
            .iter()
            .rev()
            .find(|c| c.method == method && c.path == path)
            .and_then(|c| c.body.clone())
    }

    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    async fn enter(
        &self,
        method: &'static str,
        path: &str,
        body: Option<Value>,
    ) -> Result<(), FetchError> {
        lock(&self.calls).push(Call {
            method,
            path: path.to_string(),
            body,
        });

        let gate = lock(&self.holds).get(path).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match lock(&self.failures).get(&(method, path.to_string())) {
            Some(Failure::Status(status)) => Err(FetchError::Status {
                method,
                path: path.to_string(),
                status: *status,
                message: "mock failure".to_string(),
            }),
            Some(Failure::Network) => Err(FetchError::Transport {
                method,
                path: path.to_string(),
                reason: "connection refused".to_string(),
            }),
            None => Ok(()),
        }
    }

    fn not_found(method: &'static str, path: String) -> FetchError {
        FetchError::Status {
            method,
            path,
            status: 404,
            message: "not found".to_string(),
        }
    }

    fn next_id(table: &[Record]) -> i64 {
        table
            .iter()
            .filter_map(|r| match r.id() {
                RecordId::Int(n) => Some(*n),
                RecordId::Text(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn list(&self, entity: &str) -> Result<Vec<Record>, FetchError> {
        let path = Endpoint::List { entity }.path();
        self.enter("GET", &path, None).await?;
        Ok(self.records(entity))
    }

    async fn get(&self, entity: &str, id: &RecordId) -> Result<Record, FetchError> {
        let path = Endpoint::Item { entity, id }.path();
        self.enter("GET", &path, None).await?;
        self.records(entity)
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found("GET", path))
    }

    async fn create(&self, entity: &str, body: &Payload) -> Result<Record, FetchError> {
        let path = Endpoint::List { entity }.path();
        self.enter("POST", &path, Some(Value::Object(body.clone())))
            .await?;

        let mut tables = lock(&self.tables);
        let table = tables.entry(entity.to_lowercase()).or_default();
        let mut fields = Map::new();
        fields.insert("id".to_string(), json!(Self::next_id(table)));
        for (key, value) in body {
            if key != "id" {
                fields.insert(key.clone(), value.clone());
            }
        }
        let record = Record::try_from(fields).map_err(|e| FetchError::Decode {
            method: "POST",
            path: path.clone(),
            reason: e.to_string(),
        })?;
        table.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        entity: &str,
        id: &RecordId,
        body: &Payload,
    ) -> Result<Record, FetchError> {
        let path = Endpoint::Item { entity, id }.path();
        self.enter("PUT", &path, Some(Value::Object(body.clone())))
            .await?;

        let mut tables = lock(&self.tables);
        let table = tables.entry(entity.to_lowercase()).or_default();
        let slot = table
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found("PUT", path.clone()))?;
        let mut fields = slot.fields().clone();
        for (key, value) in body {
            if key != "id" {
                fields.insert(key.clone(), value.clone());
            }
        }
        let record = Record::try_from(fields).map_err(|e| FetchError::Decode {
            method: "PUT",
            path,
            reason: e.to_string(),
        })?;
        *slot = record.clone();
        Ok(record)
    }

    async fn delete(&self, entity: &str, id: &RecordId) -> Result<(), FetchError> {
        let path = Endpoint::Item { entity, id }.path();
        self.enter("DELETE", &path, None).await?;

        let mut tables = lock(&self.tables);
        let table = tables.entry(entity.to_lowercase()).or_default();
        let before = table.len();
        table.retain(|r| r.id() != id);
        if table.len() == before {
            return Err(Self::not_found("DELETE", path));
        }
        Ok(())
    }

    async fn list_nested(
        &self,
        parent: &str,
        id: &RecordId,
        child: &str,
    ) -> Result<Vec<Record>, FetchError> {
        let path = Endpoint::Nested { parent, id, child }.path();
        self.enter("GET", &path, None).await?;

        let foreign_key = format!("{}_id", parent.to_lowercase());
        Ok(self
            .records(child)
            .into_iter()
            .filter(|r| r.get(&foreign_key).is_some_and(|v| id.matches(v)))
            .collect())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    use super::*;

    /// Built-in schema registry.
    pub fn registry() -> Arc<SchemaRegistry> {
        Arc::new(SchemaRegistry::builtin().expect("built-in model must parse"))
    }

    /// Two owners, two pets, two vets and two visits of pet 1.
    pub fn petclinic() -> MockTransport {
        MockTransport::new()
            .with_records(
                "Owner",
                vec![
                    json!({"id": 1, "first_name": "George", "last_name": "Franklin"}),
                    json!({"id": 2, "first_name": "Betty", "last_name": "Davis"}),
                ],
            )
            .with_records(
                "Pet",
                vec![
                    json!({"id": 1, "name": "Rex", "birth_date": "2020-01-01", "owner_id": 1}),
                    json!({"id": 2, "name": "Leo", "birth_date": "2019-05-04", "owner_id": 2}),
                ],
            )
            .with_records(
                "Vet",
                vec![
                    json!({"id": 1, "first_name": "James", "last_name": "Carter"}),
                    json!({"id": 2, "first_name": "Helen", "last_name": "Leary"}),
                ],
            )
            .with_records(
                "Visit",
                vec![
                    json!({"id": 1, "visit_date": "2021-03-04", "description": "rabies shot", "pet_id": 1, "vet_id": 1}),
                    json!({"id": 2, "visit_date": "2021-06-12", "description": "neutered", "pet_id": 1, "vet_id": 2}),
                ],
            )
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    /// A JSON value plausible for a field of the given type.
    pub fn arb_field_value(field_type: FieldType) -> BoxedStrategy<Value> {
        match field_type {
            FieldType::Text => "[A-Za-z][A-Za-z ]{0,15}".prop_map(Value::String).boxed(),
            FieldType::Email => "[a-z]{1,8}@[a-z]{1,8}\\.com".prop_map(Value::String).boxed(),
            FieldType::Date => (1990u32..2030, 1u32..13, 1u32..29)
                .prop_map(|(y, m, d)| Value::String(format!("{:04}-{:02}-{:02}", y, m, d)))
                .boxed(),
            FieldType::DateTime => (1990u32..2030, 1u32..13, 1u32..29, 0u32..24)
                .prop_map(|(y, m, d, h)| {
                    Value::String(format!("{:04}-{:02}-{:02}T{:02}:00:00", y, m, d, h))
                })
                .boxed(),
            FieldType::Number => any::<i32>().prop_map(|n| json!(n)).boxed(),
            FieldType::Boolean => any::<bool>().prop_map(Value::Bool).boxed(),
        }
    }

    /// A record of `schema` with the given id and a value for every field.
    pub fn arb_record(schema: Arc<EntitySchema>, id: i64) -> BoxedStrategy<Record> {
        let fields: Vec<_> = schema
            .fields
            .iter()
            .map(|f| (Just(f.name.clone()), arb_field_value(f.field_type)))
            .collect();
        fields
            .prop_map(move |values| {
                let mut map = Map::new();
                map.insert("id".to_string(), json!(id));
                for (name, value) in values {
                    map.insert(name, value);
                }
                Record::try_from(map).expect("generated record carries an id")
            })
            .boxed()
    }

    /// Up to `max` records with distinct ids in arbitrary order.
    pub fn arb_collection(schema: Arc<EntitySchema>, max: usize) -> BoxedStrategy<Vec<Record>> {
        prop::collection::vec(1i64..10_000, 0..=max)
            .prop_map(|mut ids| {
                let mut seen = std::collections::HashSet::new();
                ids.retain(|id| seen.insert(*id));
                ids
            })
            .prop_flat_map(move |ids| {
                ids.into_iter()
                    .map(|id| arb_record(schema.clone(), id))
                    .collect::<Vec<_>>()
            })
            .boxed()
    }
}
