//! Record model.
//!
//! A record is an ordered JSON object with a mandatory scalar `id`. Field
//! order is preserved as received so request bodies echo the server's shape.

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Request body for create/update calls.
pub type Payload = Map<String, Value>;

/// Identity of a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordId::Int),
            Value::String(s) => Some(RecordId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RecordId::Int(n) => Value::from(*n),
            RecordId::Text(s) => Value::String(s.clone()),
        }
    }

    /// Whether a raw JSON value refers to this id. Numeric ids also match
    /// their decimal string form, which is what form inputs produce.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (RecordId::Int(n), Value::Number(v)) => v.as_i64() == Some(*n),
            (RecordId::Int(n), Value::String(s)) => s.parse::<i64>().ok() == Some(*n),
            (RecordId::Text(t), Value::String(s)) => t == s,
            (RecordId::Text(t), Value::Number(v)) => v.to_string() == *t,
            _ => false,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

/// One persisted instance of an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Record {
    id: RecordId,
    fields: Map<String, Value>,
}

impl Record {
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(map) => Self::try_from(map),
            _ => Err(RecordError::NotAnObject),
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// All keys of the record, `id` included.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    /// Cell text for a field: strings verbatim, null or missing as empty,
    /// anything else as compact JSON.
    pub fn display_value(&self, field: &str) -> String {
        match self.fields.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

impl TryFrom<Map<String, Value>> for Record {
    type Error = RecordError;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = fields
            .get("id")
            .and_then(RecordId::from_value)
            .ok_or(RecordError::MissingId)?;
        Ok(Self { id, fields })
    }
}

impl From<Record> for Map<String, Value> {
    fn from(record: Record) -> Self {
        record.fields
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_requires_id() {
        let err = Record::from_value(json!({"name": "Rex"})).unwrap_err();
        assert_eq!(err, RecordError::MissingId);
        let err = Record::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err, RecordError::NotAnObject);
    }

    #[test]
    fn test_record_rejects_non_scalar_id() {
        assert!(Record::from_value(json!({"id": {"nested": 1}})).is_err());
        assert!(Record::from_value(json!({"id": null})).is_err());
    }

    #[test]
    fn test_record_deserializes_from_array() {
        let records: Vec<Record> = serde_json::from_value(json!([
            {"id": 1, "name": "Rex", "birth_date": "2020-01-01", "owner_id": 7},
            {"id": "b-2", "name": "Tom"}
        ]))
        .unwrap();
        assert_eq!(records[0].id(), &RecordId::Int(1));
        assert_eq!(records[1].id(), &RecordId::Text("b-2".to_string()));
    }

    #[test]
    fn test_field_order_is_preserved() {
        let record = Record::from_value(json!({"id": 1, "zeta": "z", "alpha": "a"})).unwrap();
        let keys: Vec<&str> = record.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "zeta", "alpha"]);
    }

    #[test]
    fn test_display_value() {
        let record =
            Record::from_value(json!({"id": 1, "name": "Rex", "owner_id": 7, "notes": null}))
                .unwrap();
        assert_eq!(record.display_value("name"), "Rex");
        assert_eq!(record.display_value("owner_id"), "7");
        assert_eq!(record.display_value("notes"), "");
        assert_eq!(record.display_value("missing"), "");
    }

    #[test]
    fn test_record_id_matches_form_strings() {
        let id = RecordId::Int(7);
        assert!(id.matches(&json!(7)));
        assert!(id.matches(&json!("7")));
        assert!(!id.matches(&json!(8)));
        assert!(!id.matches(&Value::Null));
    }

    #[test]
    fn test_serialize_round_trips_map() {
        let record = Record::from_value(json!({"id": 9, "first_name": "A"})).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"id": 9, "first_name": "A"}));
    }
}
