//! Dropdown options for parent-reference fields.
//!
//! Options are cached per target entity for the lifetime of a mounted view.
//! A target is fetched at most once; a failed fetch is forgotten so the next
//! form that needs it asks again.

use clinic_core::{FetchError, Record, RecordId, RelationshipDescriptor, SchemaError, Transport};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// One choice in a parent-reference dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownOption {
    pub id: RecordId,
    pub label: String,
}

impl DropdownOption {
    /// Label is the id followed by every string-valued field, joined with
    /// ` - `, e.g. `1 - George - Franklin`.
    pub fn from_record(record: &Record) -> Self {
        let mut parts = vec![record.id().to_string()];
        parts.extend(
            record
                .fields()
                .iter()
                .filter(|(key, _)| key.as_str() != "id")
                .filter_map(|(_, value)| match value {
                    Value::String(s) => Some(s.clone()),
                    _ => None,
                }),
        );
        Self {
            id: record.id().clone(),
            label: parts.join(" - "),
        }
    }
}

#[derive(Debug)]
enum Entry {
    Loading,
    Ready(Vec<DropdownOption>),
}

/// Work handed back by [`RelationshipResolver::resolve_options`] when the
/// target has to be fetched.
pub struct OptionsFetch {
    target: String,
    transport: Arc<dyn Transport>,
}

impl OptionsFetch {
    pub fn target(&self) -> &str {
        &self.target
    }

    pub async fn run(self) -> Result<Vec<Record>, FetchError> {
        self.transport.list(&self.target).await
    }
}

pub struct RelationshipResolver {
    transport: Arc<dyn Transport>,
    cache: HashMap<String, Entry>,
}

impl RelationshipResolver {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cache: HashMap::new(),
        }
    }

    /// Ensure options for `relationship` are cached or in flight. Returns the
    /// fetch to run only when the target was absent.
    pub fn resolve_options(
        &mut self,
        relationship: &RelationshipDescriptor,
    ) -> Result<Option<OptionsFetch>, SchemaError> {
        if !relationship.is_parent_reference() {
            return Err(SchemaError::NotParentReference(
                relationship.target.clone(),
            ));
        }
        let key = relationship.name();
        if self.cache.contains_key(&key) {
            return Ok(None);
        }
        self.cache.insert(key, Entry::Loading);
        tracing::debug!(target_entity = %relationship.target, "Fetching dropdown options");
        Ok(Some(OptionsFetch {
            target: relationship.target.clone(),
            transport: Arc::clone(&self.transport),
        }))
    }

    /// Store the outcome of a fetch. Returns the number of options cached.
    pub fn complete(
        &mut self,
        target: &str,
        result: Result<Vec<Record>, FetchError>,
    ) -> Result<usize, FetchError> {
        let key = target.to_lowercase();
        match result {
            Ok(records) => {
                let options: Vec<DropdownOption> =
                    records.iter().map(DropdownOption::from_record).collect();
                let count = options.len();
                self.cache.insert(key, Entry::Ready(options));
                Ok(count)
            }
            Err(err) => {
                // Not cached: the next form open for this target asks again.
                self.cache.remove(&key);
                Err(err)
            }
        }
    }

    /// Cached options for a target. Empty while loading or after a failure.
    pub fn options(&self, target: &str) -> &[DropdownOption] {
        match self.cache.get(&target.to_lowercase()) {
            Some(Entry::Ready(options)) => options,
            _ => &[],
        }
    }

    pub fn is_loading(&self, target: &str) -> bool {
        matches!(self.cache.get(&target.to_lowercase()), Some(Entry::Loading))
    }

    pub fn is_cached(&self, target: &str) -> bool {
        matches!(self.cache.get(&target.to_lowercase()), Some(Entry::Ready(_)))
    }
}
