//! REST paths for entity collections.

use crate::record::RecordId;

/// Collection path segment: lower-cased entity name with a plural `s`.
pub fn collection_segment(entity: &str) -> String {
    format!("{}s", entity.to_lowercase())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// `GET|POST /{entity}s/`
    List { entity: &'a str },
    /// `GET|PUT|DELETE /{entity}s/{id}`
    Item { entity: &'a str, id: &'a RecordId },
    /// `GET /{parent}s/{id}/{child}s`
    Nested {
        parent: &'a str,
        id: &'a RecordId,
        child: &'a str,
    },
}

impl Endpoint<'_> {
    pub fn path(&self) -> String {
        match self {
            Endpoint::List { entity } => format!("/{}/", collection_segment(entity)),
            Endpoint::Item { entity, id } => format!("/{}/{}", collection_segment(entity), id),
            Endpoint::Nested { parent, id, child } => format!(
                "/{}/{}/{}",
                collection_segment(parent),
                id,
                collection_segment(child)
            ),
        }
    }
}
