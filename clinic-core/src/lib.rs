//! Clinic Core - schema, records and the transport contract.
//!
//! Pure data structures and contracts. All orchestration lives in the TUI
//! crate; nothing here performs I/O except parsing a model file.

pub mod endpoint;
pub mod error;
pub mod record;
pub mod schema;
pub mod transport;

pub use endpoint::{collection_segment, Endpoint};
pub use error::{FetchError, RecordError, SchemaError};
pub use record::{Payload, Record, RecordId};
pub use schema::{
    EntitySchema, FieldSpec, FieldType, RelationshipDescriptor, RelationshipKind, SchemaRegistry,
};
pub use transport::Transport;
