pub mod document_repo;
pub mod memory_repo;

pub use document_repo::MongoDocumentStore;
pub use memory_repo::InMemoryDocumentStore;

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use serde_json::{Map, Value};

/// Collection holding excavation sessions
pub const SESSION_COLLECTION: &str = "photosession";
/// Collection holding photo metadata
pub const PHOTO_COLLECTION: &str = "photo";

/// Upper bound on collection names reported by diagnostics
pub const MAX_LISTED_COLLECTIONS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database not configured")]
    Unavailable,

    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("{0}")]
    Read(String),

    #[error("{0}")]
    Write(String),
}

/// Gateway over the document database.
///
/// Identifiers cross this boundary as text only; parsing into the store's
/// native key type happens inside implementations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Whether a store connection exists at all.
    fn is_connected(&self) -> bool;

    /// Insert one document and return its generated identifier.
    ///
    /// Server timestamps missing from `document` are stamped first.
    async fn insert(&self, collection: &str, document: Document) -> Result<String, StoreError>;

    /// Fetch one document by identifier, with `_id` rendered as text.
    async fn fetch_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// At most [`MAX_LISTED_COLLECTIONS`] collection names.
    async fn list_collection_names(&self) -> Result<Vec<String>, StoreError>;
}

/// Stamp `created_at` and `updated_at` unless the caller already set them.
pub(crate) fn stamp_server_fields(document: &mut Document) {
    let now = bson::DateTime::now();
    for field in ["created_at", "updated_at"] {
        if !document.contains_key(field) {
            document.insert(field, now);
        }
    }
}

pub(crate) fn parse_object_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidIdentifier(id.to_string()))
}

/// Convert a stored document into its JSON transport form.
pub fn document_to_json(document: Document) -> Value {
    let map: Map<String, Value> = document
        .into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect();
    Value::Object(map)
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(dt.to_chrono().to_rfc3339()),
        Bson::Double(v) => Value::from(v),
        Bson::Int32(v) => Value::from(v),
        Bson::Int64(v) => Value::from(v),
        Bson::String(s) => Value::String(s),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Null => Value::Null,
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::Document(doc) => document_to_json(doc),
        other => other.into_relaxed_extjson(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_document_to_json_normalizes_id_and_dates() {
        let oid = ObjectId::parse_str("65f1a2b3c4d5e6f708192a3b").unwrap();
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let document = doc! {
            "_id": oid,
            "site_name": "Trench A",
            "start_lat": 10.0,
            "seq": 3_i32,
            "device": Bson::Null,
            "created_at": bson::DateTime::from_chrono(created),
        };

        let json = document_to_json(document);
        assert_eq!(json["_id"], "65f1a2b3c4d5e6f708192a3b");
        assert_eq!(json["site_name"], "Trench A");
        assert_eq!(json["start_lat"], 10.0);
        assert_eq!(json["seq"], 3);
        assert!(json["device"].is_null());
        assert_eq!(json["created_at"], "2024-05-01T08:30:00+00:00");
    }

    #[test]
    fn test_parse_object_id() {
        assert!(parse_object_id("000000000000000000000000").is_ok());
        assert!(matches!(
            parse_object_id("not-an-id"),
            Err(StoreError::InvalidIdentifier(ref id)) if id == "not-an-id"
        ));
        assert!(parse_object_id("0000000000000000000000").is_err());
    }
}
