use async_trait::async_trait;
use bson::{oid::ObjectId, Document};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{
    document_to_json, parse_object_id, stamp_server_fields, DocumentStore, StoreError,
    MAX_LISTED_COLLECTIONS,
};

/// In-process document store keyed by generated ObjectIds.
///
/// Used to run the API without a MongoDB server. The `unavailable` variant
/// behaves like an unconfigured database.
pub struct InMemoryDocumentStore {
    connected: bool,
    collections: RwLock<BTreeMap<String, Vec<Document>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            connected: true,
            collections: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            connected: false,
            collections: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of documents stored in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn ensure_connected(&self) -> Result<(), StoreError> {
        if self.connected {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn insert(&self, collection: &str, mut document: Document) -> Result<String, StoreError> {
        self.ensure_connected()?;

        stamp_server_fields(&mut document);
        let oid = ObjectId::new();
        document.insert("_id", oid);
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(document);

        Ok(oid.to_hex())
    }

    async fn fetch_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.ensure_connected()?;
        let oid = parse_object_id(id)?;

        let collections = self.collections.read().await;
        let found = collections.get(collection).and_then(|docs| {
            docs.iter()
                .find(|doc| doc.get_object_id("_id").ok() == Some(oid))
                .cloned()
        });

        Ok(found.map(document_to_json))
    }

    async fn list_collection_names(&self) -> Result<Vec<String>, StoreError> {
        self.ensure_connected()?;
        Ok(self
            .collections
            .read()
            .await
            .keys()
            .take(MAX_LISTED_COLLECTIONS)
            .cloned()
            .collect())
    }
}
