use async_trait::async_trait;
use bson::{doc, Document};
use mongodb::Database;
use serde_json::Value;

use super::{
    document_to_json, parse_object_id, stamp_server_fields, DocumentStore, StoreError,
    MAX_LISTED_COLLECTIONS,
};

/// MongoDB-backed gateway. A missing database handle means the store was
/// never configured; every data operation then fails with `Unavailable`.
pub struct MongoDocumentStore {
    database: Option<Database>,
}

impl MongoDocumentStore {
    pub fn new(database: Option<Database>) -> Self {
        Self { database }
    }

    fn database(&self) -> Result<&Database, StoreError> {
        self.database.as_ref().ok_or(StoreError::Unavailable)
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    fn is_connected(&self) -> bool {
        self.database.is_some()
    }

    async fn insert(&self, collection: &str, mut document: Document) -> Result<String, StoreError> {
        let database = self.database()?;
        stamp_server_fields(&mut document);

        let result = database
            .collection::<Document>(collection)
            .insert_one(document)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        let id = match result.inserted_id.as_object_id() {
            Some(oid) => oid.to_hex(),
            None => result.inserted_id.to_string(),
        };

        tracing::debug!(collection = %collection, id = %id, "document inserted");
        Ok(id)
    }

    async fn fetch_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let database = self.database()?;
        let oid = parse_object_id(id)?;

        let found = database
            .collection::<Document>(collection)
            .find_one(doc! { "_id": oid })
            .await
            .map_err(|e| StoreError::Read(e.to_string()))?;

        Ok(found.map(document_to_json))
    }

    async fn list_collection_names(&self) -> Result<Vec<String>, StoreError> {
        let mut names = self
            .database()?
            .list_collection_names()
            .await
            .map_err(|e| StoreError::Read(e.to_string()))?;
        names.truncate(MAX_LISTED_COLLECTIONS);
        Ok(names)
    }
}
