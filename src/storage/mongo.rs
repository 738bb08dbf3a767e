use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::Database;

use super::{DocumentStore, StoreError, StoreResult};

/// MongoDB-backed document storage.
#[derive(Clone)]
pub struct MongoStorage {
    db: Database,
}

impl MongoStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for MongoStorage {
    fn name(&self) -> &str {
        self.db.name()
    }

    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<ObjectId> {
        let result = self
            .db
            .collection::<Document>(collection)
            .insert_one(doc)
            .await?;

        result.inserted_id.as_object_id().ok_or_else(|| {
            StoreError::Unexpected(format!(
                "inserted _id is not an ObjectId: {}",
                result.inserted_id
            ))
        })
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        limit: Option<u64>,
    ) -> StoreResult<Vec<Document>> {
        let coll = self.db.collection::<Document>(collection);
        let mut find = coll.find(filter);
        if let Some(limit) = limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let mut cursor = find.await?;
        let mut docs = Vec::new();
        while cursor.advance().await? {
            docs.push(cursor.deserialize_current()?);
        }

        Ok(docs)
    }

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<Option<Document>> {
        let doc = self
            .db
            .collection::<Document>(collection)
            .find_one(doc! { "_id": id })
            .await?;
        Ok(doc)
    }

    async fn replace_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        doc: Document,
    ) -> StoreResult<bool> {
        let result = self
            .db
            .collection::<Document>(collection)
            .replace_one(doc! { "_id": id }, doc)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<bool> {
        let result = self
            .db
            .collection::<Document>(collection)
            .delete_one(doc! { "_id": id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_collection_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.db.list_collection_names().await?)
    }
}
