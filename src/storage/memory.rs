//! In-memory implementation of [`DocumentStore`].
//!
//! Collections are vectors of documents kept in insertion order behind a
//! `tokio::sync::RwLock`. Filters follow MongoDB exact-match semantics for
//! top-level fields. Nothing survives a restart.

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{DocumentStore, StoreResult};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    name: String,
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStorage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of documents currently held in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, expected)| doc.get(key) == Some(expected))
}

fn has_id(doc: &Document, id: &ObjectId) -> bool {
    doc.get_object_id("_id").map_or(false, |found| found == *id)
}

/// Puts `_id` first, the way the server stores it.
fn with_id(id: ObjectId, doc: Document) -> Document {
    let mut stored = Document::new();
    stored.insert("_id", id);
    for (key, value) in doc {
        if key != "_id" {
            stored.insert(key, value);
        }
    }
    stored
}

#[async_trait]
impl DocumentStore for MemoryStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<ObjectId> {
        let id = ObjectId::new();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(with_id(id, doc));
        Ok(id)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        limit: Option<u64>,
    ) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let limit = limit.map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
        Ok(docs
            .iter()
            .filter(|doc| matches(doc, &filter))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<Option<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| has_id(doc, &id)).cloned()))
    }

    async fn replace_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        doc: Document,
    ) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let Some(slot) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| has_id(doc, &id)))
        else {
            return Ok(false);
        };

        *slot = with_id(id, doc);
        Ok(true)
    }

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };

        let before = docs.len();
        docs.retain(|doc| !has_id(doc, &id));
        Ok(docs.len() < before)
    }

    async fn list_collection_names(&self) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
