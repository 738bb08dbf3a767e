//! Document storage abstraction.
//!
//! Handlers talk to a [`DocumentStore`] rather than to a driver directly, so the
//! same routes run against MongoDB in production ([`mongo::MongoStorage`]) and
//! against [`memory::MemoryStorage`] in tests and local development.
//!
//! Every operation touches exactly one collection and at most one document
//! (listing aside). Filters are exact-match documents.

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};
use std::fmt;

pub mod memory;
pub mod mongo;

/// Collection holding lead documents.
pub const LEAD_COLLECTION: &str = "lead";
/// Collection holding activity documents.
pub const ACTIVITY_COLLECTION: &str = "activity";

/// Errors raised by a storage backend.
#[derive(Debug)]
pub enum StoreError {
    /// Error reported by the MongoDB driver.
    Mongo(mongodb::error::Error),
    /// Backend returned something it should not have.
    Unexpected(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Mongo(e) => write!(f, "MongoDB error: {}", e),
            StoreError::Unexpected(msg) => write!(f, "Unexpected storage error: {}", msg),
        }
    }
}

impl StoreError {
    /// The backend's own message, without the variant prefix `Display` adds.
    pub fn message(&self) -> String {
        match self {
            StoreError::Mongo(e) => e.to_string(),
            StoreError::Unexpected(msg) => msg.clone(),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Mongo(e) => Some(e),
            StoreError::Unexpected(_) => None,
        }
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Mongo(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the underlying database.
    fn name(&self) -> &str;

    /// Inserts `doc` and returns the generated `_id`.
    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<ObjectId>;

    /// Returns documents matching `filter` in storage order, at most `limit` of them.
    /// `None` means no limit.
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        limit: Option<u64>,
    ) -> StoreResult<Vec<Document>>;

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<Option<Document>>;

    /// Replaces every field of the document with `doc`, keeping its `_id`.
    /// Returns whether a document matched.
    async fn replace_by_id(&self, collection: &str, id: ObjectId, doc: Document)
        -> StoreResult<bool>;

    /// Returns whether a document was removed.
    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<bool>;

    async fn list_collection_names(&self) -> StoreResult<Vec<String>>;
}
