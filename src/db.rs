use mongodb::bson::doc;
use mongodb::Client;

use crate::storage::mongo::MongoStorage;

pub struct Database {
    pub client: Client,
    pub db: mongodb::Database,
}

impl Database {
    /// Builds the client and selects `database_name`.
    ///
    /// The driver connects lazily. A failed ping is logged rather than returned
    /// so the service still starts and `/test` can report the problem.
    pub async fn connect(database_url: &str, database_name: &str) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(database_url).await?;
        let db = client.database(database_name);

        match db.run_command(doc! { "ping": 1 }).await {
            Ok(_) => tracing::info!("✓ MongoDB reachable (database: {})", database_name),
            Err(e) => tracing::warn!("MongoDB ping failed, continuing: {}", e),
        }

        Ok(Self { client, db })
    }

    pub fn storage(&self) -> MongoStorage {
        MongoStorage::new(self.db.clone())
    }
}
