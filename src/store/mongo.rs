use bson::doc;
use mongodb::Client;
use tracing::info;

use crate::config::MongoConfig;
use crate::store::error::StoreError;

/// Connect to MongoDB with a bounded server-selection timeout so startup does
/// not hang on an unreachable instance, then verify the connection with a ping.
pub async fn connect(config: &MongoConfig) -> Result<Client, StoreError> {
    let uri = if config.url.contains('?') {
        format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", config.url)
    } else {
        format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", config.url)
    };

    let client = Client::with_uri_str(&uri)
        .await
        .map_err(|e| StoreError::Backend(format!("failed to connect to MongoDB: {}", e)))?;

    client
        .database(&config.database)
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| StoreError::Backend(format!("MongoDB ping failed: {}", e)))?;

    info!("Connected to MongoDB database '{}'", config.database);
    Ok(client)
}
