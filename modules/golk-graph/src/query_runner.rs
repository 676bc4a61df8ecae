use neo4rs::query;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::GraphClient;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Database error: {0}")]
    Database(#[from] neo4rs::Error),

    #[error("Failed to convert row to JSON: {0}")]
    Decode(String),
}

/// Executes arbitrary read queries and returns rows as JSON objects.
pub struct QueryRunner {
    client: GraphClient,
}

impl QueryRunner {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Run `cypher` inside a transaction that is always rolled back, keeping at most `max_rows`.
    pub async fn run_read(&self, cypher: &str, max_rows: usize) -> Result<Vec<Value>, QueryError> {
        debug!(cypher, max_rows, "Executing read query");

        let mut txn = self.client.graph.start_txn().await?;
        let mut result = txn.execute(query(cypher)).await?;

        let mut rows = Vec::new();
        while rows.len() < max_rows {
            match result.next(txn.handle()).await? {
                Some(row) => rows.push(
                    row.to::<Value>()
                        .map_err(|e| QueryError::Decode(e.to_string()))?,
                ),
                None => break,
            }
        }

        txn.rollback().await?;
        Ok(rows)
    }
}
