use golk_common::schema;
use neo4rs::query;
use tracing::{info, warn};

use crate::GraphClient;

/// One uniqueness constraint per node label, keyed on the label's unique property.
pub fn constraint_statements() -> Vec<String> {
    schema::NODES
        .iter()
        .map(|node| {
            format!(
                "CREATE CONSTRAINT `{}` IF NOT EXISTS FOR (n:`{}`) REQUIRE n.`{}` IS UNIQUE",
                node.constraint_name(),
                node.label,
                node.key.name
            )
        })
        .collect()
}

/// Run idempotent schema migrations.
pub async fn migrate(client: &GraphClient) -> Result<(), neo4rs::Error> {
    let g = &client.graph;

    info!("Running schema migrations...");

    let constraints = constraint_statements();
    for c in &constraints {
        run_ignoring_exists(g, c).await?;
    }
    info!(count = constraints.len(), "Uniqueness constraints created");

    run_ignoring_exists(
        g,
        "CREATE INDEX area_weather_update IF NOT EXISTS FOR (a:Area) ON (a.last_weather_update)",
    )
    .await?;
    info!("Property indexes created");

    info!("Schema migrations complete");
    Ok(())
}

/// Older servers reject `IF NOT EXISTS` on equivalent constraints with a different name.
async fn run_ignoring_exists(g: &neo4rs::Graph, cypher: &str) -> Result<(), neo4rs::Error> {
    match g.run(query(cypher)).await {
        Ok(_) => Ok(()),
        Err(e) => {
            let msg = e.to_string().to_lowercase();
            if msg.contains("already exists") || msg.contains("equivalent") {
                warn!("Already exists (skipped): {}", cypher.chars().take(80).collect::<String>());
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}
