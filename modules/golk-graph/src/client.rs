use neo4rs::{ConfigBuilder, Graph};

/// Thin wrapper around neo4rs::Graph providing connection setup.
#[derive(Clone)]
pub struct GraphClient {
    pub(crate) graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given credentials. `database: None` uses the server default.
    pub async fn connect(
        uri: &str,
        user: &str,
        password: &str,
        database: Option<&str>,
    ) -> Result<Self, neo4rs::Error> {
        let mut builder = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password)
            .fetch_size(500)
            .max_connections(10);
        if let Some(db) = database {
            builder = builder.db(db);
        }
        let graph = Graph::connect(builder.build()?).await?;
        Ok(Self { graph })
    }

    /// Get a reference to the underlying neo4rs Graph.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}
